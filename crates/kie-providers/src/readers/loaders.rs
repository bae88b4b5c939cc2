//! Per-extension document loaders shared by the file and directory readers. Each
//! returns the document's full text (or `None` for "nothing usable found", which the
//! caller treats as an empty result rather than an error).

use std::path::Path;
use std::sync::OnceLock;

use kie_domain::error::{Error, Result};
use regex::Regex;

use super::html_extract::extract_text;

/// Load and extract `path`'s text per its extension. `.md` is not handled here: the
/// file and directory readers route it to [`super::markdown::split_by_heading`]
/// directly, bypassing the fixed-size splitter entirely.
///
/// # Errors
///
/// Returns [`Error::ContentRead`] if the file exists but cannot be read from disk.
pub async fn load_document(path: &Path, ext: &str) -> Result<Option<String>> {
    match ext {
        "pdf" => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_pdf(&bytes))
        }
        "docx" => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_docx(&bytes))
        }
        "epub" => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_epub(&bytes))
        }
        "csv" => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_csv(&text))
        }
        "json" => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_json(&text))
        }
        "html" | "htm" => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            Ok(load_html(&text))
        }
        _ => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::content_read(format!("reading {}: {e}", path.display())))?;
            let trimmed = text.trim();
            Ok(if trimmed.is_empty() { None } else { Some(text) })
        }
    }
}

/// Best-effort PDF text extraction. A password-protected or otherwise unparseable PDF
/// yields `None` rather than an error, since this crate makes no claim of OCR fidelity.
#[must_use]
pub fn load_pdf(bytes: &[u8]) -> Option<String> {
    pdf_extract::extract_text_from_mem(bytes).ok()
}

/// Render each CSV row as a newline-joined `"col: value"` block, rows separated by a
/// blank line. Quoting is not handled; this is a reduced-fidelity reader, not a
/// general-purpose CSV parser.
#[must_use]
pub fn load_csv(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let header: Vec<&str> = lines.next()?.split(',').map(str::trim).collect();
    if header.is_empty() {
        return None;
    }

    let mut blocks = Vec::new();
    for row in lines {
        if row.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = row.split(',').collect();
        let block: Vec<String> = header
            .iter()
            .zip(cells)
            .map(|(col, value)| format!("{col}: {}", value.trim()))
            .collect();
        if !block.is_empty() {
            blocks.push(block.join("\n"));
        }
    }
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}

/// Pretty-print JSON as text; structural awareness beyond that is out of scope.
#[must_use]
pub fn load_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Local HTML files use the same extraction as the url/sitemap readers.
#[must_use]
pub fn load_html(text: &str) -> Option<String> {
    let extracted = extract_text(text);
    if extracted.trim().is_empty() {
        None
    } else {
        Some(extracted)
    }
}

fn xml_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("static pattern is valid"))
}

/// Strip XML/SGML tags from `xml`, collapsing the remainder to decoded plain text.
/// Used for the `.docx`/`.epub` zip-of-XML readers, which make no claim of structural
/// fidelity.
#[must_use]
fn strip_xml_tags(xml: &str) -> String {
    let stripped = xml_tag_regex().replace_all(xml, "\n");
    html_escape::decode_html_entities(stripped.trim()).into_owned()
}

/// Best-effort `.docx` text extraction: unzip, concatenate every paragraph run in
/// `word/document.xml`, strip tags.
#[must_use]
pub fn load_docx(bytes: &[u8]) -> Option<String> {
    load_zip_xml_member(bytes, "word/document.xml")
}

/// Best-effort `.epub` text extraction: unzip every `.xhtml`/`.html` content document
/// listed in the archive, strip tags, and concatenate in archive order.
#[must_use]
pub fn load_epub(bytes: &[u8]) -> Option<String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor).ok()?;

    let mut sections = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).ok()?;
        let name = entry.name().to_owned();
        if !(name.ends_with(".xhtml") || name.ends_with(".html") || name.ends_with(".htm")) {
            continue;
        }
        let mut contents = String::new();
        if std::io::Read::read_to_string(&mut entry, &mut contents).is_ok() {
            let text = strip_xml_tags(&contents);
            if !text.is_empty() {
                sections.push(text);
            }
        }
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn load_zip_xml_member(bytes: &[u8], member: &str) -> Option<String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor).ok()?;
    let mut entry = archive.by_name(member).ok()?;
    let mut contents = String::new();
    std::io::Read::read_to_string(&mut entry, &mut contents).ok()?;
    let text = strip_xml_tags(&contents);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_become_col_value_blocks() {
        let csv = "name,age\nAda,36\nGrace,85\n";
        let text = load_csv(csv).unwrap();
        assert!(text.contains("name: Ada"));
        assert!(text.contains("age: 85"));
    }

    #[test]
    fn csv_without_header_row_is_none() {
        assert!(load_csv("").is_none());
    }

    #[test]
    fn json_is_pretty_printed() {
        let text = load_json(r#"{"a":1}"#).unwrap();
        assert!(text.contains('\n'));
    }

    #[test]
    fn invalid_json_yields_none() {
        assert!(load_json("not json").is_none());
    }

    #[test]
    fn html_with_only_markup_is_none() {
        assert!(load_html("<html><body><script>x()</script></body></html>").is_none());
    }
}
