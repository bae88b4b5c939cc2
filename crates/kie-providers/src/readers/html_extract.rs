//! Shared HTML-to-text extraction used by the url, sitemap, and local html/htm readers.

use std::collections::HashSet;

use scraper::{Html, Selector};

/// Strip tags and decode entities, keeping only visible text. `script`/`style`/
/// `noscript` subtrees are skipped entirely; each text node becomes its own line so
/// paragraphs don't run together.
#[must_use]
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let skip_selector = Selector::parse("script, style, noscript").expect("static selector is valid");
    let skip_ids: HashSet<_> = document.select(&skip_selector).map(|el| el.id()).collect();

    let body_selector = Selector::parse("body").expect("static selector is valid");
    let root = document
        .select(&body_selector)
        .next()
        .map_or(document.root_element(), |body| body);

    let mut out = String::new();
    for descendant in root.descendants() {
        if let Some(text) = descendant.value().as_text() {
            if descendant.ancestors().any(|a| skip_ids.contains(&a.id())) {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
        }
    }
    html_escape::decode_html_entities(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_script_and_style_content() {
        let html = "<html><body><script>evil()</script><style>.x{}</style><p>Hello</p></body></html>";
        let text = extract_text(html);
        assert!(text.contains("Hello"));
        assert!(!text.contains("evil"));
    }

    #[test]
    fn decodes_entities() {
        let html = "<html><body><p>Tom &amp; Jerry</p></body></html>";
        assert!(extract_text(html).contains("Tom & Jerry"));
    }
}
