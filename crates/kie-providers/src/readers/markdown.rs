//! Heading-based Markdown segmentation: each heading starts a new section, and every
//! section's text becomes one chunk. The fixed-size splitter is bypassed entirely, per
//! the reader contract.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// One heading-delimited section of a Markdown document.
pub struct Section {
    /// Heading text stack leading to this section, outermost first. Empty for any
    /// text appearing before the first heading.
    pub heading_path: Vec<String>,
    /// The section's rendered plain text.
    pub text: String,
}

/// Split `markdown` into heading-delimited sections. Sections with only whitespace
/// text are dropped.
#[must_use]
pub fn split_by_heading(markdown: &str) -> Vec<Section> {
    let parser = Parser::new(markdown);

    let mut sections = Vec::new();
    let mut heading_stack: Vec<(HeadingLevel, String)> = Vec::new();
    let mut current_text = String::new();
    let mut in_heading = false;
    let mut heading_text = String::new();
    let mut heading_level = HeadingLevel::H1;

    let flush = |stack: &[(HeadingLevel, String)], text: &str, out: &mut Vec<Section>| {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            out.push(Section {
                heading_path: stack.iter().map(|(_, t)| t.clone()).collect(),
                text: trimmed.to_owned(),
            });
        }
    };

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&heading_stack, &current_text, &mut sections);
                current_text.clear();
                in_heading = true;
                heading_text.clear();
                heading_level = level;
            }
            Event::End(TagEnd::Heading(_)) => {
                in_heading = false;
                while heading_stack.last().is_some_and(|(lvl, _)| *lvl >= heading_level) {
                    heading_stack.pop();
                }
                heading_stack.push((heading_level, heading_text.trim().to_owned()));
            }
            Event::Text(text) | Event::Code(text) => {
                if in_heading {
                    heading_text.push_str(&text);
                } else {
                    current_text.push_str(&text);
                    current_text.push(' ');
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if !in_heading {
                    current_text.push('\n');
                }
            }
            _ => {}
        }
    }
    flush(&heading_stack, &current_text, &mut sections);

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sections_by_heading() {
        let md = "# Title\nIntro text.\n\n## Sub\nSub text.\n";
        let sections = split_by_heading(md);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading_path, vec!["Title".to_owned()]);
        assert!(sections[0].text.contains("Intro text"));
        assert_eq!(sections[1].heading_path, vec!["Title".to_owned(), "Sub".to_owned()]);
    }

    #[test]
    fn text_before_any_heading_has_empty_path() {
        let md = "Preamble.\n\n# Title\nBody.\n";
        let sections = split_by_heading(md);
        assert!(sections[0].heading_path.is_empty());
        assert!(sections[0].text.contains("Preamble"));
    }
}
