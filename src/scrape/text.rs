// HTML-to-text extraction.
//
// scraper (html5ever underneath) recovers from any markup, so there is no
// failure path here: the worst case for a broken page is an empty string.

use scraper::Html;

/// Elements whose text content is never visible on the rendered page.
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Strip markup from `raw_html` and return its visible text as one line.
///
/// Text nodes are joined with spaces, then newlines, tabs and carriage
/// returns are folded into single spaces and runs of whitespace collapsed.
pub fn extract_text(raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);

    let mut pieces: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        pieces.push(&**text);
    }

    collapse_whitespace(&pieces.join(" "))
}

/// Fold every whitespace run (including `\n`, `\t`, `\r`) into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_paragraphs() {
        let html = "<html><body><p>Miri Regev</p><p>spoke today.</p></body></html>";
        assert_eq!(extract_text(html), "Miri Regev spoke today.");
    }

    #[test]
    fn test_extract_drops_script_and_style() {
        let html = r#"<html><head><style>p { color: red; }</style>
            <script>var name = "Not A Person";</script></head>
            <body><p>Visible</p><noscript>enable js</noscript></body></html>"#;
        assert_eq!(extract_text(html), "Visible");
    }

    #[test]
    fn test_extract_keeps_title() {
        let html = "<html><head><title>Profile</title></head><body>Body</body></html>";
        assert_eq!(extract_text(html), "Profile Body");
    }

    #[test]
    fn test_extract_collapses_control_whitespace() {
        let html = "<p>Miri\n\tRegev\r\n  MK</p>";
        assert_eq!(extract_text(html), "Miri Regev MK");
    }

    #[test]
    fn test_extract_tolerates_broken_markup() {
        let html = "<div><p>unclosed <b>bold <i>nested</div></span>tail";
        let text = extract_text(html);
        assert!(text.contains("unclosed"));
        assert!(text.contains("nested"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn test_extract_empty_input() {
        assert_eq!(extract_text(""), "");
    }

    #[test]
    fn test_collapse_whitespace_trims_ends() {
        assert_eq!(collapse_whitespace("  a \t b \n"), "a b");
    }
}
