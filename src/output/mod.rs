// Output formatting: terminal tables and the JSON report.

pub mod report;
pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so Hebrew or accented page text
/// never panics the way byte slicing would.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("Regev", 10), "Regev");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_chars("מירי רגב", 4), "מירי...");
    }
}
