//! Char-safe truncation helpers for platform message limits.
//!
//! Post text is mostly Cyrillic, so every limit here counts characters rather
//! than bytes; slicing by byte index would panic mid-codepoint.

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Truncate to at most `max` characters, replacing the tail with `...` when
/// the text does not fit.
pub fn truncate_with_marker(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("привет", 10), "привет");
        assert_eq!(truncate_with_marker("привет", 10), "привет");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        // 5 Cyrillic characters are 10 bytes; a byte slice at 4 would panic
        assert_eq!(truncate_chars("длина", 4), "длин");
    }

    #[test]
    fn marker_keeps_result_within_limit() {
        let long = "я".repeat(3500);
        let truncated = truncate_with_marker(&long, 3000);
        assert_eq!(truncated.chars().count(), 3000);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn exact_fit_gets_no_marker() {
        let text = "a".repeat(3000);
        assert_eq!(truncate_with_marker(&text, 3000), text);
    }
}
