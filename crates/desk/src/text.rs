//! Small text helpers shared by rendering and product synthesis.

/// Titles longer than this are cut in tables.
pub const TITLE_DISPLAY_CHARS: usize = 50;

/// Capitalize each word: the first character of every run that starts with
/// a word character is upper-cased and the rest of the run lower-cased.
///
/// A run ends at whitespace, so `"usb-c CABLE"` becomes `"Usb-c Cable"`.
#[must_use]
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_whitespace() {
            in_word = false;
            out.push(c);
        } else if in_word {
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() || c == '_' {
            in_word = true;
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Cut `text` to `max_chars` characters, appending `...` when anything was cut.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Format a 0..=1 score as a percentage with one decimal.
#[must_use]
pub fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("golden retriever"), "Golden Retriever");
        assert_eq!(capitalize_words("LAPTOP computer"), "Laptop Computer");
        assert_eq!(capitalize_words("usb-c CABLE"), "Usb-c Cable");
        assert_eq!(capitalize_words("(boxed) set"), "(Boxed) Set");
        assert_eq!(capitalize_words("  spaced   out "), "  Spaced   Out ");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 50), "short");
        let exact = "x".repeat(50);
        assert_eq!(truncate(&exact, 50), exact);
        let long = "y".repeat(51);
        assert_eq!(truncate(&long, 50), format!("{}...", "y".repeat(50)));
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.734), "73.4%");
        assert_eq!(percent(0.0), "0.0%");
        assert_eq!(percent(1.0), "100.0%");
    }
}
