/// Normalize raw posting text into cleaned text.
///
/// Every character that is not an ASCII letter or digit becomes a separator,
/// letters are lowercased, and runs of separators collapse to a single space
/// with no leading or trailing space. The output only ever contains
/// `[a-z0-9 ]`, so `normalize(normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize<T: AsRef<str>>(text: T) -> String {
    let text = text.as_ref();
    let mut cleaned = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            pending_space = false;
            cleaned.push(ch.to_ascii_lowercase());
        } else {
            pending_space = true;
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_clean(s: &str) -> bool {
        !s.starts_with(' ')
            && !s.ends_with(' ')
            && !s.contains("  ")
            && s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ')
    }

    #[test]
    fn test_strips_punctuation_and_lowercases() {
        assert_eq!(
            normalize("Earn $5,000/week!!  Work-from-HOME."),
            "earn 5 000 week work from home"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  data\t\tentry \n clerk  "), "data entry clerk");
    }

    #[test]
    fn test_non_ascii_becomes_separator() {
        assert_eq!(normalize("café\u{00a0}manager—remote"), "caf manager remote");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize("!!! ??? ..."), "");
    }

    #[test]
    fn test_idempotent_and_clean() {
        let samples = [
            "Senior Rust Engineer (m/f/d) – 100% remote",
            "URGENT!!! wire $$$ now, no interview required",
            "  a  b  c  ",
            "日本語 text with ünïcödé",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert!(is_clean(&once), "not clean: {once:?}");
            assert_eq!(normalize(&once), once);
        }
    }
}
