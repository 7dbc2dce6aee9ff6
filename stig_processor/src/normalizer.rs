//! Line-oriented cleanup of free-text guidance fields

use regex::Regex;
use std::sync::OnceLock;

static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
static WORD_CHARACTER: OnceLock<Regex> = OnceLock::new();

fn line_break() -> &'static Regex {
    LINE_BREAK.get_or_init(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern is valid"))
}

fn word_character() -> &'static Regex {
    WORD_CHARACTER.get_or_init(|| Regex::new(r"\w").expect("word pattern is valid"))
}

/// Split `text` into trimmed lines, dropping lines without any word character.
///
/// `normalize(&normalize(x).join("\n")) == normalize(x)` and `normalize("")` is empty.
pub fn normalize(text: &str) -> Vec<String> {
    line_break()
        .split(text)
        .filter(|line| word_character().is_match(line))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Normalize each line of an already split sequence
pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().flat_map(|line| normalize(line.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_blank_lines() {
        assert_eq!(normalize("a\n\nb\n  \nc"), ["a", "b", "c"]);
    }

    #[test]
    fn test_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("\n\r\n  \t\n").is_empty());
    }

    #[test]
    fn test_mixed_line_endings() {
        assert_eq!(
            normalize("Registry Hive: HKEY_LOCAL_MACHINE\r\nValue Type: REG_DWORD\rValue: 1\n"),
            [
                "Registry Hive: HKEY_LOCAL_MACHINE",
                "Value Type: REG_DWORD",
                "Value: 1"
            ]
        );
    }

    #[test]
    fn test_punctuation_only_lines_dropped() {
        assert_eq!(
            normalize("If the value is not configured:\n---\n  *  \nthis is a finding."),
            ["If the value is not configured:", "this is a finding."]
        );
    }

    #[test]
    fn test_idempotent() {
        let text = "  Verify the policy  \n\n\t- Audit Logon: Success\n ... \nNA";
        let once = normalize(text);
        let twice = normalize_lines(&once);
        assert_eq!(once, twice);
        assert_eq!(normalize(&once.join("\n")), once);
    }

    #[test]
    fn test_unicode_word_characters() {
        assert_eq!(normalize("Überwachung\n«»\n"), ["Überwachung"]);
    }
}
