use std::borrow::Cow;

/// Whether `c` may appear in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Strip characters that are not allowed in XML 1.0 text or attribute values.
///
/// Legacy metadata occasionally carries raw control characters (form feeds,
/// vertical tabs, NUL) that would make the serialized feed unparseable.
/// Tab, newline and carriage return are preserved.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
pub fn strip_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_borrowed() {
        let text = "Quantum déjà vu\twith\nnewlines";
        assert!(matches!(strip_invalid_xml_chars(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(strip_invalid_xml_chars("a\u{0}b\u{b}c\u{1b}[0m"), "abc[0m");
        assert_eq!(strip_invalid_xml_chars("\u{c}page\u{7f}"), "page\u{7f}");
    }

    #[test]
    fn test_noncharacters_removed() {
        assert_eq!(strip_invalid_xml_chars("x\u{FFFE}y"), "xy");
    }
}
