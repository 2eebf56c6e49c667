//! Character-class predicates for the XML 1.0 grammar.
//!
//! All predicates take a Unicode code point so that callers can classify
//! data read from any decoded stream without first checking `char` bounds.

/// Check whether the code point matches production `[2] Char`.
///
/// ```text
/// [2] Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
/// ```
#[doc(alias = "xmlIsChar")]
pub fn xml_is_char(c: u32) -> bool {
    matches!(c, 0x9 | 0xA | 0xD)
        || (0x20..=0xD7FF).contains(&c)
        || (0xE000..=0xFFFD).contains(&c)
        || (0x10000..=0x10FFFF).contains(&c)
}

/// Check whether the code point matches production `[3] S`.
///
/// ```text
/// [3] S ::= (#x20 | #x9 | #xD | #xA)+
/// ```
#[doc(alias = "xmlIsBlankChar")]
pub fn xml_is_blank_char(c: u32) -> bool {
    matches!(c, 0x20 | 0x9 | 0xA | 0xD)
}

/// Check whether the code point matches production `[13] PubidChar`.
///
/// ```text
/// [13] PubidChar ::= #x20 | #xD | #xA | [a-zA-Z0-9] | [-'()+,./:=?;!*#@$_%]
/// ```
#[doc(alias = "xmlIsPubidChar")]
pub fn xml_is_pubid_char(c: u32) -> bool {
    matches!(c, 0x20 | 0xD | 0xA)
        || u8::try_from(c)
            .is_ok_and(|b| b.is_ascii_alphanumeric() || b"-'()+,./:=?;!*#@$_%".contains(&b))
}

/// Check whether the character can start a Name, using the checks of
/// productions [4] and [5] of the Update 5 of XML 1.0.
pub fn xml_is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c == '_'
        || c == ':'
        || ('\u{C0}'..='\u{D6}').contains(&c)
        || ('\u{D8}'..='\u{F6}').contains(&c)
        || ('\u{F8}'..='\u{2FF}').contains(&c)
        || ('\u{370}'..='\u{37D}').contains(&c)
        || ('\u{37F}'..='\u{1FFF}').contains(&c)
        || ('\u{200C}'..='\u{200D}').contains(&c)
        || ('\u{2070}'..='\u{218F}').contains(&c)
        || ('\u{2C00}'..='\u{2FEF}').contains(&c)
        || ('\u{3001}'..='\u{D7FF}').contains(&c)
        || ('\u{F900}'..='\u{FDCF}').contains(&c)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&c)
        || ('\u{10000}'..='\u{EFFFF}').contains(&c)
}

/// Check whether the character can continue a Name (production [4a]).
pub fn xml_is_name_char(c: char) -> bool {
    xml_is_name_start_char(c)
        || c.is_ascii_digit()
        || c == '-'
        || c == '.'
        || c == '\u{B7}'
        || ('\u{300}'..='\u{36F}').contains(&c)
        || ('\u{203F}'..='\u{2040}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_chars() {
        for c in [' ', '\t', '\r', '\n'] {
            assert!(xml_is_blank_char(c as u32));
        }
        assert!(!xml_is_blank_char('\u{A0}' as u32));
        assert!(!xml_is_blank_char('a' as u32));
    }

    #[test]
    fn char_ranges() {
        assert!(xml_is_char('a' as u32));
        assert!(xml_is_char(0x10FFFF));
        assert!(!xml_is_char(0x0));
        assert!(!xml_is_char(0xB));
        assert!(!xml_is_char(0xFFFE));
        assert!(!xml_is_char(0xD800));
    }

    #[test]
    fn name_chars() {
        assert!(xml_is_name_start_char('É'));
        assert!(xml_is_name_start_char('_'));
        assert!(!xml_is_name_start_char('-'));
        assert!(!xml_is_name_start_char('0'));
        assert!(xml_is_name_char('-'));
        assert!(xml_is_name_char('0'));
        assert!(!xml_is_name_char(' '));
    }

    #[test]
    fn pubid_chars() {
        assert!(xml_is_pubid_char('-' as u32));
        assert!(xml_is_pubid_char('/' as u32));
        assert!(xml_is_pubid_char('%' as u32));
        assert!(xml_is_pubid_char('Z' as u32));
        assert!(!xml_is_pubid_char('"' as u32));
        assert!(!xml_is_pubid_char('é' as u32));
        // Code points above one byte must not wrap into the ASCII table.
        assert!(!xml_is_pubid_char(0x12D));
        assert!(!xml_is_pubid_char(0x3042));
    }
}
