//! Utility functions for DOM processing

use crate::document::Document;
use crate::error::{Result, TextPosition};
use crate::types::{NodeId, NodeType};

/// XML 1.0 (5th edition) NameStartChar
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Check `name` against the XML `Name` production
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Whitespace as XML defines it (space, tab, CR, LF)
pub fn is_xml_whitespace(text: &str) -> bool {
    text.bytes()
        .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// Byte index of the `char_offset`-th character, or None past the end.
/// An offset equal to the char count maps to `s.len()`.
pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    indices.nth(char_offset)
}

/// Resolve a byte offset in `input` to a 1-based line and column
pub fn text_position(input: &[u8], offset: usize) -> TextPosition {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    TextPosition {
        offset,
        line,
        column: offset - line_start + 1,
    }
}

/// Concatenated Text and CDATA data of a subtree, in document order
pub fn text_content(document: &Document, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    document.arena().traverse_df(node_id, |node| {
        if matches!(node.node_type(), NodeType::Text | NodeType::CdataSection) {
            text.push_str(node.node_value().unwrap_or_default());
        }
        Ok(())
    })?;

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("root"));
        assert!(is_valid_name("xml:lang"));
        assert!(is_valid_name("_a-b.c9"));
        assert!(is_valid_name("élément"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("9lives"));
        assert!(!is_valid_name("-x"));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("a<b"));
    }

    #[test]
    fn test_char_to_byte() {
        assert_eq!(char_to_byte("héllo", 0), Some(0));
        assert_eq!(char_to_byte("héllo", 2), Some(3));
        assert_eq!(char_to_byte("héllo", 5), Some(6));
        assert_eq!(char_to_byte("héllo", 6), None);
        assert_eq!(char_to_byte("", 0), Some(0));
        assert_eq!(char_to_byte("", 1), None);
    }

    #[test]
    fn test_text_position() {
        let input = b"<a>\n  <b>\n</a>";
        let pos = text_position(input, 0);
        assert_eq!((pos.line, pos.column), (1, 1));
        let pos = text_position(input, 6);
        assert_eq!((pos.line, pos.column), (2, 3));
        let pos = text_position(input, 1000);
        assert_eq!(pos.offset, input.len());
    }

    #[test]
    fn test_whitespace() {
        assert!(is_xml_whitespace(" \n\t\r"));
        assert!(is_xml_whitespace(""));
        assert!(!is_xml_whitespace(" x "));
        assert!(!is_xml_whitespace("\u{A0}"));
    }
}
