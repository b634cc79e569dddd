//! Error types for DOM operations and parsing
//!
//! Simple, flat error hierarchy. No over-engineering.

use crate::types::NodeType;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// DOM exception kinds, raised synchronously by tree operations.
///
/// A failed operation never leaves a partially mutated tree behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("Index {offset} is out of range for length {length}")]
    IndexSize { offset: usize, length: usize },

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Node belongs to a different document")]
    WrongDocument,

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("Node of type {0:?} is read-only")]
    NoModificationAllowed(NodeType),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Attribute {0:?} is already in use by another element")]
    InUseAttribute(String),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Node not found: {0}")]
    NodeNotFound(u32),
}

impl DomError {
    /// Numeric exception code from DOM Level 1, where one exists.
    pub fn code(&self) -> Option<u16> {
        match self {
            DomError::IndexSize { .. } => Some(1),
            DomError::HierarchyRequest(_) => Some(3),
            DomError::WrongDocument => Some(4),
            DomError::InvalidCharacter(_) => Some(5),
            DomError::NoModificationAllowed(_) => Some(7),
            DomError::NotFound(_) => Some(8),
            DomError::NotSupported(_) => Some(9),
            DomError::InUseAttribute(_) => Some(10),
            DomError::InvalidNodeType { .. } | DomError::NodeNotFound(_) => None,
        }
    }

    pub(crate) fn invalid_node_type(expected: &str, actual: NodeType) -> Self {
        DomError::InvalidNodeType {
            expected: expected.to_string(),
            actual: format!("{:?}", actual),
        }
    }
}

/// Location of a parse failure in the input.
///
/// `line` and `column` are 1-based; `column` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Malformed-input errors. A failed parse never yields a Document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("XML syntax error at {position}: {message}")]
    Xml {
        message: String,
        position: TextPosition,
    },

    #[error("Invalid UTF-8 at {position}")]
    Encoding { position: TextPosition },

    #[error("Mismatched end tag at {position}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        position: TextPosition,
    },

    #[error("Unexpected end tag </{name}> at {position}: no element is open")]
    UnexpectedEndTag {
        name: String,
        position: TextPosition,
    },

    #[error("Unexpected end of input at {position}: <{name}> is not closed")]
    UnclosedElement {
        name: String,
        position: TextPosition,
    },

    #[error("Text outside the document element at {position}")]
    TextOutsideRoot { position: TextPosition },

    #[error("Second document element <{name}> at {position}")]
    MultipleRoots {
        name: String,
        position: TextPosition,
    },

    #[error("Empty XML document: no document element found")]
    EmptyDocument,

    #[error("Maximum element depth exceeded at {position}: {current} > {max}")]
    MaxDepthExceeded {
        current: usize,
        max: usize,
        position: TextPosition,
    },

    #[error("DOM error at {position}: {source}")]
    Dom {
        source: DomError,
        position: TextPosition,
    },
}

impl ParseError {
    /// Where the failure happened, if the error is tied to a location.
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            ParseError::Xml { position, .. }
            | ParseError::Encoding { position }
            | ParseError::MismatchedEndTag { position, .. }
            | ParseError::UnexpectedEndTag { position, .. }
            | ParseError::UnclosedElement { position, .. }
            | ParseError::TextOutsideRoot { position }
            | ParseError::MultipleRoots { position, .. }
            | ParseError::MaxDepthExceeded { position, .. }
            | ParseError::Dom { position, .. } => Some(*position),
            ParseError::EmptyDocument => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_error_codes() {
        assert_eq!(DomError::HierarchyRequest("x".into()).code(), Some(3));
        assert_eq!(DomError::WrongDocument.code(), Some(4));
        assert_eq!(DomError::NotFound("x".into()).code(), Some(8));
        assert_eq!(DomError::NodeNotFound(7).code(), None);
    }

    #[test]
    fn test_parse_error_display_has_position() {
        let err = ParseError::MismatchedEndTag {
            expected: "a".into(),
            found: "root".into(),
            position: TextPosition {
                offset: 9,
                line: 1,
                column: 10,
            },
        };
        let message = err.to_string();
        assert!(message.contains("line 1, column 10"), "{}", message);
        assert!(message.contains("</a>"));
        assert_eq!(err.position().map(|p| p.offset), Some(9));
    }
}
