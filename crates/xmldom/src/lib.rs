//! XML DOM Level 1 Core
//!
//! An owned, mutable XML tree with the DOM Level 1 node model and a
//! quick-xml driven parser that builds it.
//!
//! ## Core Design
//!
//! ```text
//! XML bytes → quick-xml events → TreeBuilder → Document (arena) → DomSerializer
//!                                                  ↓
//!                                          NodeId (document, u32)
//! ```
//!
//! - Every node lives in its [`Document`]'s arena and is addressed by a
//!   [`NodeId`]. Handles from another document are rejected with
//!   [`DomError::WrongDocument`].
//! - Parent and child links are stored; siblings are derived from the
//!   parent's child list, so they can never disagree.
//! - Mutations validate first and change nothing when they fail.
//!
//! ```
//! use xmldom::{parse_xml, DomSerializer};
//!
//! let mut doc = parse_xml(b"<root><a>hello</a></root>").unwrap();
//! let a = doc.node_at_path("a").unwrap();
//! doc.set_attribute(a, "lang", "en").unwrap();
//!
//! let xml = DomSerializer::new().serialize(&doc, doc.document_node()).unwrap();
//! assert_eq!(xml, r#"<root><a lang="en">hello</a></root>"#);
//! ```

pub mod arena;
pub mod character_data;
pub mod doctype;
pub mod document;
pub mod element;
pub mod error;
pub mod mutation;
pub mod parser;
pub mod path;
pub mod serializer;
pub mod types;
pub mod utils;

pub use document::{Document, DomImplementation};
pub use error::{DomError, ParseError, ParseResult, Result, TextPosition};
pub use parser::{parse_xml, DomParser, ParserConfig};
pub use serializer::{DomSerializer, SerializerConfig};
pub use types::*;
