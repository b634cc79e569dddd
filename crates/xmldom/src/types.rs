//! Core type definitions for the DOM Level 1 node model
//!
//! Key design principles:
//! 1. One node struct, kind-specific data in a tagged payload
//! 2. Handles are (document, u32 index) pairs, never pointers
//! 3. Use SmallVec for child lists (most nodes have few children)
//! 4. Sibling and first/last links are never stored, only computed

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

/// Identity of a Document. Every handle it hands out carries this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub(crate) fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }
}

/// Node handle: owning document plus index into that document's arena.
///
/// u32 allows 4 billion nodes per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) document: DocumentId,
    pub(crate) index: u32,
}

impl NodeId {
    /// The document that created this node.
    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Name-keyed node map (attributes, entities, notations)
pub type NamedNodeMap = AHashMap<String, NodeId>;

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }

    /// Text, CDATASection and Comment
    pub fn is_character_data(self) -> bool {
        matches!(
            self,
            NodeType::Text | NodeType::CdataSection | NodeType::Comment
        )
    }

    /// Kinds whose content is read-only by definition
    pub(crate) fn is_read_only(self) -> bool {
        matches!(
            self,
            NodeType::DocumentType | NodeType::Entity | NodeType::Notation
        )
    }

    /// DOM Level 1 containment table.
    ///
    /// Document allows Text here so that preserved top-level whitespace can
    /// be stored; the mutator restricts it to whitespace-only data.
    pub(crate) fn allows_child(self, child: NodeType) -> bool {
        use NodeType::*;
        match self {
            Document => matches!(
                child,
                Element | ProcessingInstruction | Comment | DocumentType | Text
            ),
            DocumentFragment | EntityReference | Element | Entity => matches!(
                child,
                Element | ProcessingInstruction | Comment | Text | CdataSection | EntityReference
            ),
            Attribute | DocumentType | ProcessingInstruction | Comment | Text | CdataSection
            | Notation => false,
        }
    }
}

/// Kind-specific node data. `NodeType` is derived from this.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        attributes: NamedNodeMap,
    },
    Attribute {
        owner_element: Option<NodeId>,
        specified: bool,
    },
    Text,
    CdataSection,
    Comment,
    ProcessingInstruction,
    EntityReference,
    Entity {
        public_id: Option<String>,
        system_id: Option<String>,
        notation_name: Option<String>,
    },
    Notation {
        public_id: Option<String>,
        system_id: Option<String>,
    },
    DocumentType {
        entities: NamedNodeMap,
        notations: NamedNodeMap,
    },
    DocumentFragment,
    Document,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text => NodeType::Text,
            NodeKind::CdataSection => NodeType::CdataSection,
            NodeKind::Comment => NodeType::Comment,
            NodeKind::ProcessingInstruction => NodeType::ProcessingInstruction,
            NodeKind::EntityReference => NodeType::EntityReference,
            NodeKind::Entity { .. } => NodeType::Entity,
            NodeKind::Notation { .. } => NodeType::Notation,
            NodeKind::DocumentType { .. } => NodeType::DocumentType,
            NodeKind::DocumentFragment => NodeType::DocumentFragment,
            NodeKind::Document => NodeType::Document,
        }
    }
}

/// The DOM tree node
///
/// Design philosophy:
/// - Small fixed-size fields first
/// - Use handles instead of pointers
/// - Relationships other than parent/children are derived, not stored
#[derive(Debug, Clone)]
pub struct DomNode {
    pub(crate) id: NodeId,

    // Navigation: parent back-reference plus owned, ordered children
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) children_ids: SmallVec<[NodeId; 4]>,

    pub(crate) node_name: String,
    pub(crate) node_value: Option<String>,
    pub(crate) kind: NodeKind,
}

impl DomNode {
    pub(crate) fn new(id: NodeId, kind: NodeKind, node_name: String) -> Self {
        let node_value = match kind {
            NodeKind::Attribute { .. }
            | NodeKind::Text
            | NodeKind::CdataSection
            | NodeKind::Comment
            | NodeKind::ProcessingInstruction => Some(String::new()),
            _ => None,
        };
        Self {
            id,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value,
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// None for kinds whose DOM nodeValue is null
    pub fn node_value(&self) -> Option<&str> {
        self.node_value.as_deref()
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.is_element() {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// CharacterData and ProcessingInstruction data
    pub fn data(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Text
            | NodeKind::CdataSection
            | NodeKind::Comment
            | NodeKind::ProcessingInstruction => self.node_value.as_deref(),
            _ => None,
        }
    }

    /// Processing instruction target
    pub fn target(&self) -> Option<&str> {
        match self.kind {
            NodeKind::ProcessingInstruction => Some(&self.node_name),
            _ => None,
        }
    }

    /// Attr name
    pub fn name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Attribute { .. } | NodeKind::DocumentType { .. } => Some(&self.node_name),
            _ => None,
        }
    }

    /// Attr value
    pub fn value(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Attribute { .. } => self.node_value.as_deref(),
            _ => None,
        }
    }

    /// Attr `specified` flag. Defaults are not modeled, so always true.
    pub fn specified(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Attribute { specified, .. } => Some(specified),
            _ => None,
        }
    }

    pub fn public_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Entity { public_id, .. } | NodeKind::Notation { public_id, .. } => {
                public_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn system_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Entity { system_id, .. } | NodeKind::Notation { system_id, .. } => {
                system_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn notation_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Entity { notation_name, .. } => notation_name.as_deref(),
            _ => None,
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Check if node is text (CDATA sections excluded)
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text)
    }

    pub(crate) fn attribute_map(&self) -> Option<&NamedNodeMap> {
        match &self.kind {
            NodeKind::Element { attributes } => Some(attributes),
            _ => None,
        }
    }
}
