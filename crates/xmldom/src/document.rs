//! Document - root container and exclusive node factory
//!
//! A Document owns every node it creates. Nodes come out of the factory
//! unattached and are placed into the tree by the mutator (see
//! `mutation.rs`). Read access goes through `node()` for per-node data and
//! through the relational getters here for anything involving links.

use crate::arena::NodeArena;
use crate::error::{DomError, Result};
use crate::types::*;
use crate::utils;

/// DOM implementation capability query
#[derive(Debug, Clone, Copy, Default)]
pub struct DomImplementation;

impl DomImplementation {
    /// Only the XML 1.0 feature is implemented
    pub fn has_feature(&self, feature: &str, version: &str) -> bool {
        feature.eq_ignore_ascii_case("XML") && (version.is_empty() || version == "1.0")
    }

    pub fn require_feature(&self, feature: &str, version: &str) -> Result<()> {
        if self.has_feature(feature, version) {
            Ok(())
        } else {
            Err(DomError::NotSupported(format!("{} {}", feature, version)))
        }
    }
}

/// An XML document and the arena holding all of its nodes
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    pub(crate) arena: NodeArena,
    root: NodeId,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        let id = DocumentId::new();
        let mut arena = NodeArena::new(id);
        let root = arena.alloc(NodeKind::Document, "#document".to_string());
        Self { id, arena, root }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Handle of the Document node itself
    pub fn document_node(&self) -> NodeId {
        self.root
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Number of nodes this document has created, including itself.
    ///
    /// Slots are never reused: removed attributes, text merged away by
    /// `normalize` and unattached clones keep counting until the Document
    /// is dropped. Long-lived documents that churn nodes grow accordingly.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn implementation(&self) -> DomImplementation {
        DomImplementation
    }

    /// Get node by ID
    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.arena.get_mut(node_id)
    }

    pub fn node_type(&self, node_id: NodeId) -> Result<NodeType> {
        Ok(self.node(node_id)?.node_type())
    }

    // ---- factory -------------------------------------------------------

    fn checked_name(name: &str) -> Result<String> {
        if utils::is_valid_name(name) {
            Ok(name.to_string())
        } else {
            Err(DomError::InvalidCharacter(name.to_string()))
        }
    }

    fn create_with_value(&mut self, kind: NodeKind, name: String, value: &str) -> NodeId {
        let id = self.arena.alloc(kind, name);
        if let Ok(node) = self.arena.get_mut(id) {
            node.node_value = Some(value.to_string());
        }
        id
    }

    pub fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
        let name = Self::checked_name(tag_name)?;
        Ok(self.arena.alloc(
            NodeKind::Element {
                attributes: NamedNodeMap::default(),
            },
            name,
        ))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.arena
            .alloc(NodeKind::DocumentFragment, "#document-fragment".to_string())
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.create_with_value(NodeKind::Text, "#text".to_string(), data)
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.create_with_value(NodeKind::Comment, "#comment".to_string(), data)
    }

    pub fn create_cdata_section(&mut self, data: &str) -> NodeId {
        self.create_with_value(NodeKind::CdataSection, "#cdata-section".to_string(), data)
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> Result<NodeId> {
        let name = Self::checked_name(target)?;
        Ok(self.create_with_value(NodeKind::ProcessingInstruction, name, data))
    }

    /// New Attr with an empty value
    pub fn create_attribute(&mut self, name: &str) -> Result<NodeId> {
        let name = Self::checked_name(name)?;
        Ok(self.arena.alloc(
            NodeKind::Attribute {
                owner_element: None,
                specified: true,
            },
            name,
        ))
    }

    pub fn create_entity_reference(&mut self, name: &str) -> Result<NodeId> {
        let name = Self::checked_name(name)?;
        Ok(self.arena.alloc(NodeKind::EntityReference, name))
    }

    // ---- node capability set -------------------------------------------

    pub fn node_name(&self, node_id: NodeId) -> Result<&str> {
        Ok(self.node(node_id)?.node_name())
    }

    pub fn node_value(&self, node_id: NodeId) -> Result<Option<&str>> {
        Ok(self.node(node_id)?.node_value())
    }

    /// Set nodeValue. Has no effect on kinds whose nodeValue is null.
    pub fn set_node_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.check_writable(node_id)?;
        let node = self.node_mut(node_id)?;
        if let Some(current) = node.node_value.as_mut() {
            current.clear();
            current.push_str(value);
        }
        Ok(())
    }

    pub fn parent_node(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(node_id)?.parent_id)
    }

    pub fn child_nodes(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(node_id)?.children_ids)
    }

    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.child_nodes(node_id)?.first().copied())
    }

    pub fn last_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.child_nodes(node_id)?.last().copied())
    }

    /// Position of a node among its parent's children, with that parent
    fn sibling_slot(&self, node_id: NodeId) -> Result<Option<(&[NodeId], usize)>> {
        let Some(parent_id) = self.parent_node(node_id)? else {
            return Ok(None);
        };
        let siblings = self.child_nodes(parent_id)?;
        Ok(siblings
            .iter()
            .position(|&id| id == node_id)
            .map(|index| (siblings, index)))
    }

    pub fn previous_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self
            .sibling_slot(node_id)?
            .and_then(|(siblings, index)| index.checked_sub(1).map(|i| siblings[i])))
    }

    pub fn next_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self
            .sibling_slot(node_id)?
            .and_then(|(siblings, index)| siblings.get(index + 1).copied()))
    }

    /// Attribute map, present only on elements
    pub fn attributes(&self, node_id: NodeId) -> Result<Option<&NamedNodeMap>> {
        Ok(self.node(node_id)?.attribute_map())
    }

    /// None for the Document node itself
    pub fn owner_document(&self, node_id: NodeId) -> Result<Option<DocumentId>> {
        let node = self.node(node_id)?;
        Ok(match node.kind {
            NodeKind::Document => None,
            _ => Some(node.id.document),
        })
    }

    /// Whether `node_id` is inside a read-only region: DocumentType, Entity
    /// and Notation nodes, plus the content of entities and entity references.
    pub fn is_read_only(&self, node_id: NodeId) -> Result<bool> {
        for id in self.arena.ancestors_or_self(node_id)? {
            let node_type = self.node_type(id)?;
            if node_type.is_read_only() || node_type == NodeType::EntityReference {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn check_writable(&self, node_id: NodeId) -> Result<()> {
        if self.is_read_only(node_id)? {
            Err(DomError::NoModificationAllowed(self.node_type(node_id)?))
        } else {
            Ok(())
        }
    }

    // ---- document-level lookups ----------------------------------------

    fn child_of_type(&self, node_type: NodeType) -> Option<NodeId> {
        let root = self.arena.get(self.root).ok()?;
        root.children_ids.iter().copied().find(|&id| {
            self.arena
                .get(id)
                .map(|n| n.node_type() == node_type)
                .unwrap_or(false)
        })
    }

    /// The single top-level Element, if one has been attached
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_of_type(NodeType::Element)
    }

    pub fn doctype(&self) -> Option<NodeId> {
        self.child_of_type(NodeType::DocumentType)
    }

    /// All elements named `name` (or all, for `"*"`) in the document
    /// element's subtree, in document order. The document element itself
    /// is included when it matches.
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        let Some(document_element) = self.document_element() else {
            return Vec::new();
        };
        self.arena
            .find_in_subtree(document_element, |node| {
                node.is_element() && (name == "*" || node.node_name == name)
            })
            .unwrap_or_default()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty_tree() {
        let doc = Document::new();
        let root = doc.document_node();
        assert_eq!(doc.node_type(root).unwrap(), NodeType::Document);
        assert_eq!(doc.node_name(root).unwrap(), "#document");
        assert_eq!(doc.owner_document(root).unwrap(), None);
        assert_eq!(doc.document_element(), None);
        assert_eq!(doc.doctype(), None);
        assert!(doc.elements_by_tag_name("*").is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_factory_stamps_owner_and_leaves_unattached() {
        let mut doc = Document::new();
        let before = doc.len();

        let element = doc.create_element("item").unwrap();
        let text = doc.create_text_node("hi");
        let comment = doc.create_comment("c");
        let cdata = doc.create_cdata_section("<raw>");
        let pi = doc.create_processing_instruction("xml-stylesheet", "href=\"a\"").unwrap();
        let attr = doc.create_attribute("id").unwrap();
        let entity_ref = doc.create_entity_reference("nbsp").unwrap();
        let fragment = doc.create_document_fragment();

        let created = [element, text, comment, cdata, pi, attr, entity_ref, fragment];
        for id in created {
            assert_eq!(doc.owner_document(id).unwrap(), Some(doc.id()));
            assert_eq!(doc.parent_node(id).unwrap(), None);
        }
        assert_eq!(doc.len(), before + created.len());
        assert!(!doc.has_child_nodes(doc.document_node()).unwrap());

        assert_eq!(doc.node(element).unwrap().tag_name(), Some("item"));
        assert_eq!(doc.node(text).unwrap().data(), Some("hi"));
        assert_eq!(doc.node(cdata).unwrap().node_type(), NodeType::CdataSection);
        assert_eq!(doc.node(pi).unwrap().target(), Some("xml-stylesheet"));
        assert_eq!(doc.node(pi).unwrap().data(), Some("href=\"a\""));
        assert_eq!(doc.node(attr).unwrap().value(), Some(""));
        assert_eq!(doc.node(attr).unwrap().specified(), Some(true));
        assert_eq!(doc.node_name(fragment).unwrap(), "#document-fragment");
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut doc = Document::new();
        assert_eq!(
            doc.create_element("1bad").unwrap_err(),
            DomError::InvalidCharacter("1bad".to_string())
        );
        assert!(doc.create_attribute("a b").is_err());
        assert!(doc.create_processing_instruction("", "x").is_err());
        assert!(doc.create_entity_reference("&amp;").is_err());
    }

    #[test]
    fn test_set_node_value() {
        let mut doc = Document::new();
        let text = doc.create_text_node("old");
        doc.set_node_value(text, "new").unwrap();
        assert_eq!(doc.node_value(text).unwrap(), Some("new"));

        // Null nodeValue: setting has no effect
        let element = doc.create_element("e").unwrap();
        doc.set_node_value(element, "ignored").unwrap();
        assert_eq!(doc.node_value(element).unwrap(), None);
    }

    #[test]
    fn test_implementation_features() {
        let doc = Document::new();
        let implementation = doc.implementation();
        assert!(implementation.has_feature("XML", "1.0"));
        assert!(implementation.has_feature("xml", ""));
        assert!(!implementation.has_feature("HTML", "1.0"));
        assert!(!implementation.has_feature("XML", "2.0"));
        assert!(matches!(
            implementation.require_feature("HTML", "1.0"),
            Err(DomError::NotSupported(_))
        ));
    }

    #[test]
    fn test_entity_reference_is_read_only() {
        let mut doc = Document::new();
        let entity_ref = doc.create_entity_reference("copy").unwrap();
        let element = doc.create_element("e").unwrap();
        assert!(doc.is_read_only(entity_ref).unwrap());
        assert!(!doc.is_read_only(element).unwrap());
    }
}
