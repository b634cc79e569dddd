//! Tree mutator - structural operations shared by every node kind
//!
//! Every public operation validates completely before it touches the tree,
//! so an `Err` always means "nothing changed". The only stored links are
//! `parent_id` and `children_ids`; the helpers at the bottom keep those two
//! consistent and nothing else needs updating.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;
use crate::utils;
use smallvec::SmallVec;

type Moved = SmallVec<[NodeId; 4]>;

impl Document {
    /// Insert `new_child` before `ref_child` in `parent`'s children, or
    /// append it when `ref_child` is None.
    ///
    /// A DocumentFragment contributes its children instead of itself and is
    /// left empty. Returns `new_child`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> Result<NodeId> {
        let moved = self.validate_insertion(parent, new_child, None)?;

        if let Some(reference) = ref_child {
            if !self.child_nodes(parent)?.contains(&reference) {
                return Err(DomError::NotFound(
                    "reference node is not a child of this node".to_string(),
                ));
            }
            if reference == new_child {
                return Ok(new_child);
            }
        }

        self.detach_all(&moved)?;
        let index = match ref_child {
            Some(reference) => self.child_index(parent, reference)?,
            None => self.child_nodes(parent)?.len(),
        };
        self.splice_children(parent, index, &moved)?;
        Ok(new_child)
    }

    /// Append `new_child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, new_child: NodeId) -> Result<NodeId> {
        self.insert_before(parent, new_child, None)
    }

    /// Put `new_child` where `old_child` is and detach `old_child`.
    /// Returns the replaced node.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<NodeId> {
        let moved = self.validate_insertion(parent, new_child, Some(old_child))?;

        if !self.child_nodes(parent)?.contains(&old_child) {
            return Err(DomError::NotFound(
                "old node is not a child of this node".to_string(),
            ));
        }
        if old_child == new_child {
            return Ok(old_child);
        }

        self.detach_all(&moved)?;
        let index = self.child_index(parent, old_child)?;
        self.detach(old_child)?;
        self.splice_children(parent, index, &moved)?;
        Ok(old_child)
    }

    /// Detach `old_child` from `parent`. The subtree under it is untouched.
    pub fn remove_child(&mut self, parent: NodeId, old_child: NodeId) -> Result<NodeId> {
        self.check_writable(parent)?;
        if !self.child_nodes(parent)?.contains(&old_child) {
            return Err(DomError::NotFound(
                "node is not a child of this node".to_string(),
            ));
        }
        self.detach(old_child)?;
        Ok(old_child)
    }

    pub fn has_child_nodes(&self, node_id: NodeId) -> Result<bool> {
        Ok(!self.child_nodes(node_id)?.is_empty())
    }

    /// Copy a node into a new, unattached node of this document.
    ///
    /// Element attributes and DocumentType entity/notation maps are always
    /// copied; children only when `deep` is set.
    pub fn clone_node(&mut self, node_id: NodeId, deep: bool) -> Result<NodeId> {
        if self.node_type(node_id)? == NodeType::Document {
            return Err(DomError::NotSupported("cloning a Document".to_string()));
        }

        let copy = self.clone_single(node_id)?;
        if !deep {
            return Ok(copy);
        }

        // (source child, parent in the copy)
        let mut stack: Vec<(NodeId, NodeId)> = self
            .child_nodes(node_id)?
            .iter()
            .rev()
            .map(|&child| (child, copy))
            .collect();

        while let Some((source, parent)) = stack.pop() {
            let child_copy = self.clone_single(source)?;
            self.push_child(parent, child_copy)?;
            for &grandchild in self.child_nodes(source)?.iter().rev() {
                stack.push((grandchild, child_copy));
            }
        }

        Ok(copy)
    }

    /// Clone one node and its owned maps, never its children
    fn clone_single(&mut self, source: NodeId) -> Result<NodeId> {
        let node = self.node(source)?;
        let name = node.node_name.clone();
        let value = node.node_value.clone();
        let kind = node.kind.clone();

        let new_kind = match &kind {
            NodeKind::Element { .. } => NodeKind::Element {
                attributes: NamedNodeMap::default(),
            },
            NodeKind::Attribute { specified, .. } => NodeKind::Attribute {
                owner_element: None,
                specified: *specified,
            },
            NodeKind::DocumentType { .. } => NodeKind::DocumentType {
                entities: NamedNodeMap::default(),
                notations: NamedNodeMap::default(),
            },
            other => other.clone(),
        };

        let copy = self.arena.alloc(new_kind, name);
        self.node_mut(copy)?.node_value = value;

        match kind {
            NodeKind::Element { attributes } => {
                for (attr_name, attr) in attributes {
                    let attr_copy = self.clone_single(attr)?;
                    if let NodeKind::Attribute { owner_element, .. } =
                        &mut self.node_mut(attr_copy)?.kind
                    {
                        *owner_element = Some(copy);
                    }
                    self.attributes_mut(copy)?.insert(attr_name, attr_copy);
                }
            }
            NodeKind::DocumentType {
                entities,
                notations,
            } => {
                let mut entity_copies = NamedNodeMap::default();
                for (entity_name, entity) in entities {
                    entity_copies.insert(entity_name, self.clone_node(entity, true)?);
                }
                let mut notation_copies = NamedNodeMap::default();
                for (notation_name, notation) in notations {
                    notation_copies.insert(notation_name, self.clone_node(notation, false)?);
                }
                if let NodeKind::DocumentType {
                    entities,
                    notations,
                } = &mut self.node_mut(copy)?.kind
                {
                    *entities = entity_copies;
                    *notations = notation_copies;
                }
            }
            _ => {}
        }

        Ok(copy)
    }

    /// All checks shared by insert and replace. Returns the nodes that will
    /// actually be placed under `parent` (a fragment's children, or the node).
    fn validate_insertion(
        &self,
        parent: NodeId,
        new_child: NodeId,
        replacing: Option<NodeId>,
    ) -> Result<Moved> {
        let parent_type = self.node_type(parent)?;
        let new_node = self.node(new_child)?;
        let new_type = new_node.node_type();

        if new_type == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "a Document cannot be inserted into a tree".to_string(),
            ));
        }
        if self.arena.ancestors_or_self(parent)?.contains(&new_child) {
            return Err(DomError::HierarchyRequest(
                "node is the parent or one of its ancestors".to_string(),
            ));
        }
        self.check_writable(parent)?;
        if let Some(old_parent) = new_node.parent_id {
            self.check_writable(old_parent)?;
        }

        let moved: Moved = if new_type == NodeType::DocumentFragment {
            new_node.children_ids.clone()
        } else {
            smallvec::smallvec![new_child]
        };

        for &id in &moved {
            let node = self.node(id)?;
            let child_type = node.node_type();
            if !parent_type.allows_child(child_type) {
                return Err(DomError::HierarchyRequest(format!(
                    "{:?} cannot be a child of {:?}",
                    child_type, parent_type
                )));
            }
            if parent_type == NodeType::Document
                && child_type == NodeType::Text
                && !utils::is_xml_whitespace(node.node_value().unwrap_or_default())
            {
                return Err(DomError::HierarchyRequest(
                    "only whitespace text may be a child of a Document".to_string(),
                ));
            }
        }

        if parent_type == NodeType::Document {
            for unique in [NodeType::Element, NodeType::DocumentType] {
                let incoming = self.count_of_type(&moved, unique)?;
                if incoming == 0 {
                    continue;
                }
                let staying: Vec<NodeId> = self
                    .child_nodes(parent)?
                    .iter()
                    .copied()
                    .filter(|id| Some(*id) != replacing && !moved.contains(id))
                    .collect();
                if incoming + self.count_of_type(&staying, unique)? > 1 {
                    return Err(DomError::HierarchyRequest(format!(
                        "a Document may have only one {:?} child",
                        unique
                    )));
                }
            }
        }

        Ok(moved)
    }

    fn count_of_type(&self, ids: &[NodeId], node_type: NodeType) -> Result<usize> {
        let mut count = 0;
        for &id in ids {
            if self.node_type(id)? == node_type {
                count += 1;
            }
        }
        Ok(count)
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.child_nodes(parent)?
            .iter()
            .position(|&id| id == child)
            .ok_or_else(|| DomError::NotFound("node is not a child of this node".to_string()))
    }

    // ---- raw link maintenance (no validation) ---------------------------

    /// Unlink a node from its parent, if it has one
    pub(crate) fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent) = self.node(node_id)?.parent_id else {
            return Ok(());
        };
        self.node_mut(parent)?
            .children_ids
            .retain(|id| *id != node_id);
        self.node_mut(node_id)?.parent_id = None;
        Ok(())
    }

    fn detach_all(&mut self, nodes: &[NodeId]) -> Result<()> {
        for &id in nodes {
            self.detach(id)?;
        }
        Ok(())
    }

    /// Insert already-detached nodes at `index` of `parent`'s children
    pub(crate) fn splice_children(
        &mut self,
        parent: NodeId,
        index: usize,
        nodes: &[NodeId],
    ) -> Result<()> {
        self.node_mut(parent)?
            .children_ids
            .insert_many(index, nodes.iter().copied());
        for &id in nodes {
            self.node_mut(id)?.parent_id = Some(parent);
        }
        Ok(())
    }

    /// Append a detached node during construction (parser, clone)
    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.child_nodes(parent)?.len();
        self.splice_children(parent, index, &[child])
    }
}
