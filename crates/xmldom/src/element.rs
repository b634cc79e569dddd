//! Element and Attr operations
//!
//! Attributes live in a name-keyed map on the element, one Attr node per
//! name. An Attr's value is its nodeValue; it never has children.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;

impl Document {
    fn element(&self, node_id: NodeId) -> Result<&DomNode> {
        let node = self.node(node_id)?;
        if node.is_element() {
            Ok(node)
        } else {
            Err(DomError::invalid_node_type("Element", node.node_type()))
        }
    }

    pub(crate) fn attributes_mut(&mut self, element: NodeId) -> Result<&mut NamedNodeMap> {
        let node = self.node_mut(element)?;
        let node_type = node.node_type();
        match &mut node.kind {
            NodeKind::Element { attributes } => Ok(attributes),
            _ => Err(DomError::invalid_node_type("Element", node_type)),
        }
    }

    fn set_owner_element(&mut self, attr: NodeId, owner: Option<NodeId>) -> Result<()> {
        if let NodeKind::Attribute { owner_element, .. } = &mut self.node_mut(attr)?.kind {
            *owner_element = owner;
        }
        Ok(())
    }

    pub fn tag_name(&self, element: NodeId) -> Result<&str> {
        Ok(self.element(element)?.node_name())
    }

    /// Value of the named attribute, None when absent
    pub fn attribute(&self, element: NodeId, name: &str) -> Result<Option<&str>> {
        match self.attribute_node(element, name)? {
            Some(attr) => Ok(self.node(attr)?.value()),
            None => Ok(None),
        }
    }

    /// Set an attribute value. An existing Attr of that name is updated in
    /// place, so the map never holds duplicates.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<()> {
        self.element(element)?;
        self.check_writable(element)?;

        if let Some(attr) = self.attribute_node(element, name)? {
            return self.set_node_value(attr, value);
        }

        let attr = self.create_attribute(name)?;
        self.set_node_value(attr, value)?;
        self.set_owner_element(attr, Some(element))?;
        self.attributes_mut(element)?.insert(name.to_string(), attr);
        Ok(())
    }

    /// Remove the named attribute. Absent names are a no-op.
    ///
    /// The Attr node becomes unowned but keeps its arena slot, so a handle
    /// taken earlier stays valid.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<()> {
        self.element(element)?;
        self.check_writable(element)?;
        if let Some(attr) = self.attributes_mut(element)?.remove(name) {
            self.set_owner_element(attr, None)?;
        }
        Ok(())
    }

    pub fn attribute_node(&self, element: NodeId, name: &str) -> Result<Option<NodeId>> {
        Ok(self
            .element(element)?
            .attribute_map()
            .and_then(|attributes| attributes.get(name).copied()))
    }

    /// Attach an Attr node, replacing any attribute with the same name.
    /// Returns the replaced Attr.
    pub fn set_attribute_node(&mut self, element: NodeId, attr: NodeId) -> Result<Option<NodeId>> {
        self.element(element)?;
        let attr_node = self.node(attr)?;
        let NodeKind::Attribute { owner_element, .. } = attr_node.kind else {
            return Err(DomError::HierarchyRequest(format!(
                "{:?} cannot be set as an attribute",
                attr_node.node_type()
            )));
        };
        let name = attr_node.node_name.clone();

        match owner_element {
            Some(owner) if owner == element => return Ok(None),
            Some(_) => return Err(DomError::InUseAttribute(name)),
            None => {}
        }
        self.check_writable(element)?;

        let replaced = self.attributes_mut(element)?.insert(name, attr);
        if let Some(old) = replaced {
            self.set_owner_element(old, None)?;
        }
        self.set_owner_element(attr, Some(element))?;
        Ok(replaced)
    }

    /// Detach the given Attr from `element`
    pub fn remove_attribute_node(&mut self, element: NodeId, attr: NodeId) -> Result<NodeId> {
        self.element(element)?;
        let name = self.node(attr)?.node_name.clone();
        if self.attribute_node(element, &name)? != Some(attr) {
            return Err(DomError::NotFound(format!(
                "attribute {:?} does not belong to this element",
                name
            )));
        }
        self.check_writable(element)?;
        self.attributes_mut(element)?.remove(&name);
        self.set_owner_element(attr, None)?;
        Ok(attr)
    }

    /// Descendant elements of `element` named `name` (or all, for `"*"`)
    /// in document order. `element` itself is never included.
    pub fn descendant_elements_by_tag_name(
        &self,
        element: NodeId,
        name: &str,
    ) -> Result<Vec<NodeId>> {
        self.element(element)?;
        let found = self.arena.find_in_subtree(element, |node| {
            node.is_element() && (name == "*" || node.node_name == name)
        })?;
        Ok(found.into_iter().filter(|&id| id != element).collect())
    }

    /// Merge adjacent Text nodes and drop empty ones throughout the subtree.
    /// CDATA sections are left as they are.
    pub fn normalize(&mut self, node_id: NodeId) -> Result<()> {
        self.check_writable(node_id)?;

        let parents = self
            .arena
            .find_in_subtree(node_id, |node| !node.children_ids.is_empty())?;

        let mut merged = 0usize;
        let mut removed = 0usize;
        for parent in parents {
            let children = self.child_nodes(parent)?.to_vec();
            let mut run_start: Option<NodeId> = None;

            for child in children {
                let node = self.node(child)?;
                if !node.is_text() {
                    run_start = None;
                    continue;
                }
                let data = node.node_value().unwrap_or_default().to_string();

                if data.is_empty() {
                    self.detach(child)?;
                    removed += 1;
                } else if let Some(start) = run_start {
                    if let Some(value) = self.node_mut(start)?.node_value.as_mut() {
                        value.push_str(&data);
                    }
                    self.detach(child)?;
                    merged += 1;
                } else {
                    run_start = Some(child);
                }
            }
        }

        if merged + removed > 0 {
            tracing::debug!(
                "[Document] normalize merged {} and removed {} text nodes",
                merged,
                removed
            );
        }
        Ok(())
    }
}
