//! Arena-based node storage
//!
//! Every node a Document creates lives in one Vec, addressed by index.
//! There are no Rc/Weak links: a parent back-reference is just another
//! index.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [#document][Node1][Node2]...
//!         ↑ slot 0 is always the Document node
//! ```

use crate::error::{DomError, Result};
use crate::types::{DocumentId, DomNode, NodeId, NodeKind};

/// Arena allocator for DOM nodes
///
/// Nodes are never freed individually. Detached subtrees stay addressable
/// until the owning Document is dropped.
#[derive(Debug, Clone)]
pub struct NodeArena {
    document: DocumentId,
    nodes: Vec<DomNode>,
}

impl NodeArena {
    pub fn new(document: DocumentId) -> Self {
        Self::with_capacity(document, 64)
    }

    pub fn with_capacity(document: DocumentId, capacity: usize) -> Self {
        Self {
            document,
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Allocate an unattached node, returns its ID
    pub fn alloc(&mut self, kind: NodeKind, node_name: String) -> NodeId {
        let id = NodeId {
            document: self.document,
            index: self.nodes.len() as u32,
        };
        self.nodes.push(DomNode::new(id, kind, node_name));
        id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        if node_id.document != self.document {
            return Err(DomError::WrongDocument);
        }
        self.nodes
            .get(node_id.index as usize)
            .ok_or(DomError::NodeNotFound(node_id.index))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        if node_id.document != self.document {
            return Err(DomError::WrongDocument);
        }
        self.nodes
            .get_mut(node_id.index as usize)
            .ok_or(DomError::NodeNotFound(node_id.index))
    }

    /// Total number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk from `node_id` up to the root, starting with the node itself
    pub fn ancestors_or_self(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = Some(node_id);
        while let Some(id) = current {
            chain.push(id);
            current = self.get(id)?.parent_id;
        }
        Ok(chain)
    }

    /// Traverse a subtree depth-first in document order (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Collect the subtree under `start_id` matching a predicate, in document order
    pub fn find_in_subtree<F>(&self, start_id: NodeId, predicate: F) -> Result<Vec<NodeId>>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        self.traverse_df(start_id, |node| {
            if predicate(node) {
                found.push(node.id);
            }
            Ok(())
        })?;
        Ok(found)
    }
}
