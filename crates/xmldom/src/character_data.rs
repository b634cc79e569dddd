//! CharacterData (Text, CDATASection, Comment) operations
//!
//! Offsets and counts are measured in chars, not bytes.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;
use crate::utils::char_to_byte;

impl Document {
    fn character_data(&self, node_id: NodeId) -> Result<&str> {
        let node = self.node(node_id)?;
        if node.node_type().is_character_data() {
            Ok(node.node_value().unwrap_or_default())
        } else {
            Err(DomError::invalid_node_type("CharacterData", node.node_type()))
        }
    }

    fn byte_offset(data: &str, offset: usize) -> Result<usize> {
        char_to_byte(data, offset).ok_or(DomError::IndexSize {
            offset,
            length: data.chars().count(),
        })
    }

    /// Replace `data[start..end]` (bytes) after all checks have passed
    fn splice_data(&mut self, node_id: NodeId, start: usize, end: usize, arg: &str) -> Result<()> {
        self.check_writable(node_id)?;
        if let Some(value) = self.node_mut(node_id)?.node_value.as_mut() {
            value.replace_range(start..end, arg);
        }
        Ok(())
    }

    pub fn data(&self, node_id: NodeId) -> Result<&str> {
        self.character_data(node_id)
    }

    pub fn set_data(&mut self, node_id: NodeId, data: &str) -> Result<()> {
        self.character_data(node_id)?;
        self.set_node_value(node_id, data)
    }

    /// Number of chars in the data
    pub fn length(&self, node_id: NodeId) -> Result<usize> {
        Ok(self.character_data(node_id)?.chars().count())
    }

    /// Up to `count` chars starting at `offset`; clipped at the end
    pub fn substring_data(&self, node_id: NodeId, offset: usize, count: usize) -> Result<String> {
        let data = self.character_data(node_id)?;
        let start = Self::byte_offset(data, offset)?;
        Ok(data[start..].chars().take(count).collect())
    }

    pub fn append_data(&mut self, node_id: NodeId, arg: &str) -> Result<()> {
        let end = self.character_data(node_id)?.len();
        self.splice_data(node_id, end, end, arg)
    }

    pub fn insert_data(&mut self, node_id: NodeId, offset: usize, arg: &str) -> Result<()> {
        let start = Self::byte_offset(self.character_data(node_id)?, offset)?;
        self.splice_data(node_id, start, start, arg)
    }

    pub fn delete_data(&mut self, node_id: NodeId, offset: usize, count: usize) -> Result<()> {
        self.replace_data(node_id, offset, count, "")
    }

    /// Replace `count` chars at `offset` with `arg`; `count` is clipped
    pub fn replace_data(
        &mut self,
        node_id: NodeId,
        offset: usize,
        count: usize,
        arg: &str,
    ) -> Result<()> {
        let data = self.character_data(node_id)?;
        let start = Self::byte_offset(data, offset)?;
        let end = offset
            .checked_add(count)
            .and_then(|last| char_to_byte(data, last))
            .unwrap_or(data.len());
        self.splice_data(node_id, start, end, arg)
    }

    /// Split a Text or CDATASection node at `offset`. The node keeps
    /// `[0, offset)`; a new node of the same kind gets the rest and, when the
    /// original is attached, becomes its next sibling.
    pub fn split_text(&mut self, node_id: NodeId, offset: usize) -> Result<NodeId> {
        let node = self.node(node_id)?;
        let node_type = node.node_type();
        if !matches!(node_type, NodeType::Text | NodeType::CdataSection) {
            return Err(DomError::invalid_node_type("Text", node_type));
        }
        let data = node.node_value().unwrap_or_default();
        let split_at = Self::byte_offset(data, offset)?;
        let tail = data[split_at..].to_string();
        let parent = node.parent_id;
        self.check_writable(node_id)?;

        let new_node = match node_type {
            NodeType::CdataSection => self.create_cdata_section(&tail),
            _ => self.create_text_node(&tail),
        };
        if let Some(value) = self.node_mut(node_id)?.node_value.as_mut() {
            value.truncate(split_at);
        }
        if let Some(parent) = parent {
            let index = self
                .child_nodes(parent)?
                .iter()
                .position(|&id| id == node_id)
                .map_or(0, |i| i + 1);
            self.splice_children(parent, index, &[new_node])?;
        }
        Ok(new_node)
    }
}
