//! DOM Serializer - Convert a DOM subtree back to XML text
//!
//! Output is canonical rather than byte-faithful: attributes come out
//! sorted by name, empty elements may self-close, and a DocumentType is
//! rebuilt from its entity and notation maps. Reparsing the output gives
//! back the same structure. Comment or processing instruction data that
//! would end its markup early is refused with `InvalidCharacter`.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;
use quick_xml::escape::{escape, partial_escape};
use serde::{Deserialize, Serialize};

/// Serializer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Prefix a Document with `<?xml version="1.0" encoding="UTF-8"?>`
    pub xml_declaration: bool,
    /// Write childless elements as `<x/>`
    pub self_close_empty: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            xml_declaration: false,
            self_close_empty: true,
        }
    }
}

/// DOM tree serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize `node_id` and everything below it
    pub fn serialize(&self, document: &Document, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);

        if self.config.xml_declaration && document.node_type(node_id)? == NodeType::Document {
            output.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        }
        self.serialize_node(document, node_id, &mut output)?;

        Ok(output)
    }

    /// Serialize a subtree, walking it with an explicit stack
    fn serialize_node(
        &self,
        document: &Document,
        node_id: NodeId,
        output: &mut String,
    ) -> Result<()> {
        let mut stack = vec![Frame::Open(node_id)];

        while let Some(frame) = stack.pop() {
            let node_id = match frame {
                Frame::Open(id) => id,
                Frame::Close(name) => {
                    output.push_str("</");
                    output.push_str(name);
                    output.push('>');
                    continue;
                }
            };

            let node = document.node(node_id)?;
            let value = node.node_value().unwrap_or_default();

            match node.kind() {
                NodeKind::Element { attributes } => {
                    output.push('<');
                    output.push_str(node.node_name());

                    let mut sorted: Vec<(&String, &NodeId)> = attributes.iter().collect();
                    sorted.sort_by(|a, b| a.0.cmp(b.0));
                    for (name, &attr) in sorted {
                        let attr_value = document.node(attr)?.value().unwrap_or_default();
                        output.push(' ');
                        output.push_str(name);
                        output.push_str("=\"");
                        output.push_str(&escape(attr_value));
                        output.push('"');
                    }

                    if node.children_ids.is_empty() && self.config.self_close_empty {
                        output.push_str("/>");
                        continue;
                    }
                    output.push('>');
                    stack.push(Frame::Close(node.node_name()));
                    push_children(&mut stack, node);
                }
                NodeKind::Attribute { .. } => output.push_str(&escape(value)),
                NodeKind::Text => output.push_str(&partial_escape(value)),
                NodeKind::CdataSection => {
                    // A literal "]]>" has to be split across two sections
                    output.push_str("<![CDATA[");
                    output.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
                    output.push_str("]]>");
                }
                NodeKind::Comment => {
                    if value.contains("--") || value.ends_with('-') {
                        return Err(DomError::InvalidCharacter(format!(
                            "comment data {:?} cannot be written as XML",
                            value
                        )));
                    }
                    output.push_str("<!--");
                    output.push_str(value);
                    output.push_str("-->");
                }
                NodeKind::ProcessingInstruction => {
                    if value.contains("?>") {
                        return Err(DomError::InvalidCharacter(format!(
                            "processing instruction data {:?} cannot be written as XML",
                            value
                        )));
                    }
                    output.push_str("<?");
                    output.push_str(node.node_name());
                    if !value.is_empty() {
                        output.push(' ');
                        output.push_str(value);
                    }
                    output.push_str("?>");
                }
                NodeKind::EntityReference => {
                    output.push('&');
                    output.push_str(node.node_name());
                    output.push(';');
                }
                NodeKind::DocumentType {
                    entities,
                    notations,
                } => {
                    output.push_str("<!DOCTYPE ");
                    output.push_str(node.node_name());
                    if !entities.is_empty() || !notations.is_empty() {
                        output.push_str(" [");
                        self.serialize_declarations(document, entities, "ENTITY", output)?;
                        self.serialize_declarations(document, notations, "NOTATION", output)?;
                        output.push(']');
                    }
                    output.push('>');
                }
                NodeKind::Document | NodeKind::DocumentFragment => {
                    push_children(&mut stack, node);
                }
                NodeKind::Entity { .. } | NodeKind::Notation { .. } => {}
            }
        }

        Ok(())
    }

    /// `<!ENTITY ..>` or `<!NOTATION ..>` lines of an internal subset,
    /// sorted by name
    fn serialize_declarations(
        &self,
        document: &Document,
        map: &NamedNodeMap,
        keyword: &str,
        output: &mut String,
    ) -> Result<()> {
        let mut names: Vec<&String> = map.keys().collect();
        names.sort();

        for name in names {
            let node = document.node(map[name])?;
            output.push_str("<!");
            output.push_str(keyword);
            output.push(' ');
            output.push_str(name);

            match (node.public_id(), node.system_id()) {
                (Some(public_id), system_id) => {
                    output.push_str(&format!(" PUBLIC \"{}\"", public_id));
                    if let Some(system_id) = system_id {
                        output.push_str(&format!(" \"{}\"", system_id));
                    }
                }
                (None, Some(system_id)) => {
                    output.push_str(&format!(" SYSTEM \"{}\"", system_id));
                }
                (None, None) if node.node_type() == NodeType::Entity => {
                    let replacement = crate::utils::text_content(document, node.id())?;
                    output.push_str(" \"");
                    output.push_str(&entity_literal(&replacement));
                    output.push('"');
                }
                (None, None) => {}
            }
            if let Some(notation) = node.notation_name() {
                output.push_str(" NDATA ");
                output.push_str(notation);
            }
            output.push('>');
        }
        Ok(())
    }
}

/// Pending work for the serializer walk
enum Frame<'a> {
    /// Write the node and queue its children
    Open(NodeId),
    /// Write the end tag of an element whose children are done
    Close(&'a str),
}

/// Queue children so that the first one is popped first
fn push_children<'a>(stack: &mut Vec<Frame<'a>>, node: &'a DomNode) {
    stack.extend(node.children_ids.iter().rev().map(|&child| Frame::Open(child)));
}

/// Quote an entity replacement text so that it reads back unchanged
fn entity_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => literal.push_str("&#38;"),
            '%' => literal.push_str("&#37;"),
            '"' => literal.push_str("&#34;"),
            '<' => literal.push_str("&#60;"),
            _ => literal.push(c),
        }
    }
    literal
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}
