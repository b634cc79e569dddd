//! DocumentType, Entity and Notation nodes
//!
//! These kinds are read-only through the public API. The parser builds
//! them from a DOCTYPE declaration: the name, plus whatever `<!ENTITY>` and
//! `<!NOTATION>` declarations the internal subset holds. Nothing is
//! expanded or validated; declarations are only recorded.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;

/// One lexical unit of a markup declaration
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExternalId {
    public_id: Option<String>,
    system_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Declaration {
    InternalEntity {
        name: String,
        value: String,
    },
    ExternalEntity {
        name: String,
        id: ExternalId,
        notation_name: Option<String>,
    },
    Notation {
        name: String,
        id: ExternalId,
    },
}

/// Split a declaration body into tokens, stopping at the closing `>`.
/// Returns the tokens and the byte length consumed (including `>`).
fn tokenize_declaration(body: &str) -> (Vec<Token>, usize) {
    let mut tokens = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '>' => return (tokens, start + 1),
            '"' | '\'' => {
                chars.next();
                let mut end = body.len();
                for (i, q) in chars.by_ref() {
                    if q == c {
                        end = i;
                        break;
                    }
                }
                let literal = body.get(start + 1..end).unwrap_or_default();
                tokens.push(Token::Quoted(literal.to_string()));
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut end = body.len();
                while let Some(&(i, w)) = chars.peek() {
                    if w.is_whitespace() || matches!(w, '>' | '"' | '\'') {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                tokens.push(Token::Word(body[start..end].to_string()));
            }
        }
    }

    (tokens, body.len())
}

/// `SYSTEM "sys"` or `PUBLIC "pub" ["sys"]`, returning the id and how many
/// tokens it used
fn external_id(tokens: &[Token]) -> Option<(ExternalId, usize)> {
    match tokens {
        [Token::Word(kw), Token::Quoted(system), ..] if kw == "SYSTEM" => Some((
            ExternalId {
                public_id: None,
                system_id: Some(system.clone()),
            },
            2,
        )),
        [Token::Word(kw), Token::Quoted(public), Token::Quoted(system), ..] if kw == "PUBLIC" => {
            Some((
                ExternalId {
                    public_id: Some(public.clone()),
                    system_id: Some(system.clone()),
                },
                3,
            ))
        }
        [Token::Word(kw), Token::Quoted(public), ..] if kw == "PUBLIC" => Some((
            ExternalId {
                public_id: Some(public.clone()),
                system_id: None,
            },
            2,
        )),
        _ => None,
    }
}

fn entity_declaration(tokens: &[Token]) -> Option<Declaration> {
    match tokens {
        // Parameter entities only matter to DTD processing
        [Token::Word(percent), ..] if percent == "%" => None,
        [Token::Word(name), Token::Quoted(value), ..] => Some(Declaration::InternalEntity {
            name: name.clone(),
            value: value.clone(),
        }),
        [Token::Word(name), rest @ ..] => {
            let (id, used) = external_id(rest)?;
            let notation_name = match &rest[used..] {
                [Token::Word(kw), Token::Word(notation), ..] if kw == "NDATA" => {
                    Some(notation.clone())
                }
                _ => None,
            };
            Some(Declaration::ExternalEntity {
                name: name.clone(),
                id,
                notation_name,
            })
        }
        _ => None,
    }
}

fn notation_declaration(tokens: &[Token]) -> Option<Declaration> {
    match tokens {
        [Token::Word(name), rest @ ..] => {
            let (id, _) = external_id(rest)?;
            Some(Declaration::Notation {
                name: name.clone(),
                id,
            })
        }
        _ => None,
    }
}

/// Skip past `terminator`, returning the remaining input
fn skip_past<'a>(input: &'a str, terminator: &str) -> &'a str {
    input
        .find(terminator)
        .map_or("", |i| &input[i + terminator.len()..])
}

/// Collect entity and notation declarations from an internal subset
fn scan_internal_subset(mut subset: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();

    loop {
        subset = subset.trim_start();
        if subset.is_empty() {
            break;
        }

        if subset.starts_with("<!--") {
            subset = skip_past(subset, "-->");
        } else if subset.starts_with("<?") {
            subset = skip_past(subset, "?>");
        } else if let Some(body) = subset.strip_prefix("<!ENTITY") {
            let (tokens, used) = tokenize_declaration(body);
            declarations.extend(entity_declaration(&tokens));
            subset = &body[used..];
        } else if let Some(body) = subset.strip_prefix("<!NOTATION") {
            let (tokens, used) = tokenize_declaration(body);
            declarations.extend(notation_declaration(&tokens));
            subset = &body[used..];
        } else if let Some(body) = subset.strip_prefix("<!") {
            // ELEMENT, ATTLIST and anything else: skip, honouring quotes
            let (_, used) = tokenize_declaration(body);
            subset = &body[used..];
        } else {
            // Parameter-entity references and stray characters
            let next = subset.chars().next().map_or(1, char::len_utf8);
            subset = &subset[next..];
        }
    }

    declarations
}

/// Split DOCTYPE content into its name and optional internal subset
fn split_doctype(content: &str) -> (&str, Option<&str>) {
    let content = content.trim();
    let name_end = content
        .find(|c: char| c.is_whitespace() || c == '[')
        .unwrap_or(content.len());
    let name = &content[..name_end];

    // The subset opens at the first '[' outside a quoted literal
    let mut quote: Option<char> = None;
    let mut open = None;
    for (i, c) in content[name_end..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => {
                open = Some(name_end + i + 1);
                break;
            }
            _ => {}
        }
    }

    let subset = open.map(|start| {
        let end = content.rfind(']').filter(|&e| e >= start).unwrap_or(content.len());
        &content[start..end]
    });
    (name, subset)
}

impl Document {
    pub(crate) fn create_document_type(&mut self, name: &str) -> Result<NodeId> {
        if !crate::utils::is_valid_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        Ok(self.arena.alloc(
            NodeKind::DocumentType {
                entities: NamedNodeMap::default(),
                notations: NamedNodeMap::default(),
            },
            name.to_string(),
        ))
    }

    fn doctype_maps_mut(
        &mut self,
        doctype: NodeId,
    ) -> Result<(&mut NamedNodeMap, &mut NamedNodeMap)> {
        let node = self.node_mut(doctype)?;
        let node_type = node.node_type();
        match &mut node.kind {
            NodeKind::DocumentType {
                entities,
                notations,
            } => Ok((entities, notations)),
            _ => Err(DomError::invalid_node_type("DocumentType", node_type)),
        }
    }

    /// Entities declared by a DocumentType, keyed by name
    pub fn entities(&self, doctype: NodeId) -> Result<&NamedNodeMap> {
        let node = self.node(doctype)?;
        match &node.kind {
            NodeKind::DocumentType { entities, .. } => Ok(entities),
            _ => Err(DomError::invalid_node_type("DocumentType", node.node_type())),
        }
    }

    /// Notations declared by a DocumentType, keyed by name
    pub fn notations(&self, doctype: NodeId) -> Result<&NamedNodeMap> {
        let node = self.node(doctype)?;
        match &node.kind {
            NodeKind::DocumentType { notations, .. } => Ok(notations),
            _ => Err(DomError::invalid_node_type("DocumentType", node.node_type())),
        }
    }

    /// Build an unattached DocumentType from the body of a DOCTYPE
    /// declaration (everything between `<!DOCTYPE` and the final `>`).
    ///
    /// The first declaration of a name wins, as in XML.
    pub(crate) fn build_document_type(&mut self, content: &str) -> Result<NodeId> {
        let (name, subset) = split_doctype(content);
        let doctype = self.create_document_type(name)?;

        for declaration in subset.map(scan_internal_subset).unwrap_or_default() {
            match declaration {
                Declaration::InternalEntity { name, value } => {
                    if self.entities(doctype)?.contains_key(&name) {
                        continue;
                    }
                    let entity = self.alloc_entity(&name, ExternalId::default(), None)?;
                    // Character references in the literal are resolved here
                    let replacement = match quick_xml::escape::unescape(&value) {
                        Ok(decoded) => decoded.into_owned(),
                        Err(_) => value.clone(),
                    };
                    let text = self.create_text_node(&replacement);
                    self.push_child(entity, text)?;
                    self.doctype_maps_mut(doctype)?.0.insert(name, entity);
                }
                Declaration::ExternalEntity {
                    name,
                    id,
                    notation_name,
                } => {
                    if self.entities(doctype)?.contains_key(&name) {
                        continue;
                    }
                    let entity = self.alloc_entity(&name, id, notation_name)?;
                    self.doctype_maps_mut(doctype)?.0.insert(name, entity);
                }
                Declaration::Notation { name, id } => {
                    if self.notations(doctype)?.contains_key(&name) {
                        continue;
                    }
                    if !crate::utils::is_valid_name(&name) {
                        return Err(DomError::InvalidCharacter(name));
                    }
                    let notation = self.arena.alloc(
                        NodeKind::Notation {
                            public_id: id.public_id,
                            system_id: id.system_id,
                        },
                        name.clone(),
                    );
                    self.doctype_maps_mut(doctype)?.1.insert(name, notation);
                }
            }
        }

        Ok(doctype)
    }

    fn alloc_entity(
        &mut self,
        name: &str,
        id: ExternalId,
        notation_name: Option<String>,
    ) -> Result<NodeId> {
        if !crate::utils::is_valid_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        Ok(self.arena.alloc(
            NodeKind::Entity {
                public_id: id.public_id,
                system_id: id.system_id,
                notation_name,
            },
            name.to_string(),
        ))
    }
}
