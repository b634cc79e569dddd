//! XML Parser - Build a Document from XML bytes
//!
//! quick-xml does the tokenizing. A [`TreeBuilder`] keeps one cursor (the
//! node currently open) and turns each event into DOM calls, so every node
//! the parser creates goes through the same checks as hand-built trees.

use crate::document::Document;
use crate::error::{DomError, ParseError, ParseResult, TextPosition};
use crate::types::*;
use crate::utils::{is_valid_name, is_xml_whitespace, text_position};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Entities every XML processor knows without a declaration
const PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "apos", "quot"];

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Keep whitespace-only text between top-level nodes as Text children
    /// of the Document
    pub preserve_top_level_whitespace: bool,
    pub keep_comments: bool,
    pub keep_processing_instructions: bool,
    /// Deepest element nesting accepted before the parse is aborted
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            preserve_top_level_whitespace: false,
            keep_comments: true,
            keep_processing_instructions: true,
            max_depth: 1024,
        }
    }
}

/// XML to DOM parser
#[derive(Debug, Clone, Default)]
pub struct DomParser {
    config: ParserConfig,
}

impl DomParser {
    /// Create parser with default config
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create parser with custom config
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a complete XML document.
    ///
    /// Either the whole input becomes a Document or nothing does: on error
    /// the partly built tree is dropped.
    pub fn parse_xml(&self, input: &[u8]) -> ParseResult<Document> {
        tracing::debug!("[DomParser] Parsing {} bytes", input.len());

        let result = self.build(input);
        match &result {
            Ok(document) => tracing::debug!(
                "[DomParser] Built {} nodes (document element: {})",
                document.len(),
                document.document_element().is_some()
            ),
            Err(err) => tracing::warn!("[DomParser] Parse failed: {}", err),
        }
        result
    }

    fn build(&self, input: &[u8]) -> ParseResult<Document> {
        let mut reader = Reader::from_reader(input);
        let reader_config = reader.config_mut();
        reader_config.trim_text_start = false;
        reader_config.trim_text_end = false;
        reader_config.expand_empty_elements = true;
        // Stray and mismatched end tags are reported by the builder
        reader_config.check_end_names = false;
        reader_config.allow_unmatched_ends = true;

        let mut builder = TreeBuilder::new(&self.config, input);

        loop {
            builder.offset = reader.buffer_position() as usize;

            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let (name, attributes) = builder.decode_start(&e)?;
                    builder.start_element(name, &attributes)?;
                }
                Ok(Event::Empty(e)) => {
                    let (name, attributes) = builder.decode_start(&e)?;
                    builder.start_element(name, &attributes)?;
                    builder.end_element(name)?;
                }
                Ok(Event::End(e)) => {
                    let name = builder.utf8(e.name().into_inner())?;
                    builder.end_element(name)?;
                }
                Ok(Event::Text(e)) => {
                    let raw = builder.utf8(&e)?;
                    builder.text(raw)?;
                }
                Ok(Event::CData(e)) => {
                    let data = builder.utf8(&e)?;
                    builder.cdata(data)?;
                }
                Ok(Event::Comment(e)) => {
                    let data = builder.utf8(&e)?;
                    builder.comment(data)?;
                }
                Ok(Event::PI(e)) => {
                    let target = builder.utf8(e.target())?;
                    let data = builder.utf8(e.content())?;
                    builder.processing_instruction(target, data)?;
                }
                Ok(Event::DocType(e)) => {
                    let content = builder.utf8(&e)?;
                    builder.doctype(content)?;
                }
                Ok(Event::Decl(_)) => {
                    // Version and encoding are not part of the tree
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml {
                        message: e.to_string(),
                        position: text_position(input, reader.error_position() as usize),
                    });
                }
            }
        }

        builder.offset = input.len();
        builder.finish()
    }
}

/// Parse a complete XML document with the default configuration
pub fn parse_xml(input: &[u8]) -> ParseResult<Document> {
    DomParser::new().parse_xml(input)
}

/// Raw text split around entity references the parser cannot expand
#[derive(Debug, PartialEq, Eq)]
enum TextPiece<'a> {
    /// Text that may still hold predefined entities and character references
    Escaped(&'a str),
    Reference(&'a str),
}

fn split_references(raw: &str) -> Vec<TextPiece<'_>> {
    let mut pieces = Vec::new();
    let mut chunk_start = 0;
    let mut search = 0;

    while let Some(found) = raw[search..].find('&') {
        let amp = search + found;
        let Some(len) = raw[amp + 1..].find(';') else {
            break;
        };
        let name = &raw[amp + 1..amp + 1 + len];
        let after = amp + len + 2;

        if name.starts_with('#') || PREDEFINED_ENTITIES.contains(&name) {
            search = after;
            continue;
        }
        // Not a reference at all; unescaping reports the stray '&'
        if !is_valid_name(name) {
            search = amp + 1;
            continue;
        }

        if chunk_start < amp {
            pieces.push(TextPiece::Escaped(&raw[chunk_start..amp]));
        }
        pieces.push(TextPiece::Reference(name));
        chunk_start = after;
        search = after;
    }

    if chunk_start < raw.len() {
        pieces.push(TextPiece::Escaped(&raw[chunk_start..]));
    }
    pieces
}

/// Incremental tree construction driven by parse events
pub(crate) struct TreeBuilder<'a> {
    config: &'a ParserConfig,
    input: &'a [u8],
    document: Document,
    cursor: NodeId,
    depth: usize,
    /// Byte offset of the event being handled, for error positions
    pub(crate) offset: usize,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(config: &'a ParserConfig, input: &'a [u8]) -> Self {
        let document = Document::new();
        let cursor = document.document_node();
        Self {
            config,
            input,
            document,
            cursor,
            depth: 0,
            offset: 0,
        }
    }

    fn position(&self) -> TextPosition {
        text_position(self.input, self.offset)
    }

    fn dom_error(&self, source: DomError) -> ParseError {
        ParseError::Dom {
            source,
            position: self.position(),
        }
    }

    fn xml_error(&self, message: String) -> ParseError {
        ParseError::Xml {
            message,
            position: self.position(),
        }
    }

    fn at_top_level(&self) -> bool {
        self.cursor == self.document.document_node()
    }

    pub(crate) fn utf8<'b>(&self, bytes: &'b [u8]) -> ParseResult<&'b str> {
        std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding {
            position: text_position(self.input, self.offset + e.valid_up_to()),
        })
    }

    /// Tag name and unescaped attribute pairs of a start tag
    fn decode_start<'b>(
        &self,
        start: &'b BytesStart<'_>,
    ) -> ParseResult<(&'b str, Vec<(String, String)>)> {
        let name = self.utf8(start.name().into_inner())?;

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.to_string()))?;
            let key = self.utf8(attr.key.as_ref())?.to_string();
            let value = self.attribute_value(self.utf8(&attr.value)?)?;
            attributes.push((key, value));
        }
        Ok((name, attributes))
    }

    /// Unescape an attribute value. References to other entities cannot be
    /// expanded here and are kept as written, `&name;` included.
    fn attribute_value(&self, raw: &str) -> ParseResult<String> {
        let mut value = String::with_capacity(raw.len());
        for piece in split_references(raw) {
            match piece {
                TextPiece::Escaped(chunk) => {
                    let decoded = unescape(chunk).map_err(|e| self.xml_error(e.to_string()))?;
                    value.push_str(&decoded);
                }
                TextPiece::Reference(name) => {
                    value.push('&');
                    value.push_str(name);
                    value.push(';');
                }
            }
        }
        Ok(value)
    }

    fn append(&mut self, child: NodeId) -> ParseResult<()> {
        self.document
            .append_child(self.cursor, child)
            .map_err(|e| self.dom_error(e))?;
        Ok(())
    }

    pub(crate) fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> ParseResult<()> {
        if self.at_top_level() && self.document.document_element().is_some() {
            return Err(ParseError::MultipleRoots {
                name: name.to_string(),
                position: self.position(),
            });
        }
        if self.depth >= self.config.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                current: self.depth + 1,
                max: self.config.max_depth,
                position: self.position(),
            });
        }

        let element = self
            .document
            .create_element(name)
            .map_err(|e| self.dom_error(e))?;
        for (key, value) in attributes {
            self.document
                .set_attribute(element, key, value)
                .map_err(|e| self.dom_error(e))?;
        }
        self.append(element)?;

        self.cursor = element;
        self.depth += 1;
        tracing::trace!("[DomParser] <{}> depth {}", name, self.depth);
        Ok(())
    }

    pub(crate) fn end_element(&mut self, name: &str) -> ParseResult<()> {
        if self.at_top_level() {
            return Err(ParseError::UnexpectedEndTag {
                name: name.to_string(),
                position: self.position(),
            });
        }

        let open = self
            .document
            .node_name(self.cursor)
            .map_err(|e| self.dom_error(e))?;
        if open != name {
            return Err(ParseError::MismatchedEndTag {
                expected: open.to_string(),
                found: name.to_string(),
                position: self.position(),
            });
        }

        tracing::trace!("[DomParser] </{}> depth {}", name, self.depth);
        let parent = self
            .document
            .parent_node(self.cursor)
            .map_err(|e| self.dom_error(e))?;
        self.cursor = parent.unwrap_or_else(|| self.document.document_node());
        self.depth -= 1;
        Ok(())
    }

    /// Raw text as it appears between markup
    pub(crate) fn text(&mut self, raw: &str) -> ParseResult<()> {
        if self.at_top_level() {
            if !is_xml_whitespace(raw) {
                return Err(ParseError::TextOutsideRoot {
                    position: self.position(),
                });
            }
            if self.config.preserve_top_level_whitespace {
                self.characters(raw)?;
            }
            return Ok(());
        }

        for piece in split_references(raw) {
            match piece {
                TextPiece::Escaped(chunk) => {
                    let decoded = unescape(chunk).map_err(|e| self.xml_error(e.to_string()))?;
                    self.characters(&decoded)?;
                }
                TextPiece::Reference(name) => self.entity_reference(name)?,
            }
        }
        Ok(())
    }

    /// Decoded character data; extends the cursor's trailing Text node
    pub(crate) fn characters(&mut self, data: &str) -> ParseResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let last = self
            .document
            .last_child(self.cursor)
            .map_err(|e| self.dom_error(e))?;
        let trailing_text = last.filter(|&id| {
            self.document
                .node(id)
                .map(DomNode::is_text)
                .unwrap_or(false)
        });

        match trailing_text {
            Some(text) => self
                .document
                .append_data(text, data)
                .map_err(|e| self.dom_error(e)),
            None => {
                let text = self.document.create_text_node(data);
                self.append(text)
            }
        }
    }

    pub(crate) fn entity_reference(&mut self, name: &str) -> ParseResult<()> {
        let reference = self
            .document
            .create_entity_reference(name)
            .map_err(|e| self.dom_error(e))?;
        self.append(reference)
    }

    pub(crate) fn cdata(&mut self, data: &str) -> ParseResult<()> {
        if self.at_top_level() {
            return Err(ParseError::TextOutsideRoot {
                position: self.position(),
            });
        }
        let section = self.document.create_cdata_section(data);
        self.append(section)
    }

    pub(crate) fn comment(&mut self, data: &str) -> ParseResult<()> {
        if data.contains("--") || data.ends_with('-') {
            return Err(self.xml_error(format!("\"--\" is not allowed in comment {:?}", data)));
        }
        if !self.config.keep_comments {
            return Ok(());
        }
        let comment = self.document.create_comment(data);
        self.append(comment)
    }

    pub(crate) fn processing_instruction(&mut self, target: &str, data: &str) -> ParseResult<()> {
        if !self.config.keep_processing_instructions {
            return Ok(());
        }
        let instruction = self
            .document
            .create_processing_instruction(target, data.trim_start())
            .map_err(|e| self.dom_error(e))?;
        self.append(instruction)
    }

    pub(crate) fn doctype(&mut self, content: &str) -> ParseResult<()> {
        let doctype = self
            .document
            .build_document_type(content)
            .map_err(|e| self.dom_error(e))?;
        self.append(doctype)
    }

    pub(crate) fn finish(self) -> ParseResult<Document> {
        if !self.at_top_level() {
            let name = self
                .document
                .node_name(self.cursor)
                .map_err(|e| self.dom_error(e))?;
            return Err(ParseError::UnclosedElement {
                name: name.to_string(),
                position: self.position(),
            });
        }
        if self.document.document_element().is_none() {
            return Err(ParseError::EmptyDocument);
        }
        Ok(self.document)
    }
}
