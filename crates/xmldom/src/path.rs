//! Slash-separated element paths
//!
//! `"body/1/p"` starts at the document element, takes its first `body`
//! child element, then that element's second child element, then the first
//! `p` below it. Lookups never fail; a missing step yields `None`.

use crate::document::Document;
use crate::types::*;

/// One resolved step of a path
enum Step<'a> {
    Tag(&'a str),
    Index(usize),
}

impl<'a> Step<'a> {
    fn parse(segment: &'a str) -> Self {
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            // Absurdly long indexes cannot match anything
            Step::Index(segment.parse().unwrap_or(usize::MAX))
        } else {
            Step::Tag(segment)
        }
    }
}

impl Document {
    fn child_elements(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.child_nodes(parent)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&id| self.node(id).map(DomNode::is_element).unwrap_or(false))
    }

    fn first_child_element_named(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.child_elements(parent)
            .find(|&id| self.node_name(id).map(|n| n == tag).unwrap_or(false))
    }

    /// Resolve a `/`-separated path; empty segments are skipped
    pub fn node_at_path(&self, path: &str) -> Option<NodeId> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.node_at_array_path(&segments)
    }

    /// Resolve a path given as segments. Digit-only segments index child
    /// elements from zero; others match the first child element by tag.
    pub fn node_at_array_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<NodeId> {
        let mut current = self.document_element()?;
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            current = match Step::parse(segment) {
                Step::Index(index) => self.child_elements(current).nth(index)?,
                Step::Tag(tag) => self.first_child_element_named(current, tag)?,
            };
        }
        Some(current)
    }

    /// First child of any kind whose nodeName is `name`
    pub fn child_by_node_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child_nodes(parent)
            .ok()?
            .iter()
            .copied()
            .find(|&id| self.node_name(id).map(|n| n == name).unwrap_or(false))
    }

    /// The path that [`Document::node_at_path`] resolves back to `node`.
    ///
    /// Uses the tag name where it is unambiguous and the element index
    /// otherwise. Returns `None` for nodes that are not elements inside the
    /// document element.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let document_element = self.document_element()?;
        if !self.node(node).ok()?.is_element() {
            return None;
        }

        let mut segments = Vec::new();
        let mut current = node;
        while current != document_element {
            let parent = self.parent_node(current).ok()??;
            let tag = self.node_name(current).ok()?;
            if self.first_child_element_named(parent, tag) == Some(current) {
                segments.push(tag.to_string());
            } else {
                let index = self.child_elements(parent).position(|id| id == current)?;
                segments.push(index.to_string());
            }
            current = parent;
        }

        segments.reverse();
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<library><shelf><book/><book/></shelf><shelf/><!--x--><desk/></library>`
    fn library() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let library = doc.create_element("library").unwrap();
        let shelf1 = doc.create_element("shelf").unwrap();
        let book1 = doc.create_element("book").unwrap();
        let book2 = doc.create_element("book").unwrap();
        let shelf2 = doc.create_element("shelf").unwrap();
        let comment = doc.create_comment("x");
        let desk = doc.create_element("desk").unwrap();

        let doc_node = doc.document_node();
        doc.append_child(doc_node, library).unwrap();
        for id in [shelf1, shelf2, comment, desk] {
            doc.append_child(library, id).unwrap();
        }
        doc.append_child(shelf1, book1).unwrap();
        doc.append_child(shelf1, book2).unwrap();

        (doc, vec![library, shelf1, book1, book2, shelf2, comment, desk])
    }

    #[test]
    fn test_node_at_path() {
        let (doc, ids) = library();
        let (library, shelf1, book1, book2, shelf2, desk) =
            (ids[0], ids[1], ids[2], ids[3], ids[4], ids[6]);

        assert_eq!(doc.node_at_path(""), Some(library));
        assert_eq!(doc.node_at_path("/"), Some(library));
        assert_eq!(doc.node_at_path("shelf"), Some(shelf1));
        assert_eq!(doc.node_at_path("shelf/book"), Some(book1));
        assert_eq!(doc.node_at_path("//shelf//1/"), Some(book2));
        assert_eq!(doc.node_at_path("1"), Some(shelf2));
        // Comments are not counted
        assert_eq!(doc.node_at_path("2"), Some(desk));
        assert_eq!(doc.node_at_path("3"), None);
        assert_eq!(doc.node_at_path("chair"), None);
        assert_eq!(doc.node_at_path("desk/book"), None);
        assert_eq!(doc.node_at_path("99999999999999999999999"), None);
    }

    #[test]
    fn test_node_at_array_path() {
        let (doc, ids) = library();
        assert_eq!(doc.node_at_array_path(&["shelf", "1"]), Some(ids[3]));
        assert_eq!(
            doc.node_at_array_path(&[String::from("0"), String::new(), String::from("0")]),
            Some(ids[2])
        );
        let empty: [&str; 0] = [];
        assert_eq!(doc.node_at_array_path(&empty), Some(ids[0]));
    }

    #[test]
    fn test_no_document_element() {
        let doc = Document::new();
        assert_eq!(doc.node_at_path(""), None);
        assert_eq!(doc.node_at_path("a"), None);
    }

    #[test]
    fn test_child_by_node_name() {
        let (doc, ids) = library();
        assert_eq!(doc.child_by_node_name(ids[0], "#comment"), Some(ids[5]));
        assert_eq!(doc.child_by_node_name(ids[0], "shelf"), Some(ids[1]));
        assert_eq!(doc.child_by_node_name(ids[0], "book"), None);
    }

    #[test]
    fn test_path_of_round_trips() {
        let (doc, ids) = library();
        assert_eq!(doc.path_of(ids[0]).as_deref(), Some(""));
        assert_eq!(doc.path_of(ids[3]).as_deref(), Some("shelf/1"));
        assert_eq!(doc.path_of(ids[4]).as_deref(), Some("1"));
        assert_eq!(doc.path_of(ids[5]), None);

        for id in ids.into_iter().filter(|&id| doc.node(id).unwrap().is_element()) {
            let path = doc.path_of(id).unwrap();
            assert_eq!(doc.node_at_path(&path), Some(id), "path {:?}", path);
        }
    }

    #[test]
    fn test_path_of_detached_element() {
        let (mut doc, _) = library();
        let loose = doc.create_element("loose").unwrap();
        assert_eq!(doc.path_of(loose), None);
    }
}
