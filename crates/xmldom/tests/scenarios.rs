//! End-to-end behaviour of parsing, editing and serializing documents

use xmldom::{
    parse_xml, Document, DomError, DomParser, DomSerializer, NodeId, NodeType, ParseError,
    ParserConfig,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn parse(xml: &str) -> Document {
    init_tracing();
    parse_xml(xml.as_bytes()).unwrap()
}

fn to_xml(doc: &Document, node: NodeId) -> String {
    DomSerializer::new().serialize(doc, node).unwrap()
}

#[test]
fn test_parse_serialize_round_trip() {
    let xml = concat!(
        "<!DOCTYPE catalog [<!ENTITY pub \"ACME &amp; Sons\"><!NOTATION png SYSTEM \"image/png\">]>",
        "<?render mode=fast?>",
        "<catalog version=\"2\" lang=\"en\">",
        "<book id=\"b1\"><title>Rust &amp; XML</title><blurb><![CDATA[<b>bold</b>]]></blurb>",
        "<!-- reviewed --><publisher>&pub;</publisher><isbn/></book>",
        "<book id=\"b2\"><title>Second</title></book>",
        "</catalog>"
    );

    let doc = parse(xml);
    let first = to_xml(&doc, doc.document_node());
    let reparsed = parse(&first);
    let second = to_xml(&reparsed, reparsed.document_node());

    assert_eq!(first, second);
    assert!(first.contains("<catalog lang=\"en\" version=\"2\">"));
    assert!(first.contains("<publisher>&pub;</publisher>"));
    assert!(first.contains("<!ENTITY pub \"ACME &#38; Sons\">"));
    assert_eq!(doc.len(), reparsed.len());
}

#[test]
fn test_append_and_remove_child() {
    let mut doc = parse("<root><a/></root>");
    let root = doc.document_element().unwrap();
    let b = doc.create_element("b").unwrap();

    doc.append_child(root, b).unwrap();
    assert_eq!(doc.parent_node(b).unwrap(), Some(root));
    assert_eq!(doc.last_child(root).unwrap(), Some(b));

    doc.remove_child(root, b).unwrap();
    assert_eq!(doc.parent_node(b).unwrap(), None);
    assert!(!doc.child_nodes(root).unwrap().contains(&b));
    assert_eq!(to_xml(&doc, root), "<root><a/></root>");
}

#[test]
fn test_deep_clone_is_independent() {
    let mut doc = parse(r#"<root><item k="v">text<leaf/></item></root>"#);
    let item = doc.node_at_path("item").unwrap();
    let copy = doc.clone_node(item, true).unwrap();

    assert_ne!(copy, item);
    assert_eq!(to_xml(&doc, copy), to_xml(&doc, item));

    let leaf = doc.child_by_node_name(copy, "leaf").unwrap();
    doc.set_attribute(copy, "k", "changed").unwrap();
    doc.set_attribute(leaf, "new", "1").unwrap();
    assert_eq!(
        to_xml(&doc, item),
        r#"<item k="v">text<leaf/></item>"#
    );
}

#[test]
fn test_hierarchy_and_document_errors() {
    let mut doc = parse("<root><a><b/></a></root>");
    let root = doc.document_element().unwrap();
    let b = doc.node_at_path("a/b").unwrap();
    let before = to_xml(&doc, doc.document_node());

    let err = doc.append_child(b, root).unwrap_err();
    assert!(matches!(err, DomError::HierarchyRequest(_)));
    assert_eq!(err.code(), Some(3));
    assert_eq!(to_xml(&doc, doc.document_node()), before);

    let mut other = Document::new();
    let stranger = other.create_element("stranger").unwrap();
    assert_eq!(
        doc.append_child(root, stranger).unwrap_err(),
        DomError::WrongDocument
    );
    assert_eq!(to_xml(&doc, doc.document_node()), before);
}

#[test]
fn test_mismatched_end_tag_yields_no_document() {
    init_tracing();
    let result = parse_xml(b"<root><a></root>");
    assert!(matches!(
        result,
        Err(ParseError::MismatchedEndTag { ref expected, ref found, .. })
            if expected == "a" && found == "root"
    ));
}

#[test]
fn test_elements_by_tag_name_pre_order() {
    let doc = parse("<a id=\"1\"><x><a id=\"2\"><a id=\"3\"/></a></x><a id=\"4\"/></a>");
    let found = doc.elements_by_tag_name("a");
    let ids: Vec<_> = found
        .iter()
        .map(|&el| doc.attribute(el, "id").unwrap().unwrap())
        .collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);
    assert_eq!(doc.elements_by_tag_name("*").len(), 5);
    assert!(doc.elements_by_tag_name("missing").is_empty());
}

#[test]
fn test_split_and_normalize_are_inverse() {
    let mut doc = parse("<p>hello world<br/></p>");
    let p = doc.document_element().unwrap();
    let text = doc.first_child(p).unwrap().unwrap();
    let before = to_xml(&doc, p);

    let tail = doc.split_text(text, 6).unwrap();
    assert_eq!(doc.next_sibling(text).unwrap(), Some(tail));
    assert_eq!(doc.data(tail).unwrap(), "world");

    doc.normalize(p).unwrap();
    assert_eq!(to_xml(&doc, p), before);
    assert_eq!(doc.child_nodes(p).unwrap().len(), 2);
}

#[test]
fn test_paths_round_trip() {
    let doc = parse("<r><s><t/><t/></s><s><u/></s></r>");
    for el in doc.elements_by_tag_name("*") {
        let path = doc.path_of(el).unwrap();
        assert_eq!(doc.node_at_path(&path), Some(el), "path {:?}", path);
    }
    assert_eq!(doc.node_at_array_path(&["1", "u"]), doc.node_at_path("1/0"));
}

#[test]
fn test_attribute_node_in_use() {
    let mut doc = parse(r#"<r><a x="1"/><b/></r>"#);
    let a = doc.node_at_path("a").unwrap();
    let b = doc.node_at_path("b").unwrap();
    let attr = doc.attribute_node(a, "x").unwrap().unwrap();

    let err = doc.set_attribute_node(b, attr).unwrap_err();
    assert_eq!(err, DomError::InUseAttribute("x".to_string()));
    assert_eq!(err.code(), Some(10));

    doc.remove_attribute(b, "absent").unwrap();
    assert_eq!(doc.attribute(b, "absent").unwrap(), None);
}

#[test]
fn test_fragment_insertion_empties_fragment() {
    let mut doc = parse("<list><end/></list>");
    let list = doc.document_element().unwrap();
    let end = doc.node_at_path("end").unwrap();

    let fragment = doc.create_document_fragment();
    for name in ["one", "two"] {
        let item = doc.create_element(name).unwrap();
        doc.append_child(fragment, item).unwrap();
    }
    doc.insert_before(list, fragment, Some(end)).unwrap();

    assert!(!doc.has_child_nodes(fragment).unwrap());
    assert_eq!(to_xml(&doc, list), "<list><one/><two/><end/></list>");
}

#[test]
fn test_entity_references_stay_read_only() {
    let mut doc = parse("<!DOCTYPE d [<!ENTITY e \"v\">]><d>&e;</d>");
    let d = doc.document_element().unwrap();
    let reference = doc.first_child(d).unwrap().unwrap();
    assert_eq!(doc.node_type(reference).unwrap(), NodeType::EntityReference);
    assert!(doc.is_read_only(reference).unwrap());

    let child = doc.create_text_node("x");
    assert!(matches!(
        doc.append_child(reference, child),
        Err(DomError::NoModificationAllowed(_))
    ));
}

#[test]
fn test_custom_parser_config() {
    init_tracing();
    let parser = DomParser::with_config(ParserConfig {
        keep_comments: false,
        max_depth: 3,
        ..ParserConfig::default()
    });
    let doc = parser.parse_xml(b"<a><!--x--><b><c/></b></a>").unwrap();
    assert_eq!(to_xml(&doc, doc.document_node()), "<a><b><c/></b></a>");
    assert!(parser.parse_xml(b"<a><b><c><d/></c></b></a>").is_err());
}
