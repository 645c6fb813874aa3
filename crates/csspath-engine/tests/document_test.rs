use csspath_engine::{Document, DocumentError, NodeKind};
use std::io::Write;

const PAGE: &str = r#"<html>
  <body>
    <h1 id="title">Hello &amp; welcome</h1>
    <ul class="menu">
      <li>One</li>
      <li class="active">Two</li>
      <li>Three</li>
    </ul>
    <br/>
  </body>
</html>"#;

#[test]
fn test_parse_tree_shape() {
    let doc = Document::parse_str(PAGE).unwrap();
    let html = doc.root_element().unwrap();
    assert_eq!(doc.name(html), Some("html"));
    assert_eq!(doc.parent(html), Some(doc.root()));

    let body = doc.element_children(html).next().unwrap();
    let names: Vec<_> = doc
        .element_children(body)
        .map(|id| doc.name(id).unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["h1", "ul", "br"]);
}

#[test]
fn test_attributes_and_text() {
    let doc = Document::parse_str(PAGE).unwrap();
    let h1 = doc
        .descendants(doc.root())
        .into_iter()
        .find(|id| doc.name(*id) == Some("h1"))
        .unwrap();
    assert_eq!(doc.attribute(h1, "id"), Some("title"));
    assert_eq!(doc.attribute(h1, "class"), None);
    assert_eq!(doc.text(h1), "Hello & welcome");
}

#[test]
fn test_node_ids_follow_document_order() {
    let doc = Document::parse_str(PAGE).unwrap();
    let descendants = doc.descendants(doc.root());
    let mut sorted = descendants.clone();
    sorted.sort();
    assert_eq!(descendants, sorted);
    assert_eq!(descendants.len() + 1, doc.len());
}

#[test]
fn test_sibling_navigation() {
    let doc = Document::parse_str(PAGE).unwrap();
    let items: Vec<_> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|id| doc.name(*id) == Some("li"))
        .collect();
    assert_eq!(items.len(), 3);

    assert_eq!(doc.preceding_element_count(items[0]), 0);
    assert_eq!(doc.preceding_element_count(items[2]), 2);
    assert_eq!(doc.following_element_count(items[0]), 2);
    assert_eq!(doc.next_element_sibling(items[0]), Some(items[1]));
    assert_eq!(doc.next_element_sibling(items[2]), None);
    assert_eq!(doc.following_element_siblings(items[0]), vec![items[1], items[2]]);
}

#[test]
fn test_empty_element_has_no_children() {
    let doc = Document::parse_str(PAGE).unwrap();
    let br = doc
        .descendants(doc.root())
        .into_iter()
        .find(|id| doc.name(*id) == Some("br"))
        .unwrap();
    assert!(doc.children(br).is_empty());
    assert!(matches!(doc.kind(br), NodeKind::Element { .. }));
}

#[test]
fn test_unclosed_element_is_rejected() {
    let err = Document::parse_str("<root><child></root>").unwrap_err();
    assert!(matches!(err, DocumentError::Xml(_) | DocumentError::Unclosed(_)));

    let err = Document::parse_str("<root><child>").unwrap_err();
    assert!(matches!(err, DocumentError::Xml(_) | DocumentError::Unclosed(_)));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PAGE.as_bytes()).unwrap();

    let doc = Document::from_file(file.path()).unwrap();
    assert_eq!(doc.name(doc.root_element().unwrap()), Some("html"));
}

#[test]
fn test_missing_file() {
    let err = Document::from_file(std::path::Path::new("/nonexistent/page.xml")).unwrap_err();
    assert!(matches!(err, DocumentError::Io(_)));
}
