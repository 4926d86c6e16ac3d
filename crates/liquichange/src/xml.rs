//! In-memory XML element tree produced by the serializer, and its rendering
//! through `quick-xml`.

use crate::error::ChangelogError;
use indexmap::IndexMap;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// The Liquibase changelog namespace.
pub const NAMESPACE: &str = "http://www.liquibase.org/xml/ns/dbchangelog";
/// The XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// The namespace of the Neo4j extension (`neo4j:` prefixed tags).
pub const NEO4J_NAMESPACE: &str = "http://www.liquibase.org/xml/ns/dbchangelog-ext";
/// `xsi:schemaLocation` value pointing the changelog namespace at its XSD.
pub const SCHEMA_LOCATION: &str = "http://www.liquibase.org/xml/ns/dbchangelog \
                                   http://www.liquibase.org/xml/ns/dbchangelog/dbchangelog-latest.xsd";

/// The reserved attributes carried only by the document root, in output order.
pub const ROOT_ATTRIBUTES: [(&str, &str); 4] = [
    ("xmlns", NAMESPACE),
    ("xmlns:xsi", XSI_NAMESPACE),
    ("xmlns:neo4j", NEO4J_NAMESPACE),
    ("xsi:schemaLocation", SCHEMA_LOCATION),
];

/// A single XML element: tag, ordered attributes, text and child elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Returns the value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Appends `child` after the existing children.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Total number of elements in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(XmlElement::node_count).sum::<usize>()
    }

    /// Renders the subtree as compact XML without a declaration.
    pub fn to_xml_string(&self) -> Result<String, ChangelogError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

/// Writes `element` and its subtree as events on `writer`.
///
/// Elements with neither text nor children are written in the short empty
/// form (`<tag/>`). Text is escaped for `<`, `>` and `&` only; attribute values
/// are fully escaped by `quick-xml`.
pub(crate) fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), ChangelogError> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        let text = BytesText::from_escaped(partial_escape(element.text.as_str()));
        writer.write_event(Event::Text(text))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tag: &str, attr: (&str, &str)) -> XmlElement {
        let mut e = XmlElement::new(tag);
        e.attributes.insert(attr.0.to_string(), attr.1.to_string());
        e
    }

    #[test]
    fn test_empty_element_uses_short_form() {
        let e = leaf("neo4j:version", ("matches", "1.2.3"));
        assert_eq!(e.to_xml_string().unwrap(), r#"<neo4j:version matches="1.2.3"/>"#);
    }

    #[test]
    fn test_text_keeps_quotes_and_escapes_markup() {
        let mut e = XmlElement::new("neo4j:cypher");
        e.text = "MATCH (n {title: 'A & B'}) WHERE n.x < 3 RETURN n".into();
        assert_eq!(
            e.to_xml_string().unwrap(),
            "<neo4j:cypher>MATCH (n {title: 'A &amp; B'}) WHERE n.x &lt; 3 RETURN n</neo4j:cypher>"
        );
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let e = leaf("preConditions", ("onFailMessage", "a \"b\" <c>"));
        let xml = e.to_xml_string().unwrap();
        assert!(xml.contains("&quot;b&quot;"));
        assert!(xml.contains("&lt;c&gt;"));
    }

    #[test]
    fn test_children_written_in_order() {
        let mut root = XmlElement::new("and");
        root.push(XmlElement::new("first"));
        root.push(XmlElement::new("second"));
        root.push(XmlElement::new("first"));
        assert_eq!(
            root.to_xml_string().unwrap(),
            "<and><first/><second/><first/></and>"
        );
        assert_eq!(root.find_all("first").count(), 2);
        assert_eq!(root.find("second").map(|c| c.tag.as_str()), Some("second"));
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_schema_location_references_namespace() {
        assert!(SCHEMA_LOCATION.starts_with(NAMESPACE));
        assert!(SCHEMA_LOCATION.ends_with("/dbchangelog-latest.xsd"));
        assert_eq!(
            SCHEMA_LOCATION.split(' ').collect::<Vec<_>>(),
            vec![NAMESPACE, "http://www.liquibase.org/xml/ns/dbchangelog/dbchangelog-latest.xsd"]
        );
    }
}
