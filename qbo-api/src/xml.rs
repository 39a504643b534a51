//! Response document parsing and projection into entities
//!
//! A response body is parsed once into a [`Document`]. Everything downstream
//! (fault detection, error extraction, projection) reads that one tree.
//! Element matching is namespace-aware: only elements bound to
//! [`NAMESPACE`] count as service elements.

use tracing::{debug, warn};
use xmltree::{Element, XMLNode};

use crate::entity::Entity;
use crate::error::{ApiError, Result};

/// XML namespace of every element the service produces
pub const NAMESPACE: &str = "http://schema.intuit.com/finance/v3";

const RESPONSE_ROOT: &str = "IntuitResponse";
const FAULT: &str = "Fault";
const QUERY_RESPONSE: &str = "QueryResponse";

/// Parse tree of one response body
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Parsed(Element),
    /// The body is not well-formed XML; holds the parser's message
    Unparsable(String),
}

impl Document {
    pub fn parse(body: &str) -> Self {
        match Element::parse(body.as_bytes()) {
            Ok(root) => Document::Parsed(root),
            Err(e) => Document::Unparsable(e.to_string()),
        }
    }

    pub fn root(&self) -> Option<&Element> {
        match self {
            Document::Parsed(root) => Some(root),
            Document::Unparsable(_) => None,
        }
    }

    fn require_root(&self) -> Result<&Element> {
        match self {
            Document::Parsed(root) => Ok(root),
            Document::Unparsable(cause) => Err(ApiError::parsing(format!(
                "response body is not well-formed XML: {}",
                cause
            ))),
        }
    }
}

/// Result of looking for a fault fragment in a document
#[derive(Debug, Clone, PartialEq)]
pub enum FaultProbe<'a> {
    Absent,
    Present(&'a Element),
    /// The document could not be evaluated; the string says why
    Indeterminate(String),
}

/// Locate the fault fragment directly under the response root
pub fn probe_fault(document: &Document) -> FaultProbe<'_> {
    let root = match document {
        Document::Parsed(root) => root,
        Document::Unparsable(cause) => {
            return FaultProbe::Indeterminate(format!("body is not well-formed XML: {}", cause))
        }
    };

    if root.namespace.as_deref() != Some(NAMESPACE) {
        return FaultProbe::Indeterminate(format!(
            "root element <{}> is bound to namespace {:?}, expected {}",
            root.name, root.namespace, NAMESPACE
        ));
    }
    if root.name != RESPONSE_ROOT {
        return FaultProbe::Absent;
    }

    match child_elements(root).find(|e| is_service_element(e, FAULT)) {
        Some(fault) => FaultProbe::Present(fault),
        None => FaultProbe::Absent,
    }
}

/// Whether the document carries a fault
///
/// A document that cannot be evaluated counts as an error.
pub fn response_is_error(document: &Document) -> bool {
    match probe_fault(document) {
        FaultProbe::Absent => false,
        FaultProbe::Present(_) => true,
        FaultProbe::Indeterminate(cause) => {
            warn!(%cause, "unable to evaluate response for a fault, treating it as an error");
            true
        }
    }
}

/// Records returned by a query plus the server's pagination metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<E> {
    pub entries: Vec<E>,
    /// Number of records actually extracted from the body
    pub count: usize,
    pub start_position: Option<u32>,
    pub max_results: Option<u32>,
    /// Total matches the server reported; may exceed `count` when paginated
    pub total_count: Option<u32>,
}

impl<E> Collection<E> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
            start_position: None,
            max_results: None,
            total_count: None,
        }
    }
}

impl<E> IntoIterator for Collection<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// First record directly under the response root, or `None` when there is none
pub fn project_single<E: Entity>(document: &Document) -> Result<Option<E>> {
    let root = document.require_root()?;
    child_elements(root)
        .find(|e| is_service_element(e, E::XML_NODE))
        .map(|node| convert::<E>(node))
        .transpose()
}

/// Every record anywhere under the response root, in document order
///
/// Fails as a whole if any record fails to convert.
pub fn project_collection<E: Entity>(document: &Document) -> Result<Collection<E>> {
    let root = document.require_root()?;

    let mut collection = Collection::default();
    if let Some(wrapper) = child_elements(root).find(|e| is_service_element(e, QUERY_RESPONSE)) {
        collection.start_position = numeric_attribute(wrapper, "startPosition");
        collection.max_results = numeric_attribute(wrapper, "maxResults");
        collection.total_count = numeric_attribute(wrapper, "totalCount");
    }

    let mut nodes = Vec::new();
    collect_descendants(root, E::XML_NODE, &mut nodes);
    collection.entries = nodes
        .into_iter()
        .map(convert::<E>)
        .collect::<Result<Vec<E>>>()?;
    collection.count = collection.entries.len();

    debug!(
        entity = E::XML_NODE,
        count = collection.count,
        total_count = ?collection.total_count,
        "projected collection"
    );
    Ok(collection)
}

/// True iff exactly one record directly under the root is marked `status="Deleted"`
pub fn detect_delete_confirmation<E: Entity>(document: &Document) -> bool {
    let Some(root) = document.root() else {
        return false;
    };
    child_elements(root)
        .filter(|e| is_service_element(e, E::XML_NODE))
        .filter(|e| e.attributes.get("status").map(String::as_str) == Some("Deleted"))
        .count()
        == 1
}

fn convert<E: Entity>(node: &Element) -> Result<E> {
    E::from_xml(node).map_err(|e| ApiError::ResponseParsing {
        message: format!("failed to convert <{}> element", E::XML_NODE),
        source: Some(e),
    })
}

fn numeric_attribute(element: &Element, name: &str) -> Option<u32> {
    let value = element.attributes.get(name)?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!(attribute = name, %value, "ignoring non-numeric pagination attribute");
            None
        }
    }
}

pub(crate) fn is_service_element(element: &Element, name: &str) -> bool {
    element.name == name && element.namespace.as_deref() == Some(NAMESPACE)
}

pub(crate) fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(e) => Some(e),
        _ => None,
    })
}

/// Pre-order search below `element` (excluding it) for service elements named `name`
pub(crate) fn collect_descendants<'a>(element: &'a Element, name: &str, out: &mut Vec<&'a Element>) {
    for child in child_elements(element) {
        if is_service_element(child, name) {
            out.push(child);
        }
        collect_descendants(child, name, out);
    }
}

/// First service element named `name` below `element`
pub(crate) fn first_descendant<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    for child in child_elements(element) {
        if is_service_element(child, name) {
            return Some(child);
        }
        if let Some(found) = first_descendant(child, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{required_text, EntityError};

    #[derive(Debug, PartialEq)]
    struct Item {
        id: String,
    }

    impl Entity for Item {
        const XML_NODE: &'static str = "Item";
        const RESOURCE: &'static str = "item";

        fn from_xml(node: &Element) -> std::result::Result<Self, EntityError> {
            Ok(Item {
                id: required_text(node, "Item", "Id")?,
            })
        }
    }

    fn doc(inner: &str) -> Document {
        Document::parse(&format!(
            r#"<IntuitResponse xmlns="{}" time="2024-01-01T00:00:00.000-08:00">{}</IntuitResponse>"#,
            NAMESPACE, inner
        ))
    }

    #[test]
    fn test_collection_counts_extracted_nodes_in_order() {
        let document = doc(
            r#"<QueryResponse startPosition="1" maxResults="3" totalCount="7">
                <Item><Id>1</Id></Item><Item><Id>2</Id></Item><Item><Id>3</Id></Item>
            </QueryResponse>"#,
        );

        let collection = project_collection::<Item>(&document).unwrap();
        assert_eq!(collection.count, 3);
        assert_eq!(collection.entries.len(), 3);
        let ids: Vec<&str> = collection.entries.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(collection.start_position, Some(1));
        assert_eq!(collection.max_results, Some(3));
        assert_eq!(collection.total_count, Some(7));
    }

    #[test]
    fn test_collection_missing_attributes_stay_unset() {
        let document = doc(r#"<QueryResponse maxResults="1"><Item><Id>9</Id></Item></QueryResponse>"#);

        let collection = project_collection::<Item>(&document).unwrap();
        assert_eq!(collection.count, 1);
        assert_eq!(collection.start_position, None);
        assert_eq!(collection.max_results, Some(1));
        assert_eq!(collection.total_count, None);
    }

    #[test]
    fn test_collection_without_wrapper_or_records() {
        let collection = project_collection::<Item>(&doc("<QueryResponse/>")).unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.count, 0);
        assert_eq!(collection.total_count, None);
    }

    #[test]
    fn test_collection_conversion_failure_aborts() {
        let document = doc(
            "<QueryResponse><Item><Id>1</Id></Item><Item><Name>no id</Name></Item></QueryResponse>",
        );

        match project_collection::<Item>(&document) {
            Err(ApiError::ResponseParsing { source: Some(EntityError::MissingField { element, .. }), .. }) => {
                assert_eq!(element, "Id")
            }
            other => panic!("Expected ResponseParsing, got {:?}", other),
        }
    }

    #[test]
    fn test_elements_outside_namespace_are_ignored() {
        let document = Document::parse(&format!(
            r#"<IntuitResponse xmlns="{}"><QueryResponse><Item><Id>1</Id></Item><x:Item xmlns:x="urn:other"><Id>2</Id></x:Item></QueryResponse></IntuitResponse>"#,
            NAMESPACE
        ));
        let collection = project_collection::<Item>(&document).unwrap();
        assert_eq!(collection.count, 1);
    }

    #[test]
    fn test_single_found_and_absent() {
        let found = project_single::<Item>(&doc("<Item><Id>42</Id></Item>")).unwrap();
        assert_eq!(found, Some(Item { id: "42".to_string() }));

        let absent = project_single::<Item>(&doc("<Other/>")).unwrap();
        assert_eq!(absent, None);
    }

    #[test]
    fn test_single_only_looks_directly_under_root() {
        let nested = project_single::<Item>(&doc("<QueryResponse><Item><Id>1</Id></Item></QueryResponse>")).unwrap();
        assert_eq!(nested, None);
    }

    #[test]
    fn test_projection_of_unparsable_document_fails() {
        let document = Document::parse("<IntuitResponse><oops></IntuitResponse>");
        assert!(matches!(document, Document::Unparsable(_)));
        assert!(matches!(
            project_single::<Item>(&document),
            Err(ApiError::ResponseParsing { source: None, .. })
        ));
    }

    #[test]
    fn test_delete_confirmation_requires_exactly_one() {
        let one = doc(r#"<Item status="Deleted"><Id>1</Id></Item>"#);
        assert!(detect_delete_confirmation::<Item>(&one));

        let none = doc(r#"<Item><Id>1</Id></Item>"#);
        assert!(!detect_delete_confirmation::<Item>(&none));

        let two = doc(r#"<Item status="Deleted"><Id>1</Id></Item><Item status="Deleted"><Id>2</Id></Item>"#);
        assert!(!detect_delete_confirmation::<Item>(&two));

        assert!(!detect_delete_confirmation::<Item>(&Document::parse("not xml")));
    }

    #[test]
    fn test_probe_fault() {
        assert_eq!(probe_fault(&doc("<Item/>")), FaultProbe::Absent);
        assert!(matches!(
            probe_fault(&doc(r#"<Fault type="ValidationFault"/>"#)),
            FaultProbe::Present(f) if f.name == "Fault"
        ));
        assert!(matches!(
            probe_fault(&Document::parse("<IntuitResponse><Fault/></IntuitResponse>")),
            FaultProbe::Indeterminate(cause) if cause.contains("namespace")
        ));
        assert!(matches!(
            probe_fault(&Document::parse("")),
            FaultProbe::Indeterminate(cause) if cause.contains("well-formed")
        ));
    }

    #[test]
    fn test_response_is_error_fails_closed() {
        assert!(!response_is_error(&doc("<Item/>")));
        assert!(response_is_error(&doc("<Fault/>")));
        assert!(response_is_error(&Document::parse("<html><body>gateway</body>")));
        assert!(response_is_error(&Document::parse("<IntuitResponse/>")));
    }
}
