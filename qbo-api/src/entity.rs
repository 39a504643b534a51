//! Capability traits implemented by business-entity types
//!
//! The pipeline never knows what a Customer or an Invoice looks like; it only
//! needs each entity type to name its XML element and URL resource, and to
//! convert itself from (and, for writes, to) XML.

use std::str::FromStr;

use thiserror::Error;
use xmltree::Element;

use crate::xml::NAMESPACE;

/// Failure converting a single XML node into an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// A required child element is absent
    #[error("<{entity}> is missing required element <{element}>")]
    MissingField {
        entity: &'static str,
        element: &'static str,
    },

    /// A child element is present but its text does not parse
    #[error("<{entity}> element <{element}> has invalid value {value:?}")]
    InvalidValue {
        entity: &'static str,
        element: &'static str,
        value: String,
    },
}

/// An entity that can be read from service responses
pub trait Entity: Sized {
    /// Element name of one record in a response, e.g. `Customer`
    const XML_NODE: &'static str;

    /// Path segment used for resource URLs, e.g. `customer`
    const RESOURCE: &'static str;

    /// Convert one record element into the entity
    fn from_xml(node: &Element) -> Result<Self, EntityError>;

    /// Query used when the caller supplies no filter
    fn default_query() -> String {
        format!("SELECT * FROM {}", Self::XML_NODE)
    }
}

/// An entity that can be sent to the service (create, update, delete, upload metadata)
pub trait Persistable: Entity {
    fn id(&self) -> Option<&str>;

    fn sync_token(&self) -> Option<&str>;

    /// Namespace-qualified XML document for this entity
    fn to_xml(&self) -> String;

    /// Minimal document identifying the entity for a delete request
    fn delete_xml(&self) -> String {
        format!(
            r#"<{node} xmlns="{ns}"><Id>{id}</Id><SyncToken>{token}</SyncToken></{node}>"#,
            node = Self::XML_NODE,
            ns = NAMESPACE,
            id = escape(self.id().unwrap_or_default()),
            token = escape(self.sync_token().unwrap_or("0")),
        )
    }
}

/// Text of the named child element, if present
pub fn child_text(node: &Element, name: &str) -> Option<String> {
    node.get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.to_string())
}

/// Text of a required child element
pub fn required_text(
    node: &Element,
    entity: &'static str,
    element: &'static str,
) -> Result<String, EntityError> {
    child_text(node, element).ok_or(EntityError::MissingField { entity, element })
}

/// Parse the named child element's text, if present
pub fn parse_child<T: FromStr>(
    node: &Element,
    entity: &'static str,
    element: &'static str,
) -> Result<Option<T>, EntityError> {
    match child_text(node, element) {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EntityError::InvalidValue {
                entity,
                element,
                value: text,
            }),
    }
}

/// Escape text for inclusion in element content or attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Append `<name>value</name>` when the value is present
pub(crate) fn push_element<T: ToString>(xml: &mut String, name: &str, value: Option<T>) {
    if let Some(value) = value {
        xml.push_str(&format!("<{0}>{1}</{0}>", name, escape(&value.to_string())));
    }
}
