//! Attachable entity: a file or note linked to other entities

use xmltree::{Element, XMLNode};

use crate::entity::{child_text, escape, parse_child, push_element, required_text, Entity, EntityError, Persistable};
use crate::xml::NAMESPACE;

/// Link from an attachment to the entity it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachableRef {
    /// Entity type, e.g. `Invoice`
    pub entity_type: String,
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachable {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub file_name: Option<String>,
    pub note: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub temp_download_uri: Option<String>,
    pub refs: Vec<AttachableRef>,
}

impl Attachable {
    /// Metadata for uploading `file_name` and linking it to one entity
    pub fn for_upload(file_name: &str, content_type: &str, entity_type: &str, entity_id: &str) -> Self {
        Attachable {
            file_name: Some(file_name.to_string()),
            content_type: Some(content_type.to_string()),
            refs: vec![AttachableRef {
                entity_type: entity_type.to_string(),
                entity_id: entity_id.to_string(),
            }],
            ..Attachable::default()
        }
    }
}

impl Entity for Attachable {
    const XML_NODE: &'static str = "Attachable";
    const RESOURCE: &'static str = "attachable";

    fn from_xml(node: &Element) -> Result<Self, EntityError> {
        let refs = node
            .children
            .iter()
            .filter_map(|n| match n {
                XMLNode::Element(e) if e.name == "AttachableRef" => e.get_child("EntityRef"),
                _ => None,
            })
            .map(|entity_ref| AttachableRef {
                entity_type: entity_ref.attributes.get("type").cloned().unwrap_or_default(),
                entity_id: entity_ref.get_text().map(|t| t.to_string()).unwrap_or_default(),
            })
            .collect();

        Ok(Attachable {
            id: Some(required_text(node, "Attachable", "Id")?),
            sync_token: child_text(node, "SyncToken"),
            file_name: child_text(node, "FileName"),
            note: child_text(node, "Note"),
            content_type: child_text(node, "ContentType"),
            size: parse_child(node, "Attachable", "Size")?,
            temp_download_uri: child_text(node, "TempDownloadUri"),
            refs,
        })
    }
}

impl Persistable for Attachable {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(r#"<Attachable xmlns="{}">"#, NAMESPACE);
        push_element(&mut xml, "Id", self.id.as_deref());
        push_element(&mut xml, "SyncToken", self.sync_token.as_deref());
        for r in &self.refs {
            xml.push_str(&format!(
                r#"<AttachableRef><EntityRef type="{}">{}</EntityRef></AttachableRef>"#,
                escape(&r.entity_type),
                escape(&r.entity_id)
            ));
        }
        push_element(&mut xml, "FileName", self.file_name.as_deref());
        push_element(&mut xml, "Note", self.note.as_deref());
        push_element(&mut xml, "ContentType", self.content_type.as_deref());
        xml.push_str("</Attachable>");
        xml
    }
}
