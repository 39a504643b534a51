//! Customer entity

use xmltree::Element;

use crate::entity::{child_text, parse_child, push_element, required_text, Entity, EntityError, Persistable};
use crate::xml::NAMESPACE;

/// A customer of the company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
    /// Read-only, maintained by the service
    pub balance: Option<f64>,
    /// Send only the populated fields on update
    pub sparse: bool,
}

impl Entity for Customer {
    const XML_NODE: &'static str = "Customer";
    const RESOURCE: &'static str = "customer";

    fn from_xml(node: &Element) -> Result<Self, EntityError> {
        Ok(Customer {
            id: Some(required_text(node, "Customer", "Id")?),
            sync_token: child_text(node, "SyncToken"),
            display_name: child_text(node, "DisplayName"),
            given_name: child_text(node, "GivenName"),
            family_name: child_text(node, "FamilyName"),
            company_name: child_text(node, "CompanyName"),
            email: node
                .get_child("PrimaryEmailAddr")
                .and_then(|e| child_text(e, "Address")),
            active: parse_child(node, "Customer", "Active")?,
            balance: parse_child(node, "Customer", "Balance")?,
            sparse: false,
        })
    }
}

impl Persistable for Customer {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    fn to_xml(&self) -> String {
        let mut xml = if self.sparse {
            format!(r#"<Customer xmlns="{}" sparse="true">"#, NAMESPACE)
        } else {
            format!(r#"<Customer xmlns="{}">"#, NAMESPACE)
        };
        push_element(&mut xml, "Id", self.id.as_deref());
        push_element(&mut xml, "SyncToken", self.sync_token.as_deref());
        push_element(&mut xml, "GivenName", self.given_name.as_deref());
        push_element(&mut xml, "FamilyName", self.family_name.as_deref());
        push_element(&mut xml, "CompanyName", self.company_name.as_deref());
        push_element(&mut xml, "DisplayName", self.display_name.as_deref());
        if let Some(email) = &self.email {
            xml.push_str("<PrimaryEmailAddr>");
            push_element(&mut xml, "Address", Some(email.as_str()));
            xml.push_str("</PrimaryEmailAddr>");
        }
        push_element(&mut xml, "Active", self.active);
        xml.push_str("</Customer>");
        xml
    }
}
