//! Vendor entity

use xmltree::Element;

use crate::entity::{child_text, parse_child, push_element, required_text, Entity, EntityError, Persistable};
use crate::xml::NAMESPACE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vendor {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub account_number: Option<String>,
    pub active: Option<bool>,
    pub balance: Option<f64>,
}

impl Entity for Vendor {
    const XML_NODE: &'static str = "Vendor";
    const RESOURCE: &'static str = "vendor";

    fn from_xml(node: &Element) -> Result<Self, EntityError> {
        Ok(Vendor {
            id: Some(required_text(node, "Vendor", "Id")?),
            sync_token: child_text(node, "SyncToken"),
            display_name: child_text(node, "DisplayName"),
            company_name: child_text(node, "CompanyName"),
            account_number: child_text(node, "AcctNum"),
            active: parse_child(node, "Vendor", "Active")?,
            balance: parse_child(node, "Vendor", "Balance")?,
        })
    }
}

impl Persistable for Vendor {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(r#"<Vendor xmlns="{}">"#, NAMESPACE);
        push_element(&mut xml, "Id", self.id.as_deref());
        push_element(&mut xml, "SyncToken", self.sync_token.as_deref());
        push_element(&mut xml, "CompanyName", self.company_name.as_deref());
        push_element(&mut xml, "DisplayName", self.display_name.as_deref());
        push_element(&mut xml, "AcctNum", self.account_number.as_deref());
        push_element(&mut xml, "Active", self.active);
        xml.push_str("</Vendor>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_from_xml() {
        let xml = r#"<Vendor><Id>56</Id><SyncToken>0</SyncToken><DisplayName>Bob's Burger Joint</DisplayName><AcctNum>1345</AcctNum><Active>true</Active><Balance>0</Balance></Vendor>"#;
        let node = Element::parse(xml.as_bytes()).unwrap();

        let vendor = Vendor::from_xml(&node).unwrap();
        assert_eq!(vendor.id.as_deref(), Some("56"));
        assert_eq!(vendor.display_name.as_deref(), Some("Bob's Burger Joint"));
        assert_eq!(vendor.account_number.as_deref(), Some("1345"));
        assert_eq!(vendor.balance, Some(0.0));
    }

    #[test]
    fn test_vendor_invalid_active_flag() {
        let xml = r#"<Vendor><Id>56</Id><Active>maybe</Active></Vendor>"#;
        let node = Element::parse(xml.as_bytes()).unwrap();
        assert!(matches!(
            Vendor::from_xml(&node),
            Err(EntityError::InvalidValue { element: "Active", .. })
        ));
    }
}
