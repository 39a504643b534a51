//! Extraction of the normalized error record from a fault fragment

use xmltree::Element;

use crate::error::IntuitRequestError;
use crate::xml::{first_descendant, probe_fault, Document, FaultProbe};

/// Normalized fields of a service fault
///
/// Absent values are empty strings, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorRecord {
    pub code: String,
    pub error_type: String,
    pub element: String,
    pub message: String,
    pub detail: String,
}

impl ErrorRecord {
    pub fn into_request_error(self, request_body: Option<&str>) -> IntuitRequestError {
        IntuitRequestError {
            message: self.message,
            detail: self.detail,
            code: self.code,
            error_type: self.error_type,
            element: self.element,
            request_body: request_body.map(str::to_string),
        }
    }
}

/// Read the first fault fragment of `document`
///
/// Never fails: a document that cannot be evaluated yields a record whose
/// `detail` is the raw body, and a document without a fault yields an empty
/// record.
pub fn extract_error(document: &Document, raw_body: &str) -> ErrorRecord {
    match probe_fault(document) {
        FaultProbe::Present(fault) => read_fault(fault),
        FaultProbe::Absent => ErrorRecord::default(),
        FaultProbe::Indeterminate(_) => ErrorRecord {
            detail: raw_body.to_string(),
            ..ErrorRecord::default()
        },
    }
}

fn read_fault(fault: &Element) -> ErrorRecord {
    let mut record = ErrorRecord {
        error_type: fault.attributes.get("type").cloned().unwrap_or_default(),
        ..ErrorRecord::default()
    };

    if let Some(error) = first_descendant(fault, "Error") {
        if let Some(code) = error.attributes.get("code") {
            record.code = code.clone();
        }
        if let Some(element) = error.attributes.get("element") {
            record.element = element.clone();
        }
        record.message = descendant_text(error, "Message");
        record.detail = descendant_text(error, "Detail");
    }

    record
}

fn descendant_text(element: &Element, name: &str) -> String {
    first_descendant(element, name)
        .and_then(|e| e.get_text())
        .map(|t| t.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::NAMESPACE;

    fn fault_doc(fault: &str) -> (Document, String) {
        let body = format!(r#"<IntuitResponse xmlns="{}">{}</IntuitResponse>"#, NAMESPACE, fault);
        (Document::parse(&body), body)
    }

    #[test]
    fn test_extracts_all_fields() {
        let (document, body) = fault_doc(
            r#"<Fault type="ValidationFault"><Error code="6240" element="DisplayName"><Message>Duplicate Name Exists Error</Message><Detail>The name supplied already exists.</Detail></Error></Fault>"#,
        );

        let record = extract_error(&document, &body);
        assert_eq!(
            record,
            ErrorRecord {
                code: "6240".to_string(),
                error_type: "ValidationFault".to_string(),
                element: "DisplayName".to_string(),
                message: "Duplicate Name Exists Error".to_string(),
                detail: "The name supplied already exists.".to_string(),
            }
        );
    }

    #[test]
    fn test_uses_first_error_only() {
        let (document, body) = fault_doc(
            r#"<Fault type="SystemFault"><Error code="10000"><Message>first</Message></Error><Error code="2"><Message>second</Message></Error></Fault>"#,
        );

        let record = extract_error(&document, &body);
        assert_eq!(record.code, "10000");
        assert_eq!(record.message, "first");
        assert_eq!(record.detail, "");
        assert_eq!(record.element, "");
    }

    #[test]
    fn test_fault_without_error_keeps_type() {
        let (document, body) = fault_doc(r#"<Fault type="AuthenticationFault"/>"#);

        let record = extract_error(&document, &body);
        assert_eq!(record.error_type, "AuthenticationFault");
        assert_eq!(record.code, "");
        assert_eq!(record.message, "");
    }

    #[test]
    fn test_no_fault_gives_empty_record() {
        let (document, body) = fault_doc("<Customer/>");
        assert_eq!(extract_error(&document, &body), ErrorRecord::default());
    }

    #[test]
    fn test_unevaluable_document_falls_back_to_raw_body() {
        let body = "<html><h1>Bad Gateway</h1>";
        let record = extract_error(&Document::parse(body), body);
        assert_eq!(record.detail, body);
        assert_eq!(record.message, "");

        let foreign = "<Response><Fault/></Response>";
        let record = extract_error(&Document::parse(foreign), foreign);
        assert_eq!(record.detail, foreign);
    }

    #[test]
    fn test_into_request_error_attaches_request_body() {
        let record = ErrorRecord {
            code: "1".to_string(),
            message: "m".to_string(),
            ..ErrorRecord::default()
        };
        let error = record.into_request_error(Some("<Customer/>"));
        assert_eq!(error.request_body.as_deref(), Some("<Customer/>"));
        assert_eq!(error.code, "1");
    }
}
