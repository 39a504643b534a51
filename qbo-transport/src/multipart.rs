//! Upload parts and their conversion into a reqwest multipart form

use reqwest::blocking::multipart;

use crate::error::TransportError;

/// One named part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Part {
    /// A textual part, e.g. an XML metadata document
    pub fn text(name: &str, content_type: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            content_type: content_type.to_string(),
            data: text.as_bytes().to_vec(),
        }
    }

    /// A file part carrying raw bytes
    pub fn file(name: &str, file_name: &str, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            content_type: content_type.to_string(),
            data,
        }
    }
}

/// Build the form sent on the wire, parts in order
pub(crate) fn form(parts: &[Part]) -> Result<multipart::Form, TransportError> {
    let mut form = multipart::Form::new();
    for part in parts {
        let mut field = multipart::Part::bytes(part.data.clone())
            .mime_str(&part.content_type)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        if let Some(file_name) = &part.file_name {
            field = field.file_name(disposition_safe(file_name));
        }
        form = form.part(disposition_safe(&part.name), field);
    }
    Ok(form)
}

/// Names end up inside a quoted `Content-Disposition` parameter
fn disposition_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '"' | '\\' | '\r' | '\n' => '_',
            c => c,
        })
        .collect()
}
