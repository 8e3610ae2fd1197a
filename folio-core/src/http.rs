// HTTP request and response types

use crate::form::{FormCollection, MultipartParser, parse_form_pairs};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Values captured by the route template, e.g. `{id}` or `{handler?}`.
    pub route_values: HashMap<String, String>,
    /// Raw query string, with or without the leading `?`.
    pub query_string: String,
    /// Files attached by the transport when the body was already decoded.
    pub files: Vec<(String, crate::FormFile)>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            route_values: HashMap::new(),
            query_string: String::new(),
            files: Vec::new(),
        }
    }

    /// Parse the request body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, crate::Error> {
        serde_json::from_slice(&self.body).map_err(|e| crate::Error::Deserialization(e.to_string()))
    }

    /// Get a route value by name
    pub fn route_value(&self, name: &str) -> Option<&String> {
        self.route_values.get(name)
    }

    /// Get a header by name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type").map(|s| s.as_str())
    }

    /// Decoded query string pairs in submission order, repeated keys kept.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let raw = self.query_string.trim_start_matches('?');
        if raw.is_empty() {
            return Vec::new();
        }
        serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_else(|_| {
            // Fall back to a lenient split when the encoder rejects the input.
            raw.split('&')
                .filter(|part| !part.is_empty())
                .map(|part| {
                    let (k, v) = part.split_once('=').unwrap_or((part, ""));
                    (decode_component(k), decode_component(v))
                })
                .collect()
        })
    }

    /// First query value for `name`, matched case-insensitively.
    pub fn query(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// True when the body carries urlencoded or multipart form data.
    pub fn has_form_content_type(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("application/x-www-form-urlencoded")
                || ct.starts_with("multipart/form-data")
        })
    }

    /// Read the form collection from the body.
    ///
    /// Returns an empty collection when the request has no form content type.
    pub fn form(&self) -> Result<FormCollection, crate::Error> {
        let mut form = FormCollection::default();
        if let Some(ct) = self.content_type().filter(|_| self.has_form_content_type()) {
            if ct.to_ascii_lowercase().starts_with("multipart/form-data") {
                let parser = MultipartParser::from_content_type(ct)?;
                form = FormCollection::from_fields(parser.parse(&self.body)?);
            } else {
                form.fields = parse_form_pairs(&self.body)?;
            }
        }
        form.files.extend(self.files.iter().cloned());
        Ok(form)
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// HTTP response wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn no_content() -> Self {
        Self::new(204)
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::ok()
    }
}
