// Request builder for binding and page tests

use folio_binding::RequestContext;
use folio_core::{Container, Error, FormFile, HttpRequest};
use serde::Serialize;
use std::collections::HashMap;

/// Builds an [`HttpRequest`] piece by piece.
///
/// Query and form pairs keep their order and may repeat a key.
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    route_values: HashMap<String, String>,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    files: Vec<(String, FormFile)>,
    body: Option<Vec<u8>>,
}

impl TestRequestBuilder {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            route_values: HashMap::new(),
            query: Vec::new(),
            form: Vec::new(),
            files: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a form field; the body becomes urlencoded form data
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Attach an uploaded file under the form field `name`
    pub fn file(mut self, name: impl Into<String>, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        let name = name.into();
        let file = FormFile::new(name.clone(), file_name, content_type, data.to_vec());
        self.files.push((name, file));
        self
    }

    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<HttpRequest, Error> {
        let mut request = HttpRequest::new(self.method, self.path);
        request.headers = self.headers;
        request.route_values = self.route_values;
        request.files = self.files;

        if !self.query.is_empty() {
            request.query_string = format!("?{}", encode(&self.query)?);
        }

        if !self.form.is_empty() {
            request
                .headers
                .entry("Content-Type".to_string())
                .or_insert_with(|| "application/x-www-form-urlencoded".to_string());
            request.body = encode(&self.form)?.into_bytes();
        }
        if let Some(body) = self.body {
            request.body = body;
        }
        Ok(request)
    }

    /// Build and wrap the request for binding, with `services` as its container
    pub fn context(self, services: Container) -> Result<RequestContext, Error> {
        RequestContext::new(self.build()?, services)
    }
}

fn encode(pairs: &[(String, String)]) -> Result<String, Error> {
    serde_urlencoded::to_string(pairs).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keeps_repeated_keys() {
        let request = TestRequestBuilder::get("/")
            .query("Parameter1", "someValue")
            .query("Parameter1", "otherValue")
            .query("a[0]", "x y")
            .build()
            .unwrap();

        let pairs = request.query_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("a[0]".to_string(), "x y".to_string()));
    }

    #[test]
    fn test_form_sets_content_type() {
        let request = TestRequestBuilder::post("/")
            .form("Addresses.index", "Key1")
            .form("Addresses[Key1].Street", "Street1")
            .build()
            .unwrap();

        assert!(request.has_form_content_type());
        let form = request.form().unwrap();
        assert_eq!(form.get_all("Addresses[Key1].Street"), vec!["Street1"]);
    }

    #[test]
    fn test_json_body() {
        let request = TestRequestBuilder::post("/")
            .json(&serde_json::json!({"Name": "Ada"}))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.json::<serde_json::Value>().unwrap()["Name"], "Ada");
    }

    #[test]
    fn test_files_and_route_values() {
        let request = TestRequestBuilder::post("/")
            .route_value("handler", "Upload")
            .file("Avatar", "me.png", "image/png", b"png")
            .build()
            .unwrap();

        assert_eq!(request.route_value("handler").map(String::as_str), Some("Upload"));
        let form = request.form().unwrap();
        assert_eq!(form.files_named("Avatar").len(), 1);
    }
}
