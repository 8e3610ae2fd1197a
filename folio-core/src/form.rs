//! Form processing and multipart support

use crate::Error;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parse URL-encoded form data into ordered pairs, keeping repeated keys
pub fn parse_form_pairs(body: &[u8]) -> Result<Vec<(String, String)>, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Multipart form field
#[derive(Debug, Clone)]
pub struct FormField {
    /// Field name
    pub name: String,

    /// Field value (for text fields)
    pub value: Option<String>,

    /// File data (for file fields)
    pub file: Option<FormFile>,
}

/// Uploaded file data
///
/// Serializes with the payload as a base64 string so a bound file can travel
/// inside a JSON model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormFile {
    /// Form field the file was posted under
    #[serde(default)]
    pub name: String,

    /// Original filename
    pub file_name: String,

    /// Content type (MIME type)
    pub content_type: String,

    /// File size in bytes
    pub length: usize,

    /// File data
    #[serde(serialize_with = "encode_data", deserialize_with = "decode_data")]
    pub data: Vec<u8>,
}

impl FormFile {
    /// Create a new form file
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            length: data.len(),
            data,
        }
    }

    /// Get file extension
    pub fn extension(&self) -> Option<&str> {
        self.file_name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Payload as text, lossy for non UTF-8 content
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

fn encode_data<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

fn decode_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// Parsed form body: text fields and files, both in submission order
#[derive(Debug, Clone, Default)]
pub struct FormCollection {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, FormFile)>,
}

impl FormCollection {
    pub fn from_fields(fields: Vec<FormField>) -> Self {
        let mut form = Self::default();
        for field in fields {
            if let Some(file) = field.file {
                form.files.push((field.name, file));
            } else if let Some(value) = field.value {
                form.fields.push((field.name, value));
            }
        }
        form
    }

    /// All values posted under `name`, matched case-insensitively
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All files posted under `name`, matched case-insensitively
    pub fn files_named(&self, name: &str) -> Vec<&FormFile> {
        self.files
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, f)| f)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }
}

/// Multipart form data parser
pub struct MultipartParser {
    boundary: String,
}

impl MultipartParser {
    /// Create a new multipart parser from Content-Type header
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        // "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW"
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                part.trim()
                    .strip_prefix("boundary=")
                    .map(|b| b.trim_matches('"').to_string())
            })
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Ok(Self { boundary })
    }

    /// Parse multipart form data
    pub fn parse(&self, body: &[u8]) -> Result<Vec<FormField>, Error> {
        let boundary_marker = format!("--{}", self.boundary);
        let body_str = String::from_utf8_lossy(body);

        let mut fields = Vec::new();
        for part in body_str.split(&boundary_marker).skip(1) {
            if part.trim() == "--" || part.trim().is_empty() {
                continue;
            }
            if let Some(field) = self.parse_part(part)? {
                fields.push(field);
            }
        }

        Ok(fields)
    }

    fn parse_part(&self, part: &str) -> Result<Option<FormField>, Error> {
        let lines: Vec<&str> = part.lines().collect();
        if lines.is_empty() {
            return Ok(None);
        }

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;
        let mut content_start = lines.len();

        // The first line is the remainder of the boundary line.
        for (i, line) in lines.iter().enumerate().skip(1) {
            if line.trim().is_empty() {
                content_start = i + 1;
                break;
            }

            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-disposition:") {
                for attr in line.split(';') {
                    let attr = attr.trim();
                    if let Some(v) = attr.strip_prefix("name=") {
                        name = Some(v.trim_matches('"').to_string());
                    } else if let Some(v) = attr.strip_prefix("filename=") {
                        filename = Some(v.trim_matches('"').to_string());
                    }
                }
            } else if lower.starts_with("content-type:") {
                content_type = Some(line["content-type:".len()..].trim().to_string());
            }
        }

        let name = name.ok_or_else(|| Error::BadRequest("Missing field name".to_string()))?;
        let content = lines
            .get(content_start..)
            .map(|rest| rest.join("\n"))
            .unwrap_or_default();
        let content = content.trim_end_matches(['\r', '\n']).to_string();

        if let Some(filename) = filename {
            let file = FormFile::new(
                name.clone(),
                filename,
                content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                content.into_bytes(),
            );
            Ok(Some(FormField {
                name,
                value: None,
                file: Some(file),
            }))
        } else {
            Ok(Some(FormField {
                name,
                value: Some(content),
                file: None,
            }))
        }
    }
}
