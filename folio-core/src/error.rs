// Error types for the Folio framework

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Dependency injection error: {0}")]
    DependencyInjection(String),

    /// A caller broke a contract of the binding or filter pipeline.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Ambiguous handler: {0}")]
    AmbiguousHandler(String),

    /// Raised by user handler or filter code.
    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) | Error::Deserialization(_) | Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::UnsupportedMediaType(_) => 415,
            _ => 500,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::Deserialization(err.to_string())
        } else {
            Error::Serialization(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::Deserialization("x".into()).status_code(), 400);
        assert_eq!(Error::UnsupportedMediaType("x".into()).status_code(), 415);
        assert_eq!(Error::AmbiguousHandler("x".into()).status_code(), 500);
        assert_eq!(Error::ProviderNotFound("x".into()).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::NotFound("page".into()).is_client_error());
        assert!(!Error::NotFound("page".into()).is_server_error());
        assert!(Error::InvalidOperation("state".into()).is_server_error());
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(Error::from(err), Error::Deserialization(_)));
    }
}
