// Core library for the Folio page framework
// Requests, responses, form data, the service container and logging setup

pub mod container;
pub mod error;
pub mod form;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use container::*;
pub use error::*;
pub use form::*;
pub use http::*;
