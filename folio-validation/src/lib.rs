//! Validation attributes for Folio
//!
//! Attributes are attached to model metadata and evaluated by the object
//! validator after binding. Every built-in attribute carries an overridable
//! message: the default template, a replacement template using the same
//! placeholders, or a formatter function.
//!
//! ```
//! use folio_validation::{Range, Required, ValidationAttribute};
//! use serde_json::json;
//!
//! let required = Required::new();
//! assert_eq!(
//!     required.format_error_message("Name"),
//!     "The Name field is required."
//! );
//!
//! let range = Range::new(1.0, 10.0).with_message("{0} out of bounds ({1}..{2})");
//! let err = range.validate(&json!(42), "Age", "Age").unwrap_err();
//! assert_eq!(err.message, "Age out of bounds (1..10)");
//! ```

mod errors;
mod messages;
mod rules;
mod traits;
mod validators;

pub use errors::*;
pub use messages::*;
pub use rules::*;
pub use traits::*;
pub use validators::*;
