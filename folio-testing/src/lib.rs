//! Testing utilities for Folio.
//!
//! - [`TestRequestBuilder`] shapes requests: query, form, headers, route
//!   values, bodies and uploaded files
//! - [`binding_test_context`] turns one into a [`BindingTestContext`] that
//!   binds parameters and keeps the resulting model state
//! - the `assert_*` helpers check model state entries and their errors
//!
//! ```
//! use folio_binding::ModelValidationState;
//! use folio_testing::*;
//!
//! # tokio_test::block_on(async {
//! let mut context = binding_test_context(|request| {
//!     request
//!         .query("Parameter1", "someValue")
//!         .query("Parameter1", "otherValue")
//! })
//! .unwrap();
//!
//! let value = context.bind_value::<String>("Parameter1").await.unwrap();
//! assert_eq!(value.as_deref(), Some("someValue"));
//! assert_attempted_value(&context.model_state, "Parameter1", "someValue,otherValue");
//! assert_model_state_entry(&context.model_state, "Parameter1", ModelValidationState::Valid);
//! # });
//! ```

mod assertions;
mod context;
mod request;

pub use assertions::{
    assert_attempted_value, assert_invalid, assert_model_state_entry, assert_single_error,
    assert_valid,
};
pub use context::{BindingTestContext, BindingTestContextBuilder, binding_test_context};
pub use request::TestRequestBuilder;
