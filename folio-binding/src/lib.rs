//! Model binding for Folio
//!
//! Turns request data (query string, route values, form fields, headers,
//! body, uploaded files, container services) into typed models, records
//! what happened in a [`ModelStateDictionary`], and validates the result.
//!
//! Models travel through binding as `serde_json::Value` and are extracted
//! into their Rust type at the end with `serde_json::from_value`. Types opt
//! in by implementing [`Bindable`].
//!
//! ```
//! use folio_binding::*;
//! use folio_core::{Container, HttpRequest};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let mut request = HttpRequest::new("GET", "/orders");
//! request.query_string = "?id=abcd".to_string();
//! let request = RequestContext::new(request, Container::new()).unwrap();
//!
//! let binder = ParameterBinder::new(Arc::new(BindingRuntime::default()));
//! let values = Arc::new(request.value_provider());
//! let mut model_state = ModelStateDictionary::new();
//!
//! let parameter = ParameterDescriptor::new::<i32>("id");
//! let result = binder
//!     .bind_model(&request, &values, &parameter, &mut model_state, None)
//!     .await
//!     .unwrap()
//!     .unwrap();
//!
//! assert!(!result.is_model_set);
//! assert_eq!(
//!     model_state.get("id").unwrap().errors[0].error_message,
//!     "The value 'abcd' is not valid for Int32."
//! );
//! # });
//! ```

pub mod binder;
pub mod binders;
pub mod composite;
pub mod context;
pub mod messages;
pub mod metadata;
pub mod model_state;
pub mod names;
pub mod options;
pub mod parameter;
pub mod types;
pub mod validation;
pub mod value_provider;

pub use binder::*;
pub use composite::CompositeModelBinder;
pub use context::*;
pub use messages::ModelBindingMessageProvider;
pub use metadata::{
    Bindable, BindingInfo, BindingSource, ComplexType, MetadataProvider, ModelKind, ModelMetadata,
    ModelTypeRef, PropertyMetadata, ScalarKind,
};
pub use model_state::*;
pub use options::BindingOptions;
pub use parameter::*;
pub use types::*;
pub use validation::{ObjectValidator, ValidationStateDictionary, ValidationStrategy};
pub use value_provider::*;
