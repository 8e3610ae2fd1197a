//! # Folio
//!
//! Page handlers and model binding for Rust web applications.
//!
//! Folio is split into focused crates, re-exported here:
//!
//! - [`folio_core`]: requests, responses, form data, the service container
//!   and logging setup
//! - [`folio_validation`]: validation attributes and their messages
//! - [`folio_binding`]: value providers, model binders, model state and
//!   the object validator
//! - [`folio_pages`]: page descriptors, handler selection, filter
//!   pipelines and the page action invoker
//! - `folio_config` (feature `config`): file and environment configuration
//! - `folio_testing` (feature `testing`): request builders and model state
//!   assertions
//!
//! ## Quick Start
//!
//! ```
//! use folio::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Greeting;
//!
//! #[async_trait]
//! impl PageModel for Greeting {
//!     async fn invoke_handler(
//!         &mut self,
//!         _handler: &HandlerMethodDescriptor,
//!         _context: &mut PageContext,
//!         arguments: HandlerArguments,
//!     ) -> Result<Option<ActionResult>, Error> {
//!         let name: String = arguments.get("name")?;
//!         Ok(Some(ActionResult::content(format!("Hello, {}!", name))))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let page = PageActionDescriptor::new::<Greeting>("/Greeting").with_handler(
//!     HandlerMethodDescriptor::new("OnGet", "GET")
//!         .with_parameter(ParameterDescriptor::new::<String>("name")),
//! );
//! let pages = Arc::new(ActionDescriptorCollectionProvider::new(vec![page]));
//! let invoker = PageActionInvoker::builder(pages).build();
//!
//! let mut request = HttpRequest::new("GET", "/Greeting");
//! request.query_string = "?name=Ada".to_string();
//! let request = RequestContext::new(request, Container::new()).unwrap();
//!
//! let response = invoker.invoke_page("/Greeting", request).await.unwrap();
//! assert_eq!(response.body_string(), "Hello, Ada!");
//! # });
//! ```

pub use folio_binding;
pub use folio_core;
pub use folio_pages;
pub use folio_validation;

#[cfg(feature = "config")]
pub use folio_config;

#[cfg(feature = "testing")]
pub use folio_testing;

pub use folio_core::{Container, Error, FormFile, HttpRequest, HttpResponse, Provider};

// Prelude for common imports
pub mod prelude {
    pub use async_trait::async_trait;

    pub use folio_core::{Container, Error, FormFile, HttpRequest, HttpResponse, Provider};

    pub use folio_validation::{
        Custom, EmailAddress, Range, RegularExpression, Required, StringLength, Url,
        ValidationAttribute,
    };

    pub use folio_binding::{
        Bindable, BindingOptions, BindingRuntime, BindingSource, FromServices, KeyValuePair,
        ModelBindingResult, ModelMetadata, ModelStateDictionary, ModelValidationState,
        ParameterBinder, ParameterDescriptor, PropertyMetadata, ReadOnlyList, RequestContext,
    };

    pub use folio_pages::{
        ActionDescriptorCollectionProvider, ActionResult, AsyncAuthorizationFilter,
        AsyncPageFilter, AsyncResultFilter, AuthorizationFilter, AuthorizationFilterContext,
        BoundPropertyDescriptor, FilterCollection, HandlerArguments, HandlerMethodDescriptor,
        PageActionDescriptor, PageActionInvoker, PageContext, PageFilter,
        PageHandlerExecutedContext, PageHandlerExecutingContext, PageHandlerExecutionDelegate,
        PageHandlerSelectedContext, PageModel, PageOptions, ResultExecutedContext,
        ResultExecutingContext, ResultExecutionDelegate, ResultFilter,
    };
}
