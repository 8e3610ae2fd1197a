//! Page handlers for Folio
//!
//! A page is described by a [`PageActionDescriptor`]: its handlers, the
//! properties bound before they run, its filters and a factory for the
//! [`PageModel`]. The [`PageActionInvoker`] selects the handler for a
//! request, binds it, and runs it inside the authorization, page and
//! result filter pipelines.
//!
//! ```
//! use async_trait::async_trait;
//! use folio_binding::{ParameterDescriptor, RequestContext};
//! use folio_core::{Container, Error, HttpRequest};
//! use folio_pages::*;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! #[async_trait]
//! impl PageModel for Counter {
//!     async fn invoke_handler(
//!         &mut self,
//!         _handler: &HandlerMethodDescriptor,
//!         _context: &mut PageContext,
//!         arguments: HandlerArguments,
//!     ) -> Result<Option<ActionResult>, Error> {
//!         let count: i32 = arguments.get("count")?;
//!         Ok(Some(ActionResult::content(format!("count={}", count + 1))))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let page = PageActionDescriptor::new::<Counter>("/Counter").with_handler(
//!     HandlerMethodDescriptor::new("OnGet", "GET")
//!         .with_parameter(ParameterDescriptor::new::<i32>("count")),
//! );
//! let pages = Arc::new(ActionDescriptorCollectionProvider::new(vec![page]));
//! let invoker = PageActionInvoker::builder(pages).build();
//!
//! let mut request = HttpRequest::new("GET", "/Counter");
//! request.query_string = "?count=41".to_string();
//! let request = RequestContext::new(request, Container::new()).unwrap();
//!
//! let response = invoker.invoke_page("/Counter", request).await.unwrap();
//! assert_eq!(response.body_string(), "count=42");
//! # });
//! ```

pub mod binder;
pub mod cache;
pub mod context;
pub mod descriptor;
pub mod filters;
pub mod invoker;
pub mod model;
pub mod options;
pub mod result;
pub mod selector;

pub use binder::PageBinder;
pub use cache::{
    ActionDescriptorCollection, ActionDescriptorCollectionProvider, PageActionInvokerCache,
    PageActionInvokerCacheEntry,
};
pub use context::*;
pub use descriptor::*;
pub use filters::*;
pub use invoker::{PageActionInvoker, PageActionInvokerBuilder};
pub use model::*;
pub use options::PageOptions;
pub use result::*;
pub use selector::{DefaultPageHandlerMethodSelector, PageHandlerMethodSelector};
