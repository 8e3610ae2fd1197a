//! Per-request page state and the filter contexts
//!
//! Contexts handed to a `next` delegate are moved into it and come back as
//! the matching executed context, so every stage owns the request state
//! while it runs.

use crate::descriptor::{HandlerMethodDescriptor, PageActionDescriptor};
use crate::model::{HandlerArguments, PageInstance};
use crate::result::ActionResult;
use folio_binding::{
    Bindable, CompositeValueProvider, ModelStateDictionary, ParameterBinder, RequestContext,
};
use folio_core::{Error, HttpResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// State of one page request
pub struct PageContext {
    pub action: Arc<PageActionDescriptor>,
    pub request: RequestContext,
    pub value_provider: Arc<CompositeValueProvider>,
    pub model_state: ModelStateDictionary,
    pub response: HttpResponse,
    binder: ParameterBinder,
}

impl PageContext {
    pub fn new(
        action: Arc<PageActionDescriptor>,
        request: RequestContext,
        binder: ParameterBinder,
    ) -> Self {
        let value_provider = Arc::new(request.value_provider());
        let model_state = binder.runtime().new_model_state();
        Self {
            action,
            request,
            value_provider,
            model_state,
            response: HttpResponse::ok(),
            binder,
        }
    }

    pub fn http_method(&self) -> &str {
        &self.request.request.method
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// Bind request values into `model` under `prefix` and validate it
    pub async fn try_update_model<T>(&mut self, model: &mut T, prefix: &str) -> Result<bool, Error>
    where
        T: Bindable + Serialize + DeserializeOwned,
    {
        self.binder
            .try_update(
                &self.request,
                &self.value_provider,
                model,
                prefix,
                &mut self.model_state,
            )
            .await
    }
}

/// Authorization stage; setting `result` ends the request with it
pub struct AuthorizationFilterContext<'a> {
    pub page_context: &'a PageContext,
    pub result: Option<ActionResult>,
}

/// After handler selection; filters may pick a different handler
pub struct PageHandlerSelectedContext<'a> {
    pub page_context: &'a PageContext,
    pub page: &'a PageInstance,
    pub handler_method: Option<Arc<HandlerMethodDescriptor>>,
}

impl PageHandlerSelectedContext<'_> {
    /// The handlers declared by the page
    pub fn handler_methods(&self) -> &[Arc<HandlerMethodDescriptor>] {
        &self.page_context.action.handler_methods
    }
}

/// Before the handler runs; setting `result` short-circuits it
pub struct PageHandlerExecutingContext {
    pub page_context: PageContext,
    pub page: PageInstance,
    pub handler_method: Option<Arc<HandlerMethodDescriptor>>,
    pub arguments: HandlerArguments,
    pub result: Option<ActionResult>,
}

impl PageHandlerExecutingContext {
    /// Finish without running inner filters or the handler
    pub fn short_circuit(self) -> PageHandlerExecutedContext {
        let result = self.result.clone();
        self.into_executed(result, None, true)
    }

    /// Finish with `error` as if it was raised by the inner pipeline
    pub fn fail(self, error: Error) -> PageHandlerExecutedContext {
        self.into_executed(None, Some(error), false)
    }

    pub(crate) fn into_executed(
        self,
        result: Option<ActionResult>,
        error: Option<Error>,
        canceled: bool,
    ) -> PageHandlerExecutedContext {
        PageHandlerExecutedContext {
            page_context: self.page_context,
            page: self.page,
            handler_method: self.handler_method,
            result,
            error,
            exception_handled: false,
            canceled,
        }
    }
}

/// After the handler ran, was short-circuited, or failed
pub struct PageHandlerExecutedContext {
    pub page_context: PageContext,
    pub page: PageInstance,
    pub handler_method: Option<Arc<HandlerMethodDescriptor>>,
    pub result: Option<ActionResult>,
    /// Error raised by the handler or an inner filter
    pub error: Option<Error>,
    pub exception_handled: bool,
    /// An inner filter short-circuited
    pub canceled: bool,
}

impl PageHandlerExecutedContext {
    /// An error is pending and nobody handled it
    pub fn has_unhandled_error(&self) -> bool {
        self.error.is_some() && !self.exception_handled
    }
}

/// Before the result executes; `cancel` skips it
pub struct ResultExecutingContext {
    pub page_context: PageContext,
    pub page: PageInstance,
    pub result: ActionResult,
    pub cancel: bool,
}

impl ResultExecutingContext {
    /// Finish without executing the result
    pub fn short_circuit(self) -> ResultExecutedContext {
        self.into_executed(None, true)
    }

    pub fn fail(self, error: Error) -> ResultExecutedContext {
        self.into_executed(Some(error), false)
    }

    pub(crate) fn into_executed(self, error: Option<Error>, canceled: bool) -> ResultExecutedContext {
        ResultExecutedContext {
            page_context: self.page_context,
            page: self.page,
            result: self.result,
            error,
            exception_handled: false,
            canceled,
        }
    }
}

/// After the result executed, was canceled, or failed
pub struct ResultExecutedContext {
    pub page_context: PageContext,
    pub page: PageInstance,
    pub result: ActionResult,
    pub error: Option<Error>,
    pub exception_handled: bool,
    pub canceled: bool,
}

impl ResultExecutedContext {
    pub fn has_unhandled_error(&self) -> bool {
        self.error.is_some() && !self.exception_handled
    }
}
