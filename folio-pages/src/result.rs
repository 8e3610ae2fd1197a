//! Action results
//!
//! A handler or filter produces an [`ActionResult`]; the invoker executes
//! it into the request's [`HttpResponse`] once the result filters ran.

use crate::context::PageContext;
use crate::model::{PageInstance, PageModel};
use async_trait::async_trait;
use folio_core::logging::trace;
use folio_core::{Error, HttpResponse};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonResult {
    pub value: Value,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedirectResult {
    pub url: String,
    pub permanent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentResult {
    pub content: String,
    pub content_type: Option<String>,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Render the page
    Page(PageResult),
    /// Write nothing
    Empty,
    StatusCode(u16),
    Json(JsonResult),
    Redirect(RedirectResult),
    Content(ContentResult),
}

impl ActionResult {
    pub fn page() -> Self {
        ActionResult::Page(PageResult::default())
    }

    pub fn status(code: u16) -> Self {
        ActionResult::StatusCode(code)
    }

    pub fn not_found() -> Self {
        ActionResult::StatusCode(404)
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        Ok(ActionResult::Json(JsonResult {
            value: serde_json::to_value(value)?,
            status_code: None,
        }))
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        ActionResult::Redirect(RedirectResult {
            url: url.into(),
            permanent: false,
        })
    }

    pub fn content(content: impl Into<String>) -> Self {
        ActionResult::Content(ContentResult {
            content: content.into(),
            content_type: None,
            status_code: None,
        })
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ActionResult::Page(_) => "PageResult",
            ActionResult::Empty => "EmptyResult",
            ActionResult::StatusCode(_) => "StatusCodeResult",
            ActionResult::Json(_) => "JsonResult",
            ActionResult::Redirect(_) => "RedirectResult",
            ActionResult::Content(_) => "ContentResult",
        }
    }

    /// Write the result into `context.response`
    pub async fn execute(
        &self,
        context: &mut PageContext,
        page: &PageInstance,
        renderer: &dyn PageRenderer,
    ) -> Result<(), Error> {
        trace!(result = self.name(), page = %context.action.id, "Executing action result");
        match self {
            ActionResult::Page(result) => {
                let page = page.lock().await;
                renderer.render(context, &**page, result).await
            }
            ActionResult::Empty => Ok(()),
            ActionResult::StatusCode(code) => {
                context.response.status = *code;
                Ok(())
            }
            ActionResult::Json(result) => {
                let response = HttpResponse::new(result.status_code.unwrap_or(200));
                context.response = response.with_json(&result.value)?;
                Ok(())
            }
            ActionResult::Redirect(result) => {
                let status = if result.permanent { 301 } else { 302 };
                context.response = HttpResponse::new(status).with_header("Location", result.url.clone());
                Ok(())
            }
            ActionResult::Content(result) => {
                let content_type = result
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "text/plain; charset=utf-8".to_string());
                context.response = HttpResponse::new(result.status_code.unwrap_or(200))
                    .with_header("Content-Type", content_type)
                    .with_body(result.content.clone().into_bytes());
                Ok(())
            }
        }
    }
}

/// Produces the response body of a [`PageResult`]
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        context: &mut PageContext,
        page: &dyn PageModel,
        result: &PageResult,
    ) -> Result<(), Error>;
}

/// Renders the page's view data and model state as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPageRenderer;

#[async_trait]
impl PageRenderer for JsonPageRenderer {
    async fn render(
        &self,
        context: &mut PageContext,
        page: &dyn PageModel,
        result: &PageResult,
    ) -> Result<(), Error> {
        let body = json!({
            "page": context.action.id,
            "model": page.view_data()?,
            "modelState": context.model_state.to_json(),
        });

        let mut response = HttpResponse::new(result.status_code.unwrap_or(200)).with_json(&body)?;
        if let Some(content_type) = &result.content_type {
            response = response.with_header("Content-Type", content_type.clone());
        }
        context.response = response;
        Ok(())
    }
}
