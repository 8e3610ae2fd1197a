//! Page, result and authorization filters
//!
//! Sync filters get `before`/`after` callbacks. Async filters receive the
//! executing context by value together with a `next` delegate; calling
//! `next(context)` runs the rest of the pipeline and returns the executed
//! context. A filter that does not call `next` short-circuits and builds the
//! executed context itself with `short_circuit()` or `fail()`.

use crate::context::{
    AuthorizationFilterContext, PageHandlerExecutedContext, PageHandlerExecutingContext,
    PageHandlerSelectedContext, ResultExecutedContext, ResultExecutingContext,
};
use async_trait::async_trait;
use folio_core::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Runs the remaining page filters and the handler
pub type PageHandlerExecutionDelegate =
    Box<dyn FnOnce(PageHandlerExecutingContext) -> BoxFuture<PageHandlerExecutedContext> + Send>;

/// Runs the remaining result filters and the result
pub type ResultExecutionDelegate =
    Box<dyn FnOnce(ResultExecutingContext) -> BoxFuture<ResultExecutedContext> + Send>;

pub trait AuthorizationFilter: Send + Sync {
    fn on_authorization(&self, context: &mut AuthorizationFilterContext<'_>) -> Result<(), Error>;
}

#[async_trait]
pub trait AsyncAuthorizationFilter: Send + Sync {
    async fn on_authorization(
        &self,
        context: &mut AuthorizationFilterContext<'_>,
    ) -> Result<(), Error>;
}

pub trait PageFilter: Send + Sync {
    fn on_page_handler_selected(
        &self,
        _context: &mut PageHandlerSelectedContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn on_page_handler_executing(
        &self,
        _context: &mut PageHandlerExecutingContext,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn on_page_handler_executed(
        &self,
        _context: &mut PageHandlerExecutedContext,
    ) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
pub trait AsyncPageFilter: Send + Sync {
    async fn on_page_handler_selection(
        &self,
        _context: &mut PageHandlerSelectedContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn on_page_handler_execution(
        &self,
        context: PageHandlerExecutingContext,
        next: PageHandlerExecutionDelegate,
    ) -> PageHandlerExecutedContext;
}

pub trait ResultFilter: Send + Sync {
    fn on_result_executing(&self, _context: &mut ResultExecutingContext) -> Result<(), Error> {
        Ok(())
    }

    fn on_result_executed(&self, _context: &mut ResultExecutedContext) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
pub trait AsyncResultFilter: Send + Sync {
    async fn on_result_execution(
        &self,
        context: ResultExecutingContext,
        next: ResultExecutionDelegate,
    ) -> ResultExecutedContext;
}

#[derive(Clone)]
pub enum Filter {
    Authorization(Arc<dyn AuthorizationFilter>),
    AsyncAuthorization(Arc<dyn AsyncAuthorizationFilter>),
    Page(Arc<dyn PageFilter>),
    AsyncPage(Arc<dyn AsyncPageFilter>),
    Result(Arc<dyn ResultFilter>),
    AsyncResult(Arc<dyn AsyncResultFilter>),
}

impl Filter {
    pub fn stage(&self) -> FilterStage {
        match self {
            Filter::Authorization(_) | Filter::AsyncAuthorization(_) => FilterStage::Authorization,
            Filter::Page(_) | Filter::AsyncPage(_) => FilterStage::Page,
            Filter::Result(_) | Filter::AsyncResult(_) => FilterStage::Result,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Filter::Authorization(_) => "authorization",
            Filter::AsyncAuthorization(_) => "async authorization",
            Filter::Page(_) => "page",
            Filter::AsyncPage(_) => "async page",
            Filter::Result(_) => "result",
            Filter::AsyncResult(_) => "async result",
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.kind_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Authorization,
    Page,
    Result,
}

/// A filter with its position; lower orders run first (outermost)
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    pub order: i32,
    pub filter: Filter,
}

/// Ordered filter registrations of the application or of one page
#[derive(Debug, Clone, Default)]
pub struct FilterCollection {
    descriptors: Vec<FilterDescriptor>,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, filter: Filter) -> Self {
        self.push(0, filter);
        self
    }

    pub fn add_ordered(mut self, order: i32, filter: Filter) -> Self {
        self.push(order, filter);
        self
    }

    pub fn push(&mut self, order: i32, filter: Filter) {
        self.descriptors.push(FilterDescriptor { order, filter });
    }

    pub fn authorization(self, filter: impl AuthorizationFilter + 'static) -> Self {
        self.add(Filter::Authorization(Arc::new(filter)))
    }

    pub fn async_authorization(self, filter: impl AsyncAuthorizationFilter + 'static) -> Self {
        self.add(Filter::AsyncAuthorization(Arc::new(filter)))
    }

    pub fn page(self, filter: impl PageFilter + 'static) -> Self {
        self.add(Filter::Page(Arc::new(filter)))
    }

    pub fn async_page(self, filter: impl AsyncPageFilter + 'static) -> Self {
        self.add(Filter::AsyncPage(Arc::new(filter)))
    }

    pub fn result(self, filter: impl ResultFilter + 'static) -> Self {
        self.add(Filter::Result(Arc::new(filter)))
    }

    pub fn async_result(self, filter: impl AsyncResultFilter + 'static) -> Self {
        self.add(Filter::AsyncResult(Arc::new(filter)))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.descriptors.iter()
    }
}

/// Filters of one page split by stage, in execution order
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    pub authorization: Vec<Filter>,
    pub page: Vec<Filter>,
    pub result: Vec<Filter>,
}

impl FilterPipeline {
    /// Merge `global` and page filters; order ties keep global filters first
    pub fn build(global: &FilterCollection, page: &FilterCollection) -> Self {
        let mut descriptors: Vec<&FilterDescriptor> = global.iter().chain(page.iter()).collect();
        descriptors.sort_by_key(|d| d.order);

        let mut pipeline = FilterPipeline::default();
        for descriptor in descriptors {
            let filter = descriptor.filter.clone();
            match filter.stage() {
                FilterStage::Authorization => pipeline.authorization.push(filter),
                FilterStage::Page => pipeline.page.push(filter),
                FilterStage::Result => pipeline.result.push(filter),
            }
        }
        pipeline
    }

    /// `"page, async page"` or `"None"`, for the execution plan log
    pub fn describe(filters: &[Filter]) -> String {
        if filters.is_empty() {
            return "None".to_string();
        }
        filters
            .iter()
            .map(Filter::kind_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl PageFilter for Noop {}
    impl ResultFilter for Noop {}

    struct Deny;
    impl AuthorizationFilter for Deny {
        fn on_authorization(&self, _context: &mut AuthorizationFilterContext<'_>) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn test_pipeline_splits_stages() {
        let global = FilterCollection::new().page(Noop).authorization(Deny);
        let page = FilterCollection::new().result(Noop).page(Noop);

        let pipeline = FilterPipeline::build(&global, &page);
        assert_eq!(pipeline.authorization.len(), 1);
        assert_eq!(pipeline.page.len(), 2);
        assert_eq!(pipeline.result.len(), 1);
    }

    #[test]
    fn test_pipeline_orders_by_order() {
        let first: Arc<dyn PageFilter> = Arc::new(Noop);
        let global = FilterCollection::new().page(Noop);
        let page = FilterCollection::new().add_ordered(-10, Filter::Page(first.clone()));

        let pipeline = FilterPipeline::build(&global, &page);
        match &pipeline.page[0] {
            Filter::Page(filter) => assert!(Arc::ptr_eq(filter, &first)),
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterPipeline::describe(&[]), "None");
        let pipeline = FilterPipeline::build(&FilterCollection::new().page(Noop).result(Noop), &FilterCollection::new());
        assert_eq!(FilterPipeline::describe(&pipeline.page), "page");
    }
}
