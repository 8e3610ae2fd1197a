//! The page action invoker
//!
//! One request runs through these stages, strictly in order:
//!
//! 1. authorization filters (a result ends the request here)
//! 2. page creation and handler selection
//! 3. `on_page_handler_selection` on the page model, then on the page filters
//! 4. page property binding, then handler argument binding
//! 5. the page filter pipeline around the handler
//! 6. the result filter pipeline around result execution
//!
//! Errors raised inside stages 5 and 6 are stored in the executed contexts
//! so outer filters can observe or handle them. Whatever is still unhandled
//! when a pipeline unwinds is returned from [`PageActionInvoker::invoke`]
//! as the original error value.

use crate::binder::PageBinder;
use crate::cache::{ActionDescriptorCollectionProvider, PageActionInvokerCache};
use crate::context::{
    AuthorizationFilterContext, PageContext, PageHandlerExecutedContext,
    PageHandlerExecutingContext, PageHandlerSelectedContext, ResultExecutedContext,
    ResultExecutingContext,
};
use crate::descriptor::PageActionDescriptor;
use crate::filters::{
    AsyncPageFilter, BoxFuture, Filter, FilterCollection, FilterPipeline, PageHandlerExecutionDelegate,
    ResultExecutionDelegate,
};
use crate::model::{HandlerArguments, PageInstance};
use crate::options::PageOptions;
use crate::result::{ActionResult, JsonPageRenderer, PageRenderer};
use crate::selector::{DefaultPageHandlerMethodSelector, PageHandlerMethodSelector};
use folio_binding::{BindingRuntime, ParameterBinder, RequestContext};
use folio_core::logging::{debug, error, trace};
use folio_core::{Error, HttpResponse};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const NEXT_AFTER_PAGE_RESULT: &str = "An async page filter that sets a result on the executing context must not call next; return context.short_circuit() instead.";

const NEXT_AFTER_RESULT_CANCEL: &str = "An async result filter that sets cancel on the executing context must not call next; return context.short_circuit() instead.";

/// Runs page requests against the registered page descriptors
pub struct PageActionInvoker {
    cache: PageActionInvokerCache,
    binder: PageBinder,
    parameter_binder: ParameterBinder,
    selector: Arc<dyn PageHandlerMethodSelector>,
    renderer: Arc<dyn PageRenderer>,
}

impl PageActionInvoker {
    pub fn builder(collection: Arc<ActionDescriptorCollectionProvider>) -> PageActionInvokerBuilder {
        PageActionInvokerBuilder::new(collection)
    }

    pub fn cache(&self) -> &PageActionInvokerCache {
        &self.cache
    }

    pub fn collection(&self) -> &Arc<ActionDescriptorCollectionProvider> {
        self.cache.collection()
    }

    /// Invoke the page registered under `id`
    pub async fn invoke_page(&self, id: &str, request: RequestContext) -> Result<HttpResponse, Error> {
        let action = self
            .collection()
            .descriptors()
            .find(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No page is registered as '{}'.", id)))?;
        self.invoke(&action, request).await
    }

    /// Run `action` for `request` and return the response written by its result
    pub async fn invoke(
        &self,
        action: &Arc<PageActionDescriptor>,
        request: RequestContext,
    ) -> Result<HttpResponse, Error> {
        let entry = self.cache.get_or_create(action);
        let mut context = PageContext::new(entry.action.clone(), request, self.parameter_binder.clone());
        debug!(page = %entry.action.id, method = %context.http_method(), "Executing page");

        if let Some(result) = authorize(&entry.filters, &context).await? {
            let page = PageInstance::new((entry.page_factory)(&context));
            debug!(page = %entry.action.id, result = result.name(), "Executing authorization result");
            result.execute(&mut context, &page, &*self.renderer).await?;
            return Ok(context.response);
        }

        let page = PageInstance::new((entry.page_factory)(&context));
        let handler_method = {
            let mut selected = PageHandlerSelectedContext {
                page_context: &context,
                page: &page,
                handler_method: self.selector.select(&context)?,
            };
            page.lock().await.on_page_handler_selection(&mut selected).await?;
            for filter in &entry.filters.page {
                match filter {
                    Filter::Page(filter) => filter.on_page_handler_selected(&mut selected)?,
                    Filter::AsyncPage(filter) => filter.on_page_handler_selection(&mut selected).await?,
                    _ => {}
                }
            }
            selected.handler_method
        };

        {
            let mut model = page.lock().await;
            self.binder
                .bind_properties(&mut context, &mut **model, &entry.action.bound_properties)
                .await?;
        }
        let arguments = match &handler_method {
            Some(handler) => self.binder.bind_arguments(&mut context, handler).await?,
            None => HandlerArguments::new(),
        };

        let pipeline = Arc::new(Pipeline {
            filters: entry.filters.clone(),
            renderer: self.renderer.clone(),
        });

        let executing = PageHandlerExecutingContext {
            page_context: context,
            page,
            handler_method,
            arguments,
            result: None,
        };
        let mut executed = next_page_filter(pipeline.clone(), 0, executing).await;
        if !executed.exception_handled {
            if let Some(err) = executed.error.take() {
                error!(page = %entry.action.id, error = %err, "Unhandled error in page handler pipeline");
                return Err(err);
            }
        }

        let result = match executed.result.take() {
            Some(result) => result,
            None => {
                trace!(page = %entry.action.id, canceled = executed.canceled, "Page pipeline produced no result");
                ActionResult::Empty
            }
        };

        let executing = ResultExecutingContext {
            page_context: executed.page_context,
            page: executed.page,
            result,
            cancel: false,
        };
        let mut executed = next_result_filter(pipeline, 0, executing).await;
        if !executed.exception_handled {
            if let Some(err) = executed.error.take() {
                error!(page = %entry.action.id, error = %err, "Unhandled error in result pipeline");
                return Err(err);
            }
        }

        debug!(
            page = %entry.action.id,
            status = executed.page_context.response.status,
            "Executed page"
        );
        Ok(executed.page_context.response)
    }
}

pub struct PageActionInvokerBuilder {
    collection: Arc<ActionDescriptorCollectionProvider>,
    runtime: Option<Arc<BindingRuntime>>,
    options: PageOptions,
    global_filters: FilterCollection,
    selector: Option<Arc<dyn PageHandlerMethodSelector>>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl PageActionInvokerBuilder {
    pub fn new(collection: Arc<ActionDescriptorCollectionProvider>) -> Self {
        Self {
            collection,
            runtime: None,
            options: PageOptions::default(),
            global_filters: FilterCollection::new(),
            selector: None,
            renderer: None,
        }
    }

    pub fn runtime(mut self, runtime: Arc<BindingRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Options of the default handler selector
    pub fn options(mut self, options: PageOptions) -> Self {
        self.options = options;
        self
    }

    /// Filters applied to every page
    pub fn global_filters(mut self, filters: FilterCollection) -> Self {
        self.global_filters = filters;
        self
    }

    pub fn selector(mut self, selector: impl PageHandlerMethodSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    pub fn renderer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> PageActionInvoker {
        let runtime = self.runtime.unwrap_or_default();
        let parameter_binder = ParameterBinder::new(runtime);
        let options = self.options;
        PageActionInvoker {
            cache: PageActionInvokerCache::new(self.collection, self.global_filters),
            binder: PageBinder::new(parameter_binder.clone()),
            parameter_binder,
            selector: self
                .selector
                .unwrap_or_else(|| Arc::new(DefaultPageHandlerMethodSelector::new(options))),
            renderer: self.renderer.unwrap_or_else(|| Arc::new(JsonPageRenderer)),
        }
    }
}

/// What the filter stages of one request share
struct Pipeline {
    filters: Arc<FilterPipeline>,
    renderer: Arc<dyn PageRenderer>,
}

async fn authorize(
    filters: &FilterPipeline,
    context: &PageContext,
) -> Result<Option<ActionResult>, Error> {
    let mut authorization = AuthorizationFilterContext {
        page_context: context,
        result: None,
    };

    for (index, filter) in filters.authorization.iter().enumerate() {
        match filter {
            Filter::Authorization(filter) => filter.on_authorization(&mut authorization)?,
            Filter::AsyncAuthorization(filter) => filter.on_authorization(&mut authorization).await?,
            _ => continue,
        }
        if authorization.result.is_some() {
            debug!(filter_index = index, "Authorization filter short-circuited");
            break;
        }
    }
    Ok(authorization.result)
}

/// Continue after a sync `executing` callback, or finish this stage
fn after_page_executing(
    outcome: Result<(), Error>,
    context: PageHandlerExecutingContext,
    index: usize,
) -> Result<PageHandlerExecutingContext, PageHandlerExecutedContext> {
    match outcome {
        Err(err) => {
            debug!(filter_index = index, error = %err, "Page filter failed before the handler");
            Err(context.fail(err))
        }
        Ok(()) if context.result.is_some() => {
            debug!(filter_index = index, "Page filter short-circuited");
            Err(context.short_circuit())
        }
        Ok(()) => Ok(context),
    }
}

fn after_page_executed(
    outcome: Result<(), Error>,
    mut context: PageHandlerExecutedContext,
    index: usize,
) -> PageHandlerExecutedContext {
    if let Err(err) = outcome {
        debug!(filter_index = index, error = %err, "Page filter failed after the handler");
        context.error = Some(err);
        context.exception_handled = false;
    }
    context
}

/// Run page stage `index` and everything inside it.
///
/// Stage 0 is the page model, stages `1..=n` are the page filters and
/// stage `n + 1` invokes the handler.
fn next_page_filter(
    pipeline: Arc<Pipeline>,
    index: usize,
    context: PageHandlerExecutingContext,
) -> BoxFuture<PageHandlerExecutedContext> {
    Box::pin(async move {
        if index == 0 {
            let mut context = context;
            let page = context.page.clone();
            let model_filter = page.lock().await.page_handler_execution();
            if let Some(filter) = model_filter {
                return run_async_page_filter(pipeline, index, filter, context).await;
            }

            let outcome = page.lock().await.on_page_handler_executing(&mut context);
            let context = match after_page_executing(outcome, context, index) {
                Ok(context) => context,
                Err(executed) => return executed,
            };

            let mut executed = next_page_filter(pipeline, 1, context).await;
            let outcome = page.lock().await.on_page_handler_executed(&mut executed);
            return after_page_executed(outcome, executed, index);
        }

        let Some(filter) = pipeline.filters.page.get(index - 1).cloned() else {
            return invoke_handler(context).await;
        };

        match filter {
            Filter::Page(filter) => {
                let mut context = context;
                let outcome = filter.on_page_handler_executing(&mut context);
                let context = match after_page_executing(outcome, context, index) {
                    Ok(context) => context,
                    Err(executed) => return executed,
                };

                let mut executed = next_page_filter(pipeline, index + 1, context).await;
                let outcome = filter.on_page_handler_executed(&mut executed);
                after_page_executed(outcome, executed, index)
            }
            Filter::AsyncPage(filter) => run_async_page_filter(pipeline, index, filter, context).await,
            // Pipelines only hold page filters at this stage
            _ => next_page_filter(pipeline, index + 1, context).await,
        }
    })
}

/// Run an async page filter at stage `index`, handing it `next` for the stages inside
async fn run_async_page_filter(
    pipeline: Arc<Pipeline>,
    index: usize,
    filter: Arc<dyn AsyncPageFilter>,
    context: PageHandlerExecutingContext,
) -> PageHandlerExecutedContext {
    let called = Arc::new(AtomicBool::new(false));
    let next_called = called.clone();
    let next: PageHandlerExecutionDelegate = Box::new(
        move |context: PageHandlerExecutingContext| -> BoxFuture<PageHandlerExecutedContext> {
            next_called.store(true, Ordering::SeqCst);
            if context.result.is_some() {
                let err = Error::InvalidOperation(NEXT_AFTER_PAGE_RESULT.to_string());
                return Box::pin(async move { context.fail(err) });
            }
            next_page_filter(pipeline, index + 1, context)
        },
    );

    let executed = filter.on_page_handler_execution(context, next).await;
    if !called.load(Ordering::SeqCst) {
        debug!(filter_index = index, "Async page filter short-circuited");
    }
    executed
}

async fn invoke_handler(mut context: PageHandlerExecutingContext) -> PageHandlerExecutedContext {
    let Some(handler) = context.handler_method.clone() else {
        trace!(page = %context.page_context.action.id, "No handler, rendering the page");
        return context.into_executed(Some(ActionResult::page()), None, false);
    };

    let arguments = std::mem::take(&mut context.arguments);
    let page = context.page.clone();
    let outcome = page
        .lock()
        .await
        .invoke_handler(&handler, &mut context.page_context, arguments)
        .await;

    match outcome {
        Ok(result) => {
            let result = result.unwrap_or_else(ActionResult::page);
            trace!(handler = %handler, result = result.name(), "Page handler returned");
            context.into_executed(Some(result), None, false)
        }
        Err(err) => {
            debug!(handler = %handler, error = %err, "Page handler failed");
            context.into_executed(None, Some(err), false)
        }
    }
}

/// Run result stage `index`; the stage after the last filter executes the result
fn next_result_filter(
    pipeline: Arc<Pipeline>,
    index: usize,
    context: ResultExecutingContext,
) -> BoxFuture<ResultExecutedContext> {
    Box::pin(async move {
        let Some(filter) = pipeline.filters.result.get(index).cloned() else {
            return execute_result(&*pipeline.renderer, context).await;
        };

        match filter {
            Filter::Result(filter) => {
                let mut context = context;
                if let Err(err) = filter.on_result_executing(&mut context) {
                    debug!(filter_index = index, error = %err, "Result filter failed before the result");
                    return context.fail(err);
                }
                if context.cancel {
                    debug!(filter_index = index, "Result filter canceled the result");
                    return context.short_circuit();
                }

                let mut executed = next_result_filter(pipeline, index + 1, context).await;
                if let Err(err) = filter.on_result_executed(&mut executed) {
                    debug!(filter_index = index, error = %err, "Result filter failed after the result");
                    executed.error = Some(err);
                    executed.exception_handled = false;
                }
                executed
            }
            Filter::AsyncResult(filter) => {
                let called = Arc::new(AtomicBool::new(false));
                let next_called = called.clone();
                let next: ResultExecutionDelegate = Box::new(
                    move |context: ResultExecutingContext| -> BoxFuture<ResultExecutedContext> {
                        next_called.store(true, Ordering::SeqCst);
                        if context.cancel {
                            let err = Error::InvalidOperation(NEXT_AFTER_RESULT_CANCEL.to_string());
                            return Box::pin(async move { context.fail(err) });
                        }
                        next_result_filter(pipeline, index + 1, context)
                    },
                );

                let executed = filter.on_result_execution(context, next).await;
                if !called.load(Ordering::SeqCst) {
                    debug!(filter_index = index, "Async result filter canceled the result");
                }
                executed
            }
            _ => next_result_filter(pipeline, index + 1, context).await,
        }
    })
}

async fn execute_result(
    renderer: &dyn PageRenderer,
    mut context: ResultExecutingContext,
) -> ResultExecutedContext {
    debug!(
        page = %context.page_context.action.id,
        result = context.result.name(),
        "Executing result"
    );
    let outcome = context
        .result
        .execute(&mut context.page_context, &context.page, renderer)
        .await;

    match outcome {
        Ok(()) => context.into_executed(None, false),
        Err(err) => {
            debug!(error = %err, "Result execution failed");
            context.into_executed(Some(err), false)
        }
    }
}
