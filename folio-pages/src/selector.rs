// Handler selection by HTTP method and handler name

use crate::context::PageContext;
use crate::descriptor::HandlerMethodDescriptor;
use crate::options::PageOptions;
use folio_core::Error;
use folio_core::logging::{debug, trace};
use std::sync::Arc;

pub trait PageHandlerMethodSelector: Send + Sync {
    /// Pick the handler for this request.
    ///
    /// `Ok(None)` renders the page without a handler. Several equally good
    /// matches are an error.
    fn select(&self, context: &PageContext) -> Result<Option<Arc<HandlerMethodDescriptor>>, Error>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultPageHandlerMethodSelector {
    options: PageOptions,
}

impl DefaultPageHandlerMethodSelector {
    pub fn new(options: PageOptions) -> Self {
        Self { options }
    }

    fn handler_name(&self, context: &PageContext) -> Option<String> {
        let request = &context.request.request;
        let key = &self.options.handler_route_key;
        let from_route = request
            .route_values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone());

        from_route
            .or_else(|| {
                self.options
                    .allow_handler_from_query
                    .then(|| {
                        request
                            .query_pairs()
                            .into_iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(key))
                            .map(|(_, v)| v)
                    })
                    .flatten()
            })
            .filter(|name| !name.is_empty())
    }

    fn candidates(
        handlers: &[Arc<HandlerMethodDescriptor>],
        method: &str,
        handler_name: Option<&str>,
    ) -> Vec<Arc<HandlerMethodDescriptor>> {
        handlers
            .iter()
            .filter(|h| h.matches_method(method) && h.matches_name(handler_name))
            .cloned()
            .collect()
    }

    /// Named handlers beat method-only handlers, which beat catch-alls
    fn score(handler: &HandlerMethodDescriptor) -> u8 {
        if handler.name.is_some() {
            2
        } else if handler.http_method.is_some() {
            1
        } else {
            0
        }
    }
}

impl PageHandlerMethodSelector for DefaultPageHandlerMethodSelector {
    fn select(&self, context: &PageContext) -> Result<Option<Arc<HandlerMethodDescriptor>>, Error> {
        let handlers = &context.action.handler_methods;
        let method = context.http_method();
        let handler_name = self.handler_name(context);

        let mut candidates = Self::candidates(handlers, method, handler_name.as_deref());
        if candidates.is_empty()
            && self.options.head_falls_back_to_get
            && method.eq_ignore_ascii_case("HEAD")
        {
            trace!("No HEAD handler, trying GET handlers");
            candidates = Self::candidates(handlers, "GET", handler_name.as_deref());
        }

        for score in (0..=2).rev() {
            let matches: Vec<_> = candidates
                .iter()
                .filter(|h| Self::score(h) == score)
                .collect();
            match matches.as_slice() {
                [] => continue,
                [handler] => {
                    debug!(
                        page = %context.action.id,
                        handler = %handler.method_name,
                        "Selected page handler"
                    );
                    return Ok(Some(Arc::clone(handler)));
                }
                ambiguous => {
                    let names = ambiguous
                        .iter()
                        .map(|h| h.method_name.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    return Err(Error::AmbiguousHandler(format!(
                        "Multiple handlers matched. The following handlers matched route data and had all constraints satisfied:\n\n{}",
                        names
                    )));
                }
            }
        }

        debug!(page = %context.action.id, method, "No page handler matched");
        Ok(None)
    }
}
