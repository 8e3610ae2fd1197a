//! Page and handler descriptors
//!
//! Descriptors are built once when a page is registered and shared
//! read-only by every request for that page.

use crate::context::PageContext;
use crate::filters::FilterCollection;
use crate::model::PageModel;
use folio_binding::ParameterDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Creates the page model instance for one request
pub type PageFactory = Arc<dyn Fn(&PageContext) -> Box<dyn PageModel> + Send + Sync>;

/// One selectable handler of a page
#[derive(Debug, Clone)]
pub struct HandlerMethodDescriptor {
    /// Name of the handler method, e.g. `OnPostDelete`
    pub method_name: String,
    /// HTTP method the handler answers, upper case
    pub http_method: Option<String>,
    /// Handler name matched against the `handler` route value
    pub name: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
}

impl HandlerMethodDescriptor {
    pub fn new(method_name: impl Into<String>, http_method: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            http_method: Some(http_method.into().to_ascii_uppercase()),
            name: None,
            parameters: Vec::new(),
        }
    }

    /// Describe a handler from the `On{Verb}{Name}[Async]` naming convention.
    ///
    /// ```
    /// use folio_pages::HandlerMethodDescriptor;
    ///
    /// let handler = HandlerMethodDescriptor::from_method_name("OnPostDeleteAsync").unwrap();
    /// assert_eq!(handler.http_method.as_deref(), Some("POST"));
    /// assert_eq!(handler.name.as_deref(), Some("Delete"));
    /// assert!(HandlerMethodDescriptor::from_method_name("Save").is_none());
    /// ```
    pub fn from_method_name(method_name: &str) -> Option<Self> {
        let rest = method_name.strip_prefix("On")?;
        let rest = rest.strip_suffix("Async").unwrap_or(rest);
        if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }

        let verb_end = rest[1..]
            .find(|c: char| c.is_ascii_uppercase())
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let (verb, name) = rest.split_at(verb_end);

        Some(Self {
            method_name: method_name.to_string(),
            http_method: Some(verb.to_ascii_uppercase()),
            name: (!name.is_empty()).then(|| name.to_string()),
            parameters: Vec::new(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Whether the handler answers `method`; handlers without a method answer any
    pub fn matches_method(&self, method: &str) -> bool {
        self.http_method
            .as_deref()
            .is_none_or(|m| m.eq_ignore_ascii_case(method))
    }

    /// Whether the handler answers the handler name `requested`
    pub fn matches_name(&self, requested: Option<&str>) -> bool {
        match (&self.name, requested) {
            (None, _) => true,
            (Some(name), Some(requested)) => name.eq_ignore_ascii_case(requested),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for HandlerMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method_name)
    }
}

/// A page property bound from the request before the handler runs
#[derive(Debug, Clone)]
pub struct BoundPropertyDescriptor {
    pub parameter: ParameterDescriptor,
    /// Also bind on GET and HEAD requests
    pub supports_get: bool,
}

impl BoundPropertyDescriptor {
    pub fn new(parameter: ParameterDescriptor) -> Self {
        Self {
            parameter,
            supports_get: false,
        }
    }

    pub fn supports_get(mut self) -> Self {
        self.supports_get = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.parameter.name
    }
}

/// A page: its handlers, bound properties, filters and model factory
#[derive(Clone)]
pub struct PageActionDescriptor {
    /// Identity of the page, usually its view path (`/Orders/Edit`)
    pub id: String,
    pub display_name: String,
    pub route_values: HashMap<String, String>,
    pub handler_methods: Vec<Arc<HandlerMethodDescriptor>>,
    pub bound_properties: Vec<BoundPropertyDescriptor>,
    pub filters: FilterCollection,
    pub page_factory: PageFactory,
}

impl PageActionDescriptor {
    /// Describe a page whose model is created with `Default`
    pub fn new<M>(id: impl Into<String>) -> Self
    where
        M: PageModel + Default,
    {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            route_values: HashMap::new(),
            handler_methods: Vec::new(),
            bound_properties: Vec::new(),
            filters: FilterCollection::new(),
            page_factory: Arc::new(|_| Box::new(M::default())),
        }
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&PageContext) -> Box<dyn PageModel> + Send + Sync + 'static,
    {
        self.page_factory = Arc::new(factory);
        self
    }

    pub fn with_handler(mut self, handler: HandlerMethodDescriptor) -> Self {
        self.handler_methods.push(Arc::new(handler));
        self
    }

    pub fn with_bound_property(mut self, property: BoundPropertyDescriptor) -> Self {
        self.bound_properties.push(property);
        self
    }

    pub fn with_filters(mut self, filters: FilterCollection) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for PageActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageActionDescriptor")
            .field("id", &self.id)
            .field("handler_methods", &self.handler_methods)
            .field("bound_properties", &self.bound_properties)
            .field("filters", &self.filters.len())
            .finish()
    }
}
