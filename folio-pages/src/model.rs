//! Page models
//!
//! A page model owns the page's bound properties and its handlers. The
//! invoker dispatches the selected handler through
//! [`PageModel::invoke_handler`], and treats the model's
//! `on_page_handler_*` hooks as the outermost page filter. A model that
//! needs to await around its handler returns an [`AsyncPageFilter`] from
//! [`PageModel::page_handler_execution`] instead.

use crate::context::{
    PageContext, PageHandlerExecutedContext, PageHandlerExecutingContext,
    PageHandlerSelectedContext,
};
use crate::descriptor::HandlerMethodDescriptor;
use crate::filters::AsyncPageFilter;
use crate::result::ActionResult;
use async_trait::async_trait;
use folio_core::{Error, Provider, ServiceInstance};
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Access to the concrete page model type behind `dyn PageModel`
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[async_trait]
pub trait PageModel: AsAny + Send + Sync {
    /// Run `handler` with its bound arguments.
    ///
    /// Returning `Ok(None)` renders the page.
    async fn invoke_handler(
        &mut self,
        handler: &HandlerMethodDescriptor,
        context: &mut PageContext,
        arguments: HandlerArguments,
    ) -> Result<Option<ActionResult>, Error>;

    /// Assign a bound property
    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), Error> {
        Err(Error::InvalidOperation(format!(
            "The page model has no bindable property '{}'.",
            name
        )))
    }

    /// Data handed to the page renderer
    fn view_data(&self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn on_page_handler_selected(
        &mut self,
        _context: &mut PageHandlerSelectedContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Async selection hook; the default runs `on_page_handler_selected`
    async fn on_page_handler_selection(
        &mut self,
        context: &mut PageHandlerSelectedContext<'_>,
    ) -> Result<(), Error> {
        self.on_page_handler_selected(context)
    }

    fn on_page_handler_executing(
        &mut self,
        _context: &mut PageHandlerExecutingContext,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn on_page_handler_executed(
        &mut self,
        _context: &mut PageHandlerExecutedContext,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Async filter that wraps the page filters and the handler in place of
    /// the `executing`/`executed` hooks.
    ///
    /// The model is unlocked while the filter runs so that `next` can reach
    /// the handler. Lock `context.page` to read or update the model around it.
    fn page_handler_execution(&self) -> Option<Arc<dyn AsyncPageFilter>> {
        None
    }
}

/// Set the field `name` of a serde model to `value`.
///
/// Helper for [`PageModel::set_property`] on models that round-trip
/// through JSON.
pub fn set_json_property<T>(model: &mut T, name: &str, value: Value) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(&*model)?;
    let Value::Object(fields) = &mut current else {
        return Err(Error::InvalidOperation(format!(
            "Cannot set property '{}' on a model that is not an object.",
            name
        )));
    };
    fields.insert(name.to_string(), value);
    *model = serde_json::from_value(current).map_err(|e| Error::Deserialization(e.to_string()))?;
    Ok(())
}

/// The page model of one request, shared by the filter contexts.
///
/// Hooks on the model itself already hold the lock; locking again from a
/// hook waits forever.
#[derive(Clone)]
pub struct PageInstance {
    inner: Arc<Mutex<Box<dyn PageModel>>>,
}

impl PageInstance {
    pub fn new(page: Box<dyn PageModel>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(page)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn PageModel>> {
        self.inner.lock().await
    }

    /// Run `f` against the model if it is a `T`
    pub async fn with<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: PageModel,
    {
        let mut page = self.inner.lock().await;
        (**page).as_any_mut().downcast_mut::<T>().map(f)
    }

    pub fn ptr_eq(&self, other: &PageInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Bound handler arguments by parameter name
#[derive(Debug, Clone, Default)]
pub struct HandlerArguments {
    values: IndexMap<String, Value>,
    services: HashMap<String, ServiceInstance>,
}

impl HandlerArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn insert_service(&mut self, name: impl Into<String>, service: ServiceInstance) {
        self.services.insert(name.into(), service);
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The argument `name` as a `T`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let value = self.values.get(name).ok_or_else(|| {
            Error::InvalidOperation(format!("No argument named '{}' was bound.", name))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// The service injected as argument `name`
    pub fn service<T: Provider>(&self, name: &str) -> Result<Arc<T>, Error> {
        let instance = self.services.get(name).cloned().ok_or_else(|| {
            Error::InvalidOperation(format!("No service argument named '{}' was bound.", name))
        })?;
        instance.downcast::<T>().map_err(|_| {
            Error::InvalidOperation(format!(
                "Service argument '{}' is not a {}.",
                name,
                std::any::type_name::<T>()
            ))
        })
    }
}
