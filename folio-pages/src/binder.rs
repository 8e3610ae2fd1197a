// Binding of page properties and handler arguments

use crate::context::PageContext;
use crate::descriptor::{BoundPropertyDescriptor, HandlerMethodDescriptor};
use crate::model::{HandlerArguments, PageModel};
use folio_binding::ParameterBinder;
use folio_core::Error;
use folio_core::logging::{debug, trace};
use serde_json::Value;

/// Binds what a page declares against the request in its [`PageContext`]
#[derive(Clone)]
pub struct PageBinder {
    binder: ParameterBinder,
}

impl PageBinder {
    pub fn new(binder: ParameterBinder) -> Self {
        Self { binder }
    }

    /// Bind the page's properties into `page`.
    ///
    /// GET and HEAD requests only bind properties that opted in.
    pub async fn bind_properties(
        &self,
        context: &mut PageContext,
        page: &mut dyn PageModel,
        properties: &[BoundPropertyDescriptor],
    ) -> Result<(), Error> {
        let is_get = ["GET", "HEAD"]
            .iter()
            .any(|m| context.http_method().eq_ignore_ascii_case(m));

        for property in properties {
            if is_get && !property.supports_get {
                trace!(property = property.name(), "Property does not bind on GET");
                continue;
            }

            let result = self
                .binder
                .bind_model(
                    &context.request,
                    &context.value_provider,
                    &property.parameter,
                    &mut context.model_state,
                    None,
                )
                .await?;

            match result {
                Some(bound) if bound.is_model_set => {
                    if bound.service.is_some() {
                        return Err(Error::InvalidOperation(format!(
                            "Page property '{}' cannot be bound from services.",
                            property.name()
                        )));
                    }
                    page.set_property(property.name(), bound.model.unwrap_or(Value::Null))?;
                }
                _ => trace!(property = property.name(), "Property left unbound"),
            }
        }
        Ok(())
    }

    /// Bind the arguments of `handler`; unbound arguments get their type's default
    pub async fn bind_arguments(
        &self,
        context: &mut PageContext,
        handler: &HandlerMethodDescriptor,
    ) -> Result<HandlerArguments, Error> {
        let mut arguments = HandlerArguments::new();

        for parameter in &handler.parameters {
            let result = self
                .binder
                .bind_model(
                    &context.request,
                    &context.value_provider,
                    parameter,
                    &mut context.model_state,
                    None,
                )
                .await?;

            match result {
                Some(bound) if bound.is_model_set => match bound.service {
                    Some(service) => arguments.insert_service(parameter.name.clone(), service),
                    None => arguments.insert(parameter.name.clone(), bound.model.unwrap_or(Value::Null)),
                },
                _ => {
                    let metadata = self.binder.metadata().get(&parameter.model_type);
                    arguments.insert(parameter.name.clone(), metadata.default_value());
                }
            }
        }

        debug!(
            handler = %handler.method_name,
            arguments = arguments.len(),
            valid = context.model_state.is_valid(),
            "Bound handler arguments"
        );
        Ok(arguments)
    }
}
