// Objects bound property by property

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{BindingSource, ComplexType, ModelKind, ModelMetadata, PropertyMetadata};
use crate::model_state::ModelValidationState;
use crate::names::create_property_model_name;
use crate::value_provider::ValueProvider;
use async_trait::async_trait;
use folio_core::Error;
use folio_core::logging::{debug, trace};
use serde_json::{Map, Value};

/// Binds `ModelKind::Complex` models.
///
/// A top-level model is always created. A nested model is only created when
/// request data exists below its prefix and at least one property binds.
pub struct ComplexTypeModelBinder;

impl ComplexTypeModelBinder {
    /// Nested models need data under their prefix, or a property that reads
    /// from somewhere other than the value providers.
    fn can_create_model(ctx: &ModelBindingContext<'_>, complex: &ComplexType) -> bool {
        if ctx.is_top_level || ctx.value_provider.contains_prefix(&ctx.model_name) {
            return true;
        }
        complex.properties.iter().any(|p| {
            p.binding_info.binder.is_some()
                || p.binding_info
                    .binding_source
                    .as_ref()
                    .is_some_and(|s| s.is_greedy() && *s != BindingSource::Services)
        })
    }

    /// Whether binding may replace or update the current property value
    fn can_update_property(
        property: &PropertyMetadata,
        metadata: &ModelMetadata,
        current: Option<&Value>,
    ) -> bool {
        if !property.is_read_only {
            return true;
        }
        let has_instance = current.is_some_and(|v| !v.is_null());
        match &metadata.kind {
            ModelKind::Complex(_) | ModelKind::Dictionary { .. } => has_instance,
            ModelKind::Collection { read_only, .. } => !read_only && has_instance,
            _ => false,
        }
    }

    fn add_required_error(ctx: &mut ModelBindingContext<'_>, property: &PropertyMetadata, model_name: &str) {
        if ctx.model_state.get_field_validation_state(model_name) != ModelValidationState::Unvalidated {
            return;
        }
        let messages = property
            .binding_info
            .messages
            .clone()
            .unwrap_or_else(|| ctx.messages.clone());
        let message = messages.missing_bind_required_value(property.field_name());
        ctx.model_state.try_add_model_error(model_name, message);
    }
}

#[async_trait]
impl ModelBinder for ComplexTypeModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::Complex
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers() && ctx.metadata.is_complex()
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let metadata = ctx.metadata.clone();
        let Some(complex) = metadata.complex_type() else {
            return Ok(None);
        };

        if !Self::can_create_model(ctx, complex) {
            trace!(model_name = %ctx.model_name, "No data for nested model");
            return Ok(None);
        }

        let mut model = match ctx.model.take() {
            Some(Value::Object(existing)) => existing,
            _ => match (complex.create)() {
                Value::Object(created) => created,
                _ => Map::new(),
            },
        };

        let mut bound_any = false;
        for property in &complex.properties {
            if !property.is_binding_allowed {
                continue;
            }
            if property.binding_info.binding_source == Some(BindingSource::Services) {
                debug!(property = %property.name, "Services cannot be bound into model properties");
                continue;
            }

            let property_metadata = ctx.runtime.metadata.get(&property.model_type);
            let current = model.get(&property.name).cloned();
            if !Self::can_update_property(property, &property_metadata, current.as_ref()) {
                trace!(property = %property.name, "Skipping read-only property");
                continue;
            }

            // Complex and container values are bound into; arrays and scalars are replaced
            let existing = match &property_metadata.kind {
                ModelKind::Complex(_) | ModelKind::Collection { .. } | ModelKind::Dictionary { .. } => {
                    current.filter(|v| !v.is_null())
                }
                _ => None,
            };

            let model_name = create_property_model_name(&ctx.model_name, property.field_name());
            let result = {
                let mut child =
                    ctx.nested_property(property, property_metadata, model_name.clone(), existing);
                child.bind().await?
            };

            match result {
                Some(result) if result.is_model_set => {
                    model.insert(property.name.clone(), result.model.unwrap_or(Value::Null));
                    bound_any = true;
                }
                _ if property.binding_info.is_binding_required => {
                    Self::add_required_error(ctx, property, &model_name);
                }
                _ => {}
            }
        }

        if !ctx.is_top_level && !bound_any {
            trace!(model_name = %ctx.model_name, "No property of nested model was bound");
            return Ok(None);
        }

        Ok(Some(ModelBindingResult::success(
            ctx.model_name.clone(),
            Value::Object(model),
        )))
    }
}
