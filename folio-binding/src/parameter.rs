//! Parameter binding
//!
//! Binds one handler argument or page property and validates it, or
//! updates an existing model in place with `try_update_model`.

use crate::binder::ModelBindingResult;
use crate::context::{BindingRuntime, ModelBindingContext, RequestContext};
use crate::metadata::{
    Bindable, BindingInfo, MetadataProvider, ModelTypeRef, binding_info_builders,
};
use crate::model_state::ModelStateDictionary;
use crate::validation::{NodeRules, ObjectValidator, ValidationStateDictionary};
use crate::value_provider::{CompositeValueProvider, ValueProvider};
use folio_core::Error;
use folio_core::logging::{debug, trace};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A bindable parameter: a handler argument or a bound page property
#[derive(Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub model_type: ModelTypeRef,
    pub binding_info: BindingInfo,
}

impl ParameterDescriptor {
    pub fn new<T: Bindable>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_type: ModelTypeRef::of::<T>(),
            binding_info: BindingInfo::default(),
        }
    }

    binding_info_builders!();

    pub fn display(&self) -> &str {
        self.binding_info
            .display_name
            .as_deref()
            .unwrap_or(&self.name)
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("name", &self.name)
            .field("binding_info", &self.binding_info)
            .finish()
    }
}

/// Binds and validates parameters against a request
#[derive(Clone)]
pub struct ParameterBinder {
    runtime: Arc<BindingRuntime>,
}

impl ParameterBinder {
    pub fn new(runtime: Arc<BindingRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Arc<BindingRuntime> {
        &self.runtime
    }

    pub fn metadata(&self) -> &MetadataProvider {
        &self.runtime.metadata
    }

    /// Bind `parameter`, then validate what was bound.
    ///
    /// Without an explicit model name the parameter name is used as prefix
    /// when the request has values under it, otherwise the empty prefix.
    /// Returns `None` when no binder produced a result.
    pub async fn bind_model(
        &self,
        request: &RequestContext,
        value_provider: &Arc<CompositeValueProvider>,
        parameter: &ParameterDescriptor,
        model_state: &mut ModelStateDictionary,
        value: Option<Value>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let runtime = self.runtime.as_ref();
        let metadata = runtime.metadata.get(&parameter.model_type);
        let info = &parameter.binding_info;

        let binding_source = info
            .binding_source
            .clone()
            .or_else(|| metadata.binding_source.clone());
        let value_provider = match &binding_source {
            Some(source) => Arc::new(value_provider.filter(source)),
            None => value_provider.clone(),
        };

        let model_name = match &info.binder_model_name {
            Some(name) => name.clone(),
            None if value_provider.contains_prefix(&parameter.name) => parameter.name.clone(),
            None => {
                trace!(parameter = %parameter.name, "No values under parameter name, using empty prefix");
                String::new()
            }
        };
        let field_name = info
            .binder_model_name
            .clone()
            .unwrap_or_else(|| parameter.name.clone());
        let messages = info
            .messages
            .clone()
            .or_else(|| metadata.messages.clone())
            .unwrap_or_else(|| runtime.messages.clone());

        let mut validation_state = ValidationStateDictionary::new();
        let result = {
            let mut ctx = ModelBindingContext {
                request,
                runtime,
                value_provider,
                model_state: &mut *model_state,
                validation_state: &mut validation_state,
                metadata: metadata.clone(),
                model_name: model_name.clone(),
                field_name: field_name.clone(),
                binder_model_name: info.binder_model_name.clone(),
                binding_source,
                binder: info.binder.clone().or_else(|| metadata.binder.clone()),
                display_name: None,
                messages: messages.clone(),
                is_top_level: true,
                model: value,
            };
            ctx.bind().await?
        };

        let rules = NodeRules {
            validators: &info.validators,
            display_name: parameter.display(),
        };

        match &result {
            Some(bound) if bound.is_model_set => {
                if bound.service.is_none() {
                    let model = bound.model.clone().unwrap_or(Value::Null);
                    let mut validator = ObjectValidator::new(
                        &runtime.metadata,
                        &validation_state,
                        model_state,
                        runtime.options.max_validation_depth,
                    );
                    validator.validate(&metadata, rules, &bound.key, &model)?;
                }
            }
            _ if info.is_binding_required => {
                debug!(parameter = %parameter.name, "Bind-required parameter was not bound");
                let message = messages.missing_bind_required_value(&field_name);
                model_state.try_add_model_error(&model_name, message);
            }
            _ if !info.validators.is_empty() => {
                // Nothing bound: run the parameter's own rules against null
                let key = if model_name.is_empty() { &field_name } else { &model_name };
                let mut validator = ObjectValidator::new(
                    &runtime.metadata,
                    &validation_state,
                    model_state,
                    runtime.options.max_validation_depth,
                );
                validator.validate(&metadata, rules, key, &Value::Null)?;
            }
            _ => {}
        }

        Ok(result)
    }

    /// Bind request values into an existing model under `prefix`.
    ///
    /// Returns whether model state is valid afterwards; `false` when
    /// nothing could be bound.
    pub async fn try_update_model(
        &self,
        request: &RequestContext,
        value_provider: &Arc<CompositeValueProvider>,
        model_type: ModelTypeRef,
        model: &mut Value,
        prefix: &str,
        model_state: &mut ModelStateDictionary,
    ) -> Result<bool, Error> {
        let runtime = self.runtime.as_ref();
        let metadata = runtime.metadata.get(&model_type);
        let messages = metadata
            .messages
            .clone()
            .unwrap_or_else(|| runtime.messages.clone());

        let mut validation_state = ValidationStateDictionary::new();
        let result = {
            let mut ctx = ModelBindingContext {
                request,
                runtime,
                value_provider: value_provider.clone(),
                model_state: &mut *model_state,
                validation_state: &mut validation_state,
                metadata: metadata.clone(),
                model_name: prefix.to_string(),
                field_name: prefix.to_string(),
                binder_model_name: None,
                binding_source: metadata.binding_source.clone(),
                binder: metadata.binder.clone(),
                display_name: None,
                messages,
                is_top_level: true,
                model: Some(model.clone()),
            };
            ctx.bind().await?
        };

        let Some(bound) = result.filter(|r| r.is_model_set) else {
            return Ok(false);
        };
        *model = bound.model.unwrap_or(Value::Null);

        let mut validator = ObjectValidator::new(
            &runtime.metadata,
            &validation_state,
            model_state,
            runtime.options.max_validation_depth,
        );
        validator.validate(&metadata, NodeRules::none(&metadata.type_name), prefix, model)?;
        Ok(model_state.is_valid())
    }

    /// Typed form of [`try_update_model`](Self::try_update_model)
    pub async fn try_update<T>(
        &self,
        request: &RequestContext,
        value_provider: &Arc<CompositeValueProvider>,
        model: &mut T,
        prefix: &str,
        model_state: &mut ModelStateDictionary,
    ) -> Result<bool, Error>
    where
        T: Bindable + Serialize + DeserializeOwned,
    {
        let mut value = serde_json::to_value(&*model)?;
        let valid = self
            .try_update_model(
                request,
                value_provider,
                ModelTypeRef::of::<T>(),
                &mut value,
                prefix,
                model_state,
            )
            .await?;
        *model = serde_json::from_value(value).map_err(|e| Error::Deserialization(e.to_string()))?;
        Ok(valid)
    }
}
