// Binding contexts

use crate::binder::{ModelBinder, ModelBindingResult};
use crate::composite::CompositeModelBinder;
use crate::messages::ModelBindingMessageProvider;
use crate::metadata::{BindingSource, MetadataProvider, ModelMetadata, PropertyMetadata};
use crate::model_state::ModelStateDictionary;
use crate::options::BindingOptions;
use crate::validation::ValidationStateDictionary;
use crate::value_provider::CompositeValueProvider;
use folio_core::{Container, Error, FormCollection, HttpRequest};
use serde_json::Value;
use std::sync::Arc;

/// The request being bound, with its form body parsed once
#[derive(Clone)]
pub struct RequestContext {
    pub request: Arc<HttpRequest>,
    pub form: Arc<FormCollection>,
    pub services: Container,
}

impl RequestContext {
    pub fn new(request: HttpRequest, services: Container) -> Result<Self, Error> {
        let form = request.form()?;
        Ok(Self {
            request: Arc::new(request),
            form: Arc::new(form),
            services,
        })
    }

    /// Form, route and query values of the request
    pub fn value_provider(&self) -> CompositeValueProvider {
        CompositeValueProvider::from_request(&self.request, &self.form)
    }
}

/// The binders, metadata and settings shared by every binding
pub struct BindingRuntime {
    pub binder: CompositeModelBinder,
    pub metadata: MetadataProvider,
    pub options: BindingOptions,
    pub messages: Arc<ModelBindingMessageProvider>,
}

impl Default for BindingRuntime {
    fn default() -> Self {
        Self::new(BindingOptions::default())
    }
}

impl BindingRuntime {
    pub fn new(options: BindingOptions) -> Self {
        Self {
            binder: CompositeModelBinder::new(),
            metadata: MetadataProvider::new(),
            options,
            messages: Arc::new(ModelBindingMessageProvider::new()),
        }
    }

    pub fn with_binder(mut self, binder: CompositeModelBinder) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_messages(mut self, messages: ModelBindingMessageProvider) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// A model state sized by these options
    pub fn new_model_state(&self) -> ModelStateDictionary {
        ModelStateDictionary::with_max_errors(self.options.max_model_errors)
    }
}

/// Everything a binder needs to bind one model
pub struct ModelBindingContext<'a> {
    pub request: &'a RequestContext,
    pub runtime: &'a BindingRuntime,
    pub value_provider: Arc<CompositeValueProvider>,
    pub model_state: &'a mut ModelStateDictionary,
    pub validation_state: &'a mut ValidationStateDictionary,
    pub metadata: Arc<ModelMetadata>,
    /// Key prefix for values and model state entries
    pub model_name: String,
    /// Parameter or property name, used by greedy binders and messages
    pub field_name: String,
    pub binder_model_name: Option<String>,
    pub binding_source: Option<BindingSource>,
    /// Binder configured on the parameter, property or type
    pub binder: Option<Arc<dyn ModelBinder>>,
    pub display_name: Option<String>,
    pub messages: Arc<ModelBindingMessageProvider>,
    pub is_top_level: bool,
    /// Existing instance to bind into
    pub model: Option<Value>,
}

impl<'a> ModelBindingContext<'a> {
    /// Name used in conversion messages: the display name, else the type name
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(&self.metadata.type_name)
    }

    /// False for greedy sources, which never read the value providers
    pub fn uses_value_providers(&self) -> bool {
        self.binding_source.as_ref().is_none_or(|s| !s.is_greedy())
    }

    pub fn options(&self) -> &BindingOptions {
        &self.runtime.options
    }

    /// Context for an element, key or value of the current model
    pub fn nested<'b>(
        &'b mut self,
        metadata: Arc<ModelMetadata>,
        field_name: impl Into<String>,
        model_name: impl Into<String>,
        model: Option<Value>,
    ) -> ModelBindingContext<'b> {
        let messages = metadata.messages.clone().unwrap_or_else(|| self.messages.clone());
        ModelBindingContext {
            request: self.request,
            runtime: self.runtime,
            value_provider: self.value_provider.clone(),
            model_state: &mut *self.model_state,
            validation_state: &mut *self.validation_state,
            binding_source: metadata.binding_source.clone(),
            binder: metadata.binder.clone(),
            metadata,
            model_name: model_name.into(),
            field_name: field_name.into(),
            binder_model_name: None,
            display_name: None,
            messages,
            is_top_level: false,
            model,
        }
    }

    /// Context for a property of the current complex model
    pub fn nested_property<'b>(
        &'b mut self,
        property: &PropertyMetadata,
        metadata: Arc<ModelMetadata>,
        model_name: impl Into<String>,
        model: Option<Value>,
    ) -> ModelBindingContext<'b> {
        let info = &property.binding_info;
        let binding_source = info
            .binding_source
            .clone()
            .or_else(|| metadata.binding_source.clone());
        let value_provider = match &binding_source {
            Some(source) if !source.is_greedy() => Arc::new(self.value_provider.filter(source)),
            _ => self.value_provider.clone(),
        };
        let messages = info
            .messages
            .clone()
            .or_else(|| metadata.messages.clone())
            .unwrap_or_else(|| self.messages.clone());

        ModelBindingContext {
            request: self.request,
            runtime: self.runtime,
            value_provider,
            model_state: &mut *self.model_state,
            validation_state: &mut *self.validation_state,
            binding_source,
            binder: info.binder.clone().or_else(|| metadata.binder.clone()),
            metadata,
            model_name: model_name.into(),
            field_name: property.field_name().to_string(),
            binder_model_name: info.binder_model_name.clone(),
            display_name: Some(property.display().to_string()),
            messages,
            is_top_level: false,
            model,
        }
    }

    /// Run the composite binder on this context
    pub async fn bind(&mut self) -> Result<Option<ModelBindingResult>, Error> {
        let runtime = self.runtime;
        runtime.binder.bind_model(self).await
    }
}
