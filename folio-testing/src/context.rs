// Binding test context

use crate::request::TestRequestBuilder;
use folio_binding::{
    Bindable, BindingOptions, BindingRuntime, CompositeValueProvider, ModelBindingResult,
    ModelMetadata, ModelStateDictionary, ParameterBinder, ParameterDescriptor, RequestContext,
};
use folio_core::{Container, Error, Provider};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A request plus everything needed to bind parameters against it.
///
/// Bindings share one [`ModelStateDictionary`], like the parameters of a
/// single handler call do.
pub struct BindingTestContext {
    pub request: RequestContext,
    pub model_state: ModelStateDictionary,
    binder: ParameterBinder,
    value_provider: Arc<CompositeValueProvider>,
}

impl BindingTestContext {
    pub fn runtime(&self) -> &Arc<BindingRuntime> {
        self.binder.runtime()
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// Bind `parameter`; `None` when every binder declined
    pub async fn bind(
        &mut self,
        parameter: &ParameterDescriptor,
    ) -> Result<Option<ModelBindingResult>, Error> {
        self.binder
            .bind_model(
                &self.request,
                &self.value_provider,
                parameter,
                &mut self.model_state,
                None,
            )
            .await
    }

    /// Bind a `T` named `name` and extract it when the model was set
    pub async fn bind_value<T>(&mut self, name: &str) -> Result<Option<T>, Error>
    where
        T: Bindable + DeserializeOwned,
    {
        let parameter = ParameterDescriptor::new::<T>(name);
        match self.bind(&parameter).await? {
            Some(ModelBindingResult {
                is_model_set: true,
                model: Some(model),
                ..
            }) => serde_json::from_value(model)
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            _ => Ok(None),
        }
    }

    pub async fn try_update<T>(&mut self, model: &mut T, prefix: &str) -> Result<bool, Error>
    where
        T: Bindable + Serialize + DeserializeOwned,
    {
        self.binder
            .try_update(
                &self.request,
                &self.value_provider,
                model,
                prefix,
                &mut self.model_state,
            )
            .await
    }
}

/// Configures a [`BindingTestContext`]
pub struct BindingTestContextBuilder {
    request: TestRequestBuilder,
    services: Container,
    options: BindingOptions,
    runtime: Option<BindingRuntime>,
    configure: Vec<Box<dyn FnOnce(&BindingRuntime)>>,
}

impl BindingTestContextBuilder {
    pub fn new() -> Self {
        Self {
            request: TestRequestBuilder::get("/"),
            services: Container::new(),
            options: BindingOptions::default(),
            runtime: None,
            configure: Vec::new(),
        }
    }

    /// Shape the request, starting from `GET /`
    pub fn request(mut self, update: impl FnOnce(TestRequestBuilder) -> TestRequestBuilder) -> Self {
        self.request = update(self.request);
        self
    }

    pub fn service<T: Provider>(self, instance: T) -> Self {
        self.services.register(instance);
        self
    }

    pub fn options(mut self, options: BindingOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a fully built runtime; `options` is ignored then
    pub fn runtime(mut self, runtime: BindingRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Override the metadata of `T`
    pub fn metadata<T: Bindable>(mut self, apply: impl Fn(&mut ModelMetadata) + Send + Sync + 'static) -> Self {
        self.configure
            .push(Box::new(move |runtime: &BindingRuntime| runtime.metadata.configure::<T>(apply)));
        self
    }

    pub fn build(self) -> Result<BindingTestContext, Error> {
        let runtime = self
            .runtime
            .unwrap_or_else(|| BindingRuntime::new(self.options));
        for configure in self.configure {
            configure(&runtime);
        }

        let request = self.request.context(self.services)?;
        let value_provider = Arc::new(request.value_provider());
        let model_state = runtime.new_model_state();
        Ok(BindingTestContext {
            request,
            model_state,
            binder: ParameterBinder::new(Arc::new(runtime)),
            value_provider,
        })
    }
}

impl Default for BindingTestContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A binding context for the request shaped by `update`
///
/// ```
/// use folio_testing::*;
///
/// # tokio_test::block_on(async {
/// let mut context = binding_test_context(|request| request.query("id", "abcd")).unwrap();
/// let id = context.bind_value::<i32>("id").await.unwrap();
///
/// assert_eq!(id, None);
/// assert_single_error(&context.model_state, "id", "The value 'abcd' is not valid for Int32.");
/// # });
/// ```
pub fn binding_test_context(
    update: impl FnOnce(TestRequestBuilder) -> TestRequestBuilder,
) -> Result<BindingTestContext, Error> {
    BindingTestContextBuilder::new().request(update).build()
}
