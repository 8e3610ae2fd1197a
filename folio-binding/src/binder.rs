// Model binder contract and binding results

use crate::context::ModelBindingContext;
use async_trait::async_trait;
use folio_core::{Error, ServiceInstance};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Built-in binder families, in the order they are consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinderKind {
    Custom,
    Services,
    Body,
    Header,
    FormFile,
    ByteArray,
    SimpleType,
    KeyValuePair,
    Dictionary,
    Array,
    Collection,
    Complex,
}

/// Binds one model from request data.
///
/// Returning `Ok(None)` declines the model, letting the next binder try.
/// Conversion problems are reported through model state, not as errors;
/// `Err` is reserved for configuration failures such as a missing service.
#[async_trait]
pub trait ModelBinder: Send + Sync {
    fn kind(&self) -> BinderKind {
        BinderKind::Custom
    }

    /// Whether this binder handles the model described by `ctx`
    fn supports(&self, _ctx: &ModelBindingContext<'_>) -> bool {
        true
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error>;
}

/// Outcome of binding one model
#[derive(Clone)]
pub struct ModelBindingResult {
    /// Model name the binder used
    pub key: String,
    pub model: Option<Value>,
    pub is_model_set: bool,
    /// Instance resolved from the service container
    pub service: Option<ServiceInstance>,
}

impl ModelBindingResult {
    pub fn success(key: impl Into<String>, model: Value) -> Self {
        Self {
            key: key.into(),
            model: Some(model),
            is_model_set: true,
            service: None,
        }
    }

    pub fn failed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            model: None,
            is_model_set: false,
            service: None,
        }
    }

    pub fn from_service(key: impl Into<String>, service: ServiceInstance) -> Self {
        Self {
            key: key.into(),
            model: None,
            is_model_set: true,
            service: Some(service),
        }
    }

    /// Extract the bound model as `T`. `Ok(None)` when nothing was bound.
    pub fn model_as<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        match (&self.model, self.is_model_set) {
            (Some(model), true) => serde_json::from_value(model.clone())
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for ModelBindingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingResult")
            .field("key", &self.key)
            .field("model", &self.model)
            .field("is_model_set", &self.is_model_set)
            .field("has_service", &self.service.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_constructors() {
        let ok = ModelBindingResult::success("p", json!(10));
        assert!(ok.is_model_set);
        assert_eq!(ok.model_as::<i32>().unwrap(), Some(10));

        let failed = ModelBindingResult::failed("p");
        assert!(!failed.is_model_set);
        assert_eq!(failed.model_as::<i32>().unwrap(), None);
    }

    #[test]
    fn test_model_as_reports_shape_mismatch() {
        let ok = ModelBindingResult::success("p", json!("text"));
        assert!(matches!(ok.model_as::<i32>(), Err(Error::Deserialization(_))));
    }
}
