// Dictionaries, bound as key/value pairs or from the `prefix[key]` shorthand

use super::collection::bind_elements;
use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{ModelKind, ModelMetadata};
use crate::types::KeyValuePair;
use crate::validation::ValidationStrategy;
use crate::value_provider::ValueProvider;
use async_trait::async_trait;
use folio_core::Error;
use folio_core::logging::trace;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Binds `ModelKind::Dictionary` models.
///
/// The pair encoding (`name[0].Key`, `name[0].Value`) is tried first. When
/// it yields nothing and both key and value are scalars, every
/// `name[key]` entry becomes one dictionary entry.
pub struct DictionaryModelBinder;

/// Dictionary keys are object keys in the JSON form of the model
fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ModelBinder for DictionaryModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::Dictionary
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers() && matches!(ctx.metadata.kind, ModelKind::Dictionary { .. })
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let (key_type, value_type) = match &ctx.metadata.kind {
            ModelKind::Dictionary { key, value } => (*key, *value),
            _ => return Ok(None),
        };

        if !ctx.value_provider.contains_prefix(&ctx.model_name) {
            if !ctx.is_top_level {
                return Ok(None);
            }
            let model = ctx
                .model
                .take()
                .filter(Value::is_object)
                .unwrap_or_else(|| Value::Object(Map::new()));
            return Ok(Some(ModelBindingResult::success(ctx.model_name.clone(), model)));
        }

        let pair = Arc::new(ModelMetadata::new::<KeyValuePair<(), ()>>(
            "KeyValuePair",
            ModelKind::KeyValuePair {
                key: key_type,
                value: value_type,
            },
        ));
        let Some(pairs) = bind_elements(ctx, pair).await? else {
            return Ok(Some(ModelBindingResult::failed(ctx.model_name.clone())));
        };

        let mut model = Map::new();
        for pair in pairs {
            if let Value::Object(mut pair) = pair {
                let value = pair.remove("Value").unwrap_or(Value::Null);
                if let Some(key) = pair.get("Key").and_then(key_text) {
                    model.insert(key, value);
                }
            }
        }

        let key_metadata = ctx.runtime.metadata.get(&key_type);
        let value_metadata = ctx.runtime.metadata.get(&value_type);
        let key_kind = match &key_metadata.kind {
            ModelKind::Scalar(kind) => Some(*kind),
            _ => None,
        };

        if let (true, Some(key_kind), true) = (model.is_empty(), key_kind, value_metadata.is_simple()) {
            let model_name = ctx.model_name.clone();
            let field_name = ctx.field_name.clone();
            let keys = ctx.value_provider.get_keys_from_prefix(&model_name);
            trace!(model_name = %model_name, count = keys.len(), "Binding dictionary from key shorthand");

            let mut mappings = Vec::new();
            for (raw_key, entry_name) in keys {
                let key = match key_kind.convert(&raw_key) {
                    Ok(key) => key,
                    Err(_) => {
                        let message = ctx
                            .messages
                            .attempted_value_is_invalid(&raw_key, &key_metadata.type_name);
                        ctx.model_state.try_add_model_error(&entry_name, message);
                        continue;
                    }
                };
                let Some(key) = key_text(&key) else {
                    continue;
                };

                let mut child =
                    ctx.nested(value_metadata.clone(), field_name.clone(), entry_name.clone(), None);
                let value = child
                    .bind()
                    .await?
                    .filter(|r| r.is_model_set)
                    .map(|r| r.model.unwrap_or(Value::Null))
                    .unwrap_or_else(|| value_metadata.default_value());

                model.insert(key.clone(), value);
                mappings.push((entry_name, key));
            }

            if !mappings.is_empty() {
                ctx.validation_state
                    .insert(&model_name, ValidationStrategy::ShortFormDictionary(mappings));
            }
        }

        Ok(Some(ModelBindingResult::success(
            ctx.model_name.clone(),
            Value::Object(model),
        )))
    }
}
