// `prefix.Key` / `prefix.Value` pairs

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{ModelKind, ModelTypeRef};
use crate::names::create_property_model_name;
use async_trait::async_trait;
use folio_core::Error;
use serde_json::{Map, Value};

pub struct KeyValuePairModelBinder;

impl KeyValuePairModelBinder {
    async fn bind_side(
        ctx: &mut ModelBindingContext<'_>,
        side: &ModelTypeRef,
        name: &str,
    ) -> Result<Option<Value>, Error> {
        let metadata = ctx.runtime.metadata.get(side);
        let model_name = create_property_model_name(&ctx.model_name, name);
        let mut child = ctx.nested(metadata, name, model_name, None);
        Ok(child
            .bind()
            .await?
            .filter(|r| r.is_model_set)
            .map(|r| r.model.unwrap_or(Value::Null)))
    }
}

#[async_trait]
impl ModelBinder for KeyValuePairModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::KeyValuePair
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers() && matches!(ctx.metadata.kind, ModelKind::KeyValuePair { .. })
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let (key_type, value_type) = match &ctx.metadata.kind {
            ModelKind::KeyValuePair { key, value } => (*key, *value),
            _ => return Ok(None),
        };

        let key = Self::bind_side(ctx, &key_type, "Key").await?;
        let value = Self::bind_side(ctx, &value_type, "Value").await?;

        let missing = match (key, value) {
            (Some(key), Some(value)) => {
                let mut pair = Map::new();
                pair.insert("Key".to_string(), key);
                pair.insert("Value".to_string(), value);
                return Ok(Some(ModelBindingResult::success(
                    ctx.model_name.clone(),
                    Value::Object(pair),
                )));
            }
            (Some(_), None) => Some("Value"),
            (None, Some(_)) => Some("Key"),
            (None, None) => None,
        };

        if let Some(side) = missing {
            let side_name = create_property_model_name(&ctx.model_name, side);
            let message = ctx.messages.missing_key_or_value();
            ctx.model_state.try_add_model_error(&side_name, message);
            return Ok(Some(ModelBindingResult::failed(ctx.model_name.clone())));
        }

        if ctx.is_top_level {
            let mut pair = Map::new();
            pair.insert(
                "Key".to_string(),
                ctx.runtime.metadata.get(&key_type).default_value(),
            );
            pair.insert(
                "Value".to_string(),
                ctx.runtime.metadata.get(&value_type).default_value(),
            );
            return Ok(Some(ModelBindingResult::success(
                ctx.model_name.clone(),
                Value::Object(pair),
            )));
        }

        Ok(None)
    }
}
