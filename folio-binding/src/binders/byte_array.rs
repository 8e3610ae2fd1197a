// Base64 text to bytes

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::ModelKind;
use crate::value_provider::ValueProvider;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_core::Error;
use serde_json::Value;

pub struct ByteArrayModelBinder;

#[async_trait]
impl ModelBinder for ByteArrayModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::ByteArray
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers() && matches!(ctx.metadata.kind, ModelKind::ByteArray)
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let result = ctx.value_provider.get_value(&ctx.model_name);
        if result.is_none() {
            return Ok(None);
        }

        let attempted = result.to_string();
        ctx.model_state
            .set_model_value(&ctx.model_name, result.raw_value(), Some(attempted.clone()));

        // Posted but left blank
        let first = result.first_value().unwrap_or_default();
        if first.is_empty() {
            return Ok(None);
        }

        match STANDARD.decode(first.as_bytes()) {
            Ok(bytes) => Ok(Some(ModelBindingResult::success(
                ctx.model_name.clone(),
                Value::String(STANDARD.encode(bytes)),
            ))),
            Err(_) => {
                let message = ctx.messages.attempted_value_is_invalid(&attempted, ctx.display());
                ctx.model_state.try_add_model_error(&ctx.model_name, message);
                Ok(Some(ModelBindingResult::failed(ctx.model_name.clone())))
            }
        }
    }
}
