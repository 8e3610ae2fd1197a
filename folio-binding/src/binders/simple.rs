// Scalars converted from the first raw value

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{ModelKind, ScalarKind};
use crate::value_provider::ValueProvider;
use async_trait::async_trait;
use folio_core::Error;
use folio_core::logging::debug;
use serde_json::Value;

pub struct SimpleTypeModelBinder;

#[async_trait]
impl ModelBinder for SimpleTypeModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::SimpleType
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers() && matches!(ctx.metadata.kind, ModelKind::Scalar(_))
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let kind = match &ctx.metadata.kind {
            ModelKind::Scalar(kind) => *kind,
            _ => return Ok(None),
        };

        let result = ctx.value_provider.get_value(&ctx.model_name);
        if result.is_none() {
            return Ok(None);
        }

        let attempted = result.to_string();
        ctx.model_state
            .set_model_value(&ctx.model_name, result.raw_value(), Some(attempted.clone()));

        let first = result.first_value().unwrap_or_default();
        let blank = first.trim().is_empty();

        let model = if kind == ScalarKind::String {
            if blank && ctx.metadata.is_nullable && ctx.options().convert_empty_string_to_null {
                Value::Null
            } else {
                Value::String(first.to_string())
            }
        } else if blank {
            if !ctx.metadata.is_nullable {
                ctx.model_state.try_add_model_error(
                    &ctx.model_name,
                    ctx.messages.value_must_not_be_null(&attempted),
                );
                return Ok(Some(ModelBindingResult::failed(ctx.model_name.clone())));
            }
            Value::Null
        } else {
            match kind.convert(first) {
                Ok(value) => value,
                Err(err) => {
                    debug!(model_name = %ctx.model_name, error = %err, "Value conversion failed");
                    let message = ctx.messages.attempted_value_is_invalid(&attempted, ctx.display());
                    ctx.model_state.try_add_model_error(&ctx.model_name, message);
                    return Ok(Some(ModelBindingResult::failed(ctx.model_name.clone())));
                }
            }
        };

        Ok(Some(ModelBindingResult::success(ctx.model_name.clone(), model)))
    }
}
