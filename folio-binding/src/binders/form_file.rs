// Uploaded files

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::ModelKind;
use async_trait::async_trait;
use folio_core::{Error, FormFile};
use serde_json::Value;

/// Binds a `FormFile`, or a collection of them, from the request's files.
///
/// At the top level the files are looked up by field name since no value
/// provider prefix applies to them.
pub struct FormFileModelBinder;

fn is_file_collection(kind: &ModelKind) -> bool {
    match kind {
        ModelKind::Array(element) | ModelKind::Collection { element, .. } => element.is::<FormFile>(),
        _ => false,
    }
}

#[async_trait]
impl ModelBinder for FormFileModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::FormFile
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        matches!(ctx.metadata.kind, ModelKind::FormFile) || is_file_collection(&ctx.metadata.kind)
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let model_name = if ctx.is_top_level {
            ctx.binder_model_name
                .clone()
                .unwrap_or_else(|| ctx.field_name.clone())
        } else {
            ctx.model_name.clone()
        };

        let form = ctx.request.form.clone();
        let files = form.files_named(&model_name);

        let model = if matches!(ctx.metadata.kind, ModelKind::FormFile) {
            let Some(file) = files.first() else {
                return Ok(None);
            };
            serde_json::to_value(file)?
        } else {
            if files.is_empty() && !ctx.is_top_level {
                return Ok(None);
            }
            Value::Array(
                files
                    .iter()
                    .map(|file| serde_json::to_value(file))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };

        ctx.model_state.set_model_value(&model_name, None, None);
        Ok(Some(ModelBindingResult::success(model_name, model)))
    }
}
