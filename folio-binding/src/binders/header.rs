// Request headers

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{BindingSource, ModelKind};
use crate::value_provider::CompositeValueProvider;
use async_trait::async_trait;
use folio_core::Error;
use std::sync::Arc;

/// Binds scalars and scalar collections from the header named by the field.
///
/// Collections receive the comma-separated parts of the header value.
pub struct HeaderModelBinder;

#[async_trait]
impl ModelBinder for HeaderModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::Header
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.binding_source == Some(BindingSource::Header)
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let header_name = ctx
            .binder_model_name
            .clone()
            .unwrap_or_else(|| ctx.field_name.clone());
        let Some(header) = ctx.request.request.header(&header_name).cloned() else {
            return Ok(None);
        };

        let values = match &ctx.metadata.kind {
            ModelKind::Scalar(_) => vec![header],
            ModelKind::Array(_) | ModelKind::Collection { .. } => header
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            _ => return Ok(None),
        };

        let metadata = ctx.metadata.clone();
        let field_name = ctx.field_name.clone();
        let model_name = ctx.model_name.clone();
        let is_top_level = ctx.is_top_level;

        let mut inner = ctx.nested(metadata, field_name, model_name.clone(), None);
        inner.binding_source = None;
        inner.display_name = None;
        inner.is_top_level = is_top_level;
        inner.value_provider = Arc::new(CompositeValueProvider::single(
            BindingSource::Header,
            &model_name,
            values,
        ));
        inner.bind().await
    }
}
