// Services from the request's container

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{BindingSource, ModelKind};
use async_trait::async_trait;
use folio_core::Error;

pub struct ServicesModelBinder;

#[async_trait]
impl ModelBinder for ServicesModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::Services
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.binding_source == Some(BindingSource::Services)
            || matches!(ctx.metadata.kind, ModelKind::Service { .. })
    }

    /// A missing registration is a configuration error and fails the request
    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let (type_id, type_name) = match &ctx.metadata.kind {
            ModelKind::Service { type_id, type_name } => (*type_id, *type_name),
            _ => (ctx.metadata.type_id, ctx.metadata.type_name.as_str()),
        };
        let service = ctx.request.services.resolve_by_id(type_id, type_name)?;
        Ok(Some(ModelBindingResult::from_service(
            ctx.model_name.clone(),
            service,
        )))
    }
}
