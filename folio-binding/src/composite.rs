// Dispatch to the first binder that produces a result

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::binders::{
    BodyModelBinder, ByteArrayModelBinder, CollectionModelBinder, ComplexTypeModelBinder,
    DictionaryModelBinder, FormFileModelBinder, HeaderModelBinder, KeyValuePairModelBinder,
    ServicesModelBinder, SimpleTypeModelBinder,
};
use crate::context::ModelBindingContext;
use folio_core::Error;
use folio_core::logging::trace;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BindFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<ModelBindingResult>, Error>> + Send + 'a>>;

/// Ordered binder list.
///
/// A binder configured on the parameter, property or type always runs
/// alone. Otherwise each binder that supports the model is tried in order
/// until one returns a result.
#[derive(Clone)]
pub struct CompositeModelBinder {
    binders: Vec<Arc<dyn ModelBinder>>,
}

impl Default for CompositeModelBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeModelBinder {
    /// The built-in binders in priority order
    pub fn new() -> Self {
        Self {
            binders: vec![
                Arc::new(ServicesModelBinder),
                Arc::new(BodyModelBinder),
                Arc::new(HeaderModelBinder),
                Arc::new(FormFileModelBinder),
                Arc::new(ByteArrayModelBinder),
                Arc::new(SimpleTypeModelBinder),
                Arc::new(KeyValuePairModelBinder),
                Arc::new(DictionaryModelBinder),
                Arc::new(CollectionModelBinder::array()),
                Arc::new(CollectionModelBinder::collection()),
                Arc::new(ComplexTypeModelBinder),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            binders: Vec::new(),
        }
    }

    /// Register a binder ahead of every built-in one
    pub fn register(&mut self, binder: Arc<dyn ModelBinder>) {
        let position = self
            .binders
            .iter()
            .position(|b| b.kind() != BinderKind::Custom)
            .unwrap_or(self.binders.len());
        self.binders.insert(position, binder);
    }

    /// Register a binder just before the first binder of `kind`
    pub fn insert_before(&mut self, kind: BinderKind, binder: Arc<dyn ModelBinder>) {
        let position = self
            .binders
            .iter()
            .position(|b| b.kind() == kind)
            .unwrap_or(self.binders.len());
        self.binders.insert(position, binder);
    }

    pub fn push(&mut self, binder: Arc<dyn ModelBinder>) {
        self.binders.push(binder);
    }

    pub fn kinds(&self) -> Vec<BinderKind> {
        self.binders.iter().map(|b| b.kind()).collect()
    }

    pub fn bind_model<'a, 'b>(&'a self, ctx: &'a mut ModelBindingContext<'b>) -> BindFuture<'a> {
        Box::pin(async move {
            if let Some(binder) = ctx.binder.take() {
                trace!(
                    model_name = %ctx.model_name,
                    "Binding model with its configured binder"
                );
                return binder.bind_model(ctx).await;
            }

            for binder in &self.binders {
                if !binder.supports(ctx) {
                    continue;
                }
                trace!(
                    binder = ?binder.kind(),
                    model_name = %ctx.model_name,
                    model_type = %ctx.metadata.type_name,
                    "Attempting to bind model"
                );
                if let Some(result) = binder.bind_model(ctx).await? {
                    trace!(
                        binder = ?binder.kind(),
                        model_name = %ctx.model_name,
                        is_model_set = result.is_model_set,
                        "Done attempting to bind model"
                    );
                    return Ok(Some(result));
                }
            }

            trace!(model_name = %ctx.model_name, "No binder produced a result");
            Ok(None)
        })
    }
}
