// Arrays and lists, bound from repeated values or indexed keys

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{BindingSource, ModelKind, ModelMetadata};
use crate::names::{create_index_model_name, create_property_model_name};
use crate::validation::ValidationStrategy;
use crate::value_provider::{CompositeValueProvider, ValueProvider, ValueProviderResult};
use async_trait::async_trait;
use folio_core::Error;
use folio_core::logging::{trace, warn};
use serde_json::Value;
use std::sync::Arc;

/// Binds `ModelKind::Array` or `ModelKind::Collection` models.
///
/// Elements come from, in order of preference: several raw values under the
/// model name itself (scalar elements only), the indexes listed under
/// `name.index`, or `name[0]`, `name[1]`, ... up to the first gap.
pub struct CollectionModelBinder {
    kind: BinderKind,
}

impl CollectionModelBinder {
    pub fn array() -> Self {
        Self {
            kind: BinderKind::Array,
        }
    }

    pub fn collection() -> Self {
        Self {
            kind: BinderKind::Collection,
        }
    }
}

#[async_trait]
impl ModelBinder for CollectionModelBinder {
    fn kind(&self) -> BinderKind {
        self.kind
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.uses_value_providers()
            && match (&ctx.metadata.kind, self.kind) {
                (ModelKind::Array(_), BinderKind::Array) => true,
                (ModelKind::Collection { .. }, BinderKind::Collection) => true,
                _ => false,
            }
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let element = match &ctx.metadata.kind {
            ModelKind::Array(element) | ModelKind::Collection { element, .. } => *element,
            _ => return Ok(None),
        };

        if !ctx.value_provider.contains_prefix(&ctx.model_name) {
            if !ctx.is_top_level {
                return Ok(None);
            }
            // Nothing posted for a top-level collection: an empty one, or the existing one
            let model = ctx
                .model
                .take()
                .filter(Value::is_array)
                .unwrap_or_else(|| Value::Array(Vec::new()));
            return Ok(Some(ModelBindingResult::success(ctx.model_name.clone(), model)));
        }

        let element = ctx.runtime.metadata.get(&element);
        let result = match bind_elements(ctx, element).await? {
            Some(values) => ModelBindingResult::success(ctx.model_name.clone(), Value::Array(values)),
            None => ModelBindingResult::failed(ctx.model_name.clone()),
        };
        Ok(Some(result))
    }
}

/// Bind every element found under the current model name.
///
/// `None` means the collection exceeded the configured size limit, which
/// has been reported in model state.
pub(crate) async fn bind_elements(
    ctx: &mut ModelBindingContext<'_>,
    element: Arc<ModelMetadata>,
) -> Result<Option<Vec<Value>>, Error> {
    let values = ctx.value_provider.get_value(&ctx.model_name);
    let scalar_elements = matches!(element.kind, ModelKind::Scalar(_) | ModelKind::ByteArray);

    if !values.is_none() && scalar_elements {
        bind_simple_elements(ctx, element, values).await
    } else {
        bind_indexed_elements(ctx, element).await
    }
}

async fn bind_simple_elements(
    ctx: &mut ModelBindingContext<'_>,
    element: Arc<ModelMetadata>,
    values: ValueProviderResult,
) -> Result<Option<Vec<Value>>, Error> {
    let max = ctx.options().max_model_binding_collection_size;
    if values.len() > max {
        report_too_many(ctx, &element);
        return Ok(None);
    }

    let model_name = ctx.model_name.clone();
    let field_name = ctx.field_name.clone();
    let mut bound = Vec::with_capacity(values.len());

    for raw in values.values() {
        let mut child = ctx.nested(element.clone(), field_name.clone(), model_name.clone(), None);
        child.value_provider = Arc::new(CompositeValueProvider::single(
            BindingSource::ModelBinding,
            &model_name,
            vec![raw.clone()],
        ));
        if let Some(result) = child.bind().await? {
            if result.is_model_set {
                bound.push(result.model.unwrap_or(Value::Null));
            }
        }
    }

    // Element binding recorded one value at a time; keep all of them
    ctx.model_state
        .set_model_value(&model_name, values.raw_value(), Some(values.to_string()));
    Ok(Some(bound))
}

async fn bind_indexed_elements(
    ctx: &mut ModelBindingContext<'_>,
    element: Arc<ModelMetadata>,
) -> Result<Option<Vec<Value>>, Error> {
    let max = ctx.options().max_model_binding_collection_size;
    let model_name = ctx.model_name.clone();
    let index_key = create_property_model_name(&model_name, "index");
    let explicit = ctx.value_provider.get_value(&index_key);
    let mut bound = Vec::new();

    if !explicit.is_none() {
        let indexes = explicit.values().to_vec();
        if indexes.len() > max {
            report_too_many(ctx, &element);
            return Ok(None);
        }

        trace!(model_name = %model_name, count = indexes.len(), "Binding collection from explicit indexes");
        for index in &indexes {
            let element_name = create_index_model_name(&model_name, index);
            let value = bind_element(ctx, &element, element_name).await?;
            bound.push(value.unwrap_or_else(|| element.default_value()));
        }
        ctx.validation_state
            .insert(&model_name, ValidationStrategy::ExplicitIndex(indexes));
    } else {
        let mut index = 0usize;
        loop {
            let element_name = create_index_model_name(&model_name, &index.to_string());
            if index >= max {
                if ctx.value_provider.contains_prefix(&element_name) {
                    report_too_many(ctx, &element);
                    return Ok(None);
                }
                break;
            }
            match bind_element(ctx, &element, element_name).await? {
                Some(value) => bound.push(value),
                None => break,
            }
            index += 1;
        }
    }

    Ok(Some(bound))
}

async fn bind_element(
    ctx: &mut ModelBindingContext<'_>,
    element: &Arc<ModelMetadata>,
    element_name: String,
) -> Result<Option<Value>, Error> {
    let field_name = ctx.field_name.clone();
    let mut child = ctx.nested(element.clone(), field_name, element_name, None);
    Ok(child
        .bind()
        .await?
        .filter(|r| r.is_model_set)
        .map(|r| r.model.unwrap_or(Value::Null)))
}

fn report_too_many(ctx: &mut ModelBindingContext<'_>, element: &ModelMetadata) {
    let max = ctx.options().max_model_binding_collection_size;
    warn!(
        model_name = %ctx.model_name,
        limit = max,
        "Collection exceeded the maximum binding size"
    );
    let message = format!(
        "Collection bound to '{}' exceeded BindingOptions.max_model_binding_collection_size ({}). \
         This limit is a safeguard against incorrect model binders and models. Address issues in '{}'.",
        ctx.model_name, max, element.type_name
    );
    ctx.model_state.try_add_model_error(&ctx.model_name, message);
}
