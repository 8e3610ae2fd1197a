// JSON request bodies

use crate::binder::{BinderKind, ModelBinder, ModelBindingResult};
use crate::context::ModelBindingContext;
use crate::metadata::{BindingSource, MetadataProvider, ModelKind, ModelMetadata, ScalarKind};
use crate::names::{create_index_model_name, create_property_model_name};
use async_trait::async_trait;
use folio_core::Error;
use folio_core::logging::debug;
use serde_json::{Map, Value};

pub struct BodyModelBinder;

fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type == "text/json" || media_type.ends_with("+json")
}

#[async_trait]
impl ModelBinder for BodyModelBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::Body
    }

    fn supports(&self, ctx: &ModelBindingContext<'_>) -> bool {
        ctx.binding_source == Some(BindingSource::Body)
    }

    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let request = ctx.request.request.clone();
        let model_name = ctx.model_name.clone();

        if request.body.iter().all(u8::is_ascii_whitespace) {
            if ctx.options().allow_empty_body {
                return Ok(Some(ModelBindingResult::success(model_name, Value::Null)));
            }
            let message = ctx.messages.missing_request_body_required_value();
            ctx.model_state.try_add_model_error(&model_name, message);
            return Ok(Some(ModelBindingResult::failed(model_name)));
        }

        if let Some(content_type) = request.content_type().filter(|ct| !is_json_content_type(ct)) {
            debug!(content_type, "Unsupported content type for request body");
            ctx.model_state.try_add_model_exception(
                &model_name,
                "",
                format!("Unsupported content type '{}'.", content_type),
            );
            return Ok(Some(ModelBindingResult::failed(model_name)));
        }

        let body = match serde_json::from_slice::<Value>(&request.body) {
            Ok(body) => body,
            Err(err) => {
                debug!(error = %err, "Request body is not valid JSON");
                ctx.model_state
                    .try_add_model_exception(&model_name, err.to_string(), err.to_string());
                return Ok(Some(ModelBindingResult::failed(model_name)));
            }
        };

        let mut mismatches = Vec::new();
        let model = conform(
            &ctx.runtime.metadata,
            &ctx.metadata,
            body,
            &model_name,
            &mut mismatches,
        );
        if mismatches.is_empty() {
            return Ok(Some(ModelBindingResult::success(model_name, model)));
        }

        debug!(errors = mismatches.len(), "Request body does not match the model type");
        for (key, type_name) in mismatches {
            let message = format!("The JSON value could not be converted to {}.", type_name);
            let exception = format!("Path: {}", if key.is_empty() { "$" } else { &key });
            ctx.model_state.try_add_model_exception(&key, message, exception);
        }
        Ok(Some(ModelBindingResult::failed(model_name)))
    }
}

/// Check `value` against `metadata`, collecting `(key, type name)` for every
/// value of the wrong shape. Missing properties of complex models are filled
/// from the model's default.
fn conform(
    provider: &MetadataProvider,
    metadata: &ModelMetadata,
    value: Value,
    key: &str,
    mismatches: &mut Vec<(String, String)>,
) -> Value {
    if value.is_null() {
        let accepts_null = metadata.is_nullable
            || matches!(
                metadata.kind,
                ModelKind::KeyValuePair { .. } | ModelKind::FormFile | ModelKind::Service { .. }
            );
        if !accepts_null {
            mismatches.push((key.to_string(), metadata.type_name.clone()));
        }
        return value;
    }

    match (&metadata.kind, value) {
        (ModelKind::Scalar(kind), value) => {
            if !scalar_matches(*kind, &value) {
                mismatches.push((key.to_string(), metadata.type_name.clone()));
            }
            value
        }
        (ModelKind::Complex(complex), Value::Object(mut fields)) => {
            let mut model = match (complex.create)() {
                Value::Object(defaults) => defaults,
                _ => Map::new(),
            };
            for property in &complex.properties {
                if let Some(field) = fields.remove(&property.name) {
                    let property_metadata = provider.get(&property.model_type);
                    let property_key = create_property_model_name(key, &property.name);
                    let field = conform(provider, &property_metadata, field, &property_key, mismatches);
                    model.insert(property.name.clone(), field);
                }
            }
            Value::Object(model)
        }
        (
            ModelKind::Collection { element, .. } | ModelKind::Array(element),
            Value::Array(items),
        ) => {
            let element = provider.get(element);
            let items = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    let item_key = create_index_model_name(key, &index.to_string());
                    conform(provider, &element, item, &item_key, mismatches)
                })
                .collect();
            Value::Array(items)
        }
        (ModelKind::Dictionary { key: key_type, value: value_type }, Value::Object(entries)) => {
            let key_metadata = provider.get(key_type);
            let value_metadata = provider.get(value_type);
            let mut model = Map::new();
            for (entry_key, entry) in entries {
                let entry_name = create_index_model_name(key, &entry_key);
                if let ModelKind::Scalar(kind) = &key_metadata.kind {
                    if kind.convert(&entry_key).is_err() {
                        mismatches.push((entry_name.clone(), key_metadata.type_name.clone()));
                    }
                }
                let entry = conform(provider, &value_metadata, entry, &entry_name, mismatches);
                model.insert(entry_key, entry);
            }
            Value::Object(model)
        }
        (ModelKind::ByteArray, value @ Value::String(_)) => value,
        (ModelKind::KeyValuePair { .. } | ModelKind::FormFile | ModelKind::Service { .. }, value) => {
            value
        }
        (_, value) => {
            mismatches.push((key.to_string(), metadata.type_name.clone()));
            value
        }
    }
}

fn scalar_matches(kind: ScalarKind, value: &Value) -> bool {
    let fits_signed = |min: i64, max: i64| value.as_i64().is_some_and(|n| n >= min && n <= max);
    let fits_unsigned = |max: u64| value.as_u64().is_some_and(|n| n <= max);

    match kind {
        ScalarKind::String => value.is_string(),
        ScalarKind::Bool => value.is_boolean(),
        ScalarKind::Char => value.as_str().is_some_and(|s| s.chars().count() == 1),
        ScalarKind::I8 => fits_signed(i8::MIN.into(), i8::MAX.into()),
        ScalarKind::I16 => fits_signed(i16::MIN.into(), i16::MAX.into()),
        ScalarKind::I32 => fits_signed(i32::MIN.into(), i32::MAX.into()),
        ScalarKind::I64 => value.is_i64(),
        ScalarKind::U8 => fits_unsigned(u8::MAX.into()),
        ScalarKind::U16 => fits_unsigned(u16::MAX.into()),
        ScalarKind::U32 => fits_unsigned(u32::MAX.into()),
        ScalarKind::U64 => value.is_u64(),
        ScalarKind::F32 | ScalarKind::F64 => value.is_number(),
    }
}
