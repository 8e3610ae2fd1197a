// Bindable wrapper types with no direct std equivalent

use crate::metadata::{Bindable, BindingSource, ModelKind, ModelMetadata, ModelTypeRef};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_core::{Provider, ServiceInstance};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::TypeId;
use std::ops::Deref;
use std::sync::Arc;

/// A list that cannot be cleared or refilled once created.
///
/// A read-only property of this type is left untouched by binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadOnlyList<T>(Vec<T>);

impl<T> ReadOnlyList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> Deref for ReadOnlyList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: Bindable> Bindable for ReadOnlyList<T> {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<ReadOnlyList<T>>(
            "ReadOnlyList",
            ModelKind::Collection {
                element: ModelTypeRef::of::<T>(),
                read_only: true,
            },
        )
    }
}

/// A key and a value bound from `prefix.Key` and `prefix.Value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair<K, V> {
    #[serde(rename = "Key")]
    pub key: K,
    #[serde(rename = "Value")]
    pub value: V,
}

impl<K: Bindable, V: Bindable> Bindable for KeyValuePair<K, V> {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<KeyValuePair<K, V>>(
            "KeyValuePair",
            ModelKind::KeyValuePair {
                key: ModelTypeRef::of::<K>(),
                value: ModelTypeRef::of::<V>(),
            },
        )
    }
}

/// Binary data posted as base64 text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Deref for Base64Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Base64Bytes)
            .map_err(serde::de::Error::custom)
    }
}

impl Bindable for Base64Bytes {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<Base64Bytes>("Byte[]", ModelKind::ByteArray)
    }
}

/// A parameter resolved from the service container
pub struct FromServices<T: Provider>(pub Arc<T>);

impl<T: Provider> FromServices<T> {
    /// Recover the typed service from a bound instance
    pub fn from_instance(instance: ServiceInstance) -> Option<Self> {
        instance.downcast::<T>().ok().map(FromServices)
    }
}

impl<T: Provider> Deref for FromServices<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Provider> Bindable for FromServices<T> {
    fn describe() -> ModelMetadata {
        let type_name = std::any::type_name::<T>();
        ModelMetadata::new::<FromServices<T>>(
            type_name,
            ModelKind::Service {
                type_id: TypeId::of::<T>(),
                type_name,
            },
        )
        .with_binding_source(BindingSource::Services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base64_bytes_serde() {
        let bytes = Base64Bytes(b"Fys1".to_vec());
        let value = serde_json::to_value(&bytes).unwrap();
        assert_eq!(value, json!("RnlzMQ=="));
        assert_eq!(serde_json::from_value::<Base64Bytes>(value).unwrap(), bytes);
    }

    #[test]
    fn test_key_value_pair_shape() {
        let pair: KeyValuePair<String, i32> =
            serde_json::from_value(json!({"Key": "a", "Value": 1})).unwrap();
        assert_eq!(pair.key, "a");
        assert_eq!(pair.value, 1);
    }

    #[test]
    fn test_read_only_list_is_read_only_collection() {
        let metadata = ReadOnlyList::<i32>::describe();
        assert!(matches!(
            metadata.kind,
            ModelKind::Collection {
                read_only: true,
                ..
            }
        ));
        let list: ReadOnlyList<i32> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(&*list, &[1, 2]);
    }

    #[test]
    fn test_from_services_metadata() {
        struct Clock;
        impl Provider for Clock {}

        let metadata = FromServices::<Clock>::describe();
        assert_eq!(metadata.binding_source, Some(BindingSource::Services));
        let instance: ServiceInstance = Arc::new(Clock);
        assert!(FromServices::<Clock>::from_instance(instance).is_some());
    }
}
