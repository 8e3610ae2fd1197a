//! Model metadata
//!
//! Every bindable type describes itself once through [`Bindable::describe`].
//! The description is lazy for nested types: a property or element refers to
//! its type through a [`ModelTypeRef`], which the [`MetadataProvider`]
//! resolves (and caches) on first use. Recursive models therefore describe
//! without looping.

use crate::binder::ModelBinder;
use crate::messages::ModelBindingMessageProvider;
use folio_validation::{Required, ValidationAttribute};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where the data for a model comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingSource {
    Query,
    Route,
    Form,
    Header,
    Body,
    Services,
    FormFile,
    /// Any of query, route and form
    ModelBinding,
    Custom(String),
}

impl BindingSource {
    /// Greedy sources are consumed by a dedicated binder and never read from
    /// the value providers.
    pub fn is_greedy(&self) -> bool {
        matches!(
            self,
            BindingSource::Header
                | BindingSource::Body
                | BindingSource::Services
                | BindingSource::FormFile
                | BindingSource::Custom(_)
        )
    }

    /// Whether a value provider tagged with `source` may serve this binding source
    pub fn can_accept(&self, source: &BindingSource) -> bool {
        match self {
            BindingSource::ModelBinding => matches!(
                source,
                BindingSource::Query
                    | BindingSource::Route
                    | BindingSource::Form
                    | BindingSource::ModelBinding
            ),
            other => other == source,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            BindingSource::Query => "Query",
            BindingSource::Route => "Path",
            BindingSource::Form => "Form",
            BindingSource::Header => "Header",
            BindingSource::Body => "Body",
            BindingSource::Services => "Services",
            BindingSource::FormFile => "FormFile",
            BindingSource::ModelBinding => "ModelBinding",
            BindingSource::Custom(name) => name,
        }
    }
}

/// Scalar types the simple binder converts from text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl ScalarKind {
    /// Name used in conversion error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "Boolean",
            ScalarKind::Char => "Char",
            ScalarKind::I8 => "SByte",
            ScalarKind::I16 => "Int16",
            ScalarKind::I32 => "Int32",
            ScalarKind::I64 => "Int64",
            ScalarKind::U8 => "Byte",
            ScalarKind::U16 => "UInt16",
            ScalarKind::U32 => "UInt32",
            ScalarKind::U64 => "UInt64",
            ScalarKind::F32 => "Single",
            ScalarKind::F64 => "Double",
            ScalarKind::String => "String",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Char => Value::String("\0".to_string()),
            ScalarKind::F32 | ScalarKind::F64 => Value::from(0.0),
            ScalarKind::String => Value::String(String::new()),
            _ => Value::from(0),
        }
    }

    /// Convert raw request text into the JSON form of this scalar.
    ///
    /// Numbers tolerate surrounding whitespace; booleans ignore case.
    pub fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
        let fail = || ConversionError {
            value: raw.to_string(),
            kind: *self,
        };
        let trimmed = raw.trim();

        match self {
            ScalarKind::String => Ok(Value::String(raw.to_string())),
            ScalarKind::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(fail())
                }
            }
            ScalarKind::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::String(c.to_string())),
                    _ => Err(fail()),
                }
            }
            ScalarKind::I8 => trimmed.parse::<i8>().map(Value::from).map_err(|_| fail()),
            ScalarKind::I16 => trimmed.parse::<i16>().map(Value::from).map_err(|_| fail()),
            ScalarKind::I32 => trimmed.parse::<i32>().map(Value::from).map_err(|_| fail()),
            ScalarKind::I64 => trimmed.parse::<i64>().map(Value::from).map_err(|_| fail()),
            ScalarKind::U8 => trimmed.parse::<u8>().map(Value::from).map_err(|_| fail()),
            ScalarKind::U16 => trimmed.parse::<u16>().map(Value::from).map_err(|_| fail()),
            ScalarKind::U32 => trimmed.parse::<u32>().map(Value::from).map_err(|_| fail()),
            ScalarKind::U64 => trimmed.parse::<u64>().map(Value::from).map_err(|_| fail()),
            ScalarKind::F32 | ScalarKind::F64 => trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),
        }
    }
}

/// Raw text that a scalar conversion rejected
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    pub value: String,
    pub kind: ScalarKind,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' cannot be converted to {}",
            self.value,
            self.kind.type_name()
        )
    }
}

impl std::error::Error for ConversionError {}

/// Types that take part in model binding
pub trait Bindable: 'static {
    fn describe() -> ModelMetadata;
}

/// Lazy reference to a bindable type
#[derive(Clone, Copy)]
pub struct ModelTypeRef {
    type_id: TypeId,
    describe: fn() -> ModelMetadata,
}

impl ModelTypeRef {
    pub fn of<T: Bindable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            describe: T::describe,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    fn describe(&self) -> ModelMetadata {
        (self.describe)()
    }
}

impl fmt::Debug for ModelTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTypeRef")
            .field("type_id", &self.type_id)
            .finish()
    }
}

/// Shape of a model, which decides the binder that handles it
#[derive(Clone, Debug)]
pub enum ModelKind {
    Scalar(ScalarKind),
    /// Fixed-size sequence that cannot be resized in place
    Array(ModelTypeRef),
    /// Growable sequence; `read_only` collections cannot be cleared and refilled
    Collection { element: ModelTypeRef, read_only: bool },
    Dictionary { key: ModelTypeRef, value: ModelTypeRef },
    KeyValuePair { key: ModelTypeRef, value: ModelTypeRef },
    Complex(ComplexType),
    /// Bytes carried as base64 text
    ByteArray,
    FormFile,
    /// Resolved from the service container, never from request data
    Service { type_id: TypeId, type_name: &'static str },
}

/// A type with named, individually bound properties
#[derive(Clone)]
pub struct ComplexType {
    pub properties: Vec<Arc<PropertyMetadata>>,
    /// Builds a fresh instance in its JSON form
    pub create: fn() -> Value,
}

impl ComplexType {
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyMetadata>> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl fmt::Debug for ComplexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexType")
            .field("properties", &self.properties)
            .finish()
    }
}

/// Metadata of a type
#[derive(Clone)]
pub struct ModelMetadata {
    pub type_id: TypeId,
    pub type_name: String,
    pub kind: ModelKind,
    /// `Option<T>`: empty input binds to null
    pub is_nullable: bool,
    /// Type-level source, e.g. services or uploaded files
    pub binding_source: Option<BindingSource>,
    pub binder: Option<Arc<dyn ModelBinder>>,
    pub validators: Vec<Arc<dyn ValidationAttribute>>,
    pub messages: Option<Arc<ModelBindingMessageProvider>>,
}

impl ModelMetadata {
    pub fn new<T: 'static>(type_name: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name.into(),
            kind,
            is_nullable: false,
            binding_source: None,
            binder: None,
            validators: Vec::new(),
            messages: None,
        }
    }

    pub fn scalar<T: 'static>(kind: ScalarKind) -> Self {
        Self::new::<T>(kind.type_name(), ModelKind::Scalar(kind))
    }

    /// Describe a struct. Its JSON form comes from `T::default()`.
    pub fn complex<T>(type_name: impl Into<String>, properties: Vec<PropertyMetadata>) -> Self
    where
        T: Default + Serialize + 'static,
    {
        Self::new::<T>(
            type_name,
            ModelKind::Complex(ComplexType {
                properties: properties.into_iter().map(Arc::new).collect(),
                create: default_json::<T>,
            }),
        )
    }

    pub fn with_binding_source(mut self, source: BindingSource) -> Self {
        self.binding_source = Some(source);
        self
    }

    pub fn with_binder(mut self, binder: Arc<dyn ModelBinder>) -> Self {
        self.binder = Some(binder);
        self
    }

    pub fn with_validator(mut self, validator: impl ValidationAttribute + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_messages(mut self, messages: ModelBindingMessageProvider) -> Self {
        self.messages = Some(Arc::new(messages));
        self
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.kind, ModelKind::Scalar(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, ModelKind::Complex(_))
    }

    pub fn complex_type(&self) -> Option<&ComplexType> {
        match &self.kind {
            ModelKind::Complex(complex) => Some(complex),
            _ => None,
        }
    }

    /// Value used for an element that was addressed but not bound
    pub fn default_value(&self) -> Value {
        if self.is_nullable {
            return Value::Null;
        }
        match &self.kind {
            ModelKind::Scalar(kind) => kind.default_value(),
            ModelKind::Array(_) | ModelKind::Collection { .. } => Value::Array(Vec::new()),
            ModelKind::Dictionary { .. } => Value::Object(Map::new()),
            ModelKind::Complex(complex) => (complex.create)(),
            ModelKind::ByteArray => Value::String(String::new()),
            ModelKind::KeyValuePair { .. } | ModelKind::FormFile | ModelKind::Service { .. } => {
                Value::Null
            }
        }
    }
}

impl fmt::Debug for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMetadata")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("is_nullable", &self.is_nullable)
            .field("binding_source", &self.binding_source)
            .field("validators", &self.validators)
            .finish()
    }
}

fn default_json<T: Default + Serialize>() -> Value {
    serde_json::to_value(T::default()).unwrap_or(Value::Null)
}

/// Binding settings shared by parameters and properties
#[derive(Clone, Default)]
pub struct BindingInfo {
    /// Explicit prefix or key name
    pub binder_model_name: Option<String>,
    pub binding_source: Option<BindingSource>,
    pub binder: Option<Arc<dyn ModelBinder>>,
    pub is_binding_required: bool,
    pub display_name: Option<String>,
    pub validators: Vec<Arc<dyn ValidationAttribute>>,
    pub messages: Option<Arc<ModelBindingMessageProvider>>,
}

impl fmt::Debug for BindingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingInfo")
            .field("binder_model_name", &self.binder_model_name)
            .field("binding_source", &self.binding_source)
            .field("has_binder", &self.binder.is_some())
            .field("is_binding_required", &self.is_binding_required)
            .field("display_name", &self.display_name)
            .field("validators", &self.validators)
            .finish()
    }
}

macro_rules! binding_info_builders {
    () => {
        pub fn from_query(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Query)
        }

        pub fn from_route(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Route)
        }

        pub fn from_form(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Form)
        }

        pub fn from_header(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Header)
        }

        pub fn from_body(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Body)
        }

        pub fn from_services(self) -> Self {
            self.binding_source($crate::metadata::BindingSource::Services)
        }

        pub fn binding_source(mut self, source: $crate::metadata::BindingSource) -> Self {
            self.binding_info.binding_source = Some(source);
            self
        }

        /// Bind from `name` instead of the declared name
        pub fn model_name(mut self, name: impl Into<String>) -> Self {
            self.binding_info.binder_model_name = Some(name.into());
            self
        }

        pub fn display_name(mut self, name: impl Into<String>) -> Self {
            self.binding_info.display_name = Some(name.into());
            self
        }

        /// Report an error when no value could be bound
        pub fn bind_required(mut self) -> Self {
            self.binding_info.is_binding_required = true;
            self
        }

        pub fn validate(
            mut self,
            validator: impl folio_validation::ValidationAttribute + 'static,
        ) -> Self {
            self.binding_info.validators.push(std::sync::Arc::new(validator));
            self
        }

        pub fn with_binder(
            mut self,
            binder: std::sync::Arc<dyn $crate::binder::ModelBinder>,
        ) -> Self {
            self.binding_info.binder = Some(binder);
            self
        }

        pub fn with_messages(
            mut self,
            messages: $crate::messages::ModelBindingMessageProvider,
        ) -> Self {
            self.binding_info.messages = Some(std::sync::Arc::new(messages));
            self
        }
    };
}

pub(crate) use binding_info_builders;

/// A property of a complex type
#[derive(Clone)]
pub struct PropertyMetadata {
    /// Key of the property in the model's JSON object
    pub name: String,
    pub model_type: ModelTypeRef,
    pub binding_info: BindingInfo,
    /// No setter: only mutable containers and complex values can be updated
    pub is_read_only: bool,
    pub is_binding_allowed: bool,
    pub validate_never: bool,
}

impl PropertyMetadata {
    pub fn new<T: Bindable>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_type: ModelTypeRef::of::<T>(),
            binding_info: BindingInfo::default(),
            is_read_only: false,
            is_binding_allowed: true,
            validate_never: false,
        }
    }

    binding_info_builders!();

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub fn bind_never(mut self) -> Self {
        self.is_binding_allowed = false;
        self
    }

    pub fn validate_never(mut self) -> Self {
        self.validate_never = true;
        self
    }

    /// Shorthand for `validate(Required::new())`
    pub fn required(self) -> Self {
        self.validate(Required::new())
    }

    /// Name the property is bound under
    pub fn field_name(&self) -> &str {
        self.binding_info
            .binder_model_name
            .as_deref()
            .unwrap_or(&self.name)
    }

    pub fn display(&self) -> &str {
        self.binding_info
            .display_name
            .as_deref()
            .unwrap_or(&self.name)
    }
}

impl fmt::Debug for PropertyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("name", &self.name)
            .field("binding_info", &self.binding_info)
            .field("is_read_only", &self.is_read_only)
            .field("is_binding_allowed", &self.is_binding_allowed)
            .field("validate_never", &self.validate_never)
            .finish()
    }
}

type MetadataOverride = Arc<dyn Fn(&mut ModelMetadata) + Send + Sync>;

/// Resolves and caches metadata per type
#[derive(Default)]
pub struct MetadataProvider {
    cache: RwLock<HashMap<TypeId, Arc<ModelMetadata>>>,
    overrides: RwLock<HashMap<TypeId, Vec<MetadataOverride>>>,
}

impl MetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_ref: &ModelTypeRef) -> Arc<ModelMetadata> {
        if let Some(metadata) = self.cache.read().get(&type_ref.type_id) {
            return metadata.clone();
        }

        let mut metadata = type_ref.describe();
        if let Some(overrides) = self.overrides.read().get(&type_ref.type_id) {
            for apply in overrides {
                apply(&mut metadata);
            }
        }

        let metadata = Arc::new(metadata);
        self.cache
            .write()
            .entry(type_ref.type_id)
            .or_insert(metadata)
            .clone()
    }

    pub fn get_for<T: Bindable>(&self) -> Arc<ModelMetadata> {
        self.get(&ModelTypeRef::of::<T>())
    }

    /// Adjust the metadata of `T`, e.g. to replace its binding messages
    pub fn configure<T: Bindable>(&self, apply: impl Fn(&mut ModelMetadata) + Send + Sync + 'static) {
        let type_id = TypeId::of::<T>();
        self.overrides
            .write()
            .entry(type_id)
            .or_default()
            .push(Arc::new(apply));
        self.cache.write().remove(&type_id);
    }

    /// Adjust one property of the complex type `T`
    pub fn configure_property<T: Bindable>(
        &self,
        property: &str,
        apply: impl Fn(&mut PropertyMetadata) + Send + Sync + 'static,
    ) {
        let property = property.to_string();
        self.configure::<T>(move |metadata| {
            if let ModelKind::Complex(complex) = &mut metadata.kind {
                for candidate in complex.properties.iter_mut() {
                    if candidate.name == property {
                        apply(Arc::make_mut(candidate));
                    }
                }
            }
        });
    }
}

macro_rules! scalar_bindable {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Bindable for $ty {
                fn describe() -> ModelMetadata {
                    ModelMetadata::scalar::<$ty>(ScalarKind::$kind)
                }
            }
        )*
    };
}

scalar_bindable! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
}

impl<T: Bindable> Bindable for Option<T> {
    fn describe() -> ModelMetadata {
        let mut metadata = T::describe();
        metadata.type_id = TypeId::of::<Option<T>>();
        metadata.is_nullable = true;
        metadata
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn describe() -> ModelMetadata {
        let element = ModelTypeRef::of::<T>();
        ModelMetadata::new::<Vec<T>>(
            "List",
            ModelKind::Collection {
                element,
                read_only: false,
            },
        )
    }
}

impl<T: Bindable> Bindable for Box<[T]> {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<Box<[T]>>("Array", ModelKind::Array(ModelTypeRef::of::<T>()))
    }
}

impl<K: Bindable, V: Bindable, S: 'static> Bindable for HashMap<K, V, S> {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<HashMap<K, V, S>>(
            "Dictionary",
            ModelKind::Dictionary {
                key: ModelTypeRef::of::<K>(),
                value: ModelTypeRef::of::<V>(),
            },
        )
    }
}

impl<K: Bindable, V: Bindable> Bindable for std::collections::BTreeMap<K, V> {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<std::collections::BTreeMap<K, V>>(
            "Dictionary",
            ModelKind::Dictionary {
                key: ModelTypeRef::of::<K>(),
                value: ModelTypeRef::of::<V>(),
            },
        )
    }
}

impl Bindable for folio_core::FormFile {
    fn describe() -> ModelMetadata {
        ModelMetadata::new::<folio_core::FormFile>("FormFile", ModelKind::FormFile)
            .with_binding_source(BindingSource::FormFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Person {
        name: Option<String>,
        age: i32,
    }

    impl Bindable for Person {
        fn describe() -> ModelMetadata {
            ModelMetadata::complex::<Person>(
                "Person",
                vec![
                    PropertyMetadata::new::<Option<String>>("Name").required(),
                    PropertyMetadata::new::<i32>("Age"),
                ],
            )
        }
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(ScalarKind::I32.convert(" 12 ").unwrap(), Value::from(12));
        assert_eq!(ScalarKind::Bool.convert("True").unwrap(), Value::Bool(true));
        assert_eq!(ScalarKind::Char.convert("x").unwrap(), Value::from("x"));
        assert!(ScalarKind::I32.convert("abcd").is_err());
        assert!(ScalarKind::U8.convert("256").is_err());
        assert!(ScalarKind::F64.convert("NaN").is_err());
        assert_eq!(ScalarKind::String.convert(" a ").unwrap(), Value::from(" a "));
    }

    #[test]
    fn test_scalar_type_names() {
        assert_eq!(i32::describe().type_name, "Int32");
        assert_eq!(f64::describe().type_name, "Double");
        assert_eq!(bool::describe().type_name, "Boolean");
    }

    #[test]
    fn test_option_is_nullable() {
        let metadata = Option::<i32>::describe();
        assert!(metadata.is_nullable);
        assert!(metadata.is_simple());
        assert_eq!(metadata.default_value(), Value::Null);
        assert_eq!(i32::describe().default_value(), Value::from(0));
    }

    #[test]
    fn test_complex_default_value() {
        let metadata = Person::describe();
        let complex = metadata.complex_type().unwrap();
        assert_eq!(complex.properties.len(), 2);
        assert_eq!((complex.create)(), serde_json::json!({"Name": null, "Age": 0}));
        assert_eq!(complex.property("Name").unwrap().binding_info.validators.len(), 1);
    }

    #[test]
    fn test_greedy_sources() {
        assert!(BindingSource::Body.is_greedy());
        assert!(BindingSource::Services.is_greedy());
        assert!(!BindingSource::Query.is_greedy());
        assert!(BindingSource::ModelBinding.can_accept(&BindingSource::Route));
        assert!(!BindingSource::Query.can_accept(&BindingSource::Form));
    }

    #[test]
    fn test_provider_caches_metadata() {
        let provider = MetadataProvider::new();
        let first = provider.get_for::<Person>();
        let second = provider.get_for::<Person>();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_configure_property_overrides() {
        let provider = MetadataProvider::new();
        provider.configure_property::<Person>("Age", |p| {
            p.binding_info.is_binding_required = true;
        });

        let metadata = provider.get_for::<Person>();
        let age = metadata.complex_type().unwrap().property("Age").unwrap();
        assert!(age.binding_info.is_binding_required);
    }

    #[test]
    fn test_property_builders() {
        let property = PropertyMetadata::new::<String>("Name")
            .model_name("customer_name")
            .from_query()
            .display_name("Customer name")
            .bind_required();

        assert_eq!(property.field_name(), "customer_name");
        assert_eq!(property.display(), "Customer name");
        assert_eq!(property.binding_info.binding_source, Some(BindingSource::Query));
        assert!(property.binding_info.is_binding_required);
    }
}
