//! Value providers
//!
//! A value provider answers two questions for the binders: does any key
//! start with a given prefix, and which raw values are stored under a key.
//! Keys are matched ignoring ASCII case. The [`CompositeValueProvider`]
//! consults its members in order, so earlier sources win.

use crate::metadata::BindingSource;
use crate::names::key_matches_prefix;
use folio_core::{Error, FormCollection, HttpRequest};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Raw values found under one key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueProviderResult {
    values: Vec<String>,
}

impl ValueProviderResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn single(value: impl Into<String>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    pub fn is_none(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Raw value as recorded in model state: a string, or an array of strings
    pub fn raw_value(&self) -> Option<Value> {
        match self.values.as_slice() {
            [] => None,
            [single] => Some(Value::String(single.clone())),
            many => Some(Value::Array(
                many.iter().cloned().map(Value::String).collect(),
            )),
        }
    }
}

impl fmt::Display for ValueProviderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values.join(","))
    }
}

/// A source of raw request values
pub trait ValueProvider: Send + Sync {
    fn contains_prefix(&self, prefix: &str) -> bool;

    fn get_value(&self, key: &str) -> ValueProviderResult;

    /// Immediate children of `prefix`, mapping the child key (`key0` for
    /// `prefix[key0]`, `Name` for `prefix.Name`) to its full model name.
    fn get_keys_from_prefix(&self, _prefix: &str) -> IndexMap<String, String> {
        IndexMap::new()
    }

    fn binding_source(&self) -> Option<&BindingSource> {
        None
    }
}

/// Values keyed by name, built from query, form, route or header data
pub struct KeyValueProvider {
    source: BindingSource,
    /// Lower-cased key to (original key, values), in first-seen order
    values: IndexMap<String, (String, Vec<String>)>,
}

impl KeyValueProvider {
    pub fn new<I, K, V>(source: BindingSource, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: IndexMap<String, (String, Vec<String>)> = IndexMap::new();
        for (key, value) in pairs {
            let key = key.into();
            values
                .entry(key.to_ascii_lowercase())
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push(value.into());
        }
        Self { source, values }
    }

    pub fn query(request: &HttpRequest) -> Self {
        Self::new(BindingSource::Query, request.query_pairs())
    }

    pub fn form(form: &FormCollection) -> Self {
        Self::new(BindingSource::Form, form.fields.iter().cloned())
    }

    pub fn route(route_values: &HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = route_values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        Self::new(BindingSource::Route, pairs)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueProvider for KeyValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return !self.values.is_empty();
        }
        self.values
            .values()
            .any(|(key, _)| key_matches_prefix(key, prefix))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(|(_, values)| ValueProviderResult::new(values.clone()))
            .unwrap_or_default()
    }

    fn get_keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        let mut children = IndexMap::new();
        for (key, _) in self.values.values() {
            if let Some((child, full)) = child_key(key, prefix) {
                children.entry(child).or_insert(full);
            }
        }
        children
    }

    fn binding_source(&self) -> Option<&BindingSource> {
        Some(&self.source)
    }
}

/// Split the first segment below `prefix` off `key`
fn child_key(key: &str, prefix: &str) -> Option<(String, String)> {
    if prefix.is_empty() {
        if let Some(rest) = key.strip_prefix('[') {
            let close = rest.find(']')?;
            return Some((rest[..close].to_string(), key[..close + 2].to_string()));
        }
        let end = key.find(['.', '[']).unwrap_or(key.len());
        let segment = &key[..end];
        return (!segment.is_empty()).then(|| (segment.to_string(), segment.to_string()));
    }

    let head = key.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &key[prefix.len()..];

    if let Some(after_dot) = rest.strip_prefix('.') {
        let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
        let segment = &after_dot[..end];
        if segment.is_empty() {
            return None;
        }
        Some((segment.to_string(), format!("{}.{}", prefix, segment)))
    } else if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = after_bracket.find(']')?;
        let segment = &after_bracket[..close];
        Some((segment.to_string(), format!("{}[{}]", prefix, segment)))
    } else {
        None
    }
}

/// Ordered set of value providers consulted as one
#[derive(Clone, Default)]
pub struct CompositeValueProvider {
    providers: Vec<Arc<dyn ValueProvider>>,
}

impl CompositeValueProvider {
    pub fn new(providers: Vec<Arc<dyn ValueProvider>>) -> Self {
        Self { providers }
    }

    /// The default providers for a request: form, then route, then query
    pub fn from_request(request: &HttpRequest, form: &FormCollection) -> Self {
        Self::new(vec![
            Arc::new(KeyValueProvider::form(form)),
            Arc::new(KeyValueProvider::route(&request.route_values)),
            Arc::new(KeyValueProvider::query(request)),
        ])
    }

    /// A provider holding exactly one key
    pub fn single(source: BindingSource, key: &str, values: Vec<String>) -> Self {
        let pairs = values.into_iter().map(|v| (key.to_string(), v));
        Self::new(vec![Arc::new(KeyValueProvider::new(source, pairs))])
    }

    pub fn push(&mut self, provider: Arc<dyn ValueProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Keep only the providers that can serve `source`
    pub fn filter(&self, source: &BindingSource) -> Self {
        Self {
            providers: self
                .providers
                .iter()
                .filter(|p| p.binding_source().is_some_and(|s| source.can_accept(s)))
                .cloned()
                .collect(),
        }
    }
}

impl ValueProvider for CompositeValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.providers.iter().any(|p| p.contains_prefix(prefix))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.providers
            .iter()
            .map(|p| p.get_value(key))
            .find(|result| !result.is_none())
            .unwrap_or_default()
    }

    fn get_keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        self.providers
            .iter()
            .map(|p| p.get_keys_from_prefix(prefix))
            .find(|keys| !keys.is_empty())
            .unwrap_or_default()
    }
}

impl fmt::Debug for CompositeValueProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<_> = self
            .providers
            .iter()
            .map(|p| p.binding_source().cloned())
            .collect();
        f.debug_struct("CompositeValueProvider")
            .field("sources", &sources)
            .finish()
    }
}

/// Build the default providers for a request, parsing its form body
pub fn request_value_provider(request: &HttpRequest) -> Result<CompositeValueProvider, Error> {
    let form = request.form()?;
    Ok(CompositeValueProvider::from_request(request, &form))
}
