// Service container consulted by services-sourced binding

use crate::Error;
use crate::logging::{debug, trace};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Marker for types that can be registered as services
pub trait Provider: Send + Sync + 'static {}

/// Type-erased service instance
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// The service container
#[derive(Clone)]
pub struct Container {
    providers: Arc<RwLock<HashMap<TypeId, ServiceInstance>>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new service container");
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a provider instance
    pub fn register<T: Provider>(&self, instance: T) {
        let type_name = std::any::type_name::<T>();
        self.providers
            .write()
            .insert(TypeId::of::<T>(), Arc::new(instance));

        debug!(provider = type_name, "Provider registered in container");
    }

    /// Register a provider using a factory function
    pub fn register_factory<T: Provider, F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        debug!(
            provider = std::any::type_name::<T>(),
            "Creating provider from factory"
        );
        self.register(factory());
    }

    /// Resolve a provider by type
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>, Error> {
        let type_name = std::any::type_name::<T>();
        self.resolve_by_id(TypeId::of::<T>(), type_name)?
            .downcast::<T>()
            .map_err(|_| Error::DependencyInjection(format!("Type mismatch for {}", type_name)))
    }

    /// Resolve a type-erased provider, naming it in the error when missing
    pub fn resolve_by_id(&self, type_id: TypeId, type_name: &str) -> Result<ServiceInstance, Error> {
        trace!(provider = type_name, "Attempting to resolve provider");
        let result = self
            .providers
            .read()
            .get(&type_id)
            .cloned()
            .ok_or_else(|| {
                Error::ProviderNotFound(format!(
                    "No service for type '{}' has been registered.",
                    type_name
                ))
            });

        match &result {
            Ok(_) => debug!(provider = type_name, "Provider resolved successfully"),
            Err(_) => debug!(provider = type_name, "Provider not found in container"),
        }
        result
    }

    /// Check if a provider is registered
    pub fn has<T: Provider>(&self) -> bool {
        self.providers.read().contains_key(&TypeId::of::<T>())
    }

    /// Clear all providers
    pub fn clear(&self) {
        let mut providers = self.providers.write();
        let count = providers.len();
        providers.clear();

        debug!(provider_count = count, "Cleared all providers from container");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
