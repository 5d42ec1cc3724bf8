//! Immutable service registry.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::services::ServiceError;

pub(crate) type SharedService = Arc<dyn Any + Send + Sync>;

/// Capability identifiers mapped to shared provider instances.
///
/// Built once by [`ServiceCollection::build`](super::ServiceCollection::build)
/// and never mutated afterwards. Typed lookups use the type name as the
/// identifier; named lookups use whatever name the binding was registered under.
#[derive(Default)]
pub struct ServiceRegistry {
    bindings: HashMap<String, SharedService>,
    hosted_tasks: Vec<String>,
}

impl ServiceRegistry {
    pub(crate) fn new(bindings: HashMap<String, SharedService>) -> Self {
        Self {
            bindings,
            hosted_tasks: Vec::new(),
        }
    }

    pub(crate) fn set_hosted_tasks(&mut self, names: Vec<String>) {
        self.hosted_tasks = names;
    }

    /// Resolve the instance registered for type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_named(type_name::<T>())
    }

    /// Resolve the instance registered under `name`, if it is a `T`.
    pub fn get_named<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.bindings.get(name)?.clone().downcast::<T>().ok()
    }

    /// Like [`get`](Self::get), but a missing binding is an error.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ServiceError> {
        self.require_named(type_name::<T>())
    }

    pub fn require_named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ServiceError> {
        let service = self
            .bindings
            .get(name)
            .ok_or_else(|| ServiceError::Missing(name.to_string()))?;
        service
            .clone()
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Registered binding names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of service bindings (hosted tasks are not counted).
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Names of the hosted tasks instantiated from this registry, in start order.
    pub fn hosted_tasks(&self) -> &[String] {
        &self.hosted_tasks
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("bindings", &self.names())
            .field("hosted_tasks", &self.hosted_tasks)
            .finish()
    }
}
