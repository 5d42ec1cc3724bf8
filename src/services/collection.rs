//! Mutable builder for the service registry.

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::services::registry::{ServiceRegistry, SharedService};
use crate::services::ServiceError;
use crate::tasks::BackgroundTask;

type TaskFactory =
    Box<dyn FnOnce(&ServiceRegistry) -> anyhow::Result<Arc<dyn BackgroundTask>> + Send>;

/// Service bindings and hosted-task factories collected during start-up.
///
/// Consumed by [`build`](Self::build), which freezes the bindings into a
/// [`ServiceRegistry`] and then instantiates every hosted task against it.
#[derive(Default)]
pub struct ServiceCollection {
    bindings: Vec<(String, SharedService)>,
    hosted: Vec<TaskFactory>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `instance` under its type name.
    pub fn add<T: Any + Send + Sync>(self, instance: T) -> Self {
        self.add_shared(Arc::new(instance))
    }

    /// Bind an already shared instance under its type name.
    pub fn add_shared<T: Any + Send + Sync>(mut self, instance: Arc<T>) -> Self {
        self.bindings.push((type_name::<T>().to_string(), instance));
        self
    }

    /// Bind `instance` under an explicit name.
    pub fn add_named<T: Any + Send + Sync>(mut self, name: impl Into<String>, instance: T) -> Self {
        self.bindings.push((name.into(), Arc::new(instance)));
        self
    }

    /// Register a long-running task, created from the finished registry.
    pub fn add_hosted_task<T, F>(mut self, factory: F) -> Self
    where
        T: BackgroundTask + 'static,
        F: FnOnce(&ServiceRegistry) -> anyhow::Result<T> + Send + 'static,
    {
        self.hosted.push(Box::new(move |registry: &ServiceRegistry| {
            let task = factory(registry)?;
            Ok(Arc::new(task) as Arc<dyn BackgroundTask>)
        }));
        self
    }

    /// Binding names in registration order; duplicates appear once per registration.
    pub fn service_names(&self) -> Vec<&str> {
        self.bindings.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn hosted_task_count(&self) -> usize {
        self.hosted.len()
    }

    /// Total registrations, bindings plus hosted tasks.
    pub fn len(&self) -> usize {
        self.bindings.len() + self.hosted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the bindings and instantiate hosted tasks.
    ///
    /// A later binding for the same name replaces an earlier one. Two hosted
    /// tasks reporting the same name are rejected.
    pub fn build(self) -> Result<(ServiceRegistry, Vec<Arc<dyn BackgroundTask>>), ServiceError> {
        let mut bindings: HashMap<String, SharedService> = HashMap::new();
        for (name, service) in self.bindings {
            if bindings.insert(name.clone(), service).is_some() {
                tracing::debug!(service = %name, "Service binding replaced");
            }
        }

        let mut registry = ServiceRegistry::new(bindings);
        let mut tasks = Vec::with_capacity(self.hosted.len());
        let mut names = Vec::with_capacity(self.hosted.len());
        let mut seen = HashSet::new();

        for (index, factory) in self.hosted.into_iter().enumerate() {
            let task = factory(&registry).map_err(|e| ServiceError::Factory {
                index,
                reason: format!("{:#}", e),
            })?;
            let name = task.name().to_string();
            if !seen.insert(name.clone()) {
                return Err(ServiceError::DuplicateTask(name));
            }
            names.push(name);
            tasks.push(task);
        }

        registry.set_hosted_tasks(names);
        Ok((registry, tasks))
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("bindings", &self.service_names())
            .field("hosted_tasks", &self.hosted.len())
            .finish()
    }
}
