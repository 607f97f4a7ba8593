//! Scenario state threaded between steps
//!
//! [`ScenarioState`] is a bag of named resources and named custom values.
//!
//! # Clone semantics
//!
//! Cloning copies both maps but shares every value through its `Arc`. Adding,
//! replacing or removing an entry in a clone never affects the original, which
//! is what lets discovery branch one state into many hypothetical futures.
//! The values themselves are shared: a resource's own interior state is the
//! same object in every clone, so discovery must not mutate it.

use crate::error::ResourceError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a provisioned (or to-be-provisioned) resource
///
/// The engine never inspects resources; steps downcast them through
/// [`ScenarioState::resource_as`].
pub trait Resource: Any + Send + Sync + fmt::Debug {
    /// Canonical path, e.g. `account/container/object`, used for tracking
    fn canon(&self) -> String;

    /// Access as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Deletion capability, if this resource kind supports it
    fn as_deletable(&self) -> Option<&dyn Deletable> {
        None
    }
}

/// Resources that can be torn down after a scenario
pub trait Deletable {
    /// Delete the resource and everything it contains
    ///
    /// # Errors
    /// Returns the backend failure
    fn delete(&self) -> Result<(), ResourceError>;
}

/// Shared resource handle
pub type ResourceHandle = Arc<dyn Resource>;

type CustomValue = Arc<dyn Any + Send + Sync>;

/// Named state passed from one step to the next
#[derive(Clone, Default)]
pub struct ScenarioState {
    name: String,
    resources: BTreeMap<String, ResourceHandle>,
    custom: BTreeMap<String, CustomValue>,
}

impl ScenarioState {
    /// Create an empty state
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// State name, generally the variation path accumulated so far
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the state
    #[inline]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Builder-style rename
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Resource handle by key
    #[inline]
    #[must_use]
    pub fn resource(&self, key: &str) -> Option<&ResourceHandle> {
        self.resources.get(key)
    }

    /// Resource by key, downcast to its concrete type
    #[must_use]
    pub fn resource_as<R: Resource>(&self, key: &str) -> Option<&R> {
        self.resources
            .get(key)
            .and_then(|handle| handle.as_any().downcast_ref::<R>())
    }

    /// Store a resource handle, returning the one it replaced
    pub fn set_resource(&mut self, key: impl Into<String>, resource: ResourceHandle) -> Option<ResourceHandle> {
        self.resources.insert(key.into(), resource)
    }

    /// Builder-style [`ScenarioState::set_resource`]
    #[must_use]
    pub fn with_resource(mut self, key: impl Into<String>, resource: ResourceHandle) -> Self {
        self.resources.insert(key.into(), resource);
        self
    }

    /// Remove a resource handle
    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceHandle> {
        self.resources.remove(key)
    }

    /// Iterate resources in key order
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceHandle)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Custom value by key, if present and of type `V`
    #[must_use]
    pub fn custom<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.custom.get(key).and_then(|value| value.downcast_ref::<V>())
    }

    /// Store a custom value
    pub fn set_custom<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
        self.custom.insert(key.into(), Arc::new(value));
    }

    /// Builder-style [`ScenarioState::set_custom`]
    #[must_use]
    pub fn with_custom<V: Any + Send + Sync>(mut self, key: impl Into<String>, value: V) -> Self {
        self.set_custom(key, value);
        self
    }

    /// True if a custom value is stored under `key`, whatever its type
    #[inline]
    #[must_use]
    pub fn has_custom(&self, key: &str) -> bool {
        self.custom.contains_key(key)
    }

    /// Remove a custom value
    pub fn remove_custom(&mut self, key: &str) -> bool {
        self.custom.remove(key).is_some()
    }

    /// Custom value keys in order
    pub fn custom_keys(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }
}

impl fmt::Debug for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioState")
            .field("name", &self.name)
            .field("resources", &self.resources)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
