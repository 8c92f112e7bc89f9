//! Wiring already-constructed instances through the injection pipeline
//!
//! The container normally drives the whole lifecycle of an object. This
//! boundary layer covers the other direction: an object built by ordinary
//! means gets its properties and methods injected after the fact.
//!
//! The [`AutowireRegistry`] is an explicit object with an explicit lifecycle -
//! create it, give it a default container (and per-type overrides where
//! needed), and pass it to whatever code performs post-construction wiring.
//! There is no process-wide default.
//!
//! # Example
//!
//! ```rust
//! use bindery::{AutowireRegistry, Container, InjectionPlan, MetadataRegistry};
//! use std::sync::Arc;
//!
//! struct Clock {
//!     ticks: u64,
//! }
//!
//! #[derive(Default)]
//! struct Dashboard {
//!     ticks: u64,
//! }
//!
//! let metadata = MetadataRegistry::new().with(
//!     InjectionPlan::for_type::<Dashboard>()
//!         .property::<Clock, _>("ticks", |dash, clock| dash.ticks = clock.ticks)
//!         .finish(),
//! );
//! let container = Container::with_metadata(Arc::new(metadata));
//! container.instance::<Clock, _>(Clock { ticks: 42 });
//!
//! let mut registry = AutowireRegistry::new();
//! registry.set_default_container(container);
//!
//! // Built outside the container, wired afterward.
//! let dashboard = registry.wire(Dashboard::default()).unwrap();
//! assert_eq!(dashboard.ticks, 42);
//! ```

use crate::builder::InstanceBuilderFactory;
use crate::container::Container;
use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::metadata::AnyInstance;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Maps types to the container that wires them.
///
/// Lookup order: the per-type container if one was set, otherwise the
/// default. No container at all fails with [`DiError::NoContainer`].
#[derive(Default)]
pub struct AutowireRegistry {
    default: Option<Container>,
    per_type: HashMap<ServiceKey, Container>,
}

impl AutowireRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container used for types without a per-type override.
    pub fn set_default_container(&mut self, container: Container) {
        #[cfg(feature = "logging")]
        debug!(target: "bindery", "Autowire default container set");

        self.default = Some(container);
    }

    /// Set the container used for `T`, overriding the default.
    pub fn set_container_for<T: ?Sized + 'static>(&mut self, container: Container) {
        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            key = ServiceKey::of::<T>().name(),
            "Autowire per-type container set"
        );

        self.per_type.insert(ServiceKey::of::<T>(), container);
    }

    /// The container that would wire `key`, if any.
    pub fn container_for(&self, key: ServiceKey) -> Option<&Container> {
        self.per_type.get(&key).or(self.default.as_ref())
    }

    /// Run property and method injection on an instance constructed outside
    /// the container.
    ///
    /// Re-enters the pipeline at the adopt stage; the instance's plan must be
    /// known to the wiring container's metadata provider.
    pub fn wire<T: Send + Sync + 'static>(&self, instance: T) -> Result<Arc<T>> {
        let key = ServiceKey::of::<T>();
        let container = self
            .container_for(key)
            .ok_or(DiError::NoContainer { key })?;

        let mut builder = InstanceBuilderFactory::create(container, key)?;
        let product = builder
            .adopt(Box::new(instance))?
            .inject_properties()?
            .inject_methods()?
            .product()?;

        product
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }

    /// Constructor-injection opt-in: run the full pipeline, including
    /// construction, for a type that wants container-driven creation without
    /// being bound.
    ///
    /// `extra` is appended after the injected constructor parameters.
    pub fn construct<T: Send + Sync + 'static>(&self, extra: &[AnyInstance]) -> Result<Arc<T>> {
        let key = ServiceKey::of::<T>();
        let container = self
            .container_for(key)
            .ok_or(DiError::NoContainer { key })?;

        let mut builder = InstanceBuilderFactory::create(container, key)?;
        let product = builder
            .construct(extra)?
            .inject_properties()?
            .inject_methods()?
            .product()?;

        product
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }
}

impl std::fmt::Debug for AutowireRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutowireRegistry")
            .field("has_default", &self.default.is_some())
            .field("per_type", &self.per_type.len())
            .finish()
    }
}
