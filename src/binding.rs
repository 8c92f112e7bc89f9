//! Binding variants: the strategies that turn a key into an instance
//!
//! Every registry slot holds one [`AnyBinding`]. Using an enum instead of a
//! `Box<dyn Binding>` keeps all resolve paths visible to the optimizer and
//! avoids vtable indirection on every resolution, matching how the registry
//! is laid out.
//!
//! Variants:
//! - `Class` - build through the injection pipeline, or delegate to another
//!   binding when the concrete key is itself bound (alias chasing)
//! - `Factory` - an arbitrary producer closure receiving the container
//! - `Instance` - a pre-built value returned as-is
//! - `Singleton` - decorator caching the first result of any inner binding

use crate::builder::InstanceBuilderFactory;
use crate::container::{AliasTrace, Container};
use crate::error::Result;
use crate::key::ServiceKey;
use crate::metadata::AnyInstance;
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Type-erased producer closure for factory bindings
type ProduceFn = Box<dyn Fn(&Container) -> Result<AnyInstance> + Send + Sync>;

// =============================================================================
// Class binding
// =============================================================================

/// Binds an abstract key to a concrete key built through the pipeline.
///
/// When the concrete key differs from the abstract one and is itself bound,
/// resolution delegates to the concrete key's binding instead of building -
/// transitively, so chains of aliases collapse to their final target.
pub struct ClassBinding {
    abstract_key: ServiceKey,
    concrete_key: ServiceKey,
    extra_args: Vec<AnyInstance>,
}

impl ClassBinding {
    #[inline]
    pub(crate) fn new(
        abstract_key: ServiceKey,
        concrete_key: ServiceKey,
        extra_args: Vec<AnyInstance>,
    ) -> Self {
        Self {
            abstract_key,
            concrete_key,
            extra_args,
        }
    }

    fn resolve(&self, container: &Container, visited: &mut AliasTrace) -> Result<AnyInstance> {
        // A self-binding can never alias: "itself" is not another binding.
        if self.concrete_key != self.abstract_key && container.is_bound_key(self.concrete_key) {
            #[cfg(feature = "logging")]
            trace!(
                target: "bindery",
                abstract_key = self.abstract_key.name(),
                concrete_key = self.concrete_key.name(),
                "Alias chasing to bound concrete key"
            );

            return container.resolve_traced(self.concrete_key, visited);
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            concrete_key = self.concrete_key.name(),
            extra_args = self.extra_args.len(),
            "Building fresh instance through injection pipeline"
        );

        let mut builder = InstanceBuilderFactory::create(container, self.concrete_key)?;
        builder
            .construct(&self.extra_args)?
            .inject_properties()?
            .inject_methods()?
            .product()
    }
}

// =============================================================================
// Factory binding
// =============================================================================

/// Binds a key to a producer closure; the closure is fully responsible for
/// the value and may resolve its own dependencies through the container.
pub struct FactoryBinding {
    abstract_key: ServiceKey,
    produce: ProduceFn,
}

impl FactoryBinding {
    #[inline]
    pub(crate) fn new(abstract_key: ServiceKey, produce: ProduceFn) -> Self {
        Self {
            abstract_key,
            produce,
        }
    }

    #[inline]
    fn resolve(&self, container: &Container) -> Result<AnyInstance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            key = self.abstract_key.name(),
            "Invoking factory binding"
        );

        (self.produce)(container)
    }
}

// =============================================================================
// Instance binding
// =============================================================================

/// Binds a key to a pre-built value.
pub struct InstanceBinding {
    abstract_key: ServiceKey,
    value: AnyInstance,
}

impl InstanceBinding {
    #[inline]
    pub(crate) fn new(abstract_key: ServiceKey, value: AnyInstance) -> Self {
        Self {
            abstract_key,
            value,
        }
    }

    #[inline]
    fn resolve(&self) -> AnyInstance {
        Arc::clone(&self.value)
    }
}

// =============================================================================
// Singleton decorator
// =============================================================================

/// Caches the first successful resolution of the wrapped binding.
///
/// The inner binding runs at most once for the wrapper's lifetime; a failed
/// first resolution leaves the cell empty so a later attempt can retry.
pub struct SingletonBinding {
    inner: Box<AnyBinding>,
    cell: OnceCell<AnyInstance>,
}

impl SingletonBinding {
    #[inline]
    pub(crate) fn new(inner: AnyBinding) -> Self {
        Self {
            inner: Box::new(inner),
            cell: OnceCell::new(),
        }
    }

    fn resolve(&self, container: &Container, visited: &mut AliasTrace) -> Result<AnyInstance> {
        #[cfg(feature = "logging")]
        let first = self.cell.get().is_none();

        let value = self.cell.get_or_try_init(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "bindery",
                key = self.inner.service_key().name(),
                "Singleton resolving inner binding on first access"
            );

            self.inner.resolve(container, visited)
        })?;

        #[cfg(feature = "logging")]
        if !first {
            trace!(
                target: "bindery",
                key = self.inner.service_key().name(),
                "Singleton returning cached instance"
            );
        }

        Ok(Arc::clone(value))
    }
}

// =============================================================================
// AnyBinding - enum over the variants
// =============================================================================

/// A registered strategy for producing an instance for an abstract key.
pub(crate) enum AnyBinding {
    Class(ClassBinding),
    Factory(FactoryBinding),
    Instance(InstanceBinding),
    Singleton(SingletonBinding),
}

impl AnyBinding {
    /// Create a class binding.
    #[inline]
    pub fn class(
        abstract_key: ServiceKey,
        concrete_key: ServiceKey,
        extra_args: Vec<AnyInstance>,
    ) -> Self {
        AnyBinding::Class(ClassBinding::new(abstract_key, concrete_key, extra_args))
    }

    /// Create a factory binding.
    #[inline]
    pub fn factory(abstract_key: ServiceKey, produce: ProduceFn) -> Self {
        AnyBinding::Factory(FactoryBinding::new(abstract_key, produce))
    }

    /// Create an instance binding.
    #[inline]
    pub fn instance(abstract_key: ServiceKey, value: AnyInstance) -> Self {
        AnyBinding::Instance(InstanceBinding::new(abstract_key, value))
    }

    /// Wrap a binding in the singleton decorator.
    #[inline]
    pub fn singleton(inner: AnyBinding) -> Self {
        AnyBinding::Singleton(SingletonBinding::new(inner))
    }

    /// The abstract identity the binding was registered under.
    ///
    /// Stable even for aliases: an alias reports the key it answers for, not
    /// the key it delegates to.
    pub fn service_key(&self) -> ServiceKey {
        match self {
            AnyBinding::Class(b) => b.abstract_key,
            AnyBinding::Factory(b) => b.abstract_key,
            AnyBinding::Instance(b) => b.abstract_key,
            AnyBinding::Singleton(b) => b.inner.service_key(),
        }
    }

    /// Produce the instance, using the container as resolution context.
    pub fn resolve(&self, container: &Container, visited: &mut AliasTrace) -> Result<AnyInstance> {
        match self {
            AnyBinding::Class(b) => b.resolve(container, visited),
            AnyBinding::Factory(b) => b.resolve(container),
            AnyBinding::Instance(b) => Ok(b.resolve()),
            AnyBinding::Singleton(b) => b.resolve(container, visited),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::arg;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Dep {
        id: u32,
    }

    fn resolve(binding: &AnyBinding, container: &Container) -> AnyInstance {
        let mut visited = AliasTrace::default();
        binding.resolve(container, &mut visited).unwrap()
    }

    #[test]
    fn test_instance_binding_preserves_identity() {
        let container = Container::new();
        let binding = AnyBinding::instance(ServiceKey::of::<Dep>(), arg(Dep { id: 1 }));

        let a = resolve(&binding, &container);
        let b = resolve(&binding, &container);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_binding_runs_every_time() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        let binding = AnyBinding::factory(
            ServiceKey::of::<Dep>(),
            Box::new(|_| {
                Ok(arg(Dep {
                    id: COUNTER.fetch_add(1, Ordering::SeqCst),
                }))
            }),
        );

        let a = resolve(&binding, &container);
        let b = resolve(&binding, &container);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(COUNTER.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_singleton_invokes_inner_exactly_once() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        let binding = AnyBinding::singleton(AnyBinding::factory(
            ServiceKey::of::<Dep>(),
            Box::new(|_| {
                Ok(arg(Dep {
                    id: COUNTER.fetch_add(1, Ordering::SeqCst),
                }))
            }),
        ));

        assert_eq!(COUNTER.load(Ordering::SeqCst), 0);
        let a = resolve(&binding, &container);
        let b = resolve(&binding, &container);
        let c = resolve(&binding, &container);
        assert_eq!(COUNTER.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[test]
    fn test_service_key_reports_abstract_identity() {
        struct Abstract;

        let binding = AnyBinding::class(
            ServiceKey::of::<Abstract>(),
            ServiceKey::of::<Dep>(),
            Vec::new(),
        );
        assert_eq!(binding.service_key(), ServiceKey::of::<Abstract>());

        let singleton = AnyBinding::singleton(AnyBinding::instance(
            ServiceKey::of::<Abstract>(),
            arg(Dep { id: 0 }),
        ));
        assert_eq!(singleton.service_key(), ServiceKey::of::<Abstract>());
    }
}
