//! The binding container
//!
//! The `Container` owns the binding registry and drives resolution. Typed
//! registration methods erase into keyed bindings; resolution walks the
//! registry, chasing aliases and re-entering itself for nested dependencies.

use crate::binding::AnyBinding;
use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::metadata::{AnyInstance, InjectionPlan, MetadataProvider, NoMetadata};
use crate::registry::{BindingRegistry, Memento};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Keys already visited by alias delegation within one resolution.
///
/// Fresh per public resolve call; threaded only through the alias-chasing
/// path. Nested dependency resolutions start their own trace, so only alias
/// chains - not constructor graphs - are loop-guarded.
#[derive(Default)]
pub(crate) struct AliasTrace {
    visited: Vec<ServiceKey>,
}

impl AliasTrace {
    /// Record a key; `false` if it was already visited.
    fn enter(&mut self, key: ServiceKey) -> bool {
        if self.visited.contains(&key) {
            return false;
        }
        self.visited.push(key);
        true
    }

    fn as_slice(&self) -> &[ServiceKey] {
        &self.visited
    }
}

/// Registry of type bindings with alias chasing, singleton lifecycles, and
/// reversible snapshots.
///
/// Cloning a `Container` is cheap and shares the registry, so producers can
/// capture one and resolve recursively.
///
/// # Examples
///
/// ```rust
/// use bindery::Container;
///
/// struct Config {
///     debug: bool,
/// }
///
/// let container = Container::new();
/// container.instance::<Config, _>(Config { debug: true });
///
/// let config = container.resolve::<Config>().unwrap();
/// assert!(config.debug);
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<BindingRegistry>,
    metadata: Arc<dyn MetadataProvider>,
}

impl Container {
    /// Create a container with no metadata provider.
    ///
    /// Factory and instance bindings are fully usable; class bindings fail
    /// with [`DiError::MetadataUnavailable`] since nothing can describe how
    /// to construct them.
    #[inline]
    pub fn new() -> Self {
        Self::with_metadata(Arc::new(NoMetadata))
    }

    /// Create a container backed by a metadata provider.
    pub fn with_metadata(metadata: Arc<dyn MetadataProvider>) -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "bindery", "Creating new container");

        Self {
            registry: Arc::new(BindingRegistry::new()),
            metadata,
        }
    }

    /// Look up the injection plan for a key.
    pub(crate) fn plan_for(&self, key: ServiceKey) -> Option<Arc<InjectionPlan>> {
        self.metadata.plan_for(key)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a class binding: resolving `A` builds a `C` through the
    /// injection pipeline - or, when `C` differs from `A` and is itself
    /// bound, delegates to `C`'s binding (aliasing).
    ///
    /// Overwrites any existing binding for `A`.
    #[inline]
    pub fn bind<A: ?Sized + 'static, C: ?Sized + 'static>(&self) {
        self.bind_with_args::<A, C>(Vec::new());
    }

    /// [`Container::bind`] with extra constructor arguments, appended after
    /// the injected parameters on every build.
    pub fn bind_with_args<A: ?Sized + 'static, C: ?Sized + 'static>(
        &self,
        extra_args: Vec<AnyInstance>,
    ) {
        self.register(
            AnyBinding::class(ServiceKey::of::<A>(), ServiceKey::of::<C>(), extra_args),
            "class",
        );
    }

    /// Register a factory binding: resolving `A` calls `produce` with this
    /// container; no injection pipeline runs.
    pub fn bind_factory<A: ?Sized + 'static, T, F>(&self, produce: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(
            AnyBinding::factory(
                ServiceKey::of::<A>(),
                Box::new(move |container| {
                    produce(container).map(|value| Arc::new(value) as AnyInstance)
                }),
            ),
            "factory",
        );
    }

    /// Register a pre-built value: resolving `A` returns it unconditionally,
    /// preserving reference identity.
    #[inline]
    pub fn instance<A: ?Sized + 'static, T: Send + Sync + 'static>(&self, value: T) {
        self.instance_shared::<A, T>(Arc::new(value));
    }

    /// [`Container::instance`] taking an `Arc` the caller keeps a handle to.
    pub fn instance_shared<A: ?Sized + 'static, T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.register(
            AnyBinding::instance(ServiceKey::of::<A>(), value as AnyInstance),
            "instance",
        );
    }

    /// [`Container::bind`], wrapped so the first resolution is cached and
    /// every later resolution returns the same instance.
    #[inline]
    pub fn singleton<A: ?Sized + 'static, C: ?Sized + 'static>(&self) {
        self.singleton_with_args::<A, C>(Vec::new());
    }

    /// [`Container::bind_with_args`] with singleton caching.
    pub fn singleton_with_args<A: ?Sized + 'static, C: ?Sized + 'static>(
        &self,
        extra_args: Vec<AnyInstance>,
    ) {
        self.register(
            AnyBinding::singleton(AnyBinding::class(
                ServiceKey::of::<A>(),
                ServiceKey::of::<C>(),
                extra_args,
            )),
            "singleton",
        );
    }

    /// [`Container::bind_factory`] with singleton caching: `produce` runs at
    /// most once.
    pub fn singleton_factory<A: ?Sized + 'static, T, F>(&self, produce: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(
            AnyBinding::singleton(AnyBinding::factory(
                ServiceKey::of::<A>(),
                Box::new(move |container| {
                    produce(container).map(|value| Arc::new(value) as AnyInstance)
                }),
            )),
            "singleton-factory",
        );
    }

    fn register(&self, binding: AnyBinding, kind: &'static str) {
        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            key = binding.service_key().name(),
            kind = kind,
            bound = self.registry.len() + 1,
            "Registering binding"
        );
        #[cfg(not(feature = "logging"))]
        let _ = kind;

        self.registry.insert(binding);
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `T` under its own key.
    ///
    /// Fails with [`DiError::NotBound`] when unregistered and
    /// [`DiError::TypeMismatch`] when the binding produces something other
    /// than a `T` (an alias chain can end in a different concrete type; use
    /// [`Container::resolve_as`] or [`Container::resolve_key`] for those).
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_as::<T, T>()
    }

    /// Resolve under the key of `A`, downcasting the product to `T`.
    pub fn resolve_as<A: ?Sized + 'static, T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = ServiceKey::of::<A>();
        self.resolve_key(key)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }

    /// Resolve a key to its type-erased product.
    pub fn resolve_key(&self, key: ServiceKey) -> Result<AnyInstance> {
        #[cfg(feature = "logging")]
        trace!(target: "bindery", key = key.name(), "Resolving");

        let mut visited = AliasTrace::default();
        self.resolve_traced(key, &mut visited)
    }

    /// Resolution with the caller's alias trace; the entry point for alias
    /// delegation from class bindings.
    pub(crate) fn resolve_traced(
        &self,
        key: ServiceKey,
        visited: &mut AliasTrace,
    ) -> Result<AnyInstance> {
        if !visited.enter(key) {
            #[cfg(feature = "logging")]
            debug!(
                target: "bindery",
                key = key.name(),
                "Alias chain revisited a key"
            );
            return Err(DiError::cyclic_alias(key, visited.as_slice()));
        }

        // Clone the binding out so no registry guard is held while it runs;
        // resolution re-enters this container.
        let binding = self
            .registry
            .get(&key)
            .ok_or_else(|| DiError::not_bound(key))?;
        binding.resolve(self, visited)
    }

    /// Try to resolve, returning `None` on any failure.
    #[inline]
    pub fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    // =========================================================================
    // Registry queries and maintenance
    // =========================================================================

    /// Check whether `A` is bound.
    #[inline]
    pub fn is_bound<A: ?Sized + 'static>(&self) -> bool {
        self.is_bound_key(ServiceKey::of::<A>())
    }

    /// Check whether a key is bound.
    #[inline]
    pub fn is_bound_key(&self, key: ServiceKey) -> bool {
        self.registry.contains(&key)
    }

    /// Remove the binding for `A`; `false` (not an error) when absent.
    #[inline]
    pub fn unbind<A: ?Sized + 'static>(&self) -> bool {
        self.unbind_key(ServiceKey::of::<A>())
    }

    /// Remove the binding for a key; `false` (not an error) when absent.
    pub fn unbind_key(&self, key: ServiceKey) -> bool {
        let removed = self.registry.remove(&key);

        #[cfg(feature = "logging")]
        if removed {
            debug!(target: "bindery", key = key.name(), "Unbound");
        }

        removed
    }

    /// Number of bindings in the registry.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// All bound keys.
    #[inline]
    pub fn bound_keys(&self) -> Vec<ServiceKey> {
        self.registry.keys()
    }

    // =========================================================================
    // Memento
    // =========================================================================

    /// Snapshot the registry.
    ///
    /// The snapshot's key set is unaffected by later `bind`/`unbind` calls on
    /// the live container.
    pub fn save(&self) -> Memento {
        let memento = self.registry.snapshot();

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            bound = memento.len(),
            "Saved registry snapshot"
        );

        memento
    }

    /// Replace the registry's contents wholesale with a snapshot's.
    ///
    /// Afterward `is_bound`/`resolve` behave exactly as they did at
    /// [`Container::save`] time for every key the snapshot captured.
    pub fn restore(&self, memento: &Memento) {
        self.registry.restore(memento);

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            bound = memento.len(),
            "Restored registry snapshot"
        );
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bound", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Database {
        url: String,
    }

    #[test]
    fn test_instance_identity_preserved() {
        let container = Container::new();
        container.instance::<Database, _>(Database { url: "test".into() });

        let a = container.resolve::<Database>().unwrap();
        let b = container.resolve::<Database>().unwrap();
        assert_eq!(a.url, "test");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unbound_key_errors() {
        let container = Container::new();
        let err = container.resolve::<Database>().unwrap_err();
        assert!(matches!(err, DiError::NotBound { .. }));
    }

    #[test]
    fn test_factory_runs_per_resolve() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        struct Stamp(u32);

        let container = Container::new();
        container.bind_factory::<Stamp, _, _>(|_| {
            Ok(Stamp(COUNTER.fetch_add(1, Ordering::SeqCst)))
        });

        let a = container.resolve::<Stamp>().unwrap();
        let b = container.resolve::<Stamp>().unwrap();
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn test_singleton_factory_runs_once() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        struct Expensive;

        let container = Container::new();
        container.singleton_factory::<Expensive, _, _>(|_| {
            COUNTER.fetch_add(1, Ordering::SeqCst);
            Ok(Expensive)
        });

        assert_eq!(COUNTER.load(Ordering::SeqCst), 0);
        let a = container.resolve::<Expensive>().unwrap();
        let b = container.resolve::<Expensive>().unwrap();
        assert_eq!(COUNTER.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_resolves_nested_dependencies() {
        struct Repo {
            url: String,
        }

        let container = Container::new();
        container.instance::<Database, _>(Database { url: "db://x".into() });
        container.bind_factory::<Repo, _, _>(|c| {
            let db = c.resolve::<Database>()?;
            Ok(Repo {
                url: db.url.clone(),
            })
        });

        let repo = container.resolve::<Repo>().unwrap();
        assert_eq!(repo.url, "db://x");
    }

    #[test]
    fn test_alias_chain_collapses_to_final_target() {
        struct Abstract;
        struct MoreAbstract;

        let container = Container::new();
        let original = Arc::new(Database { url: "real".into() });
        container.instance_shared::<Database, _>(Arc::clone(&original));
        container.bind::<Abstract, Database>();
        container.bind::<MoreAbstract, Abstract>();

        let resolved = container.resolve_as::<MoreAbstract, Database>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &original));
    }

    #[test]
    fn test_cyclic_alias_detected() {
        struct Left;
        struct Right;

        let container = Container::new();
        container.bind::<Left, Right>();
        container.bind::<Right, Left>();

        let err = container.resolve_key(ServiceKey::of::<Left>()).unwrap_err();
        match err {
            DiError::CyclicAlias { chain, .. } => {
                assert!(chain.contains("Left"));
                assert!(chain.contains("Right"));
            }
            other => panic!("expected CyclicAlias, got {other}"),
        }
    }

    #[test]
    fn test_rebind_replaces() {
        let container = Container::new();
        container.instance::<Database, _>(Database { url: "old".into() });
        container.instance::<Database, _>(Database { url: "new".into() });

        assert_eq!(container.len(), 1);
        assert_eq!(container.resolve::<Database>().unwrap().url, "new");
    }

    #[test]
    fn test_unbind_is_noop_when_absent() {
        let container = Container::new();
        assert!(!container.unbind::<Database>());

        container.instance::<Database, _>(Database { url: "x".into() });
        assert!(container.unbind::<Database>());
        assert!(!container.is_bound::<Database>());
    }

    #[test]
    fn test_memento_round_trip() {
        struct Kept;
        struct Added;
        struct Dropped;

        let container = Container::new();
        container.instance::<Kept, _>(1u8);
        container.instance::<Dropped, _>(2u8);

        let memento = container.save();

        container.instance::<Added, _>(3u8);
        container.unbind::<Dropped>();

        container.restore(&memento);
        assert!(container.is_bound::<Kept>());
        assert!(container.is_bound::<Dropped>());
        assert!(!container.is_bound::<Added>());
    }

    #[test]
    fn test_type_mismatch_on_typed_resolve() {
        #[derive(Debug)]
        struct Marker;

        let container = Container::new();
        container.instance::<Marker, _>(Database { url: "x".into() });

        let err = container.resolve::<Marker>().unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));

        let ok = container.resolve_as::<Marker, Database>().unwrap();
        assert_eq!(ok.url, "x");
    }

    #[test]
    fn test_class_binding_without_metadata_fails() {
        #[derive(Debug)]
        struct Plain;

        let container = Container::new();
        container.bind::<Plain, Plain>();

        let err = container.resolve::<Plain>().unwrap_err();
        assert!(matches!(err, DiError::MetadataUnavailable { .. }));
    }
}
