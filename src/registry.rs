//! Binding storage for the container
//!
//! Uses `DashMap` for lock-free concurrent access. Bindings are pulled out by
//! `Arc` clone so no shard guard is ever held while a binding resolves -
//! resolution re-enters the container and may touch the same shard.

use crate::binding::AnyBinding;
use crate::key::ServiceKey;
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Key→binding map owned by a container.
///
/// Uses 8 shards: binding registries stay small (tens of entries), so the
/// DashMap default of `num_cpus * 4` shards only slows creation down.
pub(crate) struct BindingRegistry {
    bindings: DashMap<ServiceKey, Arc<AnyBinding>, RandomState>,
}

impl BindingRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Insert a binding, replacing any existing binding for the key.
    #[inline]
    pub fn insert(&self, binding: AnyBinding) {
        self.bindings.insert(binding.service_key(), Arc::new(binding));
    }

    /// Fetch the binding for a key, if bound.
    #[inline]
    pub fn get(&self, key: &ServiceKey) -> Option<Arc<AnyBinding>> {
        self.bindings.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a key is bound.
    #[inline]
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Remove a binding; `false` when the key was not bound.
    #[inline]
    pub fn remove(&self, key: &ServiceKey) -> bool {
        self.bindings.remove(key).is_some()
    }

    /// Number of registered bindings.
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// All bound keys.
    pub fn keys(&self) -> Vec<ServiceKey> {
        self.bindings.iter().map(|entry| *entry.key()).collect()
    }

    /// Capture the complete key→binding mapping.
    ///
    /// Entries share the live `Arc<AnyBinding>`s; later `insert`/`remove`
    /// calls on the registry do not change the snapshot's key set.
    pub fn snapshot(&self) -> Memento {
        Memento {
            entries: self
                .bindings
                .iter()
                .map(|entry| (*entry.key(), Arc::clone(entry.value())))
                .collect(),
        }
    }

    /// Replace the registry's contents wholesale with a snapshot's.
    pub fn restore(&self, memento: &Memento) {
        self.bindings.clear();
        for (key, binding) in &memento.entries {
            self.bindings.insert(*key, Arc::clone(binding));
        }
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("count", &self.len())
            .finish()
    }
}

/// An opaque snapshot of a container's registry, taken with
/// [`Container::save`](crate::Container::save) and applied with
/// [`Container::restore`](crate::Container::restore).
///
/// Restoring makes the registry's observable contents - which keys are bound,
/// and to what - identical to the state at snapshot time. Singleton caches
/// live inside the shared bindings and are not rolled back.
pub struct Memento {
    entries: HashMap<ServiceKey, Arc<AnyBinding>>,
}

impl Memento {
    /// Number of bindings captured.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot captured an empty registry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Memento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memento")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::arg;

    struct Svc {
        value: i32,
    }

    fn instance_binding(value: i32) -> AnyBinding {
        AnyBinding::instance(ServiceKey::of::<Svc>(), arg(Svc { value }))
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = BindingRegistry::new();
        let key = ServiceKey::of::<Svc>();

        assert!(!registry.contains(&key));
        registry.insert(instance_binding(1));
        assert!(registry.contains(&key));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&key));
        assert!(!registry.contains(&key));
        assert!(!registry.remove(&key));
    }

    #[test]
    fn test_insert_replaces_slot() {
        let registry = BindingRegistry::new();
        registry.insert(instance_binding(1));
        registry.insert(instance_binding(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutation() {
        struct Other;

        let registry = BindingRegistry::new();
        registry.insert(instance_binding(1));

        let memento = registry.snapshot();
        assert_eq!(memento.len(), 1);

        registry.insert(AnyBinding::instance(ServiceKey::of::<Other>(), arg(0u8)));
        registry.remove(&ServiceKey::of::<Svc>());
        assert_eq!(memento.len(), 1);

        registry.restore(&memento);
        assert!(registry.contains(&ServiceKey::of::<Svc>()));
        assert!(!registry.contains(&ServiceKey::of::<Other>()));
    }
}
