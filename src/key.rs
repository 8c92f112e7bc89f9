//! Type-identity tokens used as registry keys
//!
//! A `ServiceKey` identifies an abstract or concrete type in the binding
//! registry. Equality and hashing use only the `TypeId`, so two keys are
//! equal exactly when they name the same Rust type.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// A unique, comparable handle identifying a type in the registry.
///
/// Keys can be taken for unsized types, which allows trait objects to stand
/// in as abstract identities:
///
/// ```rust
/// use bindery::ServiceKey;
///
/// trait Engine {}
/// struct Diesel;
///
/// let abstract_key = ServiceKey::of::<dyn Engine>();
/// let concrete_key = ServiceKey::of::<Diesel>();
/// assert_ne!(abstract_key, concrete_key);
/// assert_eq!(abstract_key, ServiceKey::of::<dyn Engine>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// Get the key for a type.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, for errors and log fields.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// Identity lives in the TypeId alone; the name is diagnostic payload.
impl PartialEq for ServiceKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
