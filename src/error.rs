//! Error types for binding registration and resolution

use crate::key::ServiceKey;
use thiserror::Error;

/// Errors that can occur while registering, resolving, or building services
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No binding is registered for the requested key
    #[error("no binding registered for {key}")]
    NotBound { key: ServiceKey },

    /// The metadata provider has no injection plan for the key, or the plan
    /// cannot construct when construction is required
    #[error("no injection metadata available for {key}")]
    MetadataUnavailable { key: ServiceKey },

    /// An alias chain revisited a key within a single resolution
    #[error("cyclic alias chain while resolving {key}: {chain}")]
    CyclicAlias { key: ServiceKey, chain: String },

    /// A builder stage was invoked before its prerequisite stage
    #[error("builder stage `{attempted}` called in state `{state}`")]
    OutOfOrderBuild {
        attempted: &'static str,
        state: &'static str,
    },

    /// The resolved value is not of the requested type
    #[error("value resolved for {key} is not a `{expected}`")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },

    /// A construct or method closure rejected its argument list
    #[error("failed to build {key}: {reason}")]
    ConstructionFailed { key: ServiceKey, reason: String },

    /// `invoke_method` was called with a name the plan does not declare
    #[error("{key} has no injectable method `{name}`")]
    UnknownMethod { key: ServiceKey, name: String },

    /// The autowire registry has no container for the key
    #[error("no container registered for autowiring {key}")]
    NoContainer { key: ServiceKey },
}

impl DiError {
    /// Create a NotBound error for a key
    #[inline]
    pub fn not_bound(key: ServiceKey) -> Self {
        Self::NotBound { key }
    }

    /// Create a MetadataUnavailable error for a key
    #[inline]
    pub fn metadata_unavailable(key: ServiceKey) -> Self {
        Self::MetadataUnavailable { key }
    }

    /// Create a CyclicAlias error from the visited-key trace
    pub fn cyclic_alias(key: ServiceKey, visited: &[ServiceKey]) -> Self {
        let mut chain = visited
            .iter()
            .map(ServiceKey::name)
            .collect::<Vec<_>>()
            .join(" -> ");
        chain.push_str(" -> ");
        chain.push_str(key.name());
        Self::CyclicAlias { key, chain }
    }

    /// Create an OutOfOrderBuild error
    #[inline]
    pub fn out_of_order(attempted: &'static str, state: &'static str) -> Self {
        Self::OutOfOrderBuild { attempted, state }
    }

    /// Create a TypeMismatch error for a key and expected type
    #[inline]
    pub fn type_mismatch<T: ?Sized>(key: ServiceKey) -> Self {
        Self::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a ConstructionFailed error
    #[inline]
    pub fn construction_failed(key: ServiceKey, reason: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            key,
            reason: reason.into(),
        }
    }
}

/// Result type alias for binding and resolution operations
pub type Result<T> = std::result::Result<T, DiError>;
