//! Error types for graph wiring and resolution

use crate::ProviderKey;
use thiserror::Error;

/// Errors that can occur while wiring or resolving a component graph.
///
/// All of these are configuration errors: they surface synchronously at
/// registration, `ComponentGraph::build` or `Injector::inject` time and are
/// never worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Key was registered twice in the same scope
    #[error("Provider already registered in scope '{scope}': {key}")]
    DuplicateKey { scope: &'static str, key: ProviderKey },

    /// Key is not reachable from this graph
    #[error("Unknown provider: {key}")]
    UnknownKey { key: ProviderKey },

    /// A recipe depends on a key that neither its scope nor any ancestor exposes
    #[error("Missing dependency {key} required by {required_by}")]
    MissingDependency {
        key: ProviderKey,
        required_by: ProviderKey,
    },

    /// Dependency relation contains a cycle
    #[error("Cyclic dependency detected: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<ProviderKey> },

    /// No graph in the injector's chain exposes the slot's key
    #[error("Unsatisfied injection slot '{slot}': no graph exposes {key}")]
    UnsatisfiedSlot { slot: &'static str, key: ProviderKey },

    /// A construction function asked for a key it did not declare
    #[error("{key} was not declared as a dependency of {requested_by}")]
    UndeclaredDependency {
        key: ProviderKey,
        requested_by: ProviderKey,
    },

    /// Resolved value does not have the requested type
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch {
        key: ProviderKey,
        expected: &'static str,
    },

    /// Construction function failed
    #[error("Failed to create {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },

    /// Scope declares a parent that does not match the graph it was built on
    #[error("Scope '{scope}' expects parent scope '{expected}', got {}", .actual.unwrap_or("none"))]
    ParentScopeMismatch {
        scope: &'static str,
        expected: &'static str,
        actual: Option<&'static str>,
    },

    /// Scope instance has been closed and its cache released
    #[error("Scope '{scope}' has been closed")]
    ScopeClosed { scope: &'static str },
}

impl DiError {
    /// Create an UnknownKey error
    #[inline]
    pub fn unknown(key: &ProviderKey) -> Self {
        Self::UnknownKey { key: *key }
    }

    /// Create a CreationFailed error for a type
    #[inline]
    pub fn creation_failed<T: 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for a type
    #[inline]
    pub fn type_mismatch<T: 'static>(key: &ProviderKey) -> Self {
        Self::TypeMismatch {
            key: *key,
            expected: std::any::type_name::<T>(),
        }
    }
}

fn format_cycle(cycle: &[ProviderKey]) -> String {
    let mut out = String::new();
    for key in cycle {
        out.push_str(&key.to_string());
        out.push_str(" -> ");
    }
    if let Some(first) = cycle.first() {
        out.push_str(&first.to_string());
    }
    out
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    struct A;
    #[allow(dead_code)]
    struct B;

    #[test]
    fn test_cycle_message_closes_loop() {
        let err = DiError::CyclicDependency {
            cycle: vec![ProviderKey::of::<A>(), ProviderKey::of::<B>()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Cyclic dependency detected: "));
        assert_eq!(msg.matches(" -> ").count(), 2);
        assert!(msg.ends_with(std::any::type_name::<A>()));
    }

    #[test]
    fn test_parent_mismatch_message() {
        let err = DiError::ParentScopeMismatch {
            scope: "user",
            expected: "application",
            actual: None,
        };
        assert_eq!(
            err.to_string(),
            "Scope 'user' expects parent scope 'application', got none"
        );
    }
}
