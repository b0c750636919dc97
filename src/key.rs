//! Provider keys and lifetimes
//!
//! A [`ProviderKey`] names a value the graph can hand out: the value's type
//! plus an optional qualifier, so two `String` providers can coexist as
//! `String@base_url` and `String@cache_dir`.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for types that can live in a component graph.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Identifies a requested value: type identity plus optional qualifier name.
///
/// Equality and hashing ignore `type_name`, which is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct ProviderKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<&'static str>,
}

impl ProviderKey {
    /// Key for an unqualified `T`
    #[inline]
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Key for a `T` distinguished by `qualifier`
    #[inline]
    pub fn named<T: Injectable>(qualifier: &'static str) -> Self {
        Self {
            qualifier: Some(qualifier),
            ..Self::of::<T>()
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn qualifier(&self) -> Option<&'static str> {
        self.qualifier
    }

    /// Whether this key identifies values of type `T`
    #[inline]
    pub fn is<T: Injectable>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ProviderKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for ProviderKey {}

impl Hash for ProviderKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(q) => write!(f, "{}@{}", self.type_name, q),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderKey({self})")
    }
}

/// How long a constructed value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Constructed once per scope instance, then shared by every requester
    #[default]
    Cached,

    /// Constructed on every resolve
    Transient,
}

impl Lifetime {
    #[inline]
    pub fn is_cached(self) -> bool {
        matches!(self, Lifetime::Cached)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Lifetime::Cached => "cached",
            Lifetime::Transient => "transient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qualifier_distinguishes_keys() {
        let plain = ProviderKey::of::<String>();
        let url = ProviderKey::named::<String>("base_url");
        let dir = ProviderKey::named::<String>("cache_dir");

        assert_ne!(plain, url);
        assert_ne!(url, dir);
        assert_eq!(url, ProviderKey::named::<String>("base_url"));

        let set: HashSet<_> = [plain, url, dir, url].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_same_qualifier_different_type() {
        assert_ne!(ProviderKey::named::<String>("x"), ProviderKey::named::<u64>("x"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ProviderKey::of::<u64>().to_string(), "u64");
        assert_eq!(ProviderKey::named::<u64>("cache_size").to_string(), "u64@cache_size");
    }

    #[test]
    fn test_is() {
        let key = ProviderKey::named::<u64>("cache_size");
        assert!(key.is::<u64>());
        assert!(!key.is::<u32>());
    }
}
