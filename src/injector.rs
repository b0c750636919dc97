//! Slot injection
//!
//! An [`InjectionTarget`] lists its dependency slots; the [`Injector`] fills
//! each one from the nearest graph in its chain that exposes the slot's key.

use crate::recipe::downcast;
use crate::{ComponentGraph, DiError, Injectable, ProviderKey, Result, Value};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A named dependency slot holding an `Arc<T>` once injected.
pub struct Slot<T> {
    name: &'static str,
    key: ProviderKey,
    value: Option<Arc<T>>,
}

impl<T: Injectable> Slot<T> {
    /// Slot for the unqualified `T`
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            key: ProviderKey::of::<T>(),
            value: None,
        }
    }

    /// Slot for the `T` registered under `qualifier`
    #[inline]
    pub fn named(name: &'static str, qualifier: &'static str) -> Self {
        Self {
            name,
            key: ProviderKey::named::<T>(qualifier),
            value: None,
        }
    }

    /// The injected value, if `inject` has run
    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("filled", &self.value.is_some())
            .finish()
    }
}

/// Type-erased access to a slot, used by the [`Injector`].
pub trait SlotAccess {
    fn name(&self) -> &'static str;

    fn key(&self) -> &ProviderKey;

    /// Store a resolved value; fails if it is not the slot's type.
    fn fill(&mut self, value: Value) -> Result<()>;
}

impl<T: Injectable> SlotAccess for Slot<T> {
    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn key(&self) -> &ProviderKey {
        &self.key
    }

    fn fill(&mut self, value: Value) -> Result<()> {
        self.value = Some(downcast::<T>(&self.key, value)?);
        Ok(())
    }
}

/// An object with named dependency slots.
///
/// Usually implemented with [`injection_target!`](crate::injection_target).
pub trait InjectionTarget {
    fn slots(&mut self) -> Vec<&mut dyn SlotAccess>;
}

/// Implement [`InjectionTarget`] for a struct whose listed fields are [`Slot`]s.
///
/// ```rust
/// use scoped_graph::{injection_target, Slot};
///
/// struct Client;
///
/// struct MainScreen {
///     client: Slot<Client>,
///     title: String,
/// }
///
/// injection_target!(MainScreen { client });
/// ```
#[macro_export]
macro_rules! injection_target {
    ($target:ty { $($field:ident),* $(,)? }) => {
        impl $crate::InjectionTarget for $target {
            fn slots(&mut self) -> ::std::vec::Vec<&mut dyn $crate::SlotAccess> {
                ::std::vec![$(&mut self.$field as &mut dyn $crate::SlotAccess),*]
            }
        }
    };
}

/// Fills injection targets from a graph chain.
///
/// # Examples
///
/// ```rust
/// use scoped_graph::{injection_target, ComponentGraph, Injector, ProviderKey, Recipe, Scope, Slot};
///
/// struct Api;
///
/// struct Screen {
///     api: Slot<Api>,
/// }
///
/// injection_target!(Screen { api });
///
/// let mut scope = Scope::new("application");
/// scope.register(Recipe::cached::<Api>().build(|_| Ok(Api))).unwrap();
/// scope.expose(ProviderKey::of::<Api>());
///
/// let injector = Injector::new(ComponentGraph::root(scope).unwrap());
/// let mut screen = Screen { api: Slot::new("api") };
/// injector.inject(&mut screen).unwrap();
///
/// assert!(screen.api.is_filled());
/// ```
#[derive(Clone, Debug)]
pub struct Injector {
    graph: Arc<ComponentGraph>,
}

impl Injector {
    #[inline]
    pub fn new(graph: Arc<ComponentGraph>) -> Self {
        Self { graph }
    }

    #[inline]
    pub fn graph(&self) -> &Arc<ComponentGraph> {
        &self.graph
    }

    /// Populate every slot of `target`.
    ///
    /// Each slot is resolved from the first graph, starting at this
    /// injector's graph and walking up, whose allow-list exposes the slot's
    /// key. All slots resolve before any is assigned, so on error the target
    /// is left as it was.
    pub fn inject<T: InjectionTarget + ?Sized>(&self, target: &mut T) -> Result<()> {
        let mut slots = target.slots();

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            scope = self.graph.name(),
            slots = slots.len(),
            "Injecting target"
        );

        let mut values = Vec::with_capacity(slots.len());
        for slot in &slots {
            values.push(self.resolve_slot(&**slot)?);
        }

        for (slot, value) in slots.iter_mut().zip(values) {
            slot.fill(value)?;
        }
        Ok(())
    }

    fn resolve_slot(&self, slot: &dyn SlotAccess) -> Result<Value> {
        let key = slot.key();
        let owner = self
            .graph
            .nearest_exposing(key)
            .ok_or(DiError::UnsatisfiedSlot {
                slot: slot.name(),
                key: *key,
            })?;

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_graph",
            slot = slot.name(),
            key = %key,
            owner = owner.name(),
            "Resolving slot"
        );

        owner.resolve(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Recipe, Scope};

    struct Client;

    struct Api {
        client: Arc<Client>,
    }

    struct Screen {
        api: Slot<Api>,
        client: Slot<Client>,
    }

    injection_target!(Screen { api, client });

    impl Screen {
        fn new() -> Self {
            Self {
                api: Slot::new("api"),
                client: Slot::new("client"),
            }
        }
    }

    struct Counter {
        count: Slot<u64>,
    }

    injection_target!(Counter { count });

    fn graphs() -> (Arc<ComponentGraph>, Arc<ComponentGraph>) {
        let mut app = Scope::new("application");
        app.register(Recipe::cached::<Client>().build(|_| Ok(Client))).unwrap();
        app.register(Recipe::transient::<u64>().named("internal").value(7)).unwrap();
        app.expose(ProviderKey::of::<Client>());

        let mut user = Scope::child_of("user", "application");
        user.register(
            Recipe::cached::<Api>()
                .depends_on(ProviderKey::of::<Client>())
                .build(|deps| Ok(Api { client: deps.get::<Client>()? })),
        )
        .unwrap();
        user.expose(ProviderKey::of::<Api>());

        let root = ComponentGraph::root(app).unwrap();
        let child = root.child(user).unwrap();
        (root, child)
    }

    #[test]
    fn test_inject_from_child_and_ancestor() {
        let (root, child) = graphs();
        let injector = Injector::new(child);

        let mut screen = Screen::new();
        injector.inject(&mut screen).unwrap();

        let api = screen.api.get().unwrap();
        let client = screen.client.get().unwrap();
        assert!(Arc::ptr_eq(&api.client, client));
        assert!(Arc::ptr_eq(client, &root.get::<Client>().unwrap()));
    }

    #[test]
    fn test_targets_share_cached_instance() {
        let (_root, child) = graphs();
        let injector = Injector::new(child);

        let mut first = Screen::new();
        let mut second = Screen::new();
        injector.inject(&mut first).unwrap();
        injector.inject(&mut second).unwrap();

        assert!(Arc::ptr_eq(first.api.get().unwrap(), second.api.get().unwrap()));
    }

    #[test]
    fn test_inject_twice_is_idempotent() {
        let (_root, child) = graphs();
        let injector = Injector::new(child);

        let mut screen = Screen::new();
        injector.inject(&mut screen).unwrap();
        let before = Arc::clone(screen.api.get().unwrap());
        injector.inject(&mut screen).unwrap();

        assert!(Arc::ptr_eq(&before, screen.api.get().unwrap()));
    }

    #[test]
    fn test_unexposed_key_is_unsatisfied() {
        let (root, child) = graphs();
        let mut counter = Counter {
            count: Slot::named("count", "internal"),
        };

        // Registered in root, but never exposed
        assert!(root.get_named::<u64>("internal").is_ok());

        let err = Injector::new(child).inject(&mut counter).unwrap_err();
        assert_eq!(
            err,
            DiError::UnsatisfiedSlot {
                slot: "count",
                key: ProviderKey::named::<u64>("internal"),
            }
        );
        assert!(!counter.count.is_filled());
    }

    #[test]
    fn test_failure_leaves_target_untouched() {
        struct Mixed {
            client: Slot<Client>,
            missing: Slot<u64>,
        }
        injection_target!(Mixed { client, missing });

        let (_root, child) = graphs();
        let mut mixed = Mixed {
            client: Slot::new("client"),
            missing: Slot::new("missing"),
        };

        assert!(Injector::new(child).inject(&mut mixed).is_err());
        assert!(!mixed.client.is_filled());
        assert!(!mixed.missing.is_filled());
    }

    #[test]
    fn test_parent_injector_cannot_see_child() {
        let (root, _child) = graphs();
        let mut screen = Screen::new();

        let err = Injector::new(root).inject(&mut screen).unwrap_err();
        assert!(matches!(err, DiError::UnsatisfiedSlot { slot: "api", .. }));
    }

    #[test]
    fn test_slot_fill_type_mismatch() {
        let mut slot = Slot::<Client>::new("client");
        let err = slot.fill(Arc::new(1u64)).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }
}
