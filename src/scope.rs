//! Scope definitions
//!
//! A [`Scope`] is the declarative half of a lifetime boundary: a name, the
//! recipes registered for it, the keys it exposes to children and injection
//! sites, and optionally the name of the scope it must be nested in.
//! [`ComponentGraph::build`](crate::ComponentGraph::build) turns a definition
//! into a live scope instance with its own cache.

use crate::{ProviderKey, ProviderRegistry, Recipe, Result};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

/// Unique scope instance identifier.
///
/// Each built graph gets a unique ID for tracking and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// Declarative scope: recipes, exposed allow-list, declared parent.
///
/// # Examples
///
/// ```rust
/// use scoped_graph::{ProviderKey, Recipe, Scope};
///
/// #[derive(Clone)]
/// struct Client { base_url: String }
///
/// let mut app = Scope::new("application");
/// app.register(Recipe::transient::<String>().named("base_url").value("https://api.example.com".into()))
///     .unwrap();
/// app.register(
///     Recipe::cached::<Client>()
///         .depends_on(ProviderKey::named::<String>("base_url"))
///         .build(|deps| Ok(Client { base_url: deps.get_named::<String>("base_url")?.to_string() })),
/// )
/// .unwrap();
/// app.expose(ProviderKey::of::<Client>());
///
/// assert_eq!(app.registry().len(), 2);
/// assert!(app.is_exposed(&ProviderKey::of::<Client>()));
/// ```
#[derive(Clone, Debug)]
pub struct Scope {
    name: &'static str,
    parent: Option<&'static str>,
    registry: ProviderRegistry,
    exposed: Vec<ProviderKey>,
}

impl Scope {
    /// Create a scope definition with no declared parent.
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            registry: ProviderRegistry::new(name),
            exposed: Vec::new(),
        }
    }

    /// Create a scope definition that must be built on a graph of scope `parent`.
    #[inline]
    pub fn child_of(name: &'static str, parent: &'static str) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }

    /// Register a recipe in this scope.
    pub fn register(&mut self, recipe: Recipe) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            scope = self.name,
            key = %recipe.key(),
            lifetime = recipe.lifetime().as_str(),
            dependencies = recipe.dependencies().len(),
            "Registering recipe"
        );

        self.registry.register(recipe)
    }

    /// Chaining form of [`register`](Self::register).
    #[inline]
    pub fn provide(mut self, recipe: Recipe) -> Result<Self> {
        self.register(recipe)?;
        Ok(self)
    }

    /// Add `key` to the exposed allow-list. Exposing twice is a no-op.
    pub fn expose(&mut self, key: ProviderKey) -> &mut Self {
        if !self.exposed.contains(&key) {
            self.exposed.push(key);
        }
        self
    }

    /// Run a module's registrations against this scope.
    #[inline]
    pub fn install<M: Module + ?Sized>(&mut self, module: &M) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            scope = self.name,
            module = module.name(),
            "Installing module"
        );

        module.configure(self)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parent scope name, if any
    #[inline]
    pub fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    #[inline]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Exposed keys in declaration order
    #[inline]
    pub fn exposed(&self) -> &[ProviderKey] {
        &self.exposed
    }

    #[inline]
    pub fn is_exposed(&self, key: &ProviderKey) -> bool {
        self.exposed.contains(key)
    }
}

/// A group of related registrations.
///
/// # Example
///
/// ```rust
/// use scoped_graph::{Module, ProviderKey, Recipe, Result, Scope};
///
/// #[derive(Clone)]
/// struct Database;
///
/// struct DataModule;
///
/// impl Module for DataModule {
///     fn configure(&self, scope: &mut Scope) -> Result<()> {
///         scope.register(Recipe::cached::<Database>().build(|_| Ok(Database)))?;
///         scope.expose(ProviderKey::of::<Database>());
///         Ok(())
///     }
/// }
///
/// let mut scope = Scope::new("application");
/// scope.install(&DataModule).unwrap();
/// assert!(scope.registry().contains(&ProviderKey::of::<Database>()));
/// ```
pub trait Module {
    /// Register this module's recipes and exposures.
    fn configure(&self, scope: &mut Scope) -> Result<()>;

    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiError;

    #[derive(Clone)]
    struct GlobalService;

    #[test]
    fn test_scope_ids_unique() {
        let s1 = ScopeId::new();
        let s2 = ScopeId::new();
        let s3 = ScopeId::new();

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
    }

    #[test]
    fn test_scope_display() {
        let scope = ScopeId::new();
        let display = format!("{}", scope);
        assert!(display.starts_with("scope-"));
    }

    #[test]
    fn test_child_of_records_parent() {
        let scope = Scope::child_of("user", "application");
        assert_eq!(scope.name(), "user");
        assert_eq!(scope.parent(), Some("application"));
        assert_eq!(Scope::new("application").parent(), None);
    }

    #[test]
    fn test_provide_chain_and_duplicate() {
        let scope = Scope::new("application")
            .provide(Recipe::cached::<GlobalService>().build(|_| Ok(GlobalService)))
            .unwrap();
        assert_eq!(scope.registry().len(), 1);

        let err = scope
            .provide(Recipe::transient::<GlobalService>().build(|_| Ok(GlobalService)))
            .unwrap_err();
        assert!(matches!(err, DiError::DuplicateKey { scope: "application", .. }));
    }

    #[test]
    fn test_expose_is_idempotent() {
        let mut scope = Scope::new("application");
        scope
            .expose(ProviderKey::of::<GlobalService>())
            .expose(ProviderKey::of::<GlobalService>());
        assert_eq!(scope.exposed().len(), 1);
    }

    #[test]
    fn test_module_error_propagates() {
        struct Twice;

        impl Module for Twice {
            fn configure(&self, scope: &mut Scope) -> Result<()> {
                scope.register(Recipe::cached::<GlobalService>().build(|_| Ok(GlobalService)))?;
                scope.register(Recipe::cached::<GlobalService>().build(|_| Ok(GlobalService)))
            }
        }

        let mut scope = Scope::new("application");
        assert!(scope.install(&Twice).is_err());
    }
}
