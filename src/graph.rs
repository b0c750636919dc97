//! Resolved component graphs
//!
//! A [`ComponentGraph`] is one live instance of a [`Scope`]: the scope's
//! frozen registry, its exposed allow-list, a per-instance cache and a strong
//! reference to the parent graph it was built on. Validation is eager (at
//! [`ComponentGraph::build`]) and construction is lazy (at first
//! [`resolve`](ComponentGraph::resolve)).

use crate::recipe::downcast;
use crate::{Deps, DiError, Injectable, ProviderKey, ProviderRegistry, Recipe, Result, Scope, ScopeId, Value};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Per-key cell: the map guard is never held while a cell initializes, so a
/// construction function may resolve other keys of the same graph.
type CacheCell = Arc<OnceCell<Value>>;

/// A validated, lazily-constructed view over a scope and its ancestors.
///
/// # Examples
///
/// ```rust
/// use scoped_graph::{ComponentGraph, ProviderKey, Recipe, Scope};
/// use std::sync::Arc;
///
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
/// let graph = ComponentGraph::root(app).unwrap();
/// let a = graph.get::<Client>().unwrap();
/// let b = graph.get::<Client>().unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(a.base_url, "https://api.example.com");
/// ```
pub struct ComponentGraph {
    id: ScopeId,
    name: &'static str,
    registry: ProviderRegistry,
    exposed: Vec<ProviderKey>,
    /// Cached instances owned by this scope instance
    cache: DashMap<ProviderKey, CacheCell, RandomState>,
    closed: AtomicBool,
    parent: Option<Arc<ComponentGraph>>,
    depth: u32,
}

impl ComponentGraph {
    /// Build a graph with no parent.
    #[inline]
    pub fn root(scope: Scope) -> Result<Arc<Self>> {
        Self::build(scope, None)
    }

    /// Build a graph for `scope` nested in this one.
    #[inline]
    pub fn child(self: &Arc<Self>, scope: Scope) -> Result<Arc<Self>> {
        Self::build(scope, Some(self))
    }

    /// Validate `scope` against `parent` and produce a live graph.
    ///
    /// Checks, in order: the declared parent scope name, that every exposed
    /// key is reachable, that every declared dependency is registered locally
    /// or exposed by an ancestor, and that local dependencies are acyclic.
    /// Nothing is constructed here.
    pub fn build(scope: Scope, parent: Option<&Arc<ComponentGraph>>) -> Result<Arc<Self>> {
        let name = scope.name();

        if let Some(expected) = scope.parent() {
            let actual = parent.map(|p| p.name);
            if actual != Some(expected) {
                return Err(Self::rejected(DiError::ParentScopeMismatch {
                    scope: name,
                    expected,
                    actual,
                }));
            }
        }

        let registry = scope.registry();
        let from_ancestors =
            |key: &ProviderKey| parent.is_some_and(|p| p.nearest_exposing(key).is_some());

        for key in scope.exposed() {
            if !registry.contains(key) && !from_ancestors(key) {
                return Err(Self::rejected(DiError::unknown(key)));
            }
        }

        for recipe in registry.recipes() {
            for dep in recipe.dependencies() {
                if !registry.contains(dep) && !from_ancestors(dep) {
                    return Err(Self::rejected(DiError::MissingDependency {
                        key: *dep,
                        required_by: *recipe.key(),
                    }));
                }
            }
        }

        if let Some(cycle) = find_cycle(registry) {
            return Err(Self::rejected(DiError::CyclicDependency { cycle }));
        }

        let depth = parent.map_or(0, |p| p.depth + 1);
        let id = ScopeId::new();

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            scope = name,
            scope_id = id.id(),
            depth,
            recipes = registry.len(),
            exposed = scope.exposed().len(),
            "Built component graph"
        );

        Ok(Arc::new(Self {
            id,
            name,
            registry: registry.clone(),
            exposed: scope.exposed().to_vec(),
            cache: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8, // graphs hold a handful of providers
            ),
            closed: AtomicBool::new(false),
            parent: parent.map(Arc::clone),
            depth,
        }))
    }

    #[cold]
    fn rejected(err: DiError) -> DiError {
        #[cfg(feature = "logging")]
        debug!(target: "scoped_graph", error = %err, "Graph validation failed");
        err
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `key`, constructing it (and its dependencies) on first use.
    ///
    /// Local recipes win; otherwise the nearest ancestor that exposes `key`
    /// resolves it from its own cache.
    pub fn resolve(&self, key: &ProviderKey) -> Result<Value> {
        self.ensure_open()?;

        if let Some(recipe) = self.registry.get(key) {
            return self.instantiate(recipe);
        }

        if let Some(owner) = self.parent.as_deref().and_then(|p| p.nearest_exposing(key)) {
            #[cfg(feature = "logging")]
            trace!(
                target: "scoped_graph",
                key = %key,
                scope = self.name,
                owner = owner.name,
                location = "ancestor",
                "Resolving from ancestor scope"
            );
            return owner.resolve(key);
        }

        Err(DiError::unknown(key))
    }

    /// Resolve the unqualified `T`
    #[inline]
    pub fn get<T: Injectable>(&self) -> Result<Arc<T>> {
        let key = ProviderKey::of::<T>();
        downcast(&key, self.resolve(&key)?)
    }

    /// Resolve the `T` registered under `qualifier`
    #[inline]
    pub fn get_named<T: Injectable>(&self, qualifier: &'static str) -> Result<Arc<T>> {
        let key = ProviderKey::named::<T>(qualifier);
        downcast(&key, self.resolve(&key)?)
    }

    fn instantiate(&self, recipe: &Recipe) -> Result<Value> {
        if !recipe.is_cached() {
            return self.invoke(recipe);
        }

        let key = recipe.key();
        if let Some(value) = self.cache.get(key).and_then(|cell| cell.value().get().cloned()) {
            #[cfg(feature = "logging")]
            trace!(
                target: "scoped_graph",
                key = %key,
                scope = self.name,
                location = "cache",
                "Cached instance hit"
            );
            return Ok(value);
        }

        // Guard dropped at the end of the statement
        let cell: CacheCell = self.cache.entry(*key).or_default().value().clone();
        let value = Arc::clone(cell.get_or_try_init(|| self.invoke(recipe))?);

        // A close() that raced this construction must not leave the instance behind
        if self.is_closed() {
            self.cache.remove(key);
            return Err(DiError::ScopeClosed { scope: self.name });
        }
        Ok(value)
    }

    fn invoke(&self, recipe: &Recipe) -> Result<Value> {
        let mut resolved = Vec::with_capacity(recipe.dependencies().len());
        for dep in recipe.dependencies() {
            resolved.push((*dep, self.resolve(dep)?));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            key = %recipe.key(),
            scope = self.name,
            lifetime = recipe.lifetime().as_str(),
            "Constructing instance"
        );

        recipe.construct(&Deps::new(*recipe.key(), &resolved))
    }

    #[inline]
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DiError::ScopeClosed { scope: self.name });
        }
        Ok(())
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Whether this scope's allow-list contains `key`
    #[inline]
    pub fn exposes(&self, key: &ProviderKey) -> bool {
        self.exposed.contains(key)
    }

    /// First graph, starting here and walking up, that exposes `key`
    pub fn nearest_exposing(&self, key: &ProviderKey) -> Option<&ComponentGraph> {
        let mut current = Some(self);
        while let Some(graph) = current {
            if graph.exposes(key) {
                return Some(graph);
            }
            current = graph.parent.as_deref();
        }
        None
    }

    /// Whether `resolve(key)` can succeed on this graph
    pub fn can_resolve(&self, key: &ProviderKey) -> bool {
        self.registry.contains(key)
            || self
                .parent
                .as_deref()
                .is_some_and(|p| p.nearest_exposing(key).is_some())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// End this scope instance: release every cached value and fail later
    /// resolves with [`DiError::ScopeClosed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_graph",
            scope = self.name,
            scope_id = self.id.id(),
            released = self.cache.len(),
            "Closing scope"
        );

        self.cache.clear();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Scope depth (0 = root)
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<ComponentGraph>> {
        self.parent.as_ref()
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

    /// Number of instances constructed and held by this scope instance
    pub fn cached_count(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }
}

impl std::fmt::Debug for ComponentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentGraph")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("recipes", &self.registry.len())
            .field("exposed", &self.exposed)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Depth-first search over local dependency edges.
///
/// Recipes are visited in registration order and dependencies in declaration
/// order; the returned cycle starts at the first key re-entered. Edges into
/// ancestor scopes end the walk since ancestors never depend on children.
fn find_cycle(registry: &ProviderRegistry) -> Option<Vec<ProviderKey>> {
    let mut done = HashSet::with_hasher(RandomState::new());
    let mut stack = Vec::new();

    for key in registry.keys() {
        if let Some(cycle) = visit(registry, key, &mut done, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit(
    registry: &ProviderRegistry,
    key: &ProviderKey,
    done: &mut HashSet<ProviderKey, RandomState>,
    stack: &mut Vec<ProviderKey>,
) -> Option<Vec<ProviderKey>> {
    if done.contains(key) {
        return None;
    }
    if let Some(pos) = stack.iter().position(|k| k == key) {
        return Some(stack[pos..].to_vec());
    }
    let recipe = registry.get(key)?;

    stack.push(*key);
    for dep in recipe.dependencies() {
        if let Some(cycle) = visit(registry, dep, done, stack) {
            return Some(cycle);
        }
    }
    stack.pop();
    done.insert(*key);
    None
}
