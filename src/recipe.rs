//! Construction recipes
//!
//! A [`Recipe`] couples a [`ProviderKey`] with the keys it depends on, its
//! [`Lifetime`] and a type-erased construction function. Recipes are built
//! through the typed [`RecipeBuilder`], which guarantees the function produces
//! the key's type.

use crate::{DiError, Injectable, Lifetime, ProviderKey, Result};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// A shared, type-erased value handed out by a graph
pub type Value = Arc<dyn Any + Send + Sync>;

/// Type-erased construction function
type ConstructFn = Arc<dyn Fn(&Deps<'_>) -> Result<Value> + Send + Sync>;

#[inline]
fn erase<F>(f: F) -> ConstructFn
where
    F: Fn(&Deps<'_>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Downcast an erased value to `Arc<T>`, reporting the key on mismatch
#[inline]
pub(crate) fn downcast<T: Injectable>(key: &ProviderKey, value: Value) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::type_mismatch::<T>(key))
}

/// A named construction rule. Immutable once built.
#[derive(Clone)]
pub struct Recipe {
    key: ProviderKey,
    dependencies: Vec<ProviderKey>,
    lifetime: Lifetime,
    construct: ConstructFn,
}

impl Recipe {
    /// Start a recipe for `T` with the given lifetime.
    #[inline]
    pub fn builder<T: Injectable>(lifetime: Lifetime) -> RecipeBuilder<T> {
        RecipeBuilder {
            key: ProviderKey::of::<T>(),
            dependencies: Vec::new(),
            lifetime,
            _marker: PhantomData,
        }
    }

    /// Start a recipe whose result is cached per scope instance.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scoped_graph::{ProviderKey, Recipe};
    ///
    /// struct Client { base_url: String }
    ///
    /// let recipe = Recipe::cached::<Client>()
    ///     .depends_on(ProviderKey::named::<String>("base_url"))
    ///     .build(|deps| {
    ///         let url = deps.get_named::<String>("base_url")?;
    ///         Ok(Client { base_url: url.to_string() })
    ///     });
    ///
    /// assert_eq!(recipe.dependencies().len(), 1);
    /// ```
    #[inline]
    pub fn cached<T: Injectable>() -> RecipeBuilder<T> {
        Self::builder(Lifetime::Cached)
    }

    /// Start a recipe that constructs a new value on every resolve.
    #[inline]
    pub fn transient<T: Injectable>() -> RecipeBuilder<T> {
        Self::builder(Lifetime::Transient)
    }

    #[inline]
    pub fn key(&self) -> &ProviderKey {
        &self.key
    }

    #[inline]
    pub fn dependencies(&self) -> &[ProviderKey] {
        &self.dependencies
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    #[inline]
    pub fn is_cached(&self) -> bool {
        self.lifetime.is_cached()
    }

    /// Run the construction function against already-resolved dependencies.
    #[inline]
    pub(crate) fn construct(&self, deps: &Deps<'_>) -> Result<Value> {
        (self.construct)(deps)
    }
}

impl std::fmt::Debug for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipe")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Typed builder for [`Recipe`]
pub struct RecipeBuilder<T> {
    key: ProviderKey,
    dependencies: Vec<ProviderKey>,
    lifetime: Lifetime,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> RecipeBuilder<T> {
    /// Qualify the key, e.g. `String@base_url`.
    #[inline]
    pub fn named(mut self, qualifier: &'static str) -> Self {
        self.key = ProviderKey::named::<T>(qualifier);
        self
    }

    /// Declare a dependency. Declaration order is the resolution order.
    #[inline]
    pub fn depends_on(mut self, key: ProviderKey) -> Self {
        if !self.dependencies.contains(&key) {
            self.dependencies.push(key);
        }
        self
    }

    /// Finish with a construction function.
    pub fn build<F>(self, factory: F) -> Recipe
    where
        F: Fn(&Deps<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Recipe {
            key: self.key,
            dependencies: self.dependencies,
            lifetime: self.lifetime,
            construct: erase(move |deps| factory(deps).map(|v| Arc::new(v) as Value)),
        }
    }

    /// Finish with a constant; each construction wraps a fresh clone.
    pub fn value(self, value: T) -> Recipe
    where
        T: Clone,
    {
        self.build(move |_| Ok(value.clone()))
    }

    /// Finish with a pre-built instance; every construction returns the same `Arc`.
    pub fn instance(self, instance: T) -> Recipe {
        let shared: Value = Arc::new(instance);
        Recipe {
            key: self.key,
            dependencies: self.dependencies,
            lifetime: self.lifetime,
            construct: erase(move |_| Ok(Arc::clone(&shared))),
        }
    }
}

/// Resolved dependencies passed to a construction function.
///
/// Only the keys the recipe declared are available.
pub struct Deps<'a> {
    owner: ProviderKey,
    resolved: &'a [(ProviderKey, Value)],
}

impl<'a> Deps<'a> {
    pub(crate) fn new(owner: ProviderKey, resolved: &'a [(ProviderKey, Value)]) -> Self {
        Self { owner, resolved }
    }

    /// Key of the recipe being constructed
    #[inline]
    pub fn owner(&self) -> &ProviderKey {
        &self.owner
    }

    /// Erased lookup of a declared dependency
    pub fn resolve(&self, key: &ProviderKey) -> Result<Value> {
        self.resolved
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Arc::clone(v))
            .ok_or(DiError::UndeclaredDependency {
                key: *key,
                requested_by: self.owner,
            })
    }

    /// Get the unqualified `T` dependency
    #[inline]
    pub fn get<T: Injectable>(&self) -> Result<Arc<T>> {
        let key = ProviderKey::of::<T>();
        downcast(&key, self.resolve(&key)?)
    }

    /// Get the `T` dependency registered under `qualifier`
    #[inline]
    pub fn get_named<T: Injectable>(&self, qualifier: &'static str) -> Result<Arc<T>> {
        let key = ProviderKey::named::<T>(qualifier);
        downcast(&key, self.resolve(&key)?)
    }
}
