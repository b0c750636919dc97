//! Per-scope recipe table
//!
//! Uses an `ahash` map for lookups plus a registration-order list so graph
//! validation walks recipes deterministically.

use crate::{DiError, ProviderKey, Recipe, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Recipes registered for one scope, keyed by [`ProviderKey`]
#[derive(Clone)]
pub struct ProviderRegistry {
    /// Scope name, for error reporting
    scope: &'static str,
    recipes: HashMap<ProviderKey, Recipe, RandomState>,
    order: Vec<ProviderKey>,
}

impl ProviderRegistry {
    /// Create an empty registry for the named scope
    #[inline]
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            recipes: HashMap::with_hasher(RandomState::new()),
            order: Vec::new(),
        }
    }

    /// Register a recipe under its own key.
    ///
    /// Fails with [`DiError::DuplicateKey`] if the key is already present;
    /// the first registration is kept.
    pub fn register(&mut self, recipe: Recipe) -> Result<()> {
        let key = *recipe.key();
        match self.recipes.entry(key) {
            Entry::Occupied(_) => Err(DiError::DuplicateKey {
                scope: self.scope,
                key,
            }),
            Entry::Vacant(slot) => {
                slot.insert(recipe);
                self.order.push(key);
                Ok(())
            }
        }
    }

    /// Look up the recipe for `key`
    #[inline]
    pub fn lookup(&self, key: &ProviderKey) -> Result<&Recipe> {
        self.recipes.get(key).ok_or_else(|| DiError::unknown(key))
    }

    /// Non-failing variant of [`lookup`](Self::lookup)
    #[inline]
    pub fn get(&self, key: &ProviderKey) -> Option<&Recipe> {
        self.recipes.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &ProviderKey) -> bool {
        self.recipes.contains_key(key)
    }

    /// Keys in registration order
    #[inline]
    pub fn keys(&self) -> &[ProviderKey] {
        &self.order
    }

    /// Recipes in registration order
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.order.iter().filter_map(|key| self.recipes.get(key))
    }

    #[inline]
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("scope", &self.scope)
            .field("count", &self.len())
            .finish()
    }
}
