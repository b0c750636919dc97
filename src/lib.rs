//! # Scoped Graph - Scoped Provider Wiring for Rust
//!
//! Register construction recipes per scope, validate the wiring once at
//! startup, then resolve values lazily from a graph of nested scopes.
//!
//! ## Features
//!
//! - **Named providers** - keys are a type plus an optional qualifier (`String@base_url`)
//! - **Eager validation** - missing dependencies and cycles fail at `build`, not mid-request
//! - **Lazy construction** - nothing is built until first resolved
//! - **Cached or transient** - cached recipes run at most once per scope instance, even under concurrent first access
//! - **Exposure allow-lists** - child scopes and injection sites only see what a scope exposes
//! - **Slot injection** - fill an object's declared slots from the nearest exposing graph
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_graph::{ComponentGraph, Injector, ProviderKey, Recipe, Scope, Slot, injection_target};
//! use std::sync::Arc;
//!
//! struct Client { base_url: String }
//! struct Api { client: Arc<Client> }
//!
//! // Application scope: the base URL stays internal, the client is exposed
//! let mut app = Scope::new("application");
//! app.register(Recipe::transient::<String>().named("base_url").value("https://api.example.com".into()))?;
//! app.register(
//!     Recipe::cached::<Client>()
//!         .depends_on(ProviderKey::named::<String>("base_url"))
//!         .build(|deps| Ok(Client { base_url: deps.get_named::<String>("base_url")?.to_string() })),
//! )?;
//! app.expose(ProviderKey::of::<Client>());
//!
//! // User scope: builds on the client the application scope exposes
//! let mut user = Scope::child_of("user", "application");
//! user.register(
//!     Recipe::cached::<Api>()
//!         .depends_on(ProviderKey::of::<Client>())
//!         .build(|deps| Ok(Api { client: deps.get::<Client>()? })),
//! )?;
//! user.expose(ProviderKey::of::<Api>());
//!
//! let root = ComponentGraph::root(app)?;
//! let session = root.child(user)?;
//!
//! struct Screen { api: Slot<Api> }
//! injection_target!(Screen { api });
//!
//! let mut screen = Screen { api: Slot::new("api") };
//! Injector::new(session).inject(&mut screen)?;
//!
//! let api = screen.api.get().unwrap();
//! assert_eq!(api.client.base_url, "https://api.example.com");
//! # Ok::<(), scoped_graph::DiError>(())
//! ```
//!
//! ## Scope Lifetimes
//!
//! A [`Scope`] is a definition; every [`ComponentGraph::build`] creates a new
//! scope instance with an empty cache. Build the user scope once per session
//! and [`close`](ComponentGraph::close) it when the session ends to release
//! its instances. A parent graph is kept alive by its children.

pub mod config;
mod error;
mod graph;
mod injector;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod recipe;
mod registry;
pub mod repos;
mod scope;

pub use error::*;
pub use graph::*;
pub use injector::*;
pub use key::*;
pub use recipe::{Deps, Recipe, RecipeBuilder, Value};
pub use registry::*;
pub use scope::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ComponentGraph, Deps, DiError, Injectable, InjectionTarget, Injector, Lifetime, Module,
        ProviderKey, Recipe, Result, Scope, Slot,
    };
    pub use std::sync::Arc;
}
