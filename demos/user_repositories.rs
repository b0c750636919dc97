//! Wires the application and user scopes, injects a screen and lists a
//! user's repositories through an in-memory transport.
//!
//! Run with pretty logging:
//! ```bash
//! cargo run --example user_repositories --features logging-pretty
//! ```
//!
//! Override the endpoint or cache with `SCOPED_GRAPH_BASE_URL`,
//! `SCOPED_GRAPH_CACHE_DIR` and `SCOPED_GRAPH_CACHE_SIZE`.

use scoped_graph::config::NetworkConfig;
use scoped_graph::repos::{
    ApiModule, Completion, HttpClient, HttpError, NetModule, RepositoriesCallback, Repository,
    RepositoryService, Transport,
};
use scoped_graph::{ComponentGraph, Injector, Slot, injection_target};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

/// Answers on a background thread the way a network stack would
struct FakeGithub;

impl Transport for FakeGithub {
    fn get(&self, client: &HttpClient, url: &str, done: Completion) {
        let users = client.url("users/");
        let user = url
            .strip_prefix(users.as_str())
            .and_then(|rest| rest.strip_suffix("/repos"))
            .map(str::to_string);

        thread::spawn(move || {
            let result = match user.as_deref() {
                Some("octocat") => Ok(["hello-world", "linguist", "octocat.github.io"]
                    .iter()
                    .zip(1u64..)
                    .map(|(name, id)| Repository {
                        id,
                        name: name.to_string(),
                        full_name: format!("octocat/{name}"),
                    })
                    .collect()),
                _ => Err(HttpError::Status {
                    status: 404,
                    message: "Not Found".into(),
                }),
            };
            done(result);
        });
    }
}

/// Screen whose dependencies come from the user scope
struct RepositoriesScreen {
    service: Slot<RepositoryService>,
}

injection_target!(RepositoriesScreen { service });

/// Shows a toast and signals the main thread
struct Toast(mpsc::Sender<()>);

impl RepositoriesCallback for Toast {
    fn on_success(self: Box<Self>, repositories: Vec<Repository>) {
        let names: Vec<_> = repositories.iter().map(|r| r.full_name.as_str()).collect();
        println!("[toast] {} repositories: {}", names.len(), names.join(", "));
        let _ = self.0.send(());
    }

    fn on_failure(self: Box<Self>, error: HttpError) {
        println!("[toast] request failed: {error}");
        let _ = self.0.send(());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "logging")]
    {
        scoped_graph::logging::init();
    }

    println!("=== Scoped Graph: user repositories ===\n");

    let config = NetworkConfig::from_env()?;
    println!("Base URL: {}", config.base_url());

    // Application scope lives for the whole process
    let app = ComponentGraph::root(NetModule::new(config, Arc::new(FakeGithub)).scope()?)?;
    println!("Built {} (exposes {} keys)", app.name(), app.exposed().len());

    for username in ["octocat", "nobody"] {
        // One user scope per session
        let session = app.child(ApiModule.scope()?)?;

        let mut screen = RepositoriesScreen {
            service: Slot::new("service"),
        };
        Injector::new(Arc::clone(&session)).inject(&mut screen)?;

        let (tx, rx) = mpsc::channel();
        if let Some(service) = screen.service.get() {
            println!("\nListing repositories for {username}");
            service.get_repositories(username, Box::new(Toast(tx)));
            rx.recv()?;
        }

        session.close();
    }

    Ok(())
}
