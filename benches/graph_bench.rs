//! Benchmarks for graph build, resolution and injection

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use scoped_graph::{ComponentGraph, Injector, ProviderKey, Recipe, Scope, Slot, injection_target};
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct Config {
    base_url: String,
}

#[allow(dead_code)]
struct Client {
    config: Arc<Config>,
}

#[allow(dead_code)]
struct Api {
    client: Arc<Client>,
}

#[allow(dead_code)]
struct Request {
    id: u64,
}

struct Screen {
    api: Slot<Api>,
    client: Slot<Client>,
}

injection_target!(Screen { api, client });

fn app_scope() -> Scope {
    let mut scope = Scope::new("application");
    scope
        .register(Recipe::cached::<Config>().build(|_| {
            Ok(Config {
                base_url: "https://api.example.com".into(),
            })
        }))
        .unwrap();
    scope
        .register(
            Recipe::cached::<Client>()
                .depends_on(ProviderKey::of::<Config>())
                .build(|deps| Ok(Client { config: deps.get::<Config>()? })),
        )
        .unwrap();
    scope
        .register(
            Recipe::transient::<Request>()
                .depends_on(ProviderKey::of::<Client>())
                .build(|_| Ok(Request { id: 7 })),
        )
        .unwrap();
    scope.expose(ProviderKey::of::<Client>());
    scope
}

fn user_scope() -> Scope {
    let mut scope = Scope::child_of("user", "application");
    scope
        .register(
            Recipe::cached::<Api>()
                .depends_on(ProviderKey::of::<Client>())
                .build(|deps| Ok(Api { client: deps.get::<Client>()? })),
        )
        .unwrap();
    scope.expose(ProviderKey::of::<Api>());
    scope
}

/// Linear chain of `n` qualified providers, each depending on the previous
fn chain_scope(names: &[&'static str]) -> Scope {
    let mut scope = Scope::new("chain");
    for (i, name) in names.iter().enumerate() {
        let mut recipe = Recipe::cached::<u64>().named(*name);
        if i > 0 {
            recipe = recipe.depends_on(ProviderKey::named::<u64>(names[i - 1]));
        }
        scope.register(recipe.value(i as u64)).unwrap();
    }
    scope
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    group.bench_function("root", |b| {
        b.iter(|| black_box(ComponentGraph::root(app_scope()).unwrap()))
    });

    let root = ComponentGraph::root(app_scope()).unwrap();
    group.bench_function("child", |b| {
        b.iter(|| black_box(root.child(user_scope()).unwrap()))
    });

    const NAMES: [&str; 16] = [
        "n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8", "n9", "n10", "n11", "n12", "n13",
        "n14", "n15",
    ];
    group.throughput(Throughput::Elements(NAMES.len() as u64));
    group.bench_function("chain_16", |b| {
        b.iter(|| black_box(ComponentGraph::root(chain_scope(&NAMES)).unwrap()))
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let root = ComponentGraph::root(app_scope()).unwrap();
    let user = root.child(user_scope()).unwrap();
    let _ = user.get::<Api>().unwrap();

    group.bench_function("cached_hit", |b| {
        b.iter(|| black_box(root.get::<Client>().unwrap()))
    });

    group.bench_function("transient", |b| {
        b.iter(|| black_box(root.get::<Request>().unwrap()))
    });

    group.bench_function("child_cached_hit", |b| {
        b.iter(|| black_box(user.get::<Api>().unwrap()))
    });

    group.bench_function("child_from_ancestor", |b| {
        b.iter(|| black_box(user.get::<Client>().unwrap()))
    });

    group.bench_function("first_resolve_fresh_session", |b| {
        b.iter(|| {
            let session = root.child(user_scope()).unwrap();
            black_box(session.get::<Api>().unwrap())
        })
    });

    group.finish();
}

fn bench_inject(c: &mut Criterion) {
    let root = ComponentGraph::root(app_scope()).unwrap();
    let injector = Injector::new(root.child(user_scope()).unwrap());

    c.bench_function("inject/two_slots", |b| {
        b.iter(|| {
            let mut screen = Screen {
                api: Slot::new("api"),
                client: Slot::new("client"),
            };
            injector.inject(&mut screen).unwrap();
            black_box(screen)
        })
    });
}

fn bench_concurrent(c: &mut Criterion) {
    let root = ComponentGraph::root(app_scope()).unwrap();
    let _ = root.get::<Client>().unwrap();

    c.bench_function("concurrent/4_threads_cached", |b| {
        b.iter(|| {
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..100 {
                            black_box(root.get::<Client>().unwrap());
                        }
                    });
                }
            })
        })
    });
}

criterion_group!(benches, bench_build, bench_resolve, bench_inject, bench_concurrent);
criterion_main!(benches);
