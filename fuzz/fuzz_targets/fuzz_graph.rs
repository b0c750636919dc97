#![no_main]

//! Fuzz target for graph validation and resolution
//!
//! Builds random root/child scope pairs over a fixed set of qualified keys
//! and checks that validation never panics, that every key of a validated
//! graph resolves, and that cached keys resolve to one instance.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scoped_graph::{ComponentGraph, DiError, ProviderKey, Recipe, Scope};
use std::sync::Arc;

const NAMES: [&str; 8] = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"];

/// One provider: which key, which scope, and what it depends on
#[derive(Debug, Arbitrary)]
struct Node {
    slot: u8,
    cached: bool,
    in_child: bool,
    exposed: bool,
    deps: Vec<u8>,
}

fn key(slot: u8) -> ProviderKey {
    ProviderKey::named::<u64>(NAMES[slot as usize % NAMES.len()])
}

fn name(slot: u8) -> &'static str {
    NAMES[slot as usize % NAMES.len()]
}

fn populate(scope: &mut Scope, nodes: &[&Node]) -> Vec<ProviderKey> {
    let mut registered = Vec::new();
    for node in nodes {
        let builder = if node.cached {
            Recipe::cached::<u64>()
        } else {
            Recipe::transient::<u64>()
        };
        let mut builder = builder.named(name(node.slot));
        for dep in node.deps.iter().take(4) {
            builder = builder.depends_on(key(*dep));
        }
        let value = node.slot as u64;
        match scope.register(builder.build(move |_| Ok(value))) {
            Ok(()) => registered.push(key(node.slot)),
            Err(DiError::DuplicateKey { .. }) => continue,
            Err(other) => panic!("unexpected registration error: {other}"),
        }
        if node.exposed {
            scope.expose(key(node.slot));
        }
    }
    registered
}

fn check_resolves(graph: &ComponentGraph, keys: &[ProviderKey]) {
    for k in keys {
        let qualifier = k.qualifier().unwrap_or_default();
        let first = graph.get_named::<u64>(qualifier).expect("validated key must resolve");
        let second = graph.get_named::<u64>(qualifier).expect("validated key must resolve");
        assert_eq!(first, second);

        let cached = graph.registry().get(k).is_some_and(|r| r.is_cached());
        if cached {
            assert!(Arc::ptr_eq(&first, &second));
        }
    }
}

fn expect_validation_error(err: &DiError) {
    assert!(
        matches!(
            err,
            DiError::MissingDependency { .. } | DiError::CyclicDependency { .. }
        ),
        "unexpected build error: {err}"
    );
    if let DiError::CyclicDependency { cycle } = err {
        assert!(!cycle.is_empty());
    }
}

fuzz_target!(|nodes: Vec<Node>| {
    let (child_nodes, root_nodes): (Vec<&Node>, Vec<&Node>) =
        nodes.iter().take(32).partition(|n| n.in_child);

    let mut root_scope = Scope::new("application");
    let root_keys = populate(&mut root_scope, &root_nodes);

    let root = match ComponentGraph::root(root_scope) {
        Ok(root) => root,
        Err(err) => {
            expect_validation_error(&err);
            return;
        }
    };
    check_resolves(&root, &root_keys);

    let mut child_scope = Scope::child_of("user", "application");
    let child_keys = populate(&mut child_scope, &child_nodes);

    match root.child(child_scope) {
        Ok(child) => {
            check_resolves(&child, &child_keys);
            child.close();
            assert_eq!(child.cached_count(), 0);
        }
        Err(err) => expect_validation_error(&err),
    }
});
