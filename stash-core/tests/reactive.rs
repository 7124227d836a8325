//! Integration Tests for Reactive Cells
//!
//! These tests verify that signals, computeds, effects and the registry
//! work together correctly.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use stash_core::reactive::{Computed, ComputedState, Effect, Signal, StateRegistry};

/// Test that a computed can depend on another computed.
#[test]
fn computed_depends_on_computed() {
    let base = Signal::new(2);

    let reader = base.clone();
    let doubled = Computed::new(move || reader.get() * 2).depends_on(&base);
    let inner = doubled.clone();
    let plus_one = Computed::new(move || inner.get() + 1).depends_on(&doubled);

    assert_eq!(plus_one.get(), 5);

    base.set(10);
    assert_eq!(plus_one.state(), ComputedState::Dirty);
    assert_eq!(plus_one.get(), 21);
}

/// Test that computeds cache until a dependency fires.
#[test]
fn computed_caches_between_writes() {
    let runs = Arc::new(AtomicI32::new(0));
    let signal = Signal::new(1);

    let (reader, counter) = (signal.clone(), runs.clone());
    let computed = Computed::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        reader.get() * 100
    })
    .depends_on(&signal);

    computed.get();
    computed.get();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    signal.set(2);
    assert_eq!(computed.get(), 200);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Test that an untracked dependency no longer invalidates.
#[test]
fn untracked_dependency_is_ignored() {
    let signal = Signal::new(1);
    let reader = signal.clone();
    let computed = Computed::new(move || reader.get()).depends_on(&signal);
    assert_eq!(computed.get(), 1);

    computed.untrack(&signal);
    signal.set(2);
    assert_eq!(computed.state(), ComputedState::Clean);
    assert_eq!(computed.get(), 1);
}

/// Test that an effect sees changes through a chain of computeds.
#[test]
fn effect_follows_computed_chain() {
    let signal = Signal::new(1);
    let reader = signal.clone();
    let squared = Computed::new(move || reader.get() * reader.get()).depends_on(&signal);

    let last = Arc::new(AtomicI32::new(-1));
    let (view, sink) = (squared.clone(), last.clone());
    let effect = Effect::watch(&[&squared], move || sink.store(view.get(), Ordering::SeqCst));
    assert_eq!(last.load(Ordering::SeqCst), 1);

    signal.set(4);
    assert_eq!(last.load(Ordering::SeqCst), 16);

    effect.dispose();
    signal.set(5);
    assert_eq!(last.load(Ordering::SeqCst), 16);
}

/// Test that registry cells notify watchers regardless of which handle wrote.
#[test]
fn registry_cells_fan_out_to_every_handle() {
    let registry = StateRegistry::new();
    let writer = registry.cell("theme", || String::from("light")).unwrap();
    let watched = registry.cell("theme", String::new).unwrap();

    let seen = Arc::new(AtomicI32::new(0));
    let counter = seen.clone();
    let _effect = Effect::watch(&[&watched], move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    writer.set("dark".into());
    assert_eq!(watched.get(), "dark");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
