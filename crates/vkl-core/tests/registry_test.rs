//! Integration test: HandleRegistry
//!
//! Covers the association lifecycle (register → lookup → release), rejection
//! of every misuse, and consistency under concurrent create/destroy.
//!
//! Run with: cargo test -p vkl-core --test registry_test

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use vkl_core::{CoreError, HandleKind, HandleRegistry};

#[derive(Debug)]
struct Table {
    driver: &'static str,
}

fn table(driver: &'static str) -> Arc<Table> {
    Arc::new(Table { driver })
}

#[test]
fn test_lookup_returns_registered_table_until_release() {
    let registry = HandleRegistry::new();
    let t = table("driver-a");

    registry
        .register(0x10, HandleKind::Device, Arc::clone(&t))
        .unwrap();

    for _ in 0..3 {
        let found = registry.lookup(0x10).unwrap();
        assert!(Arc::ptr_eq(&found, &t));
    }
    assert_eq!(registry.kind_of(0x10), Some(HandleKind::Device));

    let released = registry.release(0x10).unwrap();
    assert_eq!(released.driver, "driver-a");

    match registry.lookup(0x10) {
        Err(CoreError::UnknownHandle(0x10)) => {}
        other => panic!("expected UnknownHandle, got {:?}", other),
    }
    assert!(registry.is_empty());
}

#[test]
fn test_double_register_is_rejected() {
    let registry = HandleRegistry::new();
    let first = table("driver-a");
    registry
        .register(0x20, HandleKind::Device, Arc::clone(&first))
        .unwrap();

    match registry.register(0x20, HandleKind::SwapChain, table("driver-b")) {
        Err(CoreError::AlreadyRegistered { handle, kind }) => {
            assert_eq!(handle, 0x20);
            assert_eq!(kind, HandleKind::Device);
        }
        other => panic!("expected AlreadyRegistered, got {:?}", other),
    }

    // The original association is untouched.
    assert!(Arc::ptr_eq(&registry.lookup(0x20).unwrap(), &first));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_release_of_unregistered_handle_is_rejected() {
    let registry: HandleRegistry<Arc<Table>> = HandleRegistry::new();
    assert!(matches!(
        registry.release(0x30),
        Err(CoreError::UnknownHandle(0x30))
    ));

    registry
        .register(0x30, HandleKind::Queue, table("driver-a"))
        .unwrap();
    registry.release(0x30).unwrap();
    assert!(matches!(
        registry.release(0x30),
        Err(CoreError::UnknownHandle(0x30))
    ));
}

#[test]
fn test_null_handle_is_rejected() {
    let registry = HandleRegistry::new();
    match registry.register(0, HandleKind::Device, table("driver-a")) {
        Err(CoreError::NullHandle(HandleKind::Device)) => {}
        other => panic!("expected NullHandle, got {:?}", other),
    }
    assert!(registry.is_empty());
}

#[test]
fn test_lookup_kind_rejects_other_kinds() {
    let registry = HandleRegistry::new();
    let t = table("driver-a");
    registry
        .register(0x40, HandleKind::SwapChain, Arc::clone(&t))
        .unwrap();

    assert!(Arc::ptr_eq(
        &registry.lookup_kind(0x40, HandleKind::SwapChain).unwrap(),
        &t
    ));
    for kind in [HandleKind::Device, HandleKind::Queue] {
        match registry.lookup_kind(0x40, kind) {
            Err(CoreError::UnknownHandle(0x40)) => {}
            other => panic!("expected UnknownHandle for {}, got {:?}", kind, other),
        }
    }
    assert!(matches!(
        registry.lookup_kind(0x41, HandleKind::SwapChain),
        Err(CoreError::UnknownHandle(0x41))
    ));
    // A mismatched lookup leaves the association alone.
    assert!(registry.contains(0x40));
}

#[test]
fn test_release_matching_removes_only_matching_entries() {
    let registry = HandleRegistry::new();
    let a = table("driver-a");
    let b = table("driver-b");

    registry.register(1, HandleKind::Device, Arc::clone(&a)).unwrap();
    registry.register(2, HandleKind::Queue, Arc::clone(&a)).unwrap();
    registry.register(3, HandleKind::SwapChain, Arc::clone(&a)).unwrap();
    registry.register(4, HandleKind::Device, Arc::clone(&b)).unwrap();

    let removed = registry.release_matching(|_, t| Arc::ptr_eq(t, &a));
    assert_eq!(removed, 3);
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(4));
    assert!(!registry.contains(1));
}

#[test]
fn test_concurrent_register_release_keeps_registry_consistent() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 500;

    let registry = HandleRegistry::new();
    let next = AtomicU64::new(1);
    let shared = table("driver-a");

    // Phase 1: create and destroy on every thread.
    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    let h = next.fetch_add(1, Ordering::Relaxed);
                    registry
                        .register(h, HandleKind::SwapChain, Arc::clone(&shared))
                        .unwrap();
                    assert!(Arc::ptr_eq(&registry.lookup(h).unwrap(), &shared));
                    registry.release(h).unwrap();
                }
            });
        }
    });
    assert!(registry.is_empty());

    // Phase 2: create only, then verify nothing was lost or duplicated.
    let created: Vec<Vec<u64>> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| {
                            let h = next.fetch_add(1, Ordering::Relaxed);
                            registry
                                .register(h, HandleKind::SwapChain, Arc::clone(&shared))
                                .unwrap();
                            h
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let all: HashSet<u64> = created.into_iter().flatten().collect();
    assert_eq!(all.len() as u64, THREADS * PER_THREAD);
    assert_eq!(registry.len() as u64, THREADS * PER_THREAD);
    for h in &all {
        assert!(registry.contains(*h));
    }

    let removed = registry.release_matching(|kind, _| kind == HandleKind::SwapChain);
    assert_eq!(removed as u64, THREADS * PER_THREAD);
    assert!(registry.is_empty());
}
