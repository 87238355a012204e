//! Concurrency tests for the mapping registry
//!
//! Many threads resolving the same pair at once must observe one build and
//! one shared entry.

mod test_support;

use pretty_assertions::assert_eq;
use shapeshift_core::{Mapper, Registry, TypePair};
use std::sync::{Arc, Barrier};
use std::thread;
use test_support::*;

const THREADS: usize = 16;

#[test]
fn test_concurrent_resolution_builds_once() {
    init_tracing();
    let registry = Registry::new();
    let pair = TypePair::of::<Customer, CustomerDto>();
    let barrier = Barrier::new(THREADS);

    let entries: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.resolve(pair).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.stats().plans_built, 1);
    assert!(entries.iter().all(|entry| Arc::ptr_eq(entry, &entries[0])));
}

#[test]
fn test_concurrent_projection_builds_once() {
    let registry = Registry::new();
    let pair = TypePair::of::<Employee, EmployeeDto>();
    let barrier = Barrier::new(THREADS);

    let projections: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.projection(pair).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(projections.iter().all(|p| Arc::ptr_eq(p, &projections[0])));
    assert_eq!(registry.stats().plans_built, 1);
}

#[test]
fn test_concurrent_mapping_is_deterministic() {
    let mapper = Mapper::new();
    let barrier = Barrier::new(THREADS);
    let source = customer();

    let results: Vec<CustomerDto> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    mapper.map::<Customer, CustomerDto>(&source).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|dto| dto.id == results[0].id && dto.address == results[0].address));
    // Customer -> CustomerDto, Address -> AddressDto and City -> CityDto
    assert_eq!(mapper.stats().plans_built, 3);
}
