//! Validation throughput benchmarks
//!
//! Measures warm-cache validation of flat, nested and container-heavy
//! graphs, plus the one-off cost of building metadata.

#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vigil_validate::prelude::*;

#[derive(Constrained)]
struct Employee {
    #[validate(not_blank, size(max = 80))]
    name: String,

    #[validate(email)]
    email: String,

    #[validate(range(min = 18, max = 100))]
    age: u32,

    #[validate(positive)]
    salary: f64,
}

#[derive(Constrained)]
struct Address {
    #[validate(not_blank)]
    city: String,

    #[validate(pattern(regexp = "[0-9]{2}-[0-9]{3}"))]
    postal_code: String,
}

#[derive(Constrained)]
struct Customer {
    #[validate(not_blank)]
    name: String,

    #[validate(nested)]
    address: Address,

    #[validate(each_nested)]
    previous: Vec<Address>,
}

#[derive(Constrained)]
struct Batch {
    #[validate(not_empty, each_nested)]
    employees: Vec<Employee>,

    #[validate(each(not_blank))]
    tags: Vec<String>,
}

fn employee(age: u32) -> Employee {
    Employee {
        name: "John".to_string(),
        email: "john.doe@example.com".to_string(),
        age,
        salary: 4200.0,
    }
}

fn address() -> Address {
    Address {
        city: "Warsaw".to_string(),
        postal_code: "00-950".to_string(),
    }
}

/// Flat struct, valid and invalid
fn bench_flat(c: &mut Criterion) {
    let engine = Engine::new();
    let valid = employee(30);
    let invalid = Employee {
        salary: -1.0,
        ..employee(15)
    };
    // Warm the metadata cache
    let _ = engine.validate(&valid);

    let mut group = c.benchmark_group("flat");

    group.bench_function("valid", |b| {
        b.iter(|| engine.validate(black_box(&valid)))
    });

    group.bench_function("invalid", |b| {
        b.iter(|| engine.validate(black_box(&invalid)))
    });

    group.finish();
}

/// Cascading into nested objects and element lists
fn bench_nested(c: &mut Criterion) {
    let engine = Engine::new();
    let customer = Customer {
        name: "Ada".to_string(),
        address: address(),
        previous: (0..4).map(|_| address()).collect(),
    };
    let _ = engine.validate(&customer);

    c.bench_function("nested/customer", |b| {
        b.iter(|| engine.validate(black_box(&customer)))
    });
}

/// Container size scaling
fn bench_batch(c: &mut Criterion) {
    let engine = Engine::new();
    let mut group = c.benchmark_group("batch");

    for size in [10usize, 100, 1000] {
        let batch = Batch {
            employees: (0..size).map(|i| employee(18 + (i % 90) as u32)).collect(),
            tags: (0..size).map(|i| format!("tag-{i}")).collect(),
        };
        let _ = engine.validate(&batch);

        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| engine.validate(black_box(batch)))
        });
    }

    group.finish();
}

/// Cold metadata build: a fresh engine per iteration
fn bench_metadata(c: &mut Criterion) {
    c.bench_function("metadata/cold_build", |b| {
        b.iter(|| {
            let engine = Engine::new();
            engine.describe::<Customer>().map(|m| m.members().len())
        })
    });
}

criterion_group!(benches, bench_flat, bench_nested, bench_batch, bench_metadata);
criterion_main!(benches);
