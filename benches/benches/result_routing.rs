// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_result::registry::ResultRegistry;
use understory_result::types::{Listener, Payload};

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("request_{i}")).collect()
}

fn noop() -> Listener {
    Rc::new(|p: &Payload| {
        black_box(p.len());
    })
}

fn bench_set_then_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending_pickup");
    for &n in &[16_usize, 256, 4096] {
        let keys = keys(n);
        let payload = Payload::from(vec![0_u8; 64]);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("n={n}"), |b| {
            b.iter_batched(
                ResultRegistry::<u32>::new,
                |mut registry| {
                    for key in &keys {
                        registry.set_result(key.as_str(), payload.clone());
                    }
                    for key in &keys {
                        registry.register_listener(key.as_str(), 0, noop());
                    }
                    black_box(registry.pending_len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_live_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("live_fan_out");
    for &listeners in &[1_u32, 8, 64] {
        let mut registry = ResultRegistry::<u32>::new();
        for id in 0..listeners {
            registry.register_listener("confirm", id, noop());
        }
        let payload = Payload::from(vec![1_u8]);
        group.throughput(Throughput::Elements(u64::from(listeners)));
        group.bench_function(format!("listeners={listeners}"), |b| {
            b.iter(|| registry.set_result("confirm", black_box(payload.clone())));
        });
    }
    group.finish();
}

fn bench_register_unregister(c: &mut Criterion) {
    let keys = keys(1024);
    c.bench_function("register_unregister_1024", |b| {
        let mut registry = ResultRegistry::<u32>::new();
        b.iter(|| {
            for (id, key) in keys.iter().enumerate() {
                registry.register_listener(key.as_str(), id as u32, noop());
            }
            for (id, key) in keys.iter().enumerate() {
                registry.unregister_listener(key, &(id as u32));
            }
            black_box(registry.is_empty());
        });
    });
}

criterion_group!(
    benches,
    bench_set_then_register,
    bench_live_fan_out,
    bench_register_unregister
);
criterion_main!(benches);
