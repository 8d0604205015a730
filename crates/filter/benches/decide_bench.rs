//! 판정 벤치마크
//!
//! 규칙 수에 따른 `decide` 비용과 리터럴/정규식 매칭 비용을 측정합니다.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logsieve_core::types::{Level, LogEvent};
use logsieve_filter::{DenialCounters, FilterEngine, Matcher, Rule, RuleSet};

fn literal_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| Rule::new(Level::Info, Matcher::literal(format!("noise-{i}"))))
        .collect()
}

fn regex_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            Rule::new(
                Level::Warn,
                Matcher::regex(&format!(r"^Connection reset \(peer {i}\).*")).unwrap(),
            )
            .with_stack_trace(true)
        })
        .collect()
}

fn engine(rules: Vec<Rule>) -> FilterEngine {
    FilterEngine::with_rules(RuleSet::new(rules), Arc::new(DenialCounters::new()))
}

fn bench_accept_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide_accept");
    let event = LogEvent::new(Level::Info, "GET /api/v1/orders 200 12ms");

    for count in [1, 10, 100, 1000] {
        let literal = engine(literal_rules(count));
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("literal", count), &count, |b, _| {
            b.iter(|| literal.decide(black_box(&event)))
        });

        let regex = engine(regex_rules(count));
        group.bench_with_input(BenchmarkId::new("regex", count), &count, |b, _| {
            b.iter(|| regex.decide(black_box(&event)))
        });
    }

    group.finish();
}

fn bench_deny(c: &mut Criterion) {
    let engine = engine(literal_rules(100));
    let first = LogEvent::new(Level::Info, "noise-0 heartbeat");
    let last = LogEvent::new(Level::Info, "noise-99 heartbeat");

    c.bench_function("decide_deny_first_rule", |b| {
        b.iter(|| engine.decide(black_box(&first)))
    });
    c.bench_function("decide_deny_last_rule", |b| {
        b.iter(|| engine.decide(black_box(&last)))
    });
}

fn bench_stack_trace(c: &mut Criterion) {
    let engine = engine(regex_rules(10));
    let frames: Vec<String> = (0..30)
        .map(|i| format!("at com.example.Service.method{i}(Service.java:{i})"))
        .collect();
    let event = LogEvent::new(Level::Warn, "request failed").with_stack_trace(frames);

    c.bench_function("decide_stack_trace_30_frames", |b| {
        b.iter(|| engine.decide(black_box(&event)))
    });
}

criterion_group!(benches, bench_accept_scaling, bench_deny, bench_stack_trace);
criterion_main!(benches);
