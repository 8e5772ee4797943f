use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spanpool::trace::{FinishedSpanRegistry, Tracer};
use spanpool::Context;
use std::fmt::Display;

fn criterion_benchmark(c: &mut Criterion) {
    benchmark_group(c, BenchmarkParameter::NoActiveSpan);
    benchmark_group(c, BenchmarkParameter::WithActiveSpan);
}

fn benchmark_group(c: &mut Criterion, p: BenchmarkParameter) {
    let _guard = match p {
        BenchmarkParameter::NoActiveSpan => None,
        BenchmarkParameter::WithActiveSpan => {
            let tracer = Tracer::new(FinishedSpanRegistry::default());
            Some(Context::current_with_span(tracer.start("span")).attach())
        }
    };

    let mut group = c.benchmark_group("context");

    group.bench_function(BenchmarkId::new("baseline current()", p), |b| {
        b.iter(|| {
            black_box(Context::current());
        })
    });

    group.bench_function(BenchmarkId::new("current().has_active_span()", p), |b| {
        b.iter(|| {
            black_box(Context::current().has_active_span());
        })
    });

    group.bench_function(
        BenchmarkId::new("map_current(|cx| cx.has_active_span())", p),
        |b| {
            b.iter(|| {
                black_box(Context::map_current(|cx| cx.has_active_span()));
            })
        },
    );

    group.finish();
}

#[derive(Copy, Clone)]
enum BenchmarkParameter {
    NoActiveSpan,
    WithActiveSpan,
}

impl Display for BenchmarkParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkParameter::NoActiveSpan => write!(f, "no-active-span"),
            BenchmarkParameter::WithActiveSpan => write!(f, "with-active-span"),
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
