//! End-to-end scenario: one span propagated across a chain of nested
//! callbacks on a worker pool, finished exactly once by the innermost
//! callback.

use std::sync::mpsc;
use std::time::Duration;

use spanpool::pool::{Submitter, WorkerPool};
use spanpool::trace::{
    active_span, mark_span_as_active, FinishedSpanRegistry, Span, Tracer,
};
use spanpool::KeyValue;

fn submit_callbacks(submitter: &Submitter, span: Span) {
    let outer = submitter.clone();
    submitter.submit(move || {
        let _scope = mark_span_as_active(span.clone());
        span.set_attribute(KeyValue::new("key1", "1"));

        let middle = outer.clone();
        outer.submit(move || {
            let _scope = mark_span_as_active(span.clone());
            span.set_attribute(KeyValue::new("key2", "2"));

            middle.submit(move || {
                {
                    let _scope = mark_span_as_active(span.clone());
                    span.set_attribute(KeyValue::new("key3", "3"));
                }
                span.finish();
            });
        });
    });
}

#[test]
fn span_propagates_across_nested_callbacks() {
    let registry = FinishedSpanRegistry::default();
    let tracer = Tracer::new(registry.clone());
    let pool = WorkerPool::new(3);

    let span = tracer.start("one");
    submit_callbacks(&pool.submitter(), span);

    registry
        .await_count(1, Duration::from_secs(15))
        .expect("the innermost callback finishes the span");

    let spans = registry.get_finished();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "one");

    assert_eq!(spans[0].attributes.len(), 3);
    for i in 1..=3 {
        let value = spans[0]
            .attribute(&format!("key{i}"))
            .unwrap_or_else(|| panic!("key{i} should be recorded"));
        assert_eq!(value.as_str(), i.to_string());
    }

    assert!(active_span().is_none());
}

#[test]
fn worker_context_starts_empty() {
    let registry = FinishedSpanRegistry::default();
    let tracer = Tracer::new(registry);
    let pool = WorkerPool::new(1);

    let span = tracer.start("root-thread-only");
    let _guard = mark_span_as_active(span);
    assert!(active_span().is_some());

    // the worker has its own context stack; without an explicit activation
    // it sees no active span
    let (tx, rx) = mpsc::channel();
    pool.submit(move || {
        tx.send(active_span().is_none()).ok();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
}

#[test]
fn double_finish_from_racing_callbacks_registers_once() {
    let registry = FinishedSpanRegistry::default();
    let tracer = Tracer::new(registry.clone());
    let pool = WorkerPool::new(2);

    let span = tracer.start("contended");
    for _ in 0..2 {
        let span = span.clone();
        pool.submit(move || {
            span.finish();
        });
    }

    registry
        .await_count(1, Duration::from_secs(15))
        .expect("at least one finish lands");
    drop(pool); // both callbacks have run once the workers are joined
    assert_eq!(registry.count(), 1);
}

#[test]
fn awaiting_more_spans_than_finish_times_out() {
    let registry = FinishedSpanRegistry::default();
    let tracer = Tracer::new(registry.clone());

    tracer.start("only-one").finish();

    let result = registry.await_count(2, Duration::from_millis(200));
    assert!(result.is_err());
    assert_eq!(registry.count(), 1);
}

#[test]
fn value_compares_against_expected_strings() {
    // assert_eq! on Value and &str keeps scenario assertions readable
    let registry = FinishedSpanRegistry::default();
    let tracer = Tracer::new(registry.clone());
    let span = tracer.start("typed");
    span.set_attribute(KeyValue::new("key1", "1"));
    span.finish();

    let spans = registry.get_finished();
    assert_eq!(*spans[0].attribute("key1").expect("key1 recorded"), "1");
}
