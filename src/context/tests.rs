use super::*;
use crate::trace::{FinishedSpanRegistry, SpanId, Tracer};

fn test_tracer() -> Tracer {
    Tracer::new(FinishedSpanRegistry::default())
}

fn active_span_id() -> Option<SpanId> {
    Context::map_current(|cx| cx.span().map(|span| span.span_id()))
}

#[test]
fn empty_context_has_no_span() {
    let cx = Context::new();
    assert!(cx.span().is_none());
    assert!(!cx.has_active_span());
}

#[test]
fn nested_scopes_restore_previous_span() {
    let tracer = test_tracer();
    let outer = tracer.start("outer");
    let inner = tracer.start("inner");
    let (outer_id, inner_id) = (outer.span_id(), inner.span_id());

    let _outer_guard = Context::current_with_span(outer).attach();
    assert_eq!(active_span_id(), Some(outer_id));

    {
        let _inner_guard = Context::current_with_span(inner).attach();
        assert_eq!(active_span_id(), Some(inner_id));
    }

    // resets to the outer span when the inner guard is dropped
    assert_eq!(active_span_id(), Some(outer_id));
}

#[test]
fn overlapping_guards() {
    let tracer = test_tracer();
    let first = tracer.start("first");
    let second = tracer.start("second");
    let (first_id, second_id) = (first.span_id(), second.span_id());

    let first_guard = Context::current_with_span(first).attach();
    let second_guard = Context::current_with_span(second).attach();
    assert_eq!(active_span_id(), Some(second_id));

    // dropping the outer guard first must not disturb the active span
    drop(first_guard);
    assert_eq!(active_span_id(), Some(second_id));

    drop(second_guard);
    assert_eq!(active_span_id(), None);
    // the out-of-order drop must not resurrect the first span
    assert_ne!(active_span_id(), Some(first_id));
}

#[test]
fn guard_released_on_unwind() {
    let tracer = test_tracer();
    let span = tracer.start("short-lived");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = Context::current_with_span(span).attach();
        panic!("job failed");
    }));
    assert!(result.is_err());

    // the guard's Drop ran during unwinding and restored the empty context
    assert_eq!(active_span_id(), None);
}

#[test]
fn other_threads_start_with_empty_stack() {
    let tracer = test_tracer();
    let span = tracer.start("main-thread-only");
    let _guard = Context::current_with_span(span).attach();
    assert!(Context::current().has_active_span());

    let seen_on_worker = std::thread::spawn(|| Context::current().has_active_span())
        .join()
        .expect("worker thread");
    assert!(!seen_on_worker);
}

#[test]
fn pop_id_out_of_order() {
    let tracer = test_tracer();
    let mut stack = ContextStack::default();

    let cx1 = Context::new().with_span(tracer.start("one"));
    let cx2 = Context::new().with_span(tracer.start("two"));
    let cx3 = Context::new().with_span(tracer.start("three"));
    let id3_span = cx3.span().map(|s| s.span_id());
    let id1_span = cx1.span().map(|s| s.span_id());

    let id1 = stack.push(cx1);
    let id2 = stack.push(cx2);
    let id3 = stack.push(cx3);

    // popping a middle position only clears its slot
    stack.pop_id(id2);
    assert_eq!(stack.current_cx.span().map(|s| s.span_id()), id3_span);
    assert_eq!(stack.stack.len(), 3);

    // popping the top restores the nearest live predecessor
    stack.pop_id(id3);
    assert_eq!(stack.current_cx.span().map(|s| s.span_id()), id1_span);
    assert_eq!(stack.stack.len(), 1);

    stack.pop_id(id1);
    assert!(stack.current_cx.span().is_none());
    assert_eq!(stack.stack.len(), 0);
}

#[test]
fn pop_id_edge_cases() {
    let mut stack = ContextStack::default();

    // the base and overflow positions are never popped
    stack.pop_id(ContextStack::BASE_POS);
    assert_eq!(stack.stack.len(), 0);
    stack.pop_id(ContextStack::MAX_POS);
    assert_eq!(stack.stack.len(), 0);

    // out-of-bounds positions are ignored
    stack.pop_id(1000);
    assert_eq!(stack.stack.len(), 0);
    stack.pop_id(1);
    assert_eq!(stack.stack.len(), 0);
}

#[test]
fn push_overflow_leaves_current_unchanged() {
    let tracer = test_tracer();
    let mut stack = ContextStack::default();
    let max_pos = ContextStack::MAX_POS as usize;

    for i in 0..max_pos {
        let id = stack.push(Context::new());
        assert_eq!(id, (i + 1) as u16);
    }

    let overflow_span = tracer.start("overflow");
    let overflow_id = overflow_span.span_id();
    let id = stack.push(Context::new().with_span(overflow_span));
    assert_eq!(id, ContextStack::MAX_POS);

    // the overflowing context was not attached
    assert_ne!(
        stack.current_cx.span().map(|s| s.span_id()),
        Some(overflow_id)
    );
}

#[test]
fn initial_capacity() {
    let stack = ContextStack::default();
    assert_eq!(stack.stack.capacity(), ContextStack::INITIAL_CAPACITY);
}
