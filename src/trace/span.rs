//! # Span
//!
//! A `Span` records one traced operation: a name, an id, timestamps, and a
//! set of string attributes. Cloning a `Span` shares the same underlying
//! state, which is how one span is mutated from several worker threads at
//! once; every mutation goes through the span's own mutex.
//!
//! Finishing is a write-once transition. The first call to [`Span::finish`]
//! takes the mutable state out of the span, stamps the end time, and
//! publishes an immutable [`SpanData`] snapshot to the registry; later calls
//! find nothing to take and are no-ops. Attribute writes that completed
//! before `finish` acquired the lock are always part of the snapshot. A write
//! racing `finish` with no happens-before ordering between them may land
//! before or after the state is taken, so it may or may not be visible in the
//! snapshot; writes arriving after the transition are dropped and logged.

use crate::spanpool_debug;
use crate::trace::registry::FinishedSpanRegistry;
use crate::trace::span_id::SpanId;
use crate::{KeyValue, Value};
use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Single traced operation.
///
/// Spans are created through [`Tracer::start`] and shared across threads by
/// cloning. Dropping a span clone does not finish it; completion is always an
/// explicit [`finish`] call from exactly one point in the work.
///
/// [`Tracer::start`]: crate::trace::Tracer::start
/// [`finish`]: Span::finish
#[derive(Clone, Debug)]
pub struct Span {
    span_id: SpanId,
    name: Cow<'static, str>,
    /// Mutable state, `None` once the span has finished.
    state: Arc<Mutex<Option<SpanState>>>,
    registry: FinishedSpanRegistry,
}

#[derive(Debug)]
struct SpanState {
    start_time: SystemTime,
    attributes: Vec<KeyValue>,
}

impl Span {
    pub(crate) fn new(
        span_id: SpanId,
        name: Cow<'static, str>,
        registry: FinishedSpanRegistry,
    ) -> Self {
        Span {
            span_id,
            name,
            state: Arc::new(Mutex::new(Some(SpanState {
                start_time: SystemTime::now(),
                attributes: Vec::new(),
            }))),
            registry,
        }
    }

    /// Returns this span's id.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Returns this span's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operate on a mutable reference to the span state.
    fn with_state<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&mut SpanState) -> T,
    {
        self.state
            .lock()
            .ok()
            .and_then(|mut guard| guard.as_mut().map(f))
    }

    /// Sets a single attribute, overwriting any previous value for the key.
    ///
    /// Safe to call from any thread holding a clone of this span. Setting an
    /// attribute on a finished span never raises an error, tracing must not
    /// affect the primary control flow; the write is dropped and logged.
    pub fn set_attribute(&self, attribute: KeyValue) {
        let recorded = self
            .with_state(|state| {
                match state
                    .attributes
                    .iter_mut()
                    .find(|existing| existing.key == attribute.key)
                {
                    Some(existing) => existing.value = attribute.value.clone(),
                    None => state.attributes.push(attribute.clone()),
                }
            })
            .is_some();
        if !recorded {
            spanpool_debug!(
                name: "Span.SetAttributeAfterFinish",
                span_id = self.span_id.to_string(),
                key = attribute.key.as_str()
            );
        }
    }

    /// Returns the current value for an attribute key, if the span is still
    /// recording and the key has been set.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.with_state(|state| {
            state
                .attributes
                .iter()
                .find(|kv| kv.key.as_str() == key)
                .map(|kv| kv.value.clone())
        })
        .flatten()
    }

    /// Returns `true` until the span has finished.
    pub fn is_recording(&self) -> bool {
        self.state
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Signals that the operation described by this span has now ended.
    ///
    /// The first call publishes the span to the registry; any later call is a
    /// no-op so a span can never be registered twice.
    pub fn finish(&self) {
        self.finish_with_timestamp(SystemTime::now());
    }

    /// Signals that the operation described by this span ended at the given
    /// time.
    pub fn finish_with_timestamp(&self, timestamp: SystemTime) {
        // Take the state out of the mutex, marking the span as finished.
        // Attribute writes serialized before this point are all present in
        // the taken state.
        let state = match self.state.lock().ok().and_then(|mut guard| guard.take()) {
            Some(state) => state,
            None => {
                // Already finished
                spanpool_debug!(
                    name: "Span.FinishAfterFinish",
                    span_id = self.span_id.to_string()
                );
                return;
            }
        };

        self.registry.record(SpanData {
            span_id: self.span_id,
            name: self.name.clone(),
            start_time: state.start_time,
            end_time: timestamp,
            attributes: state.attributes,
        });
    }
}

/// Immutable snapshot of a finished span.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// Span id.
    pub span_id: SpanId,
    /// Span name.
    pub name: Cow<'static, str>,
    /// Span start time.
    pub start_time: SystemTime,
    /// Span end time.
    pub end_time: SystemTime,
    /// Span attributes at the moment the span finished.
    pub attributes: Vec<KeyValue>,
}

impl SpanData {
    /// Returns the value recorded for the given attribute key.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }
}
