//! The tracing core: spans, activation, and the finished-span registry.
//!
//! A [`Tracer`] starts [`Span`]s wired to a [`FinishedSpanRegistry`]. Spans
//! are cheap to clone and share one synchronized state, so several worker
//! threads may set attributes on the same span concurrently. Exactly one
//! [`Span::finish`] publishes the immutable [`SpanData`] snapshot to the
//! registry; callers block on [`FinishedSpanRegistry::await_count`] until the
//! expected number of spans has completed.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use spanpool::trace::{active_span, mark_span_as_active, FinishedSpanRegistry, Tracer};
//! use spanpool::KeyValue;
//!
//! let registry = FinishedSpanRegistry::default();
//! let tracer = Tracer::new(registry.clone());
//!
//! let span = tracer.start("one");
//! {
//!     let _scope = mark_span_as_active(span.clone());
//!     assert!(active_span().is_some());
//!     span.set_attribute(KeyValue::new("key1", "1"));
//! }
//! span.finish();
//!
//! registry.await_count(1, Duration::from_secs(1)).unwrap();
//! assert!(active_span().is_none());
//! ```

use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;

mod context;
mod registry;
mod span;
mod span_id;
mod tracer;

pub use self::{
    context::{active_span, get_active_span, mark_span_as_active},
    registry::FinishedSpanRegistry,
    span::{Span, SpanData},
    span_id::{IdGenerator, RandomIdGenerator, SequentialIdGenerator, SpanId},
    tracer::{Tracer, TracerBuilder},
};

/// Describe the result of operations in the tracing core.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the tracing core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// The registry did not reach the requested number of finished spans
    /// before the deadline.
    ///
    /// This usually means a span was lost or never finished; callers should
    /// treat it as fatal rather than retry.
    #[error("Timed out after {} ms waiting for finished spans", .0.as_millis())]
    AwaitTimedOut(Duration),

    /// Other errors propagated from the tracing core that weren't covered
    /// above.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl<T> From<PoisonError<T>> for TraceError {
    fn from(err: PoisonError<T>) -> Self {
        TraceError::Other(err.to_string().into())
    }
}
