//! Active-span propagation and finished-span aggregation for thread-pool
//! workloads.
//!
//! `spanpool` is the small core needed to trace work that hops between
//! threads of a worker pool: a [`Span`] whose attributes may be written from
//! several threads at once, an explicit per-thread activation stack with RAII
//! scope guards, and a [`FinishedSpanRegistry`] that callers can block on
//! until an expected number of spans has completed.
//!
//! Activation is per thread, never ambient: a job handed to another worker
//! starts with an empty activation stack and must re-activate the span itself
//! before touching it through the current context. This makes propagation
//! boundaries explicit and testable.
//!
//! [`Span`]: crate::trace::Span
//! [`FinishedSpanRegistry`]: crate::trace::FinishedSpanRegistry
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use spanpool::pool::WorkerPool;
//! use spanpool::trace::{mark_span_as_active, FinishedSpanRegistry, Tracer};
//! use spanpool::KeyValue;
//!
//! let registry = FinishedSpanRegistry::default();
//! let tracer = Tracer::new(registry.clone());
//! let pool = WorkerPool::new(2);
//!
//! let span = tracer.start("request");
//! pool.submit({
//!     let span = span.clone();
//!     move || {
//!         // the worker's context starts empty, activate explicitly
//!         let _scope = mark_span_as_active(span.clone());
//!         span.set_attribute(KeyValue::new("stage", "enqueue"));
//!         span.finish();
//!     }
//! });
//!
//! registry
//!     .await_count(1, Duration::from_secs(5))
//!     .expect("span finishes");
//! assert_eq!(registry.get_finished()[0].name, "request");
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod common;
mod macros;

pub mod context;
pub mod pool;
pub mod trace;

pub use common::{Key, KeyValue, Value};
pub use context::{Context, ContextGuard};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    //! Only used by the internal logging macros, not part of the public API.
    pub use tracing::{debug, error, warn};
}
