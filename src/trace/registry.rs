use crate::trace::{SpanData, TraceError, TraceResult};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A thread-safe collector of finished span snapshots.
///
/// The registry decouples producers (spans finishing on worker threads) from
/// a consumer that eventually inspects them: finishing never blocks, and
/// [`await_count`] blocks only the calling thread until the expected number
/// of spans has been recorded or the timeout elapses.
///
/// Cloning the registry is cheap and all clones share the same storage.
/// Insertion order follows completion order, which carries no meaning across
/// concurrently finishing spans.
///
/// [`await_count`]: FinishedSpanRegistry::await_count
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use spanpool::trace::{FinishedSpanRegistry, Tracer};
///
/// let registry = FinishedSpanRegistry::default();
/// let tracer = Tracer::new(registry.clone());
///
/// tracer.start("work").finish();
///
/// registry.await_count(1, Duration::from_secs(1)).unwrap();
/// assert_eq!(registry.get_finished().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FinishedSpanRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    spans: Mutex<Vec<SpanData>>,
    finished: Condvar,
}

impl FinishedSpanRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished span snapshot and wakes any waiting callers.
    pub(crate) fn record(&self, span: SpanData) {
        if let Ok(mut spans) = self.inner.spans.lock() {
            spans.push(span);
            self.inner.finished.notify_all();
        }
    }

    /// Returns the number of finished spans recorded so far.
    pub fn count(&self) -> usize {
        self.inner
            .spans
            .lock()
            .map(|spans| spans.len())
            .unwrap_or(0)
    }

    /// Returns the finished spans in completion order.
    pub fn get_finished(&self) -> Vec<SpanData> {
        self.inner
            .spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.inner.spans.lock().map(|mut spans| spans.clear());
    }

    /// Blocks until at least `target` spans have finished, or the timeout
    /// elapses.
    ///
    /// A timeout is surfaced as [`TraceError::AwaitTimedOut`]; it signals a
    /// lost span or a concurrency bug and should be treated as fatal by the
    /// caller. The wait never exceeds `timeout` by more than scheduling
    /// slack and never hangs indefinitely.
    pub fn await_count(&self, target: usize, timeout: Duration) -> TraceResult<()> {
        let spans = self.inner.spans.lock()?;
        // wait_timeout_while re-checks the predicate on every wakeup, so
        // spurious wakeups neither end the wait early nor extend it past the
        // deadline.
        let (spans, _wait) =
            self.inner
                .finished
                .wait_timeout_while(spans, timeout, |spans| spans.len() < target)?;
        if spans.len() >= target {
            Ok(())
        } else {
            Err(TraceError::AwaitTimedOut(timeout))
        }
    }
}
