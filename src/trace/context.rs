//! Activation helpers tying [`Span`]s to the current thread's [`Context`].

use crate::trace::Span;
use crate::{Context, ContextGuard};

/// Marks a given `Span` as active in the current thread's context.
///
/// The span stays active until the returned guard is dropped, at which point
/// the previously active span (if any) becomes active again. A span may be
/// finished but still active, and may be active on one thread after it has
/// been deactivated on another.
///
/// Activation never crosses thread boundaries on its own: work scheduled
/// onto another thread must call this again from within that thread before
/// the span is visible there.
///
/// # Examples
///
/// ```
/// use spanpool::trace::{active_span, mark_span_as_active, FinishedSpanRegistry, Tracer};
///
/// let tracer = Tracer::new(FinishedSpanRegistry::default());
/// let span = tracer.start("span-name");
/// {
///     let _guard = mark_span_as_active(span);
///     // anything happening in functions we call can still access the span
///     assert!(active_span().is_some());
/// }
/// assert!(active_span().is_none());
/// ```
#[must_use = "Dropping the guard deactivates the span."]
pub fn mark_span_as_active(span: Span) -> ContextGuard {
    Context::current_with_span(span).attach()
}

/// Returns the span currently active in the calling thread, or `None` if no
/// activation is in effect.
///
/// The returned span shares state with every other clone, so attributes set
/// through it are visible everywhere.
pub fn active_span() -> Option<Span> {
    Context::map_current(|cx| cx.span().cloned())
}

/// Executes a closure with a reference to the calling thread's active span.
///
/// Avoids the clone that [`active_span`] performs when only a lookup is
/// needed.
pub fn get_active_span<F, T>(f: F) -> T
where
    F: FnOnce(Option<&Span>) -> T,
{
    Context::map_current(|cx| f(cx.span()))
}
