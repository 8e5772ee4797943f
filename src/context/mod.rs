//! Execution-scoped propagation of the active span.
//!
//! A [`Context`] carries the currently active [`Span`] for one logical
//! execution unit. Contexts are attached to the current thread with
//! [`Context::attach`], which returns a [`ContextGuard`] restoring the
//! previous context when dropped. The stack behind this is strictly
//! thread-local: a job scheduled onto another worker thread starts with an
//! empty stack and must attach a context of its own before the span is
//! visible through [`Context::current`].

use crate::spanpool_warn;
use crate::trace::Span;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

#[cfg(test)]
mod tests;

thread_local! {
    static CURRENT_CONTEXT: RefCell<ContextStack> = RefCell::new(ContextStack::default());
}

/// An execution-scoped reference to the currently active [`Span`].
///
/// `Context`s are immutable; making a span active produces a new context
/// rather than mutating an existing one. Cloning is cheap, the span state
/// itself is shared.
///
/// # Examples
///
/// ```
/// use spanpool::trace::{FinishedSpanRegistry, Tracer};
/// use spanpool::Context;
///
/// let tracer = Tracer::new(FinishedSpanRegistry::default());
/// let span = tracer.start("work");
///
/// assert!(!Context::current().has_active_span());
/// {
///     let _guard = Context::current_with_span(span).attach();
///     assert!(Context::current().has_active_span());
/// }
/// // dropping the guard restores the previous context
/// assert!(!Context::current().has_active_span());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    pub(crate) span: Option<Span>,
}

impl Context {
    /// Creates an empty `Context` with no active span.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a snapshot of the current thread's context.
    pub fn current() -> Self {
        Self::map_current(|cx| cx.clone())
    }

    /// Applies a function to the current thread's context, returning its
    /// result.
    ///
    /// This avoids cloning the current context when only a lookup is needed.
    ///
    /// Note: this function will panic if another context is attached while
    /// the current one is still borrowed.
    pub fn map_current<T>(f: impl FnOnce(&Context) -> T) -> T {
        CURRENT_CONTEXT.with(|cx| cx.borrow().map_current_cx(f))
    }

    /// Returns a new context with the given span as its active span.
    pub fn with_span(&self, span: Span) -> Self {
        Context { span: Some(span) }
    }

    /// Returns a new context based on the current one with the given span as
    /// its active span.
    pub fn current_with_span(span: Span) -> Self {
        Self::map_current(|cx| cx.with_span(span))
    }

    /// Returns a reference to this context's span, if one has been set.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Returns whether an active span has been set.
    pub fn has_active_span(&self) -> bool {
        self.span.is_some()
    }

    /// Replaces the current thread's context with this context.
    ///
    /// Dropping the returned [`ContextGuard`] restores the previous context.
    /// The restore happens on every exit path, including unwinding, because
    /// it runs in the guard's `Drop` impl.
    ///
    /// # Examples
    ///
    /// ```
    /// use spanpool::trace::{FinishedSpanRegistry, Tracer};
    /// use spanpool::Context;
    ///
    /// let tracer = Tracer::new(FinishedSpanRegistry::default());
    /// let span = tracer.start("outer");
    ///
    /// // NOTE: a variable name after the underscore is **required** or rust
    /// // will drop the guard, restoring the previous context _immediately_.
    /// let _guard = Context::current_with_span(span).attach();
    /// assert!(Context::current().has_active_span());
    /// ```
    pub fn attach(self) -> ContextGuard {
        let cx_pos = CURRENT_CONTEXT.with(|cx| cx.borrow_mut().push(self));

        ContextGuard {
            cx_pos,
            _marker: PhantomData,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Context");
        match &self.span {
            Some(span) => dbg.field("span", &span.span_id()),
            None => dbg.field("span", &"None"),
        };
        dbg.finish()
    }
}

/// A guard that resets the current context to the prior context when dropped.
#[derive(Debug)]
pub struct ContextGuard {
    // The position of the context in the stack, used to pop it again.
    cx_pos: u16,
    // Ensure this type is !Send as it relies on thread locals
    _marker: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let pos = self.cx_pos;
        if pos > ContextStack::BASE_POS && pos < ContextStack::MAX_POS {
            CURRENT_CONTEXT.with(|cx| cx.borrow_mut().pop_id(pos));
        }
    }
}

/// Tracks the [`Context`] instances attached to the current thread.
///
/// Guards carry the stack position of their context, so they may be dropped
/// in any order: dropping a guard that is not at the top of the stack only
/// clears its slot, while dropping the topmost guard restores the nearest
/// still-live predecessor. Out-of-LIFO drops are reported through the
/// internal warn log rather than treated as fatal.
struct ContextStack {
    /// The context currently active on this thread. Kept outside `stack` so
    /// that lookups never touch the `Vec`.
    current_cx: Context,
    /// Previously attached contexts. `None` marks a slot whose guard was
    /// dropped out of order.
    stack: Vec<Option<Context>>,
    // Ensure this type is !Send as it relies on thread locals
    _marker: PhantomData<*const ()>,
}

impl ContextStack {
    const BASE_POS: u16 = 0;
    const MAX_POS: u16 = u16::MAX;
    const INITIAL_CAPACITY: usize = 8;

    #[inline(always)]
    fn push(&mut self, cx: Context) -> u16 {
        // Position 0 is reserved for the base (empty) context, so the next
        // position is the stack length plus one.
        let next_pos = self.stack.len() + 1;
        if next_pos < ContextStack::MAX_POS.into() {
            let previous_cx = std::mem::replace(&mut self.current_cx, cx);
            self.stack.push(Some(previous_cx));
            next_pos as u16
        } else {
            spanpool_warn!(
                name: "Context.AttachFailed",
                message = format!("Too many attached contexts, max is {}. \
                  The current context is left unchanged and dropping the \
                  returned ContextGuard has no effect.",
                  ContextStack::MAX_POS)
            );
            ContextStack::MAX_POS
        }
    }

    #[inline(always)]
    fn pop_id(&mut self, pos: u16) {
        if pos == ContextStack::BASE_POS || pos == ContextStack::MAX_POS {
            // The base context cannot be popped and the overflow position
            // was never attached.
            spanpool_warn!(
                name: "Context.OutOfOrderDrop",
                position = pos,
                message = if pos == ContextStack::BASE_POS {
                    "Attempted to pop the base context which is not allowed"
                } else {
                    "Attempted to pop the overflow position which is not allowed"
                }
            );
            return;
        }
        let len = self.stack.len() as u16;
        if pos == len {
            // Topmost guard dropped: skip over any slots cleared by earlier
            // out-of-order drops, then restore the nearest live context.
            while let Some(None) = self.stack.last() {
                _ = self.stack.pop();
            }
            if let Some(Some(previous_cx)) = self.stack.pop() {
                self.current_cx = previous_cx;
            }
        } else {
            if pos > len {
                spanpool_warn!(
                    name: "Context.PopOutOfBounds",
                    position = pos,
                    stack_length = len,
                    message = "Attempted to pop beyond the end of the context stack"
                );
                return;
            }
            // Out-of-LIFO drop: clear the slot, the current context stays.
            spanpool_warn!(
                name: "Context.OutOfOrderDrop",
                position = pos,
                stack_length = len,
                message = "Scope guard dropped out of LIFO order, clearing its slot"
            );
            _ = self.stack[pos as usize].take();
        }
    }

    #[inline(always)]
    fn map_current_cx<T>(&self, f: impl FnOnce(&Context) -> T) -> T {
        f(&self.current_cx)
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        ContextStack {
            current_cx: Context::default(),
            stack: Vec::with_capacity(ContextStack::INITIAL_CAPACITY),
            _marker: PhantomData,
        }
    }
}
