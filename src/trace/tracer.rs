use crate::trace::registry::FinishedSpanRegistry;
use crate::trace::span::Span;
use crate::trace::span_id::{IdGenerator, RandomIdGenerator};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Starts new [`Span`]s wired to a [`FinishedSpanRegistry`].
///
/// The tracer itself holds no mutable state; it is cheap to clone and safe to
/// share across threads.
#[derive(Clone)]
pub struct Tracer {
    registry: FinishedSpanRegistry,
    id_generator: Arc<dyn IdGenerator>,
}

impl Tracer {
    /// Creates a tracer publishing finished spans to `registry`, using
    /// random span ids.
    pub fn new(registry: FinishedSpanRegistry) -> Self {
        Tracer {
            registry,
            id_generator: Arc::new(RandomIdGenerator::default()),
        }
    }

    /// Returns a builder for configuring a tracer.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }

    /// Returns the registry this tracer publishes finished spans to.
    pub fn registry(&self) -> &FinishedSpanRegistry {
        &self.registry
    }

    /// Starts a new span with the given name, no attributes, and a start
    /// time of now.
    ///
    /// Starting a span has no side effects; it is not active anywhere until
    /// a context carrying it is attached.
    pub fn start<T>(&self, name: T) -> Span
    where
        T: Into<Cow<'static, str>>,
    {
        Span::new(
            self.id_generator.new_span_id(),
            name.into(),
            self.registry.clone(),
        )
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("id_generator", &self.id_generator)
            .finish()
    }
}

/// Builder for [`Tracer`].
#[derive(Debug, Default)]
pub struct TracerBuilder {
    registry: Option<FinishedSpanRegistry>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl TracerBuilder {
    /// The registry finished spans are published to. Defaults to a fresh
    /// empty registry.
    pub fn with_registry(mut self, registry: FinishedSpanRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The id generator used for new spans. Defaults to
    /// [`RandomIdGenerator`].
    pub fn with_id_generator<G: IdGenerator + 'static>(mut self, id_generator: G) -> Self {
        self.id_generator = Some(Arc::new(id_generator));
        self
    }

    /// Builds the tracer.
    pub fn build(self) -> Tracer {
        Tracer {
            registry: self.registry.unwrap_or_default(),
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(RandomIdGenerator::default())),
        }
    }
}
