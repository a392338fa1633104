//! Shape registry and completion handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use ao_core::{ExprGraph, Mesher, NodeId};
use uuid::Uuid;

use crate::backend::GraphicsBackend;
use crate::config::RenderConfig;
use crate::shape::{CompletionOutcome, PipelineError, RenderState, Shape};
use crate::worker::{Completion, RenderDispatcher, RenderStats};

/// Notification emitted when a shape's pipeline settles.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeEvent {
    /// A new mesh was installed.
    MeshReady {
        /// Shape that received the mesh.
        id: Uuid,
        /// Triangle count of the new mesh.
        triangles: usize,
        /// Whether the graph changed while the mesh was computed.
        stale: bool,
    },
    /// The shape's worker failed.
    Failed {
        /// Shape that failed.
        id: Uuid,
        /// Failure message.
        reason: String,
    },
}

/// Owns all shapes of a scene and the channel their workers report to.
///
/// Every method must be called from the thread that owns the graphics
/// context; results from workers are only applied in [`Scene::poll`] and
/// [`Scene::wait`].
pub struct Scene<B: GraphicsBackend> {
    shapes: HashMap<Uuid, Shape<B>>,
    dispatcher: RenderDispatcher,
    completions: Receiver<Completion>,
    config: RenderConfig,
}

impl<B: GraphicsBackend> Scene<B> {
    /// Create an empty scene meshing with `mesher`.
    pub fn new(mesher: Arc<dyn Mesher>, config: RenderConfig) -> Self {
        let (dispatcher, completions) = RenderDispatcher::new(mesher);
        Self {
            shapes: HashMap::new(),
            dispatcher,
            completions,
            config,
        }
    }

    /// Current render configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent renders.
    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    /// Add a shape and return its id.
    pub fn add(&mut self, graph: ExprGraph) -> Uuid {
        let shape = Shape::new(graph);
        let id = shape.id();
        self.shapes.insert(id, shape);
        tracing::info!("Scene now has {} shapes", self.shapes.len());
        id
    }

    /// Remove a shape. A running worker finishes and its result is dropped.
    pub fn remove(&mut self, id: Uuid) -> Option<Shape<B>> {
        self.shapes.remove(&id)
    }

    /// Get a shape.
    pub fn get(&self, id: Uuid) -> Option<&Shape<B>> {
        self.shapes.get(&id)
    }

    /// Get a shape mutably.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Shape<B>> {
        self.shapes.get_mut(&id)
    }

    fn shape_mut(&mut self, id: Uuid) -> Result<&mut Shape<B>, PipelineError> {
        self.shapes
            .get_mut(&id)
            .ok_or(PipelineError::UnknownShape(id))
    }

    /// Pipeline state of a shape.
    pub fn state(&self, id: Uuid) -> Option<RenderState> {
        self.get(id).map(Shape::state)
    }

    /// Check if a shape exists.
    pub fn has(&self, id: Uuid) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Number of shapes.
    pub fn count(&self) -> usize {
        self.shapes.len()
    }

    /// Check if there are any shapes.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterate over all shapes.
    pub fn iter(&self) -> impl Iterator<Item = &Shape<B>> {
        self.shapes.values()
    }

    /// Number of shapes with a computation in flight.
    pub fn in_flight(&self) -> usize {
        self.shapes
            .values()
            .filter(|s| s.in_flight_job().is_some())
            .count()
    }

    /// Start meshing a shape in the background.
    pub fn start_render(&mut self, id: Uuid) -> Result<(), PipelineError> {
        let region = self.config.region;
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(PipelineError::UnknownShape(id))?;
        shape.start_render(&mut self.dispatcher, &region)
    }

    /// Update a `Mutable` node of a shape's graph.
    pub fn set_mutable(&mut self, id: Uuid, node: NodeId, value: f32) -> Result<(), PipelineError> {
        self.shape_mut(id)?.set_mutable(node, value)
    }

    /// Replace a shape's graph.
    pub fn set_graph(&mut self, id: Uuid, graph: ExprGraph) -> Result<(), PipelineError> {
        self.shape_mut(id)?.set_graph(graph);
        Ok(())
    }

    /// Apply every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<ShapeEvent> {
        // Sampled before draining: a worker sends before it exits, so any
        // job seen finished here has its completion in the channel already.
        let finished: Vec<_> = self
            .shapes
            .iter()
            .filter_map(|(id, shape)| shape.finished_job().map(|job| (*id, job)))
            .collect();

        let mut events = Vec::new();
        while let Ok(completion) = self.completions.try_recv() {
            events.extend(self.apply(completion));
        }

        for (id, job) in finished {
            if let Some(shape) = self.shapes.get_mut(&id)
                && shape.in_flight_job() == Some(job)
            {
                let reason = shape.lose_worker();
                events.push(ShapeEvent::Failed { id, reason });
            }
        }
        events
    }

    /// Block up to `timeout` for a completion, then apply everything pending.
    ///
    /// Returns immediately when nothing is in flight.
    pub fn wait(&mut self, timeout: Duration) -> Vec<ShapeEvent> {
        let mut events = Vec::new();
        if self.in_flight() > 0 {
            match self.completions.recv_timeout(timeout) {
                Ok(completion) => events.extend(self.apply(completion)),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!("No render completed within {:?}", timeout)
                }
                Err(RecvTimeoutError::Disconnected) => {}
            }
        }
        events.extend(self.poll());
        events
    }

    fn apply(&mut self, completion: Completion) -> Option<ShapeEvent> {
        let id = completion.shape;
        let Some(shape) = self.shapes.get_mut(&id) else {
            tracing::debug!("Dropping render result for removed shape {}", id);
            return None;
        };

        match shape.complete(completion) {
            outcome @ (CompletionOutcome::Ready | CompletionOutcome::Stale) => {
                Some(ShapeEvent::MeshReady {
                    id,
                    triangles: shape.mesh().map_or(0, |m| m.triangle_count()),
                    stale: outcome == CompletionOutcome::Stale,
                })
            }
            CompletionOutcome::Failed(reason) => Some(ShapeEvent::Failed { id, reason }),
            CompletionOutcome::Discarded => None,
        }
    }

    /// Upload a shape's latest mesh if needed and return its buffers.
    pub fn prepare(&mut self, id: Uuid, backend: &mut B) -> Option<&B::Buffers> {
        let color = self.config.vertex_color;
        self.shapes.get_mut(&id)?.prepare(backend, color)
    }

    /// Upload every shape that needs it.
    pub fn prepare_all(&mut self, backend: &mut B) {
        let color = self.config.vertex_color;
        for shape in self.shapes.values_mut() {
            shape.prepare(backend, color);
        }
    }

    /// Snapshot of the worker statistics.
    pub fn stats(&self) -> RenderStats {
        self.dispatcher.stats().lock().clone()
    }
}
