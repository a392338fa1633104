//! Per-shape render pipeline
//!
//! A [`Shape`] pairs an expression graph with the state of its mesh:
//!
//! ```text
//!            start_render            completion
//!   Idle ────────────────> Computing ──────────> Ready
//!                             ^                    │ graph edit
//!                             │ start_render       v
//!                             └──────────────── Stale
//! ```
//!
//! At most one computation is in flight per shape; a second `start_render`
//! is rejected, not queued. A worker failure moves the shape to `Failed`,
//! which is terminal.

use std::sync::Arc;
use std::thread::JoinHandle;

use ao_core::{ExprGraph, GraphError, Mesh, NodeId, Region, RegionError};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::GraphicsBackend;
use crate::vertex::vertex_data;
use crate::worker::{Completion, JobId, RenderDispatcher, RenderJob};

/// Observable pipeline state of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No mesh and nothing running.
    Idle,
    /// A background computation is in flight.
    Computing,
    /// The mesh matches the current graph.
    Ready,
    /// A mesh exists but the graph changed since it was computed.
    Stale,
    /// The background computation failed; the shape will not render again.
    Failed,
}

/// Errors returned by pipeline operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// `start_render` was called while a computation is in flight.
    #[error("A render is already in flight for this shape")]
    RenderInFlight,

    /// The shape's worker failed earlier.
    #[error("Shape render failed: {0}")]
    Failed(String),

    /// The shape's graph has no root node.
    #[error("Shape graph has no root")]
    EmptyGraph,

    /// No shape with this id exists.
    #[error("Unknown shape: {0}")]
    UnknownShape(Uuid),

    /// The worker thread could not be created.
    #[error("Failed to spawn render worker: {0}")]
    Spawn(String),

    /// Graph edit was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The render region cannot be meshed.
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// What applying a completion did to a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// A mesh was installed and matches the current graph.
    Ready,
    /// A mesh was installed but the graph changed while it was computed.
    Stale,
    /// The worker failed.
    Failed(String),
    /// The completion did not belong to the in-flight job and was dropped.
    Discarded,
}

struct InFlight {
    job: JobId,
    handle: JoinHandle<()>,
}

/// A displayed shape and its render pipeline.
pub struct Shape<B: GraphicsBackend> {
    id: Uuid,
    graph: Arc<ExprGraph>,
    /// Bumped on every graph edit
    generation: u64,
    mesh: Option<Arc<Mesh>>,
    mesh_generation: u64,
    needs_upload: bool,
    in_flight: Option<InFlight>,
    failure: Option<String>,
    buffers: Option<B::Buffers>,
}

impl<B: GraphicsBackend> Shape<B> {
    /// Create an idle shape for a graph.
    pub fn new(graph: ExprGraph) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph: Arc::new(graph),
            generation: 0,
            mesh: None,
            mesh_generation: 0,
            needs_upload: false,
            in_flight: None,
            failure: None,
            buffers: None,
        }
    }

    /// Unique shape id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current expression graph.
    pub fn graph(&self) -> &ExprGraph {
        &self.graph
    }

    /// Current pipeline state.
    pub fn state(&self) -> RenderState {
        if self.failure.is_some() {
            RenderState::Failed
        } else if self.in_flight.is_some() {
            RenderState::Computing
        } else if self.mesh.is_none() {
            RenderState::Idle
        } else if self.mesh_generation == self.generation {
            RenderState::Ready
        } else {
            RenderState::Stale
        }
    }

    /// Whether the installed mesh was computed from an older graph.
    pub fn is_stale(&self) -> bool {
        self.mesh.is_some() && self.mesh_generation != self.generation
    }

    /// Latest completed mesh.
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Whether the latest mesh still has to be uploaded.
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Failure message if the worker failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Replace the whole graph.
    pub fn set_graph(&mut self, graph: ExprGraph) {
        self.graph = Arc::new(graph);
        self.generation += 1;
        tracing::debug!("Shape {} graph replaced (generation {})", self.id, self.generation);
    }

    /// Update a `Mutable` node of the graph.
    ///
    /// A running worker keeps its own snapshot, so the graph is copied if
    /// one is in flight.
    pub fn set_mutable(&mut self, node: NodeId, value: f32) -> Result<(), PipelineError> {
        Arc::make_mut(&mut self.graph).set_mutable(node, value)?;
        self.generation += 1;
        tracing::debug!(
            "Shape {} mutable {:?} = {} (generation {})",
            self.id,
            node,
            value,
            self.generation
        );
        Ok(())
    }

    /// Start meshing the current graph on a background worker.
    ///
    /// Returns immediately. Rejected while a computation is in flight.
    pub fn start_render(
        &mut self,
        dispatcher: &mut RenderDispatcher,
        region: &Region,
    ) -> Result<(), PipelineError> {
        if let Some(reason) = &self.failure {
            return Err(PipelineError::Failed(reason.clone()));
        }
        if self.in_flight.is_some() {
            tracing::warn!("Shape {} render rejected: already computing", self.id);
            return Err(PipelineError::RenderInFlight);
        }
        let root = self.graph.root().ok_or(PipelineError::EmptyGraph)?;
        region.voxel_count()?;

        let (job, handle) = dispatcher.spawn(RenderJob {
            shape: self.id,
            graph: self.graph.clone(),
            root,
            region: *region,
            generation: self.generation,
        })?;
        self.in_flight = Some(InFlight { job, handle });

        tracing::info!(
            "Shape {} render started (job {:?}, generation {})",
            self.id,
            job,
            self.generation
        );
        Ok(())
    }

    /// Job currently in flight.
    pub fn in_flight_job(&self) -> Option<JobId> {
        self.in_flight.as_ref().map(|f| f.job)
    }

    /// In-flight job whose thread has already exited.
    pub(crate) fn finished_job(&self) -> Option<JobId> {
        self.in_flight
            .as_ref()
            .filter(|f| f.handle.is_finished())
            .map(|f| f.job)
    }

    /// Apply a worker result. Must run on the thread owning the shape.
    pub fn complete(&mut self, completion: Completion) -> CompletionOutcome {
        if self.in_flight_job() != Some(completion.job) {
            tracing::warn!(
                "Shape {} dropping result of job {:?}",
                self.id,
                completion.job
            );
            return CompletionOutcome::Discarded;
        }
        self.in_flight = None;

        match completion.result {
            Ok(mesh) => {
                let mesh = mesh.unwrap_or_default();
                tracing::info!(
                    "Shape {} got mesh: {} vertices, {} triangles",
                    self.id,
                    mesh.vertices.len(),
                    mesh.triangle_count()
                );
                self.mesh = Some(Arc::new(mesh));
                self.mesh_generation = completion.generation;
                self.needs_upload = true;

                if self.is_stale() {
                    tracing::debug!("Shape {} mesh is already stale", self.id);
                    CompletionOutcome::Stale
                } else {
                    CompletionOutcome::Ready
                }
            }
            Err(reason) => {
                self.fail(reason.clone());
                CompletionOutcome::Failed(reason)
            }
        }
    }

    /// Mark the shape failed because its worker exited without reporting.
    ///
    /// Mesher panics are reported as completions, so this only covers a
    /// worker that dies while delivering its result.
    pub(crate) fn lose_worker(&mut self) -> String {
        self.in_flight = None;
        let reason = "render worker exited without a result".to_string();
        self.fail(reason.clone());
        reason
    }

    fn fail(&mut self, reason: String) {
        tracing::error!("Shape {} render failed: {}", self.id, reason);
        self.failure = Some(reason);
    }

    /// Upload the latest mesh if needed and return the buffers to draw.
    ///
    /// The upload happens at most once per completed mesh. Empty meshes
    /// leave nothing to draw.
    pub fn prepare(&mut self, backend: &mut B, color: [f32; 3]) -> Option<&B::Buffers> {
        if self.needs_upload {
            self.needs_upload = false;
            self.buffers = match &self.mesh {
                Some(mesh) if !mesh.is_empty() => {
                    let (vertices, indices) = vertex_data(mesh, color);
                    Some(backend.upload(&vertices, &indices))
                }
                _ => None,
            };
        }
        self.buffers.as_ref()
    }
}
