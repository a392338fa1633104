//! Background mesh workers
//!
//! Each render runs on its own thread with a read-only snapshot of the
//! shape's graph. The result travels back over a channel and is applied by
//! whoever drains it; workers never touch shape or GPU state.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use ao_core::{ExprGraph, Mesh, Mesher, NodeId, Region};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::constants::WORKER_THREAD_PREFIX;
use crate::shape::PipelineError;

/// Identifier of one background computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub(crate) u64);

/// Result of a background computation, delivered to the owning thread.
#[derive(Debug)]
pub struct Completion {
    /// Shape the job was started for.
    pub shape: Uuid,
    /// Job that produced this result.
    pub job: JobId,
    /// Graph generation the job evaluated.
    pub generation: u64,
    /// Mesh (or `None` for an empty surface), or the worker's failure message.
    pub result: Result<Option<Mesh>, String>,
}

/// Counters shared between workers and the owning thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Jobs handed to a worker.
    pub jobs_started: u64,
    /// Jobs whose mesher returned.
    pub jobs_completed: u64,
    /// Jobs whose mesher panicked.
    pub jobs_failed: u64,
    /// Wall time spent inside the mesher.
    pub mesh_time: Duration,
}

/// Shared render statistics.
pub type SharedRenderStats = Arc<Mutex<RenderStats>>;

/// Work handed to a background thread.
pub(crate) struct RenderJob {
    pub shape: Uuid,
    pub graph: Arc<ExprGraph>,
    pub root: NodeId,
    pub region: Region,
    pub generation: u64,
}

/// Spawns mesh workers and hands out job ids.
pub struct RenderDispatcher {
    mesher: Arc<dyn Mesher>,
    sender: Sender<Completion>,
    stats: SharedRenderStats,
    next_job: u64,
}

impl RenderDispatcher {
    /// Create a dispatcher and the receiving end of its completion channel.
    pub fn new(mesher: Arc<dyn Mesher>) -> (Self, Receiver<Completion>) {
        let (sender, receiver) = mpsc::channel();
        let dispatcher = Self {
            mesher,
            sender,
            stats: SharedRenderStats::default(),
            next_job: 0,
        };
        (dispatcher, receiver)
    }

    /// Statistics updated by this dispatcher's workers.
    pub fn stats(&self) -> SharedRenderStats {
        self.stats.clone()
    }

    pub(crate) fn spawn(&mut self, job: RenderJob) -> Result<(JobId, JoinHandle<()>), PipelineError> {
        let id = JobId(self.next_job);
        self.next_job += 1;

        let mesher = self.mesher.clone();
        let sender = self.sender.clone();
        let stats = self.stats.clone();

        let handle = std::thread::Builder::new()
            .name(format!("{}-{}", WORKER_THREAD_PREFIX, id.0))
            .spawn(move || {
                let start = Instant::now();
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    mesher.render(&job.graph, job.root, &job.region)
                }))
                .map_err(|payload| panic_message(payload.as_ref()));

                {
                    let mut stats = stats.lock();
                    stats.mesh_time += start.elapsed();
                    match result {
                        Ok(_) => stats.jobs_completed += 1,
                        Err(_) => stats.jobs_failed += 1,
                    }
                }

                let completion = Completion {
                    shape: job.shape,
                    job: id,
                    generation: job.generation,
                    result,
                };
                if sender.send(completion).is_err() {
                    tracing::debug!("Render job {:?} finished after its scene was dropped", id);
                }
            })
            .map_err(|e| PipelineError::Spawn(e.to_string()))?;

        self.stats.lock().jobs_started += 1;
        Ok((id, handle))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "mesher panicked".to_string()
    }
}
