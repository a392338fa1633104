//! Preview driver
//!
//! Owns the scene on the foreground thread and decides when shapes are
//! re-rendered. Edits that arrive while a shape is computing are not queued:
//! the in-flight mesh lands stale and, if `rerender_stale` is set, one new
//! render picks up every edit made in the meantime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ao_core::{ExprGraph, Mesher, NodeId};
use ao_renderer::{RenderState, Scene, ShapeEvent};
use uuid::Uuid;

use crate::backend::CpuBackend;
use crate::config::SharedConfig;
use crate::error::FrontendError;

pub struct Preview {
    scene: Scene<CpuBackend>,
    backend: CpuBackend,
    config: SharedConfig,
}

impl Preview {
    pub fn new(mesher: Arc<dyn Mesher>, config: SharedConfig) -> Self {
        let render = config.read().render.clone();
        Self {
            scene: Scene::new(mesher, render),
            backend: CpuBackend::new(),
            config,
        }
    }

    pub fn scene(&self) -> &Scene<CpuBackend> {
        &self.scene
    }

    pub fn backend(&self) -> &CpuBackend {
        &self.backend
    }

    /// Add a shape and start its first render
    pub fn add_shape(&mut self, graph: ExprGraph) -> Result<Uuid, FrontendError> {
        let id = self.scene.add(graph);
        self.scene.start_render(id)?;
        Ok(id)
    }

    /// Tune a parameter, re-rendering right away when the shape is not busy
    pub fn set_parameter(&mut self, id: Uuid, node: NodeId, value: f32) -> Result<(), FrontendError> {
        self.scene.set_mutable(id, node, value)?;
        if self.scene.state(id) == Some(RenderState::Stale) {
            self.scene.start_render(id)?;
        }
        Ok(())
    }

    /// Canonical text of a shape's expression
    pub fn describe(&self, id: Uuid) -> Option<String> {
        let graph = self.scene.get(id)?.graph();
        graph.root().map(|root| graph.serialize(root))
    }

    /// Wait one poll interval for completions, reschedule stale shapes and
    /// upload new meshes
    pub fn tick(&mut self) -> Result<Vec<ShapeEvent>, FrontendError> {
        let (interval, rerender_stale) = {
            let config = self.config.read();
            if config.render != *self.scene.config() {
                self.scene.set_config(config.render.clone());
            }
            (
                Duration::from_millis(config.poll_interval_ms),
                config.rerender_stale,
            )
        };

        let events = self.scene.wait(interval);
        for event in &events {
            match event {
                ShapeEvent::MeshReady { id, stale: true, .. } if rerender_stale => {
                    tracing::debug!("Re-rendering stale shape {}", id);
                    self.scene.start_render(*id)?;
                }
                ShapeEvent::Failed { id, reason } => {
                    tracing::warn!("Shape {} will not be previewed: {}", id, reason);
                }
                _ => {}
            }
        }

        self.scene.prepare_all(&mut self.backend);
        Ok(events)
    }

    /// Tick until nothing is in flight
    pub fn run_until_settled(&mut self) -> Result<Vec<ShapeEvent>, FrontendError> {
        let timeout = Duration::from_millis(self.config.read().timeout_ms);
        let deadline = Instant::now() + timeout;

        let mut events = self.tick()?;
        while self.scene.in_flight() > 0 {
            if Instant::now() >= deadline {
                return Err(FrontendError::Timeout(timeout));
            }
            events.extend(self.tick()?);
        }
        Ok(events)
    }
}
