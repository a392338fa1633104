//! Frontend errors

use std::time::Duration;

use ao_renderer::PipelineError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Renders did not settle within {0:?}")]
    Timeout(Duration),

    #[error("Unknown demo shape: {0}")]
    UnknownDemo(String),
}
