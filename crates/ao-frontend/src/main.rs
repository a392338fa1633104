//! ao preview entry point
//!
//! Usage: `ao [CONFIG.ron] [sphere|cylinder|cube]`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ao_core::VoxelMesher;
use ao_frontend::{ConfigManager, Demo, FrontendError, Preview};
use ao_renderer::ShapeEvent;

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ao_frontend=debug,ao_renderer=debug,ao_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ao preview");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let demo = args.next();

    match run(config_path, demo.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<PathBuf>, demo: Option<&str>) -> Result<(), FrontendError> {
    let config = ConfigManager::load_or_default(config_path.as_deref())?;
    let demo: Demo = demo.unwrap_or("sphere").parse()?;

    let mut preview = Preview::new(Arc::new(VoxelMesher), config.shared());
    let shape = demo.build();
    let parameter = shape.parameter;
    let id = preview.add_shape(shape.graph)?;

    if let Some(text) = preview.describe(id) {
        println!("{}: {}", demo.name(), text);
    }
    report(&preview.run_until_settled()?);

    if let Some(node) = parameter {
        let value = preview
            .scene()
            .get(id)
            .and_then(|s| s.graph().value(node))
            .unwrap_or(0.5);
        preview.set_parameter(id, node, value * 1.5)?;
        if let Some(text) = preview.describe(id) {
            println!("{}: {}", demo.name(), text);
        }
        report(&preview.run_until_settled()?);
    }

    let stats = preview.scene().stats();
    println!(
        "{} renders, {:?} meshing, {} bytes uploaded",
        stats.jobs_started,
        stats.mesh_time,
        preview.backend().bytes_uploaded()
    );
    Ok(())
}

fn report(events: &[ShapeEvent]) {
    for event in events {
        match event {
            ShapeEvent::MeshReady {
                triangles, stale, ..
            } => println!(
                "  mesh: {} triangles{}",
                triangles,
                if *stale { " (stale)" } else { "" }
            ),
            ShapeEvent::Failed { reason, .. } => println!("  failed: {}", reason),
        }
    }
}
