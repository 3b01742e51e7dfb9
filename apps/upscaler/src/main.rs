use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, HttpUpscaleTransport, SubmitOutcome, UpscaleController};
use shared::domain::{ModelId, Scale};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod files;
mod render;

#[derive(Parser, Debug)]
#[command(name = "upscaler", about = "Upscale a batch of images on a remote Real-ESRGAN service")]
struct Args {
    /// Settings file; `upscaler.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server: Option<String>,
    /// 2, 3 or 4.
    #[arg(long)]
    scale: Option<Scale>,
    #[arg(long)]
    model: Option<ModelId>,
    /// Save the upscaled images here.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Save one ZIP archive instead of individual images.
    #[arg(long, requires = "output_dir")]
    zip: bool,
    /// Ask the service to drop the session once done.
    #[arg(long)]
    cleanup: bool,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

/// `RUST_LOG` directives when present and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server) = args.server {
        settings.server_url = server;
    }

    let transport = Arc::new(
        HttpUpscaleTransport::from_settings(&settings)
            .with_context(|| format!("invalid server url {}", settings.server_url))?,
    );
    let mut controller = UpscaleController::from_settings(transport.clone(), &settings)?;
    let renderer = tokio::spawn(render::run(controller.subscribe_events()));

    if let Some(scale) = args.scale {
        controller.set_scale(scale);
    }
    if let Some(model) = args.model {
        controller.set_model(model);
    }

    let candidates = files::load_candidates(&args.files).await;
    controller.add_files(candidates)?;

    let status = match controller.start_upscale().await? {
        SubmitOutcome::Skipped => {
            warn!("no images were accepted; nothing to upscale");
            ExitCode::FAILURE
        }
        SubmitOutcome::Failed(_) => ExitCode::FAILURE,
        SubmitOutcome::Completed(session) => {
            if let (Some(dir), Some(view)) = (&args.output_dir, controller.results()) {
                let saved = files::save_results(&transport, view, dir, args.zip).await?;
                info!(count = saved.len(), dir = %dir.display(), "saved results");
            }
            if args.cleanup {
                transport.cleanup_session(&session.session_id).await?;
                controller.reset_to_selection()?;
            }
            ExitCode::SUCCESS
        }
    };

    // Dropping the controller closes the event channel and lets the renderer drain.
    drop(controller);
    renderer.await?;
    Ok(status)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
