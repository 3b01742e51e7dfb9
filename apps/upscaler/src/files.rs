//! Local file I/O for the CLI: reading candidates and saving results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use client_core::{HttpUpscaleTransport, ResultsView, SelectedFile};
use shared::domain::SessionId;
use tracing::{info, warn};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Reads each path in order. Unreadable paths are logged and skipped; type and
/// size checks are left to the controller.
pub async fn load_candidates(paths: &[PathBuf]) -> Vec<SelectedFile> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => candidates.push(candidate_from(path, bytes)),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable file"),
        }
    }
    candidates
}

fn candidate_from(path: &Path, bytes: Vec<u8>) -> SelectedFile {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let media_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE);
    SelectedFile::new(name, media_type, bytes)
}

/// Downloads every card (or the session archive when `zip`) into `dir`.
pub async fn save_results(
    transport: &HttpUpscaleTransport,
    view: &ResultsView,
    dir: &Path,
    zip: bool,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let downloads = if zip {
        vec![(
            view.bulk_download.href.clone(),
            zip_file_name(&view.session_id),
        )]
    } else {
        view.cards
            .iter()
            .map(|card| (card.download_url.clone(), local_name(&card.output_name)))
            .collect()
    };

    let mut saved = Vec::with_capacity(downloads.len());
    for (reference, file_name) in downloads {
        let bytes = transport
            .download(&reference)
            .await
            .with_context(|| format!("failed to download {reference}"))?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "saved");
        saved.push(path);
    }
    Ok(saved)
}

fn zip_file_name(session_id: &SessionId) -> String {
    format!("upscaled_{session_id}.zip")
}

/// Keeps only the final path component so a server-chosen name cannot escape `dir`.
fn local_name(output_name: &str) -> String {
    Path::new(output_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("upscaled.png")
        .to_string()
}

#[cfg(test)]
#[path = "tests/files_tests.rs"]
mod tests;
