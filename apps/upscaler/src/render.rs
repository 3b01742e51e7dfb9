//! Terminal rendering of controller events.

use client_core::{ControllerEvent, ProgressView, ResultsView, SelectionView, WorkflowPhase};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

const BAR_WIDTH: usize = 30;
const MIB: f64 = 1024.0 * 1024.0;

pub async fn run(mut events: broadcast::Receiver<ControllerEvent>) {
    let mut renderer = Renderer::default();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(text) = renderer.render(&event) {
                    println!("{text}");
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "renderer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Turns events into printable text. Progress repeats at the same whole percent
/// and caption are suppressed.
#[derive(Debug, Default)]
pub struct Renderer {
    last_progress: Option<(u32, String)>,
}

impl Renderer {
    pub fn render(&mut self, event: &ControllerEvent) -> Option<String> {
        match event {
            ControllerEvent::SelectionChanged(view) => Some(selection_line(view)),
            ControllerEvent::OptionsChanged(options) => Some(format!(
                "Options: {}x, model {}",
                options.scale, options.model
            )),
            ControllerEvent::Notice(notice) => Some(format!("warning: {}", notice.message())),
            ControllerEvent::PhaseChanged(WorkflowPhase::Submitting) => {
                self.last_progress = None;
                None
            }
            ControllerEvent::PhaseChanged(_) | ControllerEvent::PanelChanged(_) => None,
            ControllerEvent::Progress(view) => self.progress(view),
            ControllerEvent::ResultsReady(view) => Some(results_table(view)),
            ControllerEvent::Failed(err) => Some(format!("error: {}", err.message())),
        }
    }

    fn progress(&mut self, view: &ProgressView) -> Option<String> {
        if view.caption.is_empty() {
            return None;
        }
        let key = (view.percent.floor() as u32, view.caption.clone());
        if self.last_progress.as_ref() == Some(&key) {
            return None;
        }
        self.last_progress = Some(key);
        Some(progress_line(view))
    }
}

pub fn selection_line(view: &SelectionView) -> String {
    format!(
        "Batch: {} file(s), {:.1} MB",
        view.entries.len(),
        view.total_bytes as f64 / MIB
    )
}

pub fn progress_line(view: &ProgressView) -> String {
    let percent = view.percent.clamp(0.0, 100.0);
    let filled = (percent / 100.0 * BAR_WIDTH as f64).round() as usize;
    let mut line = format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent.floor() as u32,
        view.caption
    );
    if !view.detail.is_empty() {
        line.push_str(" (");
        line.push_str(&view.detail);
        line.push(')');
    }
    line
}

pub fn results_table(view: &ResultsView) -> String {
    let mut lines = vec![format!(
        "Session {}: {} result(s)",
        view.session_id,
        view.cards.len()
    )];
    for card in &view.cards {
        lines.push(format!(
            "  {}  {}  {}",
            card.original_name, card.dimensions, card.download_url
        ));
    }
    lines.push(format!(
        "{}: {}",
        view.bulk_download.label, view.bulk_download.href
    ));
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
