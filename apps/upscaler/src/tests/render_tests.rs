use super::*;

use client_core::{
    selection::SelectionEntry, BulkDownload, Notice, ProgressStage, ResultCard, SubmitError,
    UserError,
};
use shared::domain::SessionId;

fn progress(percent: f64, caption: &str) -> ControllerEvent {
    ControllerEvent::Progress(ProgressView {
        percent,
        stage: ProgressStage::Processing,
        caption: caption.into(),
        detail: String::new(),
    })
}

#[test]
fn progress_bar_reflects_percent_and_detail() {
    let line = progress_line(&ProgressView {
        percent: 50.0,
        stage: ProgressStage::Uploading,
        caption: "Uploading images...".into(),
        detail: "Upscaling 3 image(s) at 4x".into(),
    });
    assert_eq!(
        line,
        format!(
            "[{}{}]  50% Uploading images... (Upscaling 3 image(s) at 4x)",
            "#".repeat(15),
            ".".repeat(15)
        )
    );
}

#[test]
fn repeated_progress_at_same_whole_percent_is_suppressed() {
    let mut renderer = Renderer::default();
    assert!(renderer.render(&progress(31.2, "Upscaling with AI...")).is_some());
    assert!(renderer.render(&progress(31.9, "Upscaling with AI...")).is_none());
    assert!(renderer.render(&progress(32.4, "Upscaling with AI...")).is_some());

    // A new submission starts a fresh sequence.
    renderer.render(&ControllerEvent::PhaseChanged(WorkflowPhase::Submitting));
    assert!(renderer.render(&progress(32.4, "Upscaling with AI...")).is_some());
}

#[test]
fn reset_progress_is_not_printed() {
    let mut renderer = Renderer::default();
    assert!(renderer
        .render(&ControllerEvent::Progress(ProgressView::default()))
        .is_none());
}

#[test]
fn notices_and_failures_are_prefixed() {
    let mut renderer = Renderer::default();
    let notice = renderer
        .render(&ControllerEvent::Notice(Notice::CapacityExceeded { limit: 50 }))
        .expect("notice");
    assert_eq!(notice, "warning: At most 50 images can be upscaled per batch.");

    let failure = UserError::from(&SubmitError::Server {
        status: 400,
        message: "No images provided".into(),
    });
    assert_eq!(
        renderer.render(&ControllerEvent::Failed(failure)).as_deref(),
        Some("error: No images provided")
    );
}

#[test]
fn selection_line_sums_sizes() {
    let view = SelectionView {
        entries: vec![
            SelectionEntry {
                index: 0,
                name: "a.png".into(),
                size: 1024 * 1024,
                media_type: "image/png".into(),
            },
            SelectionEntry {
                index: 1,
                name: "b.png".into(),
                size: 512 * 1024,
                media_type: "image/png".into(),
            },
        ],
        total_bytes: 1536 * 1024,
        options_visible: true,
    };
    assert_eq!(selection_line(&view), "Batch: 2 file(s), 1.5 MB");
}

#[test]
fn results_table_lists_cards_then_bulk_link() {
    let view = ResultsView {
        session_id: SessionId::new("s1"),
        cards: vec![ResultCard {
            original_name: "a.png".into(),
            output_name: "a_upscaled.png".into(),
            preview_url: "/api/preview/s1/a_upscaled.png".into(),
            download_url: "/api/download/s1/a_upscaled.png".into(),
            dimensions: "1600 × 1200px • 4x".into(),
        }],
        bulk_download: BulkDownload {
            label: "Download all (ZIP)".into(),
            href: "/api/download-zip/s1".into(),
        },
    };
    assert_eq!(
        results_table(&view),
        "Session s1: 1 result(s)\n  a.png  1600 × 1200px • 4x  /api/download/s1/a_upscaled.png\nDownload all (ZIP): /api/download-zip/s1"
    );
}
