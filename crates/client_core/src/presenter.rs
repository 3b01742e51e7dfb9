//! Result-set presentation: turns an accepted submission into renderable cards
//! plus one bulk-download link scoped to the session.

use shared::{
    domain::SessionId,
    protocol::{download_zip_path, ResultDescriptor, UpscaleResponse},
};

pub const BULK_DOWNLOAD_LABEL: &str = "Download all (ZIP)";
pub const DOWNLOAD_LABEL: &str = "Download";

/// An accepted submission. Never mutated; replaced or discarded as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub session_id: SessionId,
    pub scale: u32,
    pub model: Option<String>,
    pub results: Vec<ResultDescriptor>,
}

impl From<UpscaleResponse> for UploadSession {
    fn from(response: UpscaleResponse) -> Self {
        Self {
            session_id: response.session_id,
            scale: response.scale,
            model: response.model,
            results: response.results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub original_name: String,
    pub output_name: String,
    pub preview_url: String,
    pub download_url: String,
    /// e.g. `1600 × 1200px • 4x`
    pub dimensions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDownload {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub session_id: SessionId,
    pub cards: Vec<ResultCard>,
    pub bulk_download: BulkDownload,
}

#[derive(Debug, Default)]
pub struct ResultPresenter {
    session: Option<UploadSession>,
    view: Option<ResultsView>,
}

impl ResultPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `session`, replacing any result set and bulk link left from an earlier batch.
    pub fn show_results(&mut self, session: UploadSession) -> &ResultsView {
        let cards = session
            .results
            .iter()
            .map(|result| ResultCard {
                original_name: result.original_name.clone(),
                output_name: result.output_name.clone(),
                preview_url: result.preview_url.clone(),
                download_url: result.download_url.clone(),
                dimensions: format!(
                    "{} × {}px • {}x",
                    result.width, result.height, session.scale
                ),
            })
            .collect();
        let bulk_download = BulkDownload {
            label: BULK_DOWNLOAD_LABEL.to_string(),
            href: download_zip_path(&session.session_id),
        };

        let view = self.view.insert(ResultsView {
            session_id: session.session_id.clone(),
            cards,
            bulk_download,
        });
        self.session = Some(session);
        view
    }

    pub fn reset(&mut self) {
        self.view = None;
        self.session = None;
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|session| &session.session_id)
    }

    pub fn view(&self) -> Option<&ResultsView> {
        self.view.as_ref()
    }

    pub fn bulk_download(&self) -> Option<&BulkDownload> {
        self.view.as_ref().map(|view| &view.bulk_download)
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
