//! Client-side workflow for batch image upscaling.
//!
//! [`UpscaleController`] owns the whole workflow state: the selection batch, the
//! chosen options, the in-flight submission with its progress ticker, and the
//! presented result set. Front-ends render it by subscribing to
//! [`ControllerEvent`]s or by polling [`UpscaleController::snapshot`].

use std::sync::Arc;

use shared::domain::{ModelId, Scale, SessionId};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod error;
pub mod events;
pub mod presenter;
pub mod progress;
pub mod selection;
pub mod settings;
pub mod transport;

pub use error::{FailureKind, SubmitError, TransportSetupError, WorkflowError};
pub use events::{ControllerEvent, UserError, ViewPanel, WorkflowPhase};
pub use presenter::{BulkDownload, ResultCard, ResultPresenter, ResultsView, UploadSession};
pub use progress::{ProgressPolicy, ProgressStage, ProgressView, TransferProgress};
pub use selection::{
    AddReport, BatchLimits, Notice, SelectedFile, SelectionStore, SelectionView, UpscaleOptions,
    Validator,
};
pub use settings::{load_settings, ClientSettings, SettingsError};
pub use transport::{BatchRequest, HttpUpscaleTransport, UpscaleTransport};

use progress::{ProgressMeter, ProgressTicker};
use shared::protocol::UpscaleResponse;

const EVENT_CAPACITY: usize = 1024;

/// How a `start_upscale` call ended.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The batch was empty; nothing was sent.
    Skipped,
    Completed(UploadSession),
    /// The failure has already been surfaced and the selection view restored.
    Failed(SubmitError),
}

/// Everything a renderer needs, as plain data.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub phase: WorkflowPhase,
    pub panel: ViewPanel,
    pub selection: SelectionView,
    pub options: UpscaleOptions,
    pub progress: ProgressView,
    pub results: Option<ResultsView>,
    pub session_id: Option<SessionId>,
}

pub struct UpscaleController {
    transport: Arc<dyn UpscaleTransport>,
    validator: Validator,
    selection: SelectionStore,
    options: UpscaleOptions,
    phase: WorkflowPhase,
    panel: ViewPanel,
    progress: ProgressMeter,
    ticker: Option<ProgressTicker>,
    presenter: ResultPresenter,
    events: broadcast::Sender<ControllerEvent>,
}

impl UpscaleController {
    pub fn new(transport: Arc<dyn UpscaleTransport>) -> Self {
        Self::with_config(
            transport,
            BatchLimits::default(),
            ProgressPolicy::default(),
            UpscaleOptions::default(),
        )
    }

    pub fn from_settings(
        transport: Arc<dyn UpscaleTransport>,
        settings: &ClientSettings,
    ) -> Result<Self, SettingsError> {
        Ok(Self::with_config(
            transport,
            settings.batch_limits(),
            settings.progress_policy(),
            settings.default_options()?,
        ))
    }

    pub fn with_config(
        transport: Arc<dyn UpscaleTransport>,
        limits: BatchLimits,
        policy: ProgressPolicy,
        options: UpscaleOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            validator: Validator::new(limits),
            selection: SelectionStore::new(),
            options,
            phase: WorkflowPhase::Idle,
            panel: ViewPanel::Selection,
            progress: ProgressMeter::new(policy, events.clone()),
            ticker: None,
            presenter: ResultPresenter::new(),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn panel(&self) -> ViewPanel {
        self.panel
    }

    pub fn options(&self) -> UpscaleOptions {
        self.options
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn progress(&self) -> ProgressView {
        self.progress.view()
    }

    pub fn results(&self) -> Option<&ResultsView> {
        self.presenter.view()
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.presenter.session()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.presenter.session_id()
    }

    pub fn is_progress_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            panel: self.panel,
            selection: self.selection.view(),
            options: self.options,
            progress: self.progress.view(),
            results: self.presenter.view().cloned(),
            session_id: self.presenter.session_id().cloned(),
        }
    }

    /// Offers candidates to the batch in order; notices are broadcast as they arise.
    pub fn add_files<I>(&mut self, candidates: I) -> Result<AddReport, WorkflowError>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        self.ensure_idle()?;
        let report = self.validator.admit(&mut self.selection, candidates);
        for notice in &report.notices {
            self.emit(ControllerEvent::Notice(notice.clone()));
        }
        self.emit(ControllerEvent::SelectionChanged(self.selection.view()));
        Ok(report)
    }

    pub fn remove_file(&mut self, index: usize) -> Result<SelectedFile, WorkflowError> {
        self.ensure_idle()?;
        let len = self.selection.len();
        let removed = self
            .selection
            .remove(index)
            .ok_or(WorkflowError::IndexOutOfRange { index, len })?;
        debug!(index, name = %removed.name, "removed file from batch");
        self.emit(ControllerEvent::SelectionChanged(self.selection.view()));
        Ok(removed)
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.options.scale = scale;
        self.emit(ControllerEvent::OptionsChanged(self.options));
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.options.model = model;
        self.emit(ControllerEvent::OptionsChanged(self.options));
    }

    /// Submits the current batch and waits for the terminal response.
    ///
    /// A failure returns the workflow to `Idle` with the batch untouched, so the
    /// caller can retry by calling this again.
    pub async fn start_upscale(&mut self) -> Result<SubmitOutcome, WorkflowError> {
        self.ensure_idle()?;
        if self.selection.is_empty() {
            debug!("start_upscale ignored: batch is empty");
            return Ok(SubmitOutcome::Skipped);
        }

        let request = BatchRequest {
            files: self.selection.files().to_vec(),
            options: self.options,
        };
        self.enter_submitting(request.files.len());

        let mut guard = SubmissionGuard {
            controller: self,
            armed: true,
        };
        let transport = Arc::clone(&guard.controller.transport);
        let progress = TransferProgress::new(guard.controller.progress.clone());
        let result = transport.submit(request, progress).await;
        guard.armed = false;

        let controller = &mut *guard.controller;
        controller.leave_submitting(&result);
        match result {
            Ok(response) => Ok(SubmitOutcome::Completed(controller.finish_success(response))),
            Err(err) => {
                controller.finish_failure(&err);
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    /// Presents `session` and moves to the results view.
    fn show_results(&mut self, session: UploadSession) {
        let view = self.presenter.show_results(session).clone();
        self.emit(ControllerEvent::ResultsReady(view));
        self.show_panel(ViewPanel::Results);
    }

    /// "New batch": the only way back from a result set to an empty selection.
    pub fn reset_to_selection(&mut self) -> Result<(), WorkflowError> {
        if self.phase == WorkflowPhase::Submitting {
            return Err(WorkflowError::NotIdle { phase: self.phase });
        }
        self.selection.clear();
        self.presenter.reset();
        self.progress.reset();
        self.set_phase(WorkflowPhase::Idle);
        self.show_panel(ViewPanel::Selection);
        self.emit(ControllerEvent::SelectionChanged(self.selection.view()));
        info!("workflow reset for a new batch");
        Ok(())
    }

    fn enter_submitting(&mut self, file_count: usize) {
        info!(
            files = file_count,
            scale = self.options.scale.factor(),
            model = self.options.model.as_str(),
            "starting upscale submission"
        );
        self.set_phase(WorkflowPhase::Submitting);
        self.show_panel(ViewPanel::Progress);
        self.progress.begin(file_count, self.options.scale);
        self.ticker = Some(ProgressTicker::spawn(self.progress.clone()));
    }

    /// Runs on every exit from `Submitting`.
    fn leave_submitting(&mut self, result: &Result<UpscaleResponse, SubmitError>) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let responded = match result {
            Ok(_) => true,
            Err(err) => err.has_response(),
        };
        if responded {
            self.progress.complete();
        } else {
            self.progress.halt();
        }
    }

    /// The caller dropped `start_upscale` before the transport answered.
    fn abandon_submission(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.progress.halt();
        warn!("upscale submission abandoned before a response arrived");
        self.set_phase(WorkflowPhase::Idle);
        self.show_panel(ViewPanel::Selection);
    }

    fn finish_success(&mut self, response: UpscaleResponse) -> UploadSession {
        let session = UploadSession::from(response);
        info!(
            session_id = %session.session_id,
            results = session.results.len(),
            "upscale batch completed"
        );
        self.set_phase(WorkflowPhase::Succeeded);
        self.show_results(session.clone());
        session
    }

    fn finish_failure(&mut self, err: &SubmitError) {
        warn!(error = %err, "upscale submission failed");
        self.set_phase(WorkflowPhase::Failed);
        self.set_phase(WorkflowPhase::Idle);
        self.show_panel(ViewPanel::Selection);
        self.emit(ControllerEvent::Failed(UserError::from(err)));
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.phase == WorkflowPhase::Idle {
            Ok(())
        } else {
            Err(WorkflowError::NotIdle { phase: self.phase })
        }
    }

    fn set_phase(&mut self, phase: WorkflowPhase) {
        self.phase = phase;
        self.emit(ControllerEvent::PhaseChanged(phase));
    }

    fn show_panel(&mut self, panel: ViewPanel) {
        self.panel = panel;
        self.emit(ControllerEvent::PanelChanged(panel));
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine; the snapshot stays authoritative.
        let _ = self.events.send(event);
    }
}

/// Returns the controller to `Idle` if the in-flight submission future is dropped.
struct SubmissionGuard<'a> {
    controller: &'a mut UpscaleController,
    armed: bool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon_submission();
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
