//! Events broadcast by the controller to whatever layer renders it.

use crate::{
    error::{FailureKind, SubmitError},
    presenter::ResultsView,
    progress::ProgressView,
    selection::{Notice, SelectionView, UpscaleOptions},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    /// Transient: announced, then immediately followed by `Idle`.
    Failed,
}

/// Which top-level panel is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPanel {
    #[default]
    Selection,
    Progress,
    Results,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    SelectionChanged(SelectionView),
    OptionsChanged(UpscaleOptions),
    Notice(Notice),
    PhaseChanged(WorkflowPhase),
    PanelChanged(ViewPanel),
    Progress(ProgressView),
    ResultsReady(ResultsView),
    Failed(UserError),
}

/// A submission failure as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    kind: FailureKind,
    message: String,
}

impl UserError {
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&SubmitError> for UserError {
    fn from(err: &SubmitError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}
