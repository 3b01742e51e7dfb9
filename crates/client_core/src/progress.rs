//! Approximate progress for an opaque long-running submission.
//!
//! Phase 1 maps bytes sent into `[0, transfer_ceiling]`. Once the transfer
//! completes the remote side gives no signal, so a ticker task nudges the value
//! by a random step every `tick` until `synthetic_ceiling`. Any response forces 100.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rand::Rng;
use shared::domain::Scale;
use tokio::{sync::broadcast, task::JoinHandle, time::Instant};
use tracing::debug;

use crate::events::ControllerEvent;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
pub const TRANSFER_CEILING: f64 = 30.0;
pub const SYNTHETIC_CEILING: f64 = 90.0;
pub const COMPLETE: f64 = 100.0;
/// Steps are uniform in `[0, DEFAULT_MAX_STEP)`, averaging 1.5.
pub const DEFAULT_MAX_STEP: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPolicy {
    pub tick: Duration,
    pub transfer_ceiling: f64,
    pub synthetic_ceiling: f64,
    pub max_step: f64,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            transfer_ceiling: TRANSFER_CEILING,
            synthetic_ceiling: SYNTHETIC_CEILING,
            max_step: DEFAULT_MAX_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStage {
    #[default]
    Idle,
    Uploading,
    Processing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressView {
    pub percent: f64,
    pub stage: ProgressStage,
    pub caption: String,
    pub detail: String,
}

/// Shared progress value. Clones observe and mutate the same state.
#[derive(Clone)]
pub struct ProgressMeter {
    state: Arc<Mutex<ProgressView>>,
    policy: ProgressPolicy,
    events: broadcast::Sender<ControllerEvent>,
}

impl ProgressMeter {
    pub(crate) fn new(policy: ProgressPolicy, events: broadcast::Sender<ControllerEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProgressView::default())),
            policy,
            events,
        }
    }

    pub fn policy(&self) -> ProgressPolicy {
        self.policy
    }

    pub fn view(&self) -> ProgressView {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn percent(&self) -> f64 {
        self.view().percent
    }

    pub(crate) fn begin(&self, file_count: usize, scale: Scale) {
        self.update(|view| {
            *view = ProgressView {
                percent: 0.0,
                stage: ProgressStage::Uploading,
                caption: "Processing...".into(),
                detail: format!("Upscaling {file_count} image(s) at {scale}x"),
            };
            true
        });
    }

    pub(crate) fn record_transfer(&self, sent: u64, total: u64) {
        let transfer_ceiling = self.policy.transfer_ceiling;
        self.update(|view| {
            if view.stage != ProgressStage::Uploading {
                return false;
            }
            if sent >= total {
                view.stage = ProgressStage::Processing;
                view.percent = view.percent.max(transfer_ceiling);
                view.caption = "Upscaling with AI...".into();
                view.detail = "This may take a few minutes depending on image size".into();
                return true;
            }
            let mapped = sent as f64 / total as f64 * transfer_ceiling;
            view.percent = view.percent.max(mapped);
            view.caption = "Uploading images...".into();
            true
        });
    }

    pub(crate) fn synthetic_step(&self, step: f64) {
        let cap = self.policy.synthetic_ceiling;
        self.update(|view| {
            if view.stage != ProgressStage::Processing || view.percent >= cap {
                return false;
            }
            view.percent = (view.percent + step).min(cap);
            true
        });
    }

    pub(crate) fn complete(&self) {
        self.update(|view| {
            view.percent = COMPLETE;
            view.stage = ProgressStage::Done;
            true
        });
    }

    /// Freezes the current value; later transfer reports and steps are ignored.
    pub(crate) fn halt(&self) {
        self.update(|view| {
            view.stage = ProgressStage::Idle;
            false
        });
    }

    pub(crate) fn reset(&self) {
        self.update(|view| {
            *view = ProgressView::default();
            true
        });
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressView) -> bool) {
        let snapshot = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !apply(&mut guard) {
                return;
            }
            guard.clone()
        };
        let _ = self.events.send(ControllerEvent::Progress(snapshot));
    }
}

/// Handle given to a transport so it can report bytes sent.
#[derive(Clone, Default)]
pub struct TransferProgress {
    meter: Option<ProgressMeter>,
}

impl TransferProgress {
    pub(crate) fn new(meter: ProgressMeter) -> Self {
        Self { meter: Some(meter) }
    }

    /// A sink that discards every report.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Reports `sent` of `total` bytes handed to the network. `sent >= total`
    /// marks the end of the transfer.
    pub fn report(&self, sent: u64, total: u64) {
        if let Some(meter) = &self.meter {
            meter.record_transfer(sent, total);
        }
    }
}

/// Recurring synthetic step task. Aborted on drop, so it cannot outlive the
/// submission that owns it.
pub(crate) struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub(crate) fn spawn(meter: ProgressMeter) -> Self {
        let policy = meter.policy();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + policy.tick, policy.tick);
            loop {
                interval.tick().await;
                if policy.max_step <= 0.0 {
                    continue;
                }
                let step = rand::thread_rng().gen_range(0.0..policy.max_step);
                meter.synthetic_step(step);
            }
        });
        debug!(tick_ms = policy.tick.as_millis() as u64, "progress ticker started");
        Self { handle }
    }

    pub(crate) fn cancel(self) {
        debug!("progress ticker cancelled");
        drop(self);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[path = "tests/progress_tests.rs"]
mod tests;
