//! Batch selection: the ordered set of images queued for one submission and the
//! admission rules applied when candidates are offered.

use bytes::Bytes;
use shared::domain::{ModelId, Scale};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_FILES: usize = 50;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// A user-chosen image blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Exactly one scale and one model are selected at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpscaleOptions {
    pub scale: Scale,
    pub model: ModelId,
}

/// User-facing validation notice raised while admitting candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CapacityExceeded { limit: usize },
    OversizedFile { name: String, size: u64, limit: u64 },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::CapacityExceeded { limit } => {
                format!("At most {limit} images can be upscaled per batch.")
            }
            Notice::OversizedFile { name, limit, .. } => {
                format!("\"{name}\" is larger than {} MB and was skipped.", limit / MIB)
            }
        }
    }
}

/// Outcome of one `add_files` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub accepted: usize,
    /// Names of candidates dropped for not being images. These never raise a notice.
    pub unsupported: Vec<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub index: usize,
    pub name: String,
    pub size: u64,
    pub media_type: String,
}

/// Plain-data rendering of the current batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionView {
    pub entries: Vec<SelectionEntry>,
    pub total_bytes: u64,
    pub options_visible: bool,
}

/// Insertion-ordered batch. Order decides both display order and upload order.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    files: Vec<SelectedFile>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn remove(&mut self, index: usize) -> Option<SelectedFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn view(&self) -> SelectionView {
        let entries = self
            .files
            .iter()
            .enumerate()
            .map(|(index, file)| SelectionEntry {
                index,
                name: file.name.clone(),
                size: file.size(),
                media_type: file.media_type.clone(),
            })
            .collect::<Vec<_>>();
        SelectionView {
            total_bytes: entries.iter().map(|entry| entry.size).sum(),
            options_visible: !entries.is_empty(),
            entries,
        }
    }

    fn push(&mut self, file: SelectedFile) {
        self.files.push(file);
    }
}

/// Admission rules for candidates offered to a [`SelectionStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: BatchLimits,
}

impl Validator {
    pub fn new(limits: BatchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Offers `candidates` in order. A full batch halts the call; an oversized
    /// or non-image candidate is skipped and the rest are still considered.
    pub fn admit<I>(&self, store: &mut SelectionStore, candidates: I) -> AddReport
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        let mut report = AddReport::default();

        for candidate in candidates {
            if store.len() >= self.limits.max_files {
                warn!(
                    limit = self.limits.max_files,
                    "batch is full; ignoring remaining candidates"
                );
                report.notices.push(Notice::CapacityExceeded {
                    limit: self.limits.max_files,
                });
                break;
            }

            let size = candidate.size();
            if size > self.limits.max_file_bytes {
                warn!(name = %candidate.name, size, "skipping oversized candidate");
                report.notices.push(Notice::OversizedFile {
                    name: candidate.name,
                    size,
                    limit: self.limits.max_file_bytes,
                });
                continue;
            }

            if !candidate.is_image() {
                debug!(
                    name = %candidate.name,
                    media_type = %candidate.media_type,
                    "skipping non-image candidate"
                );
                report.unsupported.push(candidate.name);
                continue;
            }

            store.push(candidate);
            report.accepted += 1;
        }

        info!(
            accepted = report.accepted,
            batch_len = store.len(),
            "admitted candidates into batch"
        );
        report
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
