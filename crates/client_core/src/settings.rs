use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::{
    domain::{ModelId, Scale},
    error::ProtocolError,
};
use thiserror::Error;
use tracing::warn;

use crate::{
    progress::ProgressPolicy,
    selection::{BatchLimits, UpscaleOptions, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES},
};

pub const SETTINGS_FILE: &str = "upscaler.toml";
const ENV_PREFIX: &str = "UPSCALER__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub server_url: String,
    pub upscale_path: String,
    pub max_files: usize,
    pub max_file_bytes: u64,
    pub progress_tick_ms: u64,
    /// No client-side deadline when unset.
    pub request_timeout_secs: Option<u64>,
    pub default_scale: u32,
    pub default_model: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            upscale_path: shared::protocol::UPSCALE_PATH.into(),
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            progress_tick_ms: 1000,
            request_timeout_secs: None,
            default_scale: Scale::default().factor(),
            default_model: ModelId::default().as_str().into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ProtocolError),
}

/// Defaults, then `explicit` (or `upscaler.toml` when present), then `UPSCALER__*` variables.
pub fn load_settings(explicit: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    let default_path = Path::new(SETTINGS_FILE);
    let mut settings = match explicit {
        Some(path) => read_settings_file(path)?,
        None if default_path.exists() => read_settings_file(default_path)?,
        None => ClientSettings::default(),
    };
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<ClientSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ClientSettings {
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("UPSCALE_PATH") {
            self.upscale_path = v;
        }
        if let Some(v) = parsed(var("MAX_FILES"), "MAX_FILES") {
            self.max_files = v;
        }
        if let Some(v) = parsed(var("MAX_FILE_BYTES"), "MAX_FILE_BYTES") {
            self.max_file_bytes = v;
        }
        if let Some(v) = parsed(var("PROGRESS_TICK_MS"), "PROGRESS_TICK_MS") {
            self.progress_tick_ms = v;
        }
        if let Some(v) = parsed(var("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(v);
        }
    }

    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits {
            max_files: self.max_files,
            max_file_bytes: self.max_file_bytes,
        }
    }

    pub fn progress_policy(&self) -> ProgressPolicy {
        ProgressPolicy {
            tick: Duration::from_millis(self.progress_tick_ms.max(1)),
            ..ProgressPolicy::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn default_options(&self) -> Result<UpscaleOptions, SettingsError> {
        Ok(UpscaleOptions {
            scale: Scale::try_from(self.default_scale)?,
            model: self.default_model.parse()?,
        })
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>, name: &str) -> Option<T> {
    let raw = value?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = %format!("{ENV_PREFIX}{name}"), value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
