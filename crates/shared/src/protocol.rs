use serde::{Deserialize, Serialize};

use crate::domain::SessionId;

/// Batch submission endpoint.
pub const UPSCALE_PATH: &str = "/api/upscale";
/// Repeated multipart field carrying one image per part.
pub const IMAGES_FIELD: &str = "images";
pub const SCALE_FIELD: &str = "scale";
pub const MODEL_FIELD: &str = "model";

/// Reference the service resolves into an archive of every result in `session_id`.
pub fn download_zip_path(session_id: &SessionId) -> String {
    format!("/api/download-zip/{}", session_id.as_str())
}

pub fn cleanup_path(session_id: &SessionId) -> String {
    format!("/api/cleanup/{}", session_id.as_str())
}

/// Body of a successful batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleResponse {
    pub session_id: SessionId,
    /// Echoed as a raw integer; the service may apply any outscale it supports.
    pub scale: u32,
    pub results: Vec<ResultDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    pub original_name: String,
    pub output_name: String,
    pub preview_url: String,
    pub download_url: String,
    pub width: u32,
    pub height: u32,
}
