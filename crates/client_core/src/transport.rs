//! Remote processing endpoint: the batch submission seam and its HTTP implementation.

use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use reqwest::{
    multipart::{Form, Part},
    Body, Client, StatusCode,
};
use shared::{
    domain::SessionId,
    error::ApiError,
    protocol::{cleanup_path, UpscaleResponse, IMAGES_FIELD, MODEL_FIELD, SCALE_FIELD, UPSCALE_PATH},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{SubmitError, TransportSetupError},
    progress::TransferProgress,
    selection::{SelectedFile, UpscaleOptions},
    settings::ClientSettings,
};

const CHUNK_SIZE: usize = 64 * 1024;

/// Everything one submission carries: the ordered files and the selected options.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub files: Vec<SelectedFile>,
    pub options: UpscaleOptions,
}

impl BatchRequest {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(SelectedFile::size).sum()
    }
}

#[async_trait]
pub trait UpscaleTransport: Send + Sync {
    /// Issues one batch request and waits, without a deadline unless the
    /// implementation imposes one, for the terminal response.
    async fn submit(
        &self,
        request: BatchRequest,
        progress: TransferProgress,
    ) -> Result<UpscaleResponse, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct HttpUpscaleTransport {
    http: Client,
    base_url: Url,
    upscale_path: String,
}

impl HttpUpscaleTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportSetupError> {
        Self::with_options(server_url, UPSCALE_PATH, None)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportSetupError> {
        Self::with_options(
            &settings.server_url,
            &settings.upscale_path,
            settings.request_timeout(),
        )
    }

    pub fn with_options(
        server_url: &str,
        upscale_path: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportSetupError> {
        let base_url = Url::parse(server_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
            upscale_path: upscale_path.to_string(),
        })
    }

    /// Resolves a server-supplied reference (e.g. `/api/download/...`) against the base URL.
    pub fn resolve(&self, reference: &str) -> Result<Url, SubmitError> {
        self.base_url
            .join(reference)
            .map_err(|err| SubmitError::InvalidRequest(format!("bad reference `{reference}`: {err}")))
    }

    /// Fetches the bytes behind a per-result or bulk download reference.
    pub async fn download(&self, reference: &str) -> Result<Bytes, SubmitError> {
        let url = self.resolve(reference)?;
        debug!(%url, "downloading result");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(decode_failure(status, &body))
        }
    }

    /// Asks the service to drop every stored result of `session_id`.
    pub async fn cleanup_session(&self, session_id: &SessionId) -> Result<(), SubmitError> {
        let url = self.resolve(&cleanup_path(session_id))?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            info!(session_id = %session_id, "session cleaned up");
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(decode_failure(status, &body))
    }
}

#[async_trait]
impl UpscaleTransport for HttpUpscaleTransport {
    async fn submit(
        &self,
        request: BatchRequest,
        progress: TransferProgress,
    ) -> Result<UpscaleResponse, SubmitError> {
        let url = self.resolve(&self.upscale_path)?;
        let total = request.total_bytes();
        let file_count = request.files.len();
        let sent = Arc::new(AtomicU64::new(0));
        progress.report(0, total);

        let mut form = Form::new();
        for file in request.files {
            let size = file.size();
            let body = Body::wrap_stream(counted_chunks(
                file.data,
                Arc::clone(&sent),
                total,
                progress.clone(),
            ));
            let part = Part::stream_with_length(body, size)
                .file_name(file.name)
                .mime_str(&file.media_type)
                .map_err(|err| SubmitError::InvalidRequest(err.to_string()))?;
            form = form.part(IMAGES_FIELD, part);
        }
        let form = form
            .text(SCALE_FIELD, request.options.scale.factor().to_string())
            .text(MODEL_FIELD, request.options.model.as_str());

        info!(%url, files = file_count, total_bytes = total, "submitting upscale batch");
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        decode_upscale_response(status, &body)
    }
}

/// Classifies a batch response: success body, structured failure, or unreadable failure.
pub fn decode_upscale_response(
    status: StatusCode,
    body: &[u8],
) -> Result<UpscaleResponse, SubmitError> {
    if !status.is_success() {
        return Err(decode_failure(status, body));
    }
    serde_json::from_slice::<UpscaleResponse>(body).map_err(|err| {
        warn!(status = status.as_u16(), error = %err, "unreadable success body");
        SubmitError::MalformedResponse {
            status: status.as_u16(),
            reason: err.to_string(),
        }
    })
}

fn decode_failure(status: StatusCode, body: &[u8]) -> SubmitError {
    match serde_json::from_slice::<ApiError>(body) {
        // A blank message carries nothing to show; treat it like no body at all.
        Ok(api_error) if !api_error.error.trim().is_empty() => SubmitError::Server {
            status: status.as_u16(),
            message: api_error.error,
        },
        _ => SubmitError::UnstructuredServer {
            status: status.as_u16(),
        },
    }
}

/// Splits `data` into chunks that report cumulative bytes as the HTTP stack pulls them.
fn counted_chunks(
    data: Bytes,
    sent: Arc<AtomicU64>,
    total: u64,
    progress: TransferProgress,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let chunks = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect::<Vec<_>>();

    stream::iter(chunks).map(move |chunk| {
        let len = chunk.len() as u64;
        let so_far = sent.fetch_add(len, Ordering::Relaxed) + len;
        progress.report(so_far, total);
        Ok(chunk)
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
