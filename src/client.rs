//! HTTP client for the annotation server.
//!
//! Thin reqwest wrapper over the four server routes:
//!
//! | Route | Use |
//! |-------|-----|
//! | `GET /image/{filename}` | raw image bytes for the background layer |
//! | `GET /load_annotation/{filename}` | stored shapes, `{"shapes": []}` when none |
//! | `POST /save` | replace the stored shapes for a filename |
//! | `POST /upload` | multipart image (and optional annotation file) |
//!
//! Response parsing is pure (`parse_annotation`, `parse_save_ack`) so it is
//! testable without a server. The editor talks to the server through the
//! [`AnnotationStore`] trait, which tests replace with a mock.

use std::path::Path;
use std::time::Duration;

use canvas::doc::Annotation;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::{AnnotatorConfig, HttpTimeouts};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by annotation server operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The configured base URL cannot have paths appended to it.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The server acknowledged the save with something other than success.
    #[error("save rejected: {0}")]
    SaveRejected(String),

    /// A local file for upload could not be read.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

impl ClientError {
    /// Whether calling again unchanged may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Load/save seam between the editor and the server. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Fetch the stored annotation for `filename` (empty if the server has none).
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status, or parse failure.
    async fn load_annotation(&self, filename: &str) -> Result<Annotation, ClientError>;

    /// Replace the stored annotation for `filename`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] unless the server acknowledged success.
    async fn save_annotation(&self, filename: &str, annotation: &Annotation) -> Result<(), ClientError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnnotationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AnnotationClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// # Errors
    ///
    /// See [`AnnotationClient::new`].
    pub fn from_config(config: &AnnotatorConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the base cannot take path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the raw image bytes for `filename`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or a non-success status.
    pub async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&["image", filename])?;
        let response = self.http.get(url).send().await.map_err(|e| ClientError::Request(e.to_string()))?;
        let bytes = check_status(response).await?.bytes().await.map_err(|e| ClientError::Request(e.to_string()))?;
        debug!(%filename, bytes = bytes.len(), "image fetched");
        Ok(bytes.to_vec())
    }

    /// Fetch the image for `filename` and write it to `out`. Returns the byte count.
    ///
    /// # Errors
    ///
    /// Returns the [`fetch_image`](Self::fetch_image) errors, or
    /// [`ClientError::Io`] if `out` cannot be written.
    pub async fn download_image(&self, filename: &str, out: &Path) -> Result<usize, ClientError> {
        let bytes = self.fetch_image(filename).await?;
        tokio::fs::write(out, &bytes)
            .await
            .map_err(|e| ClientError::Io { path: out.display().to_string(), message: e.to_string() })?;
        info!(%filename, out = %out.display(), bytes = bytes.len(), "image downloaded");
        Ok(bytes.len())
    }

    /// Upload an image file, optionally with an annotation JSON file for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if a file cannot be read, otherwise a
    /// transport or status error.
    pub async fn upload(&self, image: &Path, annotation: Option<&Path>) -> Result<(), ClientError> {
        let mut form = Form::new().part("image", file_part(image).await?);
        if let Some(path) = annotation {
            form = form.part("annotation", file_part(path).await?);
        }
        let url = self.endpoint(&["upload"])?;
        let response = self.http.post(url).multipart(form).send().await.map_err(|e| ClientError::Request(e.to_string()))?;
        read_success_body(response).await?;
        info!(image = %image.display(), with_annotation = annotation.is_some(), "image uploaded");
        Ok(())
    }
}

#[async_trait::async_trait]
impl AnnotationStore for AnnotationClient {
    async fn load_annotation(&self, filename: &str) -> Result<Annotation, ClientError> {
        let url = self.endpoint(&["load_annotation", filename])?;
        let response = self.http.get(url).send().await.map_err(|e| ClientError::Request(e.to_string()))?;
        let text = read_success_body(response).await?;
        let annotation = parse_annotation(&text)?;
        info!(%filename, shapes = annotation.len(), "annotation loaded");
        Ok(annotation)
    }

    async fn save_annotation(&self, filename: &str, annotation: &Annotation) -> Result<(), ClientError> {
        let url = self.endpoint(&["save"])?;
        let body = SaveRequest { filename, annotation };
        let response = self.http.post(url).json(&body).send().await.map_err(|e| ClientError::Request(e.to_string()))?;
        let text = read_success_body(response).await?;
        parse_save_ack(&text)?;
        info!(%filename, shapes = annotation.len(), "annotation saved");
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `POST /save`.
#[derive(Debug, serde::Serialize)]
pub struct SaveRequest<'a> {
    pub filename: &'a str,
    pub annotation: &'a Annotation,
}

#[derive(serde::Deserialize)]
struct SaveAck {
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a `load_annotation` body. A missing `shapes` key means no shapes.
///
/// # Errors
///
/// Returns [`ClientError::Parse`] if the body is not an annotation object.
pub fn parse_annotation(json: &str) -> Result<Annotation, ClientError> {
    serde_json::from_str(json).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Parse a `save` acknowledgement; only `{"status": "success"}` is success.
///
/// # Errors
///
/// Returns [`ClientError::Parse`] for non-JSON bodies and
/// [`ClientError::SaveRejected`] for any other status.
pub fn parse_save_ack(json: &str) -> Result<(), ClientError> {
    let ack: SaveAck = serde_json::from_str(json).map_err(|e| ClientError::Parse(e.to_string()))?;
    match ack.status.as_deref() {
        Some("success") => Ok(()),
        Some(other) => Err(ClientError::SaveRejected(other.to_string())),
        None => Err(ClientError::SaveRejected("missing status".to_string())),
    }
}

/// Pass a 2xx response through; turn anything else into `Status` with its body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.map_err(|e| ClientError::Request(e.to_string()))?;
    Err(ClientError::Status { status: status.as_u16(), body })
}

async fn read_success_body(response: reqwest::Response) -> Result<String, ClientError> {
    check_status(response).await?.text().await.map_err(|e| ClientError::Request(e.to_string()))
}

async fn file_part(path: &Path) -> Result<Part, ClientError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Io { path: path.display().to_string(), message: e.to_string() })?;
    let name = path.file_name().map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(Part::bytes(data).file_name(name))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
