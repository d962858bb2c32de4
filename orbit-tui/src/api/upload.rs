use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{ApiError, ApiResult};
use orbit_types::ANONYMOUS_USERNAME;

/// Size of the body chunks handed to the transport; progress advances once per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// A raw-body media upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub body: Bytes,
    pub mime_type: Option<String>,
    pub caption: String,
    pub username: String,
}

impl UploadRequest {
    pub fn new(body: impl Into<Bytes>, caption: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            mime_type: None,
            caption: caption.into(),
            username: username.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type.filter(|m| !m.is_empty());
        self
    }

    /// Query string for `/upload_media`; a blank username uploads as anonymous.
    pub fn query(&self) -> String {
        let username = if self.username.trim().is_empty() {
            ANONYMOUS_USERNAME
        } else {
            self.username.as_str()
        };
        format!(
            "caption={}&username={}",
            urlencoding::encode(&self.caption),
            urlencoding::encode(username)
        )
    }
}

/// An upload running on a background task.
///
/// Aborting stops the client from sending or waiting; bytes already on the wire
/// stay sent and the server may still store the file.
pub struct UploadHandle {
    progress: watch::Receiver<u8>,
    task: JoinHandle<ApiResult<String>>,
}

impl UploadHandle {
    pub fn new(progress: watch::Receiver<u8>, task: JoinHandle<ApiResult<String>>) -> Self {
        Self { progress, task }
    }

    /// Percentage of the body handed to the transport, 0..=100.
    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the upload result. An aborted upload resolves to `ApiError::Aborted`.
    pub async fn finish(self) -> ApiResult<String> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ApiError::Aborted),
            Err(e) => Err(ApiError::Http {
                status: 0,
                message: format!("Upload task failed: {}", e),
            }),
        }
    }
}

/// Identifier of a new post from the upload response body.
///
/// Accepts `{"name": "..."}`, a JSON string, or plain text.
pub fn uploaded_name(body: &str) -> Option<String> {
    let body = body.trim();
    let name = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map.get("name").and_then(|v| v.as_str()).map(String::from),
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => Some(body.to_string()),
    };
    name.filter(|n| !n.trim().is_empty())
}

pub(crate) fn percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Wrap the body in a stream that reports progress as chunks are consumed.
pub(crate) fn progress_body(data: Bytes, progress: watch::Sender<u8>) -> reqwest::Body {
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(total)))
        .collect();

    let mut sent = 0usize;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        let _ = progress.send(percent(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}
