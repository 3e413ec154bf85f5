//! The write side of an HTTP exchange.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use std::io;

/// Destination of a [`Response`](crate::Response).
///
/// Headers must be staged before [`write_head`](ResponseWriter::write_head);
/// once the head is written, later header changes are not sent.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Send the status line and the staged headers.
    fn write_head(&mut self, status: StatusCode);

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// In-memory [`ResponseWriter`] that can be turned into an axum response.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    staged: HeaderMap,
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status that was written, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Headers that were sent with the status line.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.staged
    }

    fn write_head(&mut self, status: StatusCode) {
        if let Some(existing) = self.status {
            tracing::warn!(
                existing = existing.as_u16(),
                ignored = status.as_u16(),
                "status already written"
            );
            return;
        }
        self.status = Some(status);
        self.headers = std::mem::take(&mut self.staged);
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

impl IntoResponse for ResponseRecorder {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}
