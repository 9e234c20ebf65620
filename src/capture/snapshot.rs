//! Body snapshots.
//!
//! Reads a streaming body fully into memory and hands back a fresh body over
//! the same bytes, so the forwarder sees exactly what the client or upstream
//! sent.

use axum::body::{to_bytes, Body};
use bytes::Bytes;
use thiserror::Error;

/// Error type for body capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read body: {0}")]
    BodyRead(#[from] axum::Error),
}

/// Buffer `body` and return a replayable replacement plus the captured bytes.
///
/// On a read failure the stream is already partly consumed; the replacement
/// is empty and the error is returned for logging.
pub async fn snapshot_body(body: Body) -> (Body, Result<Bytes, CaptureError>) {
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => (Body::from(bytes.clone()), Ok(bytes)),
        Err(e) => (Body::empty(), Err(CaptureError::BodyRead(e))),
    }
}

/// Body whose peer resets before the first frame.
#[cfg(test)]
pub(crate) struct ResetBody;

#[cfg(test)]
impl hyper::body::Body for ResetBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Result<hyper::body::Frame<Bytes>, Self::Error>>> {
        std::task::Poll::Ready(Some(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))))
    }
}
