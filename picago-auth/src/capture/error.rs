use std::time::Duration;

use thiserror::Error;

/// Terminal failure of a single authorization code capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("could not bind loopback listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("no authorization redirect received within {0:?}")]
    Timeout(Duration),

    #[error("callback server stopped before a redirect was received")]
    Abandoned,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
