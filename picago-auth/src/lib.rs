//! OAuth2 authorization for the Picasa Web Albums API.
//!
//! Tokens are cached in a file. When the cache holds nothing usable the user is
//! sent through the browser consent flow and the authorization code is captured
//! on a one-shot loopback listener.

pub mod capture;
pub mod common;

mod client;
mod error;

pub use capture::{
    AccessType, AuthorizationRequest, CaptureError, CapturedCode, ConsentPrompt, Endpoint,
    LoopbackCapturer, PendingCapture, RedirectTarget, StdoutPrompt,
};
pub use client::{
    new_client, AuthCodeProvider, OAuthClient, PicasaClient, Settings, TokenSource, TokenStore,
};
pub use common::StoredToken;
pub use error::AuthError;

/// Authorize using OAuth2 with an id and secret issued by Google.
///
/// Not supported: always fails with [`AuthError::NotImplemented`] and has no
/// side effects. Use [`new_client`] instead.
pub fn authorize(_id: &str, _secret: &str) -> Result<(), AuthError> {
    Err(AuthError::NotImplemented)
}
