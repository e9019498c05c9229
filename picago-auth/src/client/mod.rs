mod config;
mod oauth_client;
mod token_source;
mod token_storage;

pub use self::config::Settings;
pub use oauth_client::OAuthClient;
pub use token_source::{AuthCodeProvider, TokenSource};
pub use token_storage::TokenStore;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{AccessType, AuthorizationRequest, LoopbackCapturer};
use crate::common::StoredToken;
use crate::error::AuthError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client that attaches a bearer token from its token source.
pub struct PicasaClient<P = LoopbackCapturer> {
    http_client: reqwest::Client,
    source: Arc<TokenSource<P>>,
}

impl<P> Clone for PicasaClient<P> {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl PicasaClient<LoopbackCapturer> {
    /// Build a client from loaded [`Settings`], capturing codes on a loopback listener.
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        settings.validate().map_err(AuthError::Configuration)?;

        let token_cache_file = match &settings.token_cache_file {
            Some(path) => path.clone(),
            None => TokenStore::default_path()?,
        };
        let request = AuthorizationRequest::new(
            settings.client_id.clone(),
            settings.client_secret.clone(),
            AccessType::from_online(settings.online),
        );

        let mut capturer = LoopbackCapturer::new(request.clone());
        if let Some(timeout) = settings.capture_timeout() {
            capturer = capturer.with_timeout(timeout);
        }

        let http_client = build_http_client()?;
        let source = TokenSource::new(
            OAuthClient::new(&request, http_client.clone())?,
            TokenStore::new(token_cache_file)?,
            capturer,
        )
        .with_code(settings.code.clone());

        Ok(Self::with_source(http_client, source))
    }
}

impl<P: AuthCodeProvider> PicasaClient<P> {
    pub fn with_source(http_client: reqwest::Client, source: TokenSource<P>) -> Self {
        Self {
            http_client,
            source: Arc::new(source),
        }
    }

    pub async fn token(&self) -> Result<StoredToken, AuthError> {
        self.source.token().await
    }

    pub async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.source.token().await?.access_token)
    }

    /// Authorized GET. Non-success statuses are returned as errors.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, AuthError> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response)
    }
}

fn build_http_client() -> Result<reqwest::Client, AuthError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Authorized client for the Picasa API, caching tokens in `token_cache_file`.
///
/// `code` may be empty. `online` decides whether the user has to be at the
/// browser again once the access token expires.
pub fn new_client(
    id: &str,
    secret: &str,
    code: &str,
    online: bool,
    token_cache_file: impl Into<PathBuf>,
) -> Result<PicasaClient, AuthError> {
    PicasaClient::from_settings(&Settings {
        client_id: id.to_string(),
        client_secret: secret.to_string(),
        code: code.to_string(),
        online,
        token_cache_file: Some(token_cache_file.into()),
        capture_timeout_seconds: None,
    })
}
