use std::future::Future;

use tokio::sync::Mutex;

use super::{OAuthClient, TokenStore};
use crate::capture::{CaptureError, CapturedCode, RedirectTarget};
use crate::common::StoredToken;
use crate::error::AuthError;

/// Supplies an authorization code when no cached or refreshable token exists.
pub trait AuthCodeProvider: Send + Sync {
    fn auth_code(&self) -> impl Future<Output = Result<CapturedCode, CaptureError>> + Send;
}

/// Cached access token, refreshed or re-authorized on demand.
pub struct TokenSource<P> {
    oauth: OAuthClient,
    store: TokenStore,
    provider: P,
    // Also serializes `token()`: at most one authorization in flight per source.
    initial_code: Mutex<Option<String>>,
}

impl<P: AuthCodeProvider> TokenSource<P> {
    pub fn new(oauth: OAuthClient, store: TokenStore, provider: P) -> Self {
        Self {
            oauth,
            store,
            provider,
            initial_code: Mutex::new(None),
        }
    }

    /// Code obtained out of band (title bar redirect), tried once before prompting.
    pub fn with_code(self, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            initial_code: Mutex::new((!code.is_empty()).then_some(code)),
            ..self
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub async fn token(&self) -> Result<StoredToken, AuthError> {
        let mut initial_code = self.initial_code.lock().await;

        if let Some(token) = self.store.load_token()? {
            if !self.store.is_token_expired(&token) {
                tracing::debug!("Using cached token");
                return Ok(token);
            }

            if let Some(refresh_token) = token.refresh_token.as_deref() {
                match self.oauth.refresh_access_token(refresh_token).await {
                    Ok(new_token) => {
                        self.store.save_token(&new_token)?;
                        tracing::info!("Token refreshed");
                        return Ok(new_token);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to refresh token");
                        self.store.delete_token()?;
                    }
                }
            } else {
                tracing::info!("Cached token expired and cannot be refreshed");
            }
        }

        let captured = match initial_code.take() {
            Some(code) => CapturedCode {
                code,
                redirect_url: RedirectTarget::TitleBar.to_redirect_url()?,
            },
            None => self.provider.auth_code().await?,
        };

        let token = self
            .oauth
            .exchange_code(&captured.code, captured.redirect_url)
            .await?;
        self.store.save_token(&token)?;
        tracing::info!("Authorization completed");

        Ok(token)
    }
}
