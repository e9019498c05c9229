//! Interactive capture of an OAuth2 authorization code.
//!
//! A capture binds a loopback listener, shows the consent URL, serves a single
//! provider redirect and hands the `code` parameter back to the caller. The
//! listener is closed before the result is returned.

mod error;
pub mod handler;
pub mod listener;
mod prompt;
mod request;

pub use error::CaptureError;
pub use prompt::{ConsentPrompt, StdoutPrompt};
pub use request::{
    AccessType, AuthorizationRequest, Endpoint, RedirectTarget, PICASA_SCOPE,
    TITLE_BAR_REDIRECT_URL,
};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use oauth2::RedirectUrl;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::Instrument;
use url::Url;

use crate::client::AuthCodeProvider;
use handler::CallbackState;
use listener::EPHEMERAL_LOOPBACK;

/// Authorization code delivered by the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCode {
    /// Opaque code, empty when the redirect carried none.
    pub code: String,
    /// Redirect the consent URL was built with. The token exchange must repeat it.
    pub redirect_url: RedirectUrl,
}

/// Runs the consent flow over a loopback listener.
#[derive(Clone)]
pub struct LoopbackCapturer {
    request: AuthorizationRequest,
    bind_addr: SocketAddr,
    timeout: Option<Duration>,
    prompt: Arc<dyn ConsentPrompt>,
}

impl LoopbackCapturer {
    pub fn new(request: AuthorizationRequest) -> Self {
        Self {
            request,
            bind_addr: EPHEMERAL_LOOPBACK,
            timeout: None,
            prompt: Arc::new(StdoutPrompt),
        }
    }

    pub fn with_bind_addr(self, bind_addr: SocketAddr) -> Self {
        Self { bind_addr, ..self }
    }

    /// Bound the wait for the redirect. Without it the wait never ends on its own.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn with_prompt<P>(self, prompt: P) -> Self
    where
        P: ConsentPrompt + 'static,
    {
        Self {
            prompt: Arc::new(prompt),
            ..self
        }
    }

    /// Bind the listener, show the consent URL and start serving the callback.
    ///
    /// Returns the pending capture together with the URL that was shown.
    pub async fn start(&self) -> Result<(PendingCapture, Url), CaptureError> {
        let (listener, addr) = listener::bind_loopback(self.bind_addr).await?;

        let request = match self.request.access_type() {
            AccessType::Offline => self.request.with_redirect(RedirectTarget::Loopback(addr)),
            AccessType::Online => self.request.clone(),
        };
        let redirect_url = request.redirect().to_redirect_url()?;
        let url = request.consent_url()?;

        self.prompt.show(&url);

        let (tx, rx) = oneshot::channel();
        let app = handler::router(CallbackState::new(request, tx));
        let server = tokio::spawn(
            async move {
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "Callback server failed");
                }
            }
            .in_current_span(),
        );

        tracing::info!(%addr, "Waiting for authorization redirect");

        Ok((
            PendingCapture {
                addr,
                redirect_url,
                receiver: rx,
                server,
            },
            url,
        ))
    }

    /// Run one full capture and wait for its outcome.
    pub async fn capture(&self) -> Result<CapturedCode, CaptureError> {
        let span = tracing::info_span!(
            "auth_code_capture",
            access_type = %self.request.access_type()
        );

        async move {
            let (pending, _) = self.start().await?;
            pending.wait(self.timeout).await
        }
        .instrument(span)
        .await
    }
}

impl AuthCodeProvider for LoopbackCapturer {
    async fn auth_code(&self) -> Result<CapturedCode, CaptureError> {
        self.capture().await
    }
}

/// A listener that is open and waiting for exactly one redirect.
///
/// Owned by whoever started the capture; dropping it closes the listener.
pub struct PendingCapture {
    addr: SocketAddr,
    redirect_url: RedirectUrl,
    receiver: oneshot::Receiver<String>,
    server: JoinHandle<()>,
}

impl PendingCapture {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn redirect_url(&self) -> &RedirectUrl {
        &self.redirect_url
    }

    /// Wait for the redirect, then close the listener.
    ///
    /// `None` waits without limit.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<CapturedCode, CaptureError> {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.receiver).await {
                Ok(received) => received.map_err(|_| CaptureError::Abandoned),
                Err(_) => Err(CaptureError::Timeout(limit)),
            },
            None => (&mut self.receiver)
                .await
                .map_err(|_| CaptureError::Abandoned),
        };

        self.close().await;

        received.map(|code| CapturedCode {
            code,
            redirect_url: self.redirect_url.clone(),
        })
    }

    async fn close(&mut self) {
        self.server.abort();
        // The listener is dropped once the aborted task has been torn down.
        let _ = (&mut self.server).await;
        tracing::debug!(addr = %self.addr, "Closed loopback listener");
    }
}

impl Drop for PendingCapture {
    fn drop(&mut self) {
        self.server.abort();
    }
}
