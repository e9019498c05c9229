use std::fmt;
use std::net::SocketAddr;

use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl,
};
use url::Url;

use super::CaptureError;

pub const PICASA_SCOPE: &str = "https://picasaweb.google.com/data/";

/// Redirect that makes Google show the code in the browser title bar.
pub const TITLE_BAR_REDIRECT_URL: &str = "urn:ietf:wg:oauth:2.0:oob:auto";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

// Fixed so the consent URL is reproducible for the same request.
const CONSENT_STATE: &str = "picago";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// Short-lived token, the user is prompted again once it expires.
    Online,
    /// The provider also issues a refresh token.
    Offline,
}

impl AccessType {
    pub fn from_online(online: bool) -> Self {
        if online {
            AccessType::Online
        } else {
            AccessType::Offline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Online => "online",
            AccessType::Offline => "offline",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    TitleBar,
    Loopback(SocketAddr),
}

impl RedirectTarget {
    pub fn to_redirect_url(&self) -> Result<RedirectUrl, CaptureError> {
        RedirectUrl::new(self.to_string())
            .map_err(|e| CaptureError::InvalidUrl(format!("redirect {}: {}", self, e)))
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::TitleBar => f.write_str(TITLE_BAR_REDIRECT_URL),
            RedirectTarget::Loopback(addr) => write!(f, "http://{}", addr),
        }
    }
}

/// Authorization and token endpoints of the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub auth_url: String,
    pub token_url: String,
}

impl Endpoint {
    pub fn google() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn auth_url(&self) -> Result<AuthUrl, CaptureError> {
        AuthUrl::new(self.auth_url.clone())
            .map_err(|e| CaptureError::InvalidUrl(format!("auth URL: {}", e)))
    }

    pub fn token_url(&self) -> Result<TokenUrl, CaptureError> {
        TokenUrl::new(self.token_url.clone())
            .map_err(|e| CaptureError::InvalidUrl(format!("token URL: {}", e)))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::google()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.auth_url, self.token_url)
    }
}

/// Everything needed to build a consent URL for one authorization attempt.
///
/// Never mutated once built; [`AuthorizationRequest::with_redirect`] returns a
/// copy carrying the loopback address.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    endpoint: Endpoint,
    access_type: AccessType,
    redirect: RedirectTarget,
}

impl AuthorizationRequest {
    /// Picasa request against the Google endpoints, redirecting to the title bar.
    pub fn new(client_id: String, client_secret: String, access_type: AccessType) -> Self {
        Self {
            client_id,
            client_secret,
            scopes: vec![PICASA_SCOPE.to_string()],
            endpoint: Endpoint::google(),
            access_type,
            redirect: RedirectTarget::TitleBar,
        }
    }

    pub fn with_endpoint(self, endpoint: Endpoint) -> Self {
        Self { endpoint, ..self }
    }

    pub fn with_scopes(self, scopes: Vec<String>) -> Self {
        Self { scopes, ..self }
    }

    pub fn with_redirect(&self, redirect: RedirectTarget) -> Self {
        Self {
            redirect,
            ..self.clone()
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    pub fn redirect(&self) -> RedirectTarget {
        self.redirect
    }

    /// Build the URL the user must open to grant access. Pure, no I/O.
    pub fn consent_url(&self) -> Result<Url, CaptureError> {
        let (url, _) = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.endpoint.auth_url()?)
            .set_redirect_uri(self.redirect.to_redirect_url()?)
            .authorize_url(|| CsrfToken::new(CONSENT_STATE.to_string()))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", self.access_type.as_str())
            .url();
        Ok(url)
    }
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("endpoint", &self.endpoint)
            .field("access_type", &self.access_type)
            .field("redirect", &self.redirect)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn request(access_type: AccessType) -> AuthorizationRequest {
        AuthorizationRequest::new("my-id".to_string(), "my-secret".to_string(), access_type)
    }

    #[test]
    fn consent_url_is_reproducible() {
        let req = request(AccessType::Offline)
            .with_redirect(RedirectTarget::Loopback("127.0.0.1:4242".parse().unwrap()));

        let first = req.consent_url().unwrap();
        let second = req.consent_url().unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn consent_url_carries_request_parameters() {
        let url = request(AccessType::Offline).consent_url().unwrap();

        assert!(url.as_str().starts_with(GOOGLE_AUTH_URL));
        assert_eq!(query_param(&url, "client_id").as_deref(), Some("my-id"));
        assert_eq!(query_param(&url, "scope").as_deref(), Some(PICASA_SCOPE));
        assert_eq!(query_param(&url, "access_type").as_deref(), Some("offline"));
        assert_eq!(query_param(&url, "response_type").as_deref(), Some("code"));
        assert_eq!(query_param(&url, "state").as_deref(), Some("picago"));
        assert_eq!(query_param(&url, "client_secret"), None);
    }

    #[test]
    fn online_request_uses_title_bar_redirect() {
        let url = request(AccessType::Online).consent_url().unwrap();

        assert_eq!(query_param(&url, "access_type").as_deref(), Some("online"));
        assert_eq!(
            query_param(&url, "redirect_uri").as_deref(),
            Some(TITLE_BAR_REDIRECT_URL)
        );
    }

    #[test]
    fn loopback_redirect_renders_as_http_address() {
        let addr: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        assert_eq!(
            RedirectTarget::Loopback(addr).to_string(),
            "http://127.0.0.1:5555"
        );
        assert_eq!(RedirectTarget::TitleBar.to_string(), TITLE_BAR_REDIRECT_URL);
    }

    #[test]
    fn with_redirect_leaves_original_untouched() {
        let original = request(AccessType::Offline);
        let addr: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        let updated = original.with_redirect(RedirectTarget::Loopback(addr));

        assert_eq!(original.redirect(), RedirectTarget::TitleBar);
        assert_eq!(updated.redirect(), RedirectTarget::Loopback(addr));
        assert_eq!(updated.client_id(), original.client_id());
    }

    #[test]
    fn extra_scopes_are_space_separated() {
        let url = request(AccessType::Online)
            .with_scopes(vec![
                PICASA_SCOPE.to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
            ])
            .consent_url()
            .unwrap();

        assert_eq!(
            query_param(&url, "scope").as_deref(),
            Some("https://picasaweb.google.com/data/ https://www.googleapis.com/auth/userinfo.email")
        );
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let req = request(AccessType::Online).with_endpoint(Endpoint {
            auth_url: "not a url".to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        });

        assert!(matches!(
            req.consent_url(),
            Err(CaptureError::InvalidUrl(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", request(AccessType::Online));
        assert!(!rendered.contains("my-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
