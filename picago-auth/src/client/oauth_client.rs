use chrono::Utc;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, HttpRequest,
    HttpResponse, RedirectUrl, RefreshToken, TokenResponse, TokenUrl,
};

use crate::capture::AuthorizationRequest;
use crate::common::StoredToken;
use crate::error::AuthError;

// Adapter between oauth2 and the shared reqwest client
async fn send_request(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let content_type = response.headers().get(reqwest::header::CONTENT_TYPE).cloned();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;
    if let Some(content_type) = content_type {
        http_response
            .headers_mut()
            .insert(reqwest::header::CONTENT_TYPE, content_type);
    }

    Ok(http_response)
}

/// Code exchange and token refresh against the provider's token endpoint.
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: AuthUrl,
    token_url: TokenUrl,
}

impl OAuthClient {
    pub fn new(request: &AuthorizationRequest, http: reqwest::Client) -> Result<Self, AuthError> {
        let endpoint = request.endpoint();

        Ok(Self {
            http,
            client_id: request.client_id().to_string(),
            client_secret: request.client_secret().to_string(),
            auth_url: endpoint.auth_url()?,
            token_url: endpoint.token_url()?,
        })
    }

    /// Exchange an authorization code, repeating the redirect the consent URL used.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_url: RedirectUrl,
    ) -> Result<StoredToken, AuthError> {
        let http = self.http.clone();
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(redirect_url)
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&|request: HttpRequest| send_request(http.clone(), request))
            .await?;

        let token = StoredToken {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|token| token.secret().to_string()),
            expires_at: token_result.expires_in().map(|expires_in| Utc::now() + expires_in),
        };

        tracing::debug!(
            expires_at = ?token.expires_at,
            has_refresh_token = token.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(token)
    }

    /// Refresh an access token. The old refresh token is kept when the
    /// provider does not rotate it.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<StoredToken, AuthError> {
        let http = self.http.clone();
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&|request: HttpRequest| send_request(http.clone(), request))
            .await?;

        let token = StoredToken {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: Some(
                token_result
                    .refresh_token()
                    .map(|token| token.secret().to_string())
                    .unwrap_or_else(|| refresh_token.to_string()),
            ),
            expires_at: token_result.expires_in().map(|expires_in| Utc::now() + expires_in),
        };

        tracing::debug!(expires_at = ?token.expires_at, "Refreshed tokens");

        Ok(token)
    }
}
