use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    Router,
};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use super::AuthorizationRequest;

/// Raw name/value pairs, in the order they were sent. Names may repeat.
type Pairs = Vec<(String, String)>;

/// First value sent for `name`.
fn first_value(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

#[derive(Clone)]
pub struct CallbackState {
    request: Arc<AuthorizationRequest>,
    sender: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl CallbackState {
    pub fn new(request: AuthorizationRequest, sender: oneshot::Sender<String>) -> Self {
        Self {
            request: Arc::new(request),
            sender: Arc::new(Mutex::new(Some(sender))),
        }
    }

    /// Hand the code to the waiting side. Only the first call delivers.
    fn deliver(&self, code: String) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match sender {
            Some(tx) => tx.send(code).is_ok(),
            None => false,
        }
    }
}

/// Router answering every path and method with the callback handler.
pub fn router(state: CallbackState) -> Router {
    Router::new()
        .fallback(receive_code)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn receive_code(
    State(state): State<CallbackState>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> String {
    let query = query.map(|Query(pairs)| pairs).unwrap_or_default();
    let form = form.map(|Form(pairs)| pairs).unwrap_or_default();

    if let Some(error) = first_value(&form, "error").or_else(|| first_value(&query, "error")) {
        tracing::warn!(error = %error, "Authorization redirect carried an error parameter");
    }

    // Body values win over the query string.
    let code = first_value(&form, "code")
        .or_else(|| first_value(&query, "code"))
        .unwrap_or_default();

    let request = &state.request;
    let body = format!(
        "Successfully received authorization code for ID={}, scope=[{}], for endpoints {}.",
        request.client_id(),
        request.scopes().join(" "),
        request.endpoint()
    );

    if state.deliver(code) {
        tracing::info!("Authorization code received");
    } else {
        tracing::debug!("Ignoring callback, code already delivered");
    }

    body
}
