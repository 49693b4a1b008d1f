use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};
use super::auth::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    /// Recipient identifier
    #[serde(default)]
    pub u: String,
}

/// POST / - forward the alert body to the recipient named by `?u=`
pub async fn receive_alert(
    State(state): State<AppState>,
    query: Option<Query<AlertQuery>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let recipient = query.map(|Query(q)| q.u).unwrap_or_default();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Failed to read request body: {}", rejection.body_text());
            return internal_error(rejection.body_text());
        }
    };

    let content = match state.extractor.extract(&body) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to extract alert content: {}", e);
            return internal_error(e.to_string());
        }
    };

    debug!("Dispatching {} bytes to '{}'", content.len(), recipient);

    match state.dispatcher.dispatch(&recipient, &content).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Dispatch to '{}' failed: {}", recipient, e);
            internal_error(e.to_string())
        }
    }
}

fn internal_error(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
