use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::gatekeeper;
use crate::inbound::http::gatekeeper::Rejection;
use crate::inbound::http::router::AppState;

/// Token probe. Checks signature and expiry only; the store is not consulted.
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<ValidateResponseData>, Rejection> {
    let token = gatekeeper::extract_bearer(&headers)?;
    let claims = gatekeeper::check_token(state.identity_service.as_ref(), token)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ValidateResponseData {
            valid: true,
            subject: claims.sub,
            expires_at: claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateResponseData {
    pub valid: bool,
    pub subject: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
