//! Per-request authentication gate.
//!
//! Every request runs through the same ordered steps: public-path check,
//! bearer extraction, token validation, identity resolution. Each step either
//! hands its output to the next or stops the chain with a [`Rejection`].
//! [`evaluate`] folds the chain into a [`Verdict`].

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use auth::Claims;
use auth::TokenValidation;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::handlers::ApiResponseBody;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::IdentityServicePort;
use crate::identity::errors::IdentityError;

/// Paths served without a token.
pub const PUBLIC_PATHS: &[&str] = &["/auth/register", "/auth/login", "/auth/validate", "/health"];

/// Identity attached to a request that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: IdentityId,
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for AuthenticatedIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            created_at: identity.created_at,
        }
    }
}

/// Outcome of the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the request through, with the caller's identity unless the path is public.
    Pass(Option<AuthenticatedIdentity>),
    Reject(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingOrMalformedHeader,
    InvalidOrExpiredToken,
    UnknownSubject,
    StoreUnavailable,
}

impl RejectReason {
    /// Machine-readable code sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingOrMalformedHeader => "missing_or_malformed_header",
            RejectReason::InvalidOrExpiredToken => "invalid_or_expired_token",
            RejectReason::UnknownSubject => "unknown_subject",
            RejectReason::StoreUnavailable => "store_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RejectReason::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            RejectReason::MissingOrMalformedHeader => "Missing or malformed Authorization header",
            RejectReason::InvalidOrExpiredToken => "Invalid or expired token",
            RejectReason::UnknownSubject => "Token subject is not a known identity",
            RejectReason::StoreUnavailable => "Internal server error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(reason: RejectReason) -> Self {
        Self { reason }
    }

    pub fn status(&self) -> StatusCode {
        self.reason.status()
    }
}

impl From<RejectReason> for Rejection {
    fn from(reason: RejectReason) -> Self {
        Self::new(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionData {
    pub message: &'static str,
    pub reason: &'static str,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponseBody::new(
            status,
            RejectionData {
                message: self.reason.message(),
                reason: self.reason.as_str(),
            },
        );

        (status, Json(body)).into_response()
    }
}

/// Run the full chain for one request.
pub async fn evaluate(
    identity_service: &dyn IdentityServicePort,
    path: &str,
    headers: &HeaderMap,
) -> Verdict {
    if is_public(path) {
        return Verdict::Pass(None);
    }

    match authenticate(identity_service, headers).await {
        Ok(identity) => Verdict::Pass(Some(identity)),
        Err(rejection) => Verdict::Reject(rejection),
    }
}

async fn authenticate(
    identity_service: &dyn IdentityServicePort,
    headers: &HeaderMap,
) -> Result<AuthenticatedIdentity, Rejection> {
    let token = extract_bearer(headers)?;
    let claims = check_token(identity_service, token)?;
    resolve(identity_service, &claims).await
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, Rejection> {
    let malformed = || Rejection::new(RejectReason::MissingOrMalformedHeader);

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(malformed)?
        .to_str()
        .map_err(|_| malformed())?;

    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }

    Ok(token)
}

pub fn check_token(
    identity_service: &dyn IdentityServicePort,
    token: &str,
) -> Result<Claims, Rejection> {
    match identity_service.validate_token(token) {
        TokenValidation::Valid(claims) => Ok(claims),
        TokenValidation::Invalid => Err(Rejection::new(RejectReason::InvalidOrExpiredToken)),
    }
}

pub async fn resolve(
    identity_service: &dyn IdentityServicePort,
    claims: &Claims,
) -> Result<AuthenticatedIdentity, Rejection> {
    let subject = claims
        .sub
        .as_deref()
        .ok_or(Rejection::new(RejectReason::InvalidOrExpiredToken))?;

    match identity_service.resolve(subject).await {
        Ok(identity) => Ok(identity.into()),
        Err(IdentityError::NotFound(_)) => Err(Rejection::new(RejectReason::UnknownSubject)),
        Err(e) => {
            tracing::error!(error = %e, subject = %subject, "Identity resolution failed");
            Err(Rejection::new(RejectReason::StoreUnavailable))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(Rejection::new(RejectReason::MissingOrMalformedHeader))
    }
}
