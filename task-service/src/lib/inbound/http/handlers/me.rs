use axum::http::StatusCode;

use super::register::IdentityData;
use super::ApiSuccess;
use crate::inbound::http::gatekeeper::AuthenticatedIdentity;

pub async fn me(identity: AuthenticatedIdentity) -> ApiSuccess<IdentityData> {
    ApiSuccess::new(StatusCode::OK, (&identity).into())
}
