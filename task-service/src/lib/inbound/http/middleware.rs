use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::gatekeeper;
use super::gatekeeper::Verdict;
use crate::inbound::http::router::AppState;

/// Middleware that runs the gatekeeper and attaches the caller's identity to
/// request extensions.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let verdict = gatekeeper::evaluate(
        state.identity_service.as_ref(),
        req.uri().path(),
        req.headers(),
    )
    .await;

    match verdict {
        Verdict::Pass(Some(identity)) => {
            tracing::debug!(identity_id = %identity.id, "Request authenticated");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Verdict::Pass(None) => next.run(req).await,
        Verdict::Reject(rejection) => {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                reason = rejection.reason.as_str(),
                "Request rejected"
            );
            rejection.into_response()
        }
    }
}
