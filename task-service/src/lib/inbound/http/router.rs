use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::fallback;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::register::register;
use super::handlers::validate::validate;
use super::middleware::authenticate;
use crate::domain::identity::ports::IdentityServicePort;

#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityServicePort>,
}

/// Build the HTTP application.
///
/// The gatekeeper wraps the whole router, fallback included, so every request
/// is checked exactly once before routing.
///
/// # Arguments
/// * `identity_service` - Registration, login and token resolution
/// * `cors_origin` - Single allowed browser origin; any origin when `None`
pub fn create_router(
    identity_service: Arc<dyn IdentityServicePort>,
    cors_origin: Option<HeaderValue>,
) -> Router {
    let state = AppState { identity_service };

    let auth_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate));

    let api_routes = Router::new().route("/api/me", get(me));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                headers = ?redacted_headers(request.headers()),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(trace_layer)
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        None => CorsLayer::permissive(),
    }
}

/// Copy of `headers` safe to log: credentials are replaced with `****`.
pub fn redacted_headers(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();
    for name in [header::AUTHORIZATION, header::PROXY_AUTHORIZATION] {
        if redacted.contains_key(&name) {
            redacted.insert(name, HeaderValue::from_static("****"));
        }
    }
    redacted
}

#[cfg(test)]
mod tests {
    use auth::Authenticator;
    use auth::PasswordHasher;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::identity::service::IdentityService;
    use crate::outbound::repositories::InMemoryIdentityRepository;

    fn app() -> Router {
        let authenticator = Authenticator::new(
            b"test-secret-key-for-jwt-signing-at-least-32-bytes",
            chrono::Duration::hours(1),
        )
        .with_password_hasher(PasswordHasher::with_cost(1).unwrap());

        let identity_service = IdentityService::new(
            Arc::new(InMemoryIdentityRepository::new()),
            Arc::new(authenticator),
        );

        create_router(Arc::new(identity_service), None)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_public_routes_skip_gate() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);

        let request = Request::get("/auth/validate").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_gated() {
        let request = Request::get("/does/not/exist").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);

        let request = Request::post("/api/me")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_authorization_is_masked() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer eyJhbGciOiJIUzI1NiJ9.secret.sig"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let redacted = redacted_headers(&headers);

        assert_eq!(redacted.get(header::AUTHORIZATION).unwrap(), "****");
        assert_eq!(redacted.get(header::ACCEPT).unwrap(), "application/json");
        assert!(!format!("{:?}", redacted).contains("secret"));
    }

    #[test]
    fn test_headers_without_credentials_untouched() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let redacted = redacted_headers(&headers);

        assert_eq!(redacted, headers);
        assert!(!redacted.contains_key(header::AUTHORIZATION));
    }
}
