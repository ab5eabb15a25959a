//! Request middleware.
//!
//! - [`correlation_id_layer`]: every request runs in an `http_request` span
//!   carrying its `X-Correlation-ID` (taken from the client or generated),
//!   and the id is echoed on the response.
//! - [`require_organizer`]: resolves the bearer token to an [`Organizer`]
//!   before any `/api` handler runs.
//!
//! ```ignore
//! let api = Router::new()
//!     .route("/participants", get(list))
//!     .route_layer(from_fn_with_state(directory, require_organizer));
//!
//! let app = Router::new().nest("/api", api).layer(correlation_id_layer());
//! ```

use crate::error::AppError;
use crate::extractors::bearer_token;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use eventdesk_auth::{Organizer, OrganizerDirectory};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation ID tracking to all requests.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;

                tracing::debug!(
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Request completed"
                );

                if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Reject requests without a valid organizer token.
///
/// On success the resolved [`Organizer`] is stored in the request
/// extensions, where [`AuthenticatedOrganizer`](crate::extractors::AuthenticatedOrganizer)
/// picks it up.
///
/// # Errors
///
/// Returns 401 when the `Authorization` header is missing, is not a
/// bearer token, or matches no configured organizer.
pub async fn require_organizer(
    State(directory): State<Arc<OrganizerDirectory>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let organizer = authenticate(&directory, bearer_token(req.headers()))?;
    tracing::debug!(organizer = %organizer.name, "Organizer authenticated");

    req.extensions_mut().insert(organizer);
    Ok(next.run(req).await)
}

/// Resolve an optional token against the directory.
pub(crate) fn authenticate(
    directory: &OrganizerDirectory,
    token: Option<&str>,
) -> Result<Organizer, AppError> {
    Ok(directory.authenticate(token.unwrap_or_default())?)
}

/// Extension trait for reading the correlation ID from request extensions.
pub trait CorrelationIdExt {
    /// The correlation ID inserted by [`correlation_id_layer`], if any.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl CorrelationIdExt for Request {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{body::Body, http, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_id(req: Request) -> String {
        req.correlation_id().map(|id| id.to_string()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_correlation_id_is_generated_and_echoed() {
        let app = Router::new()
            .route("/", get(echo_id))
            .layer(correlation_id_layer());

        let response = app
            .oneshot(http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers().get(CORRELATION_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_client_correlation_id_is_kept() {
        let id = Uuid::new_v4();
        let app = Router::new()
            .route("/", get(echo_id))
            .layer(correlation_id_layer());

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/")
                    .header(CORRELATION_ID_HEADER, id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(CORRELATION_ID_HEADER).unwrap(),
            id.to_string().as_str()
        );
    }

    #[test]
    fn test_authenticate_without_token_is_unauthorized() {
        let directory = OrganizerDirectory::default().with_token("alice", "s3cret");
        let err = authenticate(&directory, None).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let organizer = authenticate(&directory, Some("s3cret")).unwrap();
        assert_eq!(organizer.name, "alice");
    }
}
