//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the id the middleware attached to this request
//! - [`AuthenticatedOrganizer`]: the organizer behind the bearer token
//!
//! ```ignore
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, organizer = %organizer.name, "Scan");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::{authenticate, CORRELATION_ID_HEADER};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use eventdesk_auth::{Organizer, OrganizerDirectory};
use std::sync::Arc;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the id stored by
/// [`correlation_id_layer`](crate::middleware::correlation_id_layer) so the
/// handler, the store actions and the response header agree. Without the
/// layer it falls back to the `X-Correlation-ID` header, then a fresh UUID.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// The organizer making this request.
///
/// Taken from the request extensions when
/// [`require_organizer`](crate::middleware::require_organizer) already ran,
/// otherwise resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedOrganizer(pub Organizer);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedOrganizer
where
    S: Send + Sync,
    Arc<OrganizerDirectory>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(organizer) = parts.extensions.get::<Organizer>() {
            return Ok(Self(organizer.clone()));
        }

        let directory = Arc::<OrganizerDirectory>::from_ref(state);
        let organizer = authenticate(&directory, bearer_token(&parts.headers))?;
        parts.extensions.insert(organizer.clone());

        Ok(Self(organizer))
    }
}

/// The token of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}
