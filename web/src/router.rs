//! Route table.

use crate::handlers::{attendance, certificates, health, live, mail, participants, selection};
use crate::middleware::{correlation_id_layer, require_organizer};
use crate::state::{AppState, Services};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the application router.
///
/// `/health` and `/ready` are open. Everything under `/api` requires an
/// organizer bearer token, except the live counter, which authenticates
/// itself so it can accept `?token=`.
pub fn router<D: Services>(state: AppState<D>) -> Router {
    let protected = Router::new()
        .route("/participants", get(participants::list::<D>))
        .route("/participants/:id", get(participants::get::<D>))
        .route(
            "/participants/:id/selection",
            put(selection::set_selection::<D>),
        )
        .route("/selection", get(selection::count::<D>))
        .route("/selection/recount", post(selection::recount::<D>))
        .route(
            "/attendance",
            get(attendance::lookup::<D>).post(attendance::mark::<D>),
        )
        .route("/attendance/recent", get(attendance::recent::<D>))
        .route("/mail/selected", post(mail::send_selected::<D>))
        .route("/mail/rejected", post(mail::send_rejected::<D>))
        .route(
            "/certificates/template",
            post(certificates::upload_template::<D>),
        )
        .route("/certificates/font", post(certificates::upload_font::<D>))
        .route(
            "/certificates/sample",
            get(certificates::download_sample::<D>).post(certificates::render_sample::<D>),
        )
        .route("/certificates/generate", post(certificates::generate::<D>))
        .layer(DefaultBodyLimit::max(certificates::MAX_UPLOAD_BYTES))
        .route_layer(from_fn_with_state(
            Arc::clone(&state.organizers),
            require_organizer,
        ));

    let api = protected.route("/selection/live", get(live::live::<D>));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness::<D>))
        .nest("/api", api)
        .layer(correlation_id_layer())
        .with_state(state)
}

/// CORS for the dashboard front-end.
///
/// An empty list disables cross-origin access entirely.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
