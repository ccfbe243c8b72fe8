//! API router.
//!
//! Everything under `/api` except health and the auth endpoints sits
//! behind bearer-token authentication. Stored photo files are served
//! statically under `/uploads`.
//!
//! Middleware uses `Extension<ApiContext>` (outermost layer); endpoint
//! handlers use `State<ApiContext>`.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the application router.
pub fn app_router(ctx: ApiContext, frontend_origin: &str) -> Router {
    let protected = Router::new()
        .route(
            "/consultations",
            post(endpoints::consultations::create).get(endpoints::consultations::list),
        )
        .route(
            "/consultations/:id",
            get(endpoints::consultations::detail).put(endpoints::consultations::update),
        )
        .route(
            "/consultations/:id/assign/:doctor_id",
            put(endpoints::consultations::assign),
        )
        .route(
            "/consultations/:id/follow-up",
            post(endpoints::consultations::follow_up),
        )
        .route("/messages", post(endpoints::messages::create))
        .route(
            "/messages/consultation/:consultation_id",
            get(endpoints::messages::by_consultation),
        )
        .route("/messages/:id/read", put(endpoints::messages::mark_read))
        .route("/messages/unread/count", get(endpoints::messages::unread_count))
        .route("/photos/upload", post(endpoints::photos::upload))
        .route("/photos", get(endpoints::photos::mine))
        .route(
            "/photos/consultation/:consultation_id",
            get(endpoints::photos::by_consultation),
        )
        .route("/photos/comparison", get(endpoints::photos::comparison))
        .route(
            "/photos/comparison/pairs",
            get(endpoints::photos::comparison_pairs),
        )
        .route("/photos/stats", get(endpoints::photos::stats))
        .route("/photos/:id", delete(endpoints::photos::remove))
        .route(
            "/notifications/history",
            get(endpoints::notifications::history),
        )
        .with_state(ctx.clone())
        // Photo uploads go past axum's 2 MB default.
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the middleware can extract ApiContext.
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone());

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    if let Ok(origin) = frontend_origin.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .nest_service("/uploads", ServeDir::new(ctx.uploads_dir.as_ref().clone()))
        .layer(cors)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
