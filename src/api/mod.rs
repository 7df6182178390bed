pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let uploads_dir = settings.uploads.dir.clone();
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        // Auth routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/password-reset/request", post(handlers::auth::request_password_reset))
        .route("/auth/password-reset/confirm", post(handlers::auth::confirm_password_reset))

        // API routes, all behind a session
        .nest("/api", api_routes(app_state.clone()))

        // Uploaded files
        .nest_service("/uploads", ServeDir::new(uploads_dir))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    // Leave headroom for multipart framing around the file itself
    let upload_limit = state.settings.uploads.max_file_size_bytes + 1024 * 1024;

    Router::new()
        .route("/profile", get(handlers::profile::get).put(handlers::profile::update))
        .nest("/courses", course_routes())
        .nest("/lessons", lesson_routes())
        .nest("/enrollments", enrollment_routes())
        .nest("/vouchers", voucher_routes())
        .route("/notifications", get(handlers::notifications::get))
        .route("/progress", get(handlers::progress::list))
        .nest("/users", user_routes())
        .route(
            "/upload",
            post(handlers::uploads::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::courses::list).post(handlers::courses::create))
        .route("/mine", get(handlers::courses::mine))
        .route(
            "/:id",
            get(handlers::courses::get)
                .put(handlers::courses::update)
                .delete(handlers::courses::delete),
        )
        .route("/:id/lessons", get(handlers::courses::lessons))
        .route("/:id/enroll", post(handlers::enrollments::enroll))
        .route("/:id/enrollment", get(handlers::enrollments::status))
}

fn lesson_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::lessons::create))
        .route(
            "/:id",
            get(handlers::lessons::get)
                .put(handlers::lessons::update)
                .delete(handlers::lessons::delete),
        )
        .route("/:id/progress", post(handlers::lessons::update_progress))
}

fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::enrollments::list))
        .route("/:id", axum::routing::delete(handlers::enrollments::unenroll))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::users::list))
        .route(
            "/:id",
            get(handlers::users::get)
                .put(handlers::users::update)
                .patch(handlers::users::update)
                .delete(handlers::users::delete),
        )
}

fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::vouchers::list).post(handlers::vouchers::submit))
        .route("/:id", get(handlers::vouchers::get))
        .route("/:id/approve", post(handlers::vouchers::approve))
        .route("/:id/reject", post(handlers::vouchers::reject))
        .route("/:id/mark_as_seen", post(handlers::vouchers::mark_as_seen))
}
