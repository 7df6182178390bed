use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aula::{
    api,
    auth::AuthService,
    config::Settings,
    email,
    events::{AuditLogSubscriber, EventDispatcher},
    service::ServiceContext,
    uploads::LocalUploadStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aula=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Aula server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        settings.auth.session_duration_hours,
    ));

    let removed = auth_service.cleanup_expired_sessions().await?;
    if removed > 0 {
        tracing::info!("Removed {} expired sessions", removed);
    }

    // Workflow subscribers
    let events = Arc::new(EventDispatcher::new());
    events.subscribe(Arc::new(AuditLogSubscriber)).await;

    let upload_store = Arc::new(LocalUploadStore::new(
        settings.uploads.dir.clone(),
        settings.uploads.max_file_size_bytes,
    ));

    let mailer = email::from_config(&settings.email)?;

    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        auth_service,
        events,
        upload_store,
        mailer,
        chrono::Duration::minutes(settings.auth.reset_code_minutes),
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
