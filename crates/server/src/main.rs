//! Humap server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use humap_api::{AppState, StreamingState};
use humap_common::Config;
use humap_core::{
    ActivityService, EventPublisherService, LikeService, ListEntryService, ReviewService,
    UserService,
};
use humap_db::repositories::{
    ActivityRepository, ListEntryRepository, ReviewRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on handling one HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// CORS for the public URL plus any configured extra origins.
///
/// An unparsable origin list falls back to allowing any origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Result<Vec<HeaderValue>, _> = std::iter::once(&config.server.url)
        .chain(&config.server.allowed_origins)
        .map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')))
        .collect();

    let allow_origin = match origins {
        Ok(origins) => AllowOrigin::list(origins),
        Err(e) => {
            warn!(error = %e, "Invalid CORS origin, allowing any origin");
            AllowOrigin::from(Any)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "humap=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting humap server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = humap_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    humap_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let list_entry_repo = ListEntryRepository::new(Arc::clone(&db));

    // Real-time events go out through the streaming hub
    let streaming = StreamingState::new(&config.streaming);
    let event_publisher: EventPublisherService = Arc::new(streaming.clone());

    // Initialize services
    let user_service = UserService::new(user_repo.clone());

    let mut activity_service = ActivityService::new(activity_repo.clone());
    activity_service.set_event_publisher(event_publisher.clone());

    let mut review_service =
        ReviewService::new(review_repo, activity_repo.clone(), user_repo.clone());
    review_service.set_event_publisher(event_publisher.clone());

    let mut like_service =
        LikeService::new(list_entry_repo.clone(), activity_repo.clone(), user_repo);
    like_service.set_event_publisher(event_publisher);

    let list_entry_service = ListEntryService::new(list_entry_repo, activity_repo);

    let state = AppState {
        user_service,
        activity_service,
        review_service,
        list_entry_service,
        like_service,
        streaming,
    };

    let app = humap_api::app(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
