//! Boardhop server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use boardhop_api::{AppState, JwtVerifier, router as api_router};
use boardhop_common::{Config, StorageConfig, storage};
use boardhop_core::{MessageService, OrderService, PostService, TaxonomyService, UserService};
use boardhop_db::repositories::{
    MessageRepository, OrderRepository, PostRepository, TaxonomyRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Room for the JSON and id parts next to the files of one request.
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

/// Install the global subscriber. `BOARDHOP_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json = std::env::var("BOARDHOP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let (text_layer, json_layer) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boardhop=debug,tower_http=debug".into()),
        )
        .with(text_layer)
        .with(json_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting boardhop server...");

    let config = Config::load()?;

    let db = boardhop_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    boardhop_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = storage::connect(&config.storage).await?;
    info!("Blob storage ready");

    let db = Arc::new(db);
    let post_repo = PostRepository::new(Arc::clone(&db));
    let order_repo = OrderRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let taxonomy_repo = TaxonomyRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));

    let state = AppState {
        post_service: PostService::new(
            post_repo.clone(),
            taxonomy_repo.clone(),
            storage,
            config.listing,
            config.media,
        ),
        order_service: OrderService::new(
            order_repo.clone(),
            post_repo.clone(),
            message_repo.clone(),
            config.listing,
        ),
        message_service: MessageService::new(message_repo, post_repo, order_repo),
        taxonomy_service: TaxonomyService::new(taxonomy_repo),
        user_service: UserService::new(user_repo),
        token_verifier: Arc::new(JwtVerifier::new(&config.auth)),
    };

    let body_limit = config
        .media
        .max_files
        .saturating_mul(config.media.max_file_size)
        .saturating_add(FORM_OVERHEAD);

    let mut app = Router::new().nest("/api", api_router());

    // Local blobs are served by this process when their URLs are relative.
    if let StorageConfig::Local {
        base_path,
        base_url,
    } = &config.storage
        && base_url.starts_with('/')
    {
        info!(path = %base_path.display(), url = %base_url, "Serving local media");
        app = app.nest_service(base_url, ServeDir::new(base_path));
    }

    let app = app
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            boardhop_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
