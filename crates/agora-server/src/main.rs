use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_api::auth::{self, AppState, AppStateInner};
use agora_api::middleware::require_auth;
use agora_api::{conversations, investors, jobs, listings, notifications, streams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("AGORA_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("AGORA_DB_PATH").unwrap_or_else(|_| "agora.db".into());
    let host = std::env::var("AGORA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AGORA_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = agora_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/listings", post(listings::create_listing))
        .route("/listings/{listing_id}/contact", post(conversations::contact_listing))
        .route("/listings/{listing_id}/favorite", post(listings::toggle_favorite))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/{job_id}/contact", post(conversations::contact_job))
        .route("/jobs/{job_id}/apply", post(jobs::apply_to_job))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/{conversation_id}/messages", get(conversations::get_messages))
        .route("/conversations/{conversation_id}/messages", post(conversations::send_message))
        .route("/conversations/{conversation_id}/read", post(conversations::mark_read))
        .route("/conversations/{conversation_id}/stream", get(streams::conversation_stream))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/{notification_id}/read", post(notifications::mark_one_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/stream", get(streams::notification_stream))
        .route("/investors/profile", put(investors::upsert_profile))
        .route("/investors/matches", get(investors::listing_matches))
        .route("/investors/job-matches", get(investors::job_matches))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Agora server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
