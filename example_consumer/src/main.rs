//! Example consumer: a separate Rust project that mounts tablerest next to its own routes.
//!
//! Run from repo root: `API_SECRET=dev cargo run -p example-consumer`

use axum::{routing::get, Router};
use tablerest::{connect, AppState, QueryBuf, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tablerest=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let db = connect(&settings).await?;

    // A throwaway schema so the REST routes have something to serve.
    db.execute(&QueryBuf::raw(
        "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, title TEXT NOT NULL, done BOOLEAN DEFAULT FALSE)",
        vec![],
    ))
    .await?;

    let state = AppState::new(db, &settings);
    let app = Router::new()
        .route("/", get(|| async { "example consumer; try GET /rest/notes" }))
        .merge(tablerest::app_router(state, &settings));

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
