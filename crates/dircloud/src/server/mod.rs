//! HTTP front end
//!
//! Every handler runs its tree, disk and search work on the blocking pool
//! and renders the result through [`crate::cloud::Renderer`].

mod api;
mod error;
mod pages;
mod state;

pub use error::AppError;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::root))
        .route("/search", get(pages::search))
        .route("/switch_file", get(pages::switch_file))
        .route("/robots.txt", get(pages::robots))
        .route("/favicon.ico", get(pages::favicon))
        .route("/api/children", get(api::children))
        .route("/{*path}", get(pages::branch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("dircloud listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
