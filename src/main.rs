use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use repo_qa::api;
use repo_qa::config::Config;
use repo_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let repo_dir = config.repo_dir();
    tracing::info!("Repository checkout: {}", repo_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    // Provision the checkout before accepting requests so no search can
    // overlap an update. Best-effort: if the checkout is already on
    // disk, a failed clone or pull is logged and we serve what's there.
    if let Err(e) = repo_qa::git::ensure_repo(&config.repo.url, &repo_dir) {
        if repo_dir.exists() {
            tracing::warn!("Could not provision repository ({e:#}), using existing checkout");
        } else {
            return Err(e);
        }
    }
    if config.repo.update_on_start {
        if let Err(e) = repo_qa::git::update_repo(&repo_dir) {
            tracing::warn!("Could not update repository: {e:#}");
        }
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/", get(serve_index))
        .route("/ask", post(api::ask::ask))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
