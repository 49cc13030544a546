use whiteboard::config::WorkspaceConfig;
use whiteboard::{routes, state};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = WorkspaceConfig::from_env().expect("invalid configuration");
    let state = state::AppState::from_config(&config).expect("client init failed");
    tracing::info!(
        image_size = %config.image.size,
        dedupe = config.publish.dedupe,
        "workspace initialized"
    );

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "whiteboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
