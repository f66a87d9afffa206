use std::sync::Arc;

use analytics_service::{config::Config, server, AppState};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_tracing(&config.log_level);

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   📊  DATA ANALYTICS MICROSERVICE                ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    tracing::info!(
        environment = %config.environment,
        version = %config.version,
        "application starting"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config));
    let app = server::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr} — is the port already in use? ({e})"));

    println!("Server listening on http://{addr}");
    println!("Health          → http://{addr}/health");
    println!("Metrics JSON    → http://{addr}/api/v1/metrics");
    println!("Metrics SSE     → http://{addr}/api/v1/metrics/stream");
    println!("Prometheus      → http://{addr}/metrics");
    println!();

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
