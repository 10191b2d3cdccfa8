use anyhow::Result;
use clinicops_api_server::{build_router, config::Settings, database::DbPool, state::AppContext};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,clinicops_api_server=debug".to_string()),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting ClinicOps API Server...");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let db_pool = DbPool::new(&settings.database).await?;
    info!("Database connection established");

    sqlx::migrate!("./migrations")
        .run(db_pool.get_pool())
        .await?;
    info!("Migrations applied");

    let ctx = AppContext::new(&settings, db_pool);
    let app = build_router(&ctx);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
