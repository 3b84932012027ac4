use sitepress::config::SiteConfig;
use sitepress::{build_app, build_state};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // determine environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sitepress=info".parse()?))
        .init();

    // load centralized config
    let config = SiteConfig::from_env();
    let address = format!("{}:{}", config.bind_addr, config.port);

    let state = build_state(config).await?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Admin server running on http://{}/admin", address);

    axum::serve(listener, app).await?;

    Ok(())
}
