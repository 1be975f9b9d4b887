//! OrgChart HTTP server binary
//!
//! ```bash
//! RUST_LOG=debug ORGCHART_DB_PATH=/tmp/orgchart.db cargo run -p orgchart-server
//! ```

use orgchart_server::{start_server, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::debug!("Resolved configuration: {:?}", config);

    start_server(&config).await
}
