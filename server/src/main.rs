//! Runs a netgo server configured from the environment.
//!
//! ```text
//! PORT=8080 DEV_MODE=true RUST_LOG=netgo=debug netgo-server
//! ```

use netgo::prelude::*;
use netgo::LogFormat;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    init_logging(&config);

    tracing::info!(
        addr = %config.bind_addr,
        dev_mode = config.dev_mode,
        long_poll_secs = config.long_poll_timeout.as_secs(),
        "starting netgo"
    );

    let server = NetgoServer::builder().config(config).build().await?;
    server.run().await?;
    Ok(())
}

fn init_logging(config: &ServerConfig) {
    let default = if config.dev_mode {
        "info,netgo=debug,netgo_game=debug,netgo_session=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match config.log_format {
        LogFormat::Json => fmt().json().with_env_filter(filter).with_target(true).init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).init(),
    }
}
