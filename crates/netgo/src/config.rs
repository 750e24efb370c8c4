//! Server configuration.
//!
//! Every knob has a default, so `ServerConfig::default()` is a working
//! development setup. Deployments override it from the environment:
//!
//! | Variable                    | Default | Meaning                                  |
//! |-----------------------------|---------|------------------------------------------|
//! | `PORT`                      | `8080`  | TCP port, bound on all interfaces        |
//! | `DOMAIN`                    | unset   | `Domain` attribute of credential cookies |
//! | `DEV_MODE`                  | `false` | relaxed cookies, verbose default logging |
//! | `NETGO_LONG_POLL_SECS`      | `5`     | how long a long poll waits               |
//! | `NETGO_SHUTDOWN_GRACE_SECS` | `5`     | drain time after a shutdown signal       |
//! | `NETGO_LOG_FORMAT`          | `pretty`| `pretty` or `json`                       |

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use netgo_session::SessionConfig;
use serde::Deserialize;

use crate::NetgoError;

/// Default long-poll deadline.
pub const DEFAULT_LONG_POLL_SECS: u64 = 5;

/// Default drain period after a shutdown signal.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// How the binary renders log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    #[serde(alias = "text")]
    Pretty,
    Json,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Development mode: cookies are sent without `Secure` and the default
    /// log filter is more verbose.
    pub dev_mode: bool,

    /// Credential cookie settings.
    pub session: SessionConfig,

    /// How long a long poll waits for an update before answering 504.
    pub long_poll_timeout: Duration,

    /// After a shutdown signal, how long in-flight requests get to finish.
    pub shutdown_grace: Duration,

    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            dev_mode: false,
            session: SessionConfig::default(),
            long_poll_timeout: Duration::from_secs(DEFAULT_LONG_POLL_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            log_format: LogFormat::default(),
        }
    }
}

/// The environment variables, as `config` sees them: lowercased keys,
/// values parsed into numbers and booleans where they look like one.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    dev_mode: bool,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default = "default_long_poll_secs")]
    netgo_long_poll_secs: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    netgo_shutdown_grace_secs: u64,
    #[serde(default)]
    netgo_log_format: LogFormat,
}

fn default_port() -> u16 {
    8080
}

fn default_long_poll_secs() -> u64 {
    DEFAULT_LONG_POLL_SECS
}

fn default_shutdown_grace_secs() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_SECS
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, NetgoError> {
        let source = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .map_err(|e| NetgoError::Config(format!("failed to read environment: {e}")))?;
        Self::from_source(source)
    }

    /// Builds a config from an already-assembled `config` source, applying
    /// defaults for missing keys.
    ///
    /// # Errors
    /// [`NetgoError::Config`] when a present value does not deserialize.
    pub fn from_source(source: config::Config) -> Result<Self, NetgoError> {
        let env: EnvSettings = source
            .try_deserialize()
            .map_err(|e| NetgoError::Config(e.to_string()))?;

        let mut config = Self {
            dev_mode: env.dev_mode,
            long_poll_timeout: Duration::from_secs(env.netgo_long_poll_secs),
            shutdown_grace: Duration::from_secs(env.netgo_shutdown_grace_secs),
            log_format: env.netgo_log_format,
            ..Self::default()
        };
        config.bind_addr.set_port(env.port);
        config.session.cookie_domain = env.domain.filter(|d| !d.is_empty());
        config.session.secure_cookies = !env.dev_mode;

        Ok(config)
    }
}
