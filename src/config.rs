//! Configuration types.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind: IpAddr,
    pub port: u16,
    /// Sessions idle longer than this are pruned.
    pub session_idle_timeout: Duration,
    /// How often the idle-session sweep runs.
    pub sweep_interval: Duration,
    /// Run the stdin/stdout REPL alongside the HTTP server.
    pub cli_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            sweep_interval: Duration::from_secs(60),
            cli_enabled: false,
        }
    }
}

impl AppConfig {
    /// Build configuration from `FEATURE_ASSIST_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = parse_or(&lookup, "FEATURE_ASSIST_BIND", defaults.bind)?;
        let port = parse_or(&lookup, "FEATURE_ASSIST_PORT", defaults.port)?;
        let idle_secs = parse_or(
            &lookup,
            "FEATURE_ASSIST_SESSION_IDLE_SECS",
            defaults.session_idle_timeout.as_secs(),
        )?;
        let sweep_secs = parse_or(
            &lookup,
            "FEATURE_ASSIST_SWEEP_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FEATURE_ASSIST_SWEEP_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let cli_enabled = lookup("FEATURE_ASSIST_CLI")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.cli_enabled);

        Ok(Self {
            bind,
            port,
            session_idle_timeout: Duration::from_secs(idle_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
            cli_enabled,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}
