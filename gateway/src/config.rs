//! Gateway configuration from environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PERIMETER_GATEWAY_PORT` / `PORT` | 18700 |
//! | `PERIMETER_STORE_PATH` | unset: in-memory store |
//! | `PERIMETER_ANALYSIS_URL` | unset: local evaluation and simulated POIs |
//! | `PERIMETER_REMOTE_TIMEOUT_SEC` | 10 |
//! | `PERIMETER_DISCOVERY_RADIUS_M` | 200 |

use perimeter_risk::DEFAULT_PERIMETER_RADIUS_M;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub store_path: Option<PathBuf>,
    pub analysis_url: Option<String>,
    pub remote_timeout_sec: u64,
    pub discovery_radius_m: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 18700,
            store_path: None,
            analysis_url: None,
            remote_timeout_sec: 10,
            discovery_radius_m: DEFAULT_PERIMETER_RADIUS_M,
        }
    }
}

/// Parse an optional variable, warning and keeping the default on bad input
fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {} value '{}': {}", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port_key = if std::env::var("PERIMETER_GATEWAY_PORT").is_ok() {
            "PERIMETER_GATEWAY_PORT"
        } else {
            "PORT"
        };

        let config = Self {
            port: parse_var(port_key, defaults.port),
            store_path: non_empty_var("PERIMETER_STORE_PATH").map(PathBuf::from),
            analysis_url: non_empty_var("PERIMETER_ANALYSIS_URL"),
            remote_timeout_sec: parse_var("PERIMETER_REMOTE_TIMEOUT_SEC", defaults.remote_timeout_sec),
            discovery_radius_m: parse_var("PERIMETER_DISCOVERY_RADIUS_M", defaults.discovery_radius_m),
        };

        tracing::info!(
            "Configuration loaded: port={} store={:?} analysis={:?}",
            config.port,
            config.store_path,
            config.analysis_url
        );

        config
    }
}
