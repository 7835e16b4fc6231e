//! Process-wide settings, read once at startup and shared as `Arc<Settings>`.
//!
//! # Environment Variables
//!
//! - `NATALIS_SERVER_NAME`, `NATALIS_SERVER_VERSION`: reported in `serverInfo`
//! - `NATALIS_PROTOCOL_VERSION`: the one protocol version `initialize` accepts
//! - `NATALIS_DEFAULT_HOUSE_SYSTEM`: house system used when a request omits one
//! - `NATALIS_DEFAULT_OBJECTS`: comma separated bodies used when a request omits `objects`
//! - `NATALIS_ENABLE_ASTEROIDS`: allow chiron, ceres, pallas, juno and vesta
//! - `NATALIS_RATE_LIMIT_REQUESTS`, `NATALIS_RATE_LIMIT_WINDOW`: advertised limits
//! - `NATALIS_EPHEMERIS_PATH`: Swiss Ephemeris data directory
//! - `NATALIS_TRANSPORT`: `mcp` (default) or `jsonrpc`
//! - `NATALIS_LOG_FORMAT`: `text` (default) or `json`

use std::path::PathBuf;

use crate::error::{AstroError, Result};
use crate::models::{Body, HouseSystem};

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Accepts "json", "text" or "pretty"; anything else falls back to text.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// How the server talks to its client over stdio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// MCP session handled by rmcp
    #[default]
    Mcp,
    /// Newline-delimited JSON-RPC envelopes
    JsonRpc,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_name: String,
    pub server_version: String,
    pub protocol_version: String,
    pub default_house_system: HouseSystem,
    pub default_objects: Vec<Body>,
    pub enable_asteroids: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub ephemeris_path: Option<PathBuf>,
    pub transport: Transport,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            default_house_system: HouseSystem::Placidus,
            default_objects: Body::planets().to_vec(),
            enable_asteroids: false,
            rate_limit_requests: 100,
            rate_limit_window_secs: 60,
            ephemeris_path: None,
            transport: Transport::Mcp,
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get("NATALIS_SERVER_NAME") {
            settings.server_name = name;
        }
        if let Some(version) = get("NATALIS_SERVER_VERSION") {
            settings.server_version = version;
        }
        if let Some(version) = get("NATALIS_PROTOCOL_VERSION") {
            settings.protocol_version = version;
        }
        if let Some(system) = get("NATALIS_DEFAULT_HOUSE_SYSTEM") {
            settings.default_house_system =
                system.parse().map_err(AstroError::Configuration)?;
        }
        if let Some(objects) = get("NATALIS_DEFAULT_OBJECTS") {
            settings.default_objects = objects
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<Body>().map_err(AstroError::Configuration))
                .collect::<Result<Vec<_>>>()?;
            if settings.default_objects.is_empty() {
                return Err(AstroError::Configuration(
                    "NATALIS_DEFAULT_OBJECTS names no bodies".to_string(),
                ));
            }
        }
        if let Some(flag) = get("NATALIS_ENABLE_ASTEROIDS") {
            settings.enable_asteroids = parse_bool("NATALIS_ENABLE_ASTEROIDS", &flag)?;
        }
        if let Some(n) = get("NATALIS_RATE_LIMIT_REQUESTS") {
            settings.rate_limit_requests = parse_number("NATALIS_RATE_LIMIT_REQUESTS", &n)?;
        }
        if let Some(n) = get("NATALIS_RATE_LIMIT_WINDOW") {
            settings.rate_limit_window_secs = parse_number("NATALIS_RATE_LIMIT_WINDOW", &n)?;
        }
        settings.ephemeris_path = get("NATALIS_EPHEMERIS_PATH").map(PathBuf::from);
        if let Some(transport) = get("NATALIS_TRANSPORT") {
            settings.transport = match transport.trim().to_ascii_lowercase().as_str() {
                "mcp" | "stdio" => Transport::Mcp,
                "jsonrpc" | "json-rpc" => Transport::JsonRpc,
                other => {
                    return Err(AstroError::Configuration(format!(
                        "Unknown transport: {}",
                        other
                    )))
                }
            };
        }
        if let Some(format) = get("NATALIS_LOG_FORMAT") {
            settings.log_format = LogFormat::parse(&format);
        }

        if settings.default_objects.iter().any(|b| b.is_asteroid()) && !settings.enable_asteroids
        {
            return Err(AstroError::Configuration(
                "default objects include asteroids but NATALIS_ENABLE_ASTEROIDS is off"
                    .to_string(),
            ));
        }

        Ok(settings)
    }

    pub fn instructions(&self) -> String {
        format!(
            "{} - astrological chart calculations. Cast a chart with generate_natal_chart, then \
             pass the returned chart data to get_transits, generate_progressed_chart, \
             interpret_aspects or calculate_dignities. Relationship work uses \
             calculate_synastry and generate_composite_chart.",
            self.server_name
        )
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AstroError::Configuration(format!(
            "{} must be a boolean, got {}",
            key, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AstroError::Configuration(format!("{} must be a number, got {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.protocol_version, "2024-11-05");
        assert_eq!(settings.default_house_system, HouseSystem::Placidus);
        assert_eq!(settings.default_objects.len(), 10);
        assert!(!settings.enable_asteroids);
        assert_eq!(settings.rate_limit_requests, 100);
        assert_eq!(settings.transport, Transport::Mcp);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("NATALIS_DEFAULT_HOUSE_SYSTEM", "whole_sign"),
            ("NATALIS_DEFAULT_OBJECTS", "sun, moon, chiron"),
            ("NATALIS_ENABLE_ASTEROIDS", "true"),
            ("NATALIS_TRANSPORT", "jsonrpc"),
            ("NATALIS_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(settings.default_house_system, HouseSystem::WholeSign);
        assert_eq!(
            settings.default_objects,
            vec![Body::Sun, Body::Moon, Body::Chiron]
        );
        assert_eq!(settings.transport, Transport::JsonRpc);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(settings_from(&[("NATALIS_DEFAULT_HOUSE_SYSTEM", "topocentric")]).is_err());
        assert!(settings_from(&[("NATALIS_ENABLE_ASTEROIDS", "maybe")]).is_err());
        assert!(settings_from(&[("NATALIS_RATE_LIMIT_WINDOW", "-3")]).is_err());
        assert!(settings_from(&[("NATALIS_DEFAULT_OBJECTS", "sun,ceres")]).is_err());
    }
}
