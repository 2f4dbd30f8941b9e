use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

const HOST_VAR: &str = "HIGHERLOWER_HOST";
const PORT_VAR: &str = "HIGHERLOWER_PORT";
const DIAGNOSTICS_VAR: &str = "HIGHERLOWER_DIAGNOSTICS";
const SEED_GAMES_VAR: &str = "HIGHERLOWER_SEED_GAMES";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Serves `GET /admin/games`, which exposes every game's answer.
    pub diagnostics_enabled: bool,
    /// Games created with the seed range before the server starts listening.
    pub seed_games: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            diagnostics_enabled: false,
            seed_games: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            host: parse_var(&lookup, HOST_VAR)?.unwrap_or(defaults.host),
            port: parse_var(&lookup, PORT_VAR)?.unwrap_or(defaults.port),
            diagnostics_enabled: match lookup(DIAGNOSTICS_VAR) {
                Some(value) => parse_flag(DIAGNOSTICS_VAR, &value)?,
                None => defaults.diagnostics_enabled,
            },
            seed_games: parse_var(&lookup, SEED_GAMES_VAR)?.unwrap_or(defaults.seed_games),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(None),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
