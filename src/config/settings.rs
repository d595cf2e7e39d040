//! Application configuration loading from config.toml
//!
//! The file holds server and business settings plus the users, outlets and
//! rooms that are seeded into an empty database on startup. Every section is
//! optional; missing values fall back to the defaults below.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Business rules shared by every outlet
    #[serde(default)]
    pub business: BusinessConfig,
    /// Users to create if missing
    #[serde(default)]
    pub users: Vec<UserSeed>,
    /// Outlets to create if missing
    #[serde(default)]
    pub outlets: Vec<OutletSeed>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:8080"`
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Business rules
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessConfig {
    /// Currency code shown on receipts and summaries
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Products with fewer units than this are reported as low stock
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,
    /// Shortest room rental that is billed
    #[serde(default = "default_minimum_billable_minutes")]
    pub minimum_billable_minutes: i64,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            low_stock_threshold: default_low_stock_threshold(),
            minimum_billable_minutes: default_minimum_billable_minutes(),
        }
    }
}

/// A user to seed
#[derive(Debug, Deserialize, Clone)]
pub struct UserSeed {
    /// Login name
    pub username: String,
    /// Grants access to every outlet
    #[serde(default)]
    pub is_superuser: bool,
}

/// An outlet to seed
#[derive(Debug, Deserialize, Clone)]
pub struct OutletSeed {
    /// Store name
    pub name: String,
    /// Username of the owner; must appear in `users` or already exist
    pub owner: String,
    /// Address or description
    #[serde(default)]
    pub location: Option<String>,
    /// Rooms to create in this outlet
    #[serde(default)]
    pub rooms: Vec<RoomSeed>,
}

/// A room to seed
#[derive(Debug, Deserialize, Clone)]
pub struct RoomSeed {
    /// Display name
    pub name: String,
    /// Seats
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    /// Rate per hour
    pub price_per_hour: f64,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_currency() -> String {
    "MVR".to_string()
}

const fn default_low_stock_threshold() -> i32 {
    10
}

const fn default_minimum_billable_minutes() -> i64 {
    60
}

const fn default_capacity() -> i32 {
    4
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.as_ref().display()),
    })?;

    parse_config(&contents)
}

/// Loads configuration from `path`, or defaults when the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::warn!(
            path = %path.as_ref().display(),
            "Config file not found, using defaults"
        );
        Ok(AppConfig::default())
    }
}
