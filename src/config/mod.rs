/// Database configuration and connection management
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;

/// Seeding of users, outlets and rooms declared in config.toml
pub mod seed;

pub use settings::{AppConfig, BusinessConfig, OutletSeed, RoomSeed, ServerConfig, UserSeed};
