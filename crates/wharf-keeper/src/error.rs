//! Error types for the keeper service

use thiserror::Error;
use wharf_core::LedgerError;
use wharf_pricing::PricingError;

pub type KeeperResult<T> = std::result::Result<T, KeeperError>;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Snapshot is missing pool '{name}'")]
    MissingPool { name: String },

    #[error("Snapshot is missing feed '{name}'")]
    MissingFeed { name: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl KeeperError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        KeeperError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
