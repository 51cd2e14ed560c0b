//! Process configuration: command line flags with environment fallbacks.
//!
//! The HTTP address and port are left to Rocket's own configuration
//! (`Rocket.toml`, `ROCKET_PORT`, `ROCKET_ADDRESS`).

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Restaurant point-of-sale backend")]
pub struct Config {
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[arg(long, env = "DATABASE_NAME", default_value = "quanlynhahang")]
    pub database_name: String,

    #[arg(long = "storage", env = "STORAGE_BACKEND", value_enum, default_value = "mongo")]
    pub storage: StorageBackend,

    /// Give stock back when a line item is deleted.
    #[arg(long, env = "RESTORE_STOCK_ON_REMOVE", default_value_t = false)]
    pub restore_stock_on_remove: bool,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn stock_policy(&self) -> StockPolicy {
        StockPolicy {
            restore_stock_on_remove: self.restore_stock_on_remove,
        }
    }
}

/// Inventory switches consulted by the line-item operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockPolicy {
    /// Off by default: deleting a line item keeps the stock it consumed.
    pub restore_stock_on_remove: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "pos-backend",
            "--storage",
            "memory",
            "--restore-stock-on-remove",
            "--database-name",
            "pos_test",
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.database_name, "pos_test");
        assert!(config.stock_policy().restore_stock_on_remove);
    }

    #[test]
    fn stock_is_kept_on_remove_by_default() {
        assert!(!StockPolicy::default().restore_stock_on_remove);
    }
}
