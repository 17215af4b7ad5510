//! Command line and environment configuration.

use crate::error::RouterError;
use crate::placement::types::HotRatio;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "directory-router.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Directory-based product router over hot and cold bucket tables
#[derive(Parser, Debug)]
#[command(name = "directory-router")]
#[command(version)]
#[command(about = "Routes products to hot/cold tables through a persistent directory", long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long = "database", env = "ROUTER_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Keep all tables in memory instead of SQLite
    #[arg(long = "in-memory", conflicts_with = "database", global = true)]
    pub in_memory: bool,

    /// Fraction of unseen keys the default policy places in `hot`
    #[arg(
        long = "hot-ratio",
        env = "ROUTER_HOT_RATIO",
        default_value_t = 0.2,
        global = true
    )]
    pub hot_ratio: f64,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        /// Listen address
        #[arg(long = "bind", env = "ROUTER_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Generate sample products and print the resulting placement
    Demo {
        /// Number of products to generate
        #[arg(long = "products", default_value_t = 50)]
        products: u32,

        /// Empty the directory and bucket tables first
        #[arg(long = "truncate")]
        truncate: bool,
    },
}

/// Where the tables live.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageTarget {
    Sqlite(PathBuf),
    Memory,
}

/// Validated process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageTarget,
    pub hot_ratio: HotRatio,
    pub verbose: bool,
    pub command: Command,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self, RouterError> {
        let hot_ratio = HotRatio::new(cli.hot_ratio)?;

        if let Command::Demo { products, .. } = cli.command
            && products == 0
        {
            return Err(RouterError::InvalidParameter(
                "--products must be greater than 0".to_string(),
            ));
        }

        let storage = if cli.in_memory {
            StorageTarget::Memory
        } else {
            StorageTarget::Sqlite(
                cli.database
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            )
        };

        Ok(Self {
            storage,
            hot_ratio,
            verbose: cli.verbose,
            command: cli.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, RouterError> {
        let cli = Cli::try_parse_from(args).unwrap();
        Settings::from_cli(cli)
    }

    #[test]
    fn test_demo_defaults() {
        let settings = parse(&["directory-router", "--in-memory", "demo"]).unwrap();

        assert_eq!(settings.storage, StorageTarget::Memory);
        assert_eq!(settings.hot_ratio, HotRatio::default());
        assert_eq!(
            settings.command,
            Command::Demo {
                products: 50,
                truncate: false
            }
        );
    }

    #[test]
    fn test_serve_with_database() {
        let settings = parse(&[
            "directory-router",
            "--database",
            "/tmp/router.db",
            "serve",
            "--bind",
            "0.0.0.0:9000",
        ])
        .unwrap();

        assert_eq!(
            settings.storage,
            StorageTarget::Sqlite(PathBuf::from("/tmp/router.db"))
        );
        assert_eq!(
            settings.command,
            Command::Serve {
                bind: "0.0.0.0:9000".parse().unwrap()
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let settings = parse(&[
            "directory-router",
            "demo",
            "--products",
            "15",
            "--truncate",
            "--hot-ratio",
            "0.5",
            "--in-memory",
        ])
        .unwrap();

        assert_eq!(settings.hot_ratio.value(), 0.5);
        assert_eq!(settings.storage, StorageTarget::Memory);
        assert_eq!(
            settings.command,
            Command::Demo {
                products: 15,
                truncate: true
            }
        );
    }

    #[test]
    fn test_rejects_ratio_out_of_range() {
        let result = parse(&["directory-router", "--hot-ratio", "1.5", "demo"]);
        assert!(matches!(result, Err(RouterError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_zero_products() {
        let result = parse(&["directory-router", "demo", "--products", "0"]);
        assert!(matches!(result, Err(RouterError::InvalidParameter(_))));
    }

    #[test]
    fn test_database_conflicts_with_in_memory() {
        let result = Cli::try_parse_from([
            "directory-router",
            "--database",
            "x.db",
            "--in-memory",
            "demo",
        ]);
        assert!(result.is_err());
    }
}
