//! # Recipe Catalog CLI (`recipes`)
//!
//! ## Usage
//!
//! ```bash
//! recipes --config ./config/recipes.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recipes init` | Create the SQLite database and schema |
//! | `recipes serve` | Start the HTTP API server |
//! | `recipes search "<query>"` | Combined local + TheMealDB search |
//! | `recipes get <id>` | Show one recipe (`ext_` ids come from TheMealDB) |
//! | `recipes random` | Show random TheMealDB recipes |
//! | `recipes validate` | Schema-check every stored recipe |

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use recipe_catalog::config::{self, Config};
use recipe_catalog::{get, migrate, search, server, telemetry, validate};

/// Recipe catalog: a local recipe store merged with TheMealDB.
#[derive(Parser)]
#[command(name = "recipes", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the default file does not exist, an in-memory catalog with
    /// default settings is used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

const DEFAULT_CONFIG_PATH: &str = "./config/recipes.toml";

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Start the HTTP server. Stops on Ctrl+C or SIGTERM.
    Serve,

    /// Search the local catalog and TheMealDB together.
    Search {
        query: String,

        /// Maximum number of merged results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a recipe by id.
    Get { id: String },

    /// Fetch random recipes from TheMealDB.
    Random {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Validate every stored recipe against the schema limits.
    Validate,
}

fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() && path.as_os_str() == DEFAULT_CONFIG_PATH {
        return Ok(Config::minimal());
    }
    config::load_config(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load(&cli.config)?;
    telemetry::init(&cfg.logging);

    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "config file not found, using in-memory defaults");
    }

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Random { count } => {
            get::run_random(&cfg, count).await?;
        }
        Commands::Validate => {
            validate::run_validate(&cfg).await?;
        }
    }

    Ok(())
}
