//! `scanstage`: stage scanned serial numbers locally, then register them
//! with the inventory server in one duplicate-checked commit.

mod commands;
mod config;

use clap::{Parser, Subcommand};

/// Inbound scan staging client.
#[derive(Parser, Debug)]
#[command(name = "scanstage", about = "Inbound scan staging client")]
struct Cli {
    /// Path to client config file (default: ~/.scanstage/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set connection properties in the config file.
    Configure {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token: Option<String>,
        /// Staging database file.
        #[arg(long)]
        db: Option<String>,
    },

    /// Browse catalog items.
    Catalog {
        /// Filter on item id, SKU or name.
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Stage one scan.
    Add {
        /// Catalog item id.
        #[arg(long)]
        item: String,
        #[arg(long)]
        invoice: String,
        #[arg(long)]
        serial: String,
        /// Quantity (default 1).
        #[arg(long = "qty")]
        quantity: Option<u32>,
    },

    /// Stage serial numbers read from stdin, one per line.
    Scan {
        #[arg(long)]
        item: String,
        #[arg(long)]
        invoice: String,
        #[arg(long = "qty")]
        quantity: Option<u32>,
        /// Treat lines as successive readings of one input field and stage
        /// only values that settle.
        #[arg(long)]
        auto: bool,
    },

    /// Remove the most recently staged entry.
    Undo,

    /// Remove a staged entry by serial number.
    Delete { serial: String },

    /// Discard the whole batch.
    Clear {
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// List staged entries.
    List,

    /// Show quantities per invoice and item.
    Summary,

    /// Replace the batch with rows from a JSON file.
    Import {
        file: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Check the batch for duplicates and register it.
    Commit,

    /// Show version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `-o json` output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let json = cli.output == "json";

    if let Commands::Configure { server, token, db } = &cli.command {
        return commands::configure(
            &config_path,
            server.as_deref(),
            token.as_deref(),
            db.as_deref(),
        );
    }
    let config = config::ClientConfig::load(&config_path)?;

    match cli.command {
        Commands::Configure { .. } => {}

        Commands::Catalog { query, page } => {
            commands::catalog::list(&config, query.as_deref().unwrap_or(""), page, json).await?;
        }

        Commands::Add {
            item,
            invoice,
            serial,
            quantity,
        } => {
            commands::staging::add(&config, &item, &invoice, &serial, quantity, json).await?;
        }

        Commands::Scan {
            item,
            invoice,
            quantity,
            auto,
        } => {
            commands::scan::run(&config, &item, &invoice, quantity, auto, json).await?;
        }

        Commands::Undo => commands::staging::undo(&config)?,

        Commands::Delete { serial } => commands::staging::delete(&config, &serial)?,

        Commands::Clear { yes } => commands::staging::clear(&config, yes)?,

        Commands::List => commands::staging::list(&config, json)?,

        Commands::Summary => commands::staging::summary(&config, json)?,

        Commands::Import { file, yes } => commands::staging::import(&config, &file, yes)?,

        Commands::Commit => commands::commit::run(&config, json).await?,

        Commands::Version => {
            println!("scanstage v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
