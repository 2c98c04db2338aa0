//! # Marvel Dashboard CLI (`mdash`)
//!
//! Fetches characters from the catalog API once, then prints the filtered
//! table and summary statistics.
//!
//! ## Usage
//!
//! ```bash
//! mdash --config ./config/mdash.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mdash init` | Write an example configuration file |
//! | `mdash list` | Fetch characters and print the dashboard |
//! | `mdash stats` | Fetch characters and print only the statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Characters whose name contains "spi" and who appear in comics
//! mdash list --query spi --mode has-comics
//!
//! # Machine-readable output
//! mdash list --json | jq '.stats'
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use marvel_dashboard::client::create_client;
use marvel_dashboard::config::{self, Config};
use marvel_dashboard::controller::{LoadController, LoadState};
use marvel_dashboard::dashboard::{build_output, render_stats, render_text};
use marvel_dashboard::logging;
use marvel_dashboard::view::{FilterMode, ViewFilter};

/// Marvel Dashboard CLI: fetch, filter and summarize Marvel characters.
#[derive(Parser)]
#[command(
    name = "mdash",
    about = "Marvel Dashboard: fetch, filter and summarize Marvel characters",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mdash.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a commented example configuration to `--config`.
    ///
    /// Refuses to overwrite an existing file.
    Init,

    /// Fetch characters and print the dashboard.
    ///
    /// The table shows at most `view.display_cap` rows; statistics always
    /// cover every fetched character.
    List {
        /// Case-insensitive name filter (surrounding whitespace ignored).
        #[arg(long, default_value = "")]
        query: String,

        /// Comic filter: `all`, `has-comics`, or `no-comics`.
        #[arg(long, value_enum, default_value = "all")]
        mode: FilterMode,

        /// Print the dashboard as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Fetch characters and print only the statistics.
    Stats {
        /// Print the statistics as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Commands::Init = cli.command {
        config::scaffold_config(&cli.config)?;
        println!("Wrote {}", cli.config.display());
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::List { query, mode, json } => {
            let state = load(&cfg).await;
            let output = build_output(&state, &ViewFilter::new(query, mode), &cfg.view);
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", render_text(&output));
            }
            Ok(exit_code(&state))
        }
        Commands::Stats { json } => {
            let state = load(&cfg).await;
            let output = build_output(&state, &ViewFilter::default(), &cfg.view);
            if json {
                println!("{}", serde_json::to_string_pretty(&output.stats)?);
            } else {
                if let Some(ref error) = output.error {
                    eprintln!("Error: {}", error);
                }
                print!("{}", render_stats(&output.stats));
            }
            Ok(exit_code(&state))
        }
    }
}

/// Run one load cycle. Ctrl-C tears the mount down and returns the state
/// as it was at that moment. A client that cannot be built counts as a
/// failed load so the dashboard still renders its error.
async fn load(cfg: &Config) -> LoadState {
    let client = match create_client(&cfg.catalog) {
        Ok(client) => client,
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, "failed to load characters");
            return LoadState::Failed(message);
        }
    };
    let controller = LoadController::new(client, cfg.catalog.limit);
    let mount = controller.activate();
    mount.settled_or(tokio::signal::ctrl_c()).await
}

fn exit_code(state: &LoadState) -> ExitCode {
    match state {
        LoadState::Loaded(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
