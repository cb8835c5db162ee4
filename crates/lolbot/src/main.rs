use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coordination::Account;
use lolbot::accounts::{AccountStore, JsonAccountStore};
use lolbot::config::{default_config_path, lobby_name, BotConfig};
use lolbot::Supervisor;
use tracing::info;

/// Unattended leveling bot for the game client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: per-user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Level accounts until none are left or errors pile up
    Run {
        /// Orchestrators to run side by side
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the account file
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective config
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AccountsAction {
    /// List stored accounts
    List,
    /// Add or update an account
    Add {
        username: String,
        password: String,
        #[arg(long, default_value_t = 0)]
        level: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let config_path = args.config.unwrap_or_else(default_config_path);

    match args.command.unwrap_or(Command::Run { workers: 1 }) {
        Command::Run { workers } => {
            let config = BotConfig::load(&config_path)?;
            let supervisor = Supervisor::from_config(workers, &config)?;
            info!(
                config = %config_path.display(),
                lobby = lobby_name(config.lobby).unwrap_or("custom"),
                workers = supervisor.workers(),
                "Starting"
            );
            let aggregate = supervisor.run().await?;
            info!(
                games = aggregate.games_completed,
                leveled = aggregate.leveled_accounts.len(),
                "Done"
            );
        }
        Command::Config { action: ConfigAction::Show } => {
            let config = BotConfig::load(&config_path)?;
            let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
            println!("# {}\n{rendered}", config_path.display());
        }
        Command::Config { action: ConfigAction::Init { force } } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            BotConfig::default().save(&config_path)?;
            println!("Wrote {}", config_path.display());
        }
        Command::Accounts { action } => {
            let config = BotConfig::load(&config_path)?;
            let store = JsonAccountStore::new(config.accounts_path());
            match action {
                AccountsAction::List => {
                    let accounts = store.load().await?;
                    println!("{} ({} accounts)", store.path().display(), accounts.len());
                    for account in accounts {
                        let status = if account.is_eligible(config.max_level) {
                            "leveling"
                        } else {
                            "done"
                        };
                        println!("  {:<24} level {:>3}  {status}", account.username, account.level);
                    }
                }
                AccountsAction::Add {
                    username,
                    password,
                    level,
                } => {
                    store
                        .save_or_update(&Account::new(username.clone(), password, level))
                        .await?;
                    println!("Saved {username}");
                }
            }
        }
    }

    Ok(())
}
