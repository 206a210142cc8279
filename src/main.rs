//! Custody CLI Application
//!
//! A command-line interface for operating a multi-signature wallet.

use clap::{Parser, Subcommand};
use multisig_custody::cli::{self, AppState};
use multisig_custody::multisig::MultisigConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "custody")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multi-signature custody wallet", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".custody_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new owner key
    Keygen,

    /// Initialize a new wallet
    Init {
        /// Comma-separated owner addresses
        #[arg(short, long, required_unless_present = "config")]
        owners: Option<String>,

        /// Confirmations required to execute
        #[arg(short, long, required_unless_present = "config")]
        threshold: Option<usize>,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,

        /// JSON wallet configuration file
        #[arg(short, long, conflicts_with_all = ["owners", "threshold"])]
        config: Option<PathBuf>,

        /// Overwrite an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Deposit funds into the treasury
    Deposit {
        /// Sender address
        #[arg(short, long)]
        from: String,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u64,
    },

    /// Propose a transaction
    Submit {
        /// Owner private key (hex)
        #[arg(short, long)]
        key: String,

        /// Target address
        #[arg(short, long)]
        to: String,

        /// Value to send
        #[arg(short, long, default_value = "0")]
        value: u64,

        /// Call data (hex)
        #[arg(long)]
        data: Option<String>,
    },

    /// Confirm a transaction
    Confirm {
        /// Owner private key (hex)
        #[arg(short, long)]
        key: String,

        /// Transaction id
        #[arg(long)]
        tx: u64,
    },

    /// Revoke a confirmation
    Revoke {
        /// Owner private key (hex)
        #[arg(short, long)]
        key: String,

        /// Transaction id
        #[arg(long)]
        tx: u64,
    },

    /// Execute a confirmed transaction
    Execute {
        /// Owner private key (hex)
        #[arg(short, long)]
        key: String,

        /// Transaction id
        #[arg(long)]
        tx: u64,
    },

    /// Display wallet information
    Info,

    /// List wallet owners
    Owners,

    /// Transaction queries
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },

    /// Show recent events
    Events {
        /// Number of events to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },

    /// Export wallet to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import wallet from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Show a transaction
    Show {
        /// Transaction id
        #[arg(long)]
        id: u64,
    },

    /// List transactions
    List {
        /// Only show transactions not yet executed
        #[arg(long)]
        pending: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that do not need a loaded wallet
    match cli.command {
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Init {
            owners,
            threshold,
            label,
            config,
            force,
        } => {
            let config = match config {
                Some(path) => cli::load_config(&path)?,
                None => MultisigConfig::new(
                    cli::parse_owners(owners.as_deref().unwrap_or_default())?,
                    threshold.unwrap_or_default(),
                    label,
                ),
            };
            return cli::cmd_init(&cli.data_dir, config, force);
        }
        Commands::Import { input } => return cli::cmd_import(&cli.data_dir, &input),
        _ => {}
    }

    let mut state = AppState::load(cli.data_dir.clone())?;

    match cli.command {
        Commands::Keygen | Commands::Init { .. } | Commands::Import { .. } => unreachable!(),

        Commands::Deposit { from, amount } => {
            cli::cmd_deposit(&mut state, &from, amount)?;
        }

        Commands::Submit {
            key,
            to,
            value,
            data,
        } => {
            cli::cmd_submit(&mut state, &key, &to, value, data.as_deref())?;
        }

        Commands::Confirm { key, tx } => {
            cli::cmd_confirm(&mut state, &key, tx)?;
        }

        Commands::Revoke { key, tx } => {
            cli::cmd_revoke(&mut state, &key, tx)?;
        }

        Commands::Execute { key, tx } => {
            cli::cmd_execute(&mut state, &key, tx)?;
        }

        Commands::Info => {
            cli::cmd_info(&state)?;
        }

        Commands::Owners => {
            cli::cmd_owners(&state)?;
        }

        Commands::Tx { action } => match action {
            TxCommands::Show { id } => {
                cli::cmd_tx_show(&state, id)?;
            }
            TxCommands::List { pending } => {
                cli::cmd_tx_list(&state, pending)?;
            }
        },

        Commands::Events { count } => {
            cli::cmd_events(&state, count)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }
    }

    Ok(())
}
