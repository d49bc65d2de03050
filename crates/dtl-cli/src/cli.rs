use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dtl",
    about = "Data token ledger: list, prove, sell and verify data titles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger state file, overriding the configured one
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Invoke a contract function by name
    Invoke(InvokeArgs),
    /// Create, show or freeze accounts
    Account(AccountArgs),
    /// Inspect committed ledger state
    State(StateArgs),
    /// List contract functions
    Functions,
}

#[derive(Args)]
pub struct InvokeArgs {
    pub function: String,
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub action: AccountAction,
}

#[derive(Subcommand)]
pub enum AccountAction {
    Create {
        name: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long, default_value = "0")]
        token: i64,
        #[arg(long, default_value = "")]
        org: String,
        #[arg(long = "type", default_value = "0")]
        account_type: i32,
        /// PEM or hex public key file
        #[arg(long)]
        public_key: Option<PathBuf>,
    },
    Show {
        name: String,
    },
    Freeze {
        name: String,
        /// Lift the freeze instead
        #[arg(long)]
        thaw: bool,
    },
}

#[derive(Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub action: StateAction,
}

#[derive(Subcommand)]
pub enum StateAction {
    /// Print every committed key
    Dump {
        /// Only keys under this index
        #[arg(long)]
        index: Option<String>,
    },
    /// Print ledger height and key count
    Info,
}
