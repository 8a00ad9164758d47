use clap::{Args, Parser, Subcommand};
use protego::Platform;
use rust_decimal::Decimal;

/// protego: wallet session and threat-feed CLI for the Protego yield vault.
#[derive(Parser, Debug)]
#[command(name = "protego", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect the wallet and print the session
    Status(JsonArgs),

    /// Approve the vault to spend tokens
    Approve(AmountArgs),

    /// Deposit tokens into the vault (approve first)
    Deposit(AmountArgs),

    /// Withdraw every vault share
    EmergencyWithdraw,

    /// Connect, then follow wallet account and chain changes until interrupted
    Watch,

    /// List current threats from the analysis server
    Threats(JsonArgs),

    /// List social channel alerts from the analysis server
    SocialAlerts(JsonArgs),

    /// Request a security analysis of a contract
    AnalyzeContract {
        /// Contract address (0x...)
        address: String,
    },

    /// Start monitoring social platforms for keywords
    SocialMonitor(SocialMonitorArgs),

    /// List previous chat sessions of a user
    Sessions {
        user_id: String,
    },

    /// Open a chat session with a first message
    NewSession {
        user_id: String,
        message: String,
    },
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AmountArgs {
    /// Amount in token units (e.g. 12.5)
    pub amount: Decimal,
}

#[derive(Args, Debug)]
pub struct SocialMonitorArgs {
    /// Platform to monitor (telegram, discord, twitter); repeatable
    #[arg(long = "platform", required = true)]
    pub platforms: Vec<Platform>,

    /// Keyword to watch for; repeatable
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Group or channel id; repeatable
    #[arg(long = "group-id")]
    pub group_ids: Vec<String>,
}
