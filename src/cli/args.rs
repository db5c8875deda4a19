use crate::logging::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Replay payment operations against an account table
#[derive(Parser, Debug)]
#[command(name = "payflow")]
#[command(about = "Replay payment operations against an account table", long_about = None)]
pub struct CliArgs {
    /// JSON-lines file of operations to apply, in order
    #[arg(value_name = "OPERATIONS", help = "Path to the JSON-lines operations file")]
    pub operations_file: PathBuf,

    /// Initial account table
    #[arg(
        long = "accounts",
        value_name = "ACCOUNTS",
        help = "Path to the accounts CSV (account_number,upi_id,card_id,balance)"
    )]
    pub accounts_file: PathBuf,

    /// Engine configuration file
    #[arg(
        long = "config",
        value_name = "FILE",
        env = "PAYFLOW_CONFIG",
        help = "Path to a JSON config file (default: config/$PAYFLOW_ENV.json if present)"
    )]
    pub config_file: Option<PathBuf>,

    /// Log output format, overriding the config file
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        help = "Log format on stderr: 'pretty' or 'json'"
    )]
    pub log_format: Option<LogFormat>,
}
