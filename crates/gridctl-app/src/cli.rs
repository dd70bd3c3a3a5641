//! Command-line surface.

use clap::Subcommand;
use rust_decimal::Decimal;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show configured symbols and where they are running
    Status,
    /// Start a symbol on every selected exchange
    Start { symbol: String },
    /// Stop a symbol on one exchange, or on all of them
    Stop {
        symbol: String,
        #[arg(short, long)]
        exchange: Option<String>,
    },
    /// Search the tradable symbols offered by the backend
    Search { term: String },
    /// Show or change the exchange selection used by `start`
    Exchanges {
        #[command(subcommand)]
        action: Option<ExchangesCommand>,
    },
    /// Add or update a symbol's take-profit/stop-loss and save
    Set {
        symbol: String,
        #[arg(long)]
        tp: Decimal,
        #[arg(long)]
        sl: Decimal,
    },
    /// Remove a stopped symbol and save
    Remove { symbol: String },
    /// Reconcile periodically and serve the dashboard until Ctrl-C
    Serve,
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ExchangesCommand {
    /// List supported exchanges and the current selection
    List,
    /// Select or deselect an exchange
    Toggle { exchange: String },
}
