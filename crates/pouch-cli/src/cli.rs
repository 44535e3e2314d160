use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pouch",
    about = "Pouch — a crash-consistent wallet and pocket ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Wallet backing file.
    #[arg(long, global = true, default_value = "wallet.txt")]
    pub wallet: PathBuf,

    /// Pocket backing file.
    #[arg(long, global = true, default_value = "pocket.txt")]
    pub pocket: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the current balance
    Balance,
    /// Overwrite the stored balance
    SetBalance(SetBalanceArgs),
    /// Buy a product: withdraw its price, then record it in the pocket
    Buy(BuyArgs),
    /// List everything in the pocket
    Pocket,
    /// List catalog products and prices
    Products,
    /// Interactive shopping loop
    Shop,
}

#[derive(Args)]
pub struct SetBalanceArgs {
    /// New balance in credits.
    #[arg(allow_negative_numbers = true)]
    pub value: i64,
}

#[derive(Args)]
pub struct BuyArgs {
    /// Product name, as listed by `products`.
    pub product: String,
}
