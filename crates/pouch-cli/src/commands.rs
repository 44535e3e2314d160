use std::io::{self, BufRead, Write};

use colored::Colorize;
use pouch_catalog::{Catalog, InMemoryCatalog};
use pouch_store::{Pocket, Wallet};

use crate::cli::{BuyArgs, Cli, Command, OutputFormat, SetBalanceArgs};

/// Outcome of a purchase attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum BuyOutcome {
    /// The price was withdrawn and the item recorded.
    Purchased { price: i64, remaining: i64 },
    /// The catalog does not stock this product.
    UnknownProduct,
    /// The balance does not cover the price; nothing was changed.
    InsufficientFunds { price: i64, balance: i64 },
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let wallet = Wallet::open(&cli.wallet)?;
    let pocket = Pocket::open(&cli.pocket)?;
    let catalog = InMemoryCatalog::with_defaults();

    let result = match cli.command {
        Command::Balance => cmd_balance(&wallet, &cli.format),
        Command::SetBalance(args) => cmd_set_balance(&wallet, args),
        Command::Buy(args) => cmd_buy(&wallet, &pocket, &catalog, args),
        Command::Pocket => cmd_pocket(&pocket, &cli.format),
        Command::Products => cmd_products(&catalog, &cli.format),
        Command::Shop => cmd_shop(&wallet, &pocket, &catalog),
    };

    wallet.close()?;
    pocket.close()?;
    result
}

/// Look the product up, withdraw its price, then record the item.
///
/// The withdraw and the append are independent atomic operations; the
/// caller accepts the crash window between them.
pub fn buy_product(
    wallet: &Wallet,
    pocket: &Pocket,
    catalog: &dyn Catalog,
    name: &str,
) -> anyhow::Result<BuyOutcome> {
    let Some(price) = catalog.price_of(name) else {
        return Ok(BuyOutcome::UnknownProduct);
    };

    if !wallet.withdraw(price)? {
        let balance = wallet.balance()?;
        return Ok(BuyOutcome::InsufficientFunds { price, balance });
    }

    pocket.append(name)?;
    let remaining = wallet.balance()?;
    Ok(BuyOutcome::Purchased { price, remaining })
}

fn cmd_balance(wallet: &Wallet, format: &OutputFormat) -> anyhow::Result<()> {
    let balance = wallet.balance()?;
    match format {
        OutputFormat::Text => println!("{} credits", balance.to_string().bold()),
        OutputFormat::Json => println!("{}", serde_json::json!({ "balance": balance })),
    }
    Ok(())
}

fn cmd_set_balance(wallet: &Wallet, args: SetBalanceArgs) -> anyhow::Result<()> {
    wallet.set_balance(args.value)?;
    println!(
        "{} Balance set to {} credits.",
        "✓".green().bold(),
        args.value.to_string().bold()
    );
    Ok(())
}

fn cmd_buy(
    wallet: &Wallet,
    pocket: &Pocket,
    catalog: &dyn Catalog,
    args: BuyArgs,
) -> anyhow::Result<()> {
    match buy_product(wallet, pocket, catalog, &args.product)? {
        BuyOutcome::Purchased { price, remaining } => {
            println!(
                "{} Bought {} for {} credits. {} credits left.",
                "✓".green().bold(),
                args.product.yellow(),
                price,
                remaining.to_string().bold()
            );
            Ok(())
        }
        BuyOutcome::UnknownProduct => {
            anyhow::bail!("no such product: {}", args.product)
        }
        BuyOutcome::InsufficientFunds { price, balance } => {
            anyhow::bail!(
                "{} costs {price} credits but only {balance} are available",
                args.product
            )
        }
    }
}

fn cmd_pocket(pocket: &Pocket, format: &OutputFormat) -> anyhow::Result<()> {
    let items = pocket.read_all()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "items": items })),
        OutputFormat::Text if items.is_empty() => println!("Your pocket is empty."),
        OutputFormat::Text => {
            for item in &items {
                println!("{item}");
            }
        }
    }
    Ok(())
}

fn cmd_products(catalog: &dyn Catalog, format: &OutputFormat) -> anyhow::Result<()> {
    let products = catalog.products();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&products)?),
        OutputFormat::Text => {
            for product in &products {
                println!("{:<8} {:>8} credits", product.name.bold(), product.price);
            }
        }
    }
    Ok(())
}

/// Interactive loop: print the shop state and buy whatever is typed in,
/// until `quit` or end of input.
///
/// Refused purchases and unknown products keep the loop running; store
/// failures propagate and stop the program.
fn cmd_shop(wallet: &Wallet, pocket: &Pocket, catalog: &dyn Catalog) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print_state(wallet, pocket, catalog)?;
    loop {
        print!("What do you want to buy? (type quit to stop) ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let product = line.trim();
        if product == "quit" {
            break;
        }
        if product.is_empty() {
            continue;
        }

        match buy_product(wallet, pocket, catalog, product)? {
            BuyOutcome::Purchased { remaining, .. } => {
                println!(
                    "Your new balance is: {} credits.",
                    remaining.to_string().bold()
                );
            }
            BuyOutcome::UnknownProduct => {
                println!("{} No such product: {}", "!".red().bold(), product.yellow());
            }
            BuyOutcome::InsufficientFunds { price, balance } => {
                println!(
                    "{} Not enough credits: {} costs {price}, you have {balance}.",
                    "!".red().bold(),
                    product.yellow()
                );
            }
        }
        print_state(wallet, pocket, catalog)?;
    }
    Ok(())
}

fn print_state(wallet: &Wallet, pocket: &Pocket, catalog: &dyn Catalog) -> anyhow::Result<()> {
    println!(
        "Your current balance is: {} credits.",
        wallet.balance()?.to_string().bold()
    );
    for product in catalog.products() {
        println!("  {:<8} {:>8} credits", product.name, product.price);
    }
    let items = pocket.read_all()?;
    if items.is_empty() {
        println!("Your pocket is empty.");
    } else {
        println!("Your current pocket is: {}", items.join(", "));
    }
    Ok(())
}
