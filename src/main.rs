// NetBank - command line front end
//
// Each subcommand maps onto exactly one ledger operation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use netbank::{AccountId, Customer, Ledger, Target};

/// NetBank ledger CLI
#[derive(Parser, Debug)]
#[command(name = "netbank")]
#[command(about = "Bank-account ledger: accounts, balances and transfers")]
#[command(version)]
struct Args {
    /// Database file (overrides NETBANK_DB and the NETBANK_ENV target)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Milliseconds to wait for another writer's lock (default 5000)
    #[arg(long, global = true)]
    busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables if they do not exist
    Init,
    /// Open a new account with a zero balance
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
    },
    /// Show one account
    Show { id: AccountId },
    /// List accounts, optionally filtered by balance
    List {
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },
    /// Print the balance of one account
    Balance { id: AccountId },
    /// Print a one-line statement
    Statement { id: AccountId },
    Deposit { id: AccountId, amount: f64 },
    Withdraw { id: AccountId, amount: f64 },
    /// Move money between two accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: f64,
    },
    /// Replace the customer fields of an account
    Update {
        id: AccountId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
    },
    /// Delete an account and its customer record
    Delete { id: AccountId },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    netbank::init_tracing();

    let args = Args::parse();

    let target = Target::from_env();
    let busy_timeout = args.busy_timeout_ms.map(Duration::from_millis);
    let config = target.resolve(args.db, busy_timeout);
    tracing::debug!(env = target.as_str(), database = %config.describe(), "resolved connection");

    let ledger = Ledger::open(config).context("Failed to open ledger")?;

    match args.command {
        Command::Init => {
            println!("✓ Ledger ready ({})", ledger.config().describe());
        }
        Command::Create {
            name,
            address,
            phone,
        } => {
            let account = ledger.create_account(&Customer::new(name, address, phone))?;
            print_json(&account)?;
        }
        Command::Show { id } => print_json(&ledger.get_account(id)?)?,
        Command::List { min, max } => print_json(&ledger.get_accounts(min, max)?)?,
        Command::Balance { id } => println!("{}", ledger.get_balance(id)?),
        Command::Statement { id } => println!("{}", ledger.statement(id)?),
        Command::Deposit { id, amount } => print_json(&ledger.deposit(id, amount)?)?,
        Command::Withdraw { id, amount } => print_json(&ledger.withdraw(id, amount)?)?,
        Command::Transfer { from, to, amount } => {
            print_json(&ledger.transfer(from, to, amount)?)?
        }
        Command::Update {
            id,
            name,
            address,
            phone,
        } => {
            let account = ledger.update_account(id, &Customer::new(name, address, phone))?;
            print_json(&account)?;
        }
        Command::Delete { id } => {
            ledger.delete_account(id)?;
            println!("✓ Account {} deleted", id);
        }
    }

    ledger.close()?;
    Ok(())
}
