use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::adapters::MongoTransactionRepository;
use crate::config::Config;
use crate::domain::{Transaction, TransactionFilter, TransactionType};
use crate::ports::{Repository, TransactionRepository};

#[derive(Parser)]
#[command(name = "ledger-store")]
#[command(about = "Ledger Store - transaction storage for personal finance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new transaction
    Add(AddArgs),

    /// Show a transaction by ID
    Get {
        #[arg(value_name = "TX_ID")]
        id: String,
    },

    /// List transactions, newest first
    List(ListArgs),

    /// Delete a transaction by ID
    Delete {
        #[arg(value_name = "TX_ID")]
        id: String,
    },

    /// Monthly totals grouped by category and type
    Summary {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Total spent in one category for a month
    CategoryTotal {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        category_id: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Create the collection indexes
    Indexes,

    /// Configuration validation
    Config,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub account_id: String,
    #[arg(long)]
    pub category_id: String,
    /// income, expense or transfer
    #[arg(long = "type")]
    pub transaction_type: TransactionType,
    #[arg(long)]
    pub amount: BigDecimal,
    /// RFC 3339 timestamp, defaults to now
    #[arg(long)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[arg(long)]
    pub transfer_account_id: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub user_id: Option<String>,
    #[arg(long)]
    pub account_id: Option<String>,
    #[arg(long)]
    pub category_id: Option<String>,
    #[arg(long = "type")]
    pub transaction_type: Option<String>,
    #[arg(long)]
    pub transfer_account_id: Option<String>,
    /// Inclusive lower bound, RFC 3339
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound, RFC 3339
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,
}

impl From<ListArgs> for TransactionFilter {
    fn from(args: ListArgs) -> Self {
        TransactionFilter {
            user_id: args.user_id,
            account_id: args.account_id,
            category_id: args.category_id,
            transaction_type: args.transaction_type,
            transfer_account_id: args.transfer_account_id,
            date_from: args.from,
            date_to: args.to,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_add(repo: &MongoTransactionRepository, args: AddArgs) -> anyhow::Result<()> {
    let mut tx = Transaction::new(
        args.user_id,
        args.account_id,
        args.category_id,
        args.transaction_type,
        args.amount,
        args.occurred_at.unwrap_or_else(Utc::now),
    );
    tx.transfer_account_id = args.transfer_account_id;
    tx.description = args.description;

    let created = repo.create(tx).await?;
    tracing::info!("Transaction {} recorded", created.id);
    print_json(&created)
}

pub async fn handle_get(repo: &MongoTransactionRepository, id: &str) -> anyhow::Result<()> {
    match repo.get(id).await? {
        Some(tx) => print_json(&tx),
        None => {
            tracing::warn!("Transaction {} not found", id);
            anyhow::bail!("Transaction {} not found", id)
        }
    }
}

pub async fn handle_list(repo: &MongoTransactionRepository, args: ListArgs) -> anyhow::Result<()> {
    let filter = TransactionFilter::from(args);
    let transactions = repo.list(&filter).await?;
    print_json(&transactions)
}

pub async fn handle_delete(repo: &MongoTransactionRepository, id: &str) -> anyhow::Result<()> {
    if repo.delete(id).await? {
        tracing::info!("Transaction {} deleted", id);
        println!("✓ Transaction {} deleted", id);
        Ok(())
    } else {
        tracing::warn!("Transaction {} not found", id);
        anyhow::bail!("Transaction {} not found", id)
    }
}

pub async fn handle_summary(
    repo: &MongoTransactionRepository,
    user_id: &str,
    year: i32,
    month: u32,
) -> anyhow::Result<()> {
    let summary = repo.aggregate_monthly_summary(user_id, year, month).await?;
    print_json(&summary)
}

pub async fn handle_category_total(
    repo: &MongoTransactionRepository,
    user_id: &str,
    category_id: &str,
    year: i32,
    month: u32,
) -> anyhow::Result<()> {
    let total = repo
        .sum_for_category_period(user_id, category_id, year, month)
        .await?;
    print_json(&serde_json::json!({
        "user_id": user_id,
        "category_id": category_id,
        "year": year,
        "month": month,
        "total": total.to_string(),
    }))
}

pub async fn handle_indexes(repo: &MongoTransactionRepository) -> anyhow::Result<()> {
    tracing::info!("Creating indexes...");
    repo.ensure_indexes().await?;
    println!("✓ Indexes are in place");
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  MongoDB URI: {}", mask_password(&config.mongodb_uri));
    println!("  Database: {}", config.database_name);
    println!("  App name: {}", config.app_name);
    println!("  Log format: {:?}", config.log_format);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_password(uri: &str) -> String {
    if let Some(at_pos) = uri.rfind('@') {
        if let Some(colon_pos) = uri[..at_pos].rfind(':') {
            if let Some(slash_pos) = uri[..colon_pos].rfind("//") {
                let prefix = &uri[..slash_pos + 2];
                let user = &uri[slash_pos + 2..colon_pos];
                let suffix = &uri[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    uri.to_string()
}
