use clap::Parser;
use ledger_store::adapters::MongoTransactionRepository;
use ledger_store::cli::{self, Cli, Commands};
use ledger_store::config::{Config, LogFormat};
use ledger_store::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays machine readable
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn connect(config: &Config) -> anyhow::Result<MongoTransactionRepository> {
    let database = db::connect(config).await?;
    tracing::info!("Connected to MongoDB database {}", config.database_name);
    Ok(MongoTransactionRepository::new(&database))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    init_logging(config.log_format);

    match cli.command {
        Commands::Config => cli::handle_config_validate(&config),
        Commands::Add(args) => cli::handle_add(&connect(&config).await?, args).await,
        Commands::Get { id } => cli::handle_get(&connect(&config).await?, &id).await,
        Commands::List(args) => cli::handle_list(&connect(&config).await?, args).await,
        Commands::Delete { id } => cli::handle_delete(&connect(&config).await?, &id).await,
        Commands::Summary {
            user_id,
            year,
            month,
        } => cli::handle_summary(&connect(&config).await?, &user_id, year, month).await,
        Commands::CategoryTotal {
            user_id,
            category_id,
            year,
            month,
        } => {
            let repo = connect(&config).await?;
            cli::handle_category_total(&repo, &user_id, &category_id, year, month).await
        }
        Commands::Indexes => cli::handle_indexes(&connect(&config).await?).await,
    }
}
