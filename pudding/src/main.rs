use clap::{Parser, Subcommand};
use pudding_processor::broker::AmqpBroker;
use pudding_processor::modules::CacheModule;
use pudding_processor::Consumer;
use pudding_settings::Settings;
use pudding_utils::error::ResultExt;
use pudding_utils::{shutdown, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[error("could not start Pudding")]
struct StartError;

#[derive(Debug, Parser)]
#[command(name = "pudding", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Settings file utilities.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Prints a documented settings file in TOML with default values.
    Generate,
}

async fn bootstrap(settings: Settings) -> Result<(), StartError> {
    let database = settings.database();
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections())
        .min_connections(database.min_connections())
        .acquire_timeout(database.connect_timeout())
        .idle_timeout(database.idle_timeout())
        .connect_with(database.as_postgres_connect_options())
        .await
        .change_context(StartError)
        .attach_printable("could not connect to the database")?;

    pudding_schema::MIGRATOR
        .run(&pool)
        .await
        .change_context(StartError)
        .attach_printable("could not run database migrations")?;

    let broker = AmqpBroker::connect(settings.broker())
        .await
        .change_context(StartError)?;

    let consumer = Arc::new(
        Consumer::new(Arc::new(broker)).register(CacheModule::new(pool.clone())),
    );
    consumer.setup().await.change_context(StartError)?;

    let _signals = tokio::spawn(shutdown::catch_signals());

    let runner = Arc::clone(&consumer);
    tokio::select! {
        result = runner.run() => {
            result.change_context(StartError)?;
            warn!("consumer stopped on its own");
        }
        () = shutdown::triggered() => {
            info!("shutting down; waiting for in-flight events");
            consumer.shutdown().await;
        }
    }

    pool.close().await;
    Ok(())
}

fn start() -> Result<(), StartError> {
    let settings = Settings::from_env().change_context(StartError)?;
    pudding::logging::init(settings.logging()).change_context(StartError)?;
    pudding::print_launch(&settings);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.threads())
        .enable_all()
        .build()
        .change_context(StartError)
        .attach_printable("could not build the async runtime")?
        .block_on(bootstrap(settings))
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Some(CliCommand::Settings(SettingsCommand::Generate)) => {
            print!("{}", Settings::generate_docs());
        }
        None => {
            pudding_utils::error::init();
            if let Err(error) = start() {
                eprintln!("{error:?}");
                std::process::exit(1);
            }
        }
    }
}
