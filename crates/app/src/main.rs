use std::sync::Arc;

use clap::Parser;
use ledger::{JsonStore, Ledger, MemoryStore, Store};

mod cli;
mod commands;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "splitbook={level},ledger={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let store: Arc<dyn Store> = if settings.storage.memory {
        tracing::info!("using in-memory storage");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonStore::open(&settings.storage.data_dir))
    };

    let ledger = Ledger::builder()
        .store(store)
        .empty_split(settings.ledger.empty_split)
        .build();

    let outcome = commands::run(&ledger, cli.command).await;

    if let Err(err) = ledger.flush().await {
        tracing::error!("failed to flush ledger: {err}");
        return Err(err.into());
    }

    match outcome {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }
}
