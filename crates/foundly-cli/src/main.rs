// SPDX-License-Identifier: AGPL-3.0
// Foundly CLI - Command-line frontend

use clap::{Parser, Subcommand};
use foundly_core::{
    AppError, Classification, FeedQuery, FileStore, ItemFeed, JsonFileSource, KeyValueStore,
    OverrideStore, SettingsStore, SortOrder, TypeFilter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Browse and classify lost & found items", long_about = None)]
struct Cli {
    /// Item list exported from the backend (JSON array or response envelope)
    #[arg(long, default_value = "items.json")]
    items: PathBuf,
    /// Storage file for overrides; defaults to the platform config directory
    #[arg(long)]
    storage: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List items with their lost/found classification
    List {
        /// all, lost or found
        #[arg(long)]
        filter: Option<TypeFilter>,
        /// Match against item name and description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
        /// newest, oldest or name
        #[arg(long)]
        sort: Option<SortOrder>,
    },
    /// Show how a single item is classified
    Classify { id: String },
    /// Mark an item as lost or found
    Override {
        id: String,
        classification: Classification,
    },
    /// Remove a local override
    ClearOverride { id: String },
    /// Print all local overrides
    Overrides,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("foundly_cli=info,foundly_core=info")),
        )
        .init();

    tracing::debug!("Starting Foundly CLI v{}", env!("CARGO_PKG_VERSION"));

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (storage, settings) = match &cli.storage {
        Some(path) => {
            let settings_path = path
                .parent()
                .map(|dir| dir.join("settings.json"))
                .unwrap_or_else(|| PathBuf::from("settings.json"));
            (FileStore::open(path)?, SettingsStore::open(settings_path)?)
        }
        None => (FileStore::new()?, SettingsStore::new()?),
    };
    let settings = settings.get();
    let storage: Arc<dyn KeyValueStore> = Arc::new(storage);
    let overrides = OverrideStore::with_key(storage, settings.override_key.clone());

    match cli.command {
        Commands::List {
            filter,
            search,
            category,
            sort,
        } => {
            let mut feed = ItemFeed::new();
            feed.refresh(&JsonFileSource::new(&cli.items), &overrides)
                .await?;

            let defaults = FeedQuery::from_settings(&settings);
            let query = FeedQuery {
                filter: filter.unwrap_or(defaults.filter),
                search,
                category,
                sort: sort.unwrap_or(defaults.sort),
            };

            let entries = feed.view(&query);
            for entry in &entries {
                println!(
                    "{:>8}  {:<5}  {}",
                    entry.item.id().unwrap_or_else(|| "-".to_string()),
                    entry.classification.label(),
                    entry.item.name().unwrap_or("(untitled)")
                );
            }
            if entries.is_empty() {
                println!("No items found");
            }
        }
        Commands::Classify { id } => {
            let mut feed = ItemFeed::new();
            feed.refresh(&JsonFileSource::new(&cli.items), &overrides)
                .await?;

            let item = feed
                .find(&id)
                .ok_or_else(|| AppError::Source(format!("No item with id {}", id)))?;
            let resolution = foundly_core::resolve(item, feed.overrides());
            println!(
                "{}: {} ({})",
                id,
                resolution.classification,
                resolution.rule.describe()
            );
        }
        Commands::Override { id, classification } => {
            overrides.set_override(&id, classification).await?;
            println!("{}: {}", id, classification);
        }
        Commands::ClearOverride { id } => {
            if overrides.clear_override(&id).await? {
                println!("{}: override cleared", id);
            } else {
                println!("{}: no override set", id);
            }
        }
        Commands::Overrides => {
            let map = overrides.load().await;
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (id, classification) in entries {
                println!("{}: {}", id, classification);
            }
        }
    }

    Ok(())
}
