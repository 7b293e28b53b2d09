use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use aliaskeep::config::Config;
use aliaskeep::registry::Registry;

#[derive(Parser)]
#[command(name = "aliaskeep-admin")]
#[command(about = "Inspect and maintain the aliaskeep link file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored links
    List {
        /// Only show links created by this owner
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show one link with its click analytics
    Show {
        alias: String,
    },
    /// Delete a link and its analytics
    Delete {
        alias: String,
        /// Act as this owner when ownership is enforced
        #[arg(long)]
        owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    if config.storage.data_file.is_none() {
        bail!("DATA_FILE is set to in-memory storage; there is nothing to administer");
    }

    let store = aliaskeep::open_store(&config);
    // Unlike the server, refuse to work on a file we cannot read: saving
    // would overwrite it with an empty document.
    let document = store
        .load()
        .await
        .with_context(|| format!("failed to load {}", store.describe()))?
        .unwrap_or_default();
    let registry = Registry::from_document(config.registry_settings(), document);
    let now = Utc::now();

    match cli.command {
        Commands::List { owner } => {
            let links = registry.list_links(owner.as_deref());
            if links.is_empty() {
                println!("No links found.");
            } else {
                println!("{:<16} {:>8}  {:<10} {}", "ALIAS", "CLICKS", "STATUS", "TARGET");
                for link in links {
                    let status = if link.is_expired(now) {
                        "expired"
                    } else if link.is_expiring_soon(now) {
                        "expiring"
                    } else {
                        "active"
                    };
                    println!(
                        "{:<16} {:>8}  {:<10} {}",
                        link.alias, link.click_count, status, link.target_url
                    );
                }
            }
        }
        Commands::Show { alias } => {
            let (link, stats) = registry.stats(&alias)?;
            println!("{}", serde_json::to_string_pretty(&link)?);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Delete { alias, owner } => {
            registry.delete_link(&alias, owner.as_deref())?;
            store
                .save(&registry.snapshot())
                .await
                .with_context(|| format!("failed to save {}", store.describe()))?;
            println!("✅ Deleted '{}'", alias);
        }
    }

    Ok(())
}
