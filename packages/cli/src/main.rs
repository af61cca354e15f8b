#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the network inventory address search.
//!
//! Connects to the database named by `DATABASE_URL`, loads the type
//! dictionary, and answers address searches. A dictionary that fails to
//! load aborts startup.

mod config;
mod interactive;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use netinv_address::dictionary::spawn_refresh;
use netinv_address::{DictionaryHandle, SuggestionService};
use netinv_address_models::TypeCategory;
use netinv_database::{PgAddressStore, db};

#[derive(Parser)]
#[command(name = "netinv", about = "Network inventory address search")]
struct Cli {
    /// Path to a TOML config file (overrides `NETINV_CONFIG` env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ranked address suggestions for free text as JSON
    Search {
        /// Address text, e.g. "ул Ленина 14а"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Number of ranked candidates to skip
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Page size (defaults to `default_limit` from the config)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// List the loaded administrative type dictionary
    Types {
        /// Only list one category (`STREET_TYPE` or `HOUSE_TYPE`)
        #[arg(long)]
        category: Option<TypeCategory>,
    },
    /// Print a single house with its street and resource counts as JSON
    House {
        /// House identifier
        id: i32,
    },
    /// Look up addresses interactively (the default)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = config::load(config::resolve_path(cli.config).as_deref())?;

    let db = db::connect_from_env().await?;
    let store = Arc::new(PgAddressStore::new(Arc::from(db)));

    let dictionary = DictionaryHandle::load(store.as_ref())
        .await
        .inspect_err(|e| log::error!("Cannot start without a type dictionary: {e}"))?;
    let dictionary = Arc::new(dictionary);

    let service = SuggestionService::new(dictionary.clone(), store.clone(), config.clone());

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Search {
            text,
            offset,
            limit,
        } => {
            let limit = limit.unwrap_or_else(|| i64::from(config.default_limit));
            let page = service.search(&text.join(" "), offset, limit).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Types { category } => {
            let snapshot = dictionary
                .snapshot()
                .ok_or("Type dictionary is not loaded")?;
            let categories = category.map_or_else(|| TypeCategory::all().to_vec(), |c| vec![c]);

            println!("{:<14} {:<6} {:<10} NAME", "CATEGORY", "ID", "SHORT");
            println!("{}", "-".repeat(50));
            for category in categories {
                for token in snapshot.tokens(category) {
                    println!(
                        "{:<14} {:<6} {:<10} {}",
                        category.as_ref(),
                        token.id,
                        token.short_name,
                        token.name
                    );
                }
            }
        }
        Commands::House { id } => {
            let house = service
                .get_house(id)
                .await?
                .ok_or_else(|| format!("House {id} not found"))?;
            println!("{}", serde_json::to_string_pretty(&house)?);
        }
        Commands::Interactive => {
            let refresh = config.dictionary_refresh_secs.map(|secs| {
                log::info!("Reloading type dictionary every {secs}s");
                spawn_refresh(dictionary.clone(), store.clone(), Duration::from_secs(secs))
            });

            interactive::run(&service).await?;

            if let Some(refresh) = refresh {
                refresh.abort();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_category_filter() {
        let cli = Cli::try_parse_from(["netinv", "types", "--category", "HOUSE_TYPE"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Types {
                category: Some(TypeCategory::HouseType)
            })
        ));
    }

    #[test]
    fn rejects_unknown_type_category() {
        assert!(Cli::try_parse_from(["netinv", "types", "--category", "CITY_TYPE"]).is_err());
    }

    #[test]
    fn joins_search_words_and_accepts_negative_offset() {
        let cli = Cli::try_parse_from([
            "netinv", "search", "ул", "Ленина", "14а", "--offset", "-1",
        ])
        .unwrap();
        let Some(Commands::Search {
            text,
            offset,
            limit,
        }) = cli.command
        else {
            panic!("expected search command");
        };
        assert_eq!(text.join(" "), "ул Ленина 14а");
        assert_eq!(offset, -1);
        assert_eq!(limit, None);
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["netinv"]).unwrap();
        assert!(cli.command.is_none());
    }
}
