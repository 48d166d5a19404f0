//! Command-line front end for the search engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
#[cfg(feature = "runtime")]
use crate::controller::SearchController;
use crate::core::{SearchEngine, SearchResult, SearchSuggestion};
use crate::services::storage::{JsonFileStore, KeyValueStore, MemoryStore};

type Store = Box<dyn KeyValueStore + Send>;

#[derive(Parser)]
#[command(name = "toolbox")]
#[command(about = "Search a catalog of utility tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog JSON file (default: bundled catalog)
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Engine config file (default: ~/.config/toolbox/search.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Personalization store file (default: user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Keep recents and favorites in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank utilities against a query
    Search {
        query: Vec<String>,
    },

    /// Show typed suggestions for a partial query
    Suggest {
        query: Vec<String>,
    },

    /// Record that a utility was used
    Use {
        id: String,
    },

    /// Toggle a utility's favorite status
    Favorite {
        id: String,
    },

    /// List recently used utilities
    Recent,

    /// List favorite utilities
    Favorites,

    /// Forget recents and favorites
    Clear,

    /// List categories present in the catalog
    Categories,

    /// Type queries line by line; `:N` picks suggestion N
    #[cfg(feature = "runtime")]
    Interactive,
}

/// Parse arguments and run the requested command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load(),
    };

    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::bundled()?,
    };
    tracing::debug!(utilities = catalog.len(), "Catalog loaded");

    let mut engine = SearchEngine::new(catalog, open_store(&cli), &config);

    match cli.command {
        Commands::Search { query } => {
            let results = engine.rank(&query.join(" "));
            if results.is_empty() {
                println!("No results");
            }
            for result in &results {
                print_result(result);
            }
        }
        Commands::Suggest { query } => {
            for suggestion in engine.suggest(&query.join(" ")) {
                print_suggestion(&suggestion);
            }
        }
        Commands::Use { id } => {
            let utility = engine
                .catalog()
                .get(&id)
                .cloned()
                .with_context(|| format!("Unknown utility '{}'", id))?;
            engine.record_use(&id);
            warn_if_not_persisted(&engine);
            println!("Opened {} ({})", utility.name, utility.route);
        }
        Commands::Favorite { id } => {
            anyhow::ensure!(engine.catalog().contains(&id), "Unknown utility '{}'", id);
            let now_favorite = engine.toggle_favorite(&id);
            warn_if_not_persisted(&engine);
            if now_favorite {
                println!("Added {} to favorites", id);
            } else {
                println!("Removed {} from favorites", id);
            }
        }
        Commands::Recent => {
            for utility in engine.recently_used() {
                println!("{:<28} {}", utility.id, utility.name);
            }
        }
        Commands::Favorites => {
            for utility in engine.favorites() {
                println!("{:<28} {}", utility.id, utility.name);
            }
        }
        Commands::Clear => {
            engine.clear_history();
            warn_if_not_persisted(&engine);
            println!("History cleared");
        }
        Commands::Categories => {
            for category in engine.catalog().categories() {
                let count = engine
                    .catalog()
                    .iter()
                    .filter(|u| u.category == category)
                    .count();
                println!("{:<16} {:<18} {}", category.slug(), category.label(), count);
            }
        }
        #[cfg(feature = "runtime")]
        Commands::Interactive => interactive(SearchController::new(engine))?,
    }

    Ok(())
}

fn open_store(cli: &Cli) -> Store {
    if cli.ephemeral {
        return Box::new(MemoryStore::new());
    }

    match cli.store.clone().or_else(JsonFileStore::default_path) {
        Some(path) => Box::new(JsonFileStore::open(path)),
        None => {
            tracing::warn!("No data directory found, history will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

fn warn_if_not_persisted(engine: &SearchEngine<Store>) {
    if !engine.personalization().is_persistent() {
        eprintln!("warning: history could not be saved, changes apply to this run only");
    }
}

fn print_result(result: &SearchResult) {
    let fields: Vec<&str> = result.matched_fields.iter().map(|f| f.as_str()).collect();
    println!(
        "{:.2}  {:<28} {:<32} [{}]",
        result.relevance_score,
        result.utility.id,
        result.utility.name,
        fields.join(", ")
    );
}

fn print_suggestion(suggestion: &SearchSuggestion) {
    if let Some(text) = suggestion.text() {
        println!("{:<9} {}", suggestion.kind(), text);
    }
}

/// `:N` in interactive mode.
#[cfg(feature = "runtime")]
fn parse_pick(line: &str) -> Option<usize> {
    line.strip_prefix(':')?.trim().parse().ok()
}

/// Suggestion number `n`, counting from 1.
#[cfg(feature = "runtime")]
fn pick_suggestion(suggestions: &[SearchSuggestion], n: usize) -> Option<SearchSuggestion> {
    n.checked_sub(1).and_then(|i| suggestions.get(i)).cloned()
}

#[cfg(feature = "runtime")]
fn interactive(controller: SearchController<Store>) -> anyhow::Result<()> {
    use crate::controller::{driver, SearchState};
    use std::io::BufRead;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let (handle, task) = driver::spawn(controller);
        let mut snapshots = handle.subscribe();
        let mut seen = 0;

        for line in std::io::stdin().lock().lines() {
            let line = line?;

            match parse_pick(&line) {
                Some(n) => {
                    let picked = pick_suggestion(&handle.snapshot().suggestions, n);
                    let Some(suggestion) = picked else {
                        println!("No suggestion {}", n);
                        continue;
                    };
                    handle.select_suggestion(suggestion)?;
                }
                None => handle.search(line.clone())?,
            }

            if line.trim().is_empty() {
                continue;
            }

            let snapshot = snapshots
                .wait_for(|s| s.state == SearchState::Settled && s.evaluations > seen)
                .await?
                .clone();
            seen = snapshot.evaluations;

            for result in snapshot.results.iter().take(10) {
                print_result(result);
            }
            for (i, suggestion) in snapshot.suggestions.iter().enumerate() {
                if let Some(text) = suggestion.text() {
                    println!("  :{} {} ({})", i + 1, text, suggestion.kind());
                }
            }
            if !snapshot.recently_used.is_empty() {
                let recent: Vec<&str> =
                    snapshot.recently_used.iter().map(|u| u.name.as_str()).collect();
                println!("  recent: {}", recent.join(", "));
            }
        }

        drop(handle);
        task.await?;
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "runtime")]
    fn keywords(texts: &[&str]) -> Vec<SearchSuggestion> {
        texts
            .iter()
            .map(|t| SearchSuggestion::Keyword {
                text: t.to_string(),
            })
            .collect()
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick(":2"), Some(2));
        assert_eq!(parse_pick(": 3 "), Some(3));
        assert_eq!(parse_pick(":0"), Some(0));
        assert_eq!(parse_pick(":x"), None);
        assert_eq!(parse_pick("json"), None);
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_pick_suggestion_counts_from_one() {
        let suggestions = keywords(&["json", "jwt"]);

        assert_eq!(pick_suggestion(&suggestions, 1), Some(suggestions[0].clone()));
        assert_eq!(pick_suggestion(&suggestions, 2), Some(suggestions[1].clone()));
        assert_eq!(pick_suggestion(&suggestions, 3), None);
        assert_eq!(pick_suggestion(&suggestions, 0), None);
    }

    #[test]
    fn test_cli_parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["toolbox", "search", "json", "formatter", "--ephemeral"])
            .unwrap();

        assert!(cli.ephemeral);
        match cli.command {
            Commands::Search { query } => assert_eq!(query, vec!["json", "formatter"]),
            _ => panic!("expected search"),
        }
    }
}
