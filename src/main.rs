use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sfxi::index::build::load_documents;
use sfxi::index::stats::print_stats;
use sfxi::index::{SearchConfig, SearchIndex, dump_suffix_trie};
use sfxi::output::{print_results, print_suffixes};
use sfxi::query::QueryEvaluator;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sfxi")]
#[command(about = "Suffix-trie backed wildcard search over an in-memory index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (environment variables take priority)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(clap::Args)]
struct Source {
    /// Schema, e.g. "t TEXT WITHSUFFIXTRIE tags TAG SEPARATOR ;"
    #[arg(short, long)]
    schema: String,

    /// JSON-lines document file: {"key": "...", "fields": {...}}
    #[arg(short, long)]
    docs: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a wildcard query (`lit*`, `*lit`, `*lit*`, `@field:...`)
    Search {
        #[command(flatten)]
        source: Source,

        /// Query pattern
        pattern: String,

        /// Restrict the pattern to one field
        #[arg(short, long)]
        field: Option<String>,

        /// Query parameter, repeatable
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
    },
    /// List the suffixes stored for a field (all TEXT fields if omitted)
    Dump {
        #[command(flatten)]
        source: Source,

        field: Option<String>,

        /// Collect stale entries before dumping
        #[arg(long)]
        gc: bool,
    },
    /// Show index statistics
    Stats {
        #[command(flatten)]
        source: Source,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")?;
    Ok(())
}

fn open_index(source: &Source, config: &Option<PathBuf>) -> Result<SearchIndex> {
    let config = SearchConfig::load(config.as_deref())?;
    let index = SearchIndex::from_schema_str(&source.schema, config)?;
    load_documents(&index, &source.docs, false)?;
    Ok(index)
}

fn parse_params(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for param in raw {
        let Some((name, value)) = param.split_once('=') else {
            bail!("Invalid parameter `{}`, expected NAME=VALUE", param);
        };
        params.insert(name.to_string(), value.to_string());
    }
    Ok(params)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Search {
            source,
            pattern,
            field,
            params,
        } => {
            let index = open_index(&source, &cli.config)?;
            let params = parse_params(&params)?;
            let query = match field {
                Some(field) => format!("@{}:{}", field, pattern),
                None => pattern,
            };
            let result = QueryEvaluator::new(&index).search_with_params(&query, &params)?;
            print_results(&result, color)?;
        }
        Commands::Dump { source, field, gc } => {
            let index = open_index(&source, &cli.config)?;
            if gc {
                index.force_gc();
            }
            let args: Vec<&str> = field.as_deref().into_iter().collect();
            let suffixes = dump_suffix_trie(&index, &args)?;
            print_suffixes(&suffixes, None, color)?;
        }
        Commands::Stats { source, json } => {
            let index = open_index(&source, &cli.config)?;
            let stats = index.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}
