use chrono::Utc;
use clap::{Parser, Subcommand};
use secopbot::config::ConfigFile;
use secopbot::prelude::*;
use secopbot::render;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Search SECOP II for water and wastewater infrastructure processes
#[derive(Parser, Debug)]
#[command(name = "secopbot")]
#[command(about = "Search SECOP II procurement processes by price, date and keyword")]
#[command(version)]
struct Args {
    /// Log retrieval progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch matching processes and print them
    Search {
        /// Earliest publication date (YYYY-MM-DD)
        #[arg(long = "start-date")]
        start_date: Option<String>,

        /// Latest publication date (YYYY-MM-DD)
        #[arg(long = "end-date")]
        end_date: Option<String>,

        /// Base price must be greater than this (default: 500000000)
        #[arg(long = "min-price")]
        min_price: Option<String>,

        /// Base price must be at most this (default: 20000000000)
        #[arg(long = "max-price")]
        max_price: Option<String>,

        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json", "rss", "html"])]
        format: String,

        /// Sort order by publication date: ASC or DESC
        #[arg(long, value_parser = ["ASC", "DESC"])]
        sort: Option<String>,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,

        /// YAML config file (default: ./secopbot.yml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Socrata application token (can also use SECOP_APP_TOKEN env var)
        #[arg(long)]
        token: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Deadline for the whole retrieval in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Fail when the API returns something other than a list of records
        #[arg(long)]
        strict: bool,
    },

    /// List the keywords process descriptions are matched against
    Keywords,
}

fn print_available_commands() {
    println!("Available commands:");
    println!("  search    Fetch matching processes and print them");
    println!("  keywords  List the keywords process descriptions are matched against");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config_file(path: Option<PathBuf>) -> anyhow::Result<ConfigFile> {
    match path {
        Some(path) => Ok(ConfigFile::load(&path)?),
        None => {
            let default_path = PathBuf::from("secopbot.yml");
            if default_path.exists() {
                Ok(ConfigFile::load(&default_path)?)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

async fn run_search_command(cmd: Command) -> anyhow::Result<()> {
    let Command::Search {
        start_date,
        end_date,
        min_price,
        max_price,
        format,
        sort,
        limit,
        config,
        token,
        timeout,
        deadline,
        strict,
    } = cmd
    else {
        unreachable!()
    };

    // Flags override the config file
    let mut builder = ConfigBuilder::from_file(load_config_file(config)?)?;
    if let Some(token) = token {
        builder = builder.app_token(token);
    }
    builder = builder.app_token_from_env();
    if let Some(sort) = sort {
        builder = builder.sort_order_str(&sort)?;
    }
    if let Some(limit) = limit {
        builder = builder.limit(limit);
    }
    if let Some(secs) = timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = deadline {
        builder = builder.deadline(Duration::from_secs(secs));
    }
    if strict {
        builder = builder.strict_responses(true);
    }
    let config = builder.build()?;

    let filters = SearchFilters::from_params(
        start_date.as_deref(),
        end_date.as_deref(),
        min_price.as_deref(),
        max_price.as_deref(),
    )?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let client = SocrataClient::new(&config)?;
    let retriever = Retriever::new(client, &config).with_cancellation(cancel);

    let records = retriever.fetch_matching_records(&filters).await?;
    let records = render::arrange(records, config.sort_order, config.limit);

    let output = render::render(&records, OutputFormat::from(format.as_str()), Utc::now())?;
    print!("{}", output);

    Ok(())
}

fn run_keywords_command() {
    for term in Vocabulary::default().terms() {
        println!("{}", term);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Some(cmd @ Command::Search { .. }) => run_search_command(cmd).await,
        Some(Command::Keywords) => {
            run_keywords_command();
            Ok(())
        }
        None => {
            print_available_commands();
            Ok(())
        }
    }
}
