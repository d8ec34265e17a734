use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ideaflow_ideas::{rank, IngestOptions, ProblemLexicon, SortStrategy, TimeWindow};
use ideaflow_reddit::{RedditClient, RedditCredentials};

#[derive(Debug, Parser)]
#[command(name = "ideaflow-cli")]
#[command(about = "IdeaFlow command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingestion pass over the configured sources.
    Ingest {
        /// Override the configured source list (repeatable).
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Time window for top posts: hour, day, week, month, year, all.
        #[arg(long, default_value = "day")]
        window: String,
        /// Max posts fetched per source.
        #[arg(long)]
        limit: Option<u32>,
        /// Upvote floor below which posts are discarded.
        #[arg(long)]
        min_upvotes: Option<i64>,
    },
    /// List stored ideas, ranked.
    List {
        /// Case-insensitive category filter.
        #[arg(long)]
        category: Option<String>,
        /// Ranking strategy: trending, newest, pain, validation.
        #[arg(long, default_value = "trending")]
        sort: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ideaflow_core::load_app_config_from_env()?;

    let pool_config = ideaflow_db::PoolConfig::from_app_config(&config);
    let pool = ideaflow_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to database")?;
    ideaflow_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Ingest {
            sources,
            window,
            limit,
            min_upvotes,
        } => run_ingest(&config, &pool, sources, &window, limit, min_upvotes).await,
        Commands::List {
            category,
            sort,
            limit,
        } => run_list(&pool, category.as_deref(), &sort, limit).await,
    }
}

async fn run_ingest(
    config: &ideaflow_core::AppConfig,
    pool: &sqlx::PgPool,
    source_override: Vec<String>,
    window: &str,
    limit: Option<u32>,
    min_upvotes: Option<i64>,
) -> anyhow::Result<()> {
    let time_window: TimeWindow = window
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --window")?;

    let sources = if source_override.is_empty() {
        ideaflow_core::load_sources(&config.sources_path)?.sources
    } else {
        source_override
    };

    let client_id = config
        .reddit_client_id
        .clone()
        .context("REDDIT_CLIENT_ID is not set")?;
    let client_secret = config
        .reddit_client_secret
        .clone()
        .context("REDDIT_CLIENT_SECRET is not set")?;

    let credentials = RedditCredentials {
        client_id,
        client_secret,
        user_agent: config.reddit_user_agent.clone(),
    };

    let client = RedditClient::new(&credentials, config.fetch_request_timeout_secs)
        .await
        .context("failed to authenticate with Reddit")?
        .with_retry_policy(config.fetch_max_retries, config.fetch_retry_backoff_base_ms);

    let options = IngestOptions {
        time_window,
        post_limit: limit.unwrap_or(config.ingest_post_limit),
        min_upvotes: min_upvotes.unwrap_or(config.ingest_min_upvotes),
        inter_source_delay: Duration::from_millis(config.ingest_inter_source_delay_ms),
        ..IngestOptions::default()
    };

    let run = ideaflow_db::create_ingest_run(pool, "cli").await?;
    let store = ideaflow_db::PgIdeaStore::new(pool.clone());
    let lexicon = ProblemLexicon::default();

    tracing::info!(sources = sources.len(), window = %time_window, "starting ingestion run");

    match ideaflow_ideas::ingest(&client, &store, &lexicon, &sources, &options).await {
        Ok(report) => {
            ideaflow_db::record_source_reports(pool, run.id, &report.per_source).await?;
            let created = i32::try_from(report.created).unwrap_or(i32::MAX);
            ideaflow_db::complete_ingest_run(pool, run.id, created).await?;

            println!("{:<24} {:>6} {:>9}", "SOURCE", "FOUND", "INSERTED");
            for source in &report.per_source {
                match &source.error {
                    Some(error) => {
                        println!("{:<24} {:>6} {:>9}  error: {error}", source.source, "-", "-");
                    }
                    None => println!(
                        "{:<24} {:>6} {:>9}",
                        source.source, source.found, source.succeeded
                    ),
                }
            }
            println!("\ncreated {} ideas (run {})", report.created, run.public_id);
            Ok(())
        }
        Err(e) => {
            ideaflow_db::fail_ingest_run(pool, run.id, &e.to_string()).await?;
            Err(anyhow::Error::from(e).context("ingestion run failed"))
        }
    }
}

async fn run_list(
    pool: &sqlx::PgPool,
    category: Option<&str>,
    sort: &str,
    limit: usize,
) -> anyhow::Result<()> {
    // Pull a wide slice and rank in memory; the limit applies after the sort.
    const SCAN_CAP: i64 = 500;

    let strategy: SortStrategy = sort
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --sort")?;

    let mut rows = ideaflow_db::list_ideas(pool, category, SCAN_CAP).await?;
    rank(&mut rows, strategy);
    rows.truncate(limit);

    if rows.is_empty() {
        println!("no ideas stored");
        return Ok(());
    }

    println!(
        "{:<6} {:>4} {:>10} {:<12} PROBLEM",
        "PAIN", "VAL", "UPVOTES", "CATEGORY"
    );
    for row in &rows {
        println!(
            "{:<6} {:>4} {:>10} {:<12} {}",
            row.pain_score, row.validation_score, row.reddit_upvotes, row.category, row.problem
        );
    }

    Ok(())
}
