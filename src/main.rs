//! Contact Digest - CRM contacts to public dashboard datasets
//!
//! A CLI tool that downloads every contact from the CRM, drops personal
//! data and writes aggregate counts to one static JSON file.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (missing credential, fetch failure, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use error::PipelineError;
use fetch::{HttpPageSource, HttpSourceConfig, PaginatedFetcher};
use models::OutputDocument;
use pipeline::PipelineRunner;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Contact Digest v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Arguments: output={:?} config={:?} dry_run={} show={}",
        args.output, args.config, args.dry_run, args.show
    );

    let result = if args.show {
        handle_show(&args)
    } else {
        // The credential is checked before anything else is touched.
        let api_key = match args.require_api_key() {
            Ok(key) => key,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        run_digest(&args, api_key).await
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Fetch, aggregate and write (or print, with --dry-run) the datasets.
async fn run_digest(args: &Args, api_key: String) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);

    info!("CRM: {}", config.source.api_url);
    info!(
        "Page size: {}, retries: {}, backoff unit: {}ms",
        config.source.page_size, config.retry.max_retries, config.retry.base_delay_ms
    );

    let source = HttpPageSource::new(HttpSourceConfig {
        api_url: config.source.api_url.clone(),
        api_key,
        timeout_seconds: config.source.timeout_seconds,
    })
    .context("Failed to create HTTP client")?;

    let fetcher = PaginatedFetcher::new(source)
        .with_page_size(config.source.page_size)
        .with_retry(config.retry_policy())
        .with_progress(!args.quiet);

    let runner = PipelineRunner::new(fetcher, config.dataset_options(), config.output_options());

    if args.dry_run {
        let document = runner.collect().await?;
        println!("{}", report::generate_json(&document, config.output.pretty)?);
        return Ok(());
    }

    let document = match runner.run().await {
        Ok(document) => document,
        Err(PipelineError::Fetch(e)) if e.is_transient_exhausted() => {
            warn!("The CRM kept rate-limiting or failing; retry later or raise --max-retries");
            return Err(PipelineError::Fetch(e).into());
        }
        Err(e) => return Err(e.into()),
    };

    if !args.quiet {
        print_summary(&document);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Datasets written to: {}",
            config.output.path.display()
        );
    }

    Ok(())
}

/// Handle --show: render the existing artifact without contacting the CRM.
fn handle_show(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);

    match report::load_document(&config.output.path)? {
        Some(document) => print!("{}", report::render_dashboard(&document, args.top)),
        None => println!(
            "No datasets generated yet at {}.",
            config.output.path.display()
        ),
    }

    Ok(())
}

fn print_summary(document: &OutputDocument) {
    let datasets = &document.datasets;
    println!("\n📊 Digest Summary:");
    println!("   Contacts: {}", document.totals.contacts);
    println!(
        "   Lists: {} ({} memberships)",
        datasets.per_lista_ids.len(),
        datasets.per_lista_ids.total()
    );
    println!("   Institutions: {}", datasets.distribuzione_atenei.len());
    println!("   Courses: {}", datasets.distribuzione_corsi.len());
    println!("   Birth years: {}", datasets.distribuzione_anno_nascita.len());
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    Config::resolve(args.config.as_deref(), Path::new(CONFIG_FILE_NAME))
}
