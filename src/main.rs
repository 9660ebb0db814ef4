use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use postal_catalog::{
    run_catalog_import, CatalogStore, HeaderPolicy, ImportConfig, ImportError, ImportOptions,
};

/// National postal-code catalog importer
#[derive(Parser, Debug)]
#[clap(name = "postal-catalog", version)]
#[clap(about = "Import the national postal-code catalog into the colony table")]
struct Cli {
    /// SQLite catalog database
    #[clap(long, global = true, env = "POSTAL_CATALOG_DB", value_name = "FILE")]
    db: Option<PathBuf>,

    /// TOML configuration file
    #[clap(long, global = true, env = "POSTAL_CATALOG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the pipe-delimited catalog file
    Import {
        /// Catalog TXT export (defaults to the configured source path)
        path: Option<PathBuf>,

        /// Rows per bulk write
        #[clap(long)]
        batch_size: Option<usize>,

        /// Delete every existing colony before importing
        #[clap(long)]
        truncate: bool,

        /// Skip the truncate confirmation prompt
        #[clap(long)]
        force: bool,

        /// Stop after N processed rows (0 = whole file)
        #[clap(long, value_name = "N")]
        limit: Option<u64>,

        /// Log every unresolved municipality
        #[clap(long, short)]
        verbose: bool,

        /// First-line handling when the file has no banner
        #[clap(long, value_enum)]
        header_policy: Option<HeaderPolicyArg>,
    },

    /// Insert the 32 federal entities
    SeedEntities,

    /// Load municipalities from a CSV file (id,state_code,name)
    SeedMunicipalities {
        csv: PathBuf,
    },

    /// Show recent import runs
    Runs {
        #[clap(long, default_value = "10")]
        last: usize,

        /// Show a single run in full
        #[clap(long, value_name = "RUN_ID", conflicts_with = "last")]
        id: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HeaderPolicyArg {
    /// Discard the first line only after a detected banner
    Banner,
    /// Always discard the first line
    Always,
}

impl From<HeaderPolicyArg> for HeaderPolicy {
    fn from(arg: HeaderPolicyArg) -> Self {
        match arg {
            HeaderPolicyArg::Banner => HeaderPolicy::SkipOnlyAfterBanner,
            HeaderPolicyArg::Always => HeaderPolicy::AlwaysSkipFirst,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The missing-file message already carries remediation steps
            if let Some(ImportError::SourceNotFound { .. }) = e.downcast_ref::<ImportError>() {
                eprintln!("❌ {}", e);
            } else {
                eprintln!("❌ {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ImportConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    match cli.command {
        Command::Import {
            path,
            batch_size,
            truncate,
            force,
            limit,
            verbose,
            header_policy,
        } => {
            if let Some(path) = path {
                config.source_path = path;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if let Some(limit) = limit {
                config.limit = limit;
            }
            if let Some(policy) = header_policy {
                config.header_policy = policy.into();
            }
            config.verbose |= verbose;
            config.validate()?;

            run_import(&config, truncate, force)
        }
        Command::SeedEntities => {
            let mut store = open_store(&config.database_path)?;
            let inserted = store.seed_federal_entities()?;
            println!("✓ Federal entities inserted: {}", inserted);
            Ok(())
        }
        Command::SeedMunicipalities { csv } => {
            let mut store = open_store(&config.database_path)?;
            let inserted = store
                .seed_municipalities_from_csv(&csv)
                .with_context(|| format!("Failed to seed municipalities from {}", csv.display()))?;
            println!("✓ Municipalities inserted: {}", inserted);
            Ok(())
        }
        Command::Runs { last, id } => {
            let store = open_store(&config.database_path)?;
            match id {
                Some(run_id) => print_run(&store, &run_id),
                None => print_runs(&store, last),
            }
        }
    }
}

fn open_store(path: &Path) -> Result<CatalogStore> {
    CatalogStore::open(path)
        .with_context(|| format!("Failed to open catalog database: {}", path.display()))
}

fn run_import(config: &ImportConfig, truncate: bool, force: bool) -> Result<()> {
    println!("📮 Postal Catalog Import v{}", postal_catalog::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Missing file aborts before the database is touched
    postal_catalog::importer::ensure_source(&config.source_path)?;

    if truncate && !force && !confirm_truncate()? {
        println!("Import cancelled, nothing was changed.");
        return Ok(());
    }

    println!("\n📂 Source: {}", config.source_path.display());
    println!("🗄️  Database: {}", config.database_path.display());
    println!("📦 Batch size: {}", config.batch_size);
    if config.limit > 0 {
        println!("🧪 Test mode: first {} rows only", config.limit);
    }

    let mut store = open_store(&config.database_path)?;
    let options = ImportOptions::from(config);
    let report = run_catalog_import(&mut store, &config.source_path, &options, truncate)?;

    if let Some(cleared) = report.cleared {
        println!("\n🧹 Removed {} existing colonies", cleared);
    }

    println!("\n{}", report.summary.render_table());
    println!("\n✓ Run id: {}", report.run.run_id);
    println!("✓ Total colonies in database: {}", report.total_colonies);

    Ok(())
}

fn confirm_truncate() -> Result<bool> {
    print!("⚠️  This deletes ALL existing colonies before importing. Type 'yes' to continue: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

fn print_runs(store: &CatalogStore, last: usize) -> Result<()> {
    let runs = store.recent_runs(last)?;
    if runs.is_empty() {
        println!("No import runs recorded yet.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:>9}  {:>9}  {:>7}  {:>7}",
        "Run", "Finished (UTC)", "Processed", "Imported", "Skipped", "Errors"
    );
    for run in runs {
        println!(
            "{:<36}  {:<20}  {:>9}  {:>9}  {:>7}  {:>7}",
            run.run_id,
            run.finished_at.format("%Y-%m-%d %H:%M:%S"),
            run.summary.processed,
            run.summary.imported,
            run.summary.skipped,
            run.summary.errors,
        );
    }
    Ok(())
}

fn print_run(store: &CatalogStore, run_id: &str) -> Result<()> {
    let run = store
        .find_run(run_id)?
        .with_context(|| format!("No import run with id {}", run_id))?;

    println!("📋 Import run {}", run.run_id);
    println!("   Source: {}", run.source_file);
    println!("   SHA-256: {}", run.source_sha256);
    println!("   Started: {}", run.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("   Finished: {}", run.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!("\n{}", run.summary.render_table());
    Ok(())
}
