//! COTDash CLI: option cascade, report rendering, drill-down and cache management.
//!
//! Commands:
//! - `options` - walk the product / regulation / report type / source cascade
//! - `render` - build one report and print it as text, HTML or JSON
//! - `drill` - print the aligned history behind one report cell as CSV
//! - `fetch` - load every series of a report into the cache
//! - `cache status` / `cache clear` - inspect or empty the series cache

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cotdash_core::data::{
    warm_cache, HttpFetcher, SeriesCache, SeriesFetcher, SeriesStore, StdoutProgress, SyntheticFetcher,
};
use cotdash_core::render::{to_html, to_text};
use cotdash_core::{ReferenceData, RenderOptions, ReportSelection};
use cotdash_report::{Dashboard, DashboardConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cotdash", about = "COTDash - commitment of traders positioning reports")]
struct Cli {
    /// Path to a TOML config file. Defaults to the user config dir, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured cache directory.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the next level of the selection cascade.
    Options {
        #[arg(long)]
        product: Option<String>,

        #[arg(long)]
        regulation: Option<String>,

        #[arg(long)]
        report_type: Option<String>,
    },
    /// Build a report and print it.
    Render {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        source: SourceArgs,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Hide the row-index columns.
        #[arg(long, default_value_t = false)]
        no_index: bool,
    },
    /// Print the aligned series behind one report cell as CSV.
    Drill {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        source: SourceArgs,

        /// Cell descriptor, as emitted in the `id` of an HTML cell or the JSON grid.
        #[arg(long)]
        cell: String,
    },
    /// Load every series of a report into the cache.
    Fetch {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Generate deterministic synthetic series instead of querying the server.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached identifiers and their date ranges.
    Status,
    /// Remove every cached series.
    Clear {
        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    product: String,

    #[arg(long)]
    regulation: String,

    /// Omit for regulations without a report-type split.
    #[arg(long)]
    report_type: Option<String>,

    /// Reporting source (exchange).
    #[arg(long)]
    source: String,
}

impl SelectionArgs {
    fn to_selection(&self) -> ReportSelection {
        ReportSelection {
            product: self.product.clone(),
            regulation: self.regulation.clone(),
            report_type: self.report_type.clone(),
            source: self.source.clone(),
        }
    }
}

#[derive(Args)]
struct SourceArgs {
    /// Offline mode: read the cache only, no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Fill cache misses with deterministic synthetic series.
    #[arg(long, default_value_t = false, conflicts_with = "offline")]
    synthetic: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }

    match cli.command {
        Commands::Options {
            product,
            regulation,
            report_type,
        } => run_options(&config, product.as_deref(), regulation.as_deref(), report_type.as_deref()),
        Commands::Render {
            selection,
            source,
            format,
            no_index,
        } => run_render(&config, &selection.to_selection(), &source, format, !no_index),
        Commands::Drill { selection, source, cell } => run_drill(&config, &selection.to_selection(), &source, &cell),
        Commands::Fetch { selection, synthetic } => run_fetch(&config, &selection.to_selection(), synthetic),
        Commands::Cache { action } => match action {
            CacheAction::Status => run_cache_status(&config.cache_dir),
            CacheAction::Clear { confirm } => run_cache_clear(&config.cache_dir, confirm),
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<DashboardConfig> {
    if let Some(path) = explicit {
        return DashboardConfig::from_file(path).with_context(|| format!("loading config {}", path.display()));
    }
    let default_path = dirs::config_dir().map(|d| d.join("cotdash").join("config.toml"));
    match default_path {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "using user config");
            DashboardConfig::from_file(&path).with_context(|| format!("loading config {}", path.display()))
        }
        _ => Ok(DashboardConfig::default()),
    }
}

fn load_reference(config: &DashboardConfig) -> Result<Arc<ReferenceData>> {
    let reference = ReferenceData::from_csv_path(&config.reference_path, &config.ticker_column)
        .with_context(|| format!("loading reference data {}", config.reference_path.display()))?;
    if reference.is_empty() {
        bail!("reference data {} has no rows", config.reference_path.display());
    }
    Ok(Arc::new(reference))
}

fn build_store(config: &DashboardConfig, offline: bool, synthetic: bool) -> Result<Arc<SeriesStore>> {
    let cache = SeriesCache::new(&config.cache_dir);
    if offline {
        return Ok(Arc::new(SeriesStore::offline(cache)));
    }
    let fetcher: Arc<dyn SeriesFetcher> = if synthetic {
        Arc::new(SyntheticFetcher::default())
    } else {
        Arc::new(HttpFetcher::new(config.fetch.to_options())?)
    };
    Ok(Arc::new(SeriesStore::new(Some(cache), Some(fetcher))))
}

fn dashboard(config: &DashboardConfig, source: &SourceArgs) -> Result<Dashboard> {
    let reference = load_reference(config)?;
    let store = build_store(config, source.offline, source.synthetic)?;
    Ok(Dashboard::new(reference, store, config)?)
}

fn run_options(
    config: &DashboardConfig,
    product: Option<&str>,
    regulation: Option<&str>,
    report_type: Option<&str>,
) -> Result<()> {
    let reference = load_reference(config)?;

    let Some(product) = product else {
        println!("Products:");
        for option in reference.products() {
            println!("  {}", option.label());
        }
        return Ok(());
    };

    let Some(regulation) = regulation else {
        print_list("Regulations", &reference.regulations(product));
        return Ok(());
    };

    let report_types = reference.report_types(product, regulation);
    if report_type.is_none() && !report_types.is_empty() {
        print_list("Report types", &report_types);
        return Ok(());
    }
    if report_types.is_empty() {
        println!("Report types:\n  <none>");
    }

    print_list("Sources", &reference.sources(product, regulation, report_type));
    Ok(())
}

fn print_list(title: &str, values: &[String]) {
    println!("{title}:");
    if values.is_empty() {
        println!("  <none>");
    }
    for value in values {
        println!("  {value}");
    }
}

fn run_render(
    config: &DashboardConfig,
    selection: &ReportSelection,
    source: &SourceArgs,
    format: OutputFormat,
    index: bool,
) -> Result<()> {
    let dash = dashboard(config, source)?;
    let report = dash.build_report(selection, &RenderOptions { index })?;

    if report.is_empty() {
        eprintln!("Selection matched no reference rows.");
        return Ok(());
    }

    match format {
        OutputFormat::Text => print!("{}", to_text(&report.grid)),
        OutputFormat::Html => println!("{}", to_html(&report.grid)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.grid)?),
    }

    if !report.downgraded.is_empty() {
        eprintln!();
        eprintln!("{} series unavailable:", report.downgraded.len());
        for (id, err) in &report.downgraded {
            eprintln!("  {id}: {err}");
        }
    }
    eprintln!("Built in {} ms", report.elapsed.as_millis());
    Ok(())
}

fn run_drill(config: &DashboardConfig, selection: &ReportSelection, source: &SourceArgs, cell: &str) -> Result<()> {
    let dash = dashboard(config, source)?;
    let Some(dd) = dash.drill_down_key(selection, cell)? else {
        eprintln!("Nothing to plot for this cell.");
        return Ok(());
    };

    eprintln!("{} ({})", dd.title, dd.value_axis);
    print!("{}", dd.series.to_csv()?);
    Ok(())
}

fn run_fetch(config: &DashboardConfig, selection: &ReportSelection, synthetic: bool) -> Result<()> {
    let reference = load_reference(config)?;
    let store = build_store(config, false, synthetic)?;
    let dash = Dashboard::new(reference, store, config)?;

    let identifiers = dash.identifiers(selection);
    if identifiers.is_empty() {
        bail!("selection matched no identifiers");
    }

    let summary = warm_cache(dash.store(), &identifiers, &StdoutProgress);
    if !summary.all_succeeded() {
        eprintln!("Failed identifiers:");
        for (id, err) in &summary.errors {
            eprintln!("  {id}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = SeriesCache::new(cache_dir);
    let statuses = cache.status(&cache.cached_identifiers());

    println!("Cache: {}", cache_dir.display());
    println!("Series: {}", statuses.len());
    println!();
    println!("{:<24} {:<25} {:>8}", "Identifier", "Date Range", "Points");
    println!("{}", "-".repeat(59));
    for status in &statuses {
        let range = match (status.start_date, status.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "?".to_string(),
        };
        let points = status.point_count.map_or_else(|| "?".to_string(), |n| n.to_string());
        println!("{:<24} {:<25} {:>8}", status.identifier.as_str(), range, points);
    }
    Ok(())
}

fn run_cache_clear(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = SeriesCache::new(cache_dir);
    let cached = cache.cached_identifiers();
    if cached.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }

    println!("Found {} cached series in {}", cached.len(), cache_dir.display());
    if !confirm {
        println!();
        println!("Dry run, pass --confirm to actually delete.");
        return Ok(());
    }

    let removed = cache.clear()?;
    println!("Done. Removed {removed} file(s).");
    Ok(())
}
