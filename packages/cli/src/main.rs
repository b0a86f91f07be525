#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal entry point for the careboard dashboard.
//!
//! Subcommands mirror the dashboard views: `catalog` lists the diseases
//! a corpus knows, `charts` renders the categorized occurrence view with
//! its prevalence companion, and `trends` renders occurrences over time.
//! Every filter is a flag, and `--export` snapshots the rendered
//! datasets as JSON documents.

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use careboard_api::ApiRequest;
use careboard_client::config::ClientConfig;
use careboard_client::dashboard::{Dashboard, RefreshReport, ViewKind};
use careboard_client::http::HttpTransport;
use careboard_client::{ApiTransport, payload};
use careboard_models::{
    CATEGORIZED_SHORTLIST, Category, ChartRow, DataSource, DiseaseSelection, FilterState,
    SampleWindow, SortOrder, TEMPORAL_SHORTLIST, TimeBucket,
};
use careboard_prefs::{FileStore, KeyValueStore, MemoryStore, OnboardingGate};
use clap::{Args, Parser, Subcommand};

/// Overrides where the preferences file lives.
const ENV_PREFS_PATH: &str = "CAREBOARD_PREFS";

#[derive(Parser)]
#[command(name = "careboard_cli", about = "Disease occurrence dashboard")]
struct Cli {
    /// Base URL of the careboard API (overrides config file and environment)
    #[arg(long)]
    api: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the diseases a data source knows about
    Catalog {
        /// Corpus to list (arxiv, github, wikipedia, stackexchange, pile)
        #[arg(long, default_value = "arxiv")]
        data_source: DataSource,
    },
    /// Render the categorized occurrence view
    Charts {
        #[command(flatten)]
        filters: ChartArgs,

        /// Directory to write JSON snapshots of the rendered datasets into
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Render occurrence trends over time
    Trends {
        #[command(flatten)]
        filters: TrendArgs,

        /// Directory to write a JSON snapshot of the rendered dataset into
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

/// Filters for the categorized view.
#[derive(Args)]
struct ChartArgs {
    /// Demographic breakdown (total, gender, racial, drug, time)
    #[arg(long, default_value = "gender")]
    category: Category,

    /// Sample window the counts are drawn from
    #[arg(long, default_value = "window_250")]
    window: SampleWindow,

    /// Corpus to query
    #[arg(long, default_value = "arxiv")]
    data_source: DataSource,

    /// Comma-separated disease names, matched verbatim; omitted, the
    /// catalog seeds a shortlist
    #[arg(long)]
    diseases: Option<String>,

    /// Column to sort by; defaults to the category's key column
    #[arg(long)]
    sort_key: Option<String>,

    /// Sort direction (asc, desc)
    #[arg(long, default_value = "asc")]
    sort_order: SortOrder,

    /// Page to fetch (1-based)
    #[arg(long, default_value = "1")]
    page: u32,

    /// Rows per page
    #[arg(long, default_value = "10")]
    per_page: u32,
}

impl ChartArgs {
    fn to_filters(&self) -> FilterState {
        let mut filters = FilterState::categorized();
        filters.category = self.category;
        filters.window = self.window;
        filters.data_source = self.data_source;
        filters.sort_order = self.sort_order;
        filters.page = self.page;
        filters.page_size = self.per_page;
        filters.sort_key = self
            .sort_key
            .clone()
            .unwrap_or_else(|| self.category.key_column().as_str().to_string());
        filters
    }
}

/// Filters for the trends view.
#[derive(Args)]
struct TrendArgs {
    /// Corpus to query
    #[arg(long, default_value = "arxiv")]
    data_source: DataSource,

    /// Comma-separated disease names, matched verbatim; omitted, the
    /// catalog seeds a shortlist
    #[arg(long)]
    diseases: Option<String>,

    /// Bucket size for the time axis (monthly, yearly, five_yearly)
    #[arg(long, default_value = "yearly")]
    time_option: TimeBucket,

    /// First year included
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year included
    #[arg(long)]
    end_year: Option<i32>,
}

impl TrendArgs {
    fn to_filters(&self) -> FilterState {
        let mut filters = FilterState::temporal();
        filters.data_source = self.data_source;
        filters.time_bucket = self.time_option;
        if let Some(year) = self.start_year {
            filters.year_start = year;
        }
        if let Some(year) = self.end_year {
            filters.year_end = year;
        }
        filters
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = ClientConfig::resolve(cli.api.as_deref(), cli.config.as_deref())?;
    let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(&config));

    first_run_hint();

    match cli.command {
        Commands::Catalog { data_source } => {
            let request = ApiRequest::disease_names(data_source);
            let names = payload::parse_names(transport.get_json(&request).await?)?;
            render::catalog(&names);
        }
        Commands::Charts { filters, export } => {
            let mut dashboard = Dashboard::with_filters(
                transport,
                ViewKind::Categorized,
                filters.to_filters(),
                CATEGORIZED_SHORTLIST,
            )?;
            let report = dashboard.initialize().await;
            note_failures(&report);

            if let Some(raw) = filters.diseases.as_deref() {
                // An explicit selection replaces whatever the catalog seeded.
                let mut next = dashboard.filters().clone();
                next.selection = DiseaseSelection::explicit(raw);
                let report = dashboard.update_filters(next).await?;
                note_failures(&report);
            }

            render::dataset("Occurrences", filters.category, dashboard.primary_dataset());
            let secondary = dashboard.secondary_dataset();
            render::dataset("Prevalence", filters.category, &secondary);

            if let Some(dir) = export.as_deref() {
                export_dataset(dashboard.primary_dataset(), "chart data", dir)?;
                export_dataset(&secondary, "additional chart data", dir)?;
            }
        }
        Commands::Trends { filters, export } => {
            let mut dashboard = Dashboard::with_filters(
                transport,
                ViewKind::Temporal,
                filters.to_filters(),
                TEMPORAL_SHORTLIST,
            )?;
            let report = dashboard.initialize().await;
            note_failures(&report);

            if let Some(raw) = filters.diseases.as_deref() {
                let mut next = dashboard.filters().clone();
                next.selection = DiseaseSelection::explicit(raw);
                let report = dashboard.update_filters(next).await?;
                note_failures(&report);
            }

            render::dataset("Trends", Category::Time, dashboard.temporal_dataset());

            if let Some(dir) = export.as_deref() {
                export_dataset(dashboard.temporal_dataset(), "temporal chart data", dir)?;
            }
        }
    }

    Ok(())
}

fn note_failures(report: &RefreshReport) {
    if !report.is_clean() {
        log::warn!(
            "{} of the planned queries failed; affected datasets keep their last value",
            report.failures.len()
        );
    }
}

fn export_dataset(
    rows: &[ChartRow],
    label: &str,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    careboard_export::serialize(rows, label)?.write_to(dir)?;
    Ok(())
}

/// Prints a short orientation block the first time the tool runs.
fn first_run_hint() {
    let store: Arc<dyn KeyValueStore> = match FileStore::open(prefs_path()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::warn!("Preferences unavailable: {e}");
            Arc::new(MemoryStore::new())
        }
    };

    let gate = OnboardingGate::new(store);
    if gate.should_show() {
        println!("Welcome to careboard. Every filter is a flag; start with:");
        println!("  careboard_cli charts --category gender");
        println!("  careboard_cli trends --time-option yearly");
        println!();
        gate.mark_shown();
    }
}

fn prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_PREFS_PATH)
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.is_empty()
    {
        return Path::new(&home).join(".careboard").join("prefs.json");
    }
    std::env::temp_dir().join("careboard_prefs.json")
}
