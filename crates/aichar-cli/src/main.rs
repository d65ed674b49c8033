//! aichar: terminal browser for the AI character database.
//!
//! Loads a dataset, applies filters through the render scheduler and prints
//! the statistics table, the grouped listing, or the skipped entries.

mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aichar_core::defaults::{DATA_PATH, LOAD_ERROR_MESSAGE};
use aichar_core::{
    Dataset, FilterCategory, FilterConfiguration, FilterGroup, FilterScheme, ShuffleAxis, SortBy,
};
use aichar_data::{DatasetLoader, LoadPolicy, LoaderConfig};
use aichar_pipeline::{FilterMutation, RenderScheduler, SchedulerConfig, SchedulerHandle};

#[derive(Parser)]
#[command(name = "aichar")]
#[command(author, version, about = "Browse the AI character database")]
#[command(propagate_version = true)]
struct Cli {
    /// Dataset directory (with manifest.json), manifest file, or single document
    #[arg(long, env = "AICHAR_DATA_PATH", default_value = DATA_PATH, global = true)]
    data: PathBuf,

    /// What to do with unreadable manifest-listed files: strict or lenient
    #[arg(long, env = "AICHAR_LOAD_POLICY", default_value = "strict", global = true)]
    load_policy: LoadPolicy,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the benevolence × alignment statistics table
    Stats {
        #[command(flatten)]
        filters: FilterArgs,

        /// Include the N/A row and column
        #[arg(long)]
        show_na: bool,
    },

    /// Print the filtered listing grouped by work type
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print section titles only
        #[arg(long)]
        collapsed: bool,
    },

    /// Print the entries the curators skipped
    Skipped,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Filter scheme: multi or single
    #[arg(long, default_value = "multi")]
    scheme: FilterScheme,

    /// Rating that drives badges and group counts: benevolence or alignment
    #[arg(long, default_value = "benevolence")]
    sort_by: SortBy,

    /// Case-insensitive search over names, works, descriptions and years
    #[arg(long)]
    search: Option<String>,

    /// AI-qualification categories to show (pass,ambiguous,fail,na). Entries
    /// needing research stay visible unless --hide-unresearched is given
    #[arg(long, value_delimiter = ',')]
    qualification: Option<Vec<FilterCategory>>,

    /// Hide entries that still need research
    #[arg(long)]
    hide_unresearched: bool,

    /// Benevolence categories to show (benevolent,ambiguous,malevolent,na)
    #[arg(long, value_delimiter = ',')]
    benevolence: Option<Vec<FilterCategory>>,

    /// Alignment categories to show (aligned,ambiguous,misaligned,na)
    #[arg(long, value_delimiter = ',')]
    alignment: Option<Vec<FilterCategory>>,

    /// AI-qualification categories counted by the statistics table (pass,ambiguous,fail,na)
    #[arg(long, value_delimiter = ',')]
    totals: Option<Vec<FilterCategory>>,

    /// Shuffle entries within each work type
    #[arg(long)]
    shuffle_characters: bool,

    /// Shuffle the order of work types
    #[arg(long)]
    shuffle_work_types: bool,

    /// Seed for shuffles
    #[arg(long, env = "AICHAR_SEED")]
    seed: Option<u64>,
}

impl FilterArgs {
    /// Translate the arguments into scheduler mutations.
    fn mutations(&self) -> anyhow::Result<Vec<FilterMutation>> {
        let mut mutations = vec![FilterMutation::SetSortBy {
            sort_by: self.sort_by,
        }];

        let groups = [
            (FilterGroup::Qualification, &self.qualification),
            (FilterGroup::Benevolence, &self.benevolence),
            (FilterGroup::Alignment, &self.alignment),
            (FilterGroup::QualificationTotals, &self.totals),
        ];
        for (group, categories) in groups {
            let Some(categories) = categories else {
                continue;
            };
            match self.scheme {
                FilterScheme::MultiSelect => {
                    mutations.extend(concrete_categories(group).into_iter().map(|category| {
                        FilterMutation::SetCategory {
                            group,
                            category,
                            enabled: false,
                        }
                    }));
                }
                FilterScheme::SingleSelect if categories.len() > 1 => {
                    bail!("single-select accepts one category per group, got {categories:?}");
                }
                FilterScheme::SingleSelect => {}
            }
            mutations.extend(categories.iter().map(|&category| FilterMutation::SetCategory {
                group,
                category,
                enabled: true,
            }));
        }

        if self.hide_unresearched {
            mutations.push(FilterMutation::SetCategory {
                group: FilterGroup::Qualification,
                category: FilterCategory::Unresearched,
                enabled: false,
            });
        }
        if let Some(text) = &self.search {
            mutations.push(FilterMutation::SetSearch { text: text.clone() });
        }
        for (axis, enabled) in [
            (ShuffleAxis::Characters, self.shuffle_characters),
            (ShuffleAxis::WorkTypes, self.shuffle_work_types),
        ] {
            if enabled {
                mutations.push(FilterMutation::SetShuffle { axis, enabled });
            }
        }
        Ok(mutations)
    }
}

/// The rating categories of a group, leaving out `Any` and the unresearched
/// axis.
fn concrete_categories(group: FilterGroup) -> [FilterCategory; 4] {
    match group {
        FilterGroup::Qualification | FilterGroup::QualificationTotals => [
            FilterCategory::Pass,
            FilterCategory::Ambiguous,
            FilterCategory::Fail,
            FilterCategory::NotApplicable,
        ],
        FilterGroup::Benevolence => [
            FilterCategory::Benevolent,
            FilterCategory::Ambiguous,
            FilterCategory::Malevolent,
            FilterCategory::NotApplicable,
        ],
        FilterGroup::Alignment => [
            FilterCategory::Aligned,
            FilterCategory::Ambiguous,
            FilterCategory::Misaligned,
            FilterCategory::NotApplicable,
        ],
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let loader = DatasetLoader::new(
        LoaderConfig::from_env()
            .with_data_path(&cli.data)
            .with_policy(cli.load_policy),
    )
    .with_progress_callback(|p| {
        debug!(
            loaded = p.loaded,
            total = p.total,
            work_type = %p.label,
            progress = p.percentage(),
            "Loading dataset"
        );
    });

    let dataset = match loader.load().await {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            eprintln!("{LOAD_ERROR_MESSAGE}");
            return Err(e).with_context(|| format!("loading {}", cli.data.display()));
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Stats { filters, show_na } => {
            let handle = start_scheduler(dataset, &filters)?;
            handle.settled().await?;
            let config = handle.filters();
            let table = handle.statistics();
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &output::stats_json(&table, &config))?;
                writeln!(out)?;
            } else {
                output::write_stats(&mut out, &table, &config, show_na)?;
            }
            handle.shutdown().await?;
        }
        Commands::List { filters, collapsed } => {
            let handle = start_scheduler(dataset, &filters)?;
            let plan = handle
                .settled()
                .await?
                .context("scheduler finished without a plan")?;
            let mut plan = (*plan).clone();
            if collapsed {
                plan.collapse_all_sections();
            }
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &plan)?;
                writeln!(out)?;
            } else {
                output::write_plan(&mut out, &plan)?;
            }
            handle.shutdown().await?;
        }
        Commands::Skipped => {
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &dataset.skipped_entries)?;
                writeln!(out)?;
            } else {
                output::write_skipped(&mut out, &dataset.skipped_entries)?;
            }
        }
    }

    Ok(())
}

fn start_scheduler(dataset: Arc<Dataset>, args: &FilterArgs) -> anyhow::Result<SchedulerHandle> {
    let mut config = SchedulerConfig::from_env();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    info!(
        record_count = dataset.len(),
        scheme = ?args.scheme,
        "Starting render scheduler"
    );

    let handle = RenderScheduler::new(dataset, FilterConfiguration::for_scheme(args.scheme), config)
        .start();
    for mutation in args.mutations()? {
        handle.mutate(mutation)?;
    }
    Ok(handle)
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "aichar=info")
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aichar=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }

    debug!(log_format = %log_format, "Logging initialized");
}
