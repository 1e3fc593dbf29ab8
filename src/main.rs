//! sitebook — website catalog backed by a persisted record store
//!
//! Usage:
//!   sitebook serve  --config sitebook.toml          # import once, then serve the HTTP API
//!   sitebook import --config sitebook.toml --force  # (re)load the CSV source
//!   sitebook list   --config sitebook.toml --search news
//!   sitebook add    --config sitebook.toml --website-name ... --rating 4
//!   sitebook update --config sitebook.toml <ID> --category Media
//!   sitebook delete --config sitebook.toml <ID>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use parking_lot::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sitebook::api::{self, AppState};
use sitebook::config::Config;
use sitebook::record::{Record, RecordDraft, RecordPatch, FIELD_NAMES};
use sitebook::source;
use sitebook::store::RecordStore;

#[derive(Parser)]
#[command(name = "sitebook", about = "Website catalog with persistent storage", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import the source if the store is empty, then serve the HTTP API.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
    },
    /// Load the CSV source into the store.
    Import {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        /// Replace an already populated store.
        #[arg(long)]
        force: bool,
    },
    /// Print stored websites as a table.
    List {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        /// Only show websites whose name contains this text (any case).
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Print a single website.
    Show {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        id: Uuid,
    },
    /// Add a website.
    Add {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Change fields of a website; omitted fields keep their value.
    Update {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        id: Uuid,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Remove a website.
    Delete {
        #[arg(short, long, default_value = "sitebook.toml")]
        config: PathBuf,
        id: Uuid,
    },
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    website_name: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    country: String,
    #[arg(long)]
    launch_year: String,
    #[arg(long)]
    monthly_visitors: String,
    #[arg(long)]
    user_name: String,
    #[arg(long)]
    comment: String,
    #[arg(long)]
    feedback: String,
    /// Rating from 1 to 5.
    #[arg(long)]
    rating: String,
}

impl From<DraftArgs> for RecordDraft {
    fn from(a: DraftArgs) -> Self {
        RecordDraft {
            website_name: a.website_name,
            category: a.category,
            country: a.country,
            launch_year: a.launch_year,
            monthly_visitors: a.monthly_visitors,
            user_name: a.user_name,
            comment: a.comment,
            feedback: a.feedback,
            rating: a.rating,
        }
    }
}

#[derive(Args)]
struct PatchArgs {
    #[arg(long)]
    website_name: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    launch_year: Option<String>,
    #[arg(long)]
    monthly_visitors: Option<String>,
    #[arg(long)]
    user_name: Option<String>,
    #[arg(long)]
    comment: Option<String>,
    #[arg(long)]
    feedback: Option<String>,
    #[arg(long)]
    rating: Option<String>,
}

impl From<PatchArgs> for RecordPatch {
    fn from(a: PatchArgs) -> Self {
        RecordPatch {
            website_name: a.website_name,
            category: a.category,
            country: a.country,
            launch_year: a.launch_year,
            monthly_visitors: a.monthly_visitors,
            user_name: a.user_name,
            comment: a.comment,
            feedback: a.feedback,
            rating: a.rating,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve { config } => run_serve(&config).await,
        Command::Import { config, force } => run_import(&config, force).await,
        Command::List { config, search } => run_list(&config, search.as_deref()),
        Command::Show { config, id } => run_show(&config, id),
        Command::Add { config, draft } => run_add(&config, draft.into()),
        Command::Update { config, id, patch } => run_update(&config, id, patch.into()),
        Command::Delete { config, id } => run_delete(&config, id),
    };

    if let Err(e) = result {
        error!(error = %format!("{e:#}"), "Command failed");
        std::process::exit(1);
    }
}

fn open(config_path: &Path) -> anyhow::Result<(Config, RecordStore)> {
    let cfg = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let store = RecordStore::open(&cfg.storage).context("opening storage")?;
    Ok((cfg, store))
}

async fn import(cfg: &Config, store: &mut RecordStore, force: bool) -> anyhow::Result<()> {
    if !force && store.is_seeded()? {
        info!(records = store.len(), "Using persisted websites");
        return Ok(());
    }
    let data = source::fetch(&cfg.source.path).await?;
    if let Some(count) = store.seed(&data, force)? {
        info!(records = count, source = ?cfg.source.path, "Websites imported");
    }
    Ok(())
}

async fn run_serve(config_path: &Path) -> anyhow::Result<()> {
    let (cfg, mut store) = open(config_path)?;
    import(&cfg, &mut store, false).await?;

    if !cfg.api.enabled {
        warn!("HTTP API disabled in config, nothing to serve");
        return Ok(());
    }

    info!(
        port = cfg.api.port,
        storage = ?cfg.storage.dir,
        key = cfg.storage.key,
        static_dir = ?cfg.api.static_dir,
        "Starting sitebook"
    );

    let port = cfg.api.port;
    let state = Arc::new(AppState { store: RwLock::new(store), config: cfg });

    tokio::select! {
        _ = api::start_server(state, port) => {}
        res = tokio::signal::ctrl_c() => {
            match res {
                Ok(()) => info!("Received CTRL+C, shutting down…"),
                Err(e) => error!(error = %e, "Signal error"),
            }
        }
    }
    Ok(())
}

async fn run_import(config_path: &Path, force: bool) -> anyhow::Result<()> {
    let (cfg, mut store) = open(config_path)?;
    import(&cfg, &mut store, force).await?;
    println!("{} websites stored under key '{}'", store.len(), store.key());
    Ok(())
}

fn run_list(config_path: &Path, search: Option<&str>) -> anyhow::Result<()> {
    let (_cfg, store) = open(config_path)?;
    let records = match search {
        Some(term) => store.search(term),
        None => store.load(),
    };
    print_table(&records);
    Ok(())
}

fn run_show(config_path: &Path, id: Uuid) -> anyhow::Result<()> {
    let (_cfg, store) = open(config_path)?;
    let record = store
        .get(id)
        .with_context(|| format!("no website with id {id}"))?;
    println!("{:<17}: {}", "id", record.id);
    for (name, value) in FIELD_NAMES.iter().zip(record.columns()) {
        println!("{name:<17}: {value}");
    }
    Ok(())
}

fn run_add(config_path: &Path, draft: RecordDraft) -> anyhow::Result<()> {
    let (_cfg, mut store) = open(config_path)?;
    let record = store.insert(draft)?;
    println!("Added {} ({})", record.website_name, record.id);
    Ok(())
}

fn run_update(config_path: &Path, id: Uuid, patch: RecordPatch) -> anyhow::Result<()> {
    let (_cfg, mut store) = open(config_path)?;
    match store.update(id, patch)? {
        Some(record) => println!("Updated {} ({})", record.website_name, record.id),
        None => println!("No website with id {id}"),
    }
    Ok(())
}

fn run_delete(config_path: &Path, id: Uuid) -> anyhow::Result<()> {
    let (_cfg, mut store) = open(config_path)?;
    if store.delete(id)? {
        println!("Deleted {id}");
    } else {
        println!("No website with id {id}");
    }
    Ok(())
}

fn print_table(records: &[Record]) {
    let mut widths: Vec<usize> = FIELD_NAMES.iter().map(|n| n.len()).collect();
    for r in records {
        for (w, v) in widths.iter_mut().zip(r.columns()) {
            *w = (*w).max(v.chars().count());
        }
    }

    println!("{:<36} | {}", "id", format_row(FIELD_NAMES, &widths));
    for r in records {
        println!("{} | {}", r.id, format_row(r.columns(), &widths));
    }
    println!("({} websites)", records.len());
}

fn format_row(cells: [&str; 10], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
