//! plm-mr - Metadata Resolution command line
//!
//! Analyze, preview and apply metadata corrections for the song catalog
//! under the library root.
//!
//! Logs go to stderr; JSON results go to stdout (or `--output`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plm_mr::config::MrSettings;
use plm_mr::db::songs::{SongCatalog, SqliteCatalog};
use plm_mr::models::{ActionType, PipelineBundle, PipelineOptions, PreviewEntry, SongId};
use plm_mr::services::corruption_classifier::analyze_library;
use plm_mr::services::{
    build_sources, find_similar_songs, AcousticFallbackIdentifier, BackupStore, CorrectionApplier,
    CoverArtClient, LoftyTagWriter, MatchCache, MetadataResolver, WorkflowOrchestrator,
};
use plm_mr::{WorkflowEvent, WorkflowEventBus, EVENT_BUS_CAPACITY};

/// Command-line arguments for plm-mr
#[derive(Parser, Debug)]
#[command(name = "plm-mr")]
#[command(about = "Metadata resolution and correction for a music library")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library root folder
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the corruption report
    Analyze,

    /// Run the pipeline and write the preview bundle
    Preview {
        /// Songs to process (default: whole catalog)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<SongId>,

        /// Skip catalog resolution
        #[arg(long)]
        no_fetch: bool,

        /// Minimum match score, 0-100
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Write the bundle here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply approved entries from a preview bundle
    Apply {
        /// Bundle written by `preview`
        #[arg(long)]
        preview: PathBuf,

        /// Entries to apply (default: every entry with changes)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<SongId>,

        /// tags_only, tags_rename or tags_organize
        #[arg(long, default_value = "tags_only")]
        action: ActionType,

        /// Fetch album covers into the cover cache
        #[arg(long)]
        download_covers: bool,
    },

    /// List likely duplicate songs
    Duplicates {
        /// Minimum pair score, 0-1
        #[arg(long, default_value_t = 0.9)]
        min_score: f64,
    },

    /// Copy a backup back over a file
    Restore {
        #[arg(long)]
        backup: PathBuf,

        #[arg(long)]
        to: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = plm_common::config::load_or_default(cli.config.as_deref(), "plm-mr")
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "plm-mr {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root = plm_common::config::resolve_root_folder(cli.root.as_deref(), &toml_config);
    let settings = MrSettings::resolve(&toml_config, &root);
    info!("Library root: {}", settings.library_root.display());

    match cli.command {
        Command::Restore { backup, to } => restore(&settings, &backup, &to).await,
        command => run_catalog_command(&settings, command).await,
    }
}

/// Commands that need the catalog database
async fn run_catalog_command(settings: &MrSettings, command: Command) -> Result<()> {
    info!("Database: {}", settings.database_path.display());
    let pool = plm_mr::db::init_database_pool(&settings.database_path)
        .await
        .context("Failed to open catalog database")?;
    let catalog: Arc<dyn SongCatalog> = Arc::new(SqliteCatalog::new(pool));

    match command {
        Command::Analyze => {
            let songs = catalog.get_all_songs().await?;
            write_json(&analyze_library(&songs), None)
        }
        Command::Preview {
            ids,
            no_fetch,
            min_confidence,
            output,
        } => {
            let options = PipelineOptions {
                fetch_metadata: !no_fetch,
                min_confidence: min_confidence.unwrap_or(settings.min_confidence),
                download_covers: false,
            };
            let bundle = preview(settings, catalog, ids, options).await?;
            write_json(&bundle, output.as_deref())
        }
        Command::Apply {
            preview,
            ids,
            action,
            download_covers,
        } => apply(settings, catalog, &preview, &ids, action, download_covers).await,
        Command::Duplicates { min_score } => {
            let songs = catalog.get_all_songs().await?;
            write_json(&find_similar_songs(&songs, min_score), None)
        }
        Command::Restore { backup, to } => restore(settings, &backup, &to).await,
    }
}

async fn preview(
    settings: &MrSettings,
    catalog: Arc<dyn SongCatalog>,
    mut ids: Vec<SongId>,
    options: PipelineOptions,
) -> Result<PipelineBundle> {
    if ids.is_empty() {
        ids = catalog.get_all_songs().await?.iter().map(|s| s.id).collect();
    }

    let sources = build_sources(&settings.catalogs).context("Failed to build catalog clients")?;
    info!("Catalogs: {}", sources.len());
    let resolver = MetadataResolver::new(sources).with_cache(Arc::new(MatchCache::new()));
    let identifier = AcousticFallbackIdentifier::new(
        settings.fpcalc_path.as_deref(),
        settings.acoustid_api_key.clone(),
    );

    let event_bus = WorkflowEventBus::new(EVENT_BUS_CAPACITY);
    let events = tokio::spawn(log_events(event_bus.subscribe()));

    let orchestrator = WorkflowOrchestrator::new(catalog, Arc::new(resolver), event_bus)
        .with_identifier(Arc::new(identifier));
    let handle = orchestrator.start(ids, options);
    cancel_on_ctrl_c(handle.cancel_token());

    let bundle = handle.wait().await?;
    drop(orchestrator);
    let _ = events.await;
    Ok(bundle)
}

async fn apply(
    settings: &MrSettings,
    catalog: Arc<dyn SongCatalog>,
    preview_path: &Path,
    ids: &[SongId],
    action: ActionType,
    download_covers: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(preview_path)
        .with_context(|| format!("Failed to read {}", preview_path.display()))?;
    let bundle: PipelineBundle = serde_json::from_str(&content)
        .with_context(|| format!("Invalid preview bundle {}", preview_path.display()))?;

    let approved: Vec<PreviewEntry> = bundle
        .preview
        .into_iter()
        .filter(|entry| {
            if ids.is_empty() {
                entry.has_changes()
            } else {
                ids.contains(&entry.song_id)
            }
        })
        .collect();
    info!("Applying {} entries ({})", approved.len(), action);

    let event_bus = WorkflowEventBus::new(EVENT_BUS_CAPACITY);
    let events = tokio::spawn(log_events(event_bus.subscribe()));

    let mut applier = CorrectionApplier::new(
        catalog,
        Arc::new(LoftyTagWriter::new()),
        BackupStore::new(&settings.backup_dir),
        &settings.library_root,
    )
    .with_event_bus(event_bus);
    if download_covers {
        let covers = CoverArtClient::new(&settings.cover_cache_dir)
            .context("Failed to build cover art client")?;
        applier = applier.with_cover_art(Arc::new(covers));
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let report = applier
        .apply_entries(&approved, action, download_covers, &cancel)
        .await;
    drop(applier);
    let _ = events.await;
    write_json(&report, None)
}

async fn restore(settings: &MrSettings, backup: &Path, target: &Path) -> Result<()> {
    let store = BackupStore::new(&settings.backup_dir);
    store
        .restore(backup, target)
        .await
        .with_context(|| format!("Failed to restore {}", backup.display()))?;
    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling after the current song");
            cancel.cancel();
        }
    });
}

/// Log pipeline and Apply events until a terminal one arrives
async fn log_events(mut rx: Receiver<WorkflowEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                match &event {
                    WorkflowEvent::Progress {
                        percentage,
                        message,
                        ..
                    }
                    | WorkflowEvent::ApplyProgress {
                        percentage,
                        message,
                    } => info!("[{:>3}%] {}", percentage, message),
                    WorkflowEvent::StageCompleted {
                        stage_number,
                        summary,
                        ..
                    } => info!("Stage {} complete: {:?}", stage_number, summary),
                    WorkflowEvent::Failed { error, .. } => warn!("Pipeline failed: {}", error),
                    _ => {}
                }
                if event.is_terminal() || matches!(event, WorkflowEvent::ApplyCompleted { .. }) {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
