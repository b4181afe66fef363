//! Applies approved corrections to files and the catalog
//!
//! Per action, in submission order:
//! 1. the file must exist, else the action fails with no backup
//! 2. timestamped backup before any mutation; a failed backup aborts the action
//! 3. tags written through the [`TagWriter`]
//! 4. optional rename in place or move into `root/Artist/Album/`
//! 5. catalog record updated (one write per song); if that fails after a
//!    rename or move, the file goes back to the path the catalog still holds
//! 6. optional cover art fetch; failures are logged and skipped
//!
//! Per-item failures never stop the batch.

use crate::db::songs::SongCatalog;
use crate::events::{WorkflowEvent, WorkflowEventBus};
use crate::models::{
    ActionType, ApplyReport, CorrectionAction, CorrectionResult, PreviewEntry, SongUpdate,
};
use crate::services::backup_store::BackupStore;
use crate::services::cover_art::CoverArtProvider;
use crate::services::file_organizer::{
    organized_target, relocate, rename_in_place, rename_target_name,
};
use crate::services::tag_writer::{TagUpdate, TagWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct CorrectionApplier {
    catalog: Arc<dyn SongCatalog>,
    tag_writer: Arc<dyn TagWriter>,
    backups: BackupStore,
    library_root: PathBuf,
    cover_art: Option<Arc<dyn CoverArtProvider>>,
    event_bus: Option<WorkflowEventBus>,
}

/// One approved entry, resolved against the catalog
enum Planned {
    /// Action plus the release MBID hint for cover art
    Action(CorrectionAction, Option<String>),
    /// Entry that cannot be applied; its failure is already known
    Rejected(CorrectionResult),
}

/// Outcome of one action plus whether a cover became available
struct ActionOutcome {
    result: CorrectionResult,
    backup_created: bool,
    cover_available: bool,
}

impl CorrectionApplier {
    pub fn new(
        catalog: Arc<dyn SongCatalog>,
        tag_writer: Arc<dyn TagWriter>,
        backups: BackupStore,
        library_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            tag_writer,
            backups,
            library_root: library_root.into(),
            cover_art: None,
            event_bus: None,
        }
    }

    pub fn with_cover_art(mut self, provider: Arc<dyn CoverArtProvider>) -> Self {
        self.cover_art = Some(provider);
        self
    }

    pub fn with_event_bus(mut self, event_bus: WorkflowEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build actions from approved preview entries and apply them
    ///
    /// File paths come from the catalog; an entry whose song is gone fails
    /// without touching anything. Results keep the order of `approved`.
    pub async fn apply_entries(
        &self,
        approved: &[PreviewEntry],
        action_type: ActionType,
        download_covers: bool,
        cancel: &CancellationToken,
    ) -> ApplyReport {
        let mut planned = Vec::with_capacity(approved.len());

        for entry in approved {
            let item = match self.catalog.get_song_by_id(entry.song_id).await {
                Ok(Some(song)) => Planned::Action(
                    CorrectionAction::from_preview(entry, &song.file_path, action_type),
                    entry.release_id.clone(),
                ),
                Ok(None) => Planned::Rejected(CorrectionResult::failure(
                    entry.song_id,
                    "Song not found in catalog",
                    None,
                )),
                Err(e) => Planned::Rejected(CorrectionResult::failure(
                    entry.song_id,
                    format!("Catalog read failed: {}", e),
                    None,
                )),
            };
            planned.push(item);
        }

        self.apply_planned(planned, download_covers, cancel).await
    }

    /// Apply actions in order
    pub async fn apply(
        &self,
        actions: Vec<CorrectionAction>,
        download_covers: bool,
        cancel: &CancellationToken,
    ) -> ApplyReport {
        let planned = actions
            .into_iter()
            .map(|a| Planned::Action(a, None))
            .collect();
        self.apply_planned(planned, download_covers, cancel).await
    }

    async fn apply_planned(
        &self,
        planned: Vec<Planned>,
        download_covers: bool,
        cancel: &CancellationToken,
    ) -> ApplyReport {
        let total = planned.len();
        let mut report = ApplyReport::default();

        info!(total, download_covers, "Applying corrections");

        for (index, item) in planned.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.not_attempted = total - index;
                warn!(not_attempted = report.not_attempted, "Apply cancelled");
                break;
            }

            let outcome = match item {
                Planned::Action(mut action, release_hint) => {
                    self.apply_action(&mut action, release_hint.as_deref(), download_covers)
                        .await
                }
                Planned::Rejected(result) => {
                    error!(song_id = result.song_id, error = %result.message, "Correction rejected");
                    ActionOutcome {
                        result,
                        backup_created: false,
                        cover_available: false,
                    }
                }
            };

            if outcome.backup_created {
                report.backups_created += 1;
            }
            if outcome.cover_available {
                report.covers_downloaded += 1;
            }
            if outcome.result.file_touched {
                report.files_touched += 1;
            }
            if outcome.result.catalog_updated {
                report.catalog_updates += 1;
            }
            if outcome.result.success {
                report.corrections_applied += 1;
            } else {
                report.errors.push(format!(
                    "song {}: {}",
                    outcome.result.song_id, outcome.result.message
                ));
            }
            report.results.push(outcome.result);

            self.emit(WorkflowEvent::ApplyProgress {
                percentage: ((index + 1) * 100 / total.max(1)) as u8,
                message: format!("Applied {}/{}", index + 1, total),
            });
        }

        info!(
            applied = report.corrections_applied,
            failed = report.failed(),
            backups = report.backups_created,
            "Apply finished"
        );

        self.emit(WorkflowEvent::ApplyCompleted {
            report: Arc::new(report.clone()),
        });
        report
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }

    async fn apply_action(
        &self,
        action: &mut CorrectionAction,
        release_hint: Option<&str>,
        download_covers: bool,
    ) -> ActionOutcome {
        let song_id = action.song_id;
        let fail = |message: String, backup: Option<PathBuf>, file_touched: bool| {
            error!(song_id, error = %message, "Correction failed");
            let mut result = CorrectionResult::failure(song_id, message, backup.clone());
            result.file_touched = file_touched;
            ActionOutcome {
                result,
                backup_created: backup.is_some(),
                cover_available: false,
            }
        };

        if !action.file_path.exists() {
            return fail(
                format!("File not found: {}", action.file_path.display()),
                None,
                false,
            );
        }

        let backup_path = match self.backups.backup(&action.file_path).await {
            Ok(path) => path,
            Err(e) => return fail(format!("Backup failed: {}", e), None, false),
        };
        action.backup_path = Some(backup_path.clone());

        let update = TagUpdate {
            title: action.new_title.clone(),
            artist: action.new_artist.clone(),
            album: action.new_album.clone(),
            year: action.new_year,
            genre: action.new_genre.clone(),
            track: action.new_track,
        };
        if let Err(e) = self.tag_writer.write_tags(&action.file_path, &update).await {
            return fail(format!("Tag write failed: {}", e), Some(backup_path), false);
        }

        let final_path = match action.action_type {
            ActionType::TagsOnly => action.file_path.clone(),
            ActionType::TagsRename => {
                let new_name = action.new_filename.clone().unwrap_or_else(|| {
                    rename_target_name(
                        action.new_artist.as_deref(),
                        action.new_title.as_deref(),
                        &action.file_path,
                    )
                });
                match rename_in_place(&action.file_path, &new_name).await {
                    Ok(path) => path,
                    Err(e) => return fail(format!("Rename failed: {}", e), Some(backup_path), true),
                }
            }
            ActionType::TagsOrganize => {
                let target = organized_target(
                    &self.library_root,
                    action.new_artist.as_deref(),
                    action.new_album.as_deref(),
                    action.new_title.as_deref(),
                    action.new_track,
                    &action.file_path,
                );
                match relocate(&action.file_path, &target).await {
                    Ok(path) => {
                        action.organized_path = Some(path.clone());
                        path
                    }
                    Err(e) => {
                        return fail(format!("Organize failed: {}", e), Some(backup_path), true)
                    }
                }
            }
        };

        let catalog_update = SongUpdate {
            title: action.new_title.clone(),
            artist: action.new_artist.clone(),
            album: action.new_album.clone(),
            year: action.new_year,
            file_path: (final_path != action.file_path).then(|| final_path.clone()),
        };
        if !catalog_update.is_empty() {
            if let Err(e) = self.catalog.update_song(song_id, &catalog_update).await {
                // The catalog still holds the old path: put the file back there
                let (message, left_at) = if final_path == action.file_path {
                    (format!("Catalog update failed: {}", e), final_path)
                } else {
                    match relocate(&final_path, &action.file_path).await {
                        Ok(restored) => {
                            action.organized_path = None;
                            (
                                format!("Catalog update failed: {}; file moved back", e),
                                restored,
                            )
                        }
                        Err(move_err) => (
                            format!(
                                "Catalog update failed: {}; file left at {}: {}",
                                e,
                                final_path.display(),
                                move_err
                            ),
                            final_path,
                        ),
                    }
                };
                let mut outcome = fail(message, Some(backup_path), true);
                outcome.result.final_path = Some(left_at);
                return outcome;
            }
        }

        let cover_available = if download_covers {
            self.fetch_cover(action, release_hint).await
        } else {
            false
        };

        info!(
            song_id,
            action = %action.action_type,
            path = %final_path.display(),
            "Correction applied"
        );

        ActionOutcome {
            result: CorrectionResult {
                song_id,
                success: true,
                message: format!("Applied {}", action.action_type),
                backup_path: Some(backup_path),
                final_path: Some(final_path),
                file_touched: true,
                catalog_updated: !catalog_update.is_empty(),
            },
            backup_created: true,
            cover_available,
        }
    }

    /// Best effort; never fails the action
    async fn fetch_cover(&self, action: &CorrectionAction, release_hint: Option<&str>) -> bool {
        let Some(provider) = &self.cover_art else {
            return false;
        };
        let (Some(artist), Some(album)) = (action.new_artist.as_deref(), action.new_album.as_deref())
        else {
            return false;
        };

        match provider.ensure_cover(artist, album, release_hint).await {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(song_id = action.song_id, error = %e, "Cover art fetch failed, skipping");
                false
            }
        }
    }
}
