//! Correction actions and their results

use crate::models::{PreviewEntry, SongId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What Apply does beyond writing tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Write tags and update the catalog only
    #[default]
    TagsOnly,
    /// Also rename the file within its folder
    TagsRename,
    /// Also move the file into `root/Artist/Album/`
    TagsOrganize,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::TagsOnly => "tags_only",
            ActionType::TagsRename => "tags_rename",
            ActionType::TagsOrganize => "tags_organize",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tags_only" => Ok(ActionType::TagsOnly),
            "tags_rename" => Ok(ActionType::TagsRename),
            "tags_organize" => Ok(ActionType::TagsOrganize),
            other => Err(format!(
                "unknown action '{}', expected tags_only, tags_rename or tags_organize",
                other
            )),
        }
    }
}

/// One approved correction, built right before Apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAction {
    pub song_id: SongId,
    pub file_path: PathBuf,
    pub action_type: ActionType,
    pub new_artist: Option<String>,
    pub new_title: Option<String>,
    pub new_album: Option<String>,
    pub new_year: Option<i32>,
    pub new_genre: Option<String>,
    pub new_track: Option<u32>,
    /// Target file name for `tags_rename`
    pub new_filename: Option<String>,
    /// Final location for `tags_organize`, filled in during execution
    pub organized_path: Option<PathBuf>,
    /// Filled in during execution; the only undo mechanism
    pub backup_path: Option<PathBuf>,
}

impl CorrectionAction {
    /// Build an action from an approved preview entry
    ///
    /// Empty proposed album becomes `None` so an existing album tag is not
    /// blanked out.
    pub fn from_preview(entry: &PreviewEntry, file_path: &Path, action_type: ActionType) -> Self {
        let non_empty = |s: &str| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        let new_title = non_empty(&entry.proposed.title);
        let new_artist = non_empty(&entry.proposed.artist);

        let new_filename = match action_type {
            ActionType::TagsRename => Some(crate::services::file_organizer::rename_target_name(
                new_artist.as_deref(),
                new_title.as_deref(),
                file_path,
            )),
            _ => None,
        };

        Self {
            song_id: entry.song_id,
            file_path: file_path.to_path_buf(),
            action_type,
            new_artist,
            new_title,
            new_album: non_empty(&entry.proposed.album),
            new_year: entry.proposed.year,
            new_genre: None,
            new_track: None,
            new_filename,
            organized_path: None,
            backup_path: None,
        }
    }
}

/// Outcome of one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub song_id: SongId,
    pub success: bool,
    pub message: String,
    pub backup_path: Option<PathBuf>,
    /// Where the file lives after the action
    pub final_path: Option<PathBuf>,
    /// Whether the file on disk was modified
    pub file_touched: bool,
    /// Whether the catalog record was updated
    pub catalog_updated: bool,
}

impl CorrectionResult {
    pub fn failure(song_id: SongId, message: impl Into<String>, backup_path: Option<PathBuf>) -> Self {
        Self {
            song_id,
            success: false,
            message: message.into(),
            backup_path,
            final_path: None,
            file_touched: false,
            catalog_updated: false,
        }
    }
}

/// Aggregate result of an Apply batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Actions that fully succeeded
    pub corrections_applied: usize,
    pub backups_created: usize,
    /// Files whose tags or location changed on disk
    pub files_touched: usize,
    pub catalog_updates: usize,
    pub covers_downloaded: usize,
    /// Actions skipped because the batch was cancelled
    pub not_attempted: usize,
    pub errors: Vec<String>,
    /// Per-action results, in submission order
    pub results: Vec<CorrectionResult>,
}

impl ApplyReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
