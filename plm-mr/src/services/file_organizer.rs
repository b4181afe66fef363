//! File renaming and library organization
//!
//! Targets are sanitized for every common filesystem and never overwrite an
//! existing file: collisions get a numeric suffix, `"Title (1).mp3"`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory used when the album is unknown
pub const UNKNOWN_ALBUM_DIR: &str = "Unknown Album";
/// Directory used when the artist is unknown
pub const UNKNOWN_ARTIST_DIR: &str = "Unknown Artist";

const MAX_COMPONENT_CHARS: usize = 200;
const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    #[error("No free file name near {0}")]
    NoFreeName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Make a string safe as a single path component
///
/// Reserved characters and control characters become `_`; leading and
/// trailing dots and spaces are dropped.
pub fn sanitize_component(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    trimmed.chars().take(MAX_COMPONENT_CHARS).collect::<String>().trim_end().to_string()
}

fn sanitize_or(text: Option<&str>, fallback: &str) -> String {
    let sanitized = sanitize_component(text.unwrap_or(""));
    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}

/// Extension with a leading dot, or empty
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// First free path: `path`, then `stem (1).ext`, `stem (2).ext`, …
pub fn unique_path(path: &Path) -> Result<PathBuf, OrganizeError> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = dotted_extension(path);

    for n in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = parent.join(format!("{} ({}){}", stem, n, ext));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(OrganizeError::NoFreeName(path.display().to_string()))
}

/// File name for an in-place rename: `"Artist - Title.ext"`
///
/// Without an artist the name is `"Title.ext"`; without a title the
/// original name is kept.
pub fn rename_target_name(artist: Option<&str>, title: Option<&str>, original: &Path) -> String {
    let ext = dotted_extension(original);
    let title = title.map(sanitize_component).filter(|t| !t.is_empty());
    let artist = artist.map(sanitize_component).filter(|a| !a.is_empty());

    match (artist, title) {
        (Some(artist), Some(title)) => format!("{} - {}{}", artist, title, ext),
        (None, Some(title)) => format!("{}{}", title, ext),
        (_, None) => original
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

/// Library location: `root/Artist/Album/"NN - Title.ext"` or `"Title.ext"`
pub fn organized_target(
    root: &Path,
    artist: Option<&str>,
    album: Option<&str>,
    title: Option<&str>,
    track: Option<u32>,
    original: &Path,
) -> PathBuf {
    let artist_dir = sanitize_or(artist, UNKNOWN_ARTIST_DIR);
    let album_dir = sanitize_or(album, UNKNOWN_ALBUM_DIR);
    let ext = dotted_extension(original);

    let title = title.map(sanitize_component).filter(|t| !t.is_empty());
    let file_name = match (track, title) {
        (Some(track), Some(title)) => format!("{:02} - {}{}", track, title, ext),
        (None, Some(title)) => format!("{}{}", title, ext),
        (_, None) => original
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    };

    root.join(artist_dir).join(album_dir).join(file_name)
}

/// Move a file, falling back to copy + delete across filesystems
async fn move_file(from: &Path, to: &Path) -> Result<(), OrganizeError> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "Rename failed, copying instead");
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await?;
            Ok(())
        }
    }
}

/// Relocate `source` to `target` (or the first free name near it)
///
/// Returns the final path. A file already at `target` stays put.
pub async fn relocate(source: &Path, target: &Path) -> Result<PathBuf, OrganizeError> {
    if !source.exists() {
        return Err(OrganizeError::SourceNotFound(source.display().to_string()));
    }
    if source == target {
        return Ok(target.to_path_buf());
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let final_path = unique_path(target)?;
    move_file(source, &final_path).await?;

    tracing::debug!(
        from = %source.display(),
        to = %final_path.display(),
        "File relocated"
    );
    Ok(final_path)
}

/// Rename within the same directory
pub async fn rename_in_place(source: &Path, new_name: &str) -> Result<PathBuf, OrganizeError> {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    relocate(source, &parent.join(new_name)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("AC/DC"), "AC_DC");
        assert_eq!(sanitize_component("What?: Why*"), "What__ Why_");
        assert_eq!(sanitize_component("  ...Hidden. "), "Hidden");
        assert_eq!(sanitize_component("..."), "");
    }

    #[test]
    fn test_rename_target_name() {
        let original = Path::new("/m/track01.flac");
        assert_eq!(
            rename_target_name(Some("Nirvana"), Some("Lithium"), original),
            "Nirvana - Lithium.flac"
        );
        assert_eq!(rename_target_name(None, Some("Lithium"), original), "Lithium.flac");
        assert_eq!(rename_target_name(Some("Nirvana"), None, original), "track01.flac");
    }

    #[test]
    fn test_organized_target() {
        let root = Path::new("/lib");
        let original = Path::new("/in/x.mp3");
        assert_eq!(
            organized_target(root, Some("Nirvana"), Some("Nevermind"), Some("Lithium"), Some(5), original),
            PathBuf::from("/lib/Nirvana/Nevermind/05 - Lithium.mp3")
        );
        assert_eq!(
            organized_target(root, Some("AC/DC"), None, Some("T.N.T."), None, original),
            PathBuf::from("/lib/AC_DC/Unknown Album/T.N.T.mp3")
        );
    }

    #[test]
    fn test_unique_path_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Lithium.mp3");
        assert_eq!(unique_path(&target).unwrap(), target);

        std::fs::write(&target, b"a").unwrap();
        let second = unique_path(&target).unwrap();
        assert_eq!(second, dir.path().join("Lithium (1).mp3"));

        std::fs::write(&second, b"b").unwrap();
        assert_eq!(unique_path(&target).unwrap(), dir.path().join("Lithium (2).mp3"));
    }

    #[tokio::test]
    async fn test_rename_in_place_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("Nirvana - Lithium.mp3");
        std::fs::write(&existing, b"keep").unwrap();
        let source = dir.path().join("track.mp3");
        std::fs::write(&source, b"new").unwrap();

        let renamed = rename_in_place(&source, "Nirvana - Lithium.mp3").await.unwrap();
        assert_eq!(renamed, dir.path().join("Nirvana - Lithium (1).mp3"));
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep");
        assert_eq!(std::fs::read(&renamed).unwrap(), b"new");
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_relocate_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = relocate(&dir.path().join("gone.mp3"), &dir.path().join("x.mp3")).await;
        assert!(matches!(result, Err(OrganizeError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_relocate_to_same_path_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lithium.mp3");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(relocate(&path, &path).await.unwrap(), path);
        assert!(path.exists());
    }
}
