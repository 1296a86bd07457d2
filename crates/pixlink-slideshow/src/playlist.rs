//! Playlist of media items backing the slideshow.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::SchedulerError;

/// What a media file decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A still image, shown as one static frame.
    Image,
    /// A timed animation.
    Animation,
}

impl MediaKind {
    /// Classify a file by extension; `None` for non-media files.
    pub fn from_path(path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "webp" => Some(MediaKind::Image),
            "gif" => Some(MediaKind::Animation),
            _ => None,
        }
    }
}

/// One entry of the slideshow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Source file.
    pub path: PathBuf,
    /// How the file is encoded for the device.
    pub kind: MediaKind,
    /// How long the item stays on screen; `None` uses the slideshow
    /// default.
    pub display_duration: Option<Duration>,
}

impl MediaItem {
    /// Build an item from a path; `None` for non-media files.
    pub fn from_path(path: PathBuf) -> Option<MediaItem> {
        let kind = MediaKind::from_path(&path)?;
        Some(MediaItem {
            path,
            kind,
            display_duration: None,
        })
    }
}

/// Ordered sequence of media items.
///
/// Mutated only between scheduler ticks; read only by the tick step.
#[derive(Debug, Default)]
pub struct Playlist {
    items: Vec<MediaItem>,
}

impl Playlist {
    /// Enumerate a directory into a playlist, sorted by path. Non-media
    /// files are ignored.
    pub fn from_dir(dir: &Path) -> Result<Playlist, SchedulerError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SchedulerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        let items: Vec<MediaItem> = paths.into_iter().filter_map(MediaItem::from_path).collect();
        debug!("enumerated {} media item(s)", items.len());
        Ok(Playlist { items })
    }

    /// Whether the playlist has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Item at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    /// Append an item unless its path is already listed.
    pub fn push(&mut self, item: MediaItem) {
        if self.items.iter().any(|existing| existing.path == item.path) {
            return;
        }
        debug!("playlist add: {}", item.path.display());
        self.items.push(item);
    }

    /// Remove the item with the given path, returning its old position.
    pub fn remove(&mut self, path: &Path) -> Option<usize> {
        let position = self.items.iter().position(|item| item.path == path)?;
        debug!("playlist remove: {}", path.display());
        self.items.remove(position);
        Some(position)
    }
}
