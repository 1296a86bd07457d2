//! Filesystem watch feeding the scheduler's event queue.
//!
//! `notify` delivers events on its own thread; they are forwarded into an
//! unbounded channel and drained by the scheduler at tick boundaries only.

use std::path::{Path, PathBuf};

use notify::event::{Event, EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::SchedulerError;

/// A playlist-relevant change in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MediaEvent {
    /// A file appeared.
    Added(PathBuf),
    /// A file disappeared.
    Removed(PathBuf),
}

/// Map a raw notify event onto playlist events. A rename is a removal of
/// the old path plus an addition of the new one.
pub(crate) fn map_event(event: &Event) -> Vec<MediaEvent> {
    match &event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(MediaEvent::Added).collect(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(MediaEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event.paths.iter().cloned().map(MediaEvent::Removed).collect(),
            RenameMode::To => event.paths.iter().cloned().map(MediaEvent::Added).collect(),
            _ => match event.paths.as_slice() {
                [old, new] => vec![
                    MediaEvent::Removed(old.clone()),
                    MediaEvent::Added(new.clone()),
                ],
                _ => Vec::new(),
            },
        },
        _ => Vec::new(),
    }
}

/// Start watching `dir` (non-recursive) and forward mapped events into the
/// returned channel. The watcher stops when the returned handle is dropped.
pub(crate) fn watch_dir(
    dir: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<MediaEvent>), SchedulerError> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
        match result {
            Ok(event) => {
                for media_event in map_event(&event) {
                    trace!("fs event: {media_event:?}");
                    // the receiver disappearing just means the show stopped
                    let _ = tx.send(media_event);
                }
            }
            Err(err) => trace!("fs watch error: {err}"),
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}
