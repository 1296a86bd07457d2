//! The slideshow tick loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use pixlink_ble::TransportError;
use pixlink_media::{CodecError, ImageCodec};
use pixlink_protocol::{Command, DisplaySize};

use crate::error::SchedulerError;
use crate::playlist::{MediaItem, MediaKind, Playlist};
use crate::sink::CommandSink;
use crate::watch::{watch_dir, MediaEvent};

/// Tunables of a slideshow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowConfig {
    /// Directory whose media files make up the playlist.
    pub directory: PathBuf,
    /// How long an item stays on screen when it carries no duration of
    /// its own.
    pub default_duration: Duration,
    /// Scheduler tick period.
    pub tick_interval: Duration,
    /// Consecutive send failures tolerated before the scheduler stops
    /// with [`SchedulerError::LinkUnavailable`].
    pub failure_threshold: u32,
    /// Panel resolution items are encoded for.
    pub display_size: DisplaySize,
}

impl SlideshowConfig {
    /// Config with the default tick period (100 ms), failure threshold
    /// (3), and a 64×64 panel.
    pub fn new(directory: impl Into<PathBuf>, default_duration: Duration) -> Self {
        SlideshowConfig {
            directory: directory.into(),
            default_duration,
            tick_interval: Duration::from_millis(100),
            failure_threshold: 3,
            display_size: DisplaySize::Size64,
        }
    }
}

/// Where the show currently is. Created on start, discarded on stop.
#[derive(Debug, Default)]
struct SlideshowState {
    current_index: usize,
    elapsed: Duration,
    /// Whether the item at `current_index` has been sent this cycle.
    current_sent: bool,
}

/// Starts slideshows.
pub struct SlideshowScheduler;

impl SlideshowScheduler {
    /// Enumerate the directory, start watching it, and begin ticking.
    ///
    /// The returned handle stops the show; dropping it stops the show too.
    pub fn start(
        sink: Arc<dyn CommandSink>,
        config: SlideshowConfig,
    ) -> Result<SlideshowHandle, SchedulerError> {
        let (watcher, events) = watch_dir(&config.directory)?;
        Self::start_with_events(sink, config, events, Some(watcher))
    }

    /// Start with an externally supplied event queue. Tests drive the
    /// playlist through this without a real filesystem watcher.
    pub(crate) fn start_with_events(
        sink: Arc<dyn CommandSink>,
        config: SlideshowConfig,
        events: mpsc::UnboundedReceiver<MediaEvent>,
        watcher: Option<RecommendedWatcher>,
    ) -> Result<SlideshowHandle, SchedulerError> {
        let playlist = Playlist::from_dir(&config.directory)?;
        info!(
            "slideshow starting over {} with {} item(s)",
            config.directory.display(),
            playlist.len()
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let show = SlideshowLoop {
            sink,
            config,
            playlist,
            state: SlideshowState::default(),
            consecutive_failures: 0,
            events,
            _watcher: watcher,
        };
        let task = tokio::spawn(show.run(stop_rx));
        Ok(SlideshowHandle { stop_tx, task })
    }
}

/// Running slideshow; stop through this handle.
pub struct SlideshowHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), SchedulerError>>,
}

impl SlideshowHandle {
    /// Request the show to stop. Idempotent; the current tick finishes
    /// before the loop exits.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether the scheduler loop has ended (stopped or escalated).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end and return its outcome.
    pub async fn join(self) -> Result<(), SchedulerError> {
        self.task.await.unwrap_or(Err(SchedulerError::Task))
    }
}

/// Per-item failures during a tick. Codec problems skip the item; send
/// problems additionally count toward the link-failure threshold.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Send(#[from] TransportError),
}

struct SlideshowLoop {
    sink: Arc<dyn CommandSink>,
    config: SlideshowConfig,
    playlist: Playlist,
    state: SlideshowState,
    consecutive_failures: u32,
    events: mpsc::UnboundedReceiver<MediaEvent>,
    /// Keeps the filesystem watch alive for the lifetime of the loop.
    _watcher: Option<RecommendedWatcher>,
}

impl SlideshowLoop {
    async fn run(mut self, mut stop_rx: watch::Receiver<bool>) -> Result<(), SchedulerError> {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        info!("slideshow stopped");
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {
                    self.apply_pending_events();
                    self.tick().await?;
                }
            }
        }
    }

    /// Drain queued filesystem events. Runs between ticks only, so the
    /// playlist is never mutated while an item is being encoded.
    fn apply_pending_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                MediaEvent::Added(path) => {
                    if let Some(item) = MediaItem::from_path(path) {
                        self.playlist.push(item);
                    }
                }
                MediaEvent::Removed(path) => self.apply_removal(&path),
            }
        }
    }

    fn apply_removal(&mut self, path: &Path) {
        let Some(position) = self.playlist.remove(path) else {
            return;
        };

        if self.playlist.is_empty() {
            self.state = SlideshowState::default();
            return;
        }
        if position < self.state.current_index {
            self.state.current_index -= 1;
        } else if position == self.state.current_index {
            // the on-screen item vanished: show its successor right away
            // instead of waiting out the remaining duration
            self.state.current_index %= self.playlist.len();
            self.state.elapsed = Duration::ZERO;
            self.state.current_sent = false;
        }
    }

    async fn tick(&mut self) -> Result<(), SchedulerError> {
        let Some(item) = self.playlist.get(self.state.current_index).cloned() else {
            return Ok(());
        };

        if !self.state.current_sent {
            match self.send_item(&item).await {
                Ok(()) => {
                    self.state.current_sent = true;
                    self.consecutive_failures = 0;
                }
                Err(ItemError::Codec(err)) => {
                    warn!("skipping {}: {err}", item.path.display());
                    self.advance();
                    return Ok(());
                }
                Err(ItemError::Send(err)) => {
                    self.consecutive_failures += 1;
                    warn!(
                        "send failed for {} ({err}), consecutive failure {}",
                        item.path.display(),
                        self.consecutive_failures
                    );
                    if self.consecutive_failures > self.config.failure_threshold {
                        return Err(SchedulerError::LinkUnavailable {
                            failures: self.consecutive_failures,
                        });
                    }
                    self.advance();
                    return Ok(());
                }
            }
        }

        self.state.elapsed += self.config.tick_interval;
        let duration = item.display_duration.unwrap_or(self.config.default_duration);
        if self.state.elapsed >= duration {
            self.advance();
        }
        Ok(())
    }

    fn advance(&mut self) {
        self.state.current_index = (self.state.current_index + 1) % self.playlist.len();
        self.state.elapsed = Duration::ZERO;
        self.state.current_sent = false;
    }

    async fn send_item(&self, item: &MediaItem) -> Result<(), ItemError> {
        let size = self.config.display_size;
        let mut frames = ImageCodec::encode_file(&item.path, size)?;

        let command = match item.kind {
            MediaKind::Image => match frames.pop() {
                Some(frame) => Command::Image {
                    size,
                    pixels: frame.pixels,
                },
                None => {
                    return Err(ItemError::Codec(CodecError::UnsupportedFormat {
                        reason: format!("{} decoded to no frames", item.path.display()),
                    }))
                }
            },
            MediaKind::Animation => Command::Animation { size, frames },
        };

        debug!("sending {}", item.path.display());
        self.sink.send_command(&command).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use image::{Rgb, RgbImage};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Sent {
        Image,
        Animation,
    }

    #[derive(Default)]
    struct MockState {
        sent: Vec<Sent>,
        fail_all: bool,
    }

    #[derive(Clone, Default)]
    struct MockSink {
        state: Arc<Mutex<MockState>>,
    }

    impl MockSink {
        fn sent(&self) -> Vec<Sent> {
            self.state.lock().unwrap().sent.clone()
        }

        fn fail_all(&self) {
            self.state.lock().unwrap().fail_all = true;
        }
    }

    #[async_trait]
    impl CommandSink for MockSink {
        async fn send_command(&self, command: &Command) -> Result<(), TransportError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_all {
                return Err(TransportError::LinkDown);
            }
            state.sent.push(match command {
                Command::Image { .. } => Sent::Image,
                Command::Animation { .. } => Sent::Animation,
                other => panic!("scheduler sent unexpected command: {other:?}"),
            });
            Ok(())
        }
    }

    fn temp_media_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixlink-sched-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp media dir");
        dir
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 8, Rgb([200, 10, 10]))
            .save(&path)
            .expect("write png");
        path
    }

    fn write_gif(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 8, Rgb([10, 10, 200]))
            .save(&path)
            .expect("write gif");
        path
    }

    fn test_config(dir: &Path, default_duration: Duration) -> SlideshowConfig {
        SlideshowConfig {
            display_size: DisplaySize::Size16,
            ..SlideshowConfig::new(dir, default_duration)
        }
    }

    fn start_show(
        sink: &MockSink,
        config: SlideshowConfig,
    ) -> (SlideshowHandle, mpsc::UnboundedSender<MediaEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle =
            SlideshowScheduler::start_with_events(Arc::new(sink.clone()), config, rx, None)
                .expect("scheduler should start");
        (handle, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_added_mid_show_plays_after_current() {
        let dir = temp_media_dir("add");
        write_png(&dir, "a.png");

        let sink = MockSink::default();
        let (handle, events) = start_show(&sink, test_config(&dir, Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        // exactly one frame sent for a.png, not one per tick
        assert_eq!(sink.sent(), vec![Sent::Image]);

        let gif = write_gif(&dir, "b.gif");
        events
            .send(MediaEvent::Added(gif))
            .expect("event queue is open");

        tokio::time::sleep(Duration::from_secs(5)).await;
        // after the 5 s duration the show advanced to b.gif without
        // re-sending a.png
        assert_eq!(sink.sent(), vec![Sent::Image, Sent::Animation]);

        handle.stop();
        handle.join().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_current_item_advances_immediately() {
        let dir = temp_media_dir("remove");
        let a = write_png(&dir, "a.png");
        write_png(&dir, "b.png");

        let sink = MockSink::default();
        let (handle, events) = start_show(&sink, test_config(&dir, Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(sink.sent().len(), 1);

        events
            .send(MediaEvent::Removed(a))
            .expect("event queue is open");

        // far below the 60 s duration, the successor must already be up
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sink.sent().len(), 2);
        assert!(!handle.is_finished());

        handle.stop();
        handle.join().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_link_failures_stop_the_show() {
        let dir = temp_media_dir("failures");
        write_png(&dir, "a.png");
        write_png(&dir, "b.png");

        let sink = MockSink::default();
        sink.fail_all();
        let (handle, _events) = start_show(&sink, test_config(&dir, Duration::from_secs(5)));

        // threshold 3: the fourth consecutive failure is fatal
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_finished());
        let err = handle.join().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::LinkUnavailable { failures: 4 }
        ));
        assert!(sink.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_directory_idles_without_sending() {
        let dir = temp_media_dir("empty");

        let sink = MockSink::default();
        let (handle, _events) = start_show(&sink, test_config(&dir, Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.sent().is_empty());
        assert!(!handle.is_finished());

        // stop is idempotent
        handle.stop();
        handle.stop();
        handle.join().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_item_is_skipped_without_escalation() {
        let dir = temp_media_dir("codec");
        std::fs::write(dir.join("0broken.png"), b"not a png").expect("write file");
        write_png(&dir, "a.png");

        let sink = MockSink::default();
        let (handle, _events) = start_show(&sink, test_config(&dir, Duration::from_secs(1)));

        // several display cycles pass over the broken item; codec errors
        // skip it without counting toward the link-failure threshold
        tokio::time::sleep(Duration::from_secs(4)).await;
        let sent = sink.sent();
        assert!(sent.len() >= 2, "expected repeated cycles, got {sent:?}");
        assert!(sent.iter().all(|s| *s == Sent::Image));
        assert!(!handle.is_finished());

        handle.stop();
        handle.join().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_added_to_empty_show_starts_playing() {
        let dir = temp_media_dir("late-add");

        let sink = MockSink::default();
        let (handle, events) = start_show(&sink, test_config(&dir, Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sink.sent().is_empty());

        let png = write_png(&dir, "late.png");
        events
            .send(MediaEvent::Added(png))
            .expect("event queue is open");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sink.sent(), vec![Sent::Image]);

        handle.stop();
        handle.join().await.expect("clean stop");
    }
}
