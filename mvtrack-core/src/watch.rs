//! Filesystem watcher that reports moves inside the watched root
//!
//! notify's sync callback forwards raw events into a tokio channel; an async
//! task turns them into [`RenameEvent`]s and hands them to a [`RenameSink`].
//!
//! Backends describe a move differently. inotify sends a `From` and a `To`
//! half followed by a combined `Both` event; Windows sends only the halves;
//! FSEvents sends an unspecific `Any` for each side. [`RenameTracker`] pairs
//! halves and drops the duplicate `Both` so each move is reported once.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::WatchConfig;
use crate::path::relative_to;
use crate::queue::RenameSink;
use crate::reconcile::RenameEvent;
use crate::Result;

/// Pairs raw notify events into `(from, to)` moves
#[derive(Debug, Default)]
pub struct RenameTracker {
    /// Unmatched source half and its tracker cookie
    pending_from: Option<(Option<usize>, PathBuf)>,
    /// Move just reported from paired halves; only the very next event may repeat it
    last_paired: Option<(Option<usize>, PathBuf, PathBuf)>,
}

impl RenameTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one notify event; returns a move once both sides are known
    pub fn observe(&mut self, event: &Event) -> Option<(PathBuf, PathBuf)> {
        let EventKind::Modify(ModifyKind::Name(mode)) = event.kind else {
            return None;
        };

        let last_paired = self.last_paired.take();

        match mode {
            RenameMode::Both => {
                let from = event.paths.first()?.clone();
                let to = event.paths.get(1)?.clone();
                if self
                    .pending_from
                    .as_ref()
                    .is_some_and(|(_, pending)| *pending == from)
                {
                    self.pending_from = None;
                }

                let repeats_last = last_paired.is_some_and(|(cookie, last_from, last_to)| {
                    last_from == from
                        && last_to == to
                        && (cookie.is_none()
                            || event.tracker().is_none()
                            || cookie == event.tracker())
                });
                if repeats_last {
                    trace!(
                        from = %from.display(),
                        to = %to.display(),
                        "Combined event for a move already reported"
                    );
                    return None;
                }
                Some((from, to))
            }
            RenameMode::From => {
                self.start(event.tracker(), event.paths.first()?.clone());
                None
            }
            RenameMode::To => self.finish(event.tracker(), event.paths.first()?.clone()),
            RenameMode::Any | RenameMode::Other => {
                let path = event.paths.first()?.clone();
                if path.exists() {
                    self.finish(event.tracker(), path)
                } else {
                    self.start(event.tracker(), path);
                    None
                }
            }
        }
    }

    fn start(&mut self, tracker: Option<usize>, from: PathBuf) {
        if let Some((_, dropped)) = self.pending_from.replace((tracker, from)) {
            trace!(path = %dropped.display(), "Unpaired rename source, moved out of tree");
        }
    }

    fn finish(&mut self, tracker: Option<usize>, to: PathBuf) -> Option<(PathBuf, PathBuf)> {
        let Some((pending_tracker, from)) = self.pending_from.take() else {
            trace!(path = %to.display(), "Unpaired rename target, moved into tree");
            return None;
        };

        match (pending_tracker, tracker) {
            (Some(a), Some(b)) if a != b => {
                trace!(path = %to.display(), "Rename halves have different trackers");
                None
            }
            (pending_tracker, tracker) => {
                self.last_paired = Some((tracker.or(pending_tracker), from.clone(), to.clone()));
                Some((from, to))
            }
        }
    }
}

/// Turn an absolute move into a root-relative [`RenameEvent`]
///
/// Moves that leave the root, touch the metadata directory or rename the root
/// itself yield `None`.
pub fn to_rename_event(
    root: &Path,
    metadata_dir: &str,
    from: &Path,
    to: &Path,
) -> Option<RenameEvent> {
    let old_path = relative_to(root, from)?;
    let new_path = relative_to(root, to)?;

    let in_metadata =
        |p: &str| p == metadata_dir || p.starts_with(&format!("{}/", metadata_dir));
    if in_metadata(&old_path) || in_metadata(&new_path) {
        return None;
    }

    Some(RenameEvent {
        old_path,
        new_path,
        is_directory: to.is_dir(),
    })
}

/// Watches a root recursively and reports moves to a [`RenameSink`]
pub struct RenameWatcher {
    root: PathBuf,
    metadata_dir: String,
    // The notify watcher must be held to keep it alive
    _watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    tracker: RenameTracker,
}

impl std::fmt::Debug for RenameWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenameWatcher")
            .field("root", &self.root)
            .field("metadata_dir", &self.metadata_dir)
            .finish_non_exhaustive()
    }
}

impl RenameWatcher {
    /// Start watching `root`
    ///
    /// Events are buffered until [`run`](Self::run) is called.
    pub fn new(root: &Path, config: &WatchConfig, metadata_dir: impl Into<String>) -> Result<Self> {
        let root = root.canonicalize()?;
        info!(root = %root.display(), "Initializing rename watcher");

        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let notify_config = Config::default().with_poll_interval(config.poll_interval);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Runs on notify's thread; a closed channel means we are shutting down
                let _ = event_tx.send(res);
            },
            notify_config,
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            root,
            metadata_dir: metadata_dir.into(),
            _watcher: watcher,
            event_rx,
            tracker: RenameTracker::new(),
        })
    }

    /// Canonical root being watched
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Spawn the watcher loop on the current runtime
    pub fn spawn<S>(self, sink: S, cancel: CancellationToken) -> JoinHandle<()>
    where
        S: RenameSink + 'static,
    {
        tokio::spawn(self.run(sink, cancel))
    }

    /// Forward moves to `sink` until cancelled
    pub async fn run<S: RenameSink>(mut self, sink: S, cancel: CancellationToken) {
        info!(root = %self.root.display(), "Rename watcher started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Rename watcher shutting down (cancelled)");
                    break;
                }

                event = self.event_rx.recv() => match event {
                    Some(Ok(event)) => self.handle(&sink, &event),
                    Some(Err(e)) => warn!(error = %e, "Watcher error"),
                    None => {
                        info!("Rename watcher shutting down (channel closed)");
                        break;
                    }
                },
            }
        }
    }

    fn handle<S: RenameSink>(&mut self, sink: &S, event: &Event) {
        let Some((from, to)) = self.tracker.observe(event) else {
            return;
        };

        match to_rename_event(&self.root, &self.metadata_dir, &from, &to) {
            Some(rename) => {
                debug!(%rename, "Move detected");
                sink.on_rename(rename);
            }
            None => trace!(
                from = %from.display(),
                to = %to.display(),
                "Ignoring move outside the tracked tree"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn rename(mode: RenameMode, paths: &[&Path], tracker: Option<usize>) -> Event {
        let mut event = Event::new(EventKind::Modify(ModifyKind::Name(mode)));
        for path in paths {
            event = event.add_path(path.to_path_buf());
        }
        if let Some(tracker) = tracker {
            event = event.set_tracker(tracker);
        }
        event
    }

    #[test]
    fn test_both_event_is_a_move() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));

        assert_eq!(
            tracker.observe(&rename(RenameMode::Both, &[a, b], None)),
            Some((a.to_path_buf(), b.to_path_buf()))
        );
    }

    #[test]
    fn test_inotify_sequence_reports_once() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));

        assert_eq!(tracker.observe(&rename(RenameMode::From, &[a], Some(7))), None);
        assert_eq!(
            tracker.observe(&rename(RenameMode::To, &[b], Some(7))),
            Some((a.to_path_buf(), b.to_path_buf()))
        );
        assert_eq!(tracker.observe(&rename(RenameMode::Both, &[a, b], Some(7))), None);
    }

    #[test]
    fn test_back_and_forth_moves_each_reported() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));
        let moves = [(a, b, 1), (b, a, 2), (a, b, 3)];

        let mut reported = Vec::new();
        for (from, to, cookie) in moves {
            let mut count = 0;
            for event in [
                rename(RenameMode::From, &[from], Some(cookie)),
                rename(RenameMode::To, &[to], Some(cookie)),
                rename(RenameMode::Both, &[from, to], Some(cookie)),
            ] {
                if let Some(pair) = tracker.observe(&event) {
                    assert_eq!(pair, (from.to_path_buf(), to.to_path_buf()));
                    count += 1;
                }
            }
            reported.push(count);
        }

        assert_eq!(reported, vec![1, 1, 1]);
    }

    #[test]
    fn test_repeated_combined_events_all_reported() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));

        for (from, to) in [(a, b), (b, a), (a, b)] {
            assert_eq!(
                tracker.observe(&rename(RenameMode::Both, &[from, to], None)),
                Some((from.to_path_buf(), to.to_path_buf()))
            );
        }
    }

    #[test]
    fn test_combined_event_with_other_cookie_is_reported() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));

        tracker.observe(&rename(RenameMode::From, &[a], Some(4)));
        tracker.observe(&rename(RenameMode::To, &[b], Some(4)));
        assert_eq!(
            tracker.observe(&rename(RenameMode::Both, &[a, b], Some(5))),
            Some((a.to_path_buf(), b.to_path_buf()))
        );
    }

    #[test]
    fn test_mismatched_trackers_do_not_pair() {
        let mut tracker = RenameTracker::new();
        let (a, b) = (Path::new("/r/a.md"), Path::new("/r/b.md"));

        tracker.observe(&rename(RenameMode::From, &[a], Some(1)));
        assert_eq!(tracker.observe(&rename(RenameMode::To, &[b], Some(2))), None);
    }

    #[test]
    fn test_lone_target_is_ignored() {
        let mut tracker = RenameTracker::new();
        assert_eq!(
            tracker.observe(&rename(RenameMode::To, &[Path::new("/r/b.md")], None)),
            None
        );
    }

    #[test]
    fn test_non_rename_events_ignored() {
        let mut tracker = RenameTracker::new();
        let event = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/r/a.md"));
        assert_eq!(tracker.observe(&event), None);
    }

    #[test]
    fn test_any_mode_pairs_by_existence() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.md");
        let new = dir.path().join("new.md");
        fs::write(&new, "x").unwrap();

        let mut tracker = RenameTracker::new();
        assert_eq!(tracker.observe(&rename(RenameMode::Any, &[&old], None)), None);
        assert_eq!(
            tracker.observe(&rename(RenameMode::Any, &[&new], None)),
            Some((old, new))
        );
    }

    #[test]
    fn test_to_rename_event_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folder2")).unwrap();

        let event = to_rename_event(
            dir.path(),
            ".git",
            &dir.path().join("folder1"),
            &dir.path().join("folder2"),
        )
        .unwrap();
        assert_eq!(event, RenameEvent::directory("folder1", "folder2"));
    }

    #[test]
    fn test_to_rename_event_filters() {
        let root = Path::new("/vault");

        let lock = root.join(".git").join("index.lock");
        let index = root.join(".git").join("index");
        assert!(to_rename_event(root, ".git", &lock, &index).is_none());

        let outside = Path::new("/tmp/a.md");
        assert!(to_rename_event(root, ".git", outside, &root.join("a.md")).is_none());
        assert!(to_rename_event(root, ".git", &root.join("a.md"), outside).is_none());

        // Only the metadata directory itself is filtered, not lookalikes
        let event = to_rename_event(
            root,
            ".git",
            &root.join(".gitignore"),
            &root.join("ignore.txt"),
        );
        assert_eq!(event, Some(RenameEvent::file(".gitignore", "ignore.txt")));
    }

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<RenameEvent>>>);

    impl RenameSink for Collect {
        fn on_rename(&self, event: RenameEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_watcher_reports_real_rename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "hello").unwrap();

        let watcher = RenameWatcher::new(dir.path(), &WatchConfig::default(), ".git").unwrap();
        let root = watcher.root().to_path_buf();
        let sink = Collect::default();
        let cancel = CancellationToken::new();
        let task = watcher.spawn(sink.clone(), cancel.clone());

        fs::rename(root.join("a.md"), root.join("b.md")).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
        task.await.unwrap();

        // Backends differ in timing; when an event arrived it must be the right one
        let seen = sink.0.lock().unwrap().clone();
        assert!(seen.len() <= 1, "rename reported more than once: {:?}", seen);
        if let Some(event) = seen.first() {
            assert_eq!(event, &RenameEvent::file("a.md", "b.md"));
        }
    }
}
