//! File watcher for live barrel regeneration.
//!
//! Every directory gets its own non-recursive subscription. Events are
//! funnelled through one channel and handled strictly one at a time on
//! the thread that drives the session, so the indexer's registry and
//! change log are never touched concurrently.

use crate::error::Result;
use crate::indexer::Indexer;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A change inside a watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FsChange {
    FileAdded(PathBuf),
    FileRemoved(PathBuf),
    FileChanged(PathBuf),
    DirAdded(PathBuf),
    DirRemoved(PathBuf),
}

impl FsChange {
    pub fn path(&self) -> &Path {
        match self {
            Self::FileAdded(p)
            | Self::FileRemoved(p)
            | Self::FileChanged(p)
            | Self::DirAdded(p)
            | Self::DirRemoved(p) => p,
        }
    }
}

impl fmt::Display for FsChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileAdded(p) => write!(f, "File added: {}", p.display()),
            Self::FileRemoved(p) => write!(f, "File removed: {}", p.display()),
            Self::FileChanged(p) => write!(f, "File changed: {}", p.display()),
            Self::DirAdded(p) => write!(f, "Directory added: {}", p.display()),
            Self::DirRemoved(p) => write!(f, "Directory removed: {}", p.display()),
        }
    }
}

enum Message {
    Event(notify::Result<Event>),
    Shutdown,
}

/// Stops a running session from another thread or task.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Sender<Message>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.tx.send(Message::Shutdown).is_err() {
            debug!("Watch session already stopped");
        }
    }
}

enum Step {
    Continue,
    Stop,
}

/// Watches directories and keeps their barrels up to date.
pub struct WatchSession {
    watcher: RecommendedWatcher,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    indexer: Indexer,
    subscribed: HashSet<PathBuf>,
}

impl WatchSession {
    /// Creates a session around an indexer. No directory is watched yet.
    pub fn new(indexer: Indexer) -> Result<Self> {
        let (tx, rx) = channel();
        let event_tx = tx.clone();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if event_tx.send(Message::Event(res)).is_err() {
                debug!("Dropping file event, session is gone");
            }
        })?;

        Ok(Self {
            watcher,
            tx,
            rx,
            indexer,
            subscribed: HashSet::new(),
        })
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn indexer_mut(&mut self) -> &mut Indexer {
        &mut self.indexer
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.tx.clone(),
        }
    }

    /// Checks whether a directory has a live subscription.
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.subscribed.contains(dir)
    }

    /// Subscribes to `dir` and every directory currently below it.
    ///
    /// Returns false (after a warning) if the directory does not exist.
    /// Directories that are already subscribed are left alone.
    pub fn watch(&mut self, dir: &Path) -> bool {
        if !dir.is_dir() {
            warn!("Directory not found: {}", dir.display());
            return false;
        }

        let mut added = 0;
        for entry in WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            if self.subscribe(entry.path()) {
                added += 1;
            }
        }

        info!("Watching {} ({} new directories)", dir.display(), added);
        true
    }

    fn subscribe(&mut self, dir: &Path) -> bool {
        if self.subscribed.contains(dir) {
            return false;
        }

        match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!("Subscribed to {}", dir.display());
                self.subscribed.insert(dir.to_path_buf());
                true
            }
            Err(e) => {
                warn!("Failed to watch {}: {}", dir.display(), e);
                false
            }
        }
    }

    /// Drops a removed directory and its descendants from the subscription set.
    fn forget(&mut self, dir: &Path) {
        self.subscribed.retain(|watched| !watched.starts_with(dir));
    }

    /// Handles events until `ShutdownHandle::shutdown` is called, then
    /// flushes the pending change log.
    pub fn run(&mut self) {
        while let Step::Continue = self.step(None) {}
        self.indexer.log_mut().flush();
    }

    /// Handles events for at most `duration`.
    ///
    /// Returns false if a shutdown was requested in the meantime.
    pub fn process_for(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            if let Step::Stop = self.step(Some(deadline - now)) {
                self.indexer.log_mut().flush();
                return false;
            }
        }
    }

    /// Waits for the next batch of messages (or the log timer) and handles it.
    fn step(&mut self, limit: Option<Duration>) -> Step {
        let now = Instant::now();
        self.indexer.log_mut().fire_if_due(now);

        let timeout = match (self.indexer.log().timer().remaining(now), limit) {
            (Some(log), Some(limit)) => Some(log.min(limit)),
            (log, limit) => log.or(limit),
        };

        let first = match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => return Step::Continue,
                Err(RecvTimeoutError::Disconnected) => return Step::Stop,
            },
            None => match self.rx.recv() {
                Ok(message) => message,
                Err(_) => return Step::Stop,
            },
        };

        let mut batch = vec![first];
        batch.extend(self.rx.try_iter());

        let mut stop = false;
        let mut changes = Vec::new();
        for message in batch {
            match message {
                Message::Event(Ok(event)) => changes.extend(self.classify(event)),
                Message::Event(Err(e)) => warn!("Watch error: {}", e),
                Message::Shutdown => stop = true,
            }
        }

        for change in coalesce(changes) {
            self.apply(change);
        }

        if stop {
            info!("Stopping watch session");
            Step::Stop
        } else {
            Step::Continue
        }
    }

    /// Applies one change: re-indexes the directory it happened in.
    pub fn apply(&mut self, change: FsChange) {
        let Some(dir) = change.path().parent().map(Path::to_path_buf) else {
            return;
        };

        match &change {
            FsChange::DirAdded(path) => {
                self.watch(path);
            }
            FsChange::DirRemoved(path) => self.forget(path),
            _ => {}
        }

        debug!("{}", change);
        self.indexer.reindex(&dir);
        self.indexer.log_mut().push(change.to_string());
    }

    /// Turns a raw notify event into the changes we act on.
    fn classify(&self, event: Event) -> Vec<FsChange> {
        let mut changes = Vec::new();

        match event.kind {
            EventKind::Create(kind) => {
                let hint = match kind {
                    CreateKind::Folder => Some(true),
                    CreateKind::File => Some(false),
                    _ => None,
                };
                for path in event.paths {
                    changes.push(appeared(path, hint));
                }
            }
            EventKind::Remove(kind) => {
                let hint = match kind {
                    RemoveKind::Folder => Some(true),
                    RemoveKind::File => Some(false),
                    _ => None,
                };
                for path in event.paths {
                    changes.push(self.vanished(path, hint));
                }
            }
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => {
                    for path in event.paths {
                        changes.push(self.vanished(path, None));
                    }
                }
                RenameMode::To => {
                    for path in event.paths {
                        changes.push(appeared(path, None));
                    }
                }
                RenameMode::Both => {
                    let mut paths = event.paths.into_iter();
                    if let Some(from) = paths.next() {
                        changes.push(self.vanished(from, None));
                    }
                    if let Some(to) = paths.next() {
                        changes.push(appeared(to, None));
                    }
                }
                _ => {
                    for path in event.paths {
                        if path.exists() {
                            changes.push(appeared(path, None));
                        } else {
                            changes.push(self.vanished(path, None));
                        }
                    }
                }
            },
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                for path in event.paths {
                    if path.is_file() && self.indexer.is_component_file(&path) {
                        changes.push(FsChange::FileChanged(path));
                    }
                }
            }
            _ => {}
        }

        changes.retain(|change| self.is_relevant(change));
        changes
    }

    /// Keeps changes directly inside a subscribed directory, minus our
    /// own barrel writes.
    fn is_relevant(&self, change: &FsChange) -> bool {
        let in_watched_dir = change
            .path()
            .parent()
            .map(|parent| self.subscribed.contains(parent))
            .unwrap_or(false);
        if !in_watched_dir {
            return false;
        }

        match change {
            // Removing a barrel regenerates it; writing one must not loop
            FsChange::FileAdded(path) | FsChange::FileChanged(path) => {
                !self.indexer.is_barrel_file(path)
            }
            _ => true,
        }
    }

    fn vanished(&self, path: PathBuf, is_dir: Option<bool>) -> FsChange {
        let is_dir = is_dir.unwrap_or_else(|| self.subscribed.contains(&path));
        if is_dir {
            FsChange::DirRemoved(path)
        } else {
            FsChange::FileRemoved(path)
        }
    }
}

fn appeared(path: PathBuf, is_dir: Option<bool>) -> FsChange {
    let is_dir = is_dir.unwrap_or_else(|| path.is_dir());
    if is_dir {
        FsChange::DirAdded(path)
    } else {
        FsChange::FileAdded(path)
    }
}

/// Drops duplicate changes from one batch, keeping arrival order.
///
/// A file that was added in the batch does not also need a content
/// change pass.
fn coalesce(changes: Vec<FsChange>) -> Vec<FsChange> {
    let added: HashSet<PathBuf> = changes
        .iter()
        .filter_map(|change| match change {
            FsChange::FileAdded(path) => Some(path.clone()),
            _ => None,
        })
        .collect();

    let mut seen = HashSet::new();
    changes
        .into_iter()
        .filter(|change| match change {
            FsChange::FileChanged(path) => !added.contains(path),
            _ => true,
        })
        .filter(|change| seen.insert(change.clone()))
        .collect()
}
