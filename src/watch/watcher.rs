// src/watch/watcher.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{DirwatchError, Result};
use crate::watch::event::{ChangeEvent, RenamePairing};
use crate::watch::relay::EventRelay;
use crate::watch::target::WatchTarget;

/// How long an unpaired rename source is held back before it counts as deleted.
const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(100);

/// Watch `target` and relay its events until `shutdown` resolves.
///
/// Fails with [`DirwatchError::DirectoryNotFound`] before registering anything
/// if the target is not an existing directory. Once running, watcher errors
/// are delivered through the relay's error slot and never end the watch.
pub async fn watch<S>(target: WatchTarget, relay: Arc<EventRelay>, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let session = WatchSession::open(target)?;
    session.run(relay, shutdown).await;
    Ok(())
}

/// Start watching `target` on a background task.
///
/// The target is validated and registered before this returns, so any event
/// after a successful call is observed. Must be called inside a tokio runtime.
pub fn spawn_watch(target: WatchTarget, relay: Arc<EventRelay>) -> Result<WatchHandle> {
    let session = WatchSession::open(target)?;
    let path = session.target.path().to_path_buf();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        session
            .run(relay, async move {
                // A dropped sender also counts as shutdown.
                let _ = shutdown_rx.await;
            })
            .await;
    });

    Ok(WatchHandle {
        path,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

/// Handle for a watch running in the background.
///
/// Dropping the handle stops the watch as well.
pub struct WatchHandle {
    path: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("path", &self.path)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl WatchHandle {
    /// The directory being watched (canonicalized when possible).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop watching and wait for the background task to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        (&mut self.task).await?;
        Ok(())
    }
}

/// A registered `notify` watcher plus the channel its callback feeds.
struct WatchSession {
    target: WatchTarget,
    _watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl WatchSession {
    fn open(target: WatchTarget) -> Result<Self> {
        let root = target.path();
        if !root.is_dir() {
            return Err(DirwatchError::DirectoryNotFound(root.to_path_buf()));
        }
        // Canonicalize once so event paths share a stable base.
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let target = WatchTarget::new(&root)
            .with_triggers(target.triggers())
            .with_filter(target.filter().clone())
            .recursive(target.is_recursive());

        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Only fails once the session is gone, and then nobody listens.
                let _ = event_tx.send(res);
            },
            Config::default(),
        )?;

        let mode = if target.is_recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&root, mode)?;

        info!(
            path = ?root,
            recursive = target.is_recursive(),
            triggers = ?target.triggers(),
            filter = ?target.filter().patterns(),
            "watching directory"
        );

        Ok(Self {
            target,
            _watcher: watcher,
            event_rx,
        })
    }

    async fn run<S>(mut self, relay: Arc<EventRelay>, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pairing = RenamePairing::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(path = ?self.target.path(), "watch cancelled");
                    break;
                }
                received = self.event_rx.recv() => match received {
                    Some(Ok(event)) => {
                        debug!(?event, "received notify event");
                        let changes = pairing.translate(
                            &event,
                            self.target.triggers(),
                            self.target.filter(),
                        );
                        for change in changes {
                            relay.dispatch(&change);
                        }
                    }
                    Some(Err(err)) => {
                        relay.dispatch(&ChangeEvent::from_error(&err));
                    }
                    None => {
                        debug!("notify channel closed");
                        break;
                    }
                },
                _ = tokio::time::sleep(RENAME_PAIR_WINDOW), if pairing.has_pending() => {
                    for change in pairing.flush(self.target.triggers(), self.target.filter()) {
                        relay.dispatch(&change);
                    }
                }
            }
        }
    }
}
