//! The per-resource monitor hub.

use std::time::Duration;

use common::{InstanceId, Snapshot};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::source::SnapshotSource;

/// Timing knobs for a hub's refresh loop.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Upper bound on the wait between refresh cycles.
    pub refresh_interval: Duration,
    /// How long a hub with zero subscribers keeps running before it shuts
    /// itself down.
    pub idle_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// A weak delivery address for one observer.
///
/// The hub never owns the observer: it holds the id and a channel sender,
/// looks the channel up at delivery time and drops the entry when a send
/// fails. There is no unsubscribe call — dropping the receiving end is it.
#[derive(Debug)]
pub struct Subscriber<S> {
    pub id: InstanceId,
    pub sender: mpsc::Sender<S>,
}

impl<S> Subscriber<S> {
    /// Creates a subscriber and the receiving end of its delivery channel.
    pub fn new(id: InstanceId) -> (Self, mpsc::Receiver<S>) {
        let (sender, receiver) = mpsc::channel(8);
        (Self { id, sender }, receiver)
    }
}

impl<S> Clone for Subscriber<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
        }
    }
}

enum Command<S> {
    Register(Subscriber<S>),
    RefreshNow,
    SubscriberCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Addressable handle to a running hub.
///
/// Sends are at-least-once messages into the hub's mailbox; a failed send
/// means the hub already terminated and the caller should start fresh.
pub struct HubHandle<S> {
    commands: mpsc::Sender<Command<S>>,
}

impl<S> Clone for HubHandle<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<S: Snapshot> HubHandle<S> {
    /// Registers a subscriber. On failure the hub is gone and the
    /// subscriber is handed back so the caller can seed a fresh hub.
    pub async fn register(&self, subscriber: Subscriber<S>) -> Result<(), Subscriber<S>> {
        self.commands
            .send(Command::Register(subscriber))
            .await
            .map_err(|err| match err.0 {
                Command::Register(subscriber) => subscriber,
                _ => unreachable!("send returns the rejected command"),
            })
    }

    /// Asks the hub to skip its wait and re-fetch immediately. Returns
    /// false if the hub already terminated; callers treat that as "no one
    /// left to nudge", never as fatal.
    pub async fn refresh_now(&self) -> bool {
        self.commands.send(Command::RefreshNow).await.is_ok()
    }

    /// Point-in-time read of the subscriber set size. `None` if the hub
    /// already terminated.
    pub async fn subscriber_count(&self) -> Option<usize> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::SubscriberCount(tx))
            .await
            .ok()?;
        rx.await.ok()
    }

    /// Operator shutdown: the hub makes a best-effort final delivery to
    /// every remaining subscriber before exiting.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    /// Returns true if the hub's mailbox is closed (the hub terminated).
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// The refresh loop for one tracked resource.
///
/// Fetches the resource's state, stores it as the last known snapshot and
/// delivers it to every subscriber in fetch order; then waits for the
/// refresh interval, a mailbox message or the idle deadline, whichever
/// fires first.
pub struct MonitorHub<Src: SnapshotSource> {
    label: String,
    source: Src,
    config: MonitorConfig,
    subscribers: Vec<Subscriber<Src::Snapshot>>,
    last_known: Option<Src::Snapshot>,
    commands: mpsc::Receiver<Command<Src::Snapshot>>,
}

impl<Src: SnapshotSource> MonitorHub<Src> {
    /// Spawns a hub seeded with one subscriber and returns its handle.
    pub fn spawn(
        label: impl Into<String>,
        source: Src,
        seed: Subscriber<Src::Snapshot>,
        config: MonitorConfig,
    ) -> HubHandle<Src::Snapshot> {
        let (tx, rx) = mpsc::channel(16);
        let hub = Self {
            label: label.into(),
            source,
            config,
            subscribers: vec![seed],
            last_known: None,
            commands: rx,
        };
        tokio::spawn(hub.run());
        HubHandle { commands: tx }
    }

    async fn run(mut self) {
        let refresh_interval = self.config.refresh_interval;
        let idle_timeout = self.config.idle_timeout;
        let mut should_refresh = true;
        let mut empty_since: Option<Instant> = None;
        // A fixed deadline, not a restarted sleep: mailbox traffic must not
        // postpone the timed refresh.
        let mut next_refresh = Instant::now() + refresh_interval;

        loop {
            if should_refresh {
                match self.source.fetch().await {
                    Ok(Some(snapshot)) if snapshot.is_resolved() => {
                        metrics::counter!("monitor_refresh_total").increment(1);
                        self.last_known = Some(snapshot.clone());
                        self.deliver(&snapshot).await;
                    }
                    Ok(Some(_)) => {
                        // Account exists but its identity field is still
                        // empty: nothing valid to serve, stop monitoring
                        // without fanning out a ghost snapshot.
                        tracing::info!(resource = %self.label, "resource not resolvable, stopping monitor");
                        return;
                    }
                    Ok(None) => {
                        tracing::info!(resource = %self.label, "resource gone, stopping monitor");
                        return;
                    }
                    Err(fault) => {
                        tracing::warn!(resource = %self.label, error = %fault, "snapshot fetch failed, keeping previous");
                    }
                }
                should_refresh = false;
                next_refresh = Instant::now() + refresh_interval;
            }

            if self.subscribers.is_empty() {
                empty_since.get_or_insert_with(Instant::now);
            } else {
                empty_since = None;
            }

            let idle_deadline = async move {
                match empty_since {
                    Some(since) => tokio::time::sleep_until(since + idle_timeout).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Register(subscriber)) => self.register(subscriber).await,
                    Some(Command::RefreshNow) => should_refresh = true,
                    Some(Command::SubscriberCount(reply)) => {
                        let _ = reply.send(self.subscribers.len());
                    }
                    Some(Command::Shutdown) | None => {
                        self.final_delivery();
                        return;
                    }
                },
                _ = tokio::time::sleep_until(next_refresh) => {
                    should_refresh = true;
                }
                _ = idle_deadline => {
                    tracing::info!(resource = %self.label, "no subscribers left, stopping monitor");
                    return;
                }
            }
        }
    }

    /// Adds a subscriber; re-registering an already-present id is a no-op.
    /// A newly added subscriber immediately receives the last known
    /// snapshot, closing the race where the hub refreshed before it
    /// attached.
    async fn register(&mut self, subscriber: Subscriber<Src::Snapshot>) {
        if self.subscribers.iter().any(|s| s.id == subscriber.id) {
            return;
        }
        if let Some(snapshot) = &self.last_known
            && subscriber.sender.send(snapshot.clone()).await.is_err()
        {
            // Dead on arrival, don't add it.
            metrics::counter!("monitor_subscribers_pruned").increment(1);
            return;
        }
        self.subscribers.push(subscriber);
    }

    /// Delivers a snapshot to every subscriber in order, evicting any whose
    /// delivery fails. Delivery failure is the only eviction signal.
    async fn deliver(&mut self, snapshot: &Src::Snapshot) {
        let mut kept = Vec::with_capacity(self.subscribers.len());
        for subscriber in self.subscribers.drain(..) {
            if subscriber.sender.send(snapshot.clone()).await.is_ok() {
                kept.push(subscriber);
            } else {
                tracing::debug!(resource = %self.label, subscriber = %subscriber.id, "subscriber unreachable, pruning");
                metrics::counter!("monitor_subscribers_pruned").increment(1);
            }
        }
        self.subscribers = kept;
    }

    /// Best-effort final delivery on shutdown, so a subscriber blocked on
    /// "one more update" does not hang.
    fn final_delivery(&mut self) {
        if let Some(snapshot) = &self.last_known {
            for subscriber in &self.subscribers {
                let _ = subscriber.sender.try_send(snapshot.clone());
            }
        }
    }
}
