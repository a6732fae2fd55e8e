//! Update broadcaster.
//!
//! Keeps a registry of short-lived viewer channels. Every committed
//! mutation pushes one generic `StateChanged` notice to every
//! subscriber, best-effort: a slow viewer loses the notice (it
//! reconciles by re-fetching full state), a disconnected viewer is
//! dropped from the registry. A keep-alive thread signals idle
//! subscribers so the transport underneath does not declare the
//! connection dead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    StateChanged,
    KeepAlive,
}

/// Per-subscriber buffer. Small on purpose: viewers that fall behind
/// are expected to re-fetch, not to replay a backlog.
const SUBSCRIBER_CAP: usize = 16;

struct Registry {
    subscribers: Mutex<Vec<SyncSender<Notice>>>,
    last_push: Mutex<Instant>,
}

impl Registry {
    fn push_all(&self, notice: Notice) {
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|tx| match tx.try_send(notice) {
            Ok(()) => true,
            // Full buffer: drop the notice, keep the viewer.
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
        *self.last_push.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_push
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }
}

pub struct UpdateBroadcaster {
    registry: Arc<Registry>,
    stop: Arc<AtomicBool>,
    keepalive: Option<JoinHandle<()>>,
}

impl UpdateBroadcaster {
    pub fn start(keepalive_every: Duration) -> Self {
        let registry = Arc::new(Registry {
            subscribers: Mutex::new(Vec::new()),
            last_push: Mutex::new(Instant::now()),
        });
        let stop = Arc::new(AtomicBool::new(false));

        let reg = Arc::clone(&registry);
        let stop_flag = Arc::clone(&stop);
        let keepalive = std::thread::spawn(move || {
            let tick = Duration::from_millis(100).min(keepalive_every);
            while !stop_flag.load(Ordering::Relaxed) {
                std::thread::sleep(tick);
                if reg.idle_for() >= keepalive_every {
                    reg.push_all(Notice::KeepAlive);
                }
            }
        });

        Self {
            registry,
            stop,
            keepalive: Some(keepalive),
        }
    }

    /// Register a viewer; the receiver lives as long as the caller
    /// keeps it, dropping it unsubscribes on the next push.
    pub fn subscribe(&self) -> Receiver<Notice> {
        let (tx, rx) = sync_channel(SUBSCRIBER_CAP);
        self.registry
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Announce a committed mutation to every viewer.
    pub fn publish(&self) {
        self.registry.push_all(Notice::StateChanged);
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.keepalive.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UpdateBroadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let b = UpdateBroadcaster::start(Duration::from_secs(60));
        let rx1 = b.subscribe();
        let rx2 = b.subscribe();

        b.publish();

        assert_eq!(rx1.recv_timeout(Duration::from_secs(1)).unwrap(), Notice::StateChanged);
        assert_eq!(rx2.recv_timeout(Duration::from_secs(1)).unwrap(), Notice::StateChanged);
    }

    #[test]
    fn full_subscriber_does_not_block_or_unsubscribe() {
        let b = UpdateBroadcaster::start(Duration::from_secs(60));
        let rx = b.subscribe();

        // Saturate the buffer and then some; publish must not block.
        for _ in 0..(SUBSCRIBER_CAP + 8) {
            b.publish();
        }
        assert_eq!(b.subscriber_count(), 1);

        // The viewer still receives what fit in the buffer.
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), Notice::StateChanged);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let b = UpdateBroadcaster::start(Duration::from_secs(60));
        let rx = b.subscribe();
        drop(rx);

        b.publish();
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn idle_channel_gets_keepalive() {
        let b = UpdateBroadcaster::start(Duration::from_millis(150));
        let rx = b.subscribe();

        let notice = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(notice, Notice::KeepAlive);
    }
}
