//! Observable tether state.
//!
//! [`StatePublisher`] is the single writer, owned by the lifecycle controller.
//! Everyone else gets a read-only [`TetherStateWatch`], from which they can
//! take a snapshot or open a [`TetherStateStream`]. Every stream starts with
//! the value current at subscription time and then yields each change in
//! order. Streams are unbounded, so a slow reader never loses a transition.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

#[derive(Debug)]
struct Inner {
    value: bool,
    subscribers: Vec<mpsc::UnboundedSender<bool>>,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write side of the tether state.
#[derive(Debug)]
pub struct StatePublisher {
    shared: Arc<Shared>,
}

impl StatePublisher {
    /// Create a publisher holding `initial`.
    #[must_use]
    pub fn new(initial: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    value: initial,
                    subscribers: Vec::new(),
                    closed: false,
                }),
            }),
        }
    }

    /// Read-only view for collaborators.
    #[must_use]
    pub fn watch(&self) -> TetherStateWatch {
        TetherStateWatch {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current value.
    #[must_use]
    pub fn current(&self) -> bool {
        self.shared.lock().value
    }

    /// Set the value. Subscribers are only notified when it actually changes.
    ///
    /// Returns whether the value changed.
    pub fn publish(&self, value: bool) -> bool {
        let mut inner = self.shared.lock();
        if inner.value == value {
            return false;
        }
        inner.value = value;
        inner.subscribers.retain(|tx| tx.send(value).is_ok());
        true
    }
}

impl Drop for StatePublisher {
    fn drop(&mut self) {
        // Ends every open stream.
        let mut inner = self.shared.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }
}

/// Read-only, cloneable view of the tether state.
#[derive(Debug, Clone)]
pub struct TetherStateWatch {
    shared: Arc<Shared>,
}

impl TetherStateWatch {
    /// Current value. Never blocks on the controller.
    #[must_use]
    pub fn current(&self) -> bool {
        self.shared.lock().value
    }

    /// Open a new stream. The first item is the current value.
    #[must_use]
    pub fn subscribe(&self) -> TetherStateStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.shared.lock();
        // Cannot fail: `rx` is alive.
        let _ = tx.send(inner.value);
        if !inner.closed {
            inner.subscribers.push(tx);
        }
        TetherStateStream { rx }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        let mut inner = self.shared.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

/// Stream of tether state values.
///
/// Ends once the publisher is dropped.
#[derive(Debug)]
pub struct TetherStateStream {
    rx: mpsc::UnboundedReceiver<bool>,
}

impl TetherStateStream {
    /// Wait for the next value.
    pub async fn recv(&mut self) -> Option<bool> {
        self.rx.recv().await
    }

    /// Take the next value if one is already queued.
    pub fn try_recv(&mut self) -> Option<bool> {
        self.rx.try_recv().ok()
    }
}

impl Stream for TetherStateStream {
    type Item = bool;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<bool>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[test]
    fn test_initial_value_replayed() {
        let publisher = StatePublisher::new(false);
        let mut stream = publisher.watch().subscribe();
        assert_eq!(stream.try_recv(), Some(false));
        assert_eq!(stream.try_recv(), None);
    }

    #[test]
    fn test_changes_delivered_in_order() {
        let publisher = StatePublisher::new(false);
        let mut stream = publisher.watch().subscribe();

        assert!(publisher.publish(true));
        assert!(publisher.publish(false));
        assert!(publisher.publish(true));

        let seen: Vec<bool> = std::iter::from_fn(|| stream.try_recv()).collect();
        assert_eq!(seen, vec![false, true, false, true]);
    }

    #[test]
    fn test_duplicate_publish_not_emitted() {
        let publisher = StatePublisher::new(false);
        let mut stream = publisher.watch().subscribe();

        assert!(!publisher.publish(false));
        assert_eq!(stream.try_recv(), Some(false));
        assert_eq!(stream.try_recv(), None);
    }

    #[test]
    fn test_late_subscriber_sees_current_value() {
        let publisher = StatePublisher::new(false);
        let watch = publisher.watch();
        publisher.publish(true);

        let mut stream = watch.subscribe();
        assert_eq!(stream.try_recv(), Some(true));
        assert!(watch.current());
    }

    #[test]
    fn test_stream_pending_until_change() {
        let publisher = StatePublisher::new(false);
        let mut stream = task::spawn(publisher.watch().subscribe());

        assert_ready_eq!(stream.poll_next(), Some(false));
        assert_pending!(stream.poll_next());

        publisher.publish(true);
        assert!(stream.is_woken());
        assert_ready_eq!(stream.poll_next(), Some(true));
    }

    #[tokio::test]
    async fn test_stream_ends_when_publisher_dropped() {
        let publisher = StatePublisher::new(false);
        let stream = publisher.watch().subscribe();
        drop(publisher);

        let seen: Vec<bool> = stream.collect().await;
        assert_eq!(seen, vec![false]);
    }

    #[test]
    fn test_dropped_subscribers_pruned() {
        let publisher = StatePublisher::new(false);
        let watch = publisher.watch();
        let stream = watch.subscribe();
        let _other = watch.subscribe();
        assert_eq!(watch.subscriber_count(), 2);

        drop(stream);
        assert_eq!(watch.subscriber_count(), 1);
    }
}
