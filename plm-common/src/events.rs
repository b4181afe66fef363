//! Broadcast event bus
//!
//! A thin wrapper over `tokio::sync::broadcast` shared by every PLM component
//! that reports progress. The bus is generic over the event type so each
//! crate defines its own event enum.

use tokio::sync::broadcast;

/// Broadcast event bus
///
/// Cloning the bus clones the sender; all clones feed the same subscribers.
///
/// # Examples
///
/// ```
/// use plm_common::events::EventBus;
///
/// let bus: EventBus<String> = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy("hello".to_string());
/// assert_eq!(rx.try_recv().unwrap(), "hello");
/// ```
#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
    capacity: usize,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: E) -> Result<usize, broadcast::error::SendError<E>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the "no subscribers" case
    ///
    /// Used for progress notifications, where nobody listening is normal.
    pub fn emit_lossy(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus: EventBus<u32> = EventBus::new(4);
        assert!(bus.emit(1).is_err());
    }

    #[test]
    fn test_emit_lossy_does_not_panic_on_full_channel() {
        let bus: EventBus<u32> = EventBus::new(2);
        let _rx = bus.subscribe();
        for i in 0..10 {
            bus.emit_lossy(i);
        }
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_subscribers() {
        let bus: EventBus<&'static str> = EventBus::new(8);
        let other = bus.clone();
        let mut rx = bus.subscribe();

        other.emit_lossy("from clone");

        assert_eq!(rx.recv().await.unwrap(), "from clone");
        assert_eq!(other.capacity(), 8);
    }
}
