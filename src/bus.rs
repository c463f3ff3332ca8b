//! Real-time fan-out bus (spec §4.E): subscribers get a bounded channel of
//! events; publication never blocks the producer, and a subscriber whose
//! queue is full is evicted rather than allowed to stall the system.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::config::BusConfig;
use crate::engine::BookSnapshot;
use crate::model::{Order, Ticker, Trade};

/// One event kind published on the bus (spec §4.E).
#[derive(Debug, Clone)]
pub enum BusEvent {
    OrderBook(String, BookSnapshot),
    Trade(Trade),
    Ticker(Ticker),
    OrderUpdate(Order),
}

/// Handle returned by [`FanoutBus::subscribe`]. Dropping it does not
/// unsubscribe; call [`FanoutBus::unsubscribe`] explicitly so the bus can
/// free the channel immediately rather than waiting on a future publish to
/// notice the receiver is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

/// Bounded, non-blocking pub-sub fan-out (spec §4.E). Internally
/// synchronized via `dashmap`, matching the genuinely-concurrent access
/// pattern the teacher crate reserves lock-free structures for — see
/// DESIGN.md. Per-subscriber channel capacity comes from `BusConfig`, since
/// eviction, not backpressure, is the overflow policy.
#[derive(Debug)]
pub struct FanoutBus {
    subscribers: DashMap<SubscriptionId, mpsc::Sender<BusEvent>>,
    capacity: usize,
}

impl FanoutBus {
    #[must_use]
    pub fn new(config: &BusConfig) -> Self {
        Self {
            subscribers: DashMap::new(),
            capacity: config.subscriber_capacity,
        }
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its bounded channel, sized per `BusConfig::subscriber_capacity`.
    pub fn subscribe(&self) -> (SubscriptionId, mpsc::Receiver<BusEvent>) {
        let id = SubscriptionId(Uuid::new_v4());
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(&id);
    }

    /// Publishes `event` to every live subscriber. Never blocks: a full or
    /// closed channel evicts that subscriber instead of waiting (spec §4.E
    /// delivery discipline). Cross-subscriber ordering is not guaranteed;
    /// each subscriber sees events in the order this method was called for
    /// them.
    pub fn publish(&self, event: BusEvent) {
        let mut evicted = Vec::new();
        for entry in &self.subscribers {
            match entry.value().try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = ?entry.key(), "bus subscriber queue full, evicting");
                    evicted.push(*entry.key());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted.push(*entry.key());
                }
            }
        }
        for id in evicted {
            self.subscribers.remove(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_ticker() -> Ticker {
        Ticker {
            symbol: "BTC-USD".to_string(),
            price: dec!(100),
            high_24h: dec!(100),
            low_24h: dec!(100),
            volume_24h: dec!(0),
            change_24h: dec!(0),
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = FanoutBus::new(&BusConfig::default());
        let (_, mut rx) = bus.subscribe();
        bus.publish(BusEvent::Ticker(sample_ticker()));
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, BusEvent::Ticker(_)));
    }

    #[tokio::test]
    async fn full_subscriber_queue_is_evicted_not_blocked() {
        let config = BusConfig {
            subscriber_capacity: 4,
        };
        let bus = FanoutBus::new(&config);
        let (id, _rx) = bus.subscribe();
        for _ in 0..(config.subscriber_capacity + 1) {
            bus.publish(BusEvent::Ticker(sample_ticker()));
        }
        assert!(bus.subscribers.is_empty(), "overflowed subscriber should be evicted");
        bus.unsubscribe(id);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = FanoutBus::new(&BusConfig::default());
        let (id, mut rx) = bus.subscribe();
        bus.unsubscribe(id);
        bus.publish(BusEvent::Ticker(sample_ticker()));
        assert!(rx.recv().await.is_none());
    }
}
