//! Schedule change notifications.
//!
//! Fire-and-forget: publishing never fails and never waits on listeners. A
//! listener that falls behind loses the oldest events, which is fine for
//! refresh signals.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use upkeep_core::Time;

const CHANNEL_CAPACITY: usize = 64;

/// Something listeners may want to refresh on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// A continuity run stored new schedules
    SchedulesChanged {
        /// Assets that got at least one new schedule
        assets: usize,
        /// Schedules created
        schedules: usize,
        /// When the run finished
        at: Time,
    },
}

/// Broadcast bus for [`ScheduleEvent`]s.
#[derive(Debug, Clone)]
pub struct ScheduleEvents {
    sender: broadcast::Sender<ScheduleEvent>,
}

impl ScheduleEvents {
    /// Create a bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to whoever is listening.
    pub fn publish(&self, event: ScheduleEvent) {
        match self.sender.send(event) {
            Ok(listeners) => debug!("Schedule event delivered to {} listeners", listeners),
            Err(_) => debug!("Schedule event dropped, no listeners"),
        }
    }
}

impl Default for ScheduleEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let events = ScheduleEvents::new();
        let mut rx = events.subscribe();
        let event = ScheduleEvent::SchedulesChanged {
            assets: 2,
            schedules: 3,
            at: chrono::Utc::now(),
        };
        events.publish(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_listeners_is_silent() {
        let events = ScheduleEvents::default();
        events.publish(ScheduleEvent::SchedulesChanged {
            assets: 0,
            schedules: 0,
            at: chrono::Utc::now(),
        });
    }
}
