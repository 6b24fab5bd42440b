//! Render lifecycle events
//!
//! Type-safe events over plain channels. The session publishes, any number
//! of observers subscribe; a publish with no subscribers is free.

use std::sync::mpsc::{channel, Receiver, Sender};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one render pass, assigned at `render()` time
pub type PassId = Uuid;

/// Lifecycle events of a render pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderEvent {
    /// A pass began building its fiber tree
    PassStarted { pass: PassId },
    /// A render arrived while another pass was in flight and was queued
    PassQueued { pass: PassId },
    /// The scheduler ran out of turn budget with work remaining;
    /// `units_done` counts units processed so far in the pass
    PassYielded { pass: PassId, units_done: usize },
    /// The completed tree was attached and published
    PassCommitted { pass: PassId, fiber_count: usize },
    /// The pass was aborted; the previously committed tree is untouched
    PassFailed { pass: PassId, reason: String },
}

impl RenderEvent {
    /// The pass this event belongs to
    pub fn pass(&self) -> PassId {
        match self {
            RenderEvent::PassStarted { pass }
            | RenderEvent::PassQueued { pass }
            | RenderEvent::PassYielded { pass, .. }
            | RenderEvent::PassCommitted { pass, .. }
            | RenderEvent::PassFailed { pass, .. } => *pass,
        }
    }
}

/// Fan-out event bus; disconnected subscribers are pruned on publish
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Vec<Sender<RenderEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to all live subscribers
    pub fn publish(&mut self, event: RenderEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Subscribe to events
    pub fn subscribe(&mut self) -> Receiver<RenderEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();

        let pass = Uuid::now_v7();
        bus.publish(RenderEvent::PassStarted { pass });

        match rx.try_recv() {
            Ok(RenderEvent::PassStarted { pass: got }) => assert_eq!(got, pass),
            other => panic!("expected PassStarted, got {:?}", other),
        }
    }

    #[test]
    fn test_disconnected_subscriber_is_pruned() {
        let mut bus = EventBus::new();
        drop(bus.subscribe());

        bus.publish(RenderEvent::PassStarted { pass: Uuid::now_v7() });
        assert!(bus.senders.is_empty());
    }

    #[test]
    fn test_events_serialize_for_logging() {
        let pass = Uuid::now_v7();
        let event = RenderEvent::PassCommitted {
            pass,
            fiber_count: 4,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["PassCommitted"]["fiber_count"], 4);
        assert_eq!(value["PassCommitted"]["pass"], pass.to_string());
    }

    #[test]
    fn test_event_pass_accessor() {
        let pass = Uuid::now_v7();
        let event = RenderEvent::PassYielded {
            pass,
            units_done: 3,
        };
        assert_eq!(event.pass(), pass);
    }
}
