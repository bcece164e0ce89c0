//! Fire-and-forget notifications for audio and particle collaborators.
//!
//! The session publishes events as things happen; whatever plays sounds or
//! spawns particles drains the bus once per frame. Nothing in the core
//! reads events back.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use cloudquest_common::{EntityId, Vec2};

use crate::combat::CombatOutcome;
use crate::enemy::EnemyKind;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Enemy spawned
    EnemySpawned {
        /// Entity ID
        entity_id: EntityId,
        /// Enemy kind
        kind: EnemyKind,
        /// Spawn position
        position: Vec2,
    },
    /// Enemy removed after being defeated
    EnemyDefeated {
        /// Entity ID
        entity_id: EntityId,
        /// Enemy kind
        kind: EnemyKind,
    },
    /// Encounter began
    CombatStarted {
        /// Enemy being fought
        entity_id: EntityId,
    },
    /// Encounter resolved
    CombatEnded {
        /// How it ended
        outcome: CombatOutcome,
    },
    /// Something took damage
    Damage {
        /// Where to show the effect
        position: Vec2,
        /// Damage amount
        amount: u32,
    },
    /// Something was healed
    Heal {
        /// Where to show the effect
        position: Vec2,
        /// Amount restored
        amount: u32,
    },
    /// A learning session passed and a concept was learned
    ConceptLearned {
        /// Concept ID
        concept_id: String,
        /// Where to show the effect
        position: Vec2,
    },
    /// Player reached a new level
    LevelUp {
        /// New level
        level: u32,
    },
    /// Achievement unlocked
    AchievementUnlocked {
        /// Achievement ID
        achievement_id: String,
    },
    /// Progression content unlocked
    ContentUnlocked {
        /// Content ID
        content_id: String,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(GameEvent::LevelUp { level: 2 });
        bus.publish(GameEvent::Heal {
            position: Vec2::ZERO,
            amount: 15,
        });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GameEvent::LevelUp { level: 2 });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        bus.publish(GameEvent::LevelUp { level: 2 });
        bus.publish(GameEvent::LevelUp { level: 3 });
        let events = bus.drain();
        assert_eq!(events, vec![GameEvent::LevelUp { level: 2 }]);
        assert_eq!(bus.capacity(), 1);
    }
}
