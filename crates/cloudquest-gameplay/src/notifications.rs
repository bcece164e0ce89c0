//! Timed on-screen notifications.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Seconds over which an expiring notification fades out.
const FADE_SECONDS: f32 = 1.0;

/// Tone of a notification, used by the presentation layer to pick a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Neutral message
    #[default]
    Info,
    /// Something good happened
    Success,
    /// Something was refused or failed
    Warning,
    /// Achievement or unlock
    Reward,
}

/// One queued message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Text to show
    pub message: String,
    /// Tone
    pub kind: NotificationKind,
    /// Seconds left
    pub remaining: f32,
}

impl Notification {
    /// Opacity in `[0, 1]`, fading over the last second.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.remaining / FADE_SECONDS).clamp(0.0, 1.0)
    }
}

/// Bounded queue of timed notifications, oldest first.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    capacity: usize,
    duration: f32,
}

impl NotificationQueue {
    /// Creates a queue holding at most `capacity` messages, each shown for
    /// `duration` seconds.
    #[must_use]
    pub fn new(capacity: usize, duration: f32) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            duration,
        }
    }

    /// Queues a message with the default duration. The oldest is dropped
    /// when full.
    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.push_for(message, kind, self.duration);
    }

    /// Queues a message shown for `duration` seconds.
    pub fn push_for(&mut self, message: impl Into<String>, kind: NotificationKind, duration: f32) {
        self.items.push_back(Notification {
            message: message.into(),
            kind,
            remaining: duration,
        });
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Ages every message and drops the expired ones.
    pub fn update(&mut self, dt: f32) {
        for item in &mut self.items {
            item.remaining -= dt;
        }
        self.items.retain(|n| n.remaining > 0.0);
    }

    /// Live messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    /// Message texts, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.items.iter().map(|n| n.message.as_str()).collect()
    }

    /// Whether any live message contains `text`.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.items.iter().any(|n| n.message.contains(text))
    }

    /// Number of live messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every message.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
