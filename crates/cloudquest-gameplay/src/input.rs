//! Input snapshot consumed once per frame.
//!
//! The platform layer owns key polling. Each frame it hands the session an
//! [`InputSnapshot`] saying which logical actions are held and which were
//! pressed this frame.

use ahash::AHashSet;
use cloudquest_common::Vec2;
use serde::{Deserialize, Serialize};

/// Logical game actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move up / previous option
    MoveUp,
    /// Move down / next option
    MoveDown,
    /// Move left / previous page
    MoveLeft,
    /// Move right / next page
    MoveRight,
    /// Use a nearby learning station, advance a learning page
    Interact,
    /// Confirm the highlighted option
    Confirm,
    /// Flee combat or leave a learning session
    Cancel,
    /// Pause or resume
    MenuToggle,
}

impl Action {
    /// All actions.
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::MoveUp,
            Self::MoveDown,
            Self::MoveLeft,
            Self::MoveRight,
            Self::Interact,
            Self::Confirm,
            Self::Cancel,
            Self::MenuToggle,
        ]
    }
}

/// Pull-based input state for a single frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    held: AHashSet<Action>,
    just_pressed: AHashSet<Action>,
}

impl InputSnapshot {
    /// Creates an empty snapshot (nothing pressed).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an action as held this frame.
    #[must_use]
    pub fn with_held(mut self, action: Action) -> Self {
        self.held.insert(action);
        self
    }

    /// Marks an action as pressed this frame. A pressed action is also held.
    #[must_use]
    pub fn with_pressed(mut self, action: Action) -> Self {
        self.held.insert(action);
        self.just_pressed.insert(action);
        self
    }

    /// Sets the held state of an action.
    pub fn set_held(&mut self, action: Action, held: bool) {
        if held {
            self.held.insert(action);
        } else {
            self.held.remove(&action);
        }
    }

    /// Records a press edge for an action.
    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
        self.just_pressed.insert(action);
    }

    /// Check if an action is held.
    #[must_use]
    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Check if an action was just pressed this frame.
    #[must_use]
    pub fn is_just_pressed(&self, action: Action) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Clears press edges, keeping held actions.
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }

    /// Movement direction from the held movement actions, normalized so
    /// diagonals are not faster.
    #[must_use]
    pub fn movement(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_held(Action::MoveUp) {
            movement.y -= 1.0;
        }
        if self.is_held(Action::MoveDown) {
            movement.y += 1.0;
        }
        if self.is_held(Action::MoveLeft) {
            movement.x -= 1.0;
        }
        if self.is_held(Action::MoveRight) {
            movement.x += 1.0;
        }

        movement.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let input = InputSnapshot::new();
        for action in Action::all() {
            assert!(!input.is_held(action));
            assert!(!input.is_just_pressed(action));
        }
        assert_eq!(input.movement(), Vec2::ZERO);
    }

    #[test]
    fn test_diagonal_movement_normalized() {
        let input = InputSnapshot::new()
            .with_held(Action::MoveUp)
            .with_held(Action::MoveRight);
        let m = input.movement();
        assert!((m.length() - 1.0).abs() < 0.001);
        assert!(m.x > 0.0 && m.y < 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let input = InputSnapshot::new()
            .with_held(Action::MoveLeft)
            .with_held(Action::MoveRight);
        assert_eq!(input.movement(), Vec2::ZERO);
    }

    #[test]
    fn test_end_frame_keeps_held() {
        let mut input = InputSnapshot::new().with_pressed(Action::MoveDown);
        assert!(input.is_just_pressed(Action::MoveDown));
        input.end_frame();
        assert!(!input.is_just_pressed(Action::MoveDown));
        assert!(input.is_held(Action::MoveDown));

        input.set_held(Action::MoveDown, false);
        assert!(!input.is_held(Action::MoveDown));
    }
}
