//! Smooth-follow camera.
//!
//! The offset is the world position of the viewport's top-left corner. Each
//! frame it eases toward a desired offset that centres the target, clamped
//! so the viewport never shows outside the level.

use cloudquest_common::{Rect, Vec2};

/// Default follow speed (fraction of the remaining distance per second).
pub const DEFAULT_FOLLOW_SPEED: f32 = 5.0;

/// 2D camera for viewing the level.
#[derive(Debug, Clone)]
pub struct Camera {
    offset: Vec2,
    desired: Vec2,
    viewport: Vec2,
    follow_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(1024.0, 768.0))
    }
}

impl Camera {
    /// Creates a camera with the given viewport size in pixels.
    #[must_use]
    pub fn new(viewport: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            desired: Vec2::ZERO,
            viewport,
            follow_speed: DEFAULT_FOLLOW_SPEED,
        }
    }

    fn clamped_offset(&self, target: Vec2, level_size: Vec2) -> Vec2 {
        let desired = target - self.viewport * 0.5;
        let max = Vec2::new(
            (level_size.x - self.viewport.x).max(0.0),
            (level_size.y - self.viewport.y).max(0.0),
        );
        desired.clamp(Vec2::ZERO, max)
    }

    /// Sets the desired offset so `target` is centred, within `level_size`.
    pub fn follow(&mut self, target: Vec2, level_size: Vec2) {
        self.desired = self.clamped_offset(target, level_size);
    }

    /// Eases the offset toward the desired offset.
    pub fn update(&mut self, dt: f32) {
        let t = (self.follow_speed * dt).min(1.0);
        self.offset += (self.desired - self.offset) * t;
    }

    /// Jumps straight to the clamped offset for `target`.
    pub fn snap_to(&mut self, target: Vec2, level_size: Vec2) {
        self.desired = self.clamped_offset(target, level_size);
        self.offset = self.desired;
    }

    /// Current offset.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Desired offset.
    #[must_use]
    pub fn desired(&self) -> Vec2 {
        self.desired
    }

    /// Viewport size.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Converts world coordinates to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    /// Visible world rectangle.
    #[must_use]
    pub fn visible_bounds(&self) -> Rect {
        Rect::from_position(self.offset, self.viewport.x, self.viewport.y)
    }
}
