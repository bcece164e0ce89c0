//! The player entity.
//!
//! Owns position, health and experience. Movement is integrated by the
//! session each exploring frame: move, clamp to the level, then revert the
//! step if it ended inside a solid tile.

use cloudquest_common::{Facing, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::progress::experience_for_level;

/// Default spawn position in pixels.
pub const PLAYER_SPAWN: Vec2 = Vec2::new(200.0, 200.0);

/// Player sprite size in pixels.
pub const PLAYER_SIZE: f32 = 32.0;

/// Starting and base maximum health.
pub const PLAYER_BASE_HEALTH: u32 = 100;

/// Max health gained per level-up.
const HEALTH_PER_LEVEL: u32 = 10;

/// The single player entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    position: Vec2,
    spawn: Vec2,
    size: f32,
    speed: f32,
    facing: Facing,
    moving: bool,
    health: u32,
    max_health: u32,
    level: u32,
    experience: u32,
    learned_concepts: Vec<String>,
    current_abilities: Vec<String>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PLAYER_SPAWN, 200.0)
    }
}

impl Player {
    /// Creates a player at `spawn` moving at `speed` pixels per second.
    #[must_use]
    pub fn new(spawn: Vec2, speed: f32) -> Self {
        Self {
            position: spawn,
            spawn,
            size: PLAYER_SIZE,
            speed,
            facing: Facing::Down,
            moving: false,
            health: PLAYER_BASE_HEALTH,
            max_health: PLAYER_BASE_HEALTH,
            level: 1,
            experience: 0,
            learned_concepts: Vec::new(),
            current_abilities: Vec::new(),
        }
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Moves along `direction` for `dt` seconds. Returns the distance moved.
    pub fn move_by(&mut self, direction: Vec2, dt: f32) -> f32 {
        let direction = direction.normalized();
        self.moving = !direction.is_zero();
        if !self.moving {
            return 0.0;
        }

        let step = direction * (self.speed * dt);
        self.position += step;
        if let Some(facing) = Facing::from_vec2(direction) {
            self.facing = facing;
        }
        step.length()
    }

    /// Keeps the sprite inside a level of `width` x `height` pixels.
    pub fn clamp_to_bounds(&mut self, width: f32, height: f32) {
        let max = Vec2::new((width - self.size).max(0.0), (height - self.size).max(0.0));
        self.position = self.position.clamp(Vec2::ZERO, max);
    }

    /// Checks whether the player overlaps any obstacle.
    #[must_use]
    pub fn collides(&self, obstacles: &[Rect]) -> bool {
        let rect = self.rect();
        obstacles.iter().any(|o| rect.overlaps(o))
    }

    /// Reverts to `previous` if the current position overlaps an obstacle.
    /// Returns true if the move was reverted.
    pub fn resolve_collision(&mut self, obstacles: &[Rect], previous: Vec2) -> bool {
        if self.collides(obstacles) {
            self.position = previous;
            true
        } else {
            false
        }
    }

    /// Teleports the player.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Centre of the sprite.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Collision rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_position(self.position, self.size, self.size)
    }

    /// Facing direction.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the player moved on the last movement update.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Movement speed in pixels per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Applies damage. Health floors at 0. Returns true if the player died.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    /// Restores health up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Restores full health at the spawn point.
    pub fn respawn(&mut self) {
        self.health = self.max_health;
        self.position = self.spawn;
        self.moving = false;
        info!("Player respawned at ({}, {})", self.spawn.x, self.spawn.y);
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Whether health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    // ========================================================================
    // Experience
    // ========================================================================

    /// Adds experience, applying as many level-ups as it pays for.
    /// Each level grants max health and a full heal. Returns levels gained.
    pub fn gain_experience(&mut self, amount: u32) -> u32 {
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= experience_for_level(self.level) {
            self.experience -= experience_for_level(self.level);
            self.level += 1;
            self.max_health += HEALTH_PER_LEVEL;
            self.health = self.max_health;
            gained += 1;
            info!("Player reached level {}", self.level);
        }
        gained
    }

    /// Current level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience toward the next level.
    #[must_use]
    pub fn experience(&self) -> u32 {
        self.experience
    }

    // ========================================================================
    // Knowledge
    // ========================================================================

    /// Records a learned concept. Returns false if it was already known.
    pub fn learn_concept(&mut self, concept_id: &str) -> bool {
        if self.knows(concept_id) {
            return false;
        }
        self.learned_concepts.push(concept_id.to_string());
        debug!("Player learned {concept_id}");
        true
    }

    /// Checks whether a concept has been learned.
    #[must_use]
    pub fn knows(&self, concept_id: &str) -> bool {
        self.learned_concepts.iter().any(|c| c == concept_id)
    }

    /// Learned concept ids.
    #[must_use]
    pub fn learned_concepts(&self) -> &[String] {
        &self.learned_concepts
    }

    /// Adds to the flat ability-name list kept alongside the ability manager.
    pub fn add_current_ability(&mut self, name: &str) {
        if !self.current_abilities.iter().any(|a| a == name) {
            self.current_abilities.push(name.to_string());
        }
    }

    /// Flat ability-name list.
    #[must_use]
    pub fn current_abilities(&self) -> &[String] {
        &self.current_abilities
    }

    /// Restores level and knowledge from saved progress.
    pub fn restore(&mut self, level: u32, experience: u32, learned: &[String]) {
        self.level = level.max(1);
        self.experience = experience;
        self.max_health = PLAYER_BASE_HEALTH + HEALTH_PER_LEVEL * (self.level - 1);
        self.health = self.max_health;
        for concept in learned {
            self.learn_concept(concept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player() {
        let player = Player::default();
        assert_eq!(player.position(), PLAYER_SPAWN);
        assert_eq!(player.health(), 100);
        assert_eq!(player.level(), 1);
        assert!(player.learned_concepts().is_empty());
    }

    #[test]
    fn test_move_uses_speed_and_dt() {
        let mut player = Player::new(Vec2::ZERO, 200.0);
        let moved = player.move_by(Vec2::new(1.0, 0.0), 0.5);
        assert!((moved - 100.0).abs() < 0.001);
        assert_eq!(player.position(), Vec2::new(100.0, 0.0));
        assert_eq!(player.facing(), Facing::Right);
        assert!(player.is_moving());
    }

    #[test]
    fn test_move_normalizes_direction() {
        let mut player = Player::new(Vec2::ZERO, 100.0);
        player.move_by(Vec2::new(3.0, 4.0), 1.0);
        assert!((player.position().length() - 100.0).abs() < 0.01);
        assert_eq!(player.facing(), Facing::Down);
    }

    #[test]
    fn test_no_input_keeps_facing() {
        let mut player = Player::new(Vec2::ZERO, 100.0);
        player.move_by(Vec2::LEFT, 0.1);
        assert_eq!(player.move_by(Vec2::ZERO, 0.1), 0.0);
        assert_eq!(player.facing(), Facing::Left);
        assert!(!player.is_moving());
    }

    #[test]
    fn test_clamp_to_bounds() {
        let mut player = Player::new(Vec2::new(-20.0, 2000.0), 200.0);
        player.clamp_to_bounds(1280.0, 960.0);
        assert_eq!(player.position(), Vec2::new(0.0, 928.0));
    }

    #[test]
    fn test_collision_reverts() {
        let mut player = Player::new(Vec2::new(0.0, 0.0), 200.0);
        let wall = [Rect::new(40.0, 0.0, 32.0, 32.0)];
        let previous = player.position();
        player.move_by(Vec2::RIGHT, 0.1);
        assert!(player.resolve_collision(&wall, previous));
        assert_eq!(player.position(), previous);

        player.move_by(Vec2::DOWN, 0.1);
        assert!(!player.resolve_collision(&wall, previous));
    }

    #[test]
    fn test_damage_and_heal() {
        let mut player = Player::default();
        assert!(!player.take_damage(30));
        assert_eq!(player.health(), 70);
        assert_eq!(player.heal(50), 30);
        assert_eq!(player.health(), 100);
        assert!(player.take_damage(500));
        assert_eq!(player.health(), 0);
        assert!(!player.is_alive());
    }

    #[test]
    fn test_level_cascade() {
        let mut player = Player::default();
        player.take_damage(50);
        assert_eq!(player.gain_experience(260), 2);
        assert_eq!(player.level(), 3);
        assert_eq!(player.experience(), 10);
        assert_eq!(player.max_health(), 120);
        assert_eq!(player.health(), 120);
    }

    #[test]
    fn test_learn_concept_unique() {
        let mut player = Player::default();
        assert!(player.learn_concept("ec2_basics"));
        assert!(!player.learn_concept("ec2_basics"));
        assert_eq!(player.learned_concepts().len(), 1);
        assert!(player.knows("ec2_basics"));
    }

    #[test]
    fn test_respawn() {
        let mut player = Player::default();
        player.set_position(Vec2::new(500.0, 500.0));
        player.take_damage(100);
        player.respawn();
        assert_eq!(player.health(), player.max_health());
        assert_eq!(player.position(), PLAYER_SPAWN);
    }

    #[test]
    fn test_restore() {
        let mut player = Player::default();
        player.restore(3, 40, &["s3_storage".to_string()]);
        assert_eq!(player.level(), 3);
        assert_eq!(player.max_health(), 120);
        assert!(player.knows("s3_storage"));
    }
}
