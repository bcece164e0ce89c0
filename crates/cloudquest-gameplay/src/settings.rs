//! Gameplay tuning.
//!
//! Every timer, radius and probability the session uses lives here so the
//! engine can override them from its config file.

use serde::{Deserialize, Serialize};

/// Size of one tile in pixels.
pub const TILE_SIZE: u32 = 32;

/// Gameplay tuning values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Viewport width in pixels
    pub screen_width: f32,
    /// Viewport height in pixels
    pub screen_height: f32,
    /// Player movement speed in pixels per second
    pub player_speed: f32,
    /// Distance from the player centre at which a station can be used
    pub station_radius: f32,
    /// Seconds a notification stays on screen
    pub notification_duration: f32,
    /// Maximum notifications kept at once
    pub max_notifications: usize,
    /// Seconds before the enemy acts on its turn
    pub enemy_turn_delay: f32,
    /// Seconds the result screen lingers before combat closes
    pub combat_end_delay: f32,
    /// Probability that fleeing succeeds
    pub flee_chance: f32,
    /// Seconds after an encounter during which touching enemies is ignored
    pub encounter_grace: f32,
    /// Seconds an enemy stays stunned after taking damage
    pub stun_duration: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            screen_width: 1024.0,
            screen_height: 768.0,
            player_speed: 200.0,
            station_radius: 48.0,
            notification_duration: 3.0,
            max_notifications: 5,
            enemy_turn_delay: 2.0,
            combat_end_delay: 2.0,
            flee_chance: 0.7,
            encounter_grace: 2.0,
            stun_duration: 0.5,
        }
    }
}

impl GameSettings {
    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.screen_width = self.screen_width.clamp(320.0, 7680.0);
        self.screen_height = self.screen_height.clamp(240.0, 4320.0);
        self.player_speed = self.player_speed.clamp(10.0, 2000.0);
        self.station_radius = self.station_radius.max(0.0);
        self.max_notifications = self.max_notifications.max(1);
        self.flee_chance = self.flee_chance.clamp(0.0, 1.0);
        self.enemy_turn_delay = self.enemy_turn_delay.max(0.0);
        self.combat_end_delay = self.combat_end_delay.max(0.0);
        self.encounter_grace = self.encounter_grace.max(0.0);
        self.stun_duration = self.stun_duration.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.screen_width, 1024.0);
        assert_eq!(settings.max_notifications, 5);
        assert!((settings.flee_chance - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_clamps() {
        let mut settings = GameSettings {
            flee_chance: 3.0,
            max_notifications: 0,
            stun_duration: -1.0,
            ..GameSettings::default()
        };
        settings.validate();
        assert_eq!(settings.flee_chance, 1.0);
        assert_eq!(settings.max_notifications, 1);
        assert_eq!(settings.stun_duration, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: GameSettings =
            serde_json::from_str(r#"{ "player_speed": 150.0 }"#).expect("parse");
        assert_eq!(settings.player_speed, 150.0);
        assert_eq!(settings.station_radius, 48.0);
    }
}
