//! The gameplay session.
//!
//! [`GameSession`] owns every gameplay system and runs one fixed pipeline
//! per frame: mode input, combat or learning, movement and collision,
//! enemy AI, camera, then progress and unlock tracking. Systems never hold
//! references to each other; the session lends what each call needs.

use cloudquest_common::{EntityId, StoreResult, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::abilities::{self, AbilityManager, MAX_EQUIPPED};
use crate::combat::{CombatContext, CombatOutcome, CombatReport, CombatSystem};
use crate::education;
use crate::enemy::EnemyManager;
use crate::events::{EventBus, GameEvent};
use crate::input::{Action, InputSnapshot};
use crate::learning::{LearningCompletion, LearningSession, LearningStatus};
use crate::level::{LevelManager, STARTING_LEVEL};
use crate::notifications::{NotificationKind, NotificationQueue};
use crate::player::{Player, PLAYER_SPAWN};
use crate::progress::{achievement_defs, ProgressTracker};
use crate::progression::{LevelProgressionSystem, PlayerSnapshot};
use crate::save::{self, ProgressRecord, ProgressStore};
use crate::settings::GameSettings;
use crate::stations::{self, LearningStation, StationSet};

/// Base experience for mastering a concept.
const LEARNING_BASE_EXPERIENCE: u32 = 100;

/// Bonus experience for completing the practical.
const PRACTICAL_BONUS_EXPERIENCE: u32 = 50;

/// Seconds the mastery and perfect score notifications stay up.
const CELEBRATION_SECONDS: f32 = 4.0;

/// What the session is doing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Walking around the level
    #[default]
    Exploring,
    /// In an encounter
    Combat,
    /// At a learning station
    Learning,
    /// Menu open, world frozen
    Paused,
}

/// Experience awarded for a passed learning session.
#[must_use]
pub fn learning_experience(completion: &LearningCompletion) -> u32 {
    let quiz_bonus = (completion.quiz_percentage * 0.5) as u32;
    let practical_bonus = if completion.practical_completed {
        PRACTICAL_BONUS_EXPERIENCE
    } else {
        0
    };
    LEARNING_BASE_EXPERIENCE + quiz_bonus + practical_bonus
}

/// One running game.
pub struct GameSession {
    settings: GameSettings,
    mode: GameMode,
    resume_mode: GameMode,
    player: Player,
    levels: LevelManager,
    enemies: EnemyManager,
    combat: CombatSystem,
    abilities: AbilityManager,
    tracker: ProgressTracker,
    progression: LevelProgressionSystem,
    stations: StationSet,
    learning: Option<LearningSession>,
    notifications: NotificationQueue,
    events: EventBus,
    rng: fastrand::Rng,
    grace: f32,
    level_time: f32,
    completed_levels: Vec<String>,
    announced_level: u32,
}

impl GameSession {
    /// Starts fresh progress in the starting level.
    #[must_use]
    pub fn new(mut settings: GameSettings, rng: fastrand::Rng) -> Self {
        settings.validate();
        let viewport = Vec2::new(settings.screen_width, settings.screen_height);
        let mut session = Self {
            mode: GameMode::Exploring,
            resume_mode: GameMode::Exploring,
            player: Player::new(PLAYER_SPAWN, settings.player_speed),
            levels: LevelManager::new(viewport),
            enemies: EnemyManager::new().with_stun_duration(settings.stun_duration),
            combat: CombatSystem::new(&settings),
            abilities: AbilityManager::new(),
            tracker: ProgressTracker::new(),
            progression: LevelProgressionSystem::new(),
            stations: StationSet::for_level(STARTING_LEVEL, settings.station_radius),
            learning: None,
            notifications: NotificationQueue::new(
                settings.max_notifications,
                settings.notification_duration,
            ),
            events: EventBus::default(),
            rng,
            grace: 0.0,
            level_time: 0.0,
            completed_levels: Vec::new(),
            announced_level: 1,
            settings,
        };
        session.enter_level(STARTING_LEVEL);
        session
    }

    /// Starts from whatever `store` holds, or fresh progress if it holds
    /// nothing readable.
    #[must_use]
    pub fn load(settings: GameSettings, rng: fastrand::Rng, store: &dyn ProgressStore) -> Self {
        let mut session = Self::new(settings, rng);
        if let Some(record) = save::load_or_fresh(store) {
            session.restore(&record);
        }
        session
    }

    /// Replaces progress with a saved record.
    pub fn restore(&mut self, record: &ProgressRecord) {
        self.tracker = ProgressTracker::from_record(record);
        self.player = Player::new(PLAYER_SPAWN, self.settings.player_speed);
        self.player
            .restore(record.level, record.experience, &record.learned_concepts);
        for concept in record
            .learned_concepts
            .iter()
            .filter_map(|id| education::concept(id))
        {
            if let Some(ability) = concept.unlock_ability {
                self.player.add_current_ability(ability);
            }
        }
        self.abilities = AbilityManager::new();
        self.abilities
            .restore(&record.unlocked_abilities, &record.equipped_abilities);
        self.progression = LevelProgressionSystem::new();
        self.progression.restore(&record.unlocked_content);
        self.tracker.discover_area(self.levels.current().id());
        self.announced_level = self.tracker.level();
        self.levels.snap_camera(self.player.center());
        info!(
            "Restored progress: level {}, {} concepts",
            record.level,
            record.learned_concepts.len()
        );
    }

    /// Progress as a persistable record.
    #[must_use]
    pub fn to_record(&self) -> ProgressRecord {
        ProgressRecord {
            unlocked_abilities: self
                .abilities
                .unlocked_ids()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            equipped_abilities: self
                .abilities
                .equipped_ids()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            unlocked_content: self.progression.unlocked_ids(),
            ..self.tracker.to_record()
        }
    }

    /// Writes progress to `store`.
    pub fn save_progress(&self, store: &dyn ProgressStore) -> StoreResult<()> {
        match store.save(&self.to_record()) {
            Ok(()) => {
                info!("Progress saved (level {})", self.tracker.level());
                Ok(())
            },
            Err(e) => {
                warn!("Failed to save progress: {e}");
                Err(e)
            },
        }
    }

    // ========================================================================
    // Frame pipeline
    // ========================================================================

    /// Runs one frame.
    pub fn update(&mut self, input: &InputSnapshot, dt: f32) {
        self.notifications.update(dt);

        if input.is_just_pressed(Action::MenuToggle) {
            self.toggle_pause();
            return;
        }

        match self.mode {
            GameMode::Paused => return,
            GameMode::Learning => self.update_learning(input, dt),
            GameMode::Combat => self.update_combat(input, dt),
            GameMode::Exploring => self.update_exploring(input, dt),
        }

        self.tracker.update_session_time(dt);
        self.refresh_progression();
    }

    fn toggle_pause(&mut self) {
        if self.mode == GameMode::Paused {
            self.mode = self.resume_mode;
            debug!("Resumed to {:?}", self.mode);
        } else {
            self.resume_mode = self.mode;
            self.mode = GameMode::Paused;
            debug!("Paused from {:?}", self.resume_mode);
        }
    }

    fn update_exploring(&mut self, input: &InputSnapshot, dt: f32) {
        if input.is_just_pressed(Action::Interact) {
            self.interact();
            if self.mode != GameMode::Exploring {
                return;
            }
        }

        self.level_time += dt;
        let previous = self.player.position();
        self.player.move_by(input.movement(), dt);
        let bounds = self.levels.current().pixel_size();
        self.player.clamp_to_bounds(bounds.x, bounds.y);
        self.player
            .resolve_collision(self.levels.solid_rects(), previous);
        let travelled = self.player.position().distance(previous);
        if travelled > 0.0 {
            self.tracker.track_movement(travelled);
        }

        let player_center = self.player.center();
        if let Some(id) = self.enemies.update(dt, player_center, &mut self.rng) {
            if let Some(enemy) = self.enemies.get(id) {
                self.events.publish(GameEvent::EnemySpawned {
                    entity_id: id,
                    kind: enemy.kind(),
                    position: enemy.position(),
                });
            }
        }

        self.grace = (self.grace - dt).max(0.0);
        if self.grace <= 0.0 {
            if let Some(id) = self.enemies.check_player_collision(&self.player.rect()) {
                self.start_combat(id);
            }
        }

        self.levels.update_camera(player_center, dt);
        self.stations.update(player_center);
    }

    fn start_combat(&mut self, enemy_id: EntityId) {
        let Some(enemy) = self.enemies.get(enemy_id) else {
            return;
        };
        self.combat.start_combat(enemy, &self.abilities);
        self.events.publish(GameEvent::CombatStarted {
            entity_id: enemy_id,
        });
        self.mode = GameMode::Combat;
    }

    fn update_combat(&mut self, input: &InputSnapshot, dt: f32) {
        let Some(enemy_id) = self.combat.enemy_id() else {
            self.mode = GameMode::Exploring;
            return;
        };
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            warn!("Enemy {enemy_id} vanished mid-combat");
            if let Some(report) = self.combat.abort() {
                self.finish_combat(report);
            }
            return;
        };

        let mut ctx = CombatContext {
            player: &mut self.player,
            enemy,
            tracker: &mut self.tracker,
            events: &self.events,
            rng: &mut self.rng,
        };
        let report = match self.combat.handle_input(input, &mut ctx) {
            Some(report) => Some(report),
            None => self.combat.update(dt, &mut ctx),
        };
        if let Some(report) = report {
            self.finish_combat(report);
        }
    }

    fn finish_combat(&mut self, report: CombatReport) {
        for (ability_id, stats) in &report.ability_stats {
            self.abilities.record_usage(ability_id, stats);
        }

        match &report.outcome {
            CombatOutcome::Victory { enemy, experience } => {
                for (entity_id, kind) in self.enemies.remove_dead() {
                    self.events
                        .publish(GameEvent::EnemyDefeated { entity_id, kind });
                }
                self.notify(
                    format!("Defeated {}! +{experience} XP", enemy.display_name()),
                    NotificationKind::Success,
                );
            },
            CombatOutcome::Defeat { .. } => {
                self.levels.snap_camera(self.player.center());
                self.notify("You were defeated! Respawning...", NotificationKind::Warning);
            },
            CombatOutcome::Fled { enemy } => {
                self.notify(
                    format!("Escaped from {}", enemy.display_name()),
                    NotificationKind::Info,
                );
            },
        }

        info!("Combat ended: {:?}", report.outcome);
        self.events.publish(GameEvent::CombatEnded {
            outcome: report.outcome,
        });
        self.grace = self.settings.encounter_grace;
        self.mode = GameMode::Exploring;
    }

    fn update_learning(&mut self, input: &InputSnapshot, dt: f32) {
        let Some(learning) = self.learning.as_mut() else {
            self.mode = GameMode::Exploring;
            return;
        };
        learning.tick(dt);
        match learning.handle_input(input) {
            LearningStatus::InProgress => {},
            LearningStatus::Completed(completion) => {
                self.learning = None;
                self.mode = GameMode::Exploring;
                self.complete_learning(&completion);
            },
            LearningStatus::Cancelled => {
                self.learning = None;
                self.mode = GameMode::Exploring;
            },
        }
    }

    // ========================================================================
    // Stations and learning
    // ========================================================================

    /// Uses the nearest station in range. Mastered concepts only produce a
    /// notification; with no station in range nothing happens.
    pub fn interact(&mut self) {
        let nearby: Vec<&'static str> = self.stations.nearby().map(|s| s.concept_id).collect();
        if nearby.is_empty() {
            debug!("No learning station in range");
            return;
        }

        for concept_id in nearby {
            let Some(concept) = education::concept(concept_id) else {
                continue;
            };
            if self.player.knows(concept_id) {
                self.notify(
                    format!("Already mastered {}!", concept.name),
                    NotificationKind::Info,
                );
                continue;
            }
            if !education::prerequisites_met(concept, self.player.learned_concepts()) {
                let missing: Vec<&str> = concept
                    .prerequisites
                    .iter()
                    .filter(|p| !self.player.knows(p))
                    .filter_map(|p| education::concept(p).map(|c| c.name))
                    .collect();
                self.notify(
                    format!("Learn {} first!", missing.join(", ")),
                    NotificationKind::Warning,
                );
                continue;
            }
            if let Some(learning) = LearningSession::start(concept_id) {
                self.learning = Some(learning);
                self.mode = GameMode::Learning;
                return;
            }
        }
    }

    fn complete_learning(&mut self, completion: &LearningCompletion) {
        let Some(concept) = education::concept(&completion.concept_id) else {
            return;
        };
        self.tracker.add_study_time(completion.study_time);
        self.tracker.complete_quiz(
            concept.id,
            completion.quiz_percentage,
            completion.quiz_score,
        );

        if !completion.passed {
            self.notify("Study more and try again!", NotificationKind::Warning);
            return;
        }
        if !self.player.learn_concept(concept.id) {
            self.notify(
                format!("Already mastered {}!", concept.name),
                NotificationKind::Info,
            );
            return;
        }

        let experience = learning_experience(completion);
        if self.player.gain_experience(experience) > 0 {
            self.events.publish(GameEvent::LevelUp {
                level: self.player.level(),
            });
        }
        self.tracker.learn_concept(concept.id);
        self.tracker.gain_experience(experience);

        for name in self.abilities.unlock_ability(concept.id) {
            self.notify(format!("Unlocked ability: {name}"), NotificationKind::Reward);
        }
        for def in abilities::catalog().iter().filter(|d| d.concept_id == concept.id) {
            if self.abilities.equipped_ids().len() >= MAX_EQUIPPED {
                break;
            }
            self.abilities.equip_ability(def.id);
        }
        if let Some(ability) = concept.unlock_ability {
            self.player.add_current_ability(ability);
        }

        self.events.publish(GameEvent::ConceptLearned {
            concept_id: concept.id.to_string(),
            position: self.player.center(),
        });
        self.notifications.push_for(
            format!("Mastered: {}!", concept.name),
            NotificationKind::Success,
            CELEBRATION_SECONDS,
        );
        self.notify(format!("Gained {experience} XP!"), NotificationKind::Info);
        if completion.quiz_score == completion.quiz_total && completion.quiz_total > 0 {
            self.notifications.push_for(
                "Perfect Score!",
                NotificationKind::Reward,
                CELEBRATION_SECONDS,
            );
        }
        info!("Mastered {} for {experience} XP", concept.name);

        self.check_level_complete();
    }

    fn check_level_complete(&mut self) {
        let level_id = self.levels.current().id().to_string();
        if self.completed_levels.contains(&level_id) {
            return;
        }
        let concepts = self.stations.concept_ids();
        if !concepts.is_empty() && concepts.iter().all(|c| self.player.knows(c)) {
            self.tracker.complete_level(&level_id, self.level_time);
            self.completed_levels.push(level_id);
        }
    }

    /// Prompt for the first station in range whose concept is not yet
    /// mastered.
    #[must_use]
    pub fn interaction_prompt(&self) -> Option<String> {
        self.stations
            .nearby()
            .filter(|s| !self.player.knows(s.concept_id))
            .find_map(|s| education::concept(s.concept_id))
            .map(|c| format!("Press E to learn {}", c.name))
    }

    // ========================================================================
    // Levels
    // ========================================================================

    /// Moves to another level. Refused while not exploring, for locked
    /// levels and for levels with no map.
    pub fn travel_to(&mut self, level_id: &str) -> bool {
        if self.mode != GameMode::Exploring {
            debug!("Cannot travel while {:?}", self.mode);
            return false;
        }
        if !self.progression.is_level_unlocked(level_id) {
            let name = crate::progression::content(level_id).map_or(level_id, |c| c.name);
            self.notify(format!("{name} is locked!"), NotificationKind::Warning);
            return false;
        }
        if self.levels.get(level_id).is_none() {
            debug!("Level {level_id} has no map");
            self.notify("That area is not open yet", NotificationKind::Info);
            return false;
        }
        self.enter_level(level_id);
        true
    }

    fn enter_level(&mut self, level_id: &str) {
        if !self.levels.load_level(level_id) {
            return;
        }
        self.enemies = EnemyManager::new().with_stun_duration(self.settings.stun_duration);
        if let Some(layout) = stations::layout(level_id) {
            for point in layout.spawn_points() {
                self.enemies.add_spawn_point(point);
            }
            for &(kind, (x, y)) in layout.initial_enemies {
                if let Some(id) = self.enemies.spawn(kind, crate::level::tile_to_world(x, y)) {
                    self.events.publish(GameEvent::EnemySpawned {
                        entity_id: id,
                        kind,
                        position: crate::level::tile_to_world(x, y),
                    });
                }
            }
        }
        self.stations = StationSet::for_level(level_id, self.settings.station_radius);
        self.player.set_position(PLAYER_SPAWN);
        self.levels.snap_camera(self.player.center());
        self.stations.update(self.player.center());
        self.level_time = 0.0;
        self.grace = self.settings.encounter_grace;
        if self.tracker.discover_area(level_id) {
            let name = self.levels.current().name().to_string();
            self.notify(format!("Entered {name}"), NotificationKind::Info);
        }
        info!("Entered level {level_id}");
    }

    // ========================================================================
    // Progress
    // ========================================================================

    fn refresh_progression(&mut self) {
        for id in self.tracker.take_new_achievements() {
            let name = achievement_defs()
                .iter()
                .find(|d| d.id == id)
                .map_or(id, |d| d.name);
            self.notify(
                format!("Achievement unlocked: {name}!"),
                NotificationKind::Reward,
            );
            self.events.publish(GameEvent::AchievementUnlocked {
                achievement_id: id.to_string(),
            });
        }

        let level = self.tracker.level();
        if level > self.announced_level {
            self.announced_level = level;
            self.notify(format!("Level up! Now level {level}"), NotificationKind::Reward);
        }

        let snapshot = PlayerSnapshot {
            level,
            concepts: self.player.learned_concepts().iter().cloned().collect(),
            achievements: self
                .tracker
                .earned_ids()
                .into_iter()
                .map(String::from)
                .collect(),
            enemy_defeats: self.tracker.combat().enemies_defeated.clone(),
        };
        for item in self.progression.update_player_progress(snapshot) {
            self.notify(format!("Unlocked: {}!", item.name), NotificationKind::Reward);
            self.events.publish(GameEvent::ContentUnlocked {
                content_id: item.id.to_string(),
            });
        }
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.notifications.push(message, kind);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Tuning in effect.
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player, for scripted setups.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Levels and camera.
    #[must_use]
    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }

    /// Live enemies.
    #[must_use]
    pub fn enemies(&self) -> &EnemyManager {
        &self.enemies
    }

    /// Mutable enemies, for scripted setups.
    pub fn enemies_mut(&mut self) -> &mut EnemyManager {
        &mut self.enemies
    }

    /// Combat state.
    #[must_use]
    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    /// Ability loadout.
    #[must_use]
    pub fn abilities(&self) -> &AbilityManager {
        &self.abilities
    }

    /// Mutable ability loadout, for the equip screen.
    pub fn abilities_mut(&mut self) -> &mut AbilityManager {
        &mut self.abilities
    }

    /// Progress tracker.
    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Unlock engine.
    #[must_use]
    pub fn progression(&self) -> &LevelProgressionSystem {
        &self.progression
    }

    /// Stations of the current level.
    #[must_use]
    pub fn stations(&self) -> &StationSet {
        &self.stations
    }

    /// First station in range.
    #[must_use]
    pub fn nearby_station(&self) -> Option<&LearningStation> {
        self.stations.nearby().next()
    }

    /// Running learning session.
    #[must_use]
    pub fn learning(&self) -> Option<&LearningSession> {
        self.learning.as_ref()
    }

    /// Live notifications.
    #[must_use]
    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// Takes pending audio and particle events.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.events.drain()
    }
}
