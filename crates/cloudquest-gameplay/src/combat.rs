//! Turn-based encounters.
//!
//! An encounter pits the player against one enemy. The combat system holds
//! only per-encounter state; the player, the enemy and the tracker are
//! lent to it on every call through a [`CombatContext`]. Abilities are a
//! snapshot of the loadout taken when the encounter starts, so cooldowns
//! reset for every fight and usage stats are handed back when it closes.

use cloudquest_common::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::abilities::{
    apply_effect, AbilityEffect, AbilityManager, AbilityStats, CloudAbility, EffectKind,
    BASIC_ATTACK,
};
use crate::enemy::{CloudEnemy, EnemyKind};
use crate::events::{EventBus, GameEvent};
use crate::input::{Action, InputSnapshot};
use crate::player::Player;
use crate::progress::{BattleReport, ProgressTracker};
use crate::settings::GameSettings;

/// Combat log lines kept.
pub const MAX_LOG_LINES: usize = 8;

/// Base experience for a victory, before the enemy health bonus.
const VICTORY_BASE_EXPERIENCE: u32 = 50;

/// Turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    /// Waiting for the player to pick an ability
    PlayerTurn,
    /// Enemy acts after a delay
    EnemyTurn,
    /// Result shown, closes after a delay
    CombatEnd,
}

/// How an encounter ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Enemy defeated
    Victory {
        /// Enemy kind
        enemy: EnemyKind,
        /// Experience awarded
        experience: u32,
    },
    /// Player defeated
    Defeat {
        /// Enemy kind
        enemy: EnemyKind,
    },
    /// Player escaped
    Fled {
        /// Enemy kind
        enemy: EnemyKind,
    },
}

/// Everything a closed encounter hands back to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatReport {
    /// Enemy fought
    pub enemy_id: EntityId,
    /// Result
    pub outcome: CombatOutcome,
    /// Usage per ability id during the encounter
    pub ability_stats: Vec<(&'static str, AbilityStats)>,
}

/// State lent to the combat system for one call.
pub struct CombatContext<'a> {
    /// The player
    pub player: &'a mut Player,
    /// The enemy being fought
    pub enemy: &'a mut CloudEnemy,
    /// Progress tracker for rewards
    pub tracker: &'a mut ProgressTracker,
    /// Audio and particle events
    pub events: &'a EventBus,
    /// Randomness for fleeing
    pub rng: &'a mut fastrand::Rng,
}

#[derive(Debug, Clone)]
struct Encounter {
    enemy_id: EntityId,
    enemy_kind: EnemyKind,
    state: CombatState,
    timer: f32,
    selected: usize,
    abilities: Vec<CloudAbility>,
    log: VecDeque<String>,
    outcome: Option<CombatOutcome>,
    damage_dealt: u32,
    damage_taken: u32,
    turns: u32,
    cooldown_misses: u32,
    used: Vec<String>,
}

impl Encounter {
    fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("combat: {line}");
        self.log.push_back(line);
        while self.log.len() > MAX_LOG_LINES {
            self.log.pop_front();
        }
    }

    fn set_state(&mut self, state: CombatState) {
        self.state = state;
        self.timer = 0.0;
    }

    fn finish(&mut self, outcome: CombatOutcome) {
        info!("Combat against {} ended: {:?}", self.enemy_kind, outcome);
        self.outcome = Some(outcome);
        self.set_state(CombatState::CombatEnd);
    }

    fn report(&self, outcome: CombatOutcome) -> CombatReport {
        CombatReport {
            enemy_id: self.enemy_id,
            outcome,
            ability_stats: self
                .abilities
                .iter()
                .filter(|a| a.stats().times_used > 0)
                .map(|a| (a.id(), *a.stats()))
                .collect(),
        }
    }
}

/// Runs at most one encounter at a time.
#[derive(Debug, Clone)]
pub struct CombatSystem {
    encounter: Option<Encounter>,
    enemy_turn_delay: f32,
    combat_end_delay: f32,
    flee_chance: f32,
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new(&GameSettings::default())
    }
}

impl CombatSystem {
    /// Creates an idle combat system.
    #[must_use]
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            encounter: None,
            enemy_turn_delay: settings.enemy_turn_delay,
            combat_end_delay: settings.combat_end_delay,
            flee_chance: settings.flee_chance,
        }
    }

    /// Whether an encounter is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.encounter.is_some()
    }

    /// Begins an encounter, snapshotting the equipped abilities.
    pub fn start_combat(&mut self, enemy: &CloudEnemy, abilities: &AbilityManager) {
        let mut snapshot: Vec<CloudAbility> = abilities
            .equipped()
            .into_iter()
            .map(|a| CloudAbility::new(a.def()))
            .collect();
        if snapshot.is_empty() {
            snapshot.push(CloudAbility::new(&BASIC_ATTACK));
        }

        let mut encounter = Encounter {
            enemy_id: enemy.id(),
            enemy_kind: enemy.kind(),
            state: CombatState::PlayerTurn,
            timer: 0.0,
            selected: 0,
            abilities: snapshot,
            log: VecDeque::new(),
            outcome: None,
            damage_dealt: 0,
            damage_taken: 0,
            turns: 0,
            cooldown_misses: 0,
            used: Vec::new(),
        };
        info!("Combat started against {} {}", enemy.kind(), enemy.id());
        encounter.log(format!(
            "Combat started against {}!",
            enemy.kind().display_name()
        ));
        self.encounter = Some(encounter);
    }

    /// Handles one frame of combat input during the player's turn.
    /// Returns a report if the input closed the encounter.
    pub fn handle_input(
        &mut self,
        input: &InputSnapshot,
        ctx: &mut CombatContext<'_>,
    ) -> Option<CombatReport> {
        if self.state() != Some(CombatState::PlayerTurn) {
            return None;
        }
        if input.is_just_pressed(Action::MoveUp) {
            self.select_previous();
        }
        if input.is_just_pressed(Action::MoveDown) {
            self.select_next();
        }
        if input.is_just_pressed(Action::Confirm) {
            let index = self.selected_index();
            self.use_ability(index, ctx);
            return None;
        }
        if input.is_just_pressed(Action::Cancel) {
            return self.flee(ctx);
        }
        None
    }

    /// Moves the selection down, wrapping around.
    pub fn select_next(&mut self) {
        if let Some(enc) = &mut self.encounter {
            enc.selected = (enc.selected + 1) % enc.abilities.len();
        }
    }

    /// Moves the selection up, wrapping around.
    pub fn select_previous(&mut self) {
        if let Some(enc) = &mut self.encounter {
            let len = enc.abilities.len();
            enc.selected = (enc.selected + len - 1) % len;
        }
    }

    /// Executes the ability at `index` on the player's turn. An ability still
    /// cooling down only logs a message.
    pub fn use_ability(&mut self, index: usize, ctx: &mut CombatContext<'_>) {
        let Some(enc) = &mut self.encounter else {
            return;
        };
        if enc.state != CombatState::PlayerTurn {
            return;
        }
        let Some(ability) = enc.abilities.get_mut(index) else {
            return;
        };
        if !ability.is_ready() {
            let line = format!("{} is on cooldown!", ability.name());
            enc.cooldown_misses += 1;
            enc.log(line);
            return;
        }

        ability.trigger();
        let def = ability.def();
        let mut lines = Vec::new();
        let mut dealt = 0;
        let mut healed = 0;

        if let Some(special) = def.special {
            if let Some(out) = special.apply_side_effect(ctx.player, ctx.enemy) {
                healed += out.healed;
                lines.push(out.message);
            }
        }
        for effect in def.effects {
            let mut effect: AbilityEffect = *effect;
            if effect.kind == EffectKind::Damage {
                if let Some(special) = def.special {
                    let (value, line) = special.modify_damage(effect.value, ctx.enemy);
                    effect.value = value;
                    lines.extend(line.map(str::to_string));
                }
            }
            let out = apply_effect(effect, def.concept_id, ctx.player, ctx.enemy);
            dealt += out.dealt;
            healed += out.healed;
            if effect.kind != EffectKind::Damage {
                lines.push(out.message);
            }
        }
        ability.record(dealt, healed);

        if def.base_damage() > 0 {
            lines.push(format!("Used {} for {} damage!", def.name, dealt));
        } else {
            lines.push(format!("Used {}!", def.name));
        }
        if dealt > 0 {
            ctx.events.publish(GameEvent::Damage {
                position: ctx.enemy.center(),
                amount: dealt,
            });
        }
        if healed > 0 {
            ctx.events.publish(GameEvent::Heal {
                position: ctx.player.center(),
                amount: healed,
            });
        }

        for a in &mut enc.abilities {
            a.tick_cooldown();
        }
        enc.turns += 1;
        enc.damage_dealt += dealt;
        if def.id != BASIC_ATTACK.id {
            enc.used.push(def.id.to_string());
        }
        for line in lines {
            enc.log(line);
        }

        if ctx.enemy.is_alive() {
            enc.set_state(CombatState::EnemyTurn);
        } else {
            Self::win(enc, ctx);
        }
    }

    fn win(enc: &mut Encounter, ctx: &mut CombatContext<'_>) {
        // Measured before the level-up heal
        let health_remaining = if ctx.player.max_health() == 0 {
            0.0
        } else {
            ctx.player.health() as f32 / ctx.player.max_health() as f32
        };

        let experience = VICTORY_BASE_EXPERIENCE + ctx.enemy.max_health() / 10;
        let levels = ctx.player.gain_experience(experience);
        ctx.tracker.gain_experience(experience);
        if levels > 0 {
            ctx.events.publish(GameEvent::LevelUp {
                level: ctx.player.level(),
            });
        }

        ctx.tracker.win_battle(&BattleReport {
            enemy_kind: enc.enemy_kind,
            damage_dealt: enc.damage_dealt,
            damage_taken: enc.damage_taken,
            abilities_used: enc.used.clone(),
            health_remaining,
            turns: enc.turns,
            cooldown_misses: enc.cooldown_misses,
        });

        enc.log(format!(
            "{} defeated! Gained {experience} XP!",
            enc.enemy_kind.display_name()
        ));
        enc.finish(CombatOutcome::Victory {
            enemy: enc.enemy_kind,
            experience,
        });
    }

    /// Attempts to flee on the player's turn. Success closes the encounter
    /// at once; failure hands the turn to the enemy.
    pub fn flee(&mut self, ctx: &mut CombatContext<'_>) -> Option<CombatReport> {
        let enc = self.encounter.as_mut()?;
        if enc.state != CombatState::PlayerTurn {
            return None;
        }
        if ctx.rng.f32() < self.flee_chance {
            info!("Fled from {}", enc.enemy_kind);
            let report = enc.report(CombatOutcome::Fled {
                enemy: enc.enemy_kind,
            });
            self.encounter = None;
            Some(report)
        } else {
            enc.log("Failed to flee!");
            enc.set_state(CombatState::EnemyTurn);
            None
        }
    }

    /// Advances timers. The enemy acts once its turn delay has passed and
    /// a finished encounter closes after the end delay, returning its report.
    pub fn update(&mut self, dt: f32, ctx: &mut CombatContext<'_>) -> Option<CombatReport> {
        let enc = self.encounter.as_mut()?;
        ctx.enemy.tick_attack_timer(dt);
        enc.timer += dt;

        match enc.state {
            CombatState::PlayerTurn => None,
            CombatState::EnemyTurn => {
                if enc.timer >= self.enemy_turn_delay {
                    Self::enemy_turn(enc, ctx);
                }
                None
            },
            CombatState::CombatEnd => {
                if enc.timer < self.combat_end_delay {
                    return None;
                }
                let outcome = enc.outcome.clone()?;
                let report = enc.report(outcome);
                self.encounter = None;
                Some(report)
            },
        }
    }

    fn enemy_turn(enc: &mut Encounter, ctx: &mut CombatContext<'_>) {
        let name = enc.enemy_kind.display_name();
        let damage = ctx.enemy.attack_player();
        if damage == 0 {
            enc.log(format!("{name} is preparing to attack..."));
            enc.set_state(CombatState::PlayerTurn);
            return;
        }

        let died = ctx.player.take_damage(damage);
        enc.damage_taken += damage;
        enc.log(format!("{name} attacks for {damage} damage!"));
        ctx.events.publish(GameEvent::Damage {
            position: ctx.player.center(),
            amount: damage,
        });

        if died {
            ctx.tracker.lose_battle(enc.damage_dealt, enc.damage_taken);
            ctx.player.respawn();
            enc.log("You were defeated! Respawning...");
            enc.finish(CombatOutcome::Defeat {
                enemy: enc.enemy_kind,
            });
        } else {
            enc.set_state(CombatState::PlayerTurn);
        }
    }

    /// Drops the encounter without a result, e.g. when its enemy vanished.
    pub fn abort(&mut self) -> Option<CombatReport> {
        let enc = self.encounter.take()?;
        debug!("Combat against {} aborted", enc.enemy_kind);
        Some(enc.report(CombatOutcome::Fled {
            enemy: enc.enemy_kind,
        }))
    }

    /// Enemy being fought.
    #[must_use]
    pub fn enemy_id(&self) -> Option<EntityId> {
        self.encounter.as_ref().map(|e| e.enemy_id)
    }

    /// Turn state.
    #[must_use]
    pub fn state(&self) -> Option<CombatState> {
        self.encounter.as_ref().map(|e| e.state)
    }

    /// Result, once decided.
    #[must_use]
    pub fn outcome(&self) -> Option<&CombatOutcome> {
        self.encounter.as_ref().and_then(|e| e.outcome.as_ref())
    }

    /// Selected ability index.
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.encounter.as_ref().map_or(0, |e| e.selected)
    }

    /// Abilities available this encounter.
    #[must_use]
    pub fn abilities(&self) -> &[CloudAbility] {
        self.encounter.as_ref().map_or(&[], |e| &e.abilities)
    }

    /// Recent log lines, oldest first.
    #[must_use]
    pub fn log(&self) -> Vec<&str> {
        self.encounter
            .as_ref()
            .map(|e| e.log.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudquest_common::Vec2;

    struct World {
        player: Player,
        enemy: CloudEnemy,
        tracker: ProgressTracker,
        events: EventBus,
        rng: fastrand::Rng,
    }

    impl World {
        fn new(kind: EnemyKind) -> Self {
            Self {
                player: Player::default(),
                enemy: CloudEnemy::new(kind, Vec2::new(300.0, 300.0)),
                tracker: ProgressTracker::new(),
                events: EventBus::default(),
                rng: fastrand::Rng::with_seed(11),
            }
        }

        fn ctx(&mut self) -> CombatContext<'_> {
            CombatContext {
                player: &mut self.player,
                enemy: &mut self.enemy,
                tracker: &mut self.tracker,
                events: &self.events,
                rng: &mut self.rng,
            }
        }
    }

    fn loadout(concepts: &[&str], ids: &[&str]) -> AbilityManager {
        let mut manager = AbilityManager::new();
        for concept in concepts {
            manager.unlock_ability(concept);
        }
        for id in ids {
            assert!(manager.equip_ability(id));
        }
        manager
    }

    #[test]
    fn test_basic_attack_fallback() {
        let world = World::new(EnemyKind::Bug);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        assert!(combat.is_active());
        assert_eq!(combat.state(), Some(CombatState::PlayerTurn));
        assert_eq!(combat.abilities().len(), 1);
        assert_eq!(combat.abilities()[0].name(), "Basic Attack");
        assert_eq!(combat.log(), vec!["Combat started against Bug!"]);
    }

    #[test]
    fn test_selection_wraps() {
        let world = World::new(EnemyKind::Bug);
        let manager = loadout(&["ec2_basics", "s3_storage"], &["auto_scaling", "data_replication"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.select_previous();
        assert_eq!(combat.selected_index(), 1);
        combat.select_next();
        assert_eq!(combat.selected_index(), 0);
    }

    #[test]
    fn test_weakness_damage_and_turn_passes() {
        let mut world = World::new(EnemyKind::CostOverrun);
        let manager = loadout(&["ec2_basics"], &["auto_scaling"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.use_ability(0, &mut world.ctx());
        // 25 base against an ec2 weakness truncates to 37
        assert_eq!(world.enemy.health(), 150 - 37);
        assert_eq!(combat.state(), Some(CombatState::EnemyTurn));
        assert!(combat.log().contains(&"Used Auto Scaling for 37 damage!"));
        assert_eq!(combat.abilities()[0].current_cooldown(), 1);
        assert!(world
            .events
            .drain()
            .contains(&GameEvent::Damage { position: world.enemy.center(), amount: 37 }));
    }

    #[test]
    fn test_cooldown_is_a_logged_noop() {
        let mut world = World::new(EnemyKind::CostOverrun);
        let manager = loadout(&["s3_storage"], &["data_replication"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.use_ability(0, &mut world.ctx());
        world.enemy.tick_attack_timer(5.0);
        combat.update(2.0, &mut world.ctx());
        assert_eq!(combat.state(), Some(CombatState::PlayerTurn));

        let health = world.enemy.health();
        combat.use_ability(0, &mut world.ctx());
        assert_eq!(combat.state(), Some(CombatState::PlayerTurn));
        assert_eq!(world.enemy.health(), health);
        assert_eq!(combat.log().last(), Some(&"Data Replication is on cooldown!"));
    }

    #[test]
    fn test_enemy_turn_waits_for_delay() {
        let mut world = World::new(EnemyKind::DataLossDemon);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        combat.use_ability(0, &mut world.ctx());

        combat.update(1.0, &mut world.ctx());
        assert_eq!(combat.state(), Some(CombatState::EnemyTurn));
        assert_eq!(world.player.health(), 100);

        combat.update(1.0, &mut world.ctx());
        assert_eq!(combat.state(), Some(CombatState::PlayerTurn));
        assert_eq!(world.player.health(), 70);
        assert_eq!(combat.log().last(), Some(&"Data Loss Demon attacks for 30 damage!"));
    }

    #[test]
    fn test_enemy_still_cooling_prepares() {
        let mut world = World::new(EnemyKind::Bug);
        let settings = GameSettings {
            enemy_turn_delay: 1.0,
            ..GameSettings::default()
        };
        let mut combat = CombatSystem::new(&settings);
        combat.start_combat(&world.enemy, &AbilityManager::new());
        combat.use_ability(0, &mut world.ctx());

        combat.update(1.0, &mut world.ctx());
        assert_eq!(combat.log().last(), Some(&"Bug is preparing to attack..."));
        assert_eq!(world.player.health(), 100);
        assert_eq!(combat.state(), Some(CombatState::PlayerTurn));
    }

    #[test]
    fn test_victory_rewards_and_closes() {
        let mut world = World::new(EnemyKind::Bug);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        world.enemy.take_damage(50, None);
        combat.use_ability(0, &mut world.ctx());

        let expected = CombatOutcome::Victory {
            enemy: EnemyKind::Bug,
            experience: 56,
        };
        assert_eq!(combat.state(), Some(CombatState::CombatEnd));
        assert_eq!(combat.outcome(), Some(&expected));
        assert_eq!(world.player.experience(), 56);
        assert_eq!(world.tracker.experience(), 56);
        assert_eq!(world.tracker.combat().battles_won, 1);
        assert!(world.tracker.has_achievement("flawless_victory"));

        assert!(combat.update(1.0, &mut world.ctx()).is_none());
        let report = combat.update(1.0, &mut world.ctx()).expect("closed");
        assert_eq!(report.outcome, expected);
        assert_eq!(report.ability_stats.len(), 1);
        assert_eq!(report.ability_stats[0].0, "basic_attack");
        assert_eq!(report.ability_stats[0].1.total_damage, 10);
        assert!(!combat.is_active());
        assert!(combat.log().is_empty());
    }

    #[test]
    fn test_low_health_win_counts_before_level_up() {
        let mut world = World::new(EnemyKind::Bug);
        world.player.gain_experience(60);
        world.player.take_damage(95);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        world.enemy.take_damage(50, None);
        combat.use_ability(0, &mut world.ctx());

        assert_eq!(combat.state(), Some(CombatState::CombatEnd));
        assert_eq!(world.player.level(), 2);
        assert_eq!(world.player.health(), world.player.max_health());
        assert!(world.tracker.has_achievement("comeback_kid"));
        assert!(world
            .events
            .drain()
            .contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_defeat_respawns_player() {
        let mut world = World::new(EnemyKind::DataLossDemon);
        world.player.take_damage(80);
        world.player.set_position(Vec2::new(600.0, 600.0));
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());

        combat.use_ability(0, &mut world.ctx());
        world.enemy.tick_attack_timer(2.0);
        combat.update(2.0, &mut world.ctx());

        assert_eq!(
            combat.outcome(),
            Some(&CombatOutcome::Defeat {
                enemy: EnemyKind::DataLossDemon
            })
        );
        assert_eq!(world.player.health(), world.player.max_health());
        assert_eq!(world.player.position(), crate::player::PLAYER_SPAWN);
        assert_eq!(world.tracker.combat().battles_lost, 1);
        assert_eq!(world.tracker.combat().battles_won, 0);
    }

    #[test]
    fn test_special_modifiers_apply() {
        let mut world = World::new(EnemyKind::SecurityBreach);
        let manager = loadout(&["iam_security"], &["access_control"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.use_ability(0, &mut world.ctx());
        // 35 * 1.8 = 63, then 1.5x weakness to iam_security = 94
        assert_eq!(world.enemy.health(), 120 - 94);
        assert!(combat.log().contains(&"Security expertise! Massive damage!"));
    }

    #[test]
    fn test_heal_and_debuff_effects() {
        let mut world = World::new(EnemyKind::DataLossDemon);
        world.player.take_damage(50);
        let manager = loadout(&["ec2_basics", "vpc_networking"], &["load_balancing", "traffic_routing"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.use_ability(0, &mut world.ctx());
        assert_eq!(world.player.health(), 60);
        assert_eq!(world.enemy.health(), 100);
        assert!(combat.log().contains(&"Restored 10 health!"));
        assert!(combat.log().contains(&"Used Load Balancing!"));

        world.enemy.tick_attack_timer(2.0);
        combat.update(2.0, &mut world.ctx());
        combat.use_ability(1, &mut world.ctx());
        assert_eq!(world.enemy.attack(), 21);
        assert!(combat.log().contains(&"Enemy attack reduced!"));
    }

    #[test]
    fn test_data_replication_heals_twice() {
        let mut world = World::new(EnemyKind::Bug);
        world.player.take_damage(60);
        let manager = loadout(&["s3_storage"], &["data_replication"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        combat.use_ability(0, &mut world.ctx());
        // 15 from the replica special plus the 25 heal
        assert_eq!(world.player.health(), 80);
        assert!(combat.log().contains(&"Restored 15 health!"));
        assert!(combat.log().contains(&"Restored 25 health!"));
    }

    #[test]
    fn test_log_is_bounded() {
        let mut world = World::new(EnemyKind::CostOverrun);
        let manager = loadout(&["s3_storage"], &["data_replication"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);
        combat.use_ability(0, &mut world.ctx());
        world.enemy.tick_attack_timer(5.0);
        combat.update(2.0, &mut world.ctx());
        for _ in 0..20 {
            combat.use_ability(0, &mut world.ctx());
        }
        assert_eq!(combat.log().len(), MAX_LOG_LINES);
    }

    #[test]
    fn test_flee_only_on_player_turn() {
        let mut world = World::new(EnemyKind::Bug);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        combat.use_ability(0, &mut world.ctx());
        assert!(combat.flee(&mut world.ctx()).is_none());
        assert_eq!(combat.state(), Some(CombatState::EnemyTurn));
    }

    #[test]
    fn test_flee_rate() {
        let mut world = World::new(EnemyKind::Bug);
        let mut combat = CombatSystem::default();
        let mut successes = 0;
        for _ in 0..10_000 {
            combat.start_combat(&world.enemy, &AbilityManager::new());
            if let Some(report) = combat.flee(&mut world.ctx()) {
                assert_eq!(report.outcome, CombatOutcome::Fled { enemy: EnemyKind::Bug });
                successes += 1;
            } else {
                assert_eq!(combat.state(), Some(CombatState::EnemyTurn));
            }
            combat.abort();
        }
        assert!((6500..=7500).contains(&successes), "{successes}");
    }

    #[test]
    fn test_input_dispatch() {
        let mut world = World::new(EnemyKind::Bug);
        let manager = loadout(&["lambda_serverless"], &["serverless_burst", "event_driven"]);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &manager);

        let down = InputSnapshot::new().with_pressed(Action::MoveDown);
        assert!(combat.handle_input(&down, &mut world.ctx()).is_none());
        assert_eq!(combat.selected_index(), 1);

        let confirm = InputSnapshot::new().with_pressed(Action::Confirm);
        combat.handle_input(&confirm, &mut world.ctx());
        assert_eq!(combat.state(), Some(CombatState::EnemyTurn));
        assert!(combat.log().contains(&"Damage increased by 20!"));

        // Ignored while the enemy acts
        assert!(combat.handle_input(&confirm, &mut world.ctx()).is_none());
    }

    #[test]
    fn test_abort_returns_stats() {
        let mut world = World::new(EnemyKind::CostOverrun);
        let mut combat = CombatSystem::default();
        combat.start_combat(&world.enemy, &AbilityManager::new());
        combat.use_ability(0, &mut world.ctx());
        let report = combat.abort().expect("report");
        assert_eq!(report.ability_stats[0].1.times_used, 1);
        assert!(!combat.is_active());
        assert!(combat.abort().is_none());
    }
}
