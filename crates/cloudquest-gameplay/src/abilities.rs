//! Combat abilities.
//!
//! The ability catalog is a static table; each entry is bound to exactly one
//! concept. [`AbilityManager`] keeps the per-player state: which abilities
//! are unlocked, which are equipped, and lifetime usage stats. Effects are
//! a closed enum interpreted by [`apply_effect`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::enemy::CloudEnemy;
use crate::player::Player;

/// Maximum abilities equipped at once.
pub const MAX_EQUIPPED: usize = 4;

/// Heal granted by [`SpecialEffect::HealSelf`].
const SPECIAL_HEAL: u32 = 15;

/// Errors from loadout changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    /// No such ability in the catalog
    #[error("unknown ability: {0}")]
    Unknown(String),

    /// Ability has not been unlocked
    #[error("ability not unlocked: {0}")]
    Locked(String),

    /// Ability is already equipped
    #[error("ability already equipped: {0}")]
    AlreadyEquipped(String),

    /// Loadout is full
    #[error("loadout full ({max} abilities)")]
    LoadoutFull {
        /// Loadout capacity
        max: usize,
    },

    /// Ability is not equipped
    #[error("ability not equipped: {0}")]
    NotEquipped(String),
}

/// Result type for loadout changes.
pub type AbilityResult<T> = Result<T, AbilityError>;

// ============================================================================
// Definitions
// ============================================================================

/// Broad role of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    /// Deals damage
    Offensive,
    /// Protects or heals
    Defensive,
    /// Buffs and debuffs
    Utility,
}

/// Who an ability targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// The player
    Caster,
    /// The current enemy
    Enemy,
    /// Every enemy in the encounter
    AllEnemies,
    /// An area around the target
    Area,
}

/// Effect vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Damage the enemy
    Damage,
    /// Heal the player
    Heal,
    /// Raise player damage (display only)
    BuffDamage,
    /// Lower enemy attack
    DebuffEnemy,
    /// Absorb incoming damage (display only)
    Shield,
}

/// One effect of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEffect {
    /// What the effect does
    pub kind: EffectKind,
    /// Magnitude
    pub value: u32,
    /// Duration in turns, 0 for instant
    pub duration: u32,
}

impl AbilityEffect {
    const fn instant(kind: EffectKind, value: u32) -> Self {
        Self {
            kind,
            value,
            duration: 0,
        }
    }

    const fn lasting(kind: EffectKind, value: u32, duration: u32) -> Self {
        Self {
            kind,
            value,
            duration,
        }
    }
}

/// Named combat modifiers layered on top of an ability's effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialEffect {
    /// 1.5x damage against an enemy below half health
    ScaleDamage,
    /// Flat heal for the player
    HealSelf,
    /// Enemy attack drops to 70%
    DebuffEnemy,
    /// 1.8x damage against security enemies
    SecurityBonus,
}

impl SpecialEffect {
    /// Adjusts base damage for `enemy`. Returns the new damage and a log
    /// line when the modifier fired.
    #[must_use]
    pub fn modify_damage(self, base: u32, enemy: &CloudEnemy) -> (u32, Option<&'static str>) {
        match self {
            Self::ScaleDamage if enemy.health_fraction() < 0.5 => (
                base * 3 / 2,
                Some("Auto Scaling activated! Bonus damage!"),
            ),
            Self::SecurityBonus if enemy.kind().is_security() => (
                base * 9 / 5,
                Some("Security expertise! Massive damage!"),
            ),
            _ => (base, None),
        }
    }

    /// Applies the non-damage side of the modifier, if it has one.
    pub fn apply_side_effect(
        self,
        player: &mut Player,
        enemy: &mut CloudEnemy,
    ) -> Option<EffectOutcome> {
        match self {
            Self::HealSelf => Some(EffectOutcome {
                dealt: 0,
                healed: player.heal(SPECIAL_HEAL),
                message: format!("Restored {SPECIAL_HEAL} health!"),
            }),
            Self::DebuffEnemy => {
                enemy.weaken_attack(0.7);
                Some(EffectOutcome {
                    dealt: 0,
                    healed: 0,
                    message: "Enemy attack reduced!".to_string(),
                })
            },
            Self::ScaleDamage | Self::SecurityBonus => None,
        }
    }
}

/// Static ability definition.
#[derive(Debug, PartialEq, Eq)]
pub struct AbilityDef {
    /// Stable id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Concept that unlocks it
    pub concept_id: &'static str,
    /// Tooltip text
    pub description: &'static str,
    /// Role
    pub ability_type: AbilityType,
    /// Target
    pub target: TargetKind,
    /// Effects in application order
    pub effects: &'static [AbilityEffect],
    /// Turns before reuse
    pub cooldown: u32,
    /// Extra combat modifier
    pub special: Option<SpecialEffect>,
}

impl AbilityDef {
    /// Sum of all damage effects.
    #[must_use]
    pub fn base_damage(&self) -> u32 {
        self.effects
            .iter()
            .filter(|e| e.kind == EffectKind::Damage)
            .map(|e| e.value)
            .sum()
    }
}

use AbilityEffect as E;
use EffectKind as K;

static ABILITIES: [AbilityDef; 10] = [
    AbilityDef {
        id: "auto_scaling",
        name: "Auto Scaling",
        concept_id: "ec2_basics",
        description: "Scale out against weakened threats",
        ability_type: AbilityType::Offensive,
        target: TargetKind::Enemy,
        effects: &[E::instant(K::Damage, 25), E::lasting(K::BuffDamage, 10, 2)],
        cooldown: 2,
        special: Some(SpecialEffect::ScaleDamage),
    },
    AbilityDef {
        id: "load_balancing",
        name: "Load Balancing",
        concept_id: "ec2_basics",
        description: "Spread the load and recover",
        ability_type: AbilityType::Defensive,
        target: TargetKind::Caster,
        effects: &[E::lasting(K::Shield, 15, 3), E::instant(K::Heal, 10)],
        cooldown: 3,
        special: None,
    },
    AbilityDef {
        id: "serverless_burst",
        name: "Serverless Burst",
        concept_id: "lambda_serverless",
        description: "Fast strike with no cooldown",
        ability_type: AbilityType::Offensive,
        target: TargetKind::AllEnemies,
        effects: &[E::instant(K::Damage, 20)],
        cooldown: 0,
        special: None,
    },
    AbilityDef {
        id: "event_driven",
        name: "Event-Driven Response",
        concept_id: "lambda_serverless",
        description: "React instantly with boosted damage",
        ability_type: AbilityType::Utility,
        target: TargetKind::Caster,
        effects: &[E::lasting(K::BuffDamage, 20, 1)],
        cooldown: 1,
        special: None,
    },
    AbilityDef {
        id: "data_replication",
        name: "Data Replication",
        concept_id: "s3_storage",
        description: "Restore from a replica",
        ability_type: AbilityType::Defensive,
        target: TargetKind::Caster,
        effects: &[E::instant(K::Heal, 25), E::lasting(K::Shield, 10, 2)],
        cooldown: 4,
        special: Some(SpecialEffect::HealSelf),
    },
    AbilityDef {
        id: "lifecycle_management",
        name: "Lifecycle Management",
        concept_id: "s3_storage",
        description: "Archive the enemy's strength",
        ability_type: AbilityType::Utility,
        target: TargetKind::Enemy,
        effects: &[E::lasting(K::DebuffEnemy, 15, 3)],
        cooldown: 2,
        special: None,
    },
    AbilityDef {
        id: "network_segmentation",
        name: "Network Segmentation",
        concept_id: "vpc_networking",
        description: "Isolate yourself from attacks",
        ability_type: AbilityType::Defensive,
        target: TargetKind::Caster,
        effects: &[E::lasting(K::Shield, 20, 4)],
        cooldown: 3,
        special: None,
    },
    AbilityDef {
        id: "traffic_routing",
        name: "Traffic Routing",
        concept_id: "vpc_networking",
        description: "Reroute traffic through the enemy",
        ability_type: AbilityType::Utility,
        target: TargetKind::Area,
        effects: &[E::instant(K::Damage, 15)],
        cooldown: 2,
        special: Some(SpecialEffect::DebuffEnemy),
    },
    AbilityDef {
        id: "access_control",
        name: "Access Control",
        concept_id: "iam_security",
        description: "High damage against security threats",
        ability_type: AbilityType::Offensive,
        target: TargetKind::Enemy,
        effects: &[E::instant(K::Damage, 35)],
        cooldown: 3,
        special: Some(SpecialEffect::SecurityBonus),
    },
    AbilityDef {
        id: "principle_least_privilege",
        name: "Principle of Least Privilege",
        concept_id: "iam_security",
        description: "Strip the enemy's permissions",
        ability_type: AbilityType::Defensive,
        target: TargetKind::Enemy,
        effects: &[E::lasting(K::DebuffEnemy, 25, 2)],
        cooldown: 4,
        special: None,
    },
];

/// Fallback used in combat when nothing is equipped.
pub static BASIC_ATTACK: AbilityDef = AbilityDef {
    id: "basic_attack",
    name: "Basic Attack",
    concept_id: "basic",
    description: "A simple attack",
    ability_type: AbilityType::Offensive,
    target: TargetKind::Enemy,
    effects: &[E::instant(K::Damage, 15)],
    cooldown: 0,
    special: None,
};

/// Every ability in the catalog.
#[must_use]
pub fn catalog() -> &'static [AbilityDef] {
    &ABILITIES
}

/// Looks up a catalog ability by id.
#[must_use]
pub fn ability_def(id: &str) -> Option<&'static AbilityDef> {
    ABILITIES.iter().find(|a| a.id == id)
}

// ============================================================================
// Effect Interpreter
// ============================================================================

/// Result of applying one effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectOutcome {
    /// Damage actually dealt to the enemy
    pub dealt: u32,
    /// Health actually restored to the player
    pub healed: u32,
    /// Description for the combat log
    pub message: String,
}

/// Applies one effect from an ability bound to `concept_id`.
pub fn apply_effect(
    effect: AbilityEffect,
    concept_id: &str,
    player: &mut Player,
    enemy: &mut CloudEnemy,
) -> EffectOutcome {
    let v = effect.value;
    match effect.kind {
        EffectKind::Damage => {
            let before = enemy.health();
            enemy.take_damage(v, Some(concept_id));
            let dealt = before - enemy.health();
            EffectOutcome {
                dealt,
                healed: 0,
                message: format!("Dealt {dealt} damage!"),
            }
        },
        EffectKind::Heal => {
            let healed = player.heal(v);
            EffectOutcome {
                dealt: 0,
                healed,
                message: format!("Restored {v} health!"),
            }
        },
        EffectKind::BuffDamage => EffectOutcome {
            dealt: 0,
            healed: 0,
            message: format!("Damage increased by {v}!"),
        },
        EffectKind::DebuffEnemy => {
            enemy.reduce_attack(v);
            EffectOutcome {
                dealt: 0,
                healed: 0,
                message: format!("Enemy attack reduced by {v}!"),
            }
        },
        EffectKind::Shield => EffectOutcome {
            dealt: 0,
            healed: 0,
            message: format!("Shield activated! Reduces incoming damage by {v}!"),
        },
    }
}

// ============================================================================
// Per-Player State
// ============================================================================

/// Monotonic usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityStats {
    /// Times used
    pub times_used: u32,
    /// Damage dealt
    pub total_damage: u32,
    /// Health restored
    pub total_healing: u32,
}

impl AbilityStats {
    /// Adds another set of counters.
    pub fn merge(&mut self, other: &Self) {
        self.times_used += other.times_used;
        self.total_damage += other.total_damage;
        self.total_healing += other.total_healing;
    }
}

/// An ability with its cooldown and usage state.
#[derive(Debug, Clone)]
pub struct CloudAbility {
    def: &'static AbilityDef,
    current_cooldown: u32,
    stats: AbilityStats,
}

impl CloudAbility {
    /// Wraps a definition with fresh state.
    #[must_use]
    pub fn new(def: &'static AbilityDef) -> Self {
        Self {
            def,
            current_cooldown: 0,
            stats: AbilityStats::default(),
        }
    }

    /// Definition.
    #[must_use]
    pub fn def(&self) -> &'static AbilityDef {
        self.def
    }

    /// Id.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.def.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    /// Turns until usable.
    #[must_use]
    pub fn current_cooldown(&self) -> u32 {
        self.current_cooldown
    }

    /// Whether the cooldown has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current_cooldown == 0
    }

    /// Starts the cooldown and counts a use.
    pub fn trigger(&mut self) {
        self.current_cooldown = self.def.cooldown;
        self.stats.times_used += 1;
    }

    /// Adds effect results to the usage counters.
    pub fn record(&mut self, dealt: u32, healed: u32) {
        self.stats.total_damage += dealt;
        self.stats.total_healing += healed;
    }

    /// Advances the cooldown by one turn.
    pub fn tick_cooldown(&mut self) {
        self.current_cooldown = self.current_cooldown.saturating_sub(1);
    }

    /// Usage counters.
    #[must_use]
    pub fn stats(&self) -> &AbilityStats {
        &self.stats
    }
}

/// Unlocked and equipped abilities for the player.
#[derive(Debug, Clone)]
pub struct AbilityManager {
    abilities: Vec<CloudAbility>,
    unlocked: Vec<&'static str>,
    equipped: Vec<&'static str>,
}

impl Default for AbilityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AbilityManager {
    /// Creates a manager over the full catalog with nothing unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            abilities: ABILITIES.iter().map(CloudAbility::new).collect(),
            unlocked: Vec::new(),
            equipped: Vec::new(),
        }
    }

    /// Unlocks every ability bound to `concept_id`. Returns the names of
    /// abilities that were newly unlocked.
    pub fn unlock_ability(&mut self, concept_id: &str) -> Vec<&'static str> {
        let mut names = Vec::new();
        for def in ABILITIES.iter().filter(|a| a.concept_id == concept_id) {
            if !self.unlocked.contains(&def.id) {
                self.unlocked.push(def.id);
                info!("Unlocked ability: {}", def.name);
                names.push(def.name);
            }
        }
        names
    }

    /// Equips an ability, explaining any refusal.
    pub fn try_equip(&mut self, ability_id: &str) -> AbilityResult<()> {
        let def = ability_def(ability_id)
            .ok_or_else(|| AbilityError::Unknown(ability_id.to_string()))?;
        if !self.unlocked.contains(&def.id) {
            return Err(AbilityError::Locked(ability_id.to_string()));
        }
        if self.equipped.contains(&def.id) {
            return Err(AbilityError::AlreadyEquipped(ability_id.to_string()));
        }
        if self.equipped.len() >= MAX_EQUIPPED {
            return Err(AbilityError::LoadoutFull { max: MAX_EQUIPPED });
        }
        self.equipped.push(def.id);
        Ok(())
    }

    /// Equips an ability. Returns false if it is locked, already equipped or
    /// the loadout is full.
    pub fn equip_ability(&mut self, ability_id: &str) -> bool {
        match self.try_equip(ability_id) {
            Ok(()) => true,
            Err(e) => {
                debug!("Equip rejected: {e}");
                false
            },
        }
    }

    /// Unequips an ability. Returns false if it was not equipped.
    pub fn unequip_ability(&mut self, ability_id: &str) -> bool {
        match self.equipped.iter().position(|id| *id == ability_id) {
            Some(index) => {
                self.equipped.remove(index);
                true
            },
            None => {
                debug!("{}", AbilityError::NotEquipped(ability_id.to_string()));
                false
            },
        }
    }

    /// Looks up an ability's state.
    #[must_use]
    pub fn get(&self, ability_id: &str) -> Option<&CloudAbility> {
        self.abilities.iter().find(|a| a.id() == ability_id)
    }

    /// Whether an ability is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, ability_id: &str) -> bool {
        self.unlocked.iter().any(|id| *id == ability_id)
    }

    /// Whether an ability is equipped.
    #[must_use]
    pub fn is_equipped(&self, ability_id: &str) -> bool {
        self.equipped.iter().any(|id| *id == ability_id)
    }

    /// Unlocked ids in unlock order.
    #[must_use]
    pub fn unlocked_ids(&self) -> &[&'static str] {
        &self.unlocked
    }

    /// Equipped ids in loadout order.
    #[must_use]
    pub fn equipped_ids(&self) -> &[&'static str] {
        &self.equipped
    }

    /// Equipped abilities in loadout order.
    #[must_use]
    pub fn equipped(&self) -> Vec<&CloudAbility> {
        self.equipped.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Folds usage from an encounter back into lifetime stats.
    pub fn record_usage(&mut self, ability_id: &str, stats: &AbilityStats) {
        if let Some(ability) = self.abilities.iter_mut().find(|a| a.id() == ability_id) {
            ability.stats.merge(stats);
        }
    }

    /// Restores unlocked and equipped sets from saved ids. Unknown ids are
    /// skipped and equip rules still apply.
    pub fn restore(&mut self, unlocked: &[String], equipped: &[String]) {
        for id in unlocked {
            if let Some(def) = ability_def(id) {
                if !self.unlocked.contains(&def.id) {
                    self.unlocked.push(def.id);
                }
            } else {
                debug!("Skipping unknown saved ability {id}");
            }
        }
        for id in equipped {
            self.equip_ability(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::EnemyKind;
    use cloudquest_common::Vec2;

    #[test]
    fn test_catalog_binds_every_concept() {
        for concept in crate::education::concepts() {
            let count = catalog()
                .iter()
                .filter(|a| a.concept_id == concept.id)
                .count();
            assert_eq!(count, 2, "{}", concept.id);
        }
    }

    #[test]
    fn test_base_damage() {
        assert_eq!(ability_def("auto_scaling").map(AbilityDef::base_damage), Some(25));
        assert_eq!(ability_def("load_balancing").map(AbilityDef::base_damage), Some(0));
        assert_eq!(ability_def("load_balancing").and_then(|d| d.special), None);
        assert_eq!(
            ability_def("data_replication").and_then(|d| d.special),
            Some(SpecialEffect::HealSelf)
        );
        assert_eq!(BASIC_ATTACK.base_damage(), 15);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut manager = AbilityManager::new();
        assert_eq!(
            manager.unlock_ability("ec2_basics"),
            vec!["Auto Scaling", "Load Balancing"]
        );
        assert!(manager.unlock_ability("ec2_basics").is_empty());
        assert_eq!(manager.unlocked_ids().len(), 2);
        assert!(manager.unlock_ability("unknown").is_empty());
    }

    #[test]
    fn test_equip_rules() {
        let mut manager = AbilityManager::new();
        assert_eq!(
            manager.try_equip("auto_scaling"),
            Err(AbilityError::Locked("auto_scaling".into()))
        );
        assert_eq!(
            manager.try_equip("warp_drive"),
            Err(AbilityError::Unknown("warp_drive".into()))
        );

        manager.unlock_ability("ec2_basics");
        manager.unlock_ability("s3_storage");
        manager.unlock_ability("iam_security");

        assert!(manager.equip_ability("auto_scaling"));
        assert!(!manager.equip_ability("auto_scaling"));
        assert!(manager.equip_ability("load_balancing"));
        assert!(manager.equip_ability("data_replication"));
        assert!(manager.equip_ability("access_control"));
        assert_eq!(
            manager.try_equip("lifecycle_management"),
            Err(AbilityError::LoadoutFull { max: MAX_EQUIPPED })
        );
        assert_eq!(manager.equipped().len(), MAX_EQUIPPED);

        assert!(manager.unequip_ability("auto_scaling"));
        assert!(!manager.unequip_ability("auto_scaling"));
        assert!(manager.equip_ability("lifecycle_management"));
    }

    #[test]
    fn test_equipped_subset_of_unlocked() {
        let mut manager = AbilityManager::new();
        manager.unlock_ability("vpc_networking");
        for def in catalog() {
            manager.equip_ability(def.id);
        }
        for id in manager.equipped_ids() {
            assert!(manager.is_unlocked(id));
        }
        assert_eq!(manager.equipped_ids().len(), 2);
    }

    #[test]
    fn test_cooldown_cycle() {
        let def = ability_def("data_replication").expect("def");
        let mut ability = CloudAbility::new(def);
        assert!(ability.is_ready());
        ability.trigger();
        assert_eq!(ability.current_cooldown(), 4);
        for _ in 0..4 {
            ability.tick_cooldown();
        }
        assert!(ability.is_ready());
        ability.tick_cooldown();
        assert_eq!(ability.current_cooldown(), 0);
        assert_eq!(ability.stats().times_used, 1);
    }

    #[test]
    fn test_effect_interpreter() {
        let mut player = Player::default();
        let mut enemy = CloudEnemy::new(EnemyKind::DataLossDemon, Vec2::ZERO);
        player.take_damage(40);

        let out = apply_effect(E::instant(K::Damage, 20), "s3_storage", &mut player, &mut enemy);
        assert_eq!(out.dealt, 30);
        assert_eq!(enemy.health(), 70);
        assert_eq!(out.message, "Dealt 30 damage!");

        let out = apply_effect(E::instant(K::Heal, 25), "s3_storage", &mut player, &mut enemy);
        assert_eq!(out.healed, 25);
        assert_eq!(player.health(), 85);

        let out = apply_effect(E::lasting(K::DebuffEnemy, 15, 3), "s3_storage", &mut player, &mut enemy);
        assert_eq!(enemy.attack(), 15);
        assert_eq!(out.message, "Enemy attack reduced by 15!");

        let out = apply_effect(E::lasting(K::Shield, 10, 2), "s3_storage", &mut player, &mut enemy);
        assert_eq!((out.dealt, out.healed), (0, 0));
        assert!(out.message.starts_with("Shield activated!"));

        let out = apply_effect(E::lasting(K::BuffDamage, 20, 1), "s3_storage", &mut player, &mut enemy);
        assert_eq!(out.message, "Damage increased by 20!");
        assert_eq!(player.health(), 85);
    }

    #[test]
    fn test_special_modifiers() {
        let mut enemy = CloudEnemy::new(EnemyKind::SecurityBreach, Vec2::ZERO);
        assert_eq!(SpecialEffect::SecurityBonus.modify_damage(35, &enemy).0, 63);
        assert_eq!(SpecialEffect::ScaleDamage.modify_damage(25, &enemy).0, 25);

        enemy.take_damage(70, None);
        let (damage, message) = SpecialEffect::ScaleDamage.modify_damage(25, &enemy);
        assert_eq!(damage, 37);
        assert!(message.is_some());

        let bug = CloudEnemy::new(EnemyKind::Bug, Vec2::ZERO);
        assert_eq!(SpecialEffect::SecurityBonus.modify_damage(35, &bug), (35, None));
    }

    #[test]
    fn test_special_side_effects() {
        let mut player = Player::default();
        let mut enemy = CloudEnemy::new(EnemyKind::CostOverrun, Vec2::ZERO);
        player.take_damage(50);

        let out = SpecialEffect::HealSelf
            .apply_side_effect(&mut player, &mut enemy)
            .expect("heal");
        assert_eq!(out.healed, 15);
        assert_eq!(player.health(), 65);

        SpecialEffect::DebuffEnemy.apply_side_effect(&mut player, &mut enemy);
        assert_eq!(enemy.attack(), 14);

        assert!(SpecialEffect::ScaleDamage
            .apply_side_effect(&mut player, &mut enemy)
            .is_none());
    }

    #[test]
    fn test_record_usage_merges() {
        let mut manager = AbilityManager::new();
        let stats = AbilityStats {
            times_used: 2,
            total_damage: 50,
            total_healing: 0,
        };
        manager.record_usage("auto_scaling", &stats);
        manager.record_usage("auto_scaling", &stats);
        let ability = manager.get("auto_scaling").expect("ability");
        assert_eq!(ability.stats().times_used, 4);
        assert_eq!(ability.stats().total_damage, 100);
    }

    #[test]
    fn test_restore() {
        let mut manager = AbilityManager::new();
        manager.restore(
            &["auto_scaling".into(), "bogus".into(), "access_control".into()],
            &["access_control".into(), "serverless_burst".into()],
        );
        assert_eq!(manager.unlocked_ids(), &["auto_scaling", "access_control"]);
        assert_eq!(manager.equipped_ids(), &["access_control"]);
    }
}
