//! Experience, statistics and achievements.
//!
//! Every mutator only ever increases counters. Achievements carry real
//! incremental progress; once `progress` reaches `max_progress` the
//! achievement unlocks and stays unlocked. Newly unlocked ids queue up until
//! the session takes them for notifications.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::education;
use crate::enemy::EnemyKind;
use crate::save::ProgressRecord;

/// Areas a player can discover.
pub const AREA_COUNT: u32 = 2;

/// Seconds a level may take for the speed run achievement.
const SPEED_RUN_SECONDS: f32 = 300.0;

/// Experience needed to advance from `level` to the next one.
#[must_use]
pub fn experience_for_level(level: u32) -> u32 {
    100 + level.saturating_sub(1) * 50
}

// ============================================================================
// Statistics
// ============================================================================

/// Learning statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningStats {
    /// Concepts learned
    pub concepts_learned: u32,
    /// Seconds spent in learning sessions
    pub total_study_time: f64,
    /// Quizzes finished
    pub quiz_attempts: u32,
    /// Quizzes passed
    pub quiz_successes: u32,
    /// Correct quiz answers over all quizzes
    pub correct_answers: u32,
    /// Consecutive passed quizzes
    pub learning_streak: u32,
    /// Concepts learned per category
    pub category_counts: BTreeMap<String, u32>,
}

impl LearningStats {
    /// Category with the most learned concepts.
    #[must_use]
    pub fn favorite_category(&self) -> Option<&str> {
        most_used(&self.category_counts)
    }
}

/// Combat statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    /// Battles won
    pub battles_won: u32,
    /// Battles lost
    pub battles_lost: u32,
    /// Damage dealt over all battles
    pub total_damage_dealt: u64,
    /// Damage taken over all battles
    pub total_damage_taken: u64,
    /// Defeats per enemy kind id
    pub enemies_defeated: BTreeMap<String, u32>,
    /// Uses per ability id in won battles
    pub ability_usage: BTreeMap<String, u32>,
}

impl CombatStats {
    /// Enemies defeated over all kinds.
    #[must_use]
    pub fn total_defeated(&self) -> u32 {
        self.enemies_defeated.values().sum()
    }

    /// Most used ability id.
    #[must_use]
    pub fn favorite_ability(&self) -> Option<&str> {
        most_used(&self.ability_usage)
    }
}

/// Exploration statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationStats {
    /// Pixels travelled
    pub distance_traveled: f64,
    /// Discovered area ids
    pub areas_discovered: Vec<String>,
    /// Seconds played
    pub time_played: f64,
}

/// Highest count, ties going to the first key in order.
fn most_used(counts: &BTreeMap<String, u32>) -> Option<&str> {
    counts
        .iter()
        .fold(None, |best: Option<(&String, u32)>, (key, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((key, count)),
        })
        .map(|(key, _)| key.as_str())
}

// ============================================================================
// Achievements
// ============================================================================

/// Achievement grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementCategory {
    /// Learning concepts and quizzes
    Learning,
    /// Battles
    Combat,
    /// Moving around the world
    Exploration,
    /// Everything else
    Special,
}

/// Static achievement definition.
#[derive(Debug, PartialEq, Eq)]
pub struct AchievementDef {
    /// Stable id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Description
    pub description: &'static str,
    /// Grouping
    pub category: AchievementCategory,
    /// Progress needed to unlock
    pub max_progress: u32,
}

const fn achievement(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    max_progress: u32,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        category,
        max_progress,
    }
}

use AchievementCategory::{Combat, Exploration, Learning, Special};

static ACHIEVEMENTS: [AchievementDef; 16] = [
    achievement("first_concept", "First Steps", "Learn your first cloud concept", Learning, 1),
    achievement("concept_master", "Concept Master", "Learn 5 cloud concepts", Learning, 5),
    achievement(
        "cloud_expert",
        "Cloud Expert",
        "Learn all available concepts",
        Learning,
        education::CONCEPT_COUNT as u32,
    ),
    achievement("quiz_ace", "Quiz Ace", "Answer 10 quiz questions correctly", Learning, 10),
    achievement("perfect_score", "Perfect Score", "Get 100% on any quiz", Learning, 1),
    achievement("first_victory", "First Victory", "Win your first battle", Combat, 1),
    achievement("enemy_hunter", "Enemy Hunter", "Defeat 10 enemies", Combat, 10),
    achievement(
        "ability_master",
        "Ability Master",
        "Use 5 different abilities in combat",
        Combat,
        5,
    ),
    achievement(
        "flawless_victory",
        "Flawless Victory",
        "Win a battle without taking damage",
        Combat,
        1,
    ),
    achievement("boss_slayer", "Boss Slayer", "Defeat a boss enemy", Combat, 1),
    achievement("explorer", "Explorer", "Travel 1000 pixels", Exploration, 1000),
    achievement("area_scout", "Area Scout", "Discover every area", Exploration, AREA_COUNT),
    achievement(
        "speed_runner",
        "Speed Runner",
        "Complete a level in under 5 minutes",
        Exploration,
        1,
    ),
    achievement("dedicated_learner", "Dedicated Learner", "Play for 30 minutes", Special, 1800),
    achievement(
        "comeback_kid",
        "Comeback Kid",
        "Win a battle with less than 10% health",
        Special,
        1,
    ),
    achievement(
        "efficiency_expert",
        "Efficiency Expert",
        "Win a battle in 3 turns without hitting a cooldown",
        Special,
        1,
    ),
];

/// Every achievement definition.
#[must_use]
pub fn achievement_defs() -> &'static [AchievementDef] {
    &ACHIEVEMENTS
}

/// Persisted state of one achievement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementState {
    /// Whether it has been earned
    pub unlocked: bool,
    /// Unix seconds when earned
    pub unlocked_at: Option<u64>,
    /// Progress toward `max_progress`
    pub progress: u32,
}

/// An achievement with its current state.
#[derive(Debug, Clone)]
pub struct Achievement {
    def: &'static AchievementDef,
    state: AchievementState,
}

impl Achievement {
    /// Definition.
    #[must_use]
    pub fn def(&self) -> &'static AchievementDef {
        self.def
    }

    /// Id.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.def.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AchievementState {
        &self.state
    }

    /// Whether it has been earned.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.state.unlocked
    }

    /// Progress as `(current, max)`.
    #[must_use]
    pub fn progress(&self) -> (u32, u32) {
        (self.state.progress, self.def.max_progress)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// Tracker
// ============================================================================

/// Results of one won battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleReport {
    /// Enemy that was defeated
    pub enemy_kind: EnemyKind,
    /// Damage the player dealt
    pub damage_dealt: u32,
    /// Damage the player took
    pub damage_taken: u32,
    /// Catalog ability ids used, once per use
    pub abilities_used: Vec<String>,
    /// Player health fraction when the battle ended
    pub health_remaining: f32,
    /// Player turns taken
    pub turns: u32,
    /// Selections rejected because of cooldowns
    pub cooldown_misses: u32,
}

/// Snapshot for HUD and menus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// Player level
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    /// Experience the next level needs
    pub experience_to_next: u32,
    /// Concepts learned
    pub concepts_learned: u32,
    /// Battles won
    pub battles_won: u32,
    /// Achievements earned
    pub achievements_unlocked: usize,
    /// Achievements in the catalog
    pub total_achievements: usize,
    /// Seconds played
    pub time_played: f64,
    /// Experience gained this session
    pub session_experience: u32,
    /// Concepts learned this session
    pub session_concepts: u32,
}

/// Tracks level, statistics and achievements.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    level: u32,
    experience: u32,
    total_experience: u64,
    session_experience: u32,
    session_concepts: u32,
    learned: Vec<String>,
    learning: LearningStats,
    combat: CombatStats,
    exploration: ExplorationStats,
    achievements: Vec<Achievement>,
    pending: Vec<&'static str>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Creates fresh level 1 progress.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: 1,
            experience: 0,
            total_experience: 0,
            session_experience: 0,
            session_concepts: 0,
            learned: Vec::new(),
            learning: LearningStats::default(),
            combat: CombatStats::default(),
            exploration: ExplorationStats::default(),
            achievements: ACHIEVEMENTS
                .iter()
                .map(|def| Achievement {
                    def,
                    state: AchievementState::default(),
                })
                .collect(),
            pending: Vec::new(),
        }
    }

    // ========================================================================
    // Experience
    // ========================================================================

    /// Adds experience with cascading level-ups. Returns levels gained.
    pub fn gain_experience(&mut self, amount: u32) -> u32 {
        self.experience += amount;
        self.total_experience += u64::from(amount);
        self.session_experience += amount;

        let mut gained = 0;
        while self.experience >= experience_for_level(self.level) {
            self.experience -= experience_for_level(self.level);
            self.level += 1;
            gained += 1;
        }
        if gained > 0 {
            info!("Level up! Now level {}", self.level);
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

    /// Experience ever gained.
    #[must_use]
    pub fn total_experience(&self) -> u64 {
        self.total_experience
    }

    /// Experience the next level needs.
    #[must_use]
    pub fn experience_to_next_level(&self) -> u32 {
        experience_for_level(self.level)
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// Records a learned concept. Learning the same concept twice is a no-op.
    pub fn learn_concept(&mut self, concept_id: &str) -> bool {
        if self.learned.iter().any(|c| c == concept_id) {
            return false;
        }
        self.learned.push(concept_id.to_string());
        self.learning.concepts_learned += 1;
        self.session_concepts += 1;
        if let Some(concept) = education::concept(concept_id) {
            *self
                .learning
                .category_counts
                .entry(concept.category.as_str().to_string())
                .or_default() += 1;
        }
        self.check_learning();
        true
    }

    /// Records a finished quiz with its percentage and correct answers.
    pub fn complete_quiz(&mut self, concept_id: &str, percentage: f32, correct: u32) {
        self.learning.quiz_attempts += 1;
        self.learning.correct_answers += correct;
        if percentage >= education::PASS_PERCENTAGE {
            self.learning.quiz_successes += 1;
            self.learning.learning_streak += 1;
        } else {
            self.learning.learning_streak = 0;
        }
        debug!("Quiz on {concept_id} finished at {percentage:.0}%");

        if percentage >= 100.0 {
            self.advance("perfect_score", 1);
        }
        self.check_learning();
    }

    /// Adds time spent in a learning session.
    pub fn add_study_time(&mut self, seconds: f32) {
        self.learning.total_study_time += f64::from(seconds.max(0.0));
    }

    fn check_learning(&mut self) {
        let learned = self.learning.concepts_learned;
        self.advance("first_concept", learned);
        self.advance("concept_master", learned);
        self.advance("cloud_expert", learned);
        self.advance("quiz_ace", self.learning.correct_answers);
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Records a won battle.
    pub fn win_battle(&mut self, report: &BattleReport) {
        self.combat.battles_won += 1;
        self.combat.total_damage_dealt += u64::from(report.damage_dealt);
        self.combat.total_damage_taken += u64::from(report.damage_taken);
        *self
            .combat
            .enemies_defeated
            .entry(report.enemy_kind.id().to_string())
            .or_default() += 1;
        for ability in &report.abilities_used {
            *self.combat.ability_usage.entry(ability.clone()).or_default() += 1;
        }

        self.advance("first_victory", self.combat.battles_won);
        self.advance("enemy_hunter", self.combat.total_defeated());
        self.advance("ability_master", self.combat.ability_usage.len() as u32);
        if report.damage_taken == 0 {
            self.advance("flawless_victory", 1);
        }
        if report.enemy_kind.is_boss() {
            self.advance("boss_slayer", 1);
        }
        if report.health_remaining < 0.1 {
            self.advance("comeback_kid", 1);
        }
        if report.turns <= 3 && report.cooldown_misses == 0 {
            self.advance("efficiency_expert", 1);
        }
    }

    /// Records a lost battle.
    pub fn lose_battle(&mut self, damage_dealt: u32, damage_taken: u32) {
        self.combat.battles_lost += 1;
        self.combat.total_damage_dealt += u64::from(damage_dealt);
        self.combat.total_damage_taken += u64::from(damage_taken);
    }

    /// Defeats recorded for an enemy kind id.
    #[must_use]
    pub fn defeats_of(&self, enemy_kind: &str) -> u32 {
        self.combat.enemies_defeated.get(enemy_kind).copied().unwrap_or(0)
    }

    // ========================================================================
    // Exploration
    // ========================================================================

    /// Adds travelled distance.
    pub fn track_movement(&mut self, distance: f32) {
        self.exploration.distance_traveled += f64::from(distance.max(0.0));
        self.advance("explorer", self.exploration.distance_traveled as u32);
    }

    /// Records an area visit. Returns false if it was already discovered.
    pub fn discover_area(&mut self, area_id: &str) -> bool {
        if self.exploration.areas_discovered.iter().any(|a| a == area_id) {
            return false;
        }
        self.exploration.areas_discovered.push(area_id.to_string());
        info!("Discovered area {area_id}");
        self.advance("area_scout", self.exploration.areas_discovered.len() as u32);
        true
    }

    /// Records that every station in a level was completed after `seconds`.
    pub fn complete_level(&mut self, level_id: &str, seconds: f32) {
        debug!("Completed {level_id} in {seconds:.0}s");
        if seconds < SPEED_RUN_SECONDS {
            self.advance("speed_runner", 1);
        }
    }

    /// Adds play time.
    pub fn update_session_time(&mut self, dt: f32) {
        self.exploration.time_played += f64::from(dt.max(0.0));
        self.advance("dedicated_learner", self.exploration.time_played as u32);
    }

    // ========================================================================
    // Achievements
    // ========================================================================

    /// Raises an achievement's progress to `value`, unlocking it at the max.
    fn advance(&mut self, achievement_id: &str, value: u32) {
        let Some(achievement) = self
            .achievements
            .iter_mut()
            .find(|a| a.def.id == achievement_id)
        else {
            return;
        };
        if achievement.state.unlocked {
            return;
        }
        let capped = value.min(achievement.def.max_progress);
        achievement.state.progress = achievement.state.progress.max(capped);
        if achievement.state.progress >= achievement.def.max_progress {
            self.unlock_achievement(achievement_id);
        }
    }

    /// Unlocks an achievement. Returns false if unknown or already unlocked.
    pub fn unlock_achievement(&mut self, achievement_id: &str) -> bool {
        let Some(achievement) = self
            .achievements
            .iter_mut()
            .find(|a| a.def.id == achievement_id)
        else {
            debug!("Unknown achievement {achievement_id}");
            return false;
        };
        if achievement.state.unlocked {
            return false;
        }
        achievement.state.unlocked = true;
        achievement.state.unlocked_at = Some(unix_now());
        achievement.state.progress = achievement.def.max_progress;
        info!("Achievement unlocked: {}", achievement.def.name);
        self.pending.push(achievement.def.id);
        true
    }

    /// Takes the achievements unlocked since the last call.
    pub fn take_new_achievements(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.pending)
    }

    /// Whether an achievement is earned.
    #[must_use]
    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievement(achievement_id)
            .is_some_and(Achievement::is_unlocked)
    }

    /// Looks up an achievement.
    #[must_use]
    pub fn achievement(&self, achievement_id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.def.id == achievement_id)
    }

    /// All achievements, earned ones first, then by name.
    #[must_use]
    pub fn achievements(&self) -> Vec<&Achievement> {
        let mut list: Vec<_> = self.achievements.iter().collect();
        list.sort_by_key(|a| (!a.state.unlocked, a.def.name));
        list
    }

    /// Ids of earned achievements.
    #[must_use]
    pub fn earned_ids(&self) -> Vec<&'static str> {
        self.achievements
            .iter()
            .filter(|a| a.state.unlocked)
            .map(|a| a.def.id)
            .collect()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Learning statistics.
    #[must_use]
    pub fn learning(&self) -> &LearningStats {
        &self.learning
    }

    /// Combat statistics.
    #[must_use]
    pub fn combat(&self) -> &CombatStats {
        &self.combat
    }

    /// Exploration statistics.
    #[must_use]
    pub fn exploration(&self) -> &ExplorationStats {
        &self.exploration
    }

    /// Concept ids learned.
    #[must_use]
    pub fn learned(&self) -> &[String] {
        &self.learned
    }

    /// HUD summary.
    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            level: self.level,
            experience: self.experience,
            experience_to_next: self.experience_to_next_level(),
            concepts_learned: self.learning.concepts_learned,
            battles_won: self.combat.battles_won,
            achievements_unlocked: self.achievements.iter().filter(|a| a.is_unlocked()).count(),
            total_achievements: self.achievements.len(),
            time_played: self.exploration.time_played,
            session_experience: self.session_experience,
            session_concepts: self.session_concepts,
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Writes tracker fields into a record.
    #[must_use]
    pub fn to_record(&self) -> ProgressRecord {
        ProgressRecord {
            level: self.level,
            experience: self.experience,
            total_experience: self.total_experience,
            learning: self.learning.clone(),
            combat: self.combat.clone(),
            exploration: self.exploration.clone(),
            achievements: self
                .achievements
                .iter()
                .map(|a| (a.def.id.to_string(), a.state))
                .collect(),
            learned_concepts: self.learned.clone(),
            ..ProgressRecord::default()
        }
    }

    /// Restores tracker fields from a record. Unknown achievement ids are
    /// ignored and session counters start at zero.
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        let mut tracker = Self::new();
        tracker.level = record.level.max(1);
        tracker.experience = record.experience;
        tracker.total_experience = record.total_experience;
        tracker.learning = record.learning.clone();
        tracker.combat = record.combat.clone();
        tracker.exploration = record.exploration.clone();
        tracker.learned = record.learned_concepts.clone();
        for achievement in &mut tracker.achievements {
            if let Some(state) = record.achievements.get(achievement.def.id) {
                achievement.state = *state;
            }
        }
        tracker
    }
}
