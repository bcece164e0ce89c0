//! Requirement-based unlocks for levels, concepts, abilities and features.
//!
//! Every item carries an AND-combined list of requirements evaluated against
//! the latest [`PlayerSnapshot`]. Unlocks only ever accumulate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Level every player starts with.
pub const STARTING_LEVEL_ID: &str = "compute_valley";

// ============================================================================
// Requirements
// ============================================================================

/// What kind of content an item unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockType {
    /// A playable level
    Level,
    /// An advanced concept
    Concept,
    /// An advanced ability
    Ability,
    /// A game feature
    Feature,
}

impl UnlockType {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Concept => "concept",
            Self::Ability => "ability",
            Self::Feature => "feature",
        }
    }
}

/// A single predicate over the player snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockRequirement {
    /// Player level at least this
    Level(u32),
    /// Concept learned or unlocked
    Concept(&'static str),
    /// Achievement earned
    Achievement(&'static str),
    /// At least `count` defeats of an enemy kind
    EnemyDefeats {
        /// Enemy kind id
        enemy_type: &'static str,
        /// Required defeats
        count: u32,
    },
}

/// Static description of one unlockable item.
#[derive(Debug, Clone, Copy)]
pub struct UnlockableContent {
    /// Content id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Content kind
    pub unlock_type: UnlockType,
    /// All must hold
    pub requirements: &'static [UnlockRequirement],
    /// Flavor text
    pub description: &'static str,
}

use UnlockRequirement::{Achievement, Concept, EnemyDefeats, Level};

static CONTENT: [UnlockableContent; 10] = [
    UnlockableContent {
        id: "storage_caverns",
        name: "Storage Caverns",
        unlock_type: UnlockType::Level,
        requirements: &[Concept("ec2_basics"), Level(3)],
        description: "Explore the depths of cloud storage services",
    },
    UnlockableContent {
        id: "network_nexus",
        name: "Network Nexus",
        unlock_type: UnlockType::Level,
        requirements: &[Concept("s3_storage"), Concept("ec2_basics"), Level(5)],
        description: "Navigate the complex world of cloud networking",
    },
    UnlockableContent {
        id: "security_citadel",
        name: "Security Citadel",
        unlock_type: UnlockType::Level,
        requirements: &[
            Concept("vpc_networking"),
            Level(7),
            EnemyDefeats {
                enemy_type: "security_breach",
                count: 3,
            },
        ],
        description: "Master cloud security in this fortified realm",
    },
    UnlockableContent {
        id: "devops_domain",
        name: "DevOps Domain",
        unlock_type: UnlockType::Level,
        requirements: &[Concept("iam_security"), Level(10), Achievement("cloud_expert")],
        description: "The ultimate challenge for cloud masters",
    },
    UnlockableContent {
        id: "advanced_ec2",
        name: "Advanced EC2 Concepts",
        unlock_type: UnlockType::Concept,
        requirements: &[
            Concept("ec2_basics"),
            Level(4),
            EnemyDefeats {
                enemy_type: "latency_monster",
                count: 5,
            },
        ],
        description: "Deep dive into EC2 optimization and scaling",
    },
    UnlockableContent {
        id: "kubernetes_concepts",
        name: "Kubernetes & Containers",
        unlock_type: UnlockType::Concept,
        requirements: &[Concept("lambda_serverless"), Concept("advanced_ec2"), Level(6)],
        description: "Container orchestration in the cloud",
    },
    UnlockableContent {
        id: "multi_az_deployment",
        name: "Multi-AZ Deployment",
        unlock_type: UnlockType::Ability,
        requirements: &[Concept("vpc_networking"), Concept("advanced_ec2"), Level(8)],
        description: "Deploy across multiple availability zones for ultimate resilience",
    },
    UnlockableContent {
        id: "disaster_recovery",
        name: "Disaster Recovery Protocol",
        unlock_type: UnlockType::Ability,
        requirements: &[Concept("s3_storage"), Achievement("flawless_victory"), Level(9)],
        description: "Ultimate defensive ability that can revive from defeat",
    },
    UnlockableContent {
        id: "advanced_combat",
        name: "Advanced Combat System",
        unlock_type: UnlockType::Feature,
        requirements: &[Level(5), Achievement("ability_master")],
        description: "Unlocks combo attacks and advanced combat mechanics",
    },
    UnlockableContent {
        id: "cloud_architect_mode",
        name: "Cloud Architect Mode",
        unlock_type: UnlockType::Feature,
        requirements: &[Level(15), Achievement("cloud_expert"), Achievement("boss_slayer")],
        description: "Design and deploy your own cloud architectures",
    },
];

/// The unlockable item catalog.
#[must_use]
pub fn unlockable_content() -> &'static [UnlockableContent] {
    &CONTENT
}

/// Looks up an unlockable item.
#[must_use]
pub fn content(id: &str) -> Option<&'static UnlockableContent> {
    CONTENT.iter().find(|c| c.id == id)
}

// ============================================================================
// Snapshot
// ============================================================================

/// What the unlock engine knows about the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player level
    pub level: u32,
    /// Learned concept ids
    pub concepts: BTreeSet<String>,
    /// Earned achievement ids
    pub achievements: BTreeSet<String>,
    /// Defeats per enemy kind id
    pub enemy_defeats: BTreeMap<String, u32>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            level: 1,
            concepts: BTreeSet::new(),
            achievements: BTreeSet::new(),
            enemy_defeats: BTreeMap::new(),
        }
    }
}

/// How close a locked item is to unlocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextUnlock {
    /// Content id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Flavor text
    pub description: &'static str,
    /// Content kind
    pub unlock_type: UnlockType,
    /// Requirements currently met
    pub met: usize,
    /// Requirements in total
    pub total: usize,
    /// Descriptions of unmet requirements
    pub missing: Vec<String>,
    /// At most one requirement left
    pub close_to_unlock: bool,
}

/// Unlocked/total counts per content kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnlockSummary {
    /// Level items in the catalog
    pub total_levels: usize,
    /// Unlocked levels, starting level included
    pub unlocked_levels: usize,
    /// Concept items in the catalog
    pub total_concepts: usize,
    /// Unlocked concept items
    pub unlocked_concepts: usize,
    /// Ability items in the catalog
    pub total_abilities: usize,
    /// Unlocked ability items
    pub unlocked_abilities: usize,
    /// Feature items in the catalog
    pub total_features: usize,
    /// Unlocked feature items
    pub unlocked_features: usize,
    /// Unlocked catalog items
    pub unlocked_content: usize,
    /// Catalog size
    pub total_content: usize,
}

// ============================================================================
// Unlock engine
// ============================================================================

/// Tracks which catalog items the player has unlocked.
#[derive(Debug, Clone)]
pub struct LevelProgressionSystem {
    snapshot: PlayerSnapshot,
    unlocked_levels: BTreeSet<String>,
    unlocked_concepts: BTreeSet<String>,
    unlocked_abilities: BTreeSet<String>,
    unlocked_features: BTreeSet<String>,
}

impl Default for LevelProgressionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelProgressionSystem {
    /// Creates the engine with only the starting level unlocked.
    #[must_use]
    pub fn new() -> Self {
        let mut unlocked_levels = BTreeSet::new();
        unlocked_levels.insert(STARTING_LEVEL_ID.to_string());
        Self {
            snapshot: PlayerSnapshot::default(),
            unlocked_levels,
            unlocked_concepts: BTreeSet::new(),
            unlocked_abilities: BTreeSet::new(),
            unlocked_features: BTreeSet::new(),
        }
    }

    /// Replaces the snapshot and unlocks every item whose requirements now
    /// hold. Returns the newly unlocked items in catalog order.
    pub fn update_player_progress(
        &mut self,
        snapshot: PlayerSnapshot,
    ) -> Vec<&'static UnlockableContent> {
        self.snapshot = snapshot;
        let mut newly = Vec::new();
        // Repeat so items gated on freshly unlocked concepts resolve in one call
        loop {
            let before = newly.len();
            for item in &CONTENT {
                if !self.is_unlocked(item.id) && self.requirements_met(item.requirements) {
                    self.insert(item);
                    info!("Unlocked: {} ({})", item.name, item.description);
                    newly.push(item);
                }
            }
            if newly.len() == before {
                break;
            }
        }
        newly
    }

    fn requirements_met(&self, requirements: &[UnlockRequirement]) -> bool {
        requirements.iter().all(|r| self.requirement_met(r))
    }

    fn requirement_met(&self, requirement: &UnlockRequirement) -> bool {
        match *requirement {
            Level(level) => self.snapshot.level >= level,
            Concept(id) => {
                self.snapshot.concepts.contains(id) || self.unlocked_concepts.contains(id)
            },
            Achievement(id) => self.snapshot.achievements.contains(id),
            EnemyDefeats { enemy_type, count } => {
                self.snapshot.enemy_defeats.get(enemy_type).copied().unwrap_or(0) >= count
            },
        }
    }

    fn describe(&self, requirement: &UnlockRequirement) -> String {
        match *requirement {
            Level(level) => format!("Reach level {level}"),
            Concept(id) => format!("Learn {id}"),
            Achievement(id) => format!("Earn achievement: {id}"),
            EnemyDefeats { enemy_type, count } => {
                let current = self.snapshot.enemy_defeats.get(enemy_type).copied().unwrap_or(0);
                format!("Defeat {enemy_type} ({current}/{count})")
            },
        }
    }

    fn set_for(&mut self, unlock_type: UnlockType) -> &mut BTreeSet<String> {
        match unlock_type {
            UnlockType::Level => &mut self.unlocked_levels,
            UnlockType::Concept => &mut self.unlocked_concepts,
            UnlockType::Ability => &mut self.unlocked_abilities,
            UnlockType::Feature => &mut self.unlocked_features,
        }
    }

    fn insert(&mut self, item: &UnlockableContent) {
        self.set_for(item.unlock_type).insert(item.id.to_string());
    }

    /// Whether a catalog item is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, content_id: &str) -> bool {
        self.unlocked_levels.contains(content_id)
            || self.unlocked_concepts.contains(content_id)
            || self.unlocked_abilities.contains(content_id)
            || self.unlocked_features.contains(content_id)
    }

    /// Whether a level may be entered.
    #[must_use]
    pub fn is_level_unlocked(&self, level_id: &str) -> bool {
        self.unlocked_levels.contains(level_id)
    }

    /// Whether an advanced concept is unlocked.
    #[must_use]
    pub fn is_concept_unlocked(&self, concept_id: &str) -> bool {
        self.unlocked_concepts.contains(concept_id)
    }

    /// Whether an advanced ability is unlocked.
    #[must_use]
    pub fn is_ability_unlocked(&self, ability_id: &str) -> bool {
        self.unlocked_abilities.contains(ability_id)
    }

    /// Whether a feature is unlocked.
    #[must_use]
    pub fn is_feature_unlocked(&self, feature_id: &str) -> bool {
        self.unlocked_features.contains(feature_id)
    }

    /// Unlocked level ids.
    #[must_use]
    pub fn available_levels(&self) -> Vec<&str> {
        self.unlocked_levels.iter().map(String::as_str).collect()
    }

    /// Every unlocked id, starting level included.
    #[must_use]
    pub fn unlocked_ids(&self) -> Vec<String> {
        self.unlocked_levels
            .iter()
            .chain(&self.unlocked_concepts)
            .chain(&self.unlocked_abilities)
            .chain(&self.unlocked_features)
            .cloned()
            .collect()
    }

    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &PlayerSnapshot {
        &self.snapshot
    }

    /// Locked items with their progress, closest first.
    #[must_use]
    pub fn next_unlocks(&self) -> Vec<NextUnlock> {
        let mut next: Vec<NextUnlock> = CONTENT
            .iter()
            .filter(|item| !self.is_unlocked(item.id))
            .map(|item| {
                let total = item.requirements.len();
                let missing: Vec<String> = item
                    .requirements
                    .iter()
                    .filter(|r| !self.requirement_met(r))
                    .map(|r| self.describe(r))
                    .collect();
                let met = total - missing.len();
                NextUnlock {
                    id: item.id,
                    name: item.name,
                    description: item.description,
                    unlock_type: item.unlock_type,
                    met,
                    total,
                    missing,
                    close_to_unlock: met + 1 >= total,
                }
            })
            .collect();
        next.sort_by_key(|n| (!n.close_to_unlock, n.total - n.met));
        next
    }

    /// Unlocked/total counts.
    #[must_use]
    pub fn progress_summary(&self) -> UnlockSummary {
        let count = |kind: UnlockType| CONTENT.iter().filter(|c| c.unlock_type == kind).count();
        UnlockSummary {
            total_levels: count(UnlockType::Level),
            unlocked_levels: self.unlocked_levels.len(),
            total_concepts: count(UnlockType::Concept),
            unlocked_concepts: self.unlocked_concepts.len(),
            total_abilities: count(UnlockType::Ability),
            unlocked_abilities: self.unlocked_abilities.len(),
            total_features: count(UnlockType::Feature),
            unlocked_features: self.unlocked_features.len(),
            unlocked_content: CONTENT.iter().filter(|c| self.is_unlocked(c.id)).count(),
            total_content: CONTENT.len(),
        }
    }

    /// Unlocks an item regardless of requirements. Returns false for
    /// unknown ids.
    pub fn force_unlock(&mut self, content_id: &str) -> bool {
        match content(content_id) {
            Some(item) => {
                self.insert(item);
                info!("Force unlocked: {}", item.name);
                true
            },
            None => {
                debug!("Unknown unlockable content: {content_id}");
                false
            },
        }
    }

    /// Restores saved unlocks. Unknown ids are skipped.
    pub fn restore(&mut self, unlocked: &[String]) {
        for id in unlocked {
            if let Some(item) = content(id) {
                self.insert(item);
            } else if id != STARTING_LEVEL_ID {
                debug!("Skipping unknown saved unlock: {id}");
            }
        }
    }
}
