//! Cloud-challenge enemies and their spawner.
//!
//! Each enemy runs a small per-frame state machine (patrol, chase, attack,
//! stunned) against the player's centre. Actual damage exchange goes
//! through the combat system; the AI only moves and faces.

use cloudquest_common::{EntityId, Facing, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Maximum live enemies.
pub const MAX_ENEMIES: usize = 5;

/// Seconds between spawn attempts.
pub const SPAWN_COOLDOWN: f32 = 10.0;

/// Seconds between patrol re-targets.
const PATROL_RETARGET: f32 = 3.0;

/// Minimum patrol radius around the origin.
const PATROL_MIN_RADIUS: f32 = 20.0;

/// Enemies stop moving when this close to their target.
const ARRIVE_DISTANCE: f32 = 5.0;

/// Chase gives up beyond this multiple of the detection range.
const LOSE_INTEREST_FACTOR: f32 = 1.5;

/// Damage multiplier for a concept the enemy is weak to.
const WEAKNESS_MULTIPLIER: f32 = 1.5;

/// Enemy attack never drops below this.
pub const MIN_ENEMY_ATTACK: u32 = 5;

/// Kinds with at least this much health are bosses.
const BOSS_HEALTH: u32 = 150;

/// Enemy sprite size in pixels.
pub const ENEMY_SIZE: f32 = 32.0;

// ============================================================================
// Enemy Kinds
// ============================================================================

/// Base stats for one enemy kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    /// Maximum health
    pub max_health: u32,
    /// Damage per attack
    pub attack: u32,
    /// Chase speed in pixels per second
    pub speed: f32,
    /// Concepts dealing 1.5x damage
    pub weaknesses: &'static [&'static str],
    /// Concepts dealing no damage
    pub immunities: &'static [&'static str],
}

/// Kinds of cloud challenge the player fights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Slow network responses
    LatencyMonster,
    /// Unauthorized access
    SecurityBreach,
    /// Lost data
    DataLossDemon,
    /// Runaway spending
    CostOverrun,
    /// Generic bug
    Bug,
}

impl EnemyKind {
    /// Stable string id, used in stats and unlock requirements.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::LatencyMonster => "latency_monster",
            Self::SecurityBreach => "security_breach",
            Self::DataLossDemon => "data_loss_demon",
            Self::CostOverrun => "cost_overrun",
            Self::Bug => "bug",
        }
    }

    /// Looks up a kind by its string id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.id() == id)
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::LatencyMonster => "Latency Monster",
            Self::SecurityBreach => "Security Breach",
            Self::DataLossDemon => "Data Loss Demon",
            Self::CostOverrun => "Cost Overrun",
            Self::Bug => "Bug",
        }
    }

    /// Base stats for this kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::LatencyMonster => EnemyStats {
                max_health: 80,
                attack: 15,
                speed: 30.0,
                weaknesses: &["vpc_networking", "lambda_serverless"],
                immunities: &[],
            },
            Self::SecurityBreach => EnemyStats {
                max_health: 120,
                attack: 25,
                speed: 40.0,
                weaknesses: &["iam_security"],
                immunities: &["ec2_basics"],
            },
            Self::DataLossDemon => EnemyStats {
                max_health: 100,
                attack: 30,
                speed: 35.0,
                weaknesses: &["s3_storage"],
                immunities: &[],
            },
            Self::CostOverrun => EnemyStats {
                max_health: 150,
                attack: 20,
                speed: 25.0,
                weaknesses: &["lambda_serverless", "ec2_basics"],
                immunities: &[],
            },
            Self::Bug => EnemyStats {
                max_health: 60,
                attack: 10,
                speed: 45.0,
                weaknesses: &[],
                immunities: &[],
            },
        }
    }

    /// Whether this kind is security themed.
    #[must_use]
    pub fn is_security(self) -> bool {
        self.id().contains("security")
    }

    /// Whether this kind counts as a boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        self.stats().max_health >= BOSS_HEALTH
    }

    /// All kinds.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::LatencyMonster,
            Self::SecurityBreach,
            Self::DataLossDemon,
            Self::CostOverrun,
            Self::Bug,
        ]
    }
}

impl std::fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// AI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Wandering around the spawn origin
    Patrol,
    /// Moving toward the player
    Chase,
    /// In range, facing the player
    Attack,
    /// Recently hit, not moving
    Stunned,
}

/// A live enemy.
#[derive(Debug, Clone)]
pub struct CloudEnemy {
    id: EntityId,
    kind: EnemyKind,
    position: Vec2,
    origin: Vec2,
    facing: Facing,
    health: u32,
    max_health: u32,
    attack: u32,
    speed: f32,
    detection_range: f32,
    attack_range: f32,
    patrol_range: f32,
    attack_cooldown: f32,
    since_attack: f32,
    state: AiState,
    resume_state: AiState,
    stun_duration: f32,
    stun_timer: f32,
    patrol_target: Option<Vec2>,
    patrol_timer: f32,
}

impl CloudEnemy {
    /// Creates an enemy of `kind` with its top-left corner at `position`.
    #[must_use]
    pub fn new(kind: EnemyKind, position: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id: EntityId::new(),
            kind,
            position,
            origin: position,
            facing: Facing::Down,
            health: stats.max_health,
            max_health: stats.max_health,
            attack: stats.attack,
            speed: stats.speed,
            detection_range: 150.0,
            attack_range: 40.0,
            patrol_range: 100.0,
            attack_cooldown: 2.0,
            since_attack: 0.0,
            state: AiState::Patrol,
            resume_state: AiState::Patrol,
            stun_duration: 0.5,
            stun_timer: 0.0,
            patrol_target: None,
            patrol_timer: 0.0,
        }
    }

    /// Sets how long a hit keeps this enemy stunned.
    #[must_use]
    pub fn with_stun_duration(mut self, seconds: f32) -> Self {
        self.stun_duration = seconds.max(0.0);
        self
    }

    /// Advances the AI by `dt` seconds toward or around `player_center`.
    pub fn update(&mut self, dt: f32, player_center: Vec2, rng: &mut fastrand::Rng) {
        self.tick_attack_timer(dt);

        if self.state == AiState::Stunned {
            self.stun_timer -= dt;
            if self.stun_timer <= 0.0 {
                self.state = self.resume_state;
                debug!("{} {} recovered from stun", self.kind, self.id);
            }
            return;
        }

        let distance = self.center().distance(player_center);

        match self.state {
            AiState::Patrol => {
                self.update_patrol(dt, rng);
                if distance <= self.detection_range {
                    self.state = AiState::Chase;
                }
            },
            AiState::Chase => {
                self.move_toward(player_center, self.speed, dt);
                if distance <= self.attack_range {
                    self.state = AiState::Attack;
                } else if distance > self.detection_range * LOSE_INTEREST_FACTOR {
                    self.state = AiState::Patrol;
                }
            },
            AiState::Attack => {
                if let Some(facing) = Facing::from_vec2(player_center - self.center()) {
                    self.facing = facing;
                }
                if distance > self.attack_range {
                    self.state = AiState::Chase;
                }
            },
            AiState::Stunned => {},
        }
    }

    fn update_patrol(&mut self, dt: f32, rng: &mut fastrand::Rng) {
        self.patrol_timer += dt;
        if self.patrol_target.is_none() || self.patrol_timer >= PATROL_RETARGET {
            let angle = rng.f32() * TAU;
            let radius = PATROL_MIN_RADIUS + rng.f32() * (self.patrol_range - PATROL_MIN_RADIUS);
            self.patrol_target = Some(self.origin + Vec2::from_angle(angle) * radius);
            self.patrol_timer = 0.0;
        }

        if let Some(target) = self.patrol_target {
            // Targets are for the top-left corner, so aim the centre offset.
            let half = Vec2::new(ENEMY_SIZE / 2.0, ENEMY_SIZE / 2.0);
            self.move_toward(target + half, self.speed * 0.5, dt);
        }
    }

    fn move_toward(&mut self, target_center: Vec2, speed: f32, dt: f32) {
        let delta = target_center - self.center();
        if delta.length() <= ARRIVE_DISTANCE {
            return;
        }
        let direction = delta.normalized();
        self.position += direction * (speed * dt);
        if let Some(facing) = Facing::from_vec2(direction) {
            self.facing = facing;
        }
    }

    /// Multiplier applied to damage from `concept_id`. Immunity wins.
    #[must_use]
    pub fn damage_multiplier(&self, concept_id: Option<&str>) -> f32 {
        let Some(concept) = concept_id else {
            return 1.0;
        };
        let stats = self.kind.stats();
        if stats.immunities.contains(&concept) {
            0.0
        } else if stats.weaknesses.contains(&concept) {
            WEAKNESS_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Damage that `amount` from `concept_id` would actually deal.
    /// Fractions are truncated.
    #[must_use]
    pub fn effective_damage(&self, amount: u32, concept_id: Option<&str>) -> u32 {
        (amount as f32 * self.damage_multiplier(concept_id)) as u32
    }

    /// Applies damage after weakness and immunity. Health floors at 0.
    /// Any nonzero hit stuns a surviving enemy. Returns true if it died.
    pub fn take_damage(&mut self, amount: u32, concept_id: Option<&str>) -> bool {
        let dealt = self.effective_damage(amount, concept_id);
        self.health = self.health.saturating_sub(dealt);

        if self.health == 0 {
            return true;
        }
        if dealt > 0 && self.stun_duration > 0.0 {
            if self.state != AiState::Stunned {
                self.resume_state = self.state;
            }
            self.state = AiState::Stunned;
            self.stun_timer = self.stun_duration;
        }
        false
    }

    /// Advances the attack cooldown timer.
    pub fn tick_attack_timer(&mut self, dt: f32) {
        self.since_attack += dt;
    }

    /// Whether the attack cooldown has elapsed.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.since_attack >= self.attack_cooldown
    }

    /// Attacks if off cooldown, returning the damage dealt (0 otherwise).
    pub fn attack_player(&mut self) -> u32 {
        if self.can_attack() {
            self.since_attack = 0.0;
            self.attack
        } else {
            0
        }
    }

    /// Scales attack by `factor`, never below the attack floor.
    pub fn weaken_attack(&mut self, factor: f32) {
        self.attack = ((self.attack as f32 * factor) as u32).max(MIN_ENEMY_ATTACK);
    }

    /// Lowers attack by `amount`, never below the attack floor.
    pub fn reduce_attack(&mut self, amount: u32) {
        self.attack = self.attack.saturating_sub(amount).max(MIN_ENEMY_ATTACK);
    }

    /// Entity ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Enemy kind.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// AI state.
    #[must_use]
    pub fn state(&self) -> AiState {
        self.state
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Collision rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_position(self.position, ENEMY_SIZE, ENEMY_SIZE)
    }

    /// Facing direction.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
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

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    /// Current attack damage.
    #[must_use]
    pub fn attack(&self) -> u32 {
        self.attack
    }

    /// Whether health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

// ============================================================================
// Enemy Manager
// ============================================================================

/// A location enemies spawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Top-left spawn position
    pub position: Vec2,
    /// Kinds that may spawn here
    pub kinds: Vec<EnemyKind>,
}

impl SpawnPoint {
    /// Creates a spawn point.
    #[must_use]
    pub fn new(position: Vec2, kinds: Vec<EnemyKind>) -> Self {
        Self { position, kinds }
    }
}

/// Owns all live enemies and periodic spawning.
#[derive(Debug, Clone)]
pub struct EnemyManager {
    enemies: Vec<CloudEnemy>,
    spawn_points: Vec<SpawnPoint>,
    spawn_timer: f32,
    spawn_cooldown: f32,
    max_enemies: usize,
    stun_duration: f32,
}

impl Default for EnemyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EnemyManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enemies: Vec::new(),
            spawn_points: Vec::new(),
            spawn_timer: 0.0,
            spawn_cooldown: SPAWN_COOLDOWN,
            max_enemies: MAX_ENEMIES,
            stun_duration: 0.5,
        }
    }

    /// Sets the stun duration applied to enemies spawned from now on.
    #[must_use]
    pub fn with_stun_duration(mut self, seconds: f32) -> Self {
        self.stun_duration = seconds;
        self
    }

    /// Registers a spawn point.
    pub fn add_spawn_point(&mut self, point: SpawnPoint) {
        self.spawn_points.push(point);
    }

    /// Spawn points.
    #[must_use]
    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Spawns an enemy unless the live cap is reached.
    pub fn spawn(&mut self, kind: EnemyKind, position: Vec2) -> Option<EntityId> {
        if self.enemies.len() >= self.max_enemies {
            debug!("Enemy cap reached, not spawning {kind}");
            return None;
        }
        let enemy = CloudEnemy::new(kind, position).with_stun_duration(self.stun_duration);
        let id = self.add_enemy(enemy)?;
        info!("Spawned {} {} at ({}, {})", kind, id, position.x, position.y);
        Some(id)
    }

    /// Adds an already built enemy unless the live cap is reached.
    pub fn add_enemy(&mut self, enemy: CloudEnemy) -> Option<EntityId> {
        if self.enemies.len() >= self.max_enemies {
            debug!("Enemy cap reached, not adding {}", enemy.kind());
            return None;
        }
        let id = enemy.id();
        self.enemies.push(enemy);
        Some(id)
    }

    fn spawn_random(&mut self, rng: &mut fastrand::Rng) -> Option<EntityId> {
        if self.spawn_points.is_empty() {
            return None;
        }
        let point = &self.spawn_points[rng.usize(..self.spawn_points.len())];
        if point.kinds.is_empty() {
            return None;
        }
        let kind = point.kinds[rng.usize(..point.kinds.len())];
        let position = point.position;
        self.spawn(kind, position)
    }

    /// Advances AI and the spawn timer. Returns the id of an enemy spawned
    /// this frame, if any.
    pub fn update(
        &mut self,
        dt: f32,
        player_center: Vec2,
        rng: &mut fastrand::Rng,
    ) -> Option<EntityId> {
        for enemy in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            enemy.update(dt, player_center, rng);
        }

        self.spawn_timer += dt;
        if self.spawn_timer >= self.spawn_cooldown && self.enemies.len() < self.max_enemies {
            let spawned = self.spawn_random(rng);
            if spawned.is_some() {
                self.spawn_timer = 0.0;
            }
            return spawned;
        }
        None
    }

    /// Removes dead enemies, returning what was removed.
    pub fn remove_dead(&mut self) -> Vec<(EntityId, EnemyKind)> {
        let mut removed = Vec::new();
        self.enemies.retain(|e| {
            if e.is_alive() {
                true
            } else {
                removed.push((e.id(), e.kind()));
                false
            }
        });
        removed
    }

    /// First live enemy overlapping `player_rect`.
    #[must_use]
    pub fn check_player_collision(&self, player_rect: &Rect) -> Option<EntityId> {
        self.enemies
            .iter()
            .find(|e| e.is_alive() && e.rect().overlaps(player_rect))
            .map(CloudEnemy::id)
    }

    /// Enemies whose centre is within `radius` of `point`.
    #[must_use]
    pub fn enemies_near(&self, point: Vec2, radius: f32) -> Vec<&CloudEnemy> {
        self.enemies
            .iter()
            .filter(|e| e.center().distance(point) <= radius)
            .collect()
    }

    /// Looks up an enemy.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&CloudEnemy> {
        self.enemies.iter().find(|e| e.id() == id)
    }

    /// Looks up an enemy mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CloudEnemy> {
        self.enemies.iter_mut().find(|e| e.id() == id)
    }

    /// Live enemies.
    pub fn iter(&self) -> impl Iterator<Item = &CloudEnemy> {
        self.enemies.iter()
    }

    /// Number of enemies held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Whether there are no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Removes every enemy.
    pub fn clear_all(&mut self) {
        self.enemies.clear();
        self.spawn_timer = 0.0;
    }
}
