//! Auto-save for progress.
//!
//! This module provides:
//! - AutoSaveConfig: interval and which milestones save
//! - AutoSaveManager: saves on a timer and after milestones
//! - Pausing while a battle or lesson is in progress

use cloudquest_gameplay::{GameEvent, GameMode, GameSession, ProgressStore};
use tracing::{debug, info, warn};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL: f64 = 60.0;

/// Minimum auto-save interval in seconds.
pub const MIN_AUTOSAVE_INTERVAL: f64 = 5.0;

/// Events that can trigger an auto-save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoSaveTrigger {
    /// Timer-based auto-save.
    Interval,
    /// A concept was learned.
    ConceptLearned,
    /// A battle was won.
    BattleWon,
    /// New content was unlocked.
    ContentUnlocked,
    /// Manual trigger from game logic.
    Manual,
}

impl AutoSaveTrigger {
    /// Returns display name for the trigger.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Interval => "Auto-save",
            Self::ConceptLearned => "Concept Learned",
            Self::BattleWon => "Battle Won",
            Self::ContentUnlocked => "Content Unlocked",
            Self::Manual => "Manual",
        }
    }

    /// Trigger raised by a session event, if any.
    #[must_use]
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::ConceptLearned { .. } => Some(Self::ConceptLearned),
            GameEvent::EnemyDefeated { .. } => Some(Self::BattleWon),
            GameEvent::ContentUnlocked { .. } => Some(Self::ContentUnlocked),
            _ => None,
        }
    }
}

/// Conditions that pause auto-saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoSavePauseReason {
    /// In active combat.
    Combat,
    /// In a learning session.
    Learning,
    /// Player explicitly paused.
    PlayerPaused,
}

/// Configuration for auto-save behavior.
#[derive(Debug, Clone)]
pub struct AutoSaveConfig {
    /// Whether auto-save is enabled.
    pub enabled: bool,
    /// Interval between automatic saves (in seconds).
    pub interval_seconds: f64,
    /// Save after milestones such as learning a concept.
    pub save_on_milestones: bool,
    /// Pause auto-save during combat.
    pub pause_during_combat: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: DEFAULT_AUTOSAVE_INTERVAL,
            save_on_milestones: true,
            pause_during_combat: true,
        }
    }
}

impl AutoSaveConfig {
    /// Creates a config with auto-save disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Config for an interval in whole seconds. Zero disables auto-save.
    #[must_use]
    pub fn from_interval(seconds: u32) -> Self {
        if seconds == 0 {
            Self::disabled()
        } else {
            Self::default().with_interval(f64::from(seconds))
        }
    }

    /// Sets the auto-save interval.
    #[must_use]
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds.max(MIN_AUTOSAVE_INTERVAL);
        self
    }
}

/// Status of the auto-save system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveStatus {
    /// System is idle, waiting for next trigger.
    Idle,
    /// Auto-save is paused.
    Paused,
    /// Disabled by config.
    Disabled,
}

/// Manager for automatic saves.
#[derive(Debug)]
pub struct AutoSaveManager {
    config: AutoSaveConfig,
    time_since_save: f64,
    pause_reasons: Vec<AutoSavePauseReason>,
    pending_triggers: Vec<AutoSaveTrigger>,
    saves: u32,
    failures: u32,
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new(AutoSaveConfig::default())
    }
}

impl AutoSaveManager {
    /// Creates a new auto-save manager.
    #[must_use]
    pub fn new(config: AutoSaveConfig) -> Self {
        Self {
            config,
            time_since_save: 0.0,
            pause_reasons: Vec::new(),
            pending_triggers: Vec::new(),
            saves: 0,
            failures: 0,
        }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> AutoSaveStatus {
        if !self.config.enabled {
            AutoSaveStatus::Disabled
        } else if self.is_paused() {
            AutoSaveStatus::Paused
        } else {
            AutoSaveStatus::Idle
        }
    }

    /// Returns whether auto-save is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        !self.pause_reasons.is_empty()
    }

    /// Returns time until next auto-save.
    #[must_use]
    pub fn time_until_next_save(&self) -> f64 {
        (self.config.interval_seconds - self.time_since_save).max(0.0)
    }

    /// Successful saves so far.
    #[must_use]
    pub fn saves(&self) -> u32 {
        self.saves
    }

    /// Failed saves so far.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Pauses auto-save with a reason.
    pub fn pause(&mut self, reason: AutoSavePauseReason) {
        if !self.pause_reasons.contains(&reason) {
            self.pause_reasons.push(reason);
            debug!("Auto-save paused: {:?}", reason);
        }
    }

    /// Resumes auto-save by removing a pause reason.
    pub fn resume(&mut self, reason: AutoSavePauseReason) {
        if self.pause_reasons.contains(&reason) {
            self.pause_reasons.retain(|r| *r != reason);
            debug!("Auto-save pause removed: {:?}", reason);
        }
    }

    /// Aligns pause reasons with the session mode.
    pub fn sync_mode(&mut self, mode: GameMode) {
        let wanted = match mode {
            GameMode::Combat if self.config.pause_during_combat => {
                Some(AutoSavePauseReason::Combat)
            },
            GameMode::Learning => Some(AutoSavePauseReason::Learning),
            GameMode::Paused => Some(AutoSavePauseReason::PlayerPaused),
            _ => None,
        };
        for reason in [
            AutoSavePauseReason::Combat,
            AutoSavePauseReason::Learning,
            AutoSavePauseReason::PlayerPaused,
        ] {
            if Some(reason) == wanted {
                self.pause(reason);
            } else {
                self.resume(reason);
            }
        }
    }

    /// Triggers an auto-save event.
    pub fn trigger(&mut self, trigger: AutoSaveTrigger) {
        if trigger != AutoSaveTrigger::Interval
            && trigger != AutoSaveTrigger::Manual
            && !self.config.save_on_milestones
        {
            return;
        }
        if !self.pending_triggers.contains(&trigger) {
            self.pending_triggers.push(trigger);
            debug!("Auto-save triggered: {:?}", trigger);
        }
    }

    /// Updates the auto-save manager (call each frame).
    pub fn update(&mut self, delta_time: f64) {
        if !self.config.enabled || self.is_paused() {
            return;
        }
        self.time_since_save += delta_time;
    }

    /// Checks if auto-save should trigger and performs save if needed.
    /// Returns true if a save was made.
    pub fn check_and_save(&mut self, session: &GameSession, store: &dyn ProgressStore) -> bool {
        if !self.config.enabled || self.is_paused() {
            return false;
        }

        if self.time_since_save >= self.config.interval_seconds {
            self.trigger(AutoSaveTrigger::Interval);
        }

        match self.pending_triggers.pop() {
            Some(trigger) => self.perform_save(session, store, trigger),
            None => false,
        }
    }

    fn perform_save(
        &mut self,
        session: &GameSession,
        store: &dyn ProgressStore,
        trigger: AutoSaveTrigger,
    ) -> bool {
        match session.save_progress(store) {
            Ok(()) => {
                self.time_since_save = 0.0;
                self.pending_triggers.clear();
                self.saves += 1;
                info!("Auto-save complete ({})", trigger.display_name());
                true
            },
            Err(e) => {
                self.failures += 1;
                // Retry on the next interval rather than every frame
                self.time_since_save = 0.0;
                self.pending_triggers.clear();
                warn!("Auto-save failed: {e}");
                false
            },
        }
    }
}
