//! Application lifecycle management.
//!
//! Headless game loop: load progress, feed the session scripted input
//! frame by frame, auto-save along the way and save once more on exit.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use cloudquest_gameplay::{CombatOutcome, GameEvent, GameSession, ProgressSummary};

use crate::autopilot::Autopilot;
use crate::autosave::{AutoSaveConfig, AutoSaveManager, AutoSaveTrigger};
use crate::config::EngineConfig;
use crate::save_manager::JsonFileStore;
use crate::timing::FrameTiming;

/// Frames between periodic status lines.
const STATUS_EVERY_FRAMES: u64 = 600;

/// Counters gathered from session events over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Enemies that appeared
    pub enemies_spawned: u32,
    /// Encounters started
    pub battles_started: u32,
    /// Encounters won
    pub victories: u32,
    /// Encounters lost
    pub defeats: u32,
    /// Encounters escaped
    pub escapes: u32,
    /// Concepts learned
    pub concepts_learned: u32,
    /// Level ups
    pub level_ups: u32,
    /// Achievements earned
    pub achievements: u32,
    /// Content unlocked
    pub unlocks: u32,
}

impl RunStats {
    /// Folds one event into the counters.
    pub fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::EnemySpawned { kind, .. } => {
                self.enemies_spawned += 1;
                debug!("Enemy spawned: {kind}");
            },
            GameEvent::CombatStarted { entity_id } => {
                self.battles_started += 1;
                debug!("Combat started with {entity_id}");
            },
            GameEvent::CombatEnded { outcome } => match outcome {
                CombatOutcome::Victory { .. } => self.victories += 1,
                CombatOutcome::Defeat { .. } => self.defeats += 1,
                CombatOutcome::Fled { .. } => self.escapes += 1,
            },
            GameEvent::ConceptLearned { concept_id, .. } => {
                self.concepts_learned += 1;
                info!("Learned {concept_id}");
            },
            GameEvent::LevelUp { level } => {
                self.level_ups += 1;
                info!("Reached level {level}");
            },
            GameEvent::AchievementUnlocked { achievement_id } => {
                self.achievements += 1;
                info!("Achievement {achievement_id}");
            },
            GameEvent::ContentUnlocked { content_id } => {
                self.unlocks += 1;
                info!("Unlocked {content_id}");
            },
            GameEvent::Damage { .. }
            | GameEvent::Heal { .. }
            | GameEvent::EnemyDefeated { .. } => {},
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u64,
    /// Simulated seconds
    pub seconds: f64,
    /// Level the run ended in
    pub level_id: String,
    /// Every catalog concept was learned
    pub finished: bool,
    /// Auto-saves made
    pub auto_saves: u32,
    /// Event counters
    pub stats: RunStats,
    /// Progress at exit
    pub progress: ProgressSummary,
}

/// Runs the game until the frame limit or until every concept is learned.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let save_dir = config.save_path();
    let store = JsonFileStore::new(&save_dir, config.save_slot.clone())
        .context("invalid save slot")?;

    let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
    info!("Configuration loaded:");
    info!("  Viewport: {}x{}", config.screen_width, config.screen_height);
    info!("  Target FPS: {}", config.target_fps);
    info!("  Seed: {seed}");
    info!("  Saves: {}", store.slot_path().display());

    let mut session = GameSession::load(
        config.game_settings(),
        fastrand::Rng::with_seed(seed),
        &store,
    );
    let mut autopilot = Autopilot::new(fastrand::Rng::with_seed(seed.wrapping_add(1)));
    let mut autosave = AutoSaveManager::new(AutoSaveConfig::from_interval(config.auto_save_interval));
    let mut timing = FrameTiming::new(config.target_fps);
    let mut stats = RunStats::default();

    let fixed_dt = config.frame_dt();
    let mut frames: u64 = 0;
    let mut seconds = 0.0_f64;

    info!("Starting game loop...");
    loop {
        if config.max_frames > 0 && frames >= config.max_frames {
            info!("Frame limit reached");
            break;
        }
        if Autopilot::is_finished(&session) {
            info!("Every concept learned");
            break;
        }

        let dt = if config.realtime {
            timing.delta_time()
        } else {
            timing.record(fixed_dt)
        };

        let input = autopilot.next_input(&session, dt);
        session.update(&input, dt);

        for event in session.drain_events() {
            if let Some(trigger) = AutoSaveTrigger::for_event(&event) {
                autosave.trigger(trigger);
            }
            stats.record(&event);
        }

        if let Some(level_id) = autopilot.destination(&session) {
            if session.travel_to(level_id) {
                info!("Travelled to {level_id}");
                autosave.trigger(AutoSaveTrigger::Manual);
            }
        }

        autosave.sync_mode(session.mode());
        autosave.update(f64::from(dt));
        autosave.check_and_save(&session, &store);

        frames += 1;
        seconds += f64::from(dt);

        if frames % STATUS_EVERY_FRAMES == 0 {
            let summary = session.tracker().summary();
            debug!(
                "Frame {frames}: level {} ({} XP), {} concepts, {:.1} FPS",
                summary.level,
                summary.experience,
                summary.concepts_learned,
                timing.current_fps()
            );
        }

        if config.realtime {
            timing.sleep_remainder();
        }
    }

    if let Err(e) = session.save_progress(&store) {
        warn!("Final save failed: {e}");
    }

    let summary = RunSummary {
        frames,
        seconds,
        level_id: session.levels().current().id().to_string(),
        finished: Autopilot::is_finished(&session),
        auto_saves: autosave.saves(),
        stats,
        progress: session.tracker().summary(),
    };
    info!(
        "Run complete: {} frames, level {}, {} concepts, {} battles won",
        summary.frames,
        summary.progress.level,
        summary.progress.concepts_learned,
        summary.progress.battles_won
    );
    Ok(summary)
}
