//! # CloudQuest Engine
//!
//! Headless runner for CloudQuest.
//!
//! This crate wraps the gameplay core with everything a process needs:
//! - TOML configuration with platform default paths
//! - Atomic JSON save files
//! - Auto-save on a timer and after milestones
//! - Frame timing
//! - A scripted autopilot that plays the game end to end

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod autopilot;
pub mod autosave;
pub mod config;
pub mod save_manager;
pub mod timing;

pub use app::{run, RunStats, RunSummary};
pub use autopilot::Autopilot;
pub use autosave::{AutoSaveConfig, AutoSaveManager, AutoSaveTrigger};
pub use config::EngineConfig;
pub use save_manager::JsonFileStore;
pub use timing::FrameTiming;
