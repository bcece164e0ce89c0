//! # CloudQuest Gameplay
//!
//! Gameplay systems for CloudQuest.
//!
//! This crate holds the whole game core and performs no I/O of its own:
//! - Player and enemy entities with chase/patrol AI
//! - Tile levels and a following camera
//! - Cloud concept catalog and quiz bank
//! - Ability catalog, unlocks and loadout
//! - Turn-based combat and multi-phase learning sessions
//! - Progress tracking with achievements
//! - Requirement-based unlocks for levels, concepts, abilities and features
//! - The [`GameSession`] that drives all of the above frame by frame

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod abilities;
pub mod camera;
pub mod combat;
pub mod education;
pub mod enemy;
pub mod events;
pub mod input;
pub mod learning;
pub mod level;
pub mod notifications;
pub mod player;
pub mod progress;
pub mod progression;
pub mod save;
pub mod session;
pub mod settings;
pub mod stations;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::abilities::*;
    pub use crate::camera::*;
    pub use crate::combat::*;
    pub use crate::education::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::learning::*;
    pub use crate::level::*;
    pub use crate::notifications::*;
    pub use crate::player::*;
    pub use crate::progress::*;
    pub use crate::progression::*;
    pub use crate::save::*;
    pub use crate::session::*;
    pub use crate::settings::*;
    pub use crate::stations::*;
}

pub use prelude::*;
