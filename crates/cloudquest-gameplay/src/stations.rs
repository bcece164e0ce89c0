//! Learning stations and enemy placement per level.

use cloudquest_common::Vec2;
use tracing::debug;

use crate::enemy::{EnemyKind, SpawnPoint};
use crate::level::tile_to_world;
use crate::settings::TILE_SIZE;

/// A station tile bound to a concept.
#[derive(Debug, Clone, Copy)]
pub struct StationDef {
    /// Concept taught here
    pub concept_id: &'static str,
    /// Tile coordinates
    pub tile: (u32, u32),
}

/// A spawn tile and the kinds it produces.
#[derive(Debug, Clone, Copy)]
pub struct SpawnDef {
    /// Tile coordinates
    pub tile: (u32, u32),
    /// Kinds that may spawn here
    pub kinds: &'static [EnemyKind],
}

/// Stations, spawn points and starting enemies of one level.
#[derive(Debug, Clone, Copy)]
pub struct LevelLayout {
    /// Level id
    pub level_id: &'static str,
    /// Learning stations
    pub stations: &'static [StationDef],
    /// Periodic spawn points
    pub spawns: &'static [SpawnDef],
    /// Enemies placed when the level loads
    pub initial_enemies: &'static [(EnemyKind, (u32, u32))],
}

static LAYOUTS: [LevelLayout; 2] = [
    LevelLayout {
        level_id: "compute_valley",
        stations: &[
            StationDef {
                concept_id: "ec2_basics",
                tile: (10, 7),
            },
            StationDef {
                concept_id: "s3_storage",
                tile: (30, 15),
            },
            StationDef {
                concept_id: "vpc_networking",
                tile: (15, 20),
            },
        ],
        spawns: &[
            SpawnDef {
                tile: (35, 25),
                kinds: &[EnemyKind::LatencyMonster, EnemyKind::DataLossDemon],
            },
            SpawnDef {
                tile: (8, 25),
                kinds: &[EnemyKind::SecurityBreach, EnemyKind::CostOverrun],
            },
            SpawnDef {
                tile: (25, 10),
                kinds: &[EnemyKind::LatencyMonster, EnemyKind::SecurityBreach],
            },
        ],
        initial_enemies: &[
            (EnemyKind::LatencyMonster, (35, 25)),
            (EnemyKind::SecurityBreach, (8, 25)),
        ],
    },
    LevelLayout {
        level_id: "storage_caverns",
        stations: &[
            StationDef {
                concept_id: "lambda_serverless",
                tile: (6, 6),
            },
            StationDef {
                concept_id: "iam_security",
                tile: (28, 20),
            },
        ],
        spawns: &[
            SpawnDef {
                tile: (30, 5),
                kinds: &[EnemyKind::DataLossDemon, EnemyKind::CostOverrun],
            },
            SpawnDef {
                tile: (16, 22),
                kinds: &[EnemyKind::DataLossDemon, EnemyKind::Bug],
            },
        ],
        initial_enemies: &[
            (EnemyKind::DataLossDemon, (30, 5)),
            (EnemyKind::CostOverrun, (16, 22)),
        ],
    },
];

/// Layout for a level, if it has one.
#[must_use]
pub fn layout(level_id: &str) -> Option<&'static LevelLayout> {
    let found = LAYOUTS.iter().find(|l| l.level_id == level_id);
    if found.is_none() {
        debug!("No layout for level {level_id}");
    }
    found
}

impl LevelLayout {
    /// Spawn points in world coordinates.
    #[must_use]
    pub fn spawn_points(&self) -> Vec<SpawnPoint> {
        self.spawns
            .iter()
            .map(|s| SpawnPoint::new(tile_to_world(s.tile.0, s.tile.1), s.kinds.to_vec()))
            .collect()
    }
}

/// A placed station with its proximity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningStation {
    /// Concept taught here
    pub concept_id: &'static str,
    /// Tile center in world coordinates
    pub position: Vec2,
    /// Player is within interaction range
    pub nearby: bool,
}

/// Stations of the current level.
#[derive(Debug, Clone)]
pub struct StationSet {
    stations: Vec<LearningStation>,
    radius: f32,
}

impl StationSet {
    /// Places the stations of `level_id`. Levels without a layout get none.
    #[must_use]
    pub fn for_level(level_id: &str, radius: f32) -> Self {
        let half = TILE_SIZE as f32 / 2.0;
        let stations = layout(level_id)
            .map(|l| {
                l.stations
                    .iter()
                    .map(|s| LearningStation {
                        concept_id: s.concept_id,
                        position: tile_to_world(s.tile.0, s.tile.1) + Vec2::new(half, half),
                        nearby: false,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { stations, radius }
    }

    /// Refreshes proximity flags against the player center.
    pub fn update(&mut self, player_center: Vec2) {
        for station in &mut self.stations {
            station.nearby = station.position.distance(player_center) <= self.radius;
        }
    }

    /// Stations in range, in layout order.
    pub fn nearby(&self) -> impl Iterator<Item = &LearningStation> {
        self.stations.iter().filter(|s| s.nearby)
    }

    /// Every station.
    #[must_use]
    pub fn all(&self) -> &[LearningStation] {
        &self.stations
    }

    /// Station for a concept.
    #[must_use]
    pub fn find(&self, concept_id: &str) -> Option<&LearningStation> {
        self.stations.iter().find(|s| s.concept_id == concept_id)
    }

    /// Concepts taught in this level.
    #[must_use]
    pub fn concept_ids(&self) -> Vec<&'static str> {
        self.stations.iter().map(|s| s.concept_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelManager, TileKind};

    #[test]
    fn test_layouts_match_level_markers() {
        let levels = LevelManager::new(Vec2::new(1024.0, 768.0));
        for layout in &LAYOUTS {
            let level = levels.get(layout.level_id).expect("level exists");
            let stations = level.tiles_of(TileKind::LearningStation);
            for def in layout.stations {
                assert!(stations.contains(&def.tile), "{} station", def.concept_id);
            }
            let spawns = level.tiles_of(TileKind::EnemySpawn);
            for def in layout.spawns {
                assert!(spawns.contains(&def.tile));
            }
        }
    }

    #[test]
    fn test_unknown_level_has_no_stations() {
        assert!(layout("nowhere").is_none());
        assert!(StationSet::for_level("nowhere", 48.0).all().is_empty());
    }

    #[test]
    fn test_proximity() {
        let mut stations = StationSet::for_level("compute_valley", 48.0);
        assert_eq!(stations.concept_ids(), vec!["ec2_basics", "s3_storage", "vpc_networking"]);

        let ec2 = stations.find("ec2_basics").expect("station").position;
        assert_eq!(ec2, Vec2::new(336.0, 240.0));

        stations.update(ec2 + Vec2::new(40.0, 0.0));
        let near: Vec<_> = stations.nearby().map(|s| s.concept_id).collect();
        assert_eq!(near, vec!["ec2_basics"]);

        stations.update(ec2 + Vec2::new(60.0, 0.0));
        assert_eq!(stations.nearby().count(), 0);
    }

    #[test]
    fn test_spawn_points() {
        let layout = layout("compute_valley").expect("layout");
        let points = layout.spawn_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].position, Vec2::new(1120.0, 800.0));
        assert_eq!(layout.initial_enemies.len(), 2);
    }
}
