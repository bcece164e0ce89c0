//! Tile-based levels.
//!
//! A [`Level`] is built once and never edited afterwards. Solid tiles are
//! collected into a rectangle list at construction so movement resolution
//! can query them every frame without walking the grid.

use ahash::AHashMap;
use cloudquest_common::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::settings::TILE_SIZE;

/// Id of the level the game starts in.
pub const STARTING_LEVEL: &str = "compute_valley";

/// Tile types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open ground
    Grass,
    /// Level border
    Wall,
    /// Rock or server racks
    Stone,
    /// Water
    Water,
    /// Compute themed floor
    CloudCompute,
    /// Storage themed floor
    CloudStorage,
    /// Marks a learning station
    LearningStation,
    /// Marks an enemy spawn
    EnemySpawn,
}

impl TileKind {
    /// Whether tiles of this kind block movement.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Wall | Self::Stone | Self::Water)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile type
    pub kind: TileKind,
    /// Whether the tile blocks movement
    pub solid: bool,
}

impl Tile {
    /// Creates a tile with the kind's default solidity.
    #[must_use]
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            solid: kind.is_solid(),
        }
    }
}

/// An immutable tile grid.
#[derive(Debug, Clone)]
pub struct Level {
    id: String,
    name: String,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    solid_rects: Vec<Rect>,
}

impl Level {
    /// Level id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in tiles.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in pixels.
    #[must_use]
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            (self.width * TILE_SIZE) as f32,
            (self.height * TILE_SIZE) as f32,
        )
    }

    /// Tile at grid coordinates.
    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize)
    }

    /// Rectangles of every solid tile.
    #[must_use]
    pub fn solid_rects(&self) -> &[Rect] {
        &self.solid_rects
    }

    /// Grid coordinates of every tile of `kind`, row by row.
    #[must_use]
    pub fn tiles_of(&self, kind: TileKind) -> Vec<(u32, u32)> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == kind)
            .map(|(i, _)| (i as u32 % self.width, i as u32 / self.width))
            .collect()
    }
}

/// Top-left pixel of a tile.
#[must_use]
pub fn tile_to_world(x: u32, y: u32) -> Vec2 {
    Vec2::new((x * TILE_SIZE) as f32, (y * TILE_SIZE) as f32)
}

/// Builds a [`Level`] and seals it.
struct LevelBuilder {
    id: String,
    name: String,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl LevelBuilder {
    fn new(id: &str, name: &str, width: u32, height: u32, fill: TileKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            width,
            height,
            tiles: vec![Tile::new(fill); (width * height) as usize],
        }
    }

    fn set(&mut self, x: u32, y: u32, kind: TileKind) -> &mut Self {
        if x < self.width && y < self.height {
            self.tiles[(y * self.width + x) as usize] = Tile::new(kind);
        }
        self
    }

    /// Fills the half-open tile range `[x0, x1) x [y0, y1)`.
    fn fill(&mut self, x0: u32, x1: u32, y0: u32, y1: u32, kind: TileKind) -> &mut Self {
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, kind);
            }
        }
        self
    }

    fn border(&mut self, kind: TileKind) -> &mut Self {
        let (w, h) = (self.width, self.height);
        self.fill(0, w, 0, 1, kind)
            .fill(0, w, h - 1, h, kind)
            .fill(0, 1, 0, h, kind)
            .fill(w - 1, w, 0, h, kind)
    }

    fn build(&self) -> Level {
        let tile = TILE_SIZE as f32;
        let solid_rects = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.solid)
            .map(|(i, _)| {
                let x = i as u32 % self.width;
                let y = i as u32 / self.width;
                Rect::new(x as f32 * tile, y as f32 * tile, tile, tile)
            })
            .collect();

        Level {
            id: self.id.clone(),
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            tiles: self.tiles.clone(),
            solid_rects,
        }
    }
}

fn compute_valley() -> Level {
    let mut b = LevelBuilder::new(STARTING_LEVEL, "Compute Valley", 40, 30, TileKind::Grass);
    b.border(TileKind::Wall)
        .fill(5, 15, 5, 10, TileKind::CloudCompute)
        // Server room
        .fill(20, 25, 8, 12, TileKind::Stone)
        .set(10, 7, TileKind::LearningStation)
        .set(30, 15, TileKind::LearningStation)
        .set(15, 20, TileKind::LearningStation)
        .set(35, 25, TileKind::EnemySpawn)
        .set(8, 25, TileKind::EnemySpawn)
        .set(25, 10, TileKind::EnemySpawn)
        .fill(25, 35, 20, 25, TileKind::Water);
    b.build()
}

fn storage_caverns() -> Level {
    let mut b = LevelBuilder::new("storage_caverns", "Storage Caverns", 36, 28, TileKind::CloudStorage);
    b.border(TileKind::Wall)
        // Cavern pillars
        .fill(10, 13, 4, 12, TileKind::Stone)
        .fill(22, 25, 14, 24, TileKind::Stone)
        // Underground lake
        .fill(4, 10, 18, 24, TileKind::Water)
        .set(6, 6, TileKind::LearningStation)
        .set(28, 20, TileKind::LearningStation)
        .set(30, 5, TileKind::EnemySpawn)
        .set(16, 22, TileKind::EnemySpawn);
    b.build()
}

/// Holds every predefined level, the current one and the camera.
#[derive(Debug)]
pub struct LevelManager {
    levels: AHashMap<String, Level>,
    current: String,
    camera: Camera,
}

impl LevelManager {
    /// Builds all predefined levels and makes the starting level current.
    #[must_use]
    pub fn new(viewport: Vec2) -> Self {
        let mut levels = AHashMap::new();
        for level in [compute_valley(), storage_caverns()] {
            levels.insert(level.id().to_string(), level);
        }
        Self {
            levels,
            current: STARTING_LEVEL.to_string(),
            camera: Camera::new(viewport),
        }
    }

    /// Makes `level_id` current. Unknown ids leave the current level in place.
    pub fn load_level(&mut self, level_id: &str) -> bool {
        if self.levels.contains_key(level_id) {
            self.current = level_id.to_string();
            info!("Loaded level: {level_id}");
            true
        } else {
            warn!("Level '{level_id}' not found");
            false
        }
    }

    /// Current level.
    #[must_use]
    pub fn current(&self) -> &Level {
        // `current` is only ever set to a key present in `levels`
        &self.levels[&self.current]
    }

    /// Looks up a level by id.
    #[must_use]
    pub fn get(&self, level_id: &str) -> Option<&Level> {
        let level = self.levels.get(level_id);
        if level.is_none() {
            debug!("No level with id {level_id}");
        }
        level
    }

    /// Solid rectangles of the current level.
    #[must_use]
    pub fn solid_rects(&self) -> &[Rect] {
        self.current().solid_rects()
    }

    /// Moves the camera toward `target` for `dt` seconds.
    pub fn update_camera(&mut self, target: Vec2, dt: f32) {
        let bounds = self.current().pixel_size();
        self.camera.follow(target, bounds);
        self.camera.update(dt);
    }

    /// Centres the camera on `target` immediately.
    pub fn snap_camera(&mut self, target: Vec2) {
        let bounds = self.current().pixel_size();
        self.camera.snap_to(target, bounds);
    }

    /// Camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> LevelManager {
        LevelManager::new(Vec2::new(1024.0, 768.0))
    }

    #[test]
    fn test_compute_valley_layout() {
        let level = compute_valley();
        assert_eq!((level.width(), level.height()), (40, 30));
        assert_eq!(level.pixel_size(), Vec2::new(1280.0, 960.0));

        assert_eq!(level.tile(0, 0).map(|t| t.kind), Some(TileKind::Wall));
        assert_eq!(level.tile(39, 29).map(|t| t.kind), Some(TileKind::Wall));
        assert_eq!(level.tile(1, 1).map(|t| t.kind), Some(TileKind::Grass));
        assert_eq!(level.tile(5, 5).map(|t| t.kind), Some(TileKind::CloudCompute));
        assert_eq!(level.tile(20, 8).map(|t| t.solid), Some(true));
        assert_eq!(level.tile(25, 20).map(|t| t.kind), Some(TileKind::Water));
        assert!(level.tile(40, 0).is_none());
    }

    #[test]
    fn test_markers() {
        let level = compute_valley();
        assert_eq!(
            level.tiles_of(TileKind::LearningStation),
            vec![(10, 7), (30, 15), (15, 20)]
        );
        assert_eq!(
            level.tiles_of(TileKind::EnemySpawn),
            vec![(25, 10), (8, 25), (35, 25)]
        );
    }

    #[test]
    fn test_solid_rects_match_tiles() {
        let level = compute_valley();
        // Border + stone block + water pool
        let border = 2 * 40 + 2 * 28;
        assert_eq!(level.solid_rects().len(), border + 5 * 4 + 10 * 5);
        assert!(level
            .solid_rects()
            .contains(&Rect::new(640.0, 256.0, 32.0, 32.0)));
    }

    #[test]
    fn test_load_level() {
        let mut levels = manager();
        assert_eq!(levels.current().id(), STARTING_LEVEL);

        assert!(levels.load_level("storage_caverns"));
        assert_eq!(levels.current().name(), "Storage Caverns");

        assert!(!levels.load_level("nowhere"));
        assert_eq!(levels.current().id(), "storage_caverns");
        assert!(levels.get("nowhere").is_none());
    }

    #[test]
    fn test_camera_follows_within_level() {
        let mut levels = manager();
        levels.snap_camera(Vec2::new(16.0, 16.0));
        assert_eq!(levels.camera().offset(), Vec2::ZERO);

        levels.snap_camera(Vec2::new(5000.0, 5000.0));
        assert_eq!(levels.camera().offset(), Vec2::new(256.0, 192.0));
    }

    #[test]
    fn test_tile_to_world() {
        assert_eq!(tile_to_world(10, 7), Vec2::new(320.0, 224.0));
    }
}
