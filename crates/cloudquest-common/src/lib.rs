//! # CloudQuest Common
//!
//! Common types, utilities, and shared abstractions for CloudQuest.
//!
//! This crate provides foundational types used across all CloudQuest crates:
//! - Geometry primitives (`Vec2`, `Rect`)
//! - ID types (`EntityId`)
//! - Version information for the progress record schema
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = SchemaVersion::new(1, 0, 0);
        let v2 = SchemaVersion::new(1, 1, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        // Newer minor reads older data
        assert!(v2.is_compatible_with(&v1));
        assert!(!v1.is_compatible_with(&v3));
    }

    #[test]
    fn test_rect_from_vec2() {
        let rect = Rect::from_position(Vec2::new(10.0, 20.0), 32.0, 32.0);
        assert_eq!(rect.center(), Vec2::new(26.0, 36.0));
    }
}
