//! Core traits for meshview

use crate::{bounds::Aabb, mesh::TriangleMesh};

/// Anything with an axis-aligned extent in its own coordinate space
pub trait Bounded {
    /// Bounding box, or `None` when there is no geometry
    fn bounds(&self) -> Option<Aabb>;

    /// Center of the bounding box
    fn center(&self) -> Option<crate::Point3f> {
        self.bounds().map(|b| b.center())
    }
}

impl Bounded for TriangleMesh {
    fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}
