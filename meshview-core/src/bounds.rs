//! Axis-aligned bounding boxes

use crate::point::*;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    /// Create a box from two corners, in any order
    pub fn new(a: Point3f, b: Point3f) -> Self {
        Self {
            min: Point3f::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3f::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self { min: first, max: first }, |acc, p| acc.including(p)))
    }

    /// Grow the box so it contains `point`
    pub fn including(self, point: &Point3f) -> Self {
        Self {
            min: Point3f::new(self.min.x.min(point.x), self.min.y.min(point.y), self.min.z.min(point.z)),
            max: Point3f::new(self.max.x.max(point.x), self.max.y.max(point.y), self.max.z.max(point.z)),
        }
    }

    /// Smallest box containing both boxes
    pub fn union(self, other: &Self) -> Self {
        self.including(&other.min).including(&other.max)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Largest extent over the three axes
    pub fn max_extent(&self) -> f32 {
        self.width().max(self.height()).max(self.depth())
    }

    /// Centre point of the box
    pub fn center(&self) -> Point3f {
        Point3f::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
            self.min.z + self.depth() / 2.0,
        )
    }
}
