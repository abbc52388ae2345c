//! Core data structures for meshview
//!
//! This crate provides the format-independent types shared by the importer,
//! the renderer and the viewer: meshes, bounding boxes, materials, the scene
//! node tree that makes up a piece of displayable content, and a small
//! observable value used to wire UI state together.

pub mod point;
pub mod mesh;
pub mod bounds;
pub mod material;
pub mod scene;
pub mod traits;
pub mod transform;
pub mod observable;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use bounds::*;
pub use material::*;
pub use scene::*;
pub use traits::*;
pub use transform::*;
pub use observable::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
