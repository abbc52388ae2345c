//! Model import for meshview
//!
//! This crate turns a file path into displayable
//! [`Content`](meshview_core::Content) through an [`ImporterRegistry`]. The
//! format is chosen from the file extension (case-insensitive):
//!
//! - `.stl`: ASCII or binary STL, geometry only
//! - `.3ds`: Autodesk 3D Studio meshes with their materials
//! - `.obj`: Wavefront OBJ with MTL materials (cargo feature `obj`)
//!
//! All readers are synchronous and blocking.

pub mod registry;
pub mod stl;
pub mod tds;
#[cfg(feature = "obj")]
pub mod obj;
pub mod error;

pub use error::*;
pub use registry::{ImporterRegistry, MeshReader, NodeReader};

