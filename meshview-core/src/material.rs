//! Surface materials

use serde::{Deserialize, Serialize};

/// A flat diffuse material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGB in `[0, 1]`
    pub diffuse: [f32; 3],
    /// 1.0 is fully opaque
    pub opacity: f32,
}

impl Material {
    /// Gray used for formats that carry no material data
    pub const DEFAULT_GRAY: [f32; 3] = [128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0];

    pub fn new(name: impl Into<String>, diffuse: [f32; 3], opacity: f32) -> Self {
        Self {
            name: Some(name.into()),
            diffuse,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Flat gray opaque material
    pub fn gray() -> Self {
        Self {
            name: None,
            diffuse: Self::DEFAULT_GRAY,
            opacity: 1.0,
        }
    }

    /// Build a diffuse colour from 8-bit channels
    pub fn from_rgb8(name: impl Into<String>, rgb: [u8; 3]) -> Self {
        Self::new(
            name,
            [rgb[0] as f32 / 255.0, rgb[1] as f32 / 255.0, rgb[2] as f32 / 255.0],
            1.0,
        )
    }

    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::gray()
    }
}
