//! Command line configuration for the viewer

use crate::camera::{ClipRange, FAR_CLIP_BOUNDS, INITIAL_FAR_CLIP, INITIAL_NEAR_CLIP, NEAR_CLIP_BOUNDS};
use clap::Parser;
use meshview_core::{Error, Result};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "meshview")]
#[command(about = "Interactive viewer for STL, 3DS and OBJ models")]
#[command(version)]
pub struct ViewerConfig {
    /// Model to load on startup
    #[arg(long, value_name = "FILE")]
    pub open: Option<PathBuf>,

    /// Initial camera near-clip distance
    #[arg(long, default_value_t = INITIAL_NEAR_CLIP)]
    pub near_clip: f64,

    /// Initial camera far-clip distance
    #[arg(long, default_value_t = INITIAL_FAR_CLIP)]
    pub far_clip: f64,

    /// Start with auto-rotation switched on
    #[arg(long)]
    pub rotate: bool,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Upper bound on threads used for importing
    #[arg(long, default_value_t = 1)]
    pub loader_threads: usize,
}

impl ViewerConfig {
    /// Check the values clap cannot, returning the initial clip range
    pub fn validate(&self) -> Result<ClipRange> {
        let in_bounds = |value: f64, (min, max): (f64, f64)| value >= min && value <= max;
        if !in_bounds(self.near_clip, NEAR_CLIP_BOUNDS) || !in_bounds(self.far_clip, FAR_CLIP_BOUNDS) {
            return Err(Error::InvalidClipRange {
                near: self.near_clip,
                far: self.far_clip,
            });
        }
        let clip = ClipRange::new(self.near_clip, self.far_clip)?;

        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidData(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.loader_threads == 0 {
            return Err(Error::InvalidData("at least one loader thread is required".into()));
        }
        Ok(clip)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::parse_from(["meshview"])
    }
}
