//! Interactive viewing of 3D model files
//!
//! This crate holds everything between the importers and the window:
//! - Camera rig driven by pointer drag and scroll, with log-scaled clip sliders
//! - Content host that frames a loaded model and spins it on demand
//! - Background loader with a single in-flight import
//! - Drag-and-drop handling, frame rate meter and command line configuration
//! - The winit/wgpu/egui window that puts it all on screen
//!
//! [`Viewer`] is the windowless model of the application;
//! [`InteractiveViewer`] wraps it in a desktop window.

pub mod camera;
pub mod config;
pub mod content;
pub mod dnd;
pub mod fps;
pub mod interactive_viewer;
pub mod loader;
pub mod ui;
pub mod viewer;

pub use camera::{CameraRig, ClipRange, LogSlider};
pub use config::ViewerConfig;
pub use content::{ContentHost, Framing, RotationAnimation};
pub use dnd::DragTracker;
pub use fps::FrameRateMeter;
pub use interactive_viewer::{InteractiveViewer, ViewerEvent};
pub use loader::{LoadError, LoadFailure, LoadOrchestrator, LoadOutcome, LoadSession, LoadState};
pub use viewer::{Viewer, ViewerError};
