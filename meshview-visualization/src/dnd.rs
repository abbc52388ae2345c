//! File drag-and-drop onto the viewer window
//!
//! winit reports one hover or drop event per file, so the tracker gathers the
//! files of a gesture and decides whether the drop is accepted. A drop is
//! accepted when any of its files has a supported extension; only the first
//! such file is loaded.

use log::debug;
use meshview_io::ImporterRegistry;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Whether any of the files has a supported extension
pub fn accepts(paths: &[PathBuf], registry: &ImporterRegistry) -> bool {
    paths.iter().any(|p| registry.supports(p))
}

/// First file with a supported extension, URL-decoded
pub fn first_supported(paths: &[PathBuf], registry: &ImporterRegistry) -> Option<PathBuf> {
    paths
        .iter()
        .find(|p| registry.supports(p))
        .map(|p| decode_dropped_path(p))
}

/// Undo percent-encoding left in dropped paths.
///
/// Only paths containing `%` are decoded; a path that does not decode to
/// valid UTF-8 is returned unchanged.
pub fn decode_dropped_path(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if !text.contains('%') {
        return path.to_path_buf();
    }
    match urlencoding::decode(&text) {
        Ok(Cow::Owned(decoded)) => {
            debug!("Decoded dropped path {} -> {}", text, decoded);
            PathBuf::from(decoded)
        }
        Ok(Cow::Borrowed(_)) | Err(_) => path.to_path_buf(),
    }
}

/// Collects the files of the current drag gesture
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    hovered: Vec<PathBuf>,
    dropped: Vec<PathBuf>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file is being dragged over the window
    pub fn hover(&mut self, path: PathBuf) {
        if !self.hovered.contains(&path) {
            self.hovered.push(path);
        }
    }

    /// The drag left the window
    pub fn cancel(&mut self) {
        self.hovered.clear();
        self.dropped.clear();
    }

    pub fn is_hovering(&self) -> bool {
        !self.hovered.is_empty()
    }

    /// Whether the hovered files would be accepted
    pub fn is_accepted(&self, registry: &ImporterRegistry) -> bool {
        accepts(&self.hovered, registry)
    }

    /// A file was dropped; the gesture ends on [`DragTracker::take_drop`]
    pub fn drop_file(&mut self, path: PathBuf) {
        self.dropped.push(path);
    }

    /// End the gesture, returning the file to load if the drop is accepted
    pub fn take_drop(&mut self, registry: &ImporterRegistry) -> Option<PathBuf> {
        let dropped = std::mem::take(&mut self.dropped);
        self.hovered.clear();
        first_supported(&dropped, registry)
    }
}
