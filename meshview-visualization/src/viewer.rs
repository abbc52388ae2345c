//! Viewer model
//!
//! [`Viewer`] ties the camera rig, the content host and the load orchestrator
//! together and holds the state the controls display: status line, clip
//! sliders, frame rate and the current drag gesture. It has no window or GPU
//! dependency, so the whole interaction flow can be driven from tests.

use crate::camera::{CameraRig, LogSlider};
use crate::config::ViewerConfig;
use crate::content::ContentHost;
use crate::dnd::DragTracker;
use crate::fps::FrameRateMeter;
use crate::loader::{LoadError, LoadOrchestrator, LoadOutcome, LoadState};
use log::{info, warn};
use meshview_core::{Content, Observable};
use meshview_io::ImporterRegistry;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while setting up the viewer
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Config(#[from] meshview_core::Error),

    #[error(transparent)]
    Loader(#[from] LoadError),
}

pub struct Viewer {
    camera: CameraRig,
    host: ContentHost,
    loader: LoadOrchestrator,
    status: Observable<String>,
    near_slider: LogSlider,
    far_slider: LogSlider,
    fps: FrameRateMeter,
    drops: DragTracker,
    content_changed: Rc<Cell<bool>>,
    last_path: Option<PathBuf>,
}

impl Viewer {
    /// Viewer with every built-in format
    pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
        Self::with_registry(config, ImporterRegistry::with_default_formats())
    }

    pub fn with_registry(config: &ViewerConfig, registry: ImporterRegistry) -> Result<Self, ViewerError> {
        let clip = config.validate()?;
        let loader = LoadOrchestrator::new(registry, config.loader_threads)?;

        let mut camera = CameraRig::new();
        camera.set_clip_range(clip);

        let content_changed = Rc::new(Cell::new(false));
        let mut host = ContentHost::new();
        let flag = Rc::clone(&content_changed);
        host.subscribe(move |_| flag.set(true));
        host.set_rotating(config.rotate);

        Ok(Self {
            camera,
            host,
            loader,
            status: Observable::new(String::new()),
            near_slider: LogSlider::near_clip(clip.near()),
            far_slider: LogSlider::far_clip(clip.far()),
            fps: FrameRateMeter::new(),
            drops: DragTracker::new(),
            content_changed,
            last_path: None,
        })
    }

    /// Wake-up hook run from the loader thread when an outcome is ready
    pub fn set_load_notifier(&mut self, notifier: impl Fn() + Send + Sync + 'static) {
        self.loader.set_notifier(notifier);
    }

    /// Start loading `path`.
    ///
    /// An unsupported file is reported on the status line straight away and
    /// leaves the current content in place. Otherwise the content is cleared
    /// and the controls stay disabled until the outcome arrives.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<(), LoadError> {
        let path = path.into();
        match self.loader.check(&path) {
            Ok(()) => {}
            Err(LoadError::Rejected(e)) => {
                warn!("Rejected {}: {}", path.display(), e);
                self.status.set(e.to_string());
                return Err(LoadError::Rejected(e));
            }
            Err(e) => {
                warn!("{}", e);
                return Err(e);
            }
        }

        self.last_path = Some(path.clone());
        self.host.set_content(None);
        self.status.set(String::new());
        self.loader.start(path).map_err(|e| {
            warn!("{}", e);
            e
        })
    }

    /// Apply a finished load, if one is waiting. Returns whether it did.
    pub fn poll_loader(&mut self) -> bool {
        match self.loader.poll() {
            Some(outcome) => {
                self.finish_load(outcome);
                true
            }
            None => false,
        }
    }

    /// Block until the current load finishes, then apply it
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.loader.wait(timeout) {
            Some(outcome) => {
                self.finish_load(outcome);
                true
            }
            None => false,
        }
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        let status = outcome.status_text();
        if let Ok(content) = outcome.result {
            let framing = self.host.set_content(Some(content));
            self.camera.set_scale_factor(framing.scale_factor);
            self.camera.set_offset(framing.camera_offset);
            info!(
                "Framed content: scale factor {:.3}, camera offset {:.3}",
                framing.scale_factor, framing.camera_offset
            );
        }
        self.status.set(status);
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Open button and clip sliders
    pub fn controls_enabled(&self) -> bool {
        !self.is_loading()
    }

    pub fn registry(&self) -> &ImporterRegistry {
        self.loader.registry()
    }

    pub fn content(&self) -> Option<&Content> {
        self.host.content()
    }

    /// Whether the content was replaced since the last call
    pub fn take_content_changed(&mut self) -> bool {
        self.content_changed.replace(false)
    }

    pub fn can_rotate(&self) -> bool {
        self.host.has_content() && !self.is_loading()
    }

    pub fn toggle_rotation(&mut self) -> bool {
        self.host.toggle_rotation()
    }

    pub fn is_rotating(&self) -> bool {
        self.host.is_rotating()
    }

    pub fn tick(&mut self, dt: Duration) {
        self.host.tick(dt);
    }

    pub fn status(&self) -> &str {
        self.status.get()
    }

    pub fn subscribe_status(&mut self, subscriber: impl FnMut(&String) + 'static) {
        self.status.subscribe(subscriber);
    }

    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        self.fps.record(now)
    }

    pub fn fps_text(&self) -> String {
        self.fps.text()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn near_slider(&self) -> &LogSlider {
        &self.near_slider
    }

    pub fn far_slider(&self) -> &LogSlider {
        &self.far_slider
    }

    /// Move the near-clip slider and apply its value to the camera
    pub fn set_near_position(&mut self, position: f64) -> meshview_core::Result<()> {
        self.near_slider.set_position(position);
        self.camera.set_near_clip(self.near_slider.value())
    }

    /// Move the far-clip slider and apply its value to the camera
    pub fn set_far_position(&mut self, position: f64) -> meshview_core::Result<()> {
        self.far_slider.set_position(position);
        self.camera.set_far_clip(self.far_slider.value())
    }

    pub fn drag_over(&mut self, path: PathBuf) {
        self.drops.hover(path);
    }

    pub fn drag_cancel(&mut self) {
        self.drops.cancel();
    }

    pub fn is_drag_hovering(&self) -> bool {
        self.drops.is_hovering()
    }

    pub fn drag_accepted(&self) -> bool {
        self.drops.is_accepted(self.loader.registry())
    }

    pub fn drop_file(&mut self, path: PathBuf) {
        self.drops.drop_file(path);
    }

    /// Load the first supported dropped file, if any
    pub fn finish_drop(&mut self) -> Option<Result<(), LoadError>> {
        let path = self.drops.take_drop(self.loader.registry())?;
        Some(self.open(path))
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    /// Starting directory for the open dialog
    pub fn dialog_directory(&self) -> Option<&Path> {
        self.last_path()?.parent().filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Extensions for the open dialog filter
    pub fn extension_filters(&self) -> Vec<String> {
        self.loader.registry().supported_extensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const WAIT: Duration = Duration::from_secs(10);

    const CUBE_CORNER: &str = "solid corner
facet normal 0 0 -1
outer loop
vertex 0 0 0
vertex 50 0 0
vertex 0 10 0
endloop
endfacet
facet normal 0 -1 0
outer loop
vertex 0 0 0
vertex 0 0 20
vertex 50 0 0
endloop
endfacet
endsolid corner
";

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let viewer = viewer();
        assert_eq!(viewer.status(), "");
        assert!(viewer.controls_enabled());
        assert!(!viewer.can_rotate());
        assert_relative_eq!(viewer.near_slider().value(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(viewer.far_slider().value(), 10_000.0, epsilon = 1e-6);
        assert_eq!(viewer.dialog_directory(), None);
        assert_eq!(viewer.extension_filters(), vec!["3ds", "obj", "stl"]);
    }

    #[test]
    fn test_invalid_config() {
        let config = ViewerConfig {
            near_clip: 50.0,
            ..ViewerConfig::default()
        };
        assert!(matches!(Viewer::new(&config), Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_unsupported_file_keeps_content() {
        let mut viewer = viewer();
        assert!(viewer.open("model.xyz").is_err());
        assert_eq!(viewer.status(), "Unsupported 3D file format [xyz]");
        assert!(viewer.controls_enabled());
        assert_eq!(viewer.last_path(), None);
    }

    #[test]
    fn test_load_frames_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corner.stl");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(CUBE_CORNER.as_bytes())
            .unwrap();

        let mut viewer = viewer();
        viewer.open(&path).unwrap();
        assert!(!viewer.controls_enabled());
        assert!(!viewer.can_rotate());
        assert_eq!(viewer.dialog_directory(), Some(dir.path()));

        assert!(viewer.wait_for_load(WAIT));
        assert_eq!(viewer.status(), format!("Loaded file {}", path.display()));
        assert!(viewer.take_content_changed());
        assert!(!viewer.take_content_changed());

        // extents 50 x 10 x 20
        assert_relative_eq!(viewer.camera().scale_factor(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(viewer.camera().offset(), -120.0, epsilon = 1e-4);
        assert!(viewer.can_rotate());
    }

    #[test]
    fn test_open_clears_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corner.stl");
        std::fs::write(&path, CUBE_CORNER).unwrap();

        let mut viewer = viewer();
        viewer.open(&path).unwrap();
        assert!(viewer.wait_for_load(WAIT));
        assert!(viewer.content().is_some());

        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        viewer.subscribe_status(move |s| sink.borrow_mut().push(s.clone()));

        let missing = dir.path().join("missing.stl");
        viewer.open(&missing).unwrap();
        assert!(viewer.content().is_none());
        assert_eq!(viewer.last_path(), Some(missing.as_path()));

        // a busy open leaves the pending load alone
        assert!(matches!(viewer.open(&path), Err(LoadError::Busy { .. })));
        assert_eq!(viewer.last_path(), Some(missing.as_path()));

        assert!(viewer.wait_for_load(WAIT));
        assert_eq!(
            *seen.borrow(),
            vec![String::new(), format!("Failed to load file {}", missing.display())]
        );
    }

    #[test]
    fn test_sliders_drive_clip_range() {
        let mut viewer = viewer();
        viewer.set_near_position(-1.0).unwrap();
        assert_relative_eq!(viewer.camera().clip_range().near(), 0.1, epsilon = 1e-12);

        viewer.set_far_position(10.0).unwrap();
        assert_relative_eq!(viewer.far_slider().position(), 7.0);
        assert_relative_eq!(viewer.camera().clip_range().far(), 1e7, epsilon = 1e-3);
    }

    #[test]
    fn test_status_subscribers() {
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut viewer = viewer();
        viewer.subscribe_status(move |s| sink.borrow_mut().push(s.clone()));

        let _ = viewer.open("a.dxf");
        assert_eq!(*seen.borrow(), vec!["Unsupported 3D file format [dxf]".to_string()]);
    }
}
