//! Content host: the slot holding the displayed model, its framing and spin

use meshview_core::{Aabb, Bounded, Content, Observable, Vector3f};
use std::time::Duration;

/// Extent that maps to a scale factor of one
pub const REFERENCE_EXTENT: f64 = 25.0;
/// Camera offset per unit of scale factor after a load
pub const FRAMING_DISTANCE: f64 = -60.0;

/// Placement derived from the content bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    /// Moves the bounds centre to the origin
    pub translate: Vector3f,
    /// Largest extent relative to [`REFERENCE_EXTENT`]; 1 for degenerate content
    pub scale_factor: f64,
    pub camera_offset: f64,
}

impl Framing {
    pub fn for_bounds(bounds: Option<&Aabb>) -> Self {
        let Some(bounds) = bounds else {
            return Self::default();
        };
        let translate = Vector3f::new(
            -bounds.min.x - bounds.width() / 2.0,
            -bounds.min.y - bounds.height() / 2.0,
            -bounds.min.z - bounds.depth() / 2.0,
        );
        let extent = bounds.max_extent() as f64;
        let scale_factor = if extent.is_finite() && extent > 0.0 {
            extent / REFERENCE_EXTENT
        } else {
            1.0
        };
        Self {
            translate,
            scale_factor,
            camera_offset: FRAMING_DISTANCE * scale_factor,
        }
    }
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            translate: Vector3f::zeros(),
            scale_factor: 1.0,
            camera_offset: FRAMING_DISTANCE,
        }
    }
}

/// Endless linear spin about the Y axis
#[derive(Debug, Clone)]
pub struct RotationAnimation {
    period: Duration,
    delay: Duration,
    elapsed: Duration,
    playing: bool,
}

impl RotationAnimation {
    pub const PERIOD: Duration = Duration::from_millis(5000);
    pub const DELAY: Duration = Duration::from_millis(4);

    pub fn new() -> Self {
        Self::with_timing(Self::PERIOD, Self::DELAY)
    }

    pub fn with_timing(period: Duration, delay: Duration) -> Self {
        Self {
            period,
            delay,
            elapsed: Duration::ZERO,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stop advancing, keeping the current angle
    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance by `dt` if playing and return the angle
    pub fn advance(&mut self, dt: Duration) -> f32 {
        if self.playing {
            self.elapsed += dt;
        }
        self.angle()
    }

    /// Current angle in degrees, in `[0, 360)`
    pub fn angle(&self) -> f32 {
        let Some(running) = self.elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.period.is_zero() {
            return 0.0;
        }
        let cycles = running.as_secs_f64() / self.period.as_secs_f64();
        (cycles.fract() * 360.0) as f32
    }
}

impl Default for RotationAnimation {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the single displayed content.
///
/// Replacing the content re-frames it and starts a fresh animation that plays
/// only while rotation is toggled on.
pub struct ContentHost {
    slot: Observable<Option<Content>>,
    framing: Framing,
    animation: RotationAnimation,
    rotating: bool,
}

impl ContentHost {
    pub fn new() -> Self {
        Self {
            slot: Observable::new(None),
            framing: Framing::default(),
            animation: RotationAnimation::new(),
            rotating: false,
        }
    }

    pub fn content(&self) -> Option<&Content> {
        self.slot.get().as_ref()
    }

    pub fn has_content(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Run `subscriber` after every replacement with the new slot value
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Option<Content>) + 'static) {
        self.slot.subscribe(subscriber);
    }

    /// Replace the displayed content and return its framing
    pub fn set_content(&mut self, content: Option<Content>) -> Framing {
        self.animation = RotationAnimation::new();
        let content = content.map(|mut content| {
            self.framing = Framing::for_bounds(content.bounds().as_ref());
            content.set_translate(self.framing.translate);
            content.set_rotation_y(0.0);
            if self.rotating {
                self.animation.play();
            }
            content
        });
        if content.is_none() {
            self.framing = Framing::default();
        }
        self.slot.set(content);
        self.framing
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn animation(&self) -> &RotationAnimation {
        &self.animation
    }

    /// Flip auto-rotation; returns the new state. A no-op returning false
    /// when nothing is loaded.
    pub fn toggle_rotation(&mut self) -> bool {
        if !self.has_content() {
            return false;
        }
        self.rotating = !self.rotating;
        if self.rotating {
            self.animation.play();
        } else {
            self.animation.pause();
        }
        self.rotating
    }

    /// Preset the rotation flag before any content is loaded
    pub fn set_rotating(&mut self, rotating: bool) {
        self.rotating = rotating;
        if rotating && self.has_content() {
            self.animation.play();
        } else {
            self.animation.pause();
        }
    }

    /// Advance the animation and apply its angle to the content
    pub fn tick(&mut self, dt: Duration) {
        if !self.animation.is_playing() || !self.has_content() {
            return;
        }
        let angle = self.animation.advance(dt);
        // placement changes are not replacements, subscribers are not run
        if let Some(content) = self.slot_mut() {
            content.set_rotation_y(angle);
        }
    }

    fn slot_mut(&mut self) -> Option<&mut Content> {
        self.slot.get_mut().as_mut()
    }
}

impl Default for ContentHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshview_core::{Material, MeshNode, Point3f, SceneNode, TriangleMesh};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn box_content(min: [f32; 3], max: [f32; 3]) -> Content {
        let mesh = TriangleMesh::from_triangle_soup(vec![
            Point3f::new(min[0], min[1], min[2]),
            Point3f::new(max[0], min[1], min[2]),
            Point3f::new(max[0], max[1], max[2]),
        ]);
        Content::new(SceneNode::group([SceneNode::Mesh(MeshNode::new(mesh, Material::gray()))]))
    }

    #[test]
    fn test_framing_centres_and_scales() {
        let bounds = Aabb::new(Point3f::new(10.0, -4.0, 2.0), Point3f::new(60.0, 6.0, 4.0));
        let framing = Framing::for_bounds(Some(&bounds));

        assert_relative_eq!(framing.translate, Vector3f::new(-35.0, -1.0, -3.0));
        assert_relative_eq!(framing.scale_factor, 2.0);
        assert_relative_eq!(framing.camera_offset, -120.0);
    }

    #[test]
    fn test_degenerate_framing() {
        let point = Aabb::new(Point3f::new(3.0, 3.0, 3.0), Point3f::new(3.0, 3.0, 3.0));
        let framing = Framing::for_bounds(Some(&point));
        assert_eq!(framing.scale_factor, 1.0);
        assert_relative_eq!(framing.translate, Vector3f::new(-3.0, -3.0, -3.0));

        assert_eq!(Framing::for_bounds(None), Framing::default());
    }

    #[test]
    fn test_animation_timing() {
        let mut animation = RotationAnimation::new();
        assert_eq!(animation.advance(Duration::from_millis(1000)), 0.0);

        animation.play();
        assert_eq!(animation.advance(Duration::from_millis(4)), 0.0);
        assert_relative_eq!(animation.advance(Duration::from_millis(1250)), 90.0, epsilon = 1e-3);

        animation.pause();
        assert_relative_eq!(animation.advance(Duration::from_secs(3)), 90.0, epsilon = 1e-3);

        animation.play();
        // wraps after a full turn
        assert_relative_eq!(animation.advance(Duration::from_millis(5000)), 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_set_content_recentres_and_notifies() {
        let notified = Rc::new(RefCell::new(Vec::new()));
        let mut host = ContentHost::new();
        let sink = notified.clone();
        host.subscribe(move |content| sink.borrow_mut().push(content.is_some()));

        let framing = host.set_content(Some(box_content([0.0, 0.0, 0.0], [50.0, 10.0, 20.0])));
        assert_relative_eq!(framing.scale_factor, 2.0);
        assert_relative_eq!(host.content().unwrap().translate(), Vector3f::new(-25.0, -5.0, -10.0));

        host.set_content(None);
        assert!(!host.has_content());
        assert_eq!(host.framing(), Framing::default());
        assert_eq!(*notified.borrow(), vec![true, false]);
    }

    #[test]
    fn test_toggle_rotation() {
        let mut host = ContentHost::new();
        assert!(!host.toggle_rotation());
        assert!(!host.is_rotating());

        host.set_content(Some(box_content([0.0; 3], [1.0; 3])));
        assert!(!host.animation().is_playing());

        assert!(host.toggle_rotation());
        assert!(host.animation().is_playing());
        assert!(!host.toggle_rotation());
        assert!(!host.animation().is_playing());
        assert!(!host.is_rotating());
    }

    #[test]
    fn test_rotation_survives_replacement() {
        let mut host = ContentHost::new();
        host.set_content(Some(box_content([0.0; 3], [1.0; 3])));
        host.toggle_rotation();
        host.tick(Duration::from_millis(2504));
        assert_relative_eq!(host.content().unwrap().rotation_y(), 180.0, epsilon = 1e-3);

        // a fresh animation restarts from zero and plays straight away
        host.set_content(Some(box_content([0.0; 3], [2.0; 3])));
        assert!(host.animation().is_playing());
        assert_eq!(host.content().unwrap().rotation_y(), 0.0);
        host.tick(Duration::from_millis(1254));
        assert_relative_eq!(host.content().unwrap().rotation_y(), 90.0, epsilon = 1e-3);
    }
}
