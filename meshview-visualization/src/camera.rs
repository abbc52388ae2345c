//! Camera rig for the model viewport
//!
//! The camera orbits the origin: its placement is `Rx · Ry · T(0, 0, offset)`
//! expressed in a y-down, z-forward scene frame, so a negative offset puts it
//! in front of content centred at the origin. Mouse drags rotate it, the wheel
//! dollies it along its view axis.

use meshview_core::{Error, Result};
use nalgebra::{Matrix4, Perspective3, Point3, Rotation3, Translation3, Vector3};
use std::ops::RangeInclusive;

/// Degrees of rotation per pixel of drag
pub const DRAG_SENSITIVITY: f64 = 0.7;
/// Offset change per pixel of scroll, before the content scale is applied
pub const SCROLL_SENSITIVITY: f64 = 0.1;
/// Pixels reported for one wheel notch
pub const PIXELS_PER_LINE: f64 = 40.0;
/// Vertical field of view in degrees
pub const FIELD_OF_VIEW: f64 = 30.0;

pub const INITIAL_ROTATE_X: f64 = -20.0;
pub const INITIAL_ROTATE_Y: f64 = -20.0;
pub const INITIAL_OFFSET: f64 = -20.0;
pub const INITIAL_NEAR_CLIP: f64 = 1.0;
pub const INITIAL_FAR_CLIP: f64 = 10_000.0;

pub const NEAR_CLIP_BOUNDS: (f64, f64) = (0.01, 10.0);
pub const FAR_CLIP_BOUNDS: (f64, f64) = (100.0, 1e7);

/// Maps OpenGL clip-space depth `[-1, 1]` to wgpu's `[0, 1]`
#[rustfmt::skip]
fn opengl_to_wgpu() -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Slider with a base-10 logarithmic mapping from position to value
#[derive(Debug, Clone, PartialEq)]
pub struct LogSlider {
    min_position: f64,
    max_position: f64,
    position: f64,
}

impl LogSlider {
    /// Slider covering `[min, max]` positioned at `initial`
    pub fn new(min: f64, max: f64, initial: f64) -> Self {
        let mut slider = Self {
            min_position: min.log10(),
            max_position: max.log10(),
            position: 0.0,
        };
        slider.set_value(initial);
        slider
    }

    pub fn near_clip(initial: f64) -> Self {
        Self::new(NEAR_CLIP_BOUNDS.0, NEAR_CLIP_BOUNDS.1, initial)
    }

    pub fn far_clip(initial: f64) -> Self {
        Self::new(FAR_CLIP_BOUNDS.0, FAR_CLIP_BOUNDS.1, initial)
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move the slider, clamping to its domain
    pub fn set_position(&mut self, position: f64) {
        if position.is_nan() {
            return;
        }
        self.position = position.clamp(self.min_position, self.max_position);
    }

    /// Domain of positions, for binding to a widget
    pub fn domain(&self) -> RangeInclusive<f64> {
        self.min_position..=self.max_position
    }

    /// `10^position`
    pub fn value(&self) -> f64 {
        10f64.powf(self.position)
    }

    pub fn set_value(&mut self, value: f64) {
        if value > 0.0 {
            self.set_position(value.log10());
        }
    }
}

/// Near and far clip distances with `0 < near < far`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    near: f64,
    far: f64,
}

impl ClipRange {
    pub fn new(near: f64, far: f64) -> Result<Self> {
        let valid = near.is_finite() && far.is_finite() && near > 0.0 && near < far;
        if !valid {
            return Err(Error::InvalidClipRange { near, far });
        }
        Ok(Self { near, far })
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn set_near(&mut self, near: f64) -> Result<()> {
        *self = Self::new(near, self.far)?;
        Ok(())
    }

    pub fn set_far(&mut self, far: f64) -> Result<()> {
        *self = Self::new(self.near, far)?;
        Ok(())
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            near: INITIAL_NEAR_CLIP,
            far: INITIAL_FAR_CLIP,
        }
    }
}

/// Pointer origin and angles captured on press
#[derive(Debug, Clone, Copy)]
struct DragBase {
    x: f64,
    y: f64,
    rotate_x: f64,
    rotate_y: f64,
}

/// Orbiting perspective camera driven by pointer input
#[derive(Debug, Clone)]
pub struct CameraRig {
    rotate_x: f64,
    rotate_y: f64,
    offset: f64,
    scale_factor: f64,
    clip: ClipRange,
    drag: Option<DragBase>,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            rotate_x: INITIAL_ROTATE_X,
            rotate_y: INITIAL_ROTATE_Y,
            offset: INITIAL_OFFSET,
            scale_factor: 1.0,
            clip: ClipRange::default(),
            drag: None,
        }
    }

    /// Start a drag gesture at the given pointer position
    pub fn press(&mut self, x: f64, y: f64) {
        self.drag = Some(DragBase {
            x,
            y,
            rotate_x: self.rotate_x,
            rotate_y: self.rotate_y,
        });
    }

    /// Rotate relative to the press position. Returns false without a press.
    pub fn drag(&mut self, x: f64, y: f64) -> bool {
        let Some(base) = self.drag else {
            return false;
        };
        let dx = x - base.x;
        let dy = y - base.y;
        self.rotate_x = base.rotate_x - dy * DRAG_SENSITIVITY;
        self.rotate_y = base.rotate_y + dx * DRAG_SENSITIVITY;
        true
    }

    pub fn release(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Dolly by a scroll delta in pixels; positive moves away from the content
    pub fn scroll(&mut self, delta: f64) {
        self.set_offset(self.offset - delta * SCROLL_SENSITIVITY * self.scale_factor);
    }

    /// Dolly by wheel notches
    pub fn scroll_lines(&mut self, lines: f64) {
        self.scroll(lines * PIXELS_PER_LINE);
    }

    pub fn rotate_x(&self) -> f64 {
        self.rotate_x
    }

    pub fn rotate_y(&self) -> f64 {
        self.rotate_y
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Set the offset along the view axis, never past the origin
    pub fn set_offset(&mut self, offset: f64) {
        if offset.is_nan() {
            return;
        }
        self.offset = offset.min(0.0);
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    pub fn clip_range(&self) -> ClipRange {
        self.clip
    }

    pub fn set_clip_range(&mut self, clip: ClipRange) {
        self.clip = clip;
    }

    pub fn set_near_clip(&mut self, near: f64) -> Result<()> {
        self.clip.set_near(near)
    }

    pub fn set_far_clip(&mut self, far: f64) -> Result<()> {
        self.clip.set_far(far)
    }

    /// Camera placement in the y-down scene frame
    pub fn camera_transform(&self) -> Matrix4<f64> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotate_x.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotate_y.to_radians());
        rx.to_homogeneous() * ry.to_homogeneous() * Translation3::new(0.0, 0.0, self.offset).to_homogeneous()
    }

    /// Camera position in the scene frame
    pub fn eye(&self) -> Point3<f64> {
        self.camera_transform().transform_point(&Point3::origin())
    }

    /// World-to-view matrix in the renderer's y-up, z-backward frame
    pub fn view_matrix(&self) -> Matrix4<f32> {
        // camera transform is a rotation plus translation, always invertible
        let inverse = self.camera_transform().try_inverse().unwrap_or_else(Matrix4::identity);
        let flip = Matrix4::from_diagonal(&nalgebra::Vector4::new(1.0, -1.0, -1.0, 1.0));
        (flip * inverse).cast::<f32>()
    }

    /// Perspective projection with depth in `[0, 1]`
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio as f64
        } else {
            1.0
        };
        let perspective = Perspective3::new(aspect, FIELD_OF_VIEW.to_radians(), self.clip.near, self.clip.far);
        (opengl_to_wgpu() * perspective.into_inner()).cast::<f32>()
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_initial_state() {
        let rig = CameraRig::new();
        assert_eq!(rig.rotate_x(), -20.0);
        assert_eq!(rig.rotate_y(), -20.0);
        assert_eq!(rig.offset(), -20.0);
        assert_eq!(rig.clip_range().near(), 1.0);
        assert_eq!(rig.clip_range().far(), 10_000.0);
    }

    #[test]
    fn test_drag_rotates_from_press_baseline() {
        let mut rig = CameraRig::new();
        assert!(!rig.drag(50.0, 50.0));

        rig.press(100.0, 100.0);
        assert!(rig.drag(110.0, 90.0));
        assert_relative_eq!(rig.rotate_x(), -13.0, epsilon = 1e-9);
        assert_relative_eq!(rig.rotate_y(), -13.0, epsilon = 1e-9);

        // absolute relative to the press, not cumulative
        rig.drag(110.0, 90.0);
        assert_relative_eq!(rig.rotate_x(), -13.0, epsilon = 1e-9);

        rig.release();
        rig.press(0.0, 0.0);
        rig.drag(0.0, 100.0);
        assert_relative_eq!(rig.rotate_x(), -83.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scroll_never_passes_origin() {
        let mut rig = CameraRig::new();
        rig.scroll_lines(1.0);
        assert_relative_eq!(rig.offset(), -24.0);

        for delta in [-1000.0, 35.0, -7.5, -1e9, 400.0] {
            rig.scroll(delta);
            assert!(rig.offset() <= 0.0);
        }
        rig.scroll(-1000.0);
        assert_eq!(rig.offset(), 0.0);
    }

    #[test]
    fn test_scroll_scales_with_content() {
        let mut rig = CameraRig::new();
        rig.set_scale_factor(4.0);
        rig.set_offset(-240.0);
        rig.scroll(10.0);
        assert_relative_eq!(rig.offset(), -244.0);
        rig.set_offset(5.0);
        assert_eq!(rig.offset(), 0.0);
    }

    #[test]
    fn test_log_slider() {
        let mut near = LogSlider::near_clip(INITIAL_NEAR_CLIP);
        assert_relative_eq!(near.position(), 0.0);
        assert_relative_eq!(*near.domain().start(), -2.0, epsilon = 1e-12);
        assert_relative_eq!(*near.domain().end(), 1.0, epsilon = 1e-12);

        let mut last = 0.0;
        for step in 0..=30 {
            near.set_position(-2.0 + step as f64 * 0.1);
            assert_relative_eq!(near.value(), 10f64.powf(near.position()));
            assert!(near.value() > last);
            last = near.value();
        }

        near.set_position(7.0);
        assert_relative_eq!(near.value(), 10.0, epsilon = 1e-9);

        let far = LogSlider::far_clip(INITIAL_FAR_CLIP);
        assert_relative_eq!(far.position(), 4.0);
        assert_relative_eq!(far.value(), 10_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_clip_range_validation() {
        assert!(ClipRange::new(1.0, 10.0).is_ok());
        assert!(ClipRange::new(10.0, 10.0).is_err());
        assert!(ClipRange::new(0.0, 10.0).is_err());
        assert!(ClipRange::new(1.0, f64::INFINITY).is_err());

        let mut clip = ClipRange::default();
        assert!(matches!(clip.set_near(20_000.0), Err(Error::InvalidClipRange { .. })));
        assert_eq!(clip.near(), 1.0);
        clip.set_far(100.0).unwrap();
        assert_eq!(clip.far(), 100.0);
    }

    #[test]
    fn test_view_matrix_puts_origin_in_front() {
        let mut rig = CameraRig::new();
        rig.press(0.0, 0.0);
        rig.drag(20.0 / DRAG_SENSITIVITY, -20.0 / DRAG_SENSITIVITY);
        assert_relative_eq!(rig.rotate_x(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(rig.rotate_y(), 0.0, epsilon = 1e-9);

        let view = rig.view_matrix();
        let origin = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vector4::new(0.0, 0.0, -20.0, 1.0), epsilon = 1e-4);

        // scene y points down, view y points up
        let below = view * Vector4::new(0.0, 1.0, 0.0, 1.0);
        assert!(below.y < 0.0);
    }

    #[test]
    fn test_projection_depth_range() {
        let rig = CameraRig::new();
        let clip = rig.projection_matrix(4.0 / 3.0) * rig.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);

        let near_plane = rig.projection_matrix(1.0) * Vector4::new(0.0, 0.0, -1.0, 1.0);
        assert_relative_eq!(near_plane.z / near_plane.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_eye_distance_matches_offset() {
        let rig = CameraRig::new();
        assert_relative_eq!(rig.eye().coords.norm(), 20.0, epsilon = 1e-9);
    }
}
