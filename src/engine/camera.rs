use nalgebra::{Matrix4, Point3, Vector2, Vector3};

use crate::config::CameraConfig;
use crate::starmap::Ray;

const MAX_PITCH: f32 = 1.5;

/// Largest canvas side; GL takes viewport sizes as `i32`.
pub const MAX_VIEWPORT_SIDE: u32 = i32::MAX as u32;

/// Canvas size in pixels. Never smaller than 1x1 and never past `MAX_VIEWPORT_SIDE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        // `as u32` saturates negatives and NaN to 0
        Viewport {
            width: (width.floor() as u32).clamp(1, MAX_VIEWPORT_SIDE),
            height: (height.floor() as u32).clamp(1, MAX_VIEWPORT_SIDE),
        }
    }

    /// Canvas size for a window of the given size when the canvas covers
    /// `scale` of it on each axis.
    pub fn scaled(window_width: f64, window_height: f64, scale: f32) -> Self {
        Viewport::new(window_width * scale as f64, window_height * scale as f64)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pixel coordinates relative to the canvas to normalized device coordinates.
    pub fn to_ndc(&self, x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(
            (x / self.width as f32) * 2.0 - 1.0,
            -(y / self.height as f32) * 2.0 + 1.0,
        )
    }
}

/// Perspective camera orbiting a target point, driven by pointer drag and wheel.
pub struct OrbitCamera {
    pub target: Point3<f32>,
    distance: f32,
    // (yaw, pitch)
    rotation: (f32, f32),
    pending_rotation: (f32, f32),
    fov: f32,
    near: f32,
    far: f32,
    aspect: f32,
    min_distance: f32,
    max_distance: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    damping: f32,
    is_dragging: bool,
    last_mouse_pos: (f32, f32),
    drag_travel: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        OrbitCamera {
            target: Point3::origin(),
            distance: config.initial_distance,
            rotation: (0.0, 0.0),
            pending_rotation: (0.0, 0.0),
            fov: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            aspect,
            min_distance: config.min_distance,
            max_distance: config.max_distance.max(config.initial_distance),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            damping: config.damping,
            is_dragging: false,
            last_mouse_pos: (0.0, 0.0),
            drag_travel: 0.0,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        let (yaw, pitch) = self.rotation;
        self.target
            + Vector3::new(
                self.distance * pitch.cos() * yaw.sin(),
                self.distance * pitch.sin(),
                self.distance * pitch.cos() * yaw.cos(),
            )
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position(), &self.target, &Vector3::y())
    }

    pub fn projection(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }

    /// Pixel position of a world-space point on the given viewport.
    pub fn project_to_screen(&self, point: &Vector3<f32>, viewport: &Viewport) -> (f32, f32) {
        let ndc = self.view_projection().transform_point(&Point3::from(*point));
        (
            (ndc.x * 0.5 + 0.5) * viewport.width as f32,
            (0.5 - ndc.y * 0.5) * viewport.height as f32,
        )
    }

    /// Picking ray from the eye through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vector2<f32>) -> Ray {
        let eye = self.position();
        match self.view_projection().try_inverse() {
            Some(inverse) => {
                let far = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 1.0));
                Ray::new(eye, far - eye)
            }
            None => Ray::new(eye, self.target - eye),
        }
    }

    pub fn handle_mouse_down(&mut self, x: f32, y: f32) {
        self.is_dragging = true;
        self.last_mouse_pos = (x, y);
        self.drag_travel = 0.0;
    }

    pub fn handle_mouse_up(&mut self) {
        self.is_dragging = false;
    }

    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        if self.is_dragging {
            let dx = x - self.last_mouse_pos.0;
            let dy = y - self.last_mouse_pos.1;

            self.pending_rotation.0 -= dx * self.rotate_speed;
            self.pending_rotation.1 += dy * self.rotate_speed;
            self.drag_travel += dx.abs() + dy.abs();

            self.last_mouse_pos = (x, y);
        }
    }

    pub fn handle_wheel(&mut self, delta: f32) {
        self.distance = (self.distance + delta * self.zoom_speed).clamp(self.min_distance, self.max_distance);
    }

    /// True when the last press moved far enough to count as an orbit rather than a click.
    pub fn was_dragged(&self) -> bool {
        self.drag_travel > 4.0
    }

    /// Applies a damped share of the pending rotation. Call once per frame.
    pub fn update(&mut self) {
        let factor = if self.damping > 0.0 { self.damping } else { 1.0 };

        self.rotation.0 += self.pending_rotation.0 * factor;
        self.rotation.1 = (self.rotation.1 + self.pending_rotation.1 * factor).clamp(-MAX_PITCH, MAX_PITCH);

        self.pending_rotation.0 *= 1.0 - factor;
        self.pending_rotation.1 *= 1.0 - factor;
    }
}
