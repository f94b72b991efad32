//! First-person camera driven by yaw/pitch angles

use crate::core::types::{Mat4, Vec3};

/// Direction for [`FpsCamera::move_dir`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera with position, yaw/pitch orientation and a fixed projection
///
/// Angles are stored in degrees. `front` is derived from them with
/// `(cos(yaw)cos(pitch), sin(pitch), sin(yaw)cos(pitch))` and is always unit
/// length.
#[derive(Debug, Clone)]
pub struct FpsCamera {
    position: Vec3,
    /// Rotation around the up axis, degrees
    yaw: f32,
    /// Elevation, degrees, kept within [-MAX_PITCH, MAX_PITCH]
    pitch: f32,
    front: Vec3,
    up: Vec3,
    /// Units per second
    speed: f32,
    /// Degrees per pixel of cursor motion
    sensitivity: f32,
    last_mouse: (f32, f32),
    projection: Mat4,
}

impl FpsCamera {
    pub const DEFAULT_POSITION: Vec3 = Vec3::ZERO;
    /// Units per second
    pub const DEFAULT_SPEED: f32 = 10.0;
    pub const DEFAULT_SENSITIVITY: f32 = 1.0;
    pub const DEFAULT_Z_NEAR: f32 = 0.1;
    pub const DEFAULT_Z_FAR: f32 = 100.0;
    pub const DEFAULT_UP: Vec3 = Vec3::Y;
    pub const MAX_PITCH: f32 = 89.0;

    /// Create a camera; the projection is built here once and never recomputed
    pub fn new(fov_y_degrees: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position: Self::DEFAULT_POSITION,
            yaw: 0.0,
            pitch: 0.0,
            front: Vec3::X,
            up: Self::DEFAULT_UP,
            speed: Self::DEFAULT_SPEED,
            sensitivity: Self::DEFAULT_SENSITIVITY,
            last_mouse: (0.0, 0.0),
            projection: Mat4::perspective_rh(
                fov_y_degrees.to_radians(),
                aspect,
                Self::DEFAULT_Z_NEAR,
                Self::DEFAULT_Z_FAR,
            ),
        };
        camera.update_front();
        camera
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Apply an absolute cursor position.
    ///
    /// The delta is taken against the position seen on the previous call
    /// (initially the origin), so the first call may produce a large jump.
    pub fn process_mouse(&mut self, mouse_x: f32, mouse_y: f32) {
        let dx = mouse_x - self.last_mouse.0;
        let dy = mouse_y - self.last_mouse.1;
        self.last_mouse = (mouse_x, mouse_y);

        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-Self::MAX_PITCH, Self::MAX_PITCH);

        self.update_front();
    }

    /// Translate along `front` or the strafe axis, scaled by `speed * dt`
    pub fn move_dir(&mut self, dir: CameraMovement, dt: f32) {
        let step = self.speed * dt;
        match dir {
            CameraMovement::Forward => self.position += self.front * step,
            CameraMovement::Backward => self.position -= self.front * step,
            CameraMovement::Left => self.position -= self.right() * step,
            CameraMovement::Right => self.position += self.right() * step,
        }
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }

    /// Strafe axis
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update_front();
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        self.update_front();
    }
}

impl Default for FpsCamera {
    fn default() -> Self {
        Self::new(80.0, 4.0 / 3.0)
    }
}
