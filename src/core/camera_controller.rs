//! First-person camera controller

use crate::core::camera::{CameraMovement, FpsCamera};
use crate::core::input::InputState;
use winit::keyboard::KeyCode;

/// Maps WASD and the cursor onto [`FpsCamera`] transitions once per frame
#[derive(Debug, Clone)]
pub struct FpsCameraController {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

impl FpsCameraController {
    pub fn new() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }

    /// Update camera based on input
    ///
    /// At most one movement per axis: forward wins over backward and left
    /// wins over right when both keys are held.
    pub fn update(&self, camera: &mut FpsCamera, input: &InputState, dt: f32) {
        if input.is_key_pressed(self.forward) {
            camera.move_dir(CameraMovement::Forward, dt);
        } else if input.is_key_pressed(self.backward) {
            camera.move_dir(CameraMovement::Backward, dt);
        }

        if input.is_key_pressed(self.left) {
            camera.move_dir(CameraMovement::Left, dt);
        } else if input.is_key_pressed(self.right) {
            camera.move_dir(CameraMovement::Right, dt);
        }

        let (mouse_x, mouse_y) = input.mouse_position();
        camera.process_mouse(mouse_x, mouse_y);
    }
}

impl Default for FpsCameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn camera() -> FpsCamera {
        let mut camera = FpsCamera::default();
        camera.set_speed(1.0);
        camera
    }

    #[test]
    fn test_forward_wins_over_backward() {
        let controller = FpsCameraController::new();
        let mut camera = camera();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_key(KeyCode::KeyS, true);

        controller.update(&mut camera, &input, 2.0);
        assert!((camera.position() - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_one_move_per_axis() {
        let controller = FpsCameraController::new();
        let mut camera = camera();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyS, true);
        input.set_key(KeyCode::KeyA, true);
        input.set_key(KeyCode::KeyD, true);

        controller.update(&mut camera, &input, 1.0);
        // backward along +X front, left along -Z
        assert!((camera.position() - Vec3::new(-1.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_mouse_applied_after_movement() {
        let controller = FpsCameraController::new();
        let mut camera = camera();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_mouse_position(90.0, 0.0);

        controller.update(&mut camera, &input, 1.0);
        // moved along the old front, then turned
        assert!((camera.position() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((camera.yaw() - 90.0).abs() < 1e-5);
        assert!((camera.front() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_idle_frame() {
        let controller = FpsCameraController::new();
        let mut camera = camera();
        let input = InputState::new();

        controller.update(&mut camera, &input, 1.0);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.yaw(), 0.0);
    }
}
