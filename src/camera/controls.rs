use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;

use super::Camera;
use crate::options::ControlOptions;

/// Keeps the pitch strictly away from the poles.
const PITCH_LIMIT: f32 = 0.001;

/// Discrete camera actions driven by key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKey {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    RollLeft,
    RollRight,
}

impl CameraKey {
    /// Parses a browser-style key code (`KeyW`, `ArrowLeft`, ...) or key
    /// value (`e`, `q`, space, `Shift`).
    pub fn from_code(code: &str) -> Option<Self> {
        let key = match code {
            "KeyW" | "w" => CameraKey::MoveForward,
            "KeyS" | "s" => CameraKey::MoveBack,
            "KeyA" | "a" => CameraKey::MoveLeft,
            "KeyD" | "d" => CameraKey::MoveRight,
            "Space" | " " => CameraKey::MoveUp,
            "Shift" | "ShiftLeft" | "ShiftRight" => CameraKey::MoveDown,
            "ArrowLeft" => CameraKey::YawLeft,
            "ArrowRight" => CameraKey::YawRight,
            "ArrowUp" => CameraKey::PitchUp,
            "ArrowDown" => CameraKey::PitchDown,
            "KeyQ" | "q" => CameraKey::RollLeft,
            "KeyE" | "e" => CameraKey::RollRight,
            _ => return None,
        };
        Some(key)
    }
}

impl Camera {
    /// Moves the camera along its own forward/right axes, or world-up for
    /// vertical motion.
    pub fn translate(&mut self, forward: f32, right: f32, up: f32) {
        let basis = self.basis();
        self.position += basis.forward.into_inner() * forward
            + basis.right.into_inner() * right
            + Vector3::y() * up;
    }

    pub fn rotate(&mut self, dyaw: f32, dpitch: f32, droll: f32) {
        let orientation = &mut self.orientation;
        orientation.yaw = (orientation.yaw + dyaw).rem_euclid(2.0 * PI);
        orientation.pitch = nalgebra::clamp(
            orientation.pitch + dpitch,
            -FRAC_PI_2 + PITCH_LIMIT,
            FRAC_PI_2 - PITCH_LIMIT,
        );
        orientation.roll = (orientation.roll + droll).rem_euclid(2.0 * PI);
    }

    pub fn handle_key(&mut self, key: CameraKey, controls: &ControlOptions) {
        let step = controls.move_step;
        let angle = controls.angle_step;
        match key {
            CameraKey::MoveForward => self.translate(step, 0.0, 0.0),
            CameraKey::MoveBack => self.translate(-step, 0.0, 0.0),
            CameraKey::MoveLeft => self.translate(0.0, -step, 0.0),
            CameraKey::MoveRight => self.translate(0.0, step, 0.0),
            CameraKey::MoveUp => self.translate(0.0, 0.0, step),
            CameraKey::MoveDown => self.translate(0.0, 0.0, -step),
            CameraKey::YawLeft => self.rotate(-angle, 0.0, 0.0),
            CameraKey::YawRight => self.rotate(angle, 0.0, 0.0),
            CameraKey::PitchUp => self.rotate(0.0, angle, 0.0),
            CameraKey::PitchDown => self.rotate(0.0, -angle, 0.0),
            CameraKey::RollLeft => self.rotate(0.0, 0.0, -angle),
            CameraKey::RollRight => self.rotate(0.0, 0.0, angle),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use super::*;

    fn camera() -> Camera {
        Camera::new(1.5, 0.1, 1000.0).unwrap()
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(CameraKey::from_code("KeyW"), Some(CameraKey::MoveForward));
        assert_eq!(CameraKey::from_code("ArrowUp"), Some(CameraKey::PitchUp));
        assert_eq!(CameraKey::from_code("e"), Some(CameraKey::RollRight));
        assert_eq!(CameraKey::from_code(" "), Some(CameraKey::MoveUp));
        assert_eq!(CameraKey::from_code("KeyZ"), None);
    }

    #[test]
    fn test_movement_follows_basis() {
        let controls = ControlOptions::default();
        let mut camera = camera();

        camera.handle_key(CameraKey::MoveForward, &controls);
        assert_relative_eq!(camera.position, Point3::new(0.1, 0.0, 0.0));

        camera.handle_key(CameraKey::MoveRight, &controls);
        assert_relative_eq!(camera.position, Point3::new(0.1, 0.0, 0.1));

        camera.handle_key(CameraKey::MoveUp, &controls);
        camera.handle_key(CameraKey::MoveUp, &controls);
        camera.handle_key(CameraKey::MoveDown, &controls);
        assert_relative_eq!(camera.position, Point3::new(0.1, 0.1, 0.1), epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let controls = ControlOptions::default();
        let mut camera = camera();
        for _ in 0..100 {
            camera.handle_key(CameraKey::PitchUp, &controls);
        }
        assert!(camera.orientation.pitch < FRAC_PI_2);
        assert_relative_eq!(camera.orientation.pitch, FRAC_PI_2 - PITCH_LIMIT);

        // Vertical keys still move along world up when looking straight up
        camera.handle_key(CameraKey::MoveUp, &controls);
        assert_relative_eq!(camera.position.y, 0.1);
    }

    #[test]
    fn test_yaw_wraps() {
        let controls = ControlOptions::default();
        let mut camera = camera();
        camera.handle_key(CameraKey::YawLeft, &controls);
        assert_relative_eq!(camera.orientation.yaw, 2.0 * PI - 0.1, epsilon = 1e-6);
    }
}
