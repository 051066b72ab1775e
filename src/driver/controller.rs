use crate::camera::{Camera, CameraKey};
use crate::options::ControlOptions;

/// Anything the user can do between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Camera(CameraKey),
    TogglePause,
    SpeedUp,
    SlowDown,
}

impl InputEvent {
    /// Parses a browser-style key code. Time controls sit on `p`, `.` and
    /// `,`; everything else is tried as a camera key.
    pub fn from_code(code: &str) -> Option<Self> {
        let event = match code {
            "KeyP" | "p" => InputEvent::TogglePause,
            "Period" | "." => InputEvent::SpeedUp,
            "Comma" | "," => InputEvent::SlowDown,
            _ => InputEvent::Camera(CameraKey::from_code(code)?),
        };
        Some(event)
    }
}

/// Bounds for the speed multiplier, 2^-20 and 2^20.
pub const MIN_SPEED: f64 = 1.0 / 1048576.0;
pub const MAX_SPEED: f64 = 1048576.0;

/// Time controls plus a frame counter.
#[derive(Debug, Clone)]
pub struct Controller {
    speed: f64,
    paused: bool,
    fps_counter: FpsCounter,
}

/// Averages the frame rate over fixed windows of frame time.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Option<f64>,
    counter: usize,
    window_size: f64,
    previous_fps: f64,
}

impl FpsCounter {
    pub fn new(window_size: f64) -> Self {
        FpsCounter {
            window_start: None,
            counter: 0,
            window_size,
            previous_fps: 0.0,
        }
    }

    pub fn reset(&mut self, now: f64) {
        self.window_start = Some(now);
        self.counter = 0;
    }

    pub fn value(&self) -> f64 {
        self.previous_fps
    }

    /// Counts one frame shown at `now` (seconds).
    pub fn increment(&mut self, now: f64) {
        let start = match self.window_start {
            Some(start) => start,
            None => return self.reset(now),
        };
        self.counter += 1;

        let elapsed = now - start;
        if elapsed > self.window_size {
            self.previous_fps = self.counter as f64 / elapsed;
            self.reset(now);
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Controller {
            speed: 1.0,
            paused: false,
            fps_counter: FpsCounter::new(1.0),
        }
    }

    pub fn process_event(&mut self, event: InputEvent, camera: &mut Camera, controls: &ControlOptions) {
        match event {
            InputEvent::Camera(key) => camera.handle_key(key, controls),
            InputEvent::TogglePause => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "paused" } else { "resumed" });
            }
            InputEvent::SpeedUp => {
                self.speed = (self.speed * 2.0).min(MAX_SPEED);
                log::info!("speed is now {}x", self.speed);
            }
            InputEvent::SlowDown => {
                self.speed = (self.speed / 2.0).max(MIN_SPEED);
                log::info!("speed is now {}x", self.speed);
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Multiplier applied on top of the configured time scale.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn fps(&self) -> f64 {
        self.fps_counter.value()
    }

    pub fn increment_frame_counter(&mut self, now: f64) {
        self.fps_counter.increment(now)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_parse_events() {
        assert_eq!(InputEvent::from_code("p"), Some(InputEvent::TogglePause));
        assert_eq!(InputEvent::from_code("Period"), Some(InputEvent::SpeedUp));
        assert_eq!(
            InputEvent::from_code("KeyW"),
            Some(InputEvent::Camera(CameraKey::MoveForward))
        );
        assert_eq!(InputEvent::from_code("F13"), None);
    }

    #[test]
    fn test_time_controls() {
        let mut controller = Controller::new();
        let mut camera = Camera::new(1.5, 0.1, 1000.0).unwrap();
        let controls = ControlOptions::default();

        assert!(!controller.is_paused());
        controller.process_event(InputEvent::TogglePause, &mut camera, &controls);
        assert!(controller.is_paused());

        controller.process_event(InputEvent::SpeedUp, &mut camera, &controls);
        controller.process_event(InputEvent::SpeedUp, &mut camera, &controls);
        controller.process_event(InputEvent::SlowDown, &mut camera, &controls);
        assert_relative_eq!(controller.speed(), 2.0);

        controller.process_event(
            InputEvent::Camera(CameraKey::MoveForward),
            &mut camera,
            &controls,
        );
        assert_relative_eq!(camera.position.x, controls.move_step);
    }

    #[test]
    fn test_speed_is_bounded() {
        let mut controller = Controller::new();
        let mut camera = Camera::new(1.5, 0.1, 1000.0).unwrap();
        let controls = ControlOptions::default();

        for _ in 0..1100 {
            controller.process_event(InputEvent::SpeedUp, &mut camera, &controls);
        }
        assert_eq!(controller.speed(), MAX_SPEED);

        for _ in 0..2200 {
            controller.process_event(InputEvent::SlowDown, &mut camera, &controls);
        }
        assert_eq!(controller.speed(), MIN_SPEED);

        // Still a power of two, so halving back up is exact
        controller.process_event(InputEvent::SpeedUp, &mut camera, &controls);
        assert_eq!(controller.speed(), 2.0 * MIN_SPEED);
    }

    #[test]
    fn test_fps_counter() {
        let mut counter = FpsCounter::new(1.0);
        counter.increment(0.0);
        for frame in 1..=30 {
            counter.increment(frame as f64 / 25.0);
        }
        // The window closed on the 26th frame, at 1.04 s
        assert_relative_eq!(counter.value(), 26.0 / 1.04, epsilon = 1e-9);
    }
}
