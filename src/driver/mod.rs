//! Ties the orrery, camera and renderer together into a frame loop.
//!
//! The driver owns all mutable state. Each frame it advances the simulation
//! by the (sanitized) time since the previous frame and then draws; input and
//! option changes are applied only between frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::camera::{Camera, Viewport};
use crate::error::OrreryError;
use crate::options::Options;
use crate::orrery::Orrery;
use crate::render::{DrawStats, RenderBackend, SceneRenderer};

mod controller;

pub use controller::{Controller, FpsCounter, InputEvent, MAX_SPEED, MIN_SPEED};

/// Lets another thread ask a running loop to stop. The flag is checked
/// between frames, never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Real seconds since the previous frame, after sanitizing.
    pub delta: f64,
    /// Simulated time the orrery advanced by.
    pub sim_delta: f64,
    /// `None` when drawing was skipped because the backend failed.
    pub stats: Option<DrawStats>,
}

/// Clamps a frame delta into `[0, max_delta]`.
///
/// Clocks that run backwards produce a zero step; long stalls (a suspended
/// tab, a debugger) are capped so bodies don't jump.
pub fn sanitize_delta(delta: f64, max_delta: f64) -> f64 {
    if delta.is_nan() || delta < 0.0 {
        log::warn!("frame delta {delta} is negative, treating it as zero");
        0.0
    } else if delta > max_delta {
        log::debug!("clamping frame delta {delta} to {max_delta}");
        max_delta
    } else {
        delta
    }
}

pub struct FrameDriver<B> {
    backend: B,
    orrery: Orrery,
    camera: Camera,
    renderer: SceneRenderer,
    controller: Controller,
    options: Options,
    viewport: Viewport,
    last_timestamp: Option<f64>,
    sim_time: f64,
    frames: usize,
    stop: StopHandle,
}

impl<B: RenderBackend> FrameDriver<B> {
    pub fn new(
        backend: B,
        orrery: Orrery,
        options: Options,
        viewport: Viewport,
    ) -> Result<Self, OrreryError> {
        options.validate()?;
        let camera = Camera::from_options(&options.camera)?;
        log::info!(
            "driver ready: {} bodies, {}x{} viewport",
            orrery.len(),
            viewport.width,
            viewport.height
        );
        Ok(FrameDriver {
            backend,
            orrery,
            camera,
            renderer: SceneRenderer::new(),
            controller: Controller::new(),
            options,
            viewport,
            last_timestamp: None,
            sim_time: 0.0,
            frames: 0,
            stop: StopHandle::new(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn orrery(&self) -> &Orrery {
        &self.orrery
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Total simulated time so far.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        self.controller
            .process_event(event, &mut self.camera, &self.options.controls);
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), OrreryError> {
        self.viewport = Viewport::new(width, height)?;
        log::debug!("viewport resized to {width}x{height}");
        Ok(())
    }

    /// Replaces the live options. Nothing changes unless all of them are
    /// valid; the camera keeps its position and orientation.
    pub fn set_options(&mut self, options: Options) -> Result<(), OrreryError> {
        options.validate()?;
        self.camera.apply_options(&options.camera)?;
        self.options = options;
        Ok(())
    }

    /// Runs one frame at `timestamp` (seconds on any monotonic-ish clock).
    ///
    /// The first frame only establishes the time base. A backend failure
    /// skips the draw but keeps the simulation step; any other error is
    /// returned.
    pub fn frame(&mut self, timestamp: f64) -> Result<FrameReport, OrreryError> {
        let raw_delta = match self.last_timestamp {
            Some(last) => timestamp - last,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);
        let delta = sanitize_delta(raw_delta, self.options.world.max_frame_delta);

        let mut sim_delta = if self.controller.is_paused() {
            0.0
        } else {
            delta * self.options.world.time_scale * self.controller.speed()
        };
        if !sim_delta.is_finite() {
            log::warn!("simulation step {} overflowed, holding time", sim_delta);
            sim_delta = 0.0;
        }
        self.orrery.update(sim_delta)?;
        self.sim_time += sim_delta;

        let matrices = self.camera.matrices(&self.viewport)?;
        let stats = match self.renderer.draw(
            &mut self.backend,
            &self.orrery,
            &matrices,
            &self.options.world,
            &self.options.lighting,
        ) {
            Ok(stats) => Some(stats),
            Err(OrreryError::Backend(e)) => {
                log::error!("skipping frame {}: {}", self.frames, e);
                None
            }
            Err(e) => return Err(e),
        };

        self.frames += 1;
        self.controller.increment_frame_counter(timestamp);
        log::debug!(
            "frame {}: dt {:.4} s, t {:.3}",
            self.frames,
            delta,
            self.sim_time
        );
        Ok(FrameReport {
            delta,
            sim_delta,
            stats,
        })
    }

    /// Calls [`frame`](Self::frame) with timestamps from `clock` until the
    /// stop handle is raised or `max_frames` frames have run. Returns the
    /// number of frames run by this call.
    pub fn run<C>(&mut self, mut clock: C, max_frames: Option<usize>) -> Result<usize, OrreryError>
    where
        C: FnMut() -> f64,
    {
        let mut count = 0;
        while !self.stop.is_stopped() {
            if max_frames.map_or(false, |max| count >= max) {
                break;
            }
            self.frame(clock())?;
            count += 1;
        }
        log::info!(
            "stopped after {} frames, simulated {:.2} time units",
            count,
            self.sim_time
        );
        Ok(count)
    }

    /// Releases cached GPU resources and hands the backend back.
    pub fn shutdown(mut self) -> Result<B, OrreryError> {
        self.renderer.release(&mut self.backend)?;
        Ok(self.backend)
    }
}
