use std::f64::consts::TAU;

use nalgebra::{Point3, Vector3};

use crate::error::OrreryError;
use crate::math::geometry::wrap_angle;

use super::validate_time_step;

// All the immutable info about a body; none of it affects the motion.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInfo {
    pub name: String,
    /// Visual radius.
    pub size: f32,
    pub color: Point3<f32>,
    pub shininess: f32,
    pub is_light_source: bool,
}

/// A fixed-radius circle, tilted about the x-axis by `inclination`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularOrbit {
    radius: f64,
    inclination: f64,
    period: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitBody {
    info: BodyInfo,
    orbit: CircularOrbit,
    // Invariants:
    //   - current_angle is in [0, 2pi)
    //   - position == center + orbit.offset_at(current_angle)
    //   - every satellite's center == position
    current_angle: f64,
    center: Point3<f64>,
    position: Point3<f64>,
    satellites: Vec<OrbitBody>,
}

/// Pre-order walk over a forest of bodies: parents come before their satellites.
pub struct Bodies<'a> {
    stack: Vec<&'a OrbitBody>,
}

impl BodyInfo {
    pub fn new(name: &str, size: f32, color: Point3<f32>) -> Self {
        BodyInfo {
            name: name.to_owned(),
            size,
            color,
            shininess: 100.0,
            is_light_source: false,
        }
    }

    pub fn light_source(mut self) -> Self {
        self.is_light_source = true;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    fn validate(&self) -> Result<(), OrreryError> {
        // Subnormal sizes have no finite reciprocal for the normal matrix
        if !(self.size > 0.0 && self.size.is_normal()) {
            return Err(OrreryError::Configuration(format!(
                "{}: size must be a positive normal number, got {}",
                self.name, self.size
            )));
        }
        if !self.shininess.is_finite() {
            return Err(OrreryError::Configuration(format!(
                "{}: shininess must be finite",
                self.name
            )));
        }
        Ok(())
    }
}

impl CircularOrbit {
    pub fn new(radius: f64, inclination: f64, period: f64) -> Result<Self, OrreryError> {
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(OrreryError::Configuration(format!(
                "orbit radius must be non-negative, got {radius}"
            )));
        }
        if !inclination.is_finite() {
            return Err(OrreryError::Configuration(format!(
                "orbit inclination must be finite, got {inclination}"
            )));
        }
        if !(period > 0.0 && period.is_finite()) {
            return Err(OrreryError::Configuration(format!(
                "orbit period must be positive, got {period}"
            )));
        }
        Ok(CircularOrbit {
            radius,
            inclination,
            period,
        })
    }

    /// A zero-radius orbit; the body sits on its center forever.
    pub fn stationary() -> Self {
        CircularOrbit {
            radius: 0.0,
            inclination: 0.0,
            period: 1.0,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn is_stationary(&self) -> bool {
        self.radius == 0.0
    }

    /// Radians per unit time.
    pub fn angular_speed(&self) -> f64 {
        TAU / self.period
    }

    /// Displacement from the center at the given angle.
    pub fn offset_at(&self, angle: f64) -> Vector3<f64> {
        let (sin_a, cos_a) = angle.sin_cos();
        let (sin_i, cos_i) = self.inclination.sin_cos();
        Vector3::new(cos_a, sin_a * sin_i, sin_a * cos_i) * self.radius
    }
}

impl OrbitBody {
    pub fn new(info: BodyInfo, orbit: CircularOrbit) -> Result<Self, OrreryError> {
        info.validate()?;
        let center = Point3::origin();
        Ok(OrbitBody {
            info,
            orbit,
            current_angle: 0.0,
            center,
            position: center + orbit.offset_at(0.0),
            satellites: vec![],
        })
    }

    /// A body that never leaves its center, e.g. a star.
    pub fn fixed(info: BodyInfo) -> Result<Self, OrreryError> {
        Self::new(info, CircularOrbit::stationary())
    }

    /// Sets the starting angle (wrapped into [0, 2pi)).
    pub fn with_phase(mut self, angle: f64) -> Self {
        self.current_angle = wrap_angle(angle);
        self.place(self.center);
        self
    }

    pub fn with_center(mut self, center: Point3<f64>) -> Self {
        self.place(center);
        self
    }

    pub fn with_satellite(mut self, satellite: OrbitBody) -> Self {
        self.add_satellite(satellite);
        self
    }

    pub fn add_satellite(&mut self, mut satellite: OrbitBody) {
        satellite.place(self.position);
        self.satellites.push(satellite);
    }

    pub fn info(&self) -> &BodyInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn orbit(&self) -> &CircularOrbit {
        &self.orbit
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    pub fn satellites(&self) -> &[OrbitBody] {
        &self.satellites
    }

    /// This body followed by all of its descendants, parents first.
    pub fn iter(&self) -> Bodies<'_> {
        Bodies { stack: vec![self] }
    }

    /// Advances this body and all of its satellites by `delta_time`.
    ///
    /// The body moves first, then hands its new position to each satellite
    /// as that satellite's center before recursing, so every center is fresh
    /// within the same tick.
    pub fn update(&mut self, delta_time: f64) -> Result<(), OrreryError> {
        validate_time_step(delta_time)?;
        self.advance(delta_time);
        Ok(())
    }

    pub(crate) fn advance(&mut self, delta_time: f64) {
        let increment = self.orbit.angular_speed() * delta_time;
        self.current_angle = wrap_angle(self.current_angle + increment);
        self.position = self.center + self.orbit.offset_at(self.current_angle);

        for satellite in self.satellites.iter_mut() {
            satellite.center = self.position;
            satellite.advance(delta_time);
        }
    }

    /// Moves the center without advancing time, carrying the satellites along.
    fn place(&mut self, center: Point3<f64>) {
        self.center = center;
        self.position = center + self.orbit.offset_at(self.current_angle);
        let position = self.position;
        for satellite in self.satellites.iter_mut() {
            satellite.place(position);
        }
    }
}

impl<'a> Bodies<'a> {
    pub(crate) fn new(roots: &'a [OrbitBody]) -> Self {
        Bodies {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Bodies<'a> {
    type Item = &'a OrbitBody;

    fn next(&mut self) -> Option<Self::Item> {
        let body = self.stack.pop()?;
        self.stack.extend(body.satellites.iter().rev());
        Some(body)
    }
}
