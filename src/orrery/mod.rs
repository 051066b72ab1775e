use nalgebra::Point3;

use crate::error::OrreryError;

mod body;

pub use body::{Bodies, BodyInfo, CircularOrbit, OrbitBody};

/// The whole scene: a forest of body trees, each owned by value.
///
/// Since satellites are owned by their parents, a body can never be its own
/// descendant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Orrery {
    roots: Vec<OrbitBody>,
}

/// Time steps must be finite and non-negative.
pub fn validate_time_step(delta_time: f64) -> Result<(), OrreryError> {
    if delta_time >= 0.0 && delta_time.is_finite() {
        Ok(())
    } else {
        Err(OrreryError::InvalidInput(format!(
            "time step must be finite and non-negative, got {delta_time}"
        )))
    }
}

impl Orrery {
    pub fn new() -> Self {
        Orrery { roots: vec![] }
    }

    pub fn add_root(&mut self, body: OrbitBody) {
        self.roots.push(body);
    }

    pub fn roots(&self) -> &[OrbitBody] {
        &self.roots
    }

    /// Every body in the scene, parents before satellites.
    pub fn bodies(&self) -> Bodies<'_> {
        Bodies::new(&self.roots)
    }

    pub fn len(&self) -> usize {
        self.bodies().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&OrbitBody> {
        self.bodies().find(|body| body.name() == name)
    }

    /// The body `name` orbits, if it has one.
    pub fn parent_of(&self, name: &str) -> Option<&OrbitBody> {
        self.bodies()
            .find(|body| body.satellites().iter().any(|s| s.name() == name))
    }

    /// Position of the first light source, or the origin if there is none.
    pub fn light_position(&self) -> Point3<f64> {
        self.bodies()
            .find(|body| body.info().is_light_source)
            .map_or_else(Point3::origin, OrbitBody::position)
    }

    /// Advances every tree by `delta_time`. The step is checked once up
    /// front, so a bad step leaves the whole scene untouched.
    pub fn update(&mut self, delta_time: f64) -> Result<(), OrreryError> {
        validate_time_step(delta_time)?;
        for root in self.roots.iter_mut() {
            root.advance(delta_time);
        }
        Ok(())
    }
}
