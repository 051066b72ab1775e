use std::collections::HashMap;
use std::path::Path;

use nalgebra::Point3;
use serde::Deserialize;

use crate::error::OrreryError;
use crate::orrery::{BodyInfo, CircularOrbit, OrbitBody, Orrery};

/// The scene the binaries fall back on when no file is given.
pub const DEFAULT_SCENE: &str = include_str!("../assets/solar-system.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneFile {
    #[serde(rename = "body", default)]
    bodies: Vec<BodySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BodySpec {
    name: String,
    parent: Option<String>,
    size: f32,
    color: String,
    #[serde(default)]
    orbit_radius: f64,
    // degrees
    #[serde(default)]
    inclination: f64,
    #[serde(default = "default_period")]
    period: f64,
    // degrees
    #[serde(default)]
    phase: f64,
    #[serde(default = "default_shininess")]
    shininess: f32,
    #[serde(default)]
    light_source: bool,
    /// Only meaningful for bodies without a parent.
    center: Option<[f64; 3]>,
}

fn default_period() -> f64 {
    1.0
}

fn default_shininess() -> f32 {
    100.0
}

pub fn read_file(filename: &Path) -> Result<Orrery, OrreryError> {
    let text = std::fs::read_to_string(filename)?;
    parse_scene(&text)
}

pub fn default_scene() -> Result<Orrery, OrreryError> {
    parse_scene(DEFAULT_SCENE)
}

pub fn parse_scene(text: &str) -> Result<Orrery, OrreryError> {
    let scene: SceneFile = toml::from_str(text)?;
    let specs = scene.bodies;

    // Resolve parents by name. A parent has to be declared before its
    // satellites, which also rules out cycles.
    let mut name_to_idx: HashMap<&str, usize> = HashMap::new();
    let mut satellites: Vec<Vec<usize>> = vec![vec![]; specs.len()];
    let mut roots = vec![];
    for (idx, spec) in specs.iter().enumerate() {
        match &spec.parent {
            None => roots.push(idx),
            Some(parent) => {
                let parent_idx = *name_to_idx.get(parent.as_str()).ok_or_else(|| {
                    OrreryError::Parse(format!(
                        "{}: parent {} is not declared before it",
                        spec.name, parent
                    ))
                })?;
                if spec.center.is_some() {
                    return Err(OrreryError::Parse(format!(
                        "{}: only root bodies may set a center",
                        spec.name
                    )));
                }
                satellites[parent_idx].push(idx);
            }
        }
        if name_to_idx.insert(spec.name.as_str(), idx).is_some() {
            return Err(OrreryError::Parse(format!(
                "body {} is declared twice",
                spec.name
            )));
        }
    }

    let mut orrery = Orrery::new();
    for idx in roots {
        orrery.add_root(build_body(&specs, &satellites, idx)?);
    }
    log::debug!("loaded scene with {} bodies", orrery.len());
    Ok(orrery)
}

fn build_body(
    specs: &[BodySpec],
    satellites: &[Vec<usize>],
    idx: usize,
) -> Result<OrbitBody, OrreryError> {
    let spec = &specs[idx];
    let with_name = |e: OrreryError| match e {
        OrreryError::Configuration(msg) => {
            OrreryError::Configuration(format!("{}: {}", spec.name, msg))
        }
        other => other,
    };

    let info = BodyInfo {
        name: spec.name.clone(),
        size: spec.size,
        color: parse_color(&spec.color)
            .ok_or_else(|| OrreryError::Parse(format!("{}: bad color {}", spec.name, spec.color)))?,
        shininess: spec.shininess,
        is_light_source: spec.light_source,
    };
    let orbit = CircularOrbit::new(
        spec.orbit_radius,
        spec.inclination.to_radians(),
        spec.period,
    )
    .map_err(with_name)?;

    let mut body = OrbitBody::new(info, orbit)?.with_phase(spec.phase.to_radians());
    if let Some([x, y, z]) = spec.center {
        body = body.with_center(Point3::new(x, y, z));
    }
    for &satellite_idx in &satellites[idx] {
        body.add_satellite(build_body(specs, satellites, satellite_idx)?);
    }
    Ok(body)
}

/// Parses `RRGGBB` (optionally prefixed with `#`) into normalized RGB.
pub fn parse_color(s: &str) -> Option<Point3<f32>> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;

    Some(Point3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
}
