use std::f32::consts::PI;

use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Unit, Vector3};

use crate::error::OrreryError;
use crate::math::geometry::{direction_from_angles, rotate_about};
use crate::options::CameraOptions;

mod controls;

pub use controls::CameraKey;

/// Below this length, `forward x world_up` is treated as degenerate.
const BASIS_TOLERANCE: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Unit<Vector3<f32>>,
    pub right: Unit<Vector3<f32>>,
    pub up: Unit<Vector3<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self, OrreryError> {
        let viewport = Viewport { width, height };
        viewport.aspect()?;
        Ok(viewport)
    }

    pub fn aspect(&self) -> Result<f32, OrreryError> {
        if self.width == 0 || self.height == 0 {
            return Err(OrreryError::Configuration(format!(
                "viewport must have non-zero dimensions, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(self.width as f32 / self.height as f32)
    }
}

/// Free-flying camera. Position is unconstrained, orientation is yaw/pitch/roll.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub orientation: Orientation,
    fovy: f32,
    znear: f32,
    zfar: f32,
    torch_fov: Option<f32>,
}

/// Everything the renderer needs from the camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
    pub basis: CameraBasis,
    pub torch_fov: Option<f32>,
}

/// Computes `normalize(forward x world_up)`, failing when the two are parallel.
pub fn checked_right(forward: &Vector3<f32>) -> Result<Unit<Vector3<f32>>, OrreryError> {
    Unit::try_new(forward.cross(&Vector3::y()), BASIS_TOLERANCE)
        .ok_or(OrreryError::DegenerateBasis)
}

/// Derives an orthonormal (forward, right, up) frame from the orientation.
///
/// Pitch is measured from the horizontal plane and yaw rotates about world-up
/// (+y). Roll then spins both `right` and `up` about `forward`.
///
/// When forward is (anti)parallel to world-up the cross product vanishes; in
/// that case `right` falls back to `(-sin yaw, 0, cos yaw)`, which is the
/// limit of the regular formula as pitch approaches +/- pi/2.
pub fn derive_basis(orientation: &Orientation) -> CameraBasis {
    let forward = direction_from_angles(orientation.yaw, orientation.pitch).normalize();
    let forward_axis = Unit::new_unchecked(forward);

    let right_no_roll = match checked_right(&forward) {
        Ok(right) => right.into_inner(),
        Err(_) => {
            log::debug!(
                "degenerate camera basis at pitch {}, using yaw fallback",
                orientation.pitch
            );
            let yaw = orientation.yaw;
            Vector3::new(-yaw.sin(), 0.0, yaw.cos())
        }
    };
    let up_no_roll = right_no_roll.cross(&forward);

    let right = rotate_about(&right_no_roll, &forward_axis, orientation.roll);
    let up = rotate_about(&up_no_roll, &forward_axis, orientation.roll);

    CameraBasis {
        forward: forward_axis,
        right: Unit::new_normalize(right),
        up: Unit::new_normalize(up),
    }
}

impl Camera {
    pub fn new(fovy: f32, znear: f32, zfar: f32) -> Result<Self, OrreryError> {
        validate_projection(fovy, znear, zfar)?;
        Ok(Camera {
            position: Point3::origin(),
            orientation: Orientation::default(),
            fovy,
            znear,
            zfar,
            torch_fov: None,
        })
    }

    pub fn from_options(options: &CameraOptions) -> Result<Self, OrreryError> {
        let mut camera = Camera::new(options.fov, options.near, options.far)?;
        let [x, y, z] = options.position;
        camera.position = Point3::new(x, y, z);
        camera.orientation = Orientation {
            yaw: options.yaw,
            pitch: options.pitch,
            roll: options.roll,
        };
        validate_torch(options.torch_fov)?;
        camera.torch_fov = options.torch_fov;
        Ok(camera)
    }

    /// Pushes projection parameters from the options onto the camera. Position
    /// and orientation are left alone, since those belong to the user.
    pub fn apply_options(&mut self, options: &CameraOptions) -> Result<(), OrreryError> {
        validate_projection(options.fov, options.near, options.far)?;
        validate_torch(options.torch_fov)?;
        self.fovy = options.fov;
        self.znear = options.near;
        self.zfar = options.far;
        self.torch_fov = options.torch_fov;
        Ok(())
    }

    pub fn fovy(&self) -> f32 {
        self.fovy
    }

    pub fn clip_planes(&self) -> (f32, f32) {
        (self.znear, self.zfar)
    }

    pub fn torch_fov(&self) -> Option<f32> {
        self.torch_fov
    }

    pub fn basis(&self) -> CameraBasis {
        derive_basis(&self.orientation)
    }

    pub fn view_transform(&self) -> Isometry3<f32> {
        look_at(&self.position, &self.basis())
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_transform().to_homogeneous()
    }

    fn projection(&self, viewport: &Viewport) -> Result<Perspective3<f32>, OrreryError> {
        let aspect = viewport.aspect()?;
        Ok(Perspective3::new(aspect, self.fovy, self.znear, self.zfar))
    }

    pub fn projection_matrix(&self, viewport: &Viewport) -> Result<Matrix4<f32>, OrreryError> {
        Ok(self.projection(viewport)?.into_inner())
    }

    pub fn matrices(&self, viewport: &Viewport) -> Result<CameraMatrices, OrreryError> {
        let basis = self.basis();
        Ok(CameraMatrices {
            view: look_at(&self.position, &basis).to_homogeneous(),
            projection: self.projection_matrix(viewport)?,
            eye: self.position,
            basis,
            torch_fov: self.torch_fov,
        })
    }
}

impl CameraMatrices {
    pub fn transformation(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Maps a world-space point to normalized device coordinates.
    pub fn project(&self, point: &Point3<f32>) -> Option<Point3<f32>> {
        Point3::from_homogeneous(self.transformation() * point.to_homogeneous())
    }

    /// Maps normalized device coordinates back into world space.
    pub fn unproject(&self, ndc: &Point3<f32>) -> Option<Point3<f32>> {
        let inverse = self.transformation().try_inverse()?;
        Point3::from_homogeneous(inverse * ndc.to_homogeneous())
    }
}

fn look_at(eye: &Point3<f32>, basis: &CameraBasis) -> Isometry3<f32> {
    let target = eye + basis.forward.into_inner();
    Isometry3::look_at_rh(eye, &target, &basis.up.into_inner())
}

fn validate_projection(fovy: f32, znear: f32, zfar: f32) -> Result<(), OrreryError> {
    if !(fovy > 0.0 && fovy < PI) {
        return Err(OrreryError::Configuration(format!(
            "field of view must lie in (0, pi), got {fovy}"
        )));
    }
    if !(znear > 0.0 && znear.is_finite()) {
        return Err(OrreryError::Configuration(format!(
            "near plane must be positive, got {znear}"
        )));
    }
    if !(zfar > znear && zfar.is_finite()) {
        return Err(OrreryError::Configuration(format!(
            "far plane must be beyond the near plane, got near {znear} far {zfar}"
        )));
    }
    Ok(())
}

/// The torch angle is the full cone width.
fn validate_torch(torch_fov: Option<f32>) -> Result<(), OrreryError> {
    match torch_fov {
        Some(angle) if !(angle > 0.0 && angle < PI) => Err(OrreryError::Configuration(format!(
            "torch angle must lie in (0, pi), got {angle}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    use std::f32::consts::FRAC_PI_2;

    fn assert_orthonormal(basis: &CameraBasis) {
        let (f, r, u) = (
            basis.forward.into_inner(),
            basis.right.into_inner(),
            basis.up.into_inner(),
        );
        for v in [f, r, u] {
            assert!(v.norm().is_finite());
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-5);
        }
        assert_relative_eq!(f.dot(&r), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.dot(&u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(r.dot(&u), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_basis_at_rest() {
        let basis = derive_basis(&Orientation::default());
        assert_relative_eq!(basis.forward.into_inner(), Vector3::x());
        assert_relative_eq!(basis.right.into_inner(), Vector3::z());
        assert_relative_eq!(basis.up.into_inner(), Vector3::y());
    }

    #[test]
    fn test_basis_orthonormal_everywhere() {
        let steps = 13;
        let angle = |i: i32, range: f32| -range + 2.0 * range * (i as f32) / (steps as f32 - 1.0);
        for i in 0..steps {
            for j in 0..steps {
                for k in 0..steps {
                    let orientation = Orientation {
                        yaw: angle(i, PI),
                        pitch: angle(j, FRAC_PI_2),
                        roll: angle(k, PI),
                    };
                    assert_orthonormal(&derive_basis(&orientation));
                }
            }
        }
    }

    #[test]
    fn test_basis_degenerate_pitch() {
        for &pitch in &[FRAC_PI_2, -FRAC_PI_2] {
            let orientation = Orientation {
                yaw: 0.7,
                pitch,
                roll: 0.3,
            };
            let forward = direction_from_angles(0.7, pitch);
            assert!(matches!(
                checked_right(&forward),
                Err(OrreryError::DegenerateBasis)
            ));

            let basis = derive_basis(&orientation);
            assert_orthonormal(&basis);
        }

        // The fallback agrees with the regular formula just inside the range
        let near_pole = derive_basis(&Orientation {
            yaw: 0.7,
            pitch: FRAC_PI_2 - 1e-3,
            roll: 0.0,
        });
        let at_pole = derive_basis(&Orientation {
            yaw: 0.7,
            pitch: FRAC_PI_2,
            roll: 0.0,
        });
        assert_relative_eq!(
            near_pole.right.into_inner(),
            at_pole.right.into_inner(),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_roll_rotates_up_about_forward() {
        let basis = derive_basis(&Orientation {
            yaw: 0.0,
            pitch: 0.0,
            roll: FRAC_PI_2,
        });
        assert_relative_eq!(basis.forward.into_inner(), Vector3::x());
        // A quarter turn about +x takes +y to +z and +z to -y
        assert_relative_eq!(basis.up.into_inner(), Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(basis.right.into_inner(), -Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_camera_validation() {
        assert!(Camera::new(1.5, 0.1, 1000.0).is_ok());
        assert!(Camera::new(0.0, 0.1, 1000.0).is_err());
        assert!(Camera::new(PI, 0.1, 1000.0).is_err());
        assert!(Camera::new(1.5, 0.0, 1000.0).is_err());
        assert!(Camera::new(1.5, 10.0, 1.0).is_err());
        assert!(Camera::new(1.5, 1.0, 1.0).is_err());
        assert!(Camera::new(1.5, 0.1, f32::INFINITY).is_err());
    }

    #[test]
    fn test_torch_validation() {
        let mut options = CameraOptions::default();
        options.torch_fov = Some(0.5);
        let mut camera = Camera::from_options(&options).unwrap();
        assert_eq!(camera.torch_fov(), Some(0.5));

        for bad in [f32::NAN, 0.0, -0.5, PI, 4.0] {
            options.torch_fov = Some(bad);
            assert!(Camera::from_options(&options).is_err(), "accepted {bad}");
            assert!(camera.apply_options(&options).is_err(), "applied {bad}");
        }
        // A rejected update leaves the camera alone
        assert_eq!(camera.torch_fov(), Some(0.5));

        options.torch_fov = None;
        camera.apply_options(&options).unwrap();
        assert_eq!(camera.torch_fov(), None);
    }

    #[test]
    fn test_zero_viewport_is_rejected() {
        let camera = Camera::new(1.5, 0.1, 1000.0).unwrap();
        let viewport = Viewport {
            width: 800,
            height: 0,
        };
        assert!(matches!(
            camera.matrices(&viewport),
            Err(OrreryError::Configuration(_))
        ));
        assert!(Viewport::new(0, 600).is_err());
    }

    #[test]
    fn test_round_trip_on_forward_axis() {
        let camera = Camera::new(1.5, 0.1, 1000.0).unwrap();
        let matrices = camera.matrices(&Viewport::new(800, 600).unwrap()).unwrap();

        let ahead = Point3::new(5.0, 0.0, 0.0);
        let ndc = matrices.project(&ahead).unwrap();
        // Straight ahead lands in the middle of the screen
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);

        let back = matrices.unproject(&ndc).unwrap();
        assert_relative_eq!(back, ahead, epsilon = 1e-3);

        // The screen center at any depth lies on the forward axis
        let center = matrices.unproject(&Point3::new(0.0, 0.0, 0.5)).unwrap();
        assert!(center.x > 0.0);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(center.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut camera = Camera::new(1.0, 0.1, 100.0).unwrap();
        camera.position = Point3::new(1.0, 2.0, 3.0);
        camera.orientation = Orientation {
            yaw: 0.4,
            pitch: -0.2,
            roll: 0.9,
        };
        let view = camera.view_matrix();
        let eye_in_view = Point3::from_homogeneous(view * camera.position.to_homogeneous()).unwrap();
        assert_relative_eq!(eye_in_view, Point3::origin(), epsilon = 1e-5);

        // Forward maps onto -z in view space
        let forward = view * camera.basis().forward.to_homogeneous();
        assert_relative_eq!(forward.xyz(), -Vector3::z(), epsilon = 1e-5);
    }
}
