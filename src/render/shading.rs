//! CPU evaluation of the lit fragment shader. Only built for tests, where it
//! pins down the lighting rules that `LIT_FRAGMENT_SRC` implements.

use nalgebra::{Point3, Vector3};

use crate::options::LightingOptions;

/// Forward-facing spotlight attached to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torch {
    pub direction: Vector3<f32>,
    /// Full cone angle in radians.
    pub fov: f32,
}

/// Inputs for shading one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub color: Point3<f32>,
    pub normal: Vector3<f32>,
    pub to_light: Vector3<f32>,
    pub to_view: Vector3<f32>,
    pub shininess: f32,
}

/// The final color of a lit surface point, before any clamping to [0, 1].
///
/// `color * (ambient * color + diffuse) + specular`, where the diffuse term is
/// the raw `n . l` and may go negative (darkening the point below its ambient
/// level) unless `clamp_diffuse` is set. Specular is only added on the lit
/// side.
pub fn shade(
    surface: &SurfacePoint,
    lighting: &LightingOptions,
    torch: Option<&Torch>,
) -> Vector3<f32> {
    let normal = surface.normal.normalize();
    let to_light = surface.to_light.normalize();
    let to_view = surface.to_view.normalize();
    let half = (to_light + to_view).normalize();

    let color = surface.color.coords;
    let ambient = color * lighting.ambient;

    let mut light = normal.dot(&to_light);
    let specular = if light > 0.0 {
        normal.dot(&half).powf(surface.shininess)
    } else {
        0.0
    };
    if lighting.clamp_diffuse {
        light = light.max(0.0);
    }

    if let Some(torch) = torch {
        let spot = (-to_view).dot(&torch.direction.normalize());
        if spot >= (0.5 * torch.fov).cos() {
            light += normal.dot(&to_view).max(0.0);
        }
    }

    let lit = (ambient.add_scalar(light)).component_mul(&color);
    lit.add_scalar(specular)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::super::shaders::LIT_FRAGMENT_SRC;
    use super::*;

    fn surface(to_light: Vector3<f32>) -> SurfacePoint {
        SurfacePoint {
            color: Point3::new(1.0, 0.5, 0.0),
            normal: Vector3::x(),
            to_light,
            to_view: Vector3::x(),
            shininess: 10.0,
        }
    }

    #[test]
    fn test_shader_follows_same_rules() {
        // Each branch of `shade` has its GLSL twin in the lit program
        for line in [
            "if (light > 0.0) {",
            "specular = pow(dot(normal, halfVector), uShininess);",
            "if (uClampDiffuse) {",
            "light = max(light, 0.0);",
            "if (spot >= cos(0.5 * uTorchFov)) {",
            "light += max(dot(normal, surfaceToViewDirection), 0.0);",
            "gl_FragColor.rgb *= (ambient + light);",
            "gl_FragColor.rgb += specular;",
        ] {
            assert!(LIT_FRAGMENT_SRC.contains(line), "shader lost `{line}`");
        }
    }

    #[test]
    fn test_facing_light() {
        let color = shade(&surface(Vector3::x()), &LightingOptions::default(), None);
        // ambient 0.4 * c, diffuse 1, specular 1
        let expected = Vector3::new(1.0 * (0.4 + 1.0) + 1.0, 0.5 * (0.2 + 1.0) + 1.0, 1.0);
        assert_relative_eq!(color, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_unclamped_diffuse_darkens() {
        // Light behind the surface: the raw diffuse term is -1, which pulls
        // the color below the ambient-only level. This is the shader's
        // long-standing behavior, kept on purpose.
        let lighting = LightingOptions::default();
        let color = shade(&surface(-Vector3::x()), &lighting, None);
        assert_relative_eq!(color.x, 1.0 * (0.4 - 1.0), epsilon = 1e-6);
        assert!(color.x < 0.0);

        let clamped = LightingOptions {
            clamp_diffuse: true,
            ..lighting
        };
        let color = shade(&surface(-Vector3::x()), &clamped, None);
        assert_relative_eq!(color.x, 0.4, epsilon = 1e-6);
        assert_relative_eq!(color.y, 0.5 * 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_no_specular_on_dark_side() {
        // Grazing light just past the terminator
        let to_light = Vector3::new(-0.01, 1.0, 0.0);
        let lighting = LightingOptions {
            clamp_diffuse: true,
            ..LightingOptions::default()
        };
        let color = shade(&surface(to_light), &lighting, None);
        // Only ambient remains: no specular highlight leaks through
        assert_relative_eq!(color, Vector3::new(0.4, 0.1, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_torch_cone() {
        let lighting = LightingOptions {
            clamp_diffuse: true,
            ..LightingOptions::default()
        };
        // Camera sits on +x looking down -x at the surface
        let torch = Torch {
            direction: -Vector3::x(),
            fov: 0.5,
        };
        let dark = surface(-Vector3::x());
        let lit = shade(&dark, &lighting, Some(&torch));
        assert_relative_eq!(lit.x, 1.0 * (0.4 + 1.0), epsilon = 1e-6);

        // Pointing away from the surface, the torch does nothing
        let away = Torch {
            direction: Vector3::y(),
            fov: 0.5,
        };
        let unlit = shade(&dark, &lighting, Some(&away));
        assert_relative_eq!(unlit.x, 0.4, epsilon = 1e-6);
    }
}
