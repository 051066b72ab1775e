use nalgebra::{Matrix4, Point3};

use crate::camera::CameraMatrices;
use crate::error::OrreryError;
use crate::options::{FillMode, LightingOptions, WorldOptions};
use crate::orrery::{OrbitBody, Orrery};

use super::backend::{Primitive, ProgramHandle, RenderBackend, Uniform};
use super::icosphere::MeshCache;
use super::shaders::*;

/// What one call to [`SceneRenderer::draw`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub bodies: usize,
    pub draw_calls: usize,
}

/// Draws every body of an orrery as a scaled icosphere.
///
/// Programs are compiled on first use and geometry is uploaded once per
/// subdivision level; both are kept until the renderer is released.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    lit: Option<ProgramHandle>,
    unlit: Option<ProgramHandle>,
    meshes: MeshCache,
}

/// Per-frame values shared by every body.
struct FrameUniforms {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    light_position: Point3<f32>,
    eye: Point3<f32>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lit_program(&self) -> Option<ProgramHandle> {
        self.lit
    }

    pub fn unlit_program(&self) -> Option<ProgramHandle> {
        self.unlit
    }

    /// Body and camera state are only read. Any backend failure aborts the
    /// frame and is returned as [`OrreryError::Backend`].
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        orrery: &Orrery,
        camera: &CameraMatrices,
        world: &WorldOptions,
        lighting: &LightingOptions,
    ) -> Result<DrawStats, OrreryError> {
        self.ensure_programs(backend)?;
        self.meshes.sphere(backend, world.subdivisions)?;

        let frame = FrameUniforms {
            view: camera.view,
            projection: camera.projection,
            light_position: orrery.light_position().cast::<f32>(),
            eye: camera.eye,
        };

        let mut stats = DrawStats::default();
        for body in orrery.bodies() {
            stats.draw_calls += self.draw_body(backend, body, &frame, camera, world, lighting)?;
            stats.bodies += 1;
        }
        log::debug!(
            "drew {} bodies in {} draw calls",
            stats.bodies,
            stats.draw_calls
        );
        Ok(stats)
    }

    /// Frees the cached geometry. Programs stay compiled.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), OrreryError> {
        self.meshes.release(backend)?;
        Ok(())
    }

    fn ensure_programs<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), OrreryError> {
        if self.lit.is_none() {
            self.lit = Some(backend.compile_program(LIT_VERTEX_SRC, LIT_FRAGMENT_SRC)?);
            log::info!("compiled lit body program");
        }
        if self.unlit.is_none() {
            self.unlit = Some(backend.compile_program(UNLIT_VERTEX_SRC, UNLIT_FRAGMENT_SRC)?);
            log::info!("compiled light source program");
        }
        Ok(())
    }

    fn draw_body<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        body: &OrbitBody,
        frame: &FrameUniforms,
        camera: &CameraMatrices,
        world: &WorldOptions,
        lighting: &LightingOptions,
    ) -> Result<usize, OrreryError> {
        let info = body.info();
        let (lit, unlit) = match (self.lit, self.unlit) {
            (Some(lit), Some(unlit)) => (lit, unlit),
            _ => return Err(OrreryError::Backend(super::BackendError::NotBound("program"))),
        };
        let program = if info.is_light_source { unlit } else { lit };

        let color = self.meshes.color_buffer(backend, &info.color)?;
        let sphere = self.meshes.sphere(backend, world.subdivisions)?.clone();

        backend.use_program(program)?;
        backend.bind_attribute(program, ATTR_POSITION, sphere.positions, 3)?;
        backend.bind_attribute(program, ATTR_COLOR, color, 3)?;

        let position = body.position().cast::<f32>();
        let model = model_matrix(&position, info.size);
        backend.set_uniform(program, UNIFORM_MODEL, Uniform::Mat4(model))?;
        backend.set_uniform(program, UNIFORM_VIEW, Uniform::Mat4(frame.view))?;
        backend.set_uniform(program, UNIFORM_PROJECTION, Uniform::Mat4(frame.projection))?;

        if !info.is_light_source {
            // Unit sphere, so positions are also normals
            backend.bind_attribute(program, ATTR_NORMAL, sphere.positions, 3)?;

            let uniforms = [
                (UNIFORM_NORMAL_MATRIX, Uniform::Mat4(normal_matrix(&position, info.size))),
                (UNIFORM_LIGHT_POSITION, Uniform::Vec3(frame.light_position.coords)),
                (UNIFORM_VIEW_POSITION, Uniform::Vec3(frame.eye.coords)),
                (UNIFORM_SHININESS, Uniform::Float(info.shininess)),
                (UNIFORM_AMBIENT, Uniform::Float(lighting.ambient)),
                (UNIFORM_CLAMP_DIFFUSE, Uniform::Bool(lighting.clamp_diffuse)),
                (UNIFORM_TORCH_ENABLED, Uniform::Bool(camera.torch_fov.is_some())),
            ];
            for (name, value) in uniforms {
                backend.set_uniform(program, name, value)?;
            }
            if let Some(torch_fov) = camera.torch_fov {
                let direction = camera.basis.forward.into_inner();
                backend.set_uniform(program, UNIFORM_TORCH_DIRECTION, Uniform::Vec3(direction))?;
                backend.set_uniform(program, UNIFORM_TORCH_FOV, Uniform::Float(torch_fov))?;
            }
        }

        match world.fill_mode {
            FillMode::Points => backend.submit_draw(Primitive::Points, sphere.vertex_count)?,
            FillMode::Lines => {
                backend.bind_indices(sphere.edges)?;
                backend.submit_draw(Primitive::Lines, sphere.edge_index_count)?;
            }
            FillMode::Fill => {
                backend.bind_indices(sphere.triangles)?;
                backend.submit_draw(Primitive::Triangles, sphere.triangle_index_count)?;
            }
        }
        Ok(1)
    }
}

/// Translate(position) * Scale(size).
pub fn model_matrix(position: &Point3<f32>, size: f32) -> Matrix4<f32> {
    Matrix4::new_translation(&position.coords) * Matrix4::new_scaling(size)
}

/// The inverse-transpose of [`model_matrix`], for transforming normals.
///
/// Built directly as `(S(1/size) * T(-position))^T`, so it stays finite for
/// any size a body accepts, however small.
pub fn normal_matrix(position: &Point3<f32>, size: f32) -> Matrix4<f32> {
    let inverse = Matrix4::new_scaling(size.recip()) * Matrix4::new_translation(&-position.coords);
    inverse.transpose()
}
