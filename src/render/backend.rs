//! The seam between the scene renderer and whatever actually talks to the GPU.

use std::fmt;

use nalgebra::{Matrix4, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub usize);

/// Contents of a buffer to upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferData<'a> {
    /// Tightly packed per-vertex floats.
    Attribute(&'a [f32]),
    /// Element indices.
    Index(&'a [u32]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Bool(bool),
    Vec3(Vector3<f32>),
    Mat4(Matrix4<f32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Non-indexed; the count is a vertex count.
    Points,
    /// Indexed pairs from the bound index buffer.
    Lines,
    /// Indexed triples from the bound index buffer.
    Triangles,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Shader compilation or linking failed.
    Compile(String),
    UnknownProgram(ProgramHandle),
    UnknownBuffer(BufferHandle),
    MissingAttribute(String),
    MissingUniform(String),
    /// A draw was requested with no program in use, or no index buffer for an
    /// indexed primitive.
    NotBound(&'static str),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(log) => write!(f, "shader compilation failed: {log}"),
            Self::UnknownProgram(p) => write!(f, "unknown program {}", p.0),
            Self::UnknownBuffer(b) => write!(f, "unknown buffer {}", b.0),
            Self::MissingAttribute(name) => write!(f, "no attribute named {name}"),
            Self::MissingUniform(name) => write!(f, "no uniform named {name}"),
            Self::NotBound(what) => write!(f, "nothing bound: {what}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// The calls the scene renderer makes each frame.
///
/// Implementations own all GPU-side resources; the renderer only ever holds
/// handles. None of these calls are expected to block.
pub trait RenderBackend {
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, BackendError>;

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), BackendError>;

    fn allocate_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, BackendError>;

    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), BackendError>;

    fn bind_attribute(
        &mut self,
        program: ProgramHandle,
        name: &str,
        buffer: BufferHandle,
        components_per_vertex: usize,
    ) -> Result<(), BackendError>;

    /// Binds an index buffer for subsequent `Lines`/`Triangles` draws.
    fn bind_indices(&mut self, buffer: BufferHandle) -> Result<(), BackendError>;

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: Uniform,
    ) -> Result<(), BackendError>;

    fn submit_draw(&mut self, primitive: Primitive, count: usize) -> Result<(), BackendError>;
}
