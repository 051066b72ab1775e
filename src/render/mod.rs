mod backend;
mod icosphere;
pub mod recording;
mod scene_renderer;
pub mod shaders;
#[cfg(test)]
mod shading;

pub use backend::{
    BackendError, BufferData, BufferHandle, Primitive, ProgramHandle, RenderBackend, Uniform,
};
pub use icosphere::{generate_icosphere, IcoMesh, MeshCache, SphereBuffers};
pub use recording::RecordingBackend;
pub use scene_renderer::{model_matrix, normal_matrix, DrawStats, SceneRenderer};
