use std::collections::{BTreeSet, HashMap};

use nalgebra::{Point3, Vector3};

use super::backend::{BackendError, BufferData, BufferHandle, RenderBackend};

/// A unit sphere made by repeatedly subdividing an icosahedron.
///
/// Since every vertex lies on the unit sphere, the positions double as the
/// vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub struct IcoMesh {
    pub positions: Vec<Vector3<f32>>,
    pub triangles: Vec<u32>,
}

impl IcoMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Positions flattened into `[x0, y0, z0, x1, ...]`.
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Every distinct triangle edge once, as index pairs.
    pub fn edges(&self) -> Vec<u32> {
        let mut edges = BTreeSet::new();
        for tri in self.triangles.chunks(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
    }
}

/// Level 0 is the bare icosahedron; each level splits every triangle in four.
/// The output is deterministic for a given level.
pub fn generate_icosphere(level: u32) -> IcoMesh {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut positions: Vec<Vector3<f32>> = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vector3::new(x, y, z).normalize())
    .collect();

    // Counter-clockwise seen from outside
    #[rustfmt::skip]
    let mut triangles: Vec<u32> = vec![
        0, 11, 5,   0, 5, 1,    0, 1, 7,    0, 7, 10,   0, 10, 11,
        1, 5, 9,    5, 11, 4,   11, 10, 2,  10, 7, 6,   7, 1, 8,
        3, 9, 4,    3, 4, 2,    3, 2, 6,    3, 6, 8,    3, 8, 9,
        4, 9, 5,    2, 4, 11,   6, 2, 10,   8, 6, 7,    9, 8, 1,
    ];

    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    for _ in 0..level {
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for tri in triangles.chunks(3) {
            let (v0, v1, v2) = (tri[0], tri[1], tri[2]);
            let a = midpoint(&mut positions, &mut midpoints, v0, v1);
            let b = midpoint(&mut positions, &mut midpoints, v1, v2);
            let c = midpoint(&mut positions, &mut midpoints, v2, v0);

            next.extend_from_slice(&[v0, a, c]);
            next.extend_from_slice(&[v1, b, a]);
            next.extend_from_slice(&[v2, c, b]);
            next.extend_from_slice(&[a, b, c]);
        }
        triangles = next;
    }

    IcoMesh {
        positions,
        triangles,
    }
}

fn midpoint(
    positions: &mut Vec<Vector3<f32>>,
    cache: &mut HashMap<(u32, u32), u32>,
    v0: u32,
    v1: u32,
) -> u32 {
    let key = (v0.min(v1), v0.max(v1));
    if let Some(&idx) = cache.get(&key) {
        return idx;
    }

    let mid = (positions[v0 as usize] + positions[v1 as usize]).normalize();
    let idx = positions.len() as u32;
    positions.push(mid);
    cache.insert(key, idx);
    idx
}

/// Buffers for one subdivision level, uploaded once and shared by every body.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereBuffers {
    pub level: u32,
    pub positions: BufferHandle,
    pub triangles: BufferHandle,
    pub edges: BufferHandle,
    pub vertex_count: usize,
    pub triangle_index_count: usize,
    pub edge_index_count: usize,
}

/// Keeps the sphere geometry and the flat per-vertex color buffers alive
/// between frames.
///
/// Only one level is resident at a time; asking for a different level
/// releases everything that was built for the old one.
#[derive(Debug, Default)]
pub struct MeshCache {
    sphere: Option<SphereBuffers>,
    // keyed by the bit patterns of the rgb components
    colors: HashMap<[u32; 3], BufferHandle>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Option<u32> {
        self.sphere.as_ref().map(|s| s.level)
    }

    pub fn sphere<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        level: u32,
    ) -> Result<&SphereBuffers, BackendError> {
        if self.level() != Some(level) {
            self.release(backend)?;
            let mesh = generate_icosphere(level);
            log::debug!(
                "uploading icosphere level {}: {} vertices, {} triangles",
                level,
                mesh.vertex_count(),
                mesh.triangle_count()
            );

            let edges = mesh.edges();
            let positions = backend.allocate_buffer(BufferData::Attribute(&mesh.flat_positions()))?;
            let triangles = backend.allocate_buffer(BufferData::Index(&mesh.triangles))?;
            let edge_buffer = backend.allocate_buffer(BufferData::Index(&edges))?;
            self.sphere = Some(SphereBuffers {
                level,
                positions,
                triangles,
                edges: edge_buffer,
                vertex_count: mesh.vertex_count(),
                triangle_index_count: mesh.triangles.len(),
                edge_index_count: edges.len(),
            });
        }

        match &self.sphere {
            Some(sphere) => Ok(sphere),
            None => Err(BackendError::NotBound("sphere geometry")),
        }
    }

    /// A buffer holding `color` once per vertex of the resident sphere.
    pub fn color_buffer<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        color: &Point3<f32>,
    ) -> Result<BufferHandle, BackendError> {
        let vertex_count = match &self.sphere {
            Some(sphere) => sphere.vertex_count,
            None => return Err(BackendError::NotBound("sphere geometry")),
        };

        let key = [color.x.to_bits(), color.y.to_bits(), color.z.to_bits()];
        if let Some(&handle) = self.colors.get(&key) {
            return Ok(handle);
        }

        let data: Vec<f32> = std::iter::repeat([color.x, color.y, color.z])
            .take(vertex_count)
            .flatten()
            .collect();
        let handle = backend.allocate_buffer(BufferData::Attribute(&data))?;
        self.colors.insert(key, handle);
        Ok(handle)
    }

    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), BackendError> {
        if let Some(sphere) = self.sphere.take() {
            backend.release_buffer(sphere.positions)?;
            backend.release_buffer(sphere.triangles)?;
            backend.release_buffer(sphere.edges)?;
        }
        for (_, handle) in self.colors.drain() {
            backend.release_buffer(handle)?;
        }
        Ok(())
    }
}
