//! CPU-side mesh representation shared by the loader and the renderer.

use glam::{Vec2, Vec3};

/// Vertex with the full attribute set, in object space. Tangent and
/// bitangent span the texture plane at the vertex (the TBN frame together
/// with the normal).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    /// Vertex fresh out of the parser; tangent/bitangent are filled in by
    /// [`compute_tangent_frames`] once all faces are known.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Default::default()
        }
    }
}

/// Indexed triangle mesh, planarized into one tightly-packed array per
/// attribute. The renderer binds each array as its own vertex buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn from_vertices(vertices: &[MeshVertex], indices: Vec<u32>) -> Self {
        Self {
            positions: vertices.iter().map(|v| v.position).collect(),
            normals: vertices.iter().map(|v| v.normal).collect(),
            tangents: vertices.iter().map(|v| v.tangent).collect(),
            bitangents: vertices.iter().map(|v| v.bitangent).collect(),
            texcoords: vertices.iter().map(|v| v.uv).collect(),
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if both vertex and index data are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.positions.is_empty() && !self.indices.is_empty()
    }
}

/// Derive per-vertex tangents and bitangents from position/UV deltas.
///
/// Each triangle contributes the tangent-plane basis solving
/// `E = T*dU + B*dV` for its two edges; contributions are accumulated per
/// vertex and normalized at the end, so shared vertices get a smoothed
/// frame. Triangles with degenerate UV area contribute nothing, and a
/// vertex that accumulates nothing falls back to an arbitrary frame
/// orthogonal to its normal.
pub fn compute_tangent_frames(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut tangents = vec![Vec3::ZERO; vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let p0 = Vec3::from(vertices[i0].position);
        let p1 = Vec3::from(vertices[i1].position);
        let p2 = Vec3::from(vertices[i2].position);
        let uv0 = Vec2::from(vertices[i0].uv);
        let uv1 = Vec2::from(vertices[i1].uv);
        let uv2 = Vec2::from(vertices[i2].uv);

        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let duv1 = uv1 - uv0;
        let duv2 = uv2 - uv0;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * duv2.y - e2 * duv1.y) * r;
        let bitangent = (e2 * duv1.x - e1 * duv2.x) * r;

        for &i in &[i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (i, v) in vertices.iter_mut().enumerate() {
        let normal = Vec3::from(v.normal);
        let (fallback_t, fallback_b) = fallback_frame(normal);
        let tangent = tangents[i].try_normalize().unwrap_or(fallback_t);
        let bitangent = bitangents[i].try_normalize().unwrap_or(fallback_b);
        v.tangent = tangent.to_array();
        v.bitangent = bitangent.to_array();
    }
}

/// Arbitrary orthonormal tangent/bitangent pair for a normal, used when the
/// UV layout gives no usable frame.
fn fallback_frame(normal: Vec3) -> (Vec3, Vec3) {
    let n = normal.try_normalize().unwrap_or(Vec3::Z);
    let axis = if n.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = n.cross(axis).normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<MeshVertex>, Vec<u32>) {
        let vertices = vec![
            MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            MeshVertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        (vertices, indices)
    }

    #[test]
    fn planar_quad_gets_axis_aligned_frame() {
        let (mut vertices, indices) = quad();
        compute_tangent_frames(&mut vertices, &indices);
        for v in &vertices {
            let t = Vec3::from(v.tangent);
            let b = Vec3::from(v.bitangent);
            assert!((t - Vec3::X).length() < 1e-5, "tangent {t:?}");
            assert!((b - Vec3::Y).length() < 1e-5, "bitangent {b:?}");
        }
    }

    #[test]
    fn degenerate_uvs_fall_back_to_orthogonal_frame() {
        let (mut vertices, indices) = quad();
        for v in &mut vertices {
            v.uv = [0.5, 0.5];
        }
        compute_tangent_frames(&mut vertices, &indices);
        for v in &vertices {
            let n = Vec3::from(v.normal);
            let t = Vec3::from(v.tangent);
            let b = Vec3::from(v.bitangent);
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!((b.length() - 1.0).abs() < 1e-5);
            assert!(n.dot(t).abs() < 1e-5);
            assert!(n.dot(b).abs() < 1e-5);
        }
    }

    #[test]
    fn planarized_mesh_keeps_attribute_order() {
        let (mut vertices, indices) = quad();
        compute_tangent_frames(&mut vertices, &indices);
        let mesh = MeshData::from_vertices(&vertices, indices);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.is_valid());
        assert_eq!(mesh.positions[2], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.texcoords[3], [0.0, 1.0]);
    }

    #[test]
    fn empty_mesh_is_invalid() {
        assert!(!MeshData::default().is_valid());
    }
}
