use glam::Vec3;

use crate::buffers::MeshBuffers;

/// Smooth per-vertex normals for an indexed triangle list.
///
/// Face normals are accumulated unnormalized, so larger triangles weigh more,
/// then each vertex normal is normalized. Vertices not referenced by any face
/// get a zero normal. Returns `3 * vertex_count` floats.
pub fn compute_vertex_normals(buffers: &MeshBuffers) -> Vec<f32> {
    let vertex_count = buffers.vertex_count();
    let position = |i: u32| {
        let i = i as usize * 3;
        Vec3::from_slice(&buffers.positions[i..i + 3])
    };

    let mut acc = vec![Vec3::ZERO; vertex_count];
    for tri in buffers.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let n = (position(b) - position(a)).cross(position(c) - position(a));
        acc[a as usize] += n;
        acc[b as usize] += n;
        acc[c as usize] += n;
    }

    acc.into_iter()
        .flat_map(|n| n.normalize_or_zero().to_array())
        .collect()
}
