//! Edge deduplication for the wireframe overlay.
//!
//! Drawing every triangle's three edges draws each interior edge twice and
//! clutters the surface. Edges are keyed by their sorted vertex pair so the
//! two triangle-local copies collapse into one line segment.

use std::collections::HashMap;

use surfview_common::{Face, Mesh};

use crate::buffers::{MeshError, validate_mesh};

/// An undirected edge, stored with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub lo: u32,
    pub hi: u32,
}

impl EdgeKey {
    /// Canonical key for the edge between `u` and `v`, or `None` if `u == v`.
    pub fn new(u: u32, v: u32) -> Option<Self> {
        match u.cmp(&v) {
            std::cmp::Ordering::Less => Some(Self { lo: u, hi: v }),
            std::cmp::Ordering::Greater => Some(Self { lo: v, hi: u }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Distinct edges of a triangle list in first-seen order, with the number of
/// triangles that share each one.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<EdgeKey>,
    counts: Vec<u32>,
}

impl EdgeSet {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.iter().copied()
    }

    /// Each distinct edge with its occurrence count.
    pub fn iter_counted(&self) -> impl Iterator<Item = (EdgeKey, u32)> + '_ {
        self.edges.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn count(&self, key: EdgeKey) -> u32 {
        self.iter_counted()
            .find(|(k, _)| *k == key)
            .map(|(_, c)| c)
            .unwrap_or(0)
    }

    /// Edges used by exactly one triangle.
    pub fn boundary(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 1).count()
    }

    /// Edges shared by two or more triangles.
    pub fn interior(&self) -> usize {
        self.counts.iter().filter(|&&c| c >= 2).count()
    }
}

/// Collect the distinct undirected edges of `faces`.
///
/// Every distinct edge is kept regardless of its count; boundary and interior
/// edges are both drawn.
pub fn dedup_edges(faces: &[Face]) -> EdgeSet {
    let mut slots: HashMap<EdgeKey, usize> = HashMap::with_capacity(faces.len() * 2);
    let mut set = EdgeSet::default();

    for face in faces {
        for (u, v) in face.edges() {
            let Some(key) = EdgeKey::new(u, v) else {
                continue;
            };
            match slots.get(&key) {
                Some(&slot) => set.counts[slot] += 1,
                None => {
                    slots.insert(key, set.edges.len());
                    set.edges.push(key);
                    set.counts.push(1);
                }
            }
        }
    }

    tracing::debug!(
        faces = faces.len(),
        edges = set.len(),
        boundary = set.boundary(),
        "deduplicated edges"
    );
    set
}

/// Resolve a mesh's distinct edges into line-segment endpoints,
/// `6` floats per edge.
pub fn edge_positions(mesh: &Mesh) -> Result<Vec<f32>, MeshError> {
    validate_mesh(mesh)?;
    let edges = dedup_edges(&mesh.faces);
    let mut out = Vec::with_capacity(edges.len() * 6);
    for key in edges.iter() {
        out.extend_from_slice(&mesh.vertices[key.lo as usize].to_array());
        out.extend_from_slice(&mesh.vertices[key.hi as usize].to_array());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfview_common::Point3;

    #[test]
    fn key_is_order_independent() {
        assert_eq!(EdgeKey::new(3, 1), EdgeKey::new(1, 3));
        assert_eq!(EdgeKey::new(2, 2), None);
    }

    #[test]
    fn shared_edge_is_emitted_once() {
        let faces = [Face::new(0, 1, 2), Face::new(1, 2, 3)];
        let edges = dedup_edges(&faces);
        assert_eq!(edges.len(), 5);
        assert_eq!(edges.count(EdgeKey { lo: 1, hi: 2 }), 2);
        assert_eq!(edges.interior(), 1);
        assert_eq!(edges.boundary(), 4);
    }

    #[test]
    fn single_triangle_has_three_edges() {
        let edges = dedup_edges(&[Face::new(0, 1, 2)]);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges.boundary(), 3);
    }

    #[test]
    fn first_seen_order_is_kept() {
        let edges = dedup_edges(&[Face::new(2, 0, 1)]);
        let keys: Vec<_> = edges.iter().collect();
        assert_eq!(
            keys,
            vec![
                EdgeKey { lo: 0, hi: 2 },
                EdgeKey { lo: 0, hi: 1 },
                EdgeKey { lo: 1, hi: 2 },
            ]
        );
    }

    #[test]
    fn degenerate_face_skips_collapsed_edge() {
        let edges = dedup_edges(&[Face::new(0, 0, 1)]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.count(EdgeKey { lo: 0, hi: 1 }), 2);
    }

    #[test]
    fn edge_positions_resolve_endpoints() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 2.0),
            ],
            vec![Face::new(0, 1, 2), Face::new(1, 2, 3)],
        );
        let positions = edge_positions(&mesh).unwrap();
        assert_eq!(positions.len(), 5 * 6);
        // first edge is (0, 1)
        assert_eq!(&positions[..6], &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn edge_positions_reject_bad_index() {
        let mesh = Mesh::new(vec![Point3::default()], vec![Face::new(0, 1, 2)]);
        assert!(edge_positions(&mesh).is_err());
    }

    #[test]
    fn no_faces_no_edges() {
        assert!(dedup_edges(&[]).is_empty());
    }
}
