use glam::Vec3;
use surfview_common::Point3;

/// Axis-aligned bounding box of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds of `points`, or `None` when there are no points.
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = first.to_vec3();
        let (min, max) = rest.iter().fold((start, start), |(min, max), p| {
            let v = p.to_vec3();
            (min.min(v), max.max(v))
        });
        Some(Self { min, max })
    }

    /// Approximate centroid: the center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}
