//! Part and JointType definitions

use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_COLOR;
use crate::transform::Transform;

/// Tessellated part geometry, expressed in the world frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Unique vertices
    pub vertices: Vec<[f32; 3]>,
    /// Triangle normals (one per triangle, may be empty)
    pub normals: Vec<[f32; 3]>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            normals: Vec::new(),
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Iterate over triangles as vertex triples, skipping out-of-range indices
    pub fn triangles(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|chunk| {
            let fetch = |i: u32| {
                self.vertices
                    .get(i as usize)
                    .map(|v| DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64))
            };
            Some([fetch(chunk[0])?, fetch(chunk[1])?, fetch(chunk[2])?])
        })
    }
}

/// A rigid part of the CAD assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: Uuid,
    pub name: String,
    /// Absolute pose in the world frame
    pub transform: Transform,
    /// Mesh file the geometry was read from (for project files)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_path: Option<String>,
    /// Geometry handle, shared with every body that references it
    #[serde(skip)]
    pub geometry: Option<Arc<TriangleMesh>>,
    /// Mass override for the exported geom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    /// Density override for the exported geom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Display color (RGBA)
    #[serde(default = "default_color")]
    pub color: [f32; 4],
}

fn default_color() -> [f32; 4] {
    DEFAULT_COLOR
}

impl Part {
    /// Create a new part at the world origin with no geometry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh_path: None,
            geometry: None,
            mass: None,
            density: None,
            color: DEFAULT_COLOR,
        }
    }

    /// Set the absolute pose
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach geometry
    pub fn with_geometry(mut self, geometry: TriangleMesh) -> Self {
        self.geometry = Some(Arc::new(geometry));
        self
    }
}

/// Joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JointType {
    #[default]
    Fixed,
    Revolute,
    Prismatic,
}

impl JointType {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            JointType::Fixed => "Fixed",
            JointType::Revolute => "Revolute",
            JointType::Prismatic => "Prismatic",
        }
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangles_skip_bad_indices() {
        let mesh = TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2, 0, 1, 9],
        );
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn test_part_serde_skips_geometry() {
        let part = Part::new("base_plate").with_geometry(TriangleMesh::default());
        let text = ron::to_string(&part).unwrap();
        let back: Part = ron::from_str(&text).unwrap();
        assert_eq!(back.name, "base_plate");
        assert_eq!(back.id, part.id);
        assert!(back.geometry.is_none());
    }
}
