//! Mesh assets: the exporter contract and the STL implementation

mod stl;

use crate::part::TriangleMesh;
use crate::transform::Transform;

pub use stl::{StlMeshExporter, load_stl, load_stl_from_reader, save_stl};

/// Reference to a written (or planned) mesh asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAsset {
    /// File name relative to the model directory
    pub file: String,
}

/// Materializes part geometry as mesh asset files.
///
/// `frame` is the absolute pose of the part; implementations express the
/// world-frame geometry in that frame so the asset can be placed by the body
/// and geom poses of the output model.
pub trait MeshExporter {
    fn export_mesh(
        &mut self,
        geometry: Option<&TriangleMesh>,
        name: &str,
        frame: &Transform,
    ) -> Result<MeshAsset, MeshError>;
}

/// Exporter that names assets without writing anything (dry runs)
#[derive(Debug, Clone, Default)]
pub struct PlannedMeshExporter {
    /// Every asset handed out so far
    pub planned: Vec<MeshAsset>,
}

impl MeshExporter for PlannedMeshExporter {
    fn export_mesh(
        &mut self,
        geometry: Option<&TriangleMesh>,
        name: &str,
        _frame: &Transform,
    ) -> Result<MeshAsset, MeshError> {
        check_geometry(geometry, name)?;
        let asset = MeshAsset {
            file: mesh_file_name(name),
        };
        self.planned.push(asset.clone());
        Ok(asset)
    }
}

/// File name of the asset for mesh `name`
pub fn mesh_file_name(name: &str) -> String {
    format!("{}.{}", sanitize_filename(name), crate::constants::MESH_EXTENSION)
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub(crate) fn check_geometry<'m>(
    geometry: Option<&'m TriangleMesh>,
    name: &str,
) -> Result<&'m TriangleMesh, MeshError> {
    match geometry {
        None => Err(MeshError::MissingGeometry(name.to_string())),
        Some(mesh) if mesh.is_empty() => Err(MeshError::EmptyMesh(name.to_string())),
        Some(mesh) => Ok(mesh),
    }
}

/// Mesh-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("No geometry for mesh '{0}'")]
    MissingGeometry(String),
    #[error("Empty mesh: no triangles for '{0}'")]
    EmptyMesh(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Arm:1 (left)"), "Arm_1__left_");
        assert_eq!(sanitize_filename("base-link_2"), "base-link_2");
        assert_eq!(sanitize_filename("bras_é"), "bras__");
        assert_eq!(mesh_file_name("wheel/front"), "wheel_front.stl");
    }

    #[test]
    fn test_planned_exporter_requires_geometry() {
        let mut exporter = PlannedMeshExporter::default();
        assert!(matches!(
            exporter.export_mesh(None, "ghost", &Transform::IDENTITY),
            Err(MeshError::MissingGeometry(_))
        ));
        assert!(matches!(
            exporter.export_mesh(Some(&TriangleMesh::default()), "hollow", &Transform::IDENTITY),
            Err(MeshError::EmptyMesh(_))
        ));

        let mesh = TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        let asset = exporter
            .export_mesh(Some(&mesh), "plate", &Transform::IDENTITY)
            .unwrap();
        assert_eq!(asset.file, "plate.stl");
        assert_eq!(exporter.planned.len(), 1);
    }
}
