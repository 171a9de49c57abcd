//! STL mesh reading and writing

use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use glam::DVec3;

use crate::part::TriangleMesh;
use crate::transform::Transform;

use super::{MeshAsset, MeshError, MeshExporter, check_geometry, mesh_file_name};

/// Writes binary STL assets into a directory
#[derive(Debug, Clone)]
pub struct StlMeshExporter {
    dir: PathBuf,
    identity_epsilon: f64,
    written: Vec<PathBuf>,
}

impl StlMeshExporter {
    pub fn new(dir: impl Into<PathBuf>, identity_epsilon: f64) -> Self {
        Self {
            dir: dir.into(),
            identity_epsilon,
            written: Vec::new(),
        }
    }

    /// Paths of every file written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl MeshExporter for StlMeshExporter {
    fn export_mesh(
        &mut self,
        geometry: Option<&TriangleMesh>,
        name: &str,
        frame: &Transform,
    ) -> Result<MeshAsset, MeshError> {
        let mesh = check_geometry(geometry, name)?;
        let file = mesh_file_name(name);
        let path = self.dir.join(&file);
        save_stl(mesh, frame, &path, self.identity_epsilon)?;
        tracing::debug!("Wrote mesh '{}' ({} triangles)", file, mesh.triangle_count());
        self.written.push(path);
        Ok(MeshAsset { file })
    }
}

/// Load an STL file as a world-frame triangle mesh (no scaling)
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleMesh, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    load_stl_from_reader(&mut BufReader::new(file))
}

/// Load STL data (ASCII or binary) from any seekable reader
pub fn load_stl_from_reader<R: Read + Seek>(reader: &mut R) -> Result<TriangleMesh, MeshError> {
    let mesh = stl_io::read_stl(reader).map_err(|e| MeshError::Parse(e.to_string()))?;

    let vertices = mesh
        .vertices
        .iter()
        .map(|v| [v[0], v[1], v[2]])
        .collect();
    let mut normals = Vec::with_capacity(mesh.faces.len());
    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for face in &mesh.faces {
        normals.push([face.normal[0], face.normal[1], face.normal[2]]);
        indices.extend(face.vertices.iter().map(|&i| i as u32));
    }

    Ok(TriangleMesh {
        vertices,
        normals,
        indices,
    })
}

/// Save `mesh` as binary STL with vertices expressed in `frame`.
///
/// Normals are recomputed from the transformed triangles.
pub fn save_stl(
    mesh: &TriangleMesh,
    frame: &Transform,
    path: impl AsRef<Path>,
    identity_epsilon: f64,
) -> Result<(), MeshError> {
    let to_local = !frame.is_identity(identity_epsilon);

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|corners| {
            let [v0, v1, v2] = if to_local {
                corners.map(|p| frame.to_local_point(p))
            } else {
                corners
            };
            let normal = (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(DVec3::Z);
            stl_io::Triangle {
                normal: stl_io::Normal::new(to_f32(normal)),
                vertices: [
                    stl_io::Vertex::new(to_f32(v0)),
                    stl_io::Vertex::new(to_f32(v1)),
                    stl_io::Vertex::new(to_f32(v2)),
                ],
            }
        })
        .collect();

    let mut file = std::fs::File::create(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| MeshError::Write(e.to_string()))?;

    Ok(())
}

fn to_f32(v: DVec3) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;
    use tempfile::tempdir;

    fn unit_triangle_at(z: f32) -> TriangleMesh {
        TriangleMesh::new(
            vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_export_maps_into_part_frame() {
        let temp = tempdir().unwrap();
        let mut exporter = StlMeshExporter::new(temp.path(), 1e-9);
        let frame = Transform::from_translation(DVec3::new(0.0, 0.0, 5.0));

        let asset = exporter
            .export_mesh(Some(&unit_triangle_at(5.0)), "top plate", &frame)
            .unwrap();
        assert_eq!(asset.file, "top_plate.stl");
        assert_eq!(exporter.written().len(), 1);

        let back = load_stl(temp.path().join(&asset.file)).unwrap();
        assert_eq!(back.triangle_count(), 1);
        for v in &back.vertices {
            assert!(v[2].abs() < 1e-6);
        }
    }

    #[test]
    fn test_export_recomputes_normals_after_rotation() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("rotated.stl");
        let frame = Transform::from_rotation(DQuat::from_rotation_x(std::f64::consts::FRAC_PI_2));
        save_stl(&unit_triangle_at(0.0), &frame, &path, 1e-9).unwrap();

        let back = load_stl(&path).unwrap();
        let n = back.normals[0];
        // World +Z seen from a frame rotated +90 degrees about X is local +Y
        assert!((n[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_geometry_writes_nothing() {
        let temp = tempdir().unwrap();
        let mut exporter = StlMeshExporter::new(temp.path(), 1e-9);
        assert!(matches!(
            exporter.export_mesh(None, "ghost", &Transform::IDENTITY),
            Err(MeshError::MissingGeometry(_))
        ));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
