//! Project file serialization
//!
//! A project file stores an annotated assembly: parts with their absolute
//! transforms and mesh files, joints, and the label hierarchy. Meshes are
//! referenced by path (relative to the project file) and loaded on demand.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assembly::{Assembly, Joint, Label};
use crate::mesh::load_stl;
use crate::part::Part;

/// Current project file format version
pub const PROJECT_VERSION: u32 = 1;

/// On-disk encoding of a project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Ron,
    Json,
}

impl ProjectFormat {
    /// JSON for `.json` files, RON otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ProjectFormat::Json,
            _ => ProjectFormat::Ron,
        }
    }
}

/// Serializable annotated assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// File format version
    pub version: u32,
    /// Project name
    pub name: String,
    pub parts: Vec<Part>,
    #[serde(default)]
    pub joints: Vec<Joint>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new("New Project")
    }
}

impl Project {
    /// Create a new empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            parts: Vec::new(),
            joints: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Snapshot an assembly, sorted by name so saved files are stable
    pub fn from_assembly(name: impl Into<String>, assembly: &Assembly) -> Self {
        let mut parts: Vec<Part> = assembly.parts.values().cloned().collect();
        parts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let mut joints: Vec<Joint> = assembly.joints.values().cloned().collect();
        joints.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let mut labels: Vec<Label> = assembly.labels.values().cloned().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            parts,
            joints,
            labels,
        }
    }

    /// Save project to a file (format chosen by extension)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let content = self.to_bytes(ProjectFormat::from_path(path))?;
        std::fs::write(path, content).map_err(|e| ProjectError::Io(e.to_string()))?;
        tracing::info!("Saved project '{}' to {:?}", self.name, path);
        Ok(())
    }

    /// Serialize project to bytes
    pub fn to_bytes(&self, format: ProjectFormat) -> Result<Vec<u8>, ProjectError> {
        let content = match format {
            ProjectFormat::Ron => {
                ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                    .map_err(|e| ProjectError::Serialize(e.to_string()))?
            }
            ProjectFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ProjectError::Serialize(e.to_string()))?,
        };
        Ok(content.into_bytes())
    }

    /// Load project from a file (format chosen by extension). Meshes are not loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| ProjectError::Io(e.to_string()))?;
        Self::load_from_bytes(&content, ProjectFormat::from_path(path))
    }

    /// Load project from bytes
    pub fn load_from_bytes(data: &[u8], format: ProjectFormat) -> Result<Self, ProjectError> {
        let project: Project = match format {
            ProjectFormat::Ron => {
                let content = std::str::from_utf8(data)
                    .map_err(|e| ProjectError::Deserialize(e.to_string()))?;
                ron::from_str(content).map_err(|e| ProjectError::Deserialize(e.to_string()))?
            }
            ProjectFormat::Json => serde_json::from_slice(data)
                .map_err(|e| ProjectError::Deserialize(e.to_string()))?,
        };

        if project.version > PROJECT_VERSION {
            return Err(ProjectError::Deserialize(format!(
                "Unsupported project version {} (newest known is {})",
                project.version, PROJECT_VERSION
            )));
        }
        Ok(project)
    }

    /// Build the assembly, loading every referenced mesh relative to `base_dir`.
    ///
    /// Parts that already carry geometry keep it. Parts without a mesh file are
    /// kept without geometry; the export reports them if they end up in a body.
    pub fn into_assembly(self, base_dir: impl AsRef<Path>) -> Result<Assembly, ProjectError> {
        let base_dir = base_dir.as_ref();
        let mut assembly = Assembly::new();

        for mut part in self.parts {
            if part.geometry.is_none()
                && let Some(mesh_path) = &part.mesh_path
            {
                let path = base_dir.join(mesh_path);
                let mesh = load_stl(&path).map_err(|e| ProjectError::Mesh {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                tracing::debug!(
                    "Loaded mesh for '{}' ({} triangles)",
                    part.name,
                    mesh.triangle_count()
                );
                part.geometry = Some(Arc::new(mesh));
            }
            assembly.add_part(part);
        }

        for label in self.labels {
            assembly.add_label(label);
        }

        for joint in self.joints {
            let name = joint.name.clone();
            assembly
                .add_joint(joint)
                .map_err(|e| ProjectError::Deserialize(format!("Joint '{name}': {e}")))?;
        }

        tracing::info!(
            "Loaded project '{}': {} parts, {} joints, {} labels",
            self.name,
            assembly.parts.len(),
            assembly.joints.len(),
            assembly.labels.len()
        );
        Ok(assembly)
    }

    /// Load a project file and its meshes in one step
    pub fn load_assembly(path: impl AsRef<Path>) -> Result<Assembly, ProjectError> {
        let path = path.as_ref();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::load(path)?.into_assembly(base_dir)
    }
}

/// Project-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Failed to load mesh {path}: {reason}")]
    Mesh { path: String, reason: String },
}
