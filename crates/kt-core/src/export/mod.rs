//! MJCF export: writes the model document and its mesh assets

mod names;
mod options;
mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::assembly::{Assembly, root_assembly};
use crate::constants::MODEL_FILE_NAME;
use crate::kinematics::{ConvertError, KinematicTree, build_kinematic_tree};
use crate::mesh::{PlannedMeshExporter, StlMeshExporter};

pub use names::NameRegistry;
pub use options::ConvertOptions;
pub use xml::{MjcfWriter, scale_position, xml_escape};

/// What a successful conversion produced
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub model_name: String,
    /// Path of the written MJCF document
    pub model_path: PathBuf,
    pub body_count: usize,
    pub actuator_count: usize,
    pub mesh_count: usize,
}

/// Convert `assembly` and write the model into `options.output_dir`.
///
/// The output directory is only touched once the whole model has been
/// generated: files are written to a staging directory next to it, which then
/// replaces any previous output. On error the previous output is left as is and
/// no new directories remain.
pub fn convert_to_mjcf(
    assembly: &Assembly,
    options: &ConvertOptions,
) -> Result<ExportSummary, ConvertError> {
    let tree = build_kinematic_tree(assembly, options)?;
    let model_name = resolve_model_name(assembly, options)?;

    let output_dir = resolve_output_dir(&options.output_dir, options.project_dir.as_deref())?;
    let anchor = existing_ancestor(&output_dir)?;
    let staging = tempfile::Builder::new()
        .prefix(".kt-staging-")
        .tempdir_in(&anchor)
        .map_err(|e| ConvertError::Io(e.to_string()))?;

    let mut exporter = StlMeshExporter::new(staging.path(), options.identity_epsilon);
    let (mjcf, actuator_count) = {
        let mut writer = MjcfWriter::new(assembly, &tree, options, &mut exporter);
        let mjcf = writer.write(&model_name)?;
        (mjcf, writer.actuator_count())
    };
    let mesh_count = exporter.written().len();

    fs::write(staging.path().join(MODEL_FILE_NAME), mjcf)
        .map_err(|e| ConvertError::Io(e.to_string()))?;

    commit_output(staging, &output_dir, &anchor)?;

    tracing::info!(
        "Exported MJCF model '{}' to {:?} ({} bodies, {} actuators, {} meshes)",
        model_name,
        output_dir,
        tree.len(),
        actuator_count,
        mesh_count
    );

    Ok(ExportSummary {
        model_name,
        model_path: output_dir.join(MODEL_FILE_NAME),
        body_count: tree.len(),
        actuator_count,
        mesh_count,
    })
}

/// Generate the MJCF document without writing anything to disk
pub fn convert_to_string(
    assembly: &Assembly,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    let tree = build_kinematic_tree(assembly, options)?;
    let model_name = resolve_model_name(assembly, options)?;
    generate_mjcf_string(assembly, &tree, &model_name, options)
}

/// Generate the MJCF document for an already built tree
pub fn generate_mjcf_string(
    assembly: &Assembly,
    tree: &KinematicTree,
    model_name: &str,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    let mut exporter = PlannedMeshExporter::default();
    MjcfWriter::new(assembly, tree, options, &mut exporter).write(model_name)
}

/// Model name from the options, falling back to the top-level assembly label
pub fn resolve_model_name(
    assembly: &Assembly,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    match &options.model_name {
        Some(name) => Ok(name.clone()),
        None => Ok(root_assembly(&assembly.labels)?.name.clone()),
    }
}

/// Canonical form of `output_dir`, checked to be safe to replace.
///
/// Missing trailing components are allowed. The directory must not be the
/// filesystem root, an existing file, or contain the working directory or
/// `project_dir`. Nothing is created or removed.
pub fn resolve_output_dir(
    output_dir: &Path,
    project_dir: Option<&Path>,
) -> Result<PathBuf, ConvertError> {
    let absolute = std::path::absolute(output_dir).map_err(|e| ConvertError::Io(e.to_string()))?;

    let mut missing = Vec::new();
    let mut existing = absolute.as_path();
    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => {
                return Err(ConvertError::Config(format!(
                    "Cannot resolve output directory {}",
                    output_dir.display()
                )));
            }
        }
    }
    let mut resolved = existing
        .canonicalize()
        .map_err(|e| ConvertError::Io(e.to_string()))?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }

    if resolved.parent().is_none() {
        return Err(ConvertError::Config(
            "Output directory cannot be the filesystem root".to_string(),
        ));
    }
    if resolved.exists() && !resolved.is_dir() {
        return Err(ConvertError::Config(format!(
            "Output path {} is not a directory",
            resolved.display()
        )));
    }

    let protected = std::env::current_dir()
        .ok()
        .map(|dir| ("working directory", dir))
        .into_iter()
        .chain(project_dir.map(|dir| ("project directory", dir.to_path_buf())));
    for (what, dir) in protected {
        let dir = dir.canonicalize().unwrap_or(dir);
        if dir.starts_with(&resolved) {
            return Err(ConvertError::Config(format!(
                "Output directory {} would replace the {} {}",
                resolved.display(),
                what,
                dir.display()
            )));
        }
    }

    Ok(resolved)
}

// Nearest existing directory above `output_dir`
fn existing_ancestor(output_dir: &Path) -> Result<PathBuf, ConvertError> {
    output_dir
        .ancestors()
        .skip(1)
        .find(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            ConvertError::Config(format!(
                "No existing parent directory for {}",
                output_dir.display()
            ))
        })
}

/// Move the staged output into place.
///
/// A previous output is first renamed aside and only deleted once the staged
/// directory is in place; it is restored if that rename fails.
fn commit_output(staging: TempDir, output_dir: &Path, anchor: &Path) -> Result<(), ConvertError> {
    let parent = output_dir.parent().unwrap_or(anchor);

    if output_dir.exists() {
        let previous = tempfile::Builder::new()
            .prefix(".kt-previous-")
            .tempdir_in(parent)
            .map_err(|e| ConvertError::Io(e.to_string()))?;
        let backup = previous.path().join("output");
        fs::rename(output_dir, &backup).map_err(|e| ConvertError::Io(e.to_string()))?;

        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, output_dir) {
            let _ = fs::remove_dir_all(&staged);
            if fs::rename(&backup, output_dir).is_err() {
                let kept = previous.keep().join("output");
                return Err(ConvertError::Io(format!(
                    "{e}; previous output kept at {}",
                    kept.display()
                )));
            }
            return Err(ConvertError::Io(e.to_string()));
        }

        if let Err(e) = previous.close() {
            tracing::warn!("Failed to remove previous output: {}", e);
        }
        return Ok(());
    }

    if let Err(e) = fs::create_dir_all(parent) {
        remove_created_dirs(parent, anchor);
        return Err(ConvertError::Io(e.to_string()));
    }
    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, output_dir) {
        let _ = fs::remove_dir_all(&staged);
        remove_created_dirs(parent, anchor);
        return Err(ConvertError::Io(e.to_string()));
    }
    Ok(())
}

// Remove the empty directories between `dir` and `anchor` (exclusive)
fn remove_created_dirs(dir: &Path, anchor: &Path) {
    for dir in dir.ancestors() {
        if dir == anchor || fs::remove_dir(dir).is_err() {
            break;
        }
    }
}
