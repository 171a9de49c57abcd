//! Assembly graph to kinematic tree conversion

mod builder;
mod tree;
mod validate;

use crate::assembly::{Assembly, AssemblyError, BaseLinkPattern, JointGraph, locate_base_links};
use crate::export::ConvertOptions;
use crate::part::JointType;

pub use builder::KinematicTreeBuilder;
pub use tree::{Body, BodyId, BodyJoint, GeomRef, JointRecord, KinematicTree, MovableJoint};
pub use validate::check_cut_joints;

/// Build and validate the kinematic tree of `assembly`.
///
/// Runs option and assembly validation, base-link selection, graph
/// construction, traversal of every base link and the cut-joint check.
/// Nothing is written to disk.
pub fn build_kinematic_tree(
    assembly: &Assembly,
    options: &ConvertOptions,
) -> Result<KinematicTree, ConvertError> {
    options.validate()?;
    assembly.validate().map_err(|errors| {
        ConvertError::Assembly(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    let pattern = BaseLinkPattern::new(&options.base_link_pattern)?;
    let base_links = locate_base_links(&assembly.labels, &pattern, &assembly.parts)?;
    tracing::info!(
        "Found {} base link(s) matching '{}'",
        base_links.len(),
        pattern.as_str()
    );

    let graph = JointGraph::build(assembly.joints.values());
    let mut builder = KinematicTreeBuilder::new(assembly, &graph, options, &base_links);
    for &base in &base_links {
        builder.build_from(base)?;
    }
    let (tree, visited_joints) = builder.finish();

    check_cut_joints(assembly, &visited_joints)?;

    tracing::info!(
        "Kinematic tree: {} bodies from {} parts, {} joints",
        tree.len(),
        assembly.parts.len(),
        assembly.joints.len()
    );
    Ok(tree)
}

/// Conversion errors. Every variant aborts the whole conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid assembly: {0}")]
    Assembly(String),
    #[error("Invalid base link pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("No base link found matching '{pattern}'")]
    NoBaseLinkFound { pattern: String },
    #[error("Expected exactly one top-level assembly label, found {count}")]
    RootAssembly { count: usize },
    #[error("Cut joints detected (closed kinematic loops are not supported): {}", .0.join(", "))]
    CutJointsDetected(Vec<String>),
    #[error("Unsupported joint type {joint_type} for joint '{joint}'")]
    UnsupportedJointType { joint: String, joint_type: JointType },
    #[error("Part '{0}' has no geometry")]
    MissingGeometry(String),
    #[error("Mesh export failed: {0}")]
    MeshExport(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<AssemblyError> for ConvertError {
    fn from(e: AssemblyError) -> Self {
        ConvertError::Assembly(e.to_string())
    }
}
