//! Kinetree Core
//!
//! Converts a jointed CAD assembly into a physics-engine-ready kinematic tree:
//! - Part / Joint / Label: the annotated assembly data model
//! - Transform: rigid-body transform algebra
//! - JointGraph: undirected multigraph over parts
//! - KinematicTree: rooted body tree with fixed joints merged
//! - MJCF export: bodies, joints, meshes and actuators written to disk
//! - Project: serializable annotation file

pub mod assembly;
pub mod constants;
pub mod export;
pub mod kinematics;
pub mod mesh;
pub mod part;
pub mod project;
pub mod transform;

pub use assembly::*;
pub use constants::*;
pub use export::*;
pub use kinematics::*;
pub use mesh::*;
pub use part::*;
pub use project::*;
pub use transform::*;
