//! Annotated CAD assembly (parts, joints, labels)

mod graph;
mod joint;
mod labels;

use std::collections::HashMap;

use uuid::Uuid;

use crate::part::Part;

pub use graph::JointGraph;
pub use joint::{Joint, JointBuilder};
pub use labels::{BaseLinkPattern, Label, locate_base_links, root_assembly};

/// Read-only snapshot of an annotated assembly.
///
/// Parts, joints and labels live in flat maps keyed by id; everything downstream
/// refers to them by id only.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// All parts
    pub parts: HashMap<Uuid, Part>,
    /// All joints
    pub joints: HashMap<Uuid, Joint>,
    /// Assembly hierarchy labels (part labels share the part's id)
    pub labels: HashMap<Uuid, Label>,
}

impl Assembly {
    /// Create a new empty assembly
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part, returns its ID
    pub fn add_part(&mut self, part: Part) -> Uuid {
        let id = part.id;
        self.parts.insert(id, part);
        id
    }

    /// Add a label, returns its ID
    pub fn add_label(&mut self, label: Label) -> Uuid {
        let id = label.id;
        self.labels.insert(id, label);
        id
    }

    /// Add a part together with a label naming it
    pub fn add_labeled_part(&mut self, part: Part, parent_label: Option<Uuid>) -> Uuid {
        self.add_label(Label::for_part(&part, parent_label));
        self.add_part(part)
    }

    /// Add a joint between two existing parts
    pub fn add_joint(&mut self, joint: Joint) -> Result<Uuid, AssemblyError> {
        for end in [joint.parent_part, joint.child_part] {
            if !self.parts.contains_key(&end) {
                return Err(AssemblyError::InvalidJointReference(joint.id, end));
            }
        }
        if joint.parent_part == joint.child_part {
            return Err(AssemblyError::SelfConnectedJoint(joint.id));
        }
        let id = joint.id;
        self.joints.insert(id, joint);
        Ok(id)
    }

    /// Start a joint between two existing parts, named "<parent> to <child>"
    pub fn joint_between(&self, parent: Uuid, child: Uuid) -> Result<JointBuilder, AssemblyError> {
        let parent_name = self
            .get_part_name(parent)
            .ok_or(AssemblyError::PartNotFound(parent))?;
        let child_name = self
            .get_part_name(child)
            .ok_or(AssemblyError::PartNotFound(child))?;
        Ok(Joint::builder(
            format!("{parent_name} to {child_name}"),
            parent,
            child,
        ))
    }

    /// Get a part's name by ID
    pub fn get_part_name(&self, part_id: Uuid) -> Option<&str> {
        self.parts.get(&part_id).map(|p| p.name.as_str())
    }

    /// Find a part by name
    pub fn find_part_by_name(&self, name: &str) -> Option<&Part> {
        self.parts.values().find(|p| p.name == name)
    }

    /// Find a joint by name
    pub fn find_joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints.values().find(|j| j.name == name)
    }

    /// Validate the assembly
    pub fn validate(&self) -> Result<(), Vec<AssemblyError>> {
        let mut errors = Vec::new();

        // Check joint references
        for joint in self.joints.values() {
            if !self.parts.contains_key(&joint.parent_part) {
                errors.push(AssemblyError::InvalidJointReference(
                    joint.id,
                    joint.parent_part,
                ));
            }
            if !self.parts.contains_key(&joint.child_part) {
                errors.push(AssemblyError::InvalidJointReference(
                    joint.id,
                    joint.child_part,
                ));
            }
            if joint.parent_part == joint.child_part {
                errors.push(AssemblyError::SelfConnectedJoint(joint.id));
            }
        }

        // Check label hierarchy references
        for label in self.labels.values() {
            if let Some(parent) = label.parent
                && !self.labels.contains_key(&parent)
            {
                errors.push(AssemblyError::LabelNotFound(parent));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Assembly-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Part not found: {0}")]
    PartNotFound(Uuid),
    #[error("Joint not found: {0}")]
    JointNotFound(Uuid),
    #[error("Label not found: {0}")]
    LabelNotFound(Uuid),
    #[error("Invalid joint reference: joint {0} references non-existent part {1}")]
    InvalidJointReference(Uuid, Uuid),
    #[error("Joint {0} connects a part to itself")]
    SelfConnectedJoint(Uuid),
}
