//! Joint types and builder for CAD assemblies

use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::part::JointType;

/// A user-authored joint connecting two parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joint {
    pub id: Uuid,
    pub name: String,
    pub joint_type: JointType,
    /// Parent part ID (authored side, not a DOF direction)
    pub parent_part: Uuid,
    /// Child part ID
    pub child_part: Uuid,
    /// Joint origin in the world frame
    pub origin: DVec3,
    /// Joint axis in the world frame (ignored for fixed joints)
    pub axis: DVec3,
    /// Friction coefficient
    #[serde(default)]
    pub friction: f64,
}

impl Joint {
    /// Create a new fixed joint
    pub fn fixed(name: impl Into<String>, parent: Uuid, child: Uuid, origin: DVec3) -> Self {
        Self::builder(name, parent, child).origin(origin).build()
    }

    /// Create a new revolute joint
    pub fn revolute(
        name: impl Into<String>,
        parent: Uuid,
        child: Uuid,
        origin: DVec3,
        axis: DVec3,
    ) -> Self {
        Self::builder(name, parent, child)
            .revolute()
            .origin(origin)
            .axis(axis)
            .build()
    }

    /// Create a builder for constructing joints with fluent API
    pub fn builder(name: impl Into<String>, parent: Uuid, child: Uuid) -> JointBuilder {
        JointBuilder::new(name, parent, child)
    }

    /// The part on the other side of this joint, if `part_id` is one of its ends
    pub fn other_end(&self, part_id: Uuid) -> Option<Uuid> {
        if part_id == self.parent_part {
            Some(self.child_part)
        } else if part_id == self.child_part {
            Some(self.parent_part)
        } else {
            None
        }
    }
}

/// Builder for creating joints with fluent API
#[derive(Debug, Clone)]
pub struct JointBuilder {
    name: String,
    joint_type: JointType,
    parent_part: Uuid,
    child_part: Uuid,
    origin: DVec3,
    axis: DVec3,
    friction: f64,
}

impl JointBuilder {
    /// Create a new joint builder (fixed, at the origin, axis +Z)
    pub fn new(name: impl Into<String>, parent: Uuid, child: Uuid) -> Self {
        Self {
            name: name.into(),
            joint_type: JointType::Fixed,
            parent_part: parent,
            child_part: child,
            origin: DVec3::ZERO,
            axis: DVec3::Z,
            friction: 0.0,
        }
    }

    /// Set the joint type
    pub fn joint_type(mut self, joint_type: JointType) -> Self {
        self.joint_type = joint_type;
        self
    }

    /// Set as a fixed joint
    pub fn fixed(mut self) -> Self {
        self.joint_type = JointType::Fixed;
        self
    }

    /// Set as a revolute joint
    pub fn revolute(mut self) -> Self {
        self.joint_type = JointType::Revolute;
        self
    }

    /// Set as a prismatic joint
    pub fn prismatic(mut self) -> Self {
        self.joint_type = JointType::Prismatic;
        self
    }

    /// Set the world-frame joint origin
    pub fn origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// Set the world-frame joint axis (normalized; a zero axis keeps +Z)
    pub fn axis(mut self, axis: DVec3) -> Self {
        self.axis = axis.try_normalize().unwrap_or(DVec3::Z);
        self
    }

    /// Set the friction coefficient
    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Build the joint
    pub fn build(self) -> Joint {
        Joint {
            id: Uuid::new_v4(),
            name: self.name,
            joint_type: self.joint_type,
            parent_part: self.parent_part,
            child_part: self.child_part,
            origin: self.origin,
            axis: self.axis,
            friction: self.friction,
        }
    }
}
