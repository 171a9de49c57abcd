//! Body tree produced by the kinematic tree builder

use std::fmt::Write as _;

use glam::DVec3;
use serde::Serialize;
use uuid::Uuid;

use crate::part::JointType;
use crate::transform::Transform;

/// Index of a body in its [`KinematicTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId(pub usize);

/// Movable joint kinds a body can hang from. Fixed joints never reach the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MovableJoint {
    Revolute,
    Prismatic,
}

impl MovableJoint {
    /// Map an authored joint type; `None` for fixed joints
    pub fn from_joint_type(joint_type: JointType) -> Option<Self> {
        match joint_type {
            JointType::Fixed => None,
            JointType::Revolute => Some(MovableJoint::Revolute),
            JointType::Prismatic => Some(MovableJoint::Prismatic),
        }
    }

    /// MJCF joint type attribute
    pub fn mjcf_type(&self) -> &'static str {
        match self {
            MovableJoint::Revolute => "hinge",
            MovableJoint::Prismatic => "slide",
        }
    }
}

/// Joint to the parent body, expressed in the body's own frame
#[derive(Debug, Clone, Serialize)]
pub struct JointRecord {
    pub joint_id: Uuid,
    pub name: String,
    pub kind: MovableJoint,
    /// Origin in the body frame
    pub origin: DVec3,
    /// Unit axis in the body frame
    pub axis: DVec3,
    pub friction: f64,
}

/// How a body is attached to its parent
#[derive(Debug, Clone, Serialize)]
pub enum BodyJoint {
    /// Six-DOF free joint to the world (tree roots)
    Free,
    /// Movable joint to the parent body
    Joint(JointRecord),
}

/// Geometry attached to a body
#[derive(Debug, Clone, Serialize)]
pub struct GeomRef {
    /// Part providing the geometry
    pub part_id: Uuid,
    /// Pose within the body (None for the body's own part)
    pub pose: Option<Transform>,
}

/// A rigid body of the output model
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    pub name: String,
    /// Part whose frame is the body frame
    pub part_id: Uuid,
    pub parent: Option<BodyId>,
    pub children: Vec<BodyId>,
    /// Pose relative to the parent body (or world for roots)
    pub pose: Transform,
    pub joint: BodyJoint,
    pub geoms: Vec<GeomRef>,
}

/// Arena of bodies forming one tree per base link
#[derive(Debug, Clone, Default, Serialize)]
pub struct KinematicTree {
    bodies: Vec<Body>,
    roots: Vec<BodyId>,
}

impl KinematicTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root body attached to the world by a free joint
    pub fn add_root(&mut self, name: impl Into<String>, part_id: Uuid, pose: Transform) -> BodyId {
        let id = self.push(Body {
            name: name.into(),
            part_id,
            parent: None,
            children: Vec::new(),
            pose,
            joint: BodyJoint::Free,
            geoms: vec![GeomRef {
                part_id,
                pose: None,
            }],
        });
        self.roots.push(id);
        id
    }

    /// Add a child body hanging from `parent` by `joint`
    pub fn add_child(
        &mut self,
        parent: BodyId,
        name: impl Into<String>,
        part_id: Uuid,
        pose: Transform,
        joint: JointRecord,
    ) -> BodyId {
        let id = self.push(Body {
            name: name.into(),
            part_id,
            parent: Some(parent),
            children: Vec::new(),
            pose,
            joint: BodyJoint::Joint(joint),
            geoms: vec![GeomRef {
                part_id,
                pose: None,
            }],
        });
        self.bodies[parent.0].children.push(id);
        id
    }

    /// Merge a rigidly attached part's geometry into `body`
    pub fn attach_geom(&mut self, body: BodyId, part_id: Uuid, pose: Transform) {
        self.bodies[body.0].geoms.push(GeomRef {
            part_id,
            pose: Some(pose),
        });
    }

    fn push(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.bodies.len());
        self.bodies.push(body);
        id
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn roots(&self) -> &[BodyId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Find a body by name
    pub fn find_body(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name == name).map(BodyId)
    }

    /// Bodies of the tree rooted at `root`, parent before children
    pub fn depth_first(&self, root: BodyId) -> Vec<BodyId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            // Reverse so the first child is visited first
            stack.extend(self.bodies[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Indented text outline of every tree
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.outline_recursive(&mut out, root, 0);
        }
        out
    }

    fn outline_recursive(&self, out: &mut String, id: BodyId, depth: usize) {
        let body = &self.bodies[id.0];
        let joint = match &body.joint {
            BodyJoint::Free => "free".to_string(),
            BodyJoint::Joint(record) => {
                format!("{} '{}'", record.kind.mjcf_type(), record.name)
            }
        };
        let _ = writeln!(
            out,
            "{}{} [{}] ({} geom{})",
            "  ".repeat(depth),
            body.name,
            joint,
            body.geoms.len(),
            if body.geoms.len() == 1 { "" } else { "s" }
        );
        for &child in &body.children {
            self.outline_recursive(out, child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> JointRecord {
        JointRecord {
            joint_id: Uuid::new_v4(),
            name: name.to_string(),
            kind: MovableJoint::Revolute,
            origin: DVec3::ZERO,
            axis: DVec3::Z,
            friction: 0.0,
        }
    }

    #[test]
    fn test_depth_first_order() {
        let mut tree = KinematicTree::new();
        let root = tree.add_root("root", Uuid::new_v4(), Transform::IDENTITY);
        let a = tree.add_child(root, "a", Uuid::new_v4(), Transform::IDENTITY, record("ra"));
        let b = tree.add_child(root, "b", Uuid::new_v4(), Transform::IDENTITY, record("rb"));
        let a1 = tree.add_child(a, "a1", Uuid::new_v4(), Transform::IDENTITY, record("ra1"));

        assert_eq!(tree.depth_first(root), vec![root, a, a1, b]);
        assert_eq!(tree.body(a1).parent, Some(a));
        assert_eq!(tree.find_body("b"), Some(b));
    }

    #[test]
    fn test_attach_geom_keeps_body_count() {
        let mut tree = KinematicTree::new();
        let root = tree.add_root("root", Uuid::new_v4(), Transform::IDENTITY);
        tree.attach_geom(root, Uuid::new_v4(), Transform::IDENTITY);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.body(root).geoms.len(), 2);
        assert!(tree.body(root).geoms[0].pose.is_none());
        assert!(tree.body(root).geoms[1].pose.is_some());
    }

    #[test]
    fn test_outline() {
        let mut tree = KinematicTree::new();
        let root = tree.add_root("base", Uuid::new_v4(), Transform::IDENTITY);
        tree.add_child(root, "arm", Uuid::new_v4(), Transform::IDENTITY, record("shoulder"));
        assert_eq!(
            tree.outline(),
            "base [free] (1 geom)\n  arm [hinge 'shoulder'] (1 geom)\n"
        );
    }
}
