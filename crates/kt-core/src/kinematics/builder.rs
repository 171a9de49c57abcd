//! Breadth-first construction of body trees from base links

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

use crate::assembly::{Assembly, AssemblyError, Joint, JointGraph};
use crate::export::ConvertOptions;
use crate::part::Part;
use crate::transform::{TranslationMode, relativize};

use super::tree::{BodyId, JointRecord, KinematicTree, MovableJoint};
use super::ConvertError;

/// Traversal state shared by every base link of one conversion.
///
/// All base links are marked visited up front, so a part or joint reachable
/// from two base links is claimed by one tree only and the bridging joint is
/// left for the cut-joint check.
pub struct KinematicTreeBuilder<'a> {
    assembly: &'a Assembly,
    graph: &'a JointGraph,
    options: &'a ConvertOptions,
    tree: KinematicTree,
    visited_links: HashSet<Uuid>,
    visited_joints: HashSet<Uuid>,
}

impl<'a> KinematicTreeBuilder<'a> {
    pub fn new(
        assembly: &'a Assembly,
        graph: &'a JointGraph,
        options: &'a ConvertOptions,
        base_links: &[Uuid],
    ) -> Self {
        Self {
            assembly,
            graph,
            options,
            tree: KinematicTree::new(),
            visited_links: base_links.iter().copied().collect(),
            visited_joints: HashSet::new(),
        }
    }

    fn part(&self, id: Uuid) -> Result<&'a Part, ConvertError> {
        Ok(self
            .assembly
            .parts
            .get(&id)
            .ok_or(AssemblyError::PartNotFound(id))?)
    }

    fn joint(&self, id: Uuid) -> Result<&'a Joint, ConvertError> {
        Ok(self
            .assembly
            .joints
            .get(&id)
            .ok_or(AssemblyError::JointNotFound(id))?)
    }

    /// Grow the tree rooted at `base_id`; returns the root body
    pub fn build_from(&mut self, base_id: Uuid) -> Result<BodyId, ConvertError> {
        let base = self.part(base_id)?;
        tracing::debug!(
            "Base link '{}' at {:?} / {:?} (absolute)",
            base.name,
            base.transform.position(),
            base.transform.quat_wxyz()
        );
        let root = self.tree.add_root(&base.name, base_id, base.transform);
        self.visited_links.insert(base_id);

        let mut queue = VecDeque::from([(root, base_id)]);
        while let Some((parent_body, parent_id)) = queue.pop_front() {
            let edges: Vec<(Uuid, Uuid)> = self.graph.neighbors(parent_id).collect();
            for (joint_id, neighbor_id) in edges {
                if self.visited_links.contains(&neighbor_id) {
                    continue;
                }
                let joint = self.joint(joint_id)?;
                let neighbor = self.part(neighbor_id)?;

                // WorldDelta measures from the popped part, ParentFrame from
                // the part that defines the body frame.
                let frame_id = match self.options.translation_mode {
                    TranslationMode::WorldDelta => parent_id,
                    TranslationMode::ParentFrame => self.tree.body(parent_body).part_id,
                };
                let frame = self.part(frame_id)?;
                let rel = relativize(
                    &frame.transform,
                    &neighbor.transform,
                    self.options.translation_mode,
                );
                tracing::debug!(
                    "'{}' via '{}' ({}): relative pos {:?}, quat {:?}",
                    neighbor.name,
                    joint.name,
                    joint.joint_type,
                    rel.position(),
                    rel.quat_wxyz()
                );

                match MovableJoint::from_joint_type(joint.joint_type) {
                    None => {
                        self.tree.attach_geom(parent_body, neighbor_id, rel);
                        queue.push_back((parent_body, neighbor_id));
                    }
                    Some(kind) => {
                        if !self.options.supports(kind) {
                            return Err(ConvertError::UnsupportedJointType {
                                joint: joint.name.clone(),
                                joint_type: joint.joint_type,
                            });
                        }
                        let record = JointRecord {
                            joint_id,
                            name: joint.name.clone(),
                            kind,
                            origin: neighbor.transform.to_local_point(joint.origin),
                            axis: neighbor
                                .transform
                                .to_local_vector(joint.axis)
                                .normalize_or_zero(),
                            friction: joint.friction,
                        };
                        let child =
                            self.tree
                                .add_child(parent_body, &neighbor.name, neighbor_id, rel, record);
                        queue.push_back((child, neighbor_id));
                    }
                }

                self.visited_links.insert(neighbor_id);
                self.visited_joints.insert(joint_id);
            }
        }

        Ok(root)
    }

    /// Finish traversal, returning the tree and the set of consumed joints
    pub fn finish(self) -> (KinematicTree, HashSet<Uuid>) {
        for part in self.assembly.parts.values() {
            if !self.visited_links.contains(&part.id) {
                tracing::debug!("Part '{}' is not reachable from any base link", part.name);
            }
        }
        (self.tree, self.visited_joints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::Label;
    use crate::kinematics::{BodyJoint, build_kinematic_tree};
    use crate::transform::Transform;
    use glam::{DQuat, DVec3};

    fn labeled(assembly: &mut Assembly, name: &str, transform: Transform) -> Uuid {
        let root = match assembly.labels.values().find(|l| l.parent.is_none()) {
            Some(label) => label.id,
            None => assembly.add_label(Label::new("robot", None)),
        };
        assembly.add_labeled_part(Part::new(name).with_transform(transform), Some(root))
    }

    fn at(x: f64, y: f64, z: f64) -> Transform {
        Transform::from_translation(DVec3::new(x, y, z))
    }

    #[test]
    fn test_fixed_then_revolute_chain() {
        let mut assembly = Assembly::new();
        let a = labeled(&mut assembly, "base", at(0.0, 0.0, 0.0));
        let b = labeled(&mut assembly, "bracket", at(1.0, 0.0, 0.0));
        let c = labeled(&mut assembly, "arm", at(1.0, 2.0, 0.0));
        assembly
            .add_joint(Joint::fixed("base to bracket", a, b, DVec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        assembly
            .add_joint(Joint::revolute(
                "bracket to arm",
                b,
                c,
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::Z,
            ))
            .unwrap();

        let tree = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap();
        assert_eq!(tree.len(), 2);

        let root = tree.body(tree.roots()[0]);
        assert_eq!(root.name, "base");
        assert!(matches!(root.joint, BodyJoint::Free));
        assert_eq!(root.geoms.len(), 2);
        assert_eq!(root.geoms[1].part_id, b);
        assert_eq!(root.geoms[1].pose.unwrap().position(), [1.0, 0.0, 0.0]);

        let arm = tree.body(tree.find_body("arm").unwrap());
        assert_eq!(arm.parent, Some(tree.roots()[0]));
        // Measured from the merged bracket, not from the base
        assert_eq!(arm.pose.position(), [0.0, 2.0, 0.0]);
        match &arm.joint {
            BodyJoint::Joint(record) => {
                assert_eq!(record.kind, MovableJoint::Revolute);
                assert!((record.origin - DVec3::new(0.0, -1.0, 0.0)).length() < 1e-12);
                assert!((record.axis - DVec3::Z).length() < 1e-12);
            }
            BodyJoint::Free => panic!("arm should hang from a revolute joint"),
        }
    }

    #[test]
    fn test_parent_frame_mode_measures_from_body_frame() {
        let mut assembly = Assembly::new();
        let a = labeled(&mut assembly, "base", at(0.0, 0.0, 0.0));
        let b = labeled(&mut assembly, "bracket", at(1.0, 0.0, 0.0));
        let c = labeled(&mut assembly, "arm", at(1.0, 2.0, 0.0));
        assembly.add_joint(Joint::fixed("ab", a, b, DVec3::ZERO)).unwrap();
        assembly
            .add_joint(Joint::revolute("bc", b, c, DVec3::ZERO, DVec3::Z))
            .unwrap();

        let options = ConvertOptions {
            translation_mode: TranslationMode::ParentFrame,
            ..ConvertOptions::default()
        };
        let tree = build_kinematic_tree(&assembly, &options).unwrap();
        let arm = tree.body(tree.find_body("arm").unwrap());
        assert_eq!(arm.pose.position(), [1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_joint_frame_follows_child_rotation() {
        let mut assembly = Assembly::new();
        let a = labeled(&mut assembly, "base", Transform::IDENTITY);
        let rotated = Transform::new(
            DVec3::new(0.0, 0.0, 1.0),
            DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
        );
        let c = labeled(&mut assembly, "turret", rotated);
        assembly
            .add_joint(Joint::revolute("yaw", a, c, DVec3::new(0.0, 1.0, 1.0), DVec3::Y))
            .unwrap();

        let tree = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap();
        let turret = tree.body(tree.find_body("turret").unwrap());
        let BodyJoint::Joint(record) = &turret.joint else {
            panic!("expected joint");
        };
        assert!((record.origin - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
        assert!((record.axis - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_each_part_visited_once() {
        // Star around the base plus a fixed tail: every part appears exactly once
        let mut assembly = Assembly::new();
        let base = labeled(&mut assembly, "base", Transform::IDENTITY);
        let mut expected_bodies = 1;
        for i in 0..4 {
            let leg = labeled(&mut assembly, &format!("leg{i}"), at(i as f64, 0.0, 0.0));
            assembly
                .add_joint(Joint::revolute(format!("hip{i}"), base, leg, DVec3::ZERO, DVec3::X))
                .unwrap();
            let foot = labeled(&mut assembly, &format!("foot{i}"), at(i as f64, 0.0, -1.0));
            assembly
                .add_joint(Joint::fixed(format!("ankle{i}"), leg, foot, DVec3::ZERO))
                .unwrap();
            expected_bodies += 1;
        }

        let tree = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap();
        assert_eq!(tree.len(), expected_bodies);
        let mut seen = HashSet::new();
        for body in tree.bodies() {
            for geom in &body.geoms {
                assert!(seen.insert(geom.part_id), "part referenced twice");
            }
        }
        assert_eq!(seen.len(), assembly.parts.len());
    }

    #[test]
    fn test_prismatic_rejected_unless_allowed() {
        let mut assembly = Assembly::new();
        let a = labeled(&mut assembly, "base", Transform::IDENTITY);
        let b = labeled(&mut assembly, "slider", at(0.0, 0.0, 1.0));
        let c = labeled(&mut assembly, "arm", at(0.0, 1.0, 0.0));
        assembly
            .add_joint(Joint::revolute("ok", a, c, DVec3::ZERO, DVec3::Z))
            .unwrap();
        assembly
            .add_joint(
                Joint::builder("rail", a, b)
                    .prismatic()
                    .axis(DVec3::Z)
                    .build(),
            )
            .unwrap();

        let err = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedJointType { ref joint, joint_type: crate::part::JointType::Prismatic }
                if joint == "rail"
        ));

        let options = ConvertOptions {
            allow_prismatic: true,
            ..ConvertOptions::default()
        };
        let tree = build_kinematic_tree(&assembly, &options).unwrap();
        let slider = tree.body(tree.find_body("slider").unwrap());
        let BodyJoint::Joint(record) = &slider.joint else {
            panic!("expected joint");
        };
        assert_eq!(record.kind, MovableJoint::Prismatic);
    }

    #[test]
    fn test_two_base_links_make_two_trees() {
        let mut assembly = Assembly::new();
        let b1 = labeled(&mut assembly, "base_left", Transform::IDENTITY);
        let b2 = labeled(&mut assembly, "base_right", at(5.0, 0.0, 0.0));
        let w1 = labeled(&mut assembly, "wheel_left", at(0.0, 1.0, 0.0));
        let w2 = labeled(&mut assembly, "wheel_right", at(5.0, 1.0, 0.0));
        assembly
            .add_joint(Joint::revolute("axle_left", b1, w1, DVec3::ZERO, DVec3::Y))
            .unwrap();
        assembly
            .add_joint(Joint::revolute("axle_right", b2, w2, DVec3::ZERO, DVec3::Y))
            .unwrap();

        let tree = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap();
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.body(tree.roots()[0]).name, "base_left");
        assert_eq!(tree.body(tree.roots()[1]).name, "base_right");
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_joint_bridging_two_trees_is_cut() {
        let mut assembly = Assembly::new();
        let b1 = labeled(&mut assembly, "base_a", Transform::IDENTITY);
        let b2 = labeled(&mut assembly, "base_b", at(1.0, 0.0, 0.0));
        let bridge = Joint::revolute("bridge", b1, b2, DVec3::ZERO, DVec3::Z);
        assembly.add_joint(bridge).unwrap();

        let err = build_kinematic_tree(&assembly, &ConvertOptions::default()).unwrap_err();
        match err {
            ConvertError::CutJointsDetected(names) => assert_eq!(names, vec!["bridge"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_joint_missing_from_assembly_is_reported() {
        let mut assembly = Assembly::new();
        let base = labeled(&mut assembly, "base", Transform::IDENTITY);
        let arm = labeled(&mut assembly, "arm", at(1.0, 0.0, 0.0));
        // Graph built from a joint the assembly does not own
        let stray = Joint::revolute("stray", base, arm, DVec3::ZERO, DVec3::Z);
        let graph = JointGraph::build([&stray]);
        let options = ConvertOptions::default();

        let mut builder = KinematicTreeBuilder::new(&assembly, &graph, &options, &[base]);
        match builder.build_from(base) {
            Err(ConvertError::Assembly(msg)) => {
                assert_eq!(msg, AssemblyError::JointNotFound(stray.id).to_string());
            }
            other => panic!("expected missing joint, got {other:?}"),
        }
    }
}
