//! Cut-joint detection

use std::collections::HashSet;

use uuid::Uuid;

use crate::assembly::Assembly;

use super::ConvertError;

/// Fail if any joint of `assembly` was not consumed by traversal.
///
/// An unconsumed joint closes a loop (or bridges two trees); every offending
/// joint name is reported, sorted.
pub fn check_cut_joints(
    assembly: &Assembly,
    visited_joints: &HashSet<Uuid>,
) -> Result<(), ConvertError> {
    let mut cut: Vec<String> = assembly
        .joints
        .values()
        .filter(|joint| !visited_joints.contains(&joint.id))
        .map(|joint| joint.name.clone())
        .collect();

    if cut.is_empty() {
        return Ok(());
    }
    cut.sort();
    Err(ConvertError::CutJointsDetected(cut))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{Joint, Label};
    use crate::export::ConvertOptions;
    use crate::kinematics::{KinematicTreeBuilder, build_kinematic_tree};
    use crate::assembly::JointGraph;
    use crate::part::Part;
    use glam::DVec3;

    fn triangle() -> (Assembly, [Uuid; 3], [Uuid; 3]) {
        let mut assembly = Assembly::new();
        let root = assembly.add_label(Label::new("robot", None));
        let a = assembly.add_labeled_part(Part::new("base"), Some(root));
        let b = assembly.add_labeled_part(Part::new("b"), Some(root));
        let c = assembly.add_labeled_part(Part::new("c"), Some(root));
        let ab = assembly
            .add_joint(Joint::revolute("ab", a, b, DVec3::ZERO, DVec3::Z))
            .unwrap();
        let bc = assembly
            .add_joint(Joint::revolute("bc", b, c, DVec3::ZERO, DVec3::Z))
            .unwrap();
        let ca = assembly
            .add_joint(Joint::revolute("ca", c, a, DVec3::ZERO, DVec3::Z))
            .unwrap();
        (assembly, [a, b, c], [ab, bc, ca])
    }

    #[test]
    fn test_cycle_reports_exactly_the_unvisited_joint() {
        let (assembly, [a, ..], _) = triangle();
        let graph = JointGraph::build(assembly.joints.values());
        let options = ConvertOptions::default();
        let mut builder = KinematicTreeBuilder::new(&assembly, &graph, &options, &[a]);
        builder.build_from(a).unwrap();
        let (tree, visited) = builder.finish();

        assert_eq!(tree.len(), 3);
        assert_eq!(visited.len(), 2);
        let unvisited: Vec<&Joint> = assembly
            .joints
            .values()
            .filter(|j| !visited.contains(&j.id))
            .collect();
        assert_eq!(unvisited.len(), 1);

        match check_cut_joints(&assembly, &visited) {
            Err(ConvertError::CutJointsDetected(names)) => {
                assert_eq!(names, vec![unvisited[0].name.clone()]);
            }
            other => panic!("expected cut joints, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_aborts_conversion() {
        let (assembly, _, _) = triangle();
        assert!(matches!(
            build_kinematic_tree(&assembly, &ConvertOptions::default()),
            Err(ConvertError::CutJointsDetected(ref names)) if names.len() == 1
        ));
    }

    #[test]
    fn test_all_visited_is_ok() {
        let (assembly, _, joints) = triangle();
        let visited: HashSet<Uuid> = joints.into_iter().collect();
        assert!(check_cut_joints(&assembly, &visited).is_ok());
    }
}
