//! Undirected joint multigraph over parts

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use super::Joint;

/// Adjacency: part -> {(joint, neighbor part)}
///
/// Every joint is inserted once in each direction. Parallel joints between the
/// same two parts stay separate edges. Neighbor sets are ordered by joint id so
/// traversal order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct JointGraph {
    adjacency: HashMap<Uuid, BTreeSet<(Uuid, Uuid)>>,
}

impl JointGraph {
    /// Build the graph from a set of joints
    pub fn build<'a>(joints: impl IntoIterator<Item = &'a Joint>) -> Self {
        let mut adjacency: HashMap<Uuid, BTreeSet<(Uuid, Uuid)>> = HashMap::new();
        for joint in joints {
            adjacency
                .entry(joint.parent_part)
                .or_default()
                .insert((joint.id, joint.child_part));
            adjacency
                .entry(joint.child_part)
                .or_default()
                .insert((joint.id, joint.parent_part));
        }
        Self { adjacency }
    }

    /// Edges incident to `part_id` as (joint id, neighbor id), ordered by joint id
    pub fn neighbors(&self, part_id: Uuid) -> impl Iterator<Item = (Uuid, Uuid)> + '_ {
        self.adjacency
            .get(&part_id)
            .into_iter()
            .flat_map(|edges| edges.iter().copied())
    }

    /// Number of joint endpoints at `part_id`
    pub fn degree(&self, part_id: Uuid) -> usize {
        self.adjacency.get(&part_id).map_or(0, |edges| edges.len())
    }

    /// Number of parts touched by at least one joint
    pub fn part_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of distinct joints
    pub fn joint_count(&self) -> usize {
        self.adjacency.values().map(|edges| edges.len()).sum::<usize>() / 2
    }
}
