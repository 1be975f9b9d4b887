//! Pure hierarchy helpers
//!
//! Tree logic over flat position lists. Nothing here touches storage, so the
//! functions are shared by [`PositionService`](super::PositionService), the
//! tests and the benchmarks.

use crate::db::DeletionPlan;
use crate::models::{Position, PositionTreeNode, User};
use std::collections::{HashMap, HashSet};

/// Nest a flat position list into a forest
///
/// Builds a `parent_id -> children` index in one pass, then recurses from
/// the roots (positions without a parent). Sibling order follows the input
/// order. Nodes that are not reachable from a root (a loop in corrupt data,
/// or a parent missing from the input) are left out and logged.
pub fn build_hierarchy(positions: &[Position]) -> Vec<PositionTreeNode> {
    let mut children_index: HashMap<&str, Vec<&Position>> = HashMap::new();
    let mut roots = Vec::new();

    for position in positions {
        match position.parent_id.as_deref() {
            Some(parent_id) => children_index.entry(parent_id).or_default().push(position),
            None => roots.push(position),
        }
    }

    let mut visited = HashSet::with_capacity(positions.len());
    let forest: Vec<PositionTreeNode> = roots
        .into_iter()
        .filter_map(|root| build_node(root, &children_index, &mut visited))
        .collect();

    if visited.len() < positions.len() {
        tracing::warn!(
            "Hierarchy omits {} position(s) not reachable from a root",
            positions.len() - visited.len()
        );
    }

    forest
}

fn build_node<'a>(
    position: &'a Position,
    children_index: &HashMap<&str, Vec<&'a Position>>,
    visited: &mut HashSet<&'a str>,
) -> Option<PositionTreeNode> {
    if !visited.insert(position.id.as_str()) {
        tracing::warn!("Position {} revisited while building hierarchy; skipping", position.id);
        return None;
    }

    let children = children_index
        .get(position.id.as_str())
        .map(|children| {
            children
                .iter()
                .copied()
                .filter_map(|child| build_node(child, children_index, visited))
                .collect()
        })
        .unwrap_or_default();

    Some(PositionTreeNode {
        id: position.id.clone(),
        name: position.name.clone(),
        description: position.description.clone(),
        children,
    })
}

/// Whether making `new_parent_id` the parent of `position_id` would close a loop
///
/// True when `new_parent_id` is `position_id` itself or one of its
/// descendants. Walks up the ancestor chain of `new_parent_id`; a loop
/// already present in the data stops the walk.
pub fn would_create_cycle(positions: &[Position], position_id: &str, new_parent_id: &str) -> bool {
    let parents: HashMap<&str, Option<&str>> = positions
        .iter()
        .map(|p| (p.id.as_str(), p.parent_id.as_deref()))
        .collect();

    let mut seen = HashSet::new();
    let mut current = Some(new_parent_id);
    while let Some(id) = current {
        if id == position_id {
            return true;
        }
        if !seen.insert(id) {
            return false;
        }
        current = parents.get(id).copied().flatten();
    }
    false
}

/// Decide everything a position deletion must do
///
/// Children move to the target's parent (roots when the target is a root).
/// Every user assigned to the target is deleted along with the photo it owns.
pub fn plan_deletion(target: &Position, children: &[Position], users: &[User]) -> DeletionPlan {
    DeletionPlan {
        target_id: target.id.clone(),
        new_parent_id: target.parent_id.clone(),
        child_ids: children.iter().map(|c| c.id.clone()).collect(),
        user_ids: users.iter().map(|u| u.id.clone()).collect(),
        photo_ids: users.iter().filter_map(|u| u.photo_id).collect(),
    }
}
