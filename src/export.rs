//! JSON export of the tree structure for display and debugging.
//!
//! The snapshot nests each subtree under the routing entry that owns it,
//! mirroring the logical tree rather than the node arena. It is a view, not
//! a storage format: there is no loader.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{EntryKind, NodeId};
use crate::tree::MTree;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub max_entries: usize,
    pub dimension: Option<usize>,
    pub object_count: usize,
    pub height: u32,
    pub root: NodeSnapshot,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub is_leaf: bool,
    pub level: u32,
    pub entries: Vec<EntrySnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub object: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cover_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtree: Option<Box<NodeSnapshot>>,
}

impl NodeSnapshot {
    /// Ids of every data entry at or below this node, in tree order.
    pub fn object_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        for entry in &self.entries {
            if let Some(id) = &entry.id {
                ids.push(id.as_str());
            }
            if let Some(subtree) = &entry.subtree {
                subtree.collect_ids(ids);
            }
        }
    }

    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .entries
            .iter()
            .filter_map(|e| e.subtree.as_ref())
            .map(|s| s.node_count())
            .sum::<usize>()
    }
}

impl<M, R> MTree<M, R> {
    /// Capture the current structure.
    pub fn snapshot(&self) -> Result<TreeSnapshot> {
        Ok(TreeSnapshot {
            max_entries: self.config.max_entries,
            dimension: self.dimension,
            object_count: self.object_count,
            height: self.height(),
            root: self.snapshot_node(self.root)?,
        })
    }

    fn snapshot_node(&self, node_id: NodeId) -> Result<NodeSnapshot> {
        let node = self.node_ref(node_id)?;
        let mut entries = Vec::with_capacity(node.len());
        for entry in &node.entries {
            let snapshot = match &entry.kind {
                EntryKind::Data { id } => EntrySnapshot {
                    id: Some(id.clone()),
                    object: entry.object.clone(),
                    cover_radius: None,
                    parent_distance: entry.parent_distance,
                    subtree: None,
                },
                EntryKind::Routing {
                    subtree,
                    cover_radius,
                } => {
                    if *subtree == node_id {
                        return Err(Error::InvariantViolation(format!(
                            "node {} owns itself",
                            node_id
                        )));
                    }
                    EntrySnapshot {
                        id: None,
                        object: entry.object.clone(),
                        cover_radius: Some(*cover_radius),
                        parent_distance: entry.parent_distance,
                        subtree: Some(Box::new(self.snapshot_node(*subtree)?)),
                    }
                }
            };
            entries.push(snapshot);
        }
        Ok(NodeSnapshot {
            is_leaf: node.is_leaf(),
            level: node.level,
            entries,
        })
    }

    /// Compact JSON rendering of [`MTree::snapshot`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot()?)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MTreeConfig;
    use crate::tree::MTree;

    #[test]
    fn test_snapshot_lists_every_object_once() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(3), 6).unwrap();
        for i in 0..40 {
            let x = i as f32;
            tree.insert(vec![x, (x * 0.7).sin() * 10.0], format!("obj-{}", i))
                .unwrap();
        }
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.object_count, 40);
        assert_eq!(snapshot.height, tree.height());
        assert_eq!(snapshot.root.node_count(), tree.stats().node_count);

        let mut ids = snapshot.root.object_ids();
        ids.sort_unstable();
        let mut expected: Vec<String> = (0..40).map(|i| format!("obj-{}", i)).collect();
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_json_shape() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(2), 1).unwrap();
        tree.insert(vec![0.0, 0.0], "a").unwrap();
        let json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
        assert_eq!(json["root"]["is_leaf"], true);
        assert_eq!(json["root"]["entries"][0]["id"], "a");
        assert!(json["root"]["entries"][0].get("cover_radius").is_none());

        tree.insert(vec![1.0, 0.0], "b").unwrap();
        tree.insert(vec![9.0, 9.0], "c").unwrap();
        let json: serde_json::Value = serde_json::from_str(&tree.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["root"]["is_leaf"], false);
        assert!(json["root"]["entries"][0]["cover_radius"].is_number());
        assert!(json["root"]["entries"][0]["subtree"]["entries"].is_array());
    }
}
