//! M-tree Node Structure
//!
//! Nodes live in an arena owned by the tree and are addressed by [`NodeId`].
//! Each node holds an ordered list of entries:
//! - Leaf nodes (level 0) hold data entries: an indexed object and its id
//! - Internal nodes hold routing entries: a routing object, the cover radius
//!   of its subtree, and the subtree's node id
//!
//! Every entry below the root caches its distance to the routing object of
//! the entry that owns its node. The owning entry is referenced as
//! (parent node, slot) rather than by pointer, so split propagation can
//! rewrite nodes in place without reference cycles.

use crate::vector::FeatureVector;

/// Index of a node in the tree's arena
pub type NodeId = usize;

/// Location of an entry: the node holding it and its slot in that node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryRef {
    pub node: NodeId,
    pub slot: usize,
}

/// What an entry points at
#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    /// Indexed object with its caller-supplied id
    Data { id: String },

    /// Routing object covering every object in `subtree` within `cover_radius`
    Routing { subtree: NodeId, cover_radius: f32 },
}

/// One slot of a node
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// The indexed object, or the routing object for routing entries
    pub object: FeatureVector,

    /// Distance to the routing object owning this entry's node.
    /// `None` for entries of the root node.
    pub parent_distance: Option<f32>,

    pub kind: EntryKind,
}

impl Entry {
    pub fn data(object: FeatureVector, id: String, parent_distance: Option<f32>) -> Self {
        Self {
            object,
            parent_distance,
            kind: EntryKind::Data { id },
        }
    }

    pub fn routing(
        object: FeatureVector,
        subtree: NodeId,
        cover_radius: f32,
        parent_distance: Option<f32>,
    ) -> Self {
        Self {
            object,
            parent_distance,
            kind: EntryKind::Routing {
                subtree,
                cover_radius,
            },
        }
    }

    /// Caller-supplied id (data entries only)
    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Data { id } => Some(id),
            EntryKind::Routing { .. } => None,
        }
    }

    /// Child node (routing entries only)
    pub fn subtree(&self) -> Option<NodeId> {
        match self.kind {
            EntryKind::Routing { subtree, .. } => Some(subtree),
            EntryKind::Data { .. } => None,
        }
    }

    /// Cover radius; zero for data entries
    pub fn cover_radius(&self) -> f32 {
        match self.kind {
            EntryKind::Routing { cover_radius, .. } => cover_radius,
            EntryKind::Data { .. } => 0.0,
        }
    }

    pub fn is_routing(&self) -> bool {
        matches!(self.kind, EntryKind::Routing { .. })
    }

    /// Farthest distance from the owning routing object that this entry
    /// (or anything under it) can lie at.
    pub fn reach(&self) -> f32 {
        self.parent_distance.unwrap_or(0.0) + self.cover_radius()
    }
}

/// M-tree node - one page of the index
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Level in tree (0 = leaf)
    pub level: u32,

    /// Ordered entries; at most `max_entries` outside a split
    pub entries: Vec<Entry>,

    /// Routing entry whose subtree this node is (None for root)
    pub owner: Option<EntryRef>,
}

impl Node {
    /// Create a new, empty leaf node
    pub fn new_leaf() -> Self {
        Self::with_entries(0, Vec::new())
    }

    /// Create a new, empty internal node
    pub fn new_internal(level: u32) -> Self {
        Self::with_entries(level, Vec::new())
    }

    pub fn with_entries(level: u32, entries: Vec<Entry>) -> Self {
        Self {
            level,
            entries,
            owner: None,
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest radius around the owning routing object that covers every
    /// object below this node, derived from cached parent distances.
    ///
    /// Leaf children contribute their parent distance, routing children
    /// their parent distance plus cover radius.
    pub fn covering_radius(&self) -> f32 {
        self.entries
            .iter()
            .map(Entry::reach)
            .fold(0.0f32, f32::max)
    }

    /// Estimate memory footprint
    pub fn memory_size(&self) -> usize {
        let base = std::mem::size_of::<Self>();
        let entries: usize = self
            .entries
            .iter()
            .map(|e| {
                let id_len = e.id().map_or(0, str::len);
                std::mem::size_of::<Entry>() + e.object.len() * 4 + id_len
            })
            .sum();
        base + entries
    }
}
