//! Scene graph container.
//!
//! The scene is a generational arena of nodes plus a root list; parent/child
//! links are plain keys into the arena, so ownership stays single and flat
//! and destroying a subtree cannot leave dangling references behind.

use glam::Affine3A;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::scene::NodeKey;
use crate::scene::node::SceneNode;

#[derive(Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeKey, SceneNode>,
    pub roots: Vec<NodeKey>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Inserts a node at the root level, registering it with its owner.
    pub fn add_node(&mut self, node: SceneNode) -> NodeKey {
        let key = self.nodes.insert(node);
        self.roots.push(key);
        self.register_owner(key);
        key
    }

    /// Inserts a node as a child of `parent`, registering it with its owner.
    pub fn add_to_parent(&mut self, node: SceneNode, parent: NodeKey) -> NodeKey {
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        if let Some(c) = self.nodes.get_mut(key) {
            c.parent = Some(parent);
        }
        self.register_owner(key);
        key
    }

    fn register_owner(&self, key: NodeKey) {
        if let Some(owner) = self.nodes.get(key).and_then(|n| n.owner.clone()) {
            owner.register(key);
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Re-parents `child` under `parent`, detaching from any old parent
    /// first.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent {
            log::warn!("cannot attach a node to itself");
            return;
        }
        if !self.nodes.contains_key(child) {
            log::warn!("child node not found during attach");
            return;
        }
        self.unlink(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        } else {
            log::error!("parent node not found during attach");
            self.roots.push(child);
            return;
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Detaches `child` from its parent without destroying it; the node
    /// becomes a root so it stays reachable.
    pub fn detach(&mut self, child: NodeKey) {
        self.unlink(child);
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.roots.push(child);
    }

    /// Removes the parent-list / root-list entry for `child`.
    fn unlink(&mut self, child: NodeKey) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(parent) = old_parent {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|&key| key != child);
            }
        } else {
            self.roots.retain(|&key| key != child);
        }
    }

    /// Destroys a node and its whole subtree, deregistering every destroyed
    /// node from its owner.
    pub fn remove(&mut self, key: NodeKey) {
        let children = match self.nodes.get(key) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove(child);
        }
        self.unlink(key);
        if let Some(node) = self.nodes.remove(key) {
            if let Some(owner) = node.owner {
                owner.deregister(key);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Depth-first exact name match over the whole scene.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.search(|node| node.name == name)
    }

    /// Depth-first substring name match.
    #[must_use]
    pub fn find_partial(&self, fragment: &str) -> Option<NodeKey> {
        self.search(|node| node.name.contains(fragment))
    }

    #[must_use]
    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<NodeKey> {
        self.search(|node| node.uuid == uuid)
    }

    fn search(&self, pred: impl Fn(&SceneNode) -> bool) -> Option<NodeKey> {
        let mut stack: Vec<NodeKey> = self.roots.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if pred(node) {
                return Some(key);
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        None
    }

    /// Pre-order flatten of the subtree under `root` (inclusive).
    #[must_use]
    pub fn collect(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            out.push(key);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Walks the parent chain accumulating local matrices: the static
    /// bind-pose transform, distinct from the per-frame cached world matrix.
    #[must_use]
    pub fn global_pose(&self, key: NodeKey) -> Affine3A {
        let Some(node) = self.nodes.get(key) else {
            return Affine3A::IDENTITY;
        };
        let mut pose = node.local_matrix;
        let mut cursor = node.parent;
        while let Some(parent_key) = cursor {
            let Some(parent) = self.nodes.get(parent_key) else {
                break;
            };
            pose = parent.local_matrix * pose;
            cursor = parent.parent;
        }
        pose
    }
}
