use nalgebra::{Point3, Vector3};

use crate::starmap::{NodeId, Ray, Scene, SceneNode};

/// Retained list of nodes the renderer draws each frame. Removed slots are
/// reused by later additions.
#[derive(Default)]
pub struct SceneGraph {
    nodes: Vec<Option<SceneNode>>,
    free: Vec<usize>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|node| (NodeId(i), node)))
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }
}

impl Scene for SceneGraph {
    fn add(&mut self, node: SceneNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn remove(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            if slot.take().is_some() {
                self.free.push(id.0);
            }
        }
    }

    fn set_position(&mut self, id: NodeId, position: Vector3<f32>) {
        if let Some(node) = self.get_mut(id) {
            node.position = position;
        }
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.get_mut(id) {
            node.visible = visible;
        }
    }

    fn pick(&self, ray: &Ray, candidates: &[NodeId]) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for &id in candidates {
            let Some(node) = self.get(id) else { continue };
            if !node.visible {
                continue;
            }
            let Some(radius) = node.pick_radius() else { continue };
            if let Some(t) = ray.intersect_sphere(&Point3::from(node.position), radius) {
                if best.map_or(true, |(_, best_t)| t < best_t) {
                    best = Some((id, t));
                }
            }
        }
        best.map(|(id, _)| id)
    }
}
