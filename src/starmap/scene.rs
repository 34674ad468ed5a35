use nalgebra::{Point3, Vector3};

/// Handle to a node owned by a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteTexture {
    /// Entries without a planet name.
    Star,
    Planet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Camera-facing textured square of side `size`.
    Sprite { texture: SpriteTexture, size: f32 },
    Sphere { radius: f32, segments: u16, color: (f32, f32, f32) },
    /// Camera-facing text billboard. Never pickable.
    Label { text: String, width: f32, height: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub position: Vector3<f32>,
    pub kind: NodeKind,
    pub visible: bool,
}

impl SceneNode {
    pub fn sprite(position: Vector3<f32>, texture: SpriteTexture, size: f32) -> Self {
        SceneNode { position, kind: NodeKind::Sprite { texture, size }, visible: true }
    }

    pub fn sphere(position: Vector3<f32>, radius: f32, segments: u16) -> Self {
        SceneNode {
            position,
            kind: NodeKind::Sphere { radius, segments, color: (1.0, 1.0, 1.0) },
            visible: true,
        }
    }

    pub fn label(position: Vector3<f32>, text: &str, width: f32, height: f32) -> Self {
        SceneNode {
            position,
            kind: NodeKind::Label { text: text.to_string(), width, height },
            visible: false,
        }
    }

    /// Radius of the sphere used for ray picking, `None` for unpickable nodes.
    pub fn pick_radius(&self) -> Option<f32> {
        match self.kind {
            NodeKind::Sprite { size, .. } => Some(size * 0.5),
            NodeKind::Sphere { radius, .. } => Some(radius),
            NodeKind::Label { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit length.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray { origin, direction: direction.normalize() }
    }

    /// Distance along the ray to the first intersection with the sphere, if the
    /// sphere lies (at least partly) in front of the origin.
    pub fn intersect_sphere(&self, center: &Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(&self.direction);
        let c = oc.norm_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}

/// The capabilities the star map needs from whatever renders it.
pub trait Scene {
    fn add(&mut self, node: SceneNode) -> NodeId;
    fn remove(&mut self, id: NodeId);
    fn set_position(&mut self, id: NodeId, position: Vector3<f32>);
    fn set_visible(&mut self, id: NodeId, visible: bool);
    /// Nearest node among `candidates` hit by `ray`.
    fn pick(&self, ray: &Ray, candidates: &[NodeId]) -> Option<NodeId>;
}
