use nalgebra::Vector3;

use super::scene::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepresentationKind {
    Flat,
    Volumetric,
}

/// The node currently standing in for an entry. Holding exactly one node per
/// variant keeps a flat and a volumetric node from being live together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    Flat { sprite: NodeId },
    Volumetric { mesh: NodeId },
}

impl Representation {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Representation::Flat { .. } => RepresentationKind::Flat,
            Representation::Volumetric { .. } => RepresentationKind::Volumetric,
        }
    }

    pub fn node(&self) -> NodeId {
        match *self {
            Representation::Flat { sprite } => sprite,
            Representation::Volumetric { mesh } => mesh,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayObject {
    /// Index into the entry list.
    pub entry: usize,
    pub position: Vector3<f32>,
    pub representation: Representation,
}

impl DisplayObject {
    pub fn kind(&self) -> RepresentationKind {
        self.representation.kind()
    }

    pub fn is_flat(&self) -> bool {
        self.kind() == RepresentationKind::Flat
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub node: NodeId,
    pub position: Vector3<f32>,
    pub visible: bool,
}
