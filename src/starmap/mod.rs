//! Distance-based sprite/sphere swapping and pointer interaction for the star map.
//!
//! [`StarMap`] never touches a renderer directly; everything it places on
//! screen goes through the [`Scene`] trait.

mod controller;
mod display;
mod scene;
mod tooltip;

pub use controller::StarMap;
pub use display::{DisplayObject, Label, Representation, RepresentationKind};
pub use scene::{NodeId, NodeKind, Ray, Scene, SceneNode, SpriteTexture};
pub use tooltip::Tooltip;
