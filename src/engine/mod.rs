pub mod camera;
pub mod mesh;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod scene_graph;

pub use camera::{OrbitCamera, Viewport};
pub use scene_graph::SceneGraph;
