//! Interactive 3D exoplanet star map for the browser.
//!
//! Catalog entries are drawn as sprites; entries close to the camera are
//! replaced by spheres. Hovering a sprite shows its tooltip and label, and
//! clicking an entry opens its page in the NASA exoplanet catalog.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod starmap;
#[cfg(target_arch = "wasm32")]
mod web;

pub use catalog::{parse_catalog, CelestialEntry, Coordinates};
pub use config::{ClickPolicy, LabelPolicy, StarMapConfig};
pub use error::StarMapError;
pub use starmap::{Scene, StarMap};
#[cfg(target_arch = "wasm32")]
pub use web::init_star_map;
