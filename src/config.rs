use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_BASE_URL;
use crate::error::StarMapError;

/// Which labels are shown without the pointer resting on them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// A label is visible only while its sprite is hovered.
    #[default]
    HoverOnly,
    /// A label is visible exactly while its object is volumetric (nearby).
    /// Hovering only drives the tooltip.
    Proximity,
}

/// Which picked representations lead to the catalog page on click.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClickPolicy {
    #[default]
    VolumetricOnly,
    AnyRepresentation,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_distance: 300.0,
            min_distance: 1.0,
            max_distance: 900.0,
            rotate_speed: 0.005,
            zoom_speed: 0.25,
            damping: 0.05,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StarMapConfig {
    pub dataset_url: String,
    pub catalog_base_url: String,
    pub star_texture: String,
    pub planet_texture: String,
    /// Camera distance under which an entry is drawn as a sphere.
    pub distance_threshold: f32,
    /// Multiplier from dataset units (AU) to scene units.
    pub coordinate_scale: f32,
    pub sprite_size: f32,
    pub sphere_radius: f32,
    pub sphere_segments: u16,
    pub label_width: f32,
    pub label_height: f32,
    /// Fraction of the window the canvas occupies.
    pub viewport_scale: f32,
    pub label_policy: LabelPolicy,
    pub click_policy: ClickPolicy,
    pub camera: CameraConfig,
}

impl Default for StarMapConfig {
    fn default() -> Self {
        StarMapConfig {
            dataset_url: "./static/planets/exoplanets.json".to_string(),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            star_texture: "static/planets/img/star.png".to_string(),
            planet_texture: "static/planets/img/planet.png".to_string(),
            distance_threshold: 50.0,
            coordinate_scale: 5000.0,
            sprite_size: 20.0,
            sphere_radius: 10.0,
            sphere_segments: 32,
            label_width: 30.0,
            label_height: 15.0,
            viewport_scale: 0.5,
            label_policy: LabelPolicy::default(),
            click_policy: ClickPolicy::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl StarMapConfig {
    pub fn from_json(text: &str) -> Result<Self, StarMapError> {
        let config: StarMapConfig = serde_json::from_str(text)
            .map_err(|e| StarMapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StarMapError> {
        let positive = [
            ("distance_threshold", self.distance_threshold),
            ("coordinate_scale", self.coordinate_scale),
            ("sprite_size", self.sprite_size),
            ("sphere_radius", self.sphere_radius),
            ("label_width", self.label_width),
            ("label_height", self.label_height),
            ("camera.near", self.camera.near),
            ("camera.initial_distance", self.camera.initial_distance),
            ("camera.min_distance", self.camera.min_distance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(StarMapError::InvalidConfig(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(self.viewport_scale > 0.0 && self.viewport_scale <= 1.0) {
            return Err(StarMapError::InvalidConfig(format!(
                "viewport_scale must be in (0, 1], got {}",
                self.viewport_scale
            )));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(StarMapError::InvalidConfig(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                self.camera.fov_degrees
            )));
        }
        if self.camera.far <= self.camera.near {
            return Err(StarMapError::InvalidConfig("camera.far must exceed camera.near".to_string()));
        }
        if self.camera.max_distance < self.camera.min_distance {
            return Err(StarMapError::InvalidConfig(
                "camera.max_distance must not be below camera.min_distance".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.camera.damping) {
            return Err(StarMapError::InvalidConfig("camera.damping must be in [0, 1]".to_string()));
        }
        if self.sphere_segments < 3 {
            return Err(StarMapError::InvalidConfig("sphere_segments must be at least 3".to_string()));
        }
        Ok(())
    }
}
