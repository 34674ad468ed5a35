//! Exoplanet catalog records as they arrive in `exoplanets.json`.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::StarMapError;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://science.nasa.gov/exoplanet-catalog";

/// Shown wherever an entry has no `planet_name`.
pub const UNNAMED_LABEL: &str = "Unnamed Star";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    /// Places a body on a sphere of `radius` AU using right ascension in hours
    /// and declination in degrees, the same layout the dataset generator uses.
    pub fn from_equatorial(ra_hours: f64, dec_degrees: f64, radius: f64) -> Self {
        let ra = (ra_hours * 15.0).to_radians();
        let dec = dec_degrees.to_radians();
        Coordinates {
            x: radius * dec.cos() * ra.cos(),
            y: radius * dec.cos() * ra.sin(),
            z: radius * dec.sin(),
        }
    }

    pub fn scaled(&self, scale: f32) -> Vector3<f32> {
        Vector3::new(self.x as f32, self.y as f32, self.z as f32) * scale
    }
}

/// One record of the dataset. Everything except the coordinates is optional.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CelestialEntry {
    #[serde(default)]
    pub planet_name: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub star_name: Option<String>,
    #[serde(default)]
    pub mass: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub right_ascension: Option<String>,
    #[serde(default)]
    pub declination: Option<String>,
}

impl CelestialEntry {
    pub fn new(planet_name: Option<&str>, coordinates: Coordinates, description: Option<&str>) -> Self {
        CelestialEntry {
            planet_name: planet_name.map(str::to_string),
            coordinates,
            description: description.map(str::to_string),
            star_name: None,
            mass: None,
            distance: None,
            right_ascension: None,
            declination: None,
        }
    }

    pub fn is_named(&self) -> bool {
        self.planet_name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    pub fn display_name(&self) -> &str {
        match self.planet_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNNAMED_LABEL,
        }
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn host_star_line(&self) -> Option<String> {
        let star = self.star_name.as_deref().filter(|s| !s.trim().is_empty())?;
        Some(match self.distance {
            Some(au) => format!("Host star: {} ({:.0} AU)", star, au),
            None => format!("Host star: {}", star),
        })
    }

    /// Catalog page for this entry, or `None` when the entry has no name to
    /// build a slug from.
    pub fn catalog_url(&self, base_url: &str) -> Option<String> {
        if !self.is_named() {
            return None;
        }
        let slug = self.planet_name.as_deref()?.trim().replace(' ', "-");
        Some(format!("{}/{}", base_url.trim_end_matches('/'), slug))
    }
}

pub fn parse_catalog(text: &str) -> Result<Vec<CelestialEntry>, StarMapError> {
    Ok(serde_json::from_str(text)?)
}
