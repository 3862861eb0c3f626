//! Defaults and environment overrides.

use anyhow::Result;
use serde::Serialize;

use crate::classify::{ColorScale, Thresholds};
use crate::projection::{Canvas, Projection};

pub const DEFAULT_EDUCATION_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/for_user_education.json";
pub const DEFAULT_TOPOLOGY_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/counties.json";
pub const DEFAULT_OBJECT: &str = "counties";

/// Education dataset locator: `EDUCATION_URL` or the public dataset.
pub fn education_locator() -> String {
    std::env::var("EDUCATION_URL").unwrap_or_else(|_| DEFAULT_EDUCATION_URL.to_string())
}

/// Topology locator: `TOPOLOGY_URL` or the public county topology.
pub fn topology_locator() -> String {
    std::env::var("TOPOLOGY_URL").unwrap_or_else(|_| DEFAULT_TOPOLOGY_URL.to_string())
}

/// `10, 20, …, 100`.
pub fn default_thresholds() -> Vec<f64> {
    (1..=10).map(|i| f64::from(i) * 10.0).collect()
}

/// Everything that shapes one rendered map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapConfig {
    pub canvas: Canvas,
    pub projection: Projection,
    /// Name of the topology object holding the regions.
    pub object: String,
    pub thresholds: Vec<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            projection: Projection::default(),
            object: DEFAULT_OBJECT.to_string(),
            thresholds: default_thresholds(),
            title: None,
            description: None,
        }
    }
}

impl MapConfig {
    /// Builds the color scale; fails on bad thresholds.
    pub fn color_scale(&self) -> Result<ColorScale> {
        ColorScale::blues(Thresholds::new(self.thresholds.clone())?)
    }
}
