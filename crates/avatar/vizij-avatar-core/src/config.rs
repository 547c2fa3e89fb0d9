//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Options handed to the rendering backend when the surface is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceOptions {
    /// Clear to a fully transparent background so the page shows through.
    pub transparent_background: bool,
    /// Size the surface to its container and follow container resizes.
    pub autosize: bool,
    /// Antialiased / smoothed rendering.
    pub smoothing: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            transparent_background: true,
            autosize: true,
            smoothing: true,
        }
    }
}

/// Options handed to the model loader for every resolve.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadOptions {
    /// Let the runtime install its own pointer handling. The session wires
    /// pointer input itself, so this stays off.
    pub auto_interact: bool,
}

/// Configuration for a session. Every field has a default so hosts can pass
/// a partial object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model loaded once the surface is ready, unless one was selected first.
    pub default_model: String,
    pub asset_root: String,
    pub manifest_extension: String,
    /// Fraction of the surface the model may occupy along its limiting axis.
    pub fit_margin: f32,
    /// Maximum pointer travel between press and release that still counts as a tap.
    pub drag_tolerance_px: f32,
    /// Maximum retained session events before the oldest are dropped.
    pub max_events: usize,
    pub surface: SurfaceOptions,
    pub load: LoadOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: "Haru".to_string(),
            asset_root: "models".to_string(),
            manifest_extension: "model3.json".to_string(),
            fit_margin: 0.8,
            drag_tolerance_px: 4.0,
            max_events: 256,
            surface: SurfaceOptions::default(),
            load: LoadOptions::default(),
        }
    }
}

impl Config {
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.asset_root.clone(), self.manifest_extension.clone())
    }
}
