// SPDX-License-Identifier: MPL-2.0
//! Configuration for the tile prefetcher, loaded from a `geomark.toml` file.
//!
//! Every option has a default, so a missing file or an empty table still
//! yields a usable configuration. The defaults cover the Italian peninsula
//! on OpenTopoMap, matching the bounding box the tool originally shipped
//! with.

use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "geomark.toml";

/// Bounding box, zoom range and fetch behavior for [`crate::tiles::fetch_all`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub zoom_min: u8,
    pub zoom_max: u8,
    /// URL with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url_template: String,
    /// Pause between consecutive requests, to stay polite with tile servers.
    pub request_delay_ms: u64,
    pub output_dir: PathBuf,
}

impl Default for TileConfig {
    fn default() -> Self {
        // Italy, Valle d'Aosta down to Sicily.
        Self {
            lat_min: 35.49,
            lat_max: 47.10,
            lon_min: 6.60,
            lon_max: 18.52,
            zoom_min: 6,
            zoom_max: 15,
            tile_url_template: "https://a.tile.opentopomap.org/{z}/{x}/{y}.png".to_string(),
            request_delay_ms: 500,
            output_dir: PathBuf::from("tiles"),
        }
    }
}

/// Loads `geomark.toml` from the working directory, or the defaults when it
/// does not exist.
pub fn load() -> Result<TileConfig> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        load_from_path(path)
    } else {
        Ok(TileConfig::default())
    }
}

pub fn load_from_path(path: &Path) -> Result<TileConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
