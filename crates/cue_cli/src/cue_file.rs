//! Cue file handling
//!
//! A cue file is a cue definition with an optional `[object]` table
//! describing the scene object to simulate it on:
//!
//! ```toml
//! loop_duration = 2.0
//!
//! [position]
//! offset = { x = 0.0, y = 0.25, z = 0.0 }
//!
//! [object]
//! local_position = { x = 0.0, y = 1.0, z = 0.0 }
//!
//! [[object.surfaces]]
//! base_color = { r = 0.8, g = 0.8, b = 0.8 }
//! ```
//!
//! Without an `[object]` table the object sits at the origin with one white
//! surface per configured surface cue.

use anyhow::{Context, Result};
use cue_core::Color;
use cue_object::{CueConfig, SceneObject, Surface};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The part of a cue file the cue itself does not read
#[derive(Debug, Default, Deserialize)]
struct ObjectSection {
    #[serde(default)]
    object: Option<SceneObject>,
}

/// A loaded cue file
#[derive(Debug)]
pub struct CueFile {
    pub config: CueConfig,
    pub object: SceneObject,
}

impl CueFile {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("Invalid cue file {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let config = CueConfig::from_toml_str(source)?;
        let section: ObjectSection =
            toml::from_str(source).context("Failed to parse [object] table")?;

        let object = section.object.unwrap_or_else(|| {
            let mut object = SceneObject::new();
            for _ in &config.surfaces {
                object = object.with_surface(Surface::new(Color::WHITE, Color::BLACK));
            }
            object
        });

        if object.surfaces.len() < config.surfaces.len() {
            tracing::warn!(
                "Object has {} surfaces, {} surface cues will be ignored",
                object.surfaces.len(),
                config.surfaces.len() - object.surfaces.len()
            );
        }

        Ok(Self { config, object })
    }
}
