//! Segment library
//!
//! A level is authored as a single tile map with one layer per segment
//! template. Each layer names the segments allowed to follow it through a
//! comma-separated string property, which turns the layers into a directed
//! graph that the sequencer walks.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::consts::{EMPTY_TILE, OPENING_KEY, TILED_GID_MASK};

/// Reasons a level definition is rejected at load time
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to parse level definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level definition has no tile layers")]
    NoSegments,
    #[error("segment `{0}` is defined more than once")]
    DuplicateSegment(String),
    #[error("segment `{segment}` has {actual} tiles, expected {expected}")]
    GridSize {
        segment: String,
        expected: usize,
        actual: usize,
    },
    #[error("segment `{0}` has no successor property")]
    MissingSuccessors(String),
    #[error("segment `{0}` lists no successors")]
    EmptySuccessors(String),
    #[error("segment `{segment}` references unknown successor `{successor}`")]
    UnknownSuccessor { segment: String, successor: String },
    #[error("level has no `start` segment for the opening run")]
    MissingOpening,
    #[error("segment `{segment}` is {actual} tiles wide, runs place segments every {expected}")]
    SegmentWidth {
        segment: String,
        expected: usize,
        actual: usize,
    },
}

/// An immutable segment blueprint
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTemplate {
    pub key: String,
    /// Tile indices, row-major (`tiles[row][col]`)
    pub tiles: Vec<Vec<i32>>,
    /// Keys that may follow this segment, in authored order
    pub successors: Vec<String>,
}

impl SegmentTemplate {
    pub fn new(key: impl Into<String>, tiles: Vec<Vec<i32>>, successors: Vec<String>) -> Self {
        Self {
            key: key.into(),
            tiles,
            successors,
        }
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn cols(&self) -> usize {
        self.tiles.first().map(Vec::len).unwrap_or(0)
    }
}

/// All segment templates of a level, keyed by name
#[derive(Debug, Clone)]
pub struct SegmentLibrary {
    templates: BTreeMap<String, SegmentTemplate>,
}

/// Tiled-style map document (only the parts we read)
#[derive(Debug, Deserialize)]
struct MapDocument {
    #[serde(default)]
    layers: Vec<LayerDocument>,
}

#[derive(Debug, Deserialize)]
struct LayerDocument {
    name: String,
    #[serde(rename = "type", default = "tile_layer_type")]
    kind: String,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
}

#[derive(Debug, Deserialize)]
struct PropertyDocument {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

fn tile_layer_type() -> String {
    "tilelayer".to_string()
}

/// Split a successor property value into trimmed keys
pub fn parse_successors(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

impl SegmentLibrary {
    /// Parse a level definition
    ///
    /// `successor_properties` lists the accepted property names for the
    /// successor list (matched case-insensitively, first hit wins).
    pub fn load(json: &str, successor_properties: &[String]) -> Result<Self, LevelError> {
        let document: MapDocument = serde_json::from_str(json)?;
        let mut templates = BTreeMap::new();

        for layer in document.layers.into_iter().filter(|l| l.kind == "tilelayer") {
            let expected = layer.width * layer.height;
            if layer.data.len() != expected {
                return Err(LevelError::GridSize {
                    segment: layer.name,
                    expected,
                    actual: layer.data.len(),
                });
            }

            let raw = successor_properties
                .iter()
                .find_map(|wanted| {
                    layer
                        .properties
                        .iter()
                        .find(|p| p.name.eq_ignore_ascii_case(wanted))
                })
                .and_then(|p| p.value.as_str())
                .ok_or_else(|| LevelError::MissingSuccessors(layer.name.clone()))?;
            let successors = parse_successors(raw);
            if successors.is_empty() {
                return Err(LevelError::EmptySuccessors(layer.name));
            }

            // Tiled gid 0 means "no tile"
            let tiles = if layer.width == 0 {
                Vec::new()
            } else {
                layer
                    .data
                    .chunks(layer.width)
                    .map(|row| {
                        row.iter()
                            .map(|&gid| match gid & TILED_GID_MASK {
                                0 => EMPTY_TILE,
                                index => index as i32,
                            })
                            .collect()
                    })
                    .collect()
            };

            let template = SegmentTemplate::new(layer.name.clone(), tiles, successors);
            if templates.insert(layer.name.clone(), template).is_some() {
                return Err(LevelError::DuplicateSegment(layer.name));
            }
        }

        let library = Self::from_templates(templates.into_values())?;
        if library.get(OPENING_KEY).is_none() {
            return Err(LevelError::MissingOpening);
        }
        log::info!("Loaded level with {} segments", library.len());
        Ok(library)
    }

    /// Build a library from already-constructed templates
    ///
    /// Successor references are checked; empty successor lists are allowed
    /// here and surface when the sequencer first walks into them.
    pub fn from_templates(
        templates: impl IntoIterator<Item = SegmentTemplate>,
    ) -> Result<Self, LevelError> {
        let mut map = BTreeMap::new();
        for template in templates {
            let key = template.key.clone();
            if map.insert(key.clone(), template).is_some() {
                return Err(LevelError::DuplicateSegment(key));
            }
        }
        if map.is_empty() {
            return Err(LevelError::NoSegments);
        }

        for template in map.values() {
            if let Some(missing) = template.successors.iter().find(|s| !map.contains_key(*s)) {
                return Err(LevelError::UnknownSuccessor {
                    segment: template.key.clone(),
                    successor: missing.clone(),
                });
            }
        }

        Ok(Self { templates: map })
    }

    /// Every template must be exactly `width_tiles` wide, since the window
    /// places segments at a fixed stride
    pub fn check_width(&self, width_tiles: usize) -> Result<(), LevelError> {
        match self.templates.values().find(|t| t.cols() != width_tiles) {
            Some(template) => Err(LevelError::SegmentWidth {
                segment: template.key.clone(),
                expected: width_tiles,
                actual: template.cols(),
            }),
            None => Ok(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SegmentTemplate> {
        self.templates.get(key)
    }

    /// Template keys in sorted order (stable for seeded selection)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
