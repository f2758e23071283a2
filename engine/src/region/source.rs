//! Collaborator seams: where region records and their colors come from

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::types::{ColorRgb, RegionMapError};

/// One region to render: its id, the key used to look up its color, and its metafile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionRecord {
    pub region: String,
    pub color_key: String,
    pub metafile: PathBuf,
    #[serde(default)]
    pub description: Option<String>,
}

/// Supplies already-resolved region records
pub trait AttributeSource {
    fn records(&self) -> Result<Vec<RegionRecord>, RegionMapError>;
}

/// Resolves a color lookup key into a final color
pub trait PaletteMap {
    fn color_for(&self, key: &str) -> Option<ColorRgb>;
}

impl AttributeSource for [RegionRecord] {
    fn records(&self) -> Result<Vec<RegionRecord>, RegionMapError> {
        Ok(self.to_vec())
    }
}

impl AttributeSource for Vec<RegionRecord> {
    fn records(&self) -> Result<Vec<RegionRecord>, RegionMapError> {
        self.as_slice().records()
    }
}

impl PaletteMap for HashMap<String, ColorRgb> {
    fn color_for(&self, key: &str) -> Option<ColorRgb> {
        self.get(key).copied()
    }
}

/// Records stored as a JSON array.
///
/// Relative metafile paths are resolved against the manifest's directory.
pub struct ManifestSource {
    path: PathBuf,
}

impl ManifestSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AttributeSource for ManifestSource {
    fn records(&self) -> Result<Vec<RegionRecord>, RegionMapError> {
        let mut records: Vec<RegionRecord> = read_json(&self.path)?;
        let base = self.path.parent().unwrap_or(Path::new(""));

        for record in &mut records {
            if record.metafile.is_relative() {
                record.metafile = base.join(&record.metafile);
            }
        }

        Ok(records)
    }
}

/// Fixed key -> color table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FixedPalette {
    colors: HashMap<String, ColorRgb>,
}

impl FixedPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object of `key: color` pairs
    pub fn from_file(path: &Path) -> Result<Self, RegionMapError> {
        read_json(path)
    }

    pub fn insert(&mut self, key: impl Into<String>, color: ColorRgb) {
        self.colors.insert(key.into(), color);
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl PaletteMap for FixedPalette {
    fn color_for(&self, key: &str) -> Option<ColorRgb> {
        self.colors.color_for(key)
    }
}

impl<K: Into<String>> FromIterator<(K, ColorRgb)> for FixedPalette {
    fn from_iter<T: IntoIterator<Item = (K, ColorRgb)>>(iter: T) -> Self {
        Self {
            colors: iter.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RegionMapError> {
    let contents = fs::read_to_string(path).map_err(|e| RegionMapError::from_io(e, path))?;
    serde_json::from_str(&contents).map_err(|source| RegionMapError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}
