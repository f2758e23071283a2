//! Region-related types and error definitions

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageError, Pixel, Rgb, Rgba};
use serde::Deserialize;
use thiserror::Error;

/// The only metafile format version this crate reads and writes
pub const META_VERSION: &str = "1.0";

/// Conventional extension for metafiles
pub const METAFILE_EXTENSION: &str = "mf";

/// Errors that can occur while scanning masks, reading/writing metafiles or painting
#[derive(Debug, Error)]
pub enum RegionMapError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Metafile {} is damaged: {reason}", .path.display())]
    MalformedMetafile { path: PathBuf, reason: String },

    #[error("Metafile {} has unknown format version '{version}'", .path.display())]
    UnsupportedVersion { path: PathBuf, version: String },

    #[error("Metafile {} has no DATA block, the file structure may be damaged", .0.display())]
    StructureError(PathBuf),

    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Region assignment is empty, nothing to paint")]
    EmptyAssignment,

    #[error("Region '{0}' was not loaded")]
    RegionNotLoaded(String),

    #[error("Header field '{field}' cannot be stored in a metafile: {value:?}")]
    InvalidHeaderField { field: &'static str, value: String },

    #[error("Region id {0:?} cannot be used as a metafile name")]
    InvalidRegionId(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Image error for {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("Invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegionMapError {
    /// Classify an I/O failure on `path` into one of the tagged kinds
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Classify an image codec failure, unwrapping the I/O cases
    pub fn from_image(err: ImageError, path: &Path) -> Self {
        match err {
            ImageError::IoError(io_err) => Self::from_io(io_err, path),
            source => Self::Image {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Whether the error signals an unrecoverable environment fault.
    ///
    /// Batch operations skip a region on any other error and keep going,
    /// but abort on a fatal one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DirectoryCreateFailed { .. })
    }
}

/// A pixel position inside a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoordinate {
    pub x: u32,
    pub y: u32,
}

impl PixelCoordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Whether the coordinate lies inside a `width` x `height` raster
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

impl From<(u32, u32)> for PixelCoordinate {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Pixel coordinates of one region, in scan order
pub type PixelSet = Vec<PixelCoordinate>;

/// An opaque 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rrggbb` or `#rrggbb`, case-insensitive
    pub fn from_hex(hex: &str) -> Result<Self, RegionMapError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(RegionMapError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| RegionMapError::InvalidColor(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `#rrggbb` form
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The color at full opacity
    pub fn to_rgba(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    /// Extract the RGB channels of any 8-bit pixel, dropping alpha
    pub fn of_pixel<P: Pixel<Subpixel = u8>>(pixel: &P) -> Self {
        Self::from(pixel.to_rgb())
    }
}

impl From<Rgb<u8>> for ColorRgb {
    fn from(Rgb([r, g, b]): Rgb<u8>) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for ColorRgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for ColorRgb {
    type Err = RegionMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accepted JSON forms for a color
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Channels([u8; 3]),
}

impl TryFrom<ColorRepr> for ColorRgb {
    type Error = RegionMapError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => Self::from_hex(&hex),
            ColorRepr::Channels(channels) => Ok(Self::from(channels)),
        }
    }
}

/// Metafile header identifying the region and format version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: String,
    pub country: Option<String>,
    pub region: String,
    pub description: Option<String>,
}

impl Header {
    /// Header for `region` at the current format version
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            version: META_VERSION.to_string(),
            country: None,
            region: region.into(),
            description: None,
        }
    }

    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
