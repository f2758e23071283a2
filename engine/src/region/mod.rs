//! Region processing module
//!
//! Handles scanning of mask images, the metafile codec, and compositing of
//! region colors onto a template.

pub mod author;
pub mod metafile;
pub mod painter;
pub mod raster;
pub mod scanner;
pub mod source;
pub mod types;

pub use author::{AuthorReport, AuthorRequest, MetafileAuthor};
pub use metafile::Metafile;
pub use painter::{LoadReport, PaintSummary, RegionAssignment, RegionFill, RegionPainter};
pub use scanner::{scan, scan_file};
pub use source::{AttributeSource, FixedPalette, ManifestSource, PaletteMap, RegionRecord};
pub use types::{
    ColorRgb, Header, META_VERSION, METAFILE_EXTENSION, PixelCoordinate, PixelSet, RegionMapError,
};
