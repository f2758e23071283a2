//! Region assignment and compositing of the final map

use std::path::{Path, PathBuf};

use image::GenericImage;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::metafile;
use super::raster::{self, Raster};
use super::source::{AttributeSource, PaletteMap};
use super::types::{ColorRgb, PixelSet, RegionMapError};

/// Fill color and pixels of one loaded region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFill {
    pub color: ColorRgb,
    pub pixels: PixelSet,
}

/// Region id -> fill mapping, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionAssignment {
    regions: IndexMap<String, RegionFill>,
}

impl RegionAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a region; the last write wins
    pub fn insert(&mut self, region: impl Into<String>, fill: RegionFill) {
        self.regions.insert(region.into(), fill);
    }

    /// Replace the color of a loaded region, keeping its pixels
    pub fn set_color(&mut self, region: &str, color: ColorRgb) -> Result<(), RegionMapError> {
        let fill = self
            .regions
            .get_mut(region)
            .ok_or_else(|| RegionMapError::RegionNotLoaded(region.to_string()))?;
        fill.color = color;
        Ok(())
    }

    pub fn get(&self, region: &str) -> Option<&RegionFill> {
        self.regions.get(region)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionFill)> {
        self.regions.iter().map(|(id, fill)| (id.as_str(), fill))
    }

    /// Total pixels across all regions
    pub fn pixel_count(&self) -> usize {
        self.regions.values().map(|fill| fill.pixels.len()).sum()
    }
}

/// Outcome of a batch load
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Regions inserted or replaced
    pub loaded: usize,
    /// Regions left out, with the reason
    pub skipped: Vec<SkippedRegion>,
}

#[derive(Debug)]
pub struct SkippedRegion {
    pub region: String,
    pub reason: String,
}

/// Outcome of a paint
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaintSummary {
    pub regions: usize,
    pub painted: usize,
    /// Coordinates that fell outside the template
    pub out_of_bounds: usize,
}

/// Composites region colors onto a template image
pub struct RegionPainter {
    template: PathBuf,
    assignment: RegionAssignment,
}

impl RegionPainter {
    /// Bind a template image; it must exist but is only decoded when painting
    pub fn new(template: impl Into<PathBuf>) -> Result<Self, RegionMapError> {
        Self::with_assignment(template, RegionAssignment::new())
    }

    /// Bind a template together with an already built assignment
    pub fn with_assignment(
        template: impl Into<PathBuf>,
        assignment: RegionAssignment,
    ) -> Result<Self, RegionMapError> {
        let template = template.into();
        check_exists(&template)?;
        Ok(Self {
            template,
            assignment,
        })
    }

    /// Switch to another template, keeping the assignment
    pub fn set_template(&mut self, template: impl Into<PathBuf>) -> Result<(), RegionMapError> {
        let template = template.into();
        check_exists(&template)?;
        self.template = template;
        Ok(())
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn assignment(&self) -> &RegionAssignment {
        &self.assignment
    }

    pub fn into_assignment(self) -> RegionAssignment {
        self.assignment
    }

    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Load a region's pixels from its metafile and assign `color`.
    ///
    /// On failure the assignment is left untouched and the error is returned
    /// so the caller can carry on with other regions. Returns the pixel count.
    pub fn load(
        &mut self,
        region: impl Into<String>,
        color: ColorRgb,
        metafile: &Path,
    ) -> Result<usize, RegionMapError> {
        let region = region.into();

        let pixels = match metafile::read(metafile) {
            Ok(pixels) => pixels,
            Err(e) => {
                warn!("Ignored metafile {:?} for region '{}': {}", metafile, region, e);
                return Err(e);
            }
        };

        let count = pixels.len();
        debug!("Loaded region '{}' ({} pixels) as {}", region, count, color);
        self.assignment.insert(region, RegionFill { color, pixels });
        Ok(count)
    }

    /// Load every record of `source`, resolving colors through `palette`.
    ///
    /// Records with an unknown color key or a broken metafile are skipped.
    pub fn load_from_source<S, P>(
        &mut self,
        source: &S,
        palette: &P,
    ) -> Result<LoadReport, RegionMapError>
    where
        S: AttributeSource + ?Sized,
        P: PaletteMap + ?Sized,
    {
        let mut report = LoadReport::default();

        for record in source.records()? {
            let Some(color) = palette.color_for(&record.color_key) else {
                warn!(
                    "No palette color for key '{}', skipping region '{}'",
                    record.color_key, record.region
                );
                report.skipped.push(SkippedRegion {
                    reason: format!("no palette color for key '{}'", record.color_key),
                    region: record.region,
                });
                continue;
            };

            match self.load(record.region.clone(), color, &record.metafile) {
                Ok(_) => report.loaded += 1,
                Err(e) => report.skipped.push(SkippedRegion {
                    region: record.region,
                    reason: e.to_string(),
                }),
            }
        }

        info!(
            "Loaded {} regions, skipped {}",
            report.loaded,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Change the color of an already loaded region
    pub fn set_color(&mut self, region: &str, color: ColorRgb) -> Result<(), RegionMapError> {
        self.assignment.set_color(region, color).inspect_err(|e| {
            warn!("Unable to update region color: {}", e);
        })
    }

    /// Paint every assigned region onto a copy of the template and save it to `output`.
    ///
    /// Nothing is written when the assignment is empty or the template cannot
    /// be opened. Coordinates outside the template are skipped with a warning.
    pub fn paint(&self, output: &Path) -> Result<PaintSummary, RegionMapError> {
        if self.assignment.is_empty() {
            warn!("The image was not created because no regions are loaded");
            return Err(RegionMapError::EmptyAssignment);
        }

        let (mut canvas, format) = Raster::open(&self.template)?.into_canvas();
        let (width, height) = (canvas.width(), canvas.height());
        let mut summary = PaintSummary::default();

        for (region, fill) in self.assignment.iter() {
            let rgba = fill.color.to_rgba();
            let mut out_of_bounds = 0;

            for pixel in &fill.pixels {
                if pixel.within(width, height) {
                    canvas.put_pixel(pixel.x, pixel.y, rgba);
                    summary.painted += 1;
                } else {
                    out_of_bounds += 1;
                }
            }

            if out_of_bounds > 0 {
                warn!(
                    "Region '{}': skipped {} pixels outside the {}x{} template",
                    region, out_of_bounds, width, height
                );
            }
            summary.out_of_bounds += out_of_bounds;
            summary.regions += 1;
        }

        raster::save(&canvas, output, format)?;

        info!(
            "Painted {} regions ({} pixels) into {:?}",
            summary.regions, summary.painted, output
        );
        Ok(summary)
    }
}

fn check_exists(path: &Path) -> Result<(), RegionMapError> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        Ok(false) => Err(RegionMapError::FileNotFound(path.to_path_buf())),
        Err(e) => Err(RegionMapError::from_io(e, path)),
    }
}
