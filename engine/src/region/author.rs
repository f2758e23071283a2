//! Metafile authoring: scan a mask once per region and persist the result

use std::path::{Component, Path, PathBuf};

use image::DynamicImage;
use serde::Deserialize;
use tracing::{info, warn};

use super::metafile;
use super::raster::Raster;
use super::scanner;
use super::types::{ColorRgb, Header, METAFILE_EXTENSION, RegionMapError};

/// One region to extract from the mask
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorRequest {
    pub region: String,
    /// The region's unique color on the mask
    pub color: ColorRgb,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AuthorRequest {
    pub fn new(region: impl Into<String>, color: ColorRgb) -> Self {
        Self {
            region: region.into(),
            color,
            country: None,
            description: None,
        }
    }

    fn header(&self) -> Header {
        Header::new(self.region.clone())
            .with_country(self.country.clone())
            .with_description(self.description.clone())
    }
}

/// Outcome of a batch authoring run
#[derive(Debug, Default)]
pub struct AuthorReport {
    pub written: Vec<PathBuf>,
    /// Regions whose metafile could not be written
    pub failed: Vec<String>,
}

/// Writes metafiles for regions of a decoded mask
pub struct MetafileAuthor {
    mask_path: PathBuf,
    mask: DynamicImage,
}

impl MetafileAuthor {
    /// Decode the mask at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegionMapError> {
        let mask_path = path.into();
        let mask = Raster::open(&mask_path)?.image;
        Ok(Self { mask_path, mask })
    }

    pub fn mask_path(&self) -> &Path {
        &self.mask_path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.mask.width(), self.mask.height())
    }

    /// Where the metafile of `region` lives inside `folder`.
    ///
    /// The id must be a single plain file name component.
    pub fn metafile_path(folder: &Path, region: &str) -> Result<PathBuf, RegionMapError> {
        let file_name = format!("{region}.{METAFILE_EXTENSION}");
        let mut components = Path::new(&file_name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == file_name.as_str()
        );
        if !plain || matches!(region, "" | "." | "..") || region.contains(['/', '\\']) {
            return Err(RegionMapError::InvalidRegionId(region.to_string()));
        }
        Ok(folder.join(file_name))
    }

    /// Scan the mask for the request's color and write `<folder>/<region>.mf`
    pub fn author(&self, request: &AuthorRequest, folder: &Path) -> Result<PathBuf, RegionMapError> {
        let path = Self::metafile_path(folder, &request.region)?;
        let pixels = scanner::scan(&self.mask, request.color);
        if pixels.is_empty() {
            warn!(
                "Region '{}': color {} does not occur in {:?}",
                request.region, request.color, self.mask_path
            );
        }

        metafile::write(&pixels, &request.header(), &path)?;
        Ok(path)
    }

    /// Author every request; a fatal error aborts, anything else skips the region
    pub fn author_all(
        &self,
        requests: &[AuthorRequest],
        folder: &Path,
    ) -> Result<AuthorReport, RegionMapError> {
        let mut report = AuthorReport::default();

        for request in requests {
            match self.author(request, folder) {
                Ok(path) => report.written.push(path),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Can't create metafile for region '{}': {}", request.region, e);
                    report.failed.push(request.region.clone());
                }
            }
        }

        info!(
            "Authored {} metafiles into {:?} ({} failed)",
            report.written.len(),
            folder,
            report.failed.len()
        );
        Ok(report)
    }
}
