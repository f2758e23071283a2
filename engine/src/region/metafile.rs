//! Metafile codec
//!
//! A metafile is a small plain-text artifact holding the pixel coordinates of
//! one region:
//!
//! ```text
//! [ HEADER:
//! 	META_VERSION=1.0
//! 	country=<country|None>;
//! 	region=<region>;
//! 	discription='<description|None>';
//! ]
//! DATA:
//! <x1>x<y1> <x2>x<y2> ... <xn>x<yn>
//! ```
//!
//! The second line must carry the version, the header block is a list of
//! `key=value;` lines closed by `]`, and the line after the `DATA:` marker lists
//! every coordinate followed by a single space.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::types::{Header, META_VERSION, PixelCoordinate, PixelSet, RegionMapError};

const HEADER_OPEN: &str = "[ HEADER:";
const HEADER_CLOSE: &str = "]";
const VERSION_KEY: &str = "META_VERSION";
const DATA_MARKER: &str = "DATA:";
/// Written in place of an absent optional header field
const EMPTY_MARKER: &str = "None";
const COORDINATE_SEPARATOR: char = 'x';
/// Substrings a header value may not contain without breaking the line grammar
const FORBIDDEN_IN_FIELD: [&str; 4] = ["\n", "\r", "\t", DATA_MARKER];
/// Shortest token that can hold a coordinate (`0x0`)
const MIN_TOKEN_LEN: usize = 3;

/// A decoded metafile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metafile {
    pub header: Header,
    pub pixels: PixelSet,
}

/// Write `pixels` under `header` to `path`, creating the parent directory if needed.
///
/// The file is written next to its destination and renamed into place, so a
/// failed write never leaves a truncated metafile behind. A directory that
/// cannot be created is reported as [`RegionMapError::DirectoryCreateFailed`],
/// which batch callers treat as fatal.
pub fn write(
    pixels: &[PixelCoordinate],
    header: &Header,
    path: &Path,
) -> Result<(), RegionMapError> {
    validate_header(header)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ensure_dir(dir)?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| RegionMapError::from_io(e, path))?;
    {
        let mut writer = BufWriter::new(&mut staged);
        encode(&mut writer, pixels, header)
            .and_then(|_| writer.flush())
            .map_err(|e| RegionMapError::from_io(e, path))?;
    }
    staged
        .persist(path)
        .map_err(|e| RegionMapError::from_io(e.error, path))?;

    info!(
        "Wrote metafile {:?} for region '{}': {} pixels",
        path,
        header.region,
        pixels.len()
    );
    Ok(())
}

/// Serialize a metafile into any writer
pub fn encode<W: Write>(
    writer: &mut W,
    pixels: &[PixelCoordinate],
    header: &Header,
) -> io::Result<()> {
    writeln!(writer, "{HEADER_OPEN}")?;
    writeln!(writer, "\t{VERSION_KEY}={}", header.version)?;
    writeln!(
        writer,
        "\tcountry={};",
        header.country.as_deref().unwrap_or(EMPTY_MARKER)
    )?;
    writeln!(writer, "\tregion={};", header.region)?;
    writeln!(
        writer,
        "\tdiscription='{}';",
        header.description.as_deref().unwrap_or(EMPTY_MARKER)
    )?;
    writeln!(writer, "{HEADER_CLOSE}")?;
    writeln!(writer, "{DATA_MARKER}")?;

    for pixel in pixels {
        write!(writer, "{pixel} ")?;
    }
    writeln!(writer)
}

/// Reject header values that would not read back unchanged
fn validate_header(header: &Header) -> Result<(), RegionMapError> {
    let fields = [
        (VERSION_KEY, Some(header.version.as_str())),
        ("country", header.country.as_deref()),
        ("region", Some(header.region.as_str())),
        ("discription", header.description.as_deref()),
    ];

    for (field, value) in fields {
        let Some(value) = value else { continue };
        let optional = matches!(field, "country" | "discription");
        if FORBIDDEN_IN_FIELD.iter().any(|bad| value.contains(bad))
            || (optional && value == EMPTY_MARKER)
            || (field == VERSION_KEY && value != META_VERSION)
        {
            return Err(RegionMapError::InvalidHeaderField {
                field,
                value: value.to_string(),
            });
        }
    }

    Ok(())
}

/// Read only the pixel coordinates of the metafile at `path`
pub fn read(path: &Path) -> Result<PixelSet, RegionMapError> {
    read_metafile(path).map(|metafile| metafile.pixels)
}

/// Read and decode the metafile at `path`
pub fn read_metafile(path: &Path) -> Result<Metafile, RegionMapError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData => RegionMapError::MalformedMetafile {
            path: path.to_path_buf(),
            reason: "contents are not valid UTF-8".to_string(),
        },
        _ => RegionMapError::from_io(e, path),
    })?;

    let metafile = decode(&contents, path)?;
    debug!(
        "Read metafile {:?} for region '{}': {} pixels",
        path,
        metafile.header.region,
        metafile.pixels.len()
    );
    Ok(metafile)
}

/// Decode metafile text; `path` is only used to label errors
pub fn decode(contents: &str, path: &Path) -> Result<Metafile, RegionMapError> {
    let malformed = |reason: String| RegionMapError::MalformedMetafile {
        path: path.to_path_buf(),
        reason,
    };

    let lines: Vec<&str> = contents.lines().collect();

    let version_line = lines
        .get(1)
        .ok_or_else(|| malformed("missing version line".to_string()))?
        .replace('\t', "");
    let version = match version_line.split_once('=') {
        Some((VERSION_KEY, value)) => value,
        _ => return Err(malformed(format!("expected {VERSION_KEY} on line 2"))),
    };
    if version != META_VERSION {
        return Err(RegionMapError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: version.to_string(),
        });
    }

    // The marker only counts after the header's closing bracket, if any
    let search_from = lines
        .iter()
        .skip(2)
        .position(|line| line.trim() == HEADER_CLOSE)
        .map_or(2, |index| index + 3);

    let data_index = lines
        .iter()
        .enumerate()
        .skip(search_from)
        .find(|(_, line)| line.contains(DATA_MARKER))
        .map(|(index, _)| index)
        .ok_or_else(|| RegionMapError::StructureError(path.to_path_buf()))?;

    let mut header = parse_header_fields(&lines[2..data_index]);
    header.version = version.to_string();

    let pixels = match lines.get(data_index + 1) {
        Some(data) => parse_pixels(data).map_err(malformed)?,
        None => PixelSet::new(),
    };

    Ok(Metafile { header, pixels })
}

/// Parse the `key=value;` lines following the version line
fn parse_header_fields(lines: &[&str]) -> Header {
    let mut header = Header::new(String::new());

    for line in lines {
        let line = line.replace('\t', "");
        let line = line.trim();
        if line == HEADER_CLOSE {
            break;
        }

        let Some((key, value)) = line.strip_suffix(';').unwrap_or(line).split_once('=') else {
            continue;
        };

        match key {
            "country" => header.country = optional_field(value),
            "region" => header.region = value.to_string(),
            "discription" => {
                let value = value
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .unwrap_or(value);
                header.description = optional_field(value);
            }
            _ => {}
        }
    }

    header
}

fn optional_field(value: &str) -> Option<String> {
    (value != EMPTY_MARKER).then(|| value.to_string())
}

/// Parse the space-separated coordinate line.
///
/// Tokens shorter than three characters (such as the empty token left by the
/// trailing separator) are skipped.
fn parse_pixels(data: &str) -> Result<PixelSet, String> {
    data.split(' ')
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .map(|token| parse_coordinate(token).ok_or_else(|| format!("bad pixel entry '{token}'")))
        .collect()
}

fn parse_coordinate(token: &str) -> Option<PixelCoordinate> {
    let (x, y) = token.split_once(COORDINATE_SEPARATOR)?;
    Some(PixelCoordinate::new(x.parse().ok()?, y.parse().ok()?))
}

/// Create `dir` and its ancestors; an existing directory is fine
fn ensure_dir(dir: &Path) -> Result<(), RegionMapError> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(RegionMapError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source,
        }),
    }
}
