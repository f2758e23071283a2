//! Integration Tests for regionmap
//!
//! These tests exercise the author -> metafile -> paint flow end to end
//! through the public API.

use std::fs;

use image::{GenericImageView, Rgba};
use regionmap::region::{
    AuthorRequest, FixedPalette, ManifestSource, MetafileAuthor, RegionPainter, metafile, scan,
};
use regionmap::{Header, PixelCoordinate, RegionMapError};

mod common;
use common::*;

// ============================================================================
// End-to-end scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_scan_write_read_paint_single_pixel() {
        let dir = tempfile::tempdir().unwrap();
        let mask = scenario_a_mask();
        let template = write_png(dir.path(), "mask.png", &mask);

        let pixels = scan(&mask, RED);
        assert_eq!(pixels, vec![PixelCoordinate::new(1, 1)]);

        let mf = dir.path().join("mf").join("A.mf");
        metafile::write(&pixels, &Header::new("A"), &mf).unwrap();
        assert_eq!(metafile::read(&mf).unwrap(), pixels);

        let mut painter = RegionPainter::new(&template).unwrap();
        painter.load("A", GREEN, &mf).unwrap();
        let output = dir.path().join("result.png");
        painter.paint(&output).unwrap();

        let result = image::open(&output).unwrap();
        assert_eq!(result.dimensions(), (2, 2));
        assert_eq!(result.get_pixel(1, 1), Rgba([0, 255, 0, 255]));
        for (x, y) in [(0, 0), (1, 0), (0, 1)] {
            assert_eq!(result.get_pixel(x, y), GRAY, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_metafile_without_data_block_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "mask.png", &scenario_a_mask());
        let broken = write_raw_metafile(
            dir.path(),
            "B.mf",
            "[ HEADER:\n\tMETA_VERSION=1.0\n\tcountry=None;\n\tregion=B;\n\
             \tdiscription='None';\n]\n1x1 \n",
        );

        assert!(matches!(
            metafile::read(&broken),
            Err(RegionMapError::StructureError(_))
        ));

        let mut painter = RegionPainter::new(&template).unwrap();
        let before = painter.len();
        assert!(painter.load("B", GREEN, &broken).is_err());
        assert_eq!(painter.len(), before);
    }

    #[test]
    fn test_paint_with_empty_assignment_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "mask.png", &scenario_a_mask());
        let painter = RegionPainter::new(&template).unwrap();
        let output = dir.path().join("result.png");

        assert!(matches!(
            painter.paint(&output),
            Err(RegionMapError::EmptyAssignment)
        ));
        assert!(!output.exists());
    }
}

// ============================================================================
// Metafile format
// ============================================================================

mod format {
    use super::*;

    #[test]
    fn test_future_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.mf");
        let mut header = Header::new("F");
        header.version = "1.1".to_string();
        metafile::write(&[PixelCoordinate::new(0, 0)], &header, &path).unwrap();

        match metafile::read(&path) {
            Err(RegionMapError::UnsupportedVersion { version, .. }) => assert_eq!(version, "1.1"),
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_file_from_legacy_writer_is_readable() {
        // Legacy files end with the trailing space of the last token and no newline
        let dir = tempfile::tempdir().unwrap();
        let path = write_raw_metafile(
            dir.path(),
            "RU-MOW.mf",
            "[ HEADER:\n\tMETA_VERSION=1.0\n\tcountry=None;\n\tregion=RU-MOW;\n\
             \tdiscription='Moscow';\n]\nDATA:\n310x120 310x121 311x120 ",
        );

        let decoded = metafile::read_metafile(&path).unwrap();
        assert_eq!(decoded.header.region, "RU-MOW");
        assert_eq!(decoded.header.description.as_deref(), Some("Moscow"));
        assert_eq!(decoded.pixels.len(), 3);
        assert_eq!(decoded.pixels[2], PixelCoordinate::new(311, 120));
    }

    #[test]
    fn test_written_file_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.mf");
        metafile::write(
            &[PixelCoordinate::new(1, 2), PixelCoordinate::new(3, 4)],
            &Header::new("t"),
            &path,
        )
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[ HEADER:");
        assert_eq!(lines[1], "\tMETA_VERSION=1.0");
        assert_eq!(lines[5], "]");
        assert_eq!(lines[6], "DATA:");
        assert_eq!(lines[7], "1x2 3x4 ");
    }
}

// ============================================================================
// Batch workflows
// ============================================================================

mod workflows {
    use super::*;

    #[test]
    fn test_author_then_render_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "map.png", &two_region_mask());
        let folder = dir.path().join("mf");

        let author = MetafileAuthor::open(&template).unwrap();
        let report = author
            .author_all(
                &[
                    AuthorRequest::new("west", RED),
                    AuthorRequest::new("east", BLUE),
                ],
                &folder,
            )
            .unwrap();
        assert_eq!(report.written.len(), 2);

        let manifest = dir.path().join("regions.json");
        fs::write(
            &manifest,
            r#"[
                {"region": "west", "color_key": "low", "metafile": "mf/west.mf"},
                {"region": "east", "color_key": "high", "metafile": "mf/east.mf"},
                {"region": "north", "color_key": "high", "metafile": "mf/north.mf"},
                {"region": "south", "color_key": "unknown", "metafile": "mf/west.mf"}
            ]"#,
        )
        .unwrap();
        let palette: FixedPalette = [
            ("low", regionmap::ColorRgb::new(238, 246, 236)),
            ("high", regionmap::ColorRgb::new(63, 111, 33)),
        ]
        .into_iter()
        .collect();

        let mut painter = RegionPainter::new(&template).unwrap();
        let loaded = painter
            .load_from_source(&ManifestSource::new(&manifest), &palette)
            .unwrap();
        assert_eq!(loaded.loaded, 2);
        let skipped: Vec<&str> = loaded.skipped.iter().map(|s| s.region.as_str()).collect();
        assert_eq!(skipped, ["north", "south"]);

        let output = dir.path().join("result.png");
        let summary = painter.paint(&output).unwrap();
        assert_eq!(summary.regions, 2);
        assert_eq!(summary.painted, 16);

        let result = image::open(&output).unwrap();
        assert_eq!(result.get_pixel(0, 3), Rgba([238, 246, 236, 255]));
        assert_eq!(result.get_pixel(5, 0), Rgba([63, 111, 33, 255]));
        assert_eq!(result.get_pixel(3, 2), GRAY);
    }

    #[test]
    fn test_recolor_and_repaint() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "map.png", &two_region_mask());
        let author = MetafileAuthor::open(&template).unwrap();
        let west = author
            .author(&AuthorRequest::new("west", RED), &dir.path().join("mf"))
            .unwrap();

        let mut painter = RegionPainter::new(&template).unwrap();
        painter.load("west", GREEN, &west).unwrap();
        painter.set_color("west", BLUE).unwrap();
        assert!(matches!(
            painter.set_color("east", BLUE),
            Err(RegionMapError::RegionNotLoaded(_))
        ));

        let output = dir.path().join("result.png");
        painter.paint(&output).unwrap();
        assert_eq!(
            image::open(&output).unwrap().get_pixel(1, 1),
            BLUE.to_rgba()
        );
    }

    #[test]
    fn test_stale_metafile_against_smaller_template() {
        let dir = tempfile::tempdir().unwrap();
        let big = write_png(dir.path(), "big.png", &two_region_mask());
        let small = write_png(dir.path(), "small.png", &scenario_a_mask());
        let east = MetafileAuthor::open(&big)
            .unwrap()
            .author(&AuthorRequest::new("east", BLUE), &dir.path().join("mf"))
            .unwrap();

        let mut painter = RegionPainter::new(&small).unwrap();
        painter.load("east", GREEN, &east).unwrap();
        let output = dir.path().join("result.png");
        let summary = painter.paint(&output).unwrap();

        assert_eq!(summary.painted, 0);
        assert_eq!(summary.out_of_bounds, 8);
        assert_eq!(
            image::open(&output).unwrap().to_rgba8(),
            scenario_a_mask()
        );
    }

    #[test]
    fn test_jpeg_template_keeps_its_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("map.jpg");
        image::DynamicImage::ImageRgba8(two_region_mask())
            .into_rgb8()
            .save(&template)
            .unwrap();
        let mf = dir.path().join("one.mf");
        metafile::write(&[PixelCoordinate::new(0, 0)], &Header::new("one"), &mf).unwrap();

        let mut painter = RegionPainter::new(&template).unwrap();
        painter.load("one", GREEN, &mf).unwrap();
        // The extension says PNG but the template is JPEG
        let output = dir.path().join("result.png");
        painter.paint(&output).unwrap();

        let format = image::ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(image::ImageFormat::Jpeg));
    }
}

// ============================================================================
// Permission failures
// ============================================================================

#[cfg(unix)]
mod permissions {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn set_mode(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    /// Privileged users bypass mode bits, making these checks meaningless
    fn mode_bits_enforced(unreadable: &Path) -> bool {
        fs::read(unreadable).is_err()
    }

    #[test]
    fn test_read_unreadable_metafile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.mf");
        metafile::write(&[PixelCoordinate::new(0, 0)], &Header::new("locked"), &path).unwrap();
        set_mode(&path, 0o000);
        if !mode_bits_enforced(&path) {
            eprintln!("skipping: running with privileges that ignore file modes");
            return;
        }

        let result = metafile::read(&path);
        set_mode(&path, 0o644);
        assert!(matches!(result, Err(RegionMapError::PermissionDenied(p)) if p == path));
    }

    #[test]
    fn test_write_into_read_only_directory() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("mf");
        fs::create_dir(&folder).unwrap();
        let marker = folder.join("marker");
        fs::write(&marker, "x").unwrap();
        set_mode(&marker, 0o000);
        set_mode(&folder, 0o555);
        if !mode_bits_enforced(&marker) {
            set_mode(&folder, 0o755);
            eprintln!("skipping: running with privileges that ignore file modes");
            return;
        }

        let path = folder.join("r.mf");
        let result = metafile::write(&[PixelCoordinate::new(1, 1)], &Header::new("r"), &path);
        set_mode(&folder, 0o755);

        assert!(matches!(result, Err(RegionMapError::PermissionDenied(p)) if p == path));
        assert!(!path.exists());
    }

    #[test]
    fn test_paint_with_unreadable_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "mask.png", &scenario_a_mask());
        let mf = dir.path().join("A.mf");
        metafile::write(&[PixelCoordinate::new(1, 1)], &Header::new("A"), &mf).unwrap();

        let mut painter = RegionPainter::new(&template).unwrap();
        painter.load("A", GREEN, &mf).unwrap();
        set_mode(&template, 0o000);
        if !mode_bits_enforced(&template) {
            eprintln!("skipping: running with privileges that ignore file modes");
            return;
        }

        let output = dir.path().join("result.png");
        let result = painter.paint(&output);
        set_mode(&template, 0o644);

        assert!(matches!(result, Err(RegionMapError::PermissionDenied(_))));
        assert!(!output.exists());
    }
}
