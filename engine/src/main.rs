use std::env;
use std::path::Path;

use anyhow::{Context, bail};
use regionmap::config::Config;
use regionmap::region::source::read_json;
use regionmap::region::{AuthorRequest, FixedPalette, ManifestSource, MetafileAuthor, RegionPainter};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage:\n  regionmap author <requests.json>\n  regionmap render <manifest.json> <palette.json>";

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Loaded configuration: template={:?}, metafile_dir={:?}, output={:?}",
        config.template, config.metafile_dir, config.output
    );

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [command, requests] if command == "author" => author(&config, Path::new(requests)),
        [command, manifest, palette] if command == "render" => {
            render(&config, Path::new(manifest), Path::new(palette))
        }
        _ => bail!(USAGE),
    }
}

/// Scan the template for every requested region and write its metafile
fn author(config: &Config, requests_path: &Path) -> anyhow::Result<()> {
    let mut requests: Vec<AuthorRequest> = read_json(requests_path)?;
    for request in &mut requests {
        if request.country.is_none() {
            request.country = config.default_country.clone();
        }
    }

    let author = MetafileAuthor::open(&config.template)
        .with_context(|| format!("Failed to open mask {:?}", config.template))?;
    let report = author.author_all(&requests, &config.metafile_dir)?;

    if !report.failed.is_empty() {
        warn!("Regions without metafile: {}", report.failed.join(", "));
    }
    Ok(())
}

/// Load the manifest's regions with palette colors and paint the map
fn render(config: &Config, manifest: &Path, palette: &Path) -> anyhow::Result<()> {
    let palette = FixedPalette::from_file(palette)?;
    let source = ManifestSource::new(manifest);

    let mut painter = RegionPainter::new(&config.template)
        .with_context(|| format!("Failed to open template {:?}", config.template))?;
    let report = painter.load_from_source(&source, &palette)?;
    for skipped in &report.skipped {
        warn!("Ignored region '{}': {}", skipped.region, skipped.reason);
    }

    let summary = painter.paint(&config.output)?;
    info!(
        "Map saved to {:?}: {} regions, {} pixels outside the template",
        config.output, summary.regions, summary.out_of_bounds
    );
    Ok(())
}
