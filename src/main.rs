// SPDX-License-Identifier: MPL-2.0
use geomark::config;
use geomark::error::{Error, Result};
use geomark::geo::GeoPoint;
use geomark::overlay::MarkerOverlay;
use geomark::tiles;
use std::path::PathBuf;

const USAGE: &str = "\
Usage:
  geomark <input-image> [output-image] [--marker LAT,LON]... [--demo]
  geomark fetch-tiles [--config PATH]

Annotates a photograph with markers derived from its GPS EXIF data. The
output path defaults to output.jpg.

Options:
  --marker LAT,LON  queue a marker at the given coordinate (repeatable)
  --demo            queue two markers offset 0.001 degrees from the
                    image's own GPS position
  --config PATH     TOML configuration for fetch-tiles
  -h, --help        show this message
";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print!("{USAGE}");
        return Ok(());
    }

    match args
        .subcommand()
        .map_err(|e| Error::Config(e.to_string()))?
    {
        Some(cmd) if cmd == "fetch-tiles" => fetch_tiles(args),
        Some(input) => annotate(PathBuf::from(input), args),
        None => {
            eprint!("{USAGE}");
            Err(Error::Config("missing input image path".to_string()))
        }
    }
}

fn annotate(input: PathBuf, mut args: pico_args::Arguments) -> Result<()> {
    let demo = args.contains("--demo");
    let markers: Vec<GeoPoint> = args
        .values_from_fn("--marker", parse_marker)
        .map_err(|e| Error::Config(e.to_string()))?;
    let output = args
        .finish()
        .into_iter()
        .next()
        .and_then(|s| s.into_string().ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output.jpg"));

    let mut overlay = MarkerOverlay::open(&input)?;
    for marker in markers {
        overlay.add_marker(marker);
    }
    if demo {
        if let Some(reference) = overlay.reference()? {
            overlay.add_marker(GeoPoint::new(reference.lat + 0.001, reference.lon + 0.001));
            overlay.add_marker(GeoPoint::new(reference.lat - 0.001, reference.lon - 0.001));
        }
    }

    overlay.run(&output)?;
    println!("processed image saved to: {}", output.display());
    Ok(())
}

fn fetch_tiles(mut args: pico_args::Arguments) -> Result<()> {
    let config_path: Option<PathBuf> = args
        .opt_value_from_str("--config")
        .map_err(|e| Error::Config(e.to_string()))?;
    let config = match config_path {
        Some(path) => config::load_from_path(&path)?,
        None => config::load()?,
    };

    let summary = tiles::fetch_all(&config)?;
    println!(
        "downloaded {} tiles ({} skipped, {} failed)",
        summary.downloaded, summary.skipped, summary.failed
    );
    Ok(())
}

fn parse_marker(value: &str) -> std::result::Result<GeoPoint, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{lon}'"))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} outside [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} outside [-180, 180]"));
    }
    Ok(GeoPoint::new(lat, lon))
}
