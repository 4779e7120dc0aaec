use std::path::{Path, PathBuf};

use anyhow::Context;
use celestial_avm::xmp::read_tags;
use celestial_avm::{angular_separation, extract_wcs, position_angle, AvmWcs, PixelCoord};
use celestial_core::constants::{ARCSEC_PER_DEGREE, ARCSEC_PER_RAD, RAD_TO_DEG};
use celestial_core::utils::{normalize_angle_rad, normalize_angle_to_positive};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "avm-locate")]
#[command(about = "Locate sky positions in images calibrated with AVM metadata")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log extraction and parsing steps to stderr
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the calibration decoded from an image
    Wcs {
        /// JPEG, PNG or XMP sidecar file
        file: PathBuf,
    },
    /// Project sky positions onto an image
    Locate {
        /// JPEG, PNG or XMP sidecar file
        file: PathBuf,
        /// RA/Dec pairs (degrees, or sexagesimal e.g. 11:38:29.4 +17:58:33)
        #[arg(required = true, num_args = 2.., allow_hyphen_values = true)]
        coords: Vec<String>,
    },
    /// Separation and position angle between two positions
    Separation {
        #[arg(allow_hyphen_values = true)]
        ra1: String,
        #[arg(allow_hyphen_values = true)]
        dec1: String,
        #[arg(allow_hyphen_values = true)]
        ra2: String,
        #[arg(allow_hyphen_values = true)]
        dec2: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("celestial_avm=info".parse()?),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Wcs { file } => {
            let wcs = load_wcs(&file)?;
            match cli.format {
                OutputFormat::Table => print_wcs_table(&wcs),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&wcs)?),
            }
        }
        Commands::Locate { file, coords } => {
            if coords.len() % 2 != 0 {
                anyhow::bail!("Expected RA/Dec pairs, got {} values", coords.len());
            }
            let wcs = load_wcs(&file)?;

            let mut located = Vec::with_capacity(coords.len() / 2);
            for pair in coords.chunks(2) {
                let ra_deg = parse_ra(&pair[0])?;
                let dec_deg = parse_dec(&pair[1])?;
                let pixel = wcs.world_to_pixel(ra_deg, dec_deg);
                located.push(Located {
                    ra_deg,
                    dec_deg,
                    pixel,
                    on_image: wcs.contains_pixel(pixel),
                });
            }

            match cli.format {
                OutputFormat::Table => print_located_table(&located),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&located)?),
            }
        }
        Commands::Separation {
            ra1,
            dec1,
            ra2,
            dec2,
        } => {
            let (ra1, dec1) = (parse_ra(&ra1)?, parse_dec(&dec1)?);
            let (ra2, dec2) = (parse_ra(&ra2)?, parse_dec(&dec2)?);

            let separation = angular_separation(ra1, dec1, ra2, dec2);
            let pa = normalize_angle_to_positive(position_angle(ra1, dec1, ra2, dec2));
            let result = SeparationJson {
                separation_deg: separation * RAD_TO_DEG,
                separation_arcsec: separation * ARCSEC_PER_RAD,
                position_angle_deg: pa * RAD_TO_DEG,
            };

            match cli.format {
                OutputFormat::Table => {
                    println!(
                        "Separation: {:.8}° ({:.3}\")",
                        result.separation_deg, result.separation_arcsec
                    );
                    if separation > 0.0 {
                        println!("Position angle: {:.4}° E of N", result.position_angle_deg);
                    } else {
                        println!("Position angle: undefined (coincident points)");
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }
    }

    Ok(())
}

fn load_wcs(file: &Path) -> anyhow::Result<AvmWcs> {
    let tags =
        read_tags(file).with_context(|| format!("Cannot read AVM tags from {}", file.display()))?;
    extract_wcs(&tags).with_context(|| format!("Invalid AVM calibration in {}", file.display()))
}

fn print_wcs_table(wcs: &AvmWcs) {
    let [ra, dec] = wcs.reference_value();
    let [x, y] = wcs.reference_pixel();
    let [width, height] = wcs.size();
    let [sx, sy] = wcs.scale();

    println!("Reference value: RA={:.10}° Dec={:+.10}°", ra, dec);
    println!("Reference pixel: x={:.3} y={:.3}", x, y);
    println!("Size:            {} x {} px", width, height);
    println!(
        "Scale:           {:.8} {:.8} deg/px ({:.4}\"/px)",
        sx,
        sy,
        sy.abs() * ARCSEC_PER_DEGREE
    );
    println!(
        "Rotation:        {:.4}°",
        normalize_angle_rad(wcs.rotation()) * RAD_TO_DEG
    );
}

#[derive(serde::Serialize)]
struct Located {
    ra_deg: f64,
    dec_deg: f64,
    pixel: PixelCoord,
    on_image: bool,
}

#[derive(serde::Serialize)]
struct SeparationJson {
    separation_deg: f64,
    separation_arcsec: f64,
    position_angle_deg: f64,
}

fn print_located_table(located: &[Located]) {
    for (i, l) in located.iter().enumerate() {
        println!(
            "{:4}: RA={:.6}° Dec={:+.6}° -> x={:.3} y={:.3}{}",
            i + 1,
            l.ra_deg,
            l.dec_deg,
            l.pixel.x(),
            l.pixel.y(),
            if l.on_image { "" } else { " (off image)" }
        );
    }
}

fn parse_ra(s: &str) -> anyhow::Result<f64> {
    parse_sexagesimal(s, &['h', 'm', 's'])
        .map(|hours| hours * 15.0)
        .or_else(|| s.trim().parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Cannot parse RA '{}'", s))
}

fn parse_dec(s: &str) -> anyhow::Result<f64> {
    parse_sexagesimal(s, &['d', 'm', 's'])
        .or_else(|| s.trim().parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Cannot parse Dec '{}'", s))
}

/// `12:30:45.5`, `12h30m45.5s` or `-05d22m30s` style values; plain numbers
/// are left to the caller.
fn parse_sexagesimal(s: &str, units: &[char; 3]) -> Option<f64> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let is_separator = |c: char| c == ':' || c == ' ' || units.contains(&c.to_ascii_lowercase());
    if !body.contains(is_separator) {
        return None;
    }

    let fields: Vec<f64> = body
        .split(is_separator)
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.is_empty() || fields.len() > 3 {
        return None;
    }

    let value = fields
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(f, div)| f / div)
        .sum::<f64>();
    Some(if negative { -value } else { value })
}
