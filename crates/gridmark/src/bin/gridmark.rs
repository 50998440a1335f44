//! `gridmark`: detect and render square binary-grid markers.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use gridmark::detect::{load_gray, run_image, to_image_gray};
use gridmark::pipeline::overlay::{draw_quad_outline, stamp_patches};
use gridmark::pipeline::render::{MarkerSpec, Scene};
use gridmark::pipeline::{DetectConfig, DetectReport};
use gridmark::{BitGrid, Detection, Detector};

use log::LevelFilter;
#[cfg(not(feature = "tracing"))]
use log::{info, warn};
#[cfg(feature = "tracing")]
use tracing::{info, warn};

#[cfg(feature = "tracing")]
use gridmark::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use gridmark::core::init_with_level;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "gridmark")]
#[command(about = "Detect and render square binary-grid fiducial markers")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect markers in an image and write a JSON report.
    Detect {
        /// Input image; overrides `image_path` from the config.
        image: Option<PathBuf>,

        /// JSON config (`DetectConfig`).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Adaptive threshold aperture (odd, >= 3).
        #[arg(long)]
        aperture: Option<usize>,

        /// Adaptive threshold bias.
        #[arg(long)]
        bias: Option<i32>,

        /// Where to write the JSON report.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Where to write a debug image with outlines and rectified patches.
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Render a marker image.
    Render {
        /// Payload rows, comma separated, e.g. `0111,1101,1011,1111`.
        #[arg(long)]
        payload: String,

        /// Pixels per grid cell.
        #[arg(long, default_value_t = 20)]
        cell_px: usize,

        /// White margin around the marker, in pixels.
        #[arg(long, default_value_t = 40)]
        margin: usize,

        /// Counter-clockwise quarter turns applied to the marker.
        #[arg(long, default_value_t = 0)]
        rotate: usize,

        /// Output image path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    #[cfg(not(feature = "tracing"))]
    init_with_level(cli.log_level.into())?;
    #[cfg(feature = "tracing")]
    init_tracing(false, cli.log_level.into());

    match cli.command {
        Commands::Detect {
            image,
            config,
            aperture,
            bias,
            report,
            overlay,
        } => {
            let mut cfg = match config {
                Some(path) => DetectConfig::load_json(&path)?,
                None => DetectConfig::new(String::new()),
            };
            if let Some(image) = image {
                cfg.image_path = image.to_string_lossy().into_owned();
            }
            if cfg.image_path.is_empty() {
                return Err("no input image: pass a path or a config with image_path".into());
            }
            if let Some(aperture) = aperture {
                cfg.params.aperture_size = aperture;
            }
            if let Some(bias) = bias {
                cfg.params.threshold_bias = bias;
            }
            if let Some(report) = report {
                cfg.output_path = Some(report.to_string_lossy().into_owned());
            }
            if let Some(overlay) = overlay {
                cfg.overlay_path = Some(overlay.to_string_lossy().into_owned());
                cfg.params.keep_patches = true;
            }
            run_detect(&cfg)
        }
        Commands::Render {
            payload,
            cell_px,
            margin,
            rotate,
            out,
        } => run_render(&payload, cell_px, margin, rotate, &out),
    }
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(cfg)))]
fn run_detect(cfg: &DetectConfig) -> CliResult<()> {
    let detector = Detector::new(cfg.params.clone())?;
    let img = load_gray(&cfg.image_path)
        .map_err(|e| -> CliError { format!("failed to open image {}: {e}", cfg.image_path).into() })?;
    info!("image {}x{}", img.width(), img.height());

    let run = run_image(&img, &detector)?;
    if run.detections.is_empty() {
        warn!("no markers detected ({} quad candidates)", run.num_quads);
    }

    println!("detections: {}", run.detections.len());
    for d in &run.detections {
        println!("{}", describe(d));
    }

    if let Some(overlay_path) = &cfg.overlay_path {
        write_overlay(&img, &run.detections, Path::new(overlay_path))?;
        info!("overlay written to {overlay_path}");
    }

    let report = DetectReport::new(
        cfg.image_path.clone(),
        img.width() as usize,
        img.height() as usize,
        cfg.params.clone(),
        run,
    );
    let out = cfg.output_path();
    report.write_json(&out)?;
    info!("report written to {}", out.display());
    Ok(())
}

fn describe(d: &Detection) -> String {
    let rows: Vec<String> = d
        .marker
        .payload
        .to_rows()
        .iter()
        .map(|r| r.iter().map(|b| char::from(b'0' + b)).collect())
        .collect();
    let tl = d.corners[0];
    format!(
        "angle={} payload={} top_left=({:.2},{:.2})",
        d.marker.angle,
        rows.join(","),
        tl.x,
        tl.y
    )
}

fn write_overlay(img: &::image::GrayImage, detections: &[Detection], path: &Path) -> CliResult<()> {
    let mut frame = gridmark::GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    };
    for d in detections {
        draw_quad_outline(&mut frame, &d.corners, 128);
    }
    stamp_patches(&mut frame, detections);
    let out = to_image_gray(&frame).ok_or("overlay dimensions overflow")?;
    out.save(path)?;
    Ok(())
}

fn parse_payload(raw: &str) -> CliResult<BitGrid> {
    let rows = raw
        .split(',')
        .map(|row| {
            row.trim()
                .chars()
                .map(|c| match c {
                    '0' => Ok(0u8),
                    '1' => Ok(1u8),
                    other => Err(format!("invalid payload digit {other:?}")),
                })
                .collect::<Result<Vec<u8>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() || rows[0].is_empty() {
        return Err("payload is empty".into());
    }
    BitGrid::from_rows(&rows).ok_or_else(|| "payload rows must form a square".into())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(payload)))]
fn run_render(payload: &str, cell_px: usize, margin: usize, rotate: usize, out: &Path) -> CliResult<()> {
    if cell_px == 0 {
        return Err("cell_px must be positive".into());
    }
    let spec = MarkerSpec::new(parse_payload(payload)?, cell_px);
    if !spec.has_orientation_key() {
        warn!("payload corners do not hold exactly one black cell; orientation cannot be recovered");
    }

    let marker = spec.render();
    let side = marker.width + 2 * margin;
    let mut scene = Scene::new(side, side, 255);
    scene.place_rotated(&marker, margin, margin, rotate);
    let img = to_image_gray(scene.image()).ok_or("marker image dimensions overflow")?;
    img.save(out)?;
    println!("wrote {} ({side}x{side})", out.display());
    Ok(())
}
