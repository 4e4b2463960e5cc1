//! Compute the optical image of a synthetic scene
//!
//! Builds a uniform, point-source, or bar-pattern scene with a flat
//! spectrum, runs it through the diffraction-limited formation pipeline
//! and prints illuminance and per-wavelength photon statistics.
//!
//! Usage:
//! ```
//! cargo run --release --bin oi_compute -- --pattern point --size 128 --fov 0.5
//! cargo run --release --bin oi_compute -- --optics-file lens.json --diffuser blur --blur-um 2.0
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array3, Axis};
use optical_image_sim::hardware::optics::models;
use optical_image_sim::hardware::{DiffuserMethod, OffAxisMethod, OpticsConfig};
use optical_image_sim::pipeline::NoProgress;
use optical_image_sim::units::{Angle, AngleExt, Length, LengthExt};
use optical_image_sim::{
    compute_optical_image_with_progress, OpticalImage, ProgressSink, Scene, WaveGrid,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pattern {
    /// Constant radiance everywhere
    Uniform,
    /// One bright pixel at the centre
    Point,
    /// Vertical bars, `bar-width` pixels wide
    Bars,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// f/4, 3.86 mm camera-module lens
    Default,
    /// f/4, 50 mm
    #[value(name = "f4-50mm")]
    F4FiftyMm,
    /// f/2.8, 35 mm
    #[value(name = "f2.8-35mm")]
    F28ThirtyFiveMm,
}

/// Command line arguments for optical image computation
#[derive(Parser, Debug)]
#[command(
    name = "Optical Image Compute",
    about = "Forms the diffraction-limited optical image of a synthetic scene",
    long_about = None
)]
struct Args {
    /// Scene pattern
    #[arg(long, value_enum, default_value_t = Pattern::Uniform)]
    pattern: Pattern,

    /// Scene rows and columns
    #[arg(long, default_value_t = 64)]
    size: usize,

    /// Bar width in pixels for the bars pattern
    #[arg(long, default_value_t = 4)]
    bar_width: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 1.0)]
    fov: f64,

    /// First wavelength in nanometers
    #[arg(long, default_value_t = 400.0)]
    wave_start: f64,

    /// Last wavelength in nanometers
    #[arg(long, default_value_t = 700.0)]
    wave_end: f64,

    /// Wavelength step in nanometers
    #[arg(long, default_value_t = 10.0)]
    wave_step: f64,

    /// Radiance of bright pixels, photons/s/sr/m^2/nm
    #[arg(long, default_value_t = 1e16)]
    radiance: f64,

    /// Source distance in meters; omit for a source at infinity
    #[arg(long)]
    distance: Option<f64>,

    /// Predefined lens
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    /// JSON optics configuration; overrides --preset
    #[arg(long)]
    optics_file: Option<String>,

    /// Optics model override (diffractionLimited, skip)
    #[arg(long)]
    model: Option<String>,

    /// f-number override
    #[arg(long)]
    f_number: Option<f64>,

    /// Off-axis method override (cos4th, none)
    #[arg(long)]
    off_axis: Option<String>,

    /// Diffuser method override (skip, blur, birefringent)
    #[arg(long)]
    diffuser: Option<String>,

    /// Diffuser blur scale in micrometers
    #[arg(long)]
    blur_um: Option<f64>,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

/// Progress bar fed by pipeline checkpoints
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:>12} [{bar:40.cyan/blue}] {pos}%")?
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        Ok(Self { bar })
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, fraction: f64, stage: &str) {
        self.bar.set_position((fraction * 100.0).round() as u64);
        self.bar.set_message(stage.to_string());
        if fraction >= 1.0 {
            self.bar.finish();
        }
    }
}

fn build_optics(args: &Args) -> Result<OpticsConfig> {
    let mut optics = match &args.optics_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading optics file {path}"))?;
            OpticsConfig::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => match args.preset {
            Preset::Default => models::DEFAULT_LENS.clone(),
            Preset::F4FiftyMm => models::F4_50MM.clone(),
            Preset::F28ThirtyFiveMm => models::F2_8_35MM.clone(),
        },
    };

    if let Some(model) = &args.model {
        optics = optics.with_model_name(model)?;
    }
    if let Some(n) = args.f_number {
        optics = optics.with_f_number(n);
    }
    if let Some(method) = &args.off_axis {
        optics = optics.with_off_axis(OffAxisMethod::parse_or_default(method));
    }
    let blur = args
        .blur_um
        .map(Length::from_micrometers)
        .or(optics.diffuser_blur_scale());
    let diffuser = match &args.diffuser {
        Some(method) => DiffuserMethod::parse_or_default(method),
        None => optics.diffuser_method(),
    };
    Ok(optics.with_diffuser(diffuser, blur))
}

fn build_scene(args: &Args) -> Result<Scene> {
    let grid = WaveGrid::uniform(args.wave_start, args.wave_end, args.wave_step)?;
    let fov = Angle::from_degrees(args.fov);
    let distance = Length::from_meters(args.distance.unwrap_or(f64::INFINITY));
    let n = args.size;

    let scene = match args.pattern {
        Pattern::Uniform => Scene::uniform(n, n, grid, args.radiance, fov, distance)?,
        Pattern::Point => Scene::point_source(n, n, grid, args.radiance, fov, distance)?,
        Pattern::Bars => {
            let width = args.bar_width.max(1);
            let radiance = Array3::from_shape_fn((n, n, grid.len()), |(_, col, _)| {
                if (col / width) % 2 == 0 {
                    args.radiance
                } else {
                    0.0
                }
            });
            Scene::new("bars", radiance, grid, fov, distance)?
        }
    };
    Ok(scene)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let optics = build_optics(&args)?;
    let scene = build_scene(&args)?;

    println!(
        "Lens: {} ({}, f/{}, {:.2} mm)",
        optics.name(),
        optics.model(),
        optics.f_number(),
        optics.focal_length().as_millimeters()
    );
    println!(
        "  off-axis: {}, diffuser: {}",
        optics.off_axis_method(),
        optics.diffuser_method()
    );
    println!(
        "Scene: {} {}x{} with {} wavelengths, fov {:.3} deg",
        scene.name(),
        scene.size().0,
        scene.size().1,
        scene.wavelengths().len(),
        scene.field_of_view_deg()
    );

    let oi = OpticalImage::new(optics);
    let oi = if args.no_progress {
        compute_optical_image_with_progress(&scene, oi, &mut NoProgress)?
    } else {
        compute_optical_image_with_progress(&scene, oi, &mut BarProgress::new()?)?
    };

    let (rows, cols) = oi.size();
    println!("\nOptical image {rows}x{cols}");
    if let (Some(dx), Some(fov)) = (oi.sample_spacing(), oi.padded_field_of_view_deg()) {
        println!(
            "  sample spacing {:.4} um, padded fov {:.4} deg",
            dx.as_micrometers(),
            fov
        );
    }
    if let Some(map) = oi.illuminance() {
        let min = map.iter().copied().fold(f64::INFINITY, f64::min);
        let max = map.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "  illuminance: mean {:.4e} lux, min {:.4e}, max {:.4e}",
            oi.mean_illuminance().unwrap_or(0.0),
            min,
            max
        );
    }

    println!("\n{:>10} {:>14} {:>14}", "nm", "scene sum", "image sum");
    for (k, wavelength) in scene.wavelengths().iter().enumerate() {
        let before = scene.radiance().index_axis(Axis(2), k).sum();
        let after = oi.spectral_irradiance().index_axis(Axis(2), k).sum();
        println!("{wavelength:>10.1} {before:>14.4e} {after:>14.4e}");
    }

    Ok(())
}
