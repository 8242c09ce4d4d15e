use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

mod raytracing;
use raytracing::camera::Camera;
use raytracing::core::Scene;
use raytracing::output;
use raytracing::parser::{SceneDescription, SceneParser};
use raytracing::render::{RenderSettings, Renderer, DEFAULT_MAX_DEPTH, PROGRESSIVE_ROWS};
use raytracing::Vec3;

const DEFAULT_SIZE: u32 = 512;

#[derive(Debug, Parser)]
#[command(version, about = "Monte Carlo path tracer for sphere scenes", long_about = None)]
struct Args {
    /// scene description file, the built-in box is rendered when omitted
    scene: Option<PathBuf>,
    /// image width, defaults to the scene size header or 512
    #[arg(short = 'W', long)]
    width: Option<u32>,
    /// image height, defaults to the scene size header or 512
    #[arg(short = 'H', long)]
    height: Option<u32>,
    /// the number of rays shot per pixel
    #[arg(short, long, default_value_t = 8)]
    spp: u32,
    /// the number of bounces after the first hit
    #[arg(short = 'd', long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,
    /// the path where the rendered image is saved
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,
    /// save the image while rendering (default)
    #[arg(long, overrides_with = "no_progressive_save")]
    progressive_save: bool,
    /// only save the image once rendering is done
    #[arg(long, overrides_with = "progressive_save")]
    no_progressive_save: bool,
    /// rows rendered between two progressive saves
    #[arg(long, default_value_t = PROGRESSIVE_ROWS)]
    save_every: usize,
    /// seed of the sample streams, random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// number of worker threads, all cores when omitted
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

fn load_scene(args: &Args) -> Result<SceneDescription> {
    let Some(path) = &args.scene else {
        return Ok(SceneDescription {
            size: None,
            camera: Camera::new(
                Vec3::new(0.0, 0.0, -20.0),
                Vec3::zero(),
                400.0,
                Vec3::y_axis(),
            ),
            scene: Scene::cornell_box(),
        });
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read scene file {}", path.display()))?;
    SceneParser::new(&content).parse_scene().map_err(|error| {
        if let Some(location) = error.error_location(&content) {
            log::error!("{}\n{}", error, location);
        }
        anyhow::Error::new(error).context(format!("cannot parse {}", path.display()))
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("cannot configure the worker pool")?;
    }

    let SceneDescription {
        size,
        camera,
        scene,
    } = load_scene(&args)?;
    let (default_width, default_height) = size.unwrap_or((DEFAULT_SIZE, DEFAULT_SIZE));
    let settings = RenderSettings {
        width: args.width.unwrap_or(default_width),
        height: args.height.unwrap_or(default_height),
        samples_per_pixel: args.spp,
        max_depth: args.max_depth,
        seed: args.seed.unwrap_or_else(rand::random),
    };

    log::info!(
        "Rendering {}x{} with {} spp, max depth {}, {} spheres (seed {})",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        settings.max_depth,
        scene.objects.len(),
        settings.seed
    );

    let progressive = args.progressive_save || !args.no_progressive_save;
    let output_path = &args.output;
    let start = Instant::now();
    let framebuffer = Renderer::new(&scene, &camera, settings)
        .band_rows(args.save_every)
        .on_pixel(|completed, total| {
            let step = (total / 100).max(1);
            if completed % step == 0 || completed == total {
                log::info!("{:3}% complete", completed * 100 / total);
            }
        })
        .on_rows_finished(|framebuffer, rows| {
            if !progressive || rows == framebuffer.height() {
                return;
            }
            match output::save(framebuffer, output_path) {
                Ok(()) => log::debug!("saved {} finished rows to {}", rows, output_path.display()),
                Err(err) => log::warn!("progressive save failed: {}", err),
            }
        })
        .render()?;

    log::info!("Render completed in {:.2?}", start.elapsed());
    log::debug!("mean pixel value {:.4}", framebuffer.mean().average());

    output::save(&framebuffer, output_path)
        .with_context(|| format!("cannot save {}", output_path.display()))?;
    log::info!("Saved {}", output_path.display());
    Ok(())
}
