//! Monte Carlo light transport and the per pixel accumulation loop.
//!
//! Rows are distributed over the rayon pool. Every pixel draws from its own
//! generator seeded from the render seed and the pixel index, so an image is
//! reproducible for a given seed whatever the number of workers.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::camera::Camera;
use super::core::Scene;
use super::error::ConfigError;
use super::material::{orient_normal, Sample};
use super::math::{Color, Ray};

pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Rows finalized between two calls of the rows-finished hook.
pub const PROGRESSIVE_ROWS: usize = 40;

/// Below this density a sampled direction carries no energy.
const PDF_EPSILON: f64 = 1e-12;

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            samples_per_pixel: 8,
            max_depth: DEFAULT_MAX_DEPTH,
            seed: 0,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::InvalidSampleCount);
        }
        Ok(())
    }
}

/// Linear, unclamped colors stored row-major.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zero(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, y: usize) -> &[Color] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[cfg(test)]
    pub(crate) fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Average color over the whole image.
    pub fn mean(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::zero();
        }
        self.pixels.iter().copied().sum::<Color>() / self.pixels.len() as f64
    }
}

/// Estimates the radiance carried back along `ray`.
///
/// A single direction is importance sampled at every hit and followed
/// recursively until `max_depth` bounces, there is no light sampling and no
/// russian roulette. Rays leaving the scene see black.
pub fn radiance<R: Rng>(
    scene: &Scene,
    ray: &Ray,
    depth: u32,
    max_depth: u32,
    rng: &mut R,
) -> Color {
    if depth > max_depth {
        return Color::zero();
    }
    let Some(hit) = scene.intersect_nearest(ray) else {
        return Color::zero();
    };

    let material = &hit.hitted_object.material;
    // outgoing direction, towards the origin of the ray
    let wo = -ray.direction;
    let normal = orient_normal(hit.normal, wo);
    let Sample { wi, pdf } = material.sample_f(normal, wo, rng);

    let reflected = if pdf > PDF_EPSILON && pdf.is_finite() {
        let brdf = material.f(wi, wo, normal);
        let bounce = Ray::new(hit.hit_point, wi);
        let incoming = radiance(scene, &bounce, depth + 1, max_depth, rng);
        brdf * incoming * (wi.dot(normal) / pdf)
    } else {
        Color::zero()
    };
    reflected + material.emission()
}

fn pixel_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_mul(SEED_MIX) ^ index as u64)
}

/// Averages `samples_per_pixel` jittered radiance estimates for pixel `(x, y)`.
pub fn render_pixel(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    x: usize,
    y: usize,
) -> Color {
    let width = settings.width as f64;
    let height = settings.height as f64;
    let mut rng = pixel_rng(settings.seed, y * settings.width as usize + x);
    let weight = 1.0 / settings.samples_per_pixel as f64;

    let mut pixel = Color::zero();
    for _ in 0..settings.samples_per_pixel {
        let sx = (x as f64 + rng.gen::<f64>()) - width * 0.5;
        let sy = (y as f64 + rng.gen::<f64>()) - height * 0.5;
        let ray = camera.spawn_ray(sx, sy);
        pixel += radiance(scene, &ray, 0, settings.max_depth, &mut rng) * weight;
    }
    pixel
}

/// Called after each pixel with `(completed, total)`.
pub type PixelHook<'a> = Box<dyn Fn(usize, usize) + Send + Sync + 'a>;
/// Called with the framebuffer and the number of fully finalized rows.
pub type RowsHook<'a> = Box<dyn FnMut(&Framebuffer, usize) + 'a>;

pub struct Renderer<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    settings: RenderSettings,
    band_rows: usize,
    on_pixel: Option<PixelHook<'a>>,
    on_rows_finished: Option<RowsHook<'a>>,
}

impl<'a> Renderer<'a> {
    pub fn new(scene: &'a Scene, camera: &'a Camera, settings: RenderSettings) -> Self {
        Self {
            scene,
            camera,
            settings,
            band_rows: PROGRESSIVE_ROWS,
            on_pixel: None,
            on_rows_finished: None,
        }
    }

    pub fn on_pixel(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'a) -> Self {
        self.on_pixel = Some(Box::new(hook));
        self
    }

    pub fn on_rows_finished(mut self, hook: impl FnMut(&Framebuffer, usize) + 'a) -> Self {
        self.on_rows_finished = Some(Box::new(hook));
        self
    }

    pub fn band_rows(mut self, rows: usize) -> Self {
        self.band_rows = rows.max(1);
        self
    }

    /// Renders the full image. Invalid settings are rejected before any pixel
    /// is traced.
    pub fn render(self) -> Result<Framebuffer, ConfigError> {
        let Renderer {
            scene,
            camera,
            settings,
            band_rows,
            on_pixel,
            mut on_rows_finished,
        } = self;
        settings.validate()?;
        validate_scene(scene)?;

        let width = settings.width as usize;
        let height = settings.height as usize;
        let total = width * height;
        let completed = AtomicUsize::new(0);
        let mut framebuffer = Framebuffer::new(width, height);

        let mut band_start = 0;
        while band_start < height {
            let band_end = (band_start + band_rows).min(height);
            framebuffer.pixels[band_start * width..band_end * width]
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(i, row)| {
                    let y = band_start + i;
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = render_pixel(scene, camera, &settings, x, y);
                        if let Some(hook) = &on_pixel {
                            hook(completed.fetch_add(1, Ordering::Relaxed) + 1, total);
                        }
                    }
                });
            if let Some(hook) = on_rows_finished.as_mut() {
                hook(&framebuffer, band_end);
            }
            band_start = band_end;
        }
        Ok(framebuffer)
    }
}

fn validate_scene(scene: &Scene) -> Result<(), ConfigError> {
    for (i, sphere) in scene.objects.iter().enumerate() {
        if !(sphere.radius > 0.0 && sphere.radius.is_finite()) {
            return Err(ConfigError::InvalidScene(format!(
                "sphere {} has radius {}",
                i, sphere.radius
            )));
        }
    }
    Ok(())
}
