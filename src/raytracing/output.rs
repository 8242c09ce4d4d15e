use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};

use super::error::OutputError;
use super::math::Color;
use super::render::Framebuffer;

pub const GAMMA: f64 = 2.2;

/// Clamps a linear component to `[0, 1]`, applies the display gamma and
/// quantizes to 8 bits with rounding.
pub fn gamma_correction(value: f64) -> u8 {
    let corrected = value.clamp(0.0, 1.0).powf(1.0 / GAMMA);
    (corrected * 255.0 + 0.5).floor() as u8
}

impl From<Color> for Rgba<u8> {
    fn from(value: Color) -> Self {
        Rgba([
            gamma_correction(value.x),
            gamma_correction(value.y),
            gamma_correction(value.z),
            255,
        ])
    }
}

/// Tone maps the framebuffer into an 8 bit RGBA image.
pub fn to_image(framebuffer: &Framebuffer) -> Result<RgbaImage, OutputError> {
    if framebuffer.width() == 0 || framebuffer.height() == 0 {
        return Err(OutputError::EmptyImage);
    }
    let mut buffer: RgbaImage =
        ImageBuffer::new(framebuffer.width() as u32, framebuffer.height() as u32);
    for y in 0..framebuffer.height() {
        for (x, color) in framebuffer.row(y).iter().enumerate() {
            buffer.put_pixel(x as u32, y as u32, (*color).into());
        }
    }
    Ok(buffer)
}

/// Writes the framebuffer to `path`, the format follows the file extension.
pub fn save(framebuffer: &Framebuffer, path: impl AsRef<Path>) -> Result<(), OutputError> {
    to_image(framebuffer)?.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;

    fn expected(value: f64) -> f64 {
        value.clamp(0.0, 1.0).powf(1.0 / GAMMA) * 255.0
    }

    #[test]
    fn gamma_clamps_out_of_range_values() {
        assert_eq!(gamma_correction(-3.0), 0);
        assert_eq!(gamma_correction(0.0), 0);
        assert_eq!(gamma_correction(1.0), 255);
        assert_eq!(gamma_correction(42.0), 255);
        assert_eq!(gamma_correction(f64::NAN), 0);
    }

    #[test]
    fn gamma_brightens_mid_tones() {
        // 0.5 ^ (1 / 2.2) is about 0.73
        assert_eq!(gamma_correction(0.5), 186);
    }

    #[test]
    fn png_round_trip_preserves_tone_mapped_value() {
        for value in [0.0, 0.05, 0.18, 0.5, 0.9, 1.7] {
            let mut framebuffer = Framebuffer::new(3, 2);
            framebuffer.fill(Color::new(value, value * 0.5, 1.0));

            let mut bytes = Vec::new();
            to_image(&framebuffer)
                .unwrap()
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();

            assert_eq!(decoded.dimensions(), (3, 2));
            for pixel in decoded.pixels() {
                let [r, g, b, a] = pixel.0;
                assert!((r as f64 - expected(value)).abs() <= 1.0);
                assert!((g as f64 - expected(value * 0.5)).abs() <= 1.0);
                assert_eq!(b, 255);
                assert_eq!(a, 255);
            }
        }
    }

    #[test]
    fn saves_to_disk() {
        let mut framebuffer = Framebuffer::new(4, 4);
        framebuffer.fill(Color::one() * 0.25);
        let path = std::env::temp_dir().join(format!("tiny-path-{}.png", std::process::id()));
        save(&framebuffer, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.get_pixel(2, 3).0[0], gamma_correction(0.25));
    }

    #[test]
    fn empty_framebuffer_is_rejected() {
        let framebuffer = Framebuffer::new(0, 0);
        assert!(matches!(to_image(&framebuffer), Err(OutputError::EmptyImage)));
    }
}
