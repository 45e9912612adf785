use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::types::{EnhancedImage, RawImage};

/// Added to every luminance value before the contrast stretch.
pub const BRIGHTNESS: f64 = 10.0;
/// Contrast setting fed into the midpoint-stretch factor.
pub const CONTRAST: f64 = 50.0;

const SHARPEN: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

pub const ENHANCED_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode enhanced image: {0}")]
    Encode(String),
}

/// Fixed grayscale → brightness/contrast → sharpen filter chain, tuned for
/// phone photos of printed receipts. No per-image auto-exposure: the same
/// input always produces the same pixels.
#[derive(Debug, Clone, Copy)]
pub struct ImageEnhancer {
    jpeg_quality: u8,
}

impl Default for ImageEnhancer {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl ImageEnhancer {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality: jpeg_quality.clamp(1, 100) }
    }

    pub fn enhance(&self, raw: &RawImage) -> Result<EnhancedImage, EnhanceError> {
        let img = image::load_from_memory(&raw.data)?;
        let pixels = enhance_pixels(&img);
        let data = encode_jpeg(&pixels, self.jpeg_quality)?;
        debug!(
            width = pixels.width(),
            height = pixels.height(),
            in_bytes = raw.data.len(),
            out_bytes = data.len(),
            "enhanced bill image"
        );
        Ok(EnhancedImage {
            width: pixels.width(),
            height: pixels.height(),
            data,
            mime_type: ENHANCED_MIME,
        })
    }
}

/// Run the full filter chain on decoded pixels. Output has the source
/// dimensions, R = G = B everywhere, and the source alpha.
pub fn enhance_pixels(img: &DynamicImage) -> RgbaImage {
    sharpen(&grayscale_tone(&img.to_rgba8()))
}

/// Perceptual luminance.
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

pub fn contrast_factor(contrast: f64) -> f64 {
    (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast))
}

/// Brightness offset then midpoint contrast stretch, clamped and rounded to
/// an 8-bit value (nearest, ties to even).
pub fn adjust_tone(gray: f64) -> u8 {
    let color = contrast_factor(CONTRAST) * (gray + BRIGHTNESS - 128.0) + 128.0;
    color.clamp(0.0, 255.0).round_ties_even() as u8
}

fn grayscale_tone(src: &RgbaImage) -> RgbaImage {
    ImageBuffer::from_fn(src.width(), src.height(), |x, y| {
        let Rgba([r, g, b, a]) = *src.get_pixel(x, y);
        let v = adjust_tone(luminance(r, g, b));
        Rgba([v, v, v, a])
    })
}

/// 3×3 sharpen. Neighbours outside the image take the nearest edge pixel.
pub fn sharpen(src: &RgbaImage) -> RgbaImage {
    let (w, h) = src.dimensions();
    let max_x = w as i64 - 1;
    let max_y = h as i64 - 1;
    ImageBuffer::from_fn(w, h, |x, y| {
        let mut acc = [0i32; 3];
        for (ky, row) in SHARPEN.iter().enumerate() {
            for (kx, &weight) in row.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let sx = (x as i64 + kx as i64 - 1).clamp(0, max_x) as u32;
                let sy = (y as i64 + ky as i64 - 1).clamp(0, max_y) as u32;
                let p = src.get_pixel(sx, sy);
                for (c, sum) in acc.iter_mut().enumerate() {
                    *sum += i32::from(p[c]) * weight;
                }
            }
        }
        let alpha = src.get_pixel(x, y)[3];
        Rgba([
            acc[0].clamp(0, 255) as u8,
            acc[1].clamp(0, 255) as u8,
            acc[2].clamp(0, 255) as u8,
            alpha,
        ])
    })
}

/// JPEG has no alpha channel and the channels are already equal, so the
/// payload is written as single-channel grayscale.
fn encode_jpeg(pixels: &RgbaImage, quality: u8) -> Result<Vec<u8>, EnhanceError> {
    let gray: GrayImage = ImageBuffer::from_fn(pixels.width(), pixels.height(), |x, y| {
        Luma([pixels.get_pixel(x, y)[0]])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&gray)
        .map_err(|e| EnhanceError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn solid_rgba(width: u32, height: u32, px: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |_, _| Rgba(px))
    }

    fn colourful(width: u32, height: u32) -> DynamicImage {
        let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 7 % 256) as u8,
                if (x + y) % 2 == 0 { 255 } else { 128 },
            ])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn mid_gray_golden_value() {
        // factor = 78995 / 53295; 128 + 10 * factor = 142.82...
        assert_eq!(adjust_tone(128.0), 143);
    }

    #[test]
    fn tone_clamps_at_both_ends() {
        assert_eq!(adjust_tone(0.0), 0);
        assert_eq!(adjust_tone(255.0), 255);
    }

    #[test]
    fn contrast_factor_matches_formula() {
        let f = contrast_factor(50.0);
        assert!((f - 78995.0 / 53295.0).abs() < 1e-12);
        assert!((contrast_factor(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn luminance_weights_sum_to_one() {
        assert!((luminance(200, 200, 200) - 200.0).abs() < 1e-9);
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn output_is_gray_with_same_dimensions_and_alpha() {
        let src = colourful(17, 9);
        let out = enhance_pixels(&src);
        assert_eq!(out.dimensions(), (17, 9));
        let src_rgba = src.to_rgba8();
        for (x, y, p) in out.enumerate_pixels() {
            assert_eq!(p[0], p[1], "pixel ({x},{y})");
            assert_eq!(p[1], p[2], "pixel ({x},{y})");
            assert_eq!(p[3], src_rgba.get_pixel(x, y)[3], "alpha at ({x},{y})");
        }
    }

    #[test]
    fn sharpen_keeps_flat_image() {
        let flat = solid_rgba(6, 5, [128, 128, 128, 255]);
        assert_eq!(sharpen(&flat), flat);
    }

    #[test]
    fn sharpen_clamps_to_edge_pixels() {
        let mut img = solid_rgba(3, 3, [0, 0, 0, 255]);
        img.put_pixel(0, 0, Rgba([40, 40, 40, 255]));
        let out = sharpen(&img);
        // Up and left neighbours of the corner repeat the corner itself:
        // 5*40 - 40 - 40 = 120. Zero padding would give 200.
        assert_eq!(out.get_pixel(0, 0)[0], 120);
        // 5*0 - 40 clamps to 0.
        assert_eq!(out.get_pixel(1, 0)[0], 0);
        assert_eq!(out.get_pixel(2, 2)[0], 0);
    }

    #[test]
    fn flat_mid_gray_enhances_to_golden_value() {
        let src = DynamicImage::ImageRgba8(solid_rgba(4, 4, [128, 128, 128, 255]));
        let out = enhance_pixels(&src);
        assert!(out.pixels().all(|p| p.0 == [143, 143, 143, 255]));
    }

    #[test]
    fn enhance_produces_jpeg_of_same_size() {
        let src = colourful(32, 20);
        let raw = RawImage::from_bytes(png_bytes(&src));
        let out = ImageEnhancer::default().enhance(&raw).unwrap();
        assert_eq!((out.width, out.height), (32, 20));
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(&out.data[..3], b"\xFF\xD8\xFF");
        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 20));
    }

    #[test]
    fn enhance_leaves_input_untouched() {
        let raw = RawImage::from_bytes(png_bytes(&colourful(8, 8)));
        let before = raw.clone();
        ImageEnhancer::default().enhance(&raw).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn undecodable_input_is_a_decode_error() {
        let raw = RawImage::new(b"definitely not pixels".to_vec(), "image/png");
        let err = ImageEnhancer::default().enhance(&raw).unwrap_err();
        assert!(matches!(err, EnhanceError::Decode(_)));
    }

    #[test]
    fn too_wide_for_jpeg_is_an_encode_error() {
        let pixels = solid_rgba(65_536, 1, [90, 90, 90, 255]);
        assert!(matches!(encode_jpeg(&pixels, 95), Err(EnhanceError::Encode(_))));
    }

    #[test]
    fn enhance_reports_encode_failure() {
        let wide = DynamicImage::ImageRgba8(solid_rgba(65_536, 1, [200, 10, 10, 255]));
        let raw = RawImage::from_bytes(png_bytes(&wide));
        let err = ImageEnhancer::default().enhance(&raw).unwrap_err();
        assert!(matches!(err, EnhanceError::Encode(_)));
    }
}
