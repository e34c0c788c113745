//! Inline image payloads. A user-selected image is decoded in memory,
//! scaled down so its longer side fits in 400 pixels, re-encoded as a
//! quality-60 JPEG and wrapped in a base64 data URI. Posts carry the
//! result inside the composite description field, so the encoded string
//! is capped to keep storage affordable.

use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};

/// Longest side of the stored image, in pixels.
pub const MAX_DIMENSION: u32 = 400;
/// JPEG quality on the 0-100 scale (the original UI's 0.6 factor).
pub const JPEG_QUALITY: u8 = 60;
/// Hard cap on the encoded payload length.
pub const MAX_ENCODED_LEN: usize = 150_000;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

pub fn encode_image_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow!("can not read {}: {}", path.display(), e))?;
    encode_image_bytes(&bytes)
}

pub fn encode_image_bytes(bytes: &[u8]) -> Result<String> {
    if image::guess_format(bytes).is_err() {
        bail!("please select an image file");
    }
    let img = image::load_from_memory(bytes).map_err(|e| anyhow!("can not decode image: {}", e))?;

    let (width, height) = scaled_dimensions(img.width(), img.height(), MAX_DIMENSION);
    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG carries no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(JPEG_QUALITY))?;

    let encoded = format!(
        "{}{}",
        DATA_URI_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&buf)
    );
    if encoded.len() > MAX_ENCODED_LEN {
        bail!("image is still too large after compression, please choose a smaller one");
    }
    Ok(encoded)
}

/// Cap the longer side at `max`, preserving aspect ratio. Images already
/// inside the cap are left unchanged. Width wins ties the tall way: when
/// `width > height` the width drives the scale, otherwise the height does.
pub fn scaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width > height {
        if width > max {
            let scaled = (u64::from(height) * u64::from(max) / u64::from(width)) as u32;
            (max, scaled.max(1))
        } else {
            (width, height)
        }
    } else if height > max {
        let scaled = (u64::from(width) * u64::from(max) / u64::from(height)) as u32;
        (scaled.max(1), max)
    } else {
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_scales_by_width() {
        assert_eq!(scaled_dimensions(800, 600, 400), (400, 300));
    }

    #[test]
    fn portrait_scales_by_height() {
        assert_eq!(scaled_dimensions(600, 800, 400), (300, 400));
    }

    #[test]
    fn small_images_are_untouched() {
        assert_eq!(scaled_dimensions(300, 200, 400), (300, 200));
        assert_eq!(scaled_dimensions(400, 400, 400), (400, 400));
    }

    #[test]
    fn square_above_the_cap_shrinks_both_sides() {
        assert_eq!(scaled_dimensions(401, 401, 400), (400, 400));
    }

    #[test]
    fn extreme_ratios_never_collapse_to_zero() {
        assert_eq!(scaled_dimensions(10_000, 1, 400), (400, 1));
        assert_eq!(scaled_dimensions(1, 10_000, 400), (1, 400));
    }

    #[test]
    fn reencodes_to_a_bounded_jpeg_data_uri() {
        let pixels = image::RgbImage::from_pixel(800, 500, image::Rgb([120u8, 30, 200]));
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();

        let data_uri = encode_image_bytes(&png).unwrap();
        assert!(data_uri.starts_with(DATA_URI_PREFIX));
        assert!(data_uri.len() <= MAX_ENCODED_LEN);

        let jpeg = base64::engine::general_purpose::STANDARD
            .decode(&data_uri[DATA_URI_PREFIX.len()..])
            .unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 250));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = encode_image_bytes(b"definitely not an image").unwrap_err();
        assert!(err.to_string().contains("image file"));
    }
}
