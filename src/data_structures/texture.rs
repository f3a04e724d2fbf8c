//! Image payload preparation.
//!
//! Documents only accept PNG or JPEG bytes. Payloads that already are one of those
//! pass through untouched, anything else the [`image`] crate can read is decoded and
//! re-encoded as PNG.

use std::{io::Cursor, path::Path};

use image::{DynamicImage, ImageFormat, RgbaImage, load_from_memory_with_format};

use crate::error::{ImportError, Result};

/// Formats a document accepts as-is.
pub fn is_web_ready(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Prepare an in-memory image file.
///
/// # Arguments
///
/// * `bytes` are raw image file contents (PNG, JPEG, BMP, ...)
/// * `format_hint` is an optional extension such as `"png"`. If `None` or unknown, the format is sniffed.
pub fn from_bytes(bytes: &[u8], format_hint: Option<&str>) -> Result<Vec<u8>> {
    let format = match format_hint.and_then(ImageFormat::from_extension) {
        Some(format) => format,
        None => image::guess_format(bytes)?,
    };
    if is_web_ready(format) {
        return Ok(bytes.to_vec());
    }
    log::debug!("Re-encoding {:?} image as PNG", format);
    let img = load_from_memory_with_format(bytes, format)?;
    encode_png(&img)
}

/// Prepare uncompressed BGRA8 texels.
pub fn from_bgra_texels(width: u32, height: u32, texels: &[u8]) -> Result<Vec<u8>> {
    let rgba: Vec<u8> = texels
        .chunks_exact(4)
        .flat_map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
        .collect();
    let buffer = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        ImportError::ResourceUnavailable(format!(
            "{} texel bytes do not cover a {}x{} image",
            texels.len(),
            width,
            height
        ))
    })?;
    encode_png(&DynamicImage::ImageRgba8(buffer))
}

/// Prepare an image file on disk.
pub fn from_path(path: &Path) -> Result<Vec<u8>> {
    match ImageFormat::from_path(path) {
        Ok(format) if is_web_ready(format) => Ok(std::fs::read(path)?),
        Ok(_) => {
            let img = image::open(path)?;
            encode_png(&img)
        }
        Err(_) => from_bytes(&std::fs::read(path)?, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255])));
        encode_png(&img).unwrap()
    }

    #[test]
    fn png_passes_through_unchanged() {
        let png = tiny_png();
        assert_eq!(from_bytes(&png, None).unwrap(), png);
        assert_eq!(from_bytes(&png, Some("png")).unwrap(), png);
    }

    #[test]
    fn bmp_is_reencoded_as_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 255])));
        let mut bmp = Cursor::new(Vec::new());
        img.write_to(&mut bmp, ImageFormat::Bmp).unwrap();

        let out = from_bytes(bmp.get_ref(), Some("bmp")).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn bgra_texels_are_swizzled() {
        let png = from_bgra_texels(1, 1, &[10, 20, 30, 40]).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [30, 20, 10, 40]);
    }

    #[test]
    fn short_texel_data_is_rejected() {
        assert!(from_bgra_texels(2, 2, &[0; 4]).is_err());
    }
}
