//! Image decoding into embeddable XObjects.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};
use crate::form::{ColorSpace, ImageFilter, ImageXObject};
use crate::model::{ImageBlob, ImageFormat};

/// Decode an image blob according to its declared MIME type.
///
/// Fails with [`Error::UnsupportedImageFormat`] for anything but JPEG and
/// PNG, and with [`Error::ImageDecode`] when the bytes do not decode.
pub fn decode_image(blob: &ImageBlob) -> Result<ImageXObject> {
    match blob.format() {
        Some(ImageFormat::Jpeg) => decode_jpeg(blob.bytes()),
        Some(ImageFormat::Png) => decode_png(blob.bytes()),
        None => Err(Error::UnsupportedImageFormat(blob.mime().to_string())),
    }
}

/// JPEG data is embedded untouched; decoding only validates it.
fn decode_jpeg(data: &[u8]) -> Result<ImageXObject> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?;
    let (width, height) = img.dimensions();

    let header = scan_jpeg(data);
    let components = header
        .components
        .unwrap_or(if img.color().has_color() { 3 } else { 1 });
    let color_space = match components {
        1 => ColorSpace::Gray,
        4 => ColorSpace::Cmyk,
        _ => ColorSpace::Rgb,
    };

    Ok(ImageXObject {
        width,
        height,
        color_space,
        bits_per_component: 8,
        filter: ImageFilter::Dct,
        data: data.to_vec(),
        soft_mask: None,
        // Adobe writers store CMYK samples inverted
        inverted: color_space == ColorSpace::Cmyk && header.adobe,
    })
}

/// What the marker segments before the first frame say about a JPEG.
#[derive(Debug, Default, PartialEq, Eq)]
struct JpegHeader {
    /// Component count from the start-of-frame marker
    components: Option<u8>,
    /// An APP14 "Adobe" segment is present
    adobe: bool,
}

fn scan_jpeg(data: &[u8]) -> JpegHeader {
    let mut header = JpegHeader::default();
    if !data.starts_with(&[0xFF, 0xD8]) {
        return header;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers carry no length
        if matches!(marker, 0x01 | 0xD0..=0xD7) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if marker == 0xEE && data.get(pos + 4..pos + 9) == Some(&b"Adobe"[..]) {
            header.adobe = true;
        }
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            header.components = data.get(pos + 9).copied();
            break;
        }
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        pos += 2 + len;
    }
    header
}

fn decode_png(data: &[u8]) -> Result<ImageXObject> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)?;
    let (width, height) = img.dimensions();
    let color = img.color();

    let (samples, color_space) = if color.has_color() {
        (img.to_rgb8().into_raw(), ColorSpace::Rgb)
    } else {
        (img.to_luma8().into_raw(), ColorSpace::Gray)
    };

    let soft_mask = if color.has_alpha() {
        alpha_channel(&img).map(|alpha| deflate(&alpha)).transpose()?
    } else {
        None
    };

    Ok(ImageXObject {
        width,
        height,
        color_space,
        bits_per_component: 8,
        filter: ImageFilter::Flate,
        data: deflate(&samples)?,
        soft_mask,
        inverted: false,
    })
}

/// 8-bit alpha samples, or `None` when every pixel is opaque.
fn alpha_channel(img: &DynamicImage) -> Option<Vec<u8>> {
    let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
    if alpha.iter().all(|&a| a == u8::MAX) {
        None
    } else {
        Some(alpha)
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Encode(format!("image compression: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Encode(format!("image compression: {}", e)))
}
