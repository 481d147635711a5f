// Copyright @yucwang 2026

use crate::io::exr_utils;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ImageEncoder};

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const DISPLAY_GAMMA: Float = 2.2;

#[derive(Debug)]
pub enum ImageWriteError {
    Io(std::io::Error),
    Image(image::ImageError),
    Exr(exr::error::Error),
    UnsupportedFormat(String),
}

impl From<std::io::Error> for ImageWriteError {
    fn from(err: std::io::Error) -> Self {
        ImageWriteError::Io(err)
    }
}

impl From<image::ImageError> for ImageWriteError {
    fn from(err: image::ImageError) -> Self {
        ImageWriteError::Image(err)
    }
}

impl From<exr::error::Error> for ImageWriteError {
    fn from(err: exr::error::Error) -> Self {
        ImageWriteError::Exr(err)
    }
}

impl fmt::Display for ImageWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageWriteError::Io(err) => write!(f, "io error: {}", err),
            ImageWriteError::Image(err) => write!(f, "image error: {}", err),
            ImageWriteError::Exr(err) => write!(f, "exr error: {}", err),
            ImageWriteError::UnsupportedFormat(ext) => write!(f, "unsupported image format: {}", ext),
        }
    }
}

impl std::error::Error for ImageWriteError {}

/// Clamps to [0, 1], gamma encodes and quantizes to 8 bits per channel.
pub fn to_rgb8(bitmap: &Bitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(bitmap.len() * 3);
    for color in bitmap.pixels() {
        for c in 0..3 {
            let v = color[c];
            let v = if v.is_nan() { 0.0 } else { v.max(0.0).min(1.0) };
            out.push((v.powf(1.0 / DISPLAY_GAMMA) * 255.0 + 0.5) as u8);
        }
    }
    out
}

// ASCII pixmap (P3).
pub fn write_ppm<P: AsRef<Path>>(bitmap: &Bitmap, path: P) -> Result<(), ImageWriteError> {
    let path = path.as_ref();
    log::info!("Starting writing ppm image: {}.", path.display());

    let writer = BufWriter::new(File::create(path)?);
    let encoder = PnmEncoder::new(writer).with_subtype(PnmSubtype::Pixmap(SampleEncoding::Ascii));
    encoder.write_image(&to_rgb8(bitmap), bitmap.width() as u32, bitmap.height() as u32, ColorType::Rgb8)?;

    log::info!("PPM written to: {}.", path.display());
    Ok(())
}

/// Picks the encoder from the file extension: `.ppm` or `.exr`.
pub fn write_image<P: AsRef<Path>>(bitmap: &Bitmap, path: P) -> Result<(), ImageWriteError> {
    let path = path.as_ref();
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "ppm" => write_ppm(bitmap, path),
        "exr" => exr_utils::write_exr_to_file(&bitmap.raw_copy(), bitmap.width(), bitmap.height(),
                                              &path.to_string_lossy()),
        _ => Err(ImageWriteError::UnsupportedFormat(ext)),
    }
}
