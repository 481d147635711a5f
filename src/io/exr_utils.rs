/* Copyright 2020 @TwoCookingMice */

use crate::io::image_utils::ImageWriteError;
use crate::math::constants::Float;

use exr::prelude::write_rgb_file;

// Write linear RGB to an OpenEXR file.
pub fn write_exr_to_file(image: &[(Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> Result<(), ImageWriteError> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, width, height, |x, y| {
        image[y * width + x]
    })?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}
