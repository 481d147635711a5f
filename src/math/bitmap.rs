// Copyright 2020 @TwoCookingMice

use super::spectrum::RGBSpectrum;
use super::constants::Float;

use std::ops;
use std::vec::Vec;

/// Row-major RGB framebuffer. Indexing is `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    data: Vec<RGBSpectrum>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = RGBSpectrum;

    fn index(&self, index: (usize, usize)) -> &RGBSpectrum {
        &self.data[self.offset(index.0, index.1)]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut RGBSpectrum {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, RGBSpectrum::default())
    }

    pub fn filled(width: usize, height: usize, color: RGBSpectrum) -> Self {
        Self { data: vec![color; width * height],
               width: width,
               height: height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: RGBSpectrum) {
        self[(row, col)] = color;
    }

    pub fn pixel(&self, row: usize, col: usize) -> RGBSpectrum {
        self[(row, col)]
    }

    pub fn fill(&mut self, color: RGBSpectrum) {
        for c in self.data.iter_mut() {
            *c = color;
        }
    }

    pub fn pixels(&self) -> &[RGBSpectrum] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [RGBSpectrum] {
        &mut self.data
    }

    pub fn raw_copy(&self) -> Vec<(Float, Float, Float)> {
        self.data.iter().map(|c| (c[0], c[1], c[2])).collect()
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(row < self.height && col < self.width,
                "pixel ({}, {}) out of bounds for {}x{}", row, col, self.width, self.height);
        col + self.width * row
    }
}

/* Test for Bitmap */
#[cfg(test)]
mod tests {
    use super::Bitmap;
    use super::RGBSpectrum;

    #[test]
    fn test_bitmap_basic_functions() {
        let mut bitmap = Bitmap::new(256usize, 128usize);
        assert_eq!(bitmap.width(), 256);
        assert_eq!(bitmap.height(), 128);
        assert_eq!(bitmap.len(), 256 * 128);

        bitmap.set_pixel(5, 6, RGBSpectrum::new(1.0, 0.5, 0.6));
        assert_eq!(bitmap[(5, 6)], RGBSpectrum::new(1.0, 0.5, 0.6));
        assert_eq!(bitmap.pixel(6, 5), RGBSpectrum::default());
        assert_eq!(bitmap.pixels()[5 * 256 + 6][1], 0.5);
    }

    #[test]
    fn test_bitmap_fill_and_raw_copy() {
        let mut bitmap = Bitmap::new(3, 2);
        bitmap.fill(RGBSpectrum::new(0.1, 0.2, 0.3));
        let raw = bitmap.raw_copy();
        assert_eq!(raw.len(), 6);
        assert!(raw.iter().all(|p| *p == (0.1, 0.2, 0.3)));
    }

    #[test]
    #[should_panic]
    fn test_bitmap_out_of_bounds() {
        let bitmap = Bitmap::new(2, 2);
        let _ = bitmap.pixel(2, 0);
    }
}
