//! Per-pixel dissimilarity between two co-registered RGB images.

use image::RgbImage;

use crate::error::{Error, Result};

/// Normalizer for the summed absolute channel difference (`3 * 255`).
const MAX_CHANNEL_SUM: f32 = 3.0 * 255.0;

/// One `f32` per pixel: mean absolute channel difference in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DifferenceField {
    /// Compute `(|dR| + |dG| + |dB|) / (3 * 255)` for every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the two images differ in size.
    pub fn between(a: &RgbImage, b: &RgbImage) -> Result<Self> {
        if a.dimensions() != b.dimensions() {
            return Err(Error::DimensionMismatch {
                original: a.dimensions(),
                proposed: b.dimensions(),
            });
        }

        let values = a
            .as_raw()
            .chunks_exact(3)
            .zip(b.as_raw().chunks_exact(3))
            .map(|(pa, pb)| {
                let sum: u32 = pa
                    .iter()
                    .zip(pb)
                    .map(|(&ca, &cb)| u32::from(ca.abs_diff(cb)))
                    .sum();
                #[allow(clippy::cast_precision_loss)]
                let sum = sum as f32;
                sum / MAX_CHANNEL_SUM
            })
            .collect();

        Ok(Self {
            width: a.width(),
            height: a.height(),
            values,
        })
    }

    /// Field width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Field height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn identical_images_produce_zero_field() {
        let img = RgbImage::from_pixel(8, 6, Rgb([12, 200, 77]));
        let field = DifferenceField::between(&img, &img).unwrap();
        assert_eq!(field.values().len(), 48);
        assert!(field.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn black_versus_white_is_one() {
        let black = RgbImage::new(4, 4);
        let white = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let field = DifferenceField::between(&black, &white).unwrap();
        assert!(field.values().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn single_channel_change_is_a_third() {
        let a = RgbImage::new(2, 1);
        let mut b = a.clone();
        b.put_pixel(1, 0, Rgb([255, 0, 0]));
        let field = DifferenceField::between(&a, &b).unwrap();
        assert!(field.get(0, 0).abs() < 1e-6);
        assert!((field.get(1, 0) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = RgbImage::new(4, 4);
        let b = RgbImage::new(4, 5);
        let err = DifferenceField::between(&a, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
