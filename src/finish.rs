//! Grow, feather and upsample the selected region into delivery masks.
//!
//! Produces two full-resolution masks from one working-resolution bitmap:
//! a *soft* mask (blurred, Lanczos-upsampled) for the inpainting model, and a
//! *hard* 0/255 mask (nearest-neighbor) used only to pick compositing sources.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::morphology::{self, Bitmap};

/// Structuring-element radii and blur sigma derived from working resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radii {
    /// Opening radius, removes speckle after binarization.
    pub open: u32,
    /// Closing radius, fills holes after opening.
    pub close: u32,
    /// Square growth radius applied to the selected region.
    pub grow: u32,
    /// Vertical-only growth radius applied after the square growth.
    pub grow_vertical: u32,
    /// Gaussian sigma for edge feathering.
    pub feather_sigma: f32,
}

impl Radii {
    /// Radii for a working image of `width x height`.
    #[must_use]
    pub fn for_working_dims(width: u32, height: u32) -> Self {
        let min_dim = width.min(height);
        let grow = scaled(min_dim, 0.02, 10, 40);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let grow_vertical = (f64::from(grow) * 1.2).round() as u32;
        #[allow(clippy::cast_precision_loss)]
        let feather_sigma = scaled(min_dim, 0.008, 6, 20) as f32;
        Self {
            open: scaled(min_dim, 0.003, 2, 4),
            close: scaled(min_dim, 0.01, 4, 10),
            grow,
            grow_vertical,
            feather_sigma,
        }
    }
}

/// `clamp(round(min_dim * fraction), lo, hi)`.
fn scaled(min_dim: u32, fraction: f64, lo: u32, hi: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let r = (f64::from(min_dim) * fraction).round() as u32;
    r.clamp(lo, hi)
}

/// Full-resolution masks ready for compositing and delivery.
#[derive(Debug, Clone)]
pub struct FinishedMask {
    /// Feathered mask, values `0..=255`.
    pub soft: GrayImage,
    /// Binary `0`/`255` mask.
    pub hard: GrayImage,
}

/// Enlarge the region so the edit has margin and seams stay hidden.
#[must_use]
pub fn grow(region: &Bitmap, radii: &Radii) -> Bitmap {
    let grown = morphology::dilate(region, radii.grow);
    morphology::dilate_vertical(&grown, radii.grow_vertical)
}

/// Gaussian-blur a mask to soften its edge.
#[must_use]
pub fn feather(mask: &GrayImage, sigma: f32) -> GrayImage {
    if mask.pixels().all(|p| p.0[0] == 0) {
        return mask.clone();
    }
    imageops::blur(mask, sigma)
}

fn upsample(mask: &GrayImage, width: u32, height: u32, filter: FilterType) -> GrayImage {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    imageops::resize(mask, width, height, filter)
}

/// Run the full finishing sequence on the selected region.
#[must_use]
pub fn finish_mask(region: &Bitmap, radii: &Radii, width: u32, height: u32) -> FinishedMask {
    let binary = grow(region, radii).to_gray_image();
    let feathered = feather(&binary, radii.feather_sigma);

    FinishedMask {
        soft: upsample(&feathered, width, height, FilterType::Lanczos3),
        hard: upsample(&binary, width, height, FilterType::Nearest),
    }
}
