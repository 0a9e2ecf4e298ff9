//! Guide-image compositing.

use image::{GrayImage, RgbImage};

use crate::error::{Error, Result};

/// Hard-mask values strictly above this select the proposed pixel.
pub const HARD_MASK_CUTOFF: u8 = 127;

/// Proposed content inside the hard mask, original content outside.
///
/// No blending happens here; edge smoothness comes from the soft mask.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if `proposed` or `hard_mask` differ in
/// size from `original`.
pub fn compose_guide(
    original: &RgbImage,
    proposed: &RgbImage,
    hard_mask: &GrayImage,
) -> Result<RgbImage> {
    for other in [proposed.dimensions(), hard_mask.dimensions()] {
        if other != original.dimensions() {
            return Err(Error::DimensionMismatch {
                original: original.dimensions(),
                proposed: other,
            });
        }
    }

    Ok(RgbImage::from_fn(original.width(), original.height(), |x, y| {
        if hard_mask.get_pixel(x, y).0[0] > HARD_MASK_CUTOFF {
            *proposed.get_pixel(x, y)
        } else {
            *original.get_pixel(x, y)
        }
    }))
}
