//! Data-dependent binarization of a [`DifferenceField`].
//!
//! The cutoff is anchored to a high percentile of a strided sample of the
//! field, scaled and clamped into a fixed band. Sampling bounds the sort cost
//! on large images; the stride formula is fixed so the cutoff is reproducible.

use crate::difference::DifferenceField;
use crate::morphology::Bitmap;

/// Tunable constants for [`adaptive_threshold`].
///
/// The defaults were tuned empirically; treat them as parameters rather than
/// invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Approximate number of samples to draw from the field.
    pub sample_target: usize,
    /// Upper bound on the sampling stride.
    pub max_stride: usize,
    /// Percentile (0..1) of the sorted samples used as the anchor.
    pub percentile: f64,
    /// Multiplier applied to the percentile value.
    pub factor: f32,
    /// Lower clamp for the final cutoff.
    pub min: f32,
    /// Upper clamp for the final cutoff.
    pub max: f32,
    /// Anchor used when there are no samples.
    pub empty_fallback: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            sample_target: 25_000,
            max_stride: 50,
            percentile: 0.95,
            factor: 0.35,
            min: 0.06,
            max: 0.16,
            empty_fallback: 0.1,
        }
    }
}

impl ThresholdParams {
    /// Sampling stride for a field of `pixel_count` values.
    #[must_use]
    pub fn stride(&self, pixel_count: usize) -> usize {
        (pixel_count / self.sample_target.max(1)).clamp(1, self.max_stride.max(1))
    }
}

/// Pick the cutoff separating changed from unchanged pixels.
#[must_use]
pub fn adaptive_threshold(field: &DifferenceField, params: &ThresholdParams) -> f32 {
    let values = field.values();
    let stride = params.stride(values.len());

    let mut samples: Vec<f32> = values.iter().step_by(stride).copied().collect();
    samples.sort_unstable_by(f32::total_cmp);

    let anchor = if samples.is_empty() {
        params.empty_fallback
    } else {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let idx = (params.percentile * samples.len() as f64).floor() as usize;
        samples[idx.min(samples.len() - 1)]
    };

    (anchor * params.factor).clamp(params.min, params.max)
}

/// Set every pixel whose difference is strictly above `cutoff`.
#[must_use]
pub fn binarize(field: &DifferenceField, cutoff: f32) -> Bitmap {
    let data = field.values().iter().map(|&v| u8::from(v > cutoff)).collect();
    Bitmap::from_raw(field.width(), field.height(), data)
        .unwrap_or_else(|| Bitmap::new(field.width(), field.height()))
}
