//! Mask generation pipeline: decode, resample, diff, threshold, clean,
//! select, finish, composite.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::composite::compose_guide;
use crate::difference::DifferenceField;
use crate::error::{Error, ImageRole, Result};
use crate::finish::{finish_mask, Radii};
use crate::invoker::{EditParams, EditRequest};
use crate::morphology::{self, Bitmap};
use crate::region::{dominant_region, RegionBias};
use crate::threshold::{adaptive_threshold, binarize, ThresholdParams};

/// Long-edge cap for the working resolution.
pub const DEFAULT_MAX_WORKING_DIM: u32 = 768;

/// Options controlling mask generation.
#[derive(Debug, Clone)]
pub struct MaskOptions {
    /// Long edge of the working resolution; larger inputs are downscaled.
    pub max_working_dim: u32,
    /// Fill-resize a differently sized proposed image to the original's
    /// dimensions instead of rejecting it.
    pub fill_proposed: bool,
    /// Adaptive threshold constants.
    pub threshold: ThresholdParams,
    /// Region scoring weights.
    pub region: RegionBias,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            max_working_dim: DEFAULT_MAX_WORKING_DIM,
            fill_proposed: false,
            threshold: ThresholdParams::default(),
            region: RegionBias::default(),
        }
    }
}

/// Diagnostics collected while generating a mask.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskStats {
    /// Full input resolution.
    pub full: (u32, u32),
    /// Resolution the diff and morphology ran at.
    pub working: (u32, u32),
    /// Difference cutoff chosen for binarization.
    pub threshold: f32,
    /// Pixels above the cutoff, before cleanup.
    pub changed_pixels: usize,
    /// Pixels left after opening and closing.
    pub cleaned_pixels: usize,
    /// Pixels in the selected region, before growth.
    pub region_area: usize,
    /// Working-resolution centroid of the selected region.
    pub region_centroid: Option<(f64, f64)>,
    /// Radii used at this working resolution.
    pub radii: Radii,
}

impl MaskStats {
    /// No region survived; the mask is all zero and the guide equals the
    /// original.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region_area == 0
    }
}

/// In-memory pipeline output at full resolution.
#[derive(Debug, Clone)]
pub struct MaskArtifacts {
    /// Feathered mask for the inpainting model.
    pub soft_mask: GrayImage,
    /// Binary mask used for compositing.
    pub hard_mask: GrayImage,
    /// Proposed content inside the hard mask, original outside.
    pub guide: RgbImage,
    /// Pipeline diagnostics.
    pub stats: MaskStats,
}

/// PNG-encoded pipeline output.
#[derive(Debug, Clone)]
pub struct EncodedMask {
    /// Single-channel PNG.
    pub soft_mask: Vec<u8>,
    /// Three-channel PNG.
    pub guide_image: Vec<u8>,
    /// Pipeline diagnostics.
    pub stats: MaskStats,
}

/// Result of [`generate_mask`]: encoded images plus the edit parameters they
/// were generated for.
#[derive(Debug, Clone)]
pub struct MaskOutput {
    /// Single-channel PNG.
    pub soft_mask: Vec<u8>,
    /// Three-channel PNG.
    pub guide_image: Vec<u8>,
    /// Validated edit parameters.
    pub params: EditParams,
}

impl MaskOutput {
    /// Package this output for an [`EditInvoker`](crate::invoker::EditInvoker).
    #[must_use]
    pub fn into_edit_request(self) -> EditRequest {
        EditRequest {
            guide_image: self.guide_image,
            soft_mask: self.soft_mask,
            params: self.params,
        }
    }
}

/// Result of processing one original/proposed file pair.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the original image.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the generated mask is empty (no change found).
    pub empty: bool,
    /// Diagnostics, when the pipeline ran.
    pub stats: Option<MaskStats>,
    /// Human-readable status message.
    pub message: String,
}

/// The mask generator.
///
/// Holds only configuration; every call allocates its own buffers, so one
/// engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct MaskEngine {
    options: MaskOptions,
}

impl MaskEngine {
    /// Create an engine with the given options.
    #[must_use]
    pub fn new(options: MaskOptions) -> Self {
        Self { options }
    }

    /// The engine's options.
    #[must_use]
    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    /// Working resolution for a `width x height` input.
    ///
    /// The long edge is capped at `max_working_dim`; smaller images are left
    /// at full size.
    #[must_use]
    pub fn working_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let long = width.max(height);
        let cap = self.options.max_working_dim.max(1);
        if long <= cap {
            return (width, height);
        }
        let scale = f64::from(cap) / f64::from(long);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fit = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
        (fit(width), fit(height))
    }

    /// Run the pipeline on decoded images.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyImage`] for a zero-sized input and
    /// [`Error::DimensionMismatch`] when the sizes differ and
    /// `fill_proposed` is off.
    pub fn generate_from_images(
        &self,
        original: &RgbImage,
        proposed: &RgbImage,
    ) -> Result<MaskArtifacts> {
        ensure_non_empty(original, ImageRole::Original)?;
        ensure_non_empty(proposed, ImageRole::Proposed)?;

        let (width, height) = original.dimensions();
        let proposed = if proposed.dimensions() == (width, height) {
            Cow::Borrowed(proposed)
        } else if self.options.fill_proposed {
            log::debug!(
                "fill-resizing proposed {}x{} to {width}x{height}",
                proposed.width(),
                proposed.height()
            );
            Cow::Owned(imageops::resize(
                proposed,
                width,
                height,
                FilterType::Lanczos3,
            ))
        } else {
            return Err(Error::DimensionMismatch {
                original: (width, height),
                proposed: proposed.dimensions(),
            });
        };

        let (mw, mh) = self.working_dims(width, height);
        let small_original = downsample(original, mw, mh);
        let small_proposed = downsample(&proposed, mw, mh);

        let field = DifferenceField::between(&small_original, &small_proposed)?;
        let threshold = adaptive_threshold(&field, &self.options.threshold);
        let changed = binarize(&field, threshold);

        let radii = Radii::for_working_dims(mw, mh);
        let cleaned = morphology::close(&morphology::open(&changed, radii.open), radii.close);

        let region = dominant_region(&cleaned, &self.options.region);
        let selected = region
            .as_ref()
            .map_or_else(|| Bitmap::new(mw, mh), |r| r.to_bitmap(mw, mh));

        let stats = MaskStats {
            full: (width, height),
            working: (mw, mh),
            threshold,
            changed_pixels: changed.count_ones(),
            cleaned_pixels: cleaned.count_ones(),
            region_area: region.as_ref().map_or(0, |r| r.area()),
            region_centroid: region.as_ref().map(|r| r.centroid()),
            radii,
        };
        log::debug!(
            "working {mw}x{mh}, threshold {threshold:.4}, changed {} -> cleaned {} px",
            stats.changed_pixels,
            stats.cleaned_pixels
        );
        match stats.region_centroid {
            Some((cx, cy)) => log::debug!(
                "selected region: {} px at ({cx:.1}, {cy:.1})",
                stats.region_area
            ),
            None => log::debug!("no changed region found, mask is empty"),
        }

        let finished = finish_mask(&selected, &radii, width, height);
        let guide = compose_guide(original, &proposed, &finished.hard)?;

        Ok(MaskArtifacts {
            soft_mask: finished.soft,
            hard_mask: finished.hard,
            guide,
            stats,
        })
    }

    /// Decode two encoded images, run the pipeline, and PNG-encode the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for undecodable input, plus anything
    /// [`generate_from_images`](Self::generate_from_images) returns.
    pub fn generate(&self, original: &[u8], proposed: &[u8]) -> Result<EncodedMask> {
        let original = decode_rgb(original, ImageRole::Original)?;
        let proposed = decode_rgb(proposed, ImageRole::Proposed)?;
        let artifacts = self.generate_from_images(&original, &proposed)?;

        Ok(EncodedMask {
            soft_mask: encode_png(DynamicImage::ImageLuma8(artifacts.soft_mask))?,
            guide_image: encode_png(DynamicImage::ImageRgb8(artifacts.guide))?,
            stats: artifacts.stats,
        })
    }

    /// Process one file pair: read, generate, write `<stem>_mask.png` and
    /// `<stem>_guide.png` into `output_dir` (or next to the original).
    #[must_use]
    pub fn process_files(
        &self,
        original: &Path,
        proposed: &Path,
        output_dir: Option<&Path>,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: original.to_path_buf(),
            success: false,
            empty: false,
            stats: None,
            message: String::new(),
        };

        let encoded = match read_pair(original, proposed).and_then(|(a, b)| self.generate(&a, &b)) {
            Ok(encoded) => encoded,
            Err(e) => {
                result.message = e.to_string();
                return result;
            }
        };

        let (mask_path, guide_path) = default_output_paths(original, output_dir);
        if let Some(parent) = mask_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        let written = std::fs::write(&mask_path, &encoded.soft_mask)
            .and_then(|()| std::fs::write(&guide_path, &encoded.guide_image));
        if let Err(e) = written {
            result.message = format!("Failed to save: {e}");
            return result;
        }

        result.success = true;
        result.empty = encoded.stats.is_empty();
        result.message = if result.empty {
            format!("No change found; wrote empty mask to {}", mask_path.display())
        } else {
            format!(
                "Wrote {} and {} ({} px region, threshold {:.3})",
                mask_path.display(),
                guide_path.display(),
                encoded.stats.region_area,
                encoded.stats.threshold
            )
        };
        result.stats = Some(encoded.stats);
        result
    }
}

/// Generate the soft mask and guide image for an edit.
///
/// The invoker call is not made here; use
/// [`MaskOutput::into_edit_request`] to hand the result to one.
///
/// # Errors
///
/// Returns any error of [`MaskEngine::generate`].
pub fn generate_mask(original: &[u8], proposed: &[u8], params: &EditParams) -> Result<MaskOutput> {
    let encoded = MaskEngine::default().generate(original, proposed)?;
    Ok(MaskOutput {
        soft_mask: encoded.soft_mask,
        guide_image: encoded.guide_image,
        params: params.clone(),
    })
}

/// Decode any supported raster format into RGB, dropping alpha.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not a decodable image.
pub fn decode_rgb(bytes: &[u8], role: ImageRole) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|source| Error::Decode { role, source })
}

/// Encode an image as PNG.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(image: DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

fn ensure_non_empty(image: &RgbImage, role: ImageRole) -> Result<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage {
            role,
            width,
            height,
        });
    }
    Ok(())
}

fn downsample(image: &RgbImage, width: u32, height: u32) -> Cow<'_, RgbImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
    }
}

fn read_pair(original: &Path, proposed: &Path) -> Result<(Vec<u8>, Vec<u8>)> {
    for path in [original, proposed] {
        if !is_supported_image(path) {
            return Err(Error::UnsupportedFormat(path.display().to_string()));
        }
    }
    Ok((std::fs::read(original)?, std::fs::read(proposed)?))
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Mask and guide paths for an original image.
///
/// Example: `"yard.jpg"` becomes `"yard_mask.png"` and `"yard_guide.png"`.
#[must_use]
pub fn default_output_paths(original: &Path, output_dir: Option<&Path>) -> (PathBuf, PathBuf) {
    let stem = original.file_stem().unwrap_or_default().to_string_lossy();
    let dir = output_dir
        .or_else(|| original.parent())
        .unwrap_or(Path::new("."));
    (
        dir.join(format!("{stem}_mask.png")),
        dir.join(format!("{stem}_guide.png")),
    )
}
