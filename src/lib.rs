//! Automatic edit masks from an original/proposed image pair.
//!
//! Given two images of the same size, this crate finds the single most
//! significant region that changed between them and produces:
//!
//! - a **soft mask**: a feathered, full-resolution grayscale mask for an
//!   inpainting model to blend the edit with, and
//! - a **guide image**: the proposed content inside the (hard) mask and the
//!   original content outside it.
//!
//! No user-drawn input is needed. The pipeline runs at a capped working
//! resolution: per-pixel difference, percentile-anchored threshold, opening
//! and closing, dominant 8-connected component, growth, Gaussian feathering,
//! and upsampling back to full size.
//!
//! # Quick Start
//!
//! ```no_run
//! use auto_edit_mask::{generate_mask, EditParams};
//!
//! let original = std::fs::read("yard.jpg").unwrap();
//! let proposed = std::fs::read("yard_with_pergola.jpg").unwrap();
//! let params = EditParams::new("a cedar pergola").with_steps(30).unwrap();
//!
//! let output = generate_mask(&original, &proposed, &params).unwrap();
//! std::fs::write("mask.png", &output.soft_mask).unwrap();
//! std::fs::write("guide.png", &output.guide_image).unwrap();
//! ```
//!
//! # Working with decoded images
//!
//! ```no_run
//! use auto_edit_mask::{MaskEngine, MaskOptions};
//!
//! let engine = MaskEngine::new(MaskOptions::default());
//! let original = image::open("yard.jpg").unwrap().to_rgb8();
//! let proposed = image::open("yard_with_pergola.jpg").unwrap().to_rgb8();
//! let artifacts = engine.generate_from_images(&original, &proposed).unwrap();
//! if artifacts.stats.is_empty() {
//!     println!("no change found");
//! }
//! ```
//!
//! The inpainting call itself sits behind the [`EditInvoker`] trait; enable
//! the `remote` feature for a blocking HTTP implementation.

#![deny(missing_docs)]

pub mod composite;
pub mod difference;
mod engine;
pub mod error;
pub mod finish;
pub mod invoker;
pub mod morphology;
pub mod region;
pub mod threshold;

pub use engine::{
    decode_rgb, default_output_paths, encode_png, generate_mask, is_supported_image,
    EncodedMask, MaskArtifacts, MaskEngine, MaskOptions, MaskOutput, MaskStats, ProcessResult,
    DEFAULT_MAX_WORKING_DIM,
};
pub use error::{Error, ImageRole, Result};
#[cfg(feature = "remote")]
pub use invoker::HttpEditInvoker;
pub use invoker::{EditInvoker, EditOutcome, EditParams, EditRequest};
pub use morphology::Bitmap;
