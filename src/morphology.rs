//! Binary bitmaps and rectangular-element morphology.
//!
//! Every operation is a single neighborhood scan parametrized by a rule:
//! erosion keeps a pixel only when *all* pixels in its `(2rx+1) x (2ry+1)`
//! window are set, dilation sets it when *any* are. Windows are clamped to
//! the image bounds, so nothing outside the bitmap counts as foreground or
//! background.
//!
//! A rectangle is the product of two intervals, so the scan runs as a row
//! pass followed by a column pass, each with a sliding window count. Cost is
//! `O(width * height)` regardless of radius.

use image::{GrayImage, Luma};

/// One byte per pixel, every value `0` or `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// All-zero bitmap.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, false)
    }

    /// Bitmap with every pixel set to `value`.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![u8::from(value); width as usize * height as usize],
        }
    }

    /// Build a bitmap by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(u8::from(f(x, y)));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw row-major data.
    ///
    /// Returns `None` if the length is not `width * height` or any value is
    /// not `0`/`1`.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize || data.iter().any(|&v| v > 1) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Bitmap width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Bitmap height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major `0`/`1` values.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Whether the pixel at `(x, y)` is set.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)] != 0
    }

    /// Set or clear the pixel at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = u8::from(value);
    }

    /// Number of set pixels.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// `true` if no pixel is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Every set pixel here is also set in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
            && self.data.iter().zip(&other.data).all(|(&a, &b)| a <= b)
    }

    /// Map `1 -> 255`, `0 -> 0`.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        let data = self.data.iter().map(|&v| v * u8::MAX).collect();
        GrayImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Binarize a grayscale image: pixels strictly above `cutoff` become set.
    #[must_use]
    pub fn from_gray_image(image: &GrayImage, cutoff: u8) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|&Luma([v])| u8::from(v > cutoff)).collect(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Predicate applied to a clamped neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Output is set only if every neighbor is set (erosion).
    All,
    /// Output is set if any neighbor is set (dilation).
    Any,
}

impl Rule {
    #[inline]
    fn apply(self, count: usize, window: usize) -> u8 {
        match self {
            Self::All => u8::from(count == window),
            Self::Any => u8::from(count > 0),
        }
    }
}

/// Erode with a `(2r+1) x (2r+1)` square.
#[must_use]
pub fn erode(bitmap: &Bitmap, radius: u32) -> Bitmap {
    scan(bitmap, radius, radius, Rule::All)
}

/// Dilate with a `(2r+1) x (2r+1)` square.
#[must_use]
pub fn dilate(bitmap: &Bitmap, radius: u32) -> Bitmap {
    scan(bitmap, radius, radius, Rule::Any)
}

/// Dilate with a `1 x (2r+1)` column, closing vertical gaps without
/// widening horizontally.
#[must_use]
pub fn dilate_vertical(bitmap: &Bitmap, radius: u32) -> Bitmap {
    scan(bitmap, 0, radius, Rule::Any)
}

/// Erode then dilate: removes speckle smaller than the element.
#[must_use]
pub fn open(bitmap: &Bitmap, radius: u32) -> Bitmap {
    dilate(&erode(bitmap, radius), radius)
}

/// Dilate then erode: fills holes smaller than the element.
#[must_use]
pub fn close(bitmap: &Bitmap, radius: u32) -> Bitmap {
    erode(&dilate(bitmap, radius), radius)
}

fn scan(bitmap: &Bitmap, rx: u32, ry: u32, rule: Rule) -> Bitmap {
    if bitmap.data.is_empty() {
        return bitmap.clone();
    }
    let rows = if rx == 0 {
        bitmap.clone()
    } else {
        scan_rows(bitmap, rx as usize, rule)
    };
    if ry == 0 {
        rows
    } else {
        scan_columns(&rows, ry as usize, rule)
    }
}

fn scan_rows(bitmap: &Bitmap, radius: usize, rule: Rule) -> Bitmap {
    let width = bitmap.width as usize;
    let mut out = vec![0u8; bitmap.data.len()];

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(width)
            .zip(bitmap.data.par_chunks(width))
            .for_each(|(dst, src)| scan_line(src, dst, radius, rule));
    }

    #[cfg(not(feature = "rayon"))]
    {
        out.chunks_mut(width)
            .zip(bitmap.data.chunks(width))
            .for_each(|(dst, src)| scan_line(src, dst, radius, rule));
    }

    Bitmap {
        width: bitmap.width,
        height: bitmap.height,
        data: out,
    }
}

/// Sliding-window pass over one row.
fn scan_line(src: &[u8], dst: &mut [u8], radius: usize, rule: Rule) {
    let len = src.len();
    let mut count: usize = src[..=radius.min(len - 1)]
        .iter()
        .map(|&v| usize::from(v))
        .sum();

    for (x, out) in dst.iter_mut().enumerate() {
        let lo = x.saturating_sub(radius);
        let hi = (x + radius).min(len - 1);
        *out = rule.apply(count, hi - lo + 1);

        if x + radius + 1 < len {
            count += usize::from(src[x + radius + 1]);
        }
        if x >= radius {
            count -= usize::from(src[x - radius]);
        }
    }
}

/// Sliding-window pass down every column at once, one count per column.
fn scan_columns(bitmap: &Bitmap, radius: usize, rule: Rule) -> Bitmap {
    let width = bitmap.width as usize;
    let height = bitmap.height as usize;
    let src = &bitmap.data;
    let mut out = vec![0u8; src.len()];
    let mut counts = vec![0usize; width];

    for row in src.chunks_exact(width).take(radius.min(height - 1) + 1) {
        for (c, &v) in counts.iter_mut().zip(row) {
            *c += usize::from(v);
        }
    }

    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        let window = hi - lo + 1;
        for (dst, &c) in out[y * width..(y + 1) * width].iter_mut().zip(&counts) {
            *dst = rule.apply(c, window);
        }

        if y + radius + 1 < height {
            let incoming = &src[(y + radius + 1) * width..(y + radius + 2) * width];
            for (c, &v) in counts.iter_mut().zip(incoming) {
                *c += usize::from(v);
            }
        }
        if y >= radius {
            let outgoing = &src[(y - radius) * width..(y - radius + 1) * width];
            for (c, &v) in counts.iter_mut().zip(outgoing) {
                *c -= usize::from(v);
            }
        }
    }

    Bitmap {
        width: bitmap.width,
        height: bitmap.height,
        data: out,
    }
}
