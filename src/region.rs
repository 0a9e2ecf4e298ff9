//! Dominant 8-connected component selection.
//!
//! Components are found with an iterative flood fill over an explicit stack.
//! Each is scored by `area * (base + lower_weight * cy)`, where `cy` is the
//! centroid row normalized to `[0, 1]`: large regions win, and among similar
//! sizes those lower in the frame are preferred. The first component found
//! keeps ties.

use crate::morphology::Bitmap;

/// Size/position weighting for [`dominant_region`].
///
/// The defaults were tuned empirically; treat them as parameters rather than
/// invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBias {
    /// Weight a component receives regardless of position.
    pub base: f64,
    /// Additional weight scaled by the normalized centroid row.
    pub lower_weight: f64,
}

impl Default for RegionBias {
    fn default() -> Self {
        Self {
            base: 0.7,
            lower_weight: 0.3,
        }
    }
}

/// One connected component of a bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Row-major indices of member pixels.
    pub pixels: Vec<usize>,
    /// Sum of member x coordinates.
    pub sum_x: u64,
    /// Sum of member y coordinates.
    pub sum_y: u64,
}

impl Region {
    /// Number of member pixels.
    #[must_use]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// Mean `(x, y)` of member pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> (f64, f64) {
        let area = self.area().max(1) as f64;
        (self.sum_x as f64 / area, self.sum_y as f64 / area)
    }

    /// Weighted score within an image of `height` rows.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, height: u32, bias: &RegionBias) -> f64 {
        let (_, cy) = self.centroid();
        let cy_norm = if height > 1 {
            cy / f64::from(height - 1)
        } else {
            0.0
        };
        self.area() as f64 * (bias.base + bias.lower_weight * cy_norm)
    }

    /// Rasterize only this region into a fresh bitmap.
    #[must_use]
    pub fn to_bitmap(&self, width: u32, height: u32) -> Bitmap {
        let mut data = vec![0u8; width as usize * height as usize];
        for &idx in &self.pixels {
            data[idx] = 1;
        }
        Bitmap::from_raw(width, height, data).unwrap_or_else(|| Bitmap::new(width, height))
    }
}

/// Highest-scoring 8-connected component, or `None` if the bitmap is empty.
#[must_use]
pub fn dominant_region(bitmap: &Bitmap, bias: &RegionBias) -> Option<Region> {
    let width = bitmap.width() as usize;
    let height = bitmap.height() as usize;
    let data = bitmap.as_raw();
    let mut visited = vec![false; data.len()];
    let mut stack = Vec::new();

    let mut best: Option<(Region, f64)> = None;

    for (start, &value) in data.iter().enumerate() {
        if value == 0 || visited[start] {
            continue;
        }

        let mut region = Region {
            pixels: Vec::new(),
            sum_x: 0,
            sum_y: 0,
        };
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            region.pixels.push(idx);
            region.sum_x += x as u64;
            region.sum_y += y as u64;

            let y_lo = y.saturating_sub(1);
            let y_hi = (y + 1).min(height - 1);
            let x_lo = x.saturating_sub(1);
            let x_hi = (x + 1).min(width - 1);
            for ny in y_lo..=y_hi {
                for nx in x_lo..=x_hi {
                    let n = ny * width + nx;
                    if data[n] != 0 && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        let score = region.score(bitmap.height(), bias);
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((region, score));
        }
    }

    best.map(|(region, _)| region)
}

/// Keep only the dominant component; an empty input yields an empty bitmap.
#[must_use]
pub fn isolate_dominant_region(bitmap: &Bitmap, bias: &RegionBias) -> Bitmap {
    let (width, height) = bitmap.dimensions();
    dominant_region(bitmap, bias)
        .map_or_else(|| Bitmap::new(width, height), |r| r.to_bitmap(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(b: &mut Bitmap, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                b.set(x, y, true);
            }
        }
    }

    #[test]
    fn empty_bitmap_has_no_region() {
        let b = Bitmap::new(16, 16);
        assert!(dominant_region(&b, &RegionBias::default()).is_none());
        assert!(isolate_dominant_region(&b, &RegionBias::default()).is_empty());
    }

    #[test]
    fn diagonal_neighbors_are_connected() {
        let b = Bitmap::from_fn(5, 5, |x, y| x == y);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert_eq!(r.area(), 5);
        assert_eq!(r.centroid(), (2.0, 2.0));
    }

    #[test]
    fn larger_component_wins() {
        let mut b = Bitmap::new(40, 40);
        rect(&mut b, 2, 2, 10, 10);
        rect(&mut b, 20, 20, 4, 4);
        let out = isolate_dominant_region(&b, &RegionBias::default());
        assert_eq!(out.count_ones(), 100);
        assert!(out.get(5, 5));
        assert!(!out.get(21, 21));
    }

    #[test]
    fn lower_component_wins_at_equal_size() {
        let mut b = Bitmap::new(20, 41);
        rect(&mut b, 5, 0, 4, 4);
        rect(&mut b, 5, 37, 4, 4);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert!(r.centroid().1 > 30.0);
    }

    #[test]
    fn position_bias_can_outweigh_modest_size_advantage() {
        // Top: 100 px at cy~0 -> 70. Bottom: 90 px at cy~1 -> ~89.
        let mut b = Bitmap::new(30, 101);
        rect(&mut b, 0, 0, 10, 10);
        rect(&mut b, 0, 92, 10, 9);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert_eq!(r.area(), 90);
    }

    #[test]
    fn first_component_keeps_ties() {
        let mut b = Bitmap::new(20, 10);
        rect(&mut b, 1, 3, 3, 3);
        rect(&mut b, 12, 3, 3, 3);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert!(r.centroid().0 < 10.0);
    }

    #[test]
    fn single_row_bitmap_is_scored_without_division_by_zero() {
        let b = Bitmap::from_fn(10, 1, |x, _| x < 3 || x > 5);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert_eq!(r.area(), 4);
    }

    #[test]
    fn large_region_does_not_overflow_stack() {
        let b = Bitmap::filled(768, 768, true);
        let r = dominant_region(&b, &RegionBias::default()).unwrap();
        assert_eq!(r.area(), 768 * 768);
    }
}
