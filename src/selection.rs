// ============================================================================
// SELECTION GEOMETRY — plot coordinates → image pixel coordinates
// ============================================================================
//
// Selections are captured from the interactive view in plot coordinates:
// origin at the bottom-left of the image, y increasing upward, one unit per
// image pixel. Image operations work in pixel coordinates with the origin at
// the top-left, so resolving a selection flips the y axis against the
// current image height. Resolution happens at replay time, against whatever
// size the image has then.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// A region selected in the interactive image view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selection {
    /// Axis-aligned box given as x and y ranges. Either end may come first;
    /// resolution normalizes the order.
    Rect { x: [f64; 2], y: [f64; 2] },
    /// Freeform polygon given by its vertex list (implicitly closed).
    Lasso { points: Vec<[f64; 2]> },
}

/// A selection resolved against a concrete image size, in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Zone {
    /// `(left, upper)` inclusive to `(right, lower)` exclusive.
    Box {
        left: u32,
        upper: u32,
        right: u32,
        lower: u32,
    },
    /// Per-pixel mask; non-zero means selected.
    Mask(GrayImage),
}

impl Selection {
    /// Resolve to pixel coordinates for an image of the given size.
    pub fn resolve(&self, width: u32, height: u32) -> Zone {
        match self {
            Selection::Rect { x, y } => {
                let (x0, x1) = ordered(x[0], x[1]);
                let (y0, y1) = ordered(y[0], y[1]);
                // y flips: the plot's top edge is the image's upper row.
                Zone::Box {
                    left: clamp_axis(x0, width),
                    upper: clamp_axis(height as f64 - y1, height),
                    right: clamp_axis(x1, width),
                    lower: clamp_axis(height as f64 - y0, height),
                }
            }
            Selection::Lasso { points } => Zone::Mask(rasterize_lasso(points, width, height)),
        }
    }
}

impl Zone {
    /// The whole image (what an absent selection resolves to).
    pub fn full(width: u32, height: u32) -> Self {
        Zone::Box {
            left: 0,
            upper: 0,
            right: width,
            lower: height,
        }
    }

    /// Bounding box `(x0, y0, x1, y1)`, half-open, clamped to the mask size.
    /// `None` when the zone is empty.
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        match self {
            Zone::Box {
                left,
                upper,
                right,
                lower,
            } => {
                if left >= right || upper >= lower {
                    None
                } else {
                    Some((*left, *upper, *right, *lower))
                }
            }
            Zone::Mask(mask) => {
                let (w, h) = (mask.width(), mask.height());
                let mut min_x = w;
                let mut min_y = h;
                let mut max_x = 0u32;
                let mut max_y = 0u32;
                for y in 0..h {
                    for x in 0..w {
                        if mask.get_pixel(x, y).0[0] > 0 {
                            min_x = min_x.min(x);
                            min_y = min_y.min(y);
                            max_x = max_x.max(x);
                            max_y = max_y.max(y);
                        }
                    }
                }
                if min_x > max_x || min_y > max_y {
                    None
                } else {
                    Some((min_x, min_y, max_x + 1, max_y + 1))
                }
            }
        }
    }

    /// Whether the pixel at (x, y) is inside the zone.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        match self {
            Zone::Box {
                left,
                upper,
                right,
                lower,
            } => x >= *left && x < *right && y >= *upper && y < *lower,
            Zone::Mask(mask) => {
                x < mask.width() && y < mask.height() && mask.get_pixel(x, y).0[0] > 0
            }
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Truncate-and-clamp a plot coordinate to `[0, limit]`.
fn clamp_axis(v: f64, limit: u32) -> u32 {
    (v as i64).clamp(0, limit as i64) as u32
}

// ============================================================================
// Lasso: scanline polygon rasterization into a selection mask
// ============================================================================

/// Rasterize a lasso polygon (plot coordinates) into a binary mask.
/// Even-odd fill: for each pixel row, collect x-intercepts of polygon edges
/// crossing the row centre and fill between pairs.
fn rasterize_lasso(points: &[[f64; 2]], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if points.len() < 3 {
        return mask;
    }

    // Flip into pixel coordinates once, up front.
    let poly: Vec<(f32, f32)> = points
        .iter()
        .map(|p| (p[0] as f32, height as f32 - p[1] as f32))
        .collect();

    let n = poly.len();
    for y in 0..height {
        let yf = y as f32 + 0.5; // centre of pixel row
        let mut nodes: Vec<f32> = Vec::new();
        // Walk polygon edges (including closing edge n-1 → 0)
        for i in 0..n {
            let j = (i + 1) % n;
            let (_, yi) = poly[i];
            let (_, yj) = poly[j];
            if (yi < yf && yj >= yf) || (yj < yf && yi >= yf) {
                let t = (yf - yi) / (yj - yi);
                let x = poly[i].0 + t * (poly[j].0 - poly[i].0);
                nodes.push(x);
            }
        }
        nodes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        // Fill between pairs of intersections
        let mut k = 0;
        while k + 1 < nodes.len() {
            let x_start = (nodes[k].max(0.0) as u32).min(width);
            let x_end = ((nodes[k + 1] + 1.0).max(0.0) as u32).min(width);
            for x in x_start..x_end {
                mask.put_pixel(x, y, Luma([255u8]));
            }
            k += 2;
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_flips_y_axis() {
        // Plot box y ∈ [10, 30] on a 100-high image → pixel rows 70..90.
        let sel = Selection::Rect {
            x: [5.0, 25.0],
            y: [10.0, 30.0],
        };
        assert_eq!(
            sel.resolve(50, 100),
            Zone::Box {
                left: 5,
                upper: 70,
                right: 25,
                lower: 90,
            }
        );
    }

    #[test]
    fn rect_ranges_normalize_and_clamp() {
        let sel = Selection::Rect {
            x: [60.0, -4.0],
            y: [120.0, 20.0],
        };
        // x clamps to [0, 50]; y_max=120 clamps so the upper row is 0.
        assert_eq!(
            sel.resolve(50, 100),
            Zone::Box {
                left: 0,
                upper: 0,
                right: 50,
                lower: 80,
            }
        );
    }

    #[test]
    fn degenerate_rect_is_empty() {
        let sel = Selection::Rect {
            x: [10.0, 10.0],
            y: [0.0, 5.0],
        };
        assert!(sel.resolve(50, 50).bounds().is_none());
    }

    #[test]
    fn full_zone_covers_everything() {
        let zone = Zone::full(8, 4);
        assert_eq!(zone.bounds(), Some((0, 0, 8, 4)));
        assert!(zone.contains(0, 0));
        assert!(zone.contains(7, 3));
        assert!(!zone.contains(8, 3));
    }

    #[test]
    fn lasso_square_selects_interior() {
        // A square covering the lower-left quadrant in plot coordinates
        // lands in the lower-left of the image too (rows flip, box doesn't).
        let sel = Selection::Lasso {
            points: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        };
        let zone = sel.resolve(20, 20);
        assert!(zone.contains(5, 15)); // image row 15 = plot y 5
        assert!(!zone.contains(15, 5)); // upper-right quadrant untouched
        assert!(zone.bounds().is_some());
    }

    #[test]
    fn lasso_needs_three_points() {
        let sel = Selection::Lasso {
            points: vec![[0.0, 0.0], [10.0, 10.0]],
        };
        assert!(sel.resolve(20, 20).bounds().is_none());
    }

    #[test]
    fn mask_bounds_track_filled_pixels() {
        let sel = Selection::Lasso {
            points: vec![[2.0, 2.0], [8.0, 2.0], [8.0, 8.0], [2.0, 8.0]],
        };
        let zone = sel.resolve(16, 16);
        let (x0, y0, x1, y1) = zone.bounds().unwrap();
        assert!(x0 >= 1 && x1 <= 10);
        // Plot y ∈ [2, 8] → image rows near [8, 14].
        assert!(y0 >= 7 && y1 <= 15);
    }

    #[test]
    fn selection_json_shape() {
        let sel = Selection::Rect {
            x: [1.0, 2.0],
            y: [3.0, 4.0],
        };
        let json = serde_json::to_string(&sel).unwrap();
        assert!(json.contains("\"mode\":\"rect\""));
        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }
}
