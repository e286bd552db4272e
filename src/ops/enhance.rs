// ============================================================================
// ENHANCEMENTS — brightness / color / contrast / sharpness with a factor
// ============================================================================
//
// Each enhancement interpolates between a "degenerate" image and the
// original: out = degenerate + (original - degenerate) * factor. Factor 1.0
// is the identity, 0.0 is fully degenerate, values up to 2.0 extrapolate
// past the original. Degenerates:
//   brightness → black
//   color      → per-pixel grayscale
//   contrast   → uniform gray at the mean luminance of the zone
//   sharpness  → smoothed copy of the zone
// Luminance uses the ITU-R 601-2 weights (299, 587, 114)/1000 with integer
// truncation.

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::ops::actions::EnhanceKind;
use crate::ops::filters;
use crate::selection::Zone;

/// Apply `kind` at `factor` to the pixels of `image` covered by `zone`.
pub fn apply_enhancement(image: &mut RgbaImage, kind: EnhanceKind, factor: f32, zone: &Zone) {
    let Some((x0, y0, x1, y1)) = zone.bounds() else {
        return; // nothing selected
    };

    match kind {
        EnhanceKind::Brightness => {
            lerp_zone(image, zone, (x0, y0, x1, y1), factor, |_, _, _| {
                [0.0, 0.0, 0.0]
            });
        }
        EnhanceKind::Color => {
            lerp_zone(image, zone, (x0, y0, x1, y1), factor, |_, _, px| {
                let l = luminance(px[0], px[1], px[2]) as f32;
                [l, l, l]
            });
        }
        EnhanceKind::Contrast => {
            let mean = zone_mean_luminance(image, zone, (x0, y0, x1, y1));
            lerp_zone(image, zone, (x0, y0, x1, y1), factor, move |_, _, _| {
                [mean, mean, mean]
            });
        }
        EnhanceKind::Sharpness => {
            // The degenerate is a smoothed copy; compute it once over the
            // padded bounding box so every zone pixel sees true neighbours.
            let pad = 1u32;
            let crop_x = x0.saturating_sub(pad);
            let crop_y = y0.saturating_sub(pad);
            let crop_x2 = (x1 + pad).min(image.width());
            let crop_y2 = (y1 + pad).min(image.height());
            let sub = imageops::crop_imm(image, crop_x, crop_y, crop_x2 - crop_x, crop_y2 - crop_y)
                .to_image();
            let smoothed = filters::smoothed(&sub);
            lerp_zone(image, zone, (x0, y0, x1, y1), factor, move |x, y, _| {
                let p = smoothed.get_pixel(x - crop_x, y - crop_y).0;
                [p[0] as f32, p[1] as f32, p[2] as f32]
            });
        }
    }
}

/// Interpolate each selected pixel between `degenerate(x, y, pixel)` and the
/// original by `factor`. Alpha is untouched. Parallel by row.
fn lerp_zone<F>(
    image: &mut RgbaImage,
    zone: &Zone,
    bounds: (u32, u32, u32, u32),
    factor: f32,
    degenerate: F,
) where
    F: Fn(u32, u32, [u8; 4]) -> [f32; 3] + Sync,
{
    let (x0, y0, x1, y1) = bounds;
    let w = image.width() as usize;
    let stride = w * 4;

    image
        .as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            let y = y as u32;
            for x in x0..x1 {
                if !zone.contains(x, y) {
                    continue;
                }
                let pi = x as usize * 4;
                let px = [row[pi], row[pi + 1], row[pi + 2], row[pi + 3]];
                let d = degenerate(x, y, px);
                for c in 0..3 {
                    let orig = px[c] as f32;
                    let v = d[c] + (orig - d[c]) * factor;
                    row[pi + c] = v.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
}

/// Mean luminance of the selected pixels, rounded to the nearest integer
/// (the whole zone collapses to this gray at factor 0).
fn zone_mean_luminance(image: &RgbaImage, zone: &Zone, bounds: (u32, u32, u32, u32)) -> f32 {
    let (x0, y0, x1, y1) = bounds;
    let mut sum = 0u64;
    let mut count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if zone.contains(x, y) {
                let p = image.get_pixel(x, y).0;
                sum += luminance(p[0], p[1], p[2]) as u64;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        (sum as f64 / count as f64 + 0.5).floor() as f32
    }
}

/// ITU-R 601-2 luma, integer-truncated like an 8-bit grayscale conversion.
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}
