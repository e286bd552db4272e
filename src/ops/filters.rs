// ============================================================================
// IMAGE FILTERS — the classic fixed-kernel convolutions
// ============================================================================
//
// Each filter is a small convolution kernel with a divisor and an offset:
// out = conv(src) / scale + offset, per RGB channel, alpha untouched.
// Borders replicate the nearest edge pixel. When the action carries a
// selection, only the zone's bounding box (padded by the kernel radius) is
// processed and only selected pixels are written back — much faster for
// small selections on large images.

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::ops::actions::FilterKind;
use crate::selection::Zone;

/// A square convolution kernel. `size` is the side length (3 or 5).
pub struct Kernel {
    pub size: usize,
    pub scale: f32,
    pub offset: f32,
    pub weights: &'static [f32],
}

impl FilterKind {
    pub fn kernel(&self) -> Kernel {
        match self {
            FilterKind::Blur => Kernel {
                size: 5,
                scale: 16.0,
                offset: 0.0,
                weights: &[
                    1.0, 1.0, 1.0, 1.0, 1.0,
                    1.0, 0.0, 0.0, 0.0, 1.0,
                    1.0, 0.0, 0.0, 0.0, 1.0,
                    1.0, 0.0, 0.0, 0.0, 1.0,
                    1.0, 1.0, 1.0, 1.0, 1.0,
                ],
            },
            FilterKind::Contour => Kernel {
                size: 3,
                scale: 1.0,
                offset: 255.0,
                weights: &[
                    -1.0, -1.0, -1.0,
                    -1.0,  8.0, -1.0,
                    -1.0, -1.0, -1.0,
                ],
            },
            FilterKind::Detail => Kernel {
                size: 3,
                scale: 6.0,
                offset: 0.0,
                weights: &[
                     0.0, -1.0,  0.0,
                    -1.0, 10.0, -1.0,
                     0.0, -1.0,  0.0,
                ],
            },
            FilterKind::EdgeEnhance => Kernel {
                size: 3,
                scale: 2.0,
                offset: 0.0,
                weights: &[
                    -1.0, -1.0, -1.0,
                    -1.0, 10.0, -1.0,
                    -1.0, -1.0, -1.0,
                ],
            },
            FilterKind::EdgeEnhanceMore => Kernel {
                size: 3,
                scale: 1.0,
                offset: 0.0,
                weights: &[
                    -1.0, -1.0, -1.0,
                    -1.0,  9.0, -1.0,
                    -1.0, -1.0, -1.0,
                ],
            },
            FilterKind::Emboss => Kernel {
                size: 3,
                scale: 1.0,
                offset: 128.0,
                weights: &[
                    -1.0, 0.0, 0.0,
                     0.0, 1.0, 0.0,
                     0.0, 0.0, 0.0,
                ],
            },
            FilterKind::FindEdges => Kernel {
                size: 3,
                scale: 1.0,
                offset: 0.0,
                weights: &[
                    -1.0, -1.0, -1.0,
                    -1.0,  8.0, -1.0,
                    -1.0, -1.0, -1.0,
                ],
            },
            FilterKind::Sharpen => Kernel {
                size: 3,
                scale: 16.0,
                offset: 0.0,
                weights: &[
                    -2.0, -2.0, -2.0,
                    -2.0, 32.0, -2.0,
                    -2.0, -2.0, -2.0,
                ],
            },
            FilterKind::Smooth => Kernel {
                size: 3,
                scale: 13.0,
                offset: 0.0,
                weights: &[
                    1.0, 1.0, 1.0,
                    1.0, 5.0, 1.0,
                    1.0, 1.0, 1.0,
                ],
            },
            FilterKind::SmoothMore => Kernel {
                size: 5,
                scale: 100.0,
                offset: 0.0,
                weights: &[
                    1.0, 1.0,  1.0, 1.0, 1.0,
                    1.0, 5.0,  5.0, 5.0, 1.0,
                    1.0, 5.0, 44.0, 5.0, 1.0,
                    1.0, 5.0,  5.0, 5.0, 1.0,
                    1.0, 1.0,  1.0, 1.0, 1.0,
                ],
            },
        }
    }
}

/// Apply `kind` to the pixels of `image` covered by `zone`, in place.
pub fn apply_filter(image: &mut RgbaImage, kind: FilterKind, zone: &Zone) {
    let Some((x0, y0, x1, y1)) = zone.bounds() else {
        return; // nothing selected
    };

    let kernel = kind.kernel();
    let pad = (kernel.size / 2) as u32;

    // Expand the bounding box by the kernel radius so interior pixels read
    // their true neighbours instead of replicated crop edges.
    let crop_x = x0.saturating_sub(pad);
    let crop_y = y0.saturating_sub(pad);
    let crop_x2 = (x1 + pad).min(image.width());
    let crop_y2 = (y1 + pad).min(image.height());
    let sub =
        imageops::crop_imm(image, crop_x, crop_y, crop_x2 - crop_x, crop_y2 - crop_y).to_image();

    let processed = convolve(&sub, &kernel);

    // Composite: write back only the pixels the zone covers.
    for y in y0..y1 {
        for x in x0..x1 {
            if zone.contains(x, y) {
                let p = processed.get_pixel(x - crop_x, y - crop_y);
                image.put_pixel(x, y, *p);
            }
        }
    }
}

/// Clamp-to-edge convolution over the RGB channels. Alpha passes through.
fn convolve(src: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let radius = (kernel.size / 2) as isize;
    let inv_scale = 1.0 / kernel.scale;
    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..w {
                let mut r = 0.0f32;
                let mut g = 0.0f32;
                let mut b = 0.0f32;
                for ky in 0..kernel.size {
                    let sy = (y as isize + ky as isize - radius).clamp(0, h as isize - 1) as usize;
                    let row_off = sy * stride;
                    for kx in 0..kernel.size {
                        let kv = kernel.weights[ky * kernel.size + kx];
                        if kv == 0.0 {
                            continue;
                        }
                        let sx =
                            (x as isize + kx as isize - radius).clamp(0, w as isize - 1) as usize;
                        let idx = row_off + sx * 4;
                        r += src_raw[idx] as f32 * kv;
                        g += src_raw[idx + 1] as f32 * kv;
                        b += src_raw[idx + 2] as f32 * kv;
                    }
                }
                let pi = x * 4;
                row_out[pi] = (r * inv_scale + kernel.offset).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = (g * inv_scale + kernel.offset).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = (b * inv_scale + kernel.offset).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = src_raw[y * stride + pi + 3];
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .unwrap_or_else(|| RgbaImage::new(w as u32, h as u32))
}

/// Smoothed copy of `src` — the degenerate image for sharpness enhancement.
pub(crate) fn smoothed(src: &RgbaImage) -> RgbaImage {
    convolve(src, &FilterKind::Smooth.kernel())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn flat(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn averaging_kernels_are_normalized() {
        for kind in [
            FilterKind::Blur,
            FilterKind::Detail,
            FilterKind::EdgeEnhance,
            FilterKind::EdgeEnhanceMore,
            FilterKind::Sharpen,
            FilterKind::Smooth,
            FilterKind::SmoothMore,
        ] {
            let k = kind.kernel();
            let sum: f32 = k.weights.iter().sum();
            assert_eq!(sum, k.scale, "{:?}", kind);
            assert_eq!(k.weights.len(), k.size * k.size, "{:?}", kind);
        }
    }

    #[test]
    fn normalized_kernels_keep_flat_images_flat() {
        for kind in [
            FilterKind::Blur,
            FilterKind::Smooth,
            FilterKind::SmoothMore,
            FilterKind::Sharpen,
        ] {
            let mut img = flat(12, 9, 90);
            apply_filter(&mut img, kind, &Zone::full(12, 9));
            assert!(
                img.pixels().all(|p| p.0 == [90, 90, 90, 255]),
                "{:?} changed a flat image",
                kind
            );
        }
    }

    #[test]
    fn edge_detectors_zero_out_flat_images() {
        let mut img = flat(8, 8, 120);
        apply_filter(&mut img, FilterKind::FindEdges, &Zone::full(8, 8));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        let mut img = flat(8, 8, 120);
        apply_filter(&mut img, FilterKind::Contour, &Zone::full(8, 8));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));

        let mut img = flat(8, 8, 120);
        apply_filter(&mut img, FilterKind::Emboss, &Zone::full(8, 8));
        assert!(img.pixels().all(|p| p.0 == [128, 128, 128, 255]));
    }

    #[test]
    fn zone_limits_the_affected_region() {
        let mut img = flat(10, 10, 200);
        let zone = Zone::Box {
            left: 0,
            upper: 0,
            right: 5,
            lower: 10,
        };
        apply_filter(&mut img, FilterKind::FindEdges, &zone);
        assert_eq!(img.get_pixel(2, 5).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 5).0, [200, 200, 200, 255]);
    }

    #[test]
    fn empty_zone_is_a_noop() {
        let mut img = flat(6, 6, 40);
        let zone = Zone::Box {
            left: 3,
            upper: 3,
            right: 3,
            lower: 6,
        };
        apply_filter(&mut img, FilterKind::Sharpen, &zone);
        assert!(img.pixels().all(|p| p.0 == [40, 40, 40, 255]));
    }

    #[test]
    fn alpha_channel_is_preserved() {
        let mut img = RgbaImage::from_pixel(6, 6, Rgba([10, 20, 30, 77]));
        apply_filter(&mut img, FilterKind::Blur, &Zone::full(6, 6));
        assert!(img.pixels().all(|p| p.0[3] == 77));
    }
}
