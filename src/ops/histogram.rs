// ============================================================================
// COLOR HISTOGRAM — per-channel intensity counts of the displayed image
// ============================================================================

use image::RgbaImage;

/// 256-bin counts for each RGB channel.
#[derive(Clone)]
pub struct ChannelHistogram {
    pub r: [u32; 256],
    pub g: [u32; 256],
    pub b: [u32; 256],
}

impl Default for ChannelHistogram {
    fn default() -> Self {
        Self {
            r: [0; 256],
            g: [0; 256],
            b: [0; 256],
        }
    }
}

impl ChannelHistogram {
    /// Count every pixel of `image` into the three channel histograms.
    pub fn compute(image: &RgbaImage) -> Self {
        let mut hist = Self::default();
        for px in image.pixels() {
            hist.r[px.0[0] as usize] += 1;
            hist.g[px.0[1] as usize] += 1;
            hist.b[px.0[2] as usize] += 1;
        }
        hist
    }

    /// Tallest bin across all channels (plot y range).
    pub fn peak(&self) -> u32 {
        self.r
            .iter()
            .chain(self.g.iter())
            .chain(self.b.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn bins_sum_to_pixel_count() {
        let img = RgbaImage::from_fn(13, 7, |x, y| {
            Rgba([(x * 17) as u8, (y * 31) as u8, 200, 255])
        });
        let hist = ChannelHistogram::compute(&img);
        for bins in [&hist.r, &hist.g, &hist.b] {
            assert_eq!(bins.iter().sum::<u32>(), 13 * 7);
        }
    }

    #[test]
    fn flat_image_fills_a_single_bin() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([5, 6, 7, 255]));
        let hist = ChannelHistogram::compute(&img);
        assert_eq!(hist.r[5], 100);
        assert_eq!(hist.g[6], 100);
        assert_eq!(hist.b[7], 100);
        assert_eq!(hist.peak(), 100);
        assert_eq!(hist.r.iter().sum::<u32>(), 100);
    }
}
