// ============================================================================
// HISTOGRAM PANEL — per-channel intensity plot of the displayed image
// ============================================================================

use eframe::egui::{self, Color32};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::ops::histogram::ChannelHistogram;

const CHANNEL_COLORS: [(Color32, &str); 3] = [
    (Color32::from_rgb(0xE4, 0x5A, 0x5A), "R"),
    (Color32::from_rgb(0x5A, 0xC8, 0x6E), "G"),
    (Color32::from_rgb(0x5A, 0x8C, 0xE4), "B"),
];

#[derive(Default)]
pub struct HistogramPanel;

impl HistogramPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, histogram: Option<&ChannelHistogram>) {
        ui.label("Color Histogram");

        let Some(hist) = histogram else {
            ui.weak("No image yet");
            return;
        };

        Plot::new("graph-histogram-colors")
            .height(160.0)
            .show_axes([false, false])
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .include_y(0.0)
            .include_y(hist.peak() as f64)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (bins, (color, name)) in
                    [&hist.r, &hist.g, &hist.b].into_iter().zip(CHANNEL_COLORS)
                {
                    let points: PlotPoints = bins
                        .iter()
                        .enumerate()
                        .map(|(i, &count)| [i as f64, count as f64])
                        .collect();
                    plot_ui.line(Line::new(points).color(color).name(name));
                }
            });
    }
}
