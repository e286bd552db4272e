// ============================================================================
// THEME — dark visuals matching the plot/panel colors of the original UI
// ============================================================================

use eframe::egui::{self, Color32};

/// Background of the interactive plot area.
pub const PLOT_BACKGROUND: Color32 = Color32::from_rgb(0x19, 0x1A, 0x1A);
/// Background of the surrounding panels.
pub const PANEL_BACKGROUND: Color32 = Color32::from_rgb(0x02, 0x02, 0x02);
/// Selection overlay stroke.
pub const SELECTION_STROKE: Color32 = Color32::from_rgb(0x00, 0xB4, 0xD8);

pub fn apply(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = PANEL_BACKGROUND;
    visuals.window_fill = PLOT_BACKGROUND;
    visuals.extreme_bg_color = PLOT_BACKGROUND;
    ctx.set_visuals(visuals);
}
