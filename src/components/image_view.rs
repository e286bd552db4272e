// ============================================================================
// INTERACTIVE IMAGE VIEW — plot-coordinate display with drag selection
// ============================================================================
//
// The image is drawn through egui_plot with one plot unit per pixel and the
// origin at the bottom-left, so every coordinate this view hands out is in
// the same y-up space the selection geometry expects. Dragging sweeps a
// rectangle or accumulates a lasso polygon depending on the mode; releasing
// the button commits the selection for the next operation. A plain click
// (no drag) clears it.

use eframe::egui::{self, Vec2};
use egui_plot::{Line, Plot, PlotImage, PlotPoint, PlotPoints};
use image::RgbaImage;

use crate::components::controls::SelectionMode;
use crate::selection::Selection;
use crate::theme;

/// Minimum drag extent (in plot units) below which a release counts as a
/// click and clears the selection instead of committing a sliver.
const MIN_DRAG_EXTENT: f64 = 1.0;

pub struct ImageView {
    texture: Option<egui::TextureHandle>,
    image_size: (u32, u32),

    dragging: bool,
    drag_start: Option<[f64; 2]>,
    drag_current: Option<[f64; 2]>,
    lasso_points: Vec<[f64; 2]>,

    /// Committed selection, used by the next Run Operation.
    pub selection: Option<Selection>,
}

impl Default for ImageView {
    fn default() -> Self {
        Self {
            texture: None,
            image_size: (0, 0),
            dragging: false,
            drag_start: None,
            drag_current: None,
            lasso_points: Vec::new(),
            selection: None,
        }
    }
}

impl ImageView {
    /// Upload a freshly rendered preview as the display texture.
    pub fn set_image(&mut self, ctx: &egui::Context, image: &RgbaImage) {
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(color, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("interactive-image", color, egui::TextureOptions::LINEAR));
            }
        }
        self.image_size = (image.width(), image.height());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.dragging = false;
        self.drag_start = None;
        self.drag_current = None;
        self.lasso_points.clear();
    }

    pub fn show(&mut self, ui: &mut egui::Ui, mode: SelectionMode) {
        let Some(texture) = &self.texture else {
            ui.centered_and_justified(|ui| {
                ui.label("No image loaded");
            });
            return;
        };

        let tex_id = texture.id();
        let (w, h) = (self.image_size.0 as f64, self.image_size.1 as f64);

        Plot::new("interactive-image")
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show(ui, |plot_ui| {
                plot_ui.image(PlotImage::new(
                    tex_id,
                    PlotPoint::new(w / 2.0, h / 2.0),
                    Vec2::new(w as f32, h as f32),
                ));

                let pointer = plot_ui.pointer_coordinate().map(|p| [p.x, p.y]);
                let primary_down = plot_ui.ctx().input(|i| i.pointer.primary_down());

                self.handle_drag(mode, pointer, primary_down);

                // Overlay: the drag in progress wins over the committed one.
                if self.dragging {
                    match mode {
                        SelectionMode::Rect => {
                            if let (Some(a), Some(b)) = (self.drag_start, self.drag_current) {
                                draw_rect_outline(plot_ui, a, b);
                            }
                        }
                        SelectionMode::Lasso => draw_polyline(plot_ui, &self.lasso_points, false),
                    }
                } else if let Some(selection) = &self.selection {
                    match selection {
                        Selection::Rect { x, y } => {
                            draw_rect_outline(plot_ui, [x[0], y[0]], [x[1], y[1]]);
                        }
                        Selection::Lasso { points } => draw_polyline(plot_ui, points, true),
                    }
                }
            });
    }

    fn handle_drag(&mut self, mode: SelectionMode, pointer: Option<[f64; 2]>, primary_down: bool) {
        if primary_down {
            match (self.dragging, pointer) {
                (false, Some(p)) => {
                    self.dragging = true;
                    self.drag_start = Some(p);
                    self.drag_current = Some(p);
                    self.lasso_points.clear();
                    self.lasso_points.push(p);
                }
                (true, Some(p)) => {
                    self.drag_current = Some(p);
                    if mode == SelectionMode::Lasso {
                        // Skip sub-pixel jitter; the polygon stays manageable.
                        let far_enough = self
                            .lasso_points
                            .last()
                            .is_none_or(|last| dist(*last, p) > 0.5);
                        if far_enough {
                            self.lasso_points.push(p);
                        }
                    }
                }
                _ => {}
            }
        } else if self.dragging {
            // Button released: commit (or clear, for a plain click).
            self.dragging = false;
            self.selection = match mode {
                SelectionMode::Rect => match (self.drag_start, self.drag_current) {
                    (Some(a), Some(b))
                        if (a[0] - b[0]).abs() >= MIN_DRAG_EXTENT
                            && (a[1] - b[1]).abs() >= MIN_DRAG_EXTENT =>
                    {
                        Some(Selection::Rect {
                            x: [a[0], b[0]],
                            y: [a[1], b[1]],
                        })
                    }
                    _ => None,
                },
                SelectionMode::Lasso => {
                    if self.lasso_points.len() >= 3 {
                        Some(Selection::Lasso {
                            points: std::mem::take(&mut self.lasso_points),
                        })
                    } else {
                        None
                    }
                }
            };
            self.drag_start = None;
            self.drag_current = None;
            self.lasso_points.clear();
        }
    }
}

fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn draw_rect_outline(plot_ui: &mut egui_plot::PlotUi, a: [f64; 2], b: [f64; 2]) {
    let outline = vec![
        [a[0], a[1]],
        [b[0], a[1]],
        [b[0], b[1]],
        [a[0], b[1]],
        [a[0], a[1]],
    ];
    plot_ui.line(
        Line::new(PlotPoints::from(outline))
            .color(theme::SELECTION_STROKE)
            .width(1.5),
    );
}

fn draw_polyline(plot_ui: &mut egui_plot::PlotUi, points: &[[f64; 2]], close: bool) {
    if points.len() < 2 {
        return;
    }
    let mut pts = points.to_vec();
    if close {
        pts.push(points[0]);
    }
    plot_ui.line(
        Line::new(PlotPoints::from(pts))
            .color(theme::SELECTION_STROKE)
            .width(1.5),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ImageView {
        ImageView {
            image_size: (100, 100),
            ..Default::default()
        }
    }

    #[test]
    fn drag_commits_a_rect_selection() {
        let mut v = view();
        v.handle_drag(SelectionMode::Rect, Some([10.0, 20.0]), true);
        v.handle_drag(SelectionMode::Rect, Some([40.0, 60.0]), true);
        v.handle_drag(SelectionMode::Rect, None, false);
        assert_eq!(
            v.selection,
            Some(Selection::Rect {
                x: [10.0, 40.0],
                y: [20.0, 60.0],
            })
        );
    }

    #[test]
    fn plain_click_clears_the_selection() {
        let mut v = view();
        v.selection = Some(Selection::Rect {
            x: [0.0, 10.0],
            y: [0.0, 10.0],
        });
        v.handle_drag(SelectionMode::Rect, Some([5.0, 5.0]), true);
        v.handle_drag(SelectionMode::Rect, None, false);
        assert_eq!(v.selection, None);
    }

    #[test]
    fn lasso_needs_three_points_to_commit() {
        let mut v = view();
        v.handle_drag(SelectionMode::Lasso, Some([0.0, 0.0]), true);
        v.handle_drag(SelectionMode::Lasso, Some([10.0, 0.0]), true);
        v.handle_drag(SelectionMode::Lasso, None, false);
        assert_eq!(v.selection, None);

        v.handle_drag(SelectionMode::Lasso, Some([0.0, 0.0]), true);
        v.handle_drag(SelectionMode::Lasso, Some([10.0, 0.0]), true);
        v.handle_drag(SelectionMode::Lasso, Some([10.0, 10.0]), true);
        v.handle_drag(SelectionMode::Lasso, None, false);
        assert!(matches!(
            v.selection,
            Some(Selection::Lasso { ref points }) if points.len() == 3
        ));
    }

    #[test]
    fn lasso_drops_subpixel_jitter() {
        let mut v = view();
        v.handle_drag(SelectionMode::Lasso, Some([0.0, 0.0]), true);
        v.handle_drag(SelectionMode::Lasso, Some([0.1, 0.1]), true);
        v.handle_drag(SelectionMode::Lasso, Some([5.0, 5.0]), true);
        assert_eq!(v.lasso_points.len(), 2);
    }
}
