// ============================================================================
// CONTROLS PANEL — file, selection mode, format, filter/enhance pickers
// ============================================================================

use eframe::egui;

use crate::io::DisplayFormat;
use crate::ops::actions::{EnhanceKind, FilterKind};

/// How drags on the image view are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Rect,
    Lasso,
}

/// Something the user asked for this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    OpenImage,
    SaveImage,
    ExportSession,
    ImportSession,
    RunOperation,
    Undo,
}

pub struct ControlsPanel {
    pub selection_mode: SelectionMode,
    pub display_format: DisplayFormat,
    /// Dropdown choices waiting for the next Run Operation click.
    pub pending_filter: Option<FilterKind>,
    pub pending_enhance: Option<EnhanceKind>,
    pub enhancement_factor: f32,
}

impl Default for ControlsPanel {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::Rect,
            display_format: DisplayFormat::Jpeg,
            pending_filter: None,
            pending_enhance: None,
            enhancement_factor: 1.0,
        }
    }
}

impl ControlsPanel {
    /// Draw the panel. At most one event is returned per frame.
    pub fn show(&mut self, ui: &mut egui::Ui, busy: bool) -> Option<ControlEvent> {
        let mut event = None;

        ui.horizontal(|ui| {
            if ui.button("Open Image…").clicked() {
                event = Some(ControlEvent::OpenImage);
            }
            if ui.button("Save As…").clicked() {
                event = Some(ControlEvent::SaveImage);
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Export Session…").clicked() {
                event = Some(ControlEvent::ExportSession);
            }
            if ui.button("Import Session…").clicked() {
                event = Some(ControlEvent::ImportSession);
            }
        });

        ui.separator();

        ui.label("Selection Mode");
        ui.horizontal(|ui| {
            ui.radio_value(&mut self.selection_mode, SelectionMode::Rect, "Rectangular");
            ui.radio_value(&mut self.selection_mode, SelectionMode::Lasso, "Lasso");
        });

        ui.label("Image Display Format");
        ui.horizontal(|ui| {
            ui.radio_value(&mut self.display_format, DisplayFormat::Jpeg, "JPEG");
            ui.radio_value(&mut self.display_format, DisplayFormat::Png, "PNG");
        });

        ui.separator();

        egui::ComboBox::from_id_source("dropdown-filters")
            .width(180.0)
            .selected_text(
                self.pending_filter
                    .map(|f| f.label())
                    .unwrap_or("Basic Filter…"),
            )
            .show_ui(ui, |ui| {
                for kind in FilterKind::ALL {
                    ui.selectable_value(&mut self.pending_filter, Some(kind), kind.label());
                }
            });

        egui::ComboBox::from_id_source("dropdown-enhance")
            .width(180.0)
            .selected_text(
                self.pending_enhance
                    .map(|e| e.label())
                    .unwrap_or("Enhance…"),
            )
            .show_ui(ui, |ui| {
                for kind in EnhanceKind::ALL {
                    ui.selectable_value(&mut self.pending_enhance, Some(kind), kind.label());
                }
            });

        // The factor slider only appears while an enhancement is selected.
        if self.pending_enhance.is_some() {
            ui.label("Enhancement Factor:");
            ui.add(
                egui::Slider::new(&mut self.enhancement_factor, 0.0..=2.0)
                    .step_by(0.1)
                    .fixed_decimals(1),
            );
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Run Operation"))
                .clicked()
            {
                event = Some(ControlEvent::RunOperation);
            }
            if ui.add_enabled(!busy, egui::Button::new("Undo")).clicked() {
                event = Some(ControlEvent::Undo);
            }
        });

        event
    }

    /// Both dropdowns reset to their placeholders once a run is dispatched.
    pub fn reset_pending(&mut self) {
        self.pending_filter = None;
        self.pending_enhance = None;
    }
}
