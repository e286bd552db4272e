// ============================================================================
// HISTORY PANEL — the action stack as a clickable list
// ============================================================================
//
// Entries are listed most-recent first. Clicking an older entry reverts the
// stack to that state (everything above it is dropped and the image is
// re-rendered from the original).

use eframe::egui;

use crate::ops::actions::ActionStack;

#[derive(Default)]
pub struct HistoryPanel;

impl HistoryPanel {
    /// Returns `Some(keep)` when the user asked to revert to a stack of
    /// length `keep`.
    pub fn show(&mut self, ui: &mut egui::Ui, stack: &ActionStack) -> Option<usize> {
        ui.label(format!("Edits: {}", stack.len()));

        let mut revert_to: Option<usize> = None;

        egui::ScrollArea::vertical()
            .max_height(150.0)
            .show(ui, |ui| {
                if stack.is_empty() {
                    ui.weak("No edits yet");
                    return;
                }

                let len = stack.len();
                for (depth, action) in stack.actions().iter().rev().enumerate() {
                    let is_current = depth == 0;
                    let text = if is_current {
                        egui::RichText::new(format!("▶ {}", action.describe())).strong()
                    } else {
                        egui::RichText::new(format!("  {}", action.describe())).weak()
                    };

                    let response = ui.add(egui::Label::new(text).sense(egui::Sense::click()));
                    if response.clicked() && !is_current {
                        revert_to = Some(len - depth);
                    }
                    if response.hovered() && !is_current {
                        response.on_hover_text("Click to revert to this state");
                    }
                }

                let original = ui.add(
                    egui::Label::new(egui::RichText::new("  Original image").weak())
                        .sense(egui::Sense::click()),
                );
                if original.clicked() {
                    revert_to = Some(0);
                }
            });

        revert_to
    }
}
