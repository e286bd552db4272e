// ============================================================================
// ACTION STACK — the ordered list of edits applied to the original image
// ============================================================================
//
// Every edit is a record of what to do (filter or enhancement) and where to
// do it (optional selection). The current image is never stored; it is the
// result of replaying the stack from the original, so undo is a plain pop.

use serde::{Deserialize, Serialize};

use crate::selection::Selection;

/// The fixed-kernel filters offered by the filter dropdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Sharpen,
    Smooth,
    SmoothMore,
}

impl FilterKind {
    pub const ALL: [FilterKind; 10] = [
        FilterKind::Blur,
        FilterKind::Contour,
        FilterKind::Detail,
        FilterKind::EdgeEnhance,
        FilterKind::EdgeEnhanceMore,
        FilterKind::Emboss,
        FilterKind::FindEdges,
        FilterKind::Sharpen,
        FilterKind::Smooth,
        FilterKind::SmoothMore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Blur => "Blur",
            FilterKind::Contour => "Contour",
            FilterKind::Detail => "Detail",
            FilterKind::EdgeEnhance => "Enhance Edge",
            FilterKind::EdgeEnhanceMore => "Enhance Edge (More)",
            FilterKind::Emboss => "Emboss",
            FilterKind::FindEdges => "Find Edges",
            FilterKind::Sharpen => "Sharpen",
            FilterKind::Smooth => "Smooth",
            FilterKind::SmoothMore => "Smooth (More)",
        }
    }
}

/// The factor-driven enhancements offered by the enhance dropdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhanceKind {
    Brightness,
    Color,
    Contrast,
    Sharpness,
}

impl EnhanceKind {
    pub const ALL: [EnhanceKind; 4] = [
        EnhanceKind::Brightness,
        EnhanceKind::Color,
        EnhanceKind::Contrast,
        EnhanceKind::Sharpness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EnhanceKind::Brightness => "Brightness",
            EnhanceKind::Color => "Color Balance",
            EnhanceKind::Contrast => "Contrast",
            EnhanceKind::Sharpness => "Sharpness",
        }
    }
}

/// What an action does to the pixels inside its zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "operation", rename_all = "snake_case")]
pub enum Operation {
    Filter(FilterKind),
    Enhance {
        enhancement: EnhanceKind,
        enhancement_factor: f32,
    },
}

impl Operation {
    /// Human-readable name for the history panel and log lines.
    pub fn describe(&self) -> String {
        match self {
            Operation::Filter(kind) => kind.label().to_string(),
            Operation::Enhance {
                enhancement,
                enhancement_factor,
            } => format!("{} ×{:.2}", enhancement.label(), enhancement_factor),
        }
    }
}

/// One entry of the action stack: an operation plus the zone it targets.
/// `selection: None` means the whole image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

impl Action {
    pub fn describe(&self) -> String {
        match &self.selection {
            None => self.operation.describe(),
            Some(Selection::Rect { .. }) => format!("{} (rect)", self.operation.describe()),
            Some(Selection::Lasso { .. }) => format!("{} (lasso)", self.operation.describe()),
        }
    }
}

/// The linear edit history. Applied front-to-back to the original image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionStack(Vec<Action>);

impl ActionStack {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    /// Remove and return the most recent action. `None` on an empty stack.
    pub fn undo(&mut self) -> Option<Action> {
        self.0.pop()
    }

    /// Drop everything after the first `keep` actions (history-panel revert).
    pub fn truncate(&mut self, keep: usize) {
        self.0.truncate(keep);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn actions(&self) -> &[Action] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_action_json_shape() {
        let action = Action {
            operation: Operation::Filter(FilterKind::EdgeEnhanceMore),
            selection: None,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"filter","operation":"edge_enhance_more"}"#);
    }

    #[test]
    fn enhance_action_json_shape() {
        let action = Action {
            operation: Operation::Enhance {
                enhancement: EnhanceKind::Brightness,
                enhancement_factor: 1.5,
            },
            selection: Some(Selection::Rect {
                x: [0.0, 8.0],
                y: [0.0, 8.0],
            }),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"enhance\""));
        assert!(json.contains("\"enhancement\":\"brightness\""));
        assert!(json.contains("\"enhancement_factor\":1.5"));
        assert!(json.contains("\"selection\""));

        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn stack_round_trips_as_plain_array() {
        let mut stack = ActionStack::new();
        stack.push(Action {
            operation: Operation::Filter(FilterKind::Sharpen),
            selection: None,
        });
        let json = serde_json::to_string(&stack).unwrap();
        assert!(json.starts_with('['));
        let back: ActionStack = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stack);
    }

    #[test]
    fn undo_pops_latest_first() {
        let mut stack = ActionStack::new();
        stack.push(Action {
            operation: Operation::Filter(FilterKind::Blur),
            selection: None,
        });
        stack.push(Action {
            operation: Operation::Filter(FilterKind::Emboss),
            selection: None,
        });

        let popped = stack.undo().unwrap();
        assert_eq!(popped.operation, Operation::Filter(FilterKind::Emboss));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn undo_on_empty_stack_is_a_noop() {
        let mut stack = ActionStack::new();
        assert!(stack.undo().is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn truncate_reverts_to_prefix() {
        let mut stack = ActionStack::new();
        for kind in [FilterKind::Blur, FilterKind::Detail, FilterKind::Sharpen] {
            stack.push(Action {
                operation: Operation::Filter(kind),
                selection: None,
            });
        }
        stack.truncate(1);
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack.actions()[0].operation,
            Operation::Filter(FilterKind::Blur)
        );
    }
}
