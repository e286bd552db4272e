// ============================================================================
// REPLAY — reconstruct the edited image from the original + action stack
// ============================================================================
//
// The current image is always replay(original, stack). Rendering memoizes
// every stack prefix, keyed by (session id, filename, image signature,
// serialized prefix): appending an action re-applies only that action on top
// of the cached previous state, and undo is served entirely from cache. The
// cache is bounded by entry count and by bytes; eviction drops the oldest
// entries first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::RgbaImage;

use crate::ops::actions::{Action, Operation};
use crate::ops::enhance::apply_enhancement;
use crate::ops::filters::apply_filter;
use crate::selection::Zone;

/// Identifies which document a cache entry belongs to. A new file (or a new
/// session) changes the scope, so stale entries can never be served.
#[derive(Clone, Copy)]
pub struct CacheScope<'a> {
    pub session_id: &'a str,
    pub filename: &'a str,
    pub signature: &'a str,
}

/// Bounded memo cache of replayed stack prefixes.
pub struct ReplayCache {
    entries: HashMap<String, Arc<RgbaImage>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    max_entries: usize,
    max_memory_bytes: usize,
    /// Running byte total of all cached images.
    total_memory: usize,
}

impl Default for ReplayCache {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ReplayCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
            max_memory_bytes: 256 * 1024 * 1024, // 256 MB default limit
            total_memory: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_memory = 0;
    }

    fn get(&self, key: &str) -> Option<Arc<RgbaImage>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, image: Arc<RgbaImage>) {
        if self.entries.contains_key(&key) {
            return;
        }
        self.total_memory += image_bytes(&image);
        self.entries.insert(key.clone(), image);
        self.order.push_back(key);
        self.prune();
    }

    /// Evict oldest entries until both the count and byte caps hold.
    fn prune(&mut self) {
        while self.order.len() > self.max_entries
            || (self.total_memory > self.max_memory_bytes && self.order.len() > 1)
        {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            if let Some(removed) = self.entries.remove(&key) {
                self.total_memory = self.total_memory.saturating_sub(image_bytes(&removed));
            }
        }
    }
}

fn image_bytes(image: &RgbaImage) -> usize {
    image.as_raw().len()
}

fn prefix_key(scope: CacheScope<'_>, prefix: &[Action]) -> String {
    format!(
        "{}|{}|{}|{}",
        scope.session_id,
        scope.filename,
        scope.signature,
        serde_json::to_string(prefix).unwrap_or_default()
    )
}

/// Apply one action to `image` in place. The selection is resolved against
/// the image's current size here, at replay time.
pub fn apply_action(image: &mut RgbaImage, action: &Action) {
    let (w, h) = image.dimensions();
    let zone = match &action.selection {
        Some(selection) => selection.resolve(w, h),
        None => Zone::full(w, h),
    };

    match &action.operation {
        Operation::Filter(kind) => apply_filter(image, *kind, &zone),
        Operation::Enhance {
            enhancement,
            enhancement_factor,
        } => apply_enhancement(image, *enhancement, *enhancement_factor, &zone),
    }
}

/// Replay `actions` on top of `original`, reusing the longest cached prefix
/// and memoizing every prefix computed along the way.
pub fn render(
    original: &Arc<RgbaImage>,
    actions: &[Action],
    scope: CacheScope<'_>,
    cache: &mut ReplayCache,
) -> Arc<RgbaImage> {
    // Longest cached prefix wins; the empty prefix is the original itself.
    let mut current = original.clone();
    let mut done = 0;
    for k in (1..=actions.len()).rev() {
        if let Some(hit) = cache.get(&prefix_key(scope, &actions[..k])) {
            current = hit;
            done = k;
            break;
        }
    }

    for k in done..actions.len() {
        let mut next = (*current).clone();
        apply_action(&mut next, &actions[k]);
        current = Arc::new(next);
        cache.insert(prefix_key(scope, &actions[..k + 1]), current.clone());
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::actions::{EnhanceKind, FilterKind};
    use crate::selection::Selection;
    use image::Rgba;

    const SCOPE: CacheScope<'static> = CacheScope {
        session_id: "s1",
        filename: "a.png",
        signature: "sig",
    };

    fn original() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        }))
    }

    fn brightness(factor: f32) -> Action {
        Action {
            operation: Operation::Enhance {
                enhancement: EnhanceKind::Brightness,
                enhancement_factor: factor,
            },
            selection: None,
        }
    }

    #[test]
    fn empty_stack_is_the_original() {
        let orig = original();
        let mut cache = ReplayCache::default();
        let out = render(&orig, &[], SCOPE, &mut cache);
        assert!(Arc::ptr_eq(&out, &orig));
        assert!(cache.is_empty());
    }

    #[test]
    fn replay_matches_sequential_application() {
        let orig = original();
        let stack = vec![
            Action {
                operation: Operation::Filter(FilterKind::Smooth),
                selection: None,
            },
            brightness(0.5),
        ];

        let mut cache = ReplayCache::default();
        let replayed = render(&orig, &stack, SCOPE, &mut cache);

        let mut expected = (*orig).clone();
        for action in &stack {
            apply_action(&mut expected, action);
        }
        assert_eq!(*replayed, expected);
    }

    #[test]
    fn every_prefix_is_memoized() {
        let orig = original();
        let stack = vec![brightness(0.5), brightness(1.5), brightness(0.9)];
        let mut cache = ReplayCache::default();
        render(&orig, &stack, SCOPE, &mut cache);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn rerender_is_served_from_cache() {
        let orig = original();
        let stack = vec![brightness(0.5), brightness(1.5)];
        let mut cache = ReplayCache::default();
        let first = render(&orig, &stack, SCOPE, &mut cache);
        let second = render(&orig, &stack, SCOPE, &mut cache);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn undo_needs_no_recomputation() {
        let orig = original();
        let stack = vec![brightness(0.5), brightness(1.5)];
        let mut cache = ReplayCache::default();
        render(&orig, &stack, SCOPE, &mut cache);

        // Popping the last action re-renders purely from cache.
        let shorter = render(&orig, &stack[..1], SCOPE, &mut cache);
        assert_eq!(cache.len(), 2);

        let mut expected = (*orig).clone();
        apply_action(&mut expected, &stack[0]);
        assert_eq!(*shorter, expected);
    }

    #[test]
    fn scope_separates_documents() {
        let orig = original();
        let stack = vec![brightness(0.5)];
        let mut cache = ReplayCache::default();
        render(&orig, &stack, SCOPE, &mut cache);

        let other = CacheScope {
            signature: "other",
            ..SCOPE
        };
        render(&orig, &stack, other, &mut cache);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_drops_oldest_first() {
        let orig = original();
        let mut cache = ReplayCache::new(2);
        let stack = vec![brightness(0.5), brightness(0.6), brightness(0.7)];
        render(&orig, &stack, SCOPE, &mut cache);
        assert_eq!(cache.len(), 2);
        // The single-action prefix was inserted first, so it is gone.
        assert!(cache.get(&prefix_key(SCOPE, &stack[..1])).is_none());
        assert!(cache.get(&prefix_key(SCOPE, &stack[..3])).is_some());
    }

    #[test]
    fn selections_resolve_at_replay_time() {
        let orig = original();
        let action = Action {
            operation: Operation::Enhance {
                enhancement: EnhanceKind::Brightness,
                enhancement_factor: 0.0,
            },
            selection: Some(Selection::Rect {
                x: [0.0, 8.0],
                y: [0.0, 8.0], // bottom half in plot coords → lower rows
            }),
        };
        let mut cache = ReplayCache::default();
        let out = render(&orig, &[action], SCOPE, &mut cache);
        assert_eq!(out.get_pixel(4, 12).0, [0, 0, 0, 255]);
        assert_ne!(out.get_pixel(4, 4).0, [0, 0, 0, 255]);
    }
}
