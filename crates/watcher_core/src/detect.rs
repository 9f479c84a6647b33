use crate::{Item, ProcessState};

/// Returns true when `current` must be processed as a new item.
///
/// Identity is the exact title string. No case folding or trimming happens
/// here; whatever normalization the extractor applied is all there is. An
/// empty state treats every item as new, so the first run always notifies.
pub fn is_new(current: &Item, state: &ProcessState) -> bool {
    state.last_title.as_deref() != Some(current.title())
}
