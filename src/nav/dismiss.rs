//! Pending dismiss bookkeeping.

use std::rc::Rc;
use std::time::Instant;

use crate::page::{Element, WeakElement};

/// One scheduled dismiss: Escape was pressed in keyboard mode, and if focus
/// has not moved by the deadline, the mode drops back to pointer.
///
/// At most one of these exists per detector; scheduling again replaces it,
/// and it fires at most once.
pub(super) struct PendingDismiss {
    pub(super) deadline: Instant,
    /// Active element at schedule time. `None` when nothing was focused,
    /// which abandons the dismiss at fire time.
    pub(super) snapshot: Option<WeakElement>,
}

impl PendingDismiss {
    pub(super) fn new(deadline: Instant, snapshot: Option<WeakElement>) -> Self {
        Self { deadline, snapshot }
    }

    pub(super) fn due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Whether focus is still where it was at schedule time. An expired
    /// snapshot or an empty slot on either side abandons the dismiss.
    pub(super) fn snapshot_matches(&self, current: Option<&Rc<Element>>) -> bool {
        match (
            self.snapshot.as_ref().and_then(WeakElement::upgrade),
            current,
        ) {
            (Some(snapshot), Some(current)) => Rc::ptr_eq(&snapshot, current),
            _ => false,
        }
    }
}
