//! The three capture-phase handlers and the notify-on-flip setter.
//!
//! Each handler works on the latest values only; there is no queued event
//! history. All of them require the machine to be active: reaching one
//! while inactive means a listener survived teardown, which is a lifecycle
//! bug worth failing loudly over.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::page::{FocusSource, Key, KeyEvent, NavFocusEvent, PointerEvent};

use super::detector::{DetectorCore, ModeListener, deactivate};

/// Flips the mode flag and notifies subscribers of the new value.
///
/// Notification fires iff the value actually changes, which also bounds
/// re-entrant `set_mode` calls from inside a callback. No borrow is held
/// while callbacks run, so a subscriber may unsubscribe itself (or others).
pub(super) fn set_mode(core: &Rc<RefCell<DetectorCore>>, value: bool) {
    let listeners = {
        let mut c = core.borrow_mut();
        if c.navigating == value {
            return;
        }
        c.navigating = value;
        log::debug!("keyboard navigation mode: {value}");
        collect_live(&mut c.subscribers)
    };
    for listener in &listeners {
        listener(value);
    }
    // Pruning above may have found every subscriber already dropped; the
    // machine must not stay attached with no one listening.
    let mut c = core.borrow_mut();
    if c.subscribers.is_empty() {
        deactivate(&mut c);
    }
}

fn collect_live(subscribers: &mut Vec<Weak<ModeListener>>) -> Vec<Rc<ModeListener>> {
    subscribers.retain(|w| w.strong_count() > 0);
    subscribers.iter().filter_map(Weak::upgrade).collect()
}

/// Pointer interaction always exits keyboard mode, unless the press looks
/// synthesized by assistive technology.
pub(super) fn on_pointer_down(core: &Rc<RefCell<DetectorCore>>, event: &PointerEvent) {
    {
        let mut c = core.borrow_mut();
        assert!(
            c.attached.is_some(),
            "pointer-down handler invoked while the navigation detector is inactive"
        );
        if event.is_synthetic() {
            log::trace!(
                "ignoring synthetic pointer-down (buttons={}, client=({}, {}))",
                event.buttons,
                event.client_x,
                event.client_y
            );
            return;
        }
        c.mouse_latch = true;
    }
    set_mode(core, false);
}

/// A focus arrival turns keyboard mode on only when it is definitively not
/// programmatic: ambiguity must never produce a false positive.
pub(super) fn on_nav_focus(core: &Rc<RefCell<DetectorCore>>, event: &NavFocusEvent) {
    {
        let mut c = core.borrow_mut();
        assert!(
            c.attached.is_some(),
            "focus handler invoked while the navigation detector is inactive"
        );
        if c.mouse_latch {
            // Expected follow-up focus of the pointer gesture.
            c.mouse_latch = false;
            return;
        }
        if c.navigating {
            return;
        }
        if event.related_target.is_none() {
            // Initial focus; nothing was focused before.
            return;
        }
        match event.source {
            FocusSource::Programmatic | FocusSource::Unknown => return,
            FocusSource::UserInitiated => {}
        }
    }
    set_mode(core, true);
}

/// Tab is the unambiguous keyboard-navigation signal; Escape in keyboard
/// mode starts the dismiss countdown.
pub(super) fn on_key_down(core: &Rc<RefCell<DetectorCore>>, event: &KeyEvent) {
    let mut c = core.borrow_mut();
    assert!(
        c.attached.is_some(),
        "key-down handler invoked while the navigation detector is inactive"
    );
    if !c.navigating && event.key == Key::Tab {
        drop(c);
        set_mode(core, true);
    } else if c.navigating && event.key == Key::Escape {
        c.schedule_dismiss(Instant::now());
    }
}
