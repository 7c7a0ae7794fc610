//! Detector core, subscription lifecycle, and the public handle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::config::NavigationConfig;
use crate::intercept::FocusIntercept;
use crate::page::{CaptureStream, Document, Element, ListenerFn, ListenerId, PageError, PageEvent};

use super::dismiss::PendingDismiss;
use super::handlers;

/// Callback notified with the new value on every mode flip.
pub type ModeListener = dyn Fn(bool);

pub(super) struct AttachedListeners {
    nav_focus: ListenerId,
    pointer: ListenerId,
    key: ListenerId,
}

pub(super) struct DetectorCore {
    pub(super) doc: Document,
    pub(super) dismiss_timeout: Duration,
    pub(super) navigating: bool,
    /// Set by a real pointer press; consumed by the follow-up focus arrival
    /// of the same gesture so it is not evaluated as a keyboard signal.
    pub(super) mouse_latch: bool,
    pub(super) pending_dismiss: Option<PendingDismiss>,
    pub(super) subscribers: Vec<Weak<ModeListener>>,
    pub(super) attached: Option<AttachedListeners>,
    pub(super) intercept: FocusIntercept,
}

impl DetectorCore {
    /// Cancels any pending dismiss and schedules a fresh one with a snapshot
    /// of the currently focused element.
    pub(super) fn schedule_dismiss(&mut self, now: Instant) {
        assert!(
            self.attached.is_some(),
            "dismiss scheduled while the navigation detector is inactive"
        );
        let snapshot = self.doc.active_element().map(|el| Element::downgrade(&el));
        self.pending_dismiss = Some(PendingDismiss::new(now + self.dismiss_timeout, snapshot));
        log::trace!("dismiss scheduled in {:?}", self.dismiss_timeout);
    }
}

impl Drop for DetectorCore {
    fn drop(&mut self) {
        deactivate(self);
    }
}

/// Attaches the three capture listeners and installs interception.
/// `core` must be the exclusively borrowed contents of `core_rc`.
fn activate(core_rc: &Rc<RefCell<DetectorCore>>, core: &mut DetectorCore) {
    core.intercept.install();

    let nav_focus: Rc<ListenerFn> = {
        let weak = Rc::downgrade(core_rc);
        Rc::new(move |event: &PageEvent| {
            if let PageEvent::NavFocus(ev) = event {
                if let Some(core) = weak.upgrade() {
                    handlers::on_nav_focus(&core, ev);
                }
            }
        })
    };
    let pointer: Rc<ListenerFn> = {
        let weak = Rc::downgrade(core_rc);
        Rc::new(move |event: &PageEvent| {
            if let PageEvent::PointerDown(ev) = event {
                if let Some(core) = weak.upgrade() {
                    handlers::on_pointer_down(&core, ev);
                }
            }
        })
    };
    let key: Rc<ListenerFn> = {
        let weak = Rc::downgrade(core_rc);
        Rc::new(move |event: &PageEvent| {
            if let PageEvent::KeyDown(ev) = event {
                if let Some(core) = weak.upgrade() {
                    handlers::on_key_down(&core, ev);
                }
            }
        })
    };

    core.attached = Some(AttachedListeners {
        nav_focus: core
            .doc
            .add_capture_listener(CaptureStream::NavFocus, nav_focus),
        pointer: core
            .doc
            .add_capture_listener(CaptureStream::PointerDown, pointer),
        key: core.doc.add_capture_listener(CaptureStream::KeyDown, key),
    });
    log::debug!("navigation detector activated (document {})", core.doc.id());
}

/// Detaches all listeners, uninstalls interception, and cancels any pending
/// dismiss. The mode flag keeps its last known value. No-op when inactive.
pub(super) fn deactivate(core: &mut DetectorCore) {
    let Some(attached) = core.attached.take() else {
        return;
    };
    core.doc.remove_capture_listener(attached.nav_focus);
    core.doc.remove_capture_listener(attached.pointer);
    core.doc.remove_capture_listener(attached.key);
    core.intercept.uninstall();
    core.pending_dismiss = None;
    core.mouse_latch = false;
    log::debug!(
        "navigation detector deactivated (document {})",
        core.doc.id()
    );
}

fn same_listener(stored: &Weak<ModeListener>, listener: &Rc<ModeListener>) -> bool {
    stored.upgrade().is_some_and(|live| {
        std::ptr::eq(
            Rc::as_ptr(&live) as *const (),
            Rc::as_ptr(listener) as *const (),
        )
    })
}

/// Keyboard-vs-pointer navigation mode detector for one document.
///
/// The handle is cheap to clone; all clones drive the same per-document
/// state machine. Listener lifecycle is reference-counted by subscriber
/// count: the first subscriber attaches the capture listeners and installs
/// focus interception, the last one detaching reverses both. With zero
/// subscribers the detector holds no document listeners at all.
#[derive(Clone)]
pub struct NavigationDetector {
    pub(super) core: Rc<RefCell<DetectorCore>>,
}

impl NavigationDetector {
    pub fn new(doc: &Document) -> Self {
        Self::with_config(doc, NavigationConfig::default())
    }

    pub fn with_config(doc: &Document, config: NavigationConfig) -> Self {
        Self {
            core: Rc::new(RefCell::new(DetectorCore {
                doc: doc.clone(),
                dismiss_timeout: config.dismiss_timeout(),
                navigating: false,
                mouse_latch: false,
                pending_dismiss: None,
                subscribers: Vec::new(),
                attached: None,
                intercept: FocusIntercept::new(doc),
            })),
        }
    }

    /// Current mode. Never panics; with zero subscribers this is the last
    /// known value (`false` after [`NavigationDetector::dispose`]).
    pub fn is_navigating_with_keyboard(&self) -> bool {
        self.core.borrow().navigating
    }

    /// Imperative override. Notifies subscribers only when the value
    /// actually flips, exactly as the internal handlers do.
    pub fn set_navigating_with_keyboard(&self, value: bool) {
        handlers::set_mode(&self.core, value);
    }

    /// Registers a mode listener. The first live subscriber activates the
    /// machine. Listeners are held weakly and compared by identity, so
    /// subscribing the same `Rc` twice is a no-op and a listener dropped
    /// without unsubscribing cannot keep the machine active.
    pub fn subscribe(&self, listener: &Rc<ModeListener>) {
        let mut core = self.core.borrow_mut();
        core.subscribers.retain(|w| w.strong_count() > 0);
        if !core
            .subscribers
            .iter()
            .any(|stored| same_listener(stored, listener))
        {
            core.subscribers.push(Rc::downgrade(listener));
        }
        if core.attached.is_none() {
            activate(&self.core, &mut core);
        }
    }

    /// Removes a mode listener. Detaching the last one deactivates the
    /// machine and restores the native focus primitive.
    pub fn unsubscribe(&self, listener: &Rc<ModeListener>) {
        let mut core = self.core.borrow_mut();
        core.subscribers
            .retain(|stored| stored.strong_count() > 0 && !same_listener(stored, listener));
        if core.subscribers.is_empty() {
            deactivate(&mut core);
        }
    }

    /// Drives the dismiss deadline. Hosts call this from their event loop;
    /// a call with nothing pending (or while inactive) is a no-op.
    pub fn advance(&self, now: Instant) {
        let fire = {
            let mut core = self.core.borrow_mut();
            if !core.pending_dismiss.as_ref().is_some_and(|p| p.due(now)) {
                return;
            }
            let Some(pending) = core.pending_dismiss.take() else {
                return;
            };
            pending.snapshot_matches(core.doc.active_element().as_ref())
        };
        if fire {
            handlers::set_mode(&self.core, false);
        } else {
            log::trace!("dismiss abandoned; focus moved before the deadline");
        }
    }

    /// Focuses an element through the retained native primitive, bypassing
    /// the interception wrapper's bookkeeping.
    pub fn force_native_focus(&self, el: &Rc<Element>) -> Result<(), PageError> {
        let intercept = self.core.borrow().intercept.clone();
        intercept.force_native_focus(el)
    }

    /// The interception layer this detector drives.
    pub fn intercept(&self) -> FocusIntercept {
        self.core.borrow().intercept.clone()
    }

    pub fn is_active(&self) -> bool {
        self.core.borrow().attached.is_some()
    }

    /// Fully reverses installation regardless of subscriber count: detaches
    /// listeners, restores the native primitive, drops all subscriptions,
    /// and resets the mode to `false`.
    pub fn dispose(&self) {
        let mut core = self.core.borrow_mut();
        deactivate(&mut core);
        core.subscribers.clear();
        core.navigating = false;
        log::debug!("navigation detector disposed (document {})", core.doc.id());
    }
}

impl PartialEq for NavigationDetector {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}
