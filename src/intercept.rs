//! Native-focus interception layer.
//!
//! Wraps the document's focus primitive so that every focus arrival can be
//! classified as programmatic (application code called the primitive) or
//! user-initiated (the platform moved focus on its own). Each arrival is
//! re-dispatched as an augmented [`NavFocusEvent`] carrying the previously
//! focused element and the tri-state provenance signal.
//!
//! In environments where the primitive cannot be wrapped (sealed documents),
//! installation still proceeds for related-target forwarding; provenance
//! degrades to [`FocusSource::Unknown`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::page::{
    CaptureStream, Document, Element, FocusSource, ListenerFn, ListenerId, NavFocusEvent,
    PageError, PageEvent, WeakElement,
};
use crate::page::document::FocusFn;

#[derive(Default)]
struct InterceptState {
    /// Original primitive, retained while installed so it can be restored
    /// and invoked directly.
    native: Option<Rc<FocusFn>>,
    focusin: Option<ListenerId>,
    /// Most recent element focused through the wrapper. Consumed by the next
    /// focus arrival; never keeps the element alive.
    last_programmatic: Option<WeakElement>,
    /// Cached probe result. An environmental fact, so it survives
    /// uninstall/install cycles.
    can_intercept: Option<bool>,
}

/// Owns interception of one document's focus primitive.
///
/// All operations are idempotent where the caller could reasonably repeat
/// them: probing is cached, installing over an installed wrapper is a no-op,
/// and uninstalling when never installed is a no-op.
#[derive(Clone)]
pub struct FocusIntercept {
    doc: Document,
    state: Rc<RefCell<InterceptState>>,
}

impl FocusIntercept {
    pub fn new(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            state: Rc::new(RefCell::new(InterceptState::default())),
        }
    }

    /// Whether the focus primitive can actually be wrapped on this document.
    ///
    /// Probed once, lazily: the slot is swapped for a recording no-op, a
    /// throwaway detached element is focused, and the slot restored. The
    /// result is cached. A `false` result means later augmented events carry
    /// [`FocusSource::Unknown`], which callers must not treat as evidence of
    /// user-initiated focus.
    pub fn probe(&self) -> bool {
        if let Some(cached) = self.state.borrow().can_intercept {
            return cached;
        }

        let saved = self.doc.focus_slot();
        let called = Rc::new(Cell::new(false));
        let recorder: Rc<FocusFn> = {
            let called = Rc::clone(&called);
            Rc::new(move |_doc: &Document, _el: &Rc<Element>| {
                called.set(true);
                Ok(())
            })
        };
        self.doc.set_focus_slot(recorder);
        let scratch = self.doc.create_element("focus-probe");
        let _ = scratch.focus();
        self.doc.set_focus_slot(saved);

        let result = called.get();
        self.state.borrow_mut().can_intercept = Some(result);
        if !result {
            log::debug!(
                "focus primitive is not interceptable on document {}; provenance degrades to unknown",
                self.doc.id()
            );
        }
        result
    }

    pub fn is_installed(&self) -> bool {
        self.state.borrow().native.is_some()
    }

    /// Wraps the focus primitive and starts forwarding augmented arrivals.
    ///
    /// The wrapper records a weak reference to the element being focused,
    /// then invokes the retained original with unchanged semantics. A single
    /// capture listener on the native arrival stream builds the augmented
    /// event: provenance is decided by identity comparison of the arrival
    /// target against the recorded reference, which is consumed either way.
    pub fn install(&self) {
        if self.is_installed() {
            return;
        }
        let can_intercept = self.probe();

        let original = self.doc.focus_slot();
        let wrapper: Rc<FocusFn> = {
            let state = Rc::downgrade(&self.state);
            let original = Rc::clone(&original);
            Rc::new(move |doc: &Document, el: &Rc<Element>| {
                if let Some(state) = state.upgrade() {
                    state.borrow_mut().last_programmatic = Some(Element::downgrade(el));
                }
                original(doc, el)
            })
        };
        self.doc.set_focus_slot(wrapper);

        let listener: Rc<ListenerFn> = {
            let state = Rc::downgrade(&self.state);
            let doc = self.doc.downgrade();
            Rc::new(move |event: &PageEvent| {
                let PageEvent::FocusIn(arrival) = event else {
                    return;
                };
                let (Some(state), Some(doc)) = (state.upgrade(), doc.upgrade()) else {
                    return;
                };
                let source = {
                    let mut state = state.borrow_mut();
                    let recorded = state.last_programmatic.take();
                    if can_intercept || recorded.is_some() {
                        let programmatic = recorded
                            .and_then(|weak| weak.upgrade())
                            .is_some_and(|el| Rc::ptr_eq(&el, &arrival.target));
                        if programmatic {
                            FocusSource::Programmatic
                        } else {
                            FocusSource::UserInitiated
                        }
                    } else {
                        FocusSource::Unknown
                    }
                };
                doc.dispatch_event(
                    CaptureStream::NavFocus,
                    &PageEvent::NavFocus(NavFocusEvent {
                        target: Rc::clone(&arrival.target),
                        related_target: arrival.related_target.clone(),
                        source,
                    }),
                );
            })
        };
        let focusin = self.doc.add_capture_listener(CaptureStream::FocusIn, listener);

        let mut state = self.state.borrow_mut();
        state.native = Some(original);
        state.focusin = Some(focusin);
        log::debug!("focus interception installed on document {}", self.doc.id());
    }

    /// Restores the original primitive and stops forwarding. Safe to call
    /// when never installed. The probe cache is kept.
    pub fn uninstall(&self) {
        let (native, focusin) = {
            let mut state = self.state.borrow_mut();
            state.last_programmatic = None;
            (state.native.take(), state.focusin.take())
        };
        if let Some(native) = native {
            self.doc.set_focus_slot(native);
            log::debug!("focus interception removed from document {}", self.doc.id());
        }
        if let Some(id) = focusin {
            self.doc.remove_capture_listener(id);
        }
    }

    /// Focuses an element through the retained original primitive, bypassing
    /// the wrapper's bookkeeping. Falls back to the ordinary focus path when
    /// not installed.
    ///
    /// The resulting arrival carries no programmatic record, so with a
    /// working probe it reports as user-initiated; callers use this when the
    /// programmatic-focus suppression must not apply.
    pub fn force_native_focus(&self, el: &Rc<Element>) -> Result<(), PageError> {
        let native = self.state.borrow().native.clone();
        match native {
            Some(native) => native(&self.doc, el),
            None => el.focus(),
        }
    }

    /// Reads the last programmatically focused element without consuming the
    /// record. `None` when nothing was recorded or the element is gone.
    pub fn last_focused_programmatically(&self) -> Option<Rc<Element>> {
        self.state
            .borrow()
            .last_programmatic
            .as_ref()
            .and_then(WeakElement::upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn nav_focus_log(doc: &Document) -> Rc<RefCell<Vec<(String, FocusSource)>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.add_capture_listener(
            CaptureStream::NavFocus,
            Rc::new(move |event: &PageEvent| {
                if let PageEvent::NavFocus(ev) = event {
                    sink.borrow_mut()
                        .push((ev.target.label().to_string(), ev.source));
                }
            }),
        );
        seen
    }

    #[test]
    fn probe_succeeds_on_standard_document() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        assert!(intercept.probe());
        assert!(intercept.probe());
        assert!(doc.active_element().is_none());
    }

    #[test]
    fn probe_fails_on_sealed_document() {
        let doc = Document::new_sealed();
        let intercept = FocusIntercept::new(&doc);
        assert!(!intercept.probe());
        assert!(doc.active_element().is_none());
    }

    #[test]
    fn install_round_trip_restores_primitive_identity() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        let pristine = doc.focus_slot();

        intercept.install();
        assert!(intercept.is_installed());
        assert!(!Rc::ptr_eq(&pristine, &doc.focus_slot()));

        intercept.uninstall();
        assert!(!intercept.is_installed());
        assert!(Rc::ptr_eq(&pristine, &doc.focus_slot()));

        // Repeated uninstall stays a no-op.
        intercept.uninstall();
        assert!(Rc::ptr_eq(&pristine, &doc.focus_slot()));
    }

    #[test]
    fn repeated_install_does_not_double_wrap() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        intercept.install();
        let wrapped = doc.focus_slot();
        intercept.install();
        assert!(Rc::ptr_eq(&wrapped, &doc.focus_slot()));
    }

    #[test]
    fn programmatic_focus_is_classified_and_consumed() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        intercept.install();
        let seen = nav_focus_log(&doc);

        let a = doc.create_element("a");
        let b = doc.create_element("b");
        a.connect();
        b.connect();

        a.focus().unwrap();
        doc.assign_focus(&b).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("a".to_string(), FocusSource::Programmatic),
                ("b".to_string(), FocusSource::UserInitiated)
            ]
        );
        // The record was consumed by the first arrival.
        assert!(intercept.last_focused_programmatically().is_none());
    }

    #[test]
    fn record_on_detached_element_is_readable_until_dropped() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        intercept.install();

        // Detached: the wrapper records, the primitive does nothing, so no
        // arrival consumes the record.
        let ghost = doc.create_element("ghost");
        ghost.focus().unwrap();
        assert!(
            intercept
                .last_focused_programmatically()
                .is_some_and(|el| Rc::ptr_eq(&el, &ghost))
        );

        drop(ghost);
        assert!(intercept.last_focused_programmatically().is_none());
    }

    #[test]
    fn sealed_document_reports_unknown_provenance() {
        let doc = Document::new_sealed();
        let intercept = FocusIntercept::new(&doc);
        intercept.install();
        let seen = nav_focus_log(&doc);

        let a = doc.create_element("a");
        let b = doc.create_element("b");
        a.connect();
        b.connect();

        a.focus().unwrap();
        doc.assign_focus(&b).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("a".to_string(), FocusSource::Unknown),
                ("b".to_string(), FocusSource::Unknown)
            ]
        );
    }

    #[test]
    fn force_native_focus_bypasses_bookkeeping() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        intercept.install();
        let seen = nav_focus_log(&doc);

        let a = doc.create_element("a");
        let b = doc.create_element("b");
        a.connect();
        b.connect();
        doc.assign_focus(&a).unwrap();

        intercept.force_native_focus(&b).unwrap();

        assert!(Rc::ptr_eq(&doc.active_element().unwrap(), &b));
        assert_eq!(seen.borrow().last().unwrap().1, FocusSource::UserInitiated);
    }

    #[test]
    fn force_native_focus_works_before_install() {
        let doc = Document::new();
        let intercept = FocusIntercept::new(&doc);
        let a = doc.create_element("a");
        a.connect();
        intercept.force_native_focus(&a).unwrap();
        assert!(Rc::ptr_eq(&doc.active_element().unwrap(), &a));
    }
}
