//! Per-window document: focus assignment, the patchable focus slot, and
//! capture-phase event dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::element::Element;
use super::events::{CaptureStream, FocusInEvent, KeyEvent, PageEvent, PointerEvent};

/// Errors raised by focus assignment.
#[derive(Debug, Error)]
pub enum PageError {
    /// The element outlived its owning document.
    #[error("element's owning document is gone")]
    DocumentDropped,
    /// The element was created by a different document.
    #[error("element belongs to a different document")]
    ForeignDocument,
}

/// Signature of the focus primitive held in the document's slot.
pub(crate) type FocusFn = dyn Fn(&Document, &Rc<Element>) -> Result<(), PageError>;

/// Signature of a capture-phase listener.
pub type ListenerFn = dyn Fn(&PageEvent);

/// Handle returned by [`Document::add_capture_listener`], used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId {
    stream: CaptureStream,
    serial: u64,
}

struct DocumentState {
    id: u64,
    /// Whether `Element::focus` routes through the replaceable slot. Sealed
    /// documents model environments where prototype patching is bypassed.
    patchable: bool,
    active: Option<Weak<Element>>,
    focus_slot: Rc<FocusFn>,
    listeners: HashMap<CaptureStream, Vec<(u64, Rc<ListenerFn>)>>,
    next_listener: u64,
}

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// One host window's document.
///
/// Owns the currently focused element, the capture-phase listener lists for
/// each event stream, and the replaceable focus-assignment primitive. The
/// handle is cheap to clone; all clones refer to the same document.
#[derive(Clone)]
pub struct Document {
    shared: Rc<RefCell<DocumentState>>,
}

/// Ownership-free handle to a [`Document`].
#[derive(Clone)]
pub struct WeakDocument(Weak<RefCell<DocumentState>>);

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.0.upgrade().map(|shared| Document { shared })
    }

    pub(crate) fn is(&self, doc: &Document) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&doc.shared))
    }
}

impl Document {
    /// Creates a document whose focus primitive routes through the
    /// replaceable slot, so interception works at full precision.
    pub fn new() -> Self {
        Self::with_patchable(true)
    }

    /// Creates a document that bypasses the replaceable slot, modeling
    /// environments where patching the focus primitive silently fails.
    /// Interception still installs; only provenance degrades to
    /// [`super::FocusSource::Unknown`].
    pub fn new_sealed() -> Self {
        Self::with_patchable(false)
    }

    fn with_patchable(patchable: bool) -> Self {
        let builtin: Rc<FocusFn> =
            Rc::new(|doc: &Document, el: &Rc<Element>| Document::builtin_focus(doc, el));
        Document {
            shared: Rc::new(RefCell::new(DocumentState {
                id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
                patchable,
                active: None,
                focus_slot: builtin,
                listeners: HashMap::new(),
                next_listener: 0,
            })),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.borrow().id
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Rc::downgrade(&self.shared))
    }

    /// Creates a detached element owned by this document.
    pub fn create_element(&self, label: impl Into<String>) -> Rc<Element> {
        Element::new(self.downgrade(), label)
    }

    /// The currently focused element, if any.
    pub fn active_element(&self) -> Option<Rc<Element>> {
        self.shared.borrow().active.as_ref().and_then(Weak::upgrade)
    }

    /// Moves focus the way the platform's default handling does (Tab
    /// traversal, pointer click): bypasses the replaceable focus primitive
    /// entirely and dispatches the arrival directly.
    ///
    /// # Errors
    /// [`PageError::ForeignDocument`] when the element belongs elsewhere.
    pub fn assign_focus(&self, el: &Rc<Element>) -> Result<(), PageError> {
        Self::builtin_focus(self, el)
    }

    /// Dispatches a raw pointer-down to capture listeners.
    pub fn dispatch_pointer_down(&self, event: PointerEvent) {
        self.dispatch_event(CaptureStream::PointerDown, &PageEvent::PointerDown(event));
    }

    /// Dispatches a raw key-down to capture listeners.
    pub fn dispatch_key_down(&self, event: KeyEvent) {
        self.dispatch_event(CaptureStream::KeyDown, &PageEvent::KeyDown(event));
    }

    /// Attaches a capture-phase listener to one of the event streams.
    ///
    /// Listeners run ahead of any target-level handling, in registration
    /// order. The dispatch loop works on a snapshot, so a listener may
    /// detach itself (or others) from within its own callback.
    pub fn add_capture_listener(&self, stream: CaptureStream, listener: Rc<ListenerFn>) -> ListenerId {
        let mut state = self.shared.borrow_mut();
        let serial = state.next_listener;
        state.next_listener += 1;
        state
            .listeners
            .entry(stream)
            .or_default()
            .push((serial, listener));
        ListenerId { stream, serial }
    }

    /// Detaches a previously attached capture listener. Unknown ids are a
    /// no-op.
    pub fn remove_capture_listener(&self, id: ListenerId) {
        let mut state = self.shared.borrow_mut();
        if let Some(list) = state.listeners.get_mut(&id.stream) {
            list.retain(|(serial, _)| *serial != id.serial);
        }
    }

    pub(crate) fn dispatch_event(&self, stream: CaptureStream, event: &PageEvent) {
        let snapshot: Vec<Rc<ListenerFn>> = {
            let state = self.shared.borrow();
            match state.listeners.get(&stream) {
                Some(list) => list.iter().map(|(_, f)| Rc::clone(f)).collect(),
                None => return,
            }
        };
        for listener in snapshot {
            listener(event);
        }
    }

    pub(crate) fn focus_slot(&self) -> Rc<FocusFn> {
        Rc::clone(&self.shared.borrow().focus_slot)
    }

    pub(crate) fn set_focus_slot(&self, slot: Rc<FocusFn>) {
        self.shared.borrow_mut().focus_slot = slot;
    }

    /// Routes a focus request through the slot, or straight to the built-in
    /// primitive on sealed documents.
    pub(crate) fn invoke_focus(&self, el: &Rc<Element>) -> Result<(), PageError> {
        let (patchable, slot) = {
            let state = self.shared.borrow();
            (state.patchable, Rc::clone(&state.focus_slot))
        };
        if patchable {
            slot(self, el)
        } else {
            Self::builtin_focus(self, el)
        }
    }

    pub(crate) fn clear_active_if(&self, el: &Rc<Element>) {
        let mut state = self.shared.borrow_mut();
        if let Some(active) = &state.active {
            if active.as_ptr() == Rc::as_ptr(el) {
                state.active = None;
            }
        }
    }

    /// The built-in focus primitive: updates the active element and
    /// dispatches the native focus arrival. Detached elements and the
    /// already-active element are silent no-ops (no arrival storms).
    fn builtin_focus(doc: &Document, el: &Rc<Element>) -> Result<(), PageError> {
        if !el.document().is(doc) {
            return Err(PageError::ForeignDocument);
        }
        if !el.is_connected() {
            log::trace!("focus ignored for detached element '{}'", el.label());
            return Ok(());
        }
        let previous = {
            let mut state = doc.shared.borrow_mut();
            let previous = state.active.as_ref().and_then(Weak::upgrade);
            if previous.as_ref().is_some_and(|p| Rc::ptr_eq(p, el)) {
                return Ok(());
            }
            state.active = Some(Rc::downgrade(el));
            previous
        };
        log::trace!(
            "focus moved to '{}' (from {:?})",
            el.label(),
            previous.as_ref().map(|p| p.label())
        );
        doc.dispatch_event(
            CaptureStream::FocusIn,
            &PageEvent::FocusIn(FocusInEvent {
                target: Rc::clone(el),
                related_target: previous,
            }),
        );
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
