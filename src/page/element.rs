//! Identity-bearing page elements and their weak handles.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::document::{PageError, WeakDocument};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// A node of the host page that can hold focus.
///
/// Elements are created by a [`super::Document`] and start out detached;
/// the built-in focus primitive ignores them until [`Element::connect`] is
/// called (mirrors create-then-append element lifecycles). Identity is the
/// `Rc` allocation: two handles refer to the same element iff they point to
/// the same allocation.
pub struct Element {
    id: u64,
    label: String,
    connected: Cell<bool>,
    document: WeakDocument,
}

impl Element {
    pub(crate) fn new(document: WeakDocument, label: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            connected: Cell::new(false),
            document,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Debugging label given at creation time.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Attaches the element to its document, making it focusable.
    pub fn connect(&self) {
        self.connected.set(true);
    }

    /// Detaches the element. If it was the active element, the document's
    /// active element is cleared (focus is not restored anywhere else).
    pub fn remove(self: &Rc<Self>) {
        self.connected.set(false);
        if let Some(doc) = self.document.upgrade() {
            doc.clear_active_if(self);
        }
    }

    /// Requests focus through the document's replaceable focus primitive.
    ///
    /// This is the path application code takes, and the one the interception
    /// layer wraps. Hosts delivering focus on behalf of a user gesture use
    /// [`super::Document::assign_focus`] instead.
    ///
    /// # Errors
    /// [`PageError::DocumentDropped`] when the owning document is gone.
    pub fn focus(self: &Rc<Self>) -> Result<(), PageError> {
        let doc = self.document.upgrade().ok_or(PageError::DocumentDropped)?;
        doc.invoke_focus(self)
    }

    pub fn downgrade(this: &Rc<Self>) -> WeakElement {
        WeakElement(Rc::downgrade(this))
    }

    pub(crate) fn document(&self) -> &WeakDocument {
        &self.document
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("connected", &self.connected.get())
            .finish()
    }
}

/// Ownership-free handle to an [`Element`].
///
/// Never keeps the element alive; `upgrade` returns `None` once every
/// strong handle is gone.
#[derive(Debug, Clone)]
pub struct WeakElement(Weak<Element>);

impl WeakElement {
    pub fn upgrade(&self) -> Option<Rc<Element>> {
        self.0.upgrade()
    }
}
