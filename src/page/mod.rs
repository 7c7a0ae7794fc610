//! Host page model the detector listens to.
//!
//! The original platform for this kind of detector is a browser document;
//! this crate has no ambient platform, so the surface the detector needs is
//! modeled explicitly: a per-window [`Document`] owning the focused element,
//! capture-phase listener lists, and the replaceable focus primitive, plus
//! identity-bearing [`Element`]s and the raw event types. There is no tree
//! structure, geometry, or rendering.

pub mod document;
pub mod element;
pub mod events;

// Re-export commonly used types at module level
pub use document::{Document, ListenerFn, ListenerId, PageError, WeakDocument};
pub use element::{Element, WeakElement};
pub use events::{
    CaptureStream, FocusInEvent, FocusSource, Key, KeyEvent, NavFocusEvent, PageEvent,
    PointerEvent,
};
