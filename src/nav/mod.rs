//! Keyboard navigation mode detection.
//!
//! A per-document state machine that derives "is the user navigating with
//! the keyboard" from three capture-phase streams: augmented focus arrivals,
//! raw pointer presses, and raw key presses. Subscribers are notified on
//! every flip of the boolean mode; the machine attaches its listeners only
//! while it has subscribers.

mod detector;
mod dismiss;
mod handlers;

pub use detector::{ModeListener, NavigationDetector};
