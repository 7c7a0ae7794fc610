//! Keyboard navigation mode detection for accessibility runtimes.
//!
//! Infers, at any instant, whether the user is navigating with the keyboard
//! or with a pointer, and exposes that mode to collaborating subsystems
//! (focus outlines, focus traps). The inference holds up under ambiguous
//! input: assistive-technology-synthesized clicks, programmatic focus calls,
//! and rapid alternation between modalities. Hosts feed raw events into a
//! [`page::Document`], subscribe through a [`nav::NavigationDetector`], and
//! drive the dismiss timer from their event loop.

pub mod config;
pub mod intercept;
pub mod nav;
pub mod page;
pub mod registry;

pub use config::{Config, NavigationConfig};
pub use intercept::FocusIntercept;
pub use nav::{ModeListener, NavigationDetector};
pub use page::{Document, Element, Key, KeyEvent, PointerEvent};
pub use registry::DetectorRegistry;
