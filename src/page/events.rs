//! Input and focus event types for the host page model.

use std::rc::Rc;

use super::element::Element;

/// Generic key representation for cross-host compatibility.
///
/// Host implementations map their native key codes to these generic
/// key values before dispatching them on a [`super::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),
    /// Escape key
    Escape,
    /// Return/Enter key
    Return,
    /// Backspace key
    Backspace,
    /// Tab key
    Tab,
    /// Space bar
    Space,
    /// Shift modifier
    Shift,
    /// Ctrl modifier
    Ctrl,
    /// Alt modifier
    Alt,
    /// Unmapped or unrecognized key
    Unknown,
}

/// A key-down occurrence as delivered to capture listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key went down
    pub key: Key,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key }
    }
}

/// A pointer-down occurrence as delivered to capture listeners.
///
/// Carries the raw fields the navigation detector needs to tell a real
/// press apart from one synthesized by assistive technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Bitmask of buttons held down at the time of the event
    pub buttons: u32,
    /// X coordinate relative to the viewport
    pub client_x: i32,
    /// Y coordinate relative to the viewport
    pub client_y: i32,
    /// X coordinate relative to the screen
    pub screen_x: i32,
    /// Y coordinate relative to the screen
    pub screen_y: i32,
}

impl PointerEvent {
    /// Whether this looks like a synthesized press rather than a physical one.
    ///
    /// Screen readers activate controls with button-less, zero-coordinate
    /// clicks; such events must not be read as "the user switched to mouse".
    pub fn is_synthetic(&self) -> bool {
        self.buttons == 0
            || (self.client_x == 0
                && self.client_y == 0
                && self.screen_x == 0
                && self.screen_y == 0)
    }
}

/// Provenance of a focus arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusSource {
    /// Focus was assigned by a direct call to the focus primitive
    Programmatic,
    /// Focus arrived without going through the focus primitive
    UserInitiated,
    /// The interception probe failed in this environment; provenance
    /// cannot be told. Never treat this as evidence of user intent.
    Unknown,
}

/// Native focus arrival, dispatched by the document when focus moves.
#[derive(Debug, Clone)]
pub struct FocusInEvent {
    /// Element that received focus
    pub target: Rc<Element>,
    /// Previously focused element, if there was one
    pub related_target: Option<Rc<Element>>,
}

/// Augmented focus arrival, re-dispatched by the interception layer with
/// the provenance signal attached.
#[derive(Debug, Clone)]
pub struct NavFocusEvent {
    /// Element that received focus
    pub target: Rc<Element>,
    /// Previously focused element, if there was one
    pub related_target: Option<Rc<Element>>,
    /// Tri-state provenance of the arrival
    pub source: FocusSource,
}

/// The capture-phase streams a listener can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureStream {
    /// Raw pointer presses
    PointerDown,
    /// Raw key presses
    KeyDown,
    /// Native focus arrivals
    FocusIn,
    /// Augmented focus arrivals from the interception layer
    NavFocus,
}

/// Event payload delivered to capture listeners.
#[derive(Debug, Clone)]
pub enum PageEvent {
    PointerDown(PointerEvent),
    KeyDown(KeyEvent),
    FocusIn(FocusInEvent),
    NavFocus(NavFocusEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(buttons: u32, cx: i32, cy: i32, sx: i32, sy: i32) -> PointerEvent {
        PointerEvent {
            buttons,
            client_x: cx,
            client_y: cy,
            screen_x: sx,
            screen_y: sy,
        }
    }

    #[test]
    fn buttonless_press_is_synthetic() {
        assert!(pointer(0, 10, 10, 110, 110).is_synthetic());
    }

    #[test]
    fn zero_coordinate_press_is_synthetic() {
        assert!(pointer(1, 0, 0, 0, 0).is_synthetic());
    }

    #[test]
    fn ordinary_press_is_not_synthetic() {
        assert!(!pointer(1, 10, 10, 110, 110).is_synthetic());
    }

    #[test]
    fn origin_client_with_nonzero_screen_is_not_synthetic() {
        // A press in the top-left corner still has screen coordinates.
        assert!(!pointer(1, 0, 0, 1920, 3).is_synthetic());
    }
}
