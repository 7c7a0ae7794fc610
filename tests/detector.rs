use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use keysense::{
    Config, DetectorRegistry, Document, Key, KeyEvent, ModeListener, PointerEvent,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn recording() -> (Rc<ModeListener>, Rc<RefCell<Vec<bool>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let listener: Rc<ModeListener> = Rc::new(move |value| sink.borrow_mut().push(value));
    (listener, seen)
}

fn click_at(x: i32, y: i32) -> PointerEvent {
    PointerEvent {
        buttons: 1,
        client_x: x,
        client_y: y,
        screen_x: x + 100,
        screen_y: y + 100,
    }
}

#[test]
fn end_to_end_mode_round_trip() {
    init_logs();
    let mut registry = DetectorRegistry::new();
    let doc = Document::new();
    let detector = registry.create_if_missing(&doc);
    assert!(!detector.is_active());

    let (listener, seen) = recording();
    detector.subscribe(&listener);
    assert!(detector.is_active());
    assert!(detector.intercept().is_installed());

    doc.dispatch_key_down(KeyEvent::new(Key::Tab));
    assert_eq!(*seen.borrow(), vec![true]);

    doc.dispatch_pointer_down(click_at(10, 10));
    assert_eq!(*seen.borrow(), vec![true, false]);

    detector.unsubscribe(&listener);
    assert!(!detector.is_active());
    assert!(!detector.intercept().is_installed());
}

#[test]
fn focus_pipeline_distinguishes_programmatic_from_user() {
    init_logs();
    let mut registry = DetectorRegistry::new();
    let doc = Document::new();
    let detector = registry.create_if_missing(&doc);
    let (listener, seen) = recording();
    detector.subscribe(&listener);

    let input = doc.create_element("input");
    let button = doc.create_element("button");
    let link = doc.create_element("link");
    input.connect();
    button.connect();
    link.connect();

    // Initial focus: no related target, no mode change.
    doc.assign_focus(&input).unwrap();
    assert!(!detector.is_navigating_with_keyboard());

    // Application code moves focus; must not look like keyboard use.
    button.focus().unwrap();
    assert!(!detector.is_navigating_with_keyboard());

    // The platform moves focus on the user's behalf.
    doc.assign_focus(&link).unwrap();
    assert!(detector.is_navigating_with_keyboard());
    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn force_native_focus_skips_programmatic_bookkeeping() {
    init_logs();
    let doc = Document::new();
    let mut registry = DetectorRegistry::new();
    let detector = registry.create_if_missing(&doc);
    let (listener, _seen) = recording();
    detector.subscribe(&listener);

    let a = doc.create_element("a");
    a.connect();
    detector.force_native_focus(&a).unwrap();

    assert!(detector.intercept().last_focused_programmatically().is_none());
    assert!(doc.active_element().is_some());
}

#[test]
fn sealed_environment_degrades_without_false_positives() {
    init_logs();
    let mut registry = DetectorRegistry::new();
    let doc = Document::new_sealed();
    let detector = registry.create_if_missing(&doc);
    let (listener, seen) = recording();
    detector.subscribe(&listener);

    let a = doc.create_element("a");
    let b = doc.create_element("b");
    a.connect();
    b.connect();

    // Provenance is unknown here, so no focus arrival may enable the mode.
    doc.assign_focus(&a).unwrap();
    doc.assign_focus(&b).unwrap();
    assert!(!detector.is_navigating_with_keyboard());
    assert!(seen.borrow().is_empty());

    // The key path is unaffected by the degradation.
    doc.dispatch_key_down(KeyEvent::new(Key::Tab));
    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn configured_dismiss_timeout_is_honored() {
    init_logs();
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[navigation]\ndismiss_timeout_ms = 100\n").unwrap();
    let config = Config::load_from(&path).unwrap();

    let mut registry = DetectorRegistry::new();
    let doc = Document::new();
    let detector = registry.create_if_missing_with(&doc, config.navigation);
    let (listener, _seen) = recording();
    detector.subscribe(&listener);

    let el = doc.create_element("panel");
    el.connect();
    doc.assign_focus(&el).unwrap();
    doc.dispatch_key_down(KeyEvent::new(Key::Tab));
    assert!(detector.is_navigating_with_keyboard());

    doc.dispatch_key_down(KeyEvent::new(Key::Escape));
    detector.advance(Instant::now() + Duration::from_millis(50));
    assert!(detector.is_navigating_with_keyboard());
    detector.advance(Instant::now() + Duration::from_millis(150));
    assert!(!detector.is_navigating_with_keyboard());
}

#[test]
fn registry_teardown_leaves_no_residue() {
    init_logs();
    let mut registry = DetectorRegistry::new();
    let doc = Document::new();
    let detector = registry.create_if_missing(&doc);
    let (listener, _seen) = recording();
    detector.subscribe(&listener);
    doc.dispatch_key_down(KeyEvent::new(Key::Tab));

    registry.dispose(&doc);
    assert!(!detector.is_active());
    assert!(!detector.is_navigating_with_keyboard());
    assert!(registry.is_empty());

    // A fresh detector over the same document behaves like the first.
    let fresh = registry.create_if_missing(&doc);
    let (listener2, seen2) = recording();
    fresh.subscribe(&listener2);
    doc.dispatch_key_down(KeyEvent::new(Key::Tab));
    assert_eq!(*seen2.borrow(), vec![true]);
}
