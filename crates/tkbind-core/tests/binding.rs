//! Integration tests for the binding layer against the headless runtime

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;

use tkbind::widgets::{classic, ttk};
use tkbind::{
    options, ArgValue, Font, HeadlessRuntime, IntVar, Interp, Root, StringVar, TkConfig, TkError,
    Toplevel, WidgetTree, WindowManager,
};

fn setup() -> (Rc<HeadlessRuntime>, Interp, Root) {
    let runtime = Rc::new(HeadlessRuntime::new());
    let interp = Interp::new(runtime.clone(), TkConfig::default()).unwrap();
    let root = Root::new(&interp).unwrap();
    (runtime, interp, root)
}

#[test]
fn test_special_characters_survive_the_protocol() {
    let (rt, interp, root) = setup();
    let tricky = r#"He said "hi" \now [x] {brace} $HOME"#;

    let var = StringVar::with_value(&interp, &tricky.to_string()).unwrap();
    assert_eq!(var.get(), tricky);

    let label = classic::Label::new(&root).unwrap();
    label.text(tricky).unwrap();
    assert_eq!(label.cget("text").unwrap(), tricky);
    assert_eq!(rt.widget_option(label.name(), "text").as_deref(), Some(tricky));

    let echoed = interp
        .evaluate(&format!("set echo {}", ArgValue::from(tricky).render()))
        .unwrap();
    assert_eq!(echoed, tricky);
}

#[test]
fn test_trace_fires_on_every_write() {
    let (_rt, interp, _root) = setup();
    let count = IntVar::new(&interp).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    count.trace(move |v| sink.borrow_mut().push(v));

    for _ in 0..3 {
        count.set(&7).unwrap();
    }
    assert_eq!(*seen.borrow(), vec![7, 7, 7]);
}

#[test]
fn test_traces_run_in_write_order_and_can_be_removed() {
    let (_rt, interp, _root) = setup();
    let name = StringVar::new(&interp).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let id = name.trace(move |v| sink.borrow_mut().push(v));

    name.set(&"a".to_string()).unwrap();
    interp.evaluate(&format!("set {} b", name.name())).unwrap();
    assert!(name.untrace(id));
    name.set(&"c".to_string()).unwrap();
    assert!(!name.untrace(id));

    assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_unknown_event_fields_parse_as_zero() {
    let (_rt, _interp, root) = setup();
    let button = classic::Button::new(&root).unwrap();
    let event = Rc::new(RefCell::new(None));
    let sink = event.clone();
    button
        .bind("<Button-1>", move |e| *sink.borrow_mut() = Some(e.clone()))
        .unwrap();

    button
        .interp()
        .evaluate(&format!("event generate {} <Button-1> -x 5 -y 7", button.name()))
        .unwrap();

    let event = event.borrow().clone().unwrap();
    assert_eq!((event.x, event.y), (5, 7));
    assert_eq!(event.widget, button.name());
    // Mouse events carry no key code; the runtime answers `??`
    assert_eq!(event.keycode, 0);
}

#[test]
fn test_bindings_on_different_widgets_do_not_collide() {
    let (_rt, interp, root) = setup();
    let hits = Rc::new(RefCell::new(Vec::new()));

    let first = classic::Label::new(&root).unwrap();
    let second = classic::Label::new(&root).unwrap();
    let sink = hits.clone();
    let a = first.bind("<Enter>", move |_| sink.borrow_mut().push("first")).unwrap();
    let sink = hits.clone();
    let b = second.bind("<Enter>", move |_| sink.borrow_mut().push("second")).unwrap();

    assert_ne!(interp.callback_name(a), interp.callback_name(b));
    for widget in [&first, &second] {
        interp
            .evaluate(&format!("event generate {} <Enter>", widget.name()))
            .unwrap();
    }
    assert_eq!(*hits.borrow(), vec!["first", "second"]);
}

#[test]
fn test_scheduled_callbacks_on_one_widget_are_distinct() {
    let (rt, interp, root) = setup();
    let order = Rc::new(RefCell::new(Vec::new()));
    let frame = classic::Frame::new(&root).unwrap();

    let sink = order.clone();
    let slow = frame.after(20, move || sink.borrow_mut().push("slow")).unwrap();
    let sink = order.clone();
    let fast = frame.after(10, move || sink.borrow_mut().push("fast")).unwrap();
    let sink = order.clone();
    let idle = frame.after_idle(move || sink.borrow_mut().push("idle")).unwrap();

    let names: HashSet<_> = [&slow, &fast, &idle]
        .iter()
        .map(|id| interp.callback_name(id.callback()).unwrap())
        .collect();
    assert_eq!(names.len(), 3);

    rt.advance(25).unwrap();
    assert_eq!(*order.borrow(), vec!["idle", "fast", "slow"]);
    // One-shot registrations are gone once they ran
    assert!(!interp.has_callback(slow.callback()));
}

#[test]
fn test_cancel_twice_is_harmless() {
    let (rt, _interp, root) = setup();
    let fired = Rc::new(Cell::new(false));
    let sink = fired.clone();
    let frame = classic::Frame::new(&root).unwrap();
    let id = frame.after(50, move || sink.set(true)).unwrap();

    frame.after_cancel(&id).unwrap();
    frame.after_cancel(&id).unwrap();
    rt.advance(100).unwrap();
    assert!(!fired.get());
}

#[test]
fn test_names_follow_the_parent_chain() {
    let (_rt, _interp, root) = setup();
    let outer = ttk::Frame::new(&root).unwrap();
    let inner = ttk::Frame::new(&outer).unwrap();
    let button = ttk::Button::new(&inner).unwrap();

    assert_eq!(outer.name(), format!(".frame{}", outer.id()));
    assert_eq!(inner.name(), format!("{}.frame{}", outer.name(), inner.id()));
    assert_eq!(button.name(), format!("{}.button{}", inner.name(), button.id()));
    assert_eq!(button.winfo_toplevel().unwrap(), ".");
}

#[test]
fn test_ids_are_unique_across_kinds_and_lifetimes() {
    let (_rt, interp, root) = setup();
    let mut ids = HashSet::new();

    for _ in 0..5 {
        let label = classic::Label::new(&root).unwrap();
        assert!(ids.insert(label.id()));
        label.destroy().unwrap();
    }
    let var = StringVar::new(&interp).unwrap();
    assert!(ids.insert(var.id()));
    let font = Font::new(&interp, &options! { "size" => 10 }).unwrap();
    assert!(ids.insert(font.id()));
    let window = Toplevel::new(&root).unwrap();
    assert!(ids.insert(window.id()));
}

#[test]
fn test_tree_destroy_releases_descendant_callbacks() {
    let (rt, interp, root) = setup();
    let mut tree = WidgetTree::new(&interp, root.name());
    let panel = tree.insert(None, "frame", "frame", &options! {}).unwrap();
    let button = classic::Button::new(tree.get(panel).unwrap()).unwrap();
    button.command(|| {}).unwrap();
    let key = tree.adopt(Some(panel), button).unwrap();
    let panel_name = tree.get(panel).unwrap().name().to_string();

    let before = interp.callback_count();
    tree.destroy(panel).unwrap();
    assert!(!tree.contains(key));
    assert!(!rt.widget_exists(&panel_name));
    assert_eq!(interp.callback_count(), before - 1);
}

#[test]
fn test_second_interpreter_on_thread_is_rejected() {
    let _interp = Interp::headless().unwrap();
    assert!(matches!(Interp::headless(), Err(TkError::ContextAlreadyBound)));
}

#[test]
fn test_closing_root_ends_mainloop() {
    let (rt, _interp, root) = setup();
    root.title("Demo").unwrap();
    let weak = root.interp().downgrade();
    let runtime = rt.clone();
    root.after(100, move || {
        if let Some(interp) = weak.upgrade() {
            let _ = interp.evaluate("wm title . Closing");
        }
        runtime.request_close(".").unwrap();
    })
    .unwrap();

    root.mainloop().unwrap();
    assert_eq!(root.current_title().unwrap(), "Closing");
    assert_eq!(rt.now_ms(), 100);
}

#[test]
fn test_config_file_sets_root_window() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[root]
title = "Inventory"
geometry = "640x480"

[headless]
screen_width = 800
"#
    )
    .unwrap();

    let config = TkConfig::load(file.path()).unwrap();
    let interp = Interp::headless_with_config(config).unwrap();
    let root = Root::new(&interp).unwrap();
    assert_eq!(root.current_title().unwrap(), "Inventory");
    assert!(root.current_geometry().unwrap().starts_with("640x480"));
    assert_eq!(root.screen_size().unwrap(), (800, 1080));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = TkConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(TkError::ConfigIo(_))));
}
