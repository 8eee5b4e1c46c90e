mod common;

use std::sync::Arc;

use common::TestApplication;
use parking_lot::Mutex;
use shoji_core::{ViewBehavior, ViewId, ViewTree, Window};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    focusable: bool,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, focusable: bool, log: &Log) -> Box<Self> {
        Box::new(Self {
            name,
            focusable,
            log: Arc::clone(log),
        })
    }
}

impl ViewBehavior for Recorder {
    fn can_become_direct_focus(&self) -> bool {
        self.focusable
    }

    fn focus_gained(&mut self, _id: ViewId, _window: &mut Window) {
        self.log.lock().push(format!("{} gained", self.name));
    }

    fn focus_lost(&mut self, _id: ViewId, _window: &mut Window) {
        self.log.lock().push(format!("{} lost", self.name));
    }

    fn focus_changed(&mut self, _id: ViewId, _window: &mut Window) {
        self.log.lock().push(format!("{} changed", self.name));
    }
}

struct Fixture {
    window: Window,
    container_a: ViewId,
    leaf_a1: ViewId,
    leaf_a2: ViewId,
    leaf_b1: ViewId,
    log: Log,
}

/// content ─ container_a ─ leaf_a1, leaf_a2
///         └ container_b ─ leaf_b1
fn fixture() -> Fixture {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut window = Window::new(TestApplication::new()).expect("window");
    let content = window.content_view();

    let container_a = window.add_view(Recorder::new("a", false, &log));
    let container_b = window.add_view(Recorder::new("b", false, &log));
    let leaf_a1 = window.add_view(Recorder::new("a1", true, &log));
    let leaf_a2 = window.add_view(Recorder::new("a2", true, &log));
    let leaf_b1 = window.add_view(Recorder::new("b1", true, &log));

    window.add_subview(content, container_a);
    window.add_subview(content, container_b);
    window.add_subview(container_a, leaf_a1);
    window.add_subview(container_a, leaf_a2);
    window.add_subview(container_b, leaf_b1);

    Fixture {
        window,
        container_a,
        leaf_a1,
        leaf_a2,
        leaf_b1,
        log,
    }
}

fn drain(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock())
}

#[test]
fn test_initial_focus_notifies_whole_chain() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));

    assert_eq!(f.window.focus(), Some(f.leaf_a1));
    // Phase two only: gained then changed up the new chain. The content
    // view has no recorder, so the log stops at the container.
    assert_eq!(
        drain(&f.log),
        vec!["a1 gained", "a1 changed", "a gained", "a changed"]
    );
}

#[test]
fn test_shared_ancestors_get_one_changed_and_no_gain_loss() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    // a1 -> a2 shares container_a: the container must see exactly one
    // focus_changed and neither focus_lost nor focus_gained.
    f.window.set_focus(Some(f.leaf_a2));
    let events = drain(&f.log);
    assert_eq!(
        events,
        vec![
            "a1 lost",
            "a1 changed",
            "a changed",
            "a2 gained",
            "a2 changed"
        ]
    );
    assert_eq!(events.iter().filter(|e| *e == "a changed").count(), 1);
    assert!(!events.contains(&"a lost".to_owned()));
    assert!(!events.contains(&"a gained".to_owned()));
}

#[test]
fn test_cross_branch_focus_transfer() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    f.window.set_focus(Some(f.leaf_b1));
    assert_eq!(
        drain(&f.log),
        vec![
            "a1 lost",
            "a1 changed",
            "a lost",
            "a changed",
            "b1 gained",
            "b1 changed",
            "b gained",
            "b changed"
        ]
    );
}

#[test]
fn test_clearing_focus_notifies_old_chain() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    f.window.set_focus(None);
    assert_eq!(f.window.focus(), None);
    assert_eq!(
        drain(&f.log),
        vec!["a1 lost", "a1 changed", "a lost", "a changed"]
    );
}

#[test]
fn test_refocusing_same_view_is_noop() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    f.window.set_focus(Some(f.leaf_a1));
    assert!(drain(&f.log).is_empty());
}

#[test]
fn test_unfocusable_candidate_is_dropped_silently() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    // The container's default expected_focus declines, so nothing changes.
    f.window.set_focus(Some(f.container_a));
    assert_eq!(f.window.focus(), Some(f.leaf_a1));
    assert!(drain(&f.log).is_empty());
}

struct RedirectToChild;

impl ViewBehavior for RedirectToChild {
    fn expected_focus(&self, id: ViewId, views: &ViewTree) -> Option<ViewId> {
        views
            .subviews(id)
            .iter()
            .copied()
            .find(|&child| views.can_become_direct_focus(child))
    }
}

#[test]
fn test_expected_focus_redirects_to_child() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut window = Window::new(TestApplication::new()).expect("window");
    let content = window.content_view();

    let redirecting = window.add_view(Box::new(RedirectToChild));
    let child = window.add_view(Recorder::new("child", true, &log));
    window.add_subview(content, redirecting);
    window.add_subview(redirecting, child);

    window.set_focus(Some(redirecting));
    assert_eq!(window.focus(), Some(child));

    // With no focusable child the redirect resolves to nothing and the
    // request is dropped.
    let empty = window.add_view(Box::new(RedirectToChild));
    window.add_subview(content, empty);
    window.set_focus(Some(empty));
    assert_eq!(window.focus(), Some(child));
}

#[test]
fn test_removing_focused_subtree_clears_focus() {
    let mut f = fixture();
    f.window.set_focus(Some(f.leaf_a1));
    drain(&f.log);

    f.window.remove_view(f.container_a);
    assert_eq!(f.window.focus(), None);
    // The protocol ran while the subtree was still intact.
    assert_eq!(
        drain(&f.log),
        vec!["a1 lost", "a1 changed", "a lost", "a changed"]
    );
    assert!(!f.window.views().contains(f.leaf_a1));
    assert!(f.window.views().contains(f.leaf_b1));
}
