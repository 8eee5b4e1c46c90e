mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{TestApplication, png_bytes, wait_until};
use parking_lot::Mutex;
use renderer::DrawList;
use shoji_core::{
    KeyCode, KeyModifiers, MouseButton, Rectangle, ViewBehavior, ViewId, Window, WindowDelegate,
};

const URL: &str = "https://example.com/texture.png";

fn window_with(app: &Arc<TestApplication>) -> Window {
    Window::new(Arc::clone(app) as Arc<dyn shoji_core::Application>).expect("window")
}

// MARK: texture cache

#[test]
fn test_texture_resource_cache_idempotence() {
    let app = TestApplication::new();
    app.insert_resource("icon.png", png_bytes(2, 2));
    let mut w = window_with(&app);

    let first = w.load_texture_resource("icon.png").expect("resource exists");
    let second = w.load_texture_resource("icon.png").expect("resource exists");
    assert!(Arc::ptr_eq(first.texture(), second.texture()));

    // The second load hit the cache, not the application.
    let loads = app
        .events()
        .iter()
        .filter(|e| e.starts_with("load_resource"))
        .count();
    assert_eq!(loads, 1);
}

#[test]
fn test_missing_texture_resource_returns_none() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    assert!(w.load_texture_resource("missing.png").is_none());
}

#[test]
fn test_memory_texture_cache_keys_on_buffer_identity() {
    let app = TestApplication::new();
    let mut w = window_with(&app);

    let buffer = Arc::new(png_bytes(2, 2));
    let first = w.load_texture_from_memory(Arc::clone(&buffer));
    let second = w.load_texture_from_memory(buffer);
    assert!(Arc::ptr_eq(first.texture(), second.texture()));
}

#[test]
fn test_resource_texture_loads_through_worker() {
    let app = TestApplication::new();
    app.insert_resource("icon.png", png_bytes(2, 2));
    let mut w = window_with(&app);

    let handle = w.load_texture_resource("icon.png").expect("resource exists");
    assert!(!handle.is_loaded());

    // The worker decompresses in the background; each frame's
    // ensure_textures finalizes whatever it finished.
    assert!(wait_until(Duration::from_secs(2), || {
        w.ensure_textures();
        handle.is_loaded()
    }));
}

// MARK: url download pipeline

#[test]
fn test_url_requested_twice_shares_one_pending_texture() {
    let app = TestApplication::new();
    let mut w = window_with(&app);

    let first = w.load_texture_from_url(URL);
    let second = w.load_texture_from_url(URL);

    assert!(Arc::ptr_eq(first.texture(), second.texture()));
    assert!(!first.is_loaded());
    assert!(w.is_downloading(URL));
    assert_eq!(w.pending_download_count(), 1);

    // Polling before resolution changes nothing.
    w.ensure_textures();
    assert!(w.is_downloading(URL));

    // Resolution feeds the texture and drops the table entry.
    assert!(app.resolve_download(URL, Some(Arc::new(png_bytes(2, 2)))));
    assert!(wait_until(Duration::from_secs(2), || {
        w.ensure_textures();
        !w.is_downloading(URL)
    }));
    assert!(first.texture().has_data());

    // The decompression worker and the next frames finish the load.
    assert!(wait_until(Duration::from_secs(2), || {
        w.ensure_textures();
        first.is_loaded()
    }));
    assert!(second.is_loaded());
}

#[test]
fn test_download_failure_leaves_texture_unloaded() {
    let app = TestApplication::new();
    let mut w = window_with(&app);

    let handle = w.load_texture_from_url(URL);
    assert!(app.resolve_download(URL, None));

    assert!(wait_until(Duration::from_secs(2), || {
        w.ensure_textures();
        !w.is_downloading(URL)
    }));

    // No retry: the texture stays empty indefinitely.
    w.ensure_textures();
    assert!(!handle.is_loaded());
    assert!(!handle.texture().has_data());
}

// MARK: bitmap fonts

const FONT_METADATA: &str = "info size=32 padding=2\n\
common lineHeight=40 base=32 scaleW=256 scaleH=256\n\
char id=65 x=0 y=0 width=10 height=12 xoffset=0 yoffset=0 xadvance=11";

#[test]
fn test_bitmap_font_resource_cache() {
    let app = TestApplication::new();
    app.insert_resource("font.png", png_bytes(256, 256));
    app.insert_resource("font.fnt", FONT_METADATA.as_bytes().to_vec());
    let mut w = window_with(&app);

    let first = w
        .load_bitmap_font_resource("font.png", "font.fnt")
        .expect("font resources exist");
    let second = w
        .load_bitmap_font_resource("font.png", "font.fnt")
        .expect("font resources exist");
    assert!(Arc::ptr_eq(&first, &second));

    let glyph = first.glyph(65).expect("glyph 65 should be present");
    assert_eq!(glyph.width, 10.0);
    assert_eq!(first.kerning(65, 66), 0.0);
}

#[test]
fn test_bitmap_font_missing_metadata_returns_none() {
    let app = TestApplication::new();
    app.insert_resource("font.png", png_bytes(256, 256));
    let mut w = window_with(&app);
    assert!(w.load_bitmap_font_resource("font.png", "font.fnt").is_none());
}

// MARK: per-frame updates

struct UpdateCounter {
    count: Arc<AtomicUsize>,
}

impl ViewBehavior for UpdateCounter {
    fn update(&mut self, _id: ViewId, _window: &mut Window, _elapsed: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_update_subscription_lifecycle() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let count = Arc::new(AtomicUsize::new(0));
    let view = w.add_view(Box::new(UpdateCounter {
        count: Arc::clone(&count),
    }));
    let content = w.content_view();
    w.add_subview(content, view);

    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    w.subscribe_to_updates(view);
    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 2);

    w.unsubscribe_from_updates(view);
    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_subscribe_and_unsubscribe_within_one_frame_is_not_notified() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let count = Arc::new(AtomicUsize::new(0));
    let view = w.add_view(Box::new(UpdateCounter {
        count: Arc::clone(&count),
    }));
    let content = w.content_view();
    w.add_subview(content, view);

    w.subscribe_to_updates(view);
    w.unsubscribe_from_updates(view);
    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // And the reverse order within one frame does subscribe.
    w.unsubscribe_from_updates(view);
    w.subscribe_to_updates(view);
    w.update();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// MARK: mouse dispatch

type PointLog = Arc<Mutex<Vec<(f64, f64)>>>;

struct MouseRecorder {
    log: PointLog,
    consume: bool,
}

impl ViewBehavior for MouseRecorder {
    fn mouse_down(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        _button: MouseButton,
        x: f64,
        y: f64,
    ) -> bool {
        self.log.lock().push((x, y));
        self.consume
    }

    fn mouse_drag(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        start_x: f64,
        start_y: f64,
        x: f64,
        y: f64,
    ) {
        self.log.lock().push((start_x, start_y));
        self.log.lock().push((x, y));
    }
}

#[test]
fn test_mouse_down_reaches_topmost_child_in_local_coordinates() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let content = w.content_view();

    let below_log: PointLog = Arc::new(Mutex::new(Vec::new()));
    let below = w.add_view(Box::new(MouseRecorder {
        log: Arc::clone(&below_log),
        consume: true,
    }));
    w.add_subview(content, below);
    w.set_view_bounds(below, Rectangle::new(10.0, 10.0, 40.0, 40.0));

    let above_log: PointLog = Arc::new(Mutex::new(Vec::new()));
    let above = w.add_view(Box::new(MouseRecorder {
        log: Arc::clone(&above_log),
        consume: true,
    }));
    w.add_subview(content, above);
    w.set_view_bounds(above, Rectangle::new(30.0, 30.0, 40.0, 40.0));

    // Inside both: the view added last sits on top and consumes.
    w.dispatch_mouse_down(MouseButton::Primary, 35.0, 35.0);
    assert_eq!(*above_log.lock(), vec![(5.0, 5.0)]);
    assert!(below_log.lock().is_empty());

    // Only inside the lower view.
    w.dispatch_mouse_down(MouseButton::Primary, 15.0, 15.0);
    assert_eq!(*below_log.lock(), vec![(5.0, 5.0)]);
}

#[test]
fn test_mouse_coordinates_scale_by_render_scales() {
    let app = TestApplication::with_render_scale(2.0);
    let mut w = window_with(&app);
    let content = w.content_view();

    let log: PointLog = Arc::new(Mutex::new(Vec::new()));
    let view = w.add_view(Box::new(MouseRecorder {
        log: Arc::clone(&log),
        consume: true,
    }));
    w.add_subview(content, view);
    w.set_view_bounds(view, Rectangle::new(40.0, 40.0, 20.0, 20.0));

    // Device pixels (100, 100) scale by 1/2 into content units (50, 50).
    w.dispatch_mouse_down(MouseButton::Primary, 100.0, 100.0);
    assert_eq!(*log.lock(), vec![(10.0, 10.0)]);
}

#[test]
fn test_dragged_view_gets_window_relative_drag_points() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let content = w.content_view();

    let log: PointLog = Arc::new(Mutex::new(Vec::new()));
    let view = w.add_view(Box::new(MouseRecorder {
        log: Arc::clone(&log),
        consume: true,
    }));
    w.add_subview(content, view);
    w.set_view_bounds(view, Rectangle::new(10.0, 10.0, 20.0, 20.0));

    w.dispatch_mouse_down(MouseButton::Primary, 15.0, 15.0);
    log.lock().clear();

    w.begin_dragging(view);
    w.dispatch_mouse_movement(25.0, 30.0);
    // Both points arrive converted into the dragged view's space.
    assert_eq!(*log.lock(), vec![(5.0, 5.0), (15.0, 20.0)]);

    // Mouse up ends every drag.
    w.dispatch_mouse_up(MouseButton::Primary, 25.0, 30.0);
    log.lock().clear();
    w.dispatch_mouse_movement(40.0, 40.0);
    assert!(log.lock().is_empty());
}

// MARK: keyboard responder chain

struct KeyRecorder {
    name: &'static str,
    consume: bool,
    focusable: bool,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ViewBehavior for KeyRecorder {
    fn can_become_direct_focus(&self) -> bool {
        self.focusable
    }

    fn key_down(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        _key: KeyCode,
        _modifiers: KeyModifiers,
        _repeat: bool,
    ) -> bool {
        self.log.lock().push(self.name);
        self.consume
    }
}

#[test]
fn test_unhandled_keys_bubble_up_the_responder_chain() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let content = w.content_view();
    let log = Arc::new(Mutex::new(Vec::new()));

    let parent = w.add_view(Box::new(KeyRecorder {
        name: "parent",
        consume: true,
        focusable: false,
        log: Arc::clone(&log),
    }));
    let child = w.add_view(Box::new(KeyRecorder {
        name: "child",
        consume: false,
        focusable: true,
        log: Arc::clone(&log),
    }));
    w.add_subview(content, parent);
    w.add_subview(parent, child);

    w.set_focus(Some(child));
    w.dispatch_key_down(KeyCode::Char('x'), KeyModifiers::empty(), false);
    assert_eq!(*log.lock(), vec!["child", "parent"]);
}

// MARK: layout & lifecycle

#[test]
fn test_content_layout_rescales_by_render_scales() {
    let app = TestApplication::with_render_scale(2.0);
    app.set_render_size(1600, 1200);
    let mut w = window_with(&app);

    w.set_size(800, 600);
    assert_eq!(w.render_size(), (1600, 1200));
    let content = w.content_view();
    assert_eq!(
        w.views().bounds(content),
        Rectangle::new(0.0, 0.0, 400.0, 300.0)
    );

    // An explicit render scale compounds with the device scale.
    w.set_render_scale(2.0);
    assert_eq!(
        w.views().bounds(content),
        Rectangle::new(0.0, 0.0, 200.0, 150.0)
    );
}

struct DelegateRecorder {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl WindowDelegate for DelegateRecorder {
    fn will_open(&mut self, _window: &mut Window) {
        self.log.lock().push("will_open");
    }

    fn did_open(&mut self, _window: &mut Window) {
        self.log.lock().push("did_open");
    }

    fn will_close(&mut self, _window: &mut Window) {
        self.log.lock().push("will_close");
    }

    fn did_close(&mut self, _window: &mut Window) {
        self.log.lock().push("did_close");
    }

    fn layout(&mut self, _window: &mut Window) {
        self.log.lock().push("layout");
    }

    fn render(&mut self, _window: &mut Window, _canvas: &mut DrawList) {
        self.log.lock().push("render");
    }
}

#[test]
fn test_open_close_hook_order() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let log = Arc::new(Mutex::new(Vec::new()));
    w.set_delegate(Box::new(DelegateRecorder {
        log: Arc::clone(&log),
    }));

    w.open();
    assert!(w.is_open());
    assert_eq!(*log.lock(), vec!["will_open", "layout", "did_open"]);
    assert_eq!(open_window_count(&app), 1);

    // A second open is a no-op.
    w.open();
    assert_eq!(open_window_count(&app), 1);

    log.lock().clear();
    w.close();
    assert!(!w.is_open());
    assert_eq!(*log.lock(), vec!["will_close", "did_close"]);

    // Reopening and reclosing stays idempotent.
    log.lock().clear();
    w.close();
    assert!(log.lock().is_empty());
}

fn open_window_count(app: &TestApplication) -> usize {
    app.events()
        .iter()
        .filter(|e| e.starts_with("open_window"))
        .count()
}

#[test]
fn test_teardown_unregisters_from_application() {
    let app = TestApplication::new();
    {
        let mut w = window_with(&app);
        w.open();
    }
    let events = app.events();
    let close = events.iter().position(|e| e == "close_window");
    let remove = events.iter().position(|e| e == "remove_window");
    assert!(close.is_some());
    assert!(remove.is_some());
    assert!(close < remove);
    assert_eq!(events.first().map(String::as_str), Some("add_window"));
}

#[test]
fn test_render_frame_produces_draw_list_and_fps() {
    let app = TestApplication::new();
    let mut w = window_with(&app);
    let log = Arc::new(Mutex::new(Vec::new()));
    w.set_delegate(Box::new(DelegateRecorder {
        log: Arc::clone(&log),
    }));

    let canvas = w.render_frame();
    assert!(canvas.is_empty());
    assert!(log.lock().contains(&"render"));

    std::thread::sleep(Duration::from_millis(10));
    w.render_frame();
    assert!(w.frames_per_second() > 0.0);
}
