// Shared by several test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use shoji_core::application::{
    Application, DialogButton, DownloadFuture, Menu, WindowId, WindowPosition,
};

type PendingDownloads = Mutex<HashMap<String, tokio::sync::oneshot::Sender<Option<Arc<Vec<u8>>>>>>;

/// Test double for the host application: in-memory resources, downloads the
/// test resolves by hand, and a log of every host call.
pub struct TestApplication {
    resources: Mutex<HashMap<String, Arc<Vec<u8>>>>,
    pending_downloads: PendingDownloads,
    events: Mutex<Vec<String>>,
    render_size: Mutex<(u32, u32)>,
    render_scale: f64,
}

impl TestApplication {
    pub fn new() -> Arc<Self> {
        Self::with_render_scale(1.0)
    }

    pub fn with_render_scale(render_scale: f64) -> Arc<Self> {
        Arc::new(Self {
            resources: Mutex::new(HashMap::new()),
            pending_downloads: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            render_size: Mutex::new((800, 600)),
            render_scale,
        })
    }

    pub fn insert_resource(&self, name: &str, bytes: Vec<u8>) {
        self.resources
            .lock()
            .insert(name.to_owned(), Arc::new(bytes));
    }

    pub fn set_render_size(&self, width: u32, height: u32) {
        *self.render_size.lock() = (width, height);
    }

    /// Completes a download the window started. Returns false when no
    /// download for `url` is pending.
    pub fn resolve_download(&self, url: &str, data: Option<Arc<Vec<u8>>>) -> bool {
        match self.pending_downloads.lock().remove(url) {
            Some(sender) => sender.send(data).is_ok(),
            None => false,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }
}

impl Application for TestApplication {
    fn add_window(&self, _window: WindowId) {
        self.record("add_window");
    }

    fn remove_window(&self, _window: WindowId) {
        self.record("remove_window");
    }

    fn open_window(
        &self,
        _window: WindowId,
        title: &str,
        _position: WindowPosition,
        width: u32,
        height: u32,
    ) {
        self.record(format!("open_window {title} {width}x{height}"));
    }

    fn close_window(&self, _window: WindowId) {
        self.record("close_window");
    }

    fn set_window_position(&self, _window: WindowId, _position: WindowPosition) {
        self.record("set_window_position");
    }

    fn set_window_size(&self, _window: WindowId, width: u32, height: u32) {
        self.record(format!("set_window_size {width}x{height}"));
    }

    fn set_window_title(&self, _window: WindowId, title: &str) {
        self.record(format!("set_window_title {title}"));
    }

    fn set_window_menu(&self, _window: WindowId, _menu: &Menu) {
        self.record("set_window_menu");
    }

    fn load_resource(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        self.record(format!("load_resource {name}"));
        self.resources.lock().get(name).cloned()
    }

    fn download(&self, url: &str) -> DownloadFuture {
        self.record(format!("download {url}"));
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.pending_downloads.lock().insert(url.to_owned(), sender);
        Box::pin(async move { receiver.await.ok().flatten() })
    }

    fn open_dialog(
        &self,
        _window: WindowId,
        title: &str,
        _message: &str,
        _buttons: &[DialogButton],
        _action: Box<dyn FnOnce(usize) + Send>,
    ) {
        self.record(format!("open_dialog {title}"));
    }

    fn window_render_size(&self, _window: WindowId) -> (u32, u32) {
        *self.render_size.lock()
    }

    fn render_scale(&self) -> f64 {
        self.render_scale
    }
}

/// Polls `condition` until it holds or the timeout passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A small valid PNG for texture fixtures.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("png encoding should succeed");
    bytes
}
