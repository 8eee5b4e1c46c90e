use std::sync::Arc;
use std::time::Instant;

use fxhash::{FxHashMap, FxHashSet};
use gpu_utils::Gpu;
use log::{error, warn};
use parking_lot::Mutex;
use renderer::{DrawList, QuadRenderer, RenderTarget};
use text_render::BitmapFont;
use utils::shared_cache::SharedCache;
use utils::task_queue::TaskQueue;

use crate::application::{Application, DialogButton, Menu, WindowId, WindowPosition};
use crate::input::{KeyCode, KeyModifiers};
use crate::texture::{Texture, TextureHandle};
use crate::types::{Point, Rectangle};
use crate::view::{BaseView, ViewBehavior, ViewId, ViewTree};

// MARK: modules

mod dispatch;
mod error;
mod focus;

pub use error::WindowError;

/// Smoothing factor of the exponential moving average over per-frame FPS
/// samples.
const FPS_HYSTERESIS: f64 = 0.5;

/// Window-level hooks. The embedder installs one to participate in the
/// frame loop and the responder chain.
#[allow(unused_variables)]
pub trait WindowDelegate: 'static {
    fn will_open(&mut self, window: &mut Window) {}
    fn did_open(&mut self, window: &mut Window) {}
    fn will_close(&mut self, window: &mut Window) {}
    fn did_close(&mut self, window: &mut Window) {}

    /// Called once per frame before subscribed views update.
    fn update(&mut self, window: &mut Window) {}

    /// Called once per frame before the content view renders.
    fn render(&mut self, window: &mut Window, canvas: &mut DrawList) {}

    /// Called whenever the content layout is recomputed.
    fn layout(&mut self, window: &mut Window) {}

    /// Last stop of the key responder chain before the toolkit's default
    /// handling. Return true to consume the event.
    fn key_down(
        &mut self,
        window: &mut Window,
        key: KeyCode,
        modifiers: KeyModifiers,
        repeat: bool,
    ) -> bool {
        false
    }
}

/// An in-flight texture download paired with the handle it will populate.
struct TextureDownload {
    task: tokio::task::JoinHandle<Option<Arc<Vec<u8>>>>,
    handle: TextureHandle,
}

struct Graphics {
    gpu: Arc<Gpu>,
    renderer: QuadRenderer,
}

// MARK: Window

/// A window: one content view tree, the texture and bitmap-font caches, the
/// pending-download table, the decompression worker, and the per-frame
/// update/render orchestration over all of them.
pub struct Window {
    id: WindowId,
    application: Arc<dyn Application>,
    runtime: tokio::runtime::Runtime,

    // --- window state ---
    title: String,
    position: WindowPosition,
    width: u32,
    height: u32,
    menu: Menu,
    is_open: bool,

    // --- render scaling ---
    render_scale: f64,
    device_render_scale: f64,
    render_width: u32,
    render_height: u32,

    // --- view tree ---
    views: ViewTree,
    content_view: ViewId,
    focus: Option<ViewId>,
    initial_focus: Option<ViewId>,

    // --- per-frame updates ---
    updating_views: FxHashSet<ViewId>,
    views_to_subscribe: FxHashSet<ViewId>,
    views_to_unsubscribe: FxHashSet<ViewId>,

    // --- dragging ---
    dragged_views: FxHashSet<ViewId>,
    last_mouse_down: Point,

    // --- caches & async texture pipeline ---
    texture_cache: Arc<SharedCache<String, Texture>>,
    bitmap_font_cache: SharedCache<String, BitmapFont<TextureHandle>>,
    texture_downloads: FxHashMap<String, TextureDownload>,
    decompression_queue: TaskQueue,
    textures_to_finalize: Arc<Mutex<Vec<String>>>,

    // --- rendering ---
    graphics: Option<Graphics>,

    // --- frame timing ---
    last_update_time: Instant,
    last_render_time: Instant,
    frames_per_second: f64,

    delegate: Option<Box<dyn WindowDelegate>>,
}

// MARK: construction

impl Window {
    /// Creates a window attached to the application, with an empty content
    /// view. The window is not opened yet.
    pub fn new(application: Arc<dyn Application>) -> Result<Self, WindowError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let device_render_scale = application.render_scale();
        let mut views = ViewTree::new();
        let content_view = views.add_view(Box::new(BaseView));

        let window = Self {
            id: WindowId::next(),
            application,
            runtime,
            title: String::from("shoji"),
            position: WindowPosition::default(),
            width: 800,
            height: 600,
            menu: Menu::default(),
            is_open: false,
            render_scale: 1.0,
            device_render_scale,
            render_width: 800,
            render_height: 600,
            views,
            content_view,
            focus: None,
            initial_focus: None,
            updating_views: FxHashSet::default(),
            views_to_subscribe: FxHashSet::default(),
            views_to_unsubscribe: FxHashSet::default(),
            dragged_views: FxHashSet::default(),
            last_mouse_down: Point::default(),
            texture_cache: Arc::new(SharedCache::new()),
            bitmap_font_cache: SharedCache::new(),
            texture_downloads: FxHashMap::default(),
            decompression_queue: TaskQueue::new("shoji-decompress"),
            textures_to_finalize: Arc::new(Mutex::new(Vec::new())),
            graphics: None,
            last_update_time: Instant::now(),
            last_render_time: Instant::now(),
            frames_per_second: 0.0,
            delegate: None,
        };
        window.application.add_window(window.id);
        Ok(window)
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn application(&self) -> &Arc<dyn Application> {
        &self.application
    }

    pub fn set_delegate(&mut self, delegate: Box<dyn WindowDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Attaches a GPU; frames render through it from now on.
    pub fn attach_graphics(&mut self, gpu: Arc<Gpu>) {
        let renderer = QuadRenderer::new(&gpu, gpu.preferred_format());
        self.graphics = Some(Graphics { gpu, renderer });
    }

    pub fn detach_graphics(&mut self) {
        self.graphics = None;
    }

    pub fn gpu(&self) -> Option<&Arc<Gpu>> {
        self.graphics.as_ref().map(|graphics| &graphics.gpu)
    }
}

// MARK: lifecycle

impl Window {
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        if self.is_open {
            return;
        }
        self.with_delegate(|delegate, window| delegate.will_open(window));
        self.dispatch_future_visibility_change(true);
        self.application
            .open_window(self.id, &self.title, self.position, self.width, self.height);
        self.is_open = true;
        self.dispatch_window_change(true);
        self.update_content_layout();
        self.dispatch_visibility_change(true);
        self.with_delegate(|delegate, window| delegate.did_open(window));
    }

    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.with_delegate(|delegate, window| delegate.will_close(window));
        self.dispatch_future_visibility_change(false);
        self.application.close_window(self.id);
        self.is_open = false;
        self.dispatch_visibility_change(false);
        self.dispatch_window_change(false);
        self.with_delegate(|delegate, window| delegate.did_close(window));
    }

    pub fn position(&self) -> WindowPosition {
        self.position
    }

    pub fn set_position(&mut self, position: WindowPosition) {
        self.position = position;
        self.application.set_window_position(self.id, position);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.application.set_window_size(self.id, width, height);
        self.update_content_layout();
    }

    /// The host reports an externally-driven resize here.
    pub fn did_resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.update_content_layout();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.application.set_window_title(self.id, &self.title);
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn set_menu(&mut self, menu: Menu) {
        self.application.set_window_menu(self.id, &menu);
        self.menu = menu;
    }

    pub fn open_dialog(
        &self,
        title: &str,
        message: &str,
        buttons: &[DialogButton],
        action: Box<dyn FnOnce(usize) + Send>,
    ) {
        self.application
            .open_dialog(self.id, title, message, buttons, action);
    }

    pub fn render_scale(&self) -> f64 {
        self.render_scale
    }

    pub fn set_render_scale(&mut self, scale: f64) {
        self.render_scale = scale;
        self.update_content_layout();
    }

    pub fn device_render_scale(&self) -> f64 {
        self.device_render_scale
    }

    pub fn render_size(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }

    fn update_content_layout(&mut self) {
        let (render_width, render_height) = self.application.window_render_size(self.id);
        self.render_width = render_width;
        self.render_height = render_height;

        let scale = (1.0 / self.render_scale) * (1.0 / self.device_render_scale);
        let bounds = Rectangle::new(
            0.0,
            0.0,
            self.width as f64 * scale,
            self.height as f64 * scale,
        );
        self.set_view_bounds(self.content_view, bounds);
        self.with_delegate(|delegate, window| delegate.layout(window));
    }
}

// MARK: view tree access

impl Window {
    pub fn content_view(&self) -> ViewId {
        self.content_view
    }

    pub fn views(&self) -> &ViewTree {
        &self.views
    }

    /// Creates a detached view; attach it with `add_subview`.
    pub fn add_view(&mut self, behavior: Box<dyn ViewBehavior>) -> ViewId {
        self.views.add_view(behavior)
    }

    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) {
        self.views.add_subview(parent, child);
        // Views joining an already-open window learn about it immediately.
        if self.is_open {
            for view in self.views.descendants(child) {
                self.with_behavior(view, |behavior, window| {
                    behavior.window_changed(view, window, true);
                });
            }
        }
    }

    /// Detaches `child` from `parent`, keeping its subtree alive. Focus
    /// held inside the detached subtree is released first.
    pub fn remove_subview(&mut self, parent: ViewId, child: ViewId) {
        if let Some(focus) = self.focus
            && (focus == child || self.views.is_descendant_of(focus, child))
        {
            self.set_focus(None);
        }
        self.views.remove_subview(parent, child);
        if self.is_open {
            for view in self.views.descendants(child) {
                self.with_behavior(view, |behavior, window| {
                    behavior.window_changed(view, window, false);
                });
            }
        }
    }

    /// Removes a view and its whole subtree, releasing focus, update
    /// subscriptions and drag state held by any of them.
    pub fn remove_view(&mut self, view: ViewId) {
        assert!(self.views.contains(view), "cannot remove an unknown view");

        // Run the full focus-change protocol while the tree is still intact.
        if let Some(focus) = self.focus
            && (focus == view || self.views.is_descendant_of(focus, view))
        {
            self.set_focus(None);
        }

        for id in self.views.descendants(view) {
            self.updating_views.remove(&id);
            self.views_to_subscribe.remove(&id);
            self.views_to_unsubscribe.remove(&id);
            self.dragged_views.remove(&id);
            if self.initial_focus == Some(id) {
                self.initial_focus = None;
            }
        }
        self.views.remove_view(view);
    }

    /// Sets the view's bounds and re-runs its layout hook.
    pub fn set_view_bounds(&mut self, view: ViewId, bounds: Rectangle) {
        self.views.set_bounds(view, bounds);
        self.with_behavior(view, |behavior, window| behavior.layout(view, window));
    }

    pub fn set_view_hidden(&mut self, view: ViewId, hidden: bool) {
        self.views.set_hidden(view, hidden);
    }

    /// Chains Tab traversal from `view` to `next`.
    pub fn set_next_focus(&mut self, view: ViewId, next: ViewId) {
        self.views.set_next_focus(view, next);
    }

    /// Typed access to a view's behavior.
    pub fn behavior_ref<T: ViewBehavior>(&self, view: ViewId) -> Option<&T> {
        self.views.behavior_ref(view)
    }

    /// Mutable typed access to a view's behavior.
    pub fn behavior_mut<T: ViewBehavior>(&mut self, view: ViewId) -> Option<&mut T> {
        self.views.behavior_mut(view)
    }

    /// Runs `f` with the view's behavior checked out of the tree, so the
    /// hook can receive the window mutably. Returns `None` when the view is
    /// gone or its behavior is already checked out (reentrant dispatch).
    pub(crate) fn with_behavior<R>(
        &mut self,
        view: ViewId,
        f: impl FnOnce(&mut dyn ViewBehavior, &mut Window) -> R,
    ) -> Option<R> {
        let mut behavior = self.views.take_behavior(view)?;
        let result = f(behavior.as_mut(), self);
        self.views.put_behavior(view, behavior);
        Some(result)
    }

    fn with_delegate<R>(
        &mut self,
        f: impl FnOnce(&mut dyn WindowDelegate, &mut Window) -> R,
    ) -> Option<R> {
        let mut delegate = self.delegate.take()?;
        let result = f(delegate.as_mut(), self);
        // A hook may have installed a replacement; the old one loses then.
        if self.delegate.is_none() {
            self.delegate = Some(delegate);
        }
        Some(result)
    }

    fn dispatch_window_change(&mut self, attached: bool) {
        for view in self.views.descendants(self.content_view) {
            self.with_behavior(view, |behavior, window| {
                behavior.window_changed(view, window, attached);
            });
        }
    }

    fn dispatch_visibility_change(&mut self, visible: bool) {
        for view in self.views.descendants(self.content_view) {
            self.with_behavior(view, |behavior, window| {
                behavior.visibility_changed(view, window, visible);
            });
        }
    }

    fn dispatch_future_visibility_change(&mut self, visible: bool) {
        for view in self.views.descendants(self.content_view) {
            self.with_behavior(view, |behavior, window| {
                behavior.future_visibility_change(view, window, visible);
            });
        }
    }
}

// MARK: update subscriptions & dragging

impl Window {
    /// Subscribes a view to per-frame updates, starting next frame.
    pub fn subscribe_to_updates(&mut self, view: ViewId) {
        assert!(
            self.views.contains(view),
            "cannot subscribe a removed view to updates"
        );
        self.views_to_subscribe.insert(view);
        self.views_to_unsubscribe.remove(&view);
    }

    pub fn unsubscribe_from_updates(&mut self, view: ViewId) {
        self.views_to_subscribe.remove(&view);
        self.views_to_unsubscribe.insert(view);
    }

    pub fn begin_dragging(&mut self, view: ViewId) {
        assert!(self.views.contains(view), "cannot drag an unknown view");
        self.dragged_views.insert(view);
    }

    pub fn end_dragging(&mut self, view: ViewId) {
        self.dragged_views.remove(&view);
    }
}

// MARK: texture & font loading

impl Window {
    /// Loads a texture from a named application resource, reusing the cache
    /// entry when one is live. Returns `None` when the resource is missing.
    pub fn load_texture_resource(&mut self, name: &str) -> Option<TextureHandle> {
        let key = format!("resource: {name}");
        if let Some(hit) = self.texture_cache.get(&key) {
            return Some(TextureHandle::new(hit));
        }

        let Some(resource) = self.application.load_resource(name) else {
            error!("could not load texture resource {name}");
            return None;
        };

        let texture = self
            .texture_cache
            .add_arc(key.clone(), Arc::new(Texture::with_data(key.clone(), resource)));
        self.decompress_texture(key);
        Some(TextureHandle::new(texture))
    }

    /// Loads a texture from an in-memory compressed buffer. The cache key
    /// derives from the buffer's address and length, so the same buffer
    /// never decodes twice.
    pub fn load_texture_from_memory(&mut self, data: Arc<Vec<u8>>) -> TextureHandle {
        let key = format!("memory: {:p}:{}", data.as_ptr(), data.len());
        if let Some(hit) = self.texture_cache.get(&key) {
            return TextureHandle::new(hit);
        }

        let texture = self
            .texture_cache
            .add_arc(key.clone(), Arc::new(Texture::with_data(key.clone(), data)));
        self.decompress_texture(key);
        TextureHandle::new(texture)
    }

    /// Returns a handle immediately; the texture stays unloaded until the
    /// download resolves and a later `ensure_textures` feeds it through the
    /// pipeline. Repeat requests for an in-flight URL share one texture.
    pub fn load_texture_from_url(&mut self, url: &str) -> TextureHandle {
        if let Some(hit) = self.texture_cache.get(&url.to_owned()) {
            return TextureHandle::new(hit);
        }

        if let Some(download) = self.texture_downloads.get(url) {
            return download.handle.new_handle();
        }

        let texture = self
            .texture_cache
            .add_arc(url.to_owned(), Arc::new(Texture::pending(url)));
        let handle = TextureHandle::new(texture);
        let task = self.runtime.spawn(self.application.download(url));
        self.texture_downloads.insert(
            url.to_owned(),
            TextureDownload {
                task,
                handle: handle.new_handle(),
            },
        );
        handle
    }

    /// Loads a bitmap font from a texture resource plus a metadata
    /// resource, cached under both names.
    pub fn load_bitmap_font_resource(
        &mut self,
        texture_name: &str,
        metadata_name: &str,
    ) -> Option<Arc<BitmapFont<TextureHandle>>> {
        let key = format!("resource: {texture_name}|{metadata_name}");
        if let Some(hit) = self.bitmap_font_cache.get(&key) {
            return Some(hit);
        }

        let texture = self.load_texture_resource(texture_name)?;
        let Some(metadata) = self.application.load_resource(metadata_name) else {
            error!("could not load font metadata resource {metadata_name}");
            return None;
        };
        let metadata = String::from_utf8_lossy(&metadata);
        let texture_width = texture.texture().width();
        let font = BitmapFont::new(texture, texture_width, &metadata);
        Some(self.bitmap_font_cache.add(key, font))
    }

    pub fn is_downloading(&self, url: &str) -> bool {
        self.texture_downloads.contains_key(url)
    }

    pub fn pending_download_count(&self) -> usize {
        self.texture_downloads.len()
    }

    /// Per-frame texture maintenance, never blocking: polls pending
    /// downloads, feeds completed ones into decompression, and finalizes
    /// textures the worker finished since last frame.
    pub fn ensure_textures(&mut self) {
        let finished: Vec<String> = self
            .texture_downloads
            .iter()
            .filter(|(_, download)| download.task.is_finished())
            .map(|(url, _)| url.clone())
            .collect();

        for url in finished {
            let Some(download) = self.texture_downloads.remove(&url) else {
                continue;
            };
            // The task already finished, so this join returns immediately.
            match self.runtime.block_on(download.task) {
                Ok(Some(data)) => {
                    download.handle.texture().set_data(data);
                    self.decompress_texture(url);
                }
                Ok(None) => {
                    warn!("download failed for texture {url}");
                }
                Err(err) => {
                    warn!("download task for texture {url} did not complete: {err}");
                }
            }
        }

        let ready = std::mem::take(&mut *self.textures_to_finalize.lock());
        for key in ready {
            if let Some(texture) = self.texture_cache.get(&key) {
                texture.finalize(self.graphics.as_ref().map(|graphics| graphics.gpu.as_ref()));
            }
        }
    }

    fn decompress_texture(&self, key: String) {
        let cache = Arc::clone(&self.texture_cache);
        let ready = Arc::clone(&self.textures_to_finalize);
        self.decompression_queue.push(move || {
            if let Some(texture) = cache.get(&key) {
                texture.decompress();
                ready.lock().push(key);
            }
        });
    }
}

// MARK: frame loop

impl Window {
    /// Advances the per-frame update cycle: the delegate's update hook runs
    /// first, then pending subscription changes commit, then every
    /// still-subscribed view updates. A view subscribed and unsubscribed
    /// within the same frame is not notified.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.with_delegate(|delegate, window| delegate.update(window));
        let elapsed = now - self.last_update_time;

        for view in std::mem::take(&mut self.views_to_subscribe) {
            self.updating_views.insert(view);
        }
        for view in std::mem::take(&mut self.views_to_unsubscribe) {
            self.updating_views.remove(&view);
        }

        let updating: Vec<ViewId> = self.updating_views.iter().copied().collect();
        for view in updating {
            // Skip views an earlier update hook unsubscribed this frame.
            if self.views_to_unsubscribe.contains(&view) {
                continue;
            }
            self.with_behavior(view, |behavior, window| {
                behavior.update(view, window, elapsed);
            });
        }
        self.last_update_time = now;
    }

    /// Renders one frame and returns the draw list it produced. When a GPU
    /// is attached the list is also submitted to an offscreen target sized
    /// to the device render resolution.
    pub fn render_frame(&mut self) -> DrawList {
        let canvas = self.build_frame();
        if let Some(graphics) = self.graphics.take() {
            let target =
                RenderTarget::offscreen(&graphics.gpu, self.render_width, self.render_height);
            self.submit(&graphics, &target, &canvas);
            self.graphics = Some(graphics);
        }
        canvas
    }

    /// Like `render_frame`, but draws into a target the host supplies
    /// (typically the surface texture).
    pub fn render_frame_into(&mut self, target: &RenderTarget) -> DrawList {
        let canvas = self.build_frame();
        if let Some(graphics) = self.graphics.take() {
            self.submit(&graphics, target, &canvas);
            self.graphics = Some(graphics);
        }
        canvas
    }

    fn submit(&self, graphics: &Graphics, target: &RenderTarget, canvas: &DrawList) {
        if let Err(err) =
            graphics
                .renderer
                .render(&graphics.gpu, target, wgpu::Color::TRANSPARENT, canvas)
        {
            error!("frame render failed: {err}");
        }
    }

    fn build_frame(&mut self) -> DrawList {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_render_time).as_secs_f64();
        if elapsed > 0.0 {
            self.frames_per_second =
                self.frames_per_second * FPS_HYSTERESIS + (1.0 / elapsed) * (1.0 - FPS_HYSTERESIS);
        }
        self.last_render_time = now;

        self.ensure_textures();

        let mut canvas = DrawList::new();
        self.with_delegate(|delegate, window| delegate.render(window, &mut canvas));

        let scale = self.render_scale * self.device_render_scale;
        self.render_view(self.content_view, Point::default(), scale, &mut canvas);
        canvas
    }

    fn render_view(&mut self, view: ViewId, origin: Point, scale: f64, canvas: &mut DrawList) {
        if self.views.is_hidden(view) {
            return;
        }
        let bounds = self.views.bounds(view);
        let origin = origin + bounds.origin();
        let target_bounds =
            Rectangle::new(origin.x, origin.y, bounds.width, bounds.height).scaled(scale);
        self.with_behavior(view, |behavior, window| {
            behavior.render(view, window, canvas, target_bounds);
        });

        let subviews: Vec<ViewId> = self.views.subviews(view).to_vec();
        for child in subviews {
            self.render_view(child, origin, scale, canvas);
        }
    }

    /// Exponentially smoothed frames-per-second estimate.
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // In-flight decompression tasks resolve cache keys back into the
        // cache and, indirectly, the view tree; stop the worker before
        // anything it can reach goes away.
        self.decompression_queue.cancel_and_join();

        // The content view is destroyed before the window's other members.
        self.views.clear();

        self.application.close_window(self.id);
        self.application.remove_window(self.id);
    }
}
