use std::sync::Arc;

use futures::future::BoxFuture;
use utils::unique_id::UniqueId;

/// Identifies a window to the host application for the lifetime of the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(UniqueId);

impl WindowId {
    pub(crate) fn next() -> Self {
        WindowId(UniqueId::next())
    }

    pub fn raw(self) -> u64 {
        self.0.raw()
    }
}

/// Requested placement for a newly opened window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPosition {
    /// Let the platform decide.
    #[default]
    Undefined,
    /// Centered on the active display.
    Centered,
    Absolute {
        x: i32,
        y: i32,
    },
}

/// A host-rendered menu attached to a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub command: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub label: String,
}

pub type DownloadFuture = BoxFuture<'static, Option<Arc<Vec<u8>>>>;

/// The host the toolkit runs inside. It owns native window creation,
/// resource access and networking; windows register themselves with it on
/// creation and unregister on teardown.
///
/// Every method is called from the UI thread. `download` returns a future
/// the window polls without blocking, so implementations must not require
/// the caller to wait.
pub trait Application: Send + Sync {
    fn add_window(&self, window: WindowId);
    fn remove_window(&self, window: WindowId);

    fn open_window(
        &self,
        window: WindowId,
        title: &str,
        position: WindowPosition,
        width: u32,
        height: u32,
    );
    fn close_window(&self, window: WindowId);

    fn set_window_position(&self, window: WindowId, position: WindowPosition);
    fn set_window_size(&self, window: WindowId, width: u32, height: u32);
    fn set_window_title(&self, window: WindowId, title: &str);
    fn set_window_menu(&self, window: WindowId, menu: &Menu);

    /// Bytes of a named static resource, or `None` when it does not exist.
    fn load_resource(&self, name: &str) -> Option<Arc<Vec<u8>>>;

    /// Starts fetching a URL. Resolves to `None` on failure.
    fn download(&self, url: &str) -> DownloadFuture;

    fn open_dialog(
        &self,
        window: WindowId,
        title: &str,
        message: &str,
        buttons: &[DialogButton],
        action: Box<dyn FnOnce(usize) + Send>,
    );

    /// The actual render resolution of the window's backing surface, which
    /// may differ from the logical size on scaled displays.
    fn window_render_size(&self, window: WindowId) -> (u32, u32);

    /// Device pixel ratio applied on top of the window's own render scale.
    fn render_scale(&self) -> f64;
}
