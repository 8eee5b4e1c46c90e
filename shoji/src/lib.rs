//! Shoji is a desktop UI toolkit: a retained view hierarchy with spatial
//! focus navigation, a window/event dispatch core, an asynchronous texture
//! pipeline, bitmap-font text, and a markup element layer for building view
//! trees from attributes.
//!
//! The host supplies an [`Application`] implementation (native windows,
//! resources, networking); the toolkit drives everything inside the window.
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use shoji::*;
//! # fn host_application() -> Arc<dyn Application> { unimplemented!() }
//! let application = host_application();
//! let mut window = Window::new(application).expect("runtime");
//!
//! let registry = ElementRegistry::new();
//! let mut button = registry.create("button").expect("standard element");
//! button.set_attribute("command", "save-document");
//! button.set_attribute("width", "120");
//! button.set_attribute("height", "32");
//! let button = button.instantiate(&mut window);
//! let content = window.content_view();
//! window.add_subview(content, button);
//!
//! window.open();
//! window.set_initial_focus(Some(button));
//! loop {
//!     window.update();
//!     window.render_frame();
//! #   break;
//! }
//! ```

pub use shoji_core::{
    Application, BaseView, Color, DialogButton, Direction, FileResourceManager, KeyCode,
    KeyModifiers, Menu, MenuItem, MouseButton, Point, Rectangle, ResourceManager, TextureHandle,
    ViewBehavior, ViewId, ViewTree, Window, WindowDelegate, WindowError, WindowId, WindowPosition,
};

pub use shoji_widgets::{
    Command, Element, ElementRegistry, ValueComponent, parse_command, sum_color_components,
    sum_number_components,
};

pub use renderer::{BlendMode, DrawList, Quad, RenderTarget};

pub use gpu_utils::{Gpu, GpuDescriptor};

pub use text_render::{BitmapFont, Glyph, GlyphId};
