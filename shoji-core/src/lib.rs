// host interface
pub mod application;
pub mod resource;

// core modules
pub mod input;
pub mod texture;
pub mod view;
pub mod window;

// types
pub mod types;

pub use application::{Application, DialogButton, Menu, MenuItem, WindowId, WindowPosition};
pub use input::{KeyCode, KeyModifiers, MouseButton};
pub use resource::{FileResourceManager, ResourceManager};
pub use texture::TextureHandle;
pub use types::{Color, Direction, Point, Rectangle};
pub use view::{BaseView, ViewBehavior, ViewId, ViewTree};
pub use window::{Window, WindowDelegate, WindowError};
