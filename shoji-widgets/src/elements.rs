pub mod button;
pub mod image;
pub mod text;
pub mod view;

pub use self::button::{ButtonElement, ButtonState, ButtonView};
pub use self::image::{ImageElement, ImageSource, ImageView};
pub use self::text::{TextElement, TextView};
pub use self::view::{PanelView, ViewElement};

use shoji_core::Rectangle;

pub(crate) fn rect_to_array(bounds: Rectangle) -> [f32; 4] {
    [
        bounds.x as f32,
        bounds.y as f32,
        bounds.width as f32,
        bounds.height as f32,
    ]
}
