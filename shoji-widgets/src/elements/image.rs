use renderer::DrawList;
use shoji_core::{Color, Rectangle, TextureHandle, ViewBehavior, ViewId, Window};

use crate::elements::rect_to_array;
use crate::elements::view::apply_bounds_attribute;
use crate::registry::Element;
use crate::value::{ValueComponent, sum_color_components, sum_number_components};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Resource(String),
    Url(String),
}

/// The `image` element: a texture loaded from a named resource or a URL,
/// tinted by an optional color.
pub struct ImageElement {
    source: Option<ImageSource>,
    tint: Color,
    bounds: Rectangle,
    hidden: bool,
}

impl Default for ImageElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageElement {
    pub fn new() -> Self {
        Self {
            source: None,
            tint: Color::WHITE,
            bounds: Rectangle::default(),
            hidden: false,
        }
    }
}

impl Element for ImageElement {
    fn set_attribute(&mut self, name: &str, value: &str) {
        match name {
            "texture" => self.source = Some(ImageSource::Resource(value.to_owned())),
            "url" => self.source = Some(ImageSource::Url(value.to_owned())),
            "color" => {
                if let Some(color) = Color::from_hex(value) {
                    self.tint = color;
                }
            }
            "hidden" => self.hidden = value == "true",
            _ => {
                if let Ok(number) = value.parse::<f64>()
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("image element: ignoring attribute {name}");
            }
        }
    }

    fn set_attribute_components(&mut self, name: &str, components: &[ValueComponent]) {
        match name {
            "color" => {
                if let Some(color) = sum_color_components(components) {
                    self.tint = color;
                }
            }
            _ => {
                if let Some(number) = sum_number_components(components)
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("image element: ignoring attribute {name}");
            }
        }
    }

    fn instantiate(&self, window: &mut Window) -> ViewId {
        let view = window.add_view(Box::new(ImageView::new(self.source.clone(), self.tint)));
        window.set_view_bounds(view, self.bounds);
        window.set_view_hidden(view, self.hidden);
        view
    }
}

/// Behavior of the `image` element. The texture loads lazily when the view
/// joins a window; until the async pipeline finishes the view renders
/// nothing.
pub struct ImageView {
    source: Option<ImageSource>,
    tint: Color,
    texture: Option<TextureHandle>,
}

impl ImageView {
    pub fn new(source: Option<ImageSource>, tint: Color) -> Self {
        Self {
            source,
            tint,
            texture: None,
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    pub fn set_tint(&mut self, tint: Color) {
        self.tint = tint;
    }
}

impl ViewBehavior for ImageView {
    fn window_changed(&mut self, _id: ViewId, window: &mut Window, attached: bool) {
        if !attached || self.texture.is_some() {
            return;
        }
        self.texture = match &self.source {
            Some(ImageSource::Resource(name)) => window.load_texture_resource(name),
            Some(ImageSource::Url(url)) => Some(window.load_texture_from_url(url)),
            None => None,
        };
    }

    fn render(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        canvas: &mut DrawList,
        bounds: Rectangle,
    ) {
        if let Some(texture) = &self.texture
            && let Some(gpu_texture) = texture.gpu_texture()
        {
            canvas.textured_rect(rect_to_array(bounds), gpu_texture, self.tint.to_array_f32());
        }
    }
}
