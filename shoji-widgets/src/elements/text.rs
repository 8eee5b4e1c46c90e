use std::sync::Arc;

use renderer::DrawList;
use shoji_core::{Color, Point, Rectangle, TextureHandle, ViewBehavior, ViewId, Window};
use text_render::{BitmapFont, GlyphId};

use crate::elements::view::apply_bounds_attribute;
use crate::registry::Element;
use crate::value::{ValueComponent, sum_color_components, sum_number_components};

/// The `text` element: a single line of bitmap-font text. The `font`
/// attribute names a resource pair `<name>.png` / `<name>.fnt`.
pub struct TextElement {
    text: String,
    font: Option<String>,
    text_size: Option<f64>,
    text_color: Option<Color>,
    bounds: Rectangle,
    hidden: bool,
}

impl Default for TextElement {
    fn default() -> Self {
        Self::new()
    }
}

impl TextElement {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            font: None,
            text_size: None,
            text_color: None,
            bounds: Rectangle::default(),
            hidden: false,
        }
    }
}

impl Element for TextElement {
    fn set_attribute(&mut self, name: &str, value: &str) {
        match name {
            "font" => self.font = Some(value.to_owned()),
            "text" => self.text = value.to_owned(),
            "text-size" => self.text_size = value.parse().ok(),
            "text-color" => self.text_color = Color::from_hex(value),
            "hidden" => self.hidden = value == "true",
            _ => {
                if let Ok(number) = value.parse::<f64>()
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("text element: ignoring attribute {name}");
            }
        }
    }

    fn set_attribute_components(&mut self, name: &str, components: &[ValueComponent]) {
        match name {
            "text-size" => self.text_size = sum_number_components(components),
            "text-color" => self.text_color = sum_color_components(components),
            _ => {
                if let Some(number) = sum_number_components(components)
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("text element: ignoring attribute {name}");
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_owned();
    }

    fn instantiate(&self, window: &mut Window) -> ViewId {
        let mut text_view = TextView::new(self.text.clone());
        text_view.font_name = self.font.clone();
        text_view.text_size = self.text_size;
        if let Some(color) = self.text_color {
            text_view.color = color;
        }
        let view = window.add_view(Box::new(text_view));
        window.set_view_bounds(view, self.bounds);
        window.set_view_hidden(view, self.hidden);
        view
    }
}

/// Behavior of the `text` element. The bitmap font loads when the view
/// joins a window; text renders left-aligned at the view's origin.
pub struct TextView {
    pub text: String,
    pub font_name: Option<String>,
    /// Logical text size; the font's native size when unset.
    pub text_size: Option<f64>,
    pub color: Color,
    font: Option<Arc<BitmapFont<TextureHandle>>>,
}

impl TextView {
    pub fn new(text: String) -> Self {
        Self {
            text,
            font_name: None,
            text_size: None,
            color: Color::BLACK,
            font: None,
        }
    }

    pub fn font(&self) -> Option<&Arc<BitmapFont<TextureHandle>>> {
        self.font.as_ref()
    }

    fn effective_size(&self) -> Option<f64> {
        let font = self.font.as_ref()?;
        Some(self.text_size.unwrap_or_else(|| font.size()))
    }

    /// Width of the current text in logical units, when the font is ready.
    pub fn text_width(&self) -> Option<f64> {
        let font = self.font.as_ref()?;
        if font.size() <= 0.0 {
            return None;
        }
        let glyphs: Vec<GlyphId> = self.text.chars().map(|c| c as GlyphId).collect();
        Some(font.width(&glyphs) * self.effective_size()? / font.size())
    }
}

impl ViewBehavior for TextView {
    fn window_changed(&mut self, _id: ViewId, window: &mut Window, attached: bool) {
        if !attached || self.font.is_some() {
            return;
        }
        if let Some(name) = &self.font_name {
            self.font = window
                .load_bitmap_font_resource(&format!("{name}.png"), &format!("{name}.fnt"));
        }
    }

    fn render(
        &mut self,
        _id: ViewId,
        window: &mut Window,
        canvas: &mut DrawList,
        bounds: Rectangle,
    ) {
        let Some(font) = &self.font else {
            return;
        };
        let Some(size) = self.effective_size() else {
            return;
        };
        let px_scale = window.render_scale() * window.device_render_scale();
        draw_glyph_run(
            canvas,
            font,
            &self.text,
            bounds.origin(),
            size,
            self.color,
            px_scale,
        );
    }
}

/// Pushes one quad per glyph of `text`. `origin` is the top-left of the
/// line box in render-target pixels; `size` is the logical text size.
pub(crate) fn draw_glyph_run(
    canvas: &mut DrawList,
    font: &BitmapFont<TextureHandle>,
    text: &str,
    origin: Point,
    size: f64,
    color: Color,
    px_scale: f64,
) {
    let texture = font.texture();
    let Some(gpu_texture) = texture.gpu_texture() else {
        return;
    };
    let Some((texture_width, texture_height)) = texture.dimensions() else {
        return;
    };
    let (texture_width, texture_height) = (texture_width as f64, texture_height as f64);
    if font.size() <= 0.0 {
        return;
    }
    let scale = size / font.size() * px_scale;

    let mut pen_x = origin.x;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = ch as GlyphId;
        let Some(glyph) = font.glyph(id) else {
            previous = Some(id);
            continue;
        };
        if let Some(previous) = previous {
            pen_x += font.kerning(previous, id) * scale;
        }

        let x = pen_x + glyph.x_offset * scale;
        // y_offset measures up from the line bottom; flip back to top-down.
        let y = origin.y + (font.line_height() - glyph.height - glyph.y_offset) * scale;
        let rect = [
            x as f32,
            y as f32,
            (glyph.width * scale) as f32,
            (glyph.height * scale) as f32,
        ];
        let uv = [
            (glyph.texture_x / texture_width) as f32,
            ((texture_height - glyph.texture_y - glyph.texture_height) / texture_height) as f32,
            (glyph.texture_width / texture_width) as f32,
            (glyph.texture_height / texture_height) as f32,
        ];
        canvas.textured_sub_rect(rect, uv, gpu_texture.clone(), color.to_array_f32());

        pen_x += glyph.x_advance * scale;
        previous = Some(id);
    }
}
