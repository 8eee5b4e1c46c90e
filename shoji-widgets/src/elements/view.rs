use renderer::DrawList;
use shoji_core::{Color, Rectangle, ViewBehavior, ViewId, Window};

use crate::elements::rect_to_array;
use crate::registry::Element;
use crate::value::{ValueComponent, sum_color_components, sum_number_components};

/// The plain `view` element: an optionally colored rectangle container.
pub struct ViewElement {
    background_color: Option<Color>,
    bounds: Rectangle,
    hidden: bool,
}

impl Default for ViewElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewElement {
    pub fn new() -> Self {
        Self {
            background_color: None,
            bounds: Rectangle::default(),
            hidden: false,
        }
    }
}

/// Applies the shared geometry attributes every element understands.
/// Returns true when the attribute was consumed.
pub(crate) fn apply_bounds_attribute(bounds: &mut Rectangle, name: &str, value: f64) -> bool {
    match name {
        "x" => bounds.x = value,
        "y" => bounds.y = value,
        "width" => bounds.width = value,
        "height" => bounds.height = value,
        _ => return false,
    }
    true
}

impl Element for ViewElement {
    fn set_attribute(&mut self, name: &str, value: &str) {
        match name {
            "background-color" => self.background_color = Color::from_hex(value),
            "hidden" => self.hidden = value == "true",
            _ => {
                if let Ok(number) = value.parse::<f64>()
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("view element: ignoring attribute {name}");
            }
        }
    }

    fn set_attribute_components(&mut self, name: &str, components: &[ValueComponent]) {
        match name {
            "background-color" => self.background_color = sum_color_components(components),
            _ => {
                if let Some(number) = sum_number_components(components)
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("view element: ignoring attribute {name}");
            }
        }
    }

    fn instantiate(&self, window: &mut Window) -> ViewId {
        let view = window.add_view(Box::new(PanelView {
            background_color: self.background_color,
        }));
        window.set_view_bounds(view, self.bounds);
        window.set_view_hidden(view, self.hidden);
        view
    }
}

/// Behavior of the `view` element: fills its bounds when a background color
/// is set, otherwise purely structural.
pub struct PanelView {
    pub background_color: Option<Color>,
}

impl ViewBehavior for PanelView {
    fn render(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        canvas: &mut DrawList,
        bounds: Rectangle,
    ) {
        if let Some(color) = self.background_color {
            canvas.fill_rect(rect_to_array(bounds), color.to_array_f32());
        }
    }
}
