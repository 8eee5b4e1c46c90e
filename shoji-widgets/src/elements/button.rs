use std::sync::Arc;

use renderer::DrawList;
use shoji_core::input::{KeyCode, KeyModifiers, MouseButton};
use shoji_core::{Color, Rectangle, TextureHandle, ViewBehavior, ViewId, Window};
use text_render::BitmapFont;

use crate::elements::rect_to_array;
use crate::elements::text::draw_glyph_run;
use crate::elements::view::apply_bounds_attribute;
use crate::registry::Element;
use crate::value::{
    Command, ValueComponent, parse_command, sum_color_components, sum_number_components,
};

/// The `button` element: a focusable view with an optional icon texture and
/// bitmap-font label, firing a command when activated.
pub struct ButtonElement {
    command: Command,
    icon: Option<String>,
    icon_color: Color,
    label: String,
    label_font: Option<String>,
    label_text_size: Option<f64>,
    label_text_color: Option<Color>,
    bounds: Rectangle,
    hidden: bool,
}

impl Default for ButtonElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonElement {
    pub fn new() -> Self {
        Self {
            command: 0,
            icon: None,
            icon_color: Color::WHITE,
            label: String::new(),
            label_font: None,
            label_text_size: None,
            label_text_color: None,
            bounds: Rectangle::default(),
            hidden: false,
        }
    }
}

impl Element for ButtonElement {
    fn set_attribute(&mut self, name: &str, value: &str) {
        match name {
            "command" => self.command = parse_command(value),
            "icon" => self.icon = Some(value.to_owned()),
            "label-font" => self.label_font = Some(value.to_owned()),
            "label-text-color" => self.label_text_color = Color::from_hex(value),
            "hidden" => self.hidden = value == "true",
            _ => {
                if let Ok(number) = value.parse::<f64>()
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("button element: ignoring attribute {name}");
            }
        }
    }

    fn set_attribute_components(&mut self, name: &str, components: &[ValueComponent]) {
        match name {
            "icon-color" => {
                if let Some(color) = sum_color_components(components) {
                    self.icon_color = color;
                }
            }
            "label-text-size" => {
                self.label_text_size = Some(sum_number_components(components).unwrap_or(0.0));
            }
            "label-text-color" => {
                self.label_text_color =
                    Some(sum_color_components(components).unwrap_or(Color::BLACK));
            }
            _ => {
                if let Some(number) = sum_number_components(components)
                    && apply_bounds_attribute(&mut self.bounds, name, number)
                {
                    return;
                }
                log::debug!("button element: ignoring attribute {name}");
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        self.label = text.to_owned();
    }

    fn instantiate(&self, window: &mut Window) -> ViewId {
        let mut button = ButtonView::new(self.command);
        button.icon = self.icon.clone();
        button.icon_color = self.icon_color;
        button.label = self.label.clone();
        button.label_font = self.label_font.clone();
        button.label_text_size = self.label_text_size;
        if let Some(color) = self.label_text_color {
            button.label_text_color = color;
        }
        let view = window.add_view(Box::new(button));
        window.set_view_bounds(view, self.bounds);
        window.set_view_hidden(view, self.hidden);
        view
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonState {
    Normal,
    Focused,
    Depressed,
}

type Action = Box<dyn FnMut(Command)>;

/// Behavior of the `button` element: a three-state (normal / focused /
/// depressed) focusable view. Activation fires the installed action with
/// the button's command.
pub struct ButtonView {
    command: Command,
    action: Option<Action>,
    state: ButtonState,

    pub icon: Option<String>,
    pub icon_color: Color,
    icon_texture: Option<TextureHandle>,

    pub label: String,
    pub label_font: Option<String>,
    pub label_text_size: Option<f64>,
    pub label_text_color: Color,
    font: Option<Arc<BitmapFont<TextureHandle>>>,

    pub normal_color: Option<Color>,
    pub focused_color: Option<Color>,
    pub depressed_color: Option<Color>,
}

impl ButtonView {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            action: None,
            state: ButtonState::Normal,
            icon: None,
            icon_color: Color::WHITE,
            icon_texture: None,
            label: String::new(),
            label_font: None,
            label_text_size: None,
            label_text_color: Color::BLACK,
            font: None,
            normal_color: None,
            focused_color: None,
            depressed_color: None,
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn set_command(&mut self, command: Command) {
        self.command = command;
    }

    pub fn set_action(&mut self, action: impl FnMut(Command) + 'static) {
        self.action = Some(Box::new(action));
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    fn activate(&mut self) {
        if let Some(action) = &mut self.action {
            action(self.command);
        }
    }

    fn background_color(&self) -> Option<Color> {
        match self.state {
            ButtonState::Normal => self.normal_color,
            ButtonState::Focused => self.focused_color.or(self.normal_color),
            ButtonState::Depressed => self.depressed_color.or(self.normal_color),
        }
    }
}

impl ViewBehavior for ButtonView {
    fn can_become_direct_focus(&self) -> bool {
        true
    }

    fn window_changed(&mut self, _id: ViewId, window: &mut Window, attached: bool) {
        if !attached {
            return;
        }
        if self.icon_texture.is_none()
            && let Some(icon) = &self.icon
        {
            self.icon_texture = window.load_texture_resource(icon);
        }
        if self.font.is_none()
            && let Some(name) = &self.label_font
        {
            self.font = window
                .load_bitmap_font_resource(&format!("{name}.png"), &format!("{name}.fnt"));
        }
    }

    fn focus_gained(&mut self, _id: ViewId, _window: &mut Window) {
        if self.state != ButtonState::Depressed {
            self.state = ButtonState::Focused;
        }
    }

    fn focus_lost(&mut self, _id: ViewId, _window: &mut Window) {
        if self.state != ButtonState::Depressed {
            self.state = ButtonState::Normal;
        }
    }

    fn mouse_down(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        button: MouseButton,
        _x: f64,
        _y: f64,
    ) -> bool {
        if button != MouseButton::Primary {
            return false;
        }
        self.state = ButtonState::Depressed;
        true
    }

    fn mouse_up(
        &mut self,
        id: ViewId,
        window: &mut Window,
        button: MouseButton,
        _start_x: f64,
        _start_y: f64,
        _x: f64,
        _y: f64,
    ) -> bool {
        if button != MouseButton::Primary || self.state != ButtonState::Depressed {
            return false;
        }
        self.state = if window.is_focus(id) {
            ButtonState::Focused
        } else {
            ButtonState::Normal
        };
        self.activate();
        true
    }

    fn key_down(
        &mut self,
        _id: ViewId,
        _window: &mut Window,
        key: KeyCode,
        _modifiers: KeyModifiers,
        _repeat: bool,
    ) -> bool {
        match key {
            KeyCode::Return | KeyCode::Space => {
                self.activate();
                true
            }
            _ => false,
        }
    }

    fn render(
        &mut self,
        _id: ViewId,
        window: &mut Window,
        canvas: &mut DrawList,
        bounds: Rectangle,
    ) {
        if let Some(color) = self.background_color() {
            canvas.fill_rect(rect_to_array(bounds), color.to_array_f32());
        }
        if let Some(icon) = &self.icon_texture
            && let Some(gpu_texture) = icon.gpu_texture()
        {
            canvas.textured_rect(
                rect_to_array(bounds),
                gpu_texture,
                self.icon_color.to_array_f32(),
            );
        }
        if let Some(font) = &self.font
            && !self.label.is_empty()
        {
            let size = self.label_text_size.unwrap_or_else(|| font.size());
            let px_scale = window.render_scale() * window.device_render_scale();
            draw_glyph_run(
                canvas,
                font,
                &self.label,
                bounds.origin(),
                size,
                self.label_text_color,
                px_scale,
            );
        }
    }
}
