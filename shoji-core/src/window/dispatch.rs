use crate::input::{KeyCode, KeyModifiers, MouseButton};
use crate::types::{Direction, Point};
use crate::view::ViewId;
use crate::window::Window;

// MARK: mouse dispatch

impl Window {
    /// Device-pixel mouse coordinates scale down into content-view units
    /// before hit testing.
    fn input_scale(&self) -> f64 {
        (1.0 / self.render_scale) * (1.0 / self.device_render_scale)
    }

    pub fn dispatch_mouse_down(&mut self, button: MouseButton, x: f64, y: f64) {
        let scale = self.input_scale();
        let (x, y) = (x * scale, y * scale);
        self.mouse_down_in(self.content_view, button, x, y);
        self.last_mouse_down = Point::new(x, y);
    }

    pub fn dispatch_mouse_up(&mut self, button: MouseButton, x: f64, y: f64) {
        let scale = self.input_scale();
        let (x, y) = (x * scale, y * scale);
        let start = self.last_mouse_down;
        self.mouse_up_in(self.content_view, button, start.x, start.y, x, y);
        self.dragged_views.clear();
    }

    pub fn dispatch_mouse_movement(&mut self, x: f64, y: f64) {
        let scale = self.input_scale();
        let (x, y) = (x * scale, y * scale);
        self.mouse_movement_in(self.content_view, x, y);

        let dragged: Vec<ViewId> = self.dragged_views.iter().copied().collect();
        for view in dragged {
            assert!(self.views.contains(view), "dragged view was removed");
            let start = self.views.window_to_view(Some(view), self.last_mouse_down);
            let point = self.views.window_to_view(Some(view), Point::new(x, y));
            self.with_behavior(view, |behavior, window| {
                behavior.mouse_drag(view, window, start.x, start.y, point.x, point.y);
            });
        }
    }

    pub fn dispatch_mouse_wheel(&mut self, x: f64, y: f64, wheel_x: i32, wheel_y: i32) {
        let scale = self.input_scale();
        let (x, y) = (x * scale, y * scale);
        self.mouse_wheel_in(self.content_view, x, y, wheel_x, wheel_y);
    }

    /// Depth-first hit dispatch: the topmost subview containing the point
    /// gets the event first; unconsumed events fall through to the view
    /// itself. Coordinates are local to `view`.
    fn mouse_down_in(&mut self, view: ViewId, button: MouseButton, x: f64, y: f64) -> bool {
        for child in self.hit_subviews(view, x, y) {
            let local = self.views.superview_to_local(child, Point::new(x, y));
            if self.mouse_down_in(child, button, local.x, local.y) {
                return true;
            }
        }
        self.with_behavior(view, |behavior, window| {
            behavior.mouse_down(view, window, button, x, y)
        })
        .unwrap_or(false)
    }

    fn mouse_up_in(
        &mut self,
        view: ViewId,
        button: MouseButton,
        start_x: f64,
        start_y: f64,
        x: f64,
        y: f64,
    ) -> bool {
        for child in self.hit_subviews(view, x, y) {
            let local = self.views.superview_to_local(child, Point::new(x, y));
            let local_start = self
                .views
                .superview_to_local(child, Point::new(start_x, start_y));
            if self.mouse_up_in(child, button, local_start.x, local_start.y, local.x, local.y) {
                return true;
            }
        }
        self.with_behavior(view, |behavior, window| {
            behavior.mouse_up(view, window, button, start_x, start_y, x, y)
        })
        .unwrap_or(false)
    }

    fn mouse_movement_in(&mut self, view: ViewId, x: f64, y: f64) {
        for child in self.hit_subviews(view, x, y) {
            let local = self.views.superview_to_local(child, Point::new(x, y));
            self.mouse_movement_in(child, local.x, local.y);
        }
        self.with_behavior(view, |behavior, window| {
            behavior.mouse_movement(view, window, x, y);
        });
    }

    fn mouse_wheel_in(
        &mut self,
        view: ViewId,
        x: f64,
        y: f64,
        wheel_x: i32,
        wheel_y: i32,
    ) -> bool {
        for child in self.hit_subviews(view, x, y) {
            let local = self.views.superview_to_local(child, Point::new(x, y));
            if self.mouse_wheel_in(child, local.x, local.y, wheel_x, wheel_y) {
                return true;
            }
        }
        self.with_behavior(view, |behavior, window| {
            behavior.mouse_wheel(view, window, x, y, wheel_x, wheel_y)
        })
        .unwrap_or(false)
    }

    /// Visible subviews containing the parent-local point, topmost first.
    fn hit_subviews(&self, view: ViewId, x: f64, y: f64) -> Vec<ViewId> {
        self.views
            .subviews(view)
            .iter()
            .rev()
            .copied()
            .filter(|&child| {
                !self.views.is_hidden(child)
                    && self.views.bounds(child).contains(Point::new(x, y))
            })
            .collect()
    }
}

// MARK: keyboard dispatch

impl Window {
    /// Routes a key press: the Tab fallback when nothing is focused, then
    /// the responder chain (focus view, its ancestors, the window
    /// delegate), then the toolkit's default arrow-key focus movement.
    pub fn dispatch_key_down(&mut self, key: KeyCode, modifiers: KeyModifiers, repeat: bool) {
        if key == KeyCode::Tab
            && self.focus.is_none()
            && let Some(initial) = self.initial_focus
        {
            if modifiers.contains(KeyModifiers::SHIFT)
                && let Some(view) = self.previous_available_focus(initial)
            {
                self.set_focus(Some(view));
                return;
            }
            if self.views.is_visible(initial) && self.views.can_become_direct_focus(initial) {
                self.set_focus(Some(initial));
                return;
            } else if let Some(view) = self.next_available_focus(initial) {
                self.set_focus(Some(view));
                return;
            }
        }

        let mut cursor = self.focus;
        while let Some(view) = cursor {
            let handled = self
                .with_behavior(view, |behavior, window| {
                    behavior.key_down(view, window, key, modifiers, repeat)
                })
                .unwrap_or(false);
            if handled {
                return;
            }
            cursor = self.views.superview(view);
        }

        let handled = self
            .with_delegate(|delegate, window| delegate.key_down(window, key, modifiers, repeat))
            .unwrap_or(false);
        if handled {
            return;
        }

        let direction = match key {
            KeyCode::ArrowLeft => Some(Direction::Left),
            KeyCode::ArrowRight => Some(Direction::Right),
            KeyCode::ArrowUp => Some(Direction::Up),
            KeyCode::ArrowDown => Some(Direction::Down),
            _ => None,
        };
        if let Some(direction) = direction {
            self.move_focus(direction);
        }
    }
}
