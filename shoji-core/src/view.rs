use std::any::Any;
use std::time::Duration;

use renderer::DrawList;
use slab::Slab;

use crate::input::{KeyCode, KeyModifiers, MouseButton};
use crate::types::{Point, Rectangle};
use crate::window::Window;

/// Index of a view inside its window's tree. Copyable; stale ids (views
/// already removed) are programmer errors and fail assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

/// Per-view behavior: the capability hooks a view implements over the plain
/// tree node (bounds, visibility, hierarchy) the `ViewTree` stores for it.
///
/// Hooks receive the owning `Window` mutably. During a dispatch the
/// receiving behavior is temporarily checked out of the tree, so a hook
/// that synchronously triggers another dispatch reaching the same view will
/// find the slot empty and that inner callback is skipped.
#[allow(unused_variables)]
pub trait ViewBehavior: Any {
    // MARK: focus capability

    /// Whether this view can hold keyboard focus itself.
    fn can_become_direct_focus(&self) -> bool {
        false
    }

    /// Resolves a focus request aimed at this view, possibly redirecting it
    /// to another view (e.g. a child). `None` drops the request silently.
    fn expected_focus(&self, id: ViewId, views: &ViewTree) -> Option<ViewId> {
        self.can_become_direct_focus().then_some(id)
    }

    fn focus_gained(&mut self, id: ViewId, window: &mut Window) {}
    fn focus_lost(&mut self, id: ViewId, window: &mut Window) {}
    fn focus_changed(&mut self, id: ViewId, window: &mut Window) {}

    // MARK: frame hooks

    fn update(&mut self, id: ViewId, window: &mut Window, elapsed: Duration) {}

    /// Pushes draw commands for this view. `bounds` is the view's rectangle
    /// in render-target pixels.
    fn render(&mut self, id: ViewId, window: &mut Window, canvas: &mut DrawList, bounds: Rectangle) {
    }

    fn layout(&mut self, id: ViewId, window: &mut Window) {}

    // MARK: input

    /// Returns true when the event was consumed.
    fn mouse_down(
        &mut self,
        id: ViewId,
        window: &mut Window,
        button: MouseButton,
        x: f64,
        y: f64,
    ) -> bool {
        false
    }

    fn mouse_up(
        &mut self,
        id: ViewId,
        window: &mut Window,
        button: MouseButton,
        start_x: f64,
        start_y: f64,
        x: f64,
        y: f64,
    ) -> bool {
        false
    }

    fn mouse_movement(&mut self, id: ViewId, window: &mut Window, x: f64, y: f64) {}

    fn mouse_wheel(
        &mut self,
        id: ViewId,
        window: &mut Window,
        x: f64,
        y: f64,
        delta_x: i32,
        delta_y: i32,
    ) -> bool {
        false
    }

    fn mouse_drag(
        &mut self,
        id: ViewId,
        window: &mut Window,
        start_x: f64,
        start_y: f64,
        x: f64,
        y: f64,
    ) {
    }

    fn key_down(
        &mut self,
        id: ViewId,
        window: &mut Window,
        key: KeyCode,
        modifiers: KeyModifiers,
        repeat: bool,
    ) -> bool {
        false
    }

    // MARK: lifecycle

    fn window_changed(&mut self, id: ViewId, window: &mut Window, attached: bool) {}
    fn visibility_changed(&mut self, id: ViewId, window: &mut Window, visible: bool) {}
    fn future_visibility_change(&mut self, id: ViewId, window: &mut Window, visible: bool) {}
}

/// A view with no behavior of its own; containers and the window's content
/// view use it directly.
pub struct BaseView;

impl ViewBehavior for BaseView {}

struct ViewNode {
    /// `None` while the behavior is checked out for a dispatch.
    behavior: Option<Box<dyn ViewBehavior>>,
    /// Rectangle in the superview's coordinate space.
    bounds: Rectangle,
    hidden: bool,
    superview: Option<ViewId>,
    /// Children in z-order, back to front.
    subviews: Vec<ViewId>,
    next_focus: Option<ViewId>,
    previous_focus: Option<ViewId>,
}

/// The strictly-owned view hierarchy of one window: nodes live in a slab
/// arena, parents own children, and back references are plain ids.
pub struct ViewTree {
    nodes: Slab<ViewNode>,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        Self { nodes: Slab::new() }
    }

    // MARK: structure

    /// Creates a detached view.
    pub fn add_view(&mut self, behavior: Box<dyn ViewBehavior>) -> ViewId {
        ViewId(self.nodes.insert(ViewNode {
            behavior: Some(behavior),
            bounds: Rectangle::default(),
            hidden: false,
            superview: None,
            subviews: Vec::new(),
            next_focus: None,
            previous_focus: None,
        }))
    }

    /// Removes a view and its whole subtree.
    pub fn remove_view(&mut self, id: ViewId) {
        if let Some(parent) = self.node(id).superview {
            self.node_mut(parent).subviews.retain(|&child| child != id);
        }
        self.remove_subtree(id);
    }

    fn remove_subtree(&mut self, id: ViewId) {
        let subviews = std::mem::take(&mut self.node_mut(id).subviews);
        for child in subviews {
            self.remove_subtree(child);
        }
        self.nodes.remove(id.0);
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Appends `child` on top of `parent`'s existing subviews.
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) {
        assert!(
            self.node(child).superview.is_none(),
            "view is already attached to a superview"
        );
        self.node_mut(parent).subviews.push(child);
        self.node_mut(child).superview = Some(parent);
    }

    /// Detaches `child`, keeping its subtree alive.
    pub fn remove_subview(&mut self, parent: ViewId, child: ViewId) {
        self.node_mut(parent).subviews.retain(|&c| c != child);
        self.node_mut(child).superview = None;
    }

    pub fn superview(&self, id: ViewId) -> Option<ViewId> {
        self.node(id).superview
    }

    pub fn subviews(&self, id: ViewId) -> &[ViewId] {
        &self.node(id).subviews
    }

    /// Strict descendant test along the superview chain; a view is not a
    /// descendant of itself.
    pub fn is_descendant_of(&self, view: ViewId, ancestor: ViewId) -> bool {
        let mut cursor = self.node(view).superview;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).superview;
        }
        false
    }

    // MARK: bounds & visibility

    pub fn bounds(&self, id: ViewId) -> Rectangle {
        self.node(id).bounds
    }

    pub fn set_bounds(&mut self, id: ViewId, bounds: Rectangle) {
        self.node_mut(id).bounds = bounds;
    }

    pub fn is_hidden(&self, id: ViewId) -> bool {
        self.node(id).hidden
    }

    pub fn set_hidden(&mut self, id: ViewId, hidden: bool) {
        self.node_mut(id).hidden = hidden;
    }

    /// Visible means neither the view nor any ancestor is hidden.
    pub fn is_visible(&self, id: ViewId) -> bool {
        if self.node(id).hidden {
            return false;
        }
        match self.node(id).superview {
            Some(superview) => self.is_visible(superview),
            None => true,
        }
    }

    // MARK: coordinate transforms

    /// Converts a point in the superview's space into this view's space.
    pub fn superview_to_local(&self, id: ViewId, point: Point) -> Point {
        point - self.node(id).bounds.origin()
    }

    /// Converts a window-space point into `view`'s space by composing every
    /// ancestor transform from the window down. `None` means window
    /// coordinates and returns the point unchanged.
    pub fn window_to_view(&self, view: Option<ViewId>, point: Point) -> Point {
        let Some(view) = view else {
            return point;
        };
        let super_point = self.window_to_view(self.node(view).superview, point);
        self.superview_to_local(view, super_point)
    }

    /// Converts a point in `view`'s space into window space.
    pub fn view_to_window(&self, view: ViewId, point: Point) -> Point {
        let mut point = point;
        let mut cursor = Some(view);
        while let Some(current) = cursor {
            point = point + self.node(current).bounds.origin();
            cursor = self.node(current).superview;
        }
        point
    }

    /// This view's rectangle in window space.
    pub fn window_bounds(&self, view: ViewId) -> Rectangle {
        let bounds = self.node(view).bounds;
        Rectangle::with_origin(
            self.view_to_window(view, Point::default()),
            bounds.width,
            bounds.height,
        )
    }

    // MARK: focus links

    /// Chains `next` after `view` for Tab traversal, maintaining the
    /// reverse link.
    pub fn set_next_focus(&mut self, view: ViewId, next: ViewId) {
        self.node_mut(view).next_focus = Some(next);
        self.node_mut(next).previous_focus = Some(view);
    }

    pub fn next_focus(&self, view: ViewId) -> Option<ViewId> {
        self.node(view).next_focus
    }

    pub fn previous_focus(&self, view: ViewId) -> Option<ViewId> {
        self.node(view).previous_focus
    }

    // MARK: behavior access

    /// Focus capability of the view, `false` while its behavior is checked
    /// out.
    pub fn can_become_direct_focus(&self, id: ViewId) -> bool {
        self.node(id)
            .behavior
            .as_ref()
            .is_some_and(|behavior| behavior.can_become_direct_focus())
    }

    /// Resolves a focus request through the view's `expected_focus`.
    /// `None` when the behavior declines or is checked out.
    pub fn expected_focus(&self, id: ViewId) -> Option<ViewId> {
        self.node(id)
            .behavior
            .as_ref()
            .and_then(|behavior| behavior.expected_focus(id, self))
    }

    /// Typed access to a view's behavior, when it is a `T`.
    pub fn behavior_ref<T: ViewBehavior>(&self, id: ViewId) -> Option<&T> {
        let behavior = self.node(id).behavior.as_deref()?;
        (behavior as &dyn Any).downcast_ref::<T>()
    }

    /// Mutable typed access to a view's behavior.
    pub fn behavior_mut<T: ViewBehavior>(&mut self, id: ViewId) -> Option<&mut T> {
        let behavior = self.nodes.get_mut(id.0)?.behavior.as_deref_mut()?;
        (behavior as &mut dyn Any).downcast_mut::<T>()
    }

    pub(crate) fn take_behavior(&mut self, id: ViewId) -> Option<Box<dyn ViewBehavior>> {
        self.nodes.get_mut(id.0)?.behavior.take()
    }

    pub(crate) fn put_behavior(&mut self, id: ViewId, behavior: Box<dyn ViewBehavior>) {
        // The view may have been removed while its behavior was out.
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.behavior = Some(behavior);
        }
    }

    // MARK: traversal

    /// Window-space rectangles of every visible, focusable view, collected
    /// in one pre-order traversal. Hidden subtrees are skipped entirely.
    pub fn focusable_regions(&self, root: ViewId) -> Vec<(ViewId, Rectangle)> {
        let mut regions = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.node(id).hidden {
                continue;
            }
            if self.can_become_direct_focus(id) {
                regions.push((id, self.window_bounds(id)));
            }
            for &child in self.node(id).subviews.iter().rev() {
                stack.push(child);
            }
        }
        regions
    }

    /// All views of the subtree rooted at `root`, pre-order.
    pub fn descendants(&self, root: ViewId) -> Vec<ViewId> {
        let mut views = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            views.push(id);
            for &child in self.node(id).subviews.iter().rev() {
                stack.push(child);
            }
        }
        views
    }

    fn node(&self, id: ViewId) -> &ViewNode {
        self.nodes.get(id.0).expect("stale view id")
    }

    fn node_mut(&mut self, id: ViewId) -> &mut ViewNode {
        self.nodes.get_mut(id.0).expect("stale view id")
    }
}
