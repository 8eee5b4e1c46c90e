use smallvec::SmallVec;

use crate::types::Direction;
use crate::view::ViewId;
use crate::window::Window;

// MARK: focus change protocol

impl Window {
    /// The currently focused view, if any.
    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn initial_focus(&self) -> Option<ViewId> {
        self.initial_focus
    }

    /// The view Tab reaches first when nothing is focused.
    pub fn set_initial_focus(&mut self, view: Option<ViewId>) {
        self.initial_focus = view;
    }

    /// Moves focus to `candidate` (or clears it with `None`), notifying the
    /// two ancestor chains.
    ///
    /// The candidate first resolves through its own `expected_focus`; if
    /// that declines, the request is dropped silently. Walking up from the
    /// old focus, every ancestor gets `focus_changed` and those outside the
    /// new focus's chain also get `focus_lost`. Walking up from the new
    /// focus, ancestors outside the old chain get `focus_gained` then
    /// `focus_changed`. Ancestors shared by both chains therefore see
    /// exactly one `focus_changed` and never a gain or loss.
    pub fn set_focus(&mut self, candidate: Option<ViewId>) {
        let focus = match candidate {
            Some(view) => match self.views.expected_focus(view) {
                Some(resolved) => Some(resolved),
                None => return,
            },
            None => None,
        };

        if self.focus == focus {
            return;
        }

        let previous_focus = self.focus;
        self.focus = focus;

        let mut cursor = previous_focus;
        while let Some(view) = cursor {
            let next = self.views.superview(view);
            let keeps_focus = focus.is_some_and(|focus| {
                focus == view || self.views.is_descendant_of(focus, view)
            });
            if !keeps_focus {
                self.with_behavior(view, |behavior, window| behavior.focus_lost(view, window));
            }
            self.with_behavior(view, |behavior, window| behavior.focus_changed(view, window));
            cursor = next;
        }

        let mut cursor = self.focus;
        while let Some(view) = cursor {
            let next = self.views.superview(view);
            let had_focus = previous_focus.is_some_and(|previous| {
                previous == view || self.views.is_descendant_of(previous, view)
            });
            if !had_focus {
                self.with_behavior(view, |behavior, window| behavior.focus_gained(view, window));
                self.with_behavior(view, |behavior, window| behavior.focus_changed(view, window));
            }
            cursor = next;
        }
    }

    /// Whether `view` is the focus or an ancestor of it.
    pub fn is_focus(&self, view: ViewId) -> bool {
        self.focus.is_some_and(|focus| {
            focus == view || self.views.is_descendant_of(focus, view)
        })
    }
}

// MARK: directional search

impl Window {
    /// Moves focus spatially: among all visible focusable views, pick the
    /// best candidate in `direction` relative to the current focus's
    /// window-space bounds. Returns whether a move occurred.
    ///
    /// Candidates are scored by rectangle distance, ties broken by the
    /// perpendicular-axis overlap with the current bounds, further ties by
    /// the smaller leading perpendicular coordinate.
    pub fn move_focus(&mut self, direction: Direction) -> bool {
        let Some(previous_focus) = self.focus else {
            if let Some(initial) = self.initial_focus
                && self.views.is_visible(initial)
                && self.views.can_become_direct_focus(initial)
            {
                self.set_focus(Some(initial));
                return true;
            }
            return false;
        };

        let regions: SmallVec<[_; 16]> = self
            .views
            .focusable_regions(self.content_view)
            .into_iter()
            .collect();
        let previous = self.views.window_bounds(previous_focus);

        let mut next: Option<ViewId> = None;
        let mut next_distance = 0.0;
        let mut next_overlap = 0.0;
        let mut next_perpendicular = 0.0;

        for (view, r) in regions {
            let x_overlap = (previous.width
                - (previous.max_x() - r.max_x()).max(0.0)
                - (r.min_x() - previous.min_x()).max(0.0))
            .max(0.0);
            let y_overlap = (previous.height
                - (previous.max_y() - r.max_y()).max(0.0)
                - (r.min_y() - previous.min_y()).max(0.0))
            .max(0.0);

            let mut overlap = 0.0;
            let mut perpendicular = 0.0;
            match direction {
                Direction::Right => {
                    overlap = y_overlap;
                    perpendicular = r.min_y();
                    if overlap == 0.0 || r.max_x() <= previous.max_x() {
                        continue;
                    }
                }
                Direction::Left => {
                    overlap = y_overlap;
                    perpendicular = r.min_y();
                    if overlap == 0.0 || r.x >= previous.x {
                        continue;
                    }
                }
                Direction::Up => {
                    overlap = x_overlap;
                    perpendicular = r.min_x();
                    if overlap == 0.0 || r.y >= previous.y {
                        continue;
                    }
                }
                Direction::Down => {
                    overlap = x_overlap;
                    perpendicular = r.min_x();
                    if overlap == 0.0 || r.max_y() <= previous.max_y() {
                        continue;
                    }
                }
                Direction::UpLeft => {
                    if r.x >= previous.x || r.y >= previous.y {
                        continue;
                    }
                }
                Direction::UpRight => {
                    if r.max_x() <= previous.max_x() || r.y >= previous.y {
                        continue;
                    }
                }
                Direction::DownLeft => {
                    if r.x >= previous.x || r.max_y() <= previous.max_y() {
                        continue;
                    }
                }
                Direction::DownRight => {
                    if r.max_x() <= previous.max_x() || r.max_y() <= previous.max_y() {
                        continue;
                    }
                }
            }

            let distance = r.distance(&previous);
            let better = next.is_none()
                || distance < next_distance
                || (distance == next_distance
                    && (overlap > next_overlap
                        || (overlap == next_overlap && perpendicular < next_perpendicular)));
            if better {
                next = Some(view);
                next_distance = distance;
                next_overlap = overlap;
                next_perpendicular = perpendicular;
            }
        }

        if let Some(next) = next {
            self.set_focus(Some(next));
            return true;
        }
        false
    }

    // MARK: tab traversal

    /// First visible, focusable view strictly after `view` on its
    /// next-focus chain. Stops when the chain loops back.
    pub fn next_available_focus(&self, view: ViewId) -> Option<ViewId> {
        let mut cursor = self.views.next_focus(view);
        while let Some(current) = cursor {
            if current == view {
                return None;
            }
            if self.views.is_visible(current) && self.views.can_become_direct_focus(current) {
                return Some(current);
            }
            cursor = self.views.next_focus(current);
        }
        None
    }

    /// Mirror of `next_available_focus` over the previous-focus links.
    pub fn previous_available_focus(&self, view: ViewId) -> Option<ViewId> {
        let mut cursor = self.views.previous_focus(view);
        while let Some(current) = cursor {
            if current == view {
                return None;
            }
            if self.views.is_visible(current) && self.views.can_become_direct_focus(current) {
                return Some(current);
            }
            cursor = self.views.previous_focus(current);
        }
        None
    }
}
