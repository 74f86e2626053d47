//! Click and double click recognition on top of pointer events

use crate::component::{Component, ComponentClass, ComponentContext, TimerTick};
use crate::event::{ClickEvent, GlobalPointerEvent, PointerEvent};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Turns a press and release of the same pointer on its node into `Click`
/// and, for a second click within `double_click_interval`, `DoubleClick`
///
/// Both events are emitted on the component's node only. Releasing the
/// pointer outside the node's subtree cancels the press.
#[derive(ComponentClass, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[component(name = "UiEvent", events(PointerDown, PointerUp, GlobalPointerUp))]
#[serde(default)]
pub struct UiEvent {
    /// Seconds
    pub double_click_interval: f32,
    #[serde(skip)]
    pressed_by: Option<u32>,
    #[serde(skip)]
    clicks: u32,
}

impl Default for UiEvent {
    fn default() -> Self {
        Self {
            double_click_interval: 0.5,
            pressed_by: None,
            clicks: 0,
        }
    }
}

impl Component for UiEvent {
    fn on_pointer_down(&mut self, _ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {
        self.pressed_by = Some(event.pointer_id);
    }

    fn on_pointer_up(&mut self, ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {
        if self.pressed_by != Some(event.pointer_id) {
            return;
        }
        self.pressed_by = None;

        let node = ctx.node();
        let click = ClickEvent::from(&*event);
        trace!(node = %node, pointer = event.pointer_id, "Click");
        ctx.emit_click(node, false, &click);

        ctx.remove_all_timers();
        ctx.add_timer_once(self.double_click_interval);
        self.clicks += 1;
        if self.clicks == 2 {
            self.clicks = 0;
            ctx.emit_click(node, true, &click);
        }
    }

    fn on_global_pointer_up(&mut self, ctx: &mut ComponentContext<'_>, event: &GlobalPointerEvent) {
        let node = ctx.node();
        let inside = event
            .target
            .is_some_and(|target| target == node || ctx.is_ancestor(node, target));
        if !inside {
            self.pressed_by = None;
        }
    }

    fn on_timer(&mut self, _ctx: &mut ComponentContext<'_>, _tick: TimerTick) {
        self.clicks = 0;
    }
}
