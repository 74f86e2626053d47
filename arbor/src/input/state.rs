//! Input state tracking

use crate::event::PointerPhase;
use glam::Vec2;
use std::collections::HashSet;
use tracing::trace;

/// One raw pointer input waiting for dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub pointer_id: u32,
    pub button: u16,
    pub screen_position: Vec2,
}

/// Pointer inputs queued for the next dispatch plus keyboard state
///
/// Keys use their physical code names (`"KeyW"`, `"Space"`). The down and up
/// sets only cover the current frame; the hold set persists until release.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pointers: Vec<PointerInput>,
    keys_down: HashSet<String>,
    keys_held: HashSet<String>,
    keys_up: HashSet<String>,
    pointer_position: Option<Vec2>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pointer input
    pub fn push_pointer(
        &mut self,
        phase: PointerPhase,
        pointer_id: u32,
        screen_position: impl Into<Vec2>,
        button: u16,
    ) {
        let screen_position = screen_position.into();
        trace!(?phase, pointer_id, button, x = screen_position.x, y = screen_position.y, "Pointer input");
        self.pointer_position = Some(screen_position);
        self.pointers.push(PointerInput {
            phase,
            pointer_id,
            button,
            screen_position,
        });
    }

    pub fn pointer_down(&mut self, pointer_id: u32, screen_position: impl Into<Vec2>, button: u16) {
        self.push_pointer(PointerPhase::Down, pointer_id, screen_position, button);
    }

    pub fn pointer_move(&mut self, pointer_id: u32, screen_position: impl Into<Vec2>) {
        self.push_pointer(PointerPhase::Move, pointer_id, screen_position, 0);
    }

    pub fn pointer_up(&mut self, pointer_id: u32, screen_position: impl Into<Vec2>, button: u16) {
        self.push_pointer(PointerPhase::Up, pointer_id, screen_position, button);
    }

    /// Last known pointer position in screen space
    pub fn pointer_position(&self) -> Option<Vec2> {
        self.pointer_position
    }

    /// Inputs waiting for dispatch
    pub fn pending_pointers(&self) -> &[PointerInput] {
        &self.pointers
    }

    pub(crate) fn take_pointers(&mut self) -> Vec<PointerInput> {
        std::mem::take(&mut self.pointers)
    }

    /// Handle a key press; repeats of a held key are ignored
    pub fn key_down(&mut self, code: impl Into<String>) {
        let code = code.into();
        if self.keys_held.contains(&code) {
            return;
        }
        trace!(code = %code, "Key pressed");
        self.keys_down.insert(code.clone());
        self.keys_held.insert(code);
    }

    /// Handle a key release
    pub fn key_up(&mut self, code: impl Into<String>) {
        let code = code.into();
        trace!(code = %code, "Key released");
        self.keys_held.remove(&code);
        self.keys_up.insert(code);
    }

    /// Forget held keys, e.g. when the window loses focus
    pub fn release_all_keys(&mut self) {
        self.keys_held.clear();
    }

    /// Pressed during this frame
    pub fn is_key_down(&self, code: &str) -> bool {
        self.keys_down.contains(code)
    }

    /// Currently held
    pub fn is_key_held(&self, code: &str) -> bool {
        self.keys_held.contains(code)
    }

    /// Released during this frame
    pub fn is_key_up(&self, code: &str) -> bool {
        self.keys_up.contains(code)
    }

    /// Clear per-frame data
    pub fn clear_frame_data(&mut self) {
        self.keys_down.clear();
        self.keys_up.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_sets() {
        let mut state = InputQueue::new();

        state.key_down("KeyW");
        assert!(state.is_key_down("KeyW"));
        assert!(state.is_key_held("KeyW"));

        state.clear_frame_data();
        assert!(!state.is_key_down("KeyW"));
        assert!(state.is_key_held("KeyW"));

        // held key repeat is not a new press
        state.key_down("KeyW");
        assert!(!state.is_key_down("KeyW"));

        state.key_up("KeyW");
        assert!(state.is_key_up("KeyW"));
        assert!(!state.is_key_held("KeyW"));

        state.clear_frame_data();
        assert!(!state.is_key_up("KeyW"));
    }

    #[test]
    fn test_pointer_queue() {
        let mut state = InputQueue::new();
        state.pointer_down(1, (10.0, 20.0), 0);
        state.pointer_move(1, (12.0, 20.0));

        assert_eq!(state.pending_pointers().len(), 2);
        assert_eq!(state.pointer_position(), Some(Vec2::new(12.0, 20.0)));

        let taken = state.take_pointers();
        assert_eq!(taken[0].phase, PointerPhase::Down);
        assert!(state.pending_pointers().is_empty());
    }
}
