use std::collections::HashSet;

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Cached keyboard and mouse state, polled once per frame. Mouse clicks are
/// edge triggered so a held button edits exactly one block.
#[derive(Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    mouse_delta: (f64, f64),
    left_held: bool,
    right_held: bool,
    left_clicked: bool,
    right_clicked: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.held.insert(key);
            }
            ElementState::Released => {
                self.held.remove(&key);
            }
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => {
                if pressed && !self.left_held {
                    self.left_clicked = true;
                }
                self.left_held = pressed;
            }
            MouseButton::Right => {
                if pressed && !self.right_held {
                    self.right_clicked = true;
                }
                self.right_held = pressed;
            }
            _ => {}
        }
    }

    pub fn accumulate_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0;
        self.mouse_delta.1 += delta.1;
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Mouse movement since the last call.
    pub fn take_mouse_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.mouse_delta)
    }

    /// True once per left-button press.
    pub fn take_left_click(&mut self) -> bool {
        std::mem::take(&mut self.left_clicked)
    }

    /// True once per right-button press.
    pub fn take_right_click(&mut self) -> bool {
        std::mem::take(&mut self.right_clicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_fires_once_per_press() {
        let mut input = InputState::default();
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        // Repeated press events while held must not re-trigger.
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.take_left_click());
        assert!(!input.take_left_click());

        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.take_left_click());
    }

    #[test]
    fn test_mouse_delta_accumulates_and_drains() {
        let mut input = InputState::default();
        input.accumulate_mouse_motion((2.0, -1.0));
        input.accumulate_mouse_motion((1.0, 1.0));
        assert_eq!(input.take_mouse_delta(), (3.0, 0.0));
        assert_eq!(input.take_mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_keys_track_held_state() {
        let mut input = InputState::default();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_held(KeyCode::KeyW));
        input.handle_key(KeyCode::KeyW, ElementState::Released);
        assert!(!input.is_held(KeyCode::KeyW));
    }
}
