use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Held / pressed-this-frame / released-this-frame state for one kind of button.
#[derive(Debug)]
struct ButtonSet<T> {
    down: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for ButtonSet<T> {
    fn default() -> Self {
        Self {
            down: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> ButtonSet<T> {
    fn update(&mut self, button: T, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat delivers Pressed again while held.
                if self.down.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                if self.down.remove(&button) {
                    self.released.insert(button);
                }
            }
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

/// Keyboard and mouse state, fed from window events and reset once per frame.
///
/// Events are recorded even when the UI consumed them; [`Input::ui_wants_keyboard`]
/// and [`Input::ui_wants_pointer`] tell whether the UI is using them.
#[derive(Debug, Default)]
pub struct Input {
    keys: ButtonSet<KeyCode>,
    mouse: ButtonSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    ui_wants_keyboard: bool,
    ui_wants_pointer: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame state. Call after the frame has been handled.
    pub fn end_frame(&mut self) {
        self.keys.end_frame();
        self.mouse.end_frame();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.keys.update(key, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse.update(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_position;
                self.mouse_position = new_pos;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
            }
            WindowEvent::Focused(false) => {
                // Releases are lost while unfocused.
                self.keys = ButtonSet::default();
                self.mouse = ButtonSet::default();
            }
            _ => {}
        }
    }

    pub(crate) fn set_ui_focus(&mut self, wants_keyboard: bool, wants_pointer: bool) {
        self.ui_wants_keyboard = wants_keyboard;
        self.ui_wants_pointer = wants_pointer;
    }

    /// The loop exits when this is set. Escape is left to the UI while it has
    /// keyboard focus, where it cancels an edit.
    pub fn exit_requested(&self) -> bool {
        self.key_pressed(KeyCode::Escape) && !self.ui_wants_keyboard
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys.down.contains(&key)
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse.down.contains(&button)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse.released.contains(&button)
    }

    /// Cursor position in physical window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll this frame, in lines.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    pub fn ui_wants_keyboard(&self) -> bool {
        self.ui_wants_keyboard
    }

    pub fn ui_wants_pointer(&self) -> bool {
        self.ui_wants_pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    #[allow(unused_unsafe)]
    fn device() -> DeviceId {
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn press_is_reported_once_while_held() {
        let mut keys = ButtonSet::default();
        keys.update(KeyCode::KeyW, ElementState::Pressed);
        assert!(keys.pressed.contains(&KeyCode::KeyW));

        keys.end_frame();
        keys.update(KeyCode::KeyW, ElementState::Pressed);
        assert!(keys.down.contains(&KeyCode::KeyW));
        assert!(keys.pressed.is_empty());
    }

    #[test]
    fn release_clears_down() {
        let mut keys = ButtonSet::default();
        keys.update(KeyCode::Escape, ElementState::Pressed);
        keys.update(KeyCode::Escape, ElementState::Released);
        assert!(keys.down.is_empty());
        assert!(keys.released.contains(&KeyCode::Escape));

        keys.end_frame();
        assert!(keys.released.is_empty());
    }

    #[test]
    fn stray_release_is_ignored() {
        let mut keys: ButtonSet<KeyCode> = ButtonSet::default();
        keys.update(KeyCode::KeyA, ElementState::Released);
        assert!(keys.released.is_empty());
    }

    #[test]
    fn mouse_buttons_and_scroll() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        input.handle_event(&WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: TouchPhase::Moved,
        });
        input.handle_event(&WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(10.0, 20.0),
        });

        assert!(input.mouse_pressed(MouseButton::Left));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 2.0));
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));

        input.end_frame();
        assert!(input.mouse_down(MouseButton::Left));
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn escape_exits_unless_the_ui_is_typing() {
        let mut input = Input::new();
        input.keys.update(KeyCode::Escape, ElementState::Pressed);
        assert!(input.exit_requested());

        input.set_ui_focus(true, false);
        assert!(!input.exit_requested());

        input.set_ui_focus(false, false);
        assert!(input.exit_requested());
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Right,
        });
        input.handle_event(&WindowEvent::Focused(false));
        assert!(!input.mouse_down(MouseButton::Right));
        assert!(!input.exit_requested());
    }
}
