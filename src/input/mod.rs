//! Per-frame input handed to the input phase.

pub mod action;
pub mod keybindings;

use chrono::{Local, NaiveDateTime};
use glam::Vec2;

pub use action::Action;
pub use keybindings::{Binding, Keybindings};

/// Everything the window layer reports for one frame. The core never polls
/// input itself.
#[derive(Debug, Clone)]
pub struct InputFrame {
    /// Mouse position in world coordinates.
    pub mouse_world: Vec2,
    /// Seconds since the previous frame.
    pub dt: f64,
    pub now: NaiveDateTime,
    pub keys_pressed: Vec<i32>,
    pub keys_down: Vec<i32>,
    pub mouse_pressed: Vec<i32>,
    pub mouse_down: Vec<i32>,
    pub mouse_released: Vec<i32>,
    /// Wheel movement, positive away from the user.
    pub wheel: f32,
    /// Clipboard text, read by paste-external.
    pub clipboard: Option<String>,
    /// Text typed into the search box.
    pub search: Option<String>,
    /// Actions requested outside the keybinding table (menus, tests).
    pub actions: Vec<Action>,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self {
            mouse_world: Vec2::ZERO,
            dt: 0.0,
            now: Local::now().naive_local(),
            keys_pressed: Vec::new(),
            keys_down: Vec::new(),
            mouse_pressed: Vec::new(),
            mouse_down: Vec::new(),
            mouse_released: Vec::new(),
            wheel: 0.0,
            clipboard: None,
            search: None,
            actions: Vec::new(),
        }
    }
}

impl InputFrame {
    /// An idle frame with the mouse at `mouse_world`.
    pub fn at(mouse_world: Vec2) -> Self {
        Self {
            mouse_world,
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_clipboard(mut self, text: impl Into<String>) -> Self {
        self.clipboard = Some(text.into());
        self
    }

    pub fn mouse_pressed(&self, button: i32) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_down(&self, button: i32) -> bool {
        self.mouse_down.contains(&button)
    }

    pub fn mouse_released(&self, button: i32) -> bool {
        self.mouse_released.contains(&button)
    }
}
