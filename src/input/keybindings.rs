use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::InputFrame;
use super::action::Action;

// Key and mouse codes as reported by the window layer (raylib numbering).
pub const KEY_SPACE: i32 = 32;
pub const KEY_COMMA: i32 = 44;
pub const KEY_MINUS: i32 = 45;
pub const KEY_PERIOD: i32 = 46;
pub const KEY_EQUAL: i32 = 61;
pub const KEY_LEFT_BRACKET: i32 = 91;
pub const KEY_RIGHT_BRACKET: i32 = 93;
pub const KEY_ESCAPE: i32 = 256;
pub const KEY_ENTER: i32 = 257;
pub const KEY_TAB: i32 = 258;
pub const KEY_BACKSPACE: i32 = 259;
pub const KEY_DELETE: i32 = 261;
pub const KEY_RIGHT: i32 = 262;
pub const KEY_LEFT: i32 = 263;
pub const KEY_DOWN: i32 = 264;
pub const KEY_UP: i32 = 265;
pub const KEY_HOME: i32 = 268;
pub const KEY_F3: i32 = 292;
pub const KEY_LEFT_SHIFT: i32 = 340;
pub const KEY_LEFT_CONTROL: i32 = 341;
pub const KEY_LEFT_ALT: i32 = 342;
pub const KEY_LEFT_SUPER: i32 = 343;
pub const KEY_RIGHT_SHIFT: i32 = 344;
pub const KEY_RIGHT_CONTROL: i32 = 345;
pub const KEY_RIGHT_ALT: i32 = 346;
pub const KEY_RIGHT_SUPER: i32 = 347;

pub const MOUSE_LEFT: i32 = 0;
pub const MOUSE_RIGHT: i32 = 1;
pub const MOUSE_MIDDLE: i32 = 2;

/// Letter and digit keys use their ASCII code.
pub const fn key(c: char) -> i32 {
    c as i32
}

/// Left and right variants of a modifier count as the same modifier.
fn modifier_group(code: i32) -> Option<i32> {
    match code {
        KEY_LEFT_SHIFT | KEY_RIGHT_SHIFT => Some(KEY_LEFT_SHIFT),
        KEY_LEFT_CONTROL | KEY_RIGHT_CONTROL => Some(KEY_LEFT_CONTROL),
        KEY_LEFT_ALT | KEY_RIGHT_ALT => Some(KEY_LEFT_ALT),
        KEY_LEFT_SUPER | KEY_RIGHT_SUPER => Some(KEY_LEFT_SUPER),
        _ => None,
    }
}

/// One trigger: a key or a mouse button plus the modifiers held with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Key {
        key: i32,
        #[serde(default)]
        mods: Vec<i32>,
    },
    Mouse {
        mouse: i32,
        #[serde(default)]
        mods: Vec<i32>,
    },
}

impl Binding {
    pub fn key(key: i32, mods: &[i32]) -> Self {
        Self::Key {
            key,
            mods: mods.to_vec(),
        }
    }

    pub fn mouse(mouse: i32, mods: &[i32]) -> Self {
        Self::Mouse {
            mouse,
            mods: mods.to_vec(),
        }
    }

    pub fn mods(&self) -> &[i32] {
        match self {
            Self::Key { mods, .. } | Self::Mouse { mods, .. } => mods,
        }
    }

    fn wanted_groups(&self) -> Vec<i32> {
        let mut groups: Vec<i32> = self.mods().iter().filter_map(|m| modifier_group(*m)).collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Exactly the bound modifiers are held, ignoring the bound key itself.
    fn mods_match(&self, frame: &InputFrame) -> bool {
        let own = match self {
            Self::Key { key, .. } => modifier_group(*key),
            Self::Mouse { .. } => None,
        };
        let mut held: Vec<i32> = frame
            .keys_down
            .iter()
            .filter_map(|k| modifier_group(*k))
            .filter(|g| Some(*g) != own)
            .collect();
        held.sort();
        held.dedup();
        held == self.wanted_groups()
    }

    /// Fired this frame.
    pub fn pressed(&self, frame: &InputFrame) -> bool {
        let edge = match self {
            Self::Key { key, .. } => frame.keys_pressed.contains(key),
            Self::Mouse { mouse, .. } => frame.mouse_pressed.contains(mouse),
        };
        edge && self.mods_match(frame)
    }

    /// Currently down, with at least the bound modifiers.
    pub fn held(&self, frame: &InputFrame) -> bool {
        let down = match self {
            Self::Key { key, .. } => frame.keys_down.contains(key),
            Self::Mouse { mouse, .. } => frame.mouse_down.contains(mouse),
        };
        down && self.mods().iter().all(|m| frame.keys_down.contains(m))
    }
}

/// Action name to binding, as stored under `Keybindings` in plan and
/// settings files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keybindings {
    bindings: BTreeMap<String, Binding>,
}

impl Default for Keybindings {
    fn default() -> Self {
        let shift = &[KEY_LEFT_SHIFT][..];
        let ctrl = &[KEY_LEFT_CONTROL][..];
        let alt = &[KEY_LEFT_ALT][..];
        let ctrl_shift = &[KEY_LEFT_CONTROL, KEY_LEFT_SHIFT][..];
        let none: &[i32] = &[];

        let table: Vec<(Action, Binding)> = vec![
            (Action::PanUp, Binding::key(key('W'), none)),
            (Action::PanDown, Binding::key(key('S'), none)),
            (Action::PanLeft, Binding::key(key('A'), none)),
            (Action::PanRight, Binding::key(key('D'), none)),
            (Action::PanModifier, Binding::mouse(MOUSE_MIDDLE, none)),
            (Action::PanFast, Binding::key(KEY_LEFT_SHIFT, none)),
            (Action::ZoomIn, Binding::key(KEY_EQUAL, none)),
            (Action::ZoomOut, Binding::key(KEY_MINUS, none)),
            (Action::ZoomLevel5, Binding::key(key('1'), ctrl)),
            (Action::ZoomLevel25, Binding::key(key('2'), ctrl)),
            (Action::ZoomLevel50, Binding::key(key('3'), ctrl)),
            (Action::ZoomLevel100, Binding::key(key('4'), ctrl)),
            (Action::ZoomLevel200, Binding::key(key('5'), ctrl)),
            (Action::ZoomLevel400, Binding::key(key('6'), ctrl)),
            (Action::ZoomLevel1000, Binding::key(key('7'), ctrl)),
            (Action::SelectUp, Binding::key(KEY_UP, none)),
            (Action::SelectDown, Binding::key(KEY_DOWN, none)),
            (Action::SelectLeft, Binding::key(KEY_LEFT, none)),
            (Action::SelectRight, Binding::key(KEY_RIGHT, none)),
            (Action::SelectTop, Binding::key(KEY_UP, shift)),
            (Action::SelectBottom, Binding::key(KEY_DOWN, shift)),
            (Action::SelectAll, Binding::key(key('A'), ctrl)),
            (Action::DeselectAll, Binding::key(KEY_ESCAPE, none)),
            (Action::SelectAddModifier, Binding::key(KEY_LEFT_SHIFT, none)),
            (Action::SelectRemoveModifier, Binding::key(KEY_LEFT_ALT, none)),
            (Action::MoveCardUp, Binding::key(KEY_UP, ctrl)),
            (Action::MoveCardDown, Binding::key(KEY_DOWN, ctrl)),
            (Action::MoveCardLeft, Binding::key(KEY_LEFT, ctrl)),
            (Action::MoveCardRight, Binding::key(KEY_RIGHT, ctrl)),
            (Action::NewCheckbox, Binding::key(key('1'), none)),
            (Action::NewNumbered, Binding::key(key('2'), none)),
            (Action::NewNote, Binding::key(key('3'), none)),
            (Action::NewSound, Binding::key(key('4'), none)),
            (Action::NewImage, Binding::key(key('5'), none)),
            (Action::NewTimer, Binding::key(key('6'), none)),
            (Action::NewMap, Binding::key(key('7'), none)),
            (Action::NewSubpage, Binding::key(key('8'), none)),
            (Action::NewLink, Binding::key(key('9'), none)),
            (Action::NewTable, Binding::key(key('0'), none)),
            (Action::NewInternet, Binding::key(key('9'), shift)),
            (Action::NewPreviousType, Binding::key(KEY_ENTER, none)),
            (Action::DeleteCards, Binding::key(KEY_DELETE, none)),
            (Action::Copy, Binding::key(key('C'), ctrl)),
            (Action::Cut, Binding::key(key('X'), ctrl)),
            (Action::Paste, Binding::key(key('V'), ctrl)),
            (Action::PasteExternal, Binding::key(key('V'), ctrl_shift)),
            (Action::Undo, Binding::key(key('Z'), ctrl)),
            (Action::Redo, Binding::key(key('Z'), ctrl_shift)),
            (Action::Save, Binding::key(key('S'), ctrl)),
            (Action::SaveAs, Binding::key(key('S'), ctrl_shift)),
            (Action::Open, Binding::key(key('O'), ctrl)),
            (Action::FocusOnCards, Binding::key(key('F'), none)),
            (Action::ReturnToOrigin, Binding::key(KEY_HOME, none)),
            (Action::CollapseCard, Binding::key(KEY_LEFT_BRACKET, none)),
            (Action::ResetCardSize, Binding::key(KEY_RIGHT_BRACKET, none)),
            (Action::LinkCards, Binding::key(key('L'), ctrl)),
            (Action::UnlinkCards, Binding::key(key('L'), ctrl_shift)),
            (Action::CheckboxToggle, Binding::key(KEY_SPACE, none)),
            (Action::NumberedIncrement, Binding::key(KEY_PERIOD, none)),
            (Action::NumberedDecrement, Binding::key(KEY_COMMA, none)),
            (Action::SoundPlay, Binding::key(key('P'), none)),
            (Action::SoundStopAll, Binding::key(key('P'), shift)),
            (Action::SoundJumpForward, Binding::key(KEY_RIGHT_BRACKET, ctrl)),
            (Action::SoundJumpBackward, Binding::key(KEY_LEFT_BRACKET, ctrl)),
            (Action::TimerStartStop, Binding::key(key('T'), none)),
            (Action::MapPointer, Binding::key(key('Q'), none)),
            (Action::MapPencil, Binding::key(key('E'), none)),
            (Action::MapEraser, Binding::key(key('R'), none)),
            (Action::MapFill, Binding::key(key('G'), none)),
            (Action::MapLine, Binding::key(key('L'), none)),
            (Action::MapQuickLine, Binding::mouse(MOUSE_LEFT, shift)),
            (Action::MapPalette, Binding::key(KEY_TAB, none)),
            (Action::MapShiftLeft, Binding::key(KEY_LEFT, alt)),
            (Action::MapShiftRight, Binding::key(KEY_RIGHT, alt)),
            (Action::TableAddRow, Binding::key(KEY_ENTER, ctrl)),
            (Action::TableRemoveRow, Binding::key(KEY_BACKSPACE, ctrl)),
            (Action::TableAddColumn, Binding::key(KEY_ENTER, ctrl_shift)),
            (Action::TableRemoveColumn, Binding::key(KEY_BACKSPACE, ctrl_shift)),
            (Action::SubpageOpen, Binding::key(KEY_ENTER, alt)),
            (Action::SubpageClose, Binding::key(KEY_BACKSPACE, none)),
            (Action::LinkActivate, Binding::key(key('O'), none)),
            (Action::FindNext, Binding::key(KEY_F3, none)),
            (Action::FindPrev, Binding::key(KEY_F3, shift)),
        ];

        Self {
            bindings: table
                .into_iter()
                .map(|(action, binding)| (action.as_name().to_string(), binding))
                .collect(),
        }
    }
}

impl Keybindings {
    pub fn get(&self, action: Action) -> Option<&Binding> {
        self.bindings.get(action.as_name())
    }

    pub fn set(&mut self, action: Action, binding: Binding) {
        self.bindings.insert(action.as_name().to_string(), binding);
    }

    /// Drop unknown action names and fill unbound actions from the default
    /// table.
    pub fn with_defaults(mut self) -> Self {
        self.bindings.retain(|name, _| {
            let known = Action::from_name(name).is_some();
            if !known {
                log::warn!("Ignoring keybinding for unknown action '{}'", name);
            }
            known
        });
        let defaults = Self::default();
        for action in Action::all() {
            if self.get(action).is_none() {
                if let Some(binding) = defaults.get(action) {
                    self.set(action, binding.clone());
                }
            }
        }
        self
    }

    pub fn is_pressed(&self, action: Action, frame: &InputFrame) -> bool {
        self.get(action).is_some_and(|b| b.pressed(frame))
    }

    pub fn is_held(&self, action: Action, frame: &InputFrame) -> bool {
        self.get(action).is_some_and(|b| b.held(frame))
    }

    /// Press-style actions fired this frame, followed by the frame's
    /// explicit actions.
    pub fn triggered(&self, frame: &InputFrame) -> Vec<Action> {
        let mut out: Vec<Action> = Action::all()
            .filter(|a| !a.is_held() && self.is_pressed(*a, frame))
            .collect();
        out.extend(frame.actions.iter().copied());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pressed: &[i32], down: &[i32]) -> InputFrame {
        InputFrame {
            keys_pressed: pressed.to_vec(),
            keys_down: down.to_vec(),
            ..InputFrame::default()
        }
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let kb = Keybindings::default();
        let undo = frame(&[key('Z')], &[KEY_LEFT_CONTROL, key('Z')]);
        assert_eq!(kb.triggered(&undo), vec![Action::Undo]);

        let redo = frame(&[key('Z')], &[KEY_RIGHT_CONTROL, KEY_LEFT_SHIFT, key('Z')]);
        assert_eq!(kb.triggered(&redo), vec![Action::Redo]);
    }

    #[test]
    fn held_actions_are_not_triggered() {
        let kb = Keybindings::default();
        let f = frame(&[key('W')], &[key('W'), KEY_LEFT_SHIFT]);
        assert!(kb.triggered(&f).is_empty());
        assert!(kb.is_held(Action::PanUp, &f));
        assert!(kb.is_held(Action::PanFast, &f));
    }

    #[test]
    fn json_forms() {
        let json = r#"{"Undo":{"key":90,"mods":[341]},"Pan Modifier":{"mouse":2,"mods":[]},"Nope":{"key":1}}"#;
        let kb: Keybindings = serde_json::from_str(json).unwrap();
        assert_eq!(kb.get(Action::PanModifier), Some(&Binding::mouse(MOUSE_MIDDLE, &[])));

        let kb = kb.with_defaults();
        assert!(kb.get(Action::Redo).is_some());
        assert!(!serde_json::to_string(&kb).unwrap().contains("Nope"));
        assert_eq!(
            serde_json::to_string(&Binding::key(90, &[341])).unwrap(),
            r#"{"key":90,"mods":[341]}"#
        );
    }

    #[test]
    fn default_table_covers_every_action() {
        let kb = Keybindings::default();
        for action in Action::all() {
            assert!(kb.get(action).is_some(), "{} unbound", action);
        }
    }
}
