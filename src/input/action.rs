/// Every action the keybinding table can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    PanModifier,
    PanFast,

    ZoomIn,
    ZoomOut,
    ZoomLevel5,
    ZoomLevel25,
    ZoomLevel50,
    ZoomLevel100,
    ZoomLevel200,
    ZoomLevel400,
    ZoomLevel1000,

    SelectUp,
    SelectDown,
    SelectLeft,
    SelectRight,
    SelectTop,
    SelectBottom,
    SelectAll,
    DeselectAll,
    SelectAddModifier,
    SelectRemoveModifier,

    MoveCardUp,
    MoveCardDown,
    MoveCardLeft,
    MoveCardRight,

    NewCheckbox,
    NewNumbered,
    NewNote,
    NewSound,
    NewImage,
    NewTimer,
    NewMap,
    NewSubpage,
    NewLink,
    NewTable,
    NewInternet,
    NewPreviousType,
    DeleteCards,

    Copy,
    Cut,
    Paste,
    PasteExternal,
    Undo,
    Redo,
    Save,
    SaveAs,
    Open,
    FocusOnCards,
    ReturnToOrigin,
    CollapseCard,
    ResetCardSize,
    LinkCards,
    UnlinkCards,

    CheckboxToggle,
    NumberedIncrement,
    NumberedDecrement,
    SoundPlay,
    SoundStopAll,
    SoundJumpForward,
    SoundJumpBackward,
    TimerStartStop,

    MapPointer,
    MapPencil,
    MapEraser,
    MapFill,
    MapLine,
    MapQuickLine,
    MapPalette,
    MapShiftLeft,
    MapShiftRight,

    TableAddRow,
    TableRemoveRow,
    TableAddColumn,
    TableRemoveColumn,

    SubpageOpen,
    SubpageClose,
    LinkActivate,
    FindNext,
    FindPrev,
}

const NAMES: &[(Action, &str)] = &[
    (Action::PanUp, "Pan Up"),
    (Action::PanDown, "Pan Down"),
    (Action::PanLeft, "Pan Left"),
    (Action::PanRight, "Pan Right"),
    (Action::PanModifier, "Pan Modifier"),
    (Action::PanFast, "Pan Fast"),
    (Action::ZoomIn, "Zoom In"),
    (Action::ZoomOut, "Zoom Out"),
    (Action::ZoomLevel5, "Zoom Level 5"),
    (Action::ZoomLevel25, "Zoom Level 25"),
    (Action::ZoomLevel50, "Zoom Level 50"),
    (Action::ZoomLevel100, "Zoom Level 100"),
    (Action::ZoomLevel200, "Zoom Level 200"),
    (Action::ZoomLevel400, "Zoom Level 400"),
    (Action::ZoomLevel1000, "Zoom Level 1000"),
    (Action::SelectUp, "Select Card Up"),
    (Action::SelectDown, "Select Card Down"),
    (Action::SelectLeft, "Select Card Left"),
    (Action::SelectRight, "Select Card Right"),
    (Action::SelectTop, "Select Top Of Stack"),
    (Action::SelectBottom, "Select Bottom Of Stack"),
    (Action::SelectAll, "Select All"),
    (Action::DeselectAll, "Deselect All"),
    (Action::SelectAddModifier, "Add To Selection"),
    (Action::SelectRemoveModifier, "Remove From Selection"),
    (Action::MoveCardUp, "Move Card Up"),
    (Action::MoveCardDown, "Move Card Down"),
    (Action::MoveCardLeft, "Move Card Left"),
    (Action::MoveCardRight, "Move Card Right"),
    (Action::NewCheckbox, "New Checkbox Card"),
    (Action::NewNumbered, "New Numbered Card"),
    (Action::NewNote, "New Note Card"),
    (Action::NewSound, "New Sound Card"),
    (Action::NewImage, "New Image Card"),
    (Action::NewTimer, "New Timer Card"),
    (Action::NewMap, "New Map Card"),
    (Action::NewSubpage, "New Sub-Page Card"),
    (Action::NewLink, "New Link Card"),
    (Action::NewTable, "New Table Card"),
    (Action::NewInternet, "New Internet Link Card"),
    (Action::NewPreviousType, "New Card Of Previous Type"),
    (Action::DeleteCards, "Delete Cards"),
    (Action::Copy, "Copy Cards"),
    (Action::Cut, "Cut Cards"),
    (Action::Paste, "Paste Cards"),
    (Action::PasteExternal, "Paste From Clipboard"),
    (Action::Undo, "Undo"),
    (Action::Redo, "Redo"),
    (Action::Save, "Save Plan"),
    (Action::SaveAs, "Save Plan As"),
    (Action::Open, "Open Plan"),
    (Action::FocusOnCards, "Focus On Cards"),
    (Action::ReturnToOrigin, "Return To Origin"),
    (Action::CollapseCard, "Collapse Card"),
    (Action::ResetCardSize, "Reset Card Size"),
    (Action::LinkCards, "Link Cards"),
    (Action::UnlinkCards, "Unlink Cards"),
    (Action::CheckboxToggle, "Toggle Checkbox"),
    (Action::NumberedIncrement, "Increment Numbered"),
    (Action::NumberedDecrement, "Decrement Numbered"),
    (Action::SoundPlay, "Play Sound"),
    (Action::SoundStopAll, "Stop All Sounds"),
    (Action::SoundJumpForward, "Sound Jump Forward"),
    (Action::SoundJumpBackward, "Sound Jump Backward"),
    (Action::TimerStartStop, "Start Stop Timer"),
    (Action::MapPointer, "Map Pointer Tool"),
    (Action::MapPencil, "Map Pencil Tool"),
    (Action::MapEraser, "Map Eraser Tool"),
    (Action::MapFill, "Map Fill Tool"),
    (Action::MapLine, "Map Line Tool"),
    (Action::MapQuickLine, "Map Quick Line"),
    (Action::MapPalette, "Map Next Palette Colour"),
    (Action::MapShiftLeft, "Map Shift Left"),
    (Action::MapShiftRight, "Map Shift Right"),
    (Action::TableAddRow, "Table Add Row"),
    (Action::TableRemoveRow, "Table Remove Row"),
    (Action::TableAddColumn, "Table Add Column"),
    (Action::TableRemoveColumn, "Table Remove Column"),
    (Action::SubpageOpen, "Open Sub-Page"),
    (Action::SubpageClose, "Close Sub-Page"),
    (Action::LinkActivate, "Activate Link"),
    (Action::FindNext, "Find Next"),
    (Action::FindPrev, "Find Previous"),
];

impl Action {
    pub fn all() -> impl Iterator<Item = Action> {
        NAMES.iter().map(|(action, _)| *action)
    }

    /// Name used in the `Keybindings` JSON object.
    pub fn as_name(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(action, _)| action == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(action, _)| *action)
    }

    /// Actions checked against held keys rather than key presses.
    pub fn is_held(&self) -> bool {
        matches!(
            self,
            Self::PanUp
                | Self::PanDown
                | Self::PanLeft
                | Self::PanRight
                | Self::PanModifier
                | Self::PanFast
                | Self::SelectAddModifier
                | Self::SelectRemoveModifier
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_a_unique_name() {
        let names: Vec<&str> = Action::all().map(|a| a.as_name()).collect();
        assert!(names.iter().all(|n| !n.is_empty()));
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn names_parse_back() {
        for action in Action::all() {
            assert_eq!(Action::from_name(action.as_name()), Some(action));
        }
        assert_eq!(Action::from_name("undo"), Some(Action::Undo));
        assert_eq!(Action::from_name("Make Coffee"), None);
    }
}
