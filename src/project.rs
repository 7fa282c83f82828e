//! The project: every board of a plan plus the state shared between them,
//! and the per-frame phase driver.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use glam::Vec2;

use crate::camera::Camera;
use crate::core::board::{Board, StackStep};
use crate::core::card::{Card, CardId, CardIds};
use crate::core::contents::{CardKind, Contents, LinkTarget, MAP_CELLS_PER_GRID};
use crate::core::copy_buffer::CopyBuffer;
use crate::core::geometry::Rect;
use crate::core::map::{MapTool, cycle_color};
use crate::core::message_log::MessageLog;
use crate::core::numbering;
use crate::core::resource::{self, ResourceKind};
use crate::core::table::TableData;
use crate::core::undo::UndoHistory;
use crate::error::PlanResult;
use crate::input::keybindings::MOUSE_LEFT;
use crate::input::{Action, InputFrame, Keybindings};
use crate::message::{Message, Notification};
use crate::plan::{self, PLAN_VERSION, PlanFile, PlanSettings, convert};

/// Table name column width, in grid cells.
const TABLE_NAME_CELLS: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Cards { last: Vec2 },
    Marquee { start: Vec2 },
}

#[derive(Debug)]
pub struct Project {
    pub boards: Vec<Board>,
    pub current_board: usize,
    pub settings: PlanSettings,
    pub keybindings: Keybindings,
    pub history: UndoHistory,
    pub copy_buffer: CopyBuffer,
    pub camera: Camera,
    pub log: MessageLog,
    pub path: Option<PathBuf>,
    pub map_tool: MapTool,
    pub map_color: i32,
    ids: CardIds,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    /// Boards left through a subpage, with the subpage card.
    board_stack: Vec<(usize, CardId)>,
    search: String,
    search_hit: Option<usize>,
    drag: Option<Drag>,
    last_mouse: Vec2,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        let settings = PlanSettings::default();
        Self {
            boards: vec![Board::new("Board 1", settings.grid())],
            current_board: 0,
            settings,
            keybindings: Keybindings::default(),
            history: UndoHistory::new(),
            copy_buffer: CopyBuffer::default(),
            camera: Camera::default(),
            log: MessageLog::default(),
            path: None,
            map_tool: MapTool::default(),
            map_color: 1,
            ids: CardIds::default(),
            messages: Vec::new(),
            notifications: Vec::new(),
            board_stack: Vec::new(),
            search: String::new(),
            search_hit: None,
            drag: None,
            last_mouse: Vec2::ZERO,
        }
    }

    /// Build a project from a parsed plan. Resources that fail to load are
    /// flagged broken and logged; the plan itself is not rejected for them.
    pub fn from_plan(plan: PlanFile, path: Option<PathBuf>) -> Self {
        let mut project = Self::new();
        project.settings = plan.settings;
        project.keybindings = plan.keybindings.unwrap_or_default().with_defaults();
        let base = path.as_deref().and_then(Path::parent).map(Path::to_path_buf);
        let boards = convert::records_to_boards(
            &plan.boards,
            project.settings.grid(),
            &mut project.ids,
            base.as_deref(),
            &mut project.log,
        );
        if !boards.is_empty() {
            project.boards = boards;
        }
        project.path = path;

        let now = chrono::Local::now().naive_local();
        project.resolve();
        project.aggregate(now);
        project.notifications.clear();
        project.history.seed(&project.boards);
        project
    }

    /// Load a plan file. On error nothing is touched; the caller keeps its
    /// previous project.
    pub fn load(path: &Path) -> PlanResult<Self> {
        let plan = plan::read_plan(path)?;
        let project = Self::from_plan(plan, Some(path.to_path_buf()));
        log::info!(
            "Loaded {} ({} boards, {} cards)",
            path.display(),
            project.boards.len(),
            project.card_count()
        );
        Ok(project)
    }

    pub fn to_plan_file(&self) -> PlanFile {
        PlanFile {
            version: PLAN_VERSION,
            boards: convert::boards_to_records(&self.boards, self.settings.save_sounds_playing),
            settings: self.settings.clone(),
            keybindings: Some(self.keybindings.clone()),
        }
    }

    /// Save to the current path, or ask for one.
    pub fn save(&mut self) -> PlanResult<()> {
        match self.path.clone() {
            Some(path) => self.save_as(&path),
            None => {
                self.notifications.push(Notification::RequestSavePath);
                Ok(())
            }
        }
    }

    /// Save to `path`. A failure leaves the file untouched and raises the
    /// save-failed modal.
    pub fn save_as(&mut self, path: &Path) -> PlanResult<()> {
        match plan::write_plan(path, &self.to_plan_file()) {
            Ok(()) => {
                self.path = Some(path.to_path_buf());
                self.log.info(format!("Saved {}", path.display()));
                Ok(())
            }
            Err(e) => {
                self.log.error(format!("Could not save {}: {}", path.display(), e));
                self.notifications.push(Notification::SaveFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn grid(&self) -> f32 {
        self.settings.grid()
    }

    pub fn board(&self) -> &Board {
        &self.boards[self.current_board]
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.boards[self.current_board]
    }

    pub fn card_count(&self) -> usize {
        self.boards.iter().map(Board::len).sum()
    }

    /// Requests posted since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn queue(&mut self, message: Message) {
        self.messages.push(message);
    }

    // Frame

    /// Run one frame: input, broadcast, resolve, aggregate, commit.
    pub fn update(&mut self, frame: &InputFrame) {
        self.input(frame);
        self.broadcast();
        self.resolve();
        self.aggregate(frame.now);
        self.history.commit();
    }

    fn input(&mut self, frame: &InputFrame) {
        for board in &mut self.boards {
            board.tick(frame.dt);
        }
        if let Some(query) = &frame.search {
            if *query != self.search {
                self.search = query.clone();
                self.search_hit = None;
            }
        }

        for action in self.keybindings.triggered(frame) {
            self.handle_action(action, frame);
        }
        self.handle_mouse(frame);
        self.handle_camera(frame);
        self.last_mouse = frame.mouse_world;
    }

    /// Deliver queued messages to every card of every board.
    pub fn broadcast(&mut self) {
        let messages = std::mem::take(&mut self.messages);
        for message in &messages {
            for board in &mut self.boards {
                board.broadcast(message, &mut self.history);
            }
        }
    }

    /// Resolve phase. A board that fails keeps its previous links.
    pub fn resolve(&mut self) {
        for (index, board) in self.boards.iter_mut().enumerate() {
            match board.resolve(index) {
                Ok(messages) => self.messages.extend(messages),
                Err(e) => {
                    log::error!("Resolve aborted on board {} ({}): {}", index, board.name, e);
                    self.log.error(format!("Board {}: {}", board.name, e));
                }
            }
        }
    }

    pub fn aggregate(&mut self, now: NaiveDateTime) {
        for board in &mut self.boards {
            let notes = board.aggregate(now, &mut self.history);
            for note in &notes {
                if let Notification::TimerElapsed { name, .. } = note {
                    self.log.info(format!("Timer {} elapsed", name));
                }
            }
            self.notifications.extend(notes);
        }
    }

    // Card operations

    pub fn create_card(&mut self, position: Vec2, kind: CardKind) -> CardId {
        let board = &mut self.boards[self.current_board];
        let id = board.create_card(&mut self.ids, &mut self.history, position, kind);
        self.messages.push(Message::Select(id));
        id
    }

    pub fn delete_selected(&mut self) -> usize {
        let board = &mut self.boards[self.current_board];
        board.delete_selected(&mut self.history)
    }

    /// Apply an edit to one card on the current board and capture it.
    pub fn edit_card(&mut self, id: CardId, edit: impl FnOnce(&mut Card, f32)) -> bool {
        let board = &mut self.boards[self.current_board];
        board.edit_card(&mut self.history, id, edit)
    }

    pub fn edit_selected(&mut self, edit: impl FnMut(&mut Card, f32)) -> usize {
        let board = &mut self.boards[self.current_board];
        board.edit_selected(&mut self.history, edit)
    }

    /// Resize a card; sizes under one grid cell are rejected and logged.
    pub fn resize_card(&mut self, id: CardId, size: Vec2) {
        let mut outcome = Ok(());
        self.edit_card(id, |card, g| outcome = card.resize(size, g));
        if let Err(e) = outcome {
            log::warn!("{}", e);
        }
    }

    /// Reorder a table card's rows; completions travel with their row.
    pub fn move_table_row(&mut self, id: CardId, from: usize, to: usize) -> bool {
        let mut moved = false;
        self.edit_card(id, |card, _| {
            if let Contents::Table(table) = &mut card.contents {
                moved = table.move_row(from, to);
            }
        });
        moved
    }

    pub fn move_table_column(&mut self, id: CardId, from: usize, to: usize) -> bool {
        let mut moved = false;
        self.edit_card(id, |card, _| {
            if let Contents::Table(table) = &mut card.contents {
                moved = table.move_column(from, to);
            }
        });
        moved
    }

    pub fn copy(&mut self) {
        let board = self.board();
        let selected = board.selected();
        let id = board.id;
        self.copy_buffer.fill_live(id, &selected, false);
        log::debug!("Copied {} card(s)", selected.len());
    }

    pub fn cut(&mut self) {
        let board = self.board();
        let selected = board.selected();
        let id = board.id;
        self.copy_buffer.fill_live(id, &selected, true);
        log::debug!("Cut {} card(s)", selected.len());
    }

    /// Paste the buffer so its centroid lands on `at`. An empty buffer does
    /// nothing. After a cut the originals are deleted in the same frame.
    pub fn paste(&mut self, at: Vec2) -> Vec<CardId> {
        let records = self.copy_buffer.records(&self.boards);
        if records.is_empty() {
            return Vec::new();
        }
        let board = &mut self.boards[self.current_board];
        let pasted = board.paste_records(&mut self.ids, &mut self.history, &records, at);
        self.messages.push(Message::Deselect(None));
        self.messages.extend(pasted.iter().map(|id| Message::Select(*id)));

        if self.copy_buffer.cut {
            for (board_id, card) in self.copy_buffer.live_sources() {
                if let Some(source) = self.boards.iter_mut().find(|b| b.id == board_id) {
                    source.delete_cards(&mut self.history, &[card]);
                    self.messages.push(Message::Delete(card));
                }
            }
            // The originals are gone; later pastes clone the same snapshot.
            self.copy_buffer.fill_serialized(records);
        }
        pasted
    }

    /// Paste clipboard text: a recognised image or sound path becomes a
    /// resource card, anything else a note.
    pub fn paste_external(&mut self, text: &str, at: Vec2) -> Option<CardId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let kind = match resource::classify(text) {
            Some(ResourceKind::Image) => CardKind::Image,
            Some(ResourceKind::Sound) => CardKind::Sound,
            None => CardKind::Note,
        };
        self.board_mut().deselect_all();
        let id = self.create_card(at, kind);

        let mut broken = None;
        let owned = text.to_string();
        self.edit_card(id, |card, g| {
            match card.contents.resource_mut() {
                Some(res) => {
                    res.path = owned.clone();
                    if let Err(e) = resource::probe(&owned) {
                        res.broken = true;
                        broken = Some(e);
                    }
                }
                None => card.description = owned.clone(),
            }
            card.reset_size(g);
        });
        if let Some(e) = broken {
            self.log.error(format!("Could not load {}: {}", text, e));
        }
        Some(id)
    }

    /// Centre the camera on the cards and tell the renderer.
    pub fn focus_on(&mut self, ids: &[CardId]) {
        if let Some(point) = self.board().focus_point(ids) {
            self.camera.focus(point);
            self.notifications.push(Notification::CameraTarget(point));
        }
    }

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo(&mut self.boards);
        if done {
            log::debug!("Undo to frame {}", self.history.index());
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo(&mut self.boards);
        if done {
            log::debug!("Redo to frame {}", self.history.index());
        }
        done
    }

    // Boards

    pub fn board_index(&self, name: &str) -> Option<usize> {
        self.boards.iter().position(|b| b.name == name)
    }

    pub fn add_board(&mut self, name: impl Into<String>) -> usize {
        self.boards.push(Board::new(name, self.grid()));
        self.boards.len() - 1
    }

    pub fn switch_board(&mut self, index: usize) {
        if index < self.boards.len() && index != self.current_board {
            self.drag = None;
            self.current_board = index;
            self.search_hit = None;
        }
    }

    /// Board holding a card.
    pub fn locate(&self, id: CardId) -> Option<usize> {
        self.boards.iter().position(|b| b.contains(id) && !b.is_pending(id))
    }

    /// Enter the board named by the selected subpage card, creating it when
    /// needed.
    pub fn open_subpage(&mut self) -> bool {
        let board = self.board();
        let Some(card) = board
            .selected()
            .into_iter()
            .filter_map(|id| board.card(id))
            .find(|c| c.kind() == CardKind::Subpage)
        else {
            return false;
        };
        let card_id = card.id;
        let mut name = match &card.contents {
            Contents::Subpage { board } => board.clone(),
            _ => String::new(),
        };
        if name.trim().is_empty() {
            name = if card.description.trim().is_empty() {
                format!("Sub-page {}", card_id)
            } else {
                card.description.trim().to_string()
            };
            let stored = name.clone();
            self.edit_card(card_id, |c, _| c.contents = Contents::Subpage { board: stored });
        }

        let target = match self.board_index(&name) {
            Some(i) => i,
            None => self.add_board(name.clone()),
        };
        self.board_stack.push((self.current_board, card_id));
        self.messages.push(Message::Open(card_id));
        self.switch_board(target);
        log::debug!("Opened sub-page {}", name);
        true
    }

    pub fn close_subpage(&mut self) -> bool {
        let Some((previous, card)) = self.board_stack.pop() else {
            return false;
        };
        self.messages.push(Message::Close(card));
        self.switch_board(previous);
        true
    }

    // Links

    /// Point every selected link card at the first selected non-link card.
    pub fn link_selected(&mut self) -> usize {
        let board = self.board();
        let selected = board.selected();
        let Some(target) = selected
            .iter()
            .copied()
            .find(|id| board.card(*id).is_some_and(|c| c.kind() != CardKind::Link))
        else {
            return 0;
        };
        let links: Vec<CardId> = selected
            .into_iter()
            .filter(|id| board.card(*id).is_some_and(|c| c.kind() == CardKind::Link))
            .collect();
        for id in &links {
            self.edit_card(*id, |c, _| {
                c.contents = Contents::Link {
                    target: Some(LinkTarget::Card(target)),
                }
            });
        }
        links.len()
    }

    pub fn unlink_selected(&mut self) -> usize {
        self.edit_selected(|card, _| {
            if let Contents::Link { target } = &mut card.contents {
                *target = None;
            }
        })
    }

    /// Follow the first selected link card.
    pub fn activate_link(&mut self) -> bool {
        let board = self.board();
        let target = board
            .selected()
            .into_iter()
            .filter_map(|id| board.card(id))
            .find_map(|c| match &c.contents {
                Contents::Link { target: Some(t) } => Some(t.clone()),
                _ => None,
            });
        match target {
            Some(LinkTarget::Card(id)) => match self.locate(id) {
                Some(index) => {
                    self.switch_board(index);
                    self.board_mut().select_only(id);
                    self.focus_on(&[id]);
                    true
                }
                None => {
                    self.log.warn(format!("Link target card {} no longer exists", id));
                    false
                }
            },
            Some(LinkTarget::Url(url)) => {
                self.notifications.push(Notification::OpenUrl(url));
                true
            }
            None => false,
        }
    }

    // Find

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.search_hit = None;
    }

    /// Select and focus the next (or previous) card matching the search.
    pub fn find(&mut self, forward: bool) -> Option<CardId> {
        let hits = self.board().find(&self.search);
        if hits.is_empty() {
            self.search_hit = None;
            return None;
        }
        let n = hits.len();
        let next = match (self.search_hit, forward) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        };
        self.search_hit = Some(next);
        let id = hits[next];
        self.board_mut().select_only(id);
        self.focus_on(&[id]);
        Some(id)
    }

    /// Rendered numbering prefix for a card under the plan's settings.
    pub fn numbering(&self, card: &Card) -> String {
        numbering::render(
            &card.stack.prefix,
            self.settings.numbering_sequence,
            self.settings.numbering_ignore_top_level,
        )
    }

    // Input

    fn handle_action(&mut self, action: Action, frame: &InputFrame) {
        let mouse = frame.mouse_world;
        match action {
            Action::ZoomIn => self.camera.zoom_in(),
            Action::ZoomOut => self.camera.zoom_out(),
            Action::ZoomLevel5 => self.camera.zoom_percent(5),
            Action::ZoomLevel25 => self.camera.zoom_percent(25),
            Action::ZoomLevel50 => self.camera.zoom_percent(50),
            Action::ZoomLevel100 => self.camera.zoom_percent(100),
            Action::ZoomLevel200 => self.camera.zoom_percent(200),
            Action::ZoomLevel400 => self.camera.zoom_percent(400),
            Action::ZoomLevel1000 => self.camera.zoom_percent(1000),

            Action::SelectUp => self.step_selection(StackStep::Up, frame),
            Action::SelectDown => self.step_selection(StackStep::Down, frame),
            Action::SelectLeft => self.step_selection(StackStep::Left, frame),
            Action::SelectRight => self.step_selection(StackStep::Right, frame),
            Action::SelectTop => self.step_selection(StackStep::Top, frame),
            Action::SelectBottom => self.step_selection(StackStep::Bottom, frame),
            Action::SelectAll => self.board_mut().select_all(),
            Action::DeselectAll => {
                self.board_mut().deselect_all();
                self.messages.push(Message::Deselect(None));
            }

            Action::MoveCardUp => self.move_selected((0, -1)),
            Action::MoveCardDown => self.move_selected((0, 1)),
            Action::MoveCardLeft => self.move_selected((-1, 0)),
            Action::MoveCardRight => self.move_selected((1, 0)),

            Action::NewCheckbox
            | Action::NewNumbered
            | Action::NewNote
            | Action::NewSound
            | Action::NewImage
            | Action::NewTimer
            | Action::NewMap
            | Action::NewSubpage
            | Action::NewLink
            | Action::NewTable => {
                if let Some(kind) = new_card_kind(action) {
                    self.create_card(mouse, kind);
                }
            }
            Action::NewInternet => self.new_internet_link(frame),
            Action::NewPreviousType => {
                let kind = self.board().last_kind;
                self.create_card(mouse, kind);
            }
            Action::DeleteCards => {
                let n = self.delete_selected();
                log::debug!("Deleted {} card(s)", n);
            }

            Action::Copy => self.copy(),
            Action::Cut => self.cut(),
            Action::Paste => {
                self.paste(mouse);
            }
            Action::PasteExternal => {
                if let Some(text) = frame.clipboard.clone() {
                    self.paste_external(&text, mouse);
                }
            }
            Action::Undo => {
                self.undo();
            }
            Action::Redo => {
                self.redo();
            }
            Action::Save => {
                if let Err(e) = self.save() {
                    log::error!("Save failed: {}", e);
                }
            }
            Action::SaveAs => self.notifications.push(Notification::RequestSavePath),
            Action::Open => self.notifications.push(Notification::RequestOpenPath),
            Action::FocusOnCards => {
                let mut ids = self.board().selected();
                if ids.is_empty() {
                    ids = self.board().cards.iter().map(|c| c.id).collect();
                }
                self.focus_on(&ids);
            }
            Action::ReturnToOrigin => {
                self.camera.return_to_origin();
                self.notifications.push(Notification::CameraTarget(Vec2::ZERO));
            }
            Action::CollapseCard => {
                self.edit_selected(|card, g| card.collapse(g));
            }
            Action::ResetCardSize => {
                self.edit_selected(|card, g| card.reset_size(g));
            }
            Action::LinkCards => {
                self.link_selected();
            }
            Action::UnlinkCards => {
                self.unlink_selected();
            }

            Action::CheckboxToggle => {
                self.edit_selected(|card, _| {
                    if let Contents::Checkbox { checked } = &mut card.contents {
                        *checked = !*checked;
                    }
                });
            }
            Action::NumberedIncrement => self.step_progression(1),
            Action::NumberedDecrement => self.step_progression(-1),
            Action::SoundPlay => self.toggle_sounds(),
            Action::SoundStopAll => self.stop_all_sounds(),
            Action::SoundJumpForward => self.jump_sounds(1.0),
            Action::SoundJumpBackward => self.jump_sounds(-1.0),
            Action::TimerStartStop => self.toggle_timers(),

            Action::MapPointer => self.map_tool = MapTool::Pointer,
            Action::MapPencil => self.map_tool = MapTool::Pencil,
            Action::MapEraser => self.map_tool = MapTool::Eraser,
            Action::MapFill => self.map_tool = MapTool::Fill,
            Action::MapLine => self.map_tool = MapTool::Line,
            Action::MapQuickLine => {
                self.paint_map(mouse, MapTool::QuickLine);
            }
            Action::MapPalette => self.map_color = cycle_color(self.map_color, 1),
            Action::MapShiftLeft => self.shift_maps(-1),
            Action::MapShiftRight => self.shift_maps(1),

            Action::TableAddRow => self.edit_tables(|t| {
                let name = format!("Row {}", t.row_count() + 1);
                t.add_row(name);
            }),
            Action::TableRemoveRow => self.edit_tables(|t| {
                t.remove_row();
            }),
            Action::TableAddColumn => self.edit_tables(|t| {
                let name = format!("Column {}", t.column_count() + 1);
                t.add_column(name);
            }),
            Action::TableRemoveColumn => self.edit_tables(|t| {
                t.remove_column();
            }),

            Action::SubpageOpen => {
                self.open_subpage();
            }
            Action::SubpageClose => {
                self.close_subpage();
            }
            Action::LinkActivate => {
                self.activate_link();
            }
            Action::FindNext => {
                self.find(true);
            }
            Action::FindPrev => {
                self.find(false);
            }

            Action::PanUp
            | Action::PanDown
            | Action::PanLeft
            | Action::PanRight
            | Action::PanModifier
            | Action::PanFast
            | Action::SelectAddModifier
            | Action::SelectRemoveModifier => {}
        }
    }

    fn step_selection(&mut self, step: StackStep, frame: &InputFrame) {
        let additive = self.keybindings.is_held(Action::SelectAddModifier, frame);
        let board = self.board();
        let Some(from) = board.selected().first().copied() else {
            return;
        };
        let Some(to) = board.navigate(from, step) else {
            return;
        };
        if additive {
            self.board_mut().set_selected(to, true);
        } else {
            self.board_mut().select_only(to);
        }
        self.messages.push(Message::Select(to));
    }

    fn move_selected(&mut self, step: (i32, i32)) {
        let board = &mut self.boards[self.current_board];
        board.move_selected(&mut self.history, step);
    }

    fn new_internet_link(&mut self, frame: &InputFrame) {
        let url = frame
            .clipboard
            .as_deref()
            .map(str::trim)
            .filter(|t| t.starts_with("http://") || t.starts_with("https://"))
            .map(str::to_string);
        let id = self.create_card(frame.mouse_world, CardKind::Link);
        if let Some(url) = url {
            self.edit_card(id, |card, _| {
                card.description = url.clone();
                card.contents = Contents::Link {
                    target: Some(LinkTarget::Url(url)),
                };
            });
        }
    }

    fn step_progression(&mut self, step: i32) {
        self.edit_selected(|card, _| {
            if let Contents::Progression { current, max } = &mut card.contents {
                *current = (*current + step).clamp(0, (*max).max(0));
            }
        });
    }

    fn toggle_sounds(&mut self) {
        for card in self.boards[self.current_board].cards.iter_mut().filter(|c| c.selected) {
            if let Contents::Sound(sound) = &mut card.contents {
                let playing = !sound.playing;
                sound.set_playing(playing);
            }
        }
    }

    fn stop_all_sounds(&mut self) {
        for card in self.boards.iter_mut().flat_map(|b| b.cards.iter_mut()) {
            if let Contents::Sound(sound) = &mut card.contents {
                sound.set_playing(false);
            }
        }
    }

    fn jump_sounds(&mut self, seconds: f64) {
        for card in self.board().cards.iter().filter(|c| c.selected) {
            if let Contents::Sound(sound) = &card.contents {
                sound.jump(seconds);
            }
        }
    }

    fn toggle_timers(&mut self) {
        for card in self.boards[self.current_board].cards.iter_mut().filter(|c| c.selected) {
            if let Contents::Timer(timer) = &mut card.contents {
                timer.running = !timer.running;
                if !timer.running {
                    timer.elapsed = 0.0;
                }
            }
        }
    }

    fn shift_maps(&mut self, amount: i32) {
        self.edit_selected(|card, _| {
            if let Contents::Map(map) = &mut card.contents {
                map.shift(amount);
            }
        });
    }

    fn edit_tables(&mut self, mut edit: impl FnMut(&mut TableData)) {
        self.edit_selected(|card, g| {
            if let Contents::Table(table) = &mut card.contents {
                edit(table);
                card.reset_size(g);
            }
        });
    }

    /// Apply a map tool at a world point on the map card under it.
    fn paint_map(&mut self, point: Vec2, tool: MapTool) -> bool {
        let Some(id) = self.board().hit_test(point) else {
            return false;
        };
        let color = self.map_color;
        let mut changed = false;
        self.edit_card(id, |card, g| {
            let local = (point - card.position) / (g / MAP_CELLS_PER_GRID);
            if let Contents::Map(map) = &mut card.contents {
                if local.x >= 0.0 && local.y >= 0.0 {
                    changed = map.apply_tool(tool, (local.x as usize, local.y as usize), color);
                }
            }
        });
        changed
    }

    /// Cycle the table cell under a world point. Returns true when the point
    /// was on a cell.
    fn click_table(&mut self, id: CardId, point: Vec2) -> bool {
        let g = self.grid();
        let Some(card) = self.board().card(id) else {
            return false;
        };
        let Contents::Table(table) = &card.contents else {
            return false;
        };
        let local = (point - card.position) / g;
        let row = local.y.floor() as i64 - 1;
        let column = (local.x - TABLE_NAME_CELLS).floor() as i64;
        if row < 0 || column < 0 {
            return false;
        }
        let (row, column) = (row as usize, column as usize);
        if table.cell(row, column).is_none() {
            return false;
        }
        let mut cycled = false;
        self.edit_card(id, |card, _| {
            if let Contents::Table(table) = &mut card.contents {
                cycled = table.cycle_cell(row, column);
            }
        });
        cycled
    }

    fn handle_mouse(&mut self, frame: &InputFrame) {
        let mouse = frame.mouse_world;
        let additive = self.keybindings.is_held(Action::SelectAddModifier, frame);
        let removing = self.keybindings.is_held(Action::SelectRemoveModifier, frame);

        if frame.mouse_pressed(MOUSE_LEFT) && !self.keybindings.is_pressed(Action::MapQuickLine, frame) {
            let hit = self.board().hit_test(mouse);
            match hit {
                Some(id) => {
                    let is_map = self.board().card(id).is_some_and(|c| c.kind() == CardKind::Map);
                    if is_map && self.map_tool != MapTool::Pointer {
                        self.paint_map(mouse, self.map_tool);
                        return;
                    }
                    if self.click_table(id, mouse) {
                        return;
                    }
                    if removing {
                        self.board_mut().set_selected(id, false);
                        self.messages.push(Message::Deselect(Some(id)));
                        return;
                    }
                    let selected = self.board().card(id).is_some_and(|c| c.selected);
                    if additive {
                        self.board_mut().set_selected(id, true);
                    } else if !selected {
                        self.board_mut().select_only(id);
                        self.messages.push(Message::Deselect(None));
                    }
                    self.messages.push(Message::Select(id));
                    for card in self.board().selected() {
                        self.messages.push(Message::Dragging(card));
                    }
                    self.drag = Some(Drag::Cards { last: mouse });
                }
                None => {
                    if !additive && !removing {
                        self.board_mut().deselect_all();
                        self.messages.push(Message::Deselect(None));
                    }
                    self.drag = Some(Drag::Marquee { start: mouse });
                }
            }
            return;
        }

        if frame.mouse_down(MOUSE_LEFT) {
            if let Some(Drag::Cards { last }) = self.drag {
                let is_map_paint = self.map_tool != MapTool::Pointer;
                if is_map_paint {
                    self.paint_map(mouse, self.map_tool);
                } else if mouse != last {
                    self.board_mut().drag_selected(mouse - last);
                }
                self.drag = Some(Drag::Cards { last: mouse });
            }
        }

        if frame.mouse_released(MOUSE_LEFT) {
            match self.drag.take() {
                Some(Drag::Cards { .. }) => {
                    for id in self.board().selected() {
                        self.messages.push(Message::Dropped(id));
                    }
                }
                Some(Drag::Marquee { start }) => {
                    let rect = Rect::from_corners(start, mouse);
                    if rect.w > 0.0 && rect.h > 0.0 {
                        let hits = self.board_mut().select_in_rect(&rect, additive);
                        self.messages.extend(hits.into_iter().map(Message::Select));
                    }
                }
                None => {}
            }
        }
    }

    fn handle_camera(&mut self, frame: &InputFrame) {
        let kb = &self.keybindings;
        let mut direction = Vec2::ZERO;
        if kb.is_held(Action::PanUp, frame) {
            direction.y -= 1.0;
        }
        if kb.is_held(Action::PanDown, frame) {
            direction.y += 1.0;
        }
        if kb.is_held(Action::PanLeft, frame) {
            direction.x -= 1.0;
        }
        if kb.is_held(Action::PanRight, frame) {
            direction.x += 1.0;
        }
        let fast = kb.is_held(Action::PanFast, frame);
        let dragging = kb.is_held(Action::PanModifier, frame);

        self.camera.pan(direction, frame.dt as f32, fast);
        if dragging {
            self.camera.drag(frame.mouse_world - self.last_mouse);
        }
        if frame.wheel > 0.0 {
            self.camera.zoom_in();
        } else if frame.wheel < 0.0 {
            self.camera.zoom_out();
        }
    }
}

/// Print a board as an indented, numbered outline.
pub fn outline(project: &Project, board: &Board) -> String {
    let mut out = format!("# {}\n", board.name);
    let g = board.grid_size();
    let left = board
        .cards
        .iter()
        .map(|c| c.position.x)
        .fold(f32::INFINITY, f32::min);
    for card in &board.cards {
        let depth = if left.is_finite() {
            ((card.position.x - left) / g).round().max(0.0) as usize
        } else {
            0
        };
        let prefix = project.numbering(card);
        let mark = match card.completion.complete {
            true => "[x]",
            false if card.kind().is_completable() => "[ ]",
            false => "   ",
        };
        let text = if card.description.is_empty() {
            card.kind().to_string()
        } else {
            card.description.clone()
        };
        out.push_str(&format!(
            "{}{} {}{}\n",
            "  ".repeat(depth),
            mark,
            if prefix.is_empty() { String::new() } else { format!("{} ", prefix) },
            text
        ));
    }
    out
}

fn new_card_kind(action: Action) -> Option<CardKind> {
    let kind = match action {
        Action::NewCheckbox => CardKind::Checkbox,
        Action::NewNumbered => CardKind::Progression,
        Action::NewNote => CardKind::Note,
        Action::NewSound => CardKind::Sound,
        Action::NewImage => CardKind::Image,
        Action::NewTimer => CardKind::Timer,
        Action::NewMap => CardKind::Map,
        Action::NewSubpage => CardKind::Subpage,
        Action::NewLink => CardKind::Link,
        Action::NewTable => CardKind::Table,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::input::keybindings::{KEY_LEFT_CONTROL, key};

    fn frame() -> InputFrame {
        InputFrame::default()
    }

    /// Create a card with nothing selected, so it lands where asked.
    fn place(project: &mut Project, x: f32, y: f32, kind: CardKind) -> CardId {
        project.board_mut().deselect_all();
        project.create_card(Vec2::new(x, y), kind)
    }

    fn prefixes(project: &Project) -> Vec<Vec<u32>> {
        project.board().cards.iter().map(|c| c.stack.prefix.clone()).collect()
    }

    fn check(project: &mut Project, id: CardId, value: bool) {
        project.edit_card(id, |c, _| c.contents = Contents::Checkbox { checked: value });
        project.update(&frame());
    }

    #[test]
    fn e1_stack_numbering() {
        let mut p = Project::new();
        for y in [0.0, 16.0, 32.0] {
            place(&mut p, 0.0, y, CardKind::Checkbox);
        }
        p.update(&frame());
        assert_eq!(prefixes(&p), vec![vec![1], vec![2], vec![3]]);
        let rendered: Vec<String> = p.board().cards.iter().map(|c| p.numbering(c)).collect();
        assert_eq!(rendered, vec!["1.", "2.", "3."]);
        assert!(p.board().audit().is_empty());
    }

    #[test]
    fn e2_nested_indentation() {
        let mut p = Project::new();
        for (x, y) in [(0.0, 0.0), (16.0, 16.0), (16.0, 32.0), (0.0, 48.0)] {
            place(&mut p, x, y, CardKind::Checkbox);
        }
        p.update(&frame());
        assert_eq!(prefixes(&p), vec![vec![1], vec![1, 1], vec![1, 2], vec![2]]);
    }

    #[test]
    fn e3_completion_aggregation() {
        let mut p = Project::new();
        let parent = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        let first = place(&mut p, 16.0, 16.0, CardKind::Checkbox);
        let second = place(&mut p, 16.0, 32.0, CardKind::Checkbox);
        p.update(&frame());

        check(&mut p, first, true);
        let card = p.board().card(parent).unwrap();
        assert!(!card.is_complete());
        assert_eq!(card.completion.fraction, 0.5);

        check(&mut p, second, true);
        let card = p.board().card(parent).unwrap();
        assert!(card.is_complete());
        assert!(card.completed.is_some());

        check(&mut p, first, false);
        let card = p.board().card(parent).unwrap();
        assert!(!card.is_complete());
        assert!(card.completed.is_none());
        assert!(p.board().audit().is_empty());
    }

    #[test]
    fn e4_undo_redo_creation() {
        let mut p = Project::new();
        let id = p.create_card(Vec2::ZERO, CardKind::Checkbox);
        p.update(&frame());

        assert!(p.undo());
        p.update(&frame());
        assert!(p.board().is_empty());

        assert!(p.redo());
        p.update(&frame());
        let card = p.board().card(id).expect("card restored with its identity");
        assert_eq!(card.position, Vec2::ZERO);
    }

    #[test]
    fn e5_copy_paste_offset() {
        let mut p = Project::new();
        place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        place(&mut p, 16.0, 0.0, CardKind::Checkbox);
        p.board_mut().select_all();
        p.update(&frame());

        p.copy();
        let pasted = p.paste(Vec2::new(64.0, 64.0));
        let at: Vec<Vec2> = pasted.iter().map(|id| p.board().card(*id).unwrap().position).collect();
        assert_eq!(at, vec![Vec2::new(48.0, 64.0), Vec2::new(64.0, 64.0)]);
        p.update(&frame());
        assert_eq!(p.board().len(), 4);
        assert_eq!(p.board().selected(), pasted);
    }

    #[test]
    fn e6_cut_across_boards() {
        let mut p = Project::new();
        let original = place(&mut p, 32.0, 32.0, CardKind::Checkbox);
        p.update(&frame());
        let frames_before = p.history.len();

        p.board_mut().select_only(original);
        p.cut();
        let b = p.add_board("B");
        p.switch_board(b);
        let pasted = p.paste(Vec2::ZERO);
        p.update(&frame());

        assert!(!p.boards[0].contains(original));
        assert_eq!(p.boards[1].card(pasted[0]).unwrap().position, Vec2::ZERO);
        assert_eq!(p.history.len(), frames_before + 1);

        assert!(p.undo());
        p.update(&frame());
        assert!(p.boards[0].contains(original));
        assert!(p.boards[1].is_empty());
    }

    #[test]
    fn pasting_an_empty_buffer_does_nothing() {
        let mut p = Project::new();
        p.update(&frame());
        let frames = p.history.len();
        assert!(p.paste(Vec2::ZERO).is_empty());
        p.update(&frame());
        assert_eq!(p.history.len(), frames);
    }

    #[test]
    fn keystroke_bursts_merge_into_one_frame() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Note);
        p.update(&frame());
        let frames = p.history.len();
        p.edit_card(id, |c, _| c.description.push('a'));
        p.edit_card(id, |c, _| c.description.push('b'));
        p.update(&frame());
        assert_eq!(p.history.len(), frames + 1);
        p.update(&frame());
        assert_eq!(p.history.len(), frames + 1, "idle frames add nothing");
    }

    #[test]
    fn undo_through_keybinding() {
        let mut p = Project::new();
        p.create_card(Vec2::ZERO, CardKind::Checkbox);
        p.update(&frame());
        let undo = InputFrame {
            keys_pressed: vec![key('Z')],
            keys_down: vec![KEY_LEFT_CONTROL, key('Z')],
            ..InputFrame::default()
        };
        p.update(&undo);
        assert!(p.board().is_empty());
    }

    #[test]
    fn paste_external_text_and_paths() {
        let mut p = Project::new();
        let note = p.paste_external("buy milk", Vec2::ZERO).unwrap();
        let card = p.board().card(note).unwrap();
        assert_eq!(card.kind(), CardKind::Note);
        assert_eq!(card.description, "buy milk");

        let image = p.paste_external("/definitely/missing/cat.png", Vec2::new(0.0, 200.0)).unwrap();
        let card = p.board().card(image).unwrap();
        assert_eq!(card.kind(), CardKind::Image);
        assert!(card.contents.resource().unwrap().broken);
        assert_eq!(p.log.len(), 1);
        assert!(p.paste_external("   ", Vec2::ZERO).is_none());
    }

    #[test]
    fn subpage_round_trip() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Subpage);
        p.edit_card(id, |c, _| c.description = "Groceries".into());
        p.update(&frame());

        assert!(p.open_subpage());
        assert_eq!(p.board().name, "Groceries");
        assert!(p.close_subpage());
        assert_eq!(p.current_board, 0);
        assert!(!p.close_subpage());

        assert!(p.open_subpage());
        assert_eq!(p.boards.len(), 2, "reopening reuses the board");
    }

    #[test]
    fn links_to_cards_and_urls() {
        let mut p = Project::new();
        let target = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        let link = place(&mut p, 0.0, 160.0, CardKind::Link);
        p.board_mut().select_all();
        assert_eq!(p.link_selected(), 1);
        p.update(&frame());

        p.board_mut().select_only(link);
        assert!(p.activate_link());
        assert_eq!(p.board().selected(), vec![target]);

        p.board_mut().select_only(link);
        p.edit_card(link, |c, _| {
            c.contents = Contents::Link {
                target: Some(LinkTarget::Url("https://example.org".into())),
            }
        });
        p.take_notifications();
        assert!(p.activate_link());
        assert_eq!(
            p.take_notifications(),
            vec![Notification::OpenUrl("https://example.org".into())]
        );
    }

    #[test]
    fn find_cycles_matches() {
        let mut p = Project::new();
        let a = place(&mut p, 0.0, 0.0, CardKind::Note);
        let b = place(&mut p, 0.0, 100.0, CardKind::Note);
        p.edit_card(a, |c, _| c.description = "Call Mum".into());
        p.edit_card(b, |c, _| c.description = "call the bank".into());
        p.update(&frame());

        p.set_search("CALL");
        assert_eq!(p.find(true), Some(a));
        assert_eq!(p.find(true), Some(b));
        assert_eq!(p.find(true), Some(a));
        assert_eq!(p.find(false), Some(b));
        assert_eq!(p.board().selected(), vec![b]);
    }

    #[test]
    fn resize_below_minimum_is_ignored() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Note);
        let before = p.board().card(id).unwrap().size;
        p.resize_card(id, Vec2::new(4.0, 4.0));
        assert_eq!(p.board().card(id).unwrap().size, before);
        p.resize_card(id, Vec2::new(32.0, 32.0));
        assert_eq!(p.board().card(id).unwrap().size, Vec2::new(32.0, 32.0));
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("masterplan-{}.plan", uuid::Uuid::new_v4()));
        let mut p = Project::new();
        let top = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        place(&mut p, 0.0, 16.0, CardKind::Progression);
        p.edit_card(top, |c, _| c.description = "Top".into());
        p.settings.numbering_sequence = numbering::NumberingSequence::Roman;
        p.update(&frame());
        p.save_as(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.board().len(), 2);
        assert_eq!(loaded.board().card(top).unwrap().description, "Top");
        assert_eq!(loaded.board().cards[1].stack.prefix, vec![2]);
        assert_eq!(loaded.numbering(&loaded.board().cards[1]), "II.");
        assert!(!loaded.history.can_undo());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_errors_surface() {
        let path = std::env::temp_dir().join(format!("masterplan-{}.plan", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"Version":99}"#).unwrap();
        assert!(matches!(Project::load(&path), Err(PlanError::VersionMismatch { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn drag_and_drop_snaps() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        p.board_mut().deselect_all();
        p.update(&frame());

        let mut press = InputFrame::at(Vec2::new(4.0, 4.0));
        press.mouse_pressed = vec![MOUSE_LEFT];
        press.mouse_down = vec![MOUSE_LEFT];
        p.update(&press);
        assert_eq!(p.board().selected(), vec![id]);

        let mut hold = InputFrame::at(Vec2::new(41.0, 22.0));
        hold.mouse_down = vec![MOUSE_LEFT];
        p.update(&hold);

        let mut release = InputFrame::at(Vec2::new(41.0, 22.0));
        release.mouse_released = vec![MOUSE_LEFT];
        p.update(&release);
        assert_eq!(p.board().card(id).unwrap().position, Vec2::new(32.0, 16.0));
    }

    #[test]
    fn timer_elapse_is_notified() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Timer);
        p.edit_card(id, |c, _| {
            if let Contents::Timer(t) = &mut c.contents {
                t.minutes = 0;
                t.seconds = 1;
                t.running = true;
            }
        });
        let mut tick = frame();
        tick.dt = 2.0;
        p.update(&tick);
        assert!(p
            .take_notifications()
            .iter()
            .any(|n| matches!(n, Notification::TimerElapsed { card, .. } if *card == id)));
    }

    #[test]
    fn repeated_creation_pushes_the_stack_each_time() {
        let mut p = Project::new();
        let a = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        let b = place(&mut p, 0.0, 16.0, CardKind::Checkbox);
        p.update(&frame());

        p.board_mut().select_only(a);
        let c = p.create_card(Vec2::ZERO, CardKind::Checkbox);
        let d = p.create_card(Vec2::ZERO, CardKind::Checkbox);
        let at = |id| p.board().card(id).unwrap().position;
        assert_eq!(at(c), Vec2::new(0.0, 16.0));
        assert_eq!(at(d), Vec2::new(0.0, 32.0));
        assert_eq!(at(b), Vec2::new(0.0, 48.0));

        p.update(&frame());
        let prefix = |id| p.board().card(id).unwrap().stack.prefix.clone();
        assert_eq!(
            vec![prefix(a), prefix(c), prefix(d), prefix(b)],
            vec![vec![1], vec![2], vec![3], vec![4]]
        );
        assert!(p.board().audit().is_empty());
    }

    #[test]
    fn insert_then_delete_in_one_frame_leaves_no_undo_step() {
        let mut p = Project::new();
        let a = place(&mut p, 0.0, 0.0, CardKind::Checkbox);
        let b = place(&mut p, 0.0, 16.0, CardKind::Checkbox);
        p.update(&frame());
        let frames = p.history.len();

        p.board_mut().select_only(a);
        p.create_card(Vec2::ZERO, CardKind::Checkbox);
        assert_eq!(p.board().card(b).unwrap().position, Vec2::new(0.0, 32.0));
        assert_eq!(p.delete_selected(), 1);
        p.update(&frame());

        assert_eq!(p.board().card(b).unwrap().position, Vec2::new(0.0, 16.0));
        assert_eq!(p.board().len(), 2);
        assert_eq!(p.history.len(), frames);
    }

    #[test]
    fn scripted_paste_external_action() {
        let mut p = Project::new();
        let paste = InputFrame::at(Vec2::new(32.0, 32.0))
            .with_action(Action::PasteExternal)
            .with_clipboard("buy milk");
        p.update(&paste);

        assert_eq!(p.board().len(), 1);
        let card = &p.board().cards[0];
        assert_eq!(card.kind(), CardKind::Note);
        assert_eq!(card.description, "buy milk");
        assert_eq!(card.position, Vec2::new(32.0, 32.0));

        // No clipboard text: nothing to paste.
        p.update(&frame().with_action(Action::PasteExternal));
        assert_eq!(p.board().len(), 1);
    }

    #[test]
    fn table_rows_and_columns_move_with_their_cells() {
        let mut p = Project::new();
        let id = place(&mut p, 0.0, 0.0, CardKind::Table);
        p.edit_card(id, |c, _| {
            c.contents = Contents::Table(TableData::from_parts(
                vec!["Mon".into(), "Tue".into()],
                vec!["Run".into(), "Read".into()],
                &[vec![1, 0], vec![0, 2]],
            ));
        });
        p.update(&frame());
        let frames = p.history.len();

        assert!(p.move_table_row(id, 0, 1));
        assert!(p.move_table_column(id, 1, 0));
        assert!(!p.move_table_row(id, 0, 5));
        p.update(&frame());
        assert_eq!(p.history.len(), frames + 1);

        let Contents::Table(table) = &p.board().card(id).unwrap().contents else {
            panic!("table card lost its table");
        };
        assert_eq!(table.rows, vec!["Tue", "Mon"]);
        assert_eq!(table.columns, vec!["Read", "Run"]);
        assert_eq!(table.codes(), vec![vec![2, 0], vec![0, 1]]);

        assert!(p.undo());
        p.update(&frame());
        let Contents::Table(table) = &p.board().card(id).unwrap().contents else {
            panic!("table card lost its table");
        };
        assert_eq!(table.rows, vec!["Mon", "Tue"]);
    }
}
