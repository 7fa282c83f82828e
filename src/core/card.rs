use chrono::{Datelike, NaiveDate, NaiveDateTime};
use glam::Vec2;

use super::completion::Completion;
use super::contents::{
    CardKind, Contents, LinkTarget, MAP_CELLS_PER_GRID, ResourceContents, SoundContents,
    TimerContents,
};
use super::geometry::{Rect, snap_point};
use super::map::MapData;
use super::record::CardRecord;
use super::table::TableData;
use crate::error::{PlanError, PlanResult};
use crate::message::Message;

/// Card identity, allocated per project and never reused within a session.
pub type CardId = u64;

/// Monotonic card id allocator.
#[derive(Debug, Clone, Default)]
pub struct CardIds {
    next: CardId,
}

impl CardIds {
    pub fn allocate(&mut self) -> CardId {
        self.next += 1;
        self.next
    }

    /// Make sure future ids are above `id`.
    pub fn reserve(&mut self, id: CardId) {
        self.next = self.next.max(id);
    }
}

/// Relations derived from positions every frame. Never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackLinks {
    pub above: Option<CardId>,
    pub below: Option<CardId>,
    pub children: Vec<CardId>,
    /// Empty when the card is not part of a stack.
    pub prefix: Vec<u32>,
}

impl StackLinks {
    /// Clear every link to one of `ids`.
    pub fn forget(&mut self, ids: &[CardId]) {
        if self.above.is_some_and(|a| ids.contains(&a)) {
            self.above = None;
        }
        if self.below.is_some_and(|b| ids.contains(&b)) {
            self.below = None;
        }
        self.children.retain(|c| !ids.contains(c));
    }
}

#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub position: Vec2,
    pub size: Vec2,
    pub contents: Contents,
    pub description: String,
    pub selected: bool,
    pub deadline: Option<NaiveDate>,
    pub created: NaiveDateTime,
    pub completed: Option<NaiveDateTime>,
    pub stack: StackLinks,
    /// Last aggregate-phase result.
    pub completion: Completion,
    /// Set while the card is being dragged.
    pub dragging: bool,
}

impl Card {
    pub fn new(id: CardId, kind: CardKind, position: Vec2, grid: f32) -> Self {
        let contents = Contents::default_for(kind);
        let mut card = Self {
            id,
            position,
            size: Vec2::ZERO,
            contents,
            description: String::new(),
            selected: false,
            deadline: None,
            created: chrono::Local::now().naive_local(),
            completed: None,
            stack: StackLinks::default(),
            completion: Completion::default(),
            dragging: false,
        };
        card.size = card.default_size(grid);
        card
    }

    pub fn from_record(id: CardId, record: &CardRecord, grid: f32) -> Self {
        let mut card = Self::new(id, record.kind, Vec2::new(record.x, record.y), grid);
        card.deserialize(record, grid);
        card
    }

    pub fn kind(&self) -> CardKind {
        self.contents.kind()
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    pub fn allows_neighbors(&self) -> bool {
        self.kind().allows_neighbors()
    }

    pub fn is_complete(&self) -> bool {
        self.completion.complete
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn snap(&mut self, grid: f32) {
        self.position = snap_point(self.position, grid);
    }

    /// Size the card takes for its kind and contents.
    pub fn default_size(&self, grid: f32) -> Vec2 {
        match &self.contents {
            Contents::Table(table) => Vec2::new(
                (table.column_count() as f32 + 4.0).max(8.0) * grid,
                (table.row_count() as f32 + 1.0) * grid,
            ),
            Contents::Map(map) if map.width() > 0 => Vec2::new(
                (map.width() as f32 / MAP_CELLS_PER_GRID).ceil().max(1.0) * grid,
                (map.height() as f32 / MAP_CELLS_PER_GRID).ceil().max(1.0) * grid,
            ),
            _ => {
                let (w, h) = self.kind().default_cells();
                Vec2::new(w * grid, h * grid)
            }
        }
    }

    /// Switch kind, resetting the payload. Same kind is a no-op.
    pub fn set_kind(&mut self, kind: CardKind, grid: f32) {
        if self.kind() == kind {
            return;
        }
        self.contents = Contents::default_for(kind);
        self.completed = None;
        self.completion = Completion::default();
        self.size = self.default_size(grid);
    }

    /// Resize, rejecting anything below one grid cell on either axis.
    pub fn resize(&mut self, size: Vec2, grid: f32) -> PlanResult<()> {
        if size.x < grid || size.y < grid {
            return Err(PlanError::UserInput(format!(
                "card {} cannot be smaller than one grid cell ({}x{})",
                self.id, size.x, size.y
            )));
        }
        self.size = size;
        if let Contents::Map(map) = &mut self.contents {
            map.resize(
                ((size.x / grid) * MAP_CELLS_PER_GRID) as usize,
                ((size.y / grid) * MAP_CELLS_PER_GRID) as usize,
            );
        }
        Ok(())
    }

    /// Fold the card to one grid cell tall.
    pub fn collapse(&mut self, grid: f32) {
        self.size.y = grid;
    }

    pub fn reset_size(&mut self, grid: f32) {
        self.size = self.default_size(grid);
    }

    /// Build the wire record.
    pub fn serialize(&self) -> CardRecord {
        let mut rec = CardRecord {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            width: Some(self.size.x),
            height: Some(self.size.y),
            kind: self.kind(),
            description: self.description.clone(),
            selected: self.selected,
            creation_time: Some(self.created),
            completion_time: self.completed,
            ..CardRecord::default()
        };

        if let Some(deadline) = self.deadline {
            rec.deadline_year = Some(deadline.year());
            rec.deadline_month = Some(deadline.month());
            rec.deadline_day = Some(deadline.day());
        }

        match &self.contents {
            Contents::Checkbox { checked } => rec.checked = Some(*checked),
            Contents::Progression { current, max } => {
                rec.progression_current = Some(*current);
                rec.progression_max = Some(*max);
            }
            Contents::Note => {}
            Contents::Image(res) => rec.image_resource = Some(res.path.clone()),
            Contents::Sound(sound) => rec.sound_resource = Some(sound.resource.path.clone()),
            Contents::Timer(timer) => {
                rec.timer_minutes = Some(timer.minutes);
                rec.timer_seconds = Some(timer.seconds);
                rec.timer_name = Some(timer.name.clone());
            }
            Contents::Map(map) => rec.map_data = Some(map.rows().to_vec()),
            Contents::Table(table) => {
                rec.table_rows = Some(table.rows.clone());
                rec.table_columns = Some(table.columns.clone());
                rec.table_completions = Some(table.codes());
            }
            Contents::Subpage { board } => rec.subpage_board = Some(board.clone()),
            Contents::Link { target } => match target {
                Some(LinkTarget::Card(id)) => rec.link_card = Some(*id),
                Some(LinkTarget::Url(url)) => rec.link_url = Some(url.clone()),
                None => {}
            },
        }

        rec
    }

    /// Load a record into this card. Identity and derived links are kept;
    /// a live sound stream survives when the resource is unchanged.
    pub fn deserialize(&mut self, rec: &CardRecord, grid: f32) {
        self.position = Vec2::new(rec.x, rec.y);
        self.description = rec.description.clone();
        self.selected = rec.selected;
        if let Some(created) = rec.creation_time {
            self.created = created;
        }
        self.completed = rec.completion_time;
        self.deadline = match (rec.deadline_year, rec.deadline_month, rec.deadline_day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };

        self.contents = match rec.kind {
            CardKind::Checkbox => Contents::Checkbox {
                checked: rec.checked.unwrap_or(false),
            },
            CardKind::Progression => Contents::Progression {
                current: rec.progression_current.unwrap_or(0),
                max: rec.progression_max.unwrap_or(10),
            },
            CardKind::Note => Contents::Note,
            CardKind::Image => Contents::Image(ResourceContents {
                path: rec.image_resource.clone().unwrap_or_default(),
                broken: false,
            }),
            CardKind::Sound => {
                let path = rec.sound_resource.clone().unwrap_or_default();
                let (stream, playing) = match &self.contents {
                    Contents::Sound(old) if old.resource.path == path => {
                        (old.stream.clone(), old.playing)
                    }
                    _ => (None, false),
                };
                Contents::Sound(SoundContents {
                    resource: ResourceContents {
                        path,
                        broken: false,
                    },
                    playing: rec.sound_playing.unwrap_or(playing),
                    stream,
                })
            }
            CardKind::Timer => {
                let (elapsed, running) = match &self.contents {
                    Contents::Timer(old) => (old.elapsed, old.running),
                    _ => (0.0, false),
                };
                Contents::Timer(TimerContents {
                    name: rec.timer_name.clone().unwrap_or_default(),
                    minutes: rec.timer_minutes.unwrap_or(0),
                    seconds: rec.timer_seconds.unwrap_or(0),
                    elapsed,
                    running,
                })
            }
            CardKind::Map => Contents::Map(MapData::from_rows(
                rec.map_data.clone().unwrap_or_default(),
            )),
            CardKind::Table => Contents::Table(TableData::from_parts(
                rec.table_rows.clone().unwrap_or_else(|| vec!["Row 1".into()]),
                rec.table_columns
                    .clone()
                    .unwrap_or_else(|| vec!["Column 1".into()]),
                rec.table_completions.as_deref().unwrap_or(&[]),
            )),
            CardKind::Subpage => Contents::Subpage {
                board: rec.subpage_board.clone().unwrap_or_default(),
            },
            CardKind::Link => Contents::Link {
                target: match (rec.link_card, &rec.link_url) {
                    (Some(id), _) => Some(LinkTarget::Card(id)),
                    (None, Some(url)) => Some(LinkTarget::Url(url.clone())),
                    (None, None) => None,
                },
            },
        };

        let default = self.default_size(grid);
        self.size = Vec2::new(
            rec.width.unwrap_or(default.x).max(grid),
            rec.height.unwrap_or(default.y).max(grid),
        );
        if let Contents::Map(map) = &mut self.contents {
            if map.width() == 0 {
                map.resize(
                    ((self.size.x / grid) * MAP_CELLS_PER_GRID) as usize,
                    ((self.size.y / grid) * MAP_CELLS_PER_GRID) as usize,
                );
            }
        }
    }

    /// Broadcast handler. Every card sees every message.
    pub fn receive(&mut self, message: &Message, grid: f32) {
        match message {
            Message::Select(id) if *id == self.id => self.selected = true,
            Message::Deselect(None) => self.selected = false,
            Message::Deselect(Some(id)) if *id == self.id => self.selected = false,
            Message::Dragging(id) if *id == self.id => self.dragging = true,
            Message::Dropped(id) if *id == self.id => {
                self.dragging = false;
                self.snap(grid);
            }
            Message::Delete(id) if *id == self.id => {
                if let Contents::Sound(sound) = &mut self.contents {
                    sound.set_playing(false);
                }
            }
            Message::Close(id) if *id == self.id => {
                if let Contents::Timer(timer) = &mut self.contents {
                    timer.running = false;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: CardKind) -> Card {
        let mut card = Card::new(1, kind, Vec2::new(32.0, 48.0), 16.0);
        card.description = "Buy milk".into();
        card.deadline = NaiveDate::from_ymd_opt(2026, 3, 14);
        card
    }

    #[test]
    fn serialize_round_trip_is_byte_equal() {
        for kind in CardKind::ALL {
            let mut card = sample(*kind);
            card.selected = true;
            let original = card.serialize().without_volatile().to_json().unwrap();

            let mut fresh = Card::new(9, CardKind::Note, Vec2::ZERO, 16.0);
            let parsed = CardRecord::from_json(&original).unwrap();
            fresh.deserialize(&parsed, 16.0);
            fresh.id = card.id;
            let again = fresh.serialize().without_volatile().to_json().unwrap();
            assert_eq!(original, again, "kind {}", kind);
        }
    }

    #[test]
    fn deadline_keys_only_when_set() {
        let mut card = sample(CardKind::Checkbox);
        let json = card.serialize().to_json().unwrap();
        assert!(json.contains("\"Deadline.Year\":2026"));
        card.deadline = None;
        assert!(!card.serialize().to_json().unwrap().contains("Deadline"));
    }

    #[test]
    fn set_kind_resets_payload() {
        let mut card = sample(CardKind::Checkbox);
        card.contents = Contents::Checkbox { checked: true };
        card.set_kind(CardKind::Progression, 16.0);
        assert!(matches!(card.contents, Contents::Progression { current: 0, .. }));
        assert_eq!(card.description, "Buy milk");
    }

    #[test]
    fn resize_below_one_cell_is_rejected() {
        let mut card = sample(CardKind::Note);
        let err = card.resize(Vec2::new(8.0, 32.0), 16.0).unwrap_err();
        assert!(matches!(err, PlanError::UserInput(_)));
        assert_eq!(card.size, Vec2::new(128.0, 32.0));
    }

    #[test]
    fn map_follows_card_size() {
        let mut card = sample(CardKind::Map);
        card.resize(Vec2::new(32.0, 16.0), 16.0).unwrap();
        let Contents::Map(map) = &card.contents else {
            panic!("not a map");
        };
        assert_eq!((map.width(), map.height()), (4, 2));
    }

    #[test]
    fn dropped_message_snaps() {
        let mut card = sample(CardKind::Checkbox);
        card.position = Vec2::new(37.0, 50.0);
        card.receive(&Message::Dropped(1), 16.0);
        assert_eq!(card.position, Vec2::new(32.0, 48.0));
        card.receive(&Message::Select(2), 16.0);
        assert!(!card.selected);
        card.receive(&Message::Select(1), 16.0);
        assert!(card.selected);
        card.receive(&Message::Deselect(None), 16.0);
        assert!(!card.selected);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut ids = CardIds::default();
        assert_eq!(ids.allocate(), 1);
        ids.reserve(10);
        assert_eq!(ids.allocate(), 11);
        ids.reserve(3);
        assert_eq!(ids.allocate(), 12);
    }
}
