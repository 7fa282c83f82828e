use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::card::CardId;
use super::contents::CardKind;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Wire form of a card.
///
/// Common fields plus the fields of the card's kind; fields of other kinds
/// are absent. Field order is fixed, so the JSON text of two equal records
/// is byte-equal. Unknown keys are ignored when reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "ID", default)]
    pub id: CardId,
    #[serde(rename = "Position.X", default)]
    pub x: f32,
    #[serde(rename = "Position.Y", default)]
    pub y: f32,
    #[serde(rename = "Size.Width", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(rename = "Size.Height", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(rename = "Kind", default)]
    pub kind: CardKind,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Selected", default, skip_serializing_if = "is_false")]
    pub selected: bool,

    #[serde(rename = "Checkbox.Checked", default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(rename = "Progression.Current", default, skip_serializing_if = "Option::is_none")]
    pub progression_current: Option<i32>,
    #[serde(rename = "Progression.Max", default, skip_serializing_if = "Option::is_none")]
    pub progression_max: Option<i32>,
    #[serde(rename = "Timer.Minutes", default, skip_serializing_if = "Option::is_none")]
    pub timer_minutes: Option<u32>,
    #[serde(rename = "Timer.Seconds", default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u32>,
    #[serde(rename = "Timer.Name", default, skip_serializing_if = "Option::is_none")]
    pub timer_name: Option<String>,
    #[serde(rename = "Image.Resource", default, skip_serializing_if = "Option::is_none")]
    pub image_resource: Option<String>,
    #[serde(rename = "Sound.Resource", default, skip_serializing_if = "Option::is_none")]
    pub sound_resource: Option<String>,
    #[serde(rename = "Sound.Playing", default, skip_serializing_if = "Option::is_none")]
    pub sound_playing: Option<bool>,
    #[serde(rename = "Map.Data", default, skip_serializing_if = "Option::is_none")]
    pub map_data: Option<Vec<Vec<i32>>>,
    #[serde(rename = "Table.Rows", default, skip_serializing_if = "Option::is_none")]
    pub table_rows: Option<Vec<String>>,
    #[serde(rename = "Table.Columns", default, skip_serializing_if = "Option::is_none")]
    pub table_columns: Option<Vec<String>>,
    #[serde(rename = "Table.Completions", default, skip_serializing_if = "Option::is_none")]
    pub table_completions: Option<Vec<Vec<u8>>>,
    #[serde(rename = "Subpage.Board", default, skip_serializing_if = "Option::is_none")]
    pub subpage_board: Option<String>,
    #[serde(rename = "Link.Card", default, skip_serializing_if = "Option::is_none")]
    pub link_card: Option<CardId>,
    #[serde(rename = "Link.Url", default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,

    #[serde(rename = "Deadline.Year", default, skip_serializing_if = "Option::is_none")]
    pub deadline_year: Option<i32>,
    #[serde(rename = "Deadline.Month", default, skip_serializing_if = "Option::is_none")]
    pub deadline_month: Option<u32>,
    #[serde(rename = "Deadline.Day", default, skip_serializing_if = "Option::is_none")]
    pub deadline_day: Option<u32>,

    #[serde(rename = "CreationTime", default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<NaiveDateTime>,
    #[serde(rename = "CompletionTime", default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<NaiveDateTime>,
}

impl CardRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Copy with volatile keys cleared, as stored in undo frames.
    pub fn without_volatile(&self) -> Self {
        Self {
            selected: false,
            sound_playing: None,
            ..self.clone()
        }
    }
}
