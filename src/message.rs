use glam::Vec2;

use crate::core::card::CardId;

/// Broadcast delivered to every card during the broadcast phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Select(CardId),
    /// `None` deselects every card.
    Deselect(Option<CardId>),
    Open(CardId),
    Close(CardId),
    Dragging(CardId),
    Dropped(CardId),
    Delete(CardId),
    ChildrenChanged(CardId),
    NumberingChanged(CardId),
}

/// Requests posted to the collaborators around the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A running timer reached its total.
    TimerElapsed { card: CardId, name: String },
    OpenUrl(String),
    CameraTarget(Vec2),
    RequestSavePath,
    RequestOpenPath,
    /// Shown as a modal; the file on disk was left untouched.
    SaveFailed(String),
}
