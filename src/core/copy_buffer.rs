use uuid::Uuid;

use super::board::Board;
use super::card::CardId;
use super::record::CardRecord;

/// One buffered card.
#[derive(Debug, Clone, PartialEq)]
pub enum CopySource {
    /// A card still living on a board of this project.
    Live { board: Uuid, card: CardId },
    /// A detached snapshot.
    Serialized(CardRecord),
}

#[derive(Debug, Clone, Default)]
pub struct CopyBuffer {
    sources: Vec<CopySource>,
    /// Paste deletes the live sources after cloning them.
    pub cut: bool,
}

impl CopyBuffer {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> &[CopySource] {
        &self.sources
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.cut = false;
    }

    /// Buffer live references to cards on `board`.
    pub fn fill_live(&mut self, board: Uuid, cards: &[CardId], cut: bool) {
        self.sources = cards
            .iter()
            .map(|card| CopySource::Live { board, card: *card })
            .collect();
        self.cut = cut;
    }

    pub fn fill_serialized(&mut self, records: Vec<CardRecord>) {
        self.sources = records.into_iter().map(CopySource::Serialized).collect();
        self.cut = false;
    }

    /// Records for every source that can still be found. Live sources whose
    /// card is gone are skipped.
    pub fn records(&self, boards: &[Board]) -> Vec<CardRecord> {
        self.sources
            .iter()
            .filter_map(|source| match source {
                CopySource::Live { board, card } => boards
                    .iter()
                    .find(|b| b.id == *board)
                    .and_then(|b| b.card(*card))
                    .filter(|c| !boards.iter().any(|b| b.is_pending(c.id)))
                    .map(|c| c.serialize().without_volatile()),
                CopySource::Serialized(record) => Some(record.clone()),
            })
            .collect()
    }

    /// Swap live references for snapshots, for use outside this project.
    pub fn to_serialized(&mut self, boards: &[Board]) {
        let records = self.records(boards);
        let cut = self.cut;
        self.fill_serialized(records);
        self.cut = cut;
    }

    /// Live sources grouped per board, used to delete originals after a cut.
    pub fn live_sources(&self) -> Vec<(Uuid, CardId)> {
        self.sources
            .iter()
            .filter_map(|source| match source {
                CopySource::Live { board, card } => Some((*board, *card)),
                CopySource::Serialized(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::CardIds;
    use crate::core::contents::CardKind;
    use crate::core::undo::UndoHistory;
    use glam::Vec2;

    #[test]
    fn live_sources_follow_the_card() {
        let mut board = Board::new("A", 16.0);
        let mut ids = CardIds::default();
        let mut history = UndoHistory::new();
        let id = board.create_card(&mut ids, &mut history, Vec2::ZERO, CardKind::Checkbox);

        let mut buffer = CopyBuffer::default();
        buffer.fill_live(board.id, &[id], false);
        board.card_mut(id).unwrap().description = "later".into();

        let boards = vec![board];
        let records = buffer.records(&boards);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "later");
        assert!(!records[0].selected);
    }

    #[test]
    fn serialized_buffer_survives_missing_boards() {
        let mut board = Board::new("A", 16.0);
        let mut ids = CardIds::default();
        let mut history = UndoHistory::new();
        let id = board.create_card(&mut ids, &mut history, Vec2::ZERO, CardKind::Note);

        let mut buffer = CopyBuffer::default();
        buffer.fill_live(board.id, &[id], true);
        let mut boards = vec![board];
        buffer.to_serialized(&boards);
        assert!(buffer.cut);
        assert!(buffer.live_sources().is_empty());

        boards.clear();
        assert_eq!(buffer.records(&boards).len(), 1);
    }
}
