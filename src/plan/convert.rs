//! Boards to and from their plan-file records.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::file::BoardRecord;
use crate::core::board::Board;
use crate::core::card::{Card, CardIds};
use crate::core::contents::Contents;
use crate::core::message_log::MessageLog;
use crate::core::resource::{self, ResourceKind};

/// Records for every board, cards in board order.
pub fn boards_to_records(boards: &[Board], save_sounds_playing: bool) -> Vec<BoardRecord> {
    boards
        .iter()
        .map(|board| BoardRecord {
            name: board.name.clone(),
            cards: board
                .cards
                .iter()
                .filter(|c| !board.is_pending(c.id))
                .map(|card| {
                    let mut rec = card.serialize();
                    if let Contents::Sound(sound) = &card.contents {
                        if save_sounds_playing {
                            rec.sound_playing = Some(sound.playing);
                        }
                    }
                    rec
                })
                .collect(),
        })
        .collect()
}

/// Resolve a resource path stored in a plan against the plan's directory.
pub fn resolve_resource(path: &str, base: Option<&Path>) -> PathBuf {
    let p = PathBuf::from(path.trim());
    match base {
        Some(dir) if p.is_relative() => dir.join(p),
        _ => p,
    }
}

/// Rebuild boards from records. Stored ids are kept when unique; resources
/// that cannot be found or recognised flag their card broken and log one
/// line each.
pub fn records_to_boards(
    records: &[BoardRecord],
    grid: f32,
    ids: &mut CardIds,
    base: Option<&Path>,
    log: &mut MessageLog,
) -> Vec<Board> {
    // Reserve every stored id first so fresh ids never collide with them.
    for rec in records.iter().flat_map(|b| b.cards.iter()) {
        ids.reserve(rec.id);
    }

    let mut seen = HashSet::new();
    let mut boards = Vec::with_capacity(records.len());
    for (index, board_rec) in records.iter().enumerate() {
        let name = if board_rec.name.trim().is_empty() {
            format!("Board {}", index + 1)
        } else {
            board_rec.name.clone()
        };
        let mut board = Board::new(name, grid);
        for rec in &board_rec.cards {
            let id = if rec.id != 0 && seen.insert(rec.id) {
                rec.id
            } else {
                let fresh = ids.allocate();
                seen.insert(fresh);
                fresh
            };
            let mut card = Card::from_record(id, rec, grid);
            check_resource(&mut card, base, log);
            board.insert(card);
        }
        board.reorder();
        board.reindex_grid();
        boards.push(board);
    }
    boards
}

fn check_resource(card: &mut Card, base: Option<&Path>, log: &mut MessageLog) {
    let expected = match &card.contents {
        Contents::Image(_) => ResourceKind::Image,
        Contents::Sound(_) => ResourceKind::Sound,
        _ => return,
    };
    let Some(res) = card.contents.resource_mut() else {
        return;
    };
    if res.path.trim().is_empty() {
        return;
    }
    let full = resolve_resource(&res.path, base);
    match resource::probe(&full.to_string_lossy()) {
        Ok(kind) if kind == expected => res.broken = false,
        Ok(kind) => {
            res.broken = true;
            log.error(format!("{} is not usable as {:?} (found {:?})", res.path, expected, kind));
        }
        Err(e) => {
            res.broken = true;
            log.error(format!("Could not load {}: {}", res.path, e));
        }
    }
}
