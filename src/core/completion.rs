//! Completion aggregation.
//!
//! Pure functions over resolved cards; the board applies the results in the
//! aggregate phase.

use std::collections::HashMap;

use super::card::{Card, CardId};
use super::contents::Contents;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Completion {
    pub fraction: f32,
    pub complete: bool,
}

impl Completion {
    fn done(complete: bool) -> Self {
        Self {
            fraction: if complete { 1.0 } else { 0.0 },
            complete,
        }
    }
}

/// Id lookup used while aggregating.
pub type CardLookup<'a> = HashMap<CardId, &'a Card>;

pub fn lookup(cards: &[Card]) -> CardLookup<'_> {
    cards.iter().map(|c| (c.id, c)).collect()
}

/// Whether a card takes part in its parent's tally.
fn counts_toward_parent(card: &Card) -> bool {
    card.kind().is_completable()
        || matches!(card.contents, Contents::Table(_))
        || !card.stack.children.is_empty()
}

/// Completion of one card, recursing through its children.
pub fn evaluate(card: &Card, cards: &CardLookup<'_>) -> Completion {
    evaluate_depth(card, cards, 0)
}

fn evaluate_depth(card: &Card, cards: &CardLookup<'_>, depth: usize) -> Completion {
    if card.kind().is_completable() && depth < cards.len() {
        let children: Vec<&Card> = card
            .stack
            .children
            .iter()
            .filter_map(|id| cards.get(id).copied())
            .filter(|c| counts_toward_parent(c))
            .collect();
        if !children.is_empty() {
            let done = children
                .iter()
                .filter(|c| evaluate_depth(c, cards, depth + 1).complete)
                .count();
            return Completion {
                fraction: done as f32 / children.len() as f32,
                complete: done == children.len(),
            };
        }
    }
    own_completion(card)
}

/// Completion from the card's payload alone.
pub fn own_completion(card: &Card) -> Completion {
    match &card.contents {
        Contents::Checkbox { checked } => Completion::done(*checked),
        Contents::Progression { current, max } => Completion {
            fraction: if *max > 0 {
                (*current as f32 / *max as f32).clamp(0.0, 1.0)
            } else {
                0.0
            },
            complete: *max > 0 && current >= max,
        },
        Contents::Sound(sound) => Completion {
            fraction: sound.progress(),
            complete: false,
        },
        Contents::Timer(timer) => Completion {
            fraction: if timer.total() > 0.0 {
                (timer.elapsed / timer.total()).clamp(0.0, 1.0) as f32
            } else {
                0.0
            },
            complete: false,
        },
        Contents::Table(table) => Completion {
            fraction: table.fraction(),
            complete: table.is_complete(),
        },
        _ => Completion::default(),
    }
}

/// Timers whose run reached their total this frame.
pub fn elapsed_timers(cards: &[Card]) -> Vec<CardId> {
    cards
        .iter()
        .filter(|c| matches!(&c.contents, Contents::Timer(t) if t.has_elapsed()))
        .map(|c| c.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contents::CardKind;
    use crate::core::table::CellState;
    use glam::Vec2;

    fn card(id: CardId, kind: CardKind) -> Card {
        Card::new(id, kind, Vec2::ZERO, 16.0)
    }

    #[test]
    fn progression_needs_positive_max() {
        let mut c = card(1, CardKind::Progression);
        c.contents = Contents::Progression { current: 0, max: 0 };
        assert!(!own_completion(&c).complete);
        c.contents = Contents::Progression { current: 3, max: 4 };
        let got = own_completion(&c);
        assert!(!got.complete);
        assert_eq!(got.fraction, 0.75);
        c.contents = Contents::Progression { current: 5, max: 4 };
        assert!(own_completion(&c).complete);
    }

    #[test]
    fn parent_aggregates_children() {
        let mut parent = card(1, CardKind::Checkbox);
        parent.stack.children = vec![2, 3];
        let mut a = card(2, CardKind::Checkbox);
        let b = card(3, CardKind::Checkbox);
        a.contents = Contents::Checkbox { checked: true };

        let cards = vec![parent, a, b];
        let map = lookup(&cards);
        let got = evaluate(&cards[0], &map);
        assert_eq!(got.fraction, 0.5);
        assert!(!got.complete);
    }

    #[test]
    fn non_completable_children_are_not_tallied() {
        let mut parent = card(1, CardKind::Checkbox);
        parent.stack.children = vec![2, 3];
        let mut a = card(2, CardKind::Checkbox);
        a.contents = Contents::Checkbox { checked: true };
        let timer = card(3, CardKind::Timer);

        let cards = vec![parent, a, timer];
        let map = lookup(&cards);
        assert!(evaluate(&cards[0], &map).complete);
    }

    #[test]
    fn table_completion() {
        let mut t = card(1, CardKind::Table);
        if let Contents::Table(table) = &mut t.contents {
            table.set_cell(0, 0, CellState::Complete);
        }
        assert!(own_completion(&t).complete);
    }

    #[test]
    fn timer_is_never_complete() {
        let mut t = card(1, CardKind::Timer);
        if let Contents::Timer(timer) = &mut t.contents {
            timer.running = true;
            timer.elapsed = timer.total() / 2.0;
        }
        let got = own_completion(&t);
        assert!(!got.complete);
        assert_eq!(got.fraction, 0.5);
        assert!(elapsed_timers(std::slice::from_ref(&t)).is_empty());
    }
}
