//! Hierarchical numbering prefixes for stacked cards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::card::{Card, CardId};
use super::stack::Resolution;

/// How prefixes are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumberingSequence {
    #[default]
    Number,
    NumberDash,
    Roman,
    Bullet,
    Off,
}

/// Fill in `prefix` for every card. Cards are visited in board order, so a
/// card's `above` already has its prefix. `order` maps ids to their index
/// in `cards`.
pub fn assign_prefixes(
    cards: &[Card],
    order: &HashMap<CardId, usize>,
    links: &mut Resolution,
    grid: f32,
) {
    for card in cards {
        let Some(l) = links.get(&card.id) else {
            continue;
        };
        let prefix = match (l.above, l.below) {
            (None, None) => Vec::new(),
            (None, Some(_)) => vec![1],
            (Some(above_id), _) => {
                let above = order.get(&above_id).map(|i| &cards[*i]);
                let mut p = links
                    .get(&above_id)
                    .map(|a| a.prefix.clone())
                    .unwrap_or_default();
                if p.is_empty() {
                    p.push(0);
                }
                let above_x = above.map(|a| a.position.x).unwrap_or(card.position.x);

                if above_x < card.position.x {
                    p.push(0);
                } else if above_x > card.position.x {
                    let levels = ((above_x - card.position.x) / grid).round() as usize;
                    let depth = p.len().saturating_sub(levels).max(1);
                    p.truncate(depth);
                }
                if let Some(last) = p.last_mut() {
                    *last += 1;
                }
                p
            }
        };
        if let Some(l) = links.get_mut(&card.id) {
            l.prefix = prefix;
        }
    }
}

/// Render a prefix. Unnumbered cards and `Off` render as an empty string.
pub fn render(prefix: &[u32], sequence: NumberingSequence, ignore_top_level: bool) -> String {
    let parts: &[u32] = if ignore_top_level && !prefix.is_empty() {
        &prefix[1..]
    } else {
        prefix
    };
    if parts.is_empty() {
        return String::new();
    }

    match sequence {
        NumberingSequence::Off => String::new(),
        NumberingSequence::Bullet => "•".to_string(),
        NumberingSequence::Number => {
            let mut out = parts
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(".");
            out.push('.');
            out
        }
        NumberingSequence::NumberDash => parts
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("-"),
        NumberingSequence::Roman => {
            let mut out = parts.iter().map(|n| roman(*n)).collect::<Vec<_>>().join(".");
            out.push('.');
            out
        }
    }
}

fn roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, glyph) in TABLE {
        while n >= *value {
            out.push_str(glyph);
            n -= value;
        }
    }
    out
}
