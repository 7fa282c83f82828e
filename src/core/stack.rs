//! Stack resolution: vertical neighbours and indentation children derived
//! from card positions.

use std::collections::HashMap;

use super::card::{Card, CardId, StackLinks};
use super::geometry::grid_steps;
use super::grid::GridIndex;
use super::numbering;
use crate::error::{PlanError, PlanResult};

/// Derived links for every card on a board.
pub type Resolution = HashMap<CardId, StackLinks>;

/// Fraction of a grid cell the neighbour probe reaches below a card.
pub const NEIGHBOR_TOLERANCE: f32 = 0.5;

/// Resolve neighbours, children and numbering prefixes.
///
/// `cards` must be in board order (y, then x). The result is checked before
/// it is returned; a failed check means a bug in the resolver.
pub fn resolve(cards: &[Card], grid: &GridIndex, board: usize) -> PlanResult<Resolution> {
    let g = grid.cell_size();
    let order: HashMap<CardId, usize> = cards.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    let mut links: Resolution = cards.iter().map(|c| (c.id, StackLinks::default())).collect();

    // Neighbours.
    for a in cards.iter().filter(|c| c.allows_neighbors()) {
        let probe = a.rect().translated(glam::Vec2::new(0.0, g * NEIGHBOR_TOLERANCE));
        let below = grid
            .in_rect(&probe)
            .into_iter()
            .filter_map(|id| order.get(&id).map(|i| &cards[*i]))
            .filter(|b| b.id != a.id && b.allows_neighbors())
            .filter(|b| b.position.y > a.position.y)
            .filter(|b| probe.intersects(&b.rect()))
            .filter(|b| links.get(&b.id).is_some_and(|l| l.above.is_none()))
            .min_by_key(|b| order[&b.id])
            .map(|b| b.id);

        if let Some(b) = below {
            if let Some(l) = links.get_mut(&a.id) {
                l.below = Some(b);
            }
            if let Some(l) = links.get_mut(&b) {
                l.above = Some(a.id);
            }
        }
    }

    // Children: direct indents below, until the stack dedents out.
    for a in cards {
        let mut children = Vec::new();
        let mut next = links.get(&a.id).and_then(|l| l.below);
        let mut guard = 0;
        while let Some(id) = next {
            guard += 1;
            if guard > cards.len() {
                return Err(PlanError::InvariantViolation {
                    board,
                    detail: format!("stack below card {} loops", a.id),
                });
            }
            let Some(b) = order.get(&id).map(|i| &cards[*i]) else {
                break;
            };
            let steps = grid_steps(a.position.x, b.position.x, g);
            if steps <= 0 {
                break;
            }
            if steps == 1 {
                children.push(b.id);
            }
            next = links.get(&b.id).and_then(|l| l.below);
        }
        if let Some(l) = links.get_mut(&a.id) {
            l.children = children;
        }
    }

    numbering::assign_prefixes(cards, &order, &mut links, g);
    verify(cards, &links, board)?;
    Ok(links)
}

/// Check the link invariants of a resolution.
pub fn verify(cards: &[Card], links: &Resolution, board: usize) -> PlanResult<()> {
    let kinds: HashMap<CardId, &Card> = cards.iter().map(|c| (c.id, c)).collect();
    for (id, l) in links {
        let violation = |detail: String| PlanError::InvariantViolation { board, detail };

        if let Some(b) = l.below {
            if links.get(&b).and_then(|o| o.above) != Some(*id) {
                return Err(violation(format!("card {} below {} does not point back", b, id)));
            }
        }
        if let Some(a) = l.above {
            if links.get(&a).and_then(|o| o.below) != Some(*id) {
                return Err(violation(format!("card {} above {} does not point back", a, id)));
            }
        }
        if let Some(card) = kinds.get(id) {
            if !card.allows_neighbors() && (l.above.is_some() || l.below.is_some()) {
                return Err(violation(format!("{} card {} has neighbours", card.kind(), id)));
            }
        }
        let alone = l.above.is_none() && l.below.is_none();
        if alone != l.prefix.is_empty() {
            return Err(violation(format!("card {} numbering does not match its stack", id)));
        }
    }
    Ok(())
}
