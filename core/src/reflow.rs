use crate::arena::BlockArena;
use crate::geometry::Rect;

pub const TIE_EPSILON: f32 = 10.0;
pub const BAND_WIDTH: f32 = 20.0;
pub const SNAP_GAP: f32 = 4.0;
pub const MAX_DISPLACE_DEPTH: u32 = 10;
pub const PREVIEW_DEBOUNCE_MS: u64 = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReflowOutcome {
    pub moved: Vec<String>,
    pub placement_failed: bool,
}

/// Recomputes block positions so that horizontally aligned neighbours form
/// gap-free vertical stacks. The block named by `changed` (a just-dropped
/// block) is placed first; a block with no close neighbour is left in place
/// and flags the outcome instead of failing.
pub fn reflow(arena: &mut BlockArena, changed: Option<&str>) -> ReflowOutcome {
    let mut outcome = ReflowOutcome::default();
    let count = arena.blocks().len();
    if count < 2 {
        if count == 1 {
            outcome.placement_failed = true;
        }
        return outcome;
    }

    let mut order = sorted_indices(arena);
    let mut changed_idx = None;
    if let Some(id) = changed {
        if let Some(pos) = order
            .iter()
            .position(|&idx| arena.blocks()[idx].id == id)
        {
            let idx = order.remove(pos);
            order.insert(0, idx);
            changed_idx = Some(idx);
        }
    }

    let mut processed = vec![false; count];
    for &idx in &order {
        if processed[idx] {
            continue;
        }
        let placed = place(arena, idx, &mut processed, 0, &mut outcome);
        // A dropped block with nothing near it means the drop landed in the
        // void; leave the rest of the layout untouched.
        if !placed && changed_idx == Some(idx) {
            return outcome;
        }
    }
    outcome
}

fn sorted_indices(arena: &BlockArena) -> Vec<usize> {
    let blocks = arena.blocks();
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by(|&a, &b| {
        blocks[a]
            .y
            .total_cmp(&blocks[b].y)
            .then_with(|| blocks[a].id.cmp(&blocks[b].id))
    });
    order
}

struct Candidate {
    idx: usize,
    horizontal: f32,
    seam: f32,
}

fn place(
    arena: &mut BlockArena,
    idx: usize,
    processed: &mut [bool],
    depth: u32,
    outcome: &mut ReflowOutcome,
) -> bool {
    if depth > MAX_DISPLACE_DEPTH {
        // Safety valve against cyclic displacement.
        outcome.placement_failed = true;
        return false;
    }

    let rect = arena.blocks()[idx].rect();
    let mut close = close_elements(arena, Some(idx), &rect);
    if close.is_empty() {
        outcome.placement_failed = true;
        return false;
    }
    sort_candidates(arena, &mut close);
    let anchor_idx = close[0].idx;
    let anchor = arena.blocks()[anchor_idx].rect();

    let new_y = if rect.center().1 < anchor.center().1 {
        stacked_seam_above(arena, processed, idx, &anchor) - rect.height
    } else {
        stacked_seam_below(arena, processed, idx, &anchor)
    };
    let new_x = anchor.x;

    {
        let block = &mut arena.blocks_mut()[idx];
        if block.x != new_x || block.y != new_y {
            block.x = new_x;
            block.y = new_y;
            outcome.moved.push(block.id.clone());
        }
    }
    processed[idx] = true;

    // Anything still unprocessed that now overlaps the placed block inside
    // its band gets displaced in turn.
    let placed = arena.blocks()[idx].rect();
    let mut displaced: Vec<usize> = (0..arena.blocks().len())
        .filter(|&j| j != idx && !processed[j])
        .filter(|&j| {
            let other = arena.blocks()[j].rect();
            other.horizontal_distance(&placed) < BAND_WIDTH
                && other.vertical_overlap(&placed) > SNAP_GAP
        })
        .collect();
    displaced.sort_by(|&a, &b| {
        arena.blocks()[a]
            .y
            .total_cmp(&arena.blocks()[b].y)
            .then_with(|| arena.blocks()[a].id.cmp(&arena.blocks()[b].id))
    });
    for j in displaced {
        if !processed[j] {
            place(arena, j, processed, depth + 1, outcome);
        }
    }
    true
}

/// The snap target a block at `rect` would be placed against, if any.
/// Shared by the drag ghost preview so it predicts the reflow result.
pub fn closest_neighbor<'a>(
    arena: &'a crate::arena::BlockArena,
    rect: &Rect,
    exclude_id: &str,
) -> Option<&'a crate::block::Block> {
    let skip = arena.blocks().iter().position(|b| b.id == exclude_id);
    let mut close = close_elements(arena, skip, rect);
    if close.is_empty() {
        return None;
    }
    sort_candidates(arena, &mut close);
    Some(&arena.blocks()[close[0].idx])
}

fn close_elements(arena: &BlockArena, skip: Option<usize>, rect: &Rect) -> Vec<Candidate> {
    arena
        .blocks()
        .iter()
        .enumerate()
        .filter(|&(j, _)| Some(j) != skip)
        .filter_map(|(j, other)| {
            let other_rect = other.rect();
            let horizontal = rect.horizontal_distance(&other_rect);
            let seam = rect.seam_distance(&other_rect);
            if horizontal < rect.width && seam < rect.height {
                Some(Candidate {
                    idx: j,
                    horizontal,
                    seam,
                })
            } else {
                None
            }
        })
        .collect()
}

fn sort_candidates(arena: &BlockArena, close: &mut [Candidate]) {
    close.sort_by(|a, b| {
        let order = if (a.horizontal - b.horizontal).abs() < TIE_EPSILON {
            // Horizontal distances are as good as equal; the tighter seam wins.
            a.seam.total_cmp(&b.seam)
        } else {
            (a.horizontal + a.seam).total_cmp(&(b.horizontal + b.seam))
        };
        order.then_with(|| {
            let ba = &arena.blocks()[a.idx];
            let bb = &arena.blocks()[b.idx];
            ba.y.total_cmp(&bb.y).then_with(|| ba.id.cmp(&bb.id))
        })
    });
}

// Walks the chain of already-processed blocks stacked flush under the anchor
// (seams within the snap gap count as flush) and returns the first free seam.
fn stacked_seam_below(arena: &BlockArena, processed: &[bool], idx: usize, anchor: &Rect) -> f32 {
    let mut seam = anchor.bottom();
    let mut advanced = true;
    while advanced {
        advanced = false;
        for (j, block) in arena.blocks().iter().enumerate() {
            if j == idx || !processed[j] {
                continue;
            }
            let r = block.rect();
            if (r.x - anchor.x).abs() < BAND_WIDTH && (r.y - seam).abs() <= SNAP_GAP {
                seam = r.bottom();
                advanced = true;
            }
        }
    }
    seam
}

fn stacked_seam_above(arena: &BlockArena, processed: &[bool], idx: usize, anchor: &Rect) -> f32 {
    let mut seam = anchor.y;
    let mut advanced = true;
    while advanced {
        advanced = false;
        for (j, block) in arena.blocks().iter().enumerate() {
            if j == idx || !processed[j] {
                continue;
            }
            let r = block.rect();
            if (r.x - anchor.x).abs() < BAND_WIDTH && (r.bottom() - seam).abs() <= SNAP_GAP {
                seam = r.y;
                advanced = true;
            }
        }
    }
    seam
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockParams};

    #[test]
    fn displacement_past_the_depth_bound_flags_and_abandons() {
        let mut arena = BlockArena::new();
        arena
            .insert(Block::new("stop-1", BlockParams::Stop, 200.0, 0.0, 120.0, 60.0))
            .unwrap();
        arena
            .insert(Block::new("stop-2", BlockParams::Stop, 200.0, 58.0, 120.0, 60.0))
            .unwrap();

        let mut processed = vec![false; arena.len()];
        let mut outcome = ReflowOutcome::default();
        let placed = place(
            &mut arena,
            1,
            &mut processed,
            MAX_DISPLACE_DEPTH + 1,
            &mut outcome,
        );

        assert!(!placed);
        assert!(outcome.placement_failed);
        assert!(outcome.moved.is_empty());
        // The abandoned block keeps its position and stays unprocessed.
        assert_eq!(arena.get("stop-2").unwrap().y, 58.0);
        assert!(!processed[1]);
    }
}
