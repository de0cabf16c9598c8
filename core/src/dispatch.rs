use std::fmt;

use crate::arena::BlockArena;
use crate::block::{Block, BlockKind};
use crate::command::Command;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanStep {
    pub block_id: String,
    pub command: Command,
}

impl PlanStep {
    pub fn hold_secs(&self) -> u64 {
        self.command.hold_secs()
    }
}

pub fn start_markers(arena: &BlockArena) -> Vec<&Block> {
    arena
        .by_top()
        .into_iter()
        .filter(|block| block.kind() == BlockKind::Start)
        .collect()
}

/// Dispatchable blocks strictly below the marker's bottom edge, ascending by
/// top. Equal tops keep arena order (stable sort); ordering between such
/// blocks is a documented limitation of the layout model.
pub fn sequence_below<'a>(arena: &'a BlockArena, marker: &Block) -> Vec<&'a Block> {
    let cutoff = marker.rect().bottom();
    let mut below: Vec<&Block> = arena
        .iter()
        .filter(|block| block.kind().is_dispatchable() && block.y > cutoff)
        .collect();
    below.sort_by(|a, b| a.y.total_cmp(&b.y));
    below
}

pub fn plan_sequence(arena: &BlockArena, marker_id: &str) -> Result<Vec<PlanStep>, DispatchError> {
    let marker = arena
        .get(marker_id)
        .ok_or_else(|| DispatchError::UnknownBlock(marker_id.to_string()))?;
    if marker.kind() != BlockKind::Start {
        return Err(DispatchError::NotAStart(marker_id.to_string()));
    }
    let steps = sequence_below(arena, marker)
        .into_iter()
        .filter_map(|block| {
            Command::from_block(block).map(|command| PlanStep {
                block_id: block.id.clone(),
                command,
            })
        })
        .collect();
    Ok(steps)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    UnknownBlock(String),
    NotAStart(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownBlock(id) => write!(f, "no block with id {id}"),
            DispatchError::NotAStart(id) => write!(f, "block {id} is not a start marker"),
        }
    }
}

impl std::error::Error for DispatchError {}
