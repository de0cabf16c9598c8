use serde::{Deserialize, Serialize};

use crate::arena::{ArenaError, BlockArena};
use crate::block::Block;

/// Operator-edited layout file: the blocks currently on the canvas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub blocks: Vec<Block>,
}

impl Program {
    pub fn into_arena(self) -> Result<BlockArena, ArenaError> {
        let mut arena = BlockArena::new();
        for block in self.blocks {
            arena.insert(block)?;
        }
        Ok(arena)
    }

    pub fn from_arena(arena: &BlockArena) -> Program {
        Program {
            blocks: arena.iter().cloned().collect(),
        }
    }
}
