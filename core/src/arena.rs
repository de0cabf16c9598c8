use std::fmt;

use crate::block::Block;

#[derive(Clone, Debug, Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn insert(&mut self, block: Block) -> Result<(), ArenaError> {
        if self.get(&block.id).is_some() {
            return Err(ArenaError::DuplicateId(block.id));
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Block> {
        let idx = self.blocks.iter().position(|block| block.id == id)?;
        Some(self.blocks.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn by_top(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.id.cmp(&b.id)));
        blocks
    }

    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    DuplicateId(String),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::DuplicateId(id) => write!(f, "block id already placed: {id}"),
        }
    }
}

impl std::error::Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockParams};

    fn block(id: &str, y: f32) -> Block {
        Block::new(id, BlockParams::Stop, 0.0, y, 120.0, 60.0)
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut arena = BlockArena::new();
        arena.insert(block("stop-1", 0.0)).unwrap();
        let err = arena.insert(block("stop-1", 50.0)).unwrap_err();
        assert_eq!(err, ArenaError::DuplicateId("stop-1".to_string()));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn by_top_orders_vertically_with_id_tiebreak() {
        let mut arena = BlockArena::new();
        arena.insert(block("b", 40.0)).unwrap();
        arena.insert(block("a", 40.0)).unwrap();
        arena.insert(block("c", 10.0)).unwrap();
        let order: Vec<&str> = arena.by_top().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
