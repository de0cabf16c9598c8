pub mod arena;
pub mod block;
pub mod command;
pub mod dispatch;
pub mod geometry;
pub mod program;
pub mod reflow;

pub use arena::{ArenaError, BlockArena};
pub use block::{
    block_id, clamp_speed, parse_duration_secs, parse_speed, Block, BlockKind, BlockParams,
    Direction,
};
pub use command::{classify_frame, Command, ServerFrame};
pub use dispatch::{plan_sequence, sequence_below, start_markers, DispatchError, PlanStep};
pub use geometry::Rect;
pub use program::Program;
pub use reflow::{reflow, ReflowOutcome};
