use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use burokku_core::block::{
    block_id, parse_duration_secs, parse_speed, Block, BlockKind, BlockParams, Direction,
};
use burokku_core::geometry::Rect;
use burokku_core::reflow::{closest_neighbor, reflow, ReflowOutcome, PREVIEW_DEBOUNCE_MS};
use burokku_core::BlockArena;

pub const BLOCK_WIDTH: f32 = 120.0;
pub const BLOCK_HEIGHT: f32 = 60.0;
pub const START_HEIGHT: f32 = 40.0;

pub const GHOST_DEBOUNCE: Duration = Duration::from_millis(PREVIEW_DEBOUNCE_MS);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteTemplate {
    pub kind: BlockKind,
    pub width: f32,
    pub height: f32,
}

pub const PALETTE: [PaletteTemplate; 4] = [
    PaletteTemplate {
        kind: BlockKind::Move,
        width: BLOCK_WIDTH,
        height: BLOCK_HEIGHT,
    },
    PaletteTemplate {
        kind: BlockKind::Stop,
        width: BLOCK_WIDTH,
        height: BLOCK_HEIGHT,
    },
    PaletteTemplate {
        kind: BlockKind::Wait,
        width: BLOCK_WIDTH,
        height: BLOCK_HEIGHT,
    },
    PaletteTemplate {
        kind: BlockKind::Start,
        width: BLOCK_WIDTH,
        height: START_HEIGHT,
    },
];

pub fn template_for(kind: BlockKind) -> PaletteTemplate {
    PALETTE
        .iter()
        .copied()
        .find(|t| t.kind == kind)
        .unwrap_or(PALETTE[0])
}

/// Where the dragged block would snap if released now.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostPreview {
    pub target_id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DropReport {
    pub block_id: String,
    pub outcome: ReflowOutcome,
}

#[derive(Debug, PartialEq)]
pub enum SessionError {
    UnknownBlock(String),
    DragInProgress,
    NoActiveDrag,
    WrongKind(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownBlock(id) => write!(f, "no block with id {id}"),
            SessionError::DragInProgress => write!(f, "another drag is already active"),
            SessionError::NoActiveDrag => write!(f, "no drag in progress"),
            SessionError::WrongKind(id) => {
                write!(f, "block {id} has no such parameter")
            }
        }
    }
}

impl std::error::Error for SessionError {}

struct DragState {
    id: String,
    offset: (f32, f32),
    from_palette: bool,
}

/// Headless editor state machine: one arena of placed blocks plus at most
/// one in-flight drag. Pointer coordinates are workspace coordinates; the
/// caller owns hit-testing and rendering.
pub struct EditorSession {
    arena: BlockArena,
    drag: Option<DragState>,
    ghost: Option<GhostPreview>,
    last_preview_at: Option<Instant>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::from_arena(BlockArena::new())
    }

    pub fn from_arena(arena: BlockArena) -> Self {
        Self {
            arena,
            drag: None,
            ghost: None,
            last_preview_at: None,
        }
    }

    pub fn arena(&self) -> &BlockArena {
        &self.arena
    }

    pub fn into_arena(self) -> BlockArena {
        self.arena
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.id.as_str())
    }

    /// Spawns a fresh block under the pointer and starts dragging it. The id
    /// comes from the template name and the wall clock; on a collision the
    /// timestamp is bumped until the id is free.
    pub fn begin_palette_drag(
        &mut self,
        kind: BlockKind,
        pointer: (f32, f32),
    ) -> Result<String, SessionError> {
        if self.drag.is_some() {
            return Err(SessionError::DragInProgress);
        }
        let template = template_for(kind);
        let mut stamp = now_ms();
        let mut id = block_id(kind, stamp);
        while self.arena.get(&id).is_some() {
            stamp += 1;
            id = block_id(kind, stamp);
        }
        let block = Block::new(
            id.clone(),
            BlockParams::defaults_for(kind),
            pointer.0,
            pointer.1,
            template.width,
            template.height,
        );
        if self.arena.insert(block).is_err() {
            return Err(SessionError::DragInProgress);
        }
        self.drag = Some(DragState {
            id: id.clone(),
            offset: (0.0, 0.0),
            from_palette: true,
        });
        self.ghost = None;
        self.last_preview_at = None;
        Ok(id)
    }

    /// Starts dragging an already placed block. The grab offset keeps the
    /// block from jumping under the pointer.
    pub fn begin_drag(&mut self, id: &str, pointer: (f32, f32)) -> Result<(), SessionError> {
        if self.drag.is_some() {
            return Err(SessionError::DragInProgress);
        }
        let block = self
            .arena
            .get(id)
            .ok_or_else(|| SessionError::UnknownBlock(id.to_string()))?;
        self.drag = Some(DragState {
            id: id.to_string(),
            offset: (pointer.0 - block.x, pointer.1 - block.y),
            from_palette: false,
        });
        self.ghost = None;
        self.last_preview_at = None;
        Ok(())
    }

    /// Updates the ghost preview for the current pointer position. Recomputes
    /// at most once per debounce window; inside the window the previous
    /// preview is returned unchanged.
    pub fn drag_move(
        &mut self,
        pointer: (f32, f32),
    ) -> Result<Option<GhostPreview>, SessionError> {
        let (drag_id, offset) = match &self.drag {
            Some(drag) => (drag.id.clone(), drag.offset),
            None => return Err(SessionError::NoActiveDrag),
        };
        let now = Instant::now();
        if let Some(last) = self.last_preview_at {
            if now.duration_since(last) < GHOST_DEBOUNCE {
                return Ok(self.ghost.clone());
            }
        }
        self.last_preview_at = Some(now);

        let block = self
            .arena
            .get(&drag_id)
            .ok_or_else(|| SessionError::UnknownBlock(drag_id.clone()))?;
        let rect = Rect::new(
            pointer.0 - offset.0,
            pointer.1 - offset.1,
            block.width,
            block.height,
        );
        self.ghost = closest_neighbor(&self.arena, &rect, &drag_id).map(|target| {
            let target_rect = target.rect();
            let (x, y) = if rect.center().1 < target_rect.center().1 {
                rect.snap_above(&target_rect)
            } else {
                rect.snap_below(&target_rect)
            };
            GhostPreview {
                target_id: target.id.clone(),
                x,
                y,
            }
        });
        Ok(self.ghost.clone())
    }

    /// Releases the dragged block at the pointer and reflows the layout
    /// around it.
    pub fn drop_block(&mut self, pointer: (f32, f32)) -> Result<DropReport, SessionError> {
        let drag = self.drag.take().ok_or(SessionError::NoActiveDrag)?;
        self.ghost = None;
        self.last_preview_at = None;
        let block = self
            .arena
            .get_mut(&drag.id)
            .ok_or_else(|| SessionError::UnknownBlock(drag.id.clone()))?;
        block.x = pointer.0 - drag.offset.0;
        block.y = pointer.1 - drag.offset.1;
        let outcome = reflow(&mut self.arena, Some(&drag.id));
        Ok(DropReport {
            block_id: drag.id,
            outcome,
        })
    }

    /// Abandons the drag. A block that never left the palette is removed;
    /// an existing block stays where it was.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if drag.from_palette {
                self.arena.remove(&drag.id);
            }
        }
        self.ghost = None;
        self.last_preview_at = None;
    }

    pub fn set_move_direction(&mut self, id: &str, raw: &str) -> Result<Direction, SessionError> {
        let block = self
            .arena
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownBlock(id.to_string()))?;
        match &mut block.params {
            BlockParams::Move { direction, .. } => {
                *direction = Direction::parse(raw);
                Ok(*direction)
            }
            _ => Err(SessionError::WrongKind(id.to_string())),
        }
    }

    pub fn set_move_speed(&mut self, id: &str, raw: &str) -> Result<u8, SessionError> {
        let block = self
            .arena
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownBlock(id.to_string()))?;
        match &mut block.params {
            BlockParams::Move { speed, .. } => {
                *speed = parse_speed(raw);
                Ok(*speed)
            }
            _ => Err(SessionError::WrongKind(id.to_string())),
        }
    }

    pub fn set_duration(&mut self, id: &str, raw: &str) -> Result<u64, SessionError> {
        let block = self
            .arena
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownBlock(id.to_string()))?;
        match &mut block.params {
            BlockParams::Move { duration_secs, .. } | BlockParams::Wait { duration_secs } => {
                *duration_secs = parse_duration_secs(raw);
                Ok(*duration_secs)
            }
            _ => Err(SessionError::WrongKind(id.to_string())),
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
