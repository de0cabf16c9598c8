use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

pub const SPEED_MIN: u8 = 0;
pub const SPEED_MAX: u8 = 100;
pub const DEFAULT_SPEED: u8 = 0;
pub const DEFAULT_DURATION_SECS: u64 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Back,
    Right,
    Left,
}

impl Direction {
    pub fn code(self) -> u8 {
        match self {
            Direction::Forward => 1,
            Direction::Back => 2,
            Direction::Right => 3,
            Direction::Left => 4,
        }
    }

    pub fn parse(raw: &str) -> Direction {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "forward" => Direction::Forward,
            "2" | "back" => Direction::Back,
            "3" | "right" => Direction::Right,
            "4" | "left" => Direction::Left,
            _ => Direction::Forward,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Move,
    Stop,
    Wait,
    Start,
}

impl BlockKind {
    pub fn template_name(self) -> &'static str {
        match self {
            BlockKind::Move => "move",
            BlockKind::Stop => "stop",
            BlockKind::Wait => "wait",
            BlockKind::Start => "start",
        }
    }

    pub fn is_dispatchable(self) -> bool {
        !matches!(self, BlockKind::Start)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockParams {
    Move {
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_speed")]
        speed: u8,
        #[serde(default = "default_duration")]
        duration_secs: u64,
    },
    Stop,
    Wait {
        #[serde(default = "default_duration")]
        duration_secs: u64,
    },
    Start,
}

fn default_speed() -> u8 {
    DEFAULT_SPEED
}

fn default_duration() -> u64 {
    DEFAULT_DURATION_SECS
}

impl BlockParams {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockParams::Move { .. } => BlockKind::Move,
            BlockParams::Stop => BlockKind::Stop,
            BlockParams::Wait { .. } => BlockKind::Wait,
            BlockParams::Start => BlockKind::Start,
        }
    }

    pub fn defaults_for(kind: BlockKind) -> BlockParams {
        match kind {
            BlockKind::Move => BlockParams::Move {
                direction: Direction::Forward,
                speed: DEFAULT_SPEED,
                duration_secs: DEFAULT_DURATION_SECS,
            },
            BlockKind::Stop => BlockParams::Stop,
            BlockKind::Wait => BlockParams::Wait {
                duration_secs: DEFAULT_DURATION_SECS,
            },
            BlockKind::Start => BlockParams::Start,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub params: BlockParams,
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        params: BlockParams,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            params,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.params.kind()
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

pub fn block_id(kind: BlockKind, now_ms: u64) -> String {
    format!("{}-{}", kind.template_name(), now_ms)
}

pub fn clamp_speed(value: i64) -> u8 {
    value.clamp(SPEED_MIN as i64, SPEED_MAX as i64) as u8
}

pub fn parse_speed(raw: &str) -> u8 {
    raw.trim()
        .parse::<i64>()
        .map(clamp_speed)
        .unwrap_or(DEFAULT_SPEED)
}

pub fn parse_duration_secs(raw: &str) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(DEFAULT_DURATION_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_clamped() {
        assert_eq!(clamp_speed(-5), 0);
        assert_eq!(clamp_speed(150), 100);
        assert_eq!(clamp_speed(50), 50);
    }

    #[test]
    fn speed_parse_defaults_on_garbage() {
        assert_eq!(parse_speed("42"), 42);
        assert_eq!(parse_speed("999"), 100);
        assert_eq!(parse_speed("-1"), 0);
        assert_eq!(parse_speed("fast"), 0);
        assert_eq!(parse_speed(""), 0);
    }

    #[test]
    fn duration_parse_defaults_to_one() {
        assert_eq!(parse_duration_secs("3"), 3);
        assert_eq!(parse_duration_secs(""), 1);
        assert_eq!(parse_duration_secs("-2"), 1);
        assert_eq!(parse_duration_secs("abc"), 1);
    }

    #[test]
    fn direction_parse_accepts_codes_and_names() {
        assert_eq!(Direction::parse("2"), Direction::Back);
        assert_eq!(Direction::parse("LEFT"), Direction::Left);
        assert_eq!(Direction::parse(""), Direction::Forward);
        assert_eq!(Direction::parse("sideways"), Direction::Forward);
    }

    #[test]
    fn block_id_embeds_template_and_timestamp() {
        assert_eq!(block_id(BlockKind::Move, 1712345), "move-1712345");
        assert_eq!(block_id(BlockKind::Start, 7), "start-7");
    }
}
