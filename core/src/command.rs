use crate::block::{Block, BlockParams, Direction, SPEED_MAX};

/// One outbound wire frame. The robot accepts two verbs; a wait is a stop
/// that carries the wait duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start {
        direction: Direction,
        speed: u8,
        duration_secs: u64,
    },
    Stop {
        duration_secs: u64,
    },
}

impl Command {
    pub fn from_block(block: &Block) -> Option<Command> {
        match &block.params {
            BlockParams::Move {
                direction,
                speed,
                duration_secs,
            } => Some(Command::Start {
                direction: *direction,
                speed: (*speed).min(SPEED_MAX),
                duration_secs: *duration_secs,
            }),
            BlockParams::Stop => Some(Command::Stop { duration_secs: 0 }),
            BlockParams::Wait { duration_secs } => Some(Command::Stop {
                duration_secs: *duration_secs,
            }),
            BlockParams::Start => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Command::Start {
                direction,
                speed,
                duration_secs,
            } => format!("start {} {} {}", direction.code(), speed, duration_secs),
            Command::Stop { duration_secs } => format!("stop 0 0 {duration_secs}"),
        }
    }

    /// How long the dispatcher holds before the next command.
    pub fn hold_secs(&self) -> u64 {
        match self {
            Command::Start { duration_secs, .. } => *duration_secs,
            Command::Stop { duration_secs } => *duration_secs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerFrame {
    Error(String),
    Info(String),
}

pub fn classify_frame(raw: &str) -> ServerFrame {
    match raw.strip_prefix("error:") {
        Some(detail) => ServerFrame::Error(detail.trim().to_string()),
        None => ServerFrame::Info(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    fn block(params: BlockParams) -> Block {
        Block::new("b", params, 0.0, 0.0, 120.0, 60.0)
    }

    #[test]
    fn move_encodes_four_tokens() {
        let cmd = Command::from_block(&block(BlockParams::Move {
            direction: Direction::Right,
            speed: 70,
            duration_secs: 2,
        }))
        .unwrap();
        assert_eq!(cmd.encode(), "start 3 70 2");
        assert_eq!(cmd.hold_secs(), 2);
    }

    #[test]
    fn stop_zeroes_direction_and_speed() {
        let cmd = Command::from_block(&block(BlockParams::Stop)).unwrap();
        assert_eq!(cmd.encode(), "stop 0 0 0");
        assert_eq!(cmd.hold_secs(), 0);
    }

    #[test]
    fn wait_is_a_stop_carrying_the_duration() {
        let cmd = Command::from_block(&block(BlockParams::Wait { duration_secs: 5 })).unwrap();
        assert_eq!(cmd.encode(), "stop 0 0 5");
        assert_eq!(cmd.hold_secs(), 5);
    }

    #[test]
    fn start_markers_do_not_serialize() {
        assert_eq!(Command::from_block(&block(BlockParams::Start)), None);
    }

    #[test]
    fn inbound_error_frames_are_classified() {
        assert_eq!(
            classify_frame("error: invalid speed value"),
            ServerFrame::Error("invalid speed value".to_string())
        );
        assert_eq!(classify_frame("ok"), ServerFrame::Info("ok".to_string()));
        assert_eq!(
            classify_frame("Connected"),
            ServerFrame::Info("Connected".to_string())
        );
    }
}
