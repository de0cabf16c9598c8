use burokku_core::dispatch::{plan_sequence, start_markers, DispatchError};
use burokku_core::BlockArena;
use tokio::time::{sleep, Duration};

use crate::cancel::CancelToken;
use crate::link::{LinkError, RobotLink};

/// Where the dispatcher writes wire lines. `RobotLink` is the real sink; a
/// failed send means the command was dropped, and the walk carries on.
pub trait CommandSink {
    fn send_line(&self, line: &str) -> Result<(), LinkError>;
}

impl CommandSink for RobotLink {
    fn send_line(&self, line: &str) -> Result<(), LinkError> {
        self.send(line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { sent: usize, dropped: usize },
    Cancelled { sent: usize },
}

/// Walks the blocks below one start marker strictly in order, holding the
/// declared duration after each command before issuing the next.
pub async fn run_sequence(
    arena: &BlockArena,
    marker_id: &str,
    sink: &impl CommandSink,
    cancel: &mut CancelToken,
) -> Result<RunOutcome, DispatchError> {
    let plan = plan_sequence(arena, marker_id)?;
    let mut sent = 0;
    let mut dropped = 0;
    for step in plan {
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled { sent });
        }
        match sink.send_line(&step.command.encode()) {
            Ok(()) => sent += 1,
            Err(_) => dropped += 1,
        }
        let hold = step.hold_secs();
        if hold > 0 {
            tokio::select! {
                _ = sleep(Duration::from_secs(hold)) => {}
                _ = cancel.cancelled() => return Ok(RunOutcome::Cancelled { sent }),
            }
        }
    }
    Ok(RunOutcome::Completed { sent, dropped })
}

/// Runs every start marker's sequence, top to bottom.
pub async fn run_program(
    arena: &BlockArena,
    sink: &impl CommandSink,
    cancel: &mut CancelToken,
) -> Result<RunOutcome, DispatchError> {
    let markers: Vec<String> = start_markers(arena)
        .into_iter()
        .map(|block| block.id.clone())
        .collect();
    let mut sent = 0;
    let mut dropped = 0;
    for marker_id in markers {
        match run_sequence(arena, &marker_id, sink, cancel).await? {
            RunOutcome::Completed {
                sent: s,
                dropped: d,
            } => {
                sent += s;
                dropped += d;
            }
            RunOutcome::Cancelled { sent: s } => {
                return Ok(RunOutcome::Cancelled { sent: sent + s })
            }
        }
    }
    Ok(RunOutcome::Completed { sent, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSource;
    use burokku_core::block::{Block, BlockParams, Direction};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct RecordingSink {
        lines: Mutex<Vec<(String, Instant)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
            }
        }

        fn lines(&self) -> Vec<(String, Instant)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl CommandSink for RecordingSink {
        fn send_line(&self, line: &str) -> Result<(), LinkError> {
            self.lines
                .lock()
                .unwrap()
                .push((line.to_string(), Instant::now()));
            Ok(())
        }
    }

    fn marker(id: &str, y: f32) -> Block {
        Block::new(id, BlockParams::Start, 200.0, y, 120.0, 40.0)
    }

    fn mover(id: &str, y: f32, speed: u8, duration_secs: u64) -> Block {
        Block::new(
            id,
            BlockParams::Move {
                direction: Direction::Forward,
                speed,
                duration_secs,
            },
            200.0,
            y,
            120.0,
            60.0,
        )
    }

    fn sample_arena() -> BlockArena {
        let mut arena = BlockArena::new();
        arena.insert(marker("start-1", 100.0)).unwrap();
        arena.insert(mover("move-1", 150.0, 50, 2)).unwrap();
        arena
            .insert(Block::new(
                "wait-1",
                BlockParams::Wait { duration_secs: 3 },
                200.0,
                210.0,
                120.0,
                60.0,
            ))
            .unwrap();
        arena
            .insert(Block::new(
                "stop-1",
                BlockParams::Stop,
                200.0,
                270.0,
                120.0,
                60.0,
            ))
            .unwrap();
        arena
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_holds_each_declared_duration() {
        let arena = sample_arena();
        let sink = RecordingSink::new();
        let source = CancelSource::new();
        let mut token = source.token();

        let begin = Instant::now();
        let outcome = run_sequence(&arena, "start-1", &sink, &mut token)
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Completed { sent: 3, dropped: 0 });

        let lines = sink.lines();
        let texts: Vec<&str> = lines.iter().map(|(line, _)| line.as_str()).collect();
        assert_eq!(texts, vec!["start 1 50 2", "stop 0 0 3", "stop 0 0 0"]);
        assert_eq!(lines[0].1 - begin, Duration::ZERO);
        assert_eq!(lines[1].1 - begin, Duration::from_secs(2));
        assert_eq!(lines[2].1 - begin, Duration::from_secs(5));
        // Plain stop holds nothing.
        assert_eq!(Instant::now() - begin, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_walk_mid_hold() {
        let arena = sample_arena();
        let sink = RecordingSink::new();
        let source = CancelSource::new();
        let mut token = source.token();

        let (outcome, _) = tokio::join!(
            run_sequence(&arena, "start-1", &sink, &mut token),
            async {
                sleep(Duration::from_secs(1)).await;
                source.cancel();
            }
        );
        assert_eq!(outcome.unwrap(), RunOutcome::Cancelled { sent: 1 });
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_sends_nothing() {
        let arena = sample_arena();
        let sink = RecordingSink::new();
        let source = CancelSource::new();
        let mut token = source.token();
        source.cancel();

        let outcome = run_sequence(&arena, "start-1", &sink, &mut token)
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { sent: 0 });
        assert!(sink.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_program_walks_markers_top_to_bottom() {
        let mut arena = BlockArena::new();
        arena.insert(marker("start-b", 400.0)).unwrap();
        arena.insert(marker("start-a", 100.0)).unwrap();
        arena.insert(mover("move-1", 150.0, 10, 0)).unwrap();
        arena.insert(mover("move-2", 460.0, 20, 0)).unwrap();

        let sink = RecordingSink::new();
        let source = CancelSource::new();
        let mut token = source.token();
        let outcome = run_program(&arena, &sink, &mut token).await.unwrap();
        // The upper marker sees both movers; the lower one only the block
        // below itself.
        assert_eq!(outcome, RunOutcome::Completed { sent: 3, dropped: 0 });
        let texts: Vec<String> = sink.lines().into_iter().map(|(line, _)| line).collect();
        assert_eq!(texts, vec!["start 1 10 0", "start 1 20 0", "start 1 20 0"]);
    }

    #[test]
    fn unknown_marker_is_an_error() {
        let arena = sample_arena();
        let err = plan_sequence(&arena, "start-9").unwrap_err();
        assert_eq!(err, DispatchError::UnknownBlock("start-9".to_string()));
    }
}
