use std::path::PathBuf;

use burokku::cancel::CancelSource;
use burokku::dispatcher::{run_program, RunOutcome};
use burokku::link::{LinkConfig, RobotLink, DEFAULT_ENDPOINT};
use burokku_core::dispatch::{plan_sequence, start_markers};
use burokku_core::program::Program;
use burokku_core::reflow::reflow;
use burokku_core::BlockArena;
use clap::{Parser, Subcommand};
use tokio::time::{timeout, Duration};

#[derive(Parser)]
#[command(name = "burokku-cli", version, about = "Block program tools for the robot controller")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a layout file and print the command sequences it would send.
    Check {
        #[arg(long)]
        program: PathBuf,
    },
    /// Run a layout against the robot, marker by marker.
    Run {
        #[arg(long)]
        program: PathBuf,
        #[arg(long, env = "ROBOT_WS_URL", default_value = DEFAULT_ENDPOINT)]
        url: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Send one raw command line and print what the robot answers.
    Send {
        #[arg(long, env = "ROBOT_WS_URL", default_value = DEFAULT_ENDPOINT)]
        url: String,
        line: String,
        #[arg(long, default_value_t = 3)]
        listen_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { program } => {
            let mut arena = load_program(&program)?;
            let outcome = reflow(&mut arena, None);
            if !outcome.moved.is_empty() {
                println!("reflow moved {} block(s)", outcome.moved.len());
            }
            if outcome.placement_failed {
                eprintln!("some blocks could not be placed, move them manually");
            }
            print_plans(&arena)?;
        }
        Commands::Run {
            program,
            url,
            dry_run,
        } => {
            let mut arena = load_program(&program)?;
            let outcome = reflow(&mut arena, None);
            if outcome.placement_failed {
                eprintln!("some blocks could not be placed, move them manually");
            }
            if dry_run {
                print_plans(&arena)?;
                return Ok(());
            }

            let link = RobotLink::connect(LinkConfig::new(url))?;
            timeout(Duration::from_secs(10), link.wait_open()).await?;

            let cancel = CancelSource::new();
            let mut token = cancel.token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("interrupted, stopping after the current command");
                    cancel.cancel();
                }
            });

            match run_program(&arena, &link, &mut token).await? {
                RunOutcome::Completed { sent, dropped } => {
                    println!("done: {sent} command(s) sent, {dropped} dropped");
                }
                RunOutcome::Cancelled { sent } => {
                    println!("cancelled after {sent} command(s)");
                }
            }
        }
        Commands::Send {
            url,
            line,
            listen_secs,
        } => {
            let mut link = RobotLink::connect(LinkConfig::new(url))?;
            timeout(Duration::from_secs(10), link.wait_open()).await?;
            link.send(&line)?;

            let mut frames = match link.take_frames() {
                Some(frames) => frames,
                None => return Ok(()),
            };
            let window = Duration::from_secs(listen_secs);
            while let Ok(Some(frame)) = timeout(window, frames.recv()).await {
                println!("server: {frame:?}");
            }
        }
    }

    Ok(())
}

fn load_program(path: &PathBuf) -> Result<BlockArena, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let program: Program = serde_json::from_str(&text)?;
    Ok(program.into_arena()?)
}

fn print_plans(arena: &BlockArena) -> Result<(), Box<dyn std::error::Error>> {
    let markers: Vec<String> = start_markers(arena)
        .into_iter()
        .map(|block| block.id.clone())
        .collect();
    if markers.is_empty() {
        println!("no start markers in this layout");
        return Ok(());
    }
    for marker_id in markers {
        println!("{marker_id}:");
        let plan = plan_sequence(arena, &marker_id)?;
        if plan.is_empty() {
            println!("  (no blocks below)");
        }
        for step in plan {
            println!("  {}  # {}", step.command.encode(), step.block_id);
        }
    }
    Ok(())
}
