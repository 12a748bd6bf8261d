//! `ucictl` - drive a UCI engine from the command line.
//!
//! Subcommands:
//! - `info`: run the handshake and print the engine's identity and options.
//! - `bestmove`: set a position and print the engine's chosen move.
//! - `analyze`: stream search progress for a position, one line per event.
//!
//! The engine executable comes from `--engine` or `UCI_ENGINE_PATH`. Session
//! timeouts honour the `UCI_*` variables read by [`SessionConfig::from_env`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio_stream::StreamExt;
use uci_engine::{AnalysisEvent, AnalysisLimits, EngineSession, Move, Score, SearchLimits, SessionConfig};

#[derive(Parser)]
#[command(name = "ucictl", about = "Talk to a UCI chess engine")]
struct Cli {
    /// Path to the engine executable.
    #[arg(long, env = "UCI_ENGINE_PATH")]
    engine: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine name, author and declared options.
    Info,
    /// Search a position and print the best move.
    Bestmove {
        #[command(flatten)]
        position: PositionArgs,
        #[arg(long)]
        depth: Option<u32>,
        /// Search time in milliseconds.
        #[arg(long)]
        movetime: Option<u64>,
        #[arg(long)]
        nodes: Option<u64>,
    },
    /// Stream analysis of a position.
    Analyze {
        #[command(flatten)]
        position: PositionArgs,
        #[arg(long)]
        depth: Option<u32>,
        /// Search time in milliseconds.
        #[arg(long)]
        movetime: Option<u64>,
        /// Without a depth or movetime, stop the search after this many seconds.
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

#[derive(Args)]
struct PositionArgs {
    /// Position in FEN; the start position when omitted.
    #[arg(long)]
    fen: Option<String>,
    /// Moves to play from the position, in UCI notation.
    #[arg(long, num_args = 1..)]
    moves: Vec<String>,
    /// Engine option as NAME=VALUE. May be repeated.
    #[arg(long = "option", value_parser = parse_option)]
    options: Vec<(String, String)>,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {:?}", s)),
    }
}

fn parse_moves(moves: &[String]) -> anyhow::Result<Vec<Move>> {
    moves
        .iter()
        .map(|m| m.parse::<Move>().with_context(|| format!("invalid move {:?}", m)))
        .collect()
}

fn format_event(event: &AnalysisEvent) -> String {
    let score = match event.score {
        Score::Centipawns(cp) => format!("cp {}", cp),
        Score::Mate(n) => format!("mate {}", n),
    };
    let pv: Vec<String> = event.pv.iter().map(Move::to_string).collect();
    format!(
        "depth {:>3}  {:<10} nodes {:>10}  time {:>6}ms  {}",
        event.depth,
        score,
        event.nodes,
        event.time_ms,
        pv.join(" ")
    )
}

async fn prepare(session: &EngineSession, position: &PositionArgs) -> anyhow::Result<()> {
    let moves = parse_moves(&position.moves)?;
    for (name, value) in &position.options {
        session.set_option(name, value).await?;
    }
    session.new_game().await?;
    session.set_position(position.fen.as_deref(), &moves).await?;
    if !session.is_ready().await? {
        bail!("engine did not report ready");
    }
    Ok(())
}

async fn run(session: &mut EngineSession, command: Commands) -> anyhow::Result<()> {
    session.start().context("failed to start engine")?;
    let info = session.initialize().await.context("handshake failed")?;
    tracing::debug!("Connected to {} by {}", info.name(), info.author());

    match command {
        Commands::Info => {
            println!("name:   {}", info.name());
            println!("author: {}", info.author());
            for declaration in info.options().values() {
                println!("{}", declaration);
            }
        }
        Commands::Bestmove {
            position,
            depth,
            movetime,
            nodes,
        } => {
            prepare(session, &position).await?;
            let best = session
                .get_best_move(SearchLimits {
                    depth,
                    movetime_ms: movetime,
                    nodes,
                })
                .await?;
            println!("{}", best);
        }
        Commands::Analyze {
            position,
            depth,
            movetime,
            seconds,
        } => {
            prepare(session, &position).await?;
            let limits = AnalysisLimits {
                depth,
                movetime_ms: movetime,
            };
            let unbounded = depth.is_none() && movetime.is_none();
            let mut events = session.analyze(limits).await?;
            let deadline = tokio::time::sleep(Duration::from_secs(seconds));
            tokio::pin!(deadline);
            let mut stop_sent = false;

            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(event) => println!("{}", format_event(&event)),
                        None => break,
                    },
                    _ = &mut deadline, if unbounded && !stop_sent => {
                        tracing::info!("Analysis time elapsed, stopping search");
                        session.stop_analysis().await?;
                        stop_sent = true;
                    }
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = EngineSession::new(SessionConfig::from_env(&cli.engine));

    let result = run(&mut session, cli.command).await;
    session.stop().await;
    result
}
