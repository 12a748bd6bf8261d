//! In-process fake engine speaking UCI over `tokio::io::duplex`.

#![allow(dead_code)]

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use uci_engine::{EngineIo, EngineSession, SessionConfig};

/// What the fake engine does in reply to one command.
pub enum Reply {
    Lines(Vec<String>),
    /// Wait (in tokio time) before writing the lines.
    Delayed(std::time::Duration, Vec<String>),
    /// Write the lines, then close the engine's output.
    Hangup(Vec<String>),
}

pub fn lines(lines: &[&str]) -> Reply {
    Reply::Lines(lines.iter().map(|l| l.to_string()).collect())
}

/// Standard handshake and ready replies; everything else is silent.
pub fn standard_reply(cmd: &str) -> Reply {
    match cmd {
        "uci" => lines(&[
            "id name Fake Engine",
            "id author Tester",
            "option name Hash type spin default 16 min 1 max 1024",
            "option name Ponder type check default false",
            "uciok",
        ]),
        "isready" => lines(&["readyok"]),
        _ => lines(&[]),
    }
}

/// Attach a session to a fake engine driven by `respond`.
///
/// Returns the session (in `Started` state) and a receiver of every command
/// line the engine received.
pub fn fake_session<F>(
    config: SessionConfig,
    mut respond: F,
) -> (EngineSession, mpsc::UnboundedReceiver<String>)
where
    F: FnMut(&str) -> Reply + Send + 'static,
{
    let (stdin, engine_in) = tokio::io::duplex(4096);
    let (mut engine_out, stdout) = tokio::io::duplex(4096);
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut commands = BufReader::new(engine_in).lines();
        while let Ok(Some(cmd)) = commands.next_line().await {
            let _ = seen_tx.send(cmd.clone());
            if cmd == "quit" {
                break;
            }
            let (out, hangup) = match respond(&cmd) {
                Reply::Lines(out) => (out, false),
                Reply::Delayed(after, out) => {
                    tokio::time::sleep(after).await;
                    (out, false)
                }
                Reply::Hangup(out) => (out, true),
            };
            for line in out {
                if engine_out.write_all(format!("{}\n", line).as_bytes()).await.is_err() {
                    return;
                }
            }
            if hangup {
                return;
            }
        }
    });

    let mut session = EngineSession::new(config);
    session
        .attach(EngineIo::new(stdin, stdout))
        .expect("attach fake engine");
    (session, seen_rx)
}

/// Fake session that has already completed the handshake.
pub async fn initialized_session<F>(
    config: SessionConfig,
    mut respond: F,
) -> (EngineSession, mpsc::UnboundedReceiver<String>)
where
    F: FnMut(&str) -> Reply + Send + 'static,
{
    let (mut session, mut seen) = fake_session(config, move |cmd| match cmd {
        "uci" | "isready" => standard_reply(cmd),
        _ => respond(cmd),
    });
    session.initialize().await.expect("handshake");
    assert_eq!(seen.recv().await.as_deref(), Some("uci"));
    (session, seen)
}

pub fn config() -> SessionConfig {
    SessionConfig::new("fake-engine")
}
