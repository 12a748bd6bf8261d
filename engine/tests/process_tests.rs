//! Lifecycle tests against real child processes (small `/bin/sh` engines).

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_stream::StreamExt;
use uci_engine::{AnalysisLimits, EngineError, EngineSession, SearchLimits, SessionConfig, SessionState};

const SHELL_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci)
      echo "id name Shell Engine"
      echo "id author Script"
      echo "option name Hash type spin default 16 min 1 max 64"
      echo "uciok"
      ;;
    isready)
      echo "engine is warm" >&2
      echo "readyok"
      ;;
    go*)
      echo "info depth 1 score cp 12 nodes 20 time 1 pv e2e4"
      echo "info depth 2 score cp 8 nodes 90 time 2 pv e2e4 e7e5"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

const STUBBORN_ENGINE: &str = r#"#!/bin/sh
trap '' TERM
while read -r line; do
  case "$line" in
    uci) echo "id name Stubborn"; echo "uciok" ;;
  esac
done
sleep 60
"#;

fn write_engine(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn full_session_against_a_child_process() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_engine(dir.path(), "shell-engine", SHELL_ENGINE);
    let mut session = EngineSession::new(SessionConfig::new(&path));

    session.start().unwrap();
    assert!(session.pid().is_some());
    assert!(matches!(session.start(), Err(EngineError::AlreadyRunning)));

    let info = session.initialize().await.unwrap();
    assert_eq!(info.name(), "Shell Engine");
    assert_eq!(info.author(), "Script");
    assert!(info.option("Hash").is_some());

    let mut stderr = session.subscribe_stderr().unwrap();
    assert!(session.is_ready().await.unwrap());
    let warm = tokio::time::timeout(Duration::from_secs(5), stderr.next_line())
        .await
        .unwrap();
    assert_eq!(warm.as_deref(), Some("engine is warm"));

    session.new_game().await.unwrap();
    session.set_position(None, &[]).await.unwrap();
    let best = session
        .get_best_move(SearchLimits {
            depth: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(best.to_string(), "e2e4");

    let events: Vec<_> = session
        .analyze(AnalysisLimits::default())
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].pv.len(), 2);

    session.stop().await;
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.pid().is_none());
}

#[tokio::test]
async fn stop_kills_an_engine_that_ignores_quit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_engine(dir.path(), "stubborn-engine", STUBBORN_ENGINE);
    let mut session = EngineSession::new(SessionConfig::new(&path));

    session.start().unwrap();
    session.initialize().await.unwrap();
    let mut stdout = session.subscribe_stdout().unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.stop())
        .await
        .expect("stop should not hang");
    assert_eq!(stdout.next_line().await, None);
}

#[tokio::test]
async fn missing_executable_is_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = EngineSession::new(SessionConfig::new(dir.path().join("no-such-engine")));

    assert!(matches!(session.start(), Err(EngineError::SpawnFailed(_))));
    assert_eq!(session.state(), SessionState::NotStarted);
    session.stop().await;
    assert_eq!(session.state(), SessionState::Stopped);
}
