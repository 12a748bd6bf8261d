//! The protocol session: lifecycle state machine and UCI command surface.

mod handshake;

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::correlator::request;
use crate::process::{EngineIo, LineSubscription, ProcessSupervisor};
use crate::uci::parser::first_token;
use crate::uci::{parse_uci_move, tokens, GoParams, Move, UciCommand};
use crate::{EngineError, EngineInfo, EngineResult, SearchLimits, SessionConfig};

use handshake::Handshake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Started,
    Initialized,
    /// Terminal.
    Stopped,
}

/// A session with a single UCI engine.
///
/// Replies are correlated by shape only, so at most one request awaiting a
/// reply (handshake, ready check, best move or analysis) may be outstanding.
/// A second one fails with [`EngineError::RequestInFlight`].
pub struct EngineSession {
    pub(crate) config: SessionConfig,
    pub(crate) supervisor: ProcessSupervisor,
    state: SessionState,
    info: Option<EngineInfo>,
    request_slot: Arc<Semaphore>,
}

impl EngineSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            supervisor: ProcessSupervisor::new(&config),
            config,
            state: SessionState::NotStarted,
            info: None,
            request_slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identity captured by the last successful [`initialize`](Self::initialize).
    pub fn engine_info(&self) -> Option<&EngineInfo> {
        self.info.as_ref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    /// Spawn the configured engine executable.
    pub fn start(&mut self) -> EngineResult<()> {
        self.check_startable()?;
        self.supervisor.start()?;
        self.state = SessionState::Started;
        Ok(())
    }

    /// Run the session over an already-connected transport instead of a child process.
    pub fn attach(&mut self, io: EngineIo) -> EngineResult<()> {
        self.check_startable()?;
        self.supervisor.attach(io)?;
        self.state = SessionState::Started;
        Ok(())
    }

    fn check_startable(&self) -> EngineResult<()> {
        match self.state {
            SessionState::NotStarted => Ok(()),
            SessionState::Started | SessionState::Initialized => Err(EngineError::AlreadyRunning),
            SessionState::Stopped => Err(EngineError::SessionClosed),
        }
    }

    /// Perform the `uci` handshake.
    ///
    /// Bounded by [`SessionConfig::handshake_timeout`].
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn initialize(&mut self) -> EngineResult<EngineInfo> {
        match self.state {
            SessionState::Started => {}
            SessionState::Initialized => return Err(EngineError::AlreadyInitialized),
            SessionState::NotStarted | SessionState::Stopped => return Err(EngineError::NotRunning),
        }
        let _permit = self.acquire_request_slot()?;

        let timeout = self.config.handshake_timeout;
        let mut handshake = Handshake::default();
        request(&self.supervisor, &UciCommand::Uci, timeout, |line| {
            handshake.observe(line).then_some(())
        })
        .await
        .map_err(|e| match e {
            EngineError::RequestTimeout(after) => {
                tracing::error!("Timeout waiting for uciok");
                EngineError::HandshakeTimeout(after)
            }
            other => other,
        })?;

        let info = handshake.finish()?;
        tracing::info!(name = %info.name(), author = %info.author(), options = info.options().len(), "Engine initialized");
        self.info = Some(info.clone());
        self.state = SessionState::Initialized;
        Ok(info)
    }

    pub(crate) fn ensure_ready(&self) -> EngineResult<()> {
        if self.state != SessionState::Initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    /// Claim the single slot for a request that awaits a reply.
    pub(crate) fn acquire_request_slot(&self) -> EngineResult<OwnedSemaphorePermit> {
        Arc::clone(&self.request_slot)
            .try_acquire_owned()
            .map_err(|_| EngineError::RequestInFlight)
    }

    /// Write a raw command line to the engine.
    pub async fn send(&self, line: &str) -> EngineResult<()> {
        self.supervisor.send(line).await
    }

    /// Subscribe to every raw stdout line from now on.
    pub fn subscribe_stdout(&self) -> EngineResult<LineSubscription> {
        Ok(self.supervisor.stdout()?.subscribe())
    }

    /// Subscribe to every raw stderr line from now on.
    pub fn subscribe_stderr(&self) -> EngineResult<LineSubscription> {
        Ok(self.supervisor.stderr()?.subscribe())
    }

    pub async fn new_game(&self) -> EngineResult<()> {
        self.ensure_ready()?;
        self.supervisor.send_command(&UciCommand::NewGame).await
    }

    /// Set the position from `fen` (or the start position) plus `moves`.
    ///
    /// The FEN is passed through untouched.
    pub async fn set_position(&self, fen: Option<&str>, moves: &[Move]) -> EngineResult<()> {
        self.ensure_ready()?;
        tracing::info!("Setting position: FEN={:?}, moves={}", fen, moves.len());
        let cmd = UciCommand::Position {
            fen: fen.map(str::to_string),
            moves: moves.to_vec(),
        };
        self.supervisor.send_command(&cmd).await
    }

    /// Set an engine option. Names and values are not checked against the
    /// engine's declared options.
    pub async fn set_option(&self, name: &str, value: impl Display) -> EngineResult<()> {
        self.ensure_ready()?;
        let cmd = UciCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        };
        tracing::info!("Setting option: {}", cmd);
        self.supervisor.send_command(&cmd).await
    }

    /// Trigger a button-type option, which takes no value.
    pub async fn press_button(&self, name: &str) -> EngineResult<()> {
        self.ensure_ready()?;
        let cmd = UciCommand::SetOption {
            name: name.to_string(),
            value: None,
        };
        self.supervisor.send_command(&cmd).await
    }

    /// `isready` round trip. Returns `false` without sending anything when
    /// the session is not initialized.
    pub async fn is_ready(&self) -> EngineResult<bool> {
        if self.ensure_ready().is_err() {
            return Ok(false);
        }
        let _permit = self.acquire_request_slot()?;

        request(
            &self.supervisor,
            &UciCommand::IsReady,
            self.config.ready_timeout,
            |line| (line.trim() == tokens::READYOK).then_some(true),
        )
        .await
    }

    /// Search the current position and return the engine's chosen move.
    ///
    /// Bounded by [`SessionConfig::search_timeout`] whatever the limits. On
    /// timeout the engine keeps searching; the session should be torn down.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_best_move(&self, limits: SearchLimits) -> EngineResult<Move> {
        self.ensure_ready()?;
        let _permit = self.acquire_request_slot()?;

        let go = UciCommand::Go(GoParams::for_best_move(&limits));
        let result = request(&self.supervisor, &go, self.config.search_timeout, |line| {
            (first_token(line) == Some(tokens::BESTMOVE)).then(|| parse_bestmove(line))
        })
        .await;

        match result {
            Ok(mv) => {
                let mv = mv?;
                tracing::info!("Received bestmove: {}", mv);
                Ok(mv)
            }
            Err(EngineError::RequestTimeout(after)) => {
                tracing::warn!(
                    "Best move request timed out after {:?}; engine search is still running",
                    after
                );
                Err(EngineError::RequestTimeout(after))
            }
            Err(e) => Err(e),
        }
    }

    /// Ask the engine to end the current search. Analysis streams still end
    /// only when the engine reports its best move.
    pub async fn stop_analysis(&self) -> EngineResult<()> {
        self.ensure_ready()?;
        tracing::info!("Sending stop command to engine");
        self.supervisor.send_command(&UciCommand::Stop).await
    }

    /// Shut the engine down. Safe to call from any state, any number of times.
    pub async fn stop(&mut self) {
        self.supervisor.stop().await;
        if self.state != SessionState::Stopped {
            tracing::info!("Engine session stopped");
        }
        self.state = SessionState::Stopped;
    }
}

fn parse_bestmove(line: &str) -> EngineResult<Move> {
    let text = line.split_whitespace().nth(1).unwrap_or_default();
    parse_uci_move(text)
}
