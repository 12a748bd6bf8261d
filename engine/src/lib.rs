//! Asynchronous client for engines speaking the UCI protocol.
//!
//! An [`EngineSession`] owns one engine process, performs the `uci`
//! handshake, and exposes the command surface: positions, options, single
//! best-move requests and streaming analysis.

pub mod analysis;
pub mod config;
pub mod correlator;
pub mod error;
pub mod process;
pub mod session;
pub mod uci;

pub use analysis::AnalysisStream;
pub use config::SessionConfig;
pub use error::{EngineError, EngineResult};
pub use process::{EngineIo, LineChannel, LineSubscription, ProcessSupervisor, StreamKind};
pub use session::{EngineSession, SessionState};
pub use uci::{parse_info_line, parse_uci_move, Move, Promotion, UciCommand};

use std::collections::BTreeMap;

/// Identity and option inventory reported by the engine during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    name: String,
    author: String,
    options: BTreeMap<String, String>,
}

impl EngineInfo {
    pub(crate) fn new(name: String, author: String, options: BTreeMap<String, String>) -> Self {
        Self {
            name,
            author,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Raw `option name ...` declarations keyed by the first word of the option name.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

impl Score {
    pub fn centipawns(self) -> Option<i32> {
        match self {
            Self::Centipawns(cp) => Some(cp),
            Self::Mate(_) => None,
        }
    }
}

/// One parsed search progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisEvent {
    pub depth: u32,
    pub score: Score,
    pub pv: Vec<Move>, // Principal variation
    pub nodes: u64,
    pub time_ms: u64,
}

impl AnalysisEvent {
    pub fn score_centipawns(&self) -> Option<i32> {
        self.score.centipawns()
    }
}

/// Limits for a single best-move search. With none set, the search is
/// bounded to [`uci::DEFAULT_MOVETIME_MS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub nodes: Option<u64>,
}

/// Limits for streaming analysis. With none set, the engine searches until stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisLimits {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
}
