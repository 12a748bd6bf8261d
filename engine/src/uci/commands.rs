use std::fmt;

use crate::uci::moves::Move;
use crate::{AnalysisLimits, SearchLimits};

/// Default search bound used when a best-move request names no limit.
pub const DEFAULT_MOVETIME_MS: u64 = 1000;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    Position { fen: Option<String>, moves: Vec<Move> },
    SetOption { name: String, value: Option<String> },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime: Option<u64>, // Move time in milliseconds
    pub nodes: Option<u64>,
    pub infinite: bool, // Search until "stop"
}

impl GoParams {
    /// Bounded search for a single best move. Never unbounded.
    pub fn for_best_move(limits: &SearchLimits) -> Self {
        let mut params = Self {
            depth: limits.depth,
            movetime: limits.movetime_ms,
            nodes: limits.nodes,
            infinite: false,
        };
        if params.depth.is_none() && params.movetime.is_none() && params.nodes.is_none() {
            params.movetime = Some(DEFAULT_MOVETIME_MS);
        }
        params
    }

    /// Search for streaming analysis; runs until `stop` when no limit is given.
    pub fn for_analysis(limits: &AnalysisLimits) -> Self {
        Self {
            depth: limits.depth,
            movetime: limits.movetime_ms,
            nodes: None,
            infinite: limits.depth.is_none() && limits.movetime_ms.is_none(),
        }
    }
}

impl fmt::Display for GoParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("go")?;
        if let Some(depth) = self.depth {
            write!(f, " depth {}", depth)?;
        }
        if let Some(movetime) = self.movetime {
            write!(f, " movetime {}", movetime)?;
        }
        if let Some(nodes) = self.nodes {
            write!(f, " nodes {}", nodes)?;
        }
        if self.infinite {
            f.write_str(" infinite")?;
        }
        Ok(())
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::IsReady => f.write_str("isready"),
            Self::NewGame => f.write_str("ucinewgame"),
            Self::Position { fen, moves } => {
                match fen {
                    Some(fen) => write!(f, "position fen {}", fen)?,
                    None => f.write_str("position startpos")?,
                }
                if !moves.is_empty() {
                    f.write_str(" moves")?;
                    for mv in moves {
                        write!(f, " {}", mv)?;
                    }
                }
                Ok(())
            }
            Self::SetOption { name, value } => match value {
                Some(value) => write!(f, "setoption name {} value {}", name, value),
                None => write!(f, "setoption name {}", name),
            },
            Self::Go(params) => write!(f, "{}", params),
            Self::Stop => f.write_str("stop"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(texts: &[&str]) -> Vec<Move> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn test_position_startpos() {
        let cmd = UciCommand::Position {
            fen: None,
            moves: vec![],
        };
        assert_eq!(cmd.to_string(), "position startpos");
    }

    #[test]
    fn test_position_fen_with_moves() {
        let cmd = UciCommand::Position {
            fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()),
            moves: moves(&["a1a2", "h1h2"]),
        };
        assert_eq!(
            cmd.to_string(),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1a2 h1h2"
        );
    }

    #[test]
    fn test_setoption() {
        let cmd = UciCommand::SetOption {
            name: "Skill Level".to_string(),
            value: Some("5".to_string()),
        };
        assert_eq!(cmd.to_string(), "setoption name Skill Level value 5");

        let button = UciCommand::SetOption {
            name: "Clear Hash".to_string(),
            value: None,
        };
        assert_eq!(button.to_string(), "setoption name Clear Hash");
    }

    #[test]
    fn test_best_move_defaults_to_movetime() {
        let params = GoParams::for_best_move(&SearchLimits::default());
        assert_eq!(params.to_string(), "go movetime 1000");
    }

    #[test]
    fn test_best_move_with_all_limits() {
        let params = GoParams::for_best_move(&SearchLimits {
            depth: Some(10),
            movetime_ms: Some(500),
            nodes: Some(20000),
        });
        assert_eq!(params.to_string(), "go depth 10 movetime 500 nodes 20000");
    }

    #[test]
    fn test_best_move_nodes_only_has_no_default_time() {
        let params = GoParams::for_best_move(&SearchLimits {
            nodes: Some(5000),
            ..Default::default()
        });
        assert_eq!(params.to_string(), "go nodes 5000");
    }

    #[test]
    fn test_analysis_without_limits_is_infinite() {
        let params = GoParams::for_analysis(&AnalysisLimits::default());
        assert_eq!(params.to_string(), "go infinite");

        let params = GoParams::for_analysis(&AnalysisLimits {
            depth: Some(18),
            movetime_ms: None,
        });
        assert_eq!(params.to_string(), "go depth 18");
    }
}
