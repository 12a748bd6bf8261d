pub mod commands;
pub mod moves;
pub mod parser;

pub use commands::{GoParams, UciCommand, DEFAULT_MOVETIME_MS};
pub use moves::{parse_uci_move, Move, Promotion};
pub use parser::parse_info_line;

/// Inbound tokens the session reacts to.
pub(crate) mod tokens {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const AUTHOR: &str = "author";
    pub const OPTION: &str = "option";
    pub const UCIOK: &str = "uciok";
    pub const READYOK: &str = "readyok";
    pub const INFO: &str = "info";
    pub const BESTMOVE: &str = "bestmove";
}
