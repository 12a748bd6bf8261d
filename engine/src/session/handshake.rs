use std::collections::BTreeMap;

use crate::uci::tokens;
use crate::{EngineError, EngineInfo};

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Accumulates `uci` handshake output until `uciok`.
#[derive(Debug, Default)]
pub(crate) struct Handshake {
    name: Option<String>,
    author: Option<String>,
    options: BTreeMap<String, String>,
}

impl Handshake {
    /// Classify one line. Returns `true` once the terminal `uciok` is seen.
    pub(crate) fn observe(&mut self, line: &str) -> bool {
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            [tokens::UCIOK, ..] => return true,
            [tokens::ID, tokens::NAME, rest @ ..] if !rest.is_empty() => {
                self.name = Some(rest.join(" "));
            }
            [tokens::ID, tokens::AUTHOR, rest @ ..] if !rest.is_empty() => {
                self.author = Some(rest.join(" "));
            }
            [tokens::OPTION, tokens::NAME, key, ..] => {
                self.options.insert(key.to_string(), line.to_string());
            }
            _ => tracing::trace!("Ignoring handshake line: {}", line),
        }
        false
    }

    pub(crate) fn finish(self) -> Result<EngineInfo, EngineError> {
        let name = self.name.ok_or(EngineError::MissingEngineIdentity)?;
        let author = self.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        Ok(EngineInfo::new(name, author, self.options))
    }
}
