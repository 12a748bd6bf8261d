//! Streaming analysis: one `go`, many `info` lines, ended by `bestmove`.

use std::pin::Pin;

use tokio_stream::Stream;

use crate::uci::parser::first_token;
use crate::uci::{parse_info_line, tokens, GoParams, UciCommand};
use crate::{AnalysisEvent, AnalysisLimits, EngineResult, EngineSession};

/// Lazy, one-shot sequence of progress events for a single search.
///
/// Ends when the engine reports its best move or its output closes. While
/// the stream is alive the session accepts no other reply-awaiting request.
pub type AnalysisStream = Pin<Box<dyn Stream<Item = AnalysisEvent> + Send>>;

impl EngineSession {
    /// Start a search and stream its progress.
    ///
    /// Without a depth or time limit the engine searches until
    /// [`stop_analysis`](Self::stop_analysis) is called.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn analyze(&self, limits: AnalysisLimits) -> EngineResult<AnalysisStream> {
        self.ensure_ready()?;
        let permit = self.acquire_request_slot()?;

        let mut lines = self.supervisor.stdout()?.subscribe();
        let go = UciCommand::Go(GoParams::for_analysis(&limits));
        tracing::info!("Starting analysis: {}", go);
        self.supervisor.send_command(&go).await?;

        let stream = async_stream::stream! {
            let _permit = permit;
            let mut emitted = 0usize;
            loop {
                let Some(line) = lines.next_line().await else {
                    tracing::warn!("Engine output closed during analysis after {} events", emitted);
                    break;
                };
                match first_token(&line) {
                    Some(tokens::INFO) => {
                        if let Some(event) = parse_info_line(&line) {
                            emitted += 1;
                            yield event;
                        }
                    }
                    Some(tokens::BESTMOVE) => {
                        tracing::debug!("Analysis finished after {} events: {}", emitted, line);
                        break;
                    }
                    _ => {}
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
