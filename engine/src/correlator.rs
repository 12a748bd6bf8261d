//! One-shot request/response matching over the engine's stdout.
//!
//! UCI replies carry no request id, so a reply is recognised purely by its
//! shape: the first line accepted by the matcher after the command was sent.

use std::time::Duration;

use crate::process::ProcessSupervisor;
use crate::uci::UciCommand;
use crate::{EngineError, EngineResult};

/// Send `cmd` and wait for the first stdout line `matcher` accepts.
///
/// The subscription is taken before the command is written so a fast reply
/// cannot be missed. Fails with [`EngineError::RequestTimeout`] when nothing
/// matches within `timeout`, and [`EngineError::ProcessExited`] when the
/// output closes first.
pub async fn request<T, F>(
    supervisor: &ProcessSupervisor,
    cmd: &UciCommand,
    timeout: Duration,
    mut matcher: F,
) -> EngineResult<T>
where
    F: FnMut(&str) -> Option<T>,
{
    let mut lines = supervisor.stdout()?.subscribe();
    supervisor.send_command(cmd).await?;

    let wait = async {
        while let Some(line) = lines.next_line().await {
            if let Some(value) = matcher(&line) {
                return Ok(value);
            }
        }
        Err(EngineError::ProcessExited)
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("No reply to '{}' within {:?}", cmd, timeout);
            Err(EngineError::RequestTimeout(timeout))
        }
    }
}
