//! Engine process supervision: spawn, serialized writes, graceful-then-forced stop.

pub mod lines;

pub use lines::{LineChannel, LineSubscription, StreamKind};

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::uci::UciCommand;
use crate::{EngineError, EngineResult, SessionConfig};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Byte pipes to an engine that is not (or not only) a local child process.
///
/// A supervisor attached to an `EngineIo` follows the same lifecycle as one
/// that spawned its engine, minus the process handle.
pub struct EngineIo {
    stdin: BoxedWriter,
    stdout: BoxedReader,
    stderr: Option<BoxedReader>,
}

impl EngineIo {
    pub fn new<W, R>(stdin: W, stdout: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: None,
        }
    }

    pub fn with_stderr<R>(mut self, stderr: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.stderr = Some(Box::new(stderr));
        self
    }
}

struct RunningProcess {
    child: Option<Child>,
    stdin: Mutex<BoxedWriter>,
    stdout: LineChannel,
    stderr: LineChannel,
    readers: Vec<JoinHandle<()>>,
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// Owns at most one engine process and its I/O.
pub struct ProcessSupervisor {
    engine_path: PathBuf,
    quit_grace: Duration,
    running: Option<RunningProcess>,
}

impl ProcessSupervisor {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            engine_path: config.engine_path.clone(),
            quit_grace: config.quit_grace,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// OS process id of the engine, when it was spawned by this supervisor.
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref()?.child.as_ref()?.id()
    }

    /// Spawn the engine executable with no arguments.
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.engine_path.display()))]
    pub fn start(&mut self) -> EngineResult<()> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        tracing::debug!("Spawning engine process");
        let mut child = tokio::process::Command::new(&self.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::SpawnFailed(e)
            })?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        tracing::info!(pid = ?child.id(), "Engine process started");
        self.install(Some(child), EngineIo::new(stdin, stdout).with_stderr(stderr));
        Ok(())
    }

    /// Take ownership of an already-connected engine transport.
    pub fn attach(&mut self, io: EngineIo) -> EngineResult<()> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        tracing::info!("Attached to engine transport");
        self.install(None, io);
        Ok(())
    }

    fn install(&mut self, child: Option<Child>, io: EngineIo) {
        let (stdout, stdout_task) = LineChannel::spawn(StreamKind::Stdout, io.stdout);
        let stderr_reader: BoxedReader = io.stderr.unwrap_or_else(|| Box::new(tokio::io::empty()));
        let (stderr, stderr_task) = LineChannel::spawn(StreamKind::Stderr, stderr_reader);

        self.running = Some(RunningProcess {
            child,
            stdin: Mutex::new(io.stdin),
            stdout,
            stderr,
            readers: vec![stdout_task, stderr_task],
        });
    }

    pub fn stdout(&self) -> EngineResult<&LineChannel> {
        Ok(&self.running()?.stdout)
    }

    pub fn stderr(&self) -> EngineResult<&LineChannel> {
        Ok(&self.running()?.stderr)
    }

    fn running(&self) -> EngineResult<&RunningProcess> {
        self.running.as_ref().ok_or(EngineError::NotRunning)
    }

    /// Write one command line and flush it.
    ///
    /// Concurrent callers are serialized; each line is written whole.
    pub async fn send(&self, line: &str) -> EngineResult<()> {
        let running = self.running()?;
        write_line(&running.stdin, line).await
    }

    pub async fn send_command(&self, cmd: &UciCommand) -> EngineResult<()> {
        tracing::debug!("Sending command: {}", cmd);
        self.send(&cmd.to_string()).await
    }

    /// Shut the engine down. Idempotent and infallible.
    ///
    /// Sends `quit`, gives the process `quit_grace` to exit, then kills it.
    /// Reader tasks are aborted so every line subscription ends.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        if let Err(e) = write_line(&running.stdin, &UciCommand::Quit.to_string()).await {
            tracing::debug!("Could not deliver quit: {}", e);
        }

        if let Some(child) = running.child.as_mut() {
            match tokio::time::timeout(self.quit_grace, child.wait()).await {
                Ok(Ok(status)) => tracing::info!("Engine exited with {}", status),
                Ok(Err(e)) => tracing::warn!("Failed waiting for engine exit: {}", e),
                Err(_) => {
                    tracing::info!("Engine did not exit after quit, killing it");
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill engine: {}", e);
                    }
                }
            }
        }

        drop(running);
        tracing::info!("Engine stopped");
    }
}

async fn write_line(stdin: &Mutex<BoxedWriter>, line: &str) -> EngineResult<()> {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');

    let mut stdin = stdin.lock().await;
    tracing::trace!("UCI >> {}", line);
    stdin.write_all(buf.as_bytes()).await.map_err(|e| {
        tracing::error!("Failed to write to engine stdin: {}", e);
        EngineError::Io(e)
    })?;
    stdin.flush().await.map_err(|e| {
        tracing::error!("Failed to flush engine stdin: {}", e);
        EngineError::Io(e)
    })?;
    Ok(())
}

fn missing_pipe(name: &str) -> EngineError {
    EngineError::SpawnFailed(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("engine has no {}", name),
    ))
}
