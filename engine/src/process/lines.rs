//! Fan-out line channels over an engine's output streams.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Which output stream of the engine a channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Subscriber registry; `None` once the reader has finished.
type Subscribers = Arc<Mutex<Option<Vec<mpsc::UnboundedSender<String>>>>>;

fn lock(subscribers: &Subscribers) -> MutexGuard<'_, Option<Vec<mpsc::UnboundedSender<String>>>> {
    subscribers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A continuously produced sequence of decoded lines.
///
/// Every subscriber sees every line emitted after it subscribed, in order,
/// however far behind it falls. The channel closes once the underlying reader
/// reaches end of stream or its reader task is aborted.
#[derive(Debug)]
pub struct LineChannel {
    subscribers: Subscribers,
}

impl LineChannel {
    /// Start a reader task that splits `reader` into lines and fans them out.
    pub(crate) fn spawn<R>(kind: StreamKind, reader: R) -> (Self, JoinHandle<()>)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let subscribers: Subscribers = Arc::new(Mutex::new(Some(Vec::new())));
        let task = tokio::spawn(read_lines(kind, reader, Arc::clone(&subscribers)));
        (Self { subscribers }, task)
    }

    pub fn subscribe(&self) -> LineSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        // A closed channel drops `tx` here, so the subscription ends at once.
        if let Some(senders) = lock(&self.subscribers).as_mut() {
            senders.push(tx);
        }
        LineSubscription { rx }
    }
}

/// One consumer's view of a [`LineChannel`].
#[derive(Debug)]
pub struct LineSubscription {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LineSubscription {
    /// Next line, or `None` once the channel has closed.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Closes every subscription when the reader task ends, including by abort.
struct CloseOnDrop(Subscribers);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        lock(&self.0).take();
    }
}

async fn read_lines<R>(kind: StreamKind, reader: R, subscribers: Subscribers)
where
    R: AsyncRead + Send + Unpin,
{
    let _close = CloseOnDrop(Arc::clone(&subscribers));
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                tracing::debug!(stream = ?kind, "Engine output reached EOF");
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                match kind {
                    StreamKind::Stdout => tracing::trace!("UCI << {}", line),
                    StreamKind::Stderr => tracing::debug!("engine stderr: {}", line),
                }
                if let Some(senders) = lock(&subscribers).as_mut() {
                    // Dropped subscriptions are pruned on the next line.
                    senders.retain(|tx| tx.send(line.clone()).is_ok());
                }
            }
            Err(e) => {
                tracing::error!(stream = ?kind, "Error reading engine output: {}", e);
                break;
            }
        }
    }
}
