use std::{
    io,
    pin::Pin,
    process::ExitStatus,
    task::{ready, Context, Poll},
};

use bytes::Bytes;
use futures::{future::BoxFuture, FutureExt, Stream, StreamExt};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, ChildStderr, ChildStdout},
    sync::OwnedSemaphorePermit,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, trace, warn};

use crate::error::MediaError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Stdout of a child process as a byte stream.
///
/// The stream owns the child: dropping it before the output ends kills the
/// process right away. Bytes are only read from the pipe when the stream is
/// polled, so a slow consumer slows the producer down instead of piling up
/// memory.
pub struct ProcessStream {
    pid: Option<u32>,
    child: Option<Child>,
    stdout: ReaderStream<ChildStdout>,
    pending: Option<Bytes>,
    exit: Option<BoxFuture<'static, io::Result<ExitStatus>>>,
    done: bool,
    _permit: Option<OwnedSemaphorePermit>,
}

impl ProcessStream {
    /// Take over `child`, whose stdout must be piped.
    ///
    /// Stderr, if piped, is drained in the background and only logged.
    pub fn new(mut child: Child, permit: Option<OwnedSemaphorePermit>) -> Result<Self, MediaError> {
        let pid = child.id();
        let stdout = child.stdout.take().ok_or_else(|| {
            MediaError::ExtractionFailed("Process has no stdout pipe".to_string())
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr, pid));
        }

        Ok(Self {
            pid,
            child: Some(child),
            stdout: ReaderStream::with_capacity(stdout, CHUNK_SIZE),
            pending: None,
            exit: None,
            done: false,
            _permit: permit,
        })
    }

    #[must_use]
    pub const fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the first chunk of output.
    ///
    /// A process that exits without writing anything is an error.
    pub async fn primed(mut self) -> Result<Self, MediaError> {
        match self.stdout.next().await {
            Some(Ok(chunk)) => {
                self.pending = Some(chunk);
                Ok(self)
            }
            Some(Err(e)) => Err(MediaError::ExtractionFailed(format!(
                "Failed to read process output: {e}"
            ))),
            None => {
                self.done = true;
                let status = match self.child.take() {
                    Some(mut child) => child.wait().await,
                    None => Err(io::Error::other("process already reaped")),
                };

                Err(MediaError::ExtractionFailed(match status {
                    Ok(status) => format!("Process exited without output ({status})"),
                    Err(e) => format!("Process exited without output: {e}"),
                }))
            }
        }
    }
}

impl Stream for ProcessStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        if let Some(chunk) = this.pending.take() {
            return Poll::Ready(Some(Ok(chunk)));
        }

        if this.exit.is_none() {
            match ready!(this.stdout.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                Some(Err(e)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    let Some(mut child) = this.child.take() else {
                        this.done = true;
                        return Poll::Ready(None);
                    };

                    this.exit = Some(async move { child.wait().await }.boxed());
                }
            }
        }

        let Some(exit) = this.exit.as_mut() else {
            this.done = true;
            return Poll::Ready(None);
        };
        let status = ready!(exit.poll_unpin(cx));
        this.exit = None;
        this.done = true;

        match status {
            Ok(status) if status.success() => {
                debug!(pid = ?this.pid, %status, "Process finished");
                Poll::Ready(None)
            }
            // Surface the failure so the transfer is aborted instead of looking complete
            Ok(status) => {
                warn!(pid = ?this.pid, %status, "Process failed mid-stream");
                Poll::Ready(Some(Err(io::Error::other(format!(
                    "Process exited with {status}"
                )))))
            }
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        match child.start_kill() {
            Ok(()) => debug!(pid = ?self.pid, "Consumer went away, killed process"),
            Err(e) => trace!(pid = ?self.pid, ?e, "Process already gone"),
        }
    }
}

impl std::fmt::Debug for ProcessStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessStream")
            .field("pid", &self.pid)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

async fn log_stderr(stderr: ChildStderr, pid: Option<u32>) {
    let mut lines = BufReader::new(stderr).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.contains("ERROR") => warn!(?pid, "{line}"),
            Ok(Some(line)) => trace!(?pid, "{line}"),
            Ok(None) => break,
            Err(e) => {
                trace!(?pid, ?e, "Stopped reading stderr");
                break;
            }
        }
    }
}
