//! Byte-counting output sink
//!
//! Wraps an async writer and records whether more than a configured number of
//! bytes was offered to it. Overflow is observed here, never acted on: the
//! drain keeps consuming the pipe so the child cannot block on it.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

/// What happens to bytes offered past the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Store at most `max` bytes, count and discard the rest
    #[default]
    Truncate,

    /// Forward every byte to the destination and only raise the flag
    Passthrough,
}

/// A write boundary that counts bytes and flags overflow
///
/// Each sink is owned by exactly one drain; the counters are read once the
/// drain has handed the sink back.
#[derive(Debug)]
pub struct BoundedSink<W> {
    inner: W,
    max: u64,
    mode: SinkMode,
    bytes_written: u64,
    limit_exceeded: bool,
}

impl<W> BoundedSink<W> {
    pub fn new(inner: W, max: u64, mode: SinkMode) -> Self {
        Self {
            inner,
            max,
            mode,
            bytes_written: 0,
            limit_exceeded: false,
        }
    }

    /// Total bytes offered to the sink, stored or discarded
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether the counter ever went past the cap. Never resets.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn record(&mut self, n: usize) {
        self.bytes_written = self.bytes_written.saturating_add(n as u64);
        if self.bytes_written > self.max {
            self.limit_exceeded = true;
        }
    }

    fn remaining(&self) -> u64 {
        self.max.saturating_sub(self.bytes_written)
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for BoundedSink<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        let allowed = match this.mode {
            SinkMode::Passthrough => buf.len(),
            SinkMode::Truncate => {
                let remaining = this.remaining();
                if remaining == 0 && !buf.is_empty() {
                    this.record(buf.len());
                    return Poll::Ready(Ok(buf.len()));
                }
                buf.len()
                    .min(usize::try_from(remaining).unwrap_or(usize::MAX))
            }
        };

        // Counters only move on bytes the destination accepted
        let result = ready!(Pin::new(&mut this.inner).poll_write(cx, &buf[..allowed]));
        if let Ok(n) = result {
            this.record(n);
        }
        Poll::Ready(result)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
