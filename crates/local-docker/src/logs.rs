use crate::error::Result;
use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Frame type Docker uses for stdout in a multiplexed stream
pub const STDOUT_FRAME_TYPE: u8 = 1;
/// Frame type Docker uses for stderr in a multiplexed stream
pub const STDERR_FRAME_TYPE: u8 = 2;

/// Lazy, finite sequence of frames read from an attached container.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// Destination for one side of a container's output
pub type OutputSink<'a> = &'a mut (dyn AsyncWrite + Unpin + Send);

/// The output stream that a frame originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Stdout,
    Stderr,
    /// Any other tag. Tolerated and dropped.
    Unknown(u8),
}

impl From<u8> for FrameKind {
    fn from(frame_type: u8) -> Self {
        match frame_type {
            STDOUT_FRAME_TYPE => FrameKind::Stdout,
            STDERR_FRAME_TYPE => FrameKind::Stderr,
            other => FrameKind::Unknown(other),
        }
    }
}

/// A single chunk of container output tagged with its frame type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(frame_type: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }

    pub fn stdout(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(STDOUT_FRAME_TYPE, payload)
    }

    pub fn stderr(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(STDERR_FRAME_TYPE, payload)
    }

    pub fn kind(&self) -> FrameKind {
        FrameKind::from(self.frame_type)
    }
}

/// Drain `frames`, writing stdout payloads to `stdout` and stderr payloads
/// to `stderr`.
///
/// Payloads for a missing sink and frames with an unrecognized type are
/// dropped. A stream error or a failed write stops the drain and is returned.
pub async fn write_container_output<'a>(
    mut frames: FrameStream,
    mut stdout: Option<OutputSink<'a>>,
    mut stderr: Option<OutputSink<'a>>,
) -> Result<()> {
    while let Some(frame) = frames.next().await {
        let frame = frame?;
        let sink = match frame.kind() {
            FrameKind::Stdout => stdout.as_deref_mut(),
            FrameKind::Stderr => stderr.as_deref_mut(),
            FrameKind::Unknown(frame_type) => {
                trace!(frame_type, "Dropping frame of unknown type");
                None
            }
        };

        if let Some(sink) = sink {
            sink.write_all(&frame.payload).await?;
        }
    }

    if let Some(sink) = stdout {
        sink.flush().await?;
    }
    if let Some(sink) = stderr {
        sink.flush().await?;
    }

    Ok(())
}
