//! In-memory pipe transport
//!
//! A connected pair of in-process endpoints over crossbeam channels.
//! Used by the test suite (and useful for embedding a fake server): same
//! frame semantics as the TCP transport, no sockets.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::error::{OciError, Result};
use super::{FrameRead, FrameWrite, Transport};

/// One endpoint of an in-memory duplex pipe
pub struct PipeTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,

    /// Signalled by our own writer's shutdown so the local reader
    /// unblocks even while the peer stays open
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

impl PipeTransport {
    /// Create a connected pair of endpoints
    pub fn pair() -> (PipeTransport, PipeTransport) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        let (a_shut_tx, a_shut_rx) = unbounded();
        let (b_shut_tx, b_shut_rx) = unbounded();

        (
            PipeTransport {
                tx: a_tx,
                rx: a_rx,
                shutdown_tx: a_shut_tx,
                shutdown_rx: a_shut_rx,
            },
            PipeTransport {
                tx: b_tx,
                rx: b_rx,
                shutdown_tx: b_shut_tx,
                shutdown_rx: b_shut_rx,
            },
        )
    }
}

impl Transport for PipeTransport {
    fn split(self: Box<Self>) -> Result<(Box<dyn FrameRead>, Box<dyn FrameWrite>)> {
        Ok((
            Box::new(PipeTransportReader {
                rx: self.rx,
                shutdown_rx: self.shutdown_rx,
            }),
            Box::new(PipeTransportWriter {
                tx: Some(self.tx),
                shutdown_tx: self.shutdown_tx,
            }),
        ))
    }
}

/// Reader half of a pipe endpoint
pub struct PipeTransportReader {
    rx: Receiver<Vec<u8>>,
    shutdown_rx: Receiver<()>,
}

impl FrameRead for PipeTransportReader {
    fn read_frame(&mut self) -> Result<Vec<u8>> {
        crossbeam::select! {
            recv(self.rx) -> frame => frame.map_err(|_| closed()),
            recv(self.shutdown_rx) -> _ => Err(closed()),
        }
    }
}

/// Writer half of a pipe endpoint
pub struct PipeTransportWriter {
    tx: Option<Sender<Vec<u8>>>,
    shutdown_tx: Sender<()>,
}

impl FrameWrite for PipeTransportWriter {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| OciError::Transport("pipe writer is shut down".to_string()))?;
        tx.send(frame.to_vec())
            .map_err(|_| OciError::Transport("pipe peer disconnected".to_string()))
    }

    fn shutdown(&mut self) -> Result<()> {
        // Dropping the sender ends the peer's reads; the control channel
        // ends our own
        self.tx = None;
        let _ = self.shutdown_tx.send(());
        Ok(())
    }
}

fn closed() -> OciError {
    OciError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "pipe closed",
    ))
}
