//! Transport Module
//!
//! The byte-frame boundary between the session and the network.
//!
//! ## Architecture
//! - The core reads and writes whole frames; delimiting, sockets and TLS
//!   belong to the transport implementation
//! - A transport splits into one reader half and one writer half: the
//!   session owns exactly one receive loop, while sends are serialized
//!   over the writer

mod pipe;
mod tcp;

pub use pipe::{PipeTransport, PipeTransportReader, PipeTransportWriter};
pub use tcp::TcpTransport;

use crate::error::Result;

/// Blocking source of incoming frames
pub trait FrameRead: Send {
    /// Read the next complete frame
    ///
    /// Blocks until a frame arrives or the connection ends. A clean
    /// remote close surfaces as `Io` with `UnexpectedEof`.
    fn read_frame(&mut self) -> Result<Vec<u8>>;
}

/// Sink for outgoing frames
pub trait FrameWrite: Send {
    /// Write one complete frame
    fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Tear the connection down, unblocking the reader half
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A connected duplex transport
pub trait Transport: Send {
    /// Split into independent reader and writer halves
    fn split(self: Box<Self>) -> Result<(Box<dyn FrameRead>, Box<dyn FrameWrite>)>;
}
