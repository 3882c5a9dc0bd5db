//! TCP transport
//!
//! Frames over a TCP stream with 4-byte big-endian length delimiting.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Frame               │
//! └──────────┴─────────────────────────────┘
//! ```

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{OciError, Result};
use super::{FrameRead, FrameWrite, Transport};

/// Maximum frame size accepted from the peer (16 MB)
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// TCP transport for a provisioning session
pub struct TcpTransport {
    stream: TcpStream,
    peer_addr: String,
}

impl TcpTransport {
    /// Connect to a remote endpoint
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// Wrap an already-connected stream
    ///
    /// Disables Nagle's algorithm for low latency.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        Ok(Self { stream, peer_addr })
    }

    /// Configure stream timeouts
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Transport for TcpTransport {
    fn split(self: Box<Self>) -> Result<(Box<dyn FrameRead>, Box<dyn FrameWrite>)> {
        let this = *self;

        // Clone the stream for separate read/write handles
        let read_stream = this.stream.try_clone()?;
        let write_stream = this.stream;

        Ok((
            Box::new(TcpFrameReader {
                reader: BufReader::new(read_stream),
                peer_addr: this.peer_addr,
            }),
            Box::new(TcpFrameWriter {
                writer: BufWriter::new(write_stream),
            }),
        ))
    }
}

/// Reader half of a TCP transport
struct TcpFrameReader {
    reader: BufReader<TcpStream>,
    peer_addr: String,
}

impl FrameRead for TcpFrameReader {
    fn read_frame(&mut self) -> Result<Vec<u8>> {
        // Read the length prefix
        let mut header = [0u8; 4];
        self.reader.read_exact(&mut header)?;

        let frame_len = u32::from_be_bytes(header);
        if frame_len > MAX_FRAME_SIZE {
            return Err(OciError::Frame(format!(
                "frame from {} too large: {} bytes (max {})",
                self.peer_addr, frame_len, MAX_FRAME_SIZE
            )));
        }

        let mut frame = vec![0u8; frame_len as usize];
        if frame_len > 0 {
            self.reader.read_exact(&mut frame)?;
        }

        tracing::trace!("Received {} byte frame from {}", frame_len, self.peer_addr);
        Ok(frame)
    }
}

/// Writer half of a TCP transport
struct TcpFrameWriter {
    writer: BufWriter<TcpStream>,
}

impl FrameWrite for TcpFrameWriter {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > MAX_FRAME_SIZE as usize {
            return Err(OciError::Frame(format!(
                "outgoing frame too large: {} bytes (max {})",
                frame.len(),
                MAX_FRAME_SIZE
            )));
        }

        self.writer
            .write_all(&(frame.len() as u32).to_be_bytes())?;
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        let _ = self.writer.flush();
        // Unblocks a reader parked in read_exact
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
