//! Bridge from blocking archive writes to an async response body
//!
//! The archiver writes through [`ChannelWriter`] on a blocking thread; the
//! HTTP handler receives the chunks from the other end of the channel.

use std::io::{self, Write};

use axum::body::Bytes;
use tokio::sync::mpsc;

use crate::module::error::ModuleError;

/// Number of chunks buffered between the archiver and the response body
pub const CHUNK_QUEUE_SIZE: usize = 8;

/// Size at which buffered archive bytes are sent as a chunk
pub const CHUNK_SIZE: usize = 64 * 1024;

pub type Chunk = Result<Bytes, ModuleError>;

/// `Write` implementation sending fixed-size chunks over a channel
pub struct ChannelWriter {
    tx: mpsc::Sender<Chunk>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    pub fn new(tx: mpsc::Sender<Chunk>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    /// Sends an error to the receiving side in place of further data
    pub fn send_error(&self, err: ModuleError) {
        // The receiver may already be gone; nothing is left to notify then
        let _ = self.tx.blocking_send(Err(err));
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buf,
            Vec::with_capacity(CHUNK_SIZE),
        ));
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body was dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}
