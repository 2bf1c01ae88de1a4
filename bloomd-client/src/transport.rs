//! # Line Transport
//!
//! Purpose: Write one request line and read back one complete response,
//! either a single line or a `START`/`END` framed block.
//!
//! ## Design Principles
//! 1. **Two-State Reader**: Line mode until a `START` line switches to block
//!    mode; an `END` line finishes the block.
//! 2. **Bounded Retry**: Writes are retried at most `max_attempts` times.
//!    Reads are never retried.
//! 3. **No Partial Responses**: EOF before a full response is an error.
//! 4. **Buffer Reuse**: Each connection keeps its own line buffer.

use std::io::{self, BufRead, BufReader, Read, Write};

use tracing::warn;

use bloomd_common::{BLOCK_END, BLOCK_START};

use crate::error::{ClientError, ClientResult};

/// Any bidirectional byte stream a connection can run over.
pub trait Duplex: Read + Write + Send {}

impl<T: Read + Write + Send> Duplex for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    Line,
    Block,
}

/// Single daemon connection with a reusable read buffer.
pub struct Connection {
    // Buffered reader for line framing; writes go straight to the inner stream.
    reader: BufReader<Box<dyn Duplex>>,
    line_buf: String,
}

impl Connection {
    pub fn new(stream: Box<dyn Duplex>) -> Self {
        Connection {
            reader: BufReader::new(stream),
            line_buf: String::with_capacity(128),
        }
    }

    /// Sends one command and reads its full response.
    pub fn roundtrip(&mut self, line: &str, max_attempts: usize) -> ClientResult<String> {
        self.send(line, max_attempts)?;
        self.receive()
    }

    /// Writes `line` followed by `\n`, retrying failed writes.
    ///
    /// A retry resumes after the bytes already accepted by the stream, so a
    /// short write followed by an error never sends a frame twice.
    /// `max_attempts` of 0 is treated as 1.
    pub fn send(&mut self, line: &str, max_attempts: usize) -> ClientResult<()> {
        let attempts = max_attempts.max(1);
        let mut frame = String::with_capacity(line.len() + 1);
        frame.push_str(line);
        frame.push('\n');
        let frame = frame.as_bytes();

        let mut written = 0;
        let mut last_err = io::Error::new(io::ErrorKind::Other, "no write attempted");
        for attempt in 1..=attempts {
            match Self::write_from(self.reader.get_mut().as_mut(), frame, &mut written) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(attempt, attempts, written, error = %err, "write to bloomd failed");
                    last_err = err;
                }
            }
        }
        Err(ClientError::Io(last_err))
    }

    fn write_from(stream: &mut dyn Duplex, frame: &[u8], written: &mut usize) -> io::Result<()> {
        while *written < frame.len() {
            match stream.write(&frame[*written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => *written += n,
                Err(err) => return Err(err),
            }
        }
        stream.flush()
    }

    /// Reads one response.
    ///
    /// Block responses come back without their markers, lines joined by `\n`.
    pub fn receive(&mut self) -> ClientResult<String> {
        let mut mode = ReadMode::Line;
        let mut block = String::new();
        loop {
            self.read_line()?;
            match mode {
                ReadMode::Line => {
                    if self.line_buf.starts_with(BLOCK_START) {
                        mode = ReadMode::Block;
                        continue;
                    }
                    return Ok(std::mem::take(&mut self.line_buf));
                }
                ReadMode::Block => {
                    if self.line_buf.starts_with(BLOCK_END) {
                        return Ok(block);
                    }
                    if !block.is_empty() {
                        block.push('\n');
                    }
                    block.push_str(&self.line_buf);
                }
            }
        }
    }

    fn read_line(&mut self) -> ClientResult<()> {
        self.line_buf.clear();
        let bytes = self.reader.read_line(&mut self.line_buf)?;
        if bytes == 0 || !self.line_buf.ends_with('\n') {
            return Err(ClientError::ConnectionClosed);
        }
        let trimmed = self.line_buf.trim_end_matches(['\r', '\n']).len();
        self.line_buf.truncate(trimmed);
        Ok(())
    }
}
