//! Byte-based line splitting with lossy UTF-8 decoding.
//!
//! megatools can emit non-UTF8 bytes (file names from remote folders), and it
//! redraws its progress line with a bare `\r`. `BufReader::lines()` would
//! fail on the former and hide the latter until the transfer ends, so lines
//! are split by hand: `\n`, `\r` and `\r\n` each end exactly one line.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// Incremental splitter fed with raw chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
    after_cr: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, pushing every completed line onto `out`.
    pub fn feed(&mut self, bytes: &[u8], out: &mut VecDeque<String>) {
        for &byte in bytes {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => out.push_back(self.take_line()),
                b'\r' => {
                    out.push_back(self.take_line());
                    self.after_cr = true;
                }
                _ => self.buf.push(byte),
            }
        }
    }

    /// Flush a trailing line that had no terminator.
    pub fn finish(&mut self) -> Option<String> {
        self.after_cr = false;
        (!self.buf.is_empty()).then(|| self.take_line())
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

/// Async line reader over a child pipe.
///
/// `next_line` is cancel-safe: a cancelled call loses no data, so it can be
/// raced in `tokio::select!`.
pub struct LineReader<R> {
    inner: R,
    splitter: LineSplitter,
    ready: VecDeque<String>,
    chunk: Box<[u8]>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            splitter: LineSplitter::new(),
            ready: VecDeque::new(),
            chunk: vec![0; CHUNK_SIZE].into_boxed_slice(),
            eof: false,
        }
    }

    /// Next complete line, or `None` once the pipe is closed and drained.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }

            let n = self.inner.read(&mut self.chunk).await?;
            if n == 0 {
                self.eof = true;
                if let Some(line) = self.splitter.finish() {
                    self.ready.push_back(line);
                }
            } else {
                self.splitter.feed(&self.chunk[..n], &mut self.ready);
            }
        }
    }
}
