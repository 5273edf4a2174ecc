//! Bounded lookahead window over a byte stream.

use std::io::{prelude::*, ErrorKind, Result as IoResult, SeekFrom};

use log::warn;

/// Default capacity of the lookahead window in bytes.
/// Every line of a well-formed OBJ/MTL file is expected to fit in it.
pub const DEFAULT_WINDOW: usize = 256;

/// Represents a fixed-capacity window over a byte stream.
///
/// The window always starts at the first unconsumed byte of the stream.
/// Scanning moves the cursor through the buffered bytes without touching the
/// stream; `advance` consumes a prefix of the window and tops it up again.
#[derive(Debug)]
pub struct WindowReader<R, const W: usize = DEFAULT_WINDOW> {
    source: R,
    buffer: Box<[u8]>,
    filled: usize,
    exhausted: bool,
    finished: bool,
    pub(crate) cursor: usize,
}

impl<R, const W: usize> WindowReader<R, W> {
    /// Returns `true` once the stream is exhausted and every buffered byte has
    /// been consumed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the buffered, unconsumed bytes.
    pub fn window(&self) -> &[u8] {
        &self.buffer[..self.filled]
    }

    /// Returns the capacity of the window.
    pub fn capacity(&self) -> usize {
        W
    }

    /// Returns the lookahead offset relative to the start of the window.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<R: Read> WindowReader<R> {
    /// Creates a reader with the default window capacity and performs the
    /// initial fill.
    pub fn new(source: R) -> IoResult<WindowReader<R>> {
        WindowReader::with_window(source)
    }
}

impl<R: Read, const W: usize> WindowReader<R, W> {
    /// Creates a reader with a window of `W` bytes and performs the initial
    /// fill.
    pub fn with_window(source: R) -> IoResult<WindowReader<R, W>> {
        assert!(W > 0, "window capacity must not be zero");

        let mut reader = WindowReader {
            source,
            buffer: vec![0; W].into_boxed_slice(),
            filled: 0,
            exhausted: false,
            finished: false,
            cursor: 0,
        };
        reader.fill()?;
        Ok(reader)
    }

    /// Consumes the first `count` bytes of the window and refills it.
    /// The cursor returns to the start of the window.
    pub fn advance(&mut self, count: usize) -> IoResult<()> {
        let count = count.min(self.filled);
        self.buffer.copy_within(count..self.filled, 0);
        self.filled -= count;
        self.cursor = 0;
        self.fill()
    }

    /// Consumes the current line including its terminating newline.
    ///
    /// When no newline is buffered in a full window the line is longer than
    /// the window; its remainder is discarded up to the next newline.
    pub fn next_line(&mut self) -> IoResult<()> {
        let mut warned = false;
        loop {
            self.seek(b"\n");
            if self.cursor < self.filled {
                return self.advance(self.cursor + 1);
            }
            if self.exhausted {
                return self.advance(self.filled);
            }

            self.advance(self.filled)?;
            if self.finished {
                return Ok(());
            }
            if !warned && !self.window().starts_with(b"\n") {
                warn!("Line exceeds the {} byte window, discarding its remainder", W);
                warned = true;
            }
        }
    }

    /// Shifting happens in `advance`; this only tops the window up.
    fn fill(&mut self) -> IoResult<()> {
        while !self.exhausted && self.filled < W {
            match self.source.read(&mut self.buffer[self.filled..]) {
                Ok(0) => self.exhausted = true,
                Ok(read_size) => self.filled += read_size,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.finished = self.exhausted && self.filled == 0;
        Ok(())
    }
}

impl<R: Read + Seek, const W: usize> WindowReader<R, W> {
    /// Rewinds the stream, clears the window and performs the initial fill.
    pub fn reset(&mut self) -> IoResult<()> {
        self.source.seek(SeekFrom::Start(0))?;
        self.filled = 0;
        self.cursor = 0;
        self.exhausted = false;
        self.finished = false;
        self.fill()
    }
}
