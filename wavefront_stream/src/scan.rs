//! Lexical primitives scanning the window from its cursor.
//!
//! Every primitive only moves the cursor of the window; nothing here reads
//! from the stream. Consumed text is reported as a [`Span`] so a whole line can
//! be scanned before any token is handed out.

use crate::window::WindowReader;

use std::{ops::Range, str::from_utf8};

/// Byte range of a scanned token, relative to the start of the window.
pub type Span = Range<usize>;

const DIGITS: &[u8] = b"0123456789";
const SIGNS: &[u8] = b"+-";

impl<R, const W: usize> WindowReader<R, W> {
    /// Checks whether the window continues with `literal` at the cursor.
    /// Returns `false` if fewer bytes than the literal are buffered.
    pub fn check(&self, literal: &str) -> bool {
        self.window()[self.cursor..].starts_with(literal.as_bytes())
    }

    /// Moves the cursor forward by `count` bytes without looking at them.
    pub fn step(&mut self, count: usize) {
        self.cursor = (self.cursor + count).min(self.window().len());
    }

    /// Consumes the longest run of bytes contained in `class`.
    pub fn peek(&mut self, class: &[u8]) -> Span {
        let start = self.cursor;
        self.cursor = self.scan_from(start, |b| class.contains(&b));
        start..self.cursor
    }

    /// Consumes the longest run of bytes not contained in `stops`.
    pub fn seek(&mut self, stops: &[u8]) -> Span {
        let start = self.cursor;
        self.cursor = self.scan_from(start, |b| !stops.contains(&b));
        start..self.cursor
    }

    /// Decides whether another delimited token follows before a stop byte.
    ///
    /// If at least one delimiter is present and the delimiter run ends strictly
    /// before the stop run, the cursor moves past the delimiters and `true` is
    /// returned. Otherwise the cursor moves to the stop boundary.
    pub fn race(&mut self, delimiters: &[u8], stops: &[u8]) -> bool {
        let start = self.cursor;
        let delimited = self.scan_from(start, |b| delimiters.contains(&b));
        let stopped = self.scan_from(start, |b| !stops.contains(&b));

        if delimited != start && delimited < stopped {
            self.cursor = delimited;
            true
        } else {
            self.cursor = stopped;
            false
        }
    }

    /// Consumes a run of decimal digits.
    pub fn peek_digits(&mut self) -> Span {
        self.peek(DIGITS)
    }

    /// Consumes an optionally signed run of decimal digits.
    pub fn peek_integer(&mut self) -> Span {
        let start = self.cursor;
        self.peek_sign();
        self.peek_digits();
        start..self.cursor
    }

    /// Consumes a decimal literal: sign, integer digits, and an optional
    /// fraction and exponent.
    ///
    /// A `.` or exponent marker without digits after it is left unconsumed.
    pub fn peek_float(&mut self) -> Span {
        let start = self.cursor;
        self.peek_sign();
        let mut has_digits = !self.peek_digits().is_empty();

        if self.check(".") {
            self.step(1);
            if self.peek_digits().is_empty() {
                self.cursor -= 1;
            } else {
                has_digits = true;
            }
        }

        if has_digits && (self.check("e") || self.check("E")) {
            let mark = self.cursor;
            self.step(1);
            self.peek_sign();
            if self.peek_digits().is_empty() {
                self.cursor = mark;
            }
        }

        start..self.cursor
    }

    /// Consumes decimal literals separated by `delimiters` until a stop byte.
    ///
    /// Numbers are not converted here; a malformed literal yields a short or
    /// empty span and ends the sequence.
    pub fn peek_floats(&mut self, delimiters: &[u8], stops: &[u8]) -> Vec<Span> {
        let mut numbers = vec![];
        loop {
            numbers.push(self.peek_float());
            if !self.race(delimiters, stops) {
                break;
            }
        }
        numbers
    }

    /// Returns the text of a span.
    /// Invalid UTF-8 truncates the token at the first invalid byte.
    pub fn text(&self, span: Span) -> &str {
        let bytes = &self.window()[span];
        match from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    fn peek_sign(&mut self) {
        if self.window()[self.cursor..]
            .first()
            .map_or(false, |b| SIGNS.contains(b))
        {
            self.step(1);
        }
    }

    fn scan_from(&self, start: usize, accept: impl Fn(u8) -> bool) -> usize {
        let window = self.window();
        let mut end = start;
        while end < window.len() && accept(window[end]) {
            end += 1;
        }
        end
    }
}
