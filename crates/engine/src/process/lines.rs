// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Split tool output into lines.
//!
//! Burning tools redraw progress with `\r` or `\b` rather than newlines, so
//! any of `\n`, `\r`, `\b`, NUL or U+2029 ends a line. Multi-byte sequences
//! cut across reads stay buffered until complete.

const PARAGRAPH_SEPARATOR: &[u8] = "\u{2029}".as_bytes();

#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
    /// Where the next scan resumes; earlier bytes hold no separator
    scanned: usize,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = self.scanned;
        while i < self.buf.len() {
            let sep_len = match self.buf[i] {
                b'\n' | b'\r' | b'\x08' | b'\0' => 1,
                0xE2 if self.buf[i..].starts_with(PARAGRAPH_SEPARATOR) => PARAGRAPH_SEPARATOR.len(),
                _ => 0,
            };
            if sep_len == 0 {
                i += 1;
                continue;
            }
            if i > start {
                lines.push(String::from_utf8_lossy(&self.buf[start..i]).into_owned());
            }
            i += sep_len;
            start = i;
        }
        self.buf.drain(..start);
        // A separator cut across reads starts at most two bytes from the end
        self.scanned = self.buf.len().saturating_sub(PARAGRAPH_SEPARATOR.len() - 1);
        lines
    }

    /// Whatever is left once the stream closed.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        self.scanned = 0;
        Some(line)
    }
}

#[cfg(test)]
#[path = "lines_tests.rs"]
mod tests;
