/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! A character-grid terminal just big enough to interpret what the renderer emits:
//! printable text with deferred autowrap, CR/LF, bell, and the cursor-movement and
//! erase CSI sequences queued by [`crate::LineState`]. Tests feed it the bytes
//! captured by [`super::StdoutMock`] and assert on rows and cursor position.

/// Parser state for the CSI subset.
enum Parse {
    Ground,
    Escape,
    Csi(String),
}

pub struct TestScreen {
    pub width: usize,
    rows: Vec<Vec<char>>,
    row: usize,
    col: usize,
    bell_count: usize,
    parse: Parse,
}

impl TestScreen {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            rows: Vec::new(),
            row: 0,
            col: 0,
            bell_count: 0,
            parse: Parse::Ground,
        }
    }

    pub fn bell_count(&self) -> usize { self.bell_count }

    pub fn cursor(&self) -> (usize, usize) { (self.row, self.col) }

    pub fn feed(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes).into_owned();
        for cp in text.chars() {
            self.step(cp);
        }
    }

    fn step(&mut self, cp: char) {
        match std::mem::replace(&mut self.parse, Parse::Ground) {
            Parse::Ground => match cp {
                '\u{1b}' => self.parse = Parse::Escape,
                '\r' => self.col = 0,
                '\n' => self.row += 1,
                '\u{8}' => self.col = self.col.saturating_sub(1),
                '\u{7}' => self.bell_count += 1,
                _ => self.put(cp),
            },
            Parse::Escape => {
                if cp == '[' {
                    self.parse = Parse::Csi(String::new());
                }
                // Other escape forms are not part of the renderer's vocabulary.
            }
            Parse::Csi(mut params) => {
                if cp.is_ascii_digit() || cp == ';' {
                    params.push(cp);
                    self.parse = Parse::Csi(params);
                } else {
                    self.dispatch_csi(&params, cp);
                }
            }
        }
    }

    /// Printing uses the deferred-autowrap model: a glyph written into the last
    /// column leaves the cursor past it, and the wrap happens just before the next
    /// glyph (or is committed by CRLF).
    fn put(&mut self, cp: char) {
        if self.col >= self.width {
            self.row += 1;
            self.col = 0;
        }
        self.ensure_row(self.row);
        let row = &mut self.rows[self.row];
        while row.len() <= self.col {
            row.push(' ');
        }
        row[self.col] = cp;
        self.col += 1;
    }

    fn dispatch_csi(&mut self, params: &str, final_byte: char) {
        let first = params
            .split(';')
            .next()
            .and_then(|p| p.parse::<usize>().ok());
        match final_byte {
            'A' => self.row = self.row.saturating_sub(first.unwrap_or(1)),
            'B' => self.row += first.unwrap_or(1),
            'C' => self.col += first.unwrap_or(1),
            'D' => self.col = self.col.saturating_sub(first.unwrap_or(1)),
            'G' => self.col = first.unwrap_or(1).saturating_sub(1),
            'H' => {
                let mut parts = params.split(';');
                let row = parts.next().and_then(|p| p.parse::<usize>().ok());
                let col = parts.next().and_then(|p| p.parse::<usize>().ok());
                self.row = row.unwrap_or(1).saturating_sub(1);
                self.col = col.unwrap_or(1).saturating_sub(1);
            }
            'J' => match first {
                Some(2) => self.rows.clear(),
                // ED0: erase from the cursor to the end of the screen.
                _ => {
                    if self.row < self.rows.len() {
                        let col = self.col.min(self.width);
                        self.rows[self.row].truncate(col);
                        self.rows.truncate(self.row + 1);
                    }
                }
            },
            'K' => {
                if self.row < self.rows.len() {
                    let col = self.col.min(self.width);
                    self.rows[self.row].truncate(col);
                }
            }
            _ => {}
        }
    }

    fn ensure_row(&mut self, row: usize) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
    }

    /// Rows as strings, right-trimmed, with trailing blank rows dropped.
    pub fn visible_rows(&self) -> Vec<String> {
        let mut rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        rows
    }

    #[track_caller]
    pub fn assert_screen(&self, expected: &[&str]) {
        let expected: Vec<String> = expected
            .iter()
            .map(|row| row.trim_end().to_string())
            .collect();
        pretty_assertions::assert_eq!(self.visible_rows(), expected);
    }

    #[track_caller]
    pub fn assert_at(&self, row: usize, col: usize) {
        pretty_assertions::assert_eq!(self.cursor(), (row, col));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_and_crlf() {
        let mut screen = TestScreen::new(10);
        screen.feed(b"ab\r\ncd");
        screen.assert_screen(&["ab", "cd"]);
        screen.assert_at(1, 2);
    }

    #[test]
    fn test_deferred_wrap() {
        let mut screen = TestScreen::new(4);
        screen.feed(b"abcd");
        // The cursor hangs past the last column until something commits the wrap.
        screen.assert_at(0, 4);
        screen.feed(b"e");
        screen.assert_screen(&["abcd", "e"]);
        screen.assert_at(1, 1);
    }

    #[test]
    fn test_cursor_moves_and_overwrite() {
        let mut screen = TestScreen::new(10);
        screen.feed(b"hello");
        screen.feed(b"\x1b[1G\x1b[2CY");
        screen.assert_screen(&["heYlo"]);
        screen.assert_at(0, 3);
    }

    #[test]
    fn test_erase_below() {
        let mut screen = TestScreen::new(10);
        screen.feed(b"one\r\ntwo\r\nthree");
        screen.feed(b"\x1b[2A\x1b[2G\x1b[J");
        screen.assert_screen(&["o"]);
        screen.assert_at(0, 1);
    }

    #[test]
    fn test_bell_count() {
        let mut screen = TestScreen::new(10);
        screen.feed(b"a\x07b\x07");
        assert_eq!(screen.bell_count(), 2);
        screen.assert_screen(&["ab"]);
    }
}
