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

use std::io::{self, Write};

use crossterm::{
    cursor,
    terminal::{Clear, ClearType::*},
    QueueableCommand,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{LineBuffer, ReadlineError, Utf8Encoder};

/// Render state for the row block currently being edited, plus the wrap math that
/// keeps the on-screen cursor in sync with the buffer cursor.
///
/// Everything written to the terminal goes through this struct so that deltas stay
/// minimal: editing operations repaint from the edit point to the end of the line,
/// never the whole line, and pure cursor motions move the cursor without repainting
/// at all. Output is queued onto the supplied writer; the engine flushes once per
/// processed event.
///
/// The "current block" is the primary- or continuation-prompt row the user is typing
/// on, including any wrapped rows it spans at the current terminal width. Earlier
/// rows of a multi-line continuation are already final on screen and are never
/// touched again.
pub struct LineState {
    pub prompt: String,
    /// Secondary prompt rendered at the start of every continuation row.
    pub continuation_prompt: String,

    /// The live edit buffer for the current row.
    pub buffer: LineBuffer,

    /// True from the start of a read interaction until it resolves. While inactive,
    /// concurrent output prints plainly and no prompt is repainted.
    pub is_active: bool,

    /// True while the logical line is in quoted/escaped continuation.
    pub in_continuation: bool,

    /// On-screen distance (display cells) from the start of the block to the cursor,
    /// prompt included. Wrap math turns this into a row/column pair.
    pub current_column: u16,

    /// After pressing enter, should the line just submitted stay on screen?
    pub should_print_line_on_enter: bool,

    /// After an interrupt, should the abandoned line stay on screen?
    pub should_print_line_on_interrupt: bool,

    pub last_line_length: usize,
    pub last_line_completed: bool,

    pub term_size: (u16, u16),
}

impl LineState {
    pub fn new(prompt: String, term_size: (u16, u16)) -> Self {
        let current_column = UnicodeWidthStr::width(prompt.as_str()) as u16;
        Self {
            prompt,
            continuation_prompt: "> ".into(),
            buffer: LineBuffer::new(),
            is_active: false,
            in_continuation: false,
            current_column,
            should_print_line_on_enter: true,
            should_print_line_on_interrupt: true,
            last_line_length: 0,
            last_line_completed: true,
            term_size: (term_size.0.max(1), term_size.1.max(1)),
        }
    }

    /// The prompt of the row being edited: primary, or secondary in continuation.
    pub fn active_prompt(&self) -> &str {
        if self.in_continuation {
            &self.continuation_prompt
        } else {
            &self.prompt
        }
    }

    fn prompt_width(&self) -> u16 {
        UnicodeWidthStr::width(self.active_prompt()) as u16
    }

    /// On-screen block offset of the buffer position `offset`.
    fn col_at(&self, offset: usize) -> u16 {
        let text_width: usize = self.buffer.chars()[..offset]
            .iter()
            .map(|cp| UnicodeWidthChar::width(*cp).unwrap_or(0))
            .sum();
        self.prompt_width() + text_width as u16
    }

    /// Row within the block that the given cell offset falls on.
    fn row_of(&self, pos: u16) -> u16 { pos / self.term_size.0 }

    fn col_of(&self, pos: u16) -> u16 { pos % self.term_size.0 }

    /// Move from a (committed) position in the block to the block start.
    fn move_to_beginning(&self, term: &mut dyn Write, from: u16) -> io::Result<()> {
        let move_up = self.row_of(from);
        term.queue(cursor::MoveToColumn(0))?;
        if move_up != 0 {
            term.queue(cursor::MoveUp(move_up))?;
        }
        Ok(())
    }

    /// Move from the block start to a position in the block.
    fn move_from_beginning(&self, term: &mut dyn Write, to: u16) -> io::Result<()> {
        let move_down = self.row_of(to);
        let remaining = self.col_of(to);
        if move_down != 0 {
            term.queue(cursor::MoveDown(move_down))?;
        }
        if remaining != 0 {
            term.queue(cursor::MoveRight(remaining))?;
        }
        Ok(())
    }

    /// Text that ends exactly at the right edge leaves the terminal in the deferred
    /// autowrap state, where the cursor position is ambiguous. Writing CRLF commits
    /// the wrap so the position math in [`Self::row_of`] / [`Self::col_of`] holds.
    fn commit_wrap(&self, end_col: u16, term: &mut dyn Write) -> io::Result<()> {
        if end_col > 0 && self.col_of(end_col) == 0 {
            term.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Clear the current block and leave the cursor at its start.
    pub fn clear(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_to_beginning(term, self.current_column)?;
        term.queue(Clear(FromCursorDown))?;
        Ok(())
    }

    /// Paint prompt and buffer, then park the cursor at `current_column`.
    pub fn render(&self, term: &mut dyn Write) -> io::Result<()> {
        term.write_all(self.active_prompt().as_bytes())?;
        term.write_all(&Utf8Encoder::encode(self.buffer.chars()))?;
        let end_col = self.col_at(self.buffer.len());
        self.commit_wrap(end_col, term)?;
        self.move_to_beginning(term, end_col)?;
        self.move_from_beginning(term, self.current_column)?;
        Ok(())
    }

    pub fn clear_and_render(&self, term: &mut dyn Write) -> io::Result<()> {
        self.clear(term)?;
        self.render(term)?;
        Ok(())
    }

    /// Repaint from buffer position `offset` to the end of the line, clearing any
    /// leftovers, then park the cursor. This is the minimal delta for every edit:
    /// text before the edit point is never rewritten.
    pub fn render_from(&mut self, offset: usize, term: &mut dyn Write) -> io::Result<()> {
        let offset = offset.min(self.buffer.len());
        let from_col = self.col_at(offset);
        self.move_to_beginning(term, self.current_column)?;
        self.move_from_beginning(term, from_col)?;
        let tail = &self.buffer.chars()[offset..];
        let end_col = self.col_at(self.buffer.len());
        if tail.is_empty() {
            term.queue(Clear(FromCursorDown))?;
        } else {
            term.write_all(&Utf8Encoder::encode(tail))?;
            self.commit_wrap(end_col, term)?;
            term.queue(Clear(FromCursorDown))?;
        }
        let new_col = self.col_at(self.buffer.cursor());
        self.move_to_beginning(term, end_col)?;
        self.move_from_beginning(term, new_col)?;
        self.current_column = new_col;
        Ok(())
    }

    /// Move the on-screen cursor to match the buffer cursor, repainting nothing.
    pub fn reposition_cursor(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let new_col = self.col_at(self.buffer.cursor());
        self.move_to_beginning(term, self.current_column)?;
        self.move_from_beginning(term, new_col)?;
        self.current_column = new_col;
        Ok(())
    }

    /// Insert at the cursor and repaint the tail.
    pub fn insert_and_render(&mut self, cp: char, term: &mut dyn Write) -> io::Result<()> {
        let edit_point = self.buffer.cursor();
        self.buffer.insert(cp);
        self.render_from(edit_point, term)
    }

    /// Replace the whole row content (history fetch, completion replace) and repaint
    /// the block.
    pub fn replace_line(&mut self, text: &str, term: &mut dyn Write) -> io::Result<()> {
        self.clear(term)?;
        self.buffer.set_content(text);
        self.current_column = self.col_at(self.buffer.cursor());
        self.render(term)
    }

    /// Begin a fresh read interaction: empty buffer, primary prompt painted.
    pub fn start_read(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.is_active = true;
        self.in_continuation = false;
        self.buffer.clear();
        self.current_column = self.prompt_width();
        self.render(term)
    }

    /// The current row is final; open a continuation row under it.
    pub fn enter_continuation(&mut self, term: &mut dyn Write) -> io::Result<()> {
        term.write_all(b"\r\n")?;
        self.in_continuation = true;
        self.buffer.clear();
        self.current_column = self.prompt_width();
        self.render(term)
    }

    /// The interaction resolved: leave (or erase) the line and deactivate.
    pub fn finish_line(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.should_print_line_on_enter {
            term.write_all(b"\r\n")?;
        } else {
            self.clear(term)?;
        }
        self.is_active = false;
        self.in_continuation = false;
        self.current_column = 0;
        Ok(())
    }

    /// Interrupt: abandon the logical line and paint a fresh primary prompt on the
    /// next row. The interaction stays active.
    pub fn interrupt_reset(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.should_print_line_on_interrupt {
            term.write_all(b"\r\n")?;
        } else {
            self.clear(term)?;
        }
        self.in_continuation = false;
        self.buffer.clear();
        self.current_column = self.prompt_width();
        self.render(term)
    }

    /// New terminal dimensions from the transport; repaint under the new wrap width.
    pub fn resize(&mut self, width: u16, height: u16, term: &mut dyn Write) -> io::Result<()> {
        self.term_size = (width.max(1), height.max(1));
        if self.is_active {
            self.clear_and_render(term)?;
        }
        Ok(())
    }

    /// Audible bell, the whole response to an illegal keystroke.
    pub fn bell(&self, term: &mut dyn Write) -> io::Result<()> {
        term.write_all(b"\x07")
    }

    /// Change the primary prompt mid-interaction and repaint.
    pub fn update_prompt(
        &mut self,
        prompt: &str,
        term: &mut dyn Write,
    ) -> Result<(), ReadlineError> {
        if self.is_active && !self.in_continuation {
            self.clear(term)?;
        }
        self.prompt.clear();
        self.prompt.push_str(prompt);
        if self.is_active && !self.in_continuation {
            self.current_column = self.col_at(self.buffer.cursor());
            self.render(term)?;
        }
        Ok(())
    }

    /// Print concurrent output above the live prompt (the [`crate::SharedWriter`]
    /// path). While a read is active the block is cleared first and repainted after,
    /// so application output and the prompt never clobber each other.
    pub fn print_data(&mut self, data: &[u8], term: &mut dyn Write) -> Result<(), ReadlineError> {
        if self.is_active {
            self.clear(term)?;
        }

        // If the last written data did not end in a newline, restore the cursor to
        // the end of that partial line.
        if !self.last_line_completed {
            term.queue(cursor::MoveUp(1))?
                .queue(cursor::MoveToColumn(0))?;
            if self.last_line_length > 0 {
                term.queue(cursor::MoveRight(self.last_line_length as u16))?;
            }
        }

        // Write data so that newlines also act as carriage returns.
        for line in data.split_inclusive(|byte| *byte == b'\n') {
            term.write_all(line)?;
            term.queue(cursor::MoveToColumn(0))?;
        }

        self.last_line_completed = data.ends_with(b"\n");
        if self.last_line_completed {
            self.last_line_length = 0;
        } else {
            self.last_line_length += data.len();
            // Keep the saved length within one row when a partial line wraps.
            if self.last_line_length >= self.term_size.0 as usize {
                self.last_line_length %= self.term_size.0 as usize;
                writeln!(term)?;
            }
            writeln!(term)?;
        }

        term.queue(cursor::MoveToColumn(0))?;

        if self.is_active {
            self.render(term)?;
        }
        Ok(())
    }

    pub fn print(&mut self, text: &str, term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.print_data(text.as_bytes(), term)?;
        Ok(())
    }
}
