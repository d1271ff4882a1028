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

use crate::Text;

/// Signals sent to the `line` channel monitored by the engine's output task.
#[derive(Debug, Clone)]
pub enum LineStateControlSignal {
    Line(Text),
    Flush,
    Pause,
    Resume,
}

/// Cloneable object that implements [`Write`] and allows tasks to print to the
/// connection without messing up the associated [`crate::Readline`] prompt.
///
/// # Nothing is output until a newline, unless you send a flush
///
/// Data buffers locally until a line feed is written; each complete line is sent to
/// the monitor task, which repaints it above the live prompt. To push out a partial
/// line, send [`LineStateControlSignal::Flush`] on the channel (or use
/// [`crate::TermlineAsync::flush`]).
#[derive(Debug)]
pub struct SharedWriter {
    /// Holds the data to be written to the terminal.
    pub buffer: Text,

    /// Sender end of the channel; the receiver end lives in the engine's monitor
    /// task, which does the actual printing.
    pub line_state_control_channel_sender:
        tokio::sync::mpsc::Sender<LineStateControlSignal>,

    /// Set to `true` on clones. Only the first instance reports errors when the
    /// receiver end of the channel has closed.
    pub silent_error: bool,
}

impl SharedWriter {
    pub fn new(line_sender: tokio::sync::mpsc::Sender<LineStateControlSignal>) -> Self {
        Self {
            buffer: Text::default(),
            line_state_control_channel_sender: line_sender,
            silent_error: false,
        }
    }
}

/// Each clone gets its own buffer, but all clones feed the same `line` channel, so
/// output from many tasks interleaves by whole lines.
impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            buffer: Text::default(),
            line_state_control_channel_sender: self
                .line_state_control_channel_sender
                .clone(),
            silent_error: true,
        }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);

        if self.buffer.ends_with(b"\n") {
            match self
                .line_state_control_channel_sender
                .try_send(LineStateControlSignal::Line(self.buffer.clone()))
            {
                Ok(_) => {
                    self.buffer.clear();
                }
                Err(_) => {
                    if !self.silent_error {
                        return Err(io::Error::new(
                            io::ErrorKind::Other,
                            "SharedWriter receiver has closed",
                        ));
                    }
                }
            }
        }

        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            if self
                .line_state_control_channel_sender
                .try_send(LineStateControlSignal::Line(self.buffer.clone()))
                .is_ok()
            {
                self.buffer.clear();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffers_until_newline() {
        let (sender, mut receiver) = tokio::sync::mpsc::channel(10);
        let mut writer = SharedWriter::new(sender);

        write!(writer, "partial").unwrap();
        assert!(receiver.try_recv().is_err());

        writeln!(writer, " line").unwrap();
        match receiver.try_recv().unwrap() {
            LineStateControlSignal::Line(text) => {
                assert_eq!(String::from_utf8_lossy(&text), "partial line\n");
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_flush_pushes_partial_line() {
        let (sender, mut receiver) = tokio::sync::mpsc::channel(10);
        let mut writer = SharedWriter::new(sender);

        write!(writer, "no newline").unwrap();
        writer.flush().unwrap();
        match receiver.try_recv().unwrap() {
            LineStateControlSignal::Line(text) => {
                assert_eq!(String::from_utf8_lossy(&text), "no newline");
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clone_is_silent_on_closed_channel() {
        let (sender, receiver) = tokio::sync::mpsc::channel(1);
        let original = SharedWriter::new(sender);
        let mut clone = original.clone();
        drop(receiver);

        // The clone swallows the send failure.
        assert!(writeln!(clone, "dropped").is_ok());
    }
}
