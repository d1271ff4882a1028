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

use std::io::Write;

use futures_util::FutureExt as _;
use miette::IntoDiagnostic as _;

use crate::{
    CancelHandle, LineStateControlSignal, PinnedInputStream, Readline, ReadlineEvent,
    SafeRawTerminal, SharedWriter, TtyInputResult,
};

/// Per-connection façade over [`Readline`] + [`SharedWriter`]; the simplest way to
/// use this crate.
///
/// A transport constructs one per connection, handing it the connection's output
/// sink and input stream, then loops on [`Self::read_line`]. Spawned tasks clone the
/// shared writer to print above the live prompt.
pub struct TermlineAsync {
    pub readline: Readline,
    pub shared_writer: SharedWriter,
}

impl TermlineAsync {
    /// Create a new instance for one connection. Example of `prompt` is `"> "`.
    ///
    /// Fails when the keymap or function registry is misconfigured (fatal at
    /// startup by design).
    pub fn try_new(
        prompt: impl AsRef<str>,
        safe_raw_terminal: SafeRawTerminal,
        pinned_input_stream: PinnedInputStream<TtyInputResult>,
    ) -> miette::Result<TermlineAsync> {
        let (readline, shared_writer) = Readline::new(
            prompt.as_ref().to_string(),
            safe_raw_terminal,
            pinned_input_stream,
        )
        .into_diagnostic()?;

        Ok(TermlineAsync {
            readline,
            shared_writer,
        })
    }

    pub fn clone_shared_writer(&self) -> SharedWriter { self.shared_writer.clone() }

    /// A handle that cancels a pending [`Self::read_line`] from another task.
    pub fn cancel_handle(&self) -> CancelHandle { self.readline.cancel_handle() }

    /// Read one line (async and non-blocking). Returns when the user accepts a
    /// line, input ends, or the read is canceled.
    pub async fn read_line(&mut self) -> miette::Result<ReadlineEvent> {
        self.readline.readline().fuse().await.into_diagnostic()
    }

    /// Switch the prompt, then read one line. This is the per-request-prompt shape
    /// of the API; the prompt sticks for subsequent reads.
    pub async fn read_line_with_prompt(
        &mut self,
        prompt: &str,
    ) -> miette::Result<ReadlineEvent> {
        self.readline.update_prompt(prompt).into_diagnostic()?;
        self.read_line().await
    }

    /// Print a line above the live prompt. This works concurrently with a pending
    /// [`Self::read_line`] and is compatible with it.
    pub async fn println<T>(&mut self, content: T)
    where
        T: std::fmt::Display,
    {
        let _ = writeln!(self.shared_writer, "{}", content);
    }

    /// Push out any partial line buffered in the shared writer.
    pub async fn flush(&mut self) {
        let _ = self
            .shared_writer
            .line_state_control_channel_sender
            .send(LineStateControlSignal::Flush)
            .await;
    }

    /// Suppress concurrent output (it accumulates, nothing is lost).
    pub async fn pause(&mut self) {
        let _ = self
            .shared_writer
            .line_state_control_channel_sender
            .send(LineStateControlSignal::Pause)
            .await;
    }

    /// Resume concurrent output and drain everything held while paused.
    pub async fn resume(&mut self) {
        let _ = self
            .shared_writer
            .line_state_control_channel_sender
            .send(LineStateControlSignal::Resume)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{StdoutMock, TestScreen};
    use crate::{gen_input_stream, TtyInput};

    #[tokio::test]
    async fn test_session_read_line() {
        let stdout_mock = StdoutMock::default();
        let mut session = TermlineAsync::try_new(
            "$ ",
            stdout_mock.safe_raw_terminal(),
            gen_input_stream(vec![Ok(TtyInput::bytes("hi\r"))]),
        )
        .unwrap();

        let event = session.read_line().await.unwrap();
        assert_eq!(event, ReadlineEvent::Line("hi".into()));

        let mut screen = TestScreen::new(80);
        screen.feed(&stdout_mock.get_copy_of_buffer());
        screen.assert_screen(&["$ hi"]);
        screen.assert_at(1, 0);
    }

    #[tokio::test]
    async fn test_session_prompt_switch_between_reads() {
        let stdout_mock = StdoutMock::default();
        let mut session = TermlineAsync::try_new(
            "$ ",
            stdout_mock.safe_raw_terminal(),
            gen_input_stream(vec![
                Ok(TtyInput::bytes("a\r")),
                Ok(TtyInput::bytes("b\r")),
            ]),
        )
        .unwrap();

        assert_eq!(
            session.read_line().await.unwrap(),
            ReadlineEvent::Line("a".into())
        );
        assert_eq!(
            session.read_line_with_prompt(">> ").await.unwrap(),
            ReadlineEvent::Line("b".into())
        );

        let mut screen = TestScreen::new(80);
        screen.feed(&stdout_mock.get_copy_of_buffer());
        screen.assert_screen(&["$ a", ">> b"]);
    }
}
