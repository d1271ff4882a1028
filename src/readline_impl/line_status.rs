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

/// Quote and escape analysis of a logical line, deciding whether `accept-line`
/// terminates the read or enters continuation.
///
/// The scanner runs over the whole logical content (previous continuation rows plus
/// the live row) on every accept. Backslash escapes the next codepoint outside of
/// single quotes; single quotes are verbatim to the closing quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// Balanced: the line can terminate.
    Complete,
    /// An unclosed `'...'` span; a newline belongs inside the line.
    OpenSingleQuote,
    /// An unclosed `"..."` span; a newline belongs inside the line.
    OpenDoubleQuote,
    /// The line ends with an unescaped backslash; the next row splices on.
    TrailingEscape,
}

impl LineStatus {
    pub fn of(content: &str) -> Self {
        #[derive(Clone, Copy)]
        enum State {
            Normal,
            Escaped,
            Single,
            Double,
            DoubleEscaped,
        }

        let mut state = State::Normal;
        for cp in content.chars() {
            state = match state {
                State::Normal => match cp {
                    '\\' => State::Escaped,
                    '\'' => State::Single,
                    '"' => State::Double,
                    _ => State::Normal,
                },
                State::Escaped => State::Normal,
                State::Single => match cp {
                    '\'' => State::Normal,
                    _ => State::Single,
                },
                State::Double => match cp {
                    '\\' => State::DoubleEscaped,
                    '"' => State::Normal,
                    _ => State::Double,
                },
                State::DoubleEscaped => State::Double,
            };
        }

        match state {
            State::Normal => LineStatus::Complete,
            State::Escaped => LineStatus::TrailingEscape,
            State::Single => LineStatus::OpenSingleQuote,
            State::Double | State::DoubleEscaped => LineStatus::OpenDoubleQuote,
        }
    }

    pub fn is_open(&self) -> bool { *self != LineStatus::Complete }
}
