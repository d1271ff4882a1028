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

use strum_macros::Display;

/// One item of transport input, the element type of the engine's input stream.
///
/// The transport is the serialization point: however it learns about keystrokes,
/// window changes, and signal-style conditions (Telnet options, SSH channel
/// requests, WebSocket control frames), it delivers them interleaved in arrival
/// order on one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtyInput {
    /// Raw bytes from the peer. Chunk boundaries are arbitrary; the engine's codec
    /// reassembles split UTF-8 sequences.
    Bytes(Vec<u8>),

    /// The peer's terminal is now `width` × `height` cells.
    Resize(u16, u16),

    /// An out-of-band condition. Delivered to the interaction directly, bypassing
    /// the keymap.
    Event(TtyEvent),
}

impl TtyInput {
    /// Convenience constructor for text input.
    pub fn bytes(text: &str) -> Self { Self::Bytes(text.as_bytes().to_vec()) }
}

/// Signal-style conditions that bypass the keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TtyEvent {
    /// Abandon the current logical line and present a fresh prompt. Does not
    /// resolve the pending read.
    Interrupt,

    /// End of input. With an empty logical line this resolves the read with
    /// [`crate::ReadlineEvent::Eof`]; with content it behaves as `delete-char` at
    /// the cursor (the interactive Ctrl-D convention — this crate's documented
    /// policy, since transports disagree here).
    Eof,

    /// The peer renegotiated its terminal type; the engine repaints.
    TerminalTypeChanged,
}
