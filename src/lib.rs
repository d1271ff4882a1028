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

//! The `r3bl_termline` library is a readline engine for terminals that live on the
//! other side of a transport: SSH channels, Telnet connections, WebSocket frames, or a
//! plain raw TTY. The transport delivers raw bytes and out-of-band events; the engine
//! delivers edited, history-aware lines back, and renders every edit as a minimal
//! screen delta written to an output sink it never blocks on.
//!
//! # Why use this crate
//!
//! Local readline crates assume they own `stdin`, `stdout`, and the TTY they can flip
//! into raw mode. A terminal server owns none of those things. What it has is:
//!
//! 1. A stream of byte chunks that can split a multi-byte UTF-8 sequence anywhere.
//! 2. A peer terminal that understands cursor movement and erase sequences, reached
//!    through a write sink.
//! 3. Out-of-band signals (interrupt, end-of-input, terminal type changes, resizes)
//!    that arrive on their own path, not inside the byte stream.
//!
//! This crate is built around exactly that boundary:
//!
//! - [`Utf8Decoder`] / [`Utf8Encoder`] convert between transport bytes and the
//!   codepoint stream the editor operates on, surviving chunk splits mid-sequence and
//!   substituting (never failing) on malformed input.
//! - [`Keymap`] + [`KeyDecoder`] recognize multi-codepoint escape sequences in the
//!   decoded stream and resolve them to named editing functions, holding ambiguous
//!   prefixes until the input commits one way or the other.
//! - [`Readline`] runs the interaction state machine: line buffer and cursor,
//!   quoted/escaped multi-line continuation, in-memory [`History`] navigation,
//!   completion, cancellation, and per-edit delta rendering through [`LineState`].
//! - [`SharedWriter`] lets other tasks print above the live prompt without clobbering
//!   it, with pause/resume support.
//!
//! # How to use this crate
//!
//! Construct a [`TermlineAsync`] per connection, handing it the connection's output
//! sink and a [`PinnedInputStream`] of [`TtyInput`] items (bytes, resizes, events).
//! Then call [`TermlineAsync::read_line`] in a loop:
//!
//! ```text
//! transport bytes ──▶ Utf8Decoder ──▶ KeyDecoder ──▶ editing functions
//!                                                        │
//! transport sink  ◀── Utf8Encoder ◀── LineState ◀────────┘
//! ```
//!
//! The engine performs no raw-mode or size syscalls, no network I/O, and no timers:
//! all of that belongs to the transport. Everything per-connection is serialized onto
//! the `readline()` future plus one monitor task, so the editing state needs no locks
//! beyond the `Arc<StdMutex<_>>` sharing used for dependency injection and testing.

// Attach sources.
pub mod codec_impl;
pub mod keymap_impl;
pub mod public_api;
pub mod readline_impl;
pub mod tracing_logging;

// Re-export the public API.
pub use codec_impl::*;
pub use keymap_impl::*;
pub use public_api::*;
pub use readline_impl::*;
pub use tracing_logging::*;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Type aliases.
use std::{collections::VecDeque, pin::Pin, sync::Arc};

use futures_core::Stream;

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

pub type SafeLineState = Arc<StdMutex<LineState>>;
pub type SafeHistory = Arc<StdMutex<History>>;

pub type SafeBool = Arc<StdMutex<bool>>;
pub type Text = Vec<u8>;

pub type PauseBuffer = VecDeque<Text>;
pub type SafePauseBuffer = Arc<StdMutex<PauseBuffer>>;

pub type TtyInputResult = Result<TtyInput, std::io::Error>;
pub type PinnedInputStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

// Constants.
pub const CHANNEL_CAPACITY: usize = 1_000;
pub const HISTORY_SIZE_MAX: usize = 1_000;

/// Default output-batch capacity of [`Utf8Decoder`]: decoded codepoints are handed to
/// the consumer in runs of at most this many.
pub const DECODER_BATCH_SIZE: usize = 1_024;

/// Wrap width and height assumed until the transport delivers the first
/// [`TtyInput::Resize`].
pub const DEFAULT_TERM_SIZE: (u16, u16) = (80, 24);
