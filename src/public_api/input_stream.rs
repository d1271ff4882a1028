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

//! Constructors for the engine's input stream, for dependency injection.
//!
//! A transport bridges its own event source into an unbounded channel and hands
//! [`input_stream_from_channel`] to the engine; tests hand a finite vector to
//! [`gen_input_stream`].

use async_stream::stream;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{PinnedInputStream, TtyInputResult};

/// A stream that yields the given items in order, then ends (which the engine treats
/// as the transport going away).
pub fn gen_input_stream(items: Vec<TtyInputResult>) -> PinnedInputStream<TtyInputResult> {
    Box::pin(stream! {
        for item in items {
            yield item;
        }
    })
}

/// A stream fed by a channel: the transport's `deliver*` side. The stream ends when
/// every sender is dropped.
pub fn input_stream_from_channel(
    mut receiver: UnboundedReceiver<TtyInputResult>,
) -> PinnedInputStream<TtyInputResult> {
    Box::pin(stream! {
        while let Some(item) = receiver.recv().await {
            yield item;
        }
    })
}
