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

use std::{collections::VecDeque, io, sync::Arc};

use crossterm::{
    cursor,
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use futures_util::StreamExt;
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    default_keymap, CompletionHandler, FunctionRegistry, History, Interaction,
    KeyDecoder, KeyEvent, Keymap, KeymapError, LineState, LineStateControlSignal,
    PinnedInputStream, SafeBool, SafeHistory, SafeLineState, SafePauseBuffer,
    SafeRawTerminal, SharedWriter, StdMutex, TtyEvent, TtyInput, TtyInputResult,
    Utf8Decoder, CHANNEL_CAPACITY, DEFAULT_TERM_SIZE,
};

/// # Mental model and overview
///
/// This is the readline interaction state machine for one connection. The transport
/// owns the socket; this struct owns the editing semantics. It is fed a
/// [`PinnedInputStream`] of [`TtyInput`] items — raw byte chunks, resize
/// notifications, and out-of-band events — and it writes prompts, edits, and
/// minimal repaint deltas to the connection's output sink.
///
/// When you call [`Self::readline()`] the engine starts one interaction: it paints
/// the prompt and then suspends on the input stream, resuming per delivered item.
/// Bytes run through the incremental UTF-8 decoder, then the key matcher, then the
/// named editing functions; out-of-band events skip the keymap entirely. The call
/// returns when the interaction resolves: a completed line, end of input, or
/// cancellation. Only one interaction may be outstanding; a second concurrent
/// request is a usage error, not a queue.
///
/// # Continuation
///
/// A line whose quotes are open or that ends in an unescaped backslash is not
/// finished: `accept-line` opens a continuation row under the secondary prompt and
/// the logical line keeps accumulating. Interrupt abandons the whole logical line
/// (without resolving the read); a completed line carries its embedded newlines.
///
/// # Concurrent output
///
/// Creating an engine also returns a [`SharedWriter`]. Lines written to it are
/// repainted *above* the live prompt by a monitor task, and can be paused, resumed,
/// and flushed — see [`pause_and_resume_support`]. While paused, output accumulates
/// in a buffer and nothing is lost.
///
/// # Inputs and dependency injection
///
/// Both ends are injected, which is what makes the engine testable without a
/// terminal: the input stream is any [`futures_core::Stream`] of [`TtyInputResult`]
/// (see [`crate::gen_input_stream`] and [`crate::input_stream_from_channel`]), and
/// the output sink is any `dyn std::io::Write + Send` behind [`SafeRawTerminal`].
/// The engine never touches raw mode, terminal size syscalls, or timers — those
/// belong to the transport on the other side of the stream.
pub struct Readline {
    /// Output sink for the connection, supplied via dependency injection.
    pub safe_raw_terminal: SafeRawTerminal,

    /// Stream of transport input: bytes, resizes, out-of-band events.
    pub pinned_input_stream: PinnedInputStream<TtyInputResult>,

    /// Render state for the row being edited.
    pub safe_line_state: SafeLineState,

    /// Use to send history updates from outside the engine.
    pub history_sender: UnboundedSender<String>,
    /// Use to receive history updates.
    pub history_receiver: UnboundedReceiver<String>,
    /// Manages the history.
    pub safe_history: SafeHistory,

    /// Determines whether concurrent output via [`SharedWriter`]s is suppressed.
    pub safe_is_paused: SafeBool,

    /// Collects lines written while the output is paused.
    pub safe_is_paused_buffer: SafePauseBuffer,

    /// Where the engine is in the Idle → Reading ⇄ Continuation cycle. Shared with
    /// [`CancelHandle`]s.
    pub safe_read_phase: SafeReadPhase,

    decoder: Utf8Decoder,
    key_decoder: KeyDecoder,
    registry: Arc<FunctionRegistry>,

    /// Logical content accumulated by continuation rows of the current interaction.
    pending_line: String,

    /// Key events decoded past a resolution point, replayed by the next
    /// [`Self::readline()`] call (type-ahead across interactions).
    pending_events: VecDeque<KeyEvent>,

    completion_handler: Option<CompletionHandler>,

    cancel_sender: UnboundedSender<()>,
    cancel_receiver: UnboundedReceiver<()>,
}

/// Error returned from [`readline()`][Readline::readline]. Such errors generally
/// require specific procedures to recover from.
#[derive(Debug, Error)]
pub enum ReadlineError {
    /// An internal I/O error occurred while writing to the output sink.
    #[error(transparent)]
    IO(#[from] io::Error),

    /// `readline()` was called while a previous interaction was still unresolved.
    /// One interaction per connection; new requests are an error, never queued.
    #[error("a read interaction is already in progress")]
    AlreadyReading,

    /// Keymap or function-registry construction failed. Fatal at startup.
    #[error(transparent)]
    Keymap(#[from] KeymapError),
}

/// Events emitted by [`Readline::readline()`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReadlineEvent {
    /// The user entered a complete line. Multi-row continuations arrive as one
    /// string with embedded newlines.
    Line(String),

    /// End of input: an EOF event arrived with nothing typed, or the transport's
    /// stream ended.
    Eof,

    /// [`CancelHandle::cancel()`] resolved the interaction from outside.
    Canceled,
}

/// Lifecycle of the per-connection read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReadPhase {
    /// No interaction outstanding.
    Idle,
    /// An interaction is consuming input.
    Reading,
    /// The logical line spans rows; newlines append instead of resolving.
    Continuation,
}

pub type SafeReadPhase = Arc<StdMutex<ReadPhase>>;

/// Cooperative cancellation for a pending [`Readline::readline()`] call. Safe to
/// call from outside the serialized context; the effect is applied inside it.
#[derive(Clone)]
pub struct CancelHandle {
    safe_read_phase: SafeReadPhase,
    sender: UnboundedSender<()>,
}

impl CancelHandle {
    /// Force a pending interaction to resolve with [`ReadlineEvent::Canceled`].
    /// Returns false when no interaction is pending, so double-cancel is
    /// observable.
    pub fn cancel(&self) -> bool {
        let mut phase = self.safe_read_phase.lock().unwrap();
        if *phase == ReadPhase::Idle {
            return false;
        }
        *phase = ReadPhase::Idle;
        let _ = self.sender.send(());
        true
    }
}

/// Internal control flow for the monitor task.
#[derive(Debug, PartialEq, Clone)]
pub enum ControlFlowLimited<E> {
    ReturnError(E),
    Continue,
}

/// What woke the read loop up.
enum LoopEvent {
    Input(Option<TtyInputResult>),
    HistoryEntry(Option<String>),
    Cancel,
}

pub mod pause_and_resume_support {
    use super::*;

    /// Receiver end of the channel; the sender ends live in [`SharedWriter`] clones,
    /// which do the actual writing into the channel.
    pub fn spawn_task_to_monitor_line_channel(
        mut line_channel_receiver: mpsc::Receiver<LineStateControlSignal>, /* This is moved. */
        safe_is_paused: SafeBool,
        safe_line_state: SafeLineState,
        safe_raw_terminal: SafeRawTerminal,
        safe_is_paused_buffer: SafePauseBuffer,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            // recv() is cancel safe; channel closed means all writers are gone and
            // the task shuts down.
            while let Some(signal) = line_channel_receiver.recv().await {
                let control_flow = process_line_control_signal(
                    signal,
                    safe_is_paused_buffer.clone(),
                    safe_line_state.clone(),
                    safe_raw_terminal.clone(),
                    safe_is_paused.clone(),
                );
                if let ControlFlowLimited::ReturnError(_) = control_flow {
                    break;
                }
            }
        })
    }

    pub fn process_line_control_signal(
        signal: LineStateControlSignal,
        safe_is_paused_buffer: SafePauseBuffer,
        safe_line_state: SafeLineState,
        safe_raw_terminal: SafeRawTerminal,
        safe_is_paused: SafeBool,
    ) -> ControlFlowLimited<ReadlineError> {
        match signal {
            LineStateControlSignal::Line(buf) => {
                // While paused, hold the output so nothing clobbers a spinner or
                // whatever the pause is protecting.
                if *safe_is_paused.lock().unwrap() {
                    safe_is_paused_buffer.lock().unwrap().push_back(buf);
                    return ControlFlowLimited::Continue;
                }

                let mut line_state = safe_line_state.lock().unwrap();
                let mut term_guard = safe_raw_terminal.lock().unwrap();
                let term = &mut *term_guard;
                if let Err(err) = line_state.print_data(&buf, term) {
                    return ControlFlowLimited::ReturnError(err);
                }
                if let Err(err) = term.flush() {
                    return ControlFlowLimited::ReturnError(err.into());
                }
            }

            LineStateControlSignal::Flush => {
                let _ = flush_internal(
                    safe_is_paused_buffer,
                    safe_is_paused,
                    safe_line_state,
                    safe_raw_terminal,
                );
            }

            LineStateControlSignal::Pause => {
                *safe_is_paused.lock().unwrap() = true;
            }

            LineStateControlSignal::Resume => {
                *safe_is_paused.lock().unwrap() = false;
                let _ = flush_internal(
                    safe_is_paused_buffer,
                    safe_is_paused,
                    safe_line_state,
                    safe_raw_terminal,
                );
            }
        }

        ControlFlowLimited::Continue
    }

    /// Drain the pause buffer to the terminal and repaint the prompt block.
    pub fn flush_internal(
        safe_is_paused_buffer: SafePauseBuffer,
        safe_is_paused: SafeBool,
        safe_line_state: SafeLineState,
        safe_raw_terminal: SafeRawTerminal,
    ) -> Result<(), ReadlineError> {
        if *safe_is_paused.lock().unwrap() {
            return Ok(());
        }

        let mut line_state = safe_line_state.lock().unwrap();
        let mut term_guard = safe_raw_terminal.lock().unwrap();
        let term = &mut *term_guard;

        let mut pause_buffer = safe_is_paused_buffer.lock().unwrap();
        while let Some(buf) = pause_buffer.pop_front() {
            line_state.print_data(&buf, term)?;
        }

        if line_state.is_active {
            line_state.clear_and_render(term)?;
        }
        term.flush()?;

        Ok(())
    }
}

impl Readline {
    /// Create a new engine with the default keymap and standard function set, plus
    /// an associated [`SharedWriter`]. To customize the behavior of this instance
    /// see:
    /// - [`Self::with_parts`]
    /// - [`Self::set_completion_handler`]
    /// - [`Self::should_print_line_on`]
    /// - [`Self::set_max_history`]
    pub fn new(
        prompt: String,
        safe_raw_terminal: SafeRawTerminal,
        /* move */ pinned_input_stream: PinnedInputStream<TtyInputResult>,
    ) -> Result<(Self, SharedWriter), ReadlineError> {
        let keymap = Arc::new(default_keymap()?);
        let registry = Arc::new(FunctionRegistry::standard());
        Self::with_parts(prompt, safe_raw_terminal, pinned_input_stream, keymap, registry)
    }

    /// Create a new engine from explicit parts. The keymap is validated against the
    /// registry here: a binding naming an unregistered function aborts construction.
    pub fn with_parts(
        prompt: String,
        safe_raw_terminal: SafeRawTerminal,
        /* move */ pinned_input_stream: PinnedInputStream<TtyInputResult>,
        keymap: Arc<Keymap>,
        registry: Arc<FunctionRegistry>,
    ) -> Result<(Self, SharedWriter), ReadlineError> {
        registry.validate(&keymap)?;

        // Line channel for SharedWriter output.
        let (line_channel_sender, line_channel_receiver) =
            mpsc::channel::<LineStateControlSignal>(CHANNEL_CAPACITY);

        // Paused state.
        let safe_is_paused = Arc::new(StdMutex::new(false));

        // History setup.
        let (history, history_receiver) = History::new();
        let history_sender = history.sender.clone();
        let safe_history = Arc::new(StdMutex::new(history));

        // Line state.
        let line_state = LineState::new(prompt, DEFAULT_TERM_SIZE);
        let safe_line_state = Arc::new(StdMutex::new(line_state));

        // Pause buffer.
        let safe_is_paused_buffer: SafePauseBuffer =
            Arc::new(StdMutex::new(VecDeque::new()));

        // Start the task that processes SharedWriter output.
        pause_and_resume_support::spawn_task_to_monitor_line_channel(
            line_channel_receiver,
            safe_is_paused.clone(),
            safe_line_state.clone(),
            safe_raw_terminal.clone(),
            safe_is_paused_buffer.clone(),
        );

        let (cancel_sender, cancel_receiver) = mpsc::unbounded_channel::<()>();

        let readline = Readline {
            safe_raw_terminal,
            pinned_input_stream,
            safe_line_state,
            history_sender,
            history_receiver,
            safe_history,
            safe_is_paused,
            safe_is_paused_buffer,
            safe_read_phase: Arc::new(StdMutex::new(ReadPhase::Idle)),
            decoder: Utf8Decoder::new(),
            key_decoder: KeyDecoder::new(keymap),
            registry,
            pending_line: String::new(),
            pending_events: VecDeque::new(),
            completion_handler: None,
            cancel_sender,
            cancel_receiver,
        };

        let shared_writer = SharedWriter::new(line_channel_sender);

        Ok((readline, shared_writer))
    }

    /// A handle that can resolve a pending read with [`ReadlineEvent::Canceled`]
    /// from outside the read loop.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            safe_read_phase: self.safe_read_phase.clone(),
            sender: self.cancel_sender.clone(),
        }
    }

    /// Register the external completion handler invoked by the `complete` function.
    /// Without one, completion keystrokes are a no-op.
    pub fn set_completion_handler(&mut self, handler: CompletionHandler) {
        self.completion_handler = Some(handler);
    }

    /// Change the prompt for subsequent interactions (and repaint if one is live).
    pub fn update_prompt(&mut self, prompt: &str) -> Result<(), ReadlineError> {
        self.safe_line_state
            .lock()
            .unwrap()
            .update_prompt(prompt, &mut *self.safe_raw_terminal.lock().unwrap())?;
        Ok(())
    }

    /// Clear the peer's screen.
    pub fn clear(&mut self) -> Result<(), ReadlineError> {
        let line_state = self.safe_line_state.lock().unwrap();
        let mut term_guard = self.safe_raw_terminal.lock().unwrap();
        let term = &mut *term_guard;
        term.queue(Clear(ClearType::All))?;
        term.queue(cursor::MoveTo(0, 0))?;
        if line_state.is_active {
            line_state.render(term)?;
        }
        term.flush()?;
        Ok(())
    }

    /// Set maximum history length. The default length is
    /// [`crate::HISTORY_SIZE_MAX`].
    pub fn set_max_history(&mut self, max_size: usize) {
        let mut history = self.safe_history.lock().unwrap();
        history.max_size = max_size;
        history.entries.truncate(max_size);
    }

    /// Set whether the input line should remain on the screen after events.
    ///
    /// If `enter` is true, then when the user presses "Enter", the prompt and the
    /// text they entered will remain on the screen, and the cursor will move to the
    /// next line. If `enter` is false, the prompt & input will be erased instead.
    ///
    /// `interrupt` similarly controls the behavior for an interrupt event. Both
    /// default to `true`.
    pub fn should_print_line_on(&mut self, enter: bool, interrupt: bool) {
        let mut line_state = self.safe_line_state.lock().unwrap();
        line_state.should_print_line_on_enter = enter;
        line_state.should_print_line_on_interrupt = interrupt;
    }

    /// Add a line to the input history from outside the engine.
    pub fn add_history_entry(&mut self, entry: String) -> Option<()> {
        self.history_sender.send(entry).ok()
    }

    /// Run one read interaction to resolution. Returns when the user accepts a
    /// line, input ends, or the interaction is canceled.
    ///
    /// This function can be called repeatedly in a loop; input that arrived past
    /// the previous resolution (type-ahead) is consumed first.
    pub async fn readline(&mut self) -> miette::Result<ReadlineEvent, ReadlineError> {
        {
            let mut phase = self.safe_read_phase.lock().unwrap();
            if *phase != ReadPhase::Idle {
                return Err(ReadlineError::AlreadyReading);
            }
            *phase = ReadPhase::Reading;
        }
        let result = self.run_interaction().await;
        if result.is_err() {
            *self.safe_read_phase.lock().unwrap() = ReadPhase::Idle;
        }
        result
    }

    async fn run_interaction(&mut self) -> miette::Result<ReadlineEvent, ReadlineError> {
        // Drop cancel signals aimed at interactions that already resolved.
        while self.cancel_receiver.try_recv().is_ok() {}

        tracing::debug!("readline interaction started");

        // Paint the prompt for this interaction.
        {
            let mut line_state = self.safe_line_state.lock().unwrap();
            let mut term_guard = self.safe_raw_terminal.lock().unwrap();
            let term = &mut *term_guard;
            line_state.start_read(term)?;
            term.flush()?;
        }

        // Replay type-ahead decoded past the previous resolution.
        while let Some(event) = self.pending_events.pop_front() {
            if let Some(resolved) = self.apply_key_event(event)? {
                return self.resolve_with(resolved);
            }
        }

        loop {
            let wake = tokio::select! {
                // Cancel safe: no state lives inside these futures; dropping the
                // losers loses nothing.
                maybe_result = self.pinned_input_stream.next() => LoopEvent::Input(maybe_result),
                maybe_entry = self.history_receiver.recv() => LoopEvent::HistoryEntry(maybe_entry),
                _ = self.cancel_receiver.recv() => LoopEvent::Cancel,
            };

            match wake {
                LoopEvent::Input(Some(Ok(input))) => {
                    if let Some(resolved) = self.process_input(input)? {
                        return self.resolve_with(resolved);
                    }
                }
                LoopEvent::Input(Some(Err(err))) => {
                    return Err(err.into());
                }
                LoopEvent::Input(None) => {
                    // The transport is gone. Resolve as end of input without
                    // touching the screen; there is no peer left to repaint.
                    self.safe_line_state.lock().unwrap().is_active = false;
                    return self.resolve_with(ReadlineEvent::Eof);
                }
                LoopEvent::HistoryEntry(maybe_entry) => {
                    self.safe_history.lock().unwrap().update(maybe_entry);
                }
                LoopEvent::Cancel => {
                    self.pending_line.clear();
                    let mut line_state = self.safe_line_state.lock().unwrap();
                    let mut term_guard = self.safe_raw_terminal.lock().unwrap();
                    let term = &mut *term_guard;
                    line_state.buffer.clear();
                    line_state.finish_line(term)?;
                    term.flush()?;
                    drop(term_guard);
                    drop(line_state);
                    return self.resolve_with(ReadlineEvent::Canceled);
                }
            }
        }
    }

    fn resolve_with(
        &mut self,
        event: ReadlineEvent,
    ) -> miette::Result<ReadlineEvent, ReadlineError> {
        *self.safe_read_phase.lock().unwrap() = ReadPhase::Idle;
        tracing::debug!(event = ?event, "readline interaction resolved");
        Ok(event)
    }

    /// Process one transport input item. Returns the resolution, if it caused one.
    fn process_input(
        &mut self,
        input: TtyInput,
    ) -> Result<Option<ReadlineEvent>, ReadlineError> {
        match input {
            TtyInput::Bytes(bytes) => {
                let mut events = Vec::new();
                let key_decoder = &mut self.key_decoder;
                self.decoder.decode(&bytes, |batch| {
                    for &cp in batch {
                        key_decoder.push(cp, &mut events);
                    }
                });

                let mut iter = events.into_iter();
                let mut outcome = None;
                for event in iter.by_ref() {
                    if let Some(resolved) = self.apply_key_event(event)? {
                        outcome = Some(resolved);
                        break;
                    }
                }
                // Anything decoded past the resolution is type-ahead for the next
                // interaction.
                self.pending_events.extend(iter);
                Ok(outcome)
            }
            TtyInput::Resize(width, height) => {
                let mut line_state = self.safe_line_state.lock().unwrap();
                let mut term_guard = self.safe_raw_terminal.lock().unwrap();
                let term = &mut *term_guard;
                line_state.resize(width, height, term)?;
                term.flush()?;
                Ok(None)
            }
            TtyInput::Event(event) => self.handle_tty_event(event),
        }
    }

    /// Dispatch one recognized key event: literal insert, bell, or named function.
    fn apply_key_event(
        &mut self,
        event: KeyEvent,
    ) -> Result<Option<ReadlineEvent>, ReadlineError> {
        let mut resolved: Option<String> = None;
        let in_continuation;
        {
            let mut line_state = self.safe_line_state.lock().unwrap();
            let mut history = self.safe_history.lock().unwrap();
            let mut term_guard = self.safe_raw_terminal.lock().unwrap();
            let term = &mut *term_guard;

            match event {
                KeyEvent::Literal(cp) => {
                    if cp.is_control() {
                        // No binding and no insert meaning: bell, buffer untouched.
                        tracing::debug!(codepoint = cp as u32, "unbound control codepoint");
                        line_state.bell(term)?;
                    } else {
                        line_state.insert_and_render(cp, term)?;
                    }
                }
                KeyEvent::Function { name, seq } => {
                    // Construction validated the keymap against the registry, so
                    // the lookup cannot miss for keymap-originated events.
                    let Some(function) = self.registry.lookup(&name) else {
                        tracing::warn!(name = %name, "event names unregistered function");
                        line_state.bell(term)?;
                        term.flush()?;
                        return Ok(None);
                    };
                    tracing::trace!(function = %name, consumed = seq.len(), "dispatch");
                    let mut interaction = Interaction {
                        line_state: &mut *line_state,
                        history: &mut *history,
                        term: &mut *term,
                        pending_line: &mut self.pending_line,
                        completion_handler: self.completion_handler.as_ref(),
                        resolved: &mut resolved,
                    };
                    function.apply(&mut interaction)?;
                }
            }
            term.flush()?;
            in_continuation = line_state.in_continuation;
        }

        match resolved {
            Some(line) => Ok(Some(ReadlineEvent::Line(line))),
            None => {
                let mut phase = self.safe_read_phase.lock().unwrap();
                // Don't revive an interaction a concurrent cancel just killed.
                if *phase != ReadPhase::Idle {
                    *phase = if in_continuation {
                        ReadPhase::Continuation
                    } else {
                        ReadPhase::Reading
                    };
                }
                Ok(None)
            }
        }
    }

    /// Out-of-band events, delivered around the keymap, not through it.
    fn handle_tty_event(
        &mut self,
        event: TtyEvent,
    ) -> Result<Option<ReadlineEvent>, ReadlineError> {
        match event {
            TtyEvent::Interrupt => {
                // Abandon the logical line and start over at a fresh prompt. The
                // read request itself stays pending.
                self.pending_line.clear();
                let mut line_state = self.safe_line_state.lock().unwrap();
                let mut term_guard = self.safe_raw_terminal.lock().unwrap();
                let term = &mut *term_guard;
                line_state.interrupt_reset(term)?;
                term.flush()?;
                drop(line_state);
                let mut phase = self.safe_read_phase.lock().unwrap();
                if *phase != ReadPhase::Idle {
                    *phase = ReadPhase::Reading;
                }
                Ok(None)
            }
            TtyEvent::Eof => {
                let mut line_state = self.safe_line_state.lock().unwrap();
                let mut term_guard = self.safe_raw_terminal.lock().unwrap();
                let term = &mut *term_guard;
                if line_state.buffer.is_empty() && self.pending_line.is_empty() {
                    line_state.finish_line(term)?;
                    term.flush()?;
                    Ok(Some(ReadlineEvent::Eof))
                } else {
                    // Documented policy: EOF with content behaves as delete-char
                    // at the cursor (the interactive Ctrl-D convention).
                    if line_state.buffer.delete_forward() {
                        let edit_point = line_state.buffer.cursor();
                        line_state.render_from(edit_point, term)?;
                    }
                    term.flush()?;
                    Ok(None)
                }
            }
            TtyEvent::TerminalTypeChanged => {
                tracing::debug!("terminal type changed; repainting");
                let line_state = self.safe_line_state.lock().unwrap();
                let mut term_guard = self.safe_raw_terminal.lock().unwrap();
                let term = &mut *term_guard;
                if line_state.is_active {
                    line_state.clear_and_render(term)?;
                }
                term.flush()?;
                Ok(None)
            }
        }
    }
}
