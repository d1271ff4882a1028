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

//! Named editing functions and their registry.
//!
//! A keymap binds codepoint sequences to function *names*; this module supplies the
//! implementations. The registry is assembled explicitly at startup — there is no
//! discovery mechanism — and a keymap referencing a name that is not registered
//! fails construction, never a keystroke.

use std::{collections::HashMap, io::Write, sync::Arc};

use crate::{History, Keymap, KeymapError, LineState, LineStatus, ReadlineError};

/// Everything a function may touch while it runs: the render state (which owns the
/// live buffer), the shared history, the output sink, and the continuation/resolution
/// slots of the in-flight interaction. Functions run inside the engine's serialized
/// loop, so no locking happens here.
pub struct Interaction<'a> {
    pub line_state: &'a mut LineState,
    pub history: &'a mut History,
    pub term: &'a mut dyn Write,
    /// Logical content accumulated by previous continuation rows.
    pub pending_line: &'a mut String,
    pub completion_handler: Option<&'a CompletionHandler>,
    /// Set by `accept-line` when the logical line terminates.
    pub resolved: &'a mut Option<String>,
}

impl Interaction<'_> {
    /// The full logical line: accumulated continuation rows plus the live row.
    pub fn logical_line(&self) -> String {
        let current = self.line_state.buffer.as_string();
        if self.pending_line.is_empty() {
            current
        } else {
            format!("{}{}", self.pending_line, current)
        }
    }
}

/// Buffer-and-cursor snapshot handed to a completion handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub line: String,
    pub cursor: usize,
}

/// The edit a completion handler wants applied. `None` from the handler resumes the
/// read unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEdit {
    /// Insert text at the cursor (the common "extend the word" case).
    Insert(String),
    /// Replace the whole row content; cursor moves to the end.
    ReplaceLine(String),
}

pub type CompletionHandler =
    Box<dyn Fn(CompletionRequest) -> Option<CompletionEdit> + Send + Sync>;

/// A named editing operation, dispatched by the engine when the keymap resolves its
/// name from an input sequence.
pub trait EditorFunction: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError>;
}

/// The startup-time set of named editing functions.
#[derive(Clone)]
pub struct FunctionRegistry {
    map: HashMap<&'static str, Arc<dyn EditorFunction>>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.map.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry").field("names", &names).finish()
    }
}

impl FunctionRegistry {
    /// Build a registry from an explicit list. Two functions sharing a name is a
    /// construction error.
    pub fn try_new(
        functions: Vec<Arc<dyn EditorFunction>>,
    ) -> Result<Self, KeymapError> {
        let mut map: HashMap<&'static str, Arc<dyn EditorFunction>> = HashMap::new();
        for function in functions {
            let name = function.name();
            if map.insert(name, function).is_some() {
                return Err(KeymapError::DuplicateFunction(name.to_string()));
            }
        }
        Ok(Self { map })
    }

    /// The standard editing set bound by the default keymap.
    pub fn standard() -> Self {
        let functions: Vec<Arc<dyn EditorFunction>> = vec![
            Arc::new(AcceptLine),
            Arc::new(BackwardChar),
            Arc::new(ForwardChar),
            Arc::new(BackwardDeleteChar),
            Arc::new(DeleteChar),
            Arc::new(BeginningOfLine),
            Arc::new(EndOfLine),
            Arc::new(PreviousHistory),
            Arc::new(NextHistory),
            Arc::new(BackwardWord),
            Arc::new(ForwardWord),
            Arc::new(KillLine),
            Arc::new(BackwardKillLine),
            Arc::new(KillWord),
            Arc::new(BackwardKillWord),
            Arc::new(Complete),
        ];
        let map = functions
            .into_iter()
            .map(|function| (function.name(), function))
            .collect();
        Self { map }
    }

    /// Extend the standard set with caller-supplied functions.
    pub fn standard_with(
        extra: Vec<Arc<dyn EditorFunction>>,
    ) -> Result<Self, KeymapError> {
        let mut registry = Self::standard();
        for function in extra {
            let name = function.name();
            if registry.map.insert(name, function).is_some() {
                return Err(KeymapError::DuplicateFunction(name.to_string()));
            }
        }
        Ok(registry)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn EditorFunction>> {
        self.map.get(name).cloned()
    }

    /// Check that every function the keymap binds is registered. Called once at
    /// engine construction; failure aborts startup.
    pub fn validate(&self, keymap: &Keymap) -> Result<(), KeymapError> {
        for name in keymap.bound_function_names() {
            if !self.map.contains_key(name) {
                return Err(KeymapError::UnknownFunction(name.to_string()));
            }
        }
        Ok(())
    }
}

struct AcceptLine;

impl EditorFunction for AcceptLine {
    fn name(&self) -> &'static str { "accept-line" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let logical = interaction.logical_line();
        match LineStatus::of(&logical) {
            LineStatus::OpenSingleQuote | LineStatus::OpenDoubleQuote => {
                // The newline belongs inside the quoted span.
                *interaction.pending_line = format!("{logical}\n");
                interaction.line_state.enter_continuation(interaction.term)?;
            }
            LineStatus::TrailingEscape => {
                // Backslash-newline splices: neither survives in the content.
                let spliced = logical.strip_suffix('\\').unwrap_or(&logical);
                *interaction.pending_line = spliced.to_string();
                interaction.line_state.enter_continuation(interaction.term)?;
            }
            LineStatus::Complete => {
                interaction.history.update(Some(logical.clone()));
                interaction.line_state.finish_line(interaction.term)?;
                interaction.line_state.buffer.clear();
                interaction.pending_line.clear();
                *interaction.resolved = Some(logical);
            }
        }
        Ok(())
    }
}

struct BackwardChar;

impl EditorFunction for BackwardChar {
    fn name(&self) -> &'static str { "backward-char" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        interaction.line_state.buffer.move_by(-1);
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct ForwardChar;

impl EditorFunction for ForwardChar {
    fn name(&self) -> &'static str { "forward-char" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        interaction.line_state.buffer.move_by(1);
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct BackwardDeleteChar;

impl EditorFunction for BackwardDeleteChar {
    fn name(&self) -> &'static str { "backward-delete-char" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        if line_state.buffer.delete_backward() {
            let edit_point = line_state.buffer.cursor();
            line_state.render_from(edit_point, interaction.term)?;
        }
        Ok(())
    }
}

struct DeleteChar;

impl EditorFunction for DeleteChar {
    fn name(&self) -> &'static str { "delete-char" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        if line_state.buffer.delete_forward() {
            let edit_point = line_state.buffer.cursor();
            line_state.render_from(edit_point, interaction.term)?;
        }
        Ok(())
    }
}

struct BeginningOfLine;

impl EditorFunction for BeginningOfLine {
    fn name(&self) -> &'static str { "beginning-of-line" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        interaction.line_state.buffer.move_to_start();
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct EndOfLine;

impl EditorFunction for EndOfLine {
    fn name(&self) -> &'static str { "end-of-line" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        interaction.line_state.buffer.move_to_end();
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct PreviousHistory;

impl EditorFunction for PreviousHistory {
    fn name(&self) -> &'static str { "previous-history" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let live = interaction.line_state.buffer.as_string();
        if let Some(text) = interaction.history.navigate_prev(&live) {
            interaction.line_state.replace_line(&text, interaction.term)?;
        }
        Ok(())
    }
}

struct NextHistory;

impl EditorFunction for NextHistory {
    fn name(&self) -> &'static str { "next-history" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        if let Some(text) = interaction.history.navigate_next() {
            interaction.line_state.replace_line(&text, interaction.term)?;
        }
        Ok(())
    }
}

struct BackwardWord;

impl EditorFunction for BackwardWord {
    fn name(&self) -> &'static str { "backward-word" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let target = interaction.line_state.buffer.word_boundary_backward();
        interaction.line_state.buffer.move_to(target);
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct ForwardWord;

impl EditorFunction for ForwardWord {
    fn name(&self) -> &'static str { "forward-word" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let target = interaction.line_state.buffer.word_boundary_forward();
        interaction.line_state.buffer.move_to(target);
        interaction.line_state.reposition_cursor(interaction.term)?;
        Ok(())
    }
}

struct KillLine;

impl EditorFunction for KillLine {
    fn name(&self) -> &'static str { "kill-line" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        let cursor = line_state.buffer.cursor();
        let len = line_state.buffer.len();
        if cursor < len {
            line_state.buffer.kill_region(cursor, len);
            line_state.render_from(cursor, interaction.term)?;
        }
        Ok(())
    }
}

struct BackwardKillLine;

impl EditorFunction for BackwardKillLine {
    fn name(&self) -> &'static str { "backward-kill-line" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        let cursor = line_state.buffer.cursor();
        if cursor > 0 {
            line_state.buffer.kill_region(0, cursor);
            line_state.render_from(0, interaction.term)?;
        }
        Ok(())
    }
}

struct KillWord;

impl EditorFunction for KillWord {
    fn name(&self) -> &'static str { "kill-word" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        let cursor = line_state.buffer.cursor();
        let target = line_state.buffer.word_boundary_forward();
        if target > cursor {
            line_state.buffer.kill_region(cursor, target);
            line_state.render_from(cursor, interaction.term)?;
        }
        Ok(())
    }
}

struct BackwardKillWord;

impl EditorFunction for BackwardKillWord {
    fn name(&self) -> &'static str { "backward-kill-word" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        let line_state = &mut *interaction.line_state;
        let cursor = line_state.buffer.cursor();
        let target = line_state.buffer.word_boundary_backward();
        if target < cursor {
            line_state.buffer.kill_region(target, cursor);
            line_state.render_from(target, interaction.term)?;
        }
        Ok(())
    }
}

struct Complete;

impl EditorFunction for Complete {
    fn name(&self) -> &'static str { "complete" }

    fn apply(&self, interaction: &mut Interaction<'_>) -> Result<(), ReadlineError> {
        // No handler registered: completion is a no-op resume, not an error.
        let Some(handler) = interaction.completion_handler else {
            return Ok(());
        };
        let request = CompletionRequest {
            line: interaction.line_state.buffer.as_string(),
            cursor: interaction.line_state.buffer.cursor(),
        };
        match handler(request) {
            Some(CompletionEdit::Insert(text)) => {
                let line_state = &mut *interaction.line_state;
                let edit_point = line_state.buffer.cursor();
                line_state.buffer.insert_str(&text);
                line_state.render_from(edit_point, interaction.term)?;
            }
            Some(CompletionEdit::ReplaceLine(text)) => {
                interaction.line_state.replace_line(&text, interaction.term)?;
            }
            None => {}
        }
        Ok(())
    }
}
