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

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

/// Errors raised while loading a keymap or the function set it references. All of
/// these are fatal at startup; none of them can occur per-keystroke.
#[derive(Debug, Error)]
pub enum KeymapError {
    /// Two distinct functions claim the same exact codepoint sequence.
    #[error("key sequence {sequence:?} is bound to both {first:?} and {second:?}")]
    DuplicateBinding {
        sequence: String,
        first: String,
        second: String,
    },

    /// A binding with an empty sequence can never fire.
    #[error("empty key sequence bound to {0:?}")]
    EmptySequence(String),

    /// The sequence syntax in the keymap resource could not be parsed.
    #[error("unrecognized key token {0:?}")]
    BadToken(String),

    /// The keymap resource is not well-formed TOML.
    #[error("keymap resource is not valid TOML: {0}")]
    BadResource(#[from] toml::de::Error),

    /// The keymap references a function name missing from the registry.
    #[error("keymap binds unknown function {0:?}")]
    UnknownFunction(String),

    /// Two registered functions share a name.
    #[error("function {0:?} registered twice")]
    DuplicateFunction(String),
}

/// One recognized unit of input: either a codepoint to insert verbatim, or a named
/// editing function together with the codepoint sequence that selected it (so callers
/// know how much input was consumed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Literal(char),
    Function { name: String, seq: Vec<char> },
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, Node>,
    binding: Option<String>,
}

/// Outcome of matching a pending buffer against the prefix tree.
#[derive(Debug, PartialEq, Eq)]
enum Lookup<'a> {
    /// The buffer walked off the tree; no binding can ever match it as a whole.
    NoMatch,
    /// The buffer is a strict prefix of at least one binding and bound to nothing.
    Pending,
    /// The buffer is bound and nothing extends it.
    Terminal(&'a str),
    /// The buffer is bound, but a longer binding could still be selected.
    BoundPrefix(&'a str),
}

/// Immutable table of codepoint-sequence to function-name bindings.
///
/// Built once at startup (see [`crate::parse_keymap`]) and shared read-only across
/// every connection's engine instance, so it needs no synchronization. Construction
/// fails on exact-sequence conflicts; precedence between bindings therefore never
/// depends on load order.
#[derive(Debug, Default)]
pub struct Keymap {
    root: Node,
    max_seq_len: usize,
}

impl Keymap {
    pub fn try_new(
        bindings: impl IntoIterator<Item = (Vec<char>, String)>,
    ) -> Result<Self, KeymapError> {
        let mut keymap = Self::default();
        for (seq, function) in bindings {
            keymap.bind(seq, function)?;
        }
        Ok(keymap)
    }

    fn bind(&mut self, seq: Vec<char>, function: String) -> Result<(), KeymapError> {
        if seq.is_empty() {
            return Err(KeymapError::EmptySequence(function));
        }
        let mut node = &mut self.root;
        for cp in &seq {
            node = node.children.entry(*cp).or_default();
        }
        if let Some(existing) = &node.binding {
            return Err(KeymapError::DuplicateBinding {
                sequence: seq.iter().collect(),
                first: existing.clone(),
                second: function,
            });
        }
        node.binding = Some(function);
        self.max_seq_len = self.max_seq_len.max(seq.len());
        Ok(())
    }

    /// Length of the longest registered sequence; the hold limit for ambiguous
    /// prefixes.
    pub fn max_seq_len(&self) -> usize { self.max_seq_len }

    /// Every function name referenced by some binding. Used to validate the keymap
    /// against a [`crate::FunctionRegistry`] at load time.
    pub fn bound_function_names(&self) -> Vec<&str> {
        let mut acc = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let Some(name) = &node.binding {
                acc.push(name.as_str());
            }
            stack.extend(node.children.values());
        }
        acc.sort_unstable();
        acc.dedup();
        acc
    }

    fn lookup(&self, seq: &[char]) -> Lookup<'_> {
        let mut node = &self.root;
        for cp in seq {
            match node.children.get(cp) {
                Some(child) => node = child,
                None => return Lookup::NoMatch,
            }
        }
        match (&node.binding, node.children.is_empty()) {
            (Some(name), true) => Lookup::Terminal(name),
            (Some(name), false) => Lookup::BoundPrefix(name),
            (None, _) => Lookup::Pending,
        }
    }

    /// Longest strict-or-full prefix of `seq` that is bound, if any.
    fn longest_bound_prefix(&self, seq: &[char]) -> Option<(usize, &str)> {
        let mut node = &self.root;
        let mut best = None;
        for (index, cp) in seq.iter().enumerate() {
            match node.children.get(cp) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(name) = &node.binding {
                best = Some((index + 1, name.as_str()));
            }
        }
        best
    }
}

/// Streaming matcher from decoded codepoints to [`KeyEvent`]s.
///
/// Codepoints are appended one at a time; the decoder buffers as long as the pending
/// sequence could still grow into a longer binding, and resolves as soon as the input
/// commits. Resolution prefers the longest bound sequence: a bound strict prefix (say
/// `ESC` by itself) does not fire while a longer binding (say `ESC [ A`) is still
/// reachable, until input diverges or the longest registered sequence length is
/// reached. When a buffer turns out to match nothing, its head replays as a literal
/// and matching restarts on the remainder, so no input is ever dropped.
#[derive(Debug)]
pub struct KeyDecoder {
    keymap: Arc<Keymap>,
    pending: Vec<char>,
}

impl KeyDecoder {
    pub fn new(keymap: Arc<Keymap>) -> Self {
        Self {
            keymap,
            pending: Vec::new(),
        }
    }

    /// Codepoints currently held back waiting for the ambiguity to resolve.
    pub fn pending(&self) -> &[char] { &self.pending }

    /// Append one codepoint and emit every event that is now unambiguous.
    pub fn push(&mut self, cp: char, out: &mut Vec<KeyEvent>) {
        self.pending.push(cp);
        self.resolve(false, out);
    }

    /// Force-resolve the held prefix. The timing half of the ambiguity rule lives in
    /// the transport: it calls this after its quiet period so that a lone `ESC` is
    /// not held forever.
    pub fn flush_pending(&mut self, out: &mut Vec<KeyEvent>) { self.resolve(true, out); }

    fn resolve(&mut self, force: bool, out: &mut Vec<KeyEvent>) {
        while !self.pending.is_empty() {
            // The hold limit: once the pending buffer is as long as the longest
            // registered sequence, nothing further can disambiguate it.
            let at_limit = force || self.pending.len() >= self.keymap.max_seq_len();
            let action = match self.keymap.lookup(&self.pending) {
                Lookup::Terminal(name) => {
                    Action::Emit(self.pending.len(), name.to_string())
                }
                Lookup::BoundPrefix(name) if at_limit => {
                    Action::Emit(self.pending.len(), name.to_string())
                }
                Lookup::BoundPrefix(_) => Action::Hold,
                Lookup::Pending if at_limit => Action::ReplayHead,
                Lookup::Pending => Action::Hold,
                Lookup::NoMatch => {
                    match self.keymap.longest_bound_prefix(&self.pending) {
                        Some((len, name)) => Action::Emit(len, name.to_string()),
                        None => Action::ReplayHead,
                    }
                }
            };
            match action {
                Action::Hold => return,
                Action::ReplayHead => {
                    out.push(KeyEvent::Literal(self.pending.remove(0)));
                }
                Action::Emit(len, name) => self.emit_function(len, name, out),
            }
        }
    }

    fn emit_function(&mut self, len: usize, name: String, out: &mut Vec<KeyEvent>) {
        let seq: Vec<char> = self.pending.drain(..len).collect();
        out.push(KeyEvent::Function { name, seq });
    }
}

/// Owned resolution decision, decoupled from the borrow of the prefix tree.
#[derive(Debug)]
enum Action {
    Hold,
    ReplayHead,
    Emit(usize, String),
}
