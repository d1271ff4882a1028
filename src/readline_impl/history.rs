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

use std::collections::VecDeque;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::HISTORY_SIZE_MAX;

/// In-memory history of completed lines, owned by the connection scope and outliving
/// any single read interaction.
///
/// Entries are stored newest-first and never mutated by browsing: fetching an entry
/// copies it into the live buffer, and accepting an edited fetch appends the edited
/// text as a new entry. The navigation position is `None` when not browsing; entering
/// browse mode stashes the in-progress line so that stepping past the newest entry
/// restores exactly what the user had typed.
#[derive(Debug)]
pub struct History {
    pub entries: VecDeque<String>,
    pub max_size: usize,
    /// External producers push entries through this channel; the engine drains the
    /// receiver inside its serialized loop.
    pub sender: UnboundedSender<String>,
    current_position: Option<usize>,
    stashed_line: Option<String>,
}

impl History {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel::<String>();
        (
            Self {
                entries: VecDeque::default(),
                max_size: HISTORY_SIZE_MAX,
                sender,
                current_position: None,
                stashed_line: None,
            },
            receiver,
        )
    }

    pub fn is_browsing(&self) -> bool { self.current_position.is_some() }

    /// Append a completed line. Empty lines and a repeat of the newest entry are
    /// skipped. Appending resets navigation and drops any stash.
    pub fn update(&mut self, maybe_line: Option<String>) {
        let Some(line) = maybe_line else {
            return;
        };
        self.current_position = None;
        self.stashed_line = None;
        if self.entries.front() == Some(&line) || line.is_empty() {
            return;
        }
        self.entries.push_front(line);
        if self.entries.len() > self.max_size {
            self.entries.pop_back();
        }
    }

    /// Step one entry toward older history. On the first step the in-progress `live`
    /// text is stashed. Clamped at the oldest entry: repeated calls return it
    /// unchanged. Returns the text to display, or `None` when there is no history.
    pub fn navigate_prev(&mut self, live: &str) -> Option<String> {
        match self.current_position {
            Some(index) => {
                let index = index.min(self.entries.len().saturating_sub(1));
                let next_index = if index + 1 < self.entries.len() {
                    index + 1
                } else {
                    index
                };
                self.current_position = Some(next_index);
                self.entries.get(next_index).cloned()
            }
            None => {
                if self.entries.is_empty() {
                    return None;
                }
                self.stashed_line = Some(live.to_string());
                self.current_position = Some(0);
                self.entries.front().cloned()
            }
        }
    }

    /// Step one entry toward newer history. Stepping past the newest restores the
    /// stashed in-progress text; further calls are no-ops returning `None`.
    pub fn navigate_next(&mut self) -> Option<String> {
        match self.current_position {
            Some(0) => {
                self.current_position = None;
                Some(self.stashed_line.take().unwrap_or_default())
            }
            Some(index) => {
                self.current_position = Some(index - 1);
                self.entries.get(index - 1).cloned()
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update() {
        let (mut history, _receiver) = History::new();
        history.max_size = 2;
        history.update(Some("test1".into()));
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        history.update(None);
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        // Consecutive duplicate and empty lines are skipped.
        history.update(Some("test1".into()));
        assert_eq!(history.entries.len(), 1);
        history.update(Some(String::new()));
        assert_eq!(history.entries.len(), 1);

        history.update(Some("test2".into()));
        history.update(Some("test3".into()));
        assert_eq!(history.entries.len(), 2);
        assert!(history.entries.contains(&"test2".to_string()));
        assert!(history.entries.contains(&"test3".to_string()));
    }

    #[test]
    fn test_navigate_prev_clamps_at_oldest() {
        let (mut history, _receiver) = History::new();
        history.update(Some("one".into()));
        history.update(Some("two".into()));
        history.update(Some("three".into()));

        assert_eq!(history.navigate_prev("live"), Some("three".into()));
        assert_eq!(history.navigate_prev("live"), Some("two".into()));
        assert_eq!(history.navigate_prev("live"), Some("one".into()));
        // Idempotent at the oldest bound.
        assert_eq!(history.navigate_prev("live"), Some("one".into()));
        assert_eq!(history.navigate_prev("live"), Some("one".into()));
    }

    #[test]
    fn test_navigate_next_restores_stash() {
        let (mut history, _receiver) = History::new();
        history.update(Some("one".into()));
        history.update(Some("two".into()));

        assert_eq!(history.navigate_next(), None);
        assert_eq!(history.navigate_prev("in progress"), Some("two".into()));
        assert_eq!(history.navigate_prev("in progress"), Some("one".into()));
        assert_eq!(history.navigate_next(), Some("two".into()));
        assert_eq!(history.navigate_next(), Some("in progress".into()));
        // Past the newest: no-op.
        assert_eq!(history.navigate_next(), None);
        assert!(!history.is_browsing());
    }

    #[test]
    fn test_browsing_never_mutates_entries() {
        let (mut history, _receiver) = History::new();
        history.update(Some("original".into()));
        let fetched = history.navigate_prev("").unwrap();
        // Caller edits the fetched copy and accepts it.
        let edited = format!("{fetched} edited");
        history.update(Some(edited.clone()));
        assert_eq!(history.entries.front(), Some(&edited));
        assert_eq!(history.entries.back(), Some(&"original".to_string()));
    }

    #[test]
    fn test_no_history_navigation_is_noop() {
        let (mut history, _receiver) = History::new();
        assert_eq!(history.navigate_prev("live"), None);
        assert_eq!(history.navigate_next(), None);
    }
}
