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

//! Keymap resource loading.
//!
//! A keymap is a TOML document with a single `[bindings]` table mapping key-sequence
//! specs to function names:
//!
//! ```toml
//! [bindings]
//! "C-a" = "beginning-of-line"
//! "M-b" = "backward-word"
//! "up"  = "previous-history"
//! ```
//!
//! Sequence spec syntax, tokens separated by spaces:
//! - `C-x` — the control codepoint of `x` (`C-a` is U+0001, `C-?` is DEL).
//! - `M-<token>` — ESC prefix followed by the token (`M-b`, `M-backspace`).
//! - Named keys: `esc`, `enter`, `tab`, `space`, `backspace`, `up`, `down`, `left`,
//!   `right`, `home`, `end`, `delete` (arrow/edit keys expand to their xterm escape
//!   sequences).
//! - Any single character stands for itself.
//!
//! Parse failures are fatal at load time, never per keystroke.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Keymap, KeymapError};

/// The keymap every engine uses unless a custom one is supplied: Emacs-flavored
/// controls plus the xterm arrow and edit keys.
pub const DEFAULT_KEYMAP: &str = include_str!("default_keymap.toml");

#[derive(Debug, Deserialize)]
struct KeymapFile {
    /// `BTreeMap` keeps load order deterministic, though precedence never depends on
    /// it (exact conflicts fail construction).
    bindings: BTreeMap<String, String>,
}

/// Parse a TOML keymap resource into a [`Keymap`].
pub fn parse_keymap(source: &str) -> Result<Keymap, KeymapError> {
    let file: KeymapFile = toml::from_str(source)?;
    let mut bindings = Vec::with_capacity(file.bindings.len());
    for (spec, function) in file.bindings {
        bindings.push((parse_sequence(&spec)?, function));
    }
    Keymap::try_new(bindings)
}

/// The built-in [`DEFAULT_KEYMAP`], parsed.
pub fn default_keymap() -> Result<Keymap, KeymapError> { parse_keymap(DEFAULT_KEYMAP) }

/// Parse one space-separated key-sequence spec into codepoints.
pub fn parse_sequence(spec: &str) -> Result<Vec<char>, KeymapError> {
    let mut seq = Vec::new();
    for token in spec.split_whitespace() {
        parse_token(token, &mut seq)?;
    }
    if seq.is_empty() {
        return Err(KeymapError::BadToken(spec.to_string()));
    }
    Ok(seq)
}

fn parse_token(token: &str, seq: &mut Vec<char>) -> Result<(), KeymapError> {
    if let Some(rest) = token.strip_prefix("C-") {
        seq.push(control_codepoint(rest, token)?);
        return Ok(());
    }
    if let Some(rest) = token.strip_prefix("M-") {
        seq.push('\u{1b}');
        return parse_token(rest, seq);
    }
    match token {
        "esc" | "escape" => seq.push('\u{1b}'),
        "enter" | "return" => seq.push('\r'),
        "tab" => seq.push('\t'),
        "space" => seq.push(' '),
        "backspace" => seq.push('\u{7f}'),
        "up" => csi(seq, 'A'),
        "down" => csi(seq, 'B'),
        "right" => csi(seq, 'C'),
        "left" => csi(seq, 'D'),
        "home" => csi(seq, 'H'),
        "end" => csi(seq, 'F'),
        "delete" => seq.extend(['\u{1b}', '[', '3', '~']),
        _ => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(cp), None) => seq.push(cp),
                _ => return Err(KeymapError::BadToken(token.to_string())),
            }
        }
    }
    Ok(())
}

fn control_codepoint(rest: &str, token: &str) -> Result<char, KeymapError> {
    let mut chars = rest.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return Err(KeymapError::BadToken(token.to_string()));
    };
    if !ch.is_ascii() {
        return Err(KeymapError::BadToken(token.to_string()));
    }
    // The caret convention: C-a is 0x01, C-? is DEL.
    let cp = (ch.to_ascii_uppercase() as u8) ^ 0x40;
    if cp < 0x20 || cp == 0x7F {
        Ok(cp as char)
    } else {
        Err(KeymapError::BadToken(token.to_string()))
    }
}

fn csi(seq: &mut Vec<char>, final_byte: char) {
    seq.extend(['\u{1b}', '[', final_byte]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_tokens() {
        assert_eq!(parse_sequence("C-a").unwrap(), vec!['\u{1}']);
        assert_eq!(parse_sequence("C-j").unwrap(), vec!['\n']);
        assert_eq!(parse_sequence("C-?").unwrap(), vec!['\u{7f}']);
    }

    #[test]
    fn test_parse_meta_tokens() {
        assert_eq!(parse_sequence("M-b").unwrap(), vec!['\u{1b}', 'b']);
        assert_eq!(
            parse_sequence("M-backspace").unwrap(),
            vec!['\u{1b}', '\u{7f}']
        );
    }

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(parse_sequence("up").unwrap(), vec!['\u{1b}', '[', 'A']);
        assert_eq!(
            parse_sequence("delete").unwrap(),
            vec!['\u{1b}', '[', '3', '~']
        );
        assert_eq!(parse_sequence("enter").unwrap(), vec!['\r']);
    }

    #[test]
    fn test_parse_multi_key_sequence() {
        assert_eq!(
            parse_sequence("C-x C-u").unwrap(),
            vec!['\u{18}', '\u{15}']
        );
    }

    #[test]
    fn test_bad_token_is_fatal() {
        assert!(matches!(
            parse_sequence("C-notakey"),
            Err(KeymapError::BadToken(_))
        ));
        assert!(matches!(parse_sequence(""), Err(KeymapError::BadToken(_))));
    }

    #[test]
    fn test_default_keymap_loads() {
        let keymap = default_keymap().unwrap();
        let names = keymap.bound_function_names();
        assert!(names.contains(&"accept-line"));
        assert!(names.contains(&"previous-history"));
        assert!(names.contains(&"complete"));
    }

    #[test]
    fn test_conflicting_spellings_of_one_sequence() {
        // "enter" and "C-m" are the same codepoint; binding both must fail loudly.
        let source = r#"
            [bindings]
            "enter" = "accept-line"
            "C-m" = "other-function"
        "#;
        assert!(matches!(
            parse_keymap(source),
            Err(KeymapError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_fatal() {
        assert!(matches!(
            parse_keymap("not toml at all ["),
            Err(KeymapError::BadResource(_))
        ));
    }
}
