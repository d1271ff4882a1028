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

use crate::Text;

/// Codepoint to UTF-8 byte encoder, the outbound half of the codec.
///
/// Pure and stateless: codepoints are never split on output, so unlike
/// [`crate::Utf8Decoder`] there is nothing to buffer between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Encoder;

impl Utf8Encoder {
    pub fn encode(codepoints: &[char]) -> Text {
        let mut acc = Text::with_capacity(codepoints.len());
        let mut scratch = [0_u8; 4];
        for &cp in codepoints {
            acc.extend_from_slice(cp.encode_utf8(&mut scratch).as_bytes());
        }
        acc
    }
}
