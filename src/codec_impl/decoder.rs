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

use crate::DECODER_BATCH_SIZE;

/// Incremental UTF-8 decoder for transport byte streams.
///
/// Transports deliver bytes in whatever chunks the network produced, so a multi-byte
/// sequence can be split anywhere. The decoder buffers a trailing incomplete sequence
/// across [`Utf8Decoder::decode`] calls and never emits a codepoint mid-sequence.
///
/// Malformed input is a data-quality signal, not an error: an invalid lead or
/// continuation byte produces exactly one [`char::REPLACEMENT_CHARACTER`] and decoding
/// resynchronizes on the next byte.
///
/// Decoded codepoints accumulate in an internal batch of bounded capacity. When the
/// batch fills mid-call it is flushed to the consumer and accumulation continues, so
/// one input chunk can surface as several batches. Batches preserve input order.
#[derive(Debug)]
pub struct Utf8Decoder {
    /// Bytes of the multi-byte sequence currently in flight.
    pending: [u8; 4],
    pending_len: usize,
    /// Total length the lead byte announced; `0` when no sequence is in flight.
    needed: usize,
    batch: Vec<char>,
    batch_size: usize,
}

impl Default for Utf8Decoder {
    fn default() -> Self { Self::new() }
}

impl Utf8Decoder {
    pub fn new() -> Self { Self::with_batch_size(DECODER_BATCH_SIZE) }

    /// `batch_size` is clamped to at least 1.
    pub fn with_batch_size(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            pending: [0; 4],
            pending_len: 0,
            needed: 0,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Number of buffered bytes belonging to an incomplete sequence.
    pub fn pending_len(&self) -> usize { self.pending_len }

    /// Decode `bytes`, handing complete codepoints to `on_batch` in bounded runs. A
    /// trailing incomplete sequence stays buffered until more bytes arrive.
    pub fn decode(&mut self, bytes: &[u8], mut on_batch: impl FnMut(&[char])) {
        for &byte in bytes {
            self.step(byte, &mut on_batch);
        }
        if !self.batch.is_empty() {
            on_batch(&self.batch);
            self.batch.clear();
        }
    }

    fn step(&mut self, byte: u8, on_batch: &mut impl FnMut(&[char])) {
        if self.needed == 0 {
            match byte {
                0x00..=0x7F => self.push(byte as char, on_batch),
                0xC2..=0xDF => self.begin(byte, 2),
                0xE0..=0xEF => self.begin(byte, 3),
                0xF0..=0xF4 => self.begin(byte, 4),
                // Stray continuation byte, overlong lead (C0/C1), or out-of-range
                // lead (F5..FF).
                _ => self.push(char::REPLACEMENT_CHARACTER, on_batch),
            }
        } else if (0x80..=0xBF).contains(&byte) {
            self.pending[self.pending_len] = byte;
            self.pending_len += 1;
            if self.pending_len == self.needed {
                let cp = match std::str::from_utf8(&self.pending[..self.pending_len]) {
                    // from_utf8 rejects overlong encodings and surrogate range.
                    Ok(s) => s.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER),
                    Err(_) => char::REPLACEMENT_CHARACTER,
                };
                self.needed = 0;
                self.pending_len = 0;
                self.push(cp, on_batch);
            }
        } else {
            // The in-flight sequence is broken. Substitute once for it, then
            // resynchronize by treating this byte as a fresh lead.
            self.needed = 0;
            self.pending_len = 0;
            self.push(char::REPLACEMENT_CHARACTER, on_batch);
            self.step(byte, on_batch);
        }
    }

    fn begin(&mut self, lead: u8, total: usize) {
        self.pending[0] = lead;
        self.pending_len = 1;
        self.needed = total;
    }

    fn push(&mut self, cp: char, on_batch: &mut impl FnMut(&[char])) {
        self.batch.push(cp);
        if self.batch.len() == self.batch_size {
            on_batch(&self.batch);
            self.batch.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utf8Encoder;

    fn decode_all(decoder: &mut Utf8Decoder, bytes: &[u8]) -> Vec<char> {
        let mut out = Vec::new();
        decoder.decode(bytes, |batch| out.extend_from_slice(batch));
        out
    }

    fn batches(batch_size: usize, bytes: &[u8]) -> Vec<String> {
        let mut decoder = Utf8Decoder::with_batch_size(batch_size);
        let mut out = Vec::new();
        decoder.decode(bytes, |batch| out.push(batch.iter().collect::<String>()));
        out
    }

    #[test]
    fn test_ascii() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decode_all(&mut decoder, b"hello"), "hello".chars().collect::<Vec<_>>());
    }

    #[test]
    fn test_underflow() {
        // Euro sign, one byte at a time: nothing until the final byte.
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decode_all(&mut decoder, &[0xE2]), vec![]);
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decode_all(&mut decoder, &[0x82]), vec![]);
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decode_all(&mut decoder, &[0xAC]), vec!['\u{20AC}']);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_overflow_splits_batches() {
        assert_eq!(batches(2, b"ABCDE"), vec!["AB", "CD", "E"]);
        assert_eq!(batches(3, b"ABCDE"), vec!["ABC", "DE"]);
        assert_eq!(batches(4, b"ABCDE"), vec!["ABCD", "E"]);
        assert_eq!(batches(5, b"ABCDE"), vec!["ABCDE"]);
        assert_eq!(batches(6, b"ABCDE"), vec!["ABCDE"]);
    }

    #[test]
    fn test_four_byte_sequence() {
        // U+102B7 (66231) encodes as F0 90 8A B7.
        let mut decoder = Utf8Decoder::new();
        let cps = decode_all(&mut decoder, &[0xF0, 0x90, 0x8A, 0xB7]);
        assert_eq!(cps, vec![char::from_u32(66_231).unwrap()]);
    }

    #[test]
    fn test_round_trip_arbitrary_chunking() {
        let text = "a€𐊷 réadline\u{7}";
        let encoded = Utf8Encoder::encode(&text.chars().collect::<Vec<_>>());
        for chunk_len in 1..=encoded.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = Vec::new();
            for chunk in encoded.chunks(chunk_len) {
                decoder.decode(chunk, |batch| out.extend_from_slice(batch));
            }
            assert_eq!(out.iter().collect::<String>(), text, "chunk_len {chunk_len}");
        }
    }

    #[test]
    fn test_invalid_lead_substitutes_and_resyncs() {
        let mut decoder = Utf8Decoder::new();
        let cps = decode_all(&mut decoder, &[b'a', 0xFF, b'b']);
        assert_eq!(cps, vec!['a', char::REPLACEMENT_CHARACTER, 'b']);
    }

    #[test]
    fn test_broken_continuation_resyncs_on_next_byte() {
        // E2 expects two continuation bytes; 'x' breaks the sequence and must itself
        // survive as a fresh character.
        let mut decoder = Utf8Decoder::new();
        let cps = decode_all(&mut decoder, &[0xE2, b'x', b'y']);
        assert_eq!(cps, vec![char::REPLACEMENT_CHARACTER, 'x', 'y']);
    }

    #[test]
    fn test_overlong_and_surrogate_rejected() {
        // E0 80 80 is an overlong encoding; ED A0 80 is a UTF-16 surrogate.
        let mut decoder = Utf8Decoder::new();
        let cps = decode_all(&mut decoder, &[0xE0, 0x80, 0x80]);
        assert_eq!(cps, vec![char::REPLACEMENT_CHARACTER]);
        let cps = decode_all(&mut decoder, &[0xED, 0xA0, 0x80]);
        assert_eq!(cps, vec![char::REPLACEMENT_CHARACTER]);
    }
}
