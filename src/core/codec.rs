// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded bincode decoding
//!
//! Store indexes and save-state files come from disk or from host uploads,
//! so a length prefix inside them cannot be trusted. bincode allocates a
//! container as soon as it reads its length; without a byte limit a
//! damaged prefix turns into an allocation of whatever size it claims.
//!
//! [`decode_bounded`] picks a limit from the size of the input. Decoded
//! values are at most a small multiple of their encoding, so an honest
//! buffer never hits the limit while a lying prefix does.

use bincode::config;
use bincode::error::DecodeError;
use bincode::Decode;

/// Largest buffer accepted by [`decode_bounded`]
pub const MAX_ENCODED_BYTES: usize = 1 << 30;

/// Decode `data` with a byte limit scaled to its length
///
/// Returns [`DecodeError::LimitExceeded`] when `data` is larger than
/// [`MAX_ENCODED_BYTES`] or when a container inside it claims more memory
/// than the input could describe.
pub fn decode_bounded<T: Decode<()>>(data: &[u8]) -> Result<(T, usize), DecodeError> {
    let base = config::standard();
    match data.len() {
        n if n <= 1 << 16 => bincode::decode_from_slice(data, base.with_limit::<{ 1 << 22 }>()),
        n if n <= 1 << 20 => bincode::decode_from_slice(data, base.with_limit::<{ 1 << 26 }>()),
        n if n <= 1 << 24 => bincode::decode_from_slice(data, base.with_limit::<{ 1 << 30 }>()),
        n if n <= MAX_ENCODED_BYTES => {
            bincode::decode_from_slice(data, base.with_limit::<{ 1 << 34 }>())
        }
        _ => Err(DecodeError::LimitExceeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_honest_buffer_decodes() {
        let value: Vec<Vec<u8>> = vec![vec![7; 300], Vec::new(), vec![1, 2, 3]];
        let encoded = bincode::encode_to_vec(&value, config::standard()).unwrap();
        let (decoded, read): (Vec<Vec<u8>>, usize) = decode_bounded(&encoded).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(read, encoded.len());
    }

    #[test]
    fn test_huge_length_prefix_rejected() {
        // varint u64 marker followed by 2^40
        let mut data = vec![253];
        data.extend_from_slice(&(1u64 << 40).to_le_bytes());
        data.extend_from_slice(&[0; 16]);

        let result: Result<(Vec<u8>, usize), _> = decode_bounded(&data);
        assert!(matches!(result, Err(DecodeError::LimitExceeded)));
    }
}
