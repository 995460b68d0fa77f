// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Splitting payloads into bounded chunks.
//!
//! With encoding enabled the whole payload is base64 encoded first and the
//! encoded text is sliced afterwards, so the chunks concatenated in index
//! order always decode, wherever the slice boundaries fall.

use data_encoding::BASE64;

use crate::errors::ChunkError;
use crate::models::Chunk;

/// Splits `input` into slices of at most `max_size` bytes and hands each one
/// to `emit` in order.
///
/// An empty input emits nothing. A payload that already fits in one slice is
/// emitted unmodified when `encode` is false.
///
/// # Errors
///
/// Returns [`ChunkError::InvalidChunkSize`] if `max_size` is zero, before
/// anything is emitted.
pub fn split<F>(input: &[u8], encode: bool, max_size: usize, mut emit: F) -> Result<(), ChunkError>
where
    F: FnMut(&[u8]),
{
    if max_size == 0 {
        return Err(ChunkError::InvalidChunkSize);
    }
    if input.is_empty() {
        return Ok(());
    }

    if encode {
        let encoded = BASE64.encode(input);
        encoded.as_bytes().chunks(max_size).for_each(&mut emit);
    } else {
        input.chunks(max_size).for_each(&mut emit);
    }

    Ok(())
}

/// Collects the output of [`split`] into indexed chunks.
pub fn split_chunks(input: &[u8], encode: bool, max_size: usize) -> Result<Vec<Chunk>, ChunkError> {
    let mut chunks = Vec::new();
    split(input, encode, max_size, |bytes| {
        chunks.push(Chunk {
            index: chunks.len(),
            bytes: bytes.to_vec(),
        });
    })?;
    Ok(chunks)
}

/// Reassembles chunks produced by [`split`], decoding when `decode` is set.
///
/// # Errors
///
/// Returns an error if the chunks are not in index order starting at zero, or
/// if the concatenated text is not valid base64.
pub fn join(chunks: &[Chunk], decode: bool) -> Result<Vec<u8>, ChunkError> {
    let mut joined = Vec::with_capacity(chunks.iter().map(|c| c.bytes.len()).sum());
    for (expected, chunk) in chunks.iter().enumerate() {
        if chunk.index != expected {
            return Err(ChunkError::OutOfOrder {
                expected,
                found: chunk.index,
            });
        }
        joined.extend_from_slice(&chunk.bytes);
    }

    if !decode {
        return Ok(joined);
    }

    BASE64
        .decode(&joined)
        .map_err(|err| ChunkError::Decode(err.to_string()))
}
