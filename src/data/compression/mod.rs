////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Compression scheme is lz77 with a chained hash table for finding matches.
//!
//! Basic concept is to track literal bytes as you encounter them, and look up
//! earlier positions that start with the same three bytes as the current
//! position. When a long enough match is found, the tracked literals are
//! written followed by a back-reference copy command.
//!
//! Current tracked literal bytes *must* be written before a back-reference
//! copy command is written
//!
//! Literal blocks have a max length of 112 and must be a multiple of 4. The
//! tracked literals are split so that every whole multiple of 4 goes out as
//! literal blocks and the 0 to 3 bytes left over ride along in the copy (or
//! stop) command that follows.
//!
//! Simple pseudo-rust:
//! ```
//! let tracked_bytes_length = 117;
//! let num_bytes_in_copy = tracked_bytes_length % 4; // 1
//! let num_bytes_in_literal = 117 - num_bytes_in_copy; // 116; factors by 4
//! ```
//!
//! The exact bytes produced are deterministic for a given input and
//! [CompressionOptions], and match those of the SAGE engine's own encoder.
//!
//! See [Command](crate::data::control::Command) for the layout of control
//! codes
mod greedy;
pub(crate) mod match_length;
pub(crate) mod prefix_search;

use std::io::{Read, Write};

use log::{debug, trace};

pub use crate::data::compression::greedy::EncodeStats;
use crate::data::control::LITERAL_MAX;
use crate::header::Header;
use crate::{RefPackError, RefPackResult};

/// Speed/ratio tradeoff for compression.
///
/// Both produce valid data for the same decoder, the compressed bytes just
/// differ.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum CompressionOptions {
    /// Only the first byte of each match is added to the search table. Faster,
    /// but later matches are found less often.
    Quick,
    /// Every byte is added to the search table
    #[default]
    Thorough,
}

/// Upper bound on the size of the compressed output (header included) for an
/// input of `length` bytes
#[must_use]
pub fn max_compressed_size(length: usize) -> usize {
    // incompressible data costs one command per literal block, plus the
    // stopcode and the largest header
    length + length / LITERAL_MAX as usize + 16
}

/// Compress a data stream from a Reader to refpack format into a Writer.
///
/// First parameter is the length; allows for compressing an arbitrary block
/// length from any reader.
///
/// Second and third parameter are the pregenerated reader and destination
/// writer
///
/// # Example
///
/// ```Rust
/// use std::io::Cursor;
///
/// let mut input = Cursor::new(b"Hello World!");
/// let mut output = Cursor::new(Vec::new());
///
/// // Compress the input into the output
/// sage_refpack::compress(12, &mut input, &mut output, Default::default());
/// // output now contains the compressed version of the input
/// ```
///
/// # Returns
/// Number of bytes written to `writer`
///
/// # Errors
/// - [RefPackError::InputTooLarge]: Length provided can't be stored in a
///   header
/// - [RefPackError::TruncatedInput]: reader had fewer than `length` bytes
/// - [RefPackError::Io]: Generic IO error when reading or writing
pub fn compress(
    length: usize,
    reader: &mut impl Read,
    writer: &mut impl Write,
    compression_options: CompressionOptions,
) -> RefPackResult<usize> {
    let mut buf = vec![0; length];
    reader.read_exact(buf.as_mut_slice())?;
    let out = easy_compress(&buf, compression_options)?;
    writer.write_all(&out)?;
    writer.flush()?;
    Ok(out.len())
}

/// Wrapped compress function with a bit easier and cleaner of an API. Takes a
/// `&[u8]` slice of uncompressed bytes and returns a `Vec<u8>` of compressed
/// bytes, header included.
///
/// Empty input is fine and produces a header followed by a bare stopcode.
///
/// # Errors
/// - [RefPackError::InputTooLarge]: input is longer than `u32::MAX` bytes
/// - [RefPackError::Io]: Generic IO error when writing
#[inline]
pub fn easy_compress(
    input: &[u8],
    compression_options: CompressionOptions,
) -> RefPackResult<Vec<u8>> {
    let decompressed_length =
        u32::try_from(input.len()).map_err(|_| RefPackError::InputTooLarge(input.len()))?;

    let mut writer: Vec<u8> = Vec::with_capacity(max_compressed_size(input.len()));

    let header = Header {
        decompressed_length,
        compressed_length: None,
    };
    let header_length = header.write(&mut writer)?;

    trace!(
        "compressing {} bytes with {compression_options:?}",
        input.len()
    );

    let stats = greedy::encode(
        input,
        compression_options == CompressionOptions::Quick,
        &mut writer,
    )?;

    debug!(
        "compressed {} bytes to {} ({} header): {} literal blocks, {} short, {} medium, {} long \
         copies",
        input.len(),
        writer.len(),
        header_length,
        stats.literal,
        stats.short,
        stats.medium,
        stats.long
    );

    Ok(writer)
}
