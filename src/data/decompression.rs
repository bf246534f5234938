////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Decompression parsing, algorithms, and functionality.
//!
//! Basic concept is to parse the header to get the decompressed length, then
//! parse a repeating stream of "command" blocks, each a control code followed
//! by 0 or more literal bytes, until a stopcode is reached.
//!
//! Literal bytes are always written before performing the control code
//! operation.
//!
//! Copy commands may have a length longer than their offset. In that case the
//! copy reads bytes it wrote itself earlier in the same copy, so the last
//! `offset` bytes of output repeat until the length is filled. Given the
//! output `DEADBEEF` and a copy with offset 4 and length 16:
//!
//! ```text
//! DEADBEEF
//!     ^   ^
//!     LB  O
//! ```
//!
//! Copying one byte at a time from the lookback (`LB`) to the output (`O`)
//! and advancing both gives `DEADBEEFBEEF` after four bytes, at which point
//! `LB` points at the first `B` written by this copy. Continuing as normal
//! results in:
//!
//! ```text
//! DEADBEEFBEEFBEEFBEEFBEEF
//! ```
//!
//! The decompressed length in the header is trusted: the output is always
//! that long, even if the commands stop short of filling it.
use std::cmp::min;
use std::io::{Cursor, Read, Seek, Write};

use log::{debug, trace};

use crate::data::control::Command;
use crate::data::{copy_back_reference, copy_from_reader};
use crate::header::Header;
use crate::{RefPackError, RefPackResult};

/// Byte counts from a decompression
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sizes {
    /// Decompressed length recorded in the header
    pub decompressed: usize,
    /// Number of bytes of compressed data read, header included
    pub consumed: usize,
}

/// Runs commands from `reader` until a stopcode, writing into `buffer`.
///
/// # Returns
/// the position in `buffer` after the last command
fn decode_commands(buffer: &mut [u8], reader: &mut impl Read) -> RefPackResult<usize> {
    let mut position = 0usize;

    loop {
        let command = Command::read(reader)?;

        let literal = command.num_of_literal();
        if literal > 0 {
            position = copy_from_reader(buffer, reader, position, literal)?;
        }

        if let Some((offset, length)) = command.offset_copy() {
            position = copy_back_reference(buffer, position, offset, length)
                .map_err(|error| RefPackError::ControlError { error, position })?;
        }

        if command.is_stop() {
            break;
        }
    }

    Ok(position)
}

// Returning the internal buffer is the fastest way to return the data
// since that way the buffer doesn't have to be copied
fn decompress_internal(reader: &mut (impl Read + Seek)) -> RefPackResult<(Vec<u8>, Sizes)> {
    let start = reader.stream_position()?;

    let Header {
        decompressed_length,
        ..
    } = Header::read(reader)?;

    let mut decompression_buffer = vec![0; decompressed_length as usize];
    let written = decode_commands(&mut decompression_buffer, reader)?;

    if written != decompression_buffer.len() {
        debug!(
            "stopcode reached after {written} of {} declared bytes",
            decompression_buffer.len()
        );
    }

    let sizes = Sizes {
        decompressed: decompression_buffer.len(),
        consumed: (reader.stream_position()? - start) as usize,
    };
    trace!(
        "decompressed {} bytes from {}",
        sizes.decompressed,
        sizes.consumed
    );

    Ok((decompression_buffer, sizes))
}

/// Decompress `refpack` data. Accepts arbitrary `Read`s and `Write`s.
///
/// The header's flags word is not validated, so this will happily decode
/// garbage that isn't RefPack. Use [is_refpack](crate::header::is_refpack)
/// first if that's a possibility.
///
/// The output buffer is allocated at the decompressed length the header
/// declares before any command is read, up to 4 GiB. For untrusted data check
/// [decompressed_size](crate::header::decompressed_size) first, or use
/// [decompress_into] with a buffer of your own.
///
/// # Example
///
/// ```Rust
/// use std::io::Cursor;
///
/// let mut input = Cursor::new(/* some refpack data */);
/// let mut output = Cursor::new(Vec::new());
///
/// // decompress the input into the output
/// sage_refpack::decompress(&mut input, &mut output);
/// // output now contains the decompressed version of the input
/// ```
/// # Errors
/// - [RefPackError::TruncatedInput]: data ended before a stopcode
/// - [RefPackError::ControlError]: Invalid control code operation was attempted
///   to be performed. This normally indicated corrupted or invalid refpack
///   data
/// - [RefPackError::Io]: Generic IO error occured while attempting to read or
///   write data
pub fn decompress(
    reader: &mut (impl Read + Seek),
    writer: &mut impl Write,
) -> RefPackResult<Sizes> {
    let (data, sizes) = decompress_internal(reader)?;

    writer.write_all(data.as_slice())?;
    writer.flush()?;

    Ok(sizes)
}

/// Decompress `input` into a caller provided buffer, which has to be at least
/// as long as the decompressed length in the header.
///
/// Bytes of `output` past the decompressed length are left untouched.
/// Nothing is allocated, so this is the way to decode data whose header
/// can't be trusted.
///
/// # Errors
/// - [RefPackError::ControlError]: `output` is too short, or the data is
///   corrupted
/// - [RefPackError::TruncatedInput]: data ended before a stopcode
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> RefPackResult<Sizes> {
    let mut reader = Cursor::new(input);
    let Header {
        decompressed_length,
        ..
    } = Header::read(&mut reader)?;

    let limit = min(decompressed_length as usize, output.len());
    decode_commands(&mut output[..limit], &mut reader)?;

    Ok(Sizes {
        decompressed: decompressed_length as usize,
        consumed: reader.position() as usize,
    })
}

/// Wrapped decompress function with a bit easier and cleaner of an API.
/// Takes a slice of bytes and returns a Vec of byes
///
/// The output buffer is allocated at the decompressed length the header
/// declares before any command is read, up to 4 GiB. For untrusted data check
/// [decompressed_size](crate::header::decompressed_size) first, or use
/// [decompress_into] with a buffer of your own.
///
/// # Returns
///
/// A Result containing either `Vec<u8>` of the decompressed data or a
/// `RefPackError`.
///
/// # Errors
/// - [RefPackError::TruncatedInput]: data ended before a stopcode
/// - [RefPackError::ControlError]: Invalid control code operation was attempted
///   to be performed. This normally indicated corrupted or invalid refpack
///   data
#[inline]
pub fn easy_decompress(input: &[u8]) -> RefPackResult<Vec<u8>> {
    let mut reader = Cursor::new(input);
    decompress_internal(&mut reader).map(|(data, _)| data)
}

/// Like [easy_decompress], but also reports how much of `input` was read.
///
/// `None` stands in for a missing buffer and decompresses to nothing, having
/// read nothing.
///
/// # Errors
/// Same as [easy_decompress]
pub fn easy_decompress_sized(input: Option<&[u8]>) -> RefPackResult<(Vec<u8>, Sizes)> {
    match input {
        Some(input) => decompress_internal(&mut Cursor::new(input)),
        None => Ok((vec![], Sizes::default())),
    }
}
