////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! things relating the actual compressed data block. Anything past the header
//! info, the compression and decompression algorithms themselves, control
//! codes, etc.

use std::io::Read;

use onlyerror::Error;

use crate::RefPackResult;

pub mod compression;
pub mod control;
pub mod decompression;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// Error indicating that offset was 0 in a copy command. Every encoded
    /// offset has 1 added to it, so this can only come from a hand built
    /// command.
    #[error("Offset is 0 in compressed data control command")]
    BadOffset,
    /// Error indicating that the requested copy offset would go past the start
    /// of the buffer. This indicates malformed or corrupted data.
    ///
    /// ### Fields
    /// - usize: buffer length
    /// - usize: offset requested
    #[error("Offset went past start of buffer: buffer length `{0}`, offset `{1}`")]
    NegativePosition(usize, usize),
    /// Error indicating that a command attempted to write past the end of the
    /// output buffer, which is sized from the header
    ///
    /// ### Fields
    /// - usize: amount of bytes attempted to write past
    #[error("Decompressed data overran decompressed size in header by `{0}` bytes")]
    BadLength(usize),
}

/// Copies `length` bytes starting `offset` bytes behind `position` to
/// `position`.
///
/// When `offset < length` the source and destination overlap and the bytes
/// written early in the copy are read again later in the same copy, which
/// repeats the last `offset` bytes until `length` is reached. That case is
/// done one byte at a time in forward order.
///
/// If this function errors no data will have been copied
///
/// # Errors
/// - [DecodeError::BadOffset]: `offset` is 0
/// - [DecodeError::NegativePosition]: `offset` > `position`
/// - [DecodeError::BadLength]: `position + length` > `buffer.len()`
///
/// # Returns
/// the new position of the buffer after the copy
#[inline(always)]
pub(crate) fn copy_back_reference(
    buffer: &mut [u8],
    position: usize,
    offset: usize,
    length: usize,
) -> Result<usize, DecodeError> {
    if offset == 0 {
        return Err(DecodeError::BadOffset);
    }
    if offset > position {
        return Err(DecodeError::NegativePosition(position, offset));
    }
    if position + length > buffer.len() {
        return Err(DecodeError::BadLength(position + length - buffer.len()));
    }

    let source = position - offset;

    if offset >= length {
        buffer.copy_within(source..source + length, position);
    } else {
        for i in 0..length {
            buffer[position + i] = buffer[source + i];
        }
    }

    Ok(position + length)
}

/// Copy `length` literal bytes from the reader into `buffer` at `position`
///
/// # Returns
/// the new position of the buffer after the read
///
/// # Errors
/// - [RefPackError::ControlError](crate::RefPackError::ControlError): the
///   literal would run past the end of `buffer`
/// - [RefPackError::TruncatedInput](crate::RefPackError::TruncatedInput): the
///   reader ran out of bytes
#[inline(always)]
pub(crate) fn copy_from_reader(
    buffer: &mut [u8],
    reader: &mut impl Read,
    position: usize,
    length: usize,
) -> RefPackResult<usize> {
    if position + length > buffer.len() {
        return Err(crate::RefPackError::ControlError {
            error: DecodeError::BadLength(position + length - buffer.len()),
            position,
        });
    }

    reader.read_exact(&mut buffer[position..(position + length)])?;

    Ok(position + length)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::RefPackError;

    mod back_reference {
        use super::*;

        #[test]
        fn errors_on_bad_offset() {
            let error = copy_back_reference(&mut [0], 0, 0, 1).unwrap_err();
            assert!(matches!(error, DecodeError::BadOffset));
        }

        #[test]
        fn errors_on_negative_position() {
            let error = copy_back_reference(&mut [0], 0, 1, 1).unwrap_err();
            assert_eq!(
                error.to_string(),
                "Offset went past start of buffer: buffer length `0`, offset `1`"
            );
        }

        #[test]
        fn errors_on_bad_length() {
            let error = copy_back_reference(&mut [0, 0], 1, 1, 10).unwrap_err();
            assert_eq!(
                error.to_string(),
                "Decompressed data overran decompressed size in header by `9` bytes"
            );
        }

        #[test]
        fn non_overlapping_copy() {
            let mut buf = *b"abcd____";
            let position = copy_back_reference(&mut buf, 4, 4, 4).unwrap();
            assert_eq!(position, 8);
            assert_eq!(&buf, b"abcdabcd");
        }

        #[test]
        fn overlapping_copy_repeats_pattern() {
            let mut buf = *b"AB__________";
            let position = copy_back_reference(&mut buf, 2, 2, 10).unwrap();
            assert_eq!(position, 12);
            assert_eq!(&buf, b"ABABABABABAB");
        }

        #[test]
        fn single_byte_run() {
            let mut buf = [7, 0, 0, 0, 0];
            copy_back_reference(&mut buf, 1, 1, 4).unwrap();
            assert_eq!(buf, [7; 5]);
        }
    }

    #[test]
    fn copies_literals_from_reader() {
        let mut buf = [0u8; 4];
        let mut reader = Cursor::new(vec![1u8, 2, 3]);
        let position = copy_from_reader(&mut buf, &mut reader, 1, 3).unwrap();
        assert_eq!(position, 4);
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[test]
    fn literal_overrun_errors() {
        let mut buf = [0u8; 2];
        let mut reader = Cursor::new(vec![1u8, 2, 3]);
        let error = copy_from_reader(&mut buf, &mut reader, 0, 3).unwrap_err();
        assert!(matches!(
            error,
            RefPackError::ControlError {
                error: DecodeError::BadLength(1),
                position: 0
            }
        ));
    }

    #[test]
    fn literal_short_reader_errors() {
        let mut buf = [0u8; 4];
        let mut reader = Cursor::new(vec![1u8]);
        let error = copy_from_reader(&mut buf, &mut reader, 0, 3).unwrap_err();
        assert!(matches!(error, RefPackError::TruncatedInput));
    }
}
