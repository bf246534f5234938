////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use std::fmt::{Display, Formatter};
use std::io::ErrorKind;

use crate::data::DecodeError;
use crate::manager::CompressionType;

/// Possible errors returned by compression and decompression functions
#[derive(Debug)]
pub enum Error {
    /// Error for when the input to a compressor is too long for its size to
    /// be stored in a header
    ///
    /// ### Fields
    /// - usize: length of the rejected input
    InputTooLarge(usize),
    /// A reader ran out of bytes early. When decompressing, the data ended in
    /// the middle of the header or of a command; well formed streams always
    /// end with a stopcode, so this indicates truncated or corrupted data.
    /// When compressing, the reader held fewer bytes than the given length.
    TruncatedInput,
    /// Error indicating that the header failed to read the magic where it
    /// expected it. Only checked by entry points that sniff data for a
    /// RefPack stream; the raw decoder trusts its input.
    ///
    /// ### Fields
    /// - u16: What was read instead of the magic value
    BadMagic(u16),
    /// Indicates that an invalid operation occurred while attempting to decode
    /// a control. This normally indicates invalid or corrupted data.
    ///
    /// See [DecodeError] for further details on types of errors that can occur.
    ControlError { error: DecodeError, position: usize },
    /// A container tag named a compression scheme that has no codec here
    ///
    /// ### Fields
    /// - [CompressionType]: the scheme named by the tag
    UnsupportedCompression(CompressionType),
    /// Generic IO Error wrapper for when a generic IO error of some sort occurs
    /// in relation to the readers and writers.
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == ErrorKind::UnexpectedEof {
            Self::TruncatedInput
        } else {
            Self::Io(value)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InputTooLarge(length) => {
                write!(
                    f,
                    "Input of `{length}` bytes is too large to be described by a header"
                )
            }
            Error::TruncatedInput => {
                write!(f, "Input ended before the expected length or stopcode")
            }
            Error::BadMagic(magic) => {
                write!(
                    f,
                    "Invalid magic number at compression header `{magic:#06X}`"
                )
            }
            Error::ControlError { position, error } => {
                write!(
                    f,
                    "Error occured while decoding control block at position `{position}`:\n{error}"
                )
            }
            Error::UnsupportedCompression(kind) => {
                write!(f, "Unsupported compression type `{kind}`")
            }
            Error::Io(err) => {
                write!(f, "IO Error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Wrapper for Result specified to [RefPackError](crate::RefPackError)
pub type Result<T> = std::result::Result<T, Error>;
