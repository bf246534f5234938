////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Module for things relating to the header of the data: a flags word that
//! doubles as the magic number, the decompressed length, and in some dialects
//! a compressed length.
//!
//! ## Structure
//! - Big Endian u16: Flags/magic, `0x10FB` or `0x90FB` when written by this
//!   crate
//! - Big Endian u24/u32: Compressed length, only present when
//!   [FLAG_COMPRESSED_SIZE_PRESENT] is set. Width matches the decompressed
//!   length.
//! - Big Endian u24/u32: Decompressed length, u32 when [FLAG_BIG_SIZES] is set

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{RefPackError, RefPackResult};

/// Magic number in the header. Literal `10 FB` sequence in stream, read and
/// write as Big Endian.
///
/// The high byte is also used as a flags field, see [FLAG_BIG_SIZES] and
/// [FLAG_COMPRESSED_SIZE_PRESENT]
pub const MAGIC: u16 = 0x10FB;

/// Bits of the flags word that have to match [MAGIC] for data to be
/// recognized as RefPack. Excludes the flag bits.
pub const MAGIC_MASK: u16 = 0x3EFF;

/// Sizes in the header are stored as u32 rather than u24
pub const FLAG_BIG_SIZES: u16 = 0x8000;

/// A compressed length precedes the decompressed length
pub const FLAG_COMPRESSED_SIZE_PRESENT: u16 = 0x0100;

/// Largest length that still fits in the short u24 header form
pub const MAX_SMALL_LENGTH: u32 = 0xFF_FF_FF;

/// Internal struct to represent a decoded header
#[derive(Eq, PartialEq, Debug, Default, Copy, Clone)]
pub struct Header {
    pub decompressed_length: u32,
    /// Only some foreign encoders write this. The decoder skips over it.
    pub compressed_length: Option<u32>,
}

/// The header flags. Bits that are not flags are ignored on read.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
struct Flags {
    big_sizes: bool,
    compressed_size_present: bool,
}

impl Flags {
    fn read(data: u16) -> Self {
        Self {
            big_sizes: (data & FLAG_BIG_SIZES) > 0,
            compressed_size_present: (data & FLAG_COMPRESSED_SIZE_PRESENT) > 0,
        }
    }

    fn write(self) -> u16 {
        let mut out = MAGIC;
        if self.big_sizes {
            out |= FLAG_BIG_SIZES;
        }
        if self.compressed_size_present {
            out |= FLAG_COMPRESSED_SIZE_PRESENT;
        }
        out
    }
}

impl Header {
    /// Length in bytes of the header that [Header::write] produces
    #[must_use]
    pub fn length(self) -> usize {
        let width = if self.needs_big_sizes() { 4 } else { 3 };
        let fields = if self.compressed_length.is_some() { 2 } else { 1 };
        2 + width * fields
    }

    fn needs_big_sizes(self) -> bool {
        self.decompressed_length > MAX_SMALL_LENGTH
            || self
                .compressed_length
                .map_or(false, |length| length > MAX_SMALL_LENGTH)
    }

    /// Reads a header at the current position of the reader.
    ///
    /// The flags word is not checked against [MAGIC]; use [is_refpack] first
    /// if the data might not be RefPack at all.
    ///
    /// # Errors
    /// - [RefPackError::TruncatedInput]: the reader ended inside the header
    /// - [RefPackError::Io]: generic IO Error
    pub fn read(reader: &mut impl Read) -> RefPackResult<Header> {
        let flags = Flags::read(reader.read_u16::<BigEndian>()?);
        // Inexplicably these are stored Big Endian
        let read_size = |reader: &mut dyn Read| -> RefPackResult<u32> {
            if flags.big_sizes {
                Ok(reader.read_u32::<BigEndian>()?)
            } else {
                Ok(reader.read_u24::<BigEndian>()?)
            }
        };
        let compressed_length = if flags.compressed_size_present {
            Some(read_size(&mut *reader)?)
        } else {
            None
        };
        let decompressed_length = read_size(&mut *reader)?;
        Ok(Header {
            decompressed_length,
            compressed_length,
        })
    }

    /// Writes the header to the writer, returning the number of bytes written
    ///
    /// # Errors
    /// Returns [RefPackError::Io] if the write failed due to a generic IO Error
    pub fn write(self, writer: &mut impl Write) -> RefPackResult<usize> {
        let big_sizes = self.needs_big_sizes();
        let flags = Flags {
            big_sizes,
            compressed_size_present: self.compressed_length.is_some(),
        };
        writer.write_u16::<BigEndian>(flags.write())?;
        for size in self
            .compressed_length
            .into_iter()
            .chain(Some(self.decompressed_length))
        {
            if big_sizes {
                writer.write_u32::<BigEndian>(size)?;
            } else {
                writer.write_u24::<BigEndian>(size)?;
            }
        }
        Ok(self.length())
    }
}

/// Checks whether the first two bytes of `data` look like a RefPack header
#[must_use]
pub fn is_refpack(data: &[u8]) -> bool {
    match data {
        [high, low, ..] => u16::from_be_bytes([*high, *low]) & MAGIC_MASK == MAGIC,
        _ => false,
    }
}

/// Reads only the decompressed length out of the header of `data`
///
/// # Errors
/// - [RefPackError::BadMagic]: `data` does not start with a RefPack header
/// - [RefPackError::TruncatedInput]: `data` ends inside the header
pub fn decompressed_size(data: &[u8]) -> RefPackResult<u32> {
    if !is_refpack(data) {
        let magic = match data {
            [high, low, ..] => u16::from_be_bytes([*high, *low]),
            [high] => u16::from(*high) << 8,
            [] => 0,
        };
        return Err(RefPackError::BadMagic(magic));
    }
    Ok(Header::read(&mut Cursor::new(data))?.decompressed_length)
}
