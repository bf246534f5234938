////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! control codes utilized by compression and decompression

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::RefPackResult;

/// minimum value of the literal length in a literal command
pub const LITERAL_MIN: u8 = 4;

/// maximum value of the literal length in a literal command
pub const LITERAL_MAX: u8 = 112;

/// maximum value of the literal length in a copy command or stopcode
pub const COPY_LITERAL_MAX: u8 = 3;

/// maximum offset distance for a short command
pub const SHORT_OFFSET_MAX: u32 = 1_024;

/// minimum length for a short command
pub const SHORT_LENGTH_MIN: u16 = 3;

/// maximum length for a short command
pub const SHORT_LENGTH_MAX: u16 = 10;

/// maximum offset distance for a medium command
pub const MEDIUM_OFFSET_MAX: u32 = 16_384;

/// minimum length for a medium command
pub const MEDIUM_LENGTH_MIN: u16 = 4;

/// maximum length for a medium command
pub const MEDIUM_LENGTH_MAX: u16 = 67;

/// maximum offset distance for a long command
pub const LONG_OFFSET_MAX: u32 = 131_072;

/// minimum length for a long command
pub const LONG_LENGTH_MIN: u16 = 5;

/// maximum length for a long command
pub const LONG_LENGTH_MAX: u16 = 1_028;

/// A single decoded command.
///
/// ## Key for layout
/// - `0` or `1`: command prefix
/// - `P`: Position (offset - 1)
/// - `L`: Length (minus the minimum length of the form)
/// - `B`: Literal bytes length
/// - `-`: Nibble Separator
/// - `:`: Byte Separator
///
/// ## Commands
///
/// | Command | Len | Literal      | Length        | Position        | Layout                                    |
/// |---------|-----|--------------|---------------|-----------------|-------------------------------------------|
/// | Short   | 2   | (0..=3) +0   | (3..=10) +3   | (1..=1024) +1   | `0PPL-LLBB:PPPP-PPPP`                     |
/// | Medium  | 3   | (0..=3) +0   | (4..=67) +4   | (1..=16384) +1  | `10LL-LLLL:BBPP-PPPP:PPPP-PPPP`           |
/// | Long    | 4   | (0..=3) +0   | (5..=1028) +5 | (1..=131072) +1 | `110P-LLBB:PPPP-PPPP:PPPP-PPPP:LLLL-LLLL` |
/// | Literal | 1   | (4..=112) +4 | 0             | 0               | `111B-BBBB`                               |
/// | Stop    | 1   | (0..=3) +0   | 0             | 0               | `1111-11BB`                               |
///
/// Literal bytes always follow the command bytes and are written to the
/// output before the copy is performed.
///
/// ### Literal vs Stop
///
/// Literal commands store `(length - 4) >> 2` in five bits, so the length is
/// always a multiple of 4. There is no separate bit telling literal and stop
/// apart: a `111` command whose decoded length would be above 112 (first
/// byte `0xFC..=0xFF`) is a stopcode, and its low two bits are the number of
/// trailing literal bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Short { offset: u32, length: u16, literal: u8 },
    Medium { offset: u32, length: u16, literal: u8 },
    Long { offset: u32, length: u16, literal: u8 },
    Literal(u8),
    Stop(u8),
}

impl Command {
    /// Number of command bytes needed to encode a copy of `length` bytes from
    /// `offset` bytes back: 2, 3 or 4. Picks the smallest form that fits.
    ///
    /// This does not check minimum lengths; a length of 3 at an offset above
    /// [SHORT_OFFSET_MAX] reports 3 even though the medium form can't
    /// encode it. The encoder never accepts such a match since it would
    /// save nothing.
    #[inline(always)]
    #[must_use]
    pub fn copy_cost(offset: usize, length: usize) -> usize {
        if offset <= SHORT_OFFSET_MAX as usize && length <= SHORT_LENGTH_MAX as usize {
            2
        } else if offset <= MEDIUM_OFFSET_MAX as usize && length <= MEDIUM_LENGTH_MAX as usize {
            3
        } else {
            4
        }
    }

    /// Create a new copy type `Command`, choosing the smallest form.
    ///
    /// # Panics
    /// Panics if you attempt to create an invalid Command in some way
    #[must_use]
    pub fn new(offset: u32, length: u16, literal: u8) -> Self {
        assert!(
            literal <= COPY_LITERAL_MAX,
            "Literal length must be less than or equal to {COPY_LITERAL_MAX} for commands \
             ({literal})"
        );
        assert!(
            offset >= 1 && offset <= LONG_OFFSET_MAX && length <= LONG_LENGTH_MAX,
            "Invalid offset or length (Maximum offset {LONG_OFFSET_MAX}, got {offset}) (Maximum \
             length {LONG_LENGTH_MAX}, got {length})"
        );

        match Self::copy_cost(offset as usize, length as usize) {
            2 => {
                assert!(
                    length >= SHORT_LENGTH_MIN,
                    "Length must be greater than or equal to {SHORT_LENGTH_MIN} for short \
                     commands (Length: {length}) (Offset: {offset})"
                );
                Self::Short {
                    offset,
                    length,
                    literal,
                }
            }
            3 => {
                assert!(
                    length >= MEDIUM_LENGTH_MIN,
                    "Length must be greater than or equal to {MEDIUM_LENGTH_MIN} for medium \
                     commands (Length: {length}) (Offset: {offset})"
                );
                Self::Medium {
                    offset,
                    length,
                    literal,
                }
            }
            _ => {
                assert!(
                    length >= LONG_LENGTH_MIN,
                    "Length must be greater than or equal to {LONG_LENGTH_MIN} for long commands \
                     (Length: {length}) (Offset: {offset})"
                );
                Self::Long {
                    offset,
                    length,
                    literal,
                }
            }
        }
    }

    /// Creates a new literal command
    ///
    /// # Panics
    /// Panics if the length is out of range or not a multiple of 4
    #[must_use]
    pub fn new_literal(length: u8) -> Self {
        assert!(
            (LITERAL_MIN..=LITERAL_MAX).contains(&length) && length % 4 == 0,
            "Literal length must be a multiple of 4 between {LITERAL_MIN} and {LITERAL_MAX} (got \
             {length})"
        );
        Self::Literal(length)
    }

    /// Creates a new stopcode
    ///
    /// # Panics
    /// Panics if you attempt to create too long of a stop code.
    #[must_use]
    pub fn new_stop(literal_length: usize) -> Self {
        assert!(
            literal_length <= COPY_LITERAL_MAX as usize,
            "Stopcode recieved too long of a literal length (max {COPY_LITERAL_MAX}, got \
             {literal_length})"
        );
        Self::Stop(literal_length as u8)
    }

    /// Number of literal bytes that follow the command bytes
    #[must_use]
    pub fn num_of_literal(self) -> usize {
        match self {
            Command::Short { literal, .. }
            | Command::Medium { literal, .. }
            | Command::Long { literal, .. }
            | Command::Literal(literal)
            | Command::Stop(literal) => literal as usize,
        }
    }

    /// Get the offset and length of a copy command as a `(usize, usize)` tuple.
    ///
    /// Returns `None` if `self` is not a copy command.
    #[must_use]
    pub fn offset_copy(self) -> Option<(usize, usize)> {
        match self {
            Command::Short { offset, length, .. }
            | Command::Medium { offset, length, .. }
            | Command::Long { offset, length, .. } => Some((offset as usize, length as usize)),
            _ => None,
        }
    }

    /// Returns true if the command is a stopcode, false if it is not.
    #[must_use]
    pub fn is_stop(self) -> bool {
        matches!(self, Command::Stop(_))
    }

    /// Number of bytes the command itself takes up, not counting literals
    #[cfg(test)]
    pub(crate) fn encoded_len(self) -> usize {
        match self {
            Command::Short { .. } => 2,
            Command::Medium { .. } => 3,
            Command::Long { .. } => 4,
            Command::Literal(_) | Command::Stop(_) => 1,
        }
    }

    #[inline(always)]
    fn read_short(first: u8, reader: &mut impl Read) -> RefPackResult<Self> {
        let byte1 = first as usize;
        let byte2: usize = reader.read_u8()?.into();

        let offset = ((((byte1 & 0b0110_0000) << 3) | byte2) + 1) as u32;
        let length = (((byte1 & 0b0001_1100) >> 2) + 3) as u16;
        let literal = (byte1 & 0b0000_0011) as u8;

        Ok(Self::Short {
            offset,
            length,
            literal,
        })
    }

    #[inline(always)]
    fn read_medium(first: u8, reader: &mut impl Read) -> RefPackResult<Self> {
        let byte1: usize = first as usize;
        let byte2: usize = reader.read_u8()?.into();
        let byte3: usize = reader.read_u8()?.into();

        let offset = ((((byte2 & 0b0011_1111) << 8) | byte3) + 1) as u32;
        let length = ((byte1 & 0b0011_1111) + 4) as u16;
        let literal = ((byte2 & 0b1100_0000) >> 6) as u8;

        Ok(Self::Medium {
            offset,
            length,
            literal,
        })
    }

    #[inline(always)]
    fn read_long(first: u8, reader: &mut impl Read) -> RefPackResult<Self> {
        let byte1: usize = first as usize;
        let byte2: usize = reader.read_u8()?.into();
        let byte3: usize = reader.read_u8()?.into();
        let byte4: usize = reader.read_u8()?.into();

        let offset = ((((byte1 & 0b0001_0000) << 12) | (byte2 << 8) | byte3) + 1) as u32;
        let length = ((((byte1 & 0b0000_1100) << 6) | byte4) + 5) as u16;
        let literal = (byte1 & 0b0000_0011) as u8;

        Ok(Self::Long {
            offset,
            length,
            literal,
        })
    }

    /// Reads and decodes a command from a reader.
    ///
    /// # Errors
    /// - [RefPackError::TruncatedInput](crate::RefPackError::TruncatedInput):
    ///   the reader ended inside the command
    /// - [RefPackError::Io](crate::RefPackError::Io): Generic IO error
    #[inline(always)]
    pub fn read(reader: &mut impl Read) -> RefPackResult<Self> {
        let first = reader.read_u8()?;

        match first {
            0x00..=0x7F => Self::read_short(first, reader),
            0x80..=0xBF => Self::read_medium(first, reader),
            0xC0..=0xDF => Self::read_long(first, reader),
            // ((first & 0x1F) << 2) + 4 <= 112
            0xE0..=0xFB => Ok(Self::Literal(((first & 0b0001_1111) << 2) + 4)),
            0xFC..=0xFF => Ok(Self::Stop(first & 0b0000_0011)),
        }
    }

    fn write_short(
        offset: u32,
        length: u16,
        literal: u8,
        writer: &mut impl Write,
    ) -> RefPackResult<()> {
        let length_adjusted = length - 3;
        let offset_adjusted = offset - 1;

        let first = ((offset_adjusted & 0b0000_0011_0000_0000) >> 3) as u8
            | ((length_adjusted & 0b0000_0111) << 2) as u8
            | literal & 0b0000_0011;
        let second = (offset_adjusted & 0b0000_0000_1111_1111) as u8;

        writer.write_u8(first)?;
        writer.write_u8(second)?;
        Ok(())
    }

    fn write_medium(
        offset: u32,
        length: u16,
        literal: u8,
        writer: &mut impl Write,
    ) -> RefPackResult<()> {
        let length_adjusted = length - 4;
        let offset_adjusted = offset - 1;

        let first = (0b1000_0000 | length_adjusted & 0b0011_1111) as u8;
        let second = ((literal & 0b0000_0011) << 6) | (offset_adjusted >> 8) as u8;
        let third = (offset_adjusted & 0b0000_0000_1111_1111) as u8;

        writer.write_u8(first)?;
        writer.write_u8(second)?;
        writer.write_u8(third)?;
        Ok(())
    }

    fn write_long(
        offset: u32,
        length: u16,
        literal: u8,
        writer: &mut impl Write,
    ) -> RefPackResult<()> {
        let length_adjusted = length - 5;
        let offset_adjusted = offset - 1;

        let first = 0b1100_0000u8
            | ((offset_adjusted >> 12) & 0b0001_0000) as u8
            | ((length_adjusted >> 6) & 0b0000_1100) as u8
            | literal & 0b0000_0011;
        let second = ((offset_adjusted >> 8) & 0b1111_1111) as u8;
        let third = (offset_adjusted & 0b1111_1111) as u8;
        let fourth = (length_adjusted & 0b1111_1111) as u8;

        writer.write_u8(first)?;
        writer.write_u8(second)?;
        writer.write_u8(third)?;
        writer.write_u8(fourth)?;
        Ok(())
    }

    /// Encodes and writes a command to a writer. Literal bytes are not
    /// included and have to be written by the caller.
    ///
    /// # Errors
    /// - [RefPackError::Io](crate::RefPackError::Io): Generic IO error
    ///   occurred while attempting to write data
    pub fn write(self, writer: &mut impl Write) -> RefPackResult<()> {
        match self {
            Command::Short {
                offset,
                length,
                literal,
            } => Self::write_short(offset, length, literal, writer),
            Command::Medium {
                offset,
                length,
                literal,
            } => Self::write_medium(offset, length, literal, writer),
            Command::Long {
                offset,
                length,
                literal,
            } => Self::write_long(offset, length, literal, writer),
            Command::Literal(literal) => {
                writer.write_u8(0b1110_0000 | (((literal - 4) >> 2) & 0b0001_1111))?;
                Ok(())
            }
            Command::Stop(literal) => {
                writer.write_u8(0b1111_1100 | (literal & 0b0000_0011))?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    fn generate_random_valid_command() -> BoxedStrategy<Command> {
        let short_copy_strat = (1..=SHORT_OFFSET_MAX, SHORT_LENGTH_MIN..=SHORT_LENGTH_MAX, 0..=3u8)
            .prop_map(|(offset, length, literal)| {
                Command::Short {
                    offset,
                    length,
                    literal,
                }
            });

        let medium_copy_strat = (
            1..=MEDIUM_OFFSET_MAX,
            MEDIUM_LENGTH_MIN..=MEDIUM_LENGTH_MAX,
            0..=3u8,
        )
            .prop_map(|(offset, length, literal)| {
                Command::Medium {
                    offset,
                    length,
                    literal,
                }
            });

        let long_copy_strat = (1..=LONG_OFFSET_MAX, LONG_LENGTH_MIN..=LONG_LENGTH_MAX, 0..=3u8)
            .prop_map(|(offset, length, literal)| {
                Command::Long {
                    offset,
                    length,
                    literal,
                }
            });

        let literal = (0..=27u8).prop_map(|literal| Command::new_literal((literal * 4) + 4));
        let stop = (0..=3usize).prop_map(Command::new_stop);

        prop_oneof![
            short_copy_strat,
            medium_copy_strat,
            long_copy_strat,
            literal,
            stop
        ]
        .boxed()
    }

    fn write_then_read(command: Command) -> (Command, usize) {
        let mut buf = vec![];
        command.write(&mut buf).unwrap();
        let written = buf.len();
        let read = Command::read(&mut Cursor::new(buf)).unwrap();
        (read, written)
    }

    #[proptest]
    fn symmetrical_any_command(#[strategy(generate_random_valid_command())] input: Command) {
        let (out, written) = write_then_read(input);

        prop_assert_eq!(out, input);
        prop_assert_eq!(written, input.encoded_len());
    }

    #[proptest]
    fn new_picks_cheapest_form(
        #[strategy(1..=131_072_u32)] offset: u32,
        #[strategy(5..=1028_u16)] length: u16,
        #[strategy(0..=3_u8)] literal: u8,
    ) {
        let command = Command::new(offset, length, literal);

        prop_assert_eq!(
            command.encoded_len(),
            Command::copy_cost(offset as usize, length as usize)
        );
        prop_assert_eq!(
            command.offset_copy(),
            Some((offset as usize, length as usize))
        );
        prop_assert_eq!(command.num_of_literal(), literal as usize);
    }

    #[test]
    fn decodes_short_from_bit_layout() {
        // 0PPL-LLBB:PPPP-PPPP with P = 0b11_0000_0001, L = 0b101, B = 0b10
        let command = Command::read(&mut Cursor::new([0b0111_0110u8, 0b0000_0001])).unwrap();
        assert_eq!(
            command,
            Command::Short {
                offset: 0b11_0000_0001 + 1,
                length: 0b101 + 3,
                literal: 2,
            }
        );
    }

    #[test]
    fn decodes_medium_from_bit_layout() {
        let command =
            Command::read(&mut Cursor::new([0b1011_1111u8, 0b0111_1111, 0xFF])).unwrap();
        assert_eq!(
            command,
            Command::Medium {
                offset: 16_384,
                length: 67,
                literal: 1,
            }
        );
    }

    #[test]
    fn decodes_long_from_bit_layout() {
        let command =
            Command::read(&mut Cursor::new([0b1101_1111u8, 0xFF, 0xFF, 0xFF])).unwrap();
        assert_eq!(
            command,
            Command::Long {
                offset: 131_072,
                length: 1028,
                literal: 3,
            }
        );
    }

    #[test]
    fn literal_and_stop_boundary() {
        assert_eq!(
            Command::read(&mut Cursor::new([0xE0u8])).unwrap(),
            Command::Literal(4)
        );
        assert_eq!(
            Command::read(&mut Cursor::new([0xFBu8])).unwrap(),
            Command::Literal(112)
        );
        for stop in 0xFC..=0xFFu8 {
            let command = Command::read(&mut Cursor::new([stop])).unwrap();
            assert_eq!(command, Command::Stop(stop & 0b11));
            assert!(command.is_stop());
            assert_eq!(command.offset_copy(), None);
        }
    }

    #[test]
    fn copy_costs() {
        assert_eq!(Command::copy_cost(1024, 10), 2);
        assert_eq!(Command::copy_cost(1025, 10), 3);
        assert_eq!(Command::copy_cost(1024, 11), 3);
        assert_eq!(Command::copy_cost(16_384, 67), 3);
        assert_eq!(Command::copy_cost(16_385, 5), 4);
        assert_eq!(Command::copy_cost(1, 68), 4);
    }

    #[test]
    fn truncated_command_errors() {
        let error = Command::read(&mut Cursor::new([0xC0u8, 0x00])).unwrap_err();
        assert!(matches!(error, crate::RefPackError::TruncatedInput));
    }

    #[test]
    #[should_panic]
    fn command_reject_new_stop_invalid() {
        let _invalid = Command::new_stop(8000);
    }

    #[test]
    #[should_panic]
    fn command_reject_new_literal_invalid() {
        let _invalid = Command::new_literal(u8::MAX);
    }

    #[test]
    #[should_panic]
    fn command_reject_new_literal_unaligned() {
        let _invalid = Command::new_literal(7);
    }

    #[test]
    #[should_panic]
    fn command_reject_new_invalid_high_offset() {
        let _invalid = Command::new(500_000, 5, 0);
    }

    #[test]
    #[should_panic]
    fn command_reject_new_invalid_high_length() {
        let _invalid = Command::new(1, u16::MAX, 0);
    }

    #[test]
    #[should_panic]
    fn command_reject_new_invalid_high_literal() {
        let _invalid = Command::new(1, 3, u8::MAX);
    }

    #[test]
    #[should_panic]
    fn command_reject_short_length_at_long_offset() {
        let _invalid = Command::new(20_000, 4, 0);
    }
}
