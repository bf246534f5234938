////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Tagged container used by the SAGE engine to mark compressed blobs.
//!
//! ## Structure
//! - 4 bytes: tag naming the compression scheme, three ASCII letters and a nul
//! - Little Endian u32: Decompressed length
//! - Compressed data in the named scheme
//!
//! Data without a known tag is stored as is. Only [CompressionType::RefPack]
//! has a codec here; the other schemes are recognized so they can be reported,
//! but compressing or decompressing them is an error.

use std::fmt::{Display, Formatter};
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{error, warn};

use crate::data::compression::max_compressed_size as refpack_max_compressed_size;
use crate::{easy_compress, easy_decompress, CompressionOptions, RefPackError, RefPackResult};

/// Length of the tag and decompressed length in front of tagged data
pub const OUTER_HEADER_LEN: usize = 8;

/// Compression schemes a tag can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionType {
    /// Untagged data
    None,
    /// `EAR\0`
    RefPack,
    /// `NOX\0`, LZH light
    NoxLzh,
    /// `ZL1\0` through `ZL9\0`, carrying the deflate level
    ZLib(u8),
    /// `EAB\0`
    BTree,
    /// `EAH\0`
    Huff,
}

impl CompressionType {
    /// The four tag bytes written in front of data of this type. `None` for
    /// untagged data, or a zlib level out of `1..=9`.
    #[must_use]
    pub fn tag(self) -> Option<[u8; 4]> {
        match self {
            CompressionType::None => None,
            CompressionType::RefPack => Some(*b"EAR\0"),
            CompressionType::NoxLzh => Some(*b"NOX\0"),
            CompressionType::ZLib(level @ 1..=9) => Some([b'Z', b'L', b'0' + level, 0]),
            CompressionType::ZLib(_) => None,
            CompressionType::BTree => Some(*b"EAB\0"),
            CompressionType::Huff => Some(*b"EAH\0"),
        }
    }

    fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"EAR\0" => CompressionType::RefPack,
            b"NOX\0" => CompressionType::NoxLzh,
            b"EAB\0" => CompressionType::BTree,
            b"EAH\0" => CompressionType::Huff,
            [b'Z', b'L', level @ b'1'..=b'9', 0] => CompressionType::ZLib(level - b'0'),
            _ => CompressionType::None,
        }
    }

    /// Human readable name of the scheme
    #[must_use]
    pub fn name(self) -> &'static str {
        const ZLIB_NAMES: [&str; 9] = [
            "ZLib 1", "ZLib 2", "ZLib 3", "ZLib 4", "ZLib 5", "ZLib 6", "ZLib 7", "ZLib 8",
            "ZLib 9",
        ];
        match self {
            CompressionType::None => "No compression",
            CompressionType::RefPack => "RefPack",
            CompressionType::NoxLzh => "LZH light",
            CompressionType::ZLib(level @ 1..=9) => ZLIB_NAMES[level as usize - 1],
            CompressionType::ZLib(_) => "ZLib",
            CompressionType::BTree => "BTree",
            CompressionType::Huff => "Huffman",
        }
    }
}

impl Display for CompressionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies the scheme named by the tag at the start of `data`.
///
/// Anything shorter than [OUTER_HEADER_LEN] is never tagged.
#[must_use]
pub fn compression_type(data: &[u8]) -> CompressionType {
    match data {
        [a, b, c, d, _, _, _, _, ..] => CompressionType::from_tag([*a, *b, *c, *d]),
        _ => CompressionType::None,
    }
}

/// Whether `data` starts with a known compression tag
#[must_use]
pub fn is_compressed(data: &[u8]) -> bool {
    compression_type(data) != CompressionType::None
}

/// The decompressed length recorded in the outer header, or the length of
/// `data` itself when it is not tagged
#[must_use]
pub fn uncompressed_size(data: &[u8]) -> usize {
    if is_compressed(data) {
        let mut reader = Cursor::new(&data[4..OUTER_HEADER_LEN]);
        // four bytes are always there after a tag match
        reader
            .read_u32::<LittleEndian>()
            .map_or(data.len(), |size| size as usize)
    } else {
        data.len()
    }
}

fn unsupported(kind: CompressionType) -> RefPackError {
    error!("Unhandled compression type `{kind}`");
    RefPackError::UnsupportedCompression(kind)
}

/// Upper bound on the output of [compress] for `length` bytes of input
///
/// # Errors
/// [RefPackError::UnsupportedCompression] for schemes without a codec
pub fn max_compressed_size(kind: CompressionType, length: usize) -> RefPackResult<usize> {
    match kind {
        CompressionType::None => Ok(length),
        CompressionType::RefPack => Ok(OUTER_HEADER_LEN + refpack_max_compressed_size(length)),
        other => Err(unsupported(other)),
    }
}

/// Compresses `data` and wraps it in a tagged container.
///
/// [CompressionType::None] returns `data` unchanged.
///
/// # Errors
/// - [RefPackError::UnsupportedCompression]: scheme without a codec
/// - [RefPackError::InputTooLarge]: `data` is longer than `u32::MAX` bytes
pub fn compress(
    kind: CompressionType,
    data: &[u8],
    options: CompressionOptions,
) -> RefPackResult<Vec<u8>> {
    match kind {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::RefPack => {
            let length =
                u32::try_from(data.len()).map_err(|_| RefPackError::InputTooLarge(data.len()))?;
            let compressed = easy_compress(data, options)?;

            let mut out = Vec::with_capacity(OUTER_HEADER_LEN + compressed.len());
            out.extend_from_slice(b"EAR\0");
            out.write_u32::<LittleEndian>(length)?;
            out.extend_from_slice(&compressed);
            Ok(out)
        }
        other => Err(unsupported(other)),
    }
}

/// Unwraps and decompresses tagged data. Untagged data is returned unchanged.
///
/// # Errors
/// - [RefPackError::UnsupportedCompression]: tag names a scheme without a
///   codec
/// - any error from [easy_decompress] for RefPack data
pub fn decompress(data: &[u8]) -> RefPackResult<Vec<u8>> {
    match compression_type(data) {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::RefPack => {
            let decompressed = easy_decompress(&data[OUTER_HEADER_LEN..])?;
            let expected = uncompressed_size(data);
            if decompressed.len() != expected {
                warn!(
                    "RefPack data decompressed to {} bytes, container says {expected}",
                    decompressed.len()
                );
            }
            Ok(decompressed)
        }
        other => Err(unsupported(other)),
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn recognizes_tags() {
        let cases: [(&[u8; 8], CompressionType); 7] = [
            (b"EAR\0\0\0\0\0", CompressionType::RefPack),
            (b"NOX\0\0\0\0\0", CompressionType::NoxLzh),
            (b"ZL1\0\0\0\0\0", CompressionType::ZLib(1)),
            (b"ZL9\0\0\0\0\0", CompressionType::ZLib(9)),
            (b"EAB\0\0\0\0\0", CompressionType::BTree),
            (b"EAH\0\0\0\0\0", CompressionType::Huff),
            (b"ZL0\0\0\0\0\0", CompressionType::None),
        ];
        for (data, expected) in cases {
            assert_eq!(compression_type(data), expected);
        }
    }

    #[test]
    fn short_data_is_never_tagged() {
        assert_eq!(compression_type(b"EAR\0\0\0\0"), CompressionType::None);
        assert_eq!(uncompressed_size(b"EAR\0"), 4);
    }

    #[test]
    fn tags_round_trip() {
        for kind in [
            CompressionType::RefPack,
            CompressionType::NoxLzh,
            CompressionType::ZLib(5),
            CompressionType::BTree,
            CompressionType::Huff,
        ] {
            let tag = kind.tag().unwrap();
            assert_eq!(CompressionType::from_tag(tag), kind);
        }
        assert_eq!(CompressionType::None.tag(), None);
        assert_eq!(CompressionType::ZLib(10).tag(), None);
    }

    #[test]
    fn names() {
        assert_eq!(CompressionType::ZLib(3).to_string(), "ZLib 3");
        assert_eq!(CompressionType::RefPack.to_string(), "RefPack");
        assert_eq!(CompressionType::None.to_string(), "No compression");
    }

    #[test]
    fn refpack_container_layout() {
        let data = b"container container container";
        let out = compress(CompressionType::RefPack, data, CompressionOptions::Thorough).unwrap();

        assert_eq!(&out[..4], b"EAR\0");
        assert_eq!(&out[4..8], &(data.len() as u32).to_le_bytes());
        assert_eq!(&out[8..10], &[0x10, 0xFB]);
        assert_eq!(uncompressed_size(&out), data.len());
        assert!(is_compressed(&out));
    }

    #[proptest]
    fn symmetrical_container(input: Vec<u8>, options: CompressionOptions) {
        let out = compress(CompressionType::RefPack, &input, options).unwrap();
        prop_assert!(
            out.len() <= max_compressed_size(CompressionType::RefPack, input.len()).unwrap()
        );
        prop_assert_eq!(decompress(&out).unwrap(), input);
    }

    #[test]
    fn untagged_data_passes_through() {
        let data = b"plain";
        assert_eq!(
            compress(CompressionType::None, data, CompressionOptions::Quick).unwrap(),
            data
        );
        assert_eq!(decompress(data).unwrap(), data);
        assert_eq!(uncompressed_size(data), 5);
        assert!(!is_compressed(data));
    }

    #[test]
    fn unsupported_types_error() {
        let error = decompress(b"ZL5\0\x10\0\0\0xxxx").unwrap_err();
        assert!(matches!(
            error,
            RefPackError::UnsupportedCompression(CompressionType::ZLib(5))
        ));

        let error = compress(CompressionType::Huff, b"abc", CompressionOptions::Quick).unwrap_err();
        assert_eq!(error.to_string(), "Unsupported compression type `Huffman`");

        assert!(max_compressed_size(CompressionType::NoxLzh, 10).is_err());
    }
}
