////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! A library for compressing and decompressing data in the RefPack format
//! used by the SAGE engine, along with the tagged container the engine wraps
//! compressed blobs in.
//!
//! RefPack is an LZ77 style format: a short header giving the decompressed
//! length, followed by a stream of byte-aligned commands that either copy
//! literal bytes from the input or repeat bytes already written to the output.
//!
//! # Usage
//!
//! ```
//! use sage_refpack::{easy_compress, easy_decompress, CompressionOptions};
//!
//! let input = b"To be or not to be, that is the question. To be or not to be.";
//! let compressed = easy_compress(input, CompressionOptions::Thorough).unwrap();
//! assert!(compressed.len() < input.len());
//!
//! let decompressed = easy_decompress(&compressed).unwrap();
//! assert_eq!(decompressed, input);
//! ```
//!
//! Tagged data can be handled without knowing up front whether it is
//! compressed:
//!
//! ```
//! use sage_refpack::manager::{self, CompressionType};
//! use sage_refpack::CompressionOptions;
//!
//! let wrapped = manager::compress(CompressionType::RefPack, b"data data data data", CompressionOptions::Quick).unwrap();
//! assert_eq!(manager::compression_type(&wrapped), CompressionType::RefPack);
//! assert_eq!(manager::decompress(&wrapped).unwrap(), b"data data data data");
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [log](https://docs.rs/log) facade and are
//! silent unless the application installs a logger.

#![warn(clippy::pedantic, clippy::cargo)]
// Due to the high amount of byte conversions, sometimes intentional lossy conversions are necessary.
#![allow(clippy::cast_possible_truncation)]
// Default::default() is more idiomatic imo
#![allow(clippy::default_trait_access)]
// too many lines is a dumb metric
#![allow(clippy::too_many_lines)]

pub mod data;
mod error;
pub mod header;
pub mod manager;

pub use crate::data::compression::{
    compress,
    easy_compress,
    max_compressed_size,
    CompressionOptions,
    EncodeStats,
};
pub use crate::data::decompression::{
    decompress,
    decompress_into,
    easy_decompress,
    easy_decompress_sized,
    Sizes,
};
pub use crate::error::{Error as RefPackError, Result as RefPackResult};
