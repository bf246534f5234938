////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

/// find the length of common bytes between two positions in a buffer, up to
/// `max_len`.
///
/// `matched_pos` is before `source`; the two ranges are allowed to overlap.
///
/// # Panics
/// Panics if `source + max_len` is past the end of `buffer`
#[inline]
pub fn match_length(buffer: &[u8], source: usize, matched_pos: usize, max_len: usize) -> usize {
    debug_assert!(matched_pos < source);

    buffer[source..source + max_len]
        .iter()
        .zip(&buffer[matched_pos..])
        .take_while(|(a, b)| a == b)
        .count()
}
