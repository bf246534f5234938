////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

pub(crate) mod hash_chain;

/// Number of distinct values [hash] can produce
pub(crate) const HASH_TABLE_SIZE: usize = 1 << 16;

/// Hash of the three bytes at the start of `input_buf`.
///
/// Byte 0 lands in the high byte, byte 2 in the low byte and byte 1 is folded
/// over the middle, which always stays below [HASH_TABLE_SIZE].
///
/// # Panics
/// Panics if `input_buf` is shorter than 3 bytes
#[inline(always)]
pub(crate) fn hash(input_buf: &[u8]) -> usize {
    let buf: &[u8] = &input_buf[..3];
    ((usize::from(buf[0]) << 8) | usize::from(buf[2])) ^ (usize::from(buf[1]) << 4)
}

#[cfg(test)]
mod test {
    use proptest::prop_assert;
    use test_strategy::proptest;

    use super::*;

    #[proptest]
    fn hash_fits_table(a: u8, b: u8, c: u8) {
        prop_assert!(hash(&[a, b, c]) < HASH_TABLE_SIZE);
    }

    #[test]
    fn hash_folds_middle_byte() {
        assert_eq!(hash(&[0x12, 0x34, 0x56]), 0x1256 ^ 0x0340);
        assert_eq!(hash(&[0, 0, 0, 0xFF]), 0);
        assert_eq!(hash(&[0xFF, 0xFF, 0xFF]), 0xFFFF ^ 0x0FF0);
    }
}
