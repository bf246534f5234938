////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use std::cmp::min;

use crate::data::compression::prefix_search::HASH_TABLE_SIZE;

/// Size of the ring of back links. Since it's a power of two the slot for a
/// position is just its low 17 bits.
pub(crate) const LINK_TABLE_SIZE: usize = 1 << 17;

const LINK_MASK: usize = LINK_TABLE_SIZE - 1;

/// Furthest back a chain is followed from the current position.
/// One less than the ring so a live link slot is never overwritten.
pub(crate) const MAX_SEARCH_DISTANCE: usize = LINK_TABLE_SIZE - 1;

const EMPTY: u32 = u32::MAX;

/// Chained hash table of previously seen positions.
///
/// `heads` holds the most recent position for every hash value and `links`
/// holds, for every position, the previous position with the same hash.
/// Positions are stored as u32, so the input can't be longer than
/// `u32::MAX` bytes.
pub(crate) struct HashChain {
    heads: Vec<u32>,
    links: Vec<u32>,
}

impl HashChain {
    pub fn new(bytes: usize) -> Self {
        Self {
            heads: vec![EMPTY; HASH_TABLE_SIZE],
            links: vec![EMPTY; min(bytes, LINK_TABLE_SIZE)],
        }
    }

    /// Record `position` as the newest position for `hash`
    #[inline(always)]
    pub fn insert(&mut self, hash: usize, position: usize) {
        self.links[position & LINK_MASK] = self.heads[hash];
        self.heads[hash] = position as u32;
    }

    /// Positions previously inserted with `hash`, newest first, stopping at
    /// the first one more than [MAX_SEARCH_DISTANCE] bytes behind `position`
    #[inline(always)]
    pub fn candidates(&self, hash: usize, position: usize) -> HashChainIter<'_> {
        HashChainIter {
            links: &self.links,
            cur_position: self.heads[hash],
            min_position: position.saturating_sub(MAX_SEARCH_DISTANCE),
        }
    }
}

pub(crate) struct HashChainIter<'a> {
    links: &'a [u32],
    cur_position: u32,
    min_position: usize,
}

impl Iterator for HashChainIter<'_> {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_position == EMPTY || (self.cur_position as usize) < self.min_position {
            return None;
        }
        let position = self.cur_position as usize;
        self.cur_position = self.links[position & LINK_MASK];
        Some(position)
    }
}
