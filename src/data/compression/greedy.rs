////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use std::cmp::min;
use std::io::Write;

use crate::data::compression::match_length::match_length;
use crate::data::compression::prefix_search::hash;
use crate::data::compression::prefix_search::hash_chain::HashChain;
use crate::data::control::{Command, LITERAL_MAX, LONG_LENGTH_MAX};
use crate::RefPackResult;

/// Number of bytes at the end of the input that are never covered by a copy
/// and always go out as literals
const TAIL_LENGTH: usize = 4;

/// Count of each kind of command written by one encoding run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    pub literal: usize,
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}

#[derive(Debug, Clone, Copy)]
struct Match {
    offset: usize,
    length: usize,
    cost: usize,
}

impl Match {
    // anything at or below this length is never worth a command
    const NONE: Match = Match {
        offset: 0,
        length: 2,
        cost: 2,
    };

    fn is_worthwhile(self) -> bool {
        self.length > self.cost
    }

    /// a match replaces the current best when it saves more bytes, where the
    /// saving is its length minus the command bytes it costs
    fn saves_more_than(self, other: Match) -> bool {
        self.length + other.cost > other.length + self.cost
    }
}

/// Writes every multiple of 4 at the front of `literals` as literal commands
/// of at most [LITERAL_MAX] bytes, returning the 0..=3 bytes left over
fn write_literal_blocks<'a>(
    literals: &'a [u8],
    writer: &mut impl Write,
    stats: &mut EncodeStats,
) -> RefPackResult<&'a [u8]> {
    let split_point = literals.len() - (literals.len() % 4);
    for block in literals[..split_point].chunks(LITERAL_MAX as usize) {
        Command::new_literal(block.len() as u8).write(writer)?;
        writer.write_all(block)?;
        stats.literal += 1;
    }
    Ok(&literals[split_point..])
}

fn find_match(input: &[u8], position: usize, hash: usize, chain: &HashChain) -> Match {
    let max_len = min(
        input.len() - position - TAIL_LENGTH,
        LONG_LENGTH_MAX as usize,
    );
    let mut best = Match::NONE;

    for candidate in chain.candidates(hash, position) {
        // cheap rejection: anything longer than the best has to match here
        if input[position + best.length] != input[candidate + best.length] {
            continue;
        }
        let length = match_length(input, position, candidate, max_len);
        if length <= best.length {
            continue;
        }
        let offset = position - candidate;
        let found = Match {
            offset,
            length,
            cost: Command::copy_cost(offset, length),
        };
        if found.saves_more_than(best) {
            best = found;
            if best.length >= LONG_LENGTH_MAX as usize {
                break;
            }
        }
    }

    best
}

/// Compresses `input` into a stream of commands written to `writer`. Does not
/// write a header.
///
/// Scans forward one byte at a time, looking up earlier occurrences of the
/// next three bytes in a hash chain and taking the candidate that saves the
/// most bytes. Unmatched bytes collect into a run of literals that is written
/// right before the next copy, with up to 3 of them folded into the copy
/// command itself.
///
/// With `quick` only the first position of each match is added to the hash
/// chain, which is faster but finds fewer matches later on.
pub(crate) fn encode(
    input: &[u8],
    quick: bool,
    writer: &mut impl Write,
) -> RefPackResult<EncodeStats> {
    let mut stats = EncodeStats::default();
    let mut chain = HashChain::new(input.len());

    let mut position = 0;
    let mut literal_start = 0;

    while position + TAIL_LENGTH <= input.len() {
        let key = hash(&input[position..]);
        let best = find_match(input, position, key, &chain);

        if !best.is_worthwhile() || input.len() - position < TAIL_LENGTH * 2 {
            chain.insert(key, position);
            position += 1;
            continue;
        }

        let remainder =
            write_literal_blocks(&input[literal_start..position], writer, &mut stats)?;
        let command = Command::new(
            best.offset as u32,
            best.length as u16,
            remainder.len() as u8,
        );
        command.write(writer)?;
        writer.write_all(remainder)?;
        match command {
            Command::Short { .. } => stats.short += 1,
            Command::Medium { .. } => stats.medium += 1,
            _ => stats.long += 1,
        }

        if quick {
            chain.insert(key, position);
            position += best.length;
        } else {
            for _ in 0..best.length {
                chain.insert(hash(&input[position..]), position);
                position += 1;
            }
        }
        literal_start = position;
    }

    let remainder = write_literal_blocks(&input[literal_start..], writer, &mut stats)?;
    Command::new_stop(remainder.len()).write(writer)?;
    writer.write_all(remainder)?;

    Ok(stats)
}
