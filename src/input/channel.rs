/*
 *  input/channel.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Encoder acquisition channels shared between the poll thread and the
 *  control panel scan
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::sync::{Mutex, MutexGuard, PoisonError};

use arrayvec::ArrayVec;

use super::ENCODER_COUNT;
use super::quadrature::BitPair;

/// Pairs held between two drains, seed included.
pub const LOG_CAPACITY: usize = 32;

pub type PairLog = ArrayVec<BitPair, LOG_CAPACITY>;

/// What a producer-side push did to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Same levels as last time, nothing recorded
    Unchanged,
    /// First sample ever, recorded as the seed
    Seeded,
    /// New pair appended
    Appended,
    /// Log was full: oldest pair dropped. Reported once per drain period.
    Overflowed,
}

/// Result of a consumer-side drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drained {
    /// Previous seed followed by every pair pushed since, oldest first
    pub pairs: PairLog,
    /// Pairs lost to overflow since the previous drain
    pub dropped: usize,
}

#[derive(Debug, Default)]
struct ChannelLog {
    pairs: PairLog,
    last: Option<BitPair>,
    dropped: usize,
}

/// Bounded append log of sampled line pairs for one rotary encoder.
///
/// The poll thread pushes, the scan cycle drains. Both sides only copy a
/// handful of bytes while holding the lock.
#[derive(Debug, Default)]
pub struct EncoderChannel {
    log: Mutex<ChannelLog>,
}

impl EncoderChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChannelLog> {
        // a panicking holder cannot leave the log half-written
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the current line levels if they differ from the last pair.
    pub fn push(&self, a: bool, b: bool) -> PushOutcome {
        let pair = BitPair::new(a, b);
        let mut log = self.lock();

        match log.last {
            Some(last) if last == pair => PushOutcome::Unchanged,
            None => {
                log.pairs.push(pair);
                log.last = Some(pair);
                PushOutcome::Seeded
            }
            Some(_) => {
                let mut outcome = PushOutcome::Appended;
                if log.pairs.is_full() {
                    log.pairs.remove(0);
                    log.dropped += 1;
                    if log.dropped == 1 {
                        outcome = PushOutcome::Overflowed;
                    }
                }
                log.pairs.push(pair);
                log.last = Some(pair);
                outcome
            }
        }
    }

    /// Take everything recorded so far. The newest pair is kept as the seed
    /// for the next drain so no transition is lost between batches.
    pub fn drain_and_reset(&self) -> Drained {
        let mut log = self.lock();
        let pairs = log.pairs.clone();
        log.pairs.clear();
        if let Some(last) = log.last {
            log.pairs.push(last);
        }
        let dropped = std::mem::take(&mut log.dropped);
        Drained { pairs, dropped }
    }

    /// Most recent line levels, if anything was ever sampled
    pub fn last_levels(&self) -> Option<(bool, bool)> {
        self.lock().last.map(|p| (p.a(), p.b()))
    }

    /// Number of pairs waiting behind the seed
    pub fn pending(&self) -> usize {
        self.lock().pairs.len().saturating_sub(1)
    }
}

/// The three encoder channels, shared behind an `Arc` by both threads.
#[derive(Debug, Default)]
pub struct EncoderBank {
    channels: [EncoderChannel; ENCODER_COUNT],
}

impl EncoderBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, index: usize) -> Option<&EncoderChannel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[EncoderChannel; ENCODER_COUNT] {
        &self.channels
    }

    /// Push one sample per encoder, in encoder order.
    pub fn push_levels(&self, levels: &[(bool, bool); ENCODER_COUNT]) -> [PushOutcome; ENCODER_COUNT] {
        let mut outcomes = [PushOutcome::Unchanged; ENCODER_COUNT];
        for ((channel, &(a, b)), outcome) in self.channels.iter().zip(levels).zip(outcomes.iter_mut()) {
            *outcome = channel.push(a, b);
        }
        outcomes
    }
}
