/*
 *  pacer.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Tick budget: fixed or tempo derived period, overrun accounting
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

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 32 ticks per beat: 60 s / bpm / 32, in microseconds
const TEMPO_NUMERATOR_US: u64 = 1_875_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickMode {
    #[default]
    Fixed,
    Tempo,
}

/// Tick period for a tempo. Zero bpm has no period.
pub fn period_for_tempo(bpm: u32) -> Option<Duration> {
    if bpm == 0 {
        return None;
    }
    Some(Duration::from_micros(TEMPO_NUMERATOR_US / bpm as u64))
}

/// What to do with the rest of the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Finished early; sleep this long
    Sleep(Duration),
    /// Ran past the period by this much; start the next tick at once
    Overrun(Duration),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
    pub worst: Duration,
    /// moving avg of busy time
    pub ema_us: f32,
}

pub struct Pacer {
    mode: TickMode,
    period: Duration,
    bpm: Option<u32>,
    stats: TickStats,
    alpha: f32,      // smoothing (0.1 ~ 0.3)
}

impl Pacer {
    pub fn fixed(period: Duration) -> Self {
        Self {
            mode: TickMode::Fixed,
            period,
            bpm: None,
            stats: TickStats::default(),
            alpha: 0.2,
        }
    }

    /// Tempo mode starting at `bpm`; zero falls back to the default tick
    pub fn tempo(bpm: u32) -> Self {
        let mut pacer = Self::fixed(Duration::from_millis(crate::config::DEFAULT_TICK_MS));
        pacer.mode = TickMode::Tempo;
        pacer.retune(Some(bpm));
        pacer
    }

    pub fn mode(&self) -> TickMode {
        self.mode
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn bpm(&self) -> Option<u32> {
        self.bpm
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Account for one tick that was busy for `elapsed`.
    #[inline]
    pub fn settle(&mut self, elapsed: Duration) -> TickOutcome {
        let us = elapsed.as_micros() as f32;
        self.stats.ema_us = if self.stats.ticks == 0 {
            us
        } else {
            self.alpha * us + (1.0 - self.alpha) * self.stats.ema_us
        };
        self.stats.ticks += 1;
        self.stats.worst = self.stats.worst.max(elapsed);

        match self.period.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => TickOutcome::Sleep(remaining),
            _ => {
                self.stats.overruns += 1;
                TickOutcome::Overrun(elapsed - self.period)
            }
        }
    }

    /// Follow the application's tempo. Only tempo mode retunes, and a
    /// missing or zero bpm keeps the current period. Returns whether the
    /// period changed.
    pub fn retune(&mut self, bpm: Option<u32>) -> bool {
        if self.mode != TickMode::Tempo {
            return false;
        }
        let Some(bpm) = bpm else { return false };
        let Some(period) = period_for_tempo(bpm) else { return false };
        self.bpm = Some(bpm);
        if period == self.period {
            return false;
        }
        self.period = period;
        true
    }
}

/// How the scheduler waits out the rest of a tick
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

/// Spin-assisted sleep for sub-millisecond accuracy
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinSleeper;

impl Sleeper for SpinSleeper {
    fn sleep(&mut self, duration: Duration) {
        spin_sleep::sleep(duration);
    }
}

/// Records requested sleeps without sleeping
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_periods() {
        assert_eq!(period_for_tempo(120), Some(Duration::from_micros(15_625)));
        assert_eq!(period_for_tempo(60), Some(Duration::from_micros(31_250)));
        assert_eq!(period_for_tempo(0), None);
    }

    #[test]
    fn test_settle_sleeps_remaining() {
        let mut pacer = Pacer::fixed(Duration::from_millis(20));
        let outcome = pacer.settle(Duration::from_millis(5));
        assert_eq!(outcome, TickOutcome::Sleep(Duration::from_millis(15)));
        assert_eq!(pacer.stats().overruns, 0);
    }

    #[test]
    fn test_settle_counts_overruns() {
        let mut pacer = Pacer::fixed(Duration::from_millis(20));
        assert_eq!(
            pacer.settle(Duration::from_millis(23)),
            TickOutcome::Overrun(Duration::from_millis(3))
        );
        // exactly on budget leaves nothing to sleep
        assert_eq!(pacer.settle(Duration::from_millis(20)), TickOutcome::Overrun(Duration::ZERO));
        assert_eq!(pacer.stats().overruns, 2);
        assert_eq!(pacer.stats().worst, Duration::from_millis(23));
    }

    #[test]
    fn test_ema_tracks_elapsed() {
        let mut pacer = Pacer::fixed(Duration::from_millis(20));
        pacer.settle(Duration::from_micros(1000));
        assert_eq!(pacer.stats().ema_us, 1000.0);
        pacer.settle(Duration::from_micros(2000));
        assert!((pacer.stats().ema_us - 1200.0).abs() < 0.01);
    }

    #[test]
    fn test_retune_only_in_tempo_mode() {
        let mut fixed = Pacer::fixed(Duration::from_millis(20));
        assert!(!fixed.retune(Some(60)));
        assert_eq!(fixed.period(), Duration::from_millis(20));

        let mut tempo = Pacer::tempo(120);
        assert_eq!(tempo.period(), Duration::from_micros(15_625));
        assert!(tempo.retune(Some(60)));
        assert_eq!(tempo.period(), Duration::from_micros(31_250));
        assert!(!tempo.retune(Some(60)));
        assert!(!tempo.retune(None));
        assert!(!tempo.retune(Some(0)));
        assert_eq!(tempo.bpm(), Some(60));
    }

    #[test]
    fn test_recording_sleeper() {
        let sleeper = RecordingSleeper::new();
        let mut handle = sleeper.clone();
        handle.sleep(Duration::from_millis(3));
        assert_eq!(sleeper.slept(), vec![Duration::from_millis(3)]);
    }
}
