/*
 *  input/poller.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Free-running encoder poll thread
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

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::channel::{EncoderBank, PushOutcome};
use super::lines::BoxedLines;
use crate::error::HardwareError;

/// 400 Hz
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(2_500);

/// Sample errors between two repeated warnings
const ERROR_LOG_EVERY: u64 = 1_000;

/// What the poll thread did before it exited
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    /// False when the line handle could not be opened
    pub started: bool,
    pub iterations: u64,
    pub sample_errors: u64,
    pub overflows: u64,
}

/// Owner handle for the encoder poll thread.
///
/// Dropping the handle stops and joins the thread.
pub struct InputPoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<PollSummary>>,
    interval: Duration,
}

impl InputPoller {
    /// Start polling. `open` runs on the new thread; if it fails the
    /// thread logs and exits, leaving every encoder at zero delta.
    pub fn spawn<F>(bank: Arc<EncoderBank>, interval: Duration, open: F) -> io::Result<Self>
    where
        F: FnOnce() -> Result<BoxedLines, HardwareError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("encoder-poll".into())
            .spawn(move || match open() {
                Ok(lines) => poll_loop(&bank, interval, lines, &flag),
                Err(e) => {
                    error!("Encoder lines unavailable, rotary input disabled: {}", e);
                    PollSummary::default()
                }
            })?;

        info!("Encoder poll thread started ({:?} interval)", interval);
        Ok(Self {
            stop,
            handle: Some(handle),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True until the thread has exited (stopped or failed to start)
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Raise the stop flag and join. Returns within about one interval.
    pub fn stop(&mut self) -> Option<PollSummary> {
        self.stop.store(true, Ordering::Release);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(summary) => {
                info!(
                    "Encoder poll thread stopped after {} iterations ({} sample errors, {} overflows)",
                    summary.iterations, summary.sample_errors, summary.overflows
                );
                Some(summary)
            }
            Err(_) => {
                error!("Encoder poll thread panicked");
                None
            }
        }
    }
}

impl Drop for InputPoller {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn poll_loop(bank: &EncoderBank, interval: Duration, mut lines: BoxedLines, stop: &AtomicBool) -> PollSummary {
    let mut summary = PollSummary {
        started: true,
        ..Default::default()
    };
    let mut next_deadline = Instant::now();

    while !stop.load(Ordering::Acquire) {
        summary.iterations += 1;

        match lines.sample() {
            Ok(levels) => {
                for (index, outcome) in bank.push_levels(&levels).iter().enumerate() {
                    if *outcome == PushOutcome::Overflowed {
                        summary.overflows += 1;
                        warn!("Encoder {} log full, dropping oldest transitions", index);
                    }
                }
            }
            Err(e) => {
                summary.sample_errors += 1;
                if summary.sample_errors == 1 || summary.sample_errors % ERROR_LOG_EVERY == 0 {
                    warn!("Encoder sample failed ({} so far): {}", summary.sample_errors, e);
                }
            }
        }

        next_deadline += interval;
        let now = Instant::now();
        if next_deadline > now {
            spin_sleep::sleep(next_deadline - now);
        } else {
            // fell behind, don't try to catch up with a burst
            debug!("Encoder poll late by {:?}", now - next_deadline);
            next_deadline = now;
        }
    }

    summary
}
