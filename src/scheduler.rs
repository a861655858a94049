/*
 *  scheduler.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Real-time tick loop: scan, listen, update, commit, sleep
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::{Application, DisplayStrategy, PanelListener, Transition};
use crate::config::DEFAULT_STATS_SECS;
use crate::display::{CommitReport, DisplayManager};
use crate::func_timer::PhaseTimer;
use crate::input::{ControlPanel, EncoderBank, InputPoller, PanelScanner};
use crate::pacer::{Pacer, Sleeper, SpinSleeper, TickMode, TickOutcome};

/// Overruns between repeated warnings
const OVERRUN_LOG_EVERY: u64 = 100;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Busy time from tick start through the display commit
    pub elapsed: Duration,
    pub outcome: TickOutcome,
    pub commit: CommitReport,
    /// The tempo changed the period for the next tick
    pub retuned: bool,
}

/// Owns the model and every piece of cabinet I/O for one run.
///
/// Each tick scans the panel, hands it to the listener, advances the
/// model, commits the displays and sleeps out the rest of the period.
pub struct Runtime<M: Application> {
    model: M,
    listener: Option<Box<dyn PanelListener<M>>>,
    strategy: Box<dyn DisplayStrategy<M>>,
    scanner: PanelScanner,
    // dropped before the displays: the poll thread is joined first
    poller: Option<InputPoller>,
    display: DisplayManager,
    pacer: Pacer,
    sleeper: Box<dyn Sleeper>,
    tick: u64,
    stats_interval: Duration,
    last_stats: Instant,
}

impl<M: Application> Runtime<M> {
    /// Takes the startup key-scan read so the panel begins at the
    /// physical switch positions.
    pub fn new(
        model: M,
        strategy: Box<dyn DisplayStrategy<M>>,
        mut display: DisplayManager,
        encoders: Arc<EncoderBank>,
        pacer: Pacer,
    ) -> Self {
        let initial = match display.read_key_scan() {
            Ok(scan) => Some(scan),
            Err(e) => {
                warn!("Initial key scan failed, panel starts released: {}", e);
                None
            }
        };
        Self {
            model,
            listener: None,
            strategy,
            scanner: PanelScanner::new(encoders, initial),
            display,
            poller: None,
            pacer,
            sleeper: Box::new(SpinSleeper),
            tick: 0,
            stats_interval: Duration::from_secs(DEFAULT_STATS_SECS),
            last_stats: Instant::now(),
        }
    }

    pub fn with_poller(mut self, poller: InputPoller) -> Self {
        self.poller = Some(poller);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn PanelListener<M>>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Takes effect at the next tick boundary
    pub fn set_listener(&mut self, listener: Option<Box<dyn PanelListener<M>>>) {
        self.listener = listener;
    }

    /// Takes effect at the next commit
    pub fn set_strategy(&mut self, strategy: Box<dyn DisplayStrategy<M>>) {
        self.strategy = strategy;
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn panel(&self) -> &ControlPanel {
        self.scanner.panel()
    }

    /// Ticks completed
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display
    }

    /// Run one full tick, sleep included
    pub fn run_tick(&mut self) -> TickReport {
        let tick = self.tick;
        let start = Instant::now();

        {
            let _t = PhaseTimer::new("scan", tick);
            let read = self.display.read_key_scan();
            self.scanner.scan(read);
        }

        {
            let _t = PhaseTimer::new("update", tick);
            let panel = *self.scanner.panel();
            let transition = match self.listener.as_mut() {
                Some(listener) => listener.on_panel(&panel, &mut self.model),
                None => Transition::Stay,
            };
            self.apply(transition);
            self.model.update(tick);
        }

        let commit = {
            let _t = PhaseTimer::new("commit", tick);
            self.display.commit(self.strategy.as_ref(), &self.model, tick)
        };

        let elapsed = start.elapsed();
        let outcome = self.pacer.settle(elapsed);
        match outcome {
            TickOutcome::Sleep(remaining) => self.sleeper.sleep(remaining),
            TickOutcome::Overrun(late) => {
                let overruns = self.pacer.stats().overruns;
                if overruns == 1 || overruns % OVERRUN_LOG_EVERY == 0 {
                    warn!(
                        "Tick {} overran its {:?} budget by {:?} ({} overruns)",
                        tick,
                        self.pacer.period(),
                        late,
                        overruns
                    );
                }
            }
        }

        let retuned = self.pacer.mode() == TickMode::Tempo && self.pacer.retune(self.model.tempo_bpm());
        if retuned {
            debug!("Tempo now {:?} bpm, period {:?}", self.pacer.bpm(), self.pacer.period());
        }

        self.tick += 1;
        self.maybe_log_stats();

        TickReport {
            tick,
            elapsed,
            outcome,
            commit,
            retuned,
        }
    }

    fn apply(&mut self, transition: Transition<M>) {
        match transition {
            Transition::Stay => {}
            Transition::Listener(listener) => self.listener = Some(listener),
            Transition::Strategy(strategy) => self.strategy = strategy,
            Transition::Both(listener, strategy) => {
                self.listener = Some(listener);
                self.strategy = strategy;
            }
        }
    }

    fn maybe_log_stats(&mut self) {
        if self.last_stats.elapsed() < self.stats_interval {
            return;
        }
        let stats = self.pacer.stats();
        info!(
            "{} ticks at {:?}: avg {:.0}us, worst {:?}, {} overruns, {} key scan failures",
            stats.ticks,
            self.pacer.period(),
            stats.ema_us,
            stats.worst,
            stats.overruns,
            self.scanner.read_failures()
        );
        self.last_stats = Instant::now();
    }

    /// Tick until `running` is cleared. Returns the ticks completed.
    pub fn run(&mut self, running: &AtomicBool) -> u64 {
        info!(
            "Scheduler running in {:?} mode, period {:?}",
            self.pacer.mode(),
            self.pacer.period()
        );
        while running.load(Ordering::Acquire) {
            self.run_tick();
        }
        info!("Scheduler stopped after {} ticks", self.tick);
        self.tick
    }

    /// Stop the poll thread, blank and release the chips, and hand the
    /// model back.
    pub fn shutdown(mut self) -> M {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        self.display.shutdown();
        self.model
    }
}
