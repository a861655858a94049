/*
 *  display/manager.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Owns the display chips and commits surfaces once per tick
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

use log::{debug, info, warn};

use crate::app::DisplayStrategy;
use crate::display::error::DisplayError;
use crate::display::mirror::ChipMirror;
use crate::display::render::{render_alpha, render_leds};
use crate::display::surface::{DisplaySurface, MAX_BRIGHTNESS, SurfaceSlot};
use crate::display::traits::BoxedChip;
use crate::error::HardwareError;
use crate::input::KeyScan;

/// Consecutive failures between repeated warnings for one chip
const FAILURE_LOG_EVERY: u64 = 500;

struct AttachedChip {
    slot: SurfaceSlot,
    chip: BoxedChip,
    mirror: ChipMirror,
    initialized: bool,
    failures: u64,
}

/// Outcome of one commit pass over every surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Surfaces whose buffer reached the chip
    pub written: usize,
    /// Brightness and blink register writes
    pub config_writes: usize,
    /// Surfaces that failed this tick
    pub failures: usize,
    /// Surfaces with no chip attached
    pub missing: usize,
}

/// Multiplexed display driver: one chip per surface, the scan chip doubling
/// as the key-scan source.
pub struct DisplayManager {
    chips: Vec<AttachedChip>,
    scan_slot: SurfaceSlot,
    commits: u64,
}

impl DisplayManager {
    pub fn new(scan_slot: SurfaceSlot) -> Self {
        Self {
            chips: Vec::with_capacity(SurfaceSlot::ALL.len()),
            scan_slot,
            commits: 0,
        }
    }

    /// Attach and initialise the chip driving `slot`, replacing any chip
    /// already there. A chip that fails to initialise stays attached and
    /// initialisation is retried on each commit.
    pub fn attach(&mut self, slot: SurfaceSlot, mut chip: BoxedChip) -> Result<(), DisplayError> {
        let init = chip.init();
        {
            let caps = chip.capabilities();
            info!("{} display: {} at 0x{:02X}", slot, caps.name, caps.address);
        }
        self.chips.retain(|c| c.slot != slot);
        self.chips.push(AttachedChip {
            slot,
            chip,
            mirror: ChipMirror::new(),
            initialized: init.is_ok(),
            failures: 0,
        });
        init
    }

    pub fn is_attached(&self, slot: SurfaceSlot) -> bool {
        self.chips.iter().any(|c| c.slot == slot)
    }

    pub fn scan_slot(&self) -> SurfaceSlot {
        self.scan_slot
    }

    /// Commit passes completed
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn mirror(&self, slot: SurfaceSlot) -> Option<&ChipMirror> {
        self.chips.iter().find(|c| c.slot == slot).map(|c| &c.mirror)
    }

    fn attached_mut(&mut self, slot: SurfaceSlot) -> Option<&mut AttachedChip> {
        self.chips.iter_mut().find(|c| c.slot == slot)
    }

    /// Read raw key-scan RAM from the scan chip
    pub fn read_key_scan(&mut self) -> Result<KeyScan, HardwareError> {
        let slot = self.scan_slot;
        let attached = self
            .attached_mut(slot)
            .ok_or_else(|| HardwareError::Unavailable(format!("no {} chip to scan keys", slot)))?;
        if !attached.chip.capabilities().has_key_scan {
            return Err(HardwareError::Unavailable(format!(
                "{} chip has no key-scan matrix",
                attached.chip.capabilities().name
            )));
        }
        attached.chip.read_key_scan()
    }

    /// Query the strategy for every surface, in slot order, and commit each.
    /// Failures are logged and counted; the next tick retries.
    pub fn commit<M>(&mut self, strategy: &dyn DisplayStrategy<M>, model: &M, tick: u64) -> CommitReport {
        let mut report = CommitReport::default();
        for slot in SurfaceSlot::ALL {
            let surface = strategy.surface(slot, model);
            let result = self.commit_surface(slot, surface, tick);
            match &result {
                Ok(writes) => {
                    report.written += 1;
                    report.config_writes += writes;
                }
                Err(DisplayError::NoChip(_)) => report.missing += 1,
                Err(_) => report.failures += 1,
            }
            if let Some(attached) = self.attached_mut(slot) {
                track_failures(attached, &result);
            }
        }
        self.commits += 1;
        report
    }

    /// Animate, render and commit one surface. Brightness and blink are
    /// written only when they differ from the mirror; the value buffer is
    /// written and flushed every time. Returns the number of configuration
    /// writes issued.
    pub fn commit_surface(&mut self, slot: SurfaceSlot, surface: DisplaySurface, tick: u64) -> Result<usize, DisplayError> {
        let attached = self.attached_mut(slot).ok_or(DisplayError::NoChip(slot))?;
        let surface = surface.animate(tick);

        // render before touching the bus so misuse costs no traffic
        let alpha;
        let leds;
        let words: &[u16] = if slot.is_led_bank() {
            leds = render_leds(&surface.value)?;
            &leds
        } else {
            alpha = render_alpha(&surface.value);
            &alpha
        };

        if !attached.initialized {
            attached.chip.init()?;
            attached.initialized = true;
            attached.mirror.invalidate();
            info!("{} display initialised", slot);
        }

        let brightness = surface.brightness.min(MAX_BRIGHTNESS);
        let mut writes = 0;
        let mut config_error = None;
        match attached.mirror.sync_brightness(attached.chip.as_mut(), brightness) {
            Ok(written) => writes += written as usize,
            Err(e) => config_error = Some(e),
        }
        match attached.mirror.sync_blink(attached.chip.as_mut(), surface.blink) {
            Ok(written) => writes += written as usize,
            Err(e) => {
                config_error.get_or_insert(e);
            }
        }

        attached.chip.write_buffer(words)?;
        attached.chip.flush()?;

        match config_error {
            Some(e) => Err(e),
            None => Ok(writes),
        }
    }

    /// Blank every chip and release them
    pub fn shutdown(&mut self) {
        for mut attached in self.chips.drain(..) {
            match attached.chip.clear() {
                Ok(()) => debug!("{} display blanked", attached.slot),
                Err(e) => warn!("Failed to blank {} display: {}", attached.slot, e),
            }
        }
        info!("Displays released after {} commits", self.commits);
    }
}

fn track_failures(attached: &mut AttachedChip, result: &Result<usize, DisplayError>) {
    match result {
        Ok(_) => {
            if attached.failures > 0 {
                info!("{} display recovered after {} failed commits", attached.slot, attached.failures);
                attached.failures = 0;
            }
        }
        Err(e) => {
            attached.failures += 1;
            if attached.failures == 1 || attached.failures % FAILURE_LOG_EVERY == 0 {
                warn!("{} display commit failed ({} in a row): {}", attached.slot, attached.failures, e);
            }
        }
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        if !self.chips.is_empty() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockChip, MockChipState};
    use crate::display::surface::{BlinkRate, SurfaceValue};
    use crate::display::font::glyph;
    use std::sync::{Arc, Mutex};

    struct Fixed {
        green: DisplaySurface,
        leds: DisplaySurface,
    }

    impl DisplayStrategy<()> for Fixed {
        fn green(&self, _: &()) -> DisplaySurface {
            self.green.clone()
        }
        fn blue(&self, _: &()) -> DisplaySurface {
            DisplaySurface::text("BLUE")
        }
        fn red(&self, _: &()) -> DisplaySurface {
            DisplaySurface::integer(-5)
        }
        fn leds(&self, _: &()) -> DisplaySurface {
            self.leds.clone()
        }
    }

    fn rig() -> (DisplayManager, Vec<Arc<Mutex<MockChipState>>>) {
        let mut manager = DisplayManager::new(SurfaceSlot::Leds);
        let mut states = Vec::new();
        for (i, slot) in SurfaceSlot::ALL.into_iter().enumerate() {
            let chip = MockChip::new(slot.name(), 0x70 + i as u8);
            states.push(chip.state());
            manager.attach(slot, Box::new(chip)).unwrap();
        }
        (manager, states)
    }

    fn fixed() -> Fixed {
        Fixed {
            green: DisplaySurface::integer(42),
            leds: DisplaySurface::integer(0x0102_03),
        }
    }

    #[test]
    fn test_commit_writes_every_surface() {
        let (mut manager, states) = rig();
        let report = manager.commit(&fixed(), &(), 0);
        assert_eq!(report.written, 4);
        assert_eq!(report.failures, 0);
        // unknown mirror: brightness and blink written once per chip
        assert_eq!(report.config_writes, 8);

        let green = states[0].lock().unwrap();
        assert_eq!(green.shown[..4], [0, 0, glyph('4'), glyph('2')]);
        let leds = states[3].lock().unwrap();
        assert_eq!(leds.shown[..3], [0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_config_written_only_on_change() {
        let (mut manager, states) = rig();
        let mut strategy = fixed();
        for tick in 0..20 {
            manager.commit(&strategy, &(), tick);
        }
        {
            let green = states[0].lock().unwrap();
            assert_eq!(green.brightness_writes, 1);
            assert_eq!(green.blink_writes, 1);
            assert_eq!(green.buffer_writes, 20);
            assert_eq!(green.flush_count, 20);
        }

        strategy.green = DisplaySurface::integer(42).with_blink(BlinkRate::Normal);
        let report = manager.commit(&strategy, &(), 20);
        assert_eq!(report.config_writes, 1);
        let green = states[0].lock().unwrap();
        assert_eq!(green.blink_writes, 2);
        assert_eq!(green.brightness_writes, 1);
        assert_eq!(green.last_blink, Some(BlinkRate::Normal));
    }

    #[test]
    fn test_non_integer_led_surface_is_skipped() {
        let (mut manager, states) = rig();
        let strategy = Fixed {
            green: DisplaySurface::integer(1),
            leds: DisplaySurface::text("OOPS"),
        };
        let report = manager.commit(&strategy, &(), 0);
        assert_eq!(report.written, 3);
        assert_eq!(report.failures, 1);
        assert_eq!(states[3].lock().unwrap().buffer_writes, 0);
    }

    #[test]
    fn test_failed_config_write_retried_next_tick() {
        let (mut manager, states) = rig();
        states[1].lock().unwrap().simulate_config_failure = true;
        let report = manager.commit(&fixed(), &(), 0);
        assert_eq!(report.failures, 1);
        // the value still went out
        assert_eq!(states[1].lock().unwrap().flush_count, 1);
        assert_eq!(manager.mirror(SurfaceSlot::Blue).unwrap().brightness(), None);

        states[1].lock().unwrap().simulate_config_failure = false;
        let report = manager.commit(&fixed(), &(), 1);
        assert_eq!(report.failures, 0);
        assert_eq!(report.config_writes, 2);
        assert_eq!(manager.mirror(SurfaceSlot::Blue).unwrap().brightness(), Some(15));
    }

    #[test]
    fn test_brightness_is_clamped() {
        let (mut manager, states) = rig();
        let strategy = Fixed {
            green: DisplaySurface::integer(1).with_brightness(99),
            leds: DisplaySurface::integer(0),
        };
        manager.commit(&strategy, &(), 0);
        assert_eq!(states[0].lock().unwrap().last_brightness, Some(15));
    }

    #[test]
    fn test_missing_chip_counted() {
        let mut manager = DisplayManager::new(SurfaceSlot::Leds);
        let chip = MockChip::new("green", 0x70);
        manager.attach(SurfaceSlot::Green, Box::new(chip)).unwrap();
        let report = manager.commit(&fixed(), &(), 0);
        assert_eq!(report.written, 1);
        assert_eq!(report.missing, 3);
        assert!(manager.read_key_scan().is_err());
    }

    #[test]
    fn test_init_retried_on_commit() {
        let mut manager = DisplayManager::new(SurfaceSlot::Green);
        let chip = MockChip::new("green", 0x70);
        let state = chip.state();
        state.lock().unwrap().simulate_init_failure = true;
        assert!(manager.attach(SurfaceSlot::Green, Box::new(chip)).is_err());
        assert!(manager.is_attached(SurfaceSlot::Green));

        state.lock().unwrap().simulate_init_failure = false;
        manager
            .commit_surface(SurfaceSlot::Green, DisplaySurface::text("OK"), 0)
            .unwrap();
        assert_eq!(state.lock().unwrap().init_count, 1);
    }

    #[test]
    fn test_key_scan_from_scan_chip() {
        let mut manager = DisplayManager::new(SurfaceSlot::Red);
        let chip = MockChip::new("red", 0x72);
        chip.set_key_scan([9, 0, 0, 0, 0, 0]);
        manager.attach(SurfaceSlot::Red, Box::new(chip)).unwrap();
        assert_eq!(manager.read_key_scan().unwrap()[0], 9);
    }

    #[test]
    fn test_key_scan_refused_without_matrix() {
        let mut manager = DisplayManager::new(SurfaceSlot::Red);
        let chip = MockChip::new("red", 0x72).without_key_scan();
        let state = chip.state();
        manager.attach(SurfaceSlot::Red, Box::new(chip)).unwrap();
        assert!(matches!(manager.read_key_scan(), Err(HardwareError::Unavailable(_))));
        assert_eq!(state.lock().unwrap().key_scan_reads, 0);
    }

    #[test]
    fn test_shutdown_blanks_chips() {
        let (mut manager, states) = rig();
        manager.commit(&fixed(), &(), 0);
        manager.shutdown();
        for state in &states {
            let state = state.lock().unwrap();
            assert_eq!(state.clear_count, 1);
            assert_eq!(state.shown, [0; 8]);
        }
        assert!(!manager.is_attached(SurfaceSlot::Green));
    }

    #[test]
    fn test_raw_segments_reach_chip() {
        let (mut manager, states) = rig();
        manager
            .commit_surface(SurfaceSlot::Red, DisplaySurface::new(SurfaceValue::RawSegments([1, 2, 4, 8])), 0)
            .unwrap();
        assert_eq!(states[2].lock().unwrap().shown[..4], [1, 2, 4, 8]);
    }
}
