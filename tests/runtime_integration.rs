/*
 *  tests/runtime_integration.rs
 *
 *  Integration tests for the scan, update and commit cycle
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 */

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cabinet::display::render::{render_integer, render_leds};
use cabinet::display::{DisplayManager, MockChip, MockChipState, SurfaceSlot, SurfaceValue};
use cabinet::input::{Direction, EncoderBank, InputPoller, RawPanel, ScriptedLines};
use cabinet::pacer::{Pacer, RecordingSleeper};
use cabinet::panel_test::{CounterView, PanelTest, PanelTestListener};
use cabinet::scheduler::Runtime;

const CLOCKWISE_DETENT: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];

struct Rig {
    runtime: Runtime<PanelTest>,
    chips: Vec<(SurfaceSlot, Arc<Mutex<MockChipState>>)>,
    sleeper: RecordingSleeper,
}

impl Rig {
    fn state(&self, slot: SurfaceSlot) -> Arc<Mutex<MockChipState>> {
        self.chips
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, state)| Arc::clone(state))
            .unwrap()
    }

    fn press(&self, raw: RawPanel) {
        self.state(SurfaceSlot::Green).lock().unwrap().key_scan = raw.to_key_scan();
    }
}

fn rig(encoders: Arc<EncoderBank>, pacer: Pacer) -> Rig {
    let mut display = DisplayManager::new(SurfaceSlot::Green);
    let mut chips = Vec::new();
    for (i, slot) in SurfaceSlot::ALL.iter().enumerate() {
        let chip = MockChip::new(slot.name(), 0x70 + i as u8);
        chips.push((*slot, chip.state()));
        display.attach(*slot, Box::new(chip)).unwrap();
    }
    let sleeper = RecordingSleeper::new();
    let runtime = Runtime::new(PanelTest::new(120), Box::new(CounterView::new()), display, encoders, pacer)
        .with_listener(Box::new(PanelTestListener))
        .with_sleeper(Box::new(sleeper.clone()));
    Rig { runtime, chips, sleeper }
}

#[test]
fn test_turning_encoder_updates_green_display() {
    let bank = Arc::new(EncoderBank::new());
    let script = ScriptedLines::new();
    let lines = script.clone();
    let poller = InputPoller::spawn(Arc::clone(&bank), Duration::from_micros(200), move || {
        Ok(Box::new(lines) as cabinet::input::BoxedLines)
    })
    .unwrap();

    let mut rig = rig(Arc::clone(&bank), Pacer::fixed(Duration::from_millis(20)));
    rig.runtime = rig.runtime.with_poller(poller);
    rig.runtime.run_tick();

    script.feed_encoder(0, &CLOCKWISE_DETENT);
    script.feed_encoder(0, &CLOCKWISE_DETENT);
    for _ in 0..200 {
        if script.is_exhausted() {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert!(script.is_exhausted());
    // let the last sample land in the channel
    thread::sleep(Duration::from_millis(10));

    let report = rig.runtime.run_tick();
    assert_eq!(report.commit.failures, 0);
    assert_eq!(rig.runtime.model().counters, [2, 0, 0]);

    let shown = rig.state(SurfaceSlot::Green).lock().unwrap().shown;
    assert_eq!(&shown[..4], &render_integer(2)[..]);

    let model = rig.runtime.shutdown();
    assert_eq!(model.counters[0], 2);
}

#[test]
fn test_every_surface_is_written_each_tick() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    for _ in 0..3 {
        let report = rig.runtime.run_tick();
        assert_eq!(report.commit.written, 4);
        assert_eq!(report.commit.missing, 0);
    }
    for (_, state) in &rig.chips {
        let state = state.lock().unwrap();
        assert_eq!(state.flush_count, 3);
        // configuration registers only go out on the first commit
        assert_eq!(state.brightness_writes, 1);
        assert_eq!(state.blink_writes, 1);
    }
    assert_eq!(rig.sleeper.slept().len(), 3);
}

#[test]
fn test_led_bank_mirrors_switches() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    let raw = RawPanel {
        toggles: 0x05,
        joystick: Direction::Up,
        ..Default::default()
    };
    rig.press(raw);
    rig.runtime.run_tick();

    let expected = render_leds(&SurfaceValue::Integer(0x05 | 1 << 12)).unwrap();
    let shown = rig.state(SurfaceSlot::Leds).lock().unwrap().shown;
    assert_eq!(&shown[..3], &expected[..]);
}

#[test]
fn test_joystick_button_toggles_marquee() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    rig.runtime.run_tick();
    assert!(!rig.runtime.model().marquee);

    rig.press(RawPanel {
        joystick_button: true,
        ..Default::default()
    });
    rig.runtime.run_tick();
    assert!(rig.runtime.model().marquee);

    // held button does not retrigger
    rig.runtime.run_tick();
    assert!(rig.runtime.model().marquee);

    rig.press(RawPanel::default());
    rig.runtime.run_tick();
    rig.press(RawPanel {
        joystick_button: true,
        ..Default::default()
    });
    rig.runtime.run_tick();
    assert!(!rig.runtime.model().marquee);
}

#[test]
fn test_selector_drives_brightness_register() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    rig.runtime.run_tick();
    rig.press(RawPanel {
        selectors: [1, 0, 0],
        ..Default::default()
    });
    rig.runtime.run_tick();

    let state = rig.state(SurfaceSlot::Blue);
    let state = state.lock().unwrap();
    assert_eq!(state.last_brightness, Some(7));
    assert_eq!(state.brightness_writes, 2);
}

#[test]
fn test_tempo_change_retunes_period() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::tempo(120));
    assert_eq!(rig.runtime.pacer().period(), Duration::from_micros(15_625));

    rig.runtime.model_mut().bpm = 60;
    let report = rig.runtime.run_tick();
    assert!(report.retuned);
    assert_eq!(rig.runtime.pacer().period(), Duration::from_micros(31_250));
    assert_eq!(rig.runtime.pacer().bpm(), Some(60));
}

#[test]
fn test_failing_chip_does_not_stop_the_others() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    rig.state(SurfaceSlot::Red).lock().unwrap().simulate_flush_failure = true;

    let report = rig.runtime.run_tick();
    assert_eq!(report.commit.failures, 1);
    assert_eq!(report.commit.written, 3);

    rig.state(SurfaceSlot::Red).lock().unwrap().simulate_flush_failure = false;
    let report = rig.runtime.run_tick();
    assert_eq!(report.commit.failures, 0);
    assert_eq!(report.commit.written, 4);
}

#[test]
fn test_shutdown_blanks_displays() {
    let mut rig = rig(Arc::new(EncoderBank::new()), Pacer::fixed(Duration::from_millis(20)));
    rig.runtime.model_mut().counters = [42, 42, 42];
    rig.runtime.run_tick();
    let states: Vec<_> = rig.chips.iter().map(|(_, s)| Arc::clone(s)).collect();

    rig.runtime.shutdown();
    for state in states {
        let state = state.lock().unwrap();
        assert_eq!(state.clear_count, 1);
        assert_eq!(state.shown, [0; 8]);
    }
}
