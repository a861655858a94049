/*
 *  panel_test.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Built-in panel test: every control mirrored on the displays
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

//! Encoders count on the three alphanumeric displays, pushing an encoder
//! zeroes its counter. Toggle 7 turns encoder 2 into a tempo knob shown on
//! the red display. Selector 0 sets brightness, selector 1 hardware blink.
//! The LED bank shows toggles, buttons, joystick and selectors. The
//! joystick button flips to an attract-mode marquee and back.

use log::info;

use crate::app::{Application, DisplayStrategy, PanelListener, Transition};
use crate::display::{Animator, BlinkRate, DisplaySurface, ScrollMode, flash, scroll_text};
use crate::input::{ControlPanel, Direction, ENCODER_COUNT};

pub const MIN_BPM: u32 = 30;
pub const MAX_BPM: u32 = 300;

/// Ticks per beat in tempo mode
const TICKS_PER_BEAT: u64 = 32;

const TEMPO_TOGGLE: u8 = 7;
const TEMPO_ENCODER: usize = 2;

const BRIGHTNESS_STEPS: [u8; 4] = [3, 7, 11, 15];
const BLINK_STEPS: [BlinkRate; 4] = [BlinkRate::Off, BlinkRate::Slow, BlinkRate::Normal, BlinkRate::Fast];

#[derive(Debug, Clone, Default)]
pub struct PanelTest {
    pub counters: [i64; ENCODER_COUNT],
    pub bpm: u32,
    pub beat: u64,
    pub marquee: bool,
    /// Last panel seen by the listener
    pub panel: ControlPanel,
}

impl PanelTest {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            ..Default::default()
        }
    }

    pub fn tempo_mode(&self) -> bool {
        self.panel.toggles.is_on(TEMPO_TOGGLE)
    }

    fn brightness(&self) -> u8 {
        BRIGHTNESS_STEPS[self.panel.selectors[0].value as usize & 0b11]
    }

    fn blink(&self) -> BlinkRate {
        BLINK_STEPS[self.panel.selectors[1].value as usize & 0b11]
    }

    /// Toggles in bits 0-7, buttons 8-10, joystick 12-15, selectors 16-21
    pub fn led_pattern(&self) -> i32 {
        let panel = &self.panel;
        let mut bits = panel.toggles.state as u32;
        for (i, button) in panel.buttons.iter().enumerate() {
            if button.is_pressed() {
                bits |= 1 << (8 + i);
            }
        }
        bits |= match panel.joystick.direction {
            Direction::Centered => 0,
            Direction::Up => 1 << 12,
            Direction::Down => 1 << 13,
            Direction::Left => 1 << 14,
            Direction::Right => 1 << 15,
        };
        for (i, selector) in panel.selectors.iter().enumerate() {
            bits |= (selector.value as u32 & 0b11) << (16 + i * 2);
        }
        bits as i32
    }
}

impl Application for PanelTest {
    fn update(&mut self, tick: u64) {
        self.beat = tick / TICKS_PER_BEAT;
    }

    fn tempo_bpm(&self) -> Option<u32> {
        Some(self.bpm)
    }
}

fn counter_value(counter: i64) -> i32 {
    counter.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub struct PanelTestListener;

impl PanelListener<PanelTest> for PanelTestListener {
    fn on_panel(&mut self, panel: &ControlPanel, model: &mut PanelTest) -> Transition<PanelTest> {
        model.panel = *panel;

        let tempo_mode = model.tempo_mode();
        for (i, encoder) in panel.encoders.iter().enumerate() {
            if encoder.button.just_pressed() {
                model.counters[i] = 0;
            } else if tempo_mode && i == TEMPO_ENCODER {
                let bpm = model.bpm as i64 + encoder.delta as i64;
                model.bpm = bpm.clamp(MIN_BPM as i64, MAX_BPM as i64) as u32;
            } else {
                model.counters[i] = model.counters[i].saturating_add(encoder.delta as i64);
            }
        }

        if panel.joystick.button.just_pressed() {
            model.marquee = !model.marquee;
            info!("Panel test {} marquee", if model.marquee { "entering" } else { "leaving" });
            let view: Box<dyn DisplayStrategy<PanelTest>> = if model.marquee {
                Box::new(MarqueeView::new())
            } else {
                Box::new(CounterView::new())
            };
            return Transition::Strategy(view);
        }
        Transition::Stay
    }
}

/// Counters, tempo and the panel state
pub struct CounterView {
    beat_flash: Animator,
}

impl CounterView {
    pub fn new() -> Self {
        Self {
            beat_flash: flash(TICKS_PER_BEAT),
        }
    }

    fn counter(&self, model: &PanelTest, index: usize) -> DisplaySurface {
        DisplaySurface::integer(counter_value(model.counters[index]))
            .with_brightness(model.brightness())
            .with_blink(model.blink())
    }
}

impl Default for CounterView {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayStrategy<PanelTest> for CounterView {
    fn green(&self, model: &PanelTest) -> DisplaySurface {
        self.counter(model, 0)
    }

    fn blue(&self, model: &PanelTest) -> DisplaySurface {
        self.counter(model, 1)
    }

    fn red(&self, model: &PanelTest) -> DisplaySurface {
        if model.tempo_mode() {
            DisplaySurface::integer(model.bpm as i32)
                .with_brightness(model.brightness())
                .with_animator(self.beat_flash.clone())
        } else {
            self.counter(model, 2)
        }
    }

    fn leds(&self, model: &PanelTest) -> DisplaySurface {
        DisplaySurface::integer(model.led_pattern()).with_brightness(model.brightness())
    }
}

/// Attract mode
pub struct MarqueeView {
    marquee: Animator,
    bounce: Animator,
    prompt: Animator,
}

impl MarqueeView {
    pub fn new() -> Self {
        Self {
            marquee: scroll_text(ScrollMode::Loop, 10),
            bounce: scroll_text(ScrollMode::Cylon, 12),
            prompt: flash(50),
        }
    }
}

impl Default for MarqueeView {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayStrategy<PanelTest> for MarqueeView {
    fn green(&self, _model: &PanelTest) -> DisplaySurface {
        DisplaySurface::text("INSERT COIN").with_animator(self.marquee.clone())
    }

    fn blue(&self, _model: &PanelTest) -> DisplaySurface {
        DisplaySurface::text("PLAYER 1").with_animator(self.bounce.clone())
    }

    fn red(&self, _model: &PanelTest) -> DisplaySurface {
        DisplaySurface::text(" GO ").with_animator(self.prompt.clone())
    }

    fn leds(&self, model: &PanelTest) -> DisplaySurface {
        // chaser across all 24 LEDs, one step per beat
        DisplaySurface::integer(1 << (model.beat % 24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawPanel;
    use crate::display::SurfaceValue;

    fn panel_from(raw: RawPanel) -> ControlPanel {
        ControlPanel::from_raw(&raw)
    }

    #[test]
    fn test_encoder_deltas_accumulate() {
        let mut model = PanelTest::new(120);
        let mut listener = PanelTestListener;
        let mut panel = panel_from(RawPanel::default());
        panel.encoders[0].delta = 3;
        panel.encoders[1].delta = -2;
        listener.on_panel(&panel, &mut model);
        listener.on_panel(&panel, &mut model);
        assert_eq!(model.counters, [6, -4, 0]);
    }

    #[test]
    fn test_encoder_button_resets_counter() {
        let mut model = PanelTest::new(120);
        model.counters = [5, 5, 5];
        let mut panel = panel_from(RawPanel::default());
        panel.encoders[1].button.update(true);
        PanelTestListener.on_panel(&panel, &mut model);
        assert_eq!(model.counters, [5, 0, 5]);
    }

    #[test]
    fn test_tempo_knob() {
        let mut model = PanelTest::new(120);
        let mut panel = panel_from(RawPanel {
            toggles: 1 << TEMPO_TOGGLE,
            ..Default::default()
        });
        panel.encoders[TEMPO_ENCODER].delta = 500;
        PanelTestListener.on_panel(&panel, &mut model);
        assert_eq!(model.bpm, MAX_BPM);
        assert_eq!(model.counters[TEMPO_ENCODER], 0);
        assert_eq!(model.tempo_bpm(), Some(MAX_BPM));
    }

    #[test]
    fn test_joystick_button_swaps_view() {
        let mut model = PanelTest::new(120);
        let mut panel = panel_from(RawPanel::default());
        panel.joystick.button.update(true);
        let transition = PanelTestListener.on_panel(&panel, &mut model);
        assert!(matches!(transition, Transition::Strategy(_)));
        assert!(model.marquee);
    }

    #[test]
    fn test_led_pattern() {
        let raw = RawPanel {
            toggles: 0x81,
            selectors: [1, 0, 3],
            buttons: [false, true, false],
            joystick: Direction::Left,
            ..Default::default()
        };
        let model = PanelTest {
            panel: panel_from(raw),
            ..PanelTest::new(120)
        };
        let expected = 0x81 | (1 << 9) | (1 << 14) | (1 << 16) | (3 << 20);
        assert_eq!(model.led_pattern(), expected);
    }

    #[test]
    fn test_counter_view_uses_selectors() {
        let model = PanelTest {
            panel: panel_from(RawPanel {
                selectors: [0, 3, 0],
                ..Default::default()
            }),
            counters: [7, 0, 0],
            ..PanelTest::new(120)
        };
        let green = CounterView::new().green(&model);
        assert_eq!(green.value, SurfaceValue::Integer(7));
        assert_eq!(green.brightness, 3);
        assert_eq!(green.blink, BlinkRate::Fast);
    }

    #[test]
    fn test_marquee_leds_are_integer() {
        let model = PanelTest {
            beat: 25,
            ..PanelTest::new(120)
        };
        let leds = MarqueeView::new().leds(&model);
        assert_eq!(leds.value, SurfaceValue::Integer(2));
    }

    #[test]
    fn test_tempo_display_blanks_between_beats() {
        let model = PanelTest {
            panel: panel_from(RawPanel {
                toggles: 1 << TEMPO_TOGGLE,
                ..Default::default()
            }),
            ..PanelTest::new(120)
        };
        let red = CounterView::new().red(&model);
        assert_eq!(red.clone().animate(0).value, SurfaceValue::Integer(120));
        assert_eq!(red.animate(TICKS_PER_BEAT / 2).value, SurfaceValue::Blank);
    }

    #[test]
    fn test_counter_display_saturates() {
        assert_eq!(counter_value(i64::MAX), i32::MAX);
        assert_eq!(counter_value(-12), -12);
    }
}
