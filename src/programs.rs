//! Built-in programs
//!
//! Native Rust ports of the stock animations. They serve two purposes:
//! ready-made content for the simulator before any user module exists, and
//! the build-time registry path for targets where runtime code loading is
//! not available — [`builtin_registry`] is a drop-in replacement for a
//! loaded module.

use crate::host::Pixels;
use crate::palette::{Palette, Rgb};
use crate::program::{Program, ProgramRegistry};

/// Registry of all built-in programs, in presentation order
pub fn builtin_registry() -> ProgramRegistry {
    ProgramRegistry::new(vec![
        Box::new(Rainbow),
        Box::new(Breathe),
        Box::new(SolidWhite),
        Box::new(Comet),
    ])
}

/// Palette sweep scrolling along each strip
pub struct Rainbow;

impl Program for Rainbow {
    fn name(&self) -> &str {
        "Rainbow"
    }

    fn update(&mut self, time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette) {
        let t = (time_ms / 1000.0) as f32;
        for s in 0..pixels.strip_count() {
            let leds = pixels.led_count(s);
            for i in 0..leds {
                let index = (i as f32 / leds as f32 * 255.0 + t * 60.0) as u8;
                pixels.set(s, i, palette.sample(index, 255, true));
            }
        }
    }
}

/// Whole-frame brightness swell at ~0.3 Hz
pub struct Breathe;

impl Program for Breathe {
    fn name(&self) -> &str {
        "Breathe"
    }

    fn update(&mut self, time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette) {
        let t = (time_ms / 1000.0) as f32;
        let breath = ((t * 2.0).sin() + 1.0) * 0.5;
        let brightness = (breath * 255.0) as u8;

        for s in 0..pixels.strip_count() {
            let leds = pixels.led_count(s);
            for i in 0..leds {
                let index = (i as f32 / leds as f32 * 255.0) as u8;
                pixels.set(s, i, palette.sample(index, brightness, true));
            }
        }
    }
}

/// Every LED at full white; useful as a light and as a wiring check
pub struct SolidWhite;

impl Program for SolidWhite {
    fn name(&self) -> &str {
        "Solid White"
    }

    fn update(&mut self, _time_ms: f64, pixels: &mut Pixels<'_>, _palette: &Palette) {
        for s in 0..pixels.strip_count() {
            for i in 0..pixels.led_count(s) {
                pixels.set(s, i, Rgb::new(255, 255, 255));
            }
        }
    }
}

/// A bright head falling down each strip with a fading tail; per-strip
/// speed and phase are derived from the strip index so strips desync.
pub struct Comet;

impl Program for Comet {
    fn name(&self) -> &str {
        "Comet"
    }

    fn update(&mut self, time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette) {
        const TAIL_LENGTH: f32 = 25.0;
        let t = (time_ms / 1000.0) as f32;

        for s in 0..pixels.strip_count() {
            let leds = pixels.led_count(s);
            if leds == 0 {
                continue;
            }

            let seed = (s as u32).wrapping_mul(2_654_435_761);
            let speed = 0.3 + (seed % 100) as f32 / 200.0;
            let phase = (seed % 1000) as f32 / 1000.0;

            let cycle = (t * speed + phase).fract();
            let head = (1.0 - cycle) * leds as f32;

            for i in 0..leds {
                let mut dist = i as f32 - head;
                if dist < 0.0 {
                    dist += leds as f32;
                }

                let brightness = if dist < TAIL_LENGTH {
                    let falloff = 1.0 - dist / TAIL_LENGTH;
                    falloff * falloff
                } else {
                    0.0
                };

                let index = (255.0 - dist / TAIL_LENGTH * 128.0) as u8;
                pixels.set(s, i, palette.sample(index, (brightness * 255.0) as u8, true));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::RAINBOW;
    use crate::topology::Topology;

    fn run_one_frame(program: &mut dyn Program, time_ms: f64) -> crate::host::PixelBuffer {
        let topology = Topology::uniform(2, 8).unwrap();
        let mut buffer = crate::host::PixelBuffer::from_topology(&topology);
        let mut pixels = Pixels::new(&topology, &mut buffer);
        program.update(time_ms, &mut pixels, &RAINBOW);
        buffer
    }

    #[test]
    fn test_registry_order_and_names() {
        let registry = builtin_registry();
        assert_eq!(
            registry.names(),
            vec!["Rainbow", "Breathe", "Solid White", "Comet"]
        );
    }

    #[test]
    fn test_rainbow_at_time_zero_matches_palette_gradient() {
        let buffer = run_one_frame(&mut Rainbow, 0.0);
        for i in 0..8 {
            let index = (i as f32 / 8.0 * 255.0) as u8;
            assert_eq!(buffer.get(0, i), RAINBOW.sample(index, 255, true));
            assert_eq!(buffer.get(1, i), buffer.get(0, i));
        }
    }

    #[test]
    fn test_solid_white_fills_everything() {
        let buffer = run_one_frame(&mut SolidWhite, 1234.5);
        for s in 0..2 {
            for i in 0..8 {
                assert_eq!(buffer.get(s, i), Rgb::new(255, 255, 255));
            }
        }
    }

    #[test]
    fn test_comet_lights_a_subset() {
        let buffer = run_one_frame(&mut Comet, 0.0);
        let lit = (0..8).filter(|&i| buffer.get(0, i) != Rgb::BLACK).count();
        assert!(lit > 0, "comet head should light at least one LED");
    }
}
