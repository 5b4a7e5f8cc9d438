//! Integration tests for program lifecycle and frame execution
//!
//! Drives a real [`ExecutionHost`] end to end: lifecycle hook ordering
//! across program switches and registry swaps, and a full frame rendered
//! through a sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ledvis_rs::host::{ExecutionHost, Pixels};
use ledvis_rs::palette::{Palette, Rgb, RAINBOW};
use ledvis_rs::program::{Program, ProgramRegistry};
use ledvis_rs::sink::{CaptureSink, PixelSink};
use ledvis_rs::topology::Topology;

/// Program that counts its lifecycle hook invocations
struct Counted {
    name: String,
    inits: Arc<AtomicUsize>,
    cleanups: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
}

impl Counted {
    fn new(name: &str) -> (Box<Self>, Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let inits = Arc::new(AtomicUsize::new(0));
        let cleanups = Arc::new(AtomicUsize::new(0));
        let updates = Arc::new(AtomicUsize::new(0));
        let program = Box::new(Self {
            name: name.to_string(),
            inits: Arc::clone(&inits),
            cleanups: Arc::clone(&cleanups),
            updates: Arc::clone(&updates),
        });
        (program, inits, cleanups, updates)
    }
}

impl Program for Counted {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, _time_ms: f64, _pixels: &mut Pixels<'_>, _palette: &Palette) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn init(&mut self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn cleanup(&mut self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

fn host(strips: usize, leds: usize) -> ExecutionHost {
    let topology = Topology::uniform(strips, leds).unwrap();
    ExecutionHost::new(topology, Box::new(CaptureSink::default()))
}

#[test]
fn test_lifecycle_hooks_run_exactly_once_per_switch() {
    let (a, a_inits, a_cleanups, a_updates) = Counted::new("a");
    let (b, b_inits, b_cleanups, _) = Counted::new("b");

    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a, b]));

    // The swap activated program 0: one init, no cleanup yet.
    assert_eq!(host.active_program(), Some(0));
    assert_eq!(a_inits.load(Ordering::SeqCst), 1);
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 0);

    host.run().unwrap();
    assert_eq!(a_updates.load(Ordering::SeqCst), 1);

    // a -> b: a cleaned up once, b initialized once.
    host.set_program(1);
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(b_inits.load(Ordering::SeqCst), 1);
    assert_eq!(b_cleanups.load(Ordering::SeqCst), 0);

    // b -> a: second init for a, first cleanup for b.
    host.set_program(0);
    assert_eq!(b_cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(a_inits.load(Ordering::SeqCst), 2);

    // Re-selecting the active program restarts it: cleanup then init.
    host.set_program(0);
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 2);
    assert_eq!(a_inits.load(Ordering::SeqCst), 3);

    host.shutdown().unwrap();
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 3);
    assert_eq!(b_inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_out_of_range_selection_keeps_active_program() {
    let (a, _, a_cleanups, _) = Counted::new("a");
    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a]));

    host.set_program(5);
    assert_eq!(host.active_program(), Some(0));
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 0);
}

#[test]
fn test_next_program_wraps_around() {
    let (a, a_inits, _, _) = Counted::new("a");
    let (b, b_inits, _, _) = Counted::new("b");
    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a, b]));

    host.next_program();
    assert_eq!(host.active_program(), Some(1));
    host.next_program();
    assert_eq!(host.active_program(), Some(0));
    assert_eq!(a_inits.load(Ordering::SeqCst), 2);
    assert_eq!(b_inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_swap_resets_active_index_when_registry_shrinks() {
    let (a, _, _, _) = Counted::new("a");
    let (b, _, b_cleanups, _) = Counted::new("b");
    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a, b]));
    host.set_program(1);

    // New registry has only one program: active falls back to 0 and the
    // outgoing program was cleaned up.
    let (c, c_inits, _, _) = Counted::new("c");
    host.swap_registry(ProgramRegistry::new(vec![c]));
    assert_eq!(host.active_program(), Some(0));
    assert_eq!(b_cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(c_inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_swap_keeps_active_index_when_it_still_fits() {
    let (a, _, _, _) = Counted::new("a");
    let (b, _, _, _) = Counted::new("b");
    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a, b]));
    host.set_program(1);

    let (c, _, _, _) = Counted::new("c");
    let (d, d_inits, _, _) = Counted::new("d");
    host.swap_registry(ProgramRegistry::new(vec![c, d]));
    assert_eq!(host.active_program(), Some(1));
    assert_eq!(d_inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_swap_to_empty_registry_deactivates() {
    let (a, _, a_cleanups, _) = Counted::new("a");
    let mut host = host(1, 4);
    host.swap_registry(ProgramRegistry::new(vec![a]));

    host.swap_registry(ProgramRegistry::new(Vec::new()));
    assert_eq!(host.active_program(), None);
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 1);
    // Idle frames are fine.
    host.run().unwrap();
}

/// Sink that shares its presented frames with the test
#[derive(Default)]
struct SharedSink {
    inner: CaptureSink,
    frames: Arc<Mutex<Vec<Vec<Rgb>>>>,
}

impl PixelSink for SharedSink {
    fn set_pixel(&mut self, strip: usize, led: usize, color: Rgb) -> ledvis_rs::Result<()> {
        self.inner.set_pixel(strip, led, color)
    }

    fn refresh(&mut self, strip: usize) -> ledvis_rs::Result<()> {
        self.inner.refresh(strip)?;
        let mut frames = self.frames.lock().unwrap();
        if frames.len() <= strip {
            frames.resize_with(strip + 1, Vec::new);
        }
        frames[strip] = self.inner.presented(strip).to_vec();
        Ok(())
    }
}

/// Static palette gradient, one sample per LED position
struct Gradient;

impl Program for Gradient {
    fn name(&self) -> &str {
        "gradient"
    }

    fn update(&mut self, _time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette) {
        for s in 0..pixels.strip_count() {
            let leds = pixels.led_count(s);
            for i in 0..leds {
                let index = (i * 255 / leds) as u8;
                pixels.set(s, i, palette.sample(index, 255, true));
            }
        }
    }
}

#[test]
fn test_frame_reaches_sink_with_palette_colors() {
    let topology = Topology::uniform(2, 4).unwrap();
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = SharedSink {
        inner: CaptureSink::default(),
        frames: Arc::clone(&frames),
    };

    let mut host = ExecutionHost::new(topology, Box::new(sink));
    host.swap_registry(ProgramRegistry::new(vec![Box::new(Gradient)]));
    host.run().unwrap();

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    let expected: Vec<Rgb> = [0u8, 63, 127, 191]
        .iter()
        .map(|&index| RAINBOW.sample(index, 255, true))
        .collect();
    assert_eq!(frames[0], expected);
    assert_eq!(frames[1], expected);
}
