//! Execution host: pixel buffer, program lifecycle, frame execution
//!
//! The [`ExecutionHost`] owns everything a frame touches: the validated
//! [`Topology`], the [`PixelBuffer`] shaped from it, the active
//! [`ProgramRegistry`], the active palette, and the [`PixelSink`] the
//! buffer is flushed into. One `run()` call drives exactly one frame:
//! the active program writes the buffer through a [`Pixels`] view, then the
//! flush step reads it out to the sink — single writer, single reader,
//! strictly sequenced.
//!
//! Program switching honors the lifecycle contract: the outgoing program's
//! `cleanup` runs exactly once before it is deactivated, the incoming
//! program's `init` exactly once after. Out-of-range selections are logged
//! and ignored. When no program is active, `run()` is a no-op that reports
//! once rather than every frame.

use std::time::Instant;

use crate::error::Result;
use crate::palette::{Palette, Rgb, RAINBOW};
use crate::program::ProgramRegistry;
use crate::sink::PixelSink;
use crate::topology::Topology;

/// Per-strip, per-LED color state, shaped from the current topology
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    strips: Vec<Vec<Rgb>>,
}

impl PixelBuffer {
    /// Allocate a black buffer matching `topology`
    pub fn from_topology(topology: &Topology) -> Self {
        Self {
            strips: topology
                .strips()
                .iter()
                .map(|s| vec![Rgb::BLACK; s.led_count])
                .collect(),
        }
    }

    /// Color at `(strip, led)`, black when out of range
    pub fn get(&self, strip: usize, led: usize) -> Rgb {
        self.strips
            .get(strip)
            .and_then(|s| s.get(led))
            .copied()
            .unwrap_or(Rgb::BLACK)
    }

    /// Set `(strip, led)`; out-of-range writes are dropped
    pub fn set(&mut self, strip: usize, led: usize, color: Rgb) {
        if let Some(slot) = self.strips.get_mut(strip).and_then(|s| s.get_mut(led)) {
            *slot = color;
        }
    }

    /// Per-strip rows, in topology order
    pub fn strips(&self) -> &[Vec<Rgb>] {
        &self.strips
    }
}

/// Read/write pixel view handed to a program for one `update` call.
///
/// Reads of out-of-range pixels yield black and writes to them are dropped,
/// so programs can iterate `0..max_leds()` uniformly across strips of
/// different lengths.
pub struct Pixels<'a> {
    topology: &'a Topology,
    buffer: &'a mut PixelBuffer,
}

impl<'a> Pixels<'a> {
    pub(crate) fn new(topology: &'a Topology, buffer: &'a mut PixelBuffer) -> Self {
        Self { topology, buffer }
    }

    /// Number of strips
    pub fn strip_count(&self) -> usize {
        self.topology.strip_count()
    }

    /// LED count of `strip`, 0 when out of range
    pub fn led_count(&self, strip: usize) -> usize {
        self.topology.led_count(strip)
    }

    /// Largest per-strip LED count
    pub fn max_leds(&self) -> usize {
        self.topology.max_leds()
    }

    /// The topology being driven (positions, lengths, matrix mapping)
    pub fn topology(&self) -> &Topology {
        self.topology
    }

    /// Current color at `(strip, led)`
    pub fn get(&self, strip: usize, led: usize) -> Rgb {
        self.buffer.get(strip, led)
    }

    /// Set the color at `(strip, led)`
    pub fn set(&mut self, strip: usize, led: usize, color: Rgb) {
        self.buffer.set(strip, led, color);
    }
}

/// Owns the topology, pixel buffer, active program and palette, and drives
/// one program through one frame per [`run`](ExecutionHost::run) call.
pub struct ExecutionHost {
    topology: Topology,
    buffer: PixelBuffer,
    registry: ProgramRegistry,
    active: Option<usize>,
    palette: Palette,
    sink: Box<dyn PixelSink>,
    start: Instant,
    missing_program_reported: bool,
}

impl ExecutionHost {
    /// Create a host over `topology`, flushing frames into `sink`.
    ///
    /// Starts with an empty registry, no active program, and the Rainbow
    /// palette.
    pub fn new(topology: Topology, sink: Box<dyn PixelSink>) -> Self {
        let buffer = PixelBuffer::from_topology(&topology);
        Self {
            topology,
            buffer,
            registry: ProgramRegistry::default(),
            active: None,
            palette: RAINBOW,
            sink,
            start: Instant::now(),
            missing_program_reported: false,
        }
    }

    /// The topology this host drives
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The current pixel buffer contents
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Index of the active program, if any
    pub fn active_program(&self) -> Option<usize> {
        self.active
    }

    /// Names of the currently registered programs
    pub fn program_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Replace the active palette
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// The active palette
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Activate the program at `index`.
    ///
    /// Cleans up the currently active program (exactly once) before
    /// activating the new one and running its `init` (exactly once).
    /// An out-of-range index is reported and ignored.
    pub fn set_program(&mut self, index: usize) {
        if index >= self.registry.len() {
            tracing::warn!(
                index,
                programs = self.registry.len(),
                "program selection out of range, ignoring"
            );
            return;
        }

        self.deactivate();
        if let Some(program) = self.registry.get_mut(index) {
            program.init();
            tracing::info!(index, name = program.name(), "switched to program");
        }
        self.active = Some(index);
        self.missing_program_reported = false;
    }

    /// Cycle to the next program in registry order
    pub fn next_program(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let next = self.active.map_or(0, |i| (i + 1) % self.registry.len());
        self.set_program(next);
    }

    /// Replace the whole program registry after a confirmed module load.
    ///
    /// The outgoing active program is cleaned up, then the previous
    /// registry is dropped. The active index is kept when it still fits the
    /// new registry and reset to 0 otherwise (also when nothing was active
    /// before); the surviving program's `init` runs once.
    pub fn swap_registry(&mut self, registry: ProgramRegistry) {
        let previous = self.active;
        self.deactivate();
        self.registry = registry;

        if self.registry.is_empty() {
            tracing::warn!("new program registry is empty, nothing active");
            return;
        }

        let index = match previous {
            Some(i) if i < self.registry.len() => i,
            Some(_) => {
                tracing::info!("active program no longer exists, resetting to 0");
                0
            }
            None => 0,
        };
        self.set_program(index);
    }

    /// Run one frame: invoke the active program's update, then flush the
    /// pixel buffer to the sink.
    ///
    /// With no active program this is a no-op that reports once, not every
    /// frame.
    pub fn run(&mut self) -> Result<()> {
        let Some(index) = self.active else {
            if !self.missing_program_reported {
                tracing::error!("no active program, frames are idle");
                self.missing_program_reported = true;
            }
            return Ok(());
        };

        let time_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        if let Some(program) = self.registry.get_mut(index) {
            let mut pixels = Pixels::new(&self.topology, &mut self.buffer);
            program.update(time_ms, &mut pixels, &self.palette);
        }

        self.flush()
    }

    /// Clean up the active program and release the sink
    pub fn shutdown(&mut self) -> Result<()> {
        self.deactivate();
        self.sink.shutdown()
    }

    fn deactivate(&mut self) {
        if let Some(index) = self.active.take() {
            if let Some(program) = self.registry.get_mut(index) {
                program.cleanup();
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        for (strip, row) in self.buffer.strips.iter().enumerate() {
            for (led, &color) in row.iter().enumerate() {
                self.sink.set_pixel(strip, led, color)?;
            }
            self.sink.refresh(strip)?;
        }
        Ok(())
    }
}
