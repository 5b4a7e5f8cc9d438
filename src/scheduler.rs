//! Fixed-rate frame scheduler
//!
//! Single cooperative loop driving the [`ExecutionHost`] at a target frame
//! rate (default 60 fps). Each iteration records its start time, drains
//! pending [`HostCommand`]s, runs the per-tick hook (the reload pipeline on
//! desktop), executes one frame, and sleeps away whatever is left of the
//! frame period. An overrunning frame simply lowers the effective rate —
//! frames are never skipped to catch up.
//!
//! Everything the frame touches is owned by this one thread. External
//! actors get two narrow inroads, both observed once per frame boundary:
//! the command channel (program/palette selection) and the shared running
//! flag ([`Scheduler::running_handle`]) for cooperative stop. An
//! in-progress update is never interrupted; programs are expected to
//! return promptly every frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::error::Result;
use crate::host::ExecutionHost;
use crate::palette::Palette;

/// Default animation rate
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Rare, single-writer commands delivered to the host between frames
#[derive(Debug, Clone)]
pub enum HostCommand {
    /// Activate the program at an index
    SetProgram(usize),
    /// Cycle to the next program
    NextProgram,
    /// Replace the active palette
    SetPalette(Palette),
}

/// Fixed-rate loop around an [`ExecutionHost`]
pub struct Scheduler {
    host: ExecutionHost,
    frame_period: Duration,
    running: Arc<AtomicBool>,
    commands: Option<Receiver<HostCommand>>,
}

impl Scheduler {
    /// Wrap `host` in a loop targeting `target_fps` frames per second.
    ///
    /// `frame_period = 1_000_000 / target_fps` microseconds; a zero rate is
    /// clamped to 1.
    pub fn new(host: ExecutionHost, target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        Self {
            host,
            frame_period: Duration::from_micros(1_000_000 / u64::from(fps)),
            running: Arc::new(AtomicBool::new(true)),
            commands: None,
        }
    }

    /// Attach a command channel, drained once per frame
    pub fn with_commands(mut self, commands: Receiver<HostCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Shared stop flag: store `false` to end the loop at the next frame
    /// boundary
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// The host being driven
    pub fn host_mut(&mut self) -> &mut ExecutionHost {
        &mut self.host
    }

    /// Run until the stop flag clears.
    ///
    /// `on_tick` runs once per iteration before the frame — the desktop
    /// host polls the reload pipeline there. A sink failure ends the loop
    /// with the error.
    pub fn run<F>(&mut self, mut on_tick: F) -> Result<()>
    where
        F: FnMut(&mut ExecutionHost),
    {
        tracing::info!(
            period_us = self.frame_period.as_micros() as u64,
            "starting animation loop"
        );

        while self.running.load(Ordering::Relaxed) {
            let frame_start = Instant::now();

            self.drain_commands();
            on_tick(&mut self.host);
            self.host.run()?;

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_period {
                thread::sleep(self.frame_period - elapsed);
            }
            // An overrun frame proceeds immediately; no compensation.
        }

        tracing::info!("animation loop stopped");
        Ok(())
    }

    /// Tear down the loop and hand the host back (for shutdown)
    pub fn into_host(self) -> ExecutionHost {
        self.host
    }

    fn drain_commands(&mut self) {
        let Some(commands) = &self.commands else {
            return;
        };
        while let Ok(command) = commands.try_recv() {
            match command {
                HostCommand::SetProgram(index) => self.host.set_program(index),
                HostCommand::NextProgram => self.host.next_program(),
                HostCommand::SetPalette(palette) => self.host.set_palette(palette),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Pixels;
    use crate::palette::{Rgb, OCEAN};
    use crate::program::{Program, ProgramRegistry};
    use crate::sink::CaptureSink;
    use crate::topology::Topology;

    /// Counts frames and clears the running flag after a fixed number
    struct CountThenStop {
        frames: Arc<std::sync::atomic::AtomicUsize>,
        limit: usize,
        running: Arc<AtomicBool>,
    }

    impl Program for CountThenStop {
        fn name(&self) -> &str {
            "count-then-stop"
        }

        fn update(&mut self, _time_ms: f64, pixels: &mut Pixels<'_>, _palette: &Palette) {
            let n = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
            pixels.set(0, 0, Rgb::new(n as u8, 0, 0));
            if n >= self.limit {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_loop_runs_every_frame_until_stopped() {
        let topology = Topology::uniform(1, 4).unwrap();
        let mut host = ExecutionHost::new(topology, Box::new(CaptureSink::default()));

        let frames = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(host, 500);
        let running = scheduler.running_handle();
        scheduler
            .host_mut()
            .swap_registry(ProgramRegistry::new(vec![Box::new(CountThenStop {
                frames: Arc::clone(&frames),
                limit: 3,
                running,
            })]));

        scheduler.run(|_| {}).unwrap();
        // Exactly three updates: the stop flag is observed at the frame
        // boundary after the third.
        assert_eq!(frames.load(Ordering::SeqCst), 3);

        host = scheduler.into_host();
        assert_eq!(host.buffer().get(0, 0), Rgb::new(3, 0, 0));
    }

    #[test]
    fn test_commands_are_applied_between_frames() {
        let topology = Topology::uniform(1, 4).unwrap();
        let host = ExecutionHost::new(topology, Box::new(CaptureSink::default()));

        let (tx, rx) = crossbeam_channel::unbounded();
        let frames = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(host, 500).with_commands(rx);
        let running = scheduler.running_handle();
        scheduler
            .host_mut()
            .swap_registry(ProgramRegistry::new(vec![Box::new(CountThenStop {
                frames,
                limit: 2,
                running,
            })]));

        tx.send(HostCommand::SetPalette(OCEAN)).unwrap();
        scheduler.run(|_| {}).unwrap();
        assert_eq!(scheduler.into_host().palette(), &OCEAN);
    }

    /// Sink whose refresh always fails but still counts shutdowns
    struct FailingSink {
        shutdowns: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl crate::sink::PixelSink for FailingSink {
        fn set_pixel(&mut self, _strip: usize, _led: usize, _color: Rgb) -> Result<()> {
            Ok(())
        }

        fn refresh(&mut self, _strip: usize) -> Result<()> {
            Err(crate::error::LedVisError::Hardware(
                "refresh failed".into(),
            ))
        }

        fn shutdown(&mut self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_ends_loop_but_host_still_shuts_down() {
        let topology = Topology::uniform(1, 2).unwrap();
        let shutdowns = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut host = ExecutionHost::new(
            topology,
            Box::new(FailingSink {
                shutdowns: Arc::clone(&shutdowns),
            }),
        );

        let frames = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(host, 500);
        let running = scheduler.running_handle();
        scheduler
            .host_mut()
            .swap_registry(ProgramRegistry::new(vec![Box::new(CountThenStop {
                frames,
                limit: usize::MAX,
                running,
            })]));

        // The first flush fails and ends the loop with the error.
        assert!(scheduler.run(|_| {}).is_err());

        // The host must still be recoverable for shutdown afterwards.
        host = scheduler.into_host();
        host.shutdown().unwrap();
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let topology = Topology::uniform(1, 1).unwrap();
        let host = ExecutionHost::new(topology, Box::new(CaptureSink::default()));
        let scheduler = Scheduler::new(host, 0);
        assert_eq!(scheduler.frame_period, Duration::from_micros(1_000_000));
    }
}
