//! # LedVis-RS: LED Visualizer Runtime
//!
//! A runtime for driving addressable LED strips and matrices from small
//! user-authored animation programs, with a desktop simulator that
//! hot-reloads programs as their source changes.
//!
//! ## Architecture
//!
//! - **Topology**: strip and matrix layout, serpentine coordinate mapping
//! - **Palette**: 16-entry palettes with FastLED-compatible integer sampling
//! - **Host**: the pixel buffer, the active program, and the output sink
//! - **Scheduler**: the fixed-rate frame loop and its command channel
//! - **Reload**: desktop-only compile/load/watch pipeline for C modules
//!
//! Programs come from two sources that plug into the same
//! [`ProgramRegistry`](program::ProgramRegistry): native Rust programs
//! built into the binary ([`programs::builtin_registry`]) and C modules
//! compiled against the bundled SDK and loaded at runtime
//! ([`reload::load_module`]).
//!
//! ## Example
//!
//! ```ignore
//! use ledvis_rs::{
//!     host::ExecutionHost,
//!     palette::RAINBOW,
//!     programs::builtin_registry,
//!     scheduler::Scheduler,
//!     sink::CaptureSink,
//!     topology::Topology,
//! };
//!
//! fn main() -> ledvis_rs::error::Result<()> {
//!     let topology = Topology::uniform(4, 144)?;
//!     let mut host = ExecutionHost::new(topology, Box::new(CaptureSink::default()));
//!     host.swap_registry(builtin_registry());
//!     host.set_palette(RAINBOW);
//!
//!     let mut scheduler = Scheduler::new(host, 60);
//!     scheduler.run(|_host| {})?;
//!     scheduler.into_host().shutdown()
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod palette;
pub mod program;
pub mod programs;
pub mod reload;
pub mod scheduler;
pub mod sink;
pub mod topology;

pub use error::{LedVisError, Result};
pub use host::ExecutionHost;
pub use palette::{Palette, Rgb};
pub use program::{Program, ProgramRegistry};
pub use scheduler::Scheduler;
pub use topology::Topology;
