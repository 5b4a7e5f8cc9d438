//! Run configuration
//!
//! Two entry points build a [`Topology`] for the runtime:
//!
//! - [`RunConfig`] — the desktop simulator's command line: a required
//!   program source path plus strip/LED counts.
//! - [`HardwareConfig`] — the embedded side's static descriptor: one pin
//!   assignment per strip and a target frame rate, compiled into the
//!   firmware. The pin numbers are consumed by the external strip driver;
//!   the runtime only derives the topology from the LED counts.

use std::path::PathBuf;

use crate::error::Result;
use crate::scheduler::DEFAULT_TARGET_FPS;
use crate::topology::Topology;

/// Bounds and defaults for the desktop CLI
pub const MIN_STRIPS: usize = 1;
pub const MAX_CLI_STRIPS: usize = 4;
pub const DEFAULT_STRIPS: usize = 4;
pub const MIN_LEDS: usize = 1;
pub const MAX_CLI_LEDS: usize = 144;
pub const DEFAULT_LEDS: usize = 144;

/// Desktop simulator configuration, parsed from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Path to the user's program source file
    pub source: PathBuf,
    /// Number of strips (1–4)
    pub strips: usize,
    /// LEDs per strip (1–144)
    pub leds: usize,
    /// Animation rate
    pub target_fps: u32,
}

/// What argument parsing asked the caller to do
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedArgs {
    /// Run with this configuration
    Run(RunConfig),
    /// `-h`/`--help`: print usage and exit 0
    Help,
}

impl RunConfig {
    /// Parse the CLI surface: `ledvis <programs.c> [--strips N] [--leds N]`.
    ///
    /// Errors (missing source, unknown flag, out-of-range value) are
    /// returned as a message; the caller prints usage and exits 1.
    pub fn from_args<I>(args: I) -> std::result::Result<ParsedArgs, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut source: Option<PathBuf> = None;
        let mut strips = DEFAULT_STRIPS;
        let mut leds = DEFAULT_LEDS;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(ParsedArgs::Help),
                "--strips" => {
                    strips = parse_count(args.next(), "--strips", MIN_STRIPS, MAX_CLI_STRIPS)?;
                }
                "--leds" => {
                    leds = parse_count(args.next(), "--leds", MIN_LEDS, MAX_CLI_LEDS)?;
                }
                flag if flag.starts_with('-') => {
                    return Err(format!("unknown option `{flag}`"));
                }
                _ => {
                    if source.is_some() {
                        return Err(format!("unexpected extra argument `{arg}`"));
                    }
                    source = Some(PathBuf::from(arg));
                }
            }
        }

        let Some(source) = source else {
            return Err("missing program source path".to_string());
        };

        Ok(ParsedArgs::Run(RunConfig {
            source,
            strips,
            leds,
            target_fps: DEFAULT_TARGET_FPS,
        }))
    }

    /// The topology this configuration describes
    pub fn topology(&self) -> Result<Topology> {
        Topology::uniform(self.strips, self.leds)
    }
}

/// Usage text for the desktop binary
pub fn usage() -> String {
    format!(
        "Usage: ledvis <programs.c> [options]\n\
         \n\
         Options:\n\
         \x20 --strips N   number of strips ({MIN_STRIPS}-{MAX_CLI_STRIPS}, default {DEFAULT_STRIPS})\n\
         \x20 --leds N     LEDs per strip ({MIN_LEDS}-{MAX_CLI_LEDS}, default {DEFAULT_LEDS})\n\
         \x20 -h, --help   print this help\n\
         \n\
         The program source is compiled with $CC (default `cc`) against the\n\
         bundled SDK and hot-reloaded whenever the file changes."
    )
}

fn parse_count(
    value: Option<String>,
    flag: &str,
    min: usize,
    max: usize,
) -> std::result::Result<usize, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
    let parsed: usize = value
        .parse()
        .map_err(|_| format!("{flag}: `{value}` is not a number"))?;
    if !(min..=max).contains(&parsed) {
        return Err(format!("{flag}: {parsed} outside {min}-{max}"));
    }
    Ok(parsed)
}

/// Static per-strip descriptor for embedded builds: the pin driving the
/// strip and its LED count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareStrip {
    /// Pin identifier, meaningful to the external strip driver
    pub pin: u32,
    pub led_count: usize,
}

/// Embedded runtime configuration, typically a compile-time constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    pub strips: Vec<HardwareStrip>,
    pub target_fps: u32,
}

impl HardwareConfig {
    /// Derive a topology: strips evenly spaced, lengths unknown to the
    /// descriptor and left at 100 cm.
    pub fn topology(&self) -> Result<Topology> {
        use crate::topology::StripDescriptor;

        let count = self.strips.len();
        let strips = self
            .strips
            .iter()
            .enumerate()
            .map(|(i, hw)| {
                let position = if count <= 1 {
                    0.0
                } else {
                    -0.5 + i as f32 / (count - 1) as f32
                };
                StripDescriptor::strip(i as u32, hw.led_count, position, 100.0)
            })
            .collect();
        Topology::new(strips)
    }
}
