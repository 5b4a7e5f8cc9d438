//! Pixel sinks
//!
//! A [`PixelSink`] is where computed frames go: the physical strip driver
//! on hardware, a renderer on the desktop. The contract is deliberately
//! narrow — for every strip/LED pair the host issues one `set_pixel` call
//! with 8-bit RGB, followed by one `refresh` call per strip once all its
//! pixels are set. Whatever encodes pulses or draws scenes lives behind
//! this trait, outside the runtime.
//!
//! Two implementations ship with the crate:
//!
//! - [`CaptureSink`] — records everything in memory; the headless sink used
//!   by tests and benchmarks.
//! - [`TerminalSink`] — paints strips as colored cells in the terminal, the
//!   desktop simulator's default view. Matrices are drawn as a
//!   `width x height` grid by inverting the serpentine mapping.

use std::io::{self, Write};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};

use crate::error::{LedVisError, Result};
use crate::palette::Rgb;
use crate::topology::Topology;

/// Destination for computed frames
pub trait PixelSink {
    /// Stage the color of one LED
    fn set_pixel(&mut self, strip: usize, led: usize, color: Rgb) -> Result<()>;

    /// Present everything staged for `strip`
    fn refresh(&mut self, strip: usize) -> Result<()>;

    /// Release any claimed resources; called once at host shutdown
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink recording the last presented frame, for tests and
/// headless use
#[derive(Debug, Default)]
pub struct CaptureSink {
    staged: Vec<Vec<Rgb>>,
    presented: Vec<Vec<Rgb>>,
    refreshes: usize,
}

impl CaptureSink {
    /// Colors most recently presented for `strip`
    pub fn presented(&self, strip: usize) -> &[Rgb] {
        self.presented.get(strip).map_or(&[], |s| s.as_slice())
    }

    /// Total number of `refresh` calls observed
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    fn row(rows: &mut Vec<Vec<Rgb>>, strip: usize) -> &mut Vec<Rgb> {
        if rows.len() <= strip {
            rows.resize_with(strip + 1, Vec::new);
        }
        &mut rows[strip]
    }
}

impl PixelSink for CaptureSink {
    fn set_pixel(&mut self, strip: usize, led: usize, color: Rgb) -> Result<()> {
        let row = Self::row(&mut self.staged, strip);
        if row.len() <= led {
            row.resize(led + 1, Rgb::BLACK);
        }
        row[led] = color;
        Ok(())
    }

    fn refresh(&mut self, strip: usize) -> Result<()> {
        let staged = Self::row(&mut self.staged, strip).clone();
        *Self::row(&mut self.presented, strip) = staged;
        self.refreshes += 1;
        Ok(())
    }
}

/// Row/column placement of one strip in the terminal grid
#[derive(Debug, Clone, Copy)]
struct StripLayout {
    top_row: u16,
    /// Matrix dimensions, or `None` for a single-row linear strip
    matrix: Option<(usize, usize)>,
}

/// Terminal view of the strips, painted with crossterm.
///
/// Each linear strip is one row of colored cells; each matrix strip is a
/// grid. The sink claims the terminal (hides the cursor, clears the
/// screen) on construction and restores it on shutdown.
pub struct TerminalSink {
    out: io::Stdout,
    layouts: Vec<StripLayout>,
    staged: Vec<Vec<Rgb>>,
}

impl TerminalSink {
    /// Claim the terminal and lay out one row (or grid) per strip.
    ///
    /// Fails with a hardware error when the terminal cannot be claimed;
    /// anything already written is reset before returning.
    pub fn new(topology: &Topology) -> Result<Self> {
        let mut layouts = Vec::with_capacity(topology.strip_count());
        let mut next_row: u16 = 1;
        for strip in topology.strips() {
            let matrix = strip.matrix.map(|m| (m.width, m.height));
            let rows = matrix.map_or(1, |(_, h)| h as u16);
            layouts.push(StripLayout {
                top_row: next_row,
                matrix,
            });
            next_row += rows + 1;
        }

        let mut out = io::stdout();
        if let Err(err) = execute!(
            out,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        ) {
            // Best effort: undo a partial claim before failing startup.
            let _ = execute!(out, cursor::Show, ResetColor);
            return Err(LedVisError::Hardware(format!(
                "terminal sink init failed: {err}"
            )));
        }

        Ok(Self {
            out,
            layouts,
            staged: topology
                .strips()
                .iter()
                .map(|s| vec![Rgb::BLACK; s.led_count])
                .collect(),
        })
    }

    /// Terminal cell position of a linear LED index within a strip.
    ///
    /// Inverts the serpentine mapping for matrices so the grid reads in
    /// physical (x, y) orientation.
    fn cell(layout: StripLayout, led: usize) -> (u16, u16) {
        match layout.matrix {
            Some((_, height)) if height > 0 => {
                let x = led / height;
                let mut y = led % height;
                if x % 2 == 1 {
                    y = height - 1 - y;
                }
                (x as u16 * 2, layout.top_row + y as u16)
            }
            _ => (led as u16 * 2, layout.top_row),
        }
    }
}

impl PixelSink for TerminalSink {
    fn set_pixel(&mut self, strip: usize, led: usize, color: Rgb) -> Result<()> {
        if let Some(slot) = self.staged.get_mut(strip).and_then(|s| s.get_mut(led)) {
            *slot = color;
        }
        Ok(())
    }

    fn refresh(&mut self, strip: usize) -> Result<()> {
        let Some(&layout) = self.layouts.get(strip) else {
            return Ok(());
        };
        let Some(row) = self.staged.get(strip) else {
            return Ok(());
        };

        for (led, color) in row.iter().enumerate() {
            let (col, line) = Self::cell(layout, led);
            queue!(
                self.out,
                cursor::MoveTo(col, line),
                SetForegroundColor(Color::Rgb {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                }),
                Print("\u{2588}")
            )
            .map_err(|err| LedVisError::Hardware(format!("terminal write failed: {err}")))?;
        }
        self.out
            .flush()
            .map_err(|err| LedVisError::Hardware(format!("terminal flush failed: {err}")))?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        execute!(self.out, ResetColor, cursor::Show)
            .map_err(|err| LedVisError::Hardware(format!("terminal restore failed: {err}")))?;
        Ok(())
    }
}
