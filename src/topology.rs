//! Strip and matrix topology
//!
//! A [`Topology`] describes the physical layout the runtime drives: an
//! ordered list of strips, each with an LED count, a 1-D physical position
//! in `[-1, 1]`, a physical length, and optionally matrix dimensions. It is
//! validated once at startup and immutable for the rest of the run; the
//! pixel buffer is always shaped from it.
//!
//! Matrix strips are addressed through a serpentine mapping
//! ([`serpentine_index`]): even columns run top to bottom, odd columns run
//! bottom to top, and out-of-range coordinates clamp rather than fail.
//! All per-strip accessors return neutral defaults (0 / false) for
//! out-of-range strip indices so callers never have to guard.

use crate::error::{LedVisError, Result};

/// Upper bound on the number of strips accepted at startup.
///
/// A validation bound only — buffers are sized from the actual topology,
/// never from this constant.
pub const MAX_STRIPS: usize = 8;

/// Upper bound on LEDs per strip accepted at startup.
pub const MAX_LEDS_PER_STRIP: usize = 1024;

/// Matrix dimensions for a strip addressable as a 2-D panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSize {
    pub width: usize,
    pub height: usize,
}

/// Physical description of a single strip
#[derive(Debug, Clone, PartialEq)]
pub struct StripDescriptor {
    /// Stable identifier, unique within a topology
    pub id: u32,
    /// Number of addressable LEDs
    pub led_count: usize,
    /// 1-D physical position in `[-1, 1]`
    pub position: f32,
    /// Physical length in centimeters
    pub length_cm: f32,
    /// Matrix dimensions when the strip is a 2-D panel
    pub matrix: Option<MatrixSize>,
}

impl StripDescriptor {
    /// A plain linear strip
    pub fn strip(id: u32, led_count: usize, position: f32, length_cm: f32) -> Self {
        Self {
            id,
            led_count,
            position,
            length_cm,
            matrix: None,
        }
    }

    /// A serpentine matrix panel; the LED count is `width * height`
    pub fn matrix(id: u32, width: usize, height: usize, position: f32, length_cm: f32) -> Self {
        Self {
            id,
            led_count: width * height,
            position,
            length_cm,
            matrix: Some(MatrixSize { width, height }),
        }
    }
}

/// Serpentine `(x, y)` to linear index mapping.
///
/// Pure function of `(width, height, x, y)`. Coordinates are clamped into
/// `[0, width-1]` / `[0, height-1]`; even columns map straight down, odd
/// columns are reversed.
pub fn serpentine_index(width: usize, height: usize, x: i32, y: i32) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }

    let x = (x.max(0) as usize).min(width - 1);
    let y = (y.max(0) as usize).min(height - 1);

    if x % 2 == 1 {
        // Odd column, reverse y
        x * height + (height - 1 - y)
    } else {
        x * height + y
    }
}

/// Ordered, validated set of strip descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    strips: Vec<StripDescriptor>,
}

impl Topology {
    /// Validate and build a topology.
    ///
    /// Rejected outright (configuration errors, fatal at startup): an empty
    /// strip list, more than [`MAX_STRIPS`] strips, an LED count of zero or
    /// above [`MAX_LEDS_PER_STRIP`], a position outside `[-1, 1]`, a
    /// duplicate strip id, or matrix dimensions that disagree with the LED
    /// count.
    pub fn new(strips: Vec<StripDescriptor>) -> Result<Self> {
        if strips.is_empty() {
            return Err(LedVisError::Config("topology has no strips".into()));
        }
        if strips.len() > MAX_STRIPS {
            return Err(LedVisError::Config(format!(
                "{} strips exceeds the maximum of {MAX_STRIPS}",
                strips.len()
            )));
        }

        for (i, strip) in strips.iter().enumerate() {
            if strip.led_count == 0 || strip.led_count > MAX_LEDS_PER_STRIP {
                return Err(LedVisError::Config(format!(
                    "strip {i}: LED count {} outside 1..={MAX_LEDS_PER_STRIP}",
                    strip.led_count
                )));
            }
            if !(-1.0..=1.0).contains(&strip.position) {
                return Err(LedVisError::Config(format!(
                    "strip {i}: position {} outside [-1, 1]",
                    strip.position
                )));
            }
            if strips[..i].iter().any(|other| other.id == strip.id) {
                return Err(LedVisError::Config(format!(
                    "strip {i}: duplicate id {}",
                    strip.id
                )));
            }
            if let Some(m) = strip.matrix {
                if m.width == 0 || m.height == 0 {
                    return Err(LedVisError::Config(format!(
                        "strip {i}: matrix dimensions must be nonzero",
                    )));
                }
                if m.width * m.height != strip.led_count {
                    return Err(LedVisError::Config(format!(
                        "strip {i}: matrix {}x{} does not match LED count {}",
                        m.width, m.height, strip.led_count
                    )));
                }
            }
        }

        Ok(Self { strips })
    }

    /// Uniform topology for the desktop simulator: `num_strips` strips of
    /// `leds_per_strip` LEDs, 100 cm each, evenly spaced across the middle
    /// of the position range.
    pub fn uniform(num_strips: usize, leds_per_strip: usize) -> Result<Self> {
        let strips = (0..num_strips)
            .map(|i| {
                let position = if num_strips <= 1 {
                    0.0
                } else {
                    -0.5 + i as f32 / (num_strips - 1) as f32
                };
                StripDescriptor::strip(i as u32, leds_per_strip, position, 100.0)
            })
            .collect();
        Self::new(strips)
    }

    /// Number of strips
    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }

    /// All strip descriptors, in order
    pub fn strips(&self) -> &[StripDescriptor] {
        &self.strips
    }

    /// LED count of `strip`, or 0 when out of range
    pub fn led_count(&self, strip: usize) -> usize {
        self.strips.get(strip).map_or(0, |s| s.led_count)
    }

    /// Physical position of `strip`, or 0.0 when out of range
    pub fn position(&self, strip: usize) -> f32 {
        self.strips.get(strip).map_or(0.0, |s| s.position)
    }

    /// Physical length of `strip` in centimeters, or 0.0 when out of range
    pub fn length_cm(&self, strip: usize) -> f32 {
        self.strips.get(strip).map_or(0.0, |s| s.length_cm)
    }

    /// Whether `strip` is a matrix panel
    pub fn is_matrix(&self, strip: usize) -> bool {
        self.strips.get(strip).is_some_and(|s| s.matrix.is_some())
    }

    /// Matrix width of `strip`, or 0 for linear or out-of-range strips
    pub fn matrix_width(&self, strip: usize) -> usize {
        self.strips
            .get(strip)
            .and_then(|s| s.matrix)
            .map_or(0, |m| m.width)
    }

    /// Matrix height of `strip`, or 0 for linear or out-of-range strips
    pub fn matrix_height(&self, strip: usize) -> usize {
        self.strips
            .get(strip)
            .and_then(|s| s.matrix)
            .map_or(0, |m| m.height)
    }

    /// Serpentine linear index of `(x, y)` on `strip`; 0 when the strip is
    /// not a matrix or out of range
    pub fn matrix_index(&self, strip: usize, x: i32, y: i32) -> usize {
        match self.strips.get(strip).and_then(|s| s.matrix) {
            Some(m) => serpentine_index(m.width, m.height, x, y),
            None => 0,
        }
    }

    /// Total LED count across all strips
    pub fn total_leds(&self) -> usize {
        self.strips.iter().map(|s| s.led_count).sum()
    }

    /// Largest per-strip LED count
    pub fn max_leds(&self) -> usize {
        self.strips.iter().map(|s| s.led_count).max().unwrap_or(0)
    }
}
