//! Color palettes and palette sampling
//!
//! A [`Palette`] is a fixed 16-entry gradient, conceptually cyclic: when
//! interpolating, entry 15 wraps back to entry 0. An 8-bit sample index is
//! spread across the 16 entries (each entry spans 16 index values), so the
//! full `0..=255` range sweeps the whole gradient.
//!
//! The sampling math is pure 8/16-bit integer arithmetic with truncating
//! division and must stay bit-exact — hardware builds of the runtime produce
//! the same bytes for the same inputs. Brightness is applied *after*
//! interpolation; reversing the order changes output at boundary indices.
//!
//! Seven built-in palettes are provided as literal tables, plus a small
//! named registry ([`BUILTIN_PALETTES`], [`Palette::by_name`]) for
//! selection by user input.

/// A single LED color: three independent 8-bit channels.
///
/// `repr(C)` because colors cross the module ABI: loaded program modules
/// receive the palette as a pointer to these entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channel values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Number of entries in every palette
pub const PALETTE_LEN: usize = 16;

/// A 16-entry cyclic gradient palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgb; PALETTE_LEN],
}

impl Palette {
    /// Create a palette from exactly 16 entries
    pub const fn new(entries: [Rgb; PALETTE_LEN]) -> Self {
        Self { entries }
    }

    /// The raw entry table
    pub fn entries(&self) -> &[Rgb; PALETTE_LEN] {
        &self.entries
    }

    /// Entry at `index` (0..15)
    pub fn entry(&self, index: usize) -> Rgb {
        self.entries[index & 0x0f]
    }

    /// Sample a color from the palette.
    ///
    /// `index` maps across the 16 entries (`entry = index >> 4`, fractional
    /// position `index & 0xF`). With `interpolate` set and a nonzero
    /// fraction, the result blends linearly toward the next entry, wrapping
    /// 15 → 0. `brightness` scales the blended channels afterwards;
    /// 255 means unscaled.
    pub fn sample(&self, index: u8, brightness: u8, interpolate: bool) -> Rgb {
        let entry = (index >> 4) as usize;
        let fraction = index & 0x0f;

        let mut color = if !interpolate || fraction == 0 {
            self.entries[entry]
        } else {
            let c1 = self.entries[entry];
            let c2 = self.entries[(entry + 1) & 0x0f];

            // fraction is 0-15, scale to 0-255 for the lerp
            let blend = u16::from(fraction << 4);
            let inv_blend = 255 - blend;

            Rgb {
                r: ((u16::from(c1.r) * inv_blend + u16::from(c2.r) * blend) >> 8) as u8,
                g: ((u16::from(c1.g) * inv_blend + u16::from(c2.g) * blend) >> 8) as u8,
                b: ((u16::from(c1.b) * inv_blend + u16::from(c2.b) * blend) >> 8) as u8,
            }
        };

        if brightness < 255 {
            let scale = u16::from(brightness);
            color.r = ((u16::from(color.r) * scale) >> 8) as u8;
            color.g = ((u16::from(color.g) * scale) >> 8) as u8;
            color.b = ((u16::from(color.b) * scale) >> 8) as u8;
        }

        color
    }

    /// Look up a built-in palette by its registry name (case-insensitive)
    pub fn by_name(name: &str) -> Option<&'static Palette> {
        BUILTIN_PALETTES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, p)| *p)
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

/// Classic FastLED rainbow sweep
pub const RAINBOW: Palette = Palette::new([
    rgb(255, 0, 0),
    rgb(255, 63, 0),
    rgb(255, 127, 0),
    rgb(255, 191, 0),
    rgb(255, 255, 0),
    rgb(127, 255, 0),
    rgb(0, 255, 0),
    rgb(0, 255, 127),
    rgb(0, 255, 255),
    rgb(0, 127, 255),
    rgb(0, 0, 255),
    rgb(127, 0, 255),
    rgb(255, 0, 255),
    rgb(255, 0, 127),
    rgb(255, 0, 63),
    rgb(255, 0, 31),
]);

/// Black through red and yellow to white
pub const HEAT: Palette = Palette::new([
    rgb(0, 0, 0),
    rgb(51, 0, 0),
    rgb(102, 0, 0),
    rgb(153, 0, 0),
    rgb(204, 0, 0),
    rgb(255, 0, 0),
    rgb(255, 51, 0),
    rgb(255, 102, 0),
    rgb(255, 153, 0),
    rgb(255, 204, 0),
    rgb(255, 255, 0),
    rgb(255, 255, 51),
    rgb(255, 255, 102),
    rgb(255, 255, 153),
    rgb(255, 255, 204),
    rgb(255, 255, 255),
]);

/// Deep blues into aqua and seafoam
pub const OCEAN: Palette = Palette::new([
    rgb(0, 0, 51),
    rgb(0, 0, 102),
    rgb(0, 51, 153),
    rgb(0, 102, 153),
    rgb(0, 153, 153),
    rgb(0, 153, 204),
    rgb(0, 153, 255),
    rgb(0, 204, 255),
    rgb(51, 204, 255),
    rgb(102, 229, 255),
    rgb(153, 255, 255),
    rgb(204, 255, 255),
    rgb(153, 255, 204),
    rgb(102, 255, 178),
    rgb(51, 255, 153),
    rgb(0, 255, 127),
]);

/// Dark greens with yellow-green highlights
pub const FOREST: Palette = Palette::new([
    rgb(0, 51, 0),
    rgb(0, 68, 0),
    rgb(0, 85, 0),
    rgb(0, 102, 0),
    rgb(0, 119, 0),
    rgb(0, 136, 0),
    rgb(34, 153, 0),
    rgb(68, 170, 0),
    rgb(102, 187, 0),
    rgb(136, 204, 34),
    rgb(170, 221, 68),
    rgb(187, 238, 102),
    rgb(153, 221, 85),
    rgb(119, 204, 68),
    rgb(85, 187, 51),
    rgb(51, 170, 34),
]);

/// Heat ramp that folds back down to black
pub const LAVA: Palette = Palette::new([
    rgb(0, 0, 0),
    rgb(51, 0, 0),
    rgb(102, 0, 0),
    rgb(153, 0, 0),
    rgb(204, 0, 0),
    rgb(255, 0, 0),
    rgb(255, 51, 0),
    rgb(255, 102, 0),
    rgb(255, 153, 0),
    rgb(255, 102, 0),
    rgb(255, 51, 0),
    rgb(255, 0, 0),
    rgb(204, 0, 0),
    rgb(153, 0, 0),
    rgb(102, 0, 0),
    rgb(51, 0, 0),
]);

/// Blue to white and back
pub const CLOUD: Palette = Palette::new([
    rgb(0, 0, 255),
    rgb(0, 51, 255),
    rgb(0, 102, 255),
    rgb(51, 153, 255),
    rgb(102, 178, 255),
    rgb(153, 204, 255),
    rgb(204, 229, 255),
    rgb(255, 255, 255),
    rgb(204, 229, 255),
    rgb(153, 204, 255),
    rgb(102, 178, 255),
    rgb(51, 153, 255),
    rgb(0, 102, 255),
    rgb(0, 51, 255),
    rgb(0, 0, 255),
    rgb(0, 0, 204),
]);

/// Saturated purples, oranges and blues
pub const PARTY: Palette = Palette::new([
    rgb(85, 0, 171),
    rgb(132, 0, 123),
    rgb(181, 0, 75),
    rgb(229, 0, 27),
    rgb(232, 23, 0),
    rgb(184, 71, 0),
    rgb(171, 119, 0),
    rgb(171, 171, 0),
    rgb(171, 85, 0),
    rgb(221, 34, 0),
    rgb(242, 0, 14),
    rgb(194, 0, 62),
    rgb(143, 0, 113),
    rgb(95, 0, 161),
    rgb(47, 0, 208),
    rgb(0, 7, 249),
]);

/// Named registry of the built-in palettes, in presentation order
pub const BUILTIN_PALETTES: [(&str, &Palette); 7] = [
    ("Rainbow", &RAINBOW),
    ("Heat", &HEAT),
    ("Ocean", &OCEAN),
    ("Forest", &FOREST),
    ("Lava", &LAVA),
    ("Cloud", &CLOUD),
    ("Party", &PARTY),
];
