//! The program contract
//!
//! A program is user-supplied logic that computes colors for every pixel as
//! a function of elapsed time. The runtime drives it through the [`Program`]
//! trait; implementations come from two places:
//!
//! - native Rust programs (see [`crate::programs`]), registered at build
//!   time — the path used on targets where runtime code loading is
//!   disallowed, and
//! - programs resolved out of a hot-reloaded C module
//!   (see [`crate::reload`]).
//!
//! `init` is called exactly once when a program becomes active, `cleanup`
//! exactly once when it is switched away; both default to no-ops. Any state
//! a program builds in `init` lives only for the activation — nothing is
//! persisted across process restarts or module swaps.
//!
//! A [`ProgramRegistry`] is an ordered collection that is only ever
//! replaced as a whole unit (on reload), never mutated element-wise.

use crate::host::Pixels;
use crate::palette::Palette;

/// User-program interface: per-frame update plus optional lifecycle hooks
pub trait Program {
    /// Display name
    fn name(&self) -> &str;

    /// Compute colors for the current frame.
    ///
    /// `time_ms` is elapsed time since the host started, from a monotonic
    /// clock. The program is the only pixel-buffer writer for the duration
    /// of this call.
    fn update(&mut self, time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette);

    /// Called when the program becomes active
    fn init(&mut self) {}

    /// Called when the host switches away from the program
    fn cleanup(&mut self) {}
}

/// Ordered collection of programs, replaced wholesale on reload
#[derive(Default)]
pub struct ProgramRegistry {
    programs: Vec<Box<dyn Program>>,
}

impl ProgramRegistry {
    /// Build a registry from an ordered program list
    pub fn new(programs: Vec<Box<dyn Program>>) -> Self {
        Self { programs }
    }

    /// Number of programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether the registry holds no programs
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Name of the program at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.programs.get(index).map(|p| p.name())
    }

    /// Names of all programs, in order
    pub fn names(&self) -> Vec<&str> {
        self.programs.iter().map(|p| p.name()).collect()
    }

    /// Mutable access to the program at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Program>> {
        self.programs.get_mut(index)
    }
}

impl std::fmt::Debug for ProgramRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramRegistry")
            .field("programs", &self.names())
            .finish()
    }
}
