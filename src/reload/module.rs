//! Loaded program modules
//!
//! A compiled module exports two required symbols — `programs`, an ordered
//! array of C program descriptors, and `NUM_PROGRAMS`, its length. Either
//! missing is a load error; the caller keeps whatever module was active
//! before. The optional `_led_viz_set_strip_setup` symbol, when present,
//! receives the host's topology so the SDK layout accessors work inside
//! the module.
//!
//! Each resolved program becomes a [`LoadedProgram`] implementing the
//! native [`Program`] trait. The dylib handle is reference-counted into
//! every program, so the library stays mapped until the last program from
//! it is dropped — replacing a registry wholesale is what finally unloads
//! the previous module.
//!
//! The C update signature takes a context-free pixel callback. Bridging it
//! onto the host's [`Pixels`] view uses a thread-local pointer that is set
//! only for the duration of one `update` call; the callback combines
//! set-and-read-back exactly like the hardware runtime's pixel function.

use std::cell::Cell;
use std::ffi::{c_char, c_int, CStr};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use libloading::Library;

use crate::error::{LedVisError, Result};
use crate::host::Pixels;
use crate::palette::{Palette, Rgb};
use crate::program::{Program, ProgramRegistry};
use crate::topology::Topology;

type RawPixelFn = unsafe extern "C" fn(c_int, c_int, *mut u8, *mut u8, *mut u8);
type RawUpdateFn = unsafe extern "C" fn(c_int, c_int, f64, RawPixelFn, *const Rgb);
type RawHookFn = unsafe extern "C" fn();
type RawSetupFn = unsafe extern "C" fn(*const RawStripDef, c_int);

/// Mirror of the SDK `Program` struct
#[repr(C)]
struct RawProgram {
    name: *const c_char,
    update: Option<RawUpdateFn>,
    init: Option<RawHookFn>,
    cleanup: Option<RawHookFn>,
}

/// Mirror of the SDK `StripDef` struct
#[repr(C)]
struct RawStripDef {
    num_leds: c_int,
    position: f32,
    length_cm: f32,
    matrix_width: c_int,
    matrix_height: c_int,
}

/// Keeps a loaded dylib and the strip-def array it points at alive.
///
/// Field order matters: the library must unload before the strip defs it
/// references are freed.
struct ModuleHandle {
    library: Library,
    strip_defs: Box<[RawStripDef]>,
}

/// Load a compiled module and resolve it into a program registry.
///
/// Both required symbols are resolved (and every program checked for an
/// update function) before anything is handed out, so a structurally
/// broken module never makes it into the host.
pub fn load_module(path: &Path, topology: &Topology) -> Result<ProgramRegistry> {
    let library = unsafe { Library::new(path) }.map_err(|err| {
        LedVisError::Link(format!("failed to load {}: {err}", path.display()))
    })?;

    let programs_ptr: *const RawProgram = unsafe {
        *library
            .get::<*const RawProgram>(b"programs\0")
            .map_err(|err| LedVisError::Link(format!("missing symbol `programs`: {err}")))?
    };
    let count: c_int = unsafe {
        **library
            .get::<*const c_int>(b"NUM_PROGRAMS\0")
            .map_err(|err| LedVisError::Link(format!("missing symbol `NUM_PROGRAMS`: {err}")))?
    };

    if programs_ptr.is_null() {
        return Err(LedVisError::Link("`programs` is a null array".into()));
    }
    if count < 0 {
        return Err(LedVisError::Link(format!("NUM_PROGRAMS is negative ({count})")));
    }

    let strip_defs: Box<[RawStripDef]> = topology
        .strips()
        .iter()
        .map(|s| RawStripDef {
            num_leds: s.led_count as c_int,
            position: s.position,
            length_cm: s.length_cm,
            matrix_width: s.matrix.map_or(0, |m| m.width as c_int),
            matrix_height: s.matrix.map_or(0, |m| m.height as c_int),
        })
        .collect();

    let module = Arc::new(ModuleHandle {
        library,
        strip_defs,
    });

    // Hand the topology to the SDK accessors; the pointer stays valid for
    // the module's lifetime because the handle owns both sides.
    if let Ok(setup) = unsafe { module.library.get::<RawSetupFn>(b"_led_viz_set_strip_setup\0") }
    {
        unsafe { setup(module.strip_defs.as_ptr(), module.strip_defs.len() as c_int) };
    }

    let raw = unsafe { std::slice::from_raw_parts(programs_ptr, count as usize) };
    let mut programs: Vec<Box<dyn Program>> = Vec::with_capacity(raw.len());
    for (i, entry) in raw.iter().enumerate() {
        let Some(update) = entry.update else {
            return Err(LedVisError::Link(format!("program {i} has no update function")));
        };
        let name = if entry.name.is_null() {
            format!("program {i}")
        } else {
            unsafe { CStr::from_ptr(entry.name) }
                .to_string_lossy()
                .into_owned()
        };
        programs.push(Box::new(LoadedProgram {
            name,
            raw_update: update,
            raw_init: entry.init,
            raw_cleanup: entry.cleanup,
            _module: Arc::clone(&module),
        }));
    }

    tracing::debug!(programs = programs.len(), "module loaded");
    Ok(ProgramRegistry::new(programs))
}

/// A program resolved out of a loaded module
struct LoadedProgram {
    name: String,
    raw_update: RawUpdateFn,
    raw_init: Option<RawHookFn>,
    raw_cleanup: Option<RawHookFn>,
    _module: Arc<ModuleHandle>,
}

impl Program for LoadedProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, time_ms: f64, pixels: &mut Pixels<'_>, palette: &Palette) {
        let num_strips = pixels.strip_count() as c_int;
        let max_leds = pixels.max_leds() as c_int;
        let entries = palette.entries().as_ptr();

        let _scope = PixelScope::enter(pixels);
        unsafe { (self.raw_update)(num_strips, max_leds, time_ms, pixel_bridge, entries) };
    }

    fn init(&mut self) {
        if let Some(hook) = self.raw_init {
            unsafe { hook() };
        }
    }

    fn cleanup(&mut self) {
        if let Some(hook) = self.raw_cleanup {
            unsafe { hook() };
        }
    }
}

thread_local! {
    // Pixel view of the update call currently on this thread's stack, or
    // null outside of one.
    static ACTIVE_PIXELS: Cell<*mut ()> = const { Cell::new(ptr::null_mut()) };
}

/// Publishes a [`Pixels`] view to the C callback for one update call
struct PixelScope;

impl PixelScope {
    fn enter(pixels: &mut Pixels<'_>) -> Self {
        ACTIVE_PIXELS.with(|slot| slot.set(pixels as *mut Pixels<'_> as *mut ()));
        PixelScope
    }
}

impl Drop for PixelScope {
    fn drop(&mut self) {
        ACTIVE_PIXELS.with(|slot| slot.set(ptr::null_mut()));
    }
}

/// C pixel callback: set when all channel pointers are non-null, then
/// always write the current value back.
unsafe extern "C" fn pixel_bridge(strip: c_int, led: c_int, r: *mut u8, g: *mut u8, b: *mut u8) {
    let ptr = ACTIVE_PIXELS.with(|slot| slot.get());
    if ptr.is_null() {
        return;
    }
    // Valid only while the update call that published it is running.
    let pixels = &mut *(ptr as *mut Pixels<'_>);

    if strip < 0 || led < 0 {
        return;
    }
    let (strip, led) = (strip as usize, led as usize);
    if strip >= pixels.strip_count() || led >= pixels.led_count(strip) {
        return;
    }

    if !r.is_null() && !g.is_null() && !b.is_null() {
        pixels.set(strip, led, Rgb::new(*r, *g, *b));
    }

    let current = pixels.get(strip, led);
    if !r.is_null() {
        *r = current.r;
    }
    if !g.is_null() {
        *g = current.g;
    }
    if !b.is_null() {
        *b = current.b;
    }
}
