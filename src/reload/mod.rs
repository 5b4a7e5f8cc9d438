//! Hot-reload pipeline (desktop)
//!
//! Recompiles and swaps the user's program module without restarting the
//! process or losing animation continuity. The state machine is small:
//!
//! ```text
//! InitialCompile ──ok──▶ Watching ◀──────────────┐
//!       │                   │ source mtime moved │
//!     error               Recompiling            │
//!    (fatal)             ok /    \ error         │
//!                   swap module   keep previous ─┘
//! ```
//!
//! A failed initial compile is fatal — the loop is never entered. After
//! that, failure is routine: the previous module keeps running unmodified,
//! the compiler's diagnostics are surfaced, and watching continues. The
//! previous module is only unloaded once the new one is confirmed loadable
//! with both required symbols, so the host is never left without a working
//! module mid-swap.
//!
//! The pipeline runs synchronously on the scheduler thread, once per tick.
//! A recompile blocks animation for its duration; acceptable for a rare,
//! user-triggered event.
//!
//! # Components
//!
//! - [`Compiler`] — toolchain subprocess, SDK staging
//! - [`load_module`] — dylib loading and symbol resolution
//! - [`ReloadPipeline`] — mtime watching and the swap itself

pub mod compiler;
pub mod module;

pub use compiler::{Compiler, CC_ENV, DEFAULT_CC};
pub use module::load_module;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::error::Result;
use crate::host::ExecutionHost;
use crate::program::ProgramRegistry;
use crate::topology::Topology;

/// Wait after a source change is first observed before recompiling; the
/// file may still be mid-write.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Stem for generation-numbered module artifacts in the work directory.
///
/// Each successful recompile is loaded from a fresh file name: dlopen
/// deduplicates already loaded objects by path and by inode, so compiling
/// into the path the previous module was loaded from would hand back the
/// old module's handle instead of the new code.
const ARTIFACT_STEM: &str = "led_programs";

/// Result of one watch tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Source unchanged, nothing done
    Unchanged,
    /// New module compiled, loaded and swapped in
    Swapped,
    /// Compile or load failed; the previous module stays active
    Failed,
}

/// Watches one source file and swaps freshly compiled modules into the
/// host
pub struct ReloadPipeline {
    source: PathBuf,
    topology: Topology,
    compiler: Compiler,
    work_dir: PathBuf,
    /// Artifact the currently loaded module came from
    artifact: Option<PathBuf>,
    generation: u64,
    last_mtime: Option<SystemTime>,
}

impl ReloadPipeline {
    /// Set up the pipeline for `source`, staging the SDK in a per-process
    /// work directory under the system temp dir.
    pub fn new(source: PathBuf, topology: Topology) -> Result<Self> {
        let work_dir = env::temp_dir().join(format!("ledvis-{}", std::process::id()));
        Self::with_work_dir(source, topology, work_dir)
    }

    /// Like [`new`](Self::new) with an explicit work directory
    pub fn with_work_dir(source: PathBuf, topology: Topology, work_dir: PathBuf) -> Result<Self> {
        let compiler = Compiler::new(work_dir.clone())?;
        Ok(Self {
            source,
            topology,
            compiler,
            work_dir,
            artifact: None,
            generation: 0,
            last_mtime: None,
        })
    }

    /// The resolved compiler command
    pub fn toolchain(&self) -> &str {
        self.compiler.toolchain()
    }

    /// Compile and load the module for the first time.
    ///
    /// An error here is fatal for the caller: there is no previous module
    /// to fall back to.
    pub fn initial_load(&mut self) -> Result<ProgramRegistry> {
        let registry = self.compile_and_load()?;
        self.last_mtime = mtime(&self.source);
        tracing::info!(
            source = %self.source.display(),
            programs = registry.len(),
            "initial module loaded"
        );
        Ok(registry)
    }

    /// One watch tick; call once per scheduler frame.
    ///
    /// Compares the source mtime against the last observed value. On
    /// change, waits [`SETTLE_DELAY`], recompiles, and swaps the new
    /// registry into `host` only if loading succeeded with both required
    /// symbols. On failure the previous module keeps running and the
    /// diagnostics are logged; the change is still marked observed so a
    /// broken source is not recompiled every tick.
    pub fn poll(&mut self, host: &mut ExecutionHost) -> ReloadOutcome {
        let Some(current) = mtime(&self.source) else {
            // Transient: editors replace files non-atomically.
            return ReloadOutcome::Unchanged;
        };
        if self.last_mtime == Some(current) {
            return ReloadOutcome::Unchanged;
        }

        tracing::info!(source = %self.source.display(), "source changed, recompiling");
        thread::sleep(SETTLE_DELAY);
        // Re-read after settling so a write landing during the delay does
        // not immediately retrigger.
        self.last_mtime = mtime(&self.source).or(Some(current));

        match self.compile_and_load() {
            Ok(registry) => {
                let programs = registry.len();
                host.swap_registry(registry);
                tracing::info!(programs, "hot reload complete");
                ReloadOutcome::Swapped
            }
            Err(err) => {
                tracing::error!("reload failed, keeping previous module:\n{err}");
                ReloadOutcome::Failed
            }
        }
    }

    /// Compile the source into a fresh generation artifact and load it.
    ///
    /// The superseded artifact is unlinked once the new module is loaded;
    /// the previous module's mappings survive until its registry is
    /// dropped after the swap.
    fn compile_and_load(&mut self) -> Result<ProgramRegistry> {
        self.generation += 1;
        let artifact = self
            .work_dir
            .join(format!("{ARTIFACT_STEM}_{}.so", self.generation));
        self.compiler.compile(&self.source, &artifact)?;

        let registry = match load_module(&artifact, &self.topology) {
            Ok(registry) => registry,
            Err(err) => {
                let _ = fs::remove_file(&artifact);
                return Err(err);
            }
        };
        if let Some(previous) = self.artifact.replace(artifact) {
            let _ = fs::remove_file(previous);
        }
        Ok(registry)
    }
}

impl Drop for ReloadPipeline {
    fn drop(&mut self) {
        // Best effort; loaded modules keep their mappings even if the
        // backing file goes away.
        let _ = fs::remove_dir_all(&self.work_dir);
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
