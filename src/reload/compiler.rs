//! Compiler toolchain invocation
//!
//! User programs are plain C compiled against the fixed SDK shipped with
//! the crate (`sdk/led_viz.h`, `sdk/led_viz_sdk.c`) — the same sources a
//! hardware build compiles in, so a program file runs unmodified on both
//! targets. The toolchain is taken from the `CC` environment variable
//! (default `cc`) and invoked as a subprocess producing a shared object;
//! its combined stdout/stderr is captured and surfaced only on nonzero
//! exit.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{LedVisError, Result};

/// Environment variable selecting the compiler toolchain
pub const CC_ENV: &str = "CC";

/// Toolchain used when [`CC_ENV`] is unset
pub const DEFAULT_CC: &str = "cc";

const SDK_HEADER: &str = include_str!("../../sdk/led_viz.h");
const SDK_SOURCE: &str = include_str!("../../sdk/led_viz_sdk.c");

/// Stages the SDK sources in a work directory and compiles user programs
/// against them
#[derive(Debug)]
pub struct Compiler {
    cc: String,
    work_dir: PathBuf,
}

impl Compiler {
    /// Resolve the toolchain and stage the SDK sources into `work_dir`
    /// (created if missing).
    pub fn new(work_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&work_dir)?;
        fs::write(work_dir.join("led_viz.h"), SDK_HEADER)?;
        fs::write(work_dir.join("led_viz_sdk.c"), SDK_SOURCE)?;

        let cc = env::var(CC_ENV).unwrap_or_else(|_| DEFAULT_CC.to_string());
        Ok(Self { cc, work_dir })
    }

    /// The resolved compiler command
    pub fn toolchain(&self) -> &str {
        &self.cc
    }

    /// Compile `source` together with the staged SDK into the shared
    /// object at `artifact`.
    pub fn compile(&self, source: &Path, artifact: &Path) -> Result<()> {
        tracing::debug!(
            cc = %self.cc,
            source = %source.display(),
            "invoking compiler"
        );

        let output = Command::new(&self.cc)
            .arg("-shared")
            .arg("-fPIC")
            .arg("-O2")
            .arg("-I")
            .arg(&self.work_dir)
            .arg("-o")
            .arg(artifact)
            .arg(source)
            .arg(self.work_dir.join("led_viz_sdk.c"))
            .output()?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(LedVisError::Compile {
                status: output.status.code().unwrap_or(-1),
                diagnostics,
            });
        }

        Ok(())
    }
}
