//! LED Visualizer - Desktop Simulator Entry Point
//!
//! Compiles the given C program source against the bundled SDK, renders
//! the result as colored blocks in the terminal, and hot-reloads the
//! module whenever the source file changes.

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::Context;
use ledvis_rs::{
    config::{usage, ParsedArgs, RunConfig},
    host::ExecutionHost,
    palette::Palette,
    reload::ReloadPipeline,
    scheduler::{HostCommand, Scheduler},
    sink::TerminalSink,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ledvis_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RunConfig::from_args(std::env::args().skip(1)) {
        Ok(ParsedArgs::Run(config)) => config,
        Ok(ParsedArgs::Help) => {
            println!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {message}\n\n{}", usage());
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: RunConfig) -> anyhow::Result<()> {
    tracing::info!("Starting LED Visualizer");

    let source = config
        .source
        .canonicalize()
        .with_context(|| format!("program source {} not readable", config.source.display()))?;
    let topology = config.topology()?;

    let mut pipeline = ReloadPipeline::new(source.clone(), topology.clone())?;
    tracing::info!(
        source = %source.display(),
        cc = pipeline.toolchain(),
        strips = config.strips,
        leds = config.leds,
        "configuration resolved"
    );

    // Compile before claiming the terminal so diagnostics stay readable.
    let registry = pipeline.initial_load()?;

    let sink = TerminalSink::new(&topology)?;
    let mut host = ExecutionHost::new(topology, Box::new(sink));
    host.swap_registry(registry);

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let mut scheduler = Scheduler::new(host, config.target_fps).with_commands(command_rx);
    let running = scheduler.running_handle();

    // Interactive commands come in on stdin, one per line. The thread is
    // detached; it ends with the process once the loop stops.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("q") | Some("quit"), _) => {
                    running.store(false, Ordering::Relaxed);
                    break;
                }
                (Some("p"), None) => {
                    let _ = command_tx.send(HostCommand::NextProgram);
                }
                (Some("program"), Some(index)) => match index.parse() {
                    Ok(index) => {
                        let _ = command_tx.send(HostCommand::SetProgram(index));
                    }
                    Err(_) => tracing::warn!(index, "not a program index"),
                },
                (Some("palette"), Some(name)) => match Palette::by_name(name) {
                    Some(palette) => {
                        let _ = command_tx.send(HostCommand::SetPalette(*palette));
                    }
                    None => tracing::warn!(name, "unknown palette"),
                },
                (None, _) => {}
                (Some(other), _) => {
                    tracing::warn!(command = other, "unknown command (p, program N, palette NAME, q)");
                }
            }
        }
    });

    let result = scheduler.run(|host| {
        pipeline.poll(host);
    });

    // Restore the terminal even when the loop exited with an error.
    let shutdown = scheduler.into_host().shutdown();
    result?;
    shutdown?;
    Ok(())
}
