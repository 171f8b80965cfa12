// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robocurate CLI
//!
//! Command-line front end for dataset reading and curation.
//!
//! ## Usage
//!
//! ```sh
//! # Scan a directory and check that it only holds known datasets
//! robocurate scan ./data --verify
//!
//! # Show one dataset
//! robocurate info ./data/episode_0.hdf5
//!
//! # Export frame 10 as PNG images
//! robocurate frame ./data/run.mcap --index 10 --out ./frame10
//!
//! # Group mixed datasets into grouped_<TYPE> folders
//! robocurate organize ./data
//!
//! # Scan, group, quarantine a reviewed bad list and write a report
//! robocurate curate ./data --bad-list bad.txt
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use cmd::{CurateCmd, FrameCmd, InfoCmd, OrganizeCmd, QuarantineCmd, ScanCmd};
use common::Result;

/// Robocurate - robot demonstration dataset curation
///
/// Reads HDF5, ROS bag / MCAP, LeRobot, Unitree and raw image folder
/// datasets through one interface and curates directories of them.
#[derive(Parser, Clone)]
#[command(name = "robocurate")]
#[command(about = "Read and curate robot demonstration datasets", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Adapter configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Scan a directory and check dataset consistency
    Scan(ScanCmd),

    /// Show detected type, frame count and sensors of a dataset
    Info(InfoCmd),

    /// Export one frame's images as PNG and print its state
    Frame(FrameCmd),

    /// Move datasets into per-type folders
    Organize(OrganizeCmd),

    /// Move rejected datasets into a quarantine folder
    Quarantine(QuarantineCmd),

    /// Scan, check, group, quarantine and report in one pass
    Curate(CurateCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.verbose);
    let config = common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(cmd) => cmd.run(&config),
        Commands::Info(cmd) => cmd.run(&config),
        Commands::Frame(cmd) => cmd.run(&config),
        Commands::Organize(cmd) => cmd.run(&config),
        Commands::Quarantine(cmd) => cmd.run(),
        Commands::Curate(cmd) => cmd.run(&config),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
