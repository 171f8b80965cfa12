// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - show what a dataset contains.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use robocurate::{AdapterConfig, DatasetAdapter, ReaderFactory};

use crate::common::{format_seconds, ProgressBar, Result};

/// Show dataset information.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Dataset file or directory
    #[arg(value_name = "PATH")]
    input: PathBuf,

    /// Decode every frame and report sensors that failed to decode
    #[arg(long)]
    decode: bool,
}

impl InfoCmd {
    pub fn run(self, config: &AdapterConfig) -> Result<()> {
        let mut reader = ReaderFactory::open_with_config(&self.input, config)?;

        println!("=== {} ===", self.input.display());
        println!("Type: {}", reader.dataset_type());
        println!("Frames: {}", reader.len());
        println!("Sensors: {}", reader.sensors().len());
        for sensor in reader.sensors() {
            println!("  {sensor}");
        }

        if reader.len() > 0 {
            let first = reader.frame(0)?.timestamp;
            let last = reader.frame(reader.len() - 1)?.timestamp;
            println!("Start: {}", format_seconds(first));
            println!("End: {}", format_seconds(last));
        }

        if self.decode {
            let sensors = reader.sensors().to_vec();
            let mut missing: BTreeMap<String, usize> = BTreeMap::new();
            let progress = ProgressBar::new(reader.len() as u64, "Decoding");
            for index in 0..reader.len() {
                let frame = reader.frame(index)?;
                for sensor in &sensors {
                    if !frame.images.contains_key(sensor) && !frame.state.contains_key(sensor) {
                        *missing.entry(sensor.clone()).or_insert(0) += 1;
                    }
                }
                progress.inc(1);
            }
            progress.finish_with_message("done");

            println!();
            if missing.is_empty() {
                println!("All frames decoded.");
            } else {
                println!("Frames missing a sensor:");
                for (sensor, count) in &missing {
                    println!("  {sensor}: {count}");
                }
            }
        }

        reader.close();
        Ok(())
    }
}
