// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame command - export one frame.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use robocurate::{AdapterConfig, DatasetAdapter, ReaderFactory};

use crate::common::Result;

/// Export one frame's images as PNG and print its state.
#[derive(Args, Clone, Debug)]
pub struct FrameCmd {
    /// Dataset file or directory
    #[arg(value_name = "PATH")]
    input: PathBuf,

    /// Frame index
    #[arg(short, long)]
    index: usize,

    /// Output directory for the images
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,
}

/// Sensor names may contain path separators (ROS topics).
fn file_stem(sensor: &str) -> String {
    sensor
        .trim_matches('/')
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

impl FrameCmd {
    pub fn run(self, config: &AdapterConfig) -> Result<()> {
        let mut reader = ReaderFactory::open_with_config(&self.input, config)?;
        let frame = reader.frame(self.index)?;
        reader.close();

        std::fs::create_dir_all(&self.out)
            .with_context(|| format!("creating '{}'", self.out.display()))?;

        println!("Frame {} @ {:.6}s", self.index, frame.timestamp);
        for (sensor, image) in &frame.images {
            let path = self
                .out
                .join(format!("{:06}_{}.png", self.index, file_stem(sensor)));
            image
                .save(&path)
                .with_context(|| format!("writing '{}'", path.display()))?;
            println!("  {} {}x{} -> {}", sensor, image.width(), image.height(), path.display());
        }
        for (channel, values) in &frame.state {
            let values: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
            println!("  {} [{}]", channel, values.join(", "));
        }
        Ok(())
    }
}
