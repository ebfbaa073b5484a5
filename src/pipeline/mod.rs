/*
Copyright 2023 the Atmospheric Forcing Generator developers

This file is part of Atmospheric Forcing Generator (AFGEN).

Atmospheric Forcing Generator (AFGEN) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Atmospheric Forcing Generator (AFGEN) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Atmospheric Forcing Generator (AFGEN). If not, see https://www.gnu.org/licenses/.
*/

//! Module containing the actual pipeline code.
//!
//! The stages run strictly in sequence over the whole date range:
//! hourly datasets are assembled from the raw archive, missing hours
//! are filled in, missing variables are filled in, solar radiation
//! and precipitation are finalized, and the hourly files are
//! concatenated into daily files. Each stage consumes the files the
//! previous one left in the working directory; the hourly dataset
//! file is the unit of hand-off and the durable checkpoint.

mod assemble;
mod calendar;
mod configuration;
mod dataset;
mod derive;
mod external;
mod finalize;
mod repair;
mod rotation;

#[cfg(test)]
mod super_tests;

use crate::errors::PipelineError;
use crate::ALLOCATOR;
use configuration::Config;
use external::{Collaborators, ShellCollaborators};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Main pipeline function, responsible for all processing stages.
///
/// It reads the provided configuration, assembles the hourly
/// datasets, repairs the gaps the archive left, and produces the
/// daily forcing files.
pub fn main() -> Result<(), PipelineError> {
    info!("Preparing the pipeline core");

    let core = Core::new()?;
    core.run()
}

/// Structure containing pipeline parameters.
///
/// Everything the stages share is loaded and checked once before the
/// first stage runs.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub tools: ShellCollaborators,
    work_dir: WorkDir,
}

/// Working directory holding the intermediate per-hour files: kept
/// on disk when configured by the user, otherwise temporary.
#[derive(Debug)]
enum WorkDir {
    Kept(PathBuf),
    Temporary(TempDir),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            WorkDir::Kept(path) => path,
            WorkDir::Temporary(dir) => dir.path(),
        }
    }
}

impl Core {
    /// Pipeline [`Core`] constructor.
    ///
    /// Before the pipeline can start (and to run it safely),
    /// configuration provided by the user must be loaded and checked
    /// and the output directories prepared.
    pub fn new() -> Result<Self, PipelineError> {
        debug!("Reading configuration from config.yaml");
        let config = Config::new_from_file(Path::new("config.yaml"))?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory * 1024 * 1024)
            .unwrap();

        debug!("Checking and setting output directories");
        prepare_dest_dir(&config.output.dest_dir)?;
        let work_dir = match &config.output.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                WorkDir::Kept(dir.clone())
            }
            None => WorkDir::Temporary(TempDir::new()?),
        };

        let tools = ShellCollaborators::new(config.tools.script.clone());

        Ok(Core {
            config,
            tools,
            work_dir,
        })
    }

    /// Runs the pipeline stages in order, aborting on the first
    /// error.
    pub fn run(&self) -> Result<(), PipelineError> {
        let work_dir = self.work_dir.path();

        info!("Assembling hourly datasets from the raw archive");
        assemble::assemble_hours(&self.config, work_dir, &self.tools)?;

        info!("Repairing missing hours");
        repair::hours::repair_missing_hours(&self.config.dates, work_dir, &self.tools)?;

        info!("Repairing missing variables");
        repair::variables::repair_missing_variables(&self.config.dates, work_dir, &self.tools)?;

        info!("Averaging solar radiation and differencing precipitation");
        finalize::finalize_hours(&self.config, work_dir, &self.tools)?;

        info!("Concatenating hourly datasets into daily files");
        for day in calendar::days(self.config.dates.start, self.config.dates.end) {
            let day_stem = self
                .config
                .output
                .dest_dir
                .join(calendar::day_file_stem(day));
            self.tools.concatenate_hours_to_day(&day_stem)?;
        }

        Ok(())
    }
}

/// Makes sure the destination directory exists. Hourly files from an
/// earlier run are overwritten, so an existing directory is fine.
fn prepare_dest_dir(dest_dir: &Path) -> Result<(), PipelineError> {
    if dest_dir.is_dir() {
        debug!("Destination directory exists so continuing");
    } else if dest_dir.exists() {
        return Err(PipelineError::FaultyOutput(
            "Destination path exists and is not a directory",
        ));
    } else {
        debug!("Destination directory does not exist so creating a new one");
        fs::create_dir_all(dest_dir)?;
    }

    Ok(())
}
