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

//! Module invoking the external tools the pipeline delegates to:
//! raw archive conversion, point-in-time interpolation, solar
//! averaging / precipitation differencing, and daily concatenation.
//!
//! The tools are bash functions defined in one script that is sourced
//! before each invocation. They either fully succeed (exit code zero)
//! or the whole run aborts; there are no retries.

use crate::errors::ExternalError;
use crate::Float;
use chrono::NaiveDate;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// The external tools consumed by the pipeline stages. The single
/// production implementation shells out; tests record invocations
/// instead.
pub trait Collaborators {
    /// Populates `work_dir` with one file per lead-hour of `date`'s
    /// forecast run.
    fn convert_raw_archive(
        &self,
        forecast_origin: u32,
        date: NaiveDate,
        rpn_dir: &Path,
        work_dir: &Path,
    ) -> Result<(), ExternalError>;

    /// Writes a full dataset at `output`, interpolated to
    /// `target_time_counter` between the `before` and `after`
    /// datasets.
    fn interpolate_at_time(
        &self,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError>;

    /// Overwrites one variable of the existing dataset at `output`
    /// with values interpolated to `target_time_counter`.
    fn interpolate_field_at_time(
        &self,
        field: &str,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError>;

    /// Replaces instantaneous solar radiation at `dest` with the
    /// two-hour average and accumulated precipitation with an hourly
    /// flux, using the preceding hour's dataset.
    fn average_and_difference_hours(
        &self,
        previous: &Path,
        current: &Path,
        dest: &Path,
    ) -> Result<(), ExternalError>;

    /// Concatenates the 24 hourly datasets named by `day_stem` into
    /// one daily file.
    fn concatenate_hours_to_day(&self, day_stem: &Path) -> Result<(), ExternalError>;
}

/// Production [`Collaborators`] running the bash functions from the
/// configured tools script.
#[derive(Clone, PartialEq, Debug)]
pub struct ShellCollaborators {
    tools_script: PathBuf,
}

impl ShellCollaborators {
    pub fn new(tools_script: PathBuf) -> Self {
        ShellCollaborators { tools_script }
    }

    /// Runs one tool function in a bash subprocess with the tools
    /// script sourced, capturing its output for diagnostics.
    fn exec(&self, tool_command: &str) -> Result<(), ExternalError> {
        let command = format!("source {}; {}", self.tools_script.display(), tool_command);
        info!("executing: bash -c {:?}", command);

        let output = Command::new("bash")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|source| ExternalError::CantSpawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!("{}", String::from_utf8_lossy(&output.stdout));
        Ok(())
    }
}

impl Collaborators for ShellCollaborators {
    fn convert_raw_archive(
        &self,
        forecast_origin: u32,
        date: NaiveDate,
        rpn_dir: &Path,
        work_dir: &Path,
    ) -> Result<(), ExternalError> {
        self.exec(&format!(
            "rpn-netcdf {:02} {} {} {}",
            forecast_origin,
            date.format("%Y-%m-%d"),
            rpn_dir.display(),
            work_dir.display()
        ))
    }

    fn interpolate_at_time(
        &self,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError> {
        self.exec(&format!(
            "interp-for-time-counter-value {:.0} {} {} {}",
            target_time_counter,
            before.display(),
            after.display(),
            output.display()
        ))
    }

    fn interpolate_field_at_time(
        &self,
        field: &str,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError> {
        self.exec(&format!(
            "interp-var-for-time-counter-value {} {:.0} {} {} {}",
            field,
            target_time_counter,
            before.display(),
            after.display(),
            output.display()
        ))
    }

    fn average_and_difference_hours(
        &self,
        previous: &Path,
        current: &Path,
        dest: &Path,
    ) -> Result<(), ExternalError> {
        self.exec(&format!(
            "avg-diff-hrs {} {} {}",
            previous.display(),
            current.display(),
            dest.display()
        ))
    }

    fn concatenate_hours_to_day(&self, day_stem: &Path) -> Result<(), ExternalError> {
        self.exec(&format!("cat-hrs-to-days {}", day_stem.display()))
    }
}
