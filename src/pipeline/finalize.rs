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

//! Module finalizing solar radiation and precipitation for each hour
//! of the output range.
//!
//! The archive stores instantaneous solar radiation and accumulated
//! precipitation. The ocean model wants the hourly mean and the
//! hourly flux, both of which need the preceding hour's dataset;
//! the spin-up day guarantees one exists even for the first hour of
//! the range. The arithmetic itself is delegated to the external
//! averaging/differencing tool, which works on the copy in the
//! destination directory.

use crate::errors::PipelineError;
use crate::pipeline::calendar;
use crate::pipeline::configuration::Config;
use crate::pipeline::external::Collaborators;
use chrono::{Duration, Timelike};
use log::debug;
use std::fs;
use std::path::Path;

/// Copies every hourly dataset of `[start, end]` into the
/// destination directory and replaces its instantaneous solar
/// radiation and accumulated precipitation with hourly values.
pub fn finalize_hours<C: Collaborators>(
    config: &Config,
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    let first = config.dates.start.and_hms(0, 0, 0);
    let last = config.dates.end.and_hms(23, 0, 0);

    for hour in calendar::hours(first, last) {
        let current = calendar::hour_path(work_dir, hour);
        let previous = calendar::hour_path(work_dir, hour - Duration::hours(1));
        let dest = config
            .output
            .dest_dir
            .join(calendar::hourly_file_name(hour.date(), hour.hour()));

        debug!("finalizing {} into {}", current.display(), dest.display());
        fs::copy(&current, &dest)?;
        tools.average_and_difference_hours(&previous, &current, &dest)?;
    }

    Ok(())
}
