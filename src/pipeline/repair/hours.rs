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

//! Sub-module filling in hours with no dataset file at all.
//!
//! The scan walks the hour range in order, collecting runs of
//! consecutive missing hours, and repairs each run as soon as a
//! present hour bounds it on the right. Hours still missing when the
//! scan ends have no later bound and cannot be repaired.

use crate::constants::{MAX_BOUNDED_GAP_HOURS, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::errors::{PipelineError, RepairError};
use crate::pipeline::calendar;
use crate::pipeline::configuration::Dates;
use crate::pipeline::external::Collaborators;
use crate::Float;
use chrono::{Duration, NaiveDateTime, Timelike};
use log::info;
use std::path::{Path, PathBuf};

/// A pending repair unit: the absolute hour and the dataset path it
/// must eventually occupy.
#[derive(Clone, PartialEq, Debug)]
struct MissingHour {
    hour: NaiveDateTime,
    path: PathBuf,
}

/// Scans every hour of the range (spin-up day included) and repairs
/// runs of missing hourly dataset files by interpolation.
pub fn repair_missing_hours<C: Collaborators>(
    dates: &Dates,
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    let mut missing: Vec<MissingHour> = Vec::new();

    for hour in calendar::repair_scan_hours(dates.start, dates.end) {
        let path = calendar::hour_path(work_dir, hour);
        if path.exists() {
            if !missing.is_empty() {
                repair_run(&missing, work_dir, tools)?;
                missing.clear();
            }
        } else {
            missing.push(MissingHour { hour, path });
        }
    }

    if !missing.is_empty() {
        return Err(RepairError::MissingHoursAtEndOfRange(
            missing.into_iter().map(|gap| gap.hour).collect(),
        )
        .into());
    }

    Ok(())
}

fn repair_run<C: Collaborators>(
    missing: &[MissingHour],
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    if missing.len() <= MAX_BOUNDED_GAP_HOURS {
        interpolate_intra_day(missing, work_dir, tools)
    } else {
        interpolate_inter_day(missing, work_dir, tools)
    }
}

/// Repairs a short run from the hours immediately bounding it. The
/// k-th missing hour is interpolated to the earlier bound's time
/// offset plus k hours.
fn interpolate_intra_day<C: Collaborators>(
    missing: &[MissingHour],
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    if missing.is_empty() {
        return Ok(());
    }

    let bounds = super::intra_day_bounds(
        work_dir,
        missing[0].hour,
        missing[missing.len() - 1].hour,
    )?;
    super::ensure_complete(&bounds.before)?;
    super::ensure_complete(&bounds.after)?;
    info!(
        "interpolating missing hours between {} and {}",
        bounds.before.display(),
        bounds.after.display()
    );

    for (position, gap) in missing.iter().enumerate() {
        let target = bounds.before_time_counter
            + ((position + 1) as Float) * SECONDS_PER_HOUR as Float;
        tools.interpolate_at_time(target, &bounds.before, &bounds.after, &gap.path)?;
        info!("created {} by interpolation", gap.path.display());
    }

    Ok(())
}

/// Repairs a long run one hour at a time from the same hour of day
/// on the neighbouring days.
fn interpolate_inter_day<C: Collaborators>(
    missing: &[MissingHour],
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    for gap in missing {
        let bounds = super::inter_day_bounds(work_dir, gap.hour)?;
        info!(
            "interpolating hour {:03} across days between {} and {}",
            gap.hour.hour(),
            bounds.before.display(),
            bounds.after.display()
        );

        let days_between =
            super::whole_days_between(gap.hour - Duration::days(1), gap.hour + Duration::days(1));
        for day_index in 0..days_between {
            let target = bounds.before_time_counter
                + ((day_index + 1) as Float) * SECONDS_PER_DAY as Float;
            tools.interpolate_at_time(target, &bounds.before, &bounds.after, &gap.path)?;
            info!("created {} by interpolation", gap.path.display());
        }
    }

    Ok(())
}
