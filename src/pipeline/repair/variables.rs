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

//! Sub-module filling in variables that are NaN placeholders in
//! otherwise complete hourly datasets.
//!
//! The scan walks the hour range in order and keeps, per variable, the
//! list of hours still carrying a placeholder. The first hour with no
//! placeholders at all flushes everything pending: short lists are
//! interpolated from the hours flanking them, long lists hour by hour
//! from the neighbouring days. Shortwave radiation inside the
//! archive's solar gap is reconstructed from cloud fraction instead,
//! since no interpolation source exists there (see [`super::solar`]).

use crate::constants::{MAX_BOUNDED_GAP_HOURS, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::errors::{PipelineError, RepairError};
use crate::pipeline::calendar;
use crate::pipeline::configuration::Dates;
use crate::pipeline::dataset::{self, MISSING_VARIABLES_SEP};
use crate::pipeline::external::Collaborators;
use crate::pipeline::repair::solar;
use crate::Float;
use chrono::{Duration, NaiveDateTime, Timelike};
use log::info;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// One hour at which a variable is a placeholder.
#[derive(Clone, PartialEq, Debug)]
struct PendingHour {
    hour: NaiveDateTime,
    path: PathBuf,
}

/// Scans every hour of the range (spin-up day included) and repairs
/// placeholder variables by per-variable interpolation, or by the
/// cloud-to-solar reconstruction where no interpolation source
/// exists.
pub fn repair_missing_variables<C: Collaborators>(
    dates: &Dates,
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    let mut pending: FxHashMap<String, Vec<PendingHour>> = FxHashMap::default();

    for hour in calendar::repair_scan_hours(dates.start, dates.end) {
        let path = calendar::hour_path(work_dir, hour);
        match dataset::missing_variables(&path)? {
            None => flush_pending(&mut pending, work_dir, tools)?,
            Some(marker) => {
                for name in marker.split(MISSING_VARIABLES_SEP) {
                    if name == "solar" && solar::in_archive_gap(hour) {
                        solar::fill_from_clouds(&path, hour)?;
                    } else {
                        pending
                            .entry(name.to_string())
                            .or_default()
                            .push(PendingHour {
                                hour,
                                path: path.clone(),
                            });
                    }
                }
            }
        }
    }

    if !pending.is_empty() {
        let mut names: Vec<String> = pending.into_keys().collect();
        names.sort();
        return Err(RepairError::MissingVariablesAtEndOfRange(names).into());
    }

    Ok(())
}

/// Repairs and forgets every variable currently pending. Called at
/// the first scanned hour with no placeholders, so each pending list
/// has a bounding hour on both sides.
fn flush_pending<C: Collaborators>(
    pending: &mut FxHashMap<String, Vec<PendingHour>>,
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    for (name, hours) in pending.drain() {
        if hours.len() <= MAX_BOUNDED_GAP_HOURS {
            interpolate_intra_day(&name, &hours, work_dir, tools)?;
        } else {
            interpolate_inter_day(&name, &hours, work_dir, tools)?;
        }
    }

    Ok(())
}

/// Interpolates one variable for a short list of hours from the
/// hours flanking the list, writing only that variable into the
/// existing datasets.
fn interpolate_intra_day<C: Collaborators>(
    name: &str,
    pending: &[PendingHour],
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    if pending.is_empty() {
        return Ok(());
    }

    let bounds = super::intra_day_bounds(
        work_dir,
        pending[0].hour,
        pending[pending.len() - 1].hour,
    )?;
    info!(
        "interpolating {} for missing hours between {} and {}",
        name,
        bounds.before.display(),
        bounds.after.display()
    );

    for (position, gap) in pending.iter().enumerate() {
        let target = bounds.before_time_counter
            + ((position + 1) as Float) * SECONDS_PER_HOUR as Float;
        tools.interpolate_field_at_time(name, target, &bounds.before, &bounds.after, &gap.path)?;
        info!(
            "calculated {} for {} by interpolation",
            name,
            gap.path.display()
        );
    }

    Ok(())
}

/// Interpolates one variable hour by hour from the same hour of day
/// on the neighbouring days.
fn interpolate_inter_day<C: Collaborators>(
    name: &str,
    pending: &[PendingHour],
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    for gap in pending {
        let bounds = super::inter_day_bounds(work_dir, gap.hour)?;
        info!(
            "interpolating {} for hour {:03} across days between {} and {}",
            name,
            gap.hour.hour(),
            bounds.before.display(),
            bounds.after.display()
        );

        let days_between =
            super::whole_days_between(gap.hour - Duration::days(1), gap.hour + Duration::days(1));
        for day_index in 0..days_between {
            let target = bounds.before_time_counter
                + ((day_index + 1) as Float) * SECONDS_PER_DAY as Float;
            tools.interpolate_field_at_time(
                name,
                target,
                &bounds.before,
                &bounds.after,
                &gap.path,
            )?;
            info!(
                "calculated {} for {} by interpolation",
                name,
                gap.path.display()
            );
        }
    }

    Ok(())
}
