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

//! Module assembling the hourly forcing datasets for a date range
//! from the raw archive.
//!
//! Each calendar day is covered by two forecast runs: the first
//! `forecast_origin` hours of the day come from the tail of the
//! previous day's run, the rest from the day's own run. A lead-hour
//! whose raw file is absent from the archive is skipped here and
//! left for the repair stages to detect.

use crate::errors::{DeriveError, PipelineError};
use crate::pipeline::configuration::Config;
use crate::pipeline::external::Collaborators;
use crate::pipeline::{calendar, derive};
use chrono::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::path::Path;

/// Produces one hourly forcing dataset file per lead-hour of every
/// forecast run covering `[start - 1 day, end]`, consuming the raw
/// files the external converter drops into the working directory.
pub fn assemble_hours<C: Collaborators>(
    config: &Config,
    work_dir: &Path,
    tools: &C,
) -> Result<(), PipelineError> {
    assemble_hours_with(config, work_dir, tools, &mut |raw_path, out_path| {
        derive::write_hourly_file(raw_path, out_path)
    })
}

fn assemble_hours_with<C: Collaborators>(
    config: &Config,
    work_dir: &Path,
    tools: &C,
    derive_hour: &mut dyn FnMut(&Path, &Path) -> Result<(), DeriveError>,
) -> Result<(), PipelineError> {
    let origin = config.archive.forecast_origin;
    let days: Vec<_> =
        calendar::days(config.dates.start - Duration::days(1), config.dates.end).collect();

    // set progress bar for assembled days
    let days_bar = ProgressBar::new(days.len() as u64);
    days_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    days_bar.set_prefix("Assembled days");

    for day in days {
        tools.convert_raw_archive(origin, day, &config.archive.rpn_dir, work_dir)?;

        // tail of the previous day's run covers the first hours of this day
        for lead_hour in (24 - origin)..=24 {
            let raw_path =
                calendar::raw_lead_hour_path(work_dir, day - Duration::days(1), origin, lead_hour);
            let out_path = calendar::hourly_path(work_dir, day, lead_hour - (24 - origin));
            derive_lead_hour(&raw_path, &out_path, derive_hour)?;
        }

        // the day's own run covers the rest
        for lead_hour in 1..=(24 - origin) {
            let raw_path = calendar::raw_lead_hour_path(work_dir, day, origin, lead_hour);
            let out_path = calendar::hourly_path(work_dir, day, lead_hour + origin);
            derive_lead_hour(&raw_path, &out_path, derive_hour)?;
        }

        days_bar.inc(1);
    }

    days_bar.finish_with_message("All days assembled");
    Ok(())
}

/// Derives one hourly dataset and deletes the consumed raw file.
/// An absent raw file leaves a gap for the repair stages.
fn derive_lead_hour(
    raw_path: &Path,
    out_path: &Path,
    derive_hour: &mut dyn FnMut(&Path, &Path) -> Result<(), DeriveError>,
) -> Result<(), PipelineError> {
    match derive_hour(raw_path, out_path) {
        Ok(()) => {
            derive::discard_raw_file(raw_path)?;
            Ok(())
        }
        Err(DeriveError::MissingSource(path)) => {
            debug!("skipping absent raw lead-hour {}", path.display());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
