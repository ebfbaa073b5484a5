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

//! Module with calendar arithmetic and the file naming scheme
//! shared by all pipeline stages.
//!
//! Hourly datasets are addressed by `(calendar date, hour of day)`
//! which maps bijectively onto the absolute hour for hours 0-23.
//! The hour assembler additionally names lead-hour 24 of a forecast
//! run as hour 24 of its day; such files are never scanned by the
//! repair stages.

use crate::Float;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::path::{Path, PathBuf};

/// Units of the `time_counter` coordinate, the ordering and
/// interpolation key of hourly datasets.
pub const TIME_COUNTER_UNITS: &str = "seconds since 1950-01-01 00:00:00";

/// Prefix of hourly and daily output file names.
pub const FILE_PREFIX: &str = "gemlam";

/// The epoch that `time_counter` counts seconds from.
pub fn time_counter_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd(1950, 1, 1).and_hms(0, 0, 0)
}

/// Seconds between the `time_counter` epoch and `hour`.
pub fn time_counter_seconds(hour: NaiveDateTime) -> Float {
    (hour - time_counter_epoch()).num_seconds() as Float
}

/// Inclusive range of calendar days.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Inclusive range of calendar hours.
pub fn hours(start: NaiveDateTime, end: NaiveDateTime) -> impl Iterator<Item = NaiveDateTime> {
    let count = ((end - start).num_hours().max(-1) + 1) as usize;
    (0..count).map(move |hour| start + Duration::hours(hour as i64))
}

/// Hours scanned by the repair stages: from the first hour of the
/// spin-up day before the start date through the last hour of the
/// end date.
pub fn repair_scan_hours(
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = NaiveDateTime> {
    hours(
        (start - Duration::days(1)).and_hms(0, 0, 0),
        end.and_hms(23, 0, 0),
    )
}

/// Name of the hourly dataset file for `hour` of `date`.
///
/// `hour` may be 24 for the last lead-hour of a forecast run.
pub fn hourly_file_name(date: NaiveDate, hour: u32) -> String {
    format!(
        "{}_y{:04}m{:02}d{:02}_{:03}.nc",
        FILE_PREFIX,
        date.year(),
        date.month(),
        date.day(),
        hour
    )
}

pub fn hourly_path(dir: &Path, date: NaiveDate, hour: u32) -> PathBuf {
    dir.join(hourly_file_name(date, hour))
}

/// Path of the hourly dataset file for an absolute hour.
pub fn hour_path(dir: &Path, hour: NaiveDateTime) -> PathBuf {
    hourly_path(dir, hour.date(), hour.hour())
}

/// Stem (no extension) of the daily file that the external
/// concatenation tool produces for `date`.
pub fn day_file_stem(date: NaiveDate) -> String {
    format!(
        "{}_y{:04}m{:02}d{:02}",
        FILE_PREFIX,
        date.year(),
        date.month(),
        date.day()
    )
}

/// Name of a converted raw lead-hour file: the forecast run is
/// identified by its start date and origin hour, the file by the
/// lead-hour within the run.
pub fn raw_lead_hour_name(run_date: NaiveDate, origin: u32, lead_hour: u32) -> String {
    format!(
        "{:04}{:02}{:02}{:02}_{:03}.nc",
        run_date.year(),
        run_date.month(),
        run_date.day(),
        origin,
        lead_hour
    )
}

pub fn raw_lead_hour_path(
    dir: &Path,
    run_date: NaiveDate,
    origin: u32,
    lead_hour: u32,
) -> PathBuf {
    dir.join(raw_lead_hour_name(run_date, origin, lead_hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn time_counter_starts_at_epoch() {
        assert_approx_eq!(Float, time_counter_seconds(time_counter_epoch()), 0.0);
    }

    #[test]
    fn time_counter_of_known_hour() {
        let hour = NaiveDate::from_ymd(2007, 1, 1).and_hms(0, 0, 0);
        assert_approx_eq!(Float, time_counter_seconds(hour), 1_798_761_600.0);
    }

    #[test]
    fn consecutive_hours_are_an_hour_apart() {
        let hour = NaiveDate::from_ymd(2007, 6, 30).and_hms(23, 0, 0);
        let next = hour + Duration::hours(1);
        assert_approx_eq!(
            Float,
            time_counter_seconds(next) - time_counter_seconds(hour),
            3600.0
        );
    }

    #[test]
    fn hourly_file_names_follow_scheme() {
        let date = NaiveDate::from_ymd(2007, 2, 3);
        assert_eq!(hourly_file_name(date, 7), "gemlam_y2007m02d03_007.nc");
        assert_eq!(hourly_file_name(date, 24), "gemlam_y2007m02d03_024.nc");
        assert_eq!(day_file_stem(date), "gemlam_y2007m02d03");
    }

    #[test]
    fn raw_lead_hour_names_follow_scheme() {
        let run = NaiveDate::from_ymd(2006, 12, 31);
        assert_eq!(raw_lead_hour_name(run, 6, 18), "2006123106_018.nc");
    }

    #[test]
    fn repair_scan_covers_spinup_day_and_range() {
        let start = NaiveDate::from_ymd(2007, 1, 2);
        let end = NaiveDate::from_ymd(2007, 1, 3);
        let scanned: Vec<_> = repair_scan_hours(start, end).collect();
        assert_eq!(scanned.len(), 72);
        assert_eq!(scanned[0], NaiveDate::from_ymd(2007, 1, 1).and_hms(0, 0, 0));
        assert_eq!(
            *scanned.last().unwrap(),
            NaiveDate::from_ymd(2007, 1, 3).and_hms(23, 0, 0)
        );
    }

    #[test]
    fn day_range_is_inclusive() {
        let start = NaiveDate::from_ymd(2006, 12, 30);
        let end = NaiveDate::from_ymd(2007, 1, 2);
        let listed: Vec<_> = days(start, end).collect();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0], start);
        assert_eq!(listed[3], end);
    }
}
