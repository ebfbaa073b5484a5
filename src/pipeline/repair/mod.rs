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

//! Module repairing the gaps the hour assembler leaves behind:
//! whole missing hours first, then individual missing variables.
//!
//! Both repair paths share the interpolation-bound lookup here. A
//! short gap is interpolated between the hours bounding it; a long
//! gap is interpolated hour by hour between the same hour of day on
//! the neighbouring days.

pub mod hours;
pub mod solar;
pub mod variables;

use crate::errors::RepairError;
use crate::pipeline::{calendar, dataset};
use crate::Float;
use chrono::{Duration, NaiveDateTime};
use log::error;
use std::path::{Path, PathBuf};

/// Interpolation bounds shared by the hour-level and variable-level
/// repair paths: the datasets the interpolation tool reads and the
/// time offset the interpolation targets count from.
#[derive(Clone, PartialEq, Debug)]
pub(super) struct InterpBounds {
    pub before: PathBuf,
    pub after: PathBuf,
    pub before_time_counter: Float,
}

/// Bounds for a short gap: the hours immediately before and after
/// the run of missing hours.
///
/// The hour-level repair additionally requires both bounds to pass
/// [`ensure_complete`]; the variable-level repair cannot, since its
/// bounds may still carry placeholders of other variables.
pub(super) fn intra_day_bounds(
    work_dir: &Path,
    first_missing: NaiveDateTime,
    last_missing: NaiveDateTime,
) -> Result<InterpBounds, RepairError> {
    let before = calendar::hour_path(work_dir, first_missing - Duration::hours(1));
    let after = calendar::hour_path(work_dir, last_missing + Duration::hours(1));

    let before_time_counter = dataset::time_counter(&before)?;
    Ok(InterpBounds {
        before,
        after,
        before_time_counter,
    })
}

/// Bounds for one hour of a long gap: the same hour of day on the
/// neighbouring days. The following day must have been produced
/// already; repair runs behind a day loop that moves forward in
/// time.
pub(super) fn inter_day_bounds(
    work_dir: &Path,
    missing_hour: NaiveDateTime,
) -> Result<InterpBounds, RepairError> {
    let before = calendar::hour_path(work_dir, missing_hour - Duration::days(1));
    let after = calendar::hour_path(work_dir, missing_hour + Duration::days(1));

    if !after.exists() {
        return Err(RepairError::InterpolationSourceNotReady(after));
    }

    let before_time_counter = dataset::time_counter(&before)?;
    Ok(InterpBounds {
        before,
        after,
        before_time_counter,
    })
}

/// Number of whole days strictly between the inter-day bounds of a
/// missing hour; one interpolation target per day.
pub(super) fn whole_days_between(before: NaiveDateTime, after: NaiveDateTime) -> i64 {
    (after - before).num_days() - 1
}

/// Checks that an interpolation bound dataset carries no placeholder
/// variables. Interpolating a whole dataset from a placeholder would
/// spread NaNs through every hour repaired from it.
pub(super) fn ensure_complete(path: &Path) -> Result<(), RepairError> {
    if let Some(missing) = dataset::missing_variables(path)? {
        error!(
            "interpolation bound dataset {} carries missing variables ({}); \
             repairing from a placeholder is not possible",
            path.display(),
            missing
        );
        return Err(RepairError::CorruptSource {
            path: path.to_path_buf(),
            missing,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::testing::write_stub_hour;
    use chrono::NaiveDate;
    use float_cmp::assert_approx_eq;

    #[test]
    fn intra_day_bounds_flank_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let first = NaiveDate::from_ymd(2007, 1, 2).and_hms(10, 0, 0);
        let last = NaiveDate::from_ymd(2007, 1, 2).and_hms(11, 0, 0);
        write_stub_hour(dir.path(), first - Duration::hours(1), None, 0.0);
        write_stub_hour(dir.path(), last + Duration::hours(1), None, 0.0);

        let bounds = intra_day_bounds(dir.path(), first, last).unwrap();

        assert!(bounds.before.ends_with("gemlam_y2007m01d02_009.nc"));
        assert!(bounds.after.ends_with("gemlam_y2007m01d02_012.nc"));
        assert_approx_eq!(
            Float,
            bounds.before_time_counter,
            calendar::time_counter_seconds(first - Duration::hours(1))
        );
    }

    #[test]
    fn intra_day_bounds_cross_the_day_seam() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NaiveDate::from_ymd(2007, 1, 2).and_hms(0, 0, 0);
        write_stub_hour(dir.path(), missing - Duration::hours(1), None, 0.0);
        write_stub_hour(dir.path(), missing + Duration::hours(1), None, 0.0);

        let bounds = intra_day_bounds(dir.path(), missing, missing).unwrap();

        assert!(bounds.before.ends_with("gemlam_y2007m01d01_023.nc"));
        assert!(bounds.after.ends_with("gemlam_y2007m01d02_001.nc"));
    }

    #[test]
    fn incomplete_bound_dataset_is_a_corrupt_source() {
        let dir = tempfile::tempdir().unwrap();
        let hour = NaiveDate::from_ymd(2007, 1, 2).and_hms(9, 0, 0);
        let path = write_stub_hour(dir.path(), hour, Some("solar"), 0.0);

        assert!(matches!(
            ensure_complete(&path),
            Err(RepairError::CorruptSource { .. })
        ));

        let clean = write_stub_hour(dir.path(), hour + Duration::hours(1), None, 0.0);
        ensure_complete(&clean).unwrap();
    }

    #[test]
    fn inter_day_bounds_need_the_next_day() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NaiveDate::from_ymd(2007, 1, 2).and_hms(10, 0, 0);
        write_stub_hour(dir.path(), missing - Duration::days(1), None, 0.0);

        let result = inter_day_bounds(dir.path(), missing);
        assert!(matches!(
            result,
            Err(RepairError::InterpolationSourceNotReady(_))
        ));

        write_stub_hour(dir.path(), missing + Duration::days(1), None, 0.0);
        let bounds = inter_day_bounds(dir.path(), missing).unwrap();
        assert!(bounds.before.ends_with("gemlam_y2007m01d01_010.nc"));
        assert!(bounds.after.ends_with("gemlam_y2007m01d03_010.nc"));
    }

    #[test]
    fn adjacent_day_bounds_leave_one_day_between() {
        let missing = NaiveDate::from_ymd(2007, 1, 2).and_hms(10, 0, 0);
        assert_eq!(
            whole_days_between(missing - Duration::days(1), missing + Duration::days(1)),
            1
        );
    }
}
