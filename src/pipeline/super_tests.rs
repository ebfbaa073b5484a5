//! This is a module for integration tests of the repair stages,
//! but with access to private fields and methods.
//!
//! The repair stages communicate only through the files in the
//! working directory, so these tests exercise the hand-off between
//! them on a shared fixture directory instead of testing each stage
//! against its own fixtures.

use crate::pipeline::calendar;
use crate::pipeline::configuration::Dates;
use crate::pipeline::dataset;
use crate::pipeline::dataset::testing::write_stub_hour;
use crate::pipeline::external::testing::RecordingCollaborators;
use crate::pipeline::external::Collaborators;
use crate::pipeline::repair;
use crate::errors::ExternalError;
use crate::Float;
use chrono::{Duration, NaiveDate};
use float_cmp::assert_approx_eq;
use std::path::Path;

/// Test double that records like [`RecordingCollaborators`] but also
/// writes a stub dataset for every whole-dataset interpolation, the
/// way the real interpolation tool leaves a file behind for the next
/// stage to read.
#[derive(Default)]
struct StubbingCollaborators {
    inner: RecordingCollaborators,
}

impl Collaborators for StubbingCollaborators {
    fn convert_raw_archive(
        &self,
        forecast_origin: u32,
        date: NaiveDate,
        rpn_dir: &Path,
        work_dir: &Path,
    ) -> Result<(), ExternalError> {
        self.inner
            .convert_raw_archive(forecast_origin, date, rpn_dir, work_dir)
    }

    fn interpolate_at_time(
        &self,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError> {
        let hour = calendar::time_counter_epoch()
            + Duration::seconds(target_time_counter as i64);
        let work_dir = output.parent().expect("output path has a parent");
        write_stub_hour(work_dir, hour, None, 0.0);
        self.inner
            .interpolate_at_time(target_time_counter, before, after, output)
    }

    fn interpolate_field_at_time(
        &self,
        field: &str,
        target_time_counter: Float,
        before: &Path,
        after: &Path,
        output: &Path,
    ) -> Result<(), ExternalError> {
        self.inner
            .interpolate_field_at_time(field, target_time_counter, before, after, output)
    }

    fn average_and_difference_hours(
        &self,
        previous: &Path,
        current: &Path,
        dest: &Path,
    ) -> Result<(), ExternalError> {
        self.inner
            .average_and_difference_hours(previous, current, dest)
    }

    fn concatenate_hours_to_day(&self, day_stem: &Path) -> Result<(), ExternalError> {
        self.inner.concatenate_hours_to_day(day_stem)
    }
}

#[test]
fn hour_repair_then_variable_repair_share_the_working_directory() {
    let work_dir = tempfile::tempdir().unwrap();
    let dates = Dates {
        start: NaiveDate::from_ymd(2007, 1, 2),
        end: NaiveDate::from_ymd(2007, 1, 2),
    };
    let day = NaiveDate::from_ymd(2007, 1, 2);
    let missing_hour = day.and_hms(10, 0, 0);
    let marked_hour = day.and_hms(14, 0, 0);

    for hour in calendar::repair_scan_hours(dates.start, dates.end) {
        if hour == missing_hour {
            continue;
        }
        let marker = (hour == marked_hour).then(|| "solar");
        write_stub_hour(work_dir.path(), hour, marker, 0.0);
    }
    let tools = StubbingCollaborators::default();

    repair::hours::repair_missing_hours(&dates, work_dir.path(), &tools).unwrap();
    repair::variables::repair_missing_variables(&dates, work_dir.path(), &tools).unwrap();

    // the missing hour was produced by whole-dataset interpolation
    let interpolations = tools.inner.interpolations.borrow();
    assert_eq!(interpolations.len(), 1);
    assert_eq!(
        interpolations[0].output,
        calendar::hour_path(work_dir.path(), missing_hour)
    );

    // the placeholder variable was produced by per-variable
    // interpolation, flanked by its neighbouring hours
    let field_interpolations = tools.inner.field_interpolations.borrow();
    assert_eq!(field_interpolations.len(), 1);
    assert_eq!(field_interpolations[0].field, "solar");
    assert_eq!(
        field_interpolations[0].before,
        calendar::hour_path(work_dir.path(), marked_hour - Duration::hours(1))
    );
    assert_eq!(
        field_interpolations[0].after,
        calendar::hour_path(work_dir.path(), marked_hour + Duration::hours(1))
    );
}

#[test]
fn repaired_day_has_evenly_spaced_time_counters() {
    let work_dir = tempfile::tempdir().unwrap();
    let dates = Dates {
        start: NaiveDate::from_ymd(2007, 1, 2),
        end: NaiveDate::from_ymd(2007, 1, 2),
    };
    let day = NaiveDate::from_ymd(2007, 1, 2);
    let gap = [day.and_hms(5, 0, 0), day.and_hms(6, 0, 0)];

    for hour in calendar::repair_scan_hours(dates.start, dates.end) {
        if !gap.contains(&hour) {
            write_stub_hour(work_dir.path(), hour, None, 0.0);
        }
    }
    let tools = StubbingCollaborators::default();

    repair::hours::repair_missing_hours(&dates, work_dir.path(), &tools).unwrap();

    let mut previous: Option<Float> = None;
    for hour in calendar::hours(day.and_hms(0, 0, 0), day.and_hms(23, 0, 0)) {
        let offset =
            dataset::time_counter(&calendar::hour_path(work_dir.path(), hour)).unwrap();
        if let Some(previous) = previous {
            assert_approx_eq!(Float, offset - previous, 3600.0);
        }
        previous = Some(offset);
    }
}
