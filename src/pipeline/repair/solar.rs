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

//! Sub-module reconstructing surface solar radiation from cloud
//! fraction and solar geometry.
//!
//! The archive carries no shortwave radiation at all between
//! 2007-02-01 and 2007-02-24, so there is nothing to interpolate
//! from. For those hours the radiation is computed instead: top-of-
//! atmosphere irradiance from the day of year, solar elevation from
//! the hour angle at the domain-centre latitude, and an empirical
//! cloud transmission model per tenth of cloud cover.
//!
//! The solar geometry is evaluated at one fixed latitude and one
//! fixed local standard time offset for the whole grid (see
//! [`crate::constants`]); the domain is small enough for that and
//! downstream numeric parity depends on it.

use crate::constants::{
    CLOUD_TO_SOLAR_A, CLOUD_TO_SOLAR_B, DOMAIN_CENTRE_LATITUDE, LOCAL_STANDARD_UTC_OFFSET_HOURS,
    SOLAR_CONSTANT,
};
use crate::errors::RepairError;
use crate::pipeline::dataset;
use crate::Float;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use log::info;
use ndarray::Array2;
use std::f64::consts::PI;
use std::path::Path;

/// Whether `hour` falls in the period with no archived shortwave
/// radiation to interpolate from.
pub fn in_archive_gap(hour: NaiveDateTime) -> bool {
    let gap_start = NaiveDate::from_ymd(2007, 2, 1).and_hms(0, 0, 0);
    let gap_end = NaiveDate::from_ymd(2007, 2, 24).and_hms(0, 0, 0);
    gap_start <= hour && hour < gap_end
}

/// Replaces the solar placeholder of the hourly dataset at `path`
/// with the cloud-model reconstruction and clears it from the
/// missing-variables marker.
pub fn fill_from_clouds(path: &Path, hour: NaiveDateTime) -> Result<(), RepairError> {
    info!(
        "calculating solar radiation from cloud fraction for {}",
        path.display()
    );

    let cloud_fraction = dataset::read_field(path, "percentcloud")?;
    // the dataset stores cloud fraction 0-1, the cloud model wants tenths
    let cloud_tenths = cloud_fraction.mapv(|cf| cf * 10.0);
    let solar = radiation_from_clouds(hour, &cloud_tenths);
    dataset::replace_field(path, "solar", &solar)?;

    let marker = dataset::missing_variables(path)?.unwrap_or_default();
    let remaining = dataset::marker_without(&marker, "solar");
    dataset::set_missing_variables(path, remaining.as_deref().unwrap_or(""))?;

    Ok(())
}

/// Surface solar radiation (W/m^2) for one hour from the cloud
/// fraction field in tenths.
pub fn radiation_from_clouds(
    hour_utc: NaiveDateTime,
    cloud_tenths: &Array2<Float>,
) -> Array2<Float> {
    let local = hour_utc + Duration::hours(LOCAL_STANDARD_UTC_OFFSET_HOURS);
    let day = Float::from(local.date().ordinal());
    let day_time = Float::from(local.time().num_seconds_from_midnight());

    let hour_angle_deg = (day_time / 3600.0 - 12.0) * 15.0;
    let declination = 23.45 * PI / 180.0 * ((284.0 + day) / 365.25 * 2.0 * PI).sin();
    let latitude = PI * DOMAIN_CENTRE_LATITUDE / 180.0;

    // solar elevation
    let cos_zenith = declination.sin() * latitude.sin()
        + declination.cos() * latitude.cos() * (PI / 180.0 * hour_angle_deg).cos();

    // assume the domain is south of the Arctic Circle
    let hour_angle = latitude.tan() * declination.tan();
    let day_length = (-hour_angle).acos() / 15.0 * 2.0 * 180.0 / PI;
    let sunrise = 12.0 - 0.5 * day_length;
    let sunset = 12.0 + 0.5 * day_length;

    if day_time / 3600.0 <= sunrise || day_time / 3600.0 >= sunset {
        return Array2::zeros(cloud_tenths.raw_dim());
    }

    let toa_irradiance = SOLAR_CONSTANT * (1.0 + 0.033 * (day / 365.25 * 2.0 * PI).cos());

    cloud_tenths.mapv(|cloud| {
        let cloud = cloud.clamp(0.0, 10.0);
        let mut floor_tenth = cloud.floor();
        let mut ceil_tenth = cloud.ceil();
        if floor_tenth == ceil_tenth {
            if floor_tenth == 10.0 {
                floor_tenth = 9.0;
            } else {
                ceil_tenth = floor_tenth + 1.0;
            }
        }

        let (below, above) = (floor_tenth as usize, ceil_tenth as usize);
        let a = CLOUD_TO_SOLAR_A[below] * (ceil_tenth - cloud)
            + CLOUD_TO_SOLAR_A[above] * (cloud - floor_tenth);
        let b = CLOUD_TO_SOLAR_B[below] * (ceil_tenth - cloud)
            + CLOUD_TO_SOLAR_B[above] * (cloud - floor_tenth);

        toa_irradiance * (a + b * cos_zenith) * cos_zenith
    })
}
