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

//! Module deriving the hourly forcing dataset from one raw lead-hour
//! file.
//!
//! Humidity and longwave radiation are not in the archive and are
//! computed from empirical correlations; wind components are rotated
//! from the grid axes to true north/east; the remaining variables are
//! copied through under the names the ocean model expects. A copied
//! variable that is absent from the raw file becomes a NaN
//! placeholder recorded in the `missing_variables` attribute for the
//! repair stages to fill in.

use crate::constants::{
    CELSIUS_OFFSET, DRY_TO_VAPOUR_GAS_RATIO, MAGNUS_OFFSET, MAGNUS_SCALE, MAGNUS_SLOPE,
    STEFAN_BOLTZMANN, TRIPLE_POINT,
};
use crate::errors::DeriveError;
use crate::pipeline::dataset::{self, HourlyDataset, RawHour};
use crate::pipeline::rotation;
use crate::Float;
use chrono::Local;
use log::{debug, warn};
use ndarray::{Array2, Zip};
use std::fs;
use std::path::Path;

/// Derives the hourly forcing dataset at `out_path` from the raw
/// lead-hour file at `raw_path`.
///
/// An absent raw file is reported as [`DeriveError::MissingSource`];
/// the hour assembler treats that as an expected gap.
pub fn write_hourly_file(raw_path: &Path, out_path: &Path) -> Result<(), DeriveError> {
    if !raw_path.exists() {
        return Err(DeriveError::MissingSource(raw_path.to_path_buf()));
    }

    debug!(
        "calculating specific humidity & incoming longwave radiation from {}",
        raw_path.display()
    );
    let raw = dataset::read_raw_hour(raw_path)?;

    let (qair, rh) = specific_and_relative_humidity(&raw);
    let ilwr = incoming_longwave(&raw);
    let (u_wind, v_wind) = rotation::rotate_to_true_north_east(
        &raw.grid_u_wind,
        &raw.grid_v_wind,
        &raw.nav_lon,
        &raw.nav_lat,
    );

    let grid_shape = raw.nav_lon.raw_dim();
    let mut fields: Vec<(&'static str, Array2<Float>)> = vec![
        ("qair", qair),
        ("RH_2maboveground", rh),
        ("therm_rad", ilwr),
        ("u_wind", u_wind),
        ("v_wind", v_wind),
    ];

    let mut missing: Vec<&'static str> = vec![];
    for (out_name, values) in raw.pass_through {
        match values {
            Some(values) => fields.push((out_name, values)),
            None => {
                warn!(
                    "raw archive variable for {} missing from {}",
                    out_name,
                    raw_path.display()
                );
                fields.push((out_name, Array2::from_elem(grid_shape, Float::NAN)));
                missing.push(out_name);
            }
        }
    }

    let timestamp = Local::now().format("%a %b %d %H:%M:%S %Y");
    let history = format!(
        "{}\n{}: Add specific and relative humidity and incoming longwave radiation \
         variables from correlations\n{}: Add data variables metadata",
        raw.history, timestamp, timestamp
    );

    let hourly = HourlyDataset {
        nav_lon: raw.nav_lon,
        nav_lat: raw.nav_lat,
        time_counter: raw.time_counter,
        history,
        missing_variables: if missing.is_empty() {
            None
        } else {
            Some(missing.join(dataset::MISSING_VARIABLES_SEP))
        },
        fields,
    };
    dataset::write_hourly(out_path, &hourly)?;

    Ok(())
}

/// Deletes a raw lead-hour file once its hourly dataset is written.
pub fn discard_raw_file(raw_path: &Path) -> Result<(), DeriveError> {
    fs::remove_file(raw_path)?;
    Ok(())
}

/// Saturation water vapour pressure (hPa) over the pure phase at
/// temperature `t` (Celsius), which within 0.5% is that of moist air.
fn saturation_vapour_pressure(t: &Array2<Float>) -> Array2<Float> {
    t.mapv(|t| MAGNUS_SCALE * (MAGNUS_SLOPE * t / (MAGNUS_OFFSET + t)).exp())
}

/// Specific and relative humidity 2 m above the surface from dew
/// point, sea level pressure, and air temperature.
fn specific_and_relative_humidity(raw: &RawHour) -> (Array2<Float>, Array2<Float>) {
    let ew = saturation_vapour_pressure(&raw.dew_point);

    let mut qair = Array2::zeros(raw.dew_point.raw_dim());
    Zip::from(&mut qair)
        .and(&ew)
        .and(&raw.pressure)
        .for_each(|q, &ew, &pn| {
            // pressure to hectopascals
            let xvw = ew / (0.01 * pn);
            // at the dew point r = rw
            let r = DRY_TO_VAPOUR_GAS_RATIO * xvw / (1.0 - xvw);
            *q = r / (1.0 + r);
        });

    let celsius = raw.temperature.mapv(|t| t - CELSIUS_OFFSET);
    let e_t = saturation_vapour_pressure(&celsius);
    let rh = (&ew / &e_t) * 100.0;

    (qair, rh)
}

/// Incoming longwave radiation at the surface via the
/// Dilley-Unsworth clear/cloudy-sky correlation.
fn incoming_longwave(raw: &RawHour) -> Array2<Float> {
    let ew = saturation_vapour_pressure(&raw.dew_point);

    let mut ilwr = Array2::zeros(raw.dew_point.raw_dim());
    Zip::from(&mut ilwr)
        .and(&ew)
        .and(&raw.temperature)
        .and(&raw.cloud_fraction)
        .for_each(|out, &ew, &tt, &nt| {
            // vapour pressure to kPa, precipitable water approximation
            let w = 465.0 * (ew / 10.0) / tt;
            // Dilley
            let l_clr = 59.38 + 113.7 * (tt / TRIPLE_POINT).powi(6) + 96.96 * (w / 2.5).sqrt();
            // Unsworth
            let e_clr = l_clr / (STEFAN_BOLTZMANN * tt.powi(4));
            let e_wc = (1.0 - 0.84 * nt) * e_clr + 0.84 * nt;
            *out = e_wc * STEFAN_BOLTZMANN * tt.powi(4);
        });

    ilwr
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use ndarray::arr2;
    use std::path::PathBuf;

    fn raw_fixture() -> RawHour {
        let fill = |value: Float| Array2::from_elem((2, 2), value);
        RawHour {
            nav_lon: arr2(&[[-124.0, -123.9], [-124.0, -123.9]]),
            nav_lat: arr2(&[[49.0, 49.0], [49.1, 49.1]]),
            time_counter: 1_798_761_600.0,
            history: "raw fixture".to_string(),
            dew_point: fill(10.0),
            pressure: fill(101_325.0),
            temperature: fill(293.15),
            cloud_fraction: fill(0.5),
            grid_u_wind: fill(5.0),
            grid_v_wind: fill(-2.0),
            pass_through: vec![],
        }
    }

    #[test]
    fn humidity_matches_hand_computed_values() {
        let raw = raw_fixture();
        let (qair, rh) = specific_and_relative_humidity(&raw);
        assert_approx_eq!(Float, qair[[0, 0]], 0.007_560_526_014, epsilon = 1e-9);
        assert_approx_eq!(Float, rh[[1, 1]], 52.560_760_368, epsilon = 1e-6);
    }

    #[test]
    fn longwave_matches_hand_computed_value() {
        let raw = raw_fixture();
        let ilwr = incoming_longwave(&raw);
        assert_approx_eq!(Float, ilwr[[0, 1]], 360.646_685_242, epsilon = 1e-6);
    }

    #[test]
    fn dew_point_at_air_temperature_saturates() {
        let mut raw = raw_fixture();
        raw.dew_point = Array2::from_elem((2, 2), 20.0);
        let (_, rh) = specific_and_relative_humidity(&raw);
        assert_approx_eq!(Float, rh[[0, 0]], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn absent_raw_file_is_a_missing_source() {
        let result = write_hourly_file(
            &PathBuf::from("/nonexistent/2006123106_018.nc"),
            &PathBuf::from("/nonexistent/out.nc"),
        );
        assert!(matches!(result, Err(DeriveError::MissingSource(_))));
    }

    mod with_netcdf_files {
        use super::*;
        use crate::pipeline::dataset;
        use std::path::Path;

        /// Writes a raw lead-hour fixture with the given subset of
        /// pass-through variables present.
        fn write_raw_fixture(path: &Path, pass_through: &[&str]) {
            let mut file = netcdf::create(path).unwrap();
            file.add_dimension("time_counter", 1).unwrap();
            file.add_dimension("y", 2).unwrap();
            file.add_dimension("x", 2).unwrap();
            file.add_attribute("history", "raw fixture").unwrap();

            let mut tc = file
                .add_variable::<Float>("time_counter", &["time_counter"])
                .unwrap();
            tc.put_values(&[1_798_761_600.0], ..).unwrap();

            let grids: &[(&str, Float)] = &[
                ("nav_lon", -124.0),
                ("nav_lat", 49.0),
                ("TD", 10.0),
                ("PN", 101_325.0),
                ("TT", 293.15),
                ("NT", 0.5),
                ("UU", 5.0),
                ("VV", -2.0),
                ("FB", 150.0),
                ("RT", 1.0e-5),
                ("PR", 2.0e-5),
            ];
            for (name, value) in grids {
                let always = matches!(
                    *name,
                    "nav_lon" | "nav_lat" | "TD" | "PN" | "TT" | "NT" | "UU" | "VV"
                );
                if always || pass_through.contains(name) {
                    let mut var = file.add_variable::<Float>(name, &["y", "x"]).unwrap();
                    var.put_values(&[*value; 4], ..).unwrap();
                }
            }
        }

        #[test]
        fn complete_raw_hour_has_no_missing_variables() {
            let dir = tempfile::tempdir().unwrap();
            let raw_path = dir.path().join("2006123106_018.nc");
            let out_path = dir.path().join("gemlam_y2007m01d01_000.nc");
            write_raw_fixture(&raw_path, &["FB", "RT", "PR"]);

            write_hourly_file(&raw_path, &out_path).unwrap();

            assert!(dataset::missing_variables(&out_path).unwrap().is_none());
            let qair = dataset::read_field(&out_path, "qair").unwrap();
            assert_approx_eq!(Float, qair[[0, 0]], 0.007_560_526_014, epsilon = 1e-9);
            let tair = dataset::read_field(&out_path, "tair").unwrap();
            assert_approx_eq!(Float, tair[[1, 0]], 293.15);
        }

        #[test]
        fn absent_variables_become_flagged_placeholders() {
            let dir = tempfile::tempdir().unwrap();
            let raw_path = dir.path().join("2006123106_019.nc");
            let out_path = dir.path().join("gemlam_y2007m01d01_001.nc");
            write_raw_fixture(&raw_path, &["RT"]);

            write_hourly_file(&raw_path, &out_path).unwrap();

            assert_eq!(
                dataset::missing_variables(&out_path).unwrap().as_deref(),
                Some("precip, solar")
            );
            let solar = dataset::read_field(&out_path, "solar").unwrap();
            assert!(solar.iter().all(|value| value.is_nan()));
            let prate = dataset::read_field(&out_path, "PRATE_surface").unwrap();
            assert_approx_eq!(Float, prate[[0, 0]], 1.0e-5);
        }
    }
}
