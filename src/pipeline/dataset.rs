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

//! Module with the NetCDF access layer for raw lead-hour files and
//! hourly forcing datasets.
//!
//! A finalized hourly dataset always carries the full output variable
//! set. A variable that could not be produced from the archive is a
//! NaN-filled placeholder recorded in the `missing_variables` global
//! attribute; clearing the last name from that attribute leaves it as
//! an empty string, which readers treat the same as an absent
//! attribute (the underlying library cannot delete attributes).

use crate::errors::DatasetError;
use crate::pipeline::calendar::TIME_COUNTER_UNITS;
use crate::Float;
use ndarray::Array2;
use std::path::Path;

/// Name of the global attribute listing placeholder variables,
/// comma-space-joined.
pub const MISSING_VARIABLES_ATTR: &str = "missing_variables";

/// Separator of names in the `missing_variables` attribute.
pub const MISSING_VARIABLES_SEP: &str = ", ";

/// Output variable names paired with the raw archive variables they
/// are copied from. Any of these absent from a raw lead-hour file
/// becomes a NaN placeholder to be repaired later.
pub const PASS_THROUGH_VARIABLES: [(&str, &str); 6] = [
    ("atmpres", "PN"),
    ("percentcloud", "NT"),
    ("PRATE_surface", "RT"),
    ("precip", "PR"),
    ("solar", "FB"),
    ("tair", "TT"),
];

/// One raw lead-hour file as written by the external archive
/// converter, squeezed to the 2-D grid.
#[derive(Debug)]
pub struct RawHour {
    pub nav_lon: Array2<Float>,
    pub nav_lat: Array2<Float>,
    pub time_counter: Float,
    pub history: String,
    /// Dew point temperature, Celsius.
    pub dew_point: Array2<Float>,
    /// Sea level pressure, Pa.
    pub pressure: Array2<Float>,
    /// Air temperature, Kelvin.
    pub temperature: Array2<Float>,
    /// Cloud fraction, 0-1.
    pub cloud_fraction: Array2<Float>,
    /// Grid-relative wind components, m/s.
    pub grid_u_wind: Array2<Float>,
    pub grid_v_wind: Array2<Float>,
    /// Pass-through variables by output name, `None` when absent
    /// from the raw file.
    pub pass_through: Vec<(&'static str, Option<Array2<Float>>)>,
}

/// One hourly forcing dataset ready to be written.
#[derive(Debug)]
pub struct HourlyDataset {
    pub nav_lon: Array2<Float>,
    pub nav_lat: Array2<Float>,
    pub time_counter: Float,
    pub history: String,
    pub missing_variables: Option<String>,
    pub fields: Vec<(&'static str, Array2<Float>)>,
}

/// Reads a raw lead-hour file produced by the external converter.
pub fn read_raw_hour(path: &Path) -> Result<RawHour, DatasetError> {
    let file = netcdf::open(path)?;

    let nav_lon = grid_variable(&file, "nav_lon", path)?;
    let nav_lat = grid_variable(&file, "nav_lat", path)?;

    let dew_point = grid_variable(&file, "TD", path)?;
    let pressure = grid_variable(&file, "PN", path)?;
    let temperature = grid_variable(&file, "TT", path)?;
    let cloud_fraction = grid_variable(&file, "NT", path)?;
    let grid_u_wind = grid_variable(&file, "UU", path)?;
    let grid_v_wind = grid_variable(&file, "VV", path)?;

    let mut pass_through = Vec::with_capacity(PASS_THROUGH_VARIABLES.len());
    for (out_name, raw_name) in PASS_THROUGH_VARIABLES {
        let values = if file.variable(raw_name).is_some() {
            Some(grid_variable(&file, raw_name, path)?)
        } else {
            None
        };
        pass_through.push((out_name, values));
    }

    Ok(RawHour {
        time_counter: read_time_counter(&file, path)?,
        history: string_attribute(&file, "history")?.unwrap_or_default(),
        nav_lon,
        nav_lat,
        dew_point,
        pressure,
        temperature,
        cloud_fraction,
        grid_u_wind,
        grid_v_wind,
        pass_through,
    })
}

/// Writes an hourly forcing dataset, encoding `time_counter` as a
/// float count of seconds since the epoch on an unlimited dimension.
pub fn write_hourly(path: &Path, dataset: &HourlyDataset) -> Result<(), DatasetError> {
    let (ny, nx) = dataset.nav_lon.dim();

    let mut file = netcdf::create(path)?;
    file.add_unlimited_dimension("time_counter")?;
    file.add_dimension("y", ny)?;
    file.add_dimension("x", nx)?;

    file.add_attribute("history", dataset.history.as_str())?;
    if let Some(marker) = &dataset.missing_variables {
        file.add_attribute(MISSING_VARIABLES_ATTR, marker.as_str())?;
    }

    {
        let mut time_var = file.add_variable::<Float>("time_counter", &["time_counter"])?;
        time_var.put_attribute("units", TIME_COUNTER_UNITS)?;
        time_var.put_attribute("long_name", "Time axis")?;
        time_var.put_attribute("standard_name", "time")?;
        time_var.put_value(dataset.time_counter, [0])?;
    }

    for (name, values) in [("nav_lon", &dataset.nav_lon), ("nav_lat", &dataset.nav_lat)] {
        let mut var = file.add_variable::<Float>(name, &["y", "x"])?;
        for (attr, value) in variable_metadata(name) {
            var.put_attribute(*attr, *value)?;
        }
        let flat: Vec<Float> = values.iter().copied().collect();
        var.put_values(&flat, ..)?;
    }

    for (name, values) in &dataset.fields {
        let mut var = file.add_variable::<Float>(name, &["time_counter", "y", "x"])?;
        for (attr, value) in variable_metadata(name) {
            var.put_attribute(*attr, *value)?;
        }
        let flat: Vec<Float> = values.iter().copied().collect();
        var.put_values(&flat, (0, .., ..))?;
    }

    Ok(())
}

/// Reads the `missing_variables` attribute of an hourly dataset.
/// An empty attribute counts as no missing variables.
pub fn missing_variables(path: &Path) -> Result<Option<String>, DatasetError> {
    let file = netcdf::open(path)?;
    Ok(string_attribute(&file, MISSING_VARIABLES_ATTR)?.filter(|marker| !marker.is_empty()))
}

/// Overwrites the `missing_variables` attribute of an hourly dataset
/// in place. An empty `marker` clears it.
pub fn set_missing_variables(path: &Path, marker: &str) -> Result<(), DatasetError> {
    let mut file = netcdf::append(path)?;
    file.add_attribute(MISSING_VARIABLES_ATTR, marker)?;
    Ok(())
}

/// Reads the `time_counter` value of an hourly dataset.
pub fn time_counter(path: &Path) -> Result<Float, DatasetError> {
    let file = netcdf::open(path)?;
    read_time_counter(&file, path)
}

/// Reads one 2-D field of an hourly dataset.
pub fn read_field(path: &Path, name: &'static str) -> Result<Array2<Float>, DatasetError> {
    let file = netcdf::open(path)?;
    grid_variable(&file, name, path)
}

/// Overwrites one 2-D field of an existing hourly dataset in place.
pub fn replace_field(
    path: &Path,
    name: &'static str,
    values: &Array2<Float>,
) -> Result<(), DatasetError> {
    let mut file = netcdf::append(path)?;
    let mut var = file
        .variable_mut(name)
        .ok_or_else(|| DatasetError::MissingVariable {
            name,
            path: path.to_path_buf(),
        })?;
    let flat: Vec<Float> = values.iter().copied().collect();
    var.put_values(&flat, (0, .., ..))?;
    Ok(())
}

/// Removes `name` from a comma-space-joined marker. Returns `None`
/// when no names remain.
pub fn marker_without(marker: &str, name: &str) -> Option<String> {
    let remaining: Vec<&str> = marker
        .split(MISSING_VARIABLES_SEP)
        .filter(|var| *var != name && !var.is_empty())
        .collect();
    if remaining.is_empty() {
        None
    } else {
        Some(remaining.join(MISSING_VARIABLES_SEP))
    }
}

fn read_time_counter(file: &netcdf::File, path: &Path) -> Result<Float, DatasetError> {
    let var = file
        .variable("time_counter")
        .ok_or_else(|| DatasetError::MissingVariable {
            name: "time_counter",
            path: path.to_path_buf(),
        })?;
    let values: Vec<Float> = var.get_values(..)?;
    values
        .first()
        .copied()
        .ok_or_else(|| DatasetError::EmptyTimeAxis {
            path: path.to_path_buf(),
        })
}

fn string_attribute(file: &netcdf::File, name: &str) -> Result<Option<String>, DatasetError> {
    match file.attribute(name) {
        Some(attr) => match attr.value()? {
            netcdf::AttributeValue::Str(value) => Ok(Some(value)),
            _ => Ok(None),
        },
        None => Ok(None),
    }
}

/// Reads a gridded variable and squeezes it to 2-D. Raw lead-hour
/// variables carry singleton time and vertical axes which the output
/// must not have.
fn grid_variable(
    file: &netcdf::File,
    name: &'static str,
    path: &Path,
) -> Result<Array2<Float>, DatasetError> {
    let var = file
        .variable(name)
        .ok_or_else(|| DatasetError::MissingVariable {
            name,
            path: path.to_path_buf(),
        })?;
    let dims = var.dimensions();
    if dims.len() < 2 {
        return Err(DatasetError::MalformedGrid {
            path: path.to_path_buf(),
            reason: "gridded variable has fewer than 2 dimensions",
        });
    }
    let ny = dims[dims.len() - 2].len();
    let nx = dims[dims.len() - 1].len();
    let values: Vec<Float> = var.get_values(..)?;
    if values.len() != ny * nx {
        return Err(DatasetError::MalformedGrid {
            path: path.to_path_buf(),
            reason: "leading dimensions of gridded variable are not singletons",
        });
    }
    Array2::from_shape_vec((ny, nx), values).map_err(|_| DatasetError::MalformedGrid {
        path: path.to_path_buf(),
        reason: "gridded variable does not match its dimensions",
    })
}

/// Attributes attached to every output variable. The comments on the
/// derived variables record the correlations they come from.
fn variable_metadata(name: &str) -> &'static [(&'static str, &'static str)] {
    match name {
        "nav_lon" => &[
            ("long_name", "Longitude"),
            ("units", "degrees_east"),
            ("ioos_category", "location"),
        ],
        "nav_lat" => &[
            ("long_name", "Latitude"),
            ("units", "degrees_north"),
            ("ioos_category", "location"),
        ],
        "qair" => &[
            ("level", "2 m above surface"),
            ("long_name", "Specific Humidity"),
            ("standard_name", "specific_humidity_2maboveground"),
            ("units", "kg/kg"),
            (
                "comment",
                "calculated from sea level air pressure and dewpoint temperature via WMO 2012 ocean best practices",
            ),
        ],
        "RH_2maboveground" => &[
            ("level", "2 m above surface"),
            ("long_name", "Relative Humidity"),
            ("standard_name", "relative_humidity_2maboveground"),
            ("units", "percent"),
            (
                "comment",
                "calculated from air temperature and dewpoint temperature via WMO 2012 ocean best practices",
            ),
        ],
        "therm_rad" => &[
            ("level", "surface"),
            ("long_name", "Downward Long-Wave Radiation Flux"),
            ("standard_name", "net_downward_longwave_flux_in_air"),
            ("units", "W/m^2"),
            (
                "comment",
                "calculated from saturation water vapour pressure, air temperature, and cloud fraction via Dilley-Unsworth correlation",
            ),
        ],
        "u_wind" => &[
            ("level", "10 m above surface"),
            ("long_name", "U-Component of Wind"),
            ("standard_name", "x_wind"),
            ("units", "m/s"),
            ("ioos_category", "wind speed and direction"),
        ],
        "v_wind" => &[
            ("level", "10 m above surface"),
            ("long_name", "V-Component of Wind"),
            ("standard_name", "y_wind"),
            ("units", "m/s"),
            ("ioos_category", "wind speed and direction"),
        ],
        "atmpres" => &[
            ("level", "mean sea level"),
            ("long_name", "Pressure Reduced to MSL"),
            ("standard_name", "air_pressure_at_sea_level"),
            ("units", "Pa"),
        ],
        "percentcloud" => &[
            ("long_name", "Cloud Fraction"),
            ("standard_name", "cloud_area_fraction"),
            ("units", "percent"),
        ],
        "PRATE_surface" => &[
            ("level", "surface"),
            ("long_name", "Precipitation Rate"),
            ("standard_name", "precipitation_flux"),
            ("units", "kg/m^2/s"),
        ],
        "precip" => &[
            ("level", "surface"),
            ("long_name", "Total Precipitation"),
            ("standard_name", "precipitation_flux"),
            ("units", "kg/m^2/s"),
        ],
        "solar" => &[
            ("level", "surface"),
            ("long_name", "Downward Short-Wave Radiation Flux"),
            ("standard_name", "net_downward_shortwave_flux_in_air"),
            ("units", "W/m^2"),
        ],
        "tair" => &[
            ("level", "2 m above surface"),
            ("long_name", "Air Temperature"),
            ("standard_name", "air_temperature_2maboveground"),
            ("units", "K"),
        ],
        _ => &[],
    }
}
