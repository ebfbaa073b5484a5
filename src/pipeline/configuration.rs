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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use crate::errors::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fields with the date range to generate forcing files for.
///
/// One spin-up day before `start` is also processed so that the
/// repair stages have an hour to interpolate from at the range start.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Dates {
    /// First date to generate a daily forcing file for.
    pub start: NaiveDate,

    /// Last date to generate a daily forcing file for.
    /// Must not be earlier than `start`.
    pub end: NaiveDate,
}

impl Dates {
    /// Checks if the date range is well formed.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.end < self.start {
            return Err(ConfigError::OutOfBounds(
                "End date cannot be earlier than start date",
            ));
        }

        Ok(())
    }
}

/// Fields describing the raw archive the forcing is generated from.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Archive {
    /// Hour of day at which the archived forecast runs start.
    ///
    /// Must be one of `0`, `6`, `12` or `18`.
    pub forecast_origin: u32,

    /// Directory tree in which the raw archive files are stored in
    /// year directories.
    pub rpn_dir: PathBuf,
}

impl Archive {
    /// Checks if the forecast origin is one the archive contains.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !matches!(self.forecast_origin, 0 | 6 | 12 | 18) {
            return Err(ConfigError::OutOfBounds(
                "Forecast origin hour must be one of 0, 6, 12, 18",
            ));
        }

        Ok(())
    }
}

/// Fields with the output locations of the pipeline.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// Directory in which the hourly and daily forcing files are
    /// stored.
    pub dest_dir: PathBuf,

    /// _(Optional)_ Directory for the intermediate per-hour files.
    ///
    /// Useful for debugging since the intermediate files are kept
    /// there after the run. Defaults to a temporary directory that is
    /// removed on exit.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

/// _(Optional)_ Fields locating the external tool scripts.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Tools {
    /// _(Optional)_ Shell script defining the external tool
    /// functions (archive conversion, interpolation, daily
    /// concatenation). Defaults to `forcing_tools.sh` in the current
    /// directory.
    #[serde(default = "Tools::default_script")]
    pub script: PathBuf,
}

impl Tools {
    fn default_script() -> PathBuf {
        PathBuf::from("forcing_tools.sh")
    }
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            script: Tools::default_script(),
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the pipeline.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Heap memory limit for the pipeline in MB.
    /// Useful for enabling meaningful Out-of-memory error messages.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space
    /// (`2^32` or `2^64` bytes).
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if the memory limit is above the minimum.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub dates: Dates,

    pub archive: Archive,

    pub output: Output,

    #[serde(default)]
    pub tools: Tools,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        config.dates.check_bounds()?;
        config.archive.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
dates:
  start: 2007-01-01
  end: 2007-01-31
archive:
  forecast_origin: 6
  rpn_dir: /archive/rpn
output:
  dest_dir: /results/forcing
  work_dir: /scratch/forcing
resources:
  memory: 4096
";

    #[test]
    fn sample_config_deserializes() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.dates.start, NaiveDate::from_ymd(2007, 1, 1));
        assert_eq!(config.archive.forecast_origin, 6);
        assert_eq!(config.output.work_dir.as_deref().unwrap().to_str(), Some("/scratch/forcing"));
        assert_eq!(config.tools.script, PathBuf::from("forcing_tools.sh"));
        assert_eq!(config.resources.memory, 4096);
        config.dates.check_bounds().unwrap();
        config.archive.check_bounds().unwrap();
        config.resources.check_bounds().unwrap();
    }

    #[test]
    fn reversed_date_range_is_out_of_bounds() {
        let dates = Dates {
            start: NaiveDate::from_ymd(2007, 2, 1),
            end: NaiveDate::from_ymd(2007, 1, 1),
        };
        assert!(dates.check_bounds().is_err());
    }

    #[test]
    fn unknown_forecast_origin_is_out_of_bounds() {
        let archive = Archive {
            forecast_origin: 3,
            rpn_dir: PathBuf::from("/archive/rpn"),
        };
        assert!(archive.check_bounds().is_err());
    }

    #[test]
    fn memory_limit_below_minimum_is_out_of_bounds() {
        let resources = Resources { memory: 64 };
        assert!(resources.check_bounds().is_err());
    }
}
