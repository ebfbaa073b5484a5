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

//! Module containing error types used by the pipeline.
//!
//! Apart from a raw lead-hour file that is absent from the archive
//! (an expected condition the repair stages deal with) every error
//! aborts the whole run. The forcing files feed an ocean model that
//! requires complete, gap-free daily coverage, so partial output is
//! worse than no output.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while deriving hourly fields: {0}")]
    Derive(#[from] DeriveError),

    #[error("Error while repairing gaps: {0}")]
    Repair(#[from] RepairError),

    #[error("Error while running external tool: {0}")]
    External(#[from] ExternalError),

    #[error("Error while accessing hourly dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Problem with the output directory: {0}")]
    FaultyOutput(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

/// Errors of the hourly dataset (NetCDF) access layer.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Variable {name} is not in dataset {path}")]
    MissingVariable { name: &'static str, path: PathBuf },

    #[error("Dataset {path} has an empty time axis")]
    EmptyTimeAxis { path: PathBuf },

    #[error("Dataset {path} has a malformed grid: {reason}")]
    MalformedGrid { path: PathBuf, reason: &'static str },
}

/// Errors of the field derivation stage.
#[derive(Error, Debug)]
pub enum DeriveError {
    /// The raw lead-hour file is absent from the archive. The hour
    /// assembler skips it and the repair stages fill the gap.
    #[error("Raw lead-hour file {0} does not exist")]
    MissingSource(PathBuf),

    #[error("Cannot read raw lead-hour dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Cannot delete consumed raw lead-hour file: {0}")]
    Cleanup(#[from] std::io::Error),
}

/// Errors of the missing-hour and missing-variable repair stages.
#[derive(Error, Debug)]
pub enum RepairError {
    /// An interpolation-bounding dataset itself carries unresolved
    /// missing variables. Interpolating from a placeholder would
    /// spread NaNs through the output, so the run stops here.
    #[error("Interpolation bound {path} carries missing variables ({missing})")]
    CorruptSource { path: PathBuf, missing: String },

    #[error("Hours missing at the end of the scanned range, no later hour bounds them: {0:?}")]
    MissingHoursAtEndOfRange(Vec<NaiveDateTime>),

    #[error("Variables still missing at the end of the scanned range: {0:?}")]
    MissingVariablesAtEndOfRange(Vec<String>),

    /// Repair across days requires the same hour on the following day
    /// to have been produced already.
    #[error("Inter-day interpolation bound {0} does not exist yet")]
    InterpolationSourceNotReady(PathBuf),

    #[error("Cannot read interpolation bound dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Interpolation tool failed: {0}")]
    External(#[from] ExternalError),
}

/// Errors of external shell tool invocations.
#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Cannot spawn command `{command}`: {source}")]
    CantSpawn {
        command: String,
        source: std::io::Error,
    },
}
