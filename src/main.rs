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

//! Atmospheric Forcing Generator (AFGEN) converts archival
//! numerical-weather-prediction output into hourly and daily gridded
//! atmospheric forcing files for an ocean circulation model.
//!
//! The raw archive is processed one forecast day at a time. Hours or
//! variables that are absent from the archive are repaired by
//! time-interpolation, with an astronomical cloud-to-solar model as a
//! fallback for the period when no shortwave radiation source exists
//! at all.

mod constants;
mod errors;
mod pipeline;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::alloc;

type Float = f64;

/// Global allocator used by the pipeline.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`pipeline::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
/// Furthermore, errors can occur also during pipeline shutdown and they also
/// can be handled.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("AFGEN_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("AFGEN_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match pipeline::main() {
        Ok(_) => info!("Forcing generation finished. Check the destination directory and log."),
        Err(err) => error!("Forcing generation failed with error: {}", err),
    }
}
