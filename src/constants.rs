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

//! Module containing constants used by the pipeline.

use crate::Float;

/// Stefan-Boltzmann constant as used by the Dilley-Unsworth
/// longwave correlation.
pub const STEFAN_BOLTZMANN: Float = 5.6697e-8;

/// Magnus-form saturation vapour pressure coefficients
/// (vapour pressure in hPa for temperature in Celsius).
///
/// Within 0.5% the saturation vapour pressure over the pure phase
/// equals that of moist air.
pub const MAGNUS_SCALE: Float = 6.112;
pub const MAGNUS_SLOPE: Float = 17.62;
pub const MAGNUS_OFFSET: Float = 243.12;

/// Ratio of gas constants of dry air and water vapour used to
/// convert vapour pressure to mixing ratio.
pub const DRY_TO_VAPOUR_GAS_RATIO: Float = 0.62198;

/// Offset between Kelvin and Celsius temperature scales.
pub const CELSIUS_OFFSET: Float = 273.15;

/// Water triple point temperature, the reference temperature of the
/// Dilley clear-sky emission correlation.
pub const TRIPLE_POINT: Float = 273.16;

/// Solar constant (top-of-atmosphere irradiance at mean Earth-Sun
/// distance).
pub const SOLAR_CONSTANT: Float = 1368.0;

/// Latitude (degrees north) of the centre of the model domain.
///
/// The cloud-to-solar reconstruction evaluates the solar geometry at
/// this single latitude for the whole grid. Downstream numeric parity
/// depends on this approximation, so it must not be generalized to
/// per-cell latitudes.
pub const DOMAIN_CENTRE_LATITUDE: Float = 50.0;

/// Offset (hours) from UTC to the local standard time in which the
/// cloud-to-solar reconstruction evaluates the solar geometry.
///
/// Fixed year-round; daylight saving is deliberately ignored.
pub const LOCAL_STANDARD_UTC_OFFSET_HOURS: i64 = -8;

/// Cloud-to-solar transmission coefficients per tenth of cloud
/// fraction (Dobson and Smith cloud model).
pub const CLOUD_TO_SOLAR_A: [Float; 11] = [
    0.6337, 0.6149, 0.5861, 0.5512, 0.5002, 0.4649, 0.4225, 0.3669, 0.2468, 0.1981, 0.0841,
];
pub const CLOUD_TO_SOLAR_B: [Float; 11] = [
    0.1959, 0.2119, 0.2400, 0.2859, 0.3192, 0.3356, 0.3339, 0.3490, 0.4427, 0.3116, 0.2283,
];

/// Longest run of consecutive missing hours that is repaired from the
/// hours immediately bounding it. Longer runs span too much of a day
/// for that to be physically sensible and are repaired from the same
/// hour on the neighbouring days instead.
pub const MAX_BOUNDED_GAP_HOURS: usize = 4;

pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86400;
