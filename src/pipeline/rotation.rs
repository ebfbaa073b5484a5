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

//! Module rotating grid-relative wind components to true north/east.
//!
//! The archive grid is rotated with respect to the geographic axes,
//! so the wind components stored along its rows and columns have to
//! be turned by the local bearing of the grid x-axis before an ocean
//! model can use them.

use crate::Float;
use ndarray::{Array2, Zip};

/// Rotates grid-relative wind components to true north/east.
///
/// The bearing of the grid x-axis is measured per cell from the
/// forward difference of the longitude/latitude coordinate arrays
/// along the x direction; the last column reuses the bearing of its
/// neighbour. All arrays must share the same `(y, x)` shape.
pub fn rotate_to_true_north_east(
    grid_u: &Array2<Float>,
    grid_v: &Array2<Float>,
    nav_lon: &Array2<Float>,
    nav_lat: &Array2<Float>,
) -> (Array2<Float>, Array2<Float>) {
    let theta = grid_bearing(nav_lon, nav_lat);

    let mut u_true = Array2::zeros(grid_u.raw_dim());
    let mut v_true = Array2::zeros(grid_v.raw_dim());

    Zip::from(&mut u_true)
        .and(&mut v_true)
        .and(grid_u)
        .and(grid_v)
        .and(&theta)
        .for_each(|u_out, v_out, &u, &v, &angle| {
            let (sin_a, cos_a) = angle.sin_cos();
            *u_out = u * cos_a - v * sin_a;
            *v_out = u * sin_a + v * cos_a;
        });

    (u_true, v_true)
}

/// Angle (radians, counterclockwise from geographic east) of the
/// grid x-axis at every cell.
fn grid_bearing(nav_lon: &Array2<Float>, nav_lat: &Array2<Float>) -> Array2<Float> {
    let (ny, nx) = nav_lon.dim();
    let mut theta = Array2::zeros((ny, nx));
    if nx < 2 {
        return theta;
    }

    for j in 0..ny {
        for i in 0..nx {
            // forward difference along x, backward in the last column
            let (i0, i1) = if i + 1 < nx { (i, i + 1) } else { (i - 1, i) };
            let dlat = nav_lat[[j, i1]] - nav_lat[[j, i0]];
            let mean_lat = 0.5 * (nav_lat[[j, i1]] + nav_lat[[j, i0]]);
            let dlon = (nav_lon[[j, i1]] - nav_lon[[j, i0]]) * mean_lat.to_radians().cos();
            theta[[j, i]] = dlat.atan2(dlon);
        }
    }

    theta
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use ndarray::arr2;

    #[test]
    fn aligned_grid_keeps_wind_unchanged() {
        // rows of constant latitude, longitude increasing along x
        let nav_lon = arr2(&[[-124.0, -123.9], [-124.0, -123.9]]);
        let nav_lat = arr2(&[[49.0, 49.0], [49.1, 49.1]]);
        let u = arr2(&[[5.0, 5.0], [5.0, 5.0]]);
        let v = arr2(&[[-2.0, -2.0], [-2.0, -2.0]]);

        let (u_true, v_true) = rotate_to_true_north_east(&u, &v, &nav_lon, &nav_lat);

        assert_approx_eq!(Float, u_true[[0, 0]], 5.0, epsilon = 1e-12);
        assert_approx_eq!(Float, v_true[[1, 1]], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn quarter_turned_grid_swaps_components() {
        // grid x-axis pointing geographic north
        let nav_lon = arr2(&[[-124.0, -124.0], [-123.9, -123.9]]);
        let nav_lat = arr2(&[[49.0, 49.1], [49.0, 49.1]]);
        let u = arr2(&[[3.0, 3.0], [3.0, 3.0]]);
        let v = arr2(&[[0.0, 0.0], [0.0, 0.0]]);

        let (u_true, v_true) = rotate_to_true_north_east(&u, &v, &nav_lon, &nav_lat);

        // eastward component turns northward
        assert_approx_eq!(Float, u_true[[0, 0]], 0.0, epsilon = 1e-9);
        assert_approx_eq!(Float, v_true[[0, 0]], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn rotation_preserves_wind_speed() {
        let nav_lon = arr2(&[[-124.0, -123.92], [-123.98, -123.9]]);
        let nav_lat = arr2(&[[49.0, 49.03], [49.06, 49.09]]);
        let u = arr2(&[[4.0, 1.0], [-3.0, 2.5]]);
        let v = arr2(&[[1.0, -2.0], [0.5, 3.0]]);

        let (u_true, v_true) = rotate_to_true_north_east(&u, &v, &nav_lon, &nav_lat);

        for j in 0..2 {
            for i in 0..2 {
                let before = (u[[j, i]].powi(2) + v[[j, i]].powi(2)).sqrt();
                let after = (u_true[[j, i]].powi(2) + v_true[[j, i]].powi(2)).sqrt();
                assert_approx_eq!(Float, before, after, epsilon = 1e-9);
            }
        }
    }
}
