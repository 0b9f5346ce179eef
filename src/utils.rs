/*
    Arclight, event location for astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::linalg::{Vector3, Vector6};

/// Returns the position components of a position+velocity 6-vector, in km.
pub fn pos_km(state: &Vector6<f64>) -> Vector3<f64> {
    Vector3::new(state[0], state[1], state[2])
}

/// Returns the velocity components of a position+velocity 6-vector, in km/s.
pub fn vel_km_s(state: &Vector6<f64>) -> Vector3<f64> {
    Vector3::new(state[3], state[4], state[5])
}

/// Angle between two vectors in radians, in [0, pi].
///
/// Computed with atan2 of the cross and dot products, which stays accurate
/// for nearly parallel and nearly opposite vectors where acos does not.
pub fn angle_between_rad(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}
