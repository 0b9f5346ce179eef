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

use super::{BodyShape, FrameConverter};
use crate::errors::EventError;
use crate::io::ConfigRepr;
use crate::linalg::{Matrix3, Vector3, Vector6};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// GroundStation defines a fixed point on the surface of a celestial body
/// from which contacts are observed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    pub name: String,
    /// in degrees
    pub latitude_deg: f64,
    /// in degrees
    pub longitude_deg: f64,
    /// in km
    pub height_km: f64,
    /// Name of the central body, resolved through the run's ephemerides
    pub body: String,
    /// in degrees
    #[serde(default)]
    pub elevation_mask_deg: f64,
}

impl GroundStation {
    /// Initializes a point on the surface of a celestial body with a zero
    /// elevation mask.
    pub fn from_point(
        name: String,
        latitude_deg: f64,
        longitude_deg: f64,
        height_km: f64,
        body: String,
    ) -> Self {
        Self {
            name,
            latitude_deg,
            longitude_deg,
            height_km,
            body,
            elevation_mask_deg: 0.0,
        }
    }

    /// Body fixed Cartesian position of this station on the provided
    /// reference ellipsoid, in km.
    pub fn body_fixed_position_km(&self, shape: &BodyShape) -> Vector3<f64> {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let (slat, clat) = lat.sin_cos();
        let (slon, clon) = lon.sin_cos();
        // First eccentricity squared of the ellipsoid
        let e2 = shape.flattening * (2.0 - shape.flattening);
        let n = shape.equatorial_radius_km / (1.0 - e2 * slat * slat).sqrt();
        Vector3::new(
            (n + self.height_km) * clat * clon,
            (n + self.height_km) * clat * slon,
            (n * (1.0 - e2) + self.height_km) * slat,
        )
    }

    /// Rotation from the body fixed frame to this station's topocentric SEZ
    /// frame (south, east, zenith), using the geodetic vertical.
    pub fn sez_rotation(&self) -> Matrix3<f64> {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let (slat, clat) = lat.sin_cos();
        let (slon, clon) = lon.sin_cos();
        Matrix3::new(
            slat * clon,
            slat * slon,
            -clat,
            -slon,
            clon,
            0.0,
            clat * clon,
            clat * slon,
            slat,
        )
    }

    /// MJ2000 state of this station, in km and km/s. The station is static in
    /// its body fixed frame; the converter owns the frame rate terms.
    pub fn state_km(
        &self,
        shape: &BodyShape,
        frames: &Arc<dyn FrameConverter>,
        epoch: Epoch,
    ) -> Result<Vector6<f64>, EventError> {
        let pos = self.body_fixed_position_km(shape);
        let fixed = Vector6::new(pos.x, pos.y, pos.z, 0.0, 0.0, 0.0);
        frames.from_body_fixed(&self.body, epoch, &fixed)
    }
}

impl Default for GroundStation {
    fn default() -> Self {
        Self {
            name: "UNDEFINED".to_string(),
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            height_km: 0.0,
            body: "Earth".to_string(),
            elevation_mask_deg: 0.0,
        }
    }
}

impl ConfigRepr for GroundStation {}

impl fmt::Display for GroundStation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (lat.: {:.4} deg    long.: {:.4} deg    alt.: {:.3} m) [{}]",
            self.name,
            self.latitude_deg,
            self.longitude_deg,
            self.height_km * 1e3,
            self.body,
        )
    }
}
