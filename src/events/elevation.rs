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

use super::{EventFunction, EventSample};
use crate::cosmic::{BodyShape, Ephemerides, FrameConverter, GroundStation, TargetEphemeris};
use crate::errors::EventError;
use crate::linalg::Vector6;
use crate::time::Epoch;
use std::fmt;
use std::sync::Arc;

/// The topocentric elevation event function for one ground station.
///
/// The value is `sin(elevation) - sin(mask)`, not the elevation itself: the
/// sine is smooth through the horizon crossing and free of the angle wrap
/// discontinuities that would defeat the Brent solver. The rate is analytic,
/// by the quotient rule on `z/r` in the station's SEZ frame.
pub struct Elevation {
    primary: Arc<dyn TargetEphemeris>,
    station: GroundStation,
    eph: Arc<dyn Ephemerides>,
    frames: Arc<dyn FrameConverter>,
    shape: Option<BodyShape>,
    mask_sin: f64,
}

impl Elevation {
    pub fn new(
        primary: Arc<dyn TargetEphemeris>,
        station: GroundStation,
        eph: Arc<dyn Ephemerides>,
        frames: Arc<dyn FrameConverter>,
    ) -> Self {
        Self {
            primary,
            station,
            eph,
            frames,
            shape: None,
            mask_sin: 0.0,
        }
    }

    pub fn station(&self) -> &GroundStation {
        &self.station
    }

    /// Renames a referenced object: the station itself or its central body.
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        if self.station.name == old_name {
            self.station.name = new_name.to_string();
        }
        if self.station.body == old_name {
            self.station.body = new_name.to_string();
        }
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl EventFunction for Elevation {
    fn kind(&self) -> &'static str {
        "Elevation"
    }

    fn label(&self) -> String {
        format!("{}-{}", self.primary.name(), self.station.name)
    }

    fn primary(&self) -> &dyn TargetEphemeris {
        self.primary.as_ref()
    }

    fn initialize(&mut self) -> Result<(), EventError> {
        if self.station.name.is_empty() {
            return Err(EventError::MissingReference {
                kind: self.kind(),
                what: "station",
            });
        }
        self.shape = Some(self.eph.shape(&self.station.body)?);
        self.mask_sin = self.station.elevation_mask_deg.to_radians().sin();
        Ok(())
    }

    fn evaluate(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<EventSample, EventError> {
        let shape = self.shape.as_ref().ok_or(EventError::EvalBeforeInit {
            kind: "Elevation",
        })?;

        // Primary state in the station's body fixed frame; the converter owns
        // the frame rate terms so the relative velocity below is complete.
        let fixed = self
            .frames
            .to_body_fixed(&self.station.body, epoch, state_km)?;
        let rel_pos = crate::utils::pos_km(&fixed) - self.station.body_fixed_position_km(shape);
        let rel_vel = crate::utils::vel_km_s(&fixed);

        let dcm = self.station.sez_rotation();
        let rho = dcm * rel_pos;
        let rho_dot = dcm * rel_vel;

        let r = rho.norm();
        let sin_el = rho.z / r;
        // Quotient rule on z/r
        let rate = rho_dot.z / r - rho.z * rho.dot(&rho_dot) / (r * r * r);

        Ok(EventSample {
            epoch,
            value: sin_el - self.mask_sin,
            rate,
        })
    }
}
