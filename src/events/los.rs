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

use super::{advance_state, EventFunction, EventSample, FD_STEP_S};
use crate::cosmic::{
    Aberration, BodyShape, Ephemerides, FrameConverter, GroundStation, TargetEphemeris,
};
use crate::errors::EventError;
use crate::linalg::{Vector3, Vector6};
use crate::time::{Epoch, Unit};
use std::fmt;
use std::sync::Arc;

/// The line of sight obstruction event function between the primary and a
/// secondary point, tested against one occulting body.
///
/// The value is the squared distance margin, in km^2, between the
/// primary-secondary segment and the occulting body's sphere: positive when
/// the path is clear, negative when the body blocks it. The occulter is
/// expected to be a third body (e.g. the Moon for an Earth station): the
/// station's own horizon is the elevation function's concern.
pub struct LineOfSight {
    primary: Arc<dyn TargetEphemeris>,
    station: GroundStation,
    /// Name of the occulting body
    body: String,
    ab: Aberration,
    eph: Arc<dyn Ephemerides>,
    frames: Arc<dyn FrameConverter>,
    body_shape: Option<BodyShape>,
    station_body_shape: Option<BodyShape>,
}

impl LineOfSight {
    pub fn new(
        primary: Arc<dyn TargetEphemeris>,
        station: GroundStation,
        body: &str,
        ab: Aberration,
        eph: Arc<dyn Ephemerides>,
        frames: Arc<dyn FrameConverter>,
    ) -> Self {
        Self {
            primary,
            station,
            body: body.to_string(),
            ab,
            eph,
            frames,
            body_shape: None,
            station_body_shape: None,
        }
    }

    pub fn occulting_body(&self) -> &str {
        &self.body
    }

    /// Renames a referenced object: the secondary station or the occulter.
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        if self.station.name == old_name {
            self.station.name = new_name.to_string();
        }
        if self.body == old_name {
            self.body = new_name.to_string();
        }
    }

    fn value_at(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<f64, EventError> {
        let body_shape = self.body_shape.as_ref().ok_or(EventError::EvalBeforeInit {
            kind: "LineOfSight",
        })?;
        let station_shape = self
            .station_body_shape
            .as_ref()
            .ok_or(EventError::EvalBeforeInit {
                kind: "LineOfSight",
            })?;

        let secondary = self.station.state_km(station_shape, &self.frames, epoch)?;
        let occulter = self.eph.state_km(&self.body, epoch, self.ab)?;

        Ok(segment_margin_km2(
            &crate::utils::pos_km(state_km),
            &crate::utils::pos_km(&secondary),
            &crate::utils::pos_km(&occulter),
            body_shape.equatorial_radius_km,
        ))
    }
}

/// Squared distance margin between the segment from `p` to `s` and the sphere
/// of the given radius centered at `o`.
fn segment_margin_km2(
    p: &Vector3<f64>,
    s: &Vector3<f64>,
    o: &Vector3<f64>,
    radius_km: f64,
) -> f64 {
    let r1 = p - o;
    let r2 = s - o;
    let d = r2 - r1;
    let dd = d.norm_squared();
    // Parameter of the closest approach, clamped onto the segment
    let tau = if dd < f64::EPSILON {
        0.0
    } else {
        (-r1.dot(&d) / dd).clamp(0.0, 1.0)
    };
    let closest = r1 + d * tau;
    closest.norm_squared() - radius_km * radius_km
}

impl fmt::Display for LineOfSight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl EventFunction for LineOfSight {
    fn kind(&self) -> &'static str {
        "LineOfSight"
    }

    fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.primary.name(),
            self.station.name,
            self.body
        )
    }

    fn primary(&self) -> &dyn TargetEphemeris {
        self.primary.as_ref()
    }

    fn initialize(&mut self) -> Result<(), EventError> {
        if self.station.name.is_empty() {
            return Err(EventError::MissingReference {
                kind: self.kind(),
                what: "secondary",
            });
        }
        if self.body.is_empty() {
            return Err(EventError::MissingReference {
                kind: self.kind(),
                what: "occulting body",
            });
        }
        self.body_shape = Some(self.eph.shape(&self.body)?);
        self.station_body_shape = Some(self.eph.shape(&self.station.body)?);
        Ok(())
    }

    fn evaluate(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<EventSample, EventError> {
        let value = self.value_at(epoch, state_km)?;

        let accel = self.primary.acceleration_km_s2(epoch);
        let ahead = self.value_at(
            epoch + FD_STEP_S * Unit::Second,
            &advance_state(state_km, FD_STEP_S, accel),
        )?;
        let behind = self.value_at(
            epoch - FD_STEP_S * Unit::Second,
            &advance_state(state_km, -FD_STEP_S, accel),
        )?;
        let rate = (ahead - behind) / (2.0 * FD_STEP_S);

        Ok(EventSample { epoch, value, rate })
    }
}
