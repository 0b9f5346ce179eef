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
use crate::cosmic::{Aberration, BodyShape, Ephemerides, TargetEphemeris};
use crate::errors::EventError;
use crate::linalg::{Vector3, Vector6};
use crate::time::{Epoch, Unit};
use crate::utils::angle_between_rad;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The three geometrically distinct shadow cone regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Sequence)]
pub enum EclipseKind {
    /// Full shadow: the occulting body completely covers the light source.
    Umbra,
    /// Partial shadow: the occulting body covers part of the light source.
    Penumbra,
    /// Beyond the umbral cone apex: the occulting body sits entirely within
    /// the light source's disk (annular eclipse).
    Antumbra,
}

impl EclipseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Umbra => "Umbra",
            Self::Penumbra => "Penumbra",
            Self::Antumbra => "Antumbra",
        }
    }
}

impl fmt::Display for EclipseKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A shadow cone event function for one occulting body and one shadow
/// region.
///
/// The value is the apparent angular surrogate: with `a` the apparent angular
/// radius of the light source seen from the spacecraft, `b` that of the
/// occulting body, and `c` the angular separation of their centers, the
/// function is `c - (b - a)` for the umbra, `c - (a + b)` for the penumbra
/// and `c - (a - b)` for the antumbra. It is negative inside the respective
/// shadow region and smooth through the boundary, which is exactly the
/// tangency of the two apparent disks.
pub struct Eclipse {
    primary: Arc<dyn TargetEphemeris>,
    kind: EclipseKind,
    /// Name of the light source
    sol: String,
    /// Name of the occulting body
    body: String,
    ab: Aberration,
    eph: Arc<dyn Ephemerides>,
    sol_shape: Option<BodyShape>,
    body_shape: Option<BodyShape>,
}

impl Eclipse {
    pub fn new(
        primary: Arc<dyn TargetEphemeris>,
        kind: EclipseKind,
        sol: &str,
        body: &str,
        ab: Aberration,
        eph: Arc<dyn Ephemerides>,
    ) -> Self {
        Self {
            primary,
            kind,
            sol: sol.to_string(),
            body: body.to_string(),
            ab,
            eph,
            sol_shape: None,
            body_shape: None,
        }
    }

    pub fn shadow_kind(&self) -> EclipseKind {
        self.kind
    }

    pub fn occulting_body(&self) -> &str {
        &self.body
    }

    /// Renames a referenced body (light source or occulter).
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        if self.sol == old_name {
            self.sol = new_name.to_string();
        }
        if self.body == old_name {
            self.body = new_name.to_string();
        }
    }

    fn shadow_value(
        &self,
        sc_pos: &Vector3<f64>,
        sol_pos: &Vector3<f64>,
        body_pos: &Vector3<f64>,
        sol_radius_km: f64,
        body_radius_km: f64,
    ) -> f64 {
        let to_sol = sol_pos - sc_pos;
        let to_body = body_pos - sc_pos;
        let a = (sol_radius_km / to_sol.norm()).clamp(-1.0, 1.0).asin();
        let b = (body_radius_km / to_body.norm()).clamp(-1.0, 1.0).asin();
        let c = angle_between_rad(&to_sol, &to_body);
        match self.kind {
            EclipseKind::Umbra => c - (b - a),
            EclipseKind::Penumbra => c - (a + b),
            EclipseKind::Antumbra => c - (a - b),
        }
    }

    fn value_at(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<f64, EventError> {
        let sol_shape = self.sol_shape.as_ref().ok_or(EventError::EvalBeforeInit {
            kind: "Eclipse",
        })?;
        let body_shape = self.body_shape.as_ref().ok_or(EventError::EvalBeforeInit {
            kind: "Eclipse",
        })?;
        let sol_state = self.eph.state_km(&self.sol, epoch, self.ab)?;
        let body_state = self.eph.state_km(&self.body, epoch, self.ab)?;
        Ok(self.shadow_value(
            &crate::utils::pos_km(state_km),
            &crate::utils::pos_km(&sol_state),
            &crate::utils::pos_km(&body_state),
            sol_shape.equatorial_radius_km,
            body_shape.equatorial_radius_km,
        ))
    }
}

impl fmt::Display for Eclipse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl EventFunction for Eclipse {
    fn kind(&self) -> &'static str {
        self.kind.label()
    }

    fn label(&self) -> String {
        format!("{}-{}-{}", self.kind, self.primary.name(), self.body)
    }

    fn primary(&self) -> &dyn TargetEphemeris {
        self.primary.as_ref()
    }

    fn initialize(&mut self) -> Result<(), EventError> {
        if self.sol.is_empty() {
            return Err(EventError::MissingReference {
                kind: self.kind(),
                what: "light source",
            });
        }
        if self.body.is_empty() {
            return Err(EventError::MissingReference {
                kind: self.kind(),
                what: "occulting body",
            });
        }
        self.sol_shape = Some(self.eph.shape(&self.sol)?);
        self.body_shape = Some(self.eph.shape(&self.body)?);
        Ok(())
    }

    fn evaluate(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<EventSample, EventError> {
        let value = self.value_at(epoch, state_km)?;

        // Symmetric difference for the rate, advancing the spacecraft along
        // its velocity (curved by the acceleration when available).
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
