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

use crate::errors::EventError;
use crate::io::ConfigRepr;
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

mod station;
pub use station::GroundStation;

/// Shape data for a celestial body: the equatorial radius and flattening of
/// its reference ellipsoid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyShape {
    pub name: String,
    /// in km
    pub equatorial_radius_km: f64,
    #[serde(default)]
    pub flattening: f64,
}

impl BodyShape {
    /// A spherical body, i.e. zero flattening.
    pub fn spherical(name: &str, equatorial_radius_km: f64) -> Self {
        Self {
            name: name.to_string(),
            equatorial_radius_km,
            flattening: 0.0,
        }
    }

    pub fn polar_radius_km(&self) -> f64 {
        self.equatorial_radius_km * (1.0 - self.flattening)
    }
}

impl ConfigRepr for BodyShape {}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (eq. radius: {:.3} km    flattening: {:.6})",
            self.name, self.equatorial_radius_km, self.flattening
        )
    }
}

/// Aberration corrections requested from the ephemerides provider.
///
/// The token string follows the SPICE convention: `NONE` without light time
/// delay, `CN` with converged Newtonian light time, `CN+S` when stellar
/// aberration is added, and an `X` prefix when the correction applies at
/// transmission rather than reception.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aberration {
    pub light_time: bool,
    pub stellar: bool,
    pub transmit: bool,
}

impl Aberration {
    /// No correction at all: purely geometric states.
    pub const NONE: Self = Self {
        light_time: false,
        stellar: false,
        transmit: false,
    };

    pub fn token(&self) -> String {
        if !self.light_time {
            return "NONE".to_string();
        }
        let base = if self.stellar { "CN+S" } else { "CN" };
        if self.transmit {
            format!("X{base}")
        } else {
            base.to_string()
        }
    }
}

impl fmt::Display for Aberration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// The moving object whose trajectory drives the event search, as recorded by
/// the surrounding simulation.
///
/// States are MJ2000 position+velocity 6-vectors in km and km/s, about the
/// same center as the [Ephemerides] provider of the run.
pub trait TargetEphemeris: Send + Sync {
    fn name(&self) -> &str;

    /// The target's current epoch.
    fn epoch(&self) -> Epoch;

    /// The span of the recorded trajectory, used by the entire interval
    /// search mode.
    fn span(&self) -> (Epoch, Epoch);

    fn state_km(&self, epoch: Epoch) -> Result<Vector6<f64>, EventError>;

    /// Acceleration of the target, when the provider can compute it. Used to
    /// improve the finite difference probes of the shadow and line of sight
    /// rates; a linear probe is used when this returns None.
    fn acceleration_km_s2(&self, _epoch: Epoch) -> Option<Vector3<f64>> {
        None
    }

    /// Ask the provider to start recording the trajectory so that the entire
    /// recorded span can be searched once propagation completes.
    fn start_recording(&self) {}
}

/// Celestial body states and shapes, as provided by the surrounding
/// simulation's ephemerides.
pub trait Ephemerides: Send + Sync {
    /// MJ2000 state of the named body in km and km/s, with the requested
    /// aberration corrections applied.
    fn state_km(&self, body: &str, epoch: Epoch, ab: Aberration)
        -> Result<Vector6<f64>, EventError>;

    fn shape(&self, body: &str) -> Result<BodyShape, EventError>;
}

/// Rotation of position+velocity 6-vectors between MJ2000 and the named
/// body's body-fixed frame at a given epoch.
///
/// The velocity components of the returned vector must be expressed in the
/// destination frame, i.e. the converter owns the frame rate terms.
pub trait FrameConverter: Send + Sync {
    fn to_body_fixed(
        &self,
        body: &str,
        epoch: Epoch,
        state_mj2000: &Vector6<f64>,
    ) -> Result<Vector6<f64>, EventError>;

    fn from_body_fixed(
        &self,
        body: &str,
        epoch: Epoch,
        state_fixed: &Vector6<f64>,
    ) -> Result<Vector6<f64>, EventError>;
}
