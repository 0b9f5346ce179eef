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

use crate::cosmic::TargetEphemeris;
use crate::errors::EventError;
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use std::fmt;

mod contact;
mod eclipse;
mod elevation;
mod los;

pub use contact::{Contact, ContactMember};
pub use eclipse::{Eclipse, EclipseKind};
pub use elevation::Elevation;
pub use los::LineOfSight;

/// Step used by the finite difference rate probes, in seconds.
pub(crate) const FD_STEP_S: f64 = 0.25;

/// One evaluation of an event function: the epoch it was evaluated at, the
/// function value, and the time derivative of the value.
///
/// Samples are returned by value; there is no internal buffer to alias.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventSample {
    pub epoch: Epoch,
    pub value: f64,
    /// d(value)/dt in 1/s
    pub rate: f64,
}

impl fmt::Display for EventSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.9} ({:.3e} /s) @ {}",
            self.value, self.rate, self.epoch
        )
    }
}

/// A scalar, time continuous function whose zero crossings mark a physically
/// meaningful boundary: horizon crossing, shadow entry or exit, obstruction
/// onset.
///
/// Functions are built by a locator, initialized once per run, and then
/// evaluated repeatedly during the root search or inside an integrator's
/// derivative evaluation. Evaluating before a successful [initialize] is an
/// error.
///
/// [initialize]: EventFunction::initialize
pub trait EventFunction: fmt::Display + Send + Sync {
    /// The static type name of this function, e.g. `Elevation`.
    fn kind(&self) -> &'static str;

    /// The instance name, derived from the primary and secondary names.
    fn label(&self) -> String;

    /// The primary moving object this function is tied to.
    fn primary(&self) -> &dyn TargetEphemeris;

    /// Validates the references this function needs and caches what can be
    /// cached (shapes, masks).
    fn initialize(&mut self) -> Result<(), EventError>;

    /// Evaluates the function for the provided epoch and MJ2000
    /// position+velocity state, which need not lie on the primary's own
    /// trajectory (e.g. a trial state inside an integrator).
    fn evaluate(&self, epoch: Epoch, state_km: &Vector6<f64>) -> Result<EventSample, EventError>;

    /// Evaluates the function at the primary's current epoch and state.
    fn evaluate_primary(&self) -> Result<EventSample, EventError> {
        let epoch = self.primary().epoch();
        let state = self.primary().state_km(epoch)?;
        self.evaluate(epoch, &state)
    }
}

/// Advances a position+velocity state by `dt_s` seconds along its velocity,
/// optionally curving the probe with the provided acceleration. Used by the
/// finite difference rate probes.
pub(crate) fn advance_state(
    state: &Vector6<f64>,
    dt_s: f64,
    accel_km_s2: Option<Vector3<f64>>,
) -> Vector6<f64> {
    let mut pos = crate::utils::pos_km(state) + crate::utils::vel_km_s(state) * dt_s;
    let mut vel = crate::utils::vel_km_s(state);
    if let Some(accel) = accel_km_s2 {
        pos += accel * (0.5 * dt_s * dt_s);
        vel += accel * dt_s;
    }
    Vector6::new(pos.x, pos.y, pos.z, vel.x, vel.y, vel.z)
}
