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

use super::{Elevation, EventFunction, EventSample, LineOfSight};
use crate::cosmic::{GroundStation, TargetEphemeris};
use crate::errors::EventError;
use crate::linalg::Vector6;
use crate::time::Epoch;
use std::fmt;
use std::sync::Arc;

/// A member of the contact composite, resolved at construction time.
pub enum ContactMember {
    Elevation(Elevation),
    LineOfSight(LineOfSight),
}

/// The contact composite: exactly one [Elevation] and zero or more
/// [LineOfSight] functions for one ground station, owned by value.
///
/// Evaluation yields one sample per member, `3*(1+k)` reals in total for `k`
/// line of sight members: slot 0 from the elevation function and slot `i`
/// from the i-th line of sight. This is deliberately not a boolean AND; the
/// search logic downstream interprets the simultaneous zero crossings by
/// intersecting the per-member windows.
pub struct Contact {
    primary: Arc<dyn TargetEphemeris>,
    elevation: Option<Elevation>,
    los: Vec<LineOfSight>,
    initialized: bool,
}

impl Contact {
    pub fn new(primary: Arc<dyn TargetEphemeris>) -> Self {
        Self {
            primary,
            elevation: None,
            los: Vec::new(),
            initialized: false,
        }
    }

    /// Pushes a member into the composite. A second elevation member
    /// replaces the first: a contact has exactly one horizon test.
    pub fn set_member(&mut self, member: ContactMember) {
        match member {
            ContactMember::Elevation(elev) => self.elevation = Some(elev),
            ContactMember::LineOfSight(los) => self.los.push(los),
        }
        self.initialized = false;
    }

    /// Whether a member with the provided instance label is present.
    pub fn has_member(&self, label: &str) -> bool {
        self.elevation
            .as_ref()
            .map(|e| e.label() == label)
            .unwrap_or(false)
            || self.los.iter().any(|l| l.label() == label)
    }

    /// Drops every member.
    pub fn clear_members(&mut self) {
        self.elevation = None;
        self.los.clear();
        self.initialized = false;
    }

    pub fn elevation(&self) -> Option<&Elevation> {
        self.elevation.as_ref()
    }

    pub fn line_of_sight(&self) -> &[LineOfSight] {
        &self.los
    }

    /// The ground station observed by this composite, once the elevation
    /// member is set.
    pub fn station(&self) -> Option<&GroundStation> {
        self.elevation.as_ref().map(|e| e.station())
    }

    pub fn function_count(&self) -> usize {
        1 + self.los.len()
    }

    /// Total number of reals one evaluation produces: a 3-tuple of epoch,
    /// value and rate per member.
    pub fn buffer_len(&self) -> usize {
        3 * self.function_count()
    }

    pub fn initialize(&mut self) -> Result<(), EventError> {
        let elevation = self
            .elevation
            .as_mut()
            .ok_or(EventError::MissingReference {
                kind: "Contact",
                what: "elevation",
            })?;
        elevation.initialize()?;
        for los in self.los.iter_mut() {
            los.initialize()?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Evaluates every member for the provided epoch and state.
    pub fn evaluate_all(
        &self,
        epoch: Epoch,
        state_km: &Vector6<f64>,
    ) -> Result<Vec<EventSample>, EventError> {
        if !self.initialized {
            return Err(EventError::EvalBeforeInit { kind: "Contact" });
        }
        let elevation = self.elevation.as_ref().unwrap();
        let mut samples = Vec::with_capacity(self.function_count());
        samples.push(elevation.evaluate(epoch, state_km)?);
        for los in &self.los {
            samples.push(los.evaluate(epoch, state_km)?);
        }
        Ok(samples)
    }

    /// Evaluates every member at the primary's current epoch and state.
    pub fn evaluate_all_primary(&self) -> Result<Vec<EventSample>, EventError> {
        let epoch = self.primary.epoch();
        let state = self.primary.state_km(epoch)?;
        self.evaluate_all(epoch, &state)
    }

    /// Renames a referenced object in every member.
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        if let Some(elev) = self.elevation.as_mut() {
            elev.rename_ref(old_name, new_name);
        }
        for los in self.los.iter_mut() {
            los.rename_ref(old_name, new_name);
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.station() {
            Some(station) => write!(f, "Contact {}-{}", self.primary.name(), station.name),
            None => write!(f, "Contact {} (no station)", self.primary.name()),
        }
    }
}
