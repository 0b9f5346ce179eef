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

use super::search::{find_arcs, intersect};
use super::{ContactEvent, ContactResult, EventLocator, LightTimeDirection, LocatedEventTable};
use super::{LocatedEvent, SearchConfig};
use crate::cosmic::{Ephemerides, FrameConverter, GroundStation, TargetEphemeris};
use crate::dynamics::EventFunctionSource;
use crate::errors::{EventError, EventSnafu, LocatorError};
use crate::events::{Contact, ContactMember, Elevation, EventFunction, EventSample, LineOfSight};
use crate::linalg::Vector6;
use crate::time::Epoch;
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

/// Locates station visibility windows: intervals during which the target is
/// above a station's elevation mask and unobstructed by every configured
/// occulting body.
///
/// One [Contact] composite is assembled per station at initialization. The
/// search finds the positive arcs of each member function separately and
/// intersects the windows, which is how the simultaneous zero crossings of
/// the composite are interpreted.
pub struct ContactLocator {
    core: EventLocator,
    stations: Vec<GroundStation>,
    occulters: Vec<String>,
    light_time_direction: LightTimeDirection,
    contacts: Vec<Contact>,
    results: Vec<ContactResult>,
}

impl ContactLocator {
    pub fn new(
        target: Arc<dyn TargetEphemeris>,
        eph: Arc<dyn Ephemerides>,
        frames: Arc<dyn FrameConverter>,
        cfg: SearchConfig,
    ) -> Self {
        Self {
            core: EventLocator::new(target, eph, frames, cfg),
            stations: Vec::new(),
            occulters: Vec::new(),
            light_time_direction: LightTimeDirection::default(),
            contacts: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn add_station(&mut self, station: GroundStation) {
        self.stations.push(station);
    }

    /// Adds a third body obstruction test between the target and every
    /// station.
    pub fn add_occulter(&mut self, body: &str) {
        self.occulters.push(body.to_string());
    }

    pub fn set_light_time_direction(&mut self, direction: LightTimeDirection) {
        self.light_time_direction = direction;
    }

    /// Parses and sets the light time direction; anything but `Transmit` or
    /// `Receive` is rejected at setter time.
    pub fn set_light_time_direction_str(&mut self, raw: &str) -> Result<(), LocatorError> {
        self.light_time_direction = raw.parse()?;
        Ok(())
    }

    pub fn stations(&self) -> &[GroundStation] {
        &self.stations
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn core(&self) -> &EventLocator {
        &self.core
    }

    /// The aberration token, `X` prefixed when corrections apply at
    /// transmission.
    pub fn abcorr(&self) -> String {
        self.core
            .aberration(self.light_time_direction == LightTimeDirection::Transmit)
            .token()
    }

    /// Validates the configuration and assembles one contact composite per
    /// station.
    pub fn initialize(&mut self) -> Result<(), LocatorError> {
        self.core.initialize()?;
        if self.stations.is_empty() {
            return Err(LocatorError::NoStations);
        }

        let ab = self
            .core
            .aberration(self.light_time_direction == LightTimeDirection::Transmit);
        self.contacts.clear();
        self.results.clear();
        for station in &self.stations {
            let mut contact = Contact::new(self.core.target().clone());
            contact.set_member(ContactMember::Elevation(Elevation::new(
                self.core.target().clone(),
                station.clone(),
                self.core.eph().clone(),
                self.core.frames().clone(),
            )));
            for body in &self.occulters {
                contact.set_member(ContactMember::LineOfSight(LineOfSight::new(
                    self.core.target().clone(),
                    station.clone(),
                    body,
                    ab,
                    self.core.eph().clone(),
                    self.core.frames().clone(),
                )));
            }
            contact.initialize().context(EventSnafu)?;
            self.contacts.push(contact);
        }
        Ok(())
    }

    /// Searches the configured window, records the boundaries in the run
    /// table and writes the report when enabled.
    pub fn locate_events(&mut self, table: &mut LocatedEventTable) -> Result<(), LocatorError> {
        let (from, to) = self.core.search_window()?;
        info!(
            "searching for contacts of {} from {from} until {to}",
            self.core.target().name()
        );
        self.results = self.find_events(from, to)?;

        for result in &self.results {
            let participants = format!("{} - {}", result.target, result.station);
            for event in result.events() {
                table.add_span(event.start(), event.end(), "Contact", &participants);
            }
        }

        if self.core.cfg.write_report {
            let mut text = format!(
                "Contact locator report for {} ({} stations), {from} until {to}, abcorr {}\n\n",
                self.core.target().name(),
                self.stations.len(),
                self.abcorr()
            );
            for result in &self.results {
                text.push_str(&result.report_string());
            }
            self.core.write_report(&text)?;
        }
        Ok(())
    }

    /// Finds the visibility windows of every station over `[from, to]`.
    pub fn find_events(&self, from: Epoch, to: Epoch) -> Result<Vec<ContactResult>, LocatorError> {
        if !self.core.is_ready() || self.contacts.is_empty() {
            return Err(LocatorError::NotReady);
        }
        let step = self.core.cfg.step;
        let precision = self.core.cfg.precision;
        let target = self.core.target().clone();

        let mut results = Vec::with_capacity(self.contacts.len());
        for contact in &self.contacts {
            let station = contact.station().expect("initialized contact").name.clone();

            let elevation = contact.elevation().expect("initialized contact");
            let elev_f = |epoch: Epoch| -> Result<f64, EventError> {
                let state = target.state_km(epoch)?;
                Ok(elevation.evaluate(epoch, &state)?.value)
            };
            let mut windows = find_arcs(&elev_f, from, to, step, precision)?;

            for los in contact.line_of_sight() {
                if windows.is_empty() {
                    break;
                }
                let los_f = |epoch: Epoch| -> Result<f64, EventError> {
                    let state = target.state_km(epoch)?;
                    Ok(los.evaluate(epoch, &state)?.value)
                };
                let clear = find_arcs(&los_f, from, to, step, precision)?;
                windows = intersect(&windows, &clear);
            }

            let mut result = ContactResult::new(target.name(), &station);
            for window in windows {
                result.push(ContactEvent::new(window.start, window.end));
            }
            debug!("{station}: {} contact windows", result.len());
            results.push(result);
        }
        Ok(results)
    }

    pub fn results(&self) -> &[ContactResult] {
        &self.results
    }

    pub fn file_was_written(&self) -> bool {
        self.core.file_was_written()
    }

    /// Renames a referenced station or body, both in the name lists and in
    /// every already constructed event function.
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        for station in self.stations.iter_mut() {
            if station.name == old_name {
                station.name = new_name.to_string();
            }
        }
        for body in self.occulters.iter_mut() {
            if body == old_name {
                *body = new_name.to_string();
            }
        }
        for contact in self.contacts.iter_mut() {
            contact.rename_ref(old_name, new_name);
        }
    }
}

impl EventFunctionSource for ContactLocator {
    fn label(&self) -> String {
        format!("ContactLocator({})", self.core.target().name())
    }

    fn function_count(&self) -> usize {
        self.contacts.iter().map(Contact::function_count).sum()
    }

    fn evaluate_functions(
        &self,
        epoch: Epoch,
        state_km: &Vector6<f64>,
    ) -> Result<Vec<EventSample>, EventError> {
        let mut samples = Vec::with_capacity(self.function_count());
        for contact in &self.contacts {
            samples.extend(contact.evaluate_all(epoch, state_km)?);
        }
        Ok(samples)
    }
}

impl fmt::Display for ContactLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stations: Vec<&str> = self.stations.iter().map(|s| s.name.as_str()).collect();
        write!(
            f,
            "contact locator for {} observed by [{}]",
            self.core.target().name(),
            stations.join(", ")
        )
    }
}
