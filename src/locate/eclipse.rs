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

use super::search::find_arcs;
use super::{EclipseEvent, EclipseTotalEvent, EventLocator, LocatedEvent, LocatedEventTable};
use super::SearchConfig;
use crate::cosmic::{Ephemerides, FrameConverter, TargetEphemeris};
use crate::dynamics::EventFunctionSource;
use crate::errors::{EventError, EventSnafu, LocatorError};
use crate::events::{Eclipse, EclipseKind, EventFunction, EventSample};
use crate::linalg::Vector6;
use crate::time::Epoch;
use enum_iterator::all;
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

/// Locates eclipse entry and exit: for every occulting body, the umbra,
/// penumbra and antumbra crossings of the target with respect to the
/// configured light source.
pub struct EclipseLocator {
    core: EventLocator,
    /// Name of the light source
    pub light_source: String,
    bodies: Vec<String>,
    functions: Vec<Eclipse>,
    result: Option<EclipseTotalEvent>,
}

impl EclipseLocator {
    pub fn new(
        target: Arc<dyn TargetEphemeris>,
        eph: Arc<dyn Ephemerides>,
        frames: Arc<dyn FrameConverter>,
        cfg: SearchConfig,
    ) -> Self {
        Self {
            core: EventLocator::new(target, eph, frames, cfg),
            light_source: "Sun".to_string(),
            bodies: Vec::new(),
            functions: Vec::new(),
            result: None,
        }
    }

    pub fn add_occulting_body(&mut self, body: &str) {
        self.bodies.push(body.to_string());
    }

    pub fn occulting_bodies(&self) -> &[String] {
        &self.bodies
    }

    pub fn core(&self) -> &EventLocator {
        &self.core
    }

    pub fn abcorr(&self) -> String {
        self.core.abcorr()
    }

    /// Validates the configuration and builds the three shadow functions of
    /// every occulting body.
    pub fn initialize(&mut self) -> Result<(), LocatorError> {
        self.core.initialize()?;
        if self.bodies.is_empty() {
            return Err(LocatorError::NoOccultingBodies);
        }

        let ab = self.core.aberration(false);
        self.functions.clear();
        self.result = None;
        for body in &self.bodies {
            for kind in all::<EclipseKind>() {
                let mut function = Eclipse::new(
                    self.core.target().clone(),
                    kind,
                    &self.light_source,
                    body,
                    ab,
                    self.core.eph().clone(),
                );
                function.initialize().context(EventSnafu)?;
                self.functions.push(function);
            }
        }
        Ok(())
    }

    /// Searches the configured window, records the boundaries in the run
    /// table and writes the report when enabled.
    pub fn locate_events(&mut self, table: &mut LocatedEventTable) -> Result<(), LocatorError> {
        let (from, to) = self.core.search_window()?;
        info!(
            "searching for eclipses of {} from {from} until {to}",
            self.core.target().name()
        );
        let events = self.find_events(from, to)?;

        let target_name = self.core.target().name().to_string();
        let mut result = EclipseTotalEvent::new(&target_name);
        for event in events {
            let kind = format!("{} ({})", event.kind().label(), event.occulter());
            let participants = format!("{} - {}", target_name, event.occulter());
            table.add_span(event.start(), event.end(), &kind, &participants);
            result.push(event);
        }

        if self.core.cfg.write_report {
            let text = format!(
                "Eclipse locator report for {}, light source {}, {from} until {to}, abcorr {}\n\n{}",
                target_name,
                self.light_source,
                self.abcorr(),
                result.report_string()
            );
            self.core.write_report(&text)?;
        }
        self.result = Some(result);
        Ok(())
    }

    /// Finds every shadow crossing over `[from, to]`, chronologically
    /// ordered.
    pub fn find_events(&self, from: Epoch, to: Epoch) -> Result<Vec<EclipseEvent>, LocatorError> {
        if !self.core.is_ready() || self.functions.is_empty() {
            return Err(LocatorError::NotReady);
        }
        let step = self.core.cfg.step;
        let precision = self.core.cfg.precision;
        let target = self.core.target().clone();

        let mut events = Vec::new();
        for function in &self.functions {
            // The shadow functions are negative inside their region: search
            // the arcs of the negated value.
            let inside_f = |epoch: Epoch| -> Result<f64, EventError> {
                let state = target.state_km(epoch)?;
                Ok(-function.evaluate(epoch, &state)?.value)
            };
            for span in find_arcs(&inside_f, from, to, step, precision)? {
                events.push(EclipseEvent::new(
                    span.start,
                    span.end,
                    function.shadow_kind(),
                    function.occulting_body(),
                ));
            }
        }
        events.sort_by(|e1, e2| e1.start().cmp(&e2.start()));
        debug!("{} eclipse events", events.len());
        Ok(events)
    }

    /// The aggregated result of the last [locate_events] run.
    ///
    /// [locate_events]: EclipseLocator::locate_events
    pub fn result(&self) -> Option<&EclipseTotalEvent> {
        self.result.as_ref()
    }

    pub fn file_was_written(&self) -> bool {
        self.core.file_was_written()
    }

    /// Renames a referenced body, both in the name list and in every already
    /// constructed shadow function.
    pub fn rename_ref(&mut self, old_name: &str, new_name: &str) {
        if self.light_source == old_name {
            self.light_source = new_name.to_string();
        }
        for body in self.bodies.iter_mut() {
            if body == old_name {
                *body = new_name.to_string();
            }
        }
        for function in self.functions.iter_mut() {
            function.rename_ref(old_name, new_name);
        }
    }
}

impl EventFunctionSource for EclipseLocator {
    fn label(&self) -> String {
        format!("EclipseLocator({})", self.core.target().name())
    }

    fn function_count(&self) -> usize {
        self.functions.len()
    }

    fn evaluate_functions(
        &self,
        epoch: Epoch,
        state_km: &Vector6<f64>,
    ) -> Result<Vec<EventSample>, EventError> {
        self.functions
            .iter()
            .map(|function| function.evaluate(epoch, state_km))
            .collect()
    }
}

impl fmt::Display for EclipseLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "eclipse locator for {}, light source {}, shadows cast by [{}]",
            self.core.target().name(),
            self.light_source,
            self.bodies.join(", ")
        )
    }
}
