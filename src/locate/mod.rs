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

use crate::errors::LocatorError;
use crate::events::EclipseKind;
use crate::time::{Duration, Epoch};
use std::fmt;

mod contact;
mod eclipse;
mod locator;
pub mod search;
mod table;

pub use contact::ContactLocator;
pub use eclipse::EclipseLocator;
pub use locator::{EventLocator, LightTimeDirection, SearchConfig};
pub use table::{EventBoundary, LocatedEventTable, TableOrder};

/// One concrete detected event: a start and end epoch with a duration that is
/// recomputed on every call, so post-hoc adjustments of the boundaries are
/// reflected in subsequent durations.
pub trait LocatedEvent: fmt::Display {
    fn start(&self) -> Epoch;
    fn end(&self) -> Epoch;

    /// Duration of the event. Always `end() - start()`, never cached.
    fn duration(&self) -> Duration {
        self.end() - self.start()
    }

    /// One fixed width report line for this event.
    fn report_line(&self) -> String;
}

pub(crate) fn fmt_epoch_field(epoch: Epoch) -> String {
    format!("{:<36}", format!("{epoch}"))
}

/// A station visibility interval for one observer and one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactEvent {
    start: Epoch,
    end: Epoch,
}

impl ContactEvent {
    pub fn new(start: Epoch, end: Epoch) -> Self {
        Self { start, end }
    }

    pub fn set_start(&mut self, start: Epoch) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Epoch) {
        self.end = end;
    }
}

impl LocatedEvent for ContactEvent {
    fn start(&self) -> Epoch {
        self.start
    }

    fn end(&self) -> Epoch {
        self.end
    }

    fn report_line(&self) -> String {
        format!(
            "{}{}{:>14.3}",
            fmt_epoch_field(self.start),
            fmt_epoch_field(self.end),
            self.duration().to_seconds()
        )
    }
}

impl fmt::Display for ContactEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "contact from {} until {} (lasts {})",
            self.start,
            self.end,
            self.duration()
        )
    }
}

/// One eclipse interval: a shadow region crossing of one occulting body.
#[derive(Clone, Debug, PartialEq)]
pub struct EclipseEvent {
    start: Epoch,
    end: Epoch,
    kind: EclipseKind,
    occulter: String,
}

impl EclipseEvent {
    pub fn new(start: Epoch, end: Epoch, kind: EclipseKind, occulter: &str) -> Self {
        Self {
            start,
            end,
            kind,
            occulter: occulter.to_string(),
        }
    }

    pub fn set_start(&mut self, start: Epoch) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Epoch) {
        self.end = end;
    }

    pub fn kind(&self) -> EclipseKind {
        self.kind
    }

    pub fn occulter(&self) -> &str {
        &self.occulter
    }
}

impl LocatedEvent for EclipseEvent {
    fn start(&self) -> Epoch {
        self.start
    }

    fn end(&self) -> Epoch {
        self.end
    }

    fn report_line(&self) -> String {
        format!(
            "{}{}{:>14.3}  {:<14}{:<12}",
            fmt_epoch_field(self.start),
            fmt_epoch_field(self.end),
            self.duration().to_seconds(),
            self.occulter,
            self.kind.label()
        )
    }
}

impl fmt::Display for EclipseEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} of {} from {} until {} (lasts {})",
            self.kind,
            self.occulter,
            self.start,
            self.end,
            self.duration()
        )
    }
}

/// The ordered contact events of one observer for one target. Owns its
/// events; cloning deep-copies them.
#[derive(Clone, Debug)]
pub struct ContactResult {
    pub target: String,
    pub station: String,
    events: Vec<ContactEvent>,
    no_events_text: String,
}

impl ContactResult {
    pub fn new(target: &str, station: &str) -> Self {
        Self {
            target: target.to_string(),
            station: station.to_string(),
            events: Vec::new(),
            no_events_text: "There are no contact events in the search interval.".to_string(),
        }
    }

    /// Replaces the placeholder text emitted when no event was found.
    pub fn set_no_events_text(&mut self, text: &str) {
        self.no_events_text = text.to_string();
    }

    pub fn push(&mut self, event: ContactEvent) {
        self.events.push(event);
    }

    pub fn get(&self, index: usize) -> Result<&ContactEvent, LocatorError> {
        self.events.get(index).ok_or(LocatorError::IndexOutOfRange {
            index,
            len: self.events.len(),
        })
    }

    pub fn events(&self) -> &[ContactEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every owned event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// The full report for this observer: header, one line per event or the
    /// placeholder, and the closing count.
    pub fn report_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Target: {}\n", self.target));
        out.push_str(&format!("Observer: {}\n\n", self.station));
        if self.events.is_empty() {
            out.push_str(&self.no_events_text);
            out.push('\n');
        } else {
            out.push_str(&format!(
                "{:<36}{:<36}{:>14}\n",
                "Start Time (UTC)", "Stop Time (UTC)", "Duration (s)"
            ));
            for event in &self.events {
                out.push_str(&event.report_line());
                out.push('\n');
            }
        }
        out.push_str(&format!("\nNumber of events : {}\n\n", self.events.len()));
        out
    }
}

/// All eclipse events of a run for one target, with the merged total spans.
/// Owns its events; cloning deep-copies them.
#[derive(Clone, Debug)]
pub struct EclipseTotalEvent {
    pub target: String,
    events: Vec<EclipseEvent>,
    no_events_text: String,
}

impl EclipseTotalEvent {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            events: Vec::new(),
            no_events_text: "There are no eclipse events in the search interval.".to_string(),
        }
    }

    pub fn set_no_events_text(&mut self, text: &str) {
        self.no_events_text = text.to_string();
    }

    pub fn push(&mut self, event: EclipseEvent) {
        self.events.push(event);
    }

    pub fn get(&self, index: usize) -> Result<&EclipseEvent, LocatorError> {
        self.events.get(index).ok_or(LocatorError::IndexOutOfRange {
            index,
            len: self.events.len(),
        })
    }

    pub fn events(&self) -> &[EclipseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Chronologically merged spans of all shadow regions: overlapping or
    /// touching events of any kind and occulter collapse into one total span.
    pub fn merged_spans(&self) -> Vec<(Epoch, Epoch)> {
        let mut spans: Vec<(Epoch, Epoch)> = self
            .events
            .iter()
            .map(|event| (event.start, event.end))
            .collect();
        spans.sort_by(|s1, s2| s1.0.cmp(&s2.0));
        let mut merged: Vec<(Epoch, Epoch)> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.0 <= last.1 => {
                    if span.1 > last.1 {
                        last.1 = span.1;
                    }
                }
                _ => merged.push(span),
            }
        }
        merged
    }

    /// Sum of the durations of all owned events.
    pub fn total_duration(&self) -> Duration {
        self.events
            .iter()
            .fold(Duration::ZERO, |acc, event| acc + event.duration())
    }

    pub fn report_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Target: {}\n\n", self.target));
        if self.events.is_empty() {
            out.push_str(&self.no_events_text);
            out.push('\n');
        } else {
            out.push_str(&format!(
                "{:<36}{:<36}{:>14}  {:<14}{:<12}\n",
                "Start Time (UTC)", "Stop Time (UTC)", "Duration (s)", "Occ Body", "Type"
            ));
            for event in &self.events {
                out.push_str(&event.report_line());
                out.push('\n');
            }
            let merged = self.merged_spans();
            out.push_str(&format!("\nNumber of total events : {}\n", merged.len()));
            for (start, end) in merged {
                out.push_str(&format!(
                    "  {} until {} ({:.3} s)\n",
                    start,
                    end,
                    (end - start).to_seconds()
                ));
            }
        }
        out.push_str(&format!(
            "\nNumber of individual events : {}\n\n",
            self.events.len()
        ));
        out
    }
}
