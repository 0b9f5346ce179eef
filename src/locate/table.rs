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

use super::fmt_epoch_field;
use crate::errors::LocatorError;
use crate::time::Epoch;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// One event boundary: an entry into or exit from an event span.
#[derive(Clone, Debug, PartialEq)]
pub struct EventBoundary {
    pub epoch: Epoch,
    pub is_entry: bool,
    /// Event type label, e.g. `Contact` or `Umbra (Earth)`
    pub kind: String,
    /// The objects involved, e.g. `LEOSat - Canberra`
    pub participants: String,
}

/// Orderings supported by [LocatedEventTable::sort].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableOrder {
    /// By boundary epoch
    Chronological,
    /// By event type label, then by epoch
    ByType,
    /// Matched entry/exit pairs by ascending duration, unmatched boundaries
    /// last
    ByDuration,
}

/// The run wide collection of all detected event boundaries across every
/// locator of a run.
#[derive(Clone, Debug, Default)]
pub struct LocatedEventTable {
    entries: Vec<EventBoundary>,
}

impl LocatedEventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, boundary: EventBoundary) {
        self.entries.push(boundary);
    }

    /// Records one full event span as an entry/exit boundary pair.
    pub fn add_span(&mut self, start: Epoch, end: Epoch, kind: &str, participants: &str) {
        self.add(EventBoundary {
            epoch: start,
            is_entry: true,
            kind: kind.to_string(),
            participants: participants.to_string(),
        });
        self.add(EventBoundary {
            epoch: end,
            is_entry: false,
            kind: kind.to_string(),
            participants: participants.to_string(),
        });
    }

    pub fn entries(&self) -> &[EventBoundary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&EventBoundary, LocatorError> {
        self.entries
            .get(index)
            .ok_or(LocatorError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Matches entry/exit boundaries by a linear scan per kind and
    /// participants, tracking the most recent entry as the pending start.
    fn paired(&self) -> Vec<(EventBoundary, EventBoundary)> {
        let mut pairs = Vec::new();
        let mut pending: Vec<EventBoundary> = Vec::new();
        for boundary in &self.entries {
            if boundary.is_entry {
                pending.retain(|p| {
                    p.kind != boundary.kind || p.participants != boundary.participants
                });
                pending.push(boundary.clone());
            } else if let Some(idx) = pending
                .iter()
                .position(|p| p.kind == boundary.kind && p.participants == boundary.participants)
            {
                let entry = pending.swap_remove(idx);
                pairs.push((entry, boundary.clone()));
            }
        }
        pairs
    }

    pub fn sort(&mut self, order: TableOrder) {
        match order {
            TableOrder::Chronological => self.entries.sort_by(|e1, e2| e1.epoch.cmp(&e2.epoch)),
            TableOrder::ByType => self
                .entries
                .sort_by(|e1, e2| e1.kind.cmp(&e2.kind).then(e1.epoch.cmp(&e2.epoch))),
            TableOrder::ByDuration => {
                let mut pairs = self.paired();
                pairs.sort_by(|p1, p2| {
                    let d1 = p1.1.epoch - p1.0.epoch;
                    let d2 = p2.1.epoch - p2.0.epoch;
                    d1.cmp(&d2)
                });
                let mut rebuilt = Vec::with_capacity(self.entries.len());
                for (entry, exit) in &pairs {
                    rebuilt.push(entry.clone());
                    rebuilt.push(exit.clone());
                }
                // Unmatched boundaries keep their relative order, at the end
                for boundary in &self.entries {
                    if !pairs
                        .iter()
                        .any(|(en, ex)| en == boundary || ex == boundary)
                    {
                        rebuilt.push(boundary.clone());
                    }
                }
                self.entries = rebuilt;
            }
        }
    }

    /// Writes one fixed width line per matched entry/exit pair.
    ///
    /// Returns `Ok(false)` without touching the filesystem when the table is
    /// empty. A file which cannot be opened is reported as a warning and
    /// skipped, also yielding `Ok(false)`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<bool, LocatorError> {
        if self.entries.is_empty() {
            return Ok(false);
        }

        let path = path.as_ref();
        let mut file = match std::fs::File::create(path) {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "could not create the event table file {}: {error}",
                    path.display()
                );
                return Ok(false);
            }
        };

        let mut text = format!(
            "{:<24}{:<28}{:>14}  {:<36}{:<36}\n",
            "Type", "Participants", "Duration (s)", "Start Time (UTC)", "Stop Time (UTC)",
        );
        for (entry, exit) in self.paired() {
            text.push_str(&format!(
                "{:<24}{:<28}{:>14.3}  {}{}\n",
                entry.kind,
                entry.participants,
                (exit.epoch - entry.epoch).to_seconds(),
                fmt_epoch_field(entry.epoch),
                fmt_epoch_field(exit.epoch),
            ));
        }

        if let Err(error) = file.write_all(text.as_bytes()) {
            warn!(
                "could not write the event table file {}: {error}",
                path.display()
            );
            return Ok(false);
        }
        info!("wrote {} event boundaries to {}", self.len(), path.display());
        Ok(true)
    }
}

impl fmt::Display for LocatedEventTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "located event table with {} boundaries ({} matched spans)",
            self.len(),
            self.paired().len()
        )
    }
}

#[cfg(test)]
mod ut_table {
    use super::*;
    use crate::time::Unit;

    fn epoch0() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
    }

    /// Property: exporting an empty table returns false and opens no file.
    #[test]
    fn empty_export_is_a_noop() {
        let dir = std::env::temp_dir().join("arclight_empty_table");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("table.txt");

        let table = LocatedEventTable::new();
        assert!(!table.write_to_file(&path).unwrap());
        assert!(!path.exists(), "an empty table must not create a file");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn pairing_and_export() {
        let t = epoch0();
        let mut table = LocatedEventTable::new();
        table.add_span(t, t + 300 * Unit::Second, "Contact", "LEOSat - Canberra");
        table.add_span(
            t + 60 * Unit::Second,
            t + 120 * Unit::Second,
            "Umbra (Earth)",
            "LEOSat - Earth",
        );
        // A dangling entry must not produce a line
        table.add(EventBoundary {
            epoch: t + 500 * Unit::Second,
            is_entry: true,
            kind: "Contact".to_string(),
            participants: "LEOSat - Canberra".to_string(),
        });

        assert_eq!(table.paired().len(), 2);

        let dir = std::env::temp_dir().join("arclight_table_export");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("table.txt");
        assert!(table.write_to_file(&path).unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3, "header plus two matched spans");
        assert!(text.contains("LEOSat - Canberra"));
        assert!(text.contains("300.000"));
        assert!(text.contains("60.000"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn orderings() {
        let t = epoch0();
        let mut table = LocatedEventTable::new();
        table.add_span(
            t + 100 * Unit::Second,
            t + 400 * Unit::Second,
            "Umbra (Earth)",
            "LEOSat - Earth",
        );
        table.add_span(t, t + 50 * Unit::Second, "Contact", "LEOSat - Canberra");

        table.sort(TableOrder::Chronological);
        assert_eq!(table.get(0).unwrap().kind, "Contact");
        assert_eq!(table.get(0).unwrap().epoch, t);
        assert_eq!(table.get(3).unwrap().epoch, t + 400 * Unit::Second);

        table.sort(TableOrder::ByType);
        assert_eq!(table.get(0).unwrap().kind, "Contact");
        assert_eq!(table.get(2).unwrap().kind, "Umbra (Earth)");

        table.sort(TableOrder::ByDuration);
        // Shortest span first: the 50 s contact
        assert_eq!(table.get(0).unwrap().kind, "Contact");
        assert!(table.get(0).unwrap().is_entry);
        assert_eq!(table.get(1).unwrap().epoch, t + 50 * Unit::Second);
    }
}
