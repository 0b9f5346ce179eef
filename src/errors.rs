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

use crate::io::ConfigError;
use crate::time::{Duration, Epoch};
use snafu::prelude::*;
use std::path::PathBuf;

/// Errors raised while initializing or evaluating an event function.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EventError {
    #[snafu(display("{kind} event function is missing its {what} reference"))]
    MissingReference {
        kind: &'static str,
        what: &'static str,
    },
    #[snafu(display("{kind} event function was evaluated before initialization"))]
    EvalBeforeInit { kind: &'static str },
    #[snafu(display("ephemeris query for {name} failed at {epoch}: {details}"))]
    EphemerisQuery {
        name: String,
        epoch: Epoch,
        details: String,
    },
    #[snafu(display("frame conversion for {frame} failed at {epoch}: {details}"))]
    FrameConversion {
        frame: String,
        epoch: Epoch,
        details: String,
    },
    #[snafu(display("target state unavailable at {epoch}: {details}"))]
    TargetState { epoch: Epoch, details: String },
}

/// Errors raised by a root finder. Malformed brackets are fatal: the caller
/// owns bracket discovery, the solver only refines.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RootError {
    #[snafu(display("cannot bracket a root over the single epoch {epoch}"))]
    DegenerateBracket { epoch: Epoch },
    #[snafu(display("f({ta}) = {fa} and f({tb}) = {fb} do not straddle zero"))]
    InvalidBracket {
        ta: Epoch,
        fa: f64,
        tb: Epoch,
        fb: f64,
    },
    #[snafu(display("root finder used before a bracket was initialized"))]
    NoBracket,
}

/// Errors raised by the event locators, from configuration validation through
/// the search itself.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LocatorError {
    #[snafu(display("initial epoch {start} is not earlier than final epoch {end}"))]
    EpochOrder { start: Epoch, end: Epoch },
    #[snafu(display("search step must be strictly positive, got {step}"))]
    NonPositiveStep { step: Duration },
    #[snafu(display("a report was requested but no output filename is configured"))]
    MissingFilename,
    #[snafu(display("no {what} epoch was configured and the entire interval mode is off"))]
    MissingEpoch { what: &'static str },
    #[snafu(display("{value} is not a valid light time direction (expected Transmit or Receive)"))]
    UnknownDirection { value: String },
    #[snafu(display("a contact locator requires at least one ground station"))]
    NoStations,
    #[snafu(display("an eclipse locator requires at least one occulting body"))]
    NoOccultingBodies,
    #[snafu(display("index {index} is out of range for a collection of {len} events"))]
    IndexOutOfRange { index: usize, len: usize },
    #[snafu(display("locator was asked to search before initialization"))]
    NotReady,
    #[snafu(display("could not rotate the report file {}: {source}", path.display()))]
    ReportRename {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to parse a configured epoch: {source}"))]
    EpochParse { source: ConfigError },
    #[snafu(display("event evaluation failed during search: {source}"))]
    Event { source: EventError },
    #[snafu(display("root refinement failed during search: {source}"))]
    Root { source: RootError },
}
