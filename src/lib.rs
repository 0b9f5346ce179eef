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

/*! # arclight

Arclight locates discrete astrodynamical events along a simulated trajectory:
ground station contact windows, eclipse entry and exit, and line of sight
obstructions. Sign changes of continuous event functions are bracketed by a
coarse scan and refined with a Brent root solver, and an auxiliary derivative
model lets a numerical propagator advance the event functions alongside the
trajectory state.

The surrounding simulation provides ephemerides, frame rotations and the
target trajectory through small capability traits: there is no ambient global
state in this crate.
*/

/// Capability traits consumed from the surrounding simulation (target
/// ephemeris, celestial body states, frame rotations) and the ground station
/// and body shape definitions.
pub mod cosmic;

/// The continuous event functions: shadow (umbra, penumbra, antumbra),
/// sine of elevation, line of sight, and the contact composite.
pub mod events;

/// Root bracketing and refinement: the `RootFinder` interface and the Brent
/// solver.
pub mod roots;

/// Event search orchestration: locators, located event records and the run
/// wide event table.
pub mod locate;

/// The auxiliary derivative model which exposes event function rates to a
/// numerical propagator.
pub mod dynamics;

/// Configuration loading (YAML), epoch parsing and report file management.
pub mod io;

/// Small vector helpers shared by the event functions.
pub mod utils;

mod errors;
pub use self::errors::{EventError, LocatorError, RootError};

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub mod prelude {
    pub use crate::cosmic::{
        Aberration, BodyShape, Ephemerides, FrameConverter, GroundStation, TargetEphemeris,
    };
    pub use crate::dynamics::{EventFunctionSource, EventModel, StateKind};
    pub use crate::events::{
        Contact, ContactMember, Eclipse, EclipseKind, Elevation, EventFunction, EventSample,
        LineOfSight,
    };
    pub use crate::io::{ConfigRepr, EpochFormat};
    pub use crate::locate::{
        ContactEvent, ContactLocator, ContactResult, EclipseEvent, EclipseLocator,
        EclipseTotalEvent, EventLocator, LightTimeDirection, LocatedEvent, LocatedEventTable,
        SearchConfig, TableOrder,
    };
    pub use crate::roots::{Brent, RootFinder};
    pub use crate::time::{Duration, Epoch, Unit};
    pub use crate::{EventError, LocatorError, RootError};
}
