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

use crate::errors::RootError;
use crate::time::{Duration, Epoch};

mod brent;
pub use brent::Brent;

/// A root refinement scheme over buffered `(epoch, value)` samples.
///
/// The finder is seeded with a bracketing pair, then driven by the caller in
/// a propose/evaluate/fold loop: [find_step] proposes the next epoch to
/// sample, the caller evaluates the event function there, and [set_value]
/// folds the new sample into the bracket. The finder never decides
/// convergence itself: it only reports the bracket width through
/// [step_measure], and the caller stops when that measure is below its
/// tolerance.
///
/// [find_step]: RootFinder::find_step
/// [set_value]: RootFinder::set_value
/// [step_measure]: RootFinder::step_measure
pub trait RootFinder {
    /// Seeds the finder with two bracketing samples. Fails when the epochs
    /// coincide or, depending on the scheme, when the values do not straddle
    /// zero.
    fn initialize(&mut self, t0: Epoch, f0: f64, t1: Epoch, f1: f64) -> Result<(), RootError>;

    /// Folds a new sample into the bracket.
    fn set_value(&mut self, epoch: Epoch, value: f64) -> Result<(), RootError>;

    /// Proposes the absolute epoch the caller should sample next.
    fn find_step(&mut self) -> Result<Epoch, RootError>;

    /// The same proposal as [find_step], as an offset from the provided
    /// epoch. Negative offsets are legitimate: the proposal may fall before
    /// the caller's current epoch.
    ///
    /// [find_step]: RootFinder::find_step
    fn step_from(&mut self, current: Epoch) -> Result<Duration, RootError> {
        Ok(self.find_step()? - current)
    }

    /// Current bracket width. Monotonically shrinks toward zero as samples
    /// are folded in.
    fn step_measure(&self) -> Result<Duration, RootError>;

    /// The buffered sample with the smallest magnitude value.
    fn best_estimate(&self) -> Result<(Epoch, f64), RootError>;
}
