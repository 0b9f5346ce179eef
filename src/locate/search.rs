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

//! The shared search driver: coarse-step the window, bracket the sign
//! changes, refine each bracket with Brent and pair the crossings into arcs.

use crate::errors::{EventError, EventSnafu, LocatorError, RootSnafu};
use crate::roots::{Brent, RootFinder};
use crate::time::{Duration, Epoch};
use rayon::prelude::*;
use snafu::ResultExt;

/// Brackets handed to the Brent solver are refined for at most this many
/// iterations; the measure check usually stops the loop much earlier.
const MAX_REFINE_ITERS: usize = 50;

/// One zero crossing of an event function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossing {
    pub epoch: Epoch,
    /// True when the function goes from negative to positive.
    pub rising: bool,
}

/// One interval during which an event function is positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventSpan {
    pub start: Epoch,
    pub end: Epoch,
}

impl EventSpan {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Finds every zero crossing of `f` in `[from, to]`.
///
/// The window is sampled on the coarse `step` grid (in parallel), and every
/// sign change between consecutive samples is refined with a Brent solver
/// down to `precision`. An event narrower than the coarse step can be missed
/// entirely: the step is the caller's resolution commitment.
pub fn find_crossings<F>(
    f: &F,
    from: Epoch,
    to: Epoch,
    step: Duration,
    precision: Duration,
) -> Result<Vec<Crossing>, LocatorError>
where
    F: Fn(Epoch) -> Result<f64, EventError> + Sync,
{
    if from >= to {
        return Err(LocatorError::EpochOrder {
            start: from,
            end: to,
        });
    }
    if step <= Duration::ZERO {
        return Err(LocatorError::NonPositiveStep { step });
    }

    let mut epochs = Vec::new();
    let mut epoch = from;
    while epoch < to {
        epochs.push(epoch);
        epoch = epoch + step;
    }
    epochs.push(to);

    let samples: Vec<(Epoch, f64)> = epochs
        .par_iter()
        .map(|epoch| f(*epoch).map(|value| (*epoch, value)))
        .collect::<Result<_, _>>()
        .context(EventSnafu)?;

    let mut crossings = Vec::new();
    for window in samples.windows(2) {
        let (t0, f0) = window[0];
        let (t1, f1) = window[1];
        if f0 * f1 < 0.0 {
            let epoch = refine(f, t0, f0, t1, f1, precision)?;
            crossings.push(Crossing {
                epoch,
                rising: f1 > f0,
            });
        }
    }
    debug!(
        "{} crossings between {from} and {to} at step {step}",
        crossings.len()
    );
    Ok(crossings)
}

/// Refines one bracket down to `precision` with a Brent solver.
fn refine<F>(
    f: &F,
    t0: Epoch,
    f0: f64,
    t1: Epoch,
    f1: f64,
    precision: Duration,
) -> Result<Epoch, LocatorError>
where
    F: Fn(Epoch) -> Result<f64, EventError>,
{
    let mut brent = Brent::with_tolerance(precision);
    brent.initialize(t0, f0, t1, f1).context(RootSnafu)?;
    for _ in 0..MAX_REFINE_ITERS {
        if brent.step_measure().context(RootSnafu)? <= precision {
            break;
        }
        let epoch = brent.find_step().context(RootSnafu)?;
        let value = f(epoch).context(EventSnafu)?;
        if value == 0.0 {
            return Ok(epoch);
        }
        brent.set_value(epoch, value).context(RootSnafu)?;
    }
    Ok(brent.best_estimate().context(RootSnafu)?.0)
}

/// Finds every interval of `[from, to]` over which `f` is positive.
///
/// Rising and falling crossings are paired; when the function is already
/// positive at a window edge, the edge itself bounds the arc.
pub fn find_arcs<F>(
    f: &F,
    from: Epoch,
    to: Epoch,
    step: Duration,
    precision: Duration,
) -> Result<Vec<EventSpan>, LocatorError>
where
    F: Fn(Epoch) -> Result<f64, EventError> + Sync,
{
    let crossings = find_crossings(f, from, to, step, precision)?;

    let mut spans = Vec::new();
    let mut open = if f(from).context(EventSnafu)? > 0.0 {
        Some(from)
    } else {
        None
    };
    for crossing in crossings {
        if crossing.rising {
            if open.is_none() {
                open = Some(crossing.epoch);
            }
        } else if let Some(start) = open.take() {
            spans.push(EventSpan {
                start,
                end: crossing.epoch,
            });
        }
    }
    if let Some(start) = open {
        spans.push(EventSpan { start, end: to });
    }
    Ok(spans)
}

/// Intersection of two chronologically ordered span lists.
pub fn intersect(lhs: &[EventSpan], rhs: &[EventSpan]) -> Vec<EventSpan> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let start = lhs[i].start.max(rhs[j].start);
        let end = lhs[i].end.min(rhs[j].end);
        if start < end {
            out.push(EventSpan { start, end });
        }
        if lhs[i].end < rhs[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}
