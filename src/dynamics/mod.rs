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

use crate::errors::EventError;
use crate::events::EventSample;
use crate::linalg::Vector6;
use crate::time::{Duration, Epoch};
use snafu::prelude::*;
use std::sync::Arc;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    #[snafu(display("event model used before initialization"))]
    ModelNotInitialized,
    #[snafu(display("derivative slice of {have} slots cannot hold {need}"))]
    SliceTooSmall { need: usize, have: usize },
    #[snafu(display("event function evaluation failed: {source}"))]
    ModelEvent { source: EventError },
}

/// The kinds of auxiliary state a force model may contribute derivatives
/// for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// The position+velocity trajectory state itself
    Trajectory,
    /// State transition matrix entries
    StateTransition,
    /// Event function values advanced alongside the trajectory
    EventFunction,
}

/// Anything which exposes a fixed set of event functions for integration:
/// the locators implement this over the functions they assembled.
pub trait EventFunctionSource: Send + Sync {
    fn label(&self) -> String;

    fn function_count(&self) -> usize;

    /// Evaluates every exposed function for the provided epoch and trial
    /// state, in a stable order.
    fn evaluate_functions(
        &self,
        epoch: Epoch,
        state_km: &Vector6<f64>,
    ) -> Result<Vec<EventSample>, EventError>;
}

/// Exposes event function rates as extra derivative state contributions, so
/// a numerical propagator can advance the event functions alongside the
/// spacecraft state and bracket roots without re-evaluating full
/// trajectories.
///
/// The model shares its sources with the rest of the run; it owns only the
/// bookkeeping of where each source's functions live within the derivative
/// slice.
pub struct EventModel {
    sources: Vec<Arc<dyn EventFunctionSource>>,
    counts: Vec<usize>,
    starts: Vec<usize>,
    /// Slice origin assigned by the owning force model
    start_index: usize,
    initialized: bool,
}

impl EventModel {
    pub fn new(sources: Vec<Arc<dyn EventFunctionSource>>) -> Self {
        Self {
            sources,
            counts: Vec::new(),
            starts: Vec::new(),
            start_index: 0,
            initialized: false,
        }
    }

    pub fn push_source(&mut self, source: Arc<dyn EventFunctionSource>) {
        self.sources.push(source);
        self.initialized = false;
    }

    /// Pins the origin of this model's slice within the full derivative
    /// state vector, as assigned by the owning force model.
    pub fn set_start(&mut self, index: usize) {
        self.start_index = index;
    }

    /// Records the function count and cumulative start offset of every
    /// source.
    pub fn initialize(&mut self) {
        self.counts.clear();
        self.starts.clear();
        let mut offset = 0;
        for source in &self.sources {
            let count = source.function_count();
            self.starts.push(offset);
            self.counts.push(count);
            debug!(
                "{} contributes {count} event function slots at offset {offset}",
                source.label()
            );
            offset += count;
        }
        self.initialized = true;
    }

    /// Total number of event function slots across every source.
    pub fn dimension(&self) -> usize {
        self.counts.iter().sum()
    }

    /// The slots of the i-th source within the full derivative vector.
    pub fn slice_for(&self, index: usize) -> std::ops::Range<usize> {
        let base = self.start_index + self.starts[index];
        base..base + self.counts[index]
    }

    /// Whether this model contributes derivatives for the provided state
    /// kind. Only event function state is supported; the owning force model
    /// uses this to decide whether to allocate slots at all.
    pub fn supports(&self, kind: StateKind) -> bool {
        kind == StateKind::EventFunction
    }

    /// Evaluates every source at `epoch + dt` with the provided trial state
    /// and copies each sample's rate into the matching slot of `out`.
    ///
    /// Returns whether at least one source was evaluated: zero sources is a
    /// valid no-op reported as `Ok(false)`, not an evaluation pass.
    pub fn get_derivatives(
        &self,
        epoch: Epoch,
        dt: Duration,
        state_km: &Vector6<f64>,
        out: &mut [f64],
    ) -> Result<bool, DynamicsError> {
        ensure!(self.initialized, ModelNotInitializedSnafu);
        let need = self.start_index + self.dimension();
        ensure!(
            out.len() >= need,
            SliceTooSmallSnafu {
                need,
                have: out.len()
            }
        );

        let at = epoch + dt;
        let mut evaluated = false;
        for (index, source) in self.sources.iter().enumerate() {
            let samples = source
                .evaluate_functions(at, state_km)
                .context(ModelEventSnafu)?;
            for (slot, sample) in self
                .slice_for(index)
                .zip(samples.iter().take(self.counts[index]))
            {
                out[slot] = sample.rate;
            }
            evaluated = true;
        }
        Ok(evaluated)
    }
}

#[cfg(test)]
mod ut_model {
    use super::*;
    use crate::time::Unit;

    struct FixedSource {
        name: &'static str,
        rates: Vec<f64>,
    }

    impl EventFunctionSource for FixedSource {
        fn label(&self) -> String {
            self.name.to_string()
        }
        fn function_count(&self) -> usize {
            self.rates.len()
        }
        fn evaluate_functions(
            &self,
            epoch: Epoch,
            _state_km: &Vector6<f64>,
        ) -> Result<Vec<EventSample>, EventError> {
            Ok(self
                .rates
                .iter()
                .map(|rate| EventSample {
                    epoch,
                    value: 0.0,
                    rate: *rate,
                })
                .collect())
        }
    }

    fn epoch0() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
    }

    #[test]
    fn zero_sources_is_a_noop() {
        let mut model = EventModel::new(vec![]);
        model.initialize();
        let mut out = [0.0_f64; 4];
        let evaluated = model
            .get_derivatives(epoch0(), Duration::ZERO, &Vector6::zeros(), &mut out)
            .unwrap();
        assert!(!evaluated);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn offsets_and_rates() {
        let mut model = EventModel::new(vec![
            Arc::new(FixedSource {
                name: "first",
                rates: vec![10.0, 20.0],
            }),
            Arc::new(FixedSource {
                name: "second",
                rates: vec![30.0],
            }),
        ]);
        model.set_start(3);
        model.initialize();
        assert_eq!(model.dimension(), 3);
        assert_eq!(model.slice_for(0), 3..5);
        assert_eq!(model.slice_for(1), 5..6);

        let mut out = [0.0_f64; 8];
        let evaluated = model
            .get_derivatives(
                epoch0(),
                30 * Unit::Second,
                &Vector6::zeros(),
                &mut out,
            )
            .unwrap();
        assert!(evaluated);
        assert_eq!(out, [0.0, 0.0, 0.0, 10.0, 20.0, 30.0, 0.0, 0.0]);

        // A slice which cannot hold the slots is rejected
        let mut short = [0.0_f64; 5];
        assert!(matches!(
            model.get_derivatives(epoch0(), Duration::ZERO, &Vector6::zeros(), &mut short),
            Err(DynamicsError::SliceTooSmall { need: 6, have: 5 })
        ));
    }

    #[test]
    fn supported_state_kinds() {
        let model = EventModel::new(vec![]);
        assert!(model.supports(StateKind::EventFunction));
        assert!(!model.supports(StateKind::Trajectory));
        assert!(!model.supports(StateKind::StateTransition));
    }

    #[test]
    fn use_before_initialize() {
        let model = EventModel::new(vec![]);
        let mut out = [0.0_f64; 1];
        assert!(matches!(
            model.get_derivatives(epoch0(), Duration::ZERO, &Vector6::zeros(), &mut out),
            Err(DynamicsError::ModelNotInitialized)
        ));
    }
}
