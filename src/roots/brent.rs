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

use super::RootFinder;
use crate::errors::RootError;
use crate::time::{Duration, Epoch, Unit};

/// Buffered samples of the Brent solver, in seconds past the anchor epoch.
///
/// Slot `b` is always the best estimate (`|fb| <= |fa|`), `c` is the
/// previous `b`, and `d` the one before that; the classical safeguard tests
/// compare the proposed step against those histories.
struct BrentState {
    anchor: Epoch,
    a: f64,
    fa: f64,
    b: f64,
    fb: f64,
    c: f64,
    fc: f64,
    d: f64,
    bisection_used: bool,
}

/// Brent's method: inverse quadratic interpolation with a secant fallback
/// when two buffered values coincide, guarded by the classical shrinkage
/// tests with bisection as the conservative fallback.
///
/// The search variable is seconds past the earlier seed epoch, which keeps
/// the interpolation formulas well conditioned regardless of the absolute
/// epoch.
pub struct Brent {
    /// Numerical floor on the safeguard tests; steps which shrink the
    /// bracket by less than this fall back to bisection.
    tolerance: Duration,
    state: Option<BrentState>,
}

impl Brent {
    #[allow(clippy::identity_op)]
    pub fn new() -> Self {
        Self::with_tolerance(1 * Unit::Millisecond)
    }

    pub fn with_tolerance(tolerance: Duration) -> Self {
        Self {
            tolerance,
            state: None,
        }
    }

    /// Whether the most recent [find_step] fell back to bisection. Set until
    /// the first interpolated step is accepted, since the first step policy
    /// is conservative.
    ///
    /// [find_step]: RootFinder::find_step
    pub fn bisection_used(&self) -> bool {
        self.state
            .as_ref()
            .map(|s| s.bisection_used)
            .unwrap_or(false)
    }
}

impl Default for Brent {
    fn default() -> Self {
        Self::new()
    }
}

impl RootFinder for Brent {
    fn initialize(&mut self, t0: Epoch, f0: f64, t1: Epoch, f1: f64) -> Result<(), RootError> {
        if t0 == t1 {
            return Err(RootError::DegenerateBracket { epoch: t0 });
        }
        // Same sign, or a zero endpoint which a bracket cannot distinguish
        if f0 * f1 >= 0.0 {
            return Err(RootError::InvalidBracket {
                ta: t0,
                fa: f0,
                tb: t1,
                fb: f1,
            });
        }

        // Seed time ordered, earlier first, then swap so that b is best
        let (ta, fa, tb, fb) = if t0 < t1 {
            (t0, f0, t1, f1)
        } else {
            (t1, f1, t0, f0)
        };
        let anchor = ta;
        let (mut a, mut fa) = (0.0, fa);
        let (mut b, mut fb) = ((tb - ta).to_seconds(), fb);
        if fb.abs() > fa.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        self.state = Some(BrentState {
            anchor,
            a,
            fa,
            b,
            fb,
            c: a,
            fc: fa,
            d: a,
            bisection_used: true,
        });
        Ok(())
    }

    fn set_value(&mut self, epoch: Epoch, value: f64) -> Result<(), RootError> {
        let st = self.state.as_mut().ok_or(RootError::NoBracket)?;
        let x = (epoch - st.anchor).to_seconds();

        // Rotate the history before folding in the new sample
        st.d = st.c;
        st.c = st.b;
        st.fc = st.fb;

        if st.fa * value < 0.0 {
            // The root now sits between a and the new sample
            st.b = x;
            st.fb = value;
        } else {
            st.a = x;
            st.fa = value;
        }

        // Keep the smallest magnitude estimate in slot b
        if st.fa.abs() < st.fb.abs() {
            std::mem::swap(&mut st.a, &mut st.b);
            std::mem::swap(&mut st.fa, &mut st.fb);
        }
        Ok(())
    }

    fn find_step(&mut self) -> Result<Epoch, RootError> {
        let delta = self.tolerance.to_seconds();
        let st = self.state.as_mut().ok_or(RootError::NoBracket)?;
        let (a, fa, b, fb, c, fc, d) = (st.a, st.fa, st.b, st.fb, st.c, st.fc, st.d);

        let mut s = if (fa - fc).abs() > f64::EPSILON && (fb - fc).abs() > f64::EPSILON {
            // Inverse quadratic interpolation
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            // Two buffered values coincide: secant
            b - fb * (b - a) / (fb - fa)
        };

        let cond1 = (s - b) * (s - (3.0 * a + b) / 4.0) > 0.0;
        let cond2 = st.bisection_used && (s - b).abs() >= (b - c).abs() / 2.0;
        let cond3 = !st.bisection_used && (s - b).abs() >= (c - d).abs() / 2.0;
        let cond4 = st.bisection_used && (b - c).abs() < delta;
        let cond5 = !st.bisection_used && (c - d).abs() < delta;
        if cond1 || cond2 || cond3 || cond4 || cond5 {
            s = (a + b) / 2.0;
            st.bisection_used = true;
        } else {
            st.bisection_used = false;
        }

        Ok(st.anchor + s * Unit::Second)
    }

    fn step_measure(&self) -> Result<Duration, RootError> {
        let st = self.state.as_ref().ok_or(RootError::NoBracket)?;
        Ok((st.b - st.a).abs() * Unit::Second)
    }

    fn best_estimate(&self) -> Result<(Epoch, f64), RootError> {
        let st = self.state.as_ref().ok_or(RootError::NoBracket)?;
        Ok((st.anchor + st.b * Unit::Second, st.fb))
    }
}

#[cfg(test)]
mod ut_brent {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn epoch0() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
    }

    #[rstest]
    #[case(-1.0, 1.0)]
    #[case(1.0, -1.0)]
    #[case(-1e-9, 1e12)]
    fn valid_brackets(#[case] f0: f64, #[case] f1: f64) {
        let mut brent = Brent::new();
        assert!(brent
            .initialize(epoch0(), f0, epoch0() + 1 * Unit::Minute, f1)
            .is_ok());
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(-1.0, -2.0)]
    #[case(0.0, 1.0)]
    #[case(-1.0, 0.0)]
    #[case(0.0, 0.0)]
    fn invalid_brackets(#[case] f0: f64, #[case] f1: f64) {
        let mut brent = Brent::new();
        let result = brent.initialize(epoch0(), f0, epoch0() + 1 * Unit::Minute, f1);
        assert!(matches!(result, Err(RootError::InvalidBracket { .. })));
    }

    #[test]
    fn degenerate_epochs() {
        let mut brent = Brent::new();
        assert_eq!(
            brent.initialize(epoch0(), -1.0, epoch0(), 1.0),
            Err(RootError::DegenerateBracket { epoch: epoch0() })
        );
    }

    #[test]
    fn use_before_init() {
        let mut brent = Brent::new();
        assert_eq!(brent.find_step(), Err(RootError::NoBracket));
        assert_eq!(
            brent.set_value(epoch0(), 0.5),
            Err(RootError::NoBracket)
        );
        assert_eq!(brent.step_measure(), Err(RootError::NoBracket));
        assert_eq!(brent.best_estimate(), Err(RootError::NoBracket));
    }

    /// Property: driving find_step/evaluate/set_value on a smooth function
    /// with a single bracketed root shrinks the measure below tolerance in a
    /// bounded number of iterations.
    #[test]
    fn converges_on_smooth_function() {
        let t_ref = epoch0();
        // Root at 487.65 s past the reference epoch
        let f = |t: Epoch| ((t - t_ref).to_seconds() - 487.65) / 250.0;

        let t0 = t_ref;
        let t1 = t_ref + 900.0 * Unit::Second;
        let tolerance = 1 * Unit::Millisecond;

        let mut brent = Brent::with_tolerance(tolerance);
        brent.initialize(t0, f(t0), t1, f(t1)).unwrap();

        let mut iters = 0;
        let mut prev_measure = brent.step_measure().unwrap();
        while brent.step_measure().unwrap() > tolerance {
            let t = brent.find_step().unwrap();
            brent.set_value(t, f(t)).unwrap();
            let measure = brent.step_measure().unwrap();
            assert!(measure <= prev_measure, "bracket width must not grow");
            prev_measure = measure;
            iters += 1;
            assert!(iters <= 100, "did not converge within 100 iterations");
        }

        let (root, value) = brent.best_estimate().unwrap();
        assert!(((root - t_ref).to_seconds() - 487.65).abs() < 2e-3);
        assert!(value.abs() < 1e-4);
    }

    /// Same property on an oscillating function with a root that is not a
    /// fixed point of the secant step.
    #[test]
    fn converges_on_sine() {
        let t_ref = epoch0();
        let omega = std::f64::consts::TAU / 600.0;
        let t_root = 137.3;
        let f = |t: Epoch| (omega * ((t - t_ref).to_seconds() - t_root)).sin();

        let t0 = t_ref + 10.0 * Unit::Second;
        let t1 = t_ref + 250.0 * Unit::Second;
        assert!(f(t0) * f(t1) < 0.0);

        let tolerance = 1 * Unit::Millisecond;
        let mut brent = Brent::with_tolerance(tolerance);
        brent.initialize(t0, f(t0), t1, f(t1)).unwrap();

        for _ in 0..100 {
            if brent.step_measure().unwrap() <= tolerance {
                break;
            }
            let t = brent.find_step().unwrap();
            brent.set_value(t, f(t)).unwrap();
        }
        assert!(brent.step_measure().unwrap() <= tolerance);
        let (root, _) = brent.best_estimate().unwrap();
        assert_abs_diff_eq!((root - t_ref).to_seconds(), t_root, epsilon = 2e-3);
    }

    /// Property: when the interpolated candidate is rejected by the
    /// safeguards, the returned step is exactly the midpoint and the
    /// bisection flag is raised.
    #[test]
    fn bisection_fallback_is_exact_midpoint() {
        let t0 = epoch0();
        let t1 = epoch0() + 60.0 * Unit::Second;

        // A symmetric bracket: the secant proposal lands on the midpoint,
        // which trips the slow-shrinkage test (|s - b| >= |b - c| / 2) on the
        // conservative first step.
        let mut brent = Brent::new();
        brent.initialize(t0, 1.0, t1, -1.0).unwrap();
        let step = brent.find_step().unwrap();
        assert!(brent.bisection_used());
        assert_eq!(step, t0 + 30.0 * Unit::Second);
        // The offset form reports the same proposal, relative to the caller
        assert_eq!(brent.step_from(t0).unwrap(), 30.0 * Unit::Second);

        // A tiny bracket trips the numerical floor outright
        let mut brent = Brent::new();
        let t1 = t0 + 0.0005 * Unit::Second;
        brent.initialize(t0, 1.0, t1, -2.0).unwrap();
        let step = brent.find_step().unwrap();
        assert!(brent.bisection_used());
        assert_eq!(step, t0 + 0.00025 * Unit::Second);
    }
}
