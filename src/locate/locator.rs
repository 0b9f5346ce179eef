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

use crate::cosmic::{Aberration, Ephemerides, FrameConverter, TargetEphemeris};
use crate::errors::{EpochParseSnafu, LocatorError};
use crate::io::{parse_epoch, prepare_report_path, EpochFormat};
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Which way the one way light time correction is applied for contacts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightTimeDirection {
    /// Corrections applied at reception (the station receives)
    #[default]
    Receive,
    /// Corrections applied at transmission (the station transmits)
    Transmit,
}

impl FromStr for LightTimeDirection {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Receive" => Ok(Self::Receive),
            "Transmit" => Ok(Self::Transmit),
            _ => Err(LocatorError::UnknownDirection {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LightTimeDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Receive => write!(f, "Receive"),
            Self::Transmit => write!(f, "Transmit"),
        }
    }
}

/// Configuration of one event search.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(doc)]
pub struct SearchConfig {
    /// Start of the explicit search window, ignored in entire interval mode
    #[builder(default, setter(strip_option, into))]
    pub initial_epoch: Option<String>,
    /// End of the explicit search window, ignored in entire interval mode
    #[builder(default, setter(strip_option, into))]
    pub final_epoch: Option<String>,
    #[builder(default = EpochFormat::UtcGregorian)]
    pub epoch_format: EpochFormat,
    /// Coarse scan step; events narrower than this can be missed
    #[builder(default = 1 * Unit::Minute)]
    pub step: Duration,
    /// Boundary epochs are refined down to this precision
    #[builder(default = 1 * Unit::Millisecond)]
    pub precision: Duration,
    #[builder(default)]
    pub use_light_time: bool,
    #[builder(default)]
    pub use_stellar_aberration: bool,
    /// Search the target's entire recorded span instead of the explicit
    /// window
    #[builder(default = true)]
    pub use_entire_interval: bool,
    #[builder(default = true)]
    pub write_report: bool,
    #[builder(default, setter(strip_option, into))]
    pub filename: Option<PathBuf>,
    /// Append to an existing report instead of rotating it out of the way
    #[builder(default)]
    pub append_reports: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The shared core of every event locator: the injected collaborators, the
/// search configuration, and the initialize/search/report state machine.
///
/// A locator is re-enterable: it can be re-initialized and re-run after a
/// configuration change.
pub struct EventLocator {
    pub cfg: SearchConfig,
    target: Arc<dyn TargetEphemeris>,
    eph: Arc<dyn Ephemerides>,
    frames: Arc<dyn FrameConverter>,
    /// Explicit window resolved at initialization; None in entire interval
    /// mode
    window: Option<(Epoch, Epoch)>,
    /// The target's epoch when initialize was called
    target_start_epoch: Option<Epoch>,
    ready: bool,
    file_was_written: bool,
}

impl EventLocator {
    pub fn new(
        target: Arc<dyn TargetEphemeris>,
        eph: Arc<dyn Ephemerides>,
        frames: Arc<dyn FrameConverter>,
        cfg: SearchConfig,
    ) -> Self {
        Self {
            cfg,
            target,
            eph,
            frames,
            window: None,
            target_start_epoch: None,
            ready: false,
            file_was_written: false,
        }
    }

    /// Validates the configuration, resolves the epoch strings, records the
    /// target's epoch and asks it to start recording its trajectory.
    pub fn initialize(&mut self) -> Result<(), LocatorError> {
        self.ready = false;
        self.file_was_written = false;

        if self.cfg.step <= Duration::ZERO {
            return Err(LocatorError::NonPositiveStep {
                step: self.cfg.step,
            });
        }
        if self.cfg.write_report && self.cfg.filename.is_none() {
            return Err(LocatorError::MissingFilename);
        }

        if self.cfg.use_entire_interval {
            self.window = None;
        } else {
            let raw_start = self
                .cfg
                .initial_epoch
                .as_deref()
                .ok_or(LocatorError::MissingEpoch { what: "initial" })?;
            let raw_end = self
                .cfg
                .final_epoch
                .as_deref()
                .ok_or(LocatorError::MissingEpoch { what: "final" })?;
            let start =
                parse_epoch(self.cfg.epoch_format, raw_start).context(EpochParseSnafu)?;
            let end = parse_epoch(self.cfg.epoch_format, raw_end).context(EpochParseSnafu)?;
            if start >= end {
                return Err(LocatorError::EpochOrder { start, end });
            }
            self.window = Some((start, end));
        }

        self.target_start_epoch = Some(self.target.epoch());
        self.target.start_recording();
        self.ready = true;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn target(&self) -> &Arc<dyn TargetEphemeris> {
        &self.target
    }

    pub fn eph(&self) -> &Arc<dyn Ephemerides> {
        &self.eph
    }

    pub fn frames(&self) -> &Arc<dyn FrameConverter> {
        &self.frames
    }

    /// The target's epoch at the time initialize was called.
    pub fn target_start_epoch(&self) -> Option<Epoch> {
        self.target_start_epoch
    }

    /// The window the search will cover: the explicit configured window, or
    /// the target's entire recorded span.
    pub fn search_window(&self) -> Result<(Epoch, Epoch), LocatorError> {
        if !self.ready {
            return Err(LocatorError::NotReady);
        }
        match self.window {
            Some(window) => Ok(window),
            None => {
                let (start, end) = self.target.span();
                if start >= end {
                    return Err(LocatorError::EpochOrder { start, end });
                }
                Ok((start, end))
            }
        }
    }

    /// The aberration corrections this locator requests from the
    /// ephemerides.
    pub fn aberration(&self, transmit: bool) -> Aberration {
        Aberration {
            light_time: self.cfg.use_light_time,
            stellar: self.cfg.use_stellar_aberration,
            transmit,
        }
    }

    /// The SPICE style aberration correction token for this configuration.
    pub fn abcorr(&self) -> String {
        self.aberration(false).token()
    }

    pub fn file_was_written(&self) -> bool {
        self.file_was_written
    }

    /// Writes the report text to the configured file.
    ///
    /// An unwritable file is the one locally recovered failure of the
    /// subsystem: it is logged as a warning and the write is skipped. A
    /// rename collision which cannot be resolved is escalated instead.
    pub(crate) fn write_report(&mut self, text: &str) -> Result<(), LocatorError> {
        let Some(path) = self.cfg.filename.clone() else {
            return Ok(());
        };

        let path = prepare_report_path(&path, self.cfg.append_reports)?;
        let result = if self.cfg.append_reports {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
        } else {
            std::fs::File::create(&path)
        };
        let mut file = match result {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "could not open the report file {}, skipping the report: {error}",
                    path.display()
                );
                return Ok(());
            }
        };
        if let Err(error) = file.write_all(text.as_bytes()) {
            warn!(
                "could not write the report file {}, skipping the report: {error}",
                path.display()
            );
            return Ok(());
        }
        info!("wrote the event report to {}", path.display());
        self.file_was_written = true;
        Ok(())
    }
}

#[cfg(test)]
mod ut_locator {
    use super::*;
    use crate::cosmic::BodyShape;
    use crate::errors::EventError;
    use crate::linalg::Vector6;

    struct StubTarget;

    impl TargetEphemeris for StubTarget {
        fn name(&self) -> &str {
            "Stub"
        }
        fn epoch(&self) -> Epoch {
            Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
        }
        fn span(&self) -> (Epoch, Epoch) {
            (self.epoch(), self.epoch() + 1 * Unit::Day)
        }
        fn state_km(&self, epoch: Epoch) -> Result<Vector6<f64>, EventError> {
            let _ = epoch;
            Ok(Vector6::zeros())
        }
    }

    struct StubEph;

    impl Ephemerides for StubEph {
        fn state_km(
            &self,
            _body: &str,
            _epoch: Epoch,
            _ab: Aberration,
        ) -> Result<Vector6<f64>, EventError> {
            Ok(Vector6::zeros())
        }
        fn shape(&self, body: &str) -> Result<BodyShape, EventError> {
            Ok(BodyShape::spherical(body, 6378.0))
        }
    }

    struct StubFrames;

    impl FrameConverter for StubFrames {
        fn to_body_fixed(
            &self,
            _body: &str,
            _epoch: Epoch,
            state: &Vector6<f64>,
        ) -> Result<Vector6<f64>, EventError> {
            Ok(*state)
        }
        fn from_body_fixed(
            &self,
            _body: &str,
            _epoch: Epoch,
            state: &Vector6<f64>,
        ) -> Result<Vector6<f64>, EventError> {
            Ok(*state)
        }
    }

    fn locator(cfg: SearchConfig) -> EventLocator {
        EventLocator::new(Arc::new(StubTarget), Arc::new(StubEph), Arc::new(StubFrames), cfg)
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(
            "Receive".parse::<LightTimeDirection>().unwrap(),
            LightTimeDirection::Receive
        );
        assert_eq!(
            "Transmit".parse::<LightTimeDirection>().unwrap(),
            LightTimeDirection::Transmit
        );
        assert!(matches!(
            "Bounce".parse::<LightTimeDirection>(),
            Err(LocatorError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn initialize_validation() {
        // Non positive step
        let mut loc = locator(
            SearchConfig::builder()
                .step(Duration::ZERO)
                .write_report(false)
                .build(),
        );
        assert!(matches!(
            loc.initialize(),
            Err(LocatorError::NonPositiveStep { .. })
        ));

        // Report requested without a filename
        let mut loc = locator(SearchConfig::builder().build());
        assert!(matches!(
            loc.initialize(),
            Err(LocatorError::MissingFilename)
        ));

        // Explicit window must be ordered
        let mut loc = locator(
            SearchConfig::builder()
                .use_entire_interval(false)
                .initial_epoch("2024-03-02T00:00:00 UTC")
                .final_epoch("2024-03-01T00:00:00 UTC")
                .write_report(false)
                .build(),
        );
        assert!(matches!(loc.initialize(), Err(LocatorError::EpochOrder { .. })));

        // Missing final epoch
        let mut loc = locator(
            SearchConfig::builder()
                .use_entire_interval(false)
                .initial_epoch("2024-03-01T00:00:00 UTC")
                .write_report(false)
                .build(),
        );
        assert!(matches!(
            loc.initialize(),
            Err(LocatorError::MissingEpoch { what: "final" })
        ));

        // Unparseable epoch
        let mut loc = locator(
            SearchConfig::builder()
                .use_entire_interval(false)
                .initial_epoch("yesterday")
                .final_epoch("tomorrow")
                .write_report(false)
                .build(),
        );
        assert!(matches!(loc.initialize(), Err(LocatorError::EpochParse { .. })));

        // A valid configuration is re-enterable
        let mut loc = locator(SearchConfig::builder().write_report(false).build());
        loc.initialize().unwrap();
        assert!(loc.is_ready());
        let window = loc.search_window().unwrap();
        assert_eq!(window.1 - window.0, 1 * Unit::Day);
        loc.initialize().unwrap();
        assert!(loc.is_ready());
    }

    #[test]
    fn search_before_init() {
        let loc = locator(SearchConfig::builder().write_report(false).build());
        assert!(matches!(loc.search_window(), Err(LocatorError::NotReady)));
    }

    #[test]
    fn abcorr_from_config() {
        let loc = locator(SearchConfig::builder().write_report(false).build());
        assert_eq!(loc.abcorr(), "NONE");

        let loc = locator(
            SearchConfig::builder()
                .use_light_time(true)
                .write_report(false)
                .build(),
        );
        assert_eq!(loc.abcorr(), "CN");
        assert_eq!(loc.aberration(true).token(), "XCN");

        let loc = locator(
            SearchConfig::builder()
                .use_light_time(true)
                .use_stellar_aberration(true)
                .write_report(false)
                .build(),
        );
        assert_eq!(loc.abcorr(), "CN+S");
    }
}
