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

use crate::errors::{LocatorError, ReportRenameSnafu};
use crate::time::Epoch;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::prelude::*;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("could not read the configuration file: {source}"))]
    ReadError { source: std::io::Error },
    #[snafu(display("could not parse the configuration: {source}"))]
    ParseError { source: serde_yaml::Error },
    #[snafu(display("`{raw}` is not a valid {format} epoch"))]
    InvalidEpoch { raw: String, format: EpochFormat },
}

/// Any configuration representation which can be loaded from YAML.
pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadSnafu)?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided path to a yaml
    fn load_many<P>(path: P) -> Result<Vec<Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadSnafu)?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided string of a yaml
    fn loads_many(data: &str) -> Result<Vec<Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }
}

/// The epoch representations accepted and produced by the locator
/// configuration surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde_derive::Serialize, serde_derive::Deserialize)]
pub enum EpochFormat {
    /// Gregorian calendar string in UTC, e.g. `2024-03-01T12:00:00 UTC`
    UtcGregorian,
    /// Modified Julian days in UTC, as a decimal number
    UtcModifiedJulian,
    /// Modified Julian days in TAI, as a decimal number
    TaiModifiedJulian,
}

impl std::fmt::Display for EpochFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::UtcGregorian => write!(f, "UTCGregorian"),
            Self::UtcModifiedJulian => write!(f, "UTCModifiedJulian"),
            Self::TaiModifiedJulian => write!(f, "TAIModifiedJulian"),
        }
    }
}

/// Parses an epoch string in the provided representation.
pub fn parse_epoch(format: EpochFormat, raw: &str) -> Result<Epoch, ConfigError> {
    let invalid = || {
        InvalidEpochSnafu {
            raw: raw.to_string(),
            format,
        }
        .build()
    };
    match format {
        EpochFormat::UtcGregorian => raw.trim().parse::<Epoch>().map_err(|_| invalid()),
        EpochFormat::UtcModifiedJulian => raw
            .trim()
            .parse::<f64>()
            .map(Epoch::from_mjd_utc)
            .map_err(|_| invalid()),
        EpochFormat::TaiModifiedJulian => raw
            .trim()
            .parse::<f64>()
            .map(Epoch::from_mjd_tai)
            .map_err(|_| invalid()),
    }
}

/// Formats an epoch in the provided representation, the inverse of
/// [parse_epoch].
pub fn format_epoch(format: EpochFormat, epoch: Epoch) -> String {
    match format {
        EpochFormat::UtcGregorian => format!("{epoch}"),
        EpochFormat::UtcModifiedJulian => format!("{:.9}", epoch.to_mjd_utc_days()),
        EpochFormat::TaiModifiedJulian => format!("{:.9}", epoch.to_mjd_tai_days()),
    }
}

/// Resolves the path a report should be written to.
///
/// When a file already exists at the requested path and appending is off, the
/// existing file is rotated out of the way by renaming it with a `__N` suffix
/// for the first free N. A failed rename is an error; the caller then opens
/// the returned path itself.
pub(crate) fn prepare_report_path(path: &Path, append: bool) -> Result<PathBuf, LocatorError> {
    if append || !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for n in 1_u32.. {
        let candidate = path.with_file_name(format!("{stem}__{n}{ext}"));
        if !candidate.exists() {
            std::fs::rename(path, &candidate).context(ReportRenameSnafu {
                path: path.to_path_buf(),
            })?;
            info!(
                "moved the previous report to {}",
                candidate.to_string_lossy()
            );
            break;
        }
    }

    Ok(path.to_path_buf())
}
