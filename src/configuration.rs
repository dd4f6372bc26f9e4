// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Antenna layouts of an array, read from tile coordinate files.

use std::path::Path;

use crate::constants::{
    MWA_CONFIGURATION_NAME, MWA_TILES_HEIGHT_M, MWA_TILES_LATITUDE_RAD, MWA_TILES_LONGITUDE_RAD,
    MWA_TILE_DIAMETER_M,
};
use log::{debug, trace};
use marlu::{LatLngHeight, XyzGeodetic, ENH};
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors that can occur when building a [`Configuration`].
pub enum ConfigurationError {
    #[error("Couldn't read tile positions from {file}: {source}")]
    /// The tile file couldn't be opened or isn't valid CSV.
    Csv {
        /// The tile file
        file: String,
        /// The underlying [`csv::Error`]
        source: csv::Error,
    },

    #[error("{file} line {line}: expected numeric east, north and height columns, found {found:?}")]
    /// A row of the tile file doesn't hold three numbers.
    BadRow {
        /// The tile file
        file: String,
        /// The line of the tile file
        line: u64,
        /// The offending row
        found: String,
    },

    #[error("No tile positions found in {0}")]
    /// The tile file has no rows.
    Empty(String),
}

/// The antennas of an array and where the array is on the Earth.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// The name of the array
    pub name: String,
    /// The array position
    pub location: LatLngHeight,
    /// The name of each antenna
    pub names: Vec<String>,
    /// The local geodetic position of each antenna \[metres\]
    pub xyz: Vec<XyzGeodetic>,
    /// The effective dish diameter of each antenna \[metres\]
    pub diameter_m: Vec<f64>,
    /// The mount of each antenna
    pub mount: Vec<String>,
}

impl Configuration {
    /// Create a configuration from the local topocentric positions of its
    /// antennas. Antennas are named by their index.
    pub fn from_enh(name: &str, location: LatLngHeight, enhs: &[ENH], diameter_m: f64) -> Self {
        let xyz = enhs
            .iter()
            .map(|enh| enh.to_xyz(location.latitude_rad))
            .collect::<Vec<_>>();
        let num_ants = xyz.len();
        Self {
            name: name.to_string(),
            location,
            names: (0..num_ants).map(|i| i.to_string()).collect(),
            xyz,
            diameter_m: vec![diameter_m; num_ants],
            mount: vec!["altaz".to_string(); num_ants],
        }
    }

    /// Read a configuration from a CSV file of antenna east, north and height
    /// offsets in metres. Lines starting with `#` are ignored, as are any
    /// columns after the third.
    ///
    /// # Errors
    ///
    /// Will return [`ConfigurationError`] if the file can't be read, a row
    /// doesn't start with three numbers, or there are no rows at all.
    pub fn from_tile_file<P: AsRef<Path>>(
        path: P,
        name: &str,
        location: LatLngHeight,
        diameter_m: f64,
    ) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let file = path.display().to_string();
        debug!("reading tile positions from {}", file);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| ConfigurationError::Csv {
                file: file.clone(),
                source,
            })?;

        let mut enhs = vec![];
        for record in reader.records() {
            let record = record.map_err(|source| ConfigurationError::Csv {
                file: file.clone(),
                source,
            })?;
            let line = record.position().map_or(0, csv::Position::line);
            let values = record
                .iter()
                .take(3)
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>();
            match values.as_deref() {
                Ok(&[e, n, h]) => enhs.push(ENH { e, n, h }),
                _ => {
                    return Err(ConfigurationError::BadRow {
                        file,
                        line,
                        found: record.iter().collect::<Vec<_>>().join(","),
                    })
                }
            }
        }
        if enhs.is_empty() {
            return Err(ConfigurationError::Empty(file));
        }
        trace!("read {} tile positions", enhs.len());

        Ok(Self::from_enh(name, location, &enhs, diameter_m))
    }

    /// The location of the MWA that tile coordinate files are relative to.
    pub fn mwa_location() -> LatLngHeight {
        LatLngHeight {
            longitude_rad: MWA_TILES_LONGITUDE_RAD,
            latitude_rad: MWA_TILES_LATITUDE_RAD,
            height_metres: MWA_TILES_HEIGHT_M,
        }
    }

    /// Read an MWA configuration from a tile coordinate file, e.g.
    /// [`crate::constants::DEFAULT_MWA_TILES_FILENAME`].
    ///
    /// # Errors
    ///
    /// See [`Configuration::from_tile_file`].
    pub fn mwa_from_tile_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        Self::from_tile_file(
            path,
            MWA_CONFIGURATION_NAME,
            Self::mwa_location(),
            MWA_TILE_DIAMETER_M,
        )
    }

    /// The number of antennas.
    pub fn num_antennas(&self) -> usize {
        self.xyz.len()
    }
}
