// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image arguments, given on the command line or in a toml or json file.
//!
//! Arguments are only merged here; [`ImageArgs::into_options`] is what makes
//! sense of them.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::debug;
use marlu::RADec;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    polarisation::{PolarisationError, PolarisationFrame},
    synthesis::ImageOptions,
};

#[derive(Debug, Display, EnumIter, EnumString)]
enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

lazy_static::lazy_static! {
    static ref ARG_FILE_TYPES_COMMA_SEPARATED: String =
        itertools::Itertools::join(&mut ArgFileTypes::iter(), ", ");

    /// Help text for the argument file.
    pub static ref ARG_FILE_HELP: String =
        format!("All image arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);
}

/// Errors associated with image arguments.
#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("Argument file '{0}' doesn't have a recognised file extension! Valid extensions are: {}", *ARG_FILE_TYPES_COMMA_SEPARATED)]
    /// The argument file isn't toml or json.
    UnrecognisedArgFileExt(String),

    #[error("Couldn't decode toml structure from {file}:\n{err}")]
    /// The argument file isn't valid toml, or has unknown keys.
    TomlDecode {
        /// The argument file
        file: String,
        /// The decoding error
        err: String,
    },

    #[error("Couldn't decode json structure from {file}:\n{err}")]
    /// The argument file isn't valid json, or has unknown keys.
    JsonDecode {
        /// The argument file
        file: String,
        /// The decoding error
        err: String,
    },

    #[error("IO error when trying to read argument file: {0}")]
    /// The argument file couldn't be read.
    IO(#[from] std::io::Error),

    #[error("{arg} specified as {values:?}, not [<RA degrees>, <Dec degrees>]")]
    /// A direction didn't have exactly two values.
    BadDirection {
        /// The argument name
        arg: &'static str,
        /// The values given
        values: Vec<f64>,
    },

    #[error("The image must have at least one pixel")]
    /// npixel was 0.
    ZeroPixels,

    #[error("The number of image channels cannot be 0")]
    /// nchan was 0.
    ZeroChannels,

    #[error("The cellsize must be finite and not negative, found {0} radians")]
    /// A negative or non-finite cellsize.
    InvalidCellsize(f64),

    #[error(transparent)]
    /// The polarisation names don't make a frame.
    Polarisation(#[from] PolarisationError),
}

/// Arguments for [`crate::create_image_from_visibility`]. Everything is
/// optional; anything left out is taken from the visibilities or defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageArgs {
    /// The image centre `[RA, Dec]` \[degrees\]
    pub image_centre: Option<Vec<f64>>,
    /// The phase centre `[RA, Dec]` \[degrees\]
    pub phase_centre: Option<Vec<f64>>,
    /// The frequencies to image \[Hz\]
    pub freqs_hz: Option<Vec<f64>>,
    /// The number of image channels
    pub nchan: Option<usize>,
    /// The width of an image channel \[Hz\]
    pub channel_bandwidth_hz: Option<f64>,
    /// The width and height of the image \[pixels\]
    pub npixel: Option<usize>,
    /// The angular size of a pixel \[radians\]
    pub cellsize_rad: Option<f64>,
    /// Keep the cellsize even when it undersamples the longest baseline
    #[serde(default)]
    pub no_override_cellsize: bool,
    /// A polarisation frame name, or the names of its components
    pub pol: Option<Vec<String>>,
    /// Celestial reference frame
    pub frame: Option<String>,
    /// Equinox of the celestial reference frame \[years\]
    pub equinox: Option<f64>,
}

impl ImageArgs {
    /// Read arguments from a toml or json file, chosen by its extension.
    ///
    /// # Errors
    ///
    /// Will return [`ArgsError`] if the extension isn't recognised, the file
    /// can't be read, or it doesn't decode (including unknown keys).
    pub fn from_file<P: AsRef<Path>>(arg_file: P) -> Result<Self, ArgsError> {
        let file_args_path = PathBuf::from(arg_file.as_ref());
        debug!(
            "Attempting to parse argument file {} ...",
            file_args_path.display()
        );

        let mut contents = String::new();
        let file_args_extension = file_args_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());
        match file_args_extension {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&file_args_path)?;
                fh.read_to_string(&mut contents)?;
                toml::from_str(&contents).map_err(|e| ArgsError::TomlDecode {
                    file: file_args_path.display().to_string(),
                    err: e.to_string(),
                })
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&file_args_path)?;
                fh.read_to_string(&mut contents)?;
                serde_json::from_str(&contents).map_err(|e| ArgsError::JsonDecode {
                    file: file_args_path.display().to_string(),
                    err: e.to_string(),
                })
            }
            None => Err(ArgsError::UnrecognisedArgFileExt(
                file_args_path.display().to_string(),
            )),
        }
    }

    /// Consolidate two sets of arguments, preferring `self` (the CLI
    /// arguments) over `other` (the file arguments).
    pub fn merge(self, other: Self) -> Self {
        Self {
            image_centre: self.image_centre.or(other.image_centre),
            phase_centre: self.phase_centre.or(other.phase_centre),
            freqs_hz: self.freqs_hz.or(other.freqs_hz),
            nchan: self.nchan.or(other.nchan),
            channel_bandwidth_hz: self.channel_bandwidth_hz.or(other.channel_bandwidth_hz),
            npixel: self.npixel.or(other.npixel),
            cellsize_rad: self.cellsize_rad.or(other.cellsize_rad),
            no_override_cellsize: self.no_override_cellsize || other.no_override_cellsize,
            pol: self.pol.or(other.pol),
            frame: self.frame.or(other.frame),
            equinox: self.equinox.or(other.equinox),
        }
    }

    /// Merge with the arguments in `arg_file`, preferring `self`.
    ///
    /// # Errors
    ///
    /// See [`ImageArgs::from_file`].
    pub fn merge_file<P: AsRef<Path>>(self, arg_file: P) -> Result<Self, ArgsError> {
        Ok(self.merge(Self::from_file(arg_file)?))
    }

    /// Check the arguments and turn them into [`ImageOptions`].
    ///
    /// # Errors
    ///
    /// Will return [`ArgsError`] if a direction doesn't have two values,
    /// `npixel` or `nchan` is 0, the cellsize is negative, or the
    /// polarisation names don't make a frame.
    pub fn into_options(self) -> Result<ImageOptions, ArgsError> {
        // Expose all the struct fields to ensure they're all used.
        let ImageArgs {
            image_centre,
            phase_centre,
            freqs_hz,
            nchan,
            channel_bandwidth_hz,
            npixel,
            cellsize_rad,
            no_override_cellsize,
            pol,
            frame,
            equinox,
        } = self;

        let mut options = ImageOptions {
            image_centre: parse_direction("image_centre", image_centre)?,
            phase_centre: parse_direction("phase_centre", phase_centre)?,
            frequency_hz: freqs_hz,
            channel_bandwidth_hz,
            override_cellsize: !no_override_cellsize,
            ..Default::default()
        };
        if let Some(nchan) = nchan {
            if nchan == 0 {
                return Err(ArgsError::ZeroChannels);
            }
            options.num_chans = Some(nchan);
        }
        if let Some(npixel) = npixel {
            if npixel == 0 {
                return Err(ArgsError::ZeroPixels);
            }
            options.npixel = npixel;
        }
        if let Some(cellsize) = cellsize_rad {
            if !cellsize.is_finite() || cellsize < 0.0 {
                return Err(ArgsError::InvalidCellsize(cellsize));
            }
            options.cellsize_rad = Some(cellsize);
        }
        if let Some(pol) = pol {
            options.polarisation_frame = Some(PolarisationFrame::from_names(pol.as_slice())?);
        }
        if let Some(frame) = frame {
            options.frame = frame;
        }
        if let Some(equinox) = equinox {
            options.equinox = equinox;
        }
        Ok(options)
    }
}

fn parse_direction(
    arg: &'static str,
    values: Option<Vec<f64>>,
) -> Result<Option<RADec>, ArgsError> {
    let Some(values) = values else {
        return Ok(None);
    };
    if let [ra, dec] = values[..] {
        return Ok(Some(RADec::new(ra.to_radians(), dec.to_radians())));
    }
    Err(ArgsError::BadDirection { arg, values })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_abs_diff_eq;
    use tempfile::{Builder, NamedTempFile};

    use super::*;

    fn arg_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_arg_file_help_lists_types() {
        assert_eq!(*ARG_FILE_TYPES_COMMA_SEPARATED, "toml, json");
        assert!(ARG_FILE_HELP.ends_with("Supported formats: toml, json"));
    }

    #[test]
    fn test_toml_file() {
        let file = arg_file(
            ".toml",
            r#"
phase_centre = [60.0, -27.0]
freqs_hz = [150e6, 151e6]
npixel = 256
pol = ["XX", "YY"]
no_override_cellsize = true
"#,
        );
        let args = ImageArgs::from_file(file.path()).unwrap();
        assert_eq!(args.phase_centre, Some(vec![60.0, -27.0]));
        assert_eq!(args.npixel, Some(256));
        assert!(args.no_override_cellsize);
        assert_eq!(args.nchan, None);

        let options = args.into_options().unwrap();
        let phase_centre = options.phase_centre.unwrap();
        assert_abs_diff_eq!(phase_centre.ra, 60_f64.to_radians());
        assert_abs_diff_eq!(phase_centre.dec, (-27_f64).to_radians());
        assert_eq!(options.frequency_hz, Some(vec![150e6, 151e6]));
        assert_eq!(options.npixel, 256);
        assert!(!options.override_cellsize);
        assert_eq!(options.polarisation_frame, Some(PolarisationFrame::LinearNp));
        assert_eq!(options.frame, "ICRS");
    }

    #[test]
    fn test_json_file() {
        let file = arg_file(
            ".JSON",
            r#"{"nchan": 2, "cellsize_rad": 0.001, "pol": ["stokesIQUV"], "equinox": 1950.0}"#,
        );
        let options = ImageArgs::from_file(file.path())
            .unwrap()
            .into_options()
            .unwrap();
        assert_eq!(options.num_chans, Some(2));
        assert_eq!(options.cellsize_rad, Some(0.001));
        assert_eq!(options.polarisation_frame, Some(PolarisationFrame::StokesIQUV));
        assert_eq!(options.equinox, 1950.0);
        assert_eq!(options.npixel, 512);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let file = arg_file(".toml", "npixel = 64\nchunksize = 4\n");
        assert!(matches!(
            ImageArgs::from_file(file.path()),
            Err(ArgsError::TomlDecode { .. })
        ));
        let file = arg_file(".json", r#"{"wibble": true}"#);
        assert!(matches!(
            ImageArgs::from_file(file.path()),
            Err(ArgsError::JsonDecode { .. })
        ));
    }

    #[test]
    fn test_unrecognised_extension() {
        let file = arg_file(".yaml", "npixel: 64\n");
        assert!(matches!(
            ImageArgs::from_file(file.path()),
            Err(ArgsError::UnrecognisedArgFileExt(_))
        ));
    }

    #[test]
    fn test_cli_args_override_file_args() {
        let file = arg_file(".toml", "npixel = 64\nframe = \"FK5\"\nnchan = 3\n");
        let cli_args = ImageArgs {
            npixel: Some(128),
            ..Default::default()
        };
        let merged = cli_args.merge_file(file.path()).unwrap();
        assert_eq!(merged.npixel, Some(128));
        assert_eq!(merged.frame.as_deref(), Some("FK5"));
        assert_eq!(merged.nchan, Some(3));
    }

    #[test]
    fn test_invalid_values() {
        let bad_direction = ImageArgs {
            image_centre: Some(vec![1.0, 2.0, 3.0]),
            ..Default::default()
        };
        assert!(matches!(
            bad_direction.into_options(),
            Err(ArgsError::BadDirection {
                arg: "image_centre",
                ..
            })
        ));

        let zero_pixels = ImageArgs {
            npixel: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            zero_pixels.into_options(),
            Err(ArgsError::ZeroPixels)
        ));

        let negative_cellsize = ImageArgs {
            cellsize_rad: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            negative_cellsize.into_options(),
            Err(ArgsError::InvalidCellsize(_))
        ));

        let bad_pol = ImageArgs {
            pol: Some(vec!["XX".into(), "I".into()]),
            ..Default::default()
        };
        assert!(matches!(
            bad_pol.into_options(),
            Err(ArgsError::Polarisation(_))
        ));
    }

    #[test]
    fn test_default_args_are_default_options() {
        assert_eq!(
            ImageArgs::default().into_options().unwrap(),
            ImageOptions::default()
        );
    }
}
