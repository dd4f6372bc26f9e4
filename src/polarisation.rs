// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polarisation frames, and deriving them from the names of their components.

use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when deriving a polarisation frame.
pub enum PolarisationError {
    #[error("Polarisation {0} not supported")]
    /// The name or set of component names doesn't match any known frame.
    Unsupported(String),
}

/// The basis and ordering of the polarisation products of visibilities,
/// images and grids.
///
/// The string form of each frame (used by [`FromStr`] and [`Display`]) is the
/// frame's conventional name, e.g. `linear` or `stokesIQUV`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum PolarisationFrame {
    /// RR, RL, LR, LL
    #[strum(serialize = "circular")]
    Circular,
    /// RR, LL
    #[strum(serialize = "circularnp")]
    CircularNp,
    /// XX, XY, YX, YY
    #[strum(serialize = "linear")]
    Linear,
    /// XX, YY
    #[strum(serialize = "linearnp")]
    LinearNp,
    /// I, Q, U, V
    #[strum(serialize = "stokesIQUV")]
    StokesIQUV,
    /// I, V
    #[strum(serialize = "stokesIV")]
    StokesIV,
    /// I, Q
    #[strum(serialize = "stokesIQ")]
    StokesIQ,
    /// I
    #[default]
    #[strum(serialize = "stokesI")]
    StokesI,
}

impl PolarisationFrame {
    /// The ordered names of this frame's components.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Circular => &["RR", "RL", "LR", "LL"],
            Self::CircularNp => &["RR", "LL"],
            Self::Linear => &["XX", "XY", "YX", "YY"],
            Self::LinearNp => &["XX", "YY"],
            Self::StokesIQUV => &["I", "Q", "U", "V"],
            Self::StokesIV => &["I", "V"],
            Self::StokesIQ => &["I", "Q"],
            Self::StokesI => &["I"],
        }
    }

    /// The number of polarisation components.
    pub fn npol(self) -> usize {
        self.names().len()
    }

    /// The FITS `STOKES` axis codes of this frame's components, in order.
    pub fn fits_codes(self) -> &'static [i32] {
        match self {
            Self::Circular => &[-1, -3, -4, -2],
            Self::CircularNp => &[-1, -2],
            Self::Linear => &[-5, -7, -8, -6],
            Self::LinearNp => &[-5, -6],
            Self::StokesIQUV => &[1, 2, 3, 4],
            Self::StokesIV => &[1, 4],
            Self::StokesIQ => &[1, 2],
            Self::StokesI => &[1],
        }
    }

    /// Get a frame from its name, e.g. `linear`.
    ///
    /// # Errors
    ///
    /// [`PolarisationError::Unsupported`] if no frame has this name.
    pub fn from_name(name: &str) -> Result<Self, PolarisationError> {
        Self::from_str(name).map_err(|_| PolarisationError::Unsupported(name.to_string()))
    }

    /// Derive a frame from the names of its components, in any order.
    ///
    /// A list holding a single frame name, e.g. `["linear"]`, is also taken as
    /// that frame, so command-line values may give either form. This is wider
    /// than a pure component comparison, which would reject it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rascil_tweaks::PolarisationFrame;
    ///
    /// let frame = PolarisationFrame::from_names(&["YY", "YX", "XY", "XX"]).unwrap();
    /// assert_eq!(frame, PolarisationFrame::Linear);
    /// ```
    ///
    /// # Errors
    ///
    /// [`PolarisationError::Unsupported`] if the names aren't exactly the
    /// components of one known frame.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, PolarisationError> {
        use itertools::Itertools;

        if let [name] = names {
            if let Ok(frame) = Self::from_str(name.as_ref()) {
                return Ok(frame);
            }
        }
        let sorted_names = names
            .iter()
            .map(|name| name.as_ref())
            .sorted()
            .collect::<Vec<&str>>();
        Self::iter()
            .find(|frame| frame.names().iter().copied().sorted().eq(sorted_names.iter().copied()))
            .ok_or_else(|| PolarisationError::Unsupported(format!("{sorted_names:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            PolarisationFrame::from_name("stokesIQUV"),
            Ok(PolarisationFrame::StokesIQUV)
        );
        assert_eq!(
            PolarisationFrame::from_name("linearnp"),
            Ok(PolarisationFrame::LinearNp)
        );
        assert!(matches!(
            PolarisationFrame::from_name("XX"),
            Err(PolarisationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_from_names_is_order_independent() {
        let forward = PolarisationFrame::from_names(&["XX", "XY", "YX", "YY"]).unwrap();
        let backward = PolarisationFrame::from_names(&["YY", "YX", "XY", "XX"]).unwrap();
        assert_eq!(forward, PolarisationFrame::Linear);
        assert_eq!(forward, backward);

        assert_eq!(
            PolarisationFrame::from_names(&["LL", "RR"]),
            Ok(PolarisationFrame::CircularNp)
        );
        assert_eq!(
            PolarisationFrame::from_names(&["I"]),
            Ok(PolarisationFrame::StokesI)
        );
    }

    #[test]
    fn test_from_names_unsupported() {
        assert!(matches!(
            PolarisationFrame::from_names(&["A", "B"]),
            Err(PolarisationError::Unsupported(_))
        ));
        // a subset of a frame's components isn't that frame.
        assert!(PolarisationFrame::from_names(&["XX", "XY"]).is_err());
        // duplicates aren't ignored.
        assert!(PolarisationFrame::from_names(&["XX", "YY", "YY"]).is_err());
        // frame names are only recognised on their own.
        assert!(PolarisationFrame::from_names(&["linear", "XX"]).is_err());
        assert_eq!(
            PolarisationFrame::from_names(&["linear"]),
            Ok(PolarisationFrame::Linear)
        );
    }

    #[test]
    fn test_every_frame_round_trips_through_its_names() {
        for frame in PolarisationFrame::iter() {
            assert_eq!(PolarisationFrame::from_names(frame.names()), Ok(frame));
            assert_eq!(PolarisationFrame::from_name(&frame.to_string()), Ok(frame));
            assert_eq!(frame.fits_codes().len(), frame.npol());
        }
    }

    #[test]
    fn test_fits_codes() {
        assert_eq!(PolarisationFrame::Linear.fits_codes(), &[-5, -7, -8, -6]);
        assert_eq!(PolarisationFrame::Circular.fits_codes(), &[-1, -3, -4, -2]);
        assert_eq!(PolarisationFrame::StokesIQUV.fits_codes(), &[1, 2, 3, 4]);

        // a component has the same code in every frame it appears in
        let code_of = |name: &str| match name {
            "I" => 1,
            "Q" => 2,
            "U" => 3,
            "V" => 4,
            "RR" => -1,
            "LL" => -2,
            "RL" => -3,
            "LR" => -4,
            "XX" => -5,
            "YY" => -6,
            "XY" => -7,
            "YX" => -8,
            _ => panic!("unknown component {name}"),
        };
        for frame in PolarisationFrame::iter() {
            let expected: Vec<i32> = frame.names().iter().map(|&name| code_of(name)).collect();
            assert_eq!(frame.fits_codes(), expected.as_slice(), "{frame}");
        }
    }
}
