// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! World coordinate system (WCS) descriptors.
//!
//! Axes are stored in FITS order, which is the reverse of the order of the
//! axes of the arrays they describe, e.g. an image array indexed
//! `[chan][pol][dec][ra]` has WCS axes `RA---SIN, DEC--SIN, STOKES, FREQ`.
//! Reference pixels (`crpix`) are 1-based, like FITS, but the pixel
//! coordinates given to and returned from [`Wcs::pixel_to_world`] and
//! [`Wcs::world_to_pixel`] are 0-based array indices.

use std::f64::consts::TAU;

use marlu::RADec;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Errors that can occur when using a [`Wcs`].
pub enum WcsError {
    #[error("WCS has no {0} axis")]
    /// The WCS doesn't have an axis that was needed.
    MissingAxis(&'static str),

    #[error("pixel ({x}, {y}) is outside of the SIN projection")]
    /// The pixel doesn't correspond to a direction on the sky.
    OutsidePixel {
        /// 0-based pixel along the longitude axis
        x: f64,
        /// 0-based pixel along the latitude axis
        y: f64,
    },

    #[error("direction {0} is on the far side of the SIN projection")]
    /// The direction is more than 90 degrees from the projection centre.
    OutsideDirection(RADec),
}

/// A single axis of a [`Wcs`].
#[derive(Clone, Debug, PartialEq)]
pub struct WcsAxis {
    /// Axis type, e.g. `RA---SIN` or `FREQ`
    pub ctype: String,
    /// 1-based reference pixel
    pub crpix: f64,
    /// World coordinate at the reference pixel
    pub crval: f64,
    /// World coordinate increment per pixel
    pub cdelt: f64,
}

impl WcsAxis {
    /// Create a new axis.
    pub fn new(ctype: &str, crpix: f64, crval: f64, cdelt: f64) -> Self {
        Self {
            ctype: ctype.to_string(),
            crpix,
            crval,
            cdelt,
        }
    }

    /// The world coordinate of a 0-based pixel along this axis.
    pub fn world(&self, pixel: f64) -> f64 {
        self.crval + self.cdelt * (pixel + 1.0 - self.crpix)
    }
}

/// A linear world coordinate system with an optional celestial SIN
/// projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Wcs {
    /// The axes in FITS order
    pub axes: Vec<WcsAxis>,
    /// Celestial reference frame, e.g. `ICRS`
    pub radesys: String,
    /// Equinox of the celestial reference frame \[years\]
    pub equinox: f64,
}

impl Wcs {
    /// The number of axes.
    pub fn naxis(&self) -> usize {
        self.axes.len()
    }

    /// The index of the first axis whose type starts with `prefix`.
    pub fn axis_index(&self, prefix: &str) -> Option<usize> {
        self.axes
            .iter()
            .position(|axis| axis.ctype.starts_with(prefix))
    }

    fn axis_by_prefix(&self, prefix: &'static str) -> Result<&WcsAxis, WcsError> {
        self.axis_index(prefix)
            .map(|idx| &self.axes[idx])
            .ok_or(WcsError::MissingAxis(prefix))
    }

    fn celestial_axes(&self) -> Result<(&WcsAxis, &WcsAxis), WcsError> {
        Ok((self.axis_by_prefix("RA")?, self.axis_by_prefix("DEC")?))
    }

    /// The direction at the reference pixel of the celestial axes.
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there are no `RA`/`DEC` axes.
    pub fn reference_direction(&self) -> Result<RADec, WcsError> {
        let (ra, dec) = self.celestial_axes()?;
        Ok(RADec::new(ra.crval.to_radians(), dec.crval.to_radians()))
    }

    /// The angular size of a pixel along the latitude axis \[radians\]
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there is no `DEC` axis.
    pub fn cellsize_rad(&self) -> Result<f64, WcsError> {
        Ok(self.axis_by_prefix("DEC")?.cdelt.abs().to_radians())
    }

    /// The frequency of a 0-based channel index \[Hz\]
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there is no `FREQ` axis.
    pub fn channel_frequency_hz(&self, chan: usize) -> Result<f64, WcsError> {
        Ok(self.axis_by_prefix("FREQ")?.world(chan as f64))
    }

    /// The (fractional) 0-based channel index of a frequency \[Hz\]
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there is no `FREQ` axis.
    pub fn frequency_channel(&self, freq_hz: f64) -> Result<f64, WcsError> {
        let axis = self.axis_by_prefix("FREQ")?;
        Ok((freq_hz - axis.crval) / axis.cdelt + axis.crpix - 1.0)
    }

    /// The sky direction of a 0-based celestial pixel `(x, y)`, where `x`
    /// runs along the `RA` axis and `y` along the `DEC` axis.
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there are no celestial axes, or
    /// [`WcsError::OutsidePixel`] if the pixel is off the projection.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Result<RADec, WcsError> {
        let (ra_axis, dec_axis) = self.celestial_axes()?;
        let l = (ra_axis.cdelt * (x + 1.0 - ra_axis.crpix)).to_radians();
        let m = (dec_axis.cdelt * (y + 1.0 - dec_axis.crpix)).to_radians();
        let n_sq = 1.0 - l * l - m * m;
        if n_sq < 0.0 {
            return Err(WcsError::OutsidePixel { x, y });
        }
        let n = n_sq.sqrt();

        let (s_dec0, c_dec0) = dec_axis.crval.to_radians().sin_cos();
        let dec = (m * c_dec0 + n * s_dec0).asin();
        let ra = ra_axis.crval.to_radians() + l.atan2(n * c_dec0 - m * s_dec0);
        Ok(RADec::new(ra.rem_euclid(TAU), dec))
    }

    /// The 0-based celestial pixel `(x, y)` of a sky direction.
    ///
    /// # Errors
    ///
    /// [`WcsError::MissingAxis`] if there are no celestial axes, or
    /// [`WcsError::OutsideDirection`] if the direction is on the far side of
    /// the projection.
    pub fn world_to_pixel(&self, radec: RADec) -> Result<(f64, f64), WcsError> {
        let (ra_axis, dec_axis) = self.celestial_axes()?;
        let centre = RADec::new(ra_axis.crval.to_radians(), dec_axis.crval.to_radians());
        let lmn = radec.to_lmn(centre);
        if lmn.n < 0.0 {
            return Err(WcsError::OutsideDirection(radec));
        }
        let x = lmn.l.to_degrees() / ra_axis.cdelt + ra_axis.crpix - 1.0;
        let y = lmn.m.to_degrees() / dec_axis.cdelt + dec_axis.crpix - 1.0;
        Ok((x, y))
    }
}
