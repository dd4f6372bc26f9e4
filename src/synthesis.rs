// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthesize empty images whose geometry suits a set of visibilities.

use std::fmt::Display;

use derive_builder::Builder;
use log::debug;
use marlu::RADec;
use strum_macros::{Display, IntoStaticStr};

use crate::{
    constants::{DEFAULT_EQUINOX, DEFAULT_FRAME, DEFAULT_NPIXEL},
    error::ImagingError,
    image::Image,
    polarisation::PolarisationFrame,
    visibility::Visibility,
    wcs::{Wcs, WcsAxis},
};

/// How image channels relate to visibility channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum SpectralMode {
    /// One image channel per visibility channel.
    #[strum(serialize = "channel")]
    Channel,
    /// All visibility channels in one image channel.
    #[strum(serialize = "mfs")]
    Mfs,
    /// Several visibility channels per image channel.
    #[strum(serialize = "multi-channel mfs")]
    MultiChannelMfs,
    /// A single visibility channel in a single image channel.
    #[strum(serialize = "single channel")]
    SingleChannel,
}

impl SpectralMode {
    /// Decide the spectral mode from the number of image channels requested
    /// (`inchan`) and the number of unique visibility frequencies (`vnchan`).
    ///
    /// # Errors
    ///
    /// [`ImagingError::UnsupportedSpectralMode`] when no mode fits, e.g.
    /// several image channels from a single visibility channel.
    pub fn classify(inchan: usize, vnchan: usize) -> Result<Self, ImagingError> {
        match (inchan, vnchan) {
            (i, v) if i == v && v > 1 => Ok(Self::Channel),
            (1, v) if v > 1 => Ok(Self::Mfs),
            (i, v) if i > 1 && v > 1 => Ok(Self::MultiChannelMfs),
            (1, 1) => Ok(Self::SingleChannel),
            (inchan, vnchan) => Err(ImagingError::UnsupportedSpectralMode { inchan, vnchan }),
        }
    }

    /// Whether image channels in this mode need a non-zero channel width.
    pub fn needs_bandwidth(self) -> bool {
        !matches!(self, Self::Channel)
    }
}

/// Options for [`create_image_from_visibility`]. Anything left unset is taken
/// from the visibilities.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct ImageOptions {
    /// The centre of the image. Only reported, the image is always centred on
    /// the phase centre.
    #[builder(default)]
    pub image_centre: Option<RADec>,
    /// The reference direction of the image
    #[builder(default)]
    pub phase_centre: Option<RADec>,
    /// Frequencies to image \[Hz\], the first is the reference frequency
    #[builder(default)]
    pub frequency_hz: Option<Vec<f64>>,
    /// The number of image channels
    #[builder(default)]
    pub num_chans: Option<usize>,
    /// The width of an image channel \[Hz\]
    #[builder(default)]
    pub channel_bandwidth_hz: Option<f64>,
    /// The width and height of the image \[pixels\]
    #[builder(default = "DEFAULT_NPIXEL")]
    pub npixel: usize,
    /// The angular size of a pixel \[radians\]
    #[builder(default)]
    pub cellsize_rad: Option<f64>,
    /// Whether to shrink a cellsize that undersamples the longest baseline
    #[builder(default = "true")]
    pub override_cellsize: bool,
    /// The polarisation frame of the image
    #[builder(default)]
    pub polarisation_frame: Option<PolarisationFrame>,
    /// Celestial reference frame
    #[builder(default = "DEFAULT_FRAME.to_string()")]
    pub frame: String,
    /// Equinox of the celestial reference frame \[years\]
    #[builder(default = "DEFAULT_EQUINOX")]
    pub equinox: f64,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            image_centre: None,
            phase_centre: None,
            frequency_hz: None,
            num_chans: None,
            channel_bandwidth_hz: None,
            npixel: DEFAULT_NPIXEL,
            cellsize_rad: None,
            override_cellsize: true,
            polarisation_frame: None,
            frame: DEFAULT_FRAME.to_string(),
            equinox: DEFAULT_EQUINOX,
        }
    }
}

impl Display for ImageOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{0}x{0} pixels", self.npixel)?;
        match self.cellsize_rad {
            Some(cellsize) => writeln!(
                f,
                "cellsize {cellsize} rad, {} be reduced to the critical cellsize.",
                if self.override_cellsize {
                    "may"
                } else {
                    "will not"
                }
            )?,
            None => writeln!(f, "cellsize from the longest baseline")?,
        }
        if let Some(num_chans) = self.num_chans {
            writeln!(f, "{num_chans} channels")?;
        }
        if let Some(pol) = self.polarisation_frame {
            writeln!(f, "polarisation frame {pol}")?;
        }
        writeln!(f, "{} (equinox {})", self.frame, self.equinox)
    }
}

/// Choose the image cellsize \[radians\] for a largest |u| or |v| of `uvmax`
/// wavelengths.
///
/// Without a requested cellsize, half the critical cellsize `1 / (2 uvmax)`
/// is used. A requested cellsize coarser than critical is reduced to critical
/// when `override_cellsize` is set, and a requested cellsize of 0 always is.
///
/// # Errors
///
/// [`ImagingError::DegenerateUvw`] if `uvmax` isn't finite and positive.
pub fn choose_cellsize(
    uvmax: f64,
    cellsize_rad: Option<f64>,
    override_cellsize: bool,
) -> Result<f64, ImagingError> {
    if !(uvmax.is_finite() && uvmax > 0.0) {
        return Err(ImagingError::DegenerateUvw { uvmax });
    }
    let critical = 1.0 / (2.0 * uvmax);
    debug!("critical cellsize = {critical} rad");
    let cellsize = match cellsize_rad {
        None => critical / 2.0,
        Some(cellsize) if (override_cellsize && cellsize > critical) || cellsize == 0.0 => {
            debug!("resetting cellsize {cellsize} rad to critical {critical} rad");
            critical
        }
        Some(cellsize) => cellsize,
    };
    Ok(cellsize)
}

/// Make an empty `float32` image suitable for imaging `vis`.
///
/// The image is `(nchan, npol, npixel, npixel)` with a SIN projection centred
/// on the phase centre, a `STOKES` axis and a `FREQ` axis whose reference is
/// the first frequency.
///
/// # Errors
///
/// Will return [`ImagingError`] if the channel counts don't make a
/// [`SpectralMode`], the mode needs a channel width but it's zero, a
/// frequency override is empty, or every baseline has zero length in the uv
/// plane.
pub fn create_image_from_visibility(
    vis: &Visibility,
    options: &ImageOptions,
) -> Result<Image<f32>, ImagingError> {
    let phase_centre = options.phase_centre.unwrap_or_else(|| vis.phase_centre());
    let image_centre = options.image_centre.unwrap_or(phase_centre);
    debug!(
        "image centre {image_centre}, phase centre {phase_centre}, {} frame",
        options.frame
    );

    let vnchan = vis.unique_frequencies_hz().len();
    let inchan = options.num_chans.unwrap_or(vnchan);
    let mode = SpectralMode::classify(inchan, vnchan)?;
    let frequency_hz = options
        .frequency_hz
        .as_deref()
        .unwrap_or_else(|| vis.frequency_hz());
    let reference_frequency_hz = *frequency_hz.first().ok_or(ImagingError::NoFrequencies)?;
    let channel_bandwidth_hz = match options.channel_bandwidth_hz {
        Some(bandwidth) => bandwidth,
        None => *vis
            .channel_bandwidth_hz()
            .first()
            .ok_or(ImagingError::NoFrequencies)?,
    };
    // NaN fails this too
    if mode.needs_bandwidth() && !(channel_bandwidth_hz.abs() > 0.0) {
        return Err(ImagingError::InvalidBandwidth {
            mode,
            channel_bandwidth_hz,
        });
    }
    debug!(
        "{mode} mode: {inchan} image channels from {vnchan} visibility channels, reference {reference_frequency_hz} Hz, width {channel_bandwidth_hz} Hz"
    );

    let uvmax = vis.uvmax_lambda();
    debug!("uvmax = {uvmax} wavelengths");
    let cellsize = choose_cellsize(uvmax, options.cellsize_rad, options.override_cellsize)?;
    debug!("cellsize = {cellsize} rad");

    let polarisation_frame = options
        .polarisation_frame
        .unwrap_or_else(|| vis.polarisation_frame());
    let inpol = polarisation_frame.npol();
    let npixel = options.npixel;
    debug!("image shape ({inchan}, {inpol}, {npixel}, {npixel}), {polarisation_frame}");

    let crpix = (npixel / 2 + 1) as f64;
    let cellsize_deg = cellsize.to_degrees();
    let wcs = Wcs {
        axes: vec![
            WcsAxis::new("RA---SIN", crpix, phase_centre.ra.to_degrees(), -cellsize_deg),
            WcsAxis::new("DEC--SIN", crpix, phase_centre.dec.to_degrees(), cellsize_deg),
            WcsAxis::new("STOKES", 1.0, 1.0, 1.0),
            WcsAxis::new("FREQ", 1.0, reference_frequency_hz, channel_bandwidth_hz),
        ],
        radesys: options.frame.clone(),
        equinox: options.equinox,
    };
    Image::zeros((inchan, inpol, npixel, npixel), wcs, polarisation_frame)
}
