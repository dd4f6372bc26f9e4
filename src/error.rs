// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors that can occur in rascil_tweaks

use thiserror::Error;

use crate::{
    configuration::ConfigurationError,
    image::Dtype,
    polarisation::{PolarisationError, PolarisationFrame},
    synthesis::SpectralMode,
    visibility::VisibilityError,
    wcs::WcsError,
};

#[derive(Error, Debug)]
/// Errors that can occur when making images, grids and convolution functions.
pub enum ImagingError {
    #[error("unknown spectral mode inchan = {inchan}, vnchan = {vnchan}")]
    /// The requested channel count can't be made from the visibility channels.
    UnsupportedSpectralMode {
        /// The number of image channels requested
        inchan: usize,
        /// The number of unique visibility frequencies
        vnchan: usize,
    },

    #[error("Channel width must be non-zero for {mode} mode, found {channel_bandwidth_hz} Hz")]
    /// The spectral mode needs a channel bandwidth, but it's zero.
    InvalidBandwidth {
        /// The spectral mode
        mode: SpectralMode,
        /// The offending bandwidth \[Hz\]
        channel_bandwidth_hz: f64,
    },

    #[error("No frequencies were supplied")]
    /// An empty frequency override.
    NoFrequencies,

    #[error("The largest |u| or |v| is {uvmax} wavelengths, so no cellsize can be derived")]
    /// All the baselines have zero length in the uv plane (or aren't finite).
    DegenerateUvw {
        /// The largest |u| or |v| \[wavelengths\]
        uvmax: f64,
    },

    #[error("{container} has dtype {found}, expected {expected}")]
    /// A container was constructed with the wrong element type. This is a
    /// bug rather than a problem with the input data.
    Postcondition {
        /// The container that was checked
        container: &'static str,
        /// The dtype it should have
        expected: &'static str,
        /// The dtype it has
        found: Dtype,
    },

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    /// Error for bad array shape in provided argument
    BadArrayShape {
        /// The argument name within the function
        argument: String,
        /// The function name
        function: String,
        /// The expected shape
        expected: String,
        /// The shape that was received instead
        received: String,
    },

    #[error("Can't grid {vis} visibilities into a {grid} grid")]
    /// The visibilities and the grid have different polarisation frames.
    PolarisationMismatch {
        /// The frame of the visibilities
        vis: PolarisationFrame,
        /// The frame of the grid
        grid: PolarisationFrame,
    },

    #[error(transparent)]
    /// A needed WCS axis is missing, or a transform failed
    Wcs(#[from] WcsError),
}

#[derive(Error, Debug)]
/// All the errors that can occur in rascil_tweaks
pub enum RascilTweaksError {
    #[error(transparent)]
    /// Error derived from [`ConfigurationError`]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    /// Error derived from [`VisibilityError`]
    Visibility(#[from] VisibilityError),

    #[error(transparent)]
    /// Error derived from [`ImagingError`]
    Imaging(#[from] ImagingError),

    #[error(transparent)]
    /// Error derived from [`PolarisationError`]
    Polarisation(#[from] PolarisationError),

    #[error("Dry run")]
    /// The summary was printed, and nothing else should be done.
    DryRun {},

    #[cfg(feature = "cli")]
    #[error(transparent)]
    /// Error derived from [`crate::args::ArgsError`]
    Args(#[from] crate::args::ArgsError),

    #[cfg(feature = "cli")]
    #[error(transparent)]
    /// Error derived from [`clap::Error`]
    ClapError(#[from] clap::Error),
}
