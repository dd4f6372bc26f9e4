// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![warn(missing_docs)]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::missing_errors_doc)]

//! rascil_tweaks is a library of image geometry and gridding helpers for imaging Murchison
//! Widefield Array (MWA) Telescope visibilities.
//!
//! # Examples
//!
//! Here's an example of how to image a point source in a snapshot of a small array
//!
//! ```rust
//! use rascil_tweaks::{
//!     constants::MWA_TILE_DIAMETER_M,
//!     create_box_convolution_function, create_image_from_visibility, fft_griddata_to_image,
//!     grid_visibility_nearest,
//!     marlu::{Complex, RADec, ENH},
//!     Configuration, GridData, ImageOptionsBuilder, PolarisationFrame, Visibility,
//! };
//!
//! // tile positions east, north and up of the array centre [metres]
//! let location = Configuration::mwa_location();
//! let enhs = [
//!     ENH { e: 0.0, n: 0.0, h: 0.0 },
//!     ENH { e: 50.0, n: 20.0, h: 0.0 },
//!     ENH { e: -30.0, n: 70.0, h: 0.0 },
//! ];
//! let config = Configuration::from_enh("MWA", location, &enhs, MWA_TILE_DIAMETER_M);
//!
//! // unit visibilities of a point source at zenith
//! let phase_centre = RADec::new(0.0, location.latitude_rad);
//! let mut vis = Visibility::simulate_snapshot(
//!     &config,
//!     phase_centre,
//!     0.0,
//!     vec![150e6],
//!     vec![40e3],
//!     PolarisationFrame::StokesI,
//! )
//! .unwrap();
//! vis.vis_mut().fill(Complex::new(1.0, 0.0));
//!
//! // an empty image with a cellsize that suits the longest baseline
//! let options = ImageOptionsBuilder::default().npixel(64).build().unwrap();
//! let template = create_image_from_visibility(&vis, &options).unwrap();
//!
//! // grid with a box-car kernel, then transform and undo the kernel's taper
//! let (gcf, cf) = create_box_convolution_function(&template, 1, 4, None).unwrap();
//! let mut griddata = GridData::from_image(&template).unwrap();
//! let sumwt = grid_visibility_nearest(&vis, &mut griddata, &cf).unwrap();
//! let image = fft_griddata_to_image(&griddata, &template, Some(&gcf), None).unwrap();
//!
//! // the source is at the centre of the image, with the summed weight
//! assert_eq!(sumwt[[0, 0]], 3.0);
//! assert!((image.pixels()[[0, 0, 32, 32]].re - 3.0).abs() < 1e-9);
//! ```
//!
//! # Details
//!
//! Positions, directions and uvws come from [`Marlu`], and Fourier transforms from
//! [`RustFFT`]. The binary `rascil_tweaks` (feature `cli`) runs the example above for a tile
//! positions file.
//!
//! [`Marlu`]: https://github.com/MWATelescope/Marlu
//! [`RustFFT`]: https://github.com/ejmahler/RustFFT

use cfg_if::cfg_if;

pub mod configuration;
pub mod constants;
pub mod error;
pub mod fft;
pub mod gridding;
pub mod image;
pub mod polarisation;
pub mod synthesis;
pub mod visibility;
pub mod wcs;

cfg_if! {
    if #[cfg(feature = "cli")] {
        pub mod args;
        pub mod cli;
        pub use args::{ArgsError, ImageArgs};
    }
}

pub use configuration::{Configuration, ConfigurationError};
pub use error::{ImagingError, RascilTweaksError};
pub use gridding::{
    create_box_convolution_function, fft_griddata_to_image, grid_visibility_nearest,
};
pub use image::{ConvolutionFunction, Dtype, GridData, Image, Pixel};
pub use marlu;
pub use marlu::{ndarray, Complex, RADec};
pub use polarisation::{PolarisationError, PolarisationFrame};
pub use synthesis::{
    create_image_from_visibility, ImageOptions, ImageOptionsBuilder, SpectralMode,
};
pub use visibility::{Visibility, VisibilityError};
pub use wcs::{Wcs, WcsAxis, WcsError};
